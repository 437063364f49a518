//! Building chunks from freshly authored placements

use crate::core::types::Affine3A;
use crate::math::Aabb;
use super::guid::{allocate_guid, object_id_top_part};
use super::{ObjectReference, PlacementsScaffold};

/// A placement that has not been written to a chunk yet
#[derive(Clone, Debug)]
pub struct NascentPlacement {
    pub model: String,
    pub material: String,
    pub supplements: Vec<u64>,
    pub local_to_cell: Affine3A,
    /// Bounding box in cell space
    pub cell_space_boundary: Aabb,
    /// Keep this guid instead of allocating one. Must be unique.
    pub guid: Option<u64>,
}

/// Build a scaffold from nascent placements, allocating missing guids.
/// Placements whose preassigned guid collides with an earlier one are skipped.
pub fn build_scaffold(placements: &[NascentPlacement]) -> PlacementsScaffold {
    let mut scaffold = PlacementsScaffold::new();
    for p in placements {
        let guid = p.guid.unwrap_or_else(|| {
            allocate_guid(object_id_top_part(&p.model, &p.material), |id| scaffold.has_object(id))
        });
        let mut object = ObjectReference {
            model_filename_offset: scaffold.add_string(&p.model),
            material_filename_offset: scaffold.add_string(&p.material),
            supplements_offset: scaffold.add_supplements(&p.supplements),
            guid,
            ..Default::default()
        };
        object.set_local_to_cell(&p.local_to_cell);
        if scaffold.insert_object(object, p.cell_space_boundary).is_none() {
            log::warn!("Duplicate placement guid 0x{guid:016x} for {}, skipped", p.model);
        }
    }
    scaffold
}

/// Encode nascent placements as a chunk
pub fn serialize_placements(placements: &[NascentPlacement]) -> Vec<u8> {
    build_scaffold(placements).serialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Vec3;

    fn nascent(model: &str, x: f32) -> NascentPlacement {
        NascentPlacement {
            model: model.to_string(),
            material: "materials/default.mat".to_string(),
            supplements: Vec::new(),
            local_to_cell: Affine3A::from_translation(Vec3::new(x, 0.0, 0.0)),
            cell_space_boundary: Aabb::from_center_half_extent(Vec3::new(x, 0.0, 0.0), Vec3::ONE),
            guid: None,
        }
    }

    #[test]
    fn test_guids_sorted_and_grouped() {
        let placements: Vec<_> = (0..20)
            .map(|i| nascent(if i % 2 == 0 { "a.mdl" } else { "b.mdl" }, i as f32))
            .collect();
        let scaffold = PlacementsScaffold::from_bytes(&serialize_placements(&placements)).unwrap();
        assert_eq!(scaffold.len(), 20);
        assert!(scaffold.objects().windows(2).all(|w| w[0].guid < w[1].guid));
        // guid top bits cluster each model into a single run
        assert_eq!(scaffold.configuration_runs(), 2);
    }

    #[test]
    fn test_preassigned_guid_kept() {
        let mut p = nascent("a.mdl", 1.0);
        p.guid = Some(0x1234);
        let mut dup = nascent("a.mdl", 2.0);
        dup.guid = Some(0x1234);
        let scaffold = build_scaffold(&[p, dup]);
        assert_eq!(scaffold.len(), 1);
        assert_eq!(scaffold.objects()[0].guid, 0x1234);
    }
}
