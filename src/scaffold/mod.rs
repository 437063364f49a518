//! Immutable on-disk form of one cell's placements
//!
//! A chunk is a [`ChunkHeader`] followed by four contiguous regions:
//! object references, one bounding box per object, the filename string
//! table, and the `u64` supplements buffer.

pub mod disk_io;
pub mod guid;
pub mod nascent;
pub mod object;
pub mod strings;

use std::mem::size_of;

use crate::core::error::Error;
use crate::core::hash::hash64;
use crate::core::types::Result;
use crate::math::Aabb;

pub use nascent::{NascentPlacement, serialize_placements};
pub use object::{ChunkHeader, ObjectReference};

/// Chunk version this build reads and writes
pub const PLACEMENTS_VERSION: u32 = 0;

/// Deserialized placements of one cell. Objects are sorted by guid and
/// `cell_space_boundaries[i]` belongs to `objects[i]`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlacementsScaffold {
    objects: Vec<ObjectReference>,
    boundaries: Vec<Aabb>,
    filenames: Vec<u8>,
    supplements: Vec<u64>,
}

impl PlacementsScaffold {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a chunk. Fails on a version mismatch or inconsistent region sizes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let header_size = size_of::<ChunkHeader>();
        let header_bytes = data.get(..header_size).ok_or_else(|| {
            Error::MalformedHeader(format!("chunk of {} bytes has no header", data.len()))
        })?;
        let header: ChunkHeader = bytemuck::pod_read_unaligned(header_bytes);

        if header.version != PLACEMENTS_VERSION {
            return Err(Error::VersionMismatch {
                found: header.version,
                expected: PLACEMENTS_VERSION,
            });
        }
        if header.supplements_buffer_size as usize % size_of::<u64>() != 0 {
            return Err(Error::MalformedHeader(format!(
                "supplements buffer size {} is not a multiple of 8",
                header.supplements_buffer_size
            )));
        }

        let count = header.object_ref_count as usize;
        let objects_size = count * size_of::<ObjectReference>();
        let boundaries_size = count * size_of::<Aabb>();
        let expected = header_size
            + objects_size
            + boundaries_size
            + header.filenames_buffer_size as usize
            + header.supplements_buffer_size as usize;
        if data.len() != expected {
            return Err(Error::MalformedHeader(format!(
                "header describes {expected} bytes, chunk has {}",
                data.len()
            )));
        }

        let (object_bytes, rest) = data[header_size..].split_at(objects_size);
        let (boundary_bytes, rest) = rest.split_at(boundaries_size);
        let (filename_bytes, supplement_bytes) = rest.split_at(header.filenames_buffer_size as usize);

        let objects = object_bytes
            .chunks_exact(size_of::<ObjectReference>())
            .map(bytemuck::pod_read_unaligned)
            .collect();
        let boundaries = boundary_bytes
            .chunks_exact(size_of::<Aabb>())
            .map(bytemuck::pod_read_unaligned)
            .collect();
        let filenames = filename_bytes.to_vec();
        let supplements = supplement_bytes
            .chunks_exact(size_of::<u64>())
            .map(bytemuck::pod_read_unaligned)
            .collect();

        Ok(Self { objects, boundaries, filenames, supplements })
    }

    /// Encode as a chunk; the exact inverse of [`from_bytes`](Self::from_bytes)
    pub fn serialize(&self) -> Vec<u8> {
        let header = ChunkHeader {
            version: PLACEMENTS_VERSION,
            object_ref_count: self.objects.len() as u32,
            filenames_buffer_size: self.filenames.len() as u32,
            supplements_buffer_size: (self.supplements.len() * size_of::<u64>()) as u32,
            reserved: 0,
        };
        let mut data = Vec::with_capacity(
            size_of::<ChunkHeader>()
                + self.objects.len() * (size_of::<ObjectReference>() + size_of::<Aabb>())
                + self.filenames.len()
                + self.supplements.len() * size_of::<u64>(),
        );
        data.extend_from_slice(bytemuck::bytes_of(&header));
        data.extend_from_slice(bytemuck::cast_slice(&self.objects));
        data.extend_from_slice(bytemuck::cast_slice(&self.boundaries));
        data.extend_from_slice(&self.filenames);
        data.extend_from_slice(bytemuck::cast_slice(&self.supplements));
        data
    }

    pub fn objects(&self) -> &[ObjectReference] {
        &self.objects
    }

    pub fn cell_space_boundaries(&self) -> &[Aabb] {
        &self.boundaries
    }

    pub fn filenames_buffer(&self) -> &[u8] {
        &self.filenames
    }

    pub fn supplements_buffer(&self) -> &[u64] {
        &self.supplements
    }

    pub fn string(&self, offset: u32) -> &str {
        strings::read_string(&self.filenames, offset as usize)
    }

    pub fn model_name(&self, object: &ObjectReference) -> &str {
        self.string(object.model_filename_offset)
    }

    pub fn material_name(&self, object: &ObjectReference) -> &str {
        self.string(object.material_filename_offset)
    }

    pub fn supplements(&self, object: &ObjectReference) -> &[u64] {
        strings::read_supplements(&self.supplements, object.supplements_offset)
    }

    /// Index of the object with this guid
    pub fn find_object(&self, guid: u64) -> Option<usize> {
        self.objects.binary_search_by_key(&guid, |o| o.guid).ok()
    }

    pub fn has_object(&self, guid: u64) -> bool {
        self.find_object(guid).is_some()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Rename a string in place, e.g. to retarget every instance of a model.
    ///
    /// Offsets that pointed past the replaced entry are shifted by the size
    /// difference. When `new` is already in the table the old entry is
    /// dropped and its users point at the existing one. Returns false if
    /// `old` is not in the table.
    pub fn replace_string(&mut self, old: &str, new: &str) -> bool {
        let Some(start) = strings::find_string(&self.filenames, hash64(old)) else {
            return false;
        };
        if old == new {
            return true;
        }
        let Some(range) = strings::entry_range(&self.filenames, start) else {
            return false;
        };
        let existing = strings::find_string(&self.filenames, hash64(new));
        let replacement = match existing {
            Some(_) => Vec::new(),
            None => strings::encode_entry(new),
        };
        let delta = replacement.len() as i64 - range.len() as i64;
        self.filenames.splice(range, replacement);

        let start = start as u32;
        let shift = |offset: u32| {
            if offset > start {
                (i64::from(offset) + delta) as u32
            } else {
                offset
            }
        };
        let target = existing.map_or(start, |offset| shift(offset as u32));
        for object in &mut self.objects {
            for offset in [&mut object.model_filename_offset, &mut object.material_filename_offset] {
                *offset = if *offset == start { target } else { shift(*offset) };
            }
        }
        true
    }

    pub fn add_string(&mut self, s: &str) -> u32 {
        strings::add_string(&mut self.filenames, s)
    }

    pub fn add_supplements(&mut self, supplements: &[u64]) -> u32 {
        strings::add_supplements(&mut self.supplements, supplements)
    }

    /// Insert keeping guid order. Returns the new index, or None on a guid collision.
    pub(crate) fn insert_object(&mut self, object: ObjectReference, boundary: Aabb) -> Option<usize> {
        match self.objects.binary_search_by_key(&object.guid, |o| o.guid) {
            Ok(_) => None,
            Err(index) => {
                self.objects.insert(index, object);
                self.boundaries.insert(index, boundary);
                Some(index)
            }
        }
    }

    /// Overwrite an object whose guid is unchanged
    pub(crate) fn replace_object(&mut self, index: usize, object: ObjectReference, boundary: Aabb) {
        debug_assert_eq!(self.objects[index].guid, object.guid);
        self.objects[index] = object;
        self.boundaries[index] = boundary;
    }

    pub(crate) fn remove_object(&mut self, index: usize) -> (ObjectReference, Aabb) {
        (self.objects.remove(index), self.boundaries.remove(index))
    }

    /// Number of contiguous runs sharing the same model and material
    pub fn configuration_runs(&self) -> usize {
        let mut runs = 0;
        let mut previous = None;
        for o in &self.objects {
            let key = (o.model_filename_offset, o.material_filename_offset);
            if previous != Some(key) {
                runs += 1;
                previous = Some(key);
            }
        }
        runs
    }

    pub fn log_details(&self, name: &str) {
        log::debug!(
            "Placements {name}: {} objects, {} runs, {} string bytes ({} strings), {} supplement words",
            self.objects.len(),
            self.configuration_runs(),
            self.filenames.len(),
            strings::entries(&self.filenames).count(),
            self.supplements.len(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Affine3A, Vec3};

    fn sample_scaffold() -> PlacementsScaffold {
        let mut scaffold = PlacementsScaffold::new();
        let tree = scaffold.add_string("models/tree.mdl");
        let bark = scaffold.add_string("materials/bark.mat");
        let rock = scaffold.add_string("models/rock.mdl");
        let supplements = scaffold.add_supplements(&[0xabc]);
        for (guid, model, supp) in [(10u64, tree, supplements), (20, rock, 0), (30, tree, 0)] {
            let mut object = ObjectReference {
                model_filename_offset: model,
                material_filename_offset: bark,
                supplements_offset: supp,
                guid,
                ..Default::default()
            };
            object.set_local_to_cell(&Affine3A::from_translation(Vec3::splat(guid as f32)));
            let boundary = Aabb::from_center_half_extent(Vec3::splat(guid as f32), Vec3::ONE);
            scaffold.insert_object(object, boundary).unwrap();
        }
        scaffold
    }

    #[test]
    fn test_serialize_is_byte_identical() {
        let scaffold = sample_scaffold();
        let blob = scaffold.serialize();
        let parsed = PlacementsScaffold::from_bytes(&blob).unwrap();
        assert_eq!(parsed, scaffold);
        assert_eq!(parsed.serialize(), blob);
        assert_eq!(parsed.supplements(&parsed.objects()[0]), &[0xabc]);
    }

    #[test]
    fn test_version_mismatch() {
        let mut blob = sample_scaffold().serialize();
        blob[0] = 3;
        match PlacementsScaffold::from_bytes(&blob) {
            Err(Error::VersionMismatch { found, expected }) => {
                assert_eq!(found, 3);
                assert_eq!(expected, PLACEMENTS_VERSION);
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_malformed_sizes() {
        let blob = sample_scaffold().serialize();
        assert!(matches!(
            PlacementsScaffold::from_bytes(&blob[..blob.len() - 1]),
            Err(Error::MalformedHeader(_))
        ));
        assert!(matches!(PlacementsScaffold::from_bytes(&blob[..7]), Err(Error::MalformedHeader(_))));
    }

    #[test]
    fn test_find_object() {
        let scaffold = sample_scaffold();
        assert_eq!(scaffold.find_object(20), Some(1));
        assert_eq!(scaffold.find_object(25), None);
    }

    #[test]
    fn test_replace_string_shifts_later_offsets() {
        let mut scaffold = sample_scaffold();
        assert!(scaffold.replace_string("models/tree.mdl", "models/big_oak_tree.mdl"));
        let objects = scaffold.objects().to_vec();
        assert_eq!(scaffold.model_name(&objects[0]), "models/big_oak_tree.mdl");
        assert_eq!(scaffold.material_name(&objects[0]), "materials/bark.mat");
        assert_eq!(scaffold.model_name(&objects[1]), "models/rock.mdl");
        assert_eq!(scaffold.model_name(&objects[2]), "models/big_oak_tree.mdl");
        assert!(!scaffold.replace_string("models/missing.mdl", "x"));
    }

    #[test]
    fn test_replace_string_reuses_existing_entry() {
        let mut scaffold = sample_scaffold();
        assert!(scaffold.replace_string("models/tree.mdl", "models/rock.mdl"));
        assert_eq!(strings::entries(scaffold.filenames_buffer()).count(), 2);
        for object in scaffold.objects() {
            assert_eq!(scaffold.model_name(object), "models/rock.mdl");
            assert_eq!(scaffold.material_name(object), "materials/bark.mat");
        }

        let reparsed = PlacementsScaffold::from_bytes(&scaffold.serialize()).unwrap();
        assert_eq!(reparsed, scaffold);
        assert!(scaffold.replace_string("models/rock.mdl", "models/rock.mdl"));
        assert_eq!(reparsed, scaffold);
    }

    #[test]
    fn test_configuration_runs() {
        assert_eq!(sample_scaffold().configuration_runs(), 3);
    }
}
