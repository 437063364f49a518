//! On-disk object records

use bytemuck::{Pod, Zeroable};
use crate::core::types::{Affine3A, Mat3, Vec3};
use crate::math::transform::{Float3x4, affine_from_3x4, affine_to_3x4, decompose_rotation_scale};

/// Fixed-size chunk header
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct ChunkHeader {
    pub version: u32,
    pub object_ref_count: u32,
    pub filenames_buffer_size: u32,
    pub supplements_buffer_size: u32,
    pub reserved: u32,
}

/// One placed object as stored in a cell's chunk.
///
/// String offsets index the cell's filename table; `supplements_offset`
/// indexes the supplements buffer in `u64` units, 0 meaning none.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct ObjectReference {
    pub local_to_cell: Float3x4,
    pub model_filename_offset: u32,
    pub material_filename_offset: u32,
    pub supplements_offset: u32,
    pub reserved: u32,
    pub guid: u64,
    pub decomposed_rotation: [[f32; 3]; 3],
    pub decomposed_scale: [f32; 3],
}

impl ObjectReference {
    pub fn local_to_cell(&self) -> Affine3A {
        affine_from_3x4(&self.local_to_cell)
    }

    /// Store a transform along with its rotation/scale decomposition
    pub fn set_local_to_cell(&mut self, local_to_cell: &Affine3A) {
        self.local_to_cell = affine_to_3x4(local_to_cell);
        let (rotation, scale) = decompose_rotation_scale(&local_to_cell.matrix3.into());
        self.decomposed_rotation = rotation.to_cols_array_2d();
        self.decomposed_scale = scale.to_array();
    }

    pub fn rotation(&self) -> Mat3 {
        Mat3::from_cols_array_2d(&self.decomposed_rotation)
    }

    pub fn scale(&self) -> Vec3 {
        Vec3::from_array(self.decomposed_scale)
    }

    pub fn translation(&self) -> Vec3 {
        Vec3::new(self.local_to_cell[0][3], self.local_to_cell[1][3], self.local_to_cell[2][3])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Quat;

    #[test]
    fn test_record_sizes() {
        assert_eq!(std::mem::size_of::<ChunkHeader>(), 20);
        assert_eq!(std::mem::size_of::<ObjectReference>(), 120);
    }

    #[test]
    fn test_set_local_to_cell() {
        let xform = Affine3A::from_scale_rotation_translation(
            Vec3::splat(2.0),
            Quat::from_rotation_z(1.0),
            Vec3::new(3.0, 4.0, 5.0),
        );
        let mut obj = ObjectReference::default();
        obj.set_local_to_cell(&xform);
        assert_eq!(obj.translation(), Vec3::new(3.0, 4.0, 5.0));
        assert!((obj.scale() - Vec3::splat(2.0)).abs().max_element() < 1e-5);
        assert!(obj.local_to_cell().abs_diff_eq(xform, 1e-6));
    }
}
