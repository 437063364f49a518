//! Conversions between on-disk 3x4 transforms and glam affines

use crate::core::types::{Affine3A, Mat3, Vec3};

/// Row-major 3x4 matrix as stored in placement chunks. Column 3 is translation.
pub type Float3x4 = [[f32; 4]; 3];

pub fn affine_from_3x4(m: &Float3x4) -> Affine3A {
    Affine3A::from_cols(
        Vec3::new(m[0][0], m[1][0], m[2][0]).into(),
        Vec3::new(m[0][1], m[1][1], m[2][1]).into(),
        Vec3::new(m[0][2], m[1][2], m[2][2]).into(),
        Vec3::new(m[0][3], m[1][3], m[2][3]).into(),
    )
}

pub fn affine_to_3x4(a: &Affine3A) -> Float3x4 {
    let c = [a.matrix3.x_axis, a.matrix3.y_axis, a.matrix3.z_axis, a.translation];
    std::array::from_fn(|row| std::array::from_fn(|col| c[col][row]))
}

/// Split the linear part into a pure rotation and per-axis scale, assuming no shear.
///
/// A zero-length axis gets unit scale so the rotation stays finite.
pub fn decompose_rotation_scale(m: &Mat3) -> (Mat3, Vec3) {
    let mut scale = Vec3::new(m.x_axis.length(), m.y_axis.length(), m.z_axis.length());
    for axis in 0..3 {
        if scale[axis] <= f32::EPSILON {
            scale[axis] = 1.0;
        }
    }
    let rotation = Mat3::from_cols(m.x_axis / scale.x, m.y_axis / scale.y, m.z_axis / scale.z);
    (rotation, scale)
}

/// Map a point into object local space using a decomposed transform,
/// i.e. `S^-1 * R^T * (p - t)`.
pub fn to_local_point(rotation: &Mat3, scale: Vec3, translation: Vec3, p: Vec3) -> Vec3 {
    (rotation.transpose() * (p - translation)) / scale
}
