//! glam ↔ nalgebra conversions at the rapier boundary

use glam::{Quat, Vec3};
use rapier3d::na::{Isometry3, Point3, Quaternion, Translation3, UnitQuaternion, Vector3};

pub(crate) fn to_vector(v: Vec3) -> Vector3<f32> {
    Vector3::new(v.x, v.y, v.z)
}

pub(crate) fn from_vector(v: &Vector3<f32>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

pub(crate) fn to_point(v: Vec3) -> Point3<f32> {
    Point3::new(v.x, v.y, v.z)
}

pub(crate) fn to_rotation(q: Quat) -> UnitQuaternion<f32> {
    UnitQuaternion::new_normalize(Quaternion::new(q.w, q.x, q.y, q.z))
}

pub(crate) fn from_rotation(r: &UnitQuaternion<f32>) -> Quat {
    Quat::from_xyzw(r.i, r.j, r.k, r.w)
}

pub(crate) fn to_isometry(translation: Vec3, rotation: Quat) -> Isometry3<f32> {
    Isometry3::from_parts(
        Translation3::new(translation.x, translation.y, translation.z),
        to_rotation(rotation),
    )
}
