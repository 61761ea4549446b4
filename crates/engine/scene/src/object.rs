//! Object trait for types with position and rotation in 3D space

use crate::node::SceneNode;
use glam::{Quat, Vec3};

/// Base trait for any object with position and rotation in 3D space.
///
/// Implemented by [`SceneNode`], where the values are relative to the node's
/// parent. The simulation write-back goes through this trait so it never
/// touches scale, material or visibility.
pub trait Object {
    /// Get the current position
    fn position(&self) -> Vec3;

    /// Get the current rotation as a quaternion
    fn rotation(&self) -> Quat;

    /// Set the position
    fn set_position(&mut self, position: Vec3);

    /// Set the rotation
    fn set_rotation(&mut self, rotation: Quat);
}

impl Object for SceneNode {
    fn position(&self) -> Vec3 {
        self.transform.translation
    }

    fn rotation(&self) -> Quat {
        self.transform.rotation
    }

    fn set_position(&mut self, position: Vec3) {
        self.transform.translation = position;
    }

    fn set_rotation(&mut self, rotation: Quat) {
        self.transform.rotation = rotation;
    }
}
