//! Error types for the physics bridge

use rapier3d::prelude::RigidBodyHandle;
use roomsync_scene::{NodeId, SceneError};
use thiserror::Error;

/// Result type alias for physics operations
pub type Result<T> = std::result::Result<T, PhysicsError>;

/// Errors surfaced to callers of the body registry
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PhysicsError {
    /// Setter called on an entity that has no synchronized body
    #[error("entity {0} has no registered body")]
    NoBody(NodeId),

    /// Instance slot outside the entity's body list
    #[error("instance slot {index} out of range for {entity} ({count} bodies)")]
    InstanceOutOfRange {
        entity: NodeId,
        index: usize,
        count: usize,
    },

    /// Registry handle no longer present in the engine
    #[error("rigid body {0:?} is missing from the physics world")]
    MissingBody(RigidBodyHandle),

    #[error(transparent)]
    Scene(#[from] SceneError),
}
