//! Error types for surface tracking and sessions

use crate::config::ConfigError;
use roomsync_physics::PhysicsError;
use roomsync_scene::SceneError;
use thiserror::Error;

/// Result type alias for tracking operations
pub type Result<T> = std::result::Result<T, TrackingError>;

#[derive(Debug, Error)]
pub enum TrackingError {
    #[error(transparent)]
    Physics(#[from] PhysicsError),

    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
