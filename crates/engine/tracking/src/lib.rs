//! Surface tracking and session orchestration for roomsync
//!
//! Turns the per-frame surface reports of a sensing source into tracked scene
//! entities with colliders, and drives the fixed-rate simulation that moves
//! dynamic entities among them.

mod config;
mod error;
mod handles;
mod sensing;
mod session;
mod surface;
mod tracker;

pub use config::{ConfigError, SessionConfig, TrackerConfig};
pub use error::{Result, TrackingError};
pub use handles::{HandleIds, SurfaceId};
pub use sensing::{
    rectangle, DetectedSurface, ExternalHandle, SensedGeometry, SurfaceKind, SurfaceSnapshot,
};
pub use session::Session;
pub use surface::{plane_extent, TrackedSurface};
pub use tracker::{ReconcileDiff, SurfaceTracker};

// Re-export for convenience
pub use roomsync_physics;
pub use roomsync_scene;
