//! Render-side data model for roomsync
//!
//! The scene crate owns everything the presentation layer draws: geometry
//! descriptions, disposable scene nodes grouped by role, and flat instance
//! transform buffers for batched entities. Physics and tracking crates mutate
//! these through [`SceneContext`]; nothing here knows about the simulation.

mod bounds;
mod context;
mod error;
mod geometry;
mod instances;
mod node;
mod object;

pub use bounds::{Aabb, BoundingSphere};
pub use context::SceneContext;
pub use error::{Result, SceneError};
pub use geometry::{Geometry, IndexedMesh};
pub use instances::{InstanceBuffer, MATRIX_STRIDE};
pub use node::{Material, NodeId, NodeRole, SceneNode, Transform};
pub use object::Object;

// Re-export for convenience
pub use glam;
