//! Error types for the scene crate

use crate::node::NodeId;
use thiserror::Error;

/// Result type alias for scene operations
pub type Result<T> = std::result::Result<T, SceneError>;

/// Errors that can occur while editing the scene graph
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// Node id not present in the scene
    #[error("unknown scene node: {0}")]
    UnknownNode(NodeId),

    /// Instance slot outside the buffer
    #[error("instance slot {index} out of range (buffer holds {count})")]
    InstanceOutOfRange { index: usize, count: usize },
}
