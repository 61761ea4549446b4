//! Flat per-instance transform buffer for batched draws
//!
//! One 4×4 matrix per instance, stored column-major (`Mat4::to_cols_array`
//! order) at a fixed stride. Writers mark the buffer dirty once per batch of
//! edits; the renderer re-uploads and clears the flag with
//! [`InstanceBuffer::take_dirty`].

use crate::bounds::BoundingSphere;
use crate::error::{Result, SceneError};
use glam::Mat4;

/// Floats per instance matrix
pub const MATRIX_STRIDE: usize = 16;

#[derive(Debug, Clone, PartialEq)]
pub struct InstanceBuffer {
    data: Vec<f32>,
    dirty: bool,
    bounding_sphere: Option<BoundingSphere>,
}

impl InstanceBuffer {
    /// Buffer of `count` identity matrices
    pub fn new(count: usize) -> Self {
        Self::from_matrices(std::iter::repeat(Mat4::IDENTITY).take(count))
    }

    pub fn from_matrices(matrices: impl IntoIterator<Item = Mat4>) -> Self {
        let data = matrices
            .into_iter()
            .flat_map(|m| m.to_cols_array())
            .collect();
        Self {
            data,
            dirty: true,
            bounding_sphere: None,
        }
    }

    /// Number of instances
    pub fn len(&self) -> usize {
        self.data.len() / MATRIX_STRIDE
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn matrix_at(&self, index: usize) -> Option<Mat4> {
        let start = index.checked_mul(MATRIX_STRIDE)?;
        self.data
            .get(start..start + MATRIX_STRIDE)
            .map(Mat4::from_cols_slice)
    }

    /// Overwrite one slot. Does not mark the buffer dirty.
    pub fn set_matrix_at(&mut self, index: usize, matrix: Mat4) -> Result<()> {
        let count = self.len();
        if index >= count {
            return Err(SceneError::InstanceOutOfRange { index, count });
        }
        let start = index * MATRIX_STRIDE;
        matrix.write_cols_to_slice(&mut self.data[start..start + MATRIX_STRIDE]);
        Ok(())
    }

    pub fn matrices(&self) -> impl Iterator<Item = Mat4> + '_ {
        self.data
            .chunks_exact(MATRIX_STRIDE)
            .map(Mat4::from_cols_slice)
    }

    /// Raw column-major floats, ready for upload
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clear the dirty flag, returning whether it was set
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Recompute the combined bounding sphere from a per-instance local sphere
    pub fn compute_bounding_sphere(
        &mut self,
        local: Option<BoundingSphere>,
    ) -> Option<BoundingSphere> {
        self.bounding_sphere = local.and_then(|local| {
            self.matrices()
                .map(|m| local.transformed(&m))
                .reduce(|acc, sphere| acc.union(&sphere))
        });
        self.bounding_sphere
    }

    pub fn bounding_sphere(&self) -> Option<BoundingSphere> {
        self.bounding_sphere
    }
}
