//! Mapping from render geometry to collision shapes

use crate::convert::to_point;
use glam::Vec3;
use rapier3d::prelude::SharedShape;
use roomsync_scene::Geometry;

/// Half-extent used for a box dimension the geometry leaves unspecified
pub const DEFAULT_HALF_EXTENT: f32 = 0.5;

/// Radius used for a sphere whose radius is unspecified
pub const DEFAULT_BALL_RADIUS: f32 = 1.0;

/// Collision description derived from a geometry
#[derive(Debug, Clone, PartialEq)]
pub enum CollisionShape {
    Box { half_extents: Vec3 },
    Ball { radius: f32 },
    TriMesh { vertices: Vec<Vec3>, indices: Vec<[u32; 3]> },
    /// Geometry with no physical counterpart; the entity stays visual-only
    Unsupported,
}

impl CollisionShape {
    /// Resolve the collision shape of a geometry
    pub fn resolve(geometry: &Geometry) -> Self {
        match geometry {
            Geometry::Box {
                width,
                height,
                depth,
            } => {
                let half = |d: &Option<f32>| d.map_or(DEFAULT_HALF_EXTENT, |d| d / 2.0);
                CollisionShape::Box {
                    half_extents: Vec3::new(half(width), half(height), half(depth)),
                }
            }
            Geometry::Sphere { radius } | Geometry::Icosahedron { radius, .. } => {
                CollisionShape::Ball {
                    radius: radius.unwrap_or(DEFAULT_BALL_RADIUS),
                }
            }
            Geometry::Indexed(mesh) => CollisionShape::TriMesh {
                vertices: mesh.vertices.clone(),
                indices: mesh.triangles(),
            },
            Geometry::Edges(_) | Geometry::Points(_) => CollisionShape::Unsupported,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, CollisionShape::Unsupported)
    }

    /// Build the engine shape
    ///
    /// Returns `None` for [`CollisionShape::Unsupported`] and for triangle
    /// meshes the engine cannot build a collider from.
    pub fn to_shared_shape(&self) -> Option<SharedShape> {
        match self {
            CollisionShape::Box { half_extents } => Some(SharedShape::cuboid(
                half_extents.x,
                half_extents.y,
                half_extents.z,
            )),
            CollisionShape::Ball { radius } => Some(SharedShape::ball(*radius)),
            CollisionShape::TriMesh { vertices, indices } => {
                if vertices.is_empty() || indices.is_empty() {
                    tracing::warn!(
                        vertices = vertices.len(),
                        triangles = indices.len(),
                        "mesh has no triangles, skipping collider"
                    );
                    return None;
                }
                let count = vertices.len() as u32;
                if indices.iter().flatten().any(|&i| i >= count) {
                    tracing::warn!(
                        vertices = count,
                        "mesh index out of range, skipping collider"
                    );
                    return None;
                }
                let points = vertices.iter().copied().map(to_point).collect();
                match SharedShape::trimesh(points, indices.clone()) {
                    Ok(shape) => Some(shape),
                    Err(err) => {
                        tracing::warn!(?err, "engine rejected triangle mesh");
                        None
                    }
                }
            }
            CollisionShape::Unsupported => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roomsync_scene::IndexedMesh;

    #[test]
    fn test_box_half_extents() {
        let shape = CollisionShape::resolve(&Geometry::cuboid(2.0, 4.0, 6.0));
        assert_eq!(
            shape,
            CollisionShape::Box {
                half_extents: Vec3::new(1.0, 2.0, 3.0)
            }
        );
    }

    #[test]
    fn test_box_missing_dimension() {
        let geometry = Geometry::Box {
            width: Some(3.0),
            height: None,
            depth: Some(1.0),
        };
        assert_eq!(
            CollisionShape::resolve(&geometry),
            CollisionShape::Box {
                half_extents: Vec3::new(1.5, DEFAULT_HALF_EXTENT, 0.5)
            }
        );
    }

    #[test]
    fn test_spheres_become_balls() {
        assert_eq!(
            CollisionShape::resolve(&Geometry::sphere(0.3)),
            CollisionShape::Ball { radius: 0.3 }
        );
        assert_eq!(
            CollisionShape::resolve(&Geometry::icosahedron(0.05, 1)),
            CollisionShape::Ball { radius: 0.05 }
        );
        assert_eq!(
            CollisionShape::resolve(&Geometry::Sphere { radius: None }),
            CollisionShape::Ball {
                radius: DEFAULT_BALL_RADIUS
            }
        );
    }

    #[test]
    fn test_indexed_mesh_copied() {
        let mesh = IndexedMesh::new(
            vec![Vec3::ZERO, Vec3::X, Vec3::Z, Vec3::new(1.0, 0.0, 1.0)],
            vec![0, 1, 2, 1, 3, 2],
        );
        let shape = CollisionShape::resolve(&Geometry::Indexed(mesh.clone()));
        let CollisionShape::TriMesh { vertices, indices } = &shape else {
            panic!("expected trimesh, got {shape:?}");
        };
        assert_eq!(vertices, &mesh.vertices);
        assert_eq!(indices, &vec![[0, 1, 2], [1, 3, 2]]);
        assert!(shape.to_shared_shape().is_some());
    }

    #[test]
    fn test_unsupported_kinds() {
        let points = CollisionShape::resolve(&Geometry::Points(vec![Vec3::ONE]));
        assert!(!points.is_supported());
        assert!(points.to_shared_shape().is_none());
        let axes = CollisionShape::resolve(&Geometry::axes(0.1));
        assert!(!axes.is_supported());
    }

    #[test]
    fn test_degenerate_meshes_have_no_collider() {
        let empty = CollisionShape::TriMesh {
            vertices: vec![Vec3::ZERO],
            indices: Vec::new(),
        };
        assert!(empty.to_shared_shape().is_none());

        let out_of_range = CollisionShape::TriMesh {
            vertices: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            indices: vec![[0, 1, 7]],
        };
        assert!(out_of_range.to_shared_shape().is_none());
    }

    #[test]
    fn test_zero_thickness_box_is_valid() {
        let shape = CollisionShape::resolve(&Geometry::cuboid(0.0, 0.0, 0.0));
        assert!(shape.to_shared_shape().is_some());
    }
}
