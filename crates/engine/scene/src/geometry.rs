//! Geometry descriptions shared by render nodes and the physics shape resolver
//!
//! Geometry is immutable once built. Nodes hold it behind an `Rc`, so two
//! render proxies (solid and wireframe) can share one buffer while each stays
//! independently removable; the buffers are released when the last node drops
//! its reference.

use crate::bounds::{Aabb, BoundingSphere};
use glam::Vec3;
use std::collections::BTreeSet;

/// Indexed triangle list (three indices per triangle)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IndexedMesh {
    pub vertices: Vec<Vec3>,
    pub indices: Vec<u32>,
    /// Cached bounds, filled by [`IndexedMesh::with_bounding_box`]
    pub bounding_box: Option<Aabb>,
}

impl IndexedMesh {
    pub fn new(vertices: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self {
            vertices,
            indices,
            bounding_box: None,
        }
    }

    /// Build from a flat `xyz` position array; a trailing partial triple is ignored
    pub fn from_flat(positions: &[f32], indices: &[u32]) -> Self {
        let vertices = positions
            .chunks_exact(3)
            .map(|p| Vec3::new(p[0], p[1], p[2]))
            .collect();
        Self::new(vertices, indices.to_vec())
    }

    /// Compute and cache the bounding box
    pub fn with_bounding_box(mut self) -> Self {
        self.bounding_box = Aabb::from_points(&self.vertices);
        self
    }

    /// Triangles as index triples; a trailing partial triangle is dropped
    pub fn triangles(&self) -> Vec<[u32; 3]> {
        self.indices
            .chunks_exact(3)
            .map(|t| [t[0], t[1], t[2]])
            .collect()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    fn bounds(&self) -> Option<Aabb> {
        self.bounding_box
            .or_else(|| Aabb::from_points(&self.vertices))
    }
}

/// Tagged geometry kinds understood by the renderer
///
/// Dimension parameters are optional to mirror parametric geometry where a
/// caller may leave a dimension unspecified; consumers substitute their own
/// defaults (see the physics shape resolver).
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// Axis-aligned box centered on the node origin
    Box {
        width: Option<f32>,
        height: Option<f32>,
        depth: Option<f32>,
    },
    Sphere {
        radius: Option<f32>,
    },
    Icosahedron {
        radius: Option<f32>,
        detail: u32,
    },
    Indexed(IndexedMesh),
    /// Line segments, used for outlines and debug markers
    Edges(Vec<[Vec3; 2]>),
    /// Unstructured point set
    Points(Vec<Vec3>),
}

impl Geometry {
    /// Box with every dimension specified
    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        Geometry::Box {
            width: Some(width),
            height: Some(height),
            depth: Some(depth),
        }
    }

    pub fn sphere(radius: f32) -> Self {
        Geometry::Sphere {
            radius: Some(radius),
        }
    }

    pub fn icosahedron(radius: f32, detail: u32) -> Self {
        Geometry::Icosahedron {
            radius: Some(radius),
            detail,
        }
    }

    /// Three axis segments of the given length, used as an origin marker
    pub fn axes(length: f32) -> Self {
        Geometry::Edges(vec![
            [Vec3::ZERO, Vec3::X * length],
            [Vec3::ZERO, Vec3::Y * length],
            [Vec3::ZERO, Vec3::Z * length],
        ])
    }

    /// Outline of another geometry
    ///
    /// Boxes yield their 12 edges, triangle meshes their unique triangle edges.
    /// Other kinds have no meaningful outline and yield an empty segment list.
    pub fn edges_of(source: &Geometry) -> Self {
        match source {
            Geometry::Box { .. } => {
                let Some(aabb) = source.local_bounds() else {
                    return Geometry::Edges(Vec::new());
                };
                let (min, max) = (aabb.min, aabb.max);
                let c = |x: bool, y: bool, z: bool| {
                    Vec3::new(
                        if x { max.x } else { min.x },
                        if y { max.y } else { min.y },
                        if z { max.z } else { min.z },
                    )
                };
                let mut segments = Vec::with_capacity(12);
                for a in [false, true] {
                    for b in [false, true] {
                        segments.push([c(false, a, b), c(true, a, b)]);
                        segments.push([c(a, false, b), c(a, true, b)]);
                        segments.push([c(a, b, false), c(a, b, true)]);
                    }
                }
                Geometry::Edges(segments)
            }
            Geometry::Indexed(mesh) => {
                let mut unique = BTreeSet::new();
                for [a, b, c] in mesh.triangles() {
                    for (i, j) in [(a, b), (b, c), (c, a)] {
                        unique.insert((i.min(j), i.max(j)));
                    }
                }
                let segments = unique
                    .into_iter()
                    .filter_map(|(i, j)| {
                        let a = mesh.vertices.get(i as usize)?;
                        let b = mesh.vertices.get(j as usize)?;
                        Some([*a, *b])
                    })
                    .collect();
                Geometry::Edges(segments)
            }
            Geometry::Edges(segments) => Geometry::Edges(segments.clone()),
            _ => Geometry::Edges(Vec::new()),
        }
    }

    /// Bounds in the node's local space
    ///
    /// Unspecified box dimensions default to 1 and unspecified radii to 1,
    /// the usual parametric-geometry defaults.
    pub fn local_bounds(&self) -> Option<Aabb> {
        match self {
            Geometry::Box {
                width,
                height,
                depth,
            } => Some(Aabb::from_half_extents(
                Vec3::new(
                    width.unwrap_or(1.0),
                    height.unwrap_or(1.0),
                    depth.unwrap_or(1.0),
                ) * 0.5,
            )),
            Geometry::Sphere { radius } | Geometry::Icosahedron { radius, .. } => Some(
                Aabb::from_half_extents(Vec3::splat(radius.unwrap_or(1.0))),
            ),
            Geometry::Indexed(mesh) => mesh.bounds(),
            Geometry::Edges(segments) => Aabb::from_points(segments.iter().flatten()),
            Geometry::Points(points) => Aabb::from_points(points),
        }
    }

    /// Bounding sphere in local space
    pub fn bounding_sphere(&self) -> Option<BoundingSphere> {
        match self {
            Geometry::Sphere { radius } | Geometry::Icosahedron { radius, .. } => {
                Some(BoundingSphere::new(Vec3::ZERO, radius.unwrap_or(1.0)))
            }
            other => other
                .local_bounds()
                .map(|aabb| BoundingSphere::from_aabb(&aabb)),
        }
    }

    /// Short kind name for logs
    pub fn kind_name(&self) -> &'static str {
        match self {
            Geometry::Box { .. } => "box",
            Geometry::Sphere { .. } => "sphere",
            Geometry::Icosahedron { .. } => "icosahedron",
            Geometry::Indexed(_) => "indexed",
            Geometry::Edges(_) => "edges",
            Geometry::Points(_) => "points",
        }
    }
}
