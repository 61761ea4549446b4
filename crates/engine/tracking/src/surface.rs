//! A tracked surface and the scene content built for it

use crate::config::TrackerConfig;
use crate::handles::SurfaceId;
use crate::sensing::{ExternalHandle, SensedGeometry, SurfaceKind};
use glam::Vec3;
use roomsync_physics::{BodyClass, CollisionShape};
use roomsync_scene::{Aabb, Geometry, IndexedMesh, Material, NodeId, NodeRole};
use std::rc::Rc;

const PLANE_COLOR: [f32; 3] = [0.85, 0.85, 0.9];
const OUTLINE_COLOR: [f32; 3] = [1.0, 1.0, 1.0];
const ORIGIN_AXIS_LENGTH: f32 = 0.1;

/// One sensed plane or mesh with its scene nodes and collider
///
/// The surface owns every node it lists; disposing it removes all of them.
#[derive(Debug)]
pub struct TrackedSurface {
    pub(crate) id: SurfaceId,
    pub(crate) handle: ExternalHandle,
    pub(crate) kind: SurfaceKind,
    pub(crate) change_version: u64,
    pub(crate) geometry: Rc<Geometry>,
    pub(crate) visual: NodeId,
    pub(crate) outline: NodeId,
    pub(crate) occlusion: Option<NodeId>,
    pub(crate) origin: NodeId,
    pub(crate) collision: CollisionShape,
    pub(crate) body: Option<BodyClass>,
    pub(crate) controlled: bool,
    pub(crate) visible: bool,
}

impl TrackedSurface {
    pub fn id(&self) -> SurfaceId {
        self.id
    }

    pub fn handle(&self) -> ExternalHandle {
        self.handle
    }

    pub fn kind(&self) -> SurfaceKind {
        self.kind
    }

    pub fn change_version(&self) -> u64 {
        self.change_version
    }

    pub fn geometry(&self) -> &Rc<Geometry> {
        &self.geometry
    }

    /// Solid node; also the entity the collider is registered on
    pub fn visual(&self) -> NodeId {
        self.visual
    }

    /// Plane outline or mesh wireframe
    pub fn outline(&self) -> NodeId {
        self.outline
    }

    pub fn occlusion(&self) -> Option<NodeId> {
        self.occlusion
    }

    /// Axis marker, a child of the visual node
    pub fn origin(&self) -> NodeId {
        self.origin
    }

    pub fn collision(&self) -> &CollisionShape {
        &self.collision
    }

    /// Body class, `None` when the surface is visual-only
    pub fn body(&self) -> Option<BodyClass> {
        self.body
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Whether the sensing source drives this surface as player geometry
    ///
    /// Outline and occlusion nodes of a controlled surface are children of
    /// the visual, so they follow whatever poses it.
    pub fn is_controlled(&self) -> bool {
        self.controlled
    }

    /// Root nodes owned by this surface
    pub fn root_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        let followers = (!self.controlled).then_some([Some(self.outline), self.occlusion]);
        let followers = followers.into_iter().flatten().flatten();
        std::iter::once(self.visual).chain(followers)
    }

    /// Nodes shown and hidden with the surface; the origin marker has its own toggle
    pub fn shown_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        [self.visual, self.outline].into_iter().chain(self.occlusion)
    }

    /// Every node owned by this surface, the origin marker included
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.shown_nodes().chain(std::iter::once(self.origin))
    }
}

/// Geometry, outline and collider derived from one sensed report
pub(crate) struct SurfaceGeometry {
    pub geometry: Rc<Geometry>,
    pub outline: Rc<Geometry>,
    pub collision: CollisionShape,
    pub collider_offset: Vec3,
}

impl SurfaceGeometry {
    pub fn build(sensed: &SensedGeometry, config: &TrackerConfig) -> Self {
        match sensed {
            SensedGeometry::Polygon(points) => {
                let (width, height) = plane_extent(points);
                let geometry = Rc::new(Geometry::cuboid(
                    width,
                    config.plane_visual_thickness,
                    height,
                ));
                let outline = Rc::new(Geometry::edges_of(&geometry));
                let collision = CollisionShape::resolve(&Geometry::cuboid(
                    width,
                    config.plane_collider_thickness,
                    height,
                ));
                Self {
                    geometry,
                    outline,
                    collision,
                    collider_offset: Vec3::Y * config.plane_collider_lift,
                }
            }
            SensedGeometry::Triangles { vertices, indices } => {
                let mesh = IndexedMesh::new(vertices.clone(), indices.clone());
                let geometry = Rc::new(Geometry::Indexed(mesh.with_bounding_box()));
                Self::shared(geometry)
            }
            SensedGeometry::Points(points) => {
                Self::shared(Rc::new(Geometry::Points(points.clone())))
            }
        }
    }

    /// Outline drawn from the same buffer as the visual
    fn shared(geometry: Rc<Geometry>) -> Self {
        Self {
            collision: CollisionShape::resolve(&geometry),
            outline: Rc::clone(&geometry),
            geometry,
            collider_offset: Vec3::ZERO,
        }
    }
}

/// Axis-aligned X/Z extent of a boundary polygon; zero for an empty one
pub fn plane_extent(points: &[Vec3]) -> (f32, f32) {
    Aabb::from_points(points).map_or((0.0, 0.0), |aabb| {
        let size = aabb.size();
        (size.x, size.z)
    })
}

pub(crate) fn visual_role(kind: SurfaceKind) -> NodeRole {
    match kind {
        SurfaceKind::Plane => NodeRole::Plane,
        SurfaceKind::Mesh => NodeRole::Mesh,
    }
}

pub(crate) fn outline_role(kind: SurfaceKind) -> NodeRole {
    match kind {
        SurfaceKind::Plane => NodeRole::Outline,
        SurfaceKind::Mesh => NodeRole::Wireframe,
    }
}

pub(crate) fn visual_material(
    kind: SurfaceKind,
    id: SurfaceId,
    config: &TrackerConfig,
) -> Material {
    match kind {
        SurfaceKind::Plane => Material::Solid {
            color: PLANE_COLOR,
            opacity: 0.5,
        },
        SurfaceKind::Mesh => Material::Solid {
            color: config.mesh_color(id),
            opacity: 0.6,
        },
    }
}

pub(crate) fn outline_material(kind: SurfaceKind) -> Material {
    match kind {
        SurfaceKind::Plane => Material::Lines {
            color: OUTLINE_COLOR,
        },
        SurfaceKind::Mesh => Material::Wireframe {
            color: OUTLINE_COLOR,
        },
    }
}

pub(crate) fn origin_geometry() -> Rc<Geometry> {
    Rc::new(Geometry::axes(ORIGIN_AXIS_LENGTH))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensing::rectangle;

    #[test]
    fn test_plane_extent() {
        assert_eq!(plane_extent(&rectangle(2.0, 3.0)), (2.0, 3.0));
        assert_eq!(plane_extent(&[]), (0.0, 0.0));
        let line = [Vec3::new(-1.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0)];
        assert_eq!(plane_extent(&line), (2.0, 0.0));
    }

    #[test]
    fn test_plane_geometry() {
        let config = TrackerConfig::default();
        let built = SurfaceGeometry::build(&SensedGeometry::Polygon(rectangle(2.0, 1.0)), &config);

        let visual = Geometry::cuboid(2.0, config.plane_visual_thickness, 1.0);
        assert_eq!(*built.geometry, visual);
        let Geometry::Edges(edges) = built.outline.as_ref() else {
            panic!("plane outline should be edges");
        };
        assert_eq!(edges.len(), 12);
        assert_eq!(
            built.collision,
            CollisionShape::Box {
                half_extents: Vec3::new(1.0, config.plane_collider_thickness / 2.0, 0.5)
            }
        );
        let lift = Vec3::new(0.0, config.plane_collider_lift, 0.0);
        assert_eq!(built.collider_offset, lift);
    }

    #[test]
    fn test_mesh_geometry_shared_with_wireframe() {
        let config = TrackerConfig::default();
        let sensed = SensedGeometry::Triangles {
            vertices: vec![Vec3::ZERO, Vec3::X, Vec3::Z],
            indices: vec![0, 1, 2],
        };
        let built = SurfaceGeometry::build(&sensed, &config);

        assert!(Rc::ptr_eq(&built.geometry, &built.outline));
        assert!(matches!(built.collision, CollisionShape::TriMesh { .. }));
        let Geometry::Indexed(mesh) = built.geometry.as_ref() else {
            panic!("mesh surfaces build indexed geometry");
        };
        assert!(mesh.bounding_box.is_some());
    }

    #[test]
    fn test_point_cloud_is_visual_only() {
        let built = SurfaceGeometry::build(
            &SensedGeometry::Points(vec![Vec3::ONE, Vec3::ZERO]),
            &TrackerConfig::default(),
        );
        assert!(!built.collision.is_supported());
    }
}
