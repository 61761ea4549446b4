//! Scene nodes and their transforms

use crate::geometry::Geometry;
use crate::instances::InstanceBuffer;
use glam::{Mat4, Quat, Vec3};
use std::fmt;
use std::rc::Rc;

/// Stable identifier of a node inside a [`crate::SceneContext`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u64);

impl NodeId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Render group a node belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeRole {
    /// Translucent detected plane
    Plane,
    /// Line outline of a plane
    Outline,
    /// Solid detected mesh
    Mesh,
    /// Wireframe view of a detected mesh
    Wireframe,
    /// Depth-only proxy hiding virtual content behind real geometry
    Occlusion,
    /// Debug origin marker
    Origin,
    /// Simulated content (dynamic bodies, batches, controlled objects)
    Dynamic,
}

/// Material description consumed by the renderer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Material {
    Solid { color: [f32; 3], opacity: f32 },
    Wireframe { color: [f32; 3] },
    Lines { color: [f32; 3] },
    /// Writes depth only, no color
    DepthOnly,
}

/// Translation, rotation and scale of a node relative to its parent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    pub fn from_translation_rotation(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
            scale: Vec3::ONE,
        }
    }

    /// Decompose an affine matrix
    pub fn from_matrix(matrix: Mat4) -> Self {
        let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
        Self {
            translation,
            rotation,
            scale,
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// One disposable visual node
///
/// A node references its geometry through an `Rc`; replacing or removing the
/// node drops that reference.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    pub role: NodeRole,
    pub material: Material,
    pub transform: Transform,
    pub visible: bool,
    geometry: Rc<Geometry>,
    instances: Option<InstanceBuffer>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl SceneNode {
    pub fn new(
        name: impl Into<String>,
        role: NodeRole,
        geometry: Rc<Geometry>,
        material: Material,
    ) -> Self {
        Self {
            name: name.into(),
            role,
            material,
            transform: Transform::IDENTITY,
            visible: true,
            geometry,
            instances: None,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Turn the node into an instanced batch drawing `geometry` once per slot
    pub fn with_instances(mut self, instances: InstanceBuffer) -> Self {
        self.instances = Some(instances);
        self
    }

    pub fn geometry(&self) -> &Rc<Geometry> {
        &self.geometry
    }

    /// Swap the geometry, returning the previous buffer
    pub fn replace_geometry(&mut self, geometry: Rc<Geometry>) -> Rc<Geometry> {
        std::mem::replace(&mut self.geometry, geometry)
    }

    pub fn is_instanced(&self) -> bool {
        self.instances.is_some()
    }

    pub fn instances(&self) -> Option<&InstanceBuffer> {
        self.instances.as_ref()
    }

    pub fn instances_mut(&mut self) -> Option<&mut InstanceBuffer> {
        self.instances.as_mut()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}
