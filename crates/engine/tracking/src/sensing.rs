//! Interface to the sensing source
//!
//! The device runtime reports planes and meshes behind opaque handles. Each
//! report carries a change version that only grows when the geometry changed,
//! and a pose that must be resolved against a reference space every frame.

use glam::{Mat4, Vec3};

/// Opaque handle the sensing source uses for one surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExternalHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceKind {
    Plane,
    Mesh,
}

/// Geometry as reported by the sensing source
#[derive(Debug, Clone, PartialEq)]
pub enum SensedGeometry {
    /// Plane boundary in plane-local space, lying in the XZ plane
    Polygon(Vec<Vec3>),
    /// Triangle mesh in surface-local space
    Triangles { vertices: Vec<Vec3>, indices: Vec<u32> },
    /// Point cloud with no surface structure
    Points(Vec<Vec3>),
}

/// One surface reported by the sensing source this frame
pub trait DetectedSurface {
    fn handle(&self) -> ExternalHandle;

    fn kind(&self) -> SurfaceKind;

    fn change_version(&self) -> u64;

    fn geometry(&self) -> &SensedGeometry;

    /// World pose relative to `reference`, `None` when not locatable this frame
    fn pose_in(&self, reference: &Mat4) -> Option<Mat4>;

    /// Moved by the application; registered as a controlled body
    fn is_controlled(&self) -> bool {
        false
    }
}

/// Owned surface report
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceSnapshot {
    pub handle: ExternalHandle,
    pub kind: SurfaceKind,
    pub version: u64,
    pub geometry: SensedGeometry,
    /// Pose in the sensing source's own space
    pub pose: Option<Mat4>,
    pub controlled: bool,
}

impl SurfaceSnapshot {
    pub fn plane(handle: u64, version: u64, polygon: Vec<Vec3>, pose: Mat4) -> Self {
        Self {
            handle: ExternalHandle(handle),
            kind: SurfaceKind::Plane,
            version,
            geometry: SensedGeometry::Polygon(polygon),
            pose: Some(pose),
            controlled: false,
        }
    }

    pub fn mesh(
        handle: u64,
        version: u64,
        vertices: Vec<Vec3>,
        indices: Vec<u32>,
        pose: Mat4,
    ) -> Self {
        Self {
            handle: ExternalHandle(handle),
            kind: SurfaceKind::Mesh,
            version,
            geometry: SensedGeometry::Triangles { vertices, indices },
            pose: Some(pose),
            controlled: false,
        }
    }

    pub fn with_pose(mut self, pose: Option<Mat4>) -> Self {
        self.pose = pose;
        self
    }

    pub fn controlled(mut self) -> Self {
        self.controlled = true;
        self
    }
}

impl DetectedSurface for SurfaceSnapshot {
    fn handle(&self) -> ExternalHandle {
        self.handle
    }

    fn kind(&self) -> SurfaceKind {
        self.kind
    }

    fn change_version(&self) -> u64 {
        self.version
    }

    fn geometry(&self) -> &SensedGeometry {
        &self.geometry
    }

    fn pose_in(&self, reference: &Mat4) -> Option<Mat4> {
        self.pose.map(|pose| *reference * pose)
    }

    fn is_controlled(&self) -> bool {
        self.controlled
    }
}

/// Rectangle in the XZ plane centered on the origin, as a boundary polygon
pub fn rectangle(width: f32, depth: f32) -> Vec<Vec3> {
    let (x, z) = (width / 2.0, depth / 2.0);
    vec![
        Vec3::new(-x, 0.0, -z),
        Vec3::new(x, 0.0, -z),
        Vec3::new(x, 0.0, z),
        Vec3::new(-x, 0.0, z),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pose_resolved_against_reference() {
        let snapshot = SurfaceSnapshot::plane(
            1,
            1,
            rectangle(1.0, 1.0),
            Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0)),
        );
        let reference = Mat4::from_translation(Vec3::new(2.0, 0.0, 0.0));
        let pose = snapshot.pose_in(&reference).unwrap();
        assert_eq!(pose.w_axis.truncate(), Vec3::new(2.0, 1.0, 0.0));

        assert!(snapshot.with_pose(None).pose_in(&reference).is_none());
    }

    #[test]
    fn test_controlled_flag() {
        let snapshot = SurfaceSnapshot::mesh(2, 1, Vec::new(), Vec::new(), Mat4::IDENTITY);
        assert!(!snapshot.is_controlled());
        assert!(snapshot.controlled().is_controlled());
    }
}
