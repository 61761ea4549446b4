//! Synthetic sensing source
//!
//! Reports a small room: a floor that is always there, a table that comes and
//! goes, a wall mesh that is re-scanned periodically and a visual-only point
//! cloud.

use glam::{Mat4, Quat, Vec3};
use roomsync_tracking::{rectangle, ExternalHandle, SensedGeometry, SurfaceKind, SurfaceSnapshot};

const FLOOR: u64 = 1;
const TABLE: u64 = 2;
const WALL: u64 = 3;
const CLUTTER: u64 = 4;

/// Frames the table stays visible, then hidden
const TABLE_PERIOD: u64 = 180;
/// Frames between wall re-scans
const WALL_RESCAN: u64 = 240;

#[derive(Debug, Default)]
pub struct SyntheticRoom;

impl SyntheticRoom {
    pub fn new() -> Self {
        Self
    }

    /// Surfaces reported at render frame `frame`
    pub fn sample(&self, frame: u64) -> Vec<SurfaceSnapshot> {
        let mut surfaces = vec![SurfaceSnapshot::plane(
            FLOOR,
            1,
            rectangle(4.0, 4.0),
            Mat4::IDENTITY,
        )];

        if (frame / TABLE_PERIOD) % 2 == 0 {
            surfaces.push(SurfaceSnapshot::plane(
                TABLE,
                1,
                rectangle(1.2, 0.8),
                Mat4::from_translation(Vec3::new(0.6, 0.75, -0.6)),
            ));
        }

        let scans = frame / WALL_RESCAN;
        surfaces.push(wall(1 + scans, 1.0 + 0.25 * scans.min(8) as f32));

        surfaces.push(SurfaceSnapshot {
            handle: ExternalHandle(CLUTTER),
            kind: SurfaceKind::Mesh,
            version: 1,
            geometry: SensedGeometry::Points(vec![
                Vec3::new(-1.5, 0.1, 1.5),
                Vec3::new(-1.4, 0.2, 1.4),
                Vec3::new(-1.6, 0.15, 1.3),
            ]),
            pose: Some(Mat4::IDENTITY),
            controlled: false,
        });
        surfaces
    }
}

/// Two-triangle wall strip of the given height, facing +Z at z = -2
fn wall(version: u64, height: f32) -> SurfaceSnapshot {
    let vertices = vec![
        Vec3::new(-2.0, 0.0, 0.0),
        Vec3::new(2.0, 0.0, 0.0),
        Vec3::new(2.0, height, 0.0),
        Vec3::new(-2.0, height, 0.0),
    ];
    SurfaceSnapshot::mesh(
        WALL,
        version,
        vertices,
        vec![0, 1, 2, 0, 2, 3],
        Mat4::from_rotation_translation(Quat::IDENTITY, Vec3::new(0.0, 0.0, -2.0)),
    )
}
