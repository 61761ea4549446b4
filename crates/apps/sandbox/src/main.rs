mod cli;
mod room;

use anyhow::Result;
use clap::Parser;
use cli::Args;
use glam::{Mat4, Quat, Vec3};
use rand::Rng;
use room::SyntheticRoom;
use roomsync_physics::BodyOptions;
use roomsync_scene::{Geometry, Material, NodeId, NodeRole, SceneNode, Transform};
use roomsync_tracking::Session;
use std::rc::Rc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing_subscriber::EnvFilter;

const SPHERE_RADIUS: f32 = 0.05;
const SPHERE_RESTITUTION: f32 = 1.1;
/// Render frames between two throws
const THROW_EVERY: u64 = 30;

#[derive(Debug, Default)]
struct Stats {
    ticks: u64,
    contacts: usize,
    throws: u64,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = args.load_config()?;

    // Both schedules share one session, so everything runs on a single thread
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run(args, config))
}

async fn run(args: Args, config: roomsync_tracking::SessionConfig) -> Result<()> {
    let mut session = Session::new(&config);
    session.set_origins_visible(args.show_origins)?;

    let spheres = spawn_spheres(&mut session, args.spheres)?;
    let player = spawn_player(&mut session)?;
    let room = SyntheticRoom::new();
    let mut stats = Stats::default();

    let mut render = interval(Duration::from_secs_f32(1.0 / args.render_hz));
    render.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut physics = interval(session.tick_period());
    physics.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    tracing::info!(
        render_hz = args.render_hz,
        physics_hz = 1.0 / session.tick_period().as_secs_f32(),
        spheres = args.spheres,
        "sandbox running"
    );

    loop {
        tokio::select! {
            _ = render.tick() => {
                let frame = session.frames();
                let diff = session.on_render_frame(&room.sample(frame))?;
                if diff.is_changed() {
                    tracing::info!(
                        frame,
                        added = diff.added.len(),
                        updated = diff.updated.len(),
                        removed = diff.removed.len(),
                        bounds = ?session.surface_bounds(),
                        "surfaces changed"
                    );
                }

                let (position, rotation) = player_pose(frame);
                session.set_position_and_rotation(player, position, rotation, 0)?;

                if let Some(spheres) = spheres {
                    if frame % THROW_EVERY == 0 && args.spheres > 0 {
                        let index = ((frame / THROW_EVERY) as usize) % args.spheres;
                        session.set_position(spheres, position + Vec3::Y * 0.2, index)?;
                        session.set_velocity(spheres, throw_velocity(position), index)?;
                        stats.throws += 1;
                    }
                }

                if args.frames.is_some_and(|limit| session.frames() >= limit) {
                    break;
                }
            }
            _ = physics.tick() => {
                if let Some(report) = session.on_physics_tick()? {
                    stats.ticks += 1;
                    stats.contacts += report.contacts;
                }
            }
            result = &mut shutdown => {
                result?;
                tracing::info!("interrupted");
                break;
            }
        }
    }

    let surfaces = session.tracker().len();
    session.end();
    tracing::info!(
        frames = session.frames(),
        ticks = stats.ticks,
        contacts = stats.contacts,
        throws = stats.throws,
        surfaces,
        "sandbox finished"
    );
    Ok(())
}

/// Drop `count` spheres at random positions above the floor as one batch
fn spawn_spheres(session: &mut Session, count: usize) -> Result<Option<NodeId>> {
    if count == 0 {
        return Ok(None);
    }
    let mut rng = rand::rng();
    let matrices: Vec<Mat4> = (0..count)
        .map(|_| {
            Mat4::from_translation(Vec3::new(
                rng.random_range(-2.0..2.0),
                rng.random_range(0.0..4.0),
                rng.random_range(-2.0..2.0),
            ))
        })
        .collect();

    let entity = session.spawn_instanced(
        "spheres",
        Geometry::icosahedron(SPHERE_RADIUS, 1),
        Material::Solid {
            color: [0.3, 0.7, 1.0],
            opacity: 1.0,
        },
        matrices,
        BodyOptions::dynamic(1.0).with_restitution(SPHERE_RESTITUTION),
    )?;
    Ok(Some(entity))
}

/// Controlled cube standing in for a tracked controller
fn spawn_player(session: &mut Session) -> Result<NodeId> {
    let (position, rotation) = player_pose(0);
    let node = SceneNode::new(
        "player",
        NodeRole::Dynamic,
        Rc::new(Geometry::cuboid(0.2, 0.2, 0.2)),
        Material::Solid {
            color: [1.0, 0.4, 0.2],
            opacity: 1.0,
        },
    )
    .with_transform(Transform::from_translation_rotation(position, rotation));
    Ok(session.spawn(node, BodyOptions::default().controlled())?)
}

/// Slow circle around the room center at hand height
fn player_pose(frame: u64) -> (Vec3, Quat) {
    let angle = frame as f32 * 0.01;
    let position = Vec3::new(angle.cos(), 1.2, angle.sin());
    (position, Quat::from_rotation_y(-angle))
}

/// Toss toward the room center with some lift
fn throw_velocity(from: Vec3) -> Vec3 {
    let toward = Vec3::new(-from.x, 0.0, -from.z).normalize_or_zero();
    toward * 2.0 + Vec3::Y * 2.5
}
