//! Fixed-rate simulation clock
//!
//! The clock is driven by an external schedule (see [`SimulationClock::period`])
//! and measures the real time between ticks itself. Each tick advances the
//! world, hands drained contact events to a [`ContactHook`] and writes the
//! resulting poses of every dynamic entity back into the scene.

use crate::config::PhysicsConfig;
use crate::convert::{from_rotation, from_vector};
use crate::error::Result;
use crate::events::ContactHook;
use crate::registry::{BodyRegistry, BodySlot};
use crate::world::PhysicsWorld;
use glam::{Mat4, Vec3};
use roomsync_scene::{NodeId, Object, SceneContext};
use std::time::{Duration, Instant};

/// Default simulation rate
pub const DEFAULT_TICK_RATE_HZ: f32 = 90.0;
/// Default upper bound for one step
pub const DEFAULT_MAX_STEP_SECS: f32 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockState {
    /// No body registered yet
    Idle,
    Running,
    /// Torn down; ticks are ignored
    Stopped,
}

/// Summary of one executed tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    /// Seconds simulated
    pub step: f32,
    /// Tick counter after this tick
    pub tick: u64,
    /// Contact events handed to the hook
    pub contacts: usize,
    /// Dynamic entities written back to the scene
    pub synced_entities: usize,
}

#[derive(Debug, Clone)]
pub struct SimulationClock {
    state: ClockState,
    tick_rate_hz: f32,
    max_step: f32,
    last_tick: Option<Instant>,
    ticks: u64,
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::from_config(&PhysicsConfig::default())
    }
}

impl SimulationClock {
    /// Non-positive or non-finite settings fall back to the defaults
    pub fn new(tick_rate_hz: f32, max_step: f32) -> Self {
        let tick_rate_hz = positive_or(tick_rate_hz, DEFAULT_TICK_RATE_HZ, "tick_rate_hz");
        let max_step = positive_or(max_step, DEFAULT_MAX_STEP_SECS, "max_step_secs");
        Self {
            state: ClockState::Idle,
            tick_rate_hz,
            max_step,
            last_tick: None,
            ticks: 0,
        }
    }

    pub fn from_config(config: &PhysicsConfig) -> Self {
        Self::new(config.tick_rate_hz, config.max_step_secs)
    }

    /// Enter `Running` from `Idle`; returns whether the state changed
    pub fn start(&mut self) -> bool {
        if self.state != ClockState::Idle {
            return false;
        }
        self.state = ClockState::Running;
        tracing::debug!(rate_hz = self.tick_rate_hz, "simulation clock started");
        true
    }

    pub fn stop(&mut self) {
        if self.state != ClockState::Stopped {
            tracing::debug!(ticks = self.ticks, "simulation clock stopped");
        }
        self.state = ClockState::Stopped;
        self.last_tick = None;
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == ClockState::Running
    }

    pub fn tick_rate_hz(&self) -> f32 {
        self.tick_rate_hz
    }

    /// Interval the driving schedule should fire at
    pub fn period(&self) -> Duration {
        Duration::from_secs_f32(1.0 / self.tick_rate_hz)
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Run one tick at `now`
    ///
    /// Returns `None` when the clock is not running or no time has passed
    /// since the previous tick.
    pub fn tick_at(
        &mut self,
        now: Instant,
        world: &mut PhysicsWorld,
        registry: &BodyRegistry,
        scene: &mut SceneContext,
        hook: &mut dyn ContactHook,
    ) -> Result<Option<TickReport>> {
        if self.state != ClockState::Running {
            return Ok(None);
        }

        let mut step = match self.last_tick {
            Some(previous) => now.saturating_duration_since(previous).as_secs_f32(),
            None => 1.0 / self.tick_rate_hz,
        };
        if step <= 0.0 {
            return Ok(None);
        }
        if step > self.max_step {
            tracing::warn!(step, max = self.max_step, "tick overran, clamping step");
            step = self.max_step;
        }
        self.last_tick = Some(now);

        world.step(step);
        self.ticks += 1;
        tracing::trace!(step, tick = self.ticks, "physics tick");

        let events = world.drain_events();
        for event in &events {
            hook.on_contact(event);
        }

        let synced_entities = write_back(world, registry, scene)?;

        Ok(Some(TickReport {
            step,
            tick: self.ticks,
            contacts: events.len(),
            synced_entities,
        }))
    }
}

/// Copy body poses of every dynamic entity into the scene
fn write_back(
    world: &PhysicsWorld,
    registry: &BodyRegistry,
    scene: &mut SceneContext,
) -> Result<usize> {
    let mut synced = 0;
    for (entity, slot) in registry.synced() {
        if !scene.contains(entity) {
            tracing::warn!(%entity, "synchronized entity missing from scene");
            continue;
        }
        match slot {
            BodySlot::Single(handle) => {
                let Some(pose) = body_pose(world, *handle, Vec3::ONE) else {
                    warn_missing(entity);
                    continue;
                };
                let local = scene.parent_matrix(entity)?.inverse() * pose;
                let (_, rotation, translation) = local.to_scale_rotation_translation();
                let node = scene.node_mut(entity)?;
                node.set_position(translation);
                node.set_rotation(rotation);
            }
            BodySlot::Instanced(handles) => {
                let inverse = scene.world_matrix(entity)?.inverse();
                let node = scene.node_mut(entity)?;
                let local_sphere = node.geometry().bounding_sphere();
                let Some(buffer) = node.instances_mut() else {
                    tracing::warn!(%entity, "instanced bodies on a node without instances");
                    continue;
                };
                for (index, handle) in handles.iter().enumerate() {
                    let scale = buffer
                        .matrix_at(index)
                        .map_or(Vec3::ONE, |m| m.to_scale_rotation_translation().0);
                    let Some(pose) = body_pose(world, *handle, scale) else {
                        warn_missing(entity);
                        continue;
                    };
                    buffer.set_matrix_at(index, inverse * pose)?;
                }
                buffer.mark_dirty();
                buffer.compute_bounding_sphere(local_sphere);
            }
        }
        synced += 1;
    }
    Ok(synced)
}

fn body_pose(
    world: &PhysicsWorld,
    handle: rapier3d::prelude::RigidBodyHandle,
    scale: Vec3,
) -> Option<Mat4> {
    let body = world.get_rigid_body(handle)?;
    Some(Mat4::from_scale_rotation_translation(
        scale,
        from_rotation(body.rotation()),
        from_vector(body.translation()),
    ))
}

fn positive_or(value: f32, default: f32, name: &str) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        tracing::warn!(
            value,
            default,
            setting = name,
            "invalid clock setting, using default"
        );
        default
    }
}

fn warn_missing(entity: NodeId) {
    tracing::warn!(%entity, "registered body missing from physics world");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ContactEvent, LogContacts};
    use crate::registry::BodyOptions;
    use crate::shape::CollisionShape;
    use glam::Quat;
    use roomsync_scene::{Geometry, InstanceBuffer, Material, NodeRole, SceneNode, Transform};
    use std::rc::Rc;

    fn ball(position: Vec3) -> SceneNode {
        SceneNode::new(
            "ball",
            NodeRole::Dynamic,
            Rc::new(Geometry::sphere(0.1)),
            Material::Solid {
                color: [0.2, 0.4, 0.8],
                opacity: 1.0,
            },
        )
        .with_transform(Transform::from_translation(position))
    }

    fn running_clock() -> SimulationClock {
        let mut clock = SimulationClock::new(90.0, 0.25);
        assert!(clock.start());
        clock
    }

    #[test]
    fn test_idle_clock_does_nothing() {
        let mut clock = SimulationClock::default();
        let mut world = PhysicsWorld::new(Vec3::new(0.0, -9.81, 0.0));
        let mut scene = SceneContext::new();
        let registry = BodyRegistry::new();

        let report = clock
            .tick_at(
                Instant::now(),
                &mut world,
                &registry,
                &mut scene,
                &mut LogContacts,
            )
            .unwrap();
        assert!(report.is_none());
        assert_eq!(clock.state(), ClockState::Idle);
        assert_eq!(clock.ticks(), 0);
    }

    #[test]
    fn test_period_matches_rate() {
        let clock = SimulationClock::default();
        assert_eq!(clock.tick_rate_hz(), DEFAULT_TICK_RATE_HZ);
        let expected = 1.0 / DEFAULT_TICK_RATE_HZ;
        assert!((clock.period().as_secs_f32() - expected).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_rates_fall_back_to_defaults() {
        for rate in [0.0, -30.0, f32::NAN, f32::INFINITY] {
            let clock = SimulationClock::new(rate, 0.0);
            assert_eq!(clock.tick_rate_hz(), DEFAULT_TICK_RATE_HZ);
            assert!(clock.period() > Duration::ZERO);
        }

        let mut clock = SimulationClock::new(90.0, -1.0);
        clock.start();
        let mut world = PhysicsWorld::new(Vec3::ZERO);
        let mut scene = SceneContext::new();
        let registry = BodyRegistry::new();
        let start = Instant::now();
        clock
            .tick_at(start, &mut world, &registry, &mut scene, &mut LogContacts)
            .unwrap();
        let stalled = clock
            .tick_at(
                start + Duration::from_secs(2),
                &mut world,
                &registry,
                &mut scene,
                &mut LogContacts,
            )
            .unwrap()
            .unwrap();
        assert_eq!(stalled.step, DEFAULT_MAX_STEP_SECS);
    }

    #[test]
    fn test_first_tick_and_clamp() {
        let mut clock = running_clock();
        let mut world = PhysicsWorld::new(Vec3::ZERO);
        let mut scene = SceneContext::new();
        let registry = BodyRegistry::new();
        let start = Instant::now();

        let first = clock
            .tick_at(start, &mut world, &registry, &mut scene, &mut LogContacts)
            .unwrap()
            .unwrap();
        assert!((first.step - 1.0 / 90.0).abs() < 1e-6);
        assert_eq!(first.tick, 1);

        let stalled = clock
            .tick_at(
                start + Duration::from_secs(3),
                &mut world,
                &registry,
                &mut scene,
                &mut LogContacts,
            )
            .unwrap()
            .unwrap();
        assert_eq!(stalled.step, 0.25);

        let same_instant = clock
            .tick_at(
                start + Duration::from_secs(3),
                &mut world,
                &registry,
                &mut scene,
                &mut LogContacts,
            )
            .unwrap();
        assert!(same_instant.is_none());
    }

    #[test]
    fn test_single_body_written_back() {
        let mut clock = running_clock();
        let mut world = PhysicsWorld::new(Vec3::new(0.0, -9.81, 0.0));
        let mut scene = SceneContext::new();
        let mut registry = BodyRegistry::new();
        let entity = scene.add(ball(Vec3::new(0.0, 5.0, 0.0)));
        registry
            .add_body(
                &mut world,
                &scene,
                entity,
                &CollisionShape::Ball { radius: 0.1 },
                BodyOptions::dynamic(1.0),
            )
            .unwrap();

        let start = Instant::now();
        for i in 0..10 {
            clock
                .tick_at(
                    start + Duration::from_millis(11 * i),
                    &mut world,
                    &registry,
                    &mut scene,
                    &mut LogContacts,
                )
                .unwrap();
        }

        let handle = registry.slot(entity).unwrap().handles()[0];
        let body_y = world.get_rigid_body(handle).unwrap().translation().y;
        let node = scene.node(entity).unwrap();
        assert!(node.position().y < 5.0);
        assert!((node.position().y - body_y).abs() < 1e-5);
    }

    #[test]
    fn test_child_entity_written_in_parent_space() {
        let mut clock = running_clock();
        let mut world = PhysicsWorld::new(Vec3::ZERO);
        let mut scene = SceneContext::new();
        let mut registry = BodyRegistry::new();
        let parent = scene.add(ball(Vec3::new(10.0, 0.0, 0.0)));
        let offset = ball(Vec3::new(1.0, 0.0, 0.0));
        let child = scene.add_child(parent, offset).unwrap();
        registry
            .add_body(
                &mut world,
                &scene,
                child,
                &CollisionShape::Ball { radius: 0.1 },
                BodyOptions::default().controlled(),
            )
            .unwrap();

        let target = Vec3::new(12.0, 1.0, 0.0);
        registry
            .set_position_and_rotation(&mut world, child, target, Quat::IDENTITY, 0)
            .unwrap();
        clock
            .tick_at(
                Instant::now(),
                &mut world,
                &registry,
                &mut scene,
                &mut LogContacts,
            )
            .unwrap();

        let local = scene.node(child).unwrap().position();
        assert!(local.abs_diff_eq(Vec3::new(2.0, 1.0, 0.0), 1e-4));
    }

    #[test]
    fn test_instanced_buffer_updated() {
        let mut clock = running_clock();
        let mut world = PhysicsWorld::new(Vec3::new(0.0, -9.81, 0.0));
        let mut scene = SceneContext::new();
        let mut registry = BodyRegistry::new();
        let slots = (0..5).map(|i| {
            Mat4::from_rotation_translation(
                Quat::from_rotation_y(0.3 * i as f32),
                Vec3::new(i as f32, 2.0, 0.0),
            )
        });
        let buffer = InstanceBuffer::from_matrices(slots);
        let entity = scene.add(ball(Vec3::ZERO).with_instances(buffer));
        registry
            .add_body(
                &mut world,
                &scene,
                entity,
                &CollisionShape::Ball { radius: 0.1 },
                BodyOptions::dynamic(1.0),
            )
            .unwrap();
        scene
            .node_mut(entity)
            .unwrap()
            .instances_mut()
            .unwrap()
            .take_dirty();

        let report = clock
            .tick_at(
                Instant::now(),
                &mut world,
                &registry,
                &mut scene,
                &mut LogContacts,
            )
            .unwrap()
            .unwrap();
        assert_eq!(report.synced_entities, 1);

        let node = scene.node(entity).unwrap();
        let buffer = node.instances().unwrap();
        assert!(buffer.is_dirty());
        assert!(buffer.bounding_sphere().is_some());
        assert_eq!(buffer.len(), 5);
        for (index, handle) in registry.slot(entity).unwrap().handles().iter().enumerate() {
            let body = world.get_rigid_body(*handle).unwrap();
            let slot = buffer.matrix_at(index).unwrap();
            let (_, rotation, translation) = slot.to_scale_rotation_translation();
            let position = from_vector(body.translation());
            let expected = from_rotation(body.rotation());
            assert!(translation.abs_diff_eq(position, 1e-5));
            assert!(rotation.dot(expected).abs() > 1.0 - 1e-5);
        }
        let expected = Quat::from_rotation_y(0.3 * 4.0);
        let (_, last, _) = buffer.matrix_at(4).unwrap().to_scale_rotation_translation();
        assert!(last.dot(expected).abs() > 1.0 - 1e-4);
    }

    #[test]
    fn test_contacts_reach_hook() {
        let mut clock = running_clock();
        let mut world = PhysicsWorld::new(Vec3::new(0.0, -9.81, 0.0));
        let mut scene = SceneContext::new();
        let mut registry = BodyRegistry::new();
        let floor = scene.add(SceneNode::new(
            "floor",
            NodeRole::Plane,
            Rc::new(Geometry::cuboid(4.0, 0.1, 4.0)),
            Material::DepthOnly,
        ));
        let falling = scene.add(ball(Vec3::new(0.0, 0.3, 0.0)));
        let floor_shape = CollisionShape::resolve(&Geometry::cuboid(4.0, 0.1, 4.0));
        let options = BodyOptions::default();
        registry
            .add_body(&mut world, &scene, floor, &floor_shape, options)
            .unwrap();
        registry
            .add_body(
                &mut world,
                &scene,
                falling,
                &CollisionShape::Ball { radius: 0.1 },
                BodyOptions::dynamic(1.0),
            )
            .unwrap();

        let mut started = 0;
        let mut hook = |event: &ContactEvent| {
            if matches!(event, ContactEvent::Started { .. }) {
                started += 1;
            }
        };
        let start = Instant::now();
        for i in 0..90 {
            clock
                .tick_at(
                    start + Duration::from_millis(11 * i),
                    &mut world,
                    &registry,
                    &mut scene,
                    &mut hook,
                )
                .unwrap();
        }
        assert!(started >= 1);
    }

    #[test]
    fn test_stopped_clock_ignores_ticks() {
        let mut clock = running_clock();
        clock.stop();
        assert!(!clock.start());

        let mut world = PhysicsWorld::new(Vec3::ZERO);
        let mut scene = SceneContext::new();
        let report = clock
            .tick_at(
                Instant::now(),
                &mut world,
                &BodyRegistry::new(),
                &mut scene,
                &mut LogContacts,
            )
            .unwrap();
        assert!(report.is_none());
        assert_eq!(clock.state(), ClockState::Stopped);
    }
}
