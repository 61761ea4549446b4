use crate::clock::{ClockState, SimulationClock, TickReport};
use crate::config::PhysicsConfig;
use crate::error::Result;
use crate::events::{ContactHook, LogContacts};
use crate::registry::{BodyClass, BodyOptions, BodyRegistry};
use crate::shape::CollisionShape;
use crate::world::PhysicsWorld;
use glam::{Quat, Vec3};
use roomsync_scene::{NodeId, SceneContext};
use std::time::{Duration, Instant};

/// Everything the simulation side of a session owns
///
/// Passed explicitly to the tracker and the orchestrator; there is no global
/// physics state. The clock starts on the first successful body registration.
pub struct PhysicsContext {
    world: PhysicsWorld,
    registry: BodyRegistry,
    clock: SimulationClock,
    hook: Box<dyn ContactHook>,
    report_contacts: bool,
}

impl Default for PhysicsContext {
    fn default() -> Self {
        Self::new(&PhysicsConfig::default())
    }
}

impl PhysicsContext {
    pub fn new(config: &PhysicsConfig) -> Self {
        Self {
            world: PhysicsWorld::new(Vec3::from_array(config.gravity)),
            registry: BodyRegistry::new(),
            clock: SimulationClock::from_config(config),
            hook: Box::new(LogContacts),
            report_contacts: config.report_contacts,
        }
    }

    /// Replace the collision response hook
    pub fn with_hook(mut self, hook: impl ContactHook + 'static) -> Self {
        self.hook = Box::new(hook);
        self
    }

    pub fn set_hook(&mut self, hook: impl ContactHook + 'static) {
        self.hook = Box::new(hook);
    }

    /// Register bodies for `entity`; see [`BodyRegistry::add_body`]
    pub fn add_body(
        &mut self,
        scene: &SceneContext,
        entity: NodeId,
        shape: &CollisionShape,
        mut options: BodyOptions,
    ) -> Result<Option<BodyClass>> {
        options.report_contacts &= self.report_contacts;
        let class = self
            .registry
            .add_body(&mut self.world, scene, entity, shape, options)?;
        if class.is_some() {
            self.clock.start();
        }
        Ok(class)
    }

    pub fn set_position(&mut self, entity: NodeId, position: Vec3, index: usize) -> Result<()> {
        self.registry
            .set_position(&mut self.world, entity, position, index)
    }

    pub fn set_velocity(&mut self, entity: NodeId, velocity: Vec3, index: usize) -> Result<()> {
        self.registry
            .set_velocity(&mut self.world, entity, velocity, index)
    }

    pub fn set_position_and_rotation(
        &mut self,
        entity: NodeId,
        position: Vec3,
        rotation: Quat,
        index: usize,
    ) -> Result<()> {
        self.registry
            .set_position_and_rotation(&mut self.world, entity, position, rotation, index)
    }

    pub fn remove_entity(&mut self, entity: NodeId) -> bool {
        self.registry.remove_entity(&mut self.world, entity)
    }

    /// Tick at the current instant
    pub fn tick(&mut self, scene: &mut SceneContext) -> Result<Option<TickReport>> {
        self.tick_at(Instant::now(), scene)
    }

    pub fn tick_at(
        &mut self,
        now: Instant,
        scene: &mut SceneContext,
    ) -> Result<Option<TickReport>> {
        self.clock.tick_at(
            now,
            &mut self.world,
            &self.registry,
            scene,
            self.hook.as_mut(),
        )
    }

    /// Stop the clock and remove every body
    pub fn teardown(&mut self) {
        self.clock.stop();
        self.registry.clear(&mut self.world);
    }

    pub fn clock_state(&self) -> ClockState {
        self.clock.state()
    }

    pub fn period(&self) -> Duration {
        self.clock.period()
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    pub fn registry(&self) -> &BodyRegistry {
        &self.registry
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }
}
