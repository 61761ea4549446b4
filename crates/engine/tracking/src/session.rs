//! Frame orchestration for one tracking session
//!
//! A [`Session`] owns the scene, the physics context and the surface tracker
//! and exposes the two callbacks a host schedules: [`Session::on_render_frame`]
//! at display rate and [`Session::on_physics_tick`] at the simulation rate.
//! Both run on the same thread, so a reconcile pass always completes before
//! the next tick reads the registry.

use crate::config::SessionConfig;
use crate::error::Result;
use crate::sensing::DetectedSurface;
use crate::tracker::{ReconcileDiff, SurfaceTracker};
use glam::{Mat4, Quat, Vec3};
use roomsync_physics::{BodyOptions, CollisionShape, PhysicsContext, TickReport};
use roomsync_scene::{
    Aabb, Geometry, InstanceBuffer, Material, NodeId, NodeRole, SceneContext, SceneNode,
};
use std::rc::Rc;
use std::time::{Duration, Instant};

pub struct Session {
    scene: SceneContext,
    physics: PhysicsContext,
    tracker: SurfaceTracker,
    reference: Mat4,
    bounds: Option<Aabb>,
    frames: u64,
    active: bool,
}

impl Session {
    pub fn new(config: &SessionConfig) -> Self {
        tracing::info!(
            tick_rate_hz = config.physics.tick_rate_hz,
            "session started"
        );
        Self {
            scene: SceneContext::new(),
            physics: PhysicsContext::new(&config.physics),
            tracker: SurfaceTracker::new(config.tracking.clone()),
            reference: Mat4::IDENTITY,
            bounds: None,
            frames: 0,
            active: true,
        }
    }

    /// Use a custom physics context, e.g. one with its own contact hook
    pub fn with_physics(mut self, physics: PhysicsContext) -> Self {
        self.physics = physics;
        self
    }

    /// Set the transform from the sensing source's space into the scene
    pub fn set_reference(&mut self, reference: Mat4) {
        self.reference = reference;
    }

    /// Render callback: reconcile this frame's surfaces
    ///
    /// Surface bounds are recomputed only when the diff is non-empty. An
    /// ended session ignores frames.
    pub fn on_render_frame<S: DetectedSurface>(&mut self, sensed: &[S]) -> Result<ReconcileDiff> {
        if !self.active {
            return Ok(ReconcileDiff::default());
        }
        let diff = self.tracker.reconcile(
            sensed,
            &self.reference,
            &mut self.scene,
            &mut self.physics,
        )?;
        if diff.is_changed() {
            self.bounds = self.tracker.combined_bounds(&self.scene);
        }
        self.frames += 1;
        Ok(diff)
    }

    /// Physics callback at the current instant
    pub fn on_physics_tick(&mut self) -> Result<Option<TickReport>> {
        self.on_physics_tick_at(Instant::now())
    }

    pub fn on_physics_tick_at(&mut self, now: Instant) -> Result<Option<TickReport>> {
        Ok(self.physics.tick_at(now, &mut self.scene)?)
    }

    /// Add a node and register a body for it from its geometry
    pub fn spawn(&mut self, node: SceneNode, options: BodyOptions) -> Result<NodeId> {
        let shape = CollisionShape::resolve(node.geometry());
        let entity = self.scene.add(node);
        self.physics.add_body(&self.scene, entity, &shape, options)?;
        Ok(entity)
    }

    /// Add an instanced batch, one body per matrix
    pub fn spawn_instanced(
        &mut self,
        name: &str,
        geometry: Geometry,
        material: Material,
        matrices: impl IntoIterator<Item = Mat4>,
        options: BodyOptions,
    ) -> Result<NodeId> {
        let node = SceneNode::new(name, NodeRole::Dynamic, Rc::new(geometry), material)
            .with_instances(InstanceBuffer::from_matrices(matrices));
        self.spawn(node, options)
    }

    pub fn set_position(&mut self, entity: NodeId, position: Vec3, index: usize) -> Result<()> {
        Ok(self.physics.set_position(entity, position, index)?)
    }

    pub fn set_velocity(&mut self, entity: NodeId, velocity: Vec3, index: usize) -> Result<()> {
        Ok(self.physics.set_velocity(entity, velocity, index)?)
    }

    pub fn set_position_and_rotation(
        &mut self,
        entity: NodeId,
        position: Vec3,
        rotation: Quat,
        index: usize,
    ) -> Result<()> {
        Ok(self
            .physics
            .set_position_and_rotation(entity, position, rotation, index)?)
    }

    /// Show or hide the origin marker of every tracked surface
    pub fn set_origins_visible(&mut self, visible: bool) -> Result<()> {
        self.tracker.set_origins_visible(&mut self.scene, visible)
    }

    /// Tear the session down: surfaces, bodies, then the remaining scene
    pub fn end(&mut self) {
        if !self.active {
            return;
        }
        let surfaces = self.tracker.teardown(&mut self.scene, &mut self.physics);
        self.physics.teardown();
        self.scene.clear();
        self.bounds = None;
        self.active = false;
        tracing::info!(frames = self.frames, surfaces, "session ended");
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Interval the physics schedule should fire at
    pub fn tick_period(&self) -> Duration {
        self.physics.period()
    }

    /// Union of tracked surface bounds as of the last changing frame
    pub fn surface_bounds(&self) -> Option<Aabb> {
        self.bounds
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn scene(&self) -> &SceneContext {
        &self.scene
    }

    pub fn physics(&self) -> &PhysicsContext {
        &self.physics
    }

    pub fn tracker(&self) -> &SurfaceTracker {
        &self.tracker
    }
}
