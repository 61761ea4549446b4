//! Registry of simulated bodies keyed by their owning scene node
//!
//! Dynamic entities (positive mass or externally controlled) are kept in
//! registration order and read back by the clock every tick. Static bodies
//! live in a separate index that only serves removal: they are never read
//! back and the setters cannot address them.

use crate::convert::{to_isometry, to_vector};
use crate::error::{PhysicsError, Result};
use crate::shape::CollisionShape;
use crate::world::PhysicsWorld;
use glam::{Quat, Vec3};
use rapier3d::prelude::*;
use roomsync_scene::{NodeId, SceneContext};
use std::collections::HashMap;

/// How a registered body participates in the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyClass {
    /// Fixed body, never read back
    Static,
    /// Simulated or controlled body, read back every tick
    Dynamic,
}

/// Parameters for [`BodyRegistry::add_body`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyOptions {
    /// Mass in kilograms; zero makes a static body unless `controlled`
    pub mass: f32,
    pub restitution: f32,
    /// Moved by the application rather than by forces
    pub controlled: bool,
    /// Collider offset in the body's local frame
    pub collider_offset: Vec3,
    /// Raise collision and contact-force events for this collider
    pub report_contacts: bool,
}

impl Default for BodyOptions {
    fn default() -> Self {
        Self {
            mass: 0.0,
            restitution: 0.0,
            controlled: false,
            collider_offset: Vec3::ZERO,
            report_contacts: true,
        }
    }
}

impl BodyOptions {
    /// Options for a free-moving body of the given mass
    pub fn dynamic(mass: f32) -> Self {
        Self {
            mass,
            ..Self::default()
        }
    }

    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self
    }

    pub fn controlled(mut self) -> Self {
        self.controlled = true;
        self
    }

    pub fn with_collider_offset(mut self, offset: Vec3) -> Self {
        self.collider_offset = offset;
        self
    }

    pub fn reporting_contacts(mut self, report: bool) -> Self {
        self.report_contacts = report;
        self
    }

    pub fn is_dynamic(&self) -> bool {
        self.mass > 0.0 || self.controlled
    }

    fn class(&self) -> BodyClass {
        if self.is_dynamic() {
            BodyClass::Dynamic
        } else {
            BodyClass::Static
        }
    }
}

/// Bodies owned by one entity
#[derive(Debug, Clone, PartialEq)]
pub enum BodySlot {
    Single(RigidBodyHandle),
    /// One body per instance slot, aligned with the instance buffer
    Instanced(Vec<RigidBodyHandle>),
}

impl BodySlot {
    pub fn handles(&self) -> &[RigidBodyHandle] {
        match self {
            BodySlot::Single(handle) => std::slice::from_ref(handle),
            BodySlot::Instanced(handles) => handles,
        }
    }

    pub fn len(&self) -> usize {
        self.handles().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles().is_empty()
    }

    fn handle(&self, entity: NodeId, index: usize) -> Result<RigidBodyHandle> {
        match self {
            BodySlot::Single(handle) => Ok(*handle),
            BodySlot::Instanced(handles) => {
                handles
                    .get(index)
                    .copied()
                    .ok_or(PhysicsError::InstanceOutOfRange {
                        entity,
                        index,
                        count: handles.len(),
                    })
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct BodyRegistry {
    dynamic: HashMap<NodeId, BodySlot>,
    sync_order: Vec<NodeId>,
    fixed: HashMap<NodeId, BodySlot>,
}

impl BodyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the bodies of `entity` from its current scene pose
    ///
    /// Instanced nodes get one body per slot, all sharing one engine shape.
    /// Returns `None` when the shape has no engine counterpart, in which case
    /// nothing is registered. Registering an entity again replaces its bodies.
    pub fn add_body(
        &mut self,
        world: &mut PhysicsWorld,
        scene: &SceneContext,
        entity: NodeId,
        shape: &CollisionShape,
        options: BodyOptions,
    ) -> Result<Option<BodyClass>> {
        let node = scene.node(entity)?;
        let Some(shared) = shape.to_shared_shape() else {
            tracing::debug!(%entity, "no collision shape, entity stays visual-only");
            return Ok(None);
        };

        let node_matrix = scene.world_matrix(entity)?;
        let poses: Vec<(Vec3, Quat)> = match node.instances() {
            Some(buffer) => buffer
                .matrices()
                .map(|slot| {
                    let (_, rotation, translation) =
                        (node_matrix * slot).to_scale_rotation_translation();
                    (translation, rotation)
                })
                .collect(),
            None => {
                let (_, rotation, translation) = node_matrix.to_scale_rotation_translation();
                vec![(translation, rotation)]
            }
        };

        self.remove_entity(world, entity);

        let class = options.class();
        let handles: Vec<RigidBodyHandle> = poses
            .into_iter()
            .map(|(translation, rotation)| {
                let builder = match class {
                    BodyClass::Dynamic if options.mass > 0.0 => RigidBodyBuilder::dynamic(),
                    BodyClass::Dynamic => RigidBodyBuilder::kinematic_position_based(),
                    BodyClass::Static => RigidBodyBuilder::fixed(),
                };
                let body = builder.position(to_isometry(translation, rotation)).build();
                let handle = world.add_rigid_body(body);

                let mut collider = ColliderBuilder::new(shared.clone())
                    .restitution(options.restitution)
                    .translation(to_vector(options.collider_offset));
                if options.mass > 0.0 {
                    collider = collider.mass(options.mass);
                }
                if options.report_contacts {
                    collider = collider.active_events(
                        ActiveEvents::COLLISION_EVENTS | ActiveEvents::CONTACT_FORCE_EVENTS,
                    );
                }
                world.add_collider(collider.build(), handle);
                handle
            })
            .collect();

        let slot = if node.is_instanced() {
            BodySlot::Instanced(handles)
        } else {
            match handles.first() {
                Some(handle) => BodySlot::Single(*handle),
                None => return Ok(None),
            }
        };

        tracing::debug!(%entity, ?class, bodies = slot.len(), "registered bodies");
        match class {
            BodyClass::Dynamic => {
                self.dynamic.insert(entity, slot);
                self.sync_order.push(entity);
            }
            BodyClass::Static => {
                self.fixed.insert(entity, slot);
            }
        }
        Ok(Some(class))
    }

    /// Teleport a body, zeroing its momentum
    pub fn set_position(
        &self,
        world: &mut PhysicsWorld,
        entity: NodeId,
        position: Vec3,
        index: usize,
    ) -> Result<()> {
        let body = self.body_mut(world, entity, index)?;
        body.set_linvel(vector![0.0, 0.0, 0.0], true);
        body.set_angvel(vector![0.0, 0.0, 0.0], true);
        body.set_translation(to_vector(position), true);
        Ok(())
    }

    /// Set the linear velocity of a body
    pub fn set_velocity(
        &self,
        world: &mut PhysicsWorld,
        entity: NodeId,
        velocity: Vec3,
        index: usize,
    ) -> Result<()> {
        self.body_mut(world, entity, index)?
            .set_linvel(to_vector(velocity), true);
        Ok(())
    }

    /// Teleport and reorient a body, zeroing its momentum
    pub fn set_position_and_rotation(
        &self,
        world: &mut PhysicsWorld,
        entity: NodeId,
        position: Vec3,
        rotation: Quat,
        index: usize,
    ) -> Result<()> {
        let body = self.body_mut(world, entity, index)?;
        body.set_linvel(vector![0.0, 0.0, 0.0], true);
        body.set_angvel(vector![0.0, 0.0, 0.0], true);
        body.set_position(to_isometry(position, rotation), true);
        Ok(())
    }

    /// Remove every body of `entity`; returns whether anything was registered
    pub fn remove_entity(&mut self, world: &mut PhysicsWorld, entity: NodeId) -> bool {
        let mut removed = false;
        if let Some(slot) = self.dynamic.remove(&entity) {
            self.sync_order.retain(|id| *id != entity);
            Self::remove_bodies(world, &slot);
            removed = true;
        }
        if let Some(slot) = self.fixed.remove(&entity) {
            Self::remove_bodies(world, &slot);
            removed = true;
        }
        if removed {
            tracing::debug!(%entity, "removed bodies");
        }
        removed
    }

    /// Remove every registered body from the engine
    pub fn clear(&mut self, world: &mut PhysicsWorld) {
        for slot in self.dynamic.values().chain(self.fixed.values()) {
            Self::remove_bodies(world, slot);
        }
        self.dynamic.clear();
        self.sync_order.clear();
        self.fixed.clear();
    }

    /// Dynamic entities in registration order
    pub fn synced(&self) -> impl Iterator<Item = (NodeId, &BodySlot)> + '_ {
        self.sync_order
            .iter()
            .filter_map(|id| self.dynamic.get(id).map(|slot| (*id, slot)))
    }

    /// Bodies of an entity, static or dynamic
    pub fn slot(&self, entity: NodeId) -> Option<&BodySlot> {
        self.dynamic.get(&entity).or_else(|| self.fixed.get(&entity))
    }

    pub fn contains(&self, entity: NodeId) -> bool {
        self.dynamic.contains_key(&entity) || self.fixed.contains_key(&entity)
    }

    pub fn dynamic_len(&self) -> usize {
        self.dynamic.len()
    }

    pub fn static_len(&self) -> usize {
        self.fixed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dynamic.is_empty() && self.fixed.is_empty()
    }

    fn body_mut<'w>(
        &self,
        world: &'w mut PhysicsWorld,
        entity: NodeId,
        index: usize,
    ) -> Result<&'w mut RigidBody> {
        let handle = self
            .dynamic
            .get(&entity)
            .ok_or(PhysicsError::NoBody(entity))?
            .handle(entity, index)?;
        world
            .get_rigid_body_mut(handle)
            .ok_or(PhysicsError::MissingBody(handle))
    }

    fn remove_bodies(world: &mut PhysicsWorld, slot: &BodySlot) {
        for handle in slot.handles() {
            world.remove_rigid_body(*handle);
        }
    }
}
