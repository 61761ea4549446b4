//! Frame-over-frame reconciliation of sensed surfaces
//!
//! Each render frame the sensing source reports the full set of surfaces it
//! currently knows. [`SurfaceTracker::reconcile`] diffs that set against the
//! tracked one by handle: absent surfaces are disposed, new ones get scene
//! nodes and a collider, and known ones are re-posed and, when their change
//! version grew, rebuilt.

use crate::config::TrackerConfig;
use crate::error::Result;
use crate::handles::{HandleIds, SurfaceId};
use crate::sensing::{DetectedSurface, ExternalHandle, SurfaceKind};
use crate::surface::{
    origin_geometry, outline_material, outline_role, visual_material, visual_role,
    SurfaceGeometry, TrackedSurface,
};
use glam::Mat4;
use roomsync_physics::{BodyClass, BodyOptions, PhysicsContext};
use roomsync_scene::{Aabb, Material, NodeId, NodeRole, SceneContext, SceneNode, Transform};
use std::collections::{BTreeMap, HashSet};
use std::rc::Rc;

/// Surfaces touched by one reconcile pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileDiff {
    pub added: Vec<SurfaceId>,
    pub updated: Vec<SurfaceId>,
    pub removed: Vec<SurfaceId>,
}

impl ReconcileDiff {
    /// Whether the set or shape of tracked surfaces changed
    pub fn is_changed(&self) -> bool {
        !(self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty())
    }
}

#[derive(Debug, Default)]
pub struct SurfaceTracker {
    config: TrackerConfig,
    ids: HandleIds,
    surfaces: BTreeMap<SurfaceId, TrackedSurface>,
    origins_visible: bool,
}

impl SurfaceTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Bring tracked surfaces in line with this frame's sensing report
    ///
    /// `reference` maps the sensing source's space into scene space.
    pub fn reconcile<S: DetectedSurface>(
        &mut self,
        sensed: &[S],
        reference: &Mat4,
        scene: &mut SceneContext,
        physics: &mut PhysicsContext,
    ) -> Result<ReconcileDiff> {
        let mut diff = ReconcileDiff::default();

        let present: HashSet<ExternalHandle> = sensed.iter().map(|s| s.handle()).collect();
        let stale: Vec<SurfaceId> = self
            .surfaces
            .values()
            .filter(|surface| !present.contains(&surface.handle))
            .map(|surface| surface.id)
            .collect();
        for id in stale {
            if self.dispose(id, scene, physics) {
                diff.removed.push(id);
            }
        }

        for surface in sensed {
            match self.ids.get(surface.handle()) {
                None => diff.added.push(self.add(surface, reference, scene, physics)?),
                Some(id) => {
                    self.update_pose(id, surface, reference, scene, physics)?;
                    if self.update_geometry(id, surface, scene, physics)? {
                        diff.updated.push(id);
                    }
                }
            }
        }

        Ok(diff)
    }

    fn add<S: DetectedSurface>(
        &mut self,
        sensed: &S,
        reference: &Mat4,
        scene: &mut SceneContext,
        physics: &mut PhysicsContext,
    ) -> Result<SurfaceId> {
        let handle = sensed.handle();
        if self.ids.was_released(handle) {
            tracing::debug!(?handle, "handle seen again after removal, tracking as new surface");
        }
        let id = self.ids.assign(handle);
        let built = SurfaceGeometry::build(sensed.geometry(), &self.config);
        let pose = sensed.pose_in(reference);
        let options = self.body_options(sensed, &built);

        let mut created = Vec::new();
        let attached = self
            .spawn_nodes(id, sensed, pose, &built, scene, &mut created)
            .and_then(|nodes| {
                let body = physics.add_body(scene, nodes.visual, &built.collision, options)?;
                Ok((nodes, body))
            });
        let (nodes, body) = match attached {
            Ok(attached) => attached,
            Err(err) => {
                self.roll_back(id, handle, created, scene, physics);
                return Err(err);
            }
        };

        tracing::debug!(
            %id,
            ?handle,
            kind = ?sensed.kind(),
            version = sensed.change_version(),
            geometry = built.geometry.kind_name(),
            ?body,
            "surface added"
        );

        self.surfaces.insert(
            id,
            TrackedSurface {
                id,
                handle,
                kind: sensed.kind(),
                change_version: sensed.change_version(),
                geometry: built.geometry,
                visual: nodes.visual,
                outline: nodes.outline,
                occlusion: nodes.occlusion,
                origin: nodes.origin,
                collision: built.collision,
                body,
                controlled: sensed.is_controlled(),
                visible: pose.is_some(),
            },
        );
        Ok(id)
    }

    /// Undo a surface whose creation failed part way
    fn roll_back(
        &mut self,
        id: SurfaceId,
        handle: ExternalHandle,
        created: Vec<NodeId>,
        scene: &mut SceneContext,
        physics: &mut PhysicsContext,
    ) {
        if let Some(&visual) = created.first() {
            physics.remove_entity(visual);
        }
        for node in created.into_iter().rev() {
            if let Err(err) = scene.remove(node) {
                tracing::warn!(%id, %err, "rollback of surface node failed");
            }
        }
        self.ids.forget(handle);
        tracing::debug!(%id, ?handle, "surface creation rolled back");
    }

    /// Create the scene nodes of a new surface, recording each in `created`
    fn spawn_nodes<S: DetectedSurface>(
        &self,
        id: SurfaceId,
        sensed: &S,
        pose: Option<Mat4>,
        built: &SurfaceGeometry,
        scene: &mut SceneContext,
        created: &mut Vec<NodeId>,
    ) -> Result<SurfaceNodes> {
        let kind = sensed.kind();
        let transform = pose.map(Transform::from_matrix).unwrap_or_default();
        let visible = pose.is_some();

        let visual = attach(
            scene,
            created,
            None,
            SceneNode::new(
                format!("{id}"),
                visual_role(kind),
                Rc::clone(&built.geometry),
                visual_material(kind, id, &self.config),
            )
            .with_transform(transform)
            .with_visible(visible),
        )?;

        // The body of a controlled surface owns the visual's pose
        let (follow, follower_transform) = if sensed.is_controlled() {
            (Some(visual), Transform::IDENTITY)
        } else {
            (None, transform)
        };
        let outline = attach(
            scene,
            created,
            follow,
            SceneNode::new(
                format!("{id}/outline"),
                outline_role(kind),
                Rc::clone(&built.outline),
                outline_material(kind),
            )
            .with_transform(follower_transform)
            .with_visible(visible),
        )?;
        let occlusion = if kind == SurfaceKind::Mesh && self.config.occlusion_proxies {
            Some(attach(
                scene,
                created,
                follow,
                SceneNode::new(
                    format!("{id}/occlusion"),
                    NodeRole::Occlusion,
                    Rc::clone(&built.geometry),
                    Material::DepthOnly,
                )
                .with_transform(follower_transform)
                .with_visible(visible),
            )?)
        } else {
            None
        };
        let origin = attach(
            scene,
            created,
            Some(visual),
            SceneNode::new(
                format!("{id}/origin"),
                NodeRole::Origin,
                origin_geometry(),
                Material::Lines {
                    color: [1.0, 1.0, 0.0],
                },
            )
            .with_visible(self.origins_visible),
        )?;

        Ok(SurfaceNodes {
            visual,
            outline,
            occlusion,
            origin,
        })
    }

    fn update_pose<S: DetectedSurface>(
        &mut self,
        id: SurfaceId,
        sensed: &S,
        reference: &Mat4,
        scene: &mut SceneContext,
        physics: &mut PhysicsContext,
    ) -> Result<()> {
        let Some(surface) = self.surfaces.get_mut(&id) else {
            return Ok(());
        };
        let pose = sensed.pose_in(reference);
        if let Some(pose) = pose {
            if surface.body == Some(BodyClass::Dynamic) {
                // Reaches the visual on the next tick's write-back
                let (_, rotation, translation) = pose.to_scale_rotation_translation();
                physics.set_position_and_rotation(surface.visual, translation, rotation, 0)?;
            } else {
                for node in surface.root_nodes() {
                    scene.set_transform(node, Transform::from_matrix(pose))?;
                }
            }
        }
        for node in surface.shown_nodes() {
            scene.set_visible(node, pose.is_some())?;
        }
        if surface.visible != pose.is_some() {
            tracing::debug!(%id, visible = pose.is_some(), "surface visibility changed");
        }
        surface.visible = pose.is_some();
        Ok(())
    }

    /// Rebuild geometry if the reported version grew; returns whether it did
    fn update_geometry<S: DetectedSurface>(
        &mut self,
        id: SurfaceId,
        sensed: &S,
        scene: &mut SceneContext,
        physics: &mut PhysicsContext,
    ) -> Result<bool> {
        let version = sensed.change_version();
        let resync = self.config.resync_colliders_on_update;
        let built = match self.surfaces.get(&id) {
            Some(surface) if version > surface.change_version => {
                SurfaceGeometry::build(sensed.geometry(), &self.config)
            }
            _ => return Ok(false),
        };
        let options = self.body_options(sensed, &built);
        let Some(surface) = self.surfaces.get_mut(&id) else {
            return Ok(false);
        };

        scene
            .node_mut(surface.visual)?
            .replace_geometry(Rc::clone(&built.geometry));
        scene
            .node_mut(surface.outline)?
            .replace_geometry(Rc::clone(&built.outline));
        if let Some(occlusion) = surface.occlusion {
            scene
                .node_mut(occlusion)?
                .replace_geometry(Rc::clone(&built.geometry));
        }

        tracing::debug!(
            %id,
            from = surface.change_version,
            to = version,
            "surface geometry updated"
        );
        surface.geometry = built.geometry;
        surface.change_version = version;

        if resync {
            physics.remove_entity(surface.visual);
            surface.body = physics.add_body(scene, surface.visual, &built.collision, options)?;
            surface.collision = built.collision;
        }
        Ok(true)
    }

    fn body_options<S: DetectedSurface>(&self, sensed: &S, built: &SurfaceGeometry) -> BodyOptions {
        let options = BodyOptions::default().with_collider_offset(built.collider_offset);
        if sensed.is_controlled() {
            options.controlled()
        } else {
            options
        }
    }

    /// Dispose one tracked surface; returns whether it was tracked
    pub fn dispose(
        &mut self,
        id: SurfaceId,
        scene: &mut SceneContext,
        physics: &mut PhysicsContext,
    ) -> bool {
        let Some(surface) = self.surfaces.remove(&id) else {
            return false;
        };
        physics.remove_entity(surface.visual);
        for node in surface.root_nodes() {
            if let Err(err) = scene.remove(node) {
                tracing::warn!(%id, %err, "surface node already gone");
            }
        }
        self.ids.release(surface.handle);
        tracing::debug!(%id, handle = ?surface.handle, "surface removed");
        true
    }

    /// Dispose every tracked surface
    pub fn teardown(&mut self, scene: &mut SceneContext, physics: &mut PhysicsContext) -> usize {
        let ids: Vec<SurfaceId> = self.surfaces.keys().copied().collect();
        ids.into_iter()
            .filter(|id| self.dispose(*id, scene, physics))
            .count()
    }

    /// Show or hide every origin marker
    pub fn set_origins_visible(&mut self, scene: &mut SceneContext, visible: bool) -> Result<()> {
        self.origins_visible = visible;
        for surface in self.surfaces.values() {
            scene.set_visible(surface.origin, visible)?;
        }
        Ok(())
    }

    pub fn origins_visible(&self) -> bool {
        self.origins_visible
    }

    /// World-space bounds of all tracked visuals
    pub fn combined_bounds(&self, scene: &SceneContext) -> Option<Aabb> {
        self.surfaces
            .values()
            .filter_map(|surface| {
                let node = scene.get(surface.visual)?;
                let local = node.geometry().local_bounds()?;
                let world = scene.world_matrix(surface.visual).ok()?;
                Some(local.transformed(&world))
            })
            .reduce(|acc, aabb| acc.union(&aabb))
    }

    pub fn get(&self, id: SurfaceId) -> Option<&TrackedSurface> {
        self.surfaces.get(&id)
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    /// Tracked surfaces ordered by id
    pub fn iter(&self) -> impl Iterator<Item = &TrackedSurface> {
        self.surfaces.values()
    }
}

struct SurfaceNodes {
    visual: NodeId,
    outline: NodeId,
    occlusion: Option<NodeId>,
    origin: NodeId,
}

/// Add `node` under `parent` (or as a root) and record it
fn attach(
    scene: &mut SceneContext,
    created: &mut Vec<NodeId>,
    parent: Option<NodeId>,
    node: SceneNode,
) -> Result<NodeId> {
    let id = match parent {
        Some(parent) => scene.add_child(parent, node)?,
        None => scene.add(node),
    };
    created.push(id);
    Ok(id)
}
