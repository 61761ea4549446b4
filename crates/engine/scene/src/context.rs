//! Scene context: the node arena shared by tracking, physics and rendering

use crate::error::{Result, SceneError};
use crate::node::{NodeId, NodeRole, SceneNode, Transform};
use glam::Mat4;
use std::collections::HashMap;

/// Owns every visual node of a session
///
/// Nodes are addressed by [`NodeId`]; ids are never reused within one
/// context. Removing a node removes its whole subtree.
#[derive(Debug, Default)]
pub struct SceneContext {
    nodes: HashMap<NodeId, SceneNode>,
    next_id: u64,
}

impl SceneContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a root node
    pub fn add(&mut self, mut node: SceneNode) -> NodeId {
        self.next_id += 1;
        let id = NodeId(self.next_id);
        node.parent = None;
        node.children.clear();
        self.nodes.insert(id, node);
        id
    }

    /// Insert a node under an existing parent
    pub fn add_child(&mut self, parent: NodeId, node: SceneNode) -> Result<NodeId> {
        if !self.nodes.contains_key(&parent) {
            return Err(SceneError::UnknownNode(parent));
        }
        let id = self.add(node);
        if let Some(child) = self.nodes.get_mut(&id) {
            child.parent = Some(parent);
        }
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            parent_node.children.push(id);
        }
        Ok(id)
    }

    /// Remove a node and all of its descendants, returning how many were removed
    pub fn remove(&mut self, id: NodeId) -> Result<usize> {
        let node = self.nodes.remove(&id).ok_or(SceneError::UnknownNode(id))?;

        if let Some(parent) = node.parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent.children.retain(|child| *child != id);
        }

        let mut removed = 1;
        let mut pending = node.children;
        while let Some(child) = pending.pop() {
            if let Some(child_node) = self.nodes.remove(&child) {
                removed += 1;
                pending.extend(child_node.children);
            }
        }
        tracing::trace!(%id, removed, "removed node subtree");
        Ok(removed)
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(&id)
    }

    pub fn node(&self, id: NodeId) -> Result<&SceneNode> {
        self.nodes.get(&id).ok_or(SceneError::UnknownNode(id))
    }

    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut SceneNode> {
        self.nodes.get_mut(&id).ok_or(SceneError::UnknownNode(id))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> {
        self.nodes.iter().map(|(id, node)| (*id, node))
    }

    /// Ids of every node in a render group, in insertion order
    pub fn ids_with_role(&self, role: NodeRole) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|(_, node)| node.role == role)
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }

    pub fn set_transform(&mut self, id: NodeId, transform: Transform) -> Result<()> {
        self.node_mut(id)?.transform = transform;
        Ok(())
    }

    pub fn set_visible(&mut self, id: NodeId, visible: bool) -> Result<()> {
        self.node_mut(id)?.visible = visible;
        Ok(())
    }

    /// World matrix of a node (parent chain applied)
    pub fn world_matrix(&self, id: NodeId) -> Result<Mat4> {
        let node = self.node(id)?;
        Ok(self.parent_matrix(id)? * node.transform.matrix())
    }

    /// World matrix of a node's parent, identity for root nodes
    pub fn parent_matrix(&self, id: NodeId) -> Result<Mat4> {
        let mut matrix = Mat4::IDENTITY;
        let mut current = self.node(id)?.parent;
        while let Some(parent) = current {
            let node = self.node(parent)?;
            matrix = node.transform.matrix() * matrix;
            current = node.parent;
        }
        Ok(matrix)
    }

    /// Drop every node
    pub fn clear(&mut self) {
        tracing::trace!(nodes = self.nodes.len(), "clearing scene");
        self.nodes.clear();
    }
}
