//! Minimal scene graph: named nodes with local transforms arranged in a tree.
//!
//! Face turns move pieces between parents without moving them on screen, so
//! besides plain `add_child` the graph offers `detach` and `attach`, which
//! keep a node's world transform intact across the move.
//!
//! Rotations are stored as unit quaternions. Baking a world transform into a
//! local one on every detach/attach must not lose precision, and Euler
//! angles do near gimbal lock.

use std::fmt;

use glam::{Mat4, Quat, Vec3};
use rustc_hash::FxHashMap;

use crate::error::SceneError;
use crate::geometry::Face;

/// Handle to a node in a `SceneGraph`. Ids are never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Local transform of a node relative to its parent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Decomposes an affine matrix into position, rotation and scale.
    pub fn from_matrix(matrix: &Mat4) -> Self {
        let (scale, rotation, position) = matrix.to_scale_rotation_translation();
        Self {
            position,
            rotation: rotation.normalize(),
            scale,
        }
    }
}

/// Shape of the rounded body of a piece, in piece-local units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyShape {
    pub size: f32,
    /// Corner radius as a fraction of `size`.
    pub corner_radius: f32,
    pub segments: u32,
}

/// Shape of a sticker plate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StickerShape {
    pub size: f32,
    pub corner_roundness: f32,
    pub depth: f32,
}

/// What a node draws, if anything. Colors live in the piece model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Visual {
    Body(BodyShape),
    Sticker { face: Face, shape: StickerShape },
}

#[derive(Clone, Debug)]
struct Node {
    name: String,
    transform: Transform,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    visual: Option<Visual>,
}

/// A tree of nodes rooted at a single scene node.
#[derive(Clone, Debug)]
pub struct SceneGraph {
    nodes: FxHashMap<NodeId, Node>,
    next_id: u32,
    root: NodeId,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    pub fn new() -> Self {
        let root = NodeId(0);
        let mut nodes = FxHashMap::default();
        nodes.insert(
            root,
            Node {
                name: "scene".to_string(),
                transform: Transform::IDENTITY,
                parent: None,
                children: Vec::new(),
                visual: None,
            },
        );
        Self {
            nodes,
            next_id: 1,
            root,
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    fn node(&self, id: NodeId) -> Result<&Node, SceneError> {
        self.nodes.get(&id).ok_or(SceneError::MissingNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, SceneError> {
        self.nodes.get_mut(&id).ok_or(SceneError::MissingNode(id))
    }

    /// Creates a detached node with an identity transform.
    pub fn create(&mut self, name: impl Into<String>) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            Node {
                name: name.into(),
                transform: Transform::IDENTITY,
                parent: None,
                children: Vec::new(),
                visual: None,
            },
        );
        id
    }

    /// Creates a node directly under `parent`.
    pub fn create_child(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
    ) -> Result<NodeId, SceneError> {
        self.node(parent)?;
        let id = self.create(name);
        self.add_child(parent, id)?;
        Ok(id)
    }

    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.nodes.get(&id).map(|node| node.name.as_str())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|node| node.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(&id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn transform(&self, id: NodeId) -> Option<&Transform> {
        self.nodes.get(&id).map(|node| &node.transform)
    }

    pub fn transform_mut(&mut self, id: NodeId) -> Option<&mut Transform> {
        self.nodes.get_mut(&id).map(|node| &mut node.transform)
    }

    pub fn set_transform(&mut self, id: NodeId, transform: Transform) -> Result<(), SceneError> {
        self.node_mut(id)?.transform = transform;
        Ok(())
    }

    pub fn visual(&self, id: NodeId) -> Option<&Visual> {
        self.nodes.get(&id).and_then(|node| node.visual.as_ref())
    }

    pub fn set_visual(&mut self, id: NodeId, visual: Visual) -> Result<(), SceneError> {
        self.node_mut(id)?.visual = Some(visual);
        Ok(())
    }

    /// Whether `ancestor` is `id` itself or one of its parents.
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// Moves `child` under `parent`, keeping its local transform.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        self.node(parent)?;
        self.node(child)?;
        if self.is_ancestor(child, parent) {
            return Err(SceneError::Cycle { parent, child });
        }
        self.unlink(child)?;
        self.node_mut(parent)?.children.push(child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Removes `child` from its parent's child list, keeping its local transform.
    fn unlink(&mut self, child: NodeId) -> Result<(), SceneError> {
        if let Some(parent) = self.node_mut(child)?.parent.take() {
            self.node_mut(parent)?.children.retain(|&id| id != child);
        }
        Ok(())
    }

    /// Deletes a node and its whole subtree.
    pub fn remove(&mut self, id: NodeId) -> Result<(), SceneError> {
        self.unlink(id)?;
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            if let Some(node) = self.nodes.remove(&next) {
                pending.extend(node.children);
            }
        }
        Ok(())
    }

    /// Deletes every child subtree of `id`, keeping `id` itself.
    pub fn clear_children(&mut self, id: NodeId) -> Result<(), SceneError> {
        let children = self.node(id)?.children.clone();
        for child in children {
            self.remove(child)?;
        }
        Ok(())
    }

    /// World matrix of a node: the product of every local matrix up to the root.
    pub fn world_matrix(&self, id: NodeId) -> Result<Mat4, SceneError> {
        let mut node = self.node(id)?;
        let mut matrix = node.transform.matrix();
        while let Some(parent) = node.parent {
            node = self.node(parent)?;
            matrix = node.transform.matrix() * matrix;
        }
        Ok(matrix)
    }

    pub fn world_transform(&self, id: NodeId) -> Result<Transform, SceneError> {
        Ok(Transform::from_matrix(&self.world_matrix(id)?))
    }

    /// Takes a node out of the tree, leaving it parentless with its world
    /// transform baked into its local transform. Returns that world matrix.
    pub fn detach(&mut self, id: NodeId) -> Result<Mat4, SceneError> {
        let world = self.world_matrix(id)?;
        self.unlink(id)?;
        self.node_mut(id)?.transform = Transform::from_matrix(&world);
        Ok(world)
    }

    /// Moves a node under `parent` so that its world transform is unchanged,
    /// converting it into the parent's local space with the parent's inverse
    /// world matrix.
    pub fn attach(&mut self, parent: NodeId, id: NodeId) -> Result<(), SceneError> {
        let world = self.world_matrix(id)?;
        let parent_world = self.world_matrix(parent)?;
        self.add_child(parent, id)?;
        self.node_mut(id)?.transform = Transform::from_matrix(&(parent_world.inverse() * world));
        Ok(())
    }
}
