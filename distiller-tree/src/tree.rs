//! Ordered, labeled trees stored in an arena.
//!
//! Nodes are owned by an [`indextree::Arena`]; parent and child relations are
//! links between [`NodeId`] handles, so a node's identity is stable for the
//! lifetime of the tree and parent lookup is O(1).

use core::fmt;
use core::hash::Hash;
use core::marker::PhantomData;

use facet::Facet;
use indextree::{Arena, NodeEdge, NodeId};
use std::collections::VecDeque;

/// Type family shared by both trees taking part in a diff.
pub trait TreeTypes {
    /// Opaque tag describing what a node syntactically represents.
    type Label: Clone + Eq + Hash + fmt::Debug + fmt::Display;

    /// Data attached to a node by the front end (a source range, usually).
    /// Never inspected by matching or differencing.
    type Payload: Clone + fmt::Debug;
}

/// Payload for trees that don't carry one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NoPayload;

/// Ready-made [`TreeTypes`] for a label type and an optional payload type.
pub struct SimpleTypes<L, P = NoPayload>(PhantomData<(L, P)>);

impl<L, P> TreeTypes for SimpleTypes<L, P>
where
    L: Clone + Eq + Hash + fmt::Debug + fmt::Display,
    P: Clone + fmt::Debug,
{
    type Label = L;
    type Payload = P;
}

/// The data stored for each node.
pub struct NodeData<T: TreeTypes> {
    /// Entity type of the node
    pub label: T::Label,
    /// Display value (the statement text, an identifier, a comment body...)
    pub value: String,
    /// Front-end payload, passed through untouched
    pub payload: Option<T::Payload>,
}

impl<T: TreeTypes> NodeData<T> {
    /// Node data without a payload.
    pub fn new(label: T::Label, value: impl Into<String>) -> Self {
        Self {
            label,
            value: value.into(),
            payload: None,
        }
    }

    /// Attach a payload.
    pub fn with_payload(mut self, payload: T::Payload) -> Self {
        self.payload = Some(payload);
        self
    }
}

impl<T: TreeTypes> Clone for NodeData<T> {
    fn clone(&self) -> Self {
        Self {
            label: self.label.clone(),
            value: self.value.clone(),
            payload: self.payload.clone(),
        }
    }
}

impl<T: TreeTypes> PartialEq for NodeData<T>
where
    T::Payload: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.label == other.label && self.value == other.value && self.payload == other.payload
    }
}

impl<T: TreeTypes> fmt::Debug for NodeData<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeData")
            .field("label", &self.label)
            .field("value", &self.value)
            .field("payload", &self.payload)
            .finish()
    }
}

/// Errors raised when re-linking nodes, mostly while replaying an edit script.
#[derive(Facet, Debug, PartialEq, Eq)]
#[facet(derive(Error))]
#[repr(u8)]
pub enum ApplyError {
    /// node {node} does not exist in this tree
    UnknownNode { node: usize },

    /// position {position} is past the end of {len} children
    PositionOutOfBounds { position: usize, len: usize },

    /// insert allocated node {actual} but the script expected node {expected}
    UnexpectedNodeId { expected: usize, actual: usize },

    /// node {node} cannot be placed under {parent}
    InvalidLink { node: usize, parent: usize },
}

/// An ordered, labeled tree.
pub struct Tree<T: TreeTypes> {
    /// Backing storage; detached nodes stay allocated here
    pub arena: Arena<NodeData<T>>,
    /// The root node
    pub root: NodeId,
}

impl<T: TreeTypes> Clone for Tree<T> {
    fn clone(&self) -> Self {
        Self {
            arena: self.arena.clone(),
            root: self.root,
        }
    }
}

impl<T: TreeTypes> Tree<T> {
    /// Create a tree with a single root node.
    pub fn new(root_data: NodeData<T>) -> Self {
        let mut arena = Arena::new();
        let root = arena.new_node(root_data);
        Self { arena, root }
    }

    /// Append a new child under `parent` and return its handle.
    pub fn add_child(&mut self, parent: NodeId, data: NodeData<T>) -> NodeId {
        let child = self.arena.new_node(data);
        parent.append(child, &mut self.arena);
        child
    }

    /// Allocate a node that is not linked anywhere yet.
    pub fn new_detached(&mut self, data: NodeData<T>) -> NodeId {
        self.arena.new_node(data)
    }

    /// Whether `id` was allocated in this tree's arena.
    pub fn contains(&self, id: NodeId) -> bool {
        self.arena.get(id).is_some_and(|node| !node.is_removed())
    }

    /// Whether `id` is reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.contains(id) && id.ancestors(&self.arena).any(|a| a == self.root)
    }

    /// Get the data of a node.
    pub fn get(&self, id: NodeId) -> &NodeData<T> {
        self.arena[id].get()
    }

    /// Get mutable access to the data of a node.
    pub fn get_mut(&mut self, id: NodeId) -> &mut NodeData<T> {
        self.arena[id].get_mut()
    }

    /// The label of a node.
    pub fn label(&self, id: NodeId) -> &T::Label {
        &self.get(id).label
    }

    /// The value of a node.
    pub fn value(&self, id: NodeId) -> &str {
        &self.get(id).value
    }

    /// Parent of a node, `None` for the root and detached nodes.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.arena[id].parent()
    }

    /// Children in order.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        id.children(&self.arena)
    }

    /// Number of children.
    pub fn child_count(&self, id: NodeId) -> usize {
        id.children(&self.arena).count()
    }

    /// Whether a node has no children.
    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.arena[id].first_child().is_none()
    }

    /// Index of a node among its siblings (0 for the root).
    pub fn position(&self, id: NodeId) -> usize {
        id.preceding_siblings(&self.arena).count() - 1
    }

    /// Number of nodes reachable from the root.
    pub fn node_count(&self) -> usize {
        self.root.descendants(&self.arena).count()
    }

    /// Pre-order traversal from the root.
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.root.descendants(&self.arena)
    }

    /// Pre-order traversal of the subtree rooted at `id`, `id` included.
    pub fn descendants(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        id.descendants(&self.arena)
    }

    /// Post-order traversal from the root (children before parents).
    pub fn post_order(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.root.traverse(&self.arena).filter_map(|edge| match edge {
            NodeEdge::End(id) => Some(id),
            NodeEdge::Start(_) => None,
        })
    }

    /// Breadth-first traversal from the root.
    pub fn breadth_first(&self) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut queue = VecDeque::from([self.root]);
        while let Some(id) = queue.pop_front() {
            order.push(id);
            queue.extend(id.children(&self.arena));
        }
        order
    }

    /// Leaves of the subtree rooted at `id`, in pre-order.
    pub fn leaves(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        id.descendants(&self.arena).filter(|&d| self.is_leaf(d))
    }

    /// Detach a node (and its subtree) from its parent. The node stays in the
    /// arena and can be linked again.
    pub fn detach(&mut self, id: NodeId) {
        id.detach(&mut self.arena);
    }

    /// Link a detached node as the `position`-th child of `parent`.
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        position: usize,
        child: NodeId,
    ) -> Result<(), ApplyError> {
        for id in [parent, child] {
            if !self.contains(id) {
                return Err(ApplyError::UnknownNode {
                    node: usize::from(id),
                });
            }
        }

        let invalid = |_| ApplyError::InvalidLink {
            node: usize::from(child),
            parent: usize::from(parent),
        };

        match parent.children(&self.arena).nth(position) {
            Some(sibling) => sibling
                .checked_insert_before(child, &mut self.arena)
                .map_err(invalid),
            None => {
                let len = self.child_count(parent);
                if position > len {
                    return Err(ApplyError::PositionOutOfBounds { position, len });
                }
                parent
                    .checked_append(child, &mut self.arena)
                    .map_err(invalid)
            }
        }
    }

    /// Structural equality: same labels, values and child order, payloads ignored.
    pub fn is_isomorphic(&self, other: &Tree<T>) -> bool {
        self.subtree_isomorphic(self.root, other, other.root)
    }

    fn subtree_isomorphic(&self, id: NodeId, other: &Tree<T>, other_id: NodeId) -> bool {
        if self.label(id) != other.label(other_id) || self.value(id) != other.value(other_id) {
            return false;
        }
        if self.child_count(id) != other.child_count(other_id) {
            return false;
        }
        self.children(id)
            .zip(other.children(other_id))
            .all(|(a, b)| self.subtree_isomorphic(a, other, b))
    }

    fn write_subtree(&self, f: &mut fmt::Formatter<'_>, id: NodeId, depth: usize) -> fmt::Result {
        let data = self.get(id);
        write!(f, "{:indent$}{}", "", data.label, indent = depth * 2)?;
        if !data.value.is_empty() {
            write!(f, ": {}", data.value)?;
        }
        writeln!(f)?;
        for child in self.children(id) {
            self.write_subtree(f, child, depth + 1)?;
        }
        Ok(())
    }
}

/// One line per node, indented by depth: `label: value`.
impl<T: TreeTypes> fmt::Display for Tree<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_subtree(f, self.root, 0)
    }
}

impl<T: TreeTypes> fmt::Debug for Tree<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
