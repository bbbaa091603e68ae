//! Chawathe edit script generation.
//!
//! Generates an edit script (INSERT, DELETE, MOVE, UPDATE) from a node matching.
//! Based on "Change Detection in Hierarchically Structured Information" (Chawathe et al., 1996).
//!
//! The right tree is walked breadth-first against a working copy of the left
//! tree. For every right node:
//! 1. INSERT it if it has no partner
//! 2. UPDATE its partner if the values differ
//! 3. MOVE its partner if the partner hangs under the wrong parent
//! 4. Align the children of the pair, MOVEing matched children that are out of order
//!
//! Left nodes still unmatched afterwards are DELETEd, children before parents.

use crate::matching::Matching;
use crate::tree::{ApplyError, NodeData, Tree, TreeTypes};
use crate::{debug, trace};
use core::fmt;
use indextree::NodeId;
use rapidhash::RapidHashSet as HashSet;
use smallvec::SmallVec;

/// An edit operation in the script.
///
/// Node handles refer to the working tree: left nodes keep their left handle,
/// inserted nodes get the handle they were allocated under while the script
/// was generated. `node_b` fields point back into the right tree.
pub enum EditOp<T: TreeTypes> {
    /// Insert a new node.
    Insert {
        /// Handle of the new node
        node: NodeId,
        /// The node in the right tree it was copied from
        node_b: NodeId,
        /// Parent the node is inserted under
        parent: NodeId,
        /// Position among siblings (0-indexed)
        position: usize,
        /// Label, value and payload of the new node
        data: NodeData<T>,
    },

    /// Delete a node.
    Delete {
        /// The node being deleted
        node: NodeId,
        /// Its parent at the time of deletion
        parent: NodeId,
    },

    /// Move a node under a new parent, or to a new position under the same one.
    Move {
        /// The node being moved
        node: NodeId,
        /// The corresponding node in the right tree
        node_b: NodeId,
        /// Parent before the move
        old_parent: NodeId,
        /// Parent after the move
        new_parent: NodeId,
        /// Position among the new siblings, counted with the node detached
        position: usize,
    },

    /// Replace the value of a matched node.
    Update {
        /// The node being updated
        node: NodeId,
        /// The corresponding node in the right tree
        node_b: NodeId,
        /// Value before the update
        old_value: String,
        /// Value after the update
        new_value: String,
    },
}

impl<T: TreeTypes> EditOp<T> {
    /// The working-tree node this operation acts on.
    pub fn node(&self) -> NodeId {
        match self {
            EditOp::Insert { node, .. }
            | EditOp::Delete { node, .. }
            | EditOp::Move { node, .. }
            | EditOp::Update { node, .. } => *node,
        }
    }

    /// Apply this operation to `tree`.
    ///
    /// `tree` must be the left tree (or a clone of it) with every earlier
    /// operation of the same script already applied. Applying an operation
    /// that is already in effect is a no-op.
    pub fn apply(&self, tree: &mut Tree<T>) -> Result<(), ApplyError> {
        match self {
            EditOp::Insert {
                node,
                parent,
                position,
                data,
                ..
            } => {
                if tree.contains(*node) {
                    if tree.parent(*node) == Some(*parent) {
                        return Ok(());
                    }
                    tree.detach(*node);
                } else {
                    let allocated = tree.new_detached(data.clone());
                    if allocated != *node {
                        return Err(ApplyError::UnexpectedNodeId {
                            expected: usize::from(*node),
                            actual: usize::from(allocated),
                        });
                    }
                }
                tree.insert_child(*parent, *position, *node)
            }
            EditOp::Delete { node, parent } => {
                ensure_known(tree, *node)?;
                if tree.parent(*node) == Some(*parent) {
                    tree.detach(*node);
                }
                Ok(())
            }
            EditOp::Move {
                node,
                new_parent,
                position,
                ..
            } => {
                ensure_known(tree, *node)?;
                if tree.parent(*node) == Some(*new_parent) && tree.position(*node) == *position {
                    return Ok(());
                }
                tree.detach(*node);
                tree.insert_child(*new_parent, *position, *node)
            }
            EditOp::Update {
                node, new_value, ..
            } => {
                ensure_known(tree, *node)?;
                tree.get_mut(*node).value.clone_from(new_value);
                Ok(())
            }
        }
    }
}

fn ensure_known<T: TreeTypes>(tree: &Tree<T>, node: NodeId) -> Result<(), ApplyError> {
    if tree.contains(node) {
        Ok(())
    } else {
        Err(ApplyError::UnknownNode {
            node: usize::from(node),
        })
    }
}

/// Apply a whole script, in order.
pub fn apply_edit_script<T: TreeTypes>(
    tree: &mut Tree<T>,
    ops: &[EditOp<T>],
) -> Result<(), ApplyError> {
    ops.iter().try_for_each(|op| op.apply(tree))
}

impl<T: TreeTypes> Clone for EditOp<T> {
    fn clone(&self) -> Self {
        match self {
            EditOp::Insert {
                node,
                node_b,
                parent,
                position,
                data,
            } => EditOp::Insert {
                node: *node,
                node_b: *node_b,
                parent: *parent,
                position: *position,
                data: data.clone(),
            },
            EditOp::Delete { node, parent } => EditOp::Delete {
                node: *node,
                parent: *parent,
            },
            EditOp::Move {
                node,
                node_b,
                old_parent,
                new_parent,
                position,
            } => EditOp::Move {
                node: *node,
                node_b: *node_b,
                old_parent: *old_parent,
                new_parent: *new_parent,
                position: *position,
            },
            EditOp::Update {
                node,
                node_b,
                old_value,
                new_value,
            } => EditOp::Update {
                node: *node,
                node_b: *node_b,
                old_value: old_value.clone(),
                new_value: new_value.clone(),
            },
        }
    }
}

impl<T: TreeTypes> fmt::Display for EditOp<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditOp::Insert {
                node,
                parent,
                position,
                data,
                ..
            } => write!(
                f,
                "Insert({} {} \"{}\" @{} under {})",
                usize::from(*node),
                data.label,
                data.value,
                position,
                usize::from(*parent)
            ),
            EditOp::Delete { node, parent } => write!(
                f,
                "Delete({} from {})",
                usize::from(*node),
                usize::from(*parent)
            ),
            EditOp::Move {
                node,
                old_parent,
                new_parent,
                position,
                ..
            } => write!(
                f,
                "Move({} from {} → {} @{})",
                usize::from(*node),
                usize::from(*old_parent),
                usize::from(*new_parent),
                position
            ),
            EditOp::Update {
                node,
                old_value,
                new_value,
                ..
            } => write!(
                f,
                "Update({} \"{}\" → \"{}\")",
                usize::from(*node),
                old_value,
                new_value
            ),
        }
    }
}

impl<T: TreeTypes> fmt::Debug for EditOp<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Reuse Display implementation for Debug
        fmt::Display::fmt(self, f)
    }
}

/// Wrapper for collecting edit operations with automatic tracing.
struct Ops<T: TreeTypes> {
    inner: Vec<EditOp<T>>,
}

impl<T: TreeTypes> Ops<T> {
    fn new() -> Self {
        Self { inner: Vec::new() }
    }

    fn push(&mut self, op: EditOp<T>) {
        debug!(%op, "emit");
        self.inner.push(op);
    }

    fn into_inner(self) -> Vec<EditOp<T>> {
        self.inner
    }
}

/// Generator state. `in_order` marks right nodes whose partners are already
/// placed correctly among their siblings.
struct ScriptBuilder<'a, T: TreeTypes> {
    right: &'a Tree<T>,
    work: Tree<T>,
    mapping: Matching,
    in_order: HashSet<NodeId>,
    ops: Ops<T>,
}

/// Generate an edit script from a matching between two trees.
///
/// Applying the script in order to a clone of `left` (see [`apply_edit_script`])
/// yields a tree isomorphic to `right`. Identical trees give an empty script.
///
/// Matched nodes only ever get their value updated, never their label. The
/// roots are always paired, so if their labels differ the replayed root keeps
/// the left label and the result is not isomorphic to `right`.
///
/// # Panics
///
/// If the two roots are not matched to each other.
pub fn generate_edit_script<T: TreeTypes>(
    left: &Tree<T>,
    right: &Tree<T>,
    matching: &Matching,
) -> Vec<EditOp<T>> {
    trace!(matched_pairs = matching.len(), "generate_edit_script start");
    assert_eq!(
        matching.get_right(left.root),
        Some(right.root),
        "the roots of both trees must be matched to each other"
    );

    let mut builder = ScriptBuilder {
        right,
        work: left.clone(),
        mapping: matching.clone(),
        in_order: HashSet::default(),
        ops: Ops::new(),
    };

    for x in right.breadth_first() {
        let w = match right.parent(x) {
            None => {
                builder.update(left.root, x);
                left.root
            }
            Some(y) => builder.place(x, y),
        };
        builder.in_order.insert(x);
        builder.align_children(w, x);
    }

    builder.delete_unmatched();

    debug!(total_ops = builder.ops.inner.len(), "generate_edit_script done");
    builder.ops.into_inner()
}

impl<T: TreeTypes> ScriptBuilder<'_, T> {
    /// Insert, update and/or move so that right node `x` (child of `y`) has
    /// a partner under the partner of `y`. Returns that partner.
    fn place(&mut self, x: NodeId, y: NodeId) -> NodeId {
        let z = self
            .mapping
            .get_left(y)
            .expect("breadth-first order places every parent before its children");

        let Some(w) = self.mapping.get_left(x) else {
            let data = self.right.get(x).clone();
            let w = self.work.new_detached(data.clone());
            let position = self.find_pos(x);
            self.link(z, position, w);
            self.mapping.add(w, x);
            self.ops.push(EditOp::Insert {
                node: w,
                node_b: x,
                parent: z,
                position,
                data,
            });
            return w;
        };

        self.update(w, x);

        if let Some(v) = self.work.parent(w)
            && v != z
        {
            self.work.detach(w);
            let position = self.find_pos(x);
            self.link(z, position, w);
            trace!(
                node = usize::from(w),
                old_parent = usize::from(v),
                new_parent = usize::from(z),
                position,
                "parent changed"
            );
            self.ops.push(EditOp::Move {
                node: w,
                node_b: x,
                old_parent: v,
                new_parent: z,
                position,
            });
        }
        w
    }

    /// Copy the value of right node `x` onto its partner `w` if they differ.
    fn update(&mut self, w: NodeId, x: NodeId) {
        let right = self.right;
        let new_value = right.value(x);
        if self.work.value(w) == new_value {
            return;
        }
        let old_value = core::mem::replace(&mut self.work.get_mut(w).value, new_value.to_owned());
        self.ops.push(EditOp::Update {
            node: w,
            node_b: x,
            old_value,
            new_value: new_value.to_owned(),
        });
    }

    /// Reorder the matched children of `w` to follow the children of `x`.
    ///
    /// Children on the longest common subsequence stay put; every other
    /// matched child is moved right after its nearest in-order left sibling.
    fn align_children(&mut self, w: NodeId, x: NodeId) {
        for child in self.right.children(x) {
            self.in_order.remove(&child);
        }

        let work_side: SmallVec<[NodeId; 16]> = self
            .work
            .children(w)
            .filter(|&a| {
                self.mapping
                    .get_right(a)
                    .is_some_and(|b| self.right.parent(b) == Some(x))
            })
            .collect();
        let right_side: SmallVec<[NodeId; 16]> = self
            .right
            .children(x)
            .filter(|&b| {
                self.mapping
                    .get_left(b)
                    .is_some_and(|a| self.work.parent(a) == Some(w))
            })
            .collect();

        for (_, b) in lcs(&work_side, &right_side, |a, b| {
            self.mapping.get_right(a) == Some(b)
        }) {
            self.in_order.insert(b);
        }

        for b in right_side {
            if self.in_order.contains(&b) {
                continue;
            }
            let Some(a) = self.mapping.get_left(b) else {
                continue;
            };
            self.work.detach(a);
            let position = self.find_pos(b);
            self.link(w, position, a);
            self.ops.push(EditOp::Move {
                node: a,
                node_b: b,
                old_parent: w,
                new_parent: w,
                position,
            });
            self.in_order.insert(b);
        }
    }

    /// Position for the partner of right node `x` under the partner of its
    /// parent: just after the partner of the nearest in-order left sibling,
    /// or first if there is none.
    fn find_pos(&self, x: NodeId) -> usize {
        let Some(y) = self.right.parent(x) else {
            return 0;
        };
        let z = self.mapping.get_left(y);

        let siblings: SmallVec<[NodeId; 16]> = self.right.children(y).collect();
        let index = self.right.position(x);
        for &v in siblings[..index].iter().rev() {
            if !self.in_order.contains(&v) {
                continue;
            }
            if let Some(u) = self.mapping.get_left(v)
                && self.work.parent(u).is_some()
                && self.work.parent(u) == z
            {
                return self.work.position(u) + 1;
            }
        }
        0
    }

    fn link(&mut self, parent: NodeId, position: usize, node: NodeId) {
        self.work
            .insert_child(parent, position, node)
            .expect("working tree links stay valid while the script is generated");
    }

    /// Delete every working node without a partner, children before parents.
    fn delete_unmatched(&mut self) {
        let doomed: Vec<NodeId> = self
            .work
            .post_order()
            .filter(|&w| !self.mapping.contains_left(w))
            .collect();

        for node in doomed {
            let Some(parent) = self.work.parent(node) else {
                continue;
            };
            self.ops.push(EditOp::Delete { node, parent });
            self.work.detach(node);
        }
    }
}

/// Longest common subsequence of two sequences under `eq`.
fn lcs<F>(a: &[NodeId], b: &[NodeId], eq: F) -> Vec<(NodeId, NodeId)>
where
    F: Fn(NodeId, NodeId) -> bool,
{
    let (n, m) = (a.len(), b.len());
    // lengths[i][j] = LCS length of a[i..] and b[j..]
    let mut lengths = vec![vec![0usize; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lengths[i][j] = if eq(a[i], b[j]) {
                lengths[i + 1][j + 1] + 1
            } else {
                lengths[i + 1][j].max(lengths[i][j + 1])
            };
        }
    }

    let mut result = Vec::with_capacity(lengths[0][0]);
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if eq(a[i], b[j]) {
            result.push((a[i], b[j]));
            i += 1;
            j += 1;
        } else if lengths[i + 1][j] >= lengths[i][j + 1] {
            i += 1;
        } else {
            j += 1;
        }
    }
    result
}
