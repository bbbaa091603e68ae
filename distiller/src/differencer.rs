//! Declaration-level differencing.
//!
//! Aligns the declarations of two structure trees by kind and fully-qualified
//! name. Alignment is exact; similar-but-renamed declarations show up as one
//! deletion plus one addition.

use facet::Facet;
use rapidhash::RapidHashMap as HashMap;

use crate::structure::{StructureKind, StructureNode};
use crate::{debug, trace};

/// How a declaration changed between the two versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Facet)]
#[repr(u8)]
pub enum DiffType {
    /// Present on both sides with identical content
    NoChange,
    /// Only present on the right
    Addition,
    /// Only present on the left
    Deletion,
    /// Present on both sides with different content
    Change,
}

/// A declaration pairing annotated with its [`DiffType`].
///
/// Exactly one side is absent for additions (left) and deletions (right);
/// the children then mirror the present side and carry the same diff type.
#[derive(Debug, Clone)]
pub struct StructureDiffNode<'a> {
    left: Option<&'a StructureNode>,
    right: Option<&'a StructureNode>,
    diff_type: DiffType,
    children: Vec<StructureDiffNode<'a>>,
}

impl<'a> StructureDiffNode<'a> {
    /// Left declaration, absent for additions.
    pub fn left(&self) -> Option<&'a StructureNode> {
        self.left
    }

    /// Right declaration, absent for deletions.
    pub fn right(&self) -> Option<&'a StructureNode> {
        self.right
    }

    /// The side that is present, preferring the right one.
    pub fn node(&self) -> &'a StructureNode {
        match (self.right, self.left) {
            (Some(node), _) | (None, Some(node)) => node,
            (None, None) => unreachable!("a diff node always has at least one side"),
        }
    }

    /// Diff classification.
    pub fn diff_type(&self) -> DiffType {
        self.diff_type
    }

    /// Child diff nodes.
    pub fn children(&self) -> &[StructureDiffNode<'a>] {
        &self.children
    }

    /// Whether the declaration is a class, interface, enum or annotation type.
    pub fn is_class_or_interface_diff_node(&self) -> bool {
        self.node().is_class_or_interface()
    }

    /// Whether the declaration is a method or constructor.
    pub fn is_method_or_constructor_diff_node(&self) -> bool {
        self.node().is_method_or_constructor()
    }

    /// Whether the declaration is a field.
    pub fn is_field_diff_node(&self) -> bool {
        self.node().is_field()
    }

    /// Whether the declaration exists only in the right version.
    pub fn is_addition(&self) -> bool {
        self.diff_type == DiffType::Addition
    }

    /// Whether the declaration exists only in the left version.
    pub fn is_deletion(&self) -> bool {
        self.diff_type == DiffType::Deletion
    }

    /// Whether the declaration exists in both versions with different content.
    pub fn is_change(&self) -> bool {
        self.diff_type == DiffType::Change
    }

    /// Whether the declaration is identical in both versions.
    pub fn is_unchanged(&self) -> bool {
        self.diff_type == DiffType::NoChange
    }

    /// Pre-order traversal of this node and all descendants.
    pub fn iter(&self) -> impl Iterator<Item = &StructureDiffNode<'a>> + '_ {
        let mut stack = vec![self];
        core::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }

    /// Every node in this subtree that is not [`DiffType::NoChange`], in pre-order.
    pub fn changes(&self) -> impl Iterator<Item = &StructureDiffNode<'a>> + '_ {
        self.iter().filter(|node| !node.is_unchanged())
    }

    fn one_sided(
        node: &'a StructureNode,
        diff_type: DiffType,
        side: fn(&'a StructureNode) -> (Option<&'a StructureNode>, Option<&'a StructureNode>),
    ) -> Self {
        let (left, right) = side(node);
        Self {
            left,
            right,
            diff_type,
            children: node
                .children()
                .iter()
                .map(|child| Self::one_sided(child, diff_type, side))
                .collect(),
        }
    }

    fn addition(node: &'a StructureNode) -> Self {
        Self::one_sided(node, DiffType::Addition, |n| (None, Some(n)))
    }

    fn deletion(node: &'a StructureNode) -> Self {
        Self::one_sided(node, DiffType::Deletion, |n| (Some(n), None))
    }
}

type AlignKey = (StructureKind, String);

fn align_key(node: &StructureNode) -> AlignKey {
    (node.kind(), node.fully_qualified_name())
}

/// Aligns two structure trees and classifies every declaration.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructureDifferencer;

impl StructureDifferencer {
    /// Create a differencer.
    pub fn new() -> Self {
        Self
    }

    /// Diff two structure trees.
    ///
    /// The roots are always paired; the root is [`DiffType::Change`] when its
    /// kind, name or content differ, [`DiffType::NoChange`] otherwise.
    pub fn diff<'a>(
        &self,
        left: &'a StructureNode,
        right: &'a StructureNode,
    ) -> StructureDiffNode<'a> {
        let root = self.diff_pair(left, right);
        debug!(
            root = %right,
            changes = root.changes().count(),
            "structure diff done"
        );
        root
    }

    fn diff_pair<'a>(
        &self,
        left: &'a StructureNode,
        right: &'a StructureNode,
    ) -> StructureDiffNode<'a> {
        let changed = left.kind() != right.kind()
            || left.fully_qualified_name() != right.fully_qualified_name()
            || left.content() != right.content();

        StructureDiffNode {
            left: Some(left),
            right: Some(right),
            diff_type: if changed {
                DiffType::Change
            } else {
                DiffType::NoChange
            },
            children: self.diff_children(left.children(), right.children()),
        }
    }

    /// Align two sibling lists. Output follows the right order; each deleted
    /// left child is emitted right before the first common child that comes
    /// after it on the left.
    fn diff_children<'a>(
        &self,
        left: &'a [StructureNode],
        right: &'a [StructureNode],
    ) -> Vec<StructureDiffNode<'a>> {
        // Right indices per key, last index first so `pop` yields the earliest.
        let mut by_key: HashMap<AlignKey, Vec<usize>> = HashMap::default();
        for (j, node) in right.iter().enumerate().rev() {
            by_key.entry(align_key(node)).or_default().push(j);
        }

        let mut left_for_right: Vec<Option<usize>> = vec![None; right.len()];
        let mut left_matched = vec![false; left.len()];
        for (i, node) in left.iter().enumerate() {
            if let Some(j) = by_key.get_mut(&align_key(node)).and_then(Vec::pop) {
                left_for_right[j] = Some(i);
                left_matched[i] = true;
            }
        }

        let mut result = Vec::with_capacity(left.len().max(right.len()));
        let mut next_left = 0;
        for (j, right_node) in right.iter().enumerate() {
            match left_for_right[j] {
                Some(i) => {
                    for (k, deleted) in left.iter().enumerate().take(i).skip(next_left) {
                        if !left_matched[k] {
                            trace!(declaration = %deleted, "deleted");
                            result.push(StructureDiffNode::deletion(deleted));
                        }
                    }
                    next_left = next_left.max(i + 1);
                    result.push(self.diff_pair(&left[i], right_node));
                }
                None => {
                    trace!(declaration = %right_node, "added");
                    result.push(StructureDiffNode::addition(right_node));
                }
            }
        }
        for (k, deleted) in left.iter().enumerate().skip(next_left) {
            if !left_matched[k] {
                trace!(declaration = %deleted, "deleted");
                result.push(StructureDiffNode::deletion(deleted));
            }
        }
        result
    }
}
