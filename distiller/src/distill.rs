//! The distilling pipeline: declaration alignment, then statement-level
//! differencing of every changed declaration body.

use std::borrow::Cow;

use distiller_tree::{EditOp, Matching, MatchingConfig, NodeData, diff_trees_with_matching};
use rayon::prelude::*;

use crate::differencer::{StructureDiffNode, StructureDifferencer};
use crate::entity::{SourceTypes, StatementTree};
use crate::error::DistillError;
use crate::structure::StructureNode;
use crate::{debug, trace};

/// Configuration for [`ChangeDistiller`].
#[derive(Debug, Clone, Default)]
pub struct DistillerConfig {
    /// Statement-level matching thresholds and similarity measures
    pub matching: MatchingConfig,

    /// Refuse to diff a body with more nodes than this.
    /// Matching is quadratic in the number of nodes, so untrusted input should set a cap.
    /// Default: None
    pub max_body_nodes: Option<usize>,
}

/// Statement-level changes of one declaration present in both versions.
#[derive(Debug)]
pub struct BodyChange<'a> {
    /// The declaration in the left version
    pub left: &'a StructureNode,
    /// The declaration in the right version
    pub right: &'a StructureNode,
    /// Edit script turning the left body into the right one
    pub ops: Vec<EditOp<SourceTypes>>,
    /// Node matching the script was generated from
    pub matching: Matching,
}

/// Everything that changed between two versions of a file.
#[derive(Debug)]
pub struct Distillation<'a> {
    /// Declaration-level diff
    pub structure: StructureDiffNode<'a>,
    /// Statement-level edit scripts, in declaration pre-order
    pub body_changes: Vec<BodyChange<'a>>,
}

impl Distillation<'_> {
    /// Whether nothing changed at any level.
    pub fn is_empty(&self) -> bool {
        self.structure.changes().next().is_none() && self.body_changes.is_empty()
    }

    /// Total number of statement-level edit operations.
    pub fn operation_count(&self) -> usize {
        self.body_changes.iter().map(|change| change.ops.len()).sum()
    }
}

/// Extracts fine-grained changes between two versions of a structure tree.
///
/// Holds no state besides its configuration; one instance can distill any
/// number of file pairs, also concurrently.
#[derive(Debug, Clone, Default)]
pub struct ChangeDistiller {
    config: DistillerConfig,
}

impl ChangeDistiller {
    /// Create a distiller with the given configuration.
    pub fn new(config: DistillerConfig) -> Self {
        Self { config }
    }

    /// The configuration this distiller runs with.
    pub fn config(&self) -> &DistillerConfig {
        &self.config
    }

    /// Distill the changes between two versions of one file.
    ///
    /// Declarations are aligned first; every declaration present in both
    /// versions whose content changed and that has a body on at least one
    /// side gets a statement-level edit script. A missing body is diffed as
    /// a lone root shaped like the other side's root.
    pub fn distill<'a>(
        &self,
        left: &'a StructureNode,
        right: &'a StructureNode,
    ) -> Result<Distillation<'a>, DistillError> {
        if left.kind() != right.kind() {
            return Err(DistillError::IncompatibleRoots {
                left: left.kind().to_string(),
                right: right.kind().to_string(),
            });
        }

        let structure = StructureDifferencer::new().diff(left, right);

        let mut body_changes = Vec::new();
        for node in structure.iter().filter(|node| node.is_change()) {
            let (Some(left), Some(right)) = (node.left(), node.right()) else {
                continue;
            };
            if let Some(change) = self.diff_declaration(left, right)? {
                body_changes.push(change);
            }
        }

        let distillation = Distillation {
            structure,
            body_changes,
        };
        debug!(
            file = %right,
            declarations_changed = distillation.structure.changes().count(),
            bodies_changed = distillation.body_changes.len(),
            operations = distillation.operation_count(),
            "distilled"
        );
        Ok(distillation)
    }

    /// Distill many independent file pairs in parallel.
    ///
    /// Results come back in input order.
    pub fn distill_all<'a>(
        &self,
        pairs: &'a [(StructureNode, StructureNode)],
    ) -> Vec<Result<Distillation<'a>, DistillError>> {
        pairs
            .par_iter()
            .map(|(left, right)| self.distill(left, right))
            .collect()
    }

    /// Match two statement trees and generate the edit script between them.
    pub fn diff_bodies(
        &self,
        left: &StatementTree,
        right: &StatementTree,
    ) -> (Vec<EditOp<SourceTypes>>, Matching) {
        diff_trees_with_matching(left, right, &self.config.matching)
    }

    fn diff_declaration<'a>(
        &self,
        left: &'a StructureNode,
        right: &'a StructureNode,
    ) -> Result<Option<BodyChange<'a>>, DistillError> {
        let (left_body, right_body): (Cow<'_, StatementTree>, Cow<'_, StatementTree>) =
            match (left.body(), right.body()) {
                (None, None) => return Ok(None),
                (Some(l), Some(r)) => (Cow::Borrowed(l), Cow::Borrowed(r)),
                (Some(l), None) => (Cow::Borrowed(l), Cow::Owned(lone_root_like(l))),
                (None, Some(r)) => (Cow::Owned(lone_root_like(r)), Cow::Borrowed(r)),
            };

        self.check_size(right, &left_body)?;
        self.check_size(right, &right_body)?;
        // Scripts never relabel the root.
        let left_label = left_body.label(left_body.root);
        let right_label = right_body.label(right_body.root);
        if left_label != right_label {
            return Err(DistillError::IncompatibleBodies {
                declaration: right.fully_qualified_name(),
                left: left_label.to_string(),
                right: right_label.to_string(),
            });
        }

        let (ops, matching) = self.diff_bodies(&left_body, &right_body);
        trace!(declaration = %right, ops = ops.len(), "body diffed");
        if ops.is_empty() {
            return Ok(None);
        }
        Ok(Some(BodyChange {
            left,
            right,
            ops,
            matching,
        }))
    }

    fn check_size(
        &self,
        declaration: &StructureNode,
        body: &StatementTree,
    ) -> Result<(), DistillError> {
        let Some(limit) = self.config.max_body_nodes else {
            return Ok(());
        };
        let nodes = body.node_count();
        if nodes > limit {
            return Err(DistillError::BodyTooLarge {
                declaration: declaration.fully_qualified_name(),
                nodes,
                limit,
            });
        }
        Ok(())
    }
}

/// A single-node tree with the same root label and value as `tree`.
fn lone_root_like(tree: &StatementTree) -> StatementTree {
    StatementTree::new(NodeData::new(*tree.label(tree.root), tree.value(tree.root)))
}
