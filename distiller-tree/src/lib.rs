//! # distiller-tree
//!
//! Fine-grained differencing of ordered, labeled trees.
//!
//! ## Algorithm Overview
//!
//! The diff works in phases:
//!
//! 1. **Leaf matching**: pair same-label leaves whose values are similar
//!    enough, most similar pairs first
//! 2. **Inner node matching**: pair same-label inner nodes bottom-up by the
//!    share of matched leaves they have in common (Dice coefficient)
//! 3. **Edit script generation**: Chawathe (1996) INSERT, DELETE, UPDATE and
//!    MOVE operations that turn the left tree into the right one
//!
//! Labels are opaque to the algorithm. Values are compared with a pluggable
//! [`StringSimilarity`] measure.
//!
//! ## Usage
//!
//! ```
//! use distiller_tree::{diff_trees, MatchingConfig, NodeData, SimpleTypes, Tree};
//!
//! type Stmt = SimpleTypes<&'static str>;
//!
//! let mut before: Tree<Stmt> = Tree::new(NodeData::new("method", "run()"));
//! before.add_child(before.root, NodeData::new("stmt", "start();"));
//!
//! let mut after: Tree<Stmt> = Tree::new(NodeData::new("method", "run()"));
//! after.add_child(after.root, NodeData::new("stmt", "start();"));
//! after.add_child(after.root, NodeData::new("stmt", "stop();"));
//!
//! let ops = diff_trees(&before, &after, &MatchingConfig::default());
//! assert_eq!(ops.len(), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::std_instead_of_core)]

pub use indextree;

mod tracing_macros;
pub(crate) use tracing_macros::{debug, trace};

/// Chawathe edit script generation and replay
pub mod edit_script;
/// Best-leaf node matching
pub mod matching;
pub mod similarity;
pub mod tree;

pub use edit_script::{EditOp, apply_edit_script, generate_edit_script};
pub use matching::{Matching, MatchingConfig, NodePair, compute_matching};
pub use similarity::{Levenshtein, NGrams, SimilarityMeasure, StringSimilarity, Tokens};
pub use tree::{ApplyError, NoPayload, NodeData, SimpleTypes, Tree, TreeTypes};

/// Compute a diff between two trees.
///
/// This is the main entry point for tree diffing. It:
/// 1. Computes a matching between nodes with the best-leaf matcher
/// 2. Generates an edit script using Chawathe's algorithm
///
/// Applying the returned script to a clone of `left` yields a tree
/// isomorphic to `right`.
pub fn diff_trees<T: TreeTypes>(
    left: &Tree<T>,
    right: &Tree<T>,
    config: &MatchingConfig,
) -> Vec<EditOp<T>> {
    let (ops, _matching) = diff_trees_with_matching(left, right, config);
    ops
}

/// Like [`diff_trees`], but also returns the node matching.
///
/// Useful when operations need to be related back to nodes of both trees,
/// for instance to find the right-hand counterpart of a deleted node's parent.
pub fn diff_trees_with_matching<T: TreeTypes>(
    left: &Tree<T>,
    right: &Tree<T>,
    config: &MatchingConfig,
) -> (Vec<EditOp<T>>, Matching) {
    let matching = compute_matching(left, right, config);
    let ops = generate_edit_script(left, right, &matching);
    (ops, matching)
}
