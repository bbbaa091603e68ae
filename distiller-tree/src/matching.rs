//! Best-leaf node matching.
//!
//! Implements two-phase matching:
//! 1. Leaves: greedy assignment of the most similar same-label leaf pairs
//! 2. Inner nodes: bottom-up, by the share of matched leaves (Dice coefficient)

use crate::similarity::{SimilarityMeasure, StringSimilarity};
use crate::tree::{Tree, TreeTypes};
use crate::{debug, trace};
use indextree::NodeId;
use rapidhash::RapidHashMap as HashMap;

/// Two nodes judged equivalent: `left` from the old tree, `right` from the new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodePair {
    /// Node in the left tree
    pub left: NodeId,
    /// Node in the right tree
    pub right: NodeId,
}

/// A bidirectional, one-to-one mapping between nodes in two trees.
/// Uses Vec for O(1) lookups indexed by NodeId.
#[derive(Debug, Clone)]
pub struct Matching {
    /// Map from left node to right node (indexed by the left NodeId)
    left_to_right: Vec<Option<NodeId>>,
    /// Map from right node to left node (indexed by the right NodeId)
    right_to_left: Vec<Option<NodeId>>,
    /// All matched pairs in insertion order
    pairs: Vec<NodePair>,
}

impl Default for Matching {
    fn default() -> Self {
        Self::new()
    }
}

impl Matching {
    /// Create a new empty matching.
    pub fn new() -> Self {
        Self {
            left_to_right: Vec::new(),
            right_to_left: Vec::new(),
            pairs: Vec::new(),
        }
    }

    /// Create a new matching with preallocated capacity.
    pub fn with_capacity(max_left: usize, max_right: usize) -> Self {
        Self {
            left_to_right: vec![None; max_left],
            right_to_left: vec![None; max_right],
            pairs: Vec::new(),
        }
    }

    /// Add a match between two nodes.
    ///
    /// # Panics
    ///
    /// If either node is already matched. A node appearing in two pairs is a
    /// bug in whoever builds the matching, not a recoverable condition.
    #[inline]
    pub fn add(&mut self, left: NodeId, right: NodeId) {
        assert!(
            !self.contains_left(left) && !self.contains_right(right),
            "node matched twice: left {} / right {}",
            usize::from(left),
            usize::from(right)
        );

        let left_idx = usize::from(left);
        let right_idx = usize::from(right);

        // Grow vectors if needed
        if left_idx >= self.left_to_right.len() {
            self.left_to_right.resize(left_idx + 1, None);
        }
        if right_idx >= self.right_to_left.len() {
            self.right_to_left.resize(right_idx + 1, None);
        }

        self.left_to_right[left_idx] = Some(right);
        self.right_to_left[right_idx] = Some(left);
        self.pairs.push(NodePair { left, right });
    }

    /// Check if a left node is matched.
    #[inline(always)]
    pub fn contains_left(&self, left: NodeId) -> bool {
        self.get_right(left).is_some()
    }

    /// Check if a right node is matched.
    #[inline(always)]
    pub fn contains_right(&self, right: NodeId) -> bool {
        self.get_left(right).is_some()
    }

    /// Get the partner of a left node.
    #[inline(always)]
    pub fn get_right(&self, left: NodeId) -> Option<NodeId> {
        self.left_to_right
            .get(usize::from(left))
            .copied()
            .flatten()
    }

    /// Get the partner of a right node.
    #[inline(always)]
    pub fn get_left(&self, right: NodeId) -> Option<NodeId> {
        self.right_to_left
            .get(usize::from(right))
            .copied()
            .flatten()
    }

    /// Whether this exact pair is part of the matching.
    pub fn contains(&self, pair: NodePair) -> bool {
        self.get_right(pair.left) == Some(pair.right)
    }

    /// All matched pairs, in the order they were found.
    pub fn pairs(&self) -> impl Iterator<Item = NodePair> + '_ {
        self.pairs.iter().copied()
    }

    /// Get the number of matched pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Check if there are no matches.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Configuration for the matching algorithm.
#[derive(Debug, Clone)]
pub struct MatchingConfig {
    /// Measure comparing leaf values.
    pub leaf_similarity: SimilarityMeasure,

    /// Minimum leaf value similarity for two leaves to be paired.
    pub leaf_threshold: f64,

    /// Measure comparing inner node values, used to break ties between
    /// equally good inner candidates.
    pub node_similarity: SimilarityMeasure,

    /// Minimum Dice coefficient of matched leaves for two inner nodes.
    pub inner_threshold: f64,

    /// Subtrees with at most this many leaves on the smaller side use
    /// `dynamic_threshold` instead of `inner_threshold`.
    pub dynamic_leaf_limit: usize,

    /// Inner threshold for small subtrees, where one unmatched leaf already
    /// moves the coefficient a long way.
    pub dynamic_threshold: f64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            leaf_similarity: SimilarityMeasure::NGrams(2),
            leaf_threshold: 0.6,
            node_similarity: SimilarityMeasure::NGrams(2),
            inner_threshold: 0.6,
            dynamic_leaf_limit: 4,
            dynamic_threshold: 0.4,
        }
    }
}

/// Pre-order ranks, subtree extents and leaf counts for one tree.
struct Traversal {
    preorder: Vec<NodeId>,
    /// Pre-order rank, indexed by NodeId
    rank: Vec<usize>,
    /// One past the rank of the last descendant, indexed by NodeId
    end: Vec<usize>,
    /// Number of leaves in the subtree, indexed by NodeId
    leaves: Vec<usize>,
}

impl Traversal {
    fn new<T: TreeTypes>(tree: &Tree<T>) -> Self {
        let slots = tree.arena.count() + 1;
        let preorder: Vec<NodeId> = tree.iter().collect();
        let mut rank = vec![usize::MAX; slots];
        for (i, &id) in preorder.iter().enumerate() {
            rank[usize::from(id)] = i;
        }

        // Reverse pre-order visits every descendant before its ancestor.
        let mut end = vec![0; slots];
        let mut leaves = vec![0; slots];
        for &id in preorder.iter().rev() {
            let idx = usize::from(id);
            if tree.is_leaf(id) {
                end[idx] = rank[idx] + 1;
                leaves[idx] = 1;
            } else {
                for child in tree.children(id) {
                    let c = usize::from(child);
                    end[idx] = end[idx].max(end[c]);
                    leaves[idx] += leaves[c];
                }
            }
        }

        Self {
            preorder,
            rank,
            end,
            leaves,
        }
    }

    fn rank(&self, id: NodeId) -> usize {
        self.rank[usize::from(id)]
    }

    fn leaf_count(&self, id: NodeId) -> usize {
        self.leaves[usize::from(id)]
    }

    fn subtree_size(&self, id: NodeId) -> usize {
        self.end[usize::from(id)] - self.rank(id)
    }

    /// The subtree of `id` in pre-order, `id` first.
    fn subtree(&self, id: NodeId) -> &[NodeId] {
        &self.preorder[self.rank(id)..self.end[usize::from(id)]]
    }

    /// Whether `node` lies in the subtree rooted at `ancestor`.
    fn is_within(&self, ancestor: NodeId, node: NodeId) -> bool {
        let r = self.rank(node);
        self.rank(ancestor) <= r && r < self.end[usize::from(ancestor)]
    }
}

/// A scored leaf pair waiting for greedy selection.
struct LeafCandidate {
    similarity: f64,
    left_rank: usize,
    right_rank: usize,
    pair: NodePair,
}

/// A scored inner-node candidate for one left node.
struct InnerCandidate {
    right: NodeId,
    dice: f64,
    value_similarity: f64,
    size_delta: usize,
}

/// State for one matching run. Built per call, never shared.
struct BestLeafMatcher<'a, T: TreeTypes> {
    left: &'a Tree<T>,
    right: &'a Tree<T>,
    config: &'a MatchingConfig,
    left_walk: Traversal,
    right_walk: Traversal,
    matching: Matching,
}

/// Compute the matching between two trees.
///
/// The roots are always paired. Leaves are then paired greedily by value
/// similarity and inner nodes bottom-up by the share of leaves they have in
/// common. Neither tree is modified; nodes left unmatched become inserts and
/// deletes in the edit script.
pub fn compute_matching<T: TreeTypes>(
    left: &Tree<T>,
    right: &Tree<T>,
    config: &MatchingConfig,
) -> Matching {
    debug!(
        nodes_left = left.node_count(),
        nodes_right = right.node_count(),
        "compute_matching start"
    );

    let mut matcher = BestLeafMatcher {
        left,
        right,
        config,
        left_walk: Traversal::new(left),
        right_walk: Traversal::new(right),
        matching: Matching::with_capacity(left.arena.count() + 1, right.arena.count() + 1),
    };
    matcher.matching.add(left.root, right.root);

    matcher.match_leaves();
    debug!(matched = matcher.matching.len(), "after leaf phase");

    matcher.match_inner_nodes();
    debug!(matched = matcher.matching.len(), "after inner phase");

    matcher.matching
}

impl<T: TreeTypes> BestLeafMatcher<'_, T> {
    /// Phase 1: pair leaves.
    ///
    /// Every same-label pair at or above the leaf threshold is scored, then
    /// pairs are accepted best-first. Equal scores go to the pair whose left
    /// node comes first in pre-order, then whose right node does.
    fn match_leaves(&mut self) {
        let (left, right) = (self.left, self.right);
        let mut right_by_label: HashMap<&T::Label, Vec<NodeId>> = HashMap::default();
        for &b in &self.right_walk.preorder {
            if b != right.root && right.is_leaf(b) {
                right_by_label.entry(right.label(b)).or_default().push(b);
            }
        }

        let mut candidates = Vec::new();
        for &a in &self.left_walk.preorder {
            if a == left.root || !left.is_leaf(a) {
                continue;
            }
            let Some(right_leaves) = right_by_label.get(left.label(a)) else {
                continue;
            };
            let a_value = left.value(a);
            for &b in right_leaves {
                let similarity =
                    value_similarity(&self.config.leaf_similarity, a_value, right.value(b));
                if similarity >= self.config.leaf_threshold {
                    candidates.push(LeafCandidate {
                        similarity,
                        left_rank: self.left_walk.rank(a),
                        right_rank: self.right_walk.rank(b),
                        pair: NodePair { left: a, right: b },
                    });
                }
            }
        }

        candidates.sort_by(|x, y| {
            y.similarity
                .total_cmp(&x.similarity)
                .then(x.left_rank.cmp(&y.left_rank))
                .then(x.right_rank.cmp(&y.right_rank))
        });

        for candidate in candidates {
            let NodePair { left, right } = candidate.pair;
            if self.matching.contains_left(left) || self.matching.contains_right(right) {
                continue;
            }
            trace!(
                left = usize::from(left),
                right = usize::from(right),
                similarity = candidate.similarity,
                "leaf match"
            );
            self.matching.add(left, right);
        }
    }

    /// Phase 2: pair inner nodes, children before parents.
    fn match_inner_nodes(&mut self) {
        let (left, right) = (self.left, self.right);
        let mut right_by_label: HashMap<&T::Label, Vec<NodeId>> = HashMap::default();
        for &b in &self.right_walk.preorder {
            if b != right.root && !right.is_leaf(b) {
                right_by_label.entry(right.label(b)).or_default().push(b);
            }
        }

        let left_inner: Vec<NodeId> = left
            .post_order()
            .filter(|&a| a != left.root && !left.is_leaf(a))
            .collect();

        for a in left_inner {
            let Some(candidates) = right_by_label.get(left.label(a)) else {
                continue;
            };

            let mut best: Option<InnerCandidate> = None;
            // Candidates are in pre-order, so keeping the incumbent on a full
            // tie prefers the earliest right node.
            for &b in candidates {
                if self.matching.contains_right(b) {
                    continue;
                }
                let Some(candidate) = self.score_inner(a, b) else {
                    continue;
                };
                trace!(
                    left = usize::from(a),
                    right = usize::from(b),
                    dice = candidate.dice,
                    "inner candidate"
                );
                if best.as_ref().is_none_or(|incumbent| candidate.beats(incumbent)) {
                    best = Some(candidate);
                }
            }

            if let Some(best) = best {
                trace!(
                    left = usize::from(a),
                    right = usize::from(best.right),
                    dice = best.dice,
                    "inner match"
                );
                self.matching.add(a, best.right);
            }
        }
    }

    /// Score `b` as a partner for `a`, or `None` below the threshold.
    fn score_inner(&self, a: NodeId, b: NodeId) -> Option<InnerCandidate> {
        let leaves_a = self.left_walk.leaf_count(a);
        let leaves_b = self.right_walk.leaf_count(b);

        let common = self
            .left_walk
            .subtree(a)
            .iter()
            .filter(|&&leaf| self.left.is_leaf(leaf))
            .filter_map(|&leaf| self.matching.get_right(leaf))
            .filter(|&partner| self.right_walk.is_within(b, partner))
            .count();

        let dice = (2 * common) as f64 / (leaves_a + leaves_b) as f64;
        let threshold = if leaves_a.min(leaves_b) <= self.config.dynamic_leaf_limit {
            self.config.dynamic_threshold
        } else {
            self.config.inner_threshold
        };
        if common == 0 || dice < threshold {
            return None;
        }

        Some(InnerCandidate {
            right: b,
            dice,
            value_similarity: value_similarity(
                &self.config.node_similarity,
                self.left.value(a),
                self.right.value(b),
            ),
            size_delta: self
                .left_walk
                .subtree_size(a)
                .abs_diff(self.right_walk.subtree_size(b)),
        })
    }
}

/// Equal values score 1.0 whatever the measure says, so two `break` or empty
/// `block` leaves still pair up.
fn value_similarity(measure: &SimilarityMeasure, a: &str, b: &str) -> f64 {
    if a == b {
        1.0
    } else {
        measure.similarity(a, b)
    }
}

impl InnerCandidate {
    /// Strictly better: higher Dice, then more similar value, then closer
    /// subtree size.
    ///
    /// The size step keeps nested same-label chains (`block > block > stmt`)
    /// paired level by level; without it identical trees can cross-match.
    fn beats(&self, other: &InnerCandidate) -> bool {
        self.dice
            .total_cmp(&other.dice)
            .then(self.value_similarity.total_cmp(&other.value_similarity))
            .then(other.size_delta.cmp(&self.size_delta))
            .is_gt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{NodeData, SimpleTypes};
    use facet_testhelpers::test;

    type TestTypes = SimpleTypes<&'static str>;

    #[test]
    fn test_identical_trees() {
        let mut left: Tree<TestTypes> = Tree::new(NodeData::new("block", ""));
        left.add_child(left.root, NodeData::new("stmt", "foo();"));
        left.add_child(left.root, NodeData::new("stmt", "bar();"));

        let mut right: Tree<TestTypes> = Tree::new(NodeData::new("block", ""));
        right.add_child(right.root, NodeData::new("stmt", "foo();"));
        right.add_child(right.root, NodeData::new("stmt", "bar();"));

        let matching = compute_matching(&left, &right, &MatchingConfig::default());

        // All nodes should be matched
        assert_eq!(matching.len(), 3);
    }

    #[test]
    fn test_partial_match() {
        // Same structure but one leaf replaced by something unrelated
        let mut left: Tree<TestTypes> = Tree::new(NodeData::new("block", ""));
        let kept_left = left.add_child(left.root, NodeData::new("stmt", "foo();"));
        let gone = left.add_child(left.root, NodeData::new("stmt", "bar();"));

        let mut right: Tree<TestTypes> = Tree::new(NodeData::new("block", ""));
        let kept_right = right.add_child(right.root, NodeData::new("stmt", "foo();"));
        let _new = right.add_child(right.root, NodeData::new("stmt", "while (queue.isEmpty())"));

        let matching = compute_matching(&left, &right, &MatchingConfig::default());

        assert_eq!(matching.get_right(kept_left), Some(kept_right));
        assert!(!matching.contains_left(gone), "unrelated leaves should not match");
    }

    #[test]
    fn test_leaves_need_equal_labels() {
        let mut left: Tree<TestTypes> = Tree::new(NodeData::new("block", ""));
        let a = left.add_child(left.root, NodeData::new("stmt", "foo();"));

        let mut right: Tree<TestTypes> = Tree::new(NodeData::new("block", ""));
        right.add_child(right.root, NodeData::new("comment", "foo();"));

        let matching = compute_matching(&left, &right, &MatchingConfig::default());
        assert!(!matching.contains_left(a));
    }

    #[test]
    fn test_best_leaf_wins_over_first_leaf() {
        // The second right leaf is the closer match and must win even though
        // the first one also clears the threshold.
        let mut left: Tree<TestTypes> = Tree::new(NodeData::new("block", ""));
        let a = left.add_child(left.root, NodeData::new("stmt", "total = total + price;"));

        let mut right: Tree<TestTypes> = Tree::new(NodeData::new("block", ""));
        right.add_child(right.root, NodeData::new("stmt", "total = total - price * 2;"));
        let close = right.add_child(right.root, NodeData::new("stmt", "total = total + price;"));

        let matching = compute_matching(&left, &right, &MatchingConfig::default());
        assert_eq!(matching.get_right(a), Some(close));
    }

    #[test]
    fn test_equal_leaves_pair_in_preorder() {
        let mut left: Tree<TestTypes> = Tree::new(NodeData::new("block", ""));
        let l1 = left.add_child(left.root, NodeData::new("stmt", "i++;"));
        let l2 = left.add_child(left.root, NodeData::new("stmt", "i++;"));

        let mut right: Tree<TestTypes> = Tree::new(NodeData::new("block", ""));
        let r1 = right.add_child(right.root, NodeData::new("stmt", "i++;"));
        let r2 = right.add_child(right.root, NodeData::new("stmt", "i++;"));

        let matching = compute_matching(&left, &right, &MatchingConfig::default());
        assert_eq!(matching.get_right(l1), Some(r1));
        assert_eq!(matching.get_right(l2), Some(r2));
    }

    #[test]
    fn test_inner_nodes_follow_their_leaves() {
        // Two if statements swap places; each must follow its own body.
        let mut left: Tree<TestTypes> = Tree::new(NodeData::new("block", ""));
        let if_a = left.add_child(left.root, NodeData::new("if", "a > 0"));
        left.add_child(if_a, NodeData::new("stmt", "handlePositive(a);"));
        left.add_child(if_a, NodeData::new("stmt", "log.info(\"positive\");"));
        let if_b = left.add_child(left.root, NodeData::new("if", "b < 0"));
        left.add_child(if_b, NodeData::new("stmt", "handleNegative(b);"));
        left.add_child(if_b, NodeData::new("stmt", "log.warn(\"negative\");"));

        let mut right: Tree<TestTypes> = Tree::new(NodeData::new("block", ""));
        let if_b2 = right.add_child(right.root, NodeData::new("if", "b < 0"));
        right.add_child(if_b2, NodeData::new("stmt", "handleNegative(b);"));
        right.add_child(if_b2, NodeData::new("stmt", "log.warn(\"negative\");"));
        let if_a2 = right.add_child(right.root, NodeData::new("if", "a > 0"));
        right.add_child(if_a2, NodeData::new("stmt", "handlePositive(a);"));
        right.add_child(if_a2, NodeData::new("stmt", "log.info(\"positive\");"));

        let matching = compute_matching(&left, &right, &MatchingConfig::default());
        assert_eq!(matching.get_right(if_a), Some(if_a2));
        assert_eq!(matching.get_right(if_b), Some(if_b2));
        assert_eq!(matching.len(), 7);
    }

    #[test]
    fn test_nested_inner_nodes_with_equal_scores() {
        // block -> block -> stmt on both sides: the outer and inner blocks
        // share the same leaf, so only the subtree size tells them apart.
        let mut left: Tree<TestTypes> = Tree::new(NodeData::new("method", "run()"));
        let outer = left.add_child(left.root, NodeData::new("block", ""));
        let inner = left.add_child(outer, NodeData::new("block", ""));
        left.add_child(inner, NodeData::new("stmt", "work();"));

        let mut right: Tree<TestTypes> = Tree::new(NodeData::new("method", "run()"));
        let outer2 = right.add_child(right.root, NodeData::new("block", ""));
        let inner2 = right.add_child(outer2, NodeData::new("block", ""));
        right.add_child(inner2, NodeData::new("stmt", "work();"));

        let matching = compute_matching(&left, &right, &MatchingConfig::default());
        assert_eq!(matching.get_right(inner), Some(inner2));
        assert_eq!(matching.get_right(outer), Some(outer2));
    }

    #[test]
    fn test_equal_empty_values_match() {
        let mut left: Tree<TestTypes> = Tree::new(NodeData::new("block", ""));
        left.add_child(left.root, NodeData::new("return", "return;"));
        let cont = left.add_child(left.root, NodeData::new("continue", ""));
        let empty = left.add_child(left.root, NodeData::new("block", ""));
        let right = left.clone();

        let matching = compute_matching(&left, &right, &MatchingConfig::default());
        assert_eq!(matching.get_right(cont), Some(cont));
        assert_eq!(matching.get_right(empty), Some(empty));
        assert_eq!(matching.len(), left.node_count());
    }

    #[test]
    fn test_unrelated_inner_nodes_stay_unmatched() {
        let mut left: Tree<TestTypes> = Tree::new(NodeData::new("block", ""));
        let if_left = left.add_child(left.root, NodeData::new("if", "ready"));
        left.add_child(if_left, NodeData::new("stmt", "start();"));

        let mut right: Tree<TestTypes> = Tree::new(NodeData::new("block", ""));
        let if_right = right.add_child(right.root, NodeData::new("if", "ready"));
        right.add_child(if_right, NodeData::new("stmt", "System.exit(1);"));

        let matching = compute_matching(&left, &right, &MatchingConfig::default());
        assert!(!matching.contains_left(if_left));
        assert!(!matching.contains_right(if_right));
    }

    #[test]
    fn test_single_node_trees() {
        let left: Tree<TestTypes> = Tree::new(NodeData::new("stmt", "a();"));
        let right: Tree<TestTypes> = Tree::new(NodeData::new("stmt", "b();"));

        let matching = compute_matching(&left, &right, &MatchingConfig::default());
        assert_eq!(matching.len(), 1);
        assert!(matching.contains(NodePair {
            left: left.root,
            right: right.root
        }));
    }

    #[test]
    fn test_double_match_fails_fast() {
        let mut left: Tree<TestTypes> = Tree::new(NodeData::new("block", ""));
        let a = left.add_child(left.root, NodeData::new("stmt", "a();"));
        let mut right: Tree<TestTypes> = Tree::new(NodeData::new("block", ""));
        let b = right.add_child(right.root, NodeData::new("stmt", "a();"));
        let c = right.add_child(right.root, NodeData::new("stmt", "a();"));

        let result = std::panic::catch_unwind(move || {
            let mut matching = Matching::new();
            matching.add(a, b);
            matching.add(a, c);
        });
        assert!(result.is_err(), "matching a node twice must panic");
    }
}
