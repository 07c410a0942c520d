use crate::data_wrappers::{Edge, Sample};
use crate::emitter::{Discard, EdgeSink, Edges};
use crate::error::{HvgError, InvariantViolation, MergeError};
use crate::node_store::NodeStore;
use num_traits::Float;
use std::collections::VecDeque;
use std::fmt::Debug;
use std::mem;
use tracing::trace;

/// A Cartesian tree over a contiguous run of samples. Generic over floating point numeric types.
///
/// In-order traversal visits the samples in position order, and every node's value is at least
/// that of its children. Of two equal values the left one is the ancestor. The tree also keeps
/// its two outer spines, which is where all work of an append or a merge happens:
/// * the left spine, from the leftmost node up to the root, holds the strict running maxima of
///   the run read from the left; and
/// * the right spine, from the root down to the rightmost node, holds the nodes that still
///   have an open view past the end of the run.
///
/// Appending costs amortized O(1). Merging two adjacent trees costs the length of the boundary
/// touched plus the shorter of the spine caches being joined, not the size of either tree.
/// The edges of the horizontal visibility graph fall out of both operations and are reported
/// to an [`EdgeSink`].
#[derive(Debug, Clone)]
pub struct MergeTree<T> {
    store: NodeStore<T>,
    root: Option<usize>,
    left_spine: VecDeque<usize>,
    right_spine: VecDeque<usize>,
}

/// The empty slot of a partially linked boundary.
#[derive(Clone, Copy)]
enum Hole {
    Left(usize),
    Right(usize),
}

impl Hole {
    fn fill<T>(self, store: &mut NodeStore<T>, child: Option<usize>) {
        match self {
            Hole::Left(parent) => store.get_mut(parent).left = child,
            Hole::Right(parent) => store.get_mut(parent).right = child,
        }
    }
}

impl<T> Default for MergeTree<T> {
    fn default() -> Self {
        MergeTree {
            store: NodeStore::new(),
            root: None,
            left_spine: VecDeque::new(),
            right_spine: VecDeque::new(),
        }
    }
}

impl<T: Float> MergeTree<T> {
    /// Creates an empty tree. Its first sample may have any position.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a tree holding a single sample.
    pub fn from_sample(sample: Sample<T>) -> Result<Self, HvgError> {
        let mut tree = Self::new();
        tree.append(sample)?;
        Ok(tree)
    }

    /// Builds a tree from consecutive values, the first of which sits at position `start`.
    ///
    /// # Parameters
    /// * `start` - the position of `values[0]`
    /// * `values` - the values of the run
    /// * `sink` - receives every edge within the run as it is settled
    pub fn from_values<S>(start: usize, values: &[T], sink: &mut S) -> Result<Self, HvgError>
    where
        S: EdgeSink<T> + ?Sized,
    {
        let mut tree = Self::new();
        for (offset, &value) in values.iter().enumerate() {
            let position = start
                .checked_add(offset)
                .ok_or(HvgError::PositionOverflow { last: usize::MAX })?;
            tree.append_with(Sample::new(position, value), &mut *sink)?;
        }
        Ok(tree)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn min_position(&self) -> Option<usize> {
        self.store.first_position()
    }

    pub fn max_position(&self) -> Option<usize> {
        self.store.last_position()
    }

    /// The largest value held, which is always the root's.
    pub fn max_value(&self) -> Option<T> {
        self.root.map(|root| self.store.value(root))
    }

    pub fn root(&self) -> Option<usize> {
        self.root
    }

    pub fn value(&self, position: usize) -> Option<T> {
        self.store.contains(position).then(|| self.store.value(position))
    }

    /// The `(left, right)` children of the node at `position`.
    pub fn children(&self, position: usize) -> Option<(Option<usize>, Option<usize>)> {
        self.store.contains(position).then(|| {
            let node = self.store.get(position);
            (node.left, node.right)
        })
    }

    /// Positions on the left spine, from the leftmost node up to the root.
    pub fn left_spine(&self) -> &VecDeque<usize> {
        &self.left_spine
    }

    /// Positions on the right spine, from the root down to the rightmost node.
    pub fn right_spine(&self) -> &VecDeque<usize> {
        &self.right_spine
    }

    /// Number of arena segments; grows by the right operand's count on every merge.
    pub fn n_segments(&self) -> usize {
        self.store.n_segments()
    }

    /// Coalesces the arena segments left behind by merges.
    pub fn compact(&mut self) {
        self.store.compact();
    }

    /// Lazily iterates over every edge of the graph of this tree's run, in increasing
    /// `(source, target)` order, using memory proportional to the tree depth.
    ///
    /// # Examples
    /// ```
    ///use hvg::MergeTree;
    ///
    ///let tree = MergeTree::from_values(0, &[1.0, 5.0, 3.0, 7.0, 2.0], &mut hvg::Discard).unwrap();
    ///let pairs: Vec<_> = tree.edges().map(|edge| edge.pair()).collect();
    ///assert_eq!(pairs, vec![(0, 1), (1, 2), (1, 3), (2, 3), (3, 4)]);
    /// ```
    pub fn edges(&self) -> Edges<'_, T> {
        Edges::new(&self.store, self.root)
    }

    /// Appends a sample to the right end of the tree, discarding the settled edges.
    pub fn append(&mut self, sample: Sample<T>) -> Result<(), HvgError> {
        self.append_with(sample, &mut Discard)
    }

    /// Appends a sample to the right end of the tree.
    ///
    /// # Parameters
    /// * `sample` - the new sample. Its position must directly follow the tree's maximum
    ///              position, unless the tree is empty.
    /// * `sink` - receives the edges between the new sample and the existing ones, and the
    ///            positions whose view to the right the new sample closes.
    ///
    /// # Returns
    /// * An error, with the tree left untouched, if the position is out of order, the tree
    ///   already ends at `usize::MAX`, or the value is NaN.
    pub fn append_with<S>(&mut self, sample: Sample<T>, sink: &mut S) -> Result<(), HvgError>
    where
        S: EdgeSink<T> + ?Sized,
    {
        let Sample { position, value } = sample;
        if value.is_nan() {
            return Err(HvgError::NanValue { position });
        }
        if let Some(last) = self.max_position() {
            let expected = last.checked_add(1).ok_or(HvgError::PositionOverflow { last })?;
            if position != expected {
                return Err(HvgError::OrderViolation { expected, found: position });
            }
        }
        self.store.push(position, value);
        self.join(position, VecDeque::from([position]), VecDeque::from([position]), sink);
        Ok(())
    }

    /// Links a tree whose nodes already live in the arena directly to the right of this one.
    ///
    /// # Returns
    /// * The number of boundary nodes examined
    fn join<S>(
        &mut self,
        right_root: usize,
        mut right_left: VecDeque<usize>,
        right_right: VecDeque<usize>,
        sink: &mut S,
    ) -> usize
    where
        S: EdgeSink<T> + ?Sized,
    {
        let Some(left_root) = self.root else {
            self.root = Some(right_root);
            self.left_spine = right_left;
            self.right_spine = right_right;
            return 0;
        };
        let left_max = self.store.value(left_root);
        let right_max = self.store.value(right_root);
        // Right spine nodes that stay above the whole right tree
        let kept = self.right_spine.partition_point(|&p| self.store.value(p) >= right_max);
        // Left spine nodes of the right tree that end up below this tree's root
        let absorbed = right_left.partition_point(|&p| self.store.value(p) <= left_max);

        self.link(left_root, right_root, kept, &right_left, absorbed);
        let visited = self.emit_boundary(&right_left, sink);
        debug_assert_eq!(kept, self.right_spine.len());

        right_left.drain(..absorbed);
        let (right_spine, moved_right) = splice(mem::take(&mut self.right_spine), right_right);
        let (left_spine, moved_left) = splice(mem::take(&mut self.left_spine), right_left);
        self.right_spine = right_spine;
        self.left_spine = left_spine;
        if right_max > left_max {
            self.root = Some(right_root);
        }
        sink.visited(visited);
        sink.moved(moved_right + moved_left);
        visited
    }

    /// Zips the lower part of this tree's right spine with the lower part of the right tree's
    /// left spine, highest value first and the left node first on ties.
    fn link(
        &mut self,
        left_root: usize,
        right_root: usize,
        kept: usize,
        right_left: &VecDeque<usize>,
        absorbed: usize,
    ) {
        let store = &mut self.store;
        let (mut hole, mut a, mut b) = if store.value(left_root) >= store.value(right_root) {
            let parent = self.right_spine[kept - 1];
            (Hole::Right(parent), self.right_spine.get(kept).copied(), Some(right_root))
        } else {
            let parent = right_left[absorbed];
            let below = absorbed.checked_sub(1).map(|i| right_left[i]);
            (Hole::Left(parent), Some(left_root), below)
        };
        loop {
            match (a, b) {
                (Some(x), Some(y)) if store.value(x) >= store.value(y) => {
                    hole.fill(store, Some(x));
                    hole = Hole::Right(x);
                    a = store.get(x).right;
                }
                (Some(_), Some(y)) => {
                    hole.fill(store, Some(y));
                    hole = Hole::Left(y);
                    b = store.get(y).left;
                }
                (rest, None) | (None, rest) => {
                    hole.fill(store, rest);
                    break;
                }
            }
        }
    }

    /// Reports the edges across the boundary, popping the right spine nodes whose view the
    /// right tree closes. Only nodes on the two facing spines can see across: the right
    /// tree's left spine is walked upwards, and each of its nodes sees down this tree's
    /// right spine until a node at least as high as itself.
    fn emit_boundary<S>(&mut self, right_left: &VecDeque<usize>, sink: &mut S) -> usize
    where
        S: EdgeSink<T> + ?Sized,
    {
        let store = &self.store;
        let spine = &mut self.right_spine;
        let mut visited = 0;
        let mut last_popped: Option<T> = None;
        let mut previous: Option<T> = None;
        // The rightmost node of a run is never blocked
        let mut top_settled = false;

        for &target in right_left {
            if spine.is_empty() {
                break;
            }
            visited += 1;
            let target_value = store.value(target);
            let mut floor = higher(previous, last_popped);
            while let Some(&source) = spine.back() {
                visited += 1;
                let source_value = store.value(source);
                if floor.map_or(true, |floor| floor < source_value) {
                    sink.edge(Edge::between((source, source_value), (target, target_value), floor));
                }
                if source_value < target_value {
                    spine.pop_back();
                    if !top_settled {
                        sink.settled(source);
                    }
                    top_settled = spine.back().is_some_and(|&next| store.value(next) == source_value);
                    floor = higher(floor, Some(source_value));
                    last_popped = Some(source_value);
                } else {
                    if source_value == target_value && !top_settled {
                        sink.settled(source);
                        top_settled = true;
                    }
                    break;
                }
            }
            previous = Some(target_value);
        }
        visited
    }

    /// Walks the whole tree and checks the heap, order, tie and spine invariants.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let Some(root) = self.root else {
            if self.is_empty() && self.left_spine.is_empty() && self.right_spine.is_empty() {
                return Ok(());
            }
            return Err(InvariantViolation(String::from("Empty tree holds nodes")));
        };
        let first = self.store.first_position().unwrap_or_default();
        let mut stack = Vec::new();
        let mut next = Some(root);
        let mut pushed = 0;
        let mut visited = 0;
        loop {
            while let Some(position) = next {
                if !self.store.contains(position) {
                    return Err(InvariantViolation(format!("Link to foreign position {position}")));
                }
                pushed += 1;
                if pushed > self.len() {
                    return Err(InvariantViolation(format!("Cycle through position {position}")));
                }
                stack.push(position);
                next = self.store.get(position).left;
            }
            let Some(position) = stack.pop() else { break };
            let node = self.store.get(position);
            let expected = first + visited;
            if node.position != position || position != expected {
                return Err(InvariantViolation(format!(
                    "In-order walk reached position {position}, expected {expected}"
                )));
            }
            if let Some(left) = node.left {
                if self.store.value(left) >= node.value {
                    return Err(InvariantViolation(format!(
                        "Left child {left} is not strictly below its parent {position}"
                    )));
                }
            }
            if let Some(right) = node.right {
                if self.store.value(right) > node.value {
                    return Err(InvariantViolation(format!(
                        "Right child {right} is above its parent {position}"
                    )));
                }
            }
            visited += 1;
            next = node.right;
        }
        if visited != self.len() {
            return Err(InvariantViolation(format!("Reached {visited} of {} nodes", self.len())));
        }

        let mut left_spine = Vec::new();
        let mut next = Some(root);
        while let Some(position) = next {
            left_spine.push(position);
            next = self.store.get(position).left;
        }
        left_spine.reverse();
        if self.left_spine != left_spine {
            return Err(InvariantViolation(String::from("Stale left spine")));
        }
        let mut right_spine = Vec::new();
        let mut next = Some(root);
        while let Some(position) = next {
            right_spine.push(position);
            next = self.store.get(position).right;
        }
        if self.right_spine != right_spine {
            return Err(InvariantViolation(String::from("Stale right spine")));
        }
        Ok(())
    }
}

impl<T: Float + Debug> MergeTree<T> {
    /// Merges a tree holding the samples directly to the right of this one, discarding the
    /// edges across the boundary.
    pub fn merge(self, right: MergeTree<T>) -> Result<MergeTree<T>, MergeError<T>> {
        self.merge_with(right, &mut Discard)
    }

    /// Merges a tree holding the samples directly to the right of this one. Both trees are
    /// consumed and their nodes move into the result without being copied.
    ///
    /// # Parameters
    /// * `right` - the right operand. Its minimum position must directly follow this tree's
    ///             maximum position, so this tree must not end at `usize::MAX`. An empty
    ///             operand on either side is returned as is.
    /// * `sink` - receives the edges across the boundary and the positions of this tree
    ///            whose view the right operand closes.
    ///
    /// # Returns
    /// * The merged tree, or an error holding both untouched operands if the position
    ///   ranges are not adjacent.
    ///
    /// # Examples
    /// ```
    ///use hvg::{Discard, MergeTree};
    ///
    ///let left = MergeTree::from_values(0, &[1.0, 5.0, 3.0], &mut Discard).unwrap();
    ///let right = MergeTree::from_values(3, &[7.0, 2.0], &mut Discard).unwrap();
    ///let mut across = Vec::new();
    ///let merged = left.merge_with(right, &mut across).unwrap();
    ///let pairs: Vec<_> = across.iter().map(|edge| edge.pair()).collect();
    ///assert_eq!(pairs, vec![(2, 3), (1, 3)]);
    ///assert_eq!(merged.max_value(), Some(7.0));
    /// ```
    pub fn merge_with<S>(self, right: MergeTree<T>, sink: &mut S) -> Result<MergeTree<T>, MergeError<T>>
    where
        S: EdgeSink<T> + ?Sized,
    {
        let (Some(left_max), Some(right_min)) = (self.max_position(), right.min_position()) else {
            return Ok(if self.is_empty() { right } else { self });
        };
        let Some(expected) = left_max.checked_add(1) else {
            return Err(MergeError::new(HvgError::PositionOverflow { last: left_max }, self, right));
        };
        if right_min != expected {
            let kind = HvgError::OrderViolation { expected, found: right_min };
            return Err(MergeError::new(kind, self, right));
        }
        let (left_len, right_len) = (self.len(), right.len());
        let mut merged = self;
        let MergeTree { store, root, left_spine, right_spine } = right;
        merged.store.absorb(store);
        let visited = match root {
            Some(root) => merged.join(root, left_spine, right_spine, sink),
            None => 0,
        };
        trace!(left_len, right_len, visited, "merged trees");
        Ok(merged)
    }
}

impl<T: PartialEq> PartialEq for MergeTree<T> {
    /// Trees are equal when they hold the same samples linked the same way, however their
    /// arenas are segmented.
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root
            && self.store.len() == other.store.len()
            && self.store.iter().zip(other.store.iter()).all(|(a, b)| a == b)
    }
}

/// Concatenates two spine pieces by moving the entries of the shorter one.
///
/// # Returns
/// * The joined spine and the number of entries moved
fn splice(mut front: VecDeque<usize>, mut back: VecDeque<usize>) -> (VecDeque<usize>, usize) {
    if front.len() <= back.len() {
        let moved = front.len();
        while let Some(position) = front.pop_back() {
            back.push_front(position);
        }
        (back, moved)
    } else {
        let moved = back.len();
        front.extend(back);
        (front, moved)
    }
}

fn higher<T: Float>(a: Option<T>, b: Option<T>) -> Option<T> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::BuildStats;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn tree_of(start: usize, values: &[f64]) -> MergeTree<f64> {
        MergeTree::from_values(start, values, &mut Discard).unwrap()
    }

    #[test]
    fn append_builds_cartesian_tree() {
        let tree = tree_of(0, &[1.0, 5.0, 3.0, 7.0, 2.0]);
        assert_eq!(Some(3), tree.root());
        assert_eq!(Some((Some(1), Some(4))), tree.children(3));
        assert_eq!(Some((Some(0), Some(2))), tree.children(1));
        assert_eq!(tree.left_spine(), &[0, 1, 3]);
        assert_eq!(tree.right_spine(), &[3, 4]);
        assert_eq!(Some(7.0), tree.max_value());
        assert!(tree.check_invariants().is_ok());
    }

    #[test]
    fn equal_values_hang_to_the_right() {
        let tree = tree_of(0, &[2.0, 2.0, 2.0]);
        assert_eq!(Some(0), tree.root());
        assert_eq!(Some((None, Some(1))), tree.children(0));
        assert_eq!(Some((None, Some(2))), tree.children(1));
        assert_eq!(tree.right_spine(), &[0, 1, 2]);
        assert_eq!(tree.left_spine(), &[0]);
    }

    #[test]
    fn append_emits_edges_and_settles() {
        let mut tree = tree_of(0, &[2.0, 2.0]);
        let mut edges = Vec::new();
        let mut stats = BuildStats::default();
        tree.append_with(Sample::new(2, 3.0), &mut edges).unwrap();
        tree.append_with(Sample::new(3, 1.0), &mut stats).unwrap();
        let pairs: Vec<_> = edges.iter().map(|edge| edge.pair()).collect();
        // Position 0 is hidden behind the equal value at position 1
        assert_eq!(vec![(1, 2)], pairs);
        assert_eq!(None, edges[0].clearance);
        assert_eq!(1, stats.edges);
        assert_eq!(0, stats.settled);
    }

    #[test]
    fn clearance_measures_gap_above_intervening_values() {
        let mut edges = Vec::new();
        MergeTree::from_values(0, &[4.0, 1.0, 2.0, 6.0], &mut edges).unwrap();
        let edge = edges.iter().find(|edge| edge.pair() == (0, 3)).unwrap();
        assert_eq!(Some(2.0), edge.clearance);
        let edge = edges.iter().find(|edge| edge.pair() == (0, 1)).unwrap();
        assert_eq!(None, edge.clearance);
        assert_eq!(f64::INFINITY, edge.weight(f64::INFINITY));
    }

    #[test]
    fn append_out_of_order() {
        let mut tree = tree_of(4, &[1.0, 2.0]);
        let before = tree.clone();
        let result = tree.append(Sample::new(7, 3.0));
        assert_eq!(Err(HvgError::OrderViolation { expected: 6, found: 7 }), result);
        assert_eq!(before, tree);
    }

    #[test]
    fn append_nan() {
        let mut tree = tree_of(0, &[1.0]);
        let result = tree.append(Sample::new(1, f64::NAN));
        assert_eq!(Err(HvgError::NanValue { position: 1 }), result);
        assert_eq!(1, tree.len());
    }

    #[test]
    fn merge_with_empty_is_identity() {
        let tree = tree_of(3, &[1.0, 4.0, 2.0]);
        let merged = tree.clone().merge(MergeTree::new()).unwrap();
        assert_eq!(tree, merged);
        let merged = MergeTree::new().merge(tree.clone()).unwrap();
        assert_eq!(tree, merged);
    }

    #[test]
    fn merge_rejects_gap_and_returns_operands() {
        let left = tree_of(0, &[1.0, 2.0]);
        let right = tree_of(5, &[3.0]);
        let err = left.clone().merge(right.clone()).unwrap_err();
        assert_eq!(HvgError::OrderViolation { expected: 2, found: 5 }, err.kind);
        let (l, r) = err.into_parts();
        assert_eq!(left, l);
        assert_eq!(right, r);
    }

    #[test]
    fn merge_matches_appending() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let n = rng.gen_range(2..40);
            let values: Vec<f64> = (0..n).map(|_| rng.gen_range(0..6) as f64).collect();
            let split = rng.gen_range(0..=n);
            let whole = tree_of(0, &values);
            let left = tree_of(0, &values[..split]);
            let right = tree_of(split, &values[split..]);
            let merged = left.merge(right).unwrap();
            assert!(merged.check_invariants().is_ok());
            assert_eq!(whole, merged);
        }
    }

    #[test]
    fn merge_boundary_work_is_local() {
        // A long descending run followed by a short run that stays below it
        let descending: Vec<f64> = (0..1000).map(|i| 2000.0 - i as f64).collect();
        let left = tree_of(0, &descending);
        let right = tree_of(1000, &[0.5, 0.25]);
        let mut stats = BuildStats::default();
        let merged = left.merge_with(right, &mut stats).unwrap();
        assert_eq!(1, stats.edges);
        assert!(stats.visited <= 4);
        assert!(stats.moved <= 2);
        assert_eq!(2, merged.n_segments());
    }

    #[test]
    fn merge_moves_only_the_shorter_spine() {
        // A single high sample in front of a long descending run
        let descending: Vec<f64> = (0..100_000).map(|i| -(i as f64)).collect();
        let left = tree_of(0, &[1e12]);
        let right = tree_of(1, &descending);
        let mut stats = BuildStats::default();
        let merged = left.merge_with(right, &mut stats).unwrap();
        assert_eq!(1, stats.edges);
        assert!(stats.visited <= 2);
        assert!(stats.moved <= 1);
        assert_eq!(Some(0), merged.root());
        assert_eq!(100_001, merged.right_spine().len());
        assert_eq!(merged.left_spine(), &[0]);
        assert!(merged.check_invariants().is_ok());
    }

    #[test]
    fn positions_run_up_to_usize_max() {
        let mut tree = tree_of(usize::MAX - 1, &[1.0, 2.0]);
        assert_eq!(Some(usize::MAX), tree.max_position());
        assert!(tree.check_invariants().is_ok());
        let overflow = HvgError::PositionOverflow { last: usize::MAX };
        assert_eq!(Err(overflow.clone()), tree.append(Sample::new(0, 3.0)));
        assert_eq!(2, tree.len());
        let err = tree.merge(tree_of(0, &[1.0])).unwrap_err();
        assert_eq!(overflow, err.kind);
        assert_eq!(Err(overflow), MergeTree::from_values(usize::MAX, &[1.0, 2.0], &mut Discard));
    }

    #[test]
    fn cyclic_links_are_reported() {
        let mut tree = tree_of(0, &[1.0, 2.0]);
        tree.store.get_mut(0).left = Some(1);
        assert!(tree.check_invariants().is_err());
    }

    #[test]
    fn append_work_is_amortized_constant() {
        let mut rng = StdRng::seed_from_u64(11);
        let values: Vec<f64> = (0..5000).map(|_| rng.gen::<f64>()).collect();
        let mut stats = BuildStats::default();
        MergeTree::from_values(0, &values, &mut stats).unwrap();
        assert!(stats.visited <= 3 * values.len());
    }

    #[test]
    fn compact_preserves_tree() {
        let left = tree_of(0, &[3.0, 1.0, 2.0]);
        let right = tree_of(3, &[5.0, 0.0]);
        let mut merged = left.merge(right).unwrap();
        let before = merged.clone();
        merged.compact();
        assert_eq!(1, merged.n_segments());
        assert_eq!(before, merged);
        assert!(merged.check_invariants().is_ok());
    }
}
