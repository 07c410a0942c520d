use crate::data_wrappers::Edge;
use crate::node_store::NodeStore;
use num_traits::Float;
use std::ops::AddAssign;

/// Receiver of the edges settled while a merge tree is appended to or merged.
///
/// Every edge of the graph is reported exactly once, at the moment its right endpoint is
/// joined to a tree that already holds its left endpoint. `settled` is reported at most once
/// per node, when nothing further to the right can ever be visible from it; a finalized
/// stream has reported it for every node.
pub trait EdgeSink<T> {
    fn edge(&mut self, edge: Edge<T>);

    fn settled(&mut self, _position: usize) {}

    /// Number of boundary nodes an operation examined.
    fn visited(&mut self, _count: usize) {}

    /// Number of spine entries an operation moved from one tree's spine cache to the other's.
    fn moved(&mut self, _count: usize) {}
}

impl<T> EdgeSink<T> for Vec<Edge<T>> {
    fn edge(&mut self, edge: Edge<T>) {
        self.push(edge);
    }
}

impl<T, S: EdgeSink<T> + ?Sized> EdgeSink<T> for &mut S {
    fn edge(&mut self, edge: Edge<T>) {
        (**self).edge(edge)
    }

    fn settled(&mut self, position: usize) {
        (**self).settled(position)
    }

    fn visited(&mut self, count: usize) {
        (**self).visited(count)
    }

    fn moved(&mut self, count: usize) {
        (**self).moved(count)
    }
}

/// A sink that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct Discard;

impl<T> EdgeSink<T> for Discard {
    fn edge(&mut self, _edge: Edge<T>) {}
}

/// A sink calling a closure for each edge. See [`from_fn`].
#[derive(Debug, Clone)]
pub struct FnSink<F>(F);

/// Wraps a closure into an [`EdgeSink`].
///
/// # Examples
/// ```
///use hvg::{emitter, MergeTree, Sample};
///
///let mut pairs = Vec::new();
///let mut tree = MergeTree::new();
///let mut sink = emitter::from_fn(|edge: hvg::Edge<f64>| pairs.push(edge.pair()));
///for (position, value) in [1.0, 5.0, 3.0].into_iter().enumerate() {
///    tree.append_with(Sample::new(position, value), &mut sink).unwrap();
///}
///assert_eq!(pairs, vec![(0, 1), (1, 2)]);
/// ```
pub fn from_fn<T, F: FnMut(Edge<T>)>(f: F) -> FnSink<F> {
    FnSink(f)
}

impl<T, F: FnMut(Edge<T>)> EdgeSink<T> for FnSink<F> {
    fn edge(&mut self, edge: Edge<T>) {
        (self.0)(edge)
    }
}

/// Accumulates counts of the work done by the operations it is passed into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub edges: usize,
    pub settled: usize,
    pub visited: usize,
    pub moved: usize,
}

impl AddAssign for BuildStats {
    fn add_assign(&mut self, other: BuildStats) {
        self.edges += other.edges;
        self.settled += other.settled;
        self.visited += other.visited;
        self.moved += other.moved;
    }
}

impl<T> EdgeSink<T> for BuildStats {
    fn edge(&mut self, _edge: Edge<T>) {
        self.edges += 1;
    }

    fn settled(&mut self, _position: usize) {
        self.settled += 1;
    }

    fn visited(&mut self, count: usize) {
        self.visited += count;
    }

    fn moved(&mut self, count: usize) {
        self.moved += count;
    }
}

/// Lazy iterator over every edge of a merge tree, in increasing `(source, target)` order.
///
/// Walks the tree in order with an explicit stack. When position `i` is visited, the stack
/// already holds the nearest ancestor to its right (the first later value strictly above
/// `v_i`), and pushing the left spine of `i`'s right subtree lays out the strict running
/// maxima after `i`. Those maxima, nearest first, are exactly the right-hand neighbours of
/// `i`; the ancestor is one more unless the tallest maximum equals `v_i` and blocks it.
pub struct Edges<'a, T> {
    store: &'a NodeStore<T>,
    stack: Vec<usize>,
    source: Option<usize>,
    mark: usize,
    cursor: usize,
    floor: Option<T>,
    ancestor_done: bool,
}

impl<'a, T: Float> Edges<'a, T> {
    pub(crate) fn new(store: &'a NodeStore<T>, root: Option<usize>) -> Self {
        let mut edges = Edges {
            store,
            stack: Vec::new(),
            source: None,
            mark: 0,
            cursor: 0,
            floor: None,
            ancestor_done: true,
        };
        edges.push_left_spine(root);
        edges
    }

    fn push_left_spine(&mut self, mut next: Option<usize>) {
        while let Some(position) = next {
            self.stack.push(position);
            next = self.store.get(position).left;
        }
    }
}

impl<'a, T: Float> Iterator for Edges<'a, T> {
    type Item = Edge<T>;

    fn next(&mut self) -> Option<Edge<T>> {
        loop {
            if let Some(source) = self.source {
                let source_value = self.store.value(source);
                if self.cursor > self.mark {
                    self.cursor -= 1;
                    let target = self.stack[self.cursor];
                    let target_value = self.store.value(target);
                    let edge = Edge::between(
                        (source, source_value),
                        (target, target_value),
                        self.floor,
                    );
                    self.floor = Some(target_value);
                    return Some(edge);
                }
                if !self.ancestor_done {
                    self.ancestor_done = true;
                    let blocked = self.floor.is_some_and(|floor| floor >= source_value);
                    if self.mark > 0 && !blocked {
                        let target = self.stack[self.mark - 1];
                        let target_value = self.store.value(target);
                        return Some(Edge::between(
                            (source, source_value),
                            (target, target_value),
                            self.floor,
                        ));
                    }
                }
                self.source = None;
            }

            let source = self.stack.pop()?;
            self.mark = self.stack.len();
            self.push_left_spine(self.store.get(source).right);
            self.cursor = self.stack.len();
            self.floor = None;
            self.ancestor_done = false;
            self.source = Some(source);
        }
    }
}
