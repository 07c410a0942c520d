/// A node of a merge tree. Children are referenced by their sequence position.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Node<T> {
    pub(crate) position: usize,
    pub(crate) value: T,
    pub(crate) left: Option<usize>,
    pub(crate) right: Option<usize>,
}

/// A contiguous run of nodes starting at `start`.
#[derive(Debug, Clone)]
struct Segment<T> {
    start: usize,
    nodes: Vec<Node<T>>,
}

impl<T> Segment<T> {
    /// Segments are never empty, so this holds even for a node at `usize::MAX`.
    fn last(&self) -> usize {
        self.start + (self.nodes.len() - 1)
    }
}

/// Arena of merge tree nodes, addressed by sequence position.
///
/// Nodes live in a list of position-contiguous segments. Appending a sample pushes onto the
/// last segment, and absorbing another store (the right operand of a merge) only moves its
/// segment list, so a merge never copies or revisits the nodes it does not restructure.
#[derive(Debug, Clone)]
pub(crate) struct NodeStore<T> {
    segments: Vec<Segment<T>>,
    len: usize,
}

impl<T> NodeStore<T> {
    pub(crate) fn new() -> Self {
        NodeStore { segments: Vec::new(), len: 0 }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) fn n_segments(&self) -> usize {
        self.segments.len()
    }

    pub(crate) fn first_position(&self) -> Option<usize> {
        self.segments.first().map(|segment| segment.start)
    }

    pub(crate) fn last_position(&self) -> Option<usize> {
        self.segments.last().map(Segment::last)
    }

    pub(crate) fn contains(&self, position: usize) -> bool {
        match (self.first_position(), self.last_position()) {
            (Some(first), Some(last)) => first <= position && position <= last,
            _ => false,
        }
    }

    /// Adds a childless node at the next position of the arena, or at any position if the
    /// arena is empty. The caller is responsible for checking contiguity.
    pub(crate) fn push(&mut self, position: usize, value: T) {
        let node = Node { position, value, left: None, right: None };
        match self.segments.last_mut() {
            Some(segment) => {
                debug_assert_eq!(segment.last().checked_add(1), Some(position));
                segment.nodes.push(node);
            }
            None => self.segments.push(Segment { start: position, nodes: vec![node] }),
        }
        self.len += 1;
    }

    /// Takes ownership of every node of `other`, whose positions must directly follow ours.
    pub(crate) fn absorb(&mut self, other: NodeStore<T>) {
        debug_assert!(match (self.last_position(), other.first_position()) {
            (Some(last), Some(first)) => last.checked_add(1) == Some(first),
            _ => true,
        });
        self.len += other.len;
        self.segments.extend(other.segments);
    }

    /// Coalesces all segments into one.
    pub(crate) fn compact(&mut self) {
        if self.segments.len() <= 1 {
            return;
        }
        let start = self.segments[0].start;
        let mut nodes = Vec::with_capacity(self.len);
        for segment in self.segments.drain(..) {
            nodes.extend(segment.nodes);
        }
        self.segments.push(Segment { start, nodes });
    }

    pub(crate) fn get(&self, position: usize) -> &Node<T> {
        let segment = &self.segments[self.segment_index(position)];
        &segment.nodes[position - segment.start]
    }

    pub(crate) fn get_mut(&mut self, position: usize) -> &mut Node<T> {
        let index = self.segment_index(position);
        let segment = &mut self.segments[index];
        &mut segment.nodes[position - segment.start]
    }

    /// Iterates over the nodes in position order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Node<T>> {
        self.segments.iter().flat_map(|segment| segment.nodes.iter())
    }

    fn segment_index(&self, position: usize) -> usize {
        // Appends always hit the last segment
        let last = self.segments.len().saturating_sub(1);
        if self.segments.get(last).is_some_and(|segment| segment.start <= position) {
            return last;
        }
        self.segments
            .partition_point(|segment| segment.start <= position)
            .saturating_sub(1)
    }
}

impl<T: Copy> NodeStore<T> {
    pub(crate) fn value(&self, position: usize) -> T {
        self.get(position).value
    }
}
