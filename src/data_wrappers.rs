use num_traits::Float;

/// A single observation of a time series: its position in the sequence and its value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample<T> {
    pub position: usize,
    pub value: T,
}

impl<T> Sample<T> {
    pub fn new(position: usize, value: T) -> Self {
        Sample { position, value }
    }
}

/// An edge of a horizontal visibility graph between two sequence positions.
///
/// `source` is always the smaller position. The `clearance` is the gap between the lower of
/// the two endpoint values and the highest value strictly between them, i.e. how far the
/// line of sight passes above the intervening samples. Edges between adjacent positions have
/// nothing in between, so they carry no clearance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge<T> {
    pub source: usize,
    pub target: usize,
    pub clearance: Option<T>,
}

impl<T: Float> Edge<T> {
    pub(crate) fn between(source: (usize, T), target: (usize, T), floor: Option<T>) -> Self {
        let clearance = floor.map(|floor| source.1.min(target.1) - floor);
        Edge { source: source.0, target: target.0, clearance }
    }

    /// The weight of this edge, using `neighbour_weight` for edges between adjacent positions.
    pub fn weight(&self, neighbour_weight: T) -> T {
        self.clearance.unwrap_or(neighbour_weight)
    }

    /// The edge as a `(source, target)` position pair.
    pub fn pair(&self) -> (usize, usize) {
        (self.source, self.target)
    }
}
