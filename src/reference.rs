//! Direct evaluation of the horizontal visibility rule, for validating the tree-based builders.

use crate::data_wrappers::Edge;
use num_traits::Float;

/// Computes every edge of the horizontal visibility graph of `values` straight from the
/// definition: `i < j` are joined iff every value strictly between them is below both.
/// Edges are returned in increasing `(source, target)` order.
///
/// The scan from each `i` stops at the first value at least as high as `v_i`, so the cost is
/// quadratic only on monotone stretches.
///
/// # Examples
/// ```
///use hvg::reference::naive_edges;
///
///let pairs: Vec<_> = naive_edges(&[1.0, 5.0, 3.0, 7.0, 2.0])
///    .iter()
///    .map(|edge| edge.pair())
///    .collect();
///assert_eq!(pairs, vec![(0, 1), (1, 2), (1, 3), (2, 3), (3, 4)]);
/// ```
pub fn naive_edges<T: Float>(values: &[T]) -> Vec<Edge<T>> {
    let mut edges = Vec::new();
    for (i, &source) in values.iter().enumerate() {
        let mut floor: Option<T> = None;
        for (j, &target) in values.iter().enumerate().skip(i + 1) {
            if floor.map_or(true, |floor| floor < source.min(target)) {
                edges.push(Edge::between((i, source), (j, target), floor));
            }
            floor = Some(floor.map_or(target, |floor| floor.max(target)));
            if target >= source {
                break;
            }
        }
    }
    edges
}
