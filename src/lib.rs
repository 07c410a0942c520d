//! Horizontal visibility graphs ("HVG") of time series in Rust. Generic over floating point
//! numeric types.
//!
//! The horizontal visibility graph of a sequence has one node per position, and joins two
//! positions `i < j` iff every value strictly between them is lower than both `v_i` and `v_j`.
//! It turns a time series into a network whose structure (degree distribution, clustering,
//! motifs) characterises the dynamics behind the series.
//!
//! This implementation keeps the visibility structure of a sequence in a [`MergeTree`], a
//! Cartesian tree over the positions. The main benefits of doing so are that:
//!  1. Samples can be appended one at a time in amortized constant time, and the edges they
//!     create are reported as soon as they are known, so arbitrarily long streams can be
//!     processed without holding the edge set in memory;
//!  2. The trees of two adjacent sub-sequences can be merged into the tree of their
//!     concatenation by touching only the nodes on the facing boundary spines, without
//!     re-scanning either sub-sequence; and
//!  3. Because of 2., long series can be cut into chunks whose trees are built independently,
//!     in parallel, and then merged pairwise.
//!
//! Whichever way a tree is built, the edges are the same, each reported exactly once.
//! Of two equal values the left one is the ancestor in the tree; equal values block each
//! other's view, so a flat run only joins immediate neighbours.
//!
//! # Examples
//! ```
//!use hvg::{Discard, Hvg, MergeTree};
//!
//!let data: Vec<f64> = vec![1.0, 5.0, 3.0, 7.0, 2.0];
//!let tree = Hvg::default_config(&data).build().unwrap();
//!let pairs: Vec<_> = tree.edges().map(|edge| edge.pair()).collect();
//!assert_eq!(pairs, vec![(0, 1), (1, 2), (1, 3), (2, 3), (3, 4)]);
//!
//! // The same graph, merged from two independently built halves
//!let left = MergeTree::from_values(0, &data[..2], &mut Discard).unwrap();
//!let right = MergeTree::from_values(2, &data[2..], &mut Discard).unwrap();
//!assert_eq!(tree, left.merge(right).unwrap());
//! ```
//!
//! # References
//! * [Luque, B.; Lacasa, L.; Ballesteros, F.; Luque, J. Horizontal visibility graphs: Exact results for random time series.](https://doi.org/10.1103/PhysRevE.80.046103)
//! * [Fano Yela, D.; Thalmann, F.; Nicosia, V.; Stowell, D.; Sandler, M. Online visibility graphs: Encoding visibility in a binary search tree.](https://doi.org/10.1103/PhysRevResearch.2.023069)

pub use crate::config::{ConfigBuilder, HvgConfig};
pub use crate::data_wrappers::{Edge, Sample};
pub use crate::emitter::{BuildStats, Discard, EdgeSink, Edges};
pub use crate::error::{HvgError, InvariantViolation, MergeError};
pub use crate::hvg::Hvg;
pub use crate::merge_tree::MergeTree;
pub use crate::streaming::StreamingHvg;

mod config;
mod construction;
mod data_wrappers;
pub mod emitter;
mod error;
mod hvg;
mod merge_tree;
mod node_store;
pub mod reference;
mod streaming;
mod validation;
