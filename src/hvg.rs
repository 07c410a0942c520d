#[cfg(feature = "parallel")]
use crate::construction::parallel::TreeBuilderPar;
#[cfg(feature = "serial")]
use crate::construction::serial::TreeBuilder;
#[cfg(feature = "serial")]
use crate::emitter::{BuildStats, EdgeSink};
use crate::validation::DataValidator;
use crate::{Edge, HvgConfig, HvgError, MergeTree};
#[cfg(feature = "serial")]
use crate::StreamingHvg;
use num_traits::Float;
use std::fmt::Debug;
use tracing::debug;

/// Horizontal visibility graph construction over a time series. Generic over floating point
/// numeric types.
#[derive(Debug, Clone, PartialEq)]
pub struct Hvg<'a, T> {
    data: &'a [T],
    start: usize,
    config: HvgConfig,
}

impl<'a, T: Float + Debug + Send + Sync> Hvg<'a, T> {
    /// Creates a graph builder using a custom configuration.
    ///
    /// # Parameters
    /// * `data` - a reference to the time series, one value per position. Values may be
    ///            infinite but must not be NaN.
    /// * `config` - the configuration.
    ///
    /// # Returns
    /// * The graph builder instance.
    ///
    /// # Examples
    /// ```
    ///use hvg::{Hvg, HvgConfig};
    ///
    ///let data: Vec<f32> = vec![0.3, 1.2, 0.8, 0.1, 0.9];
    ///let config = HvgConfig::builder()
    ///    .chunk_size(2)
    ///    .neighbour_weight(1.0)
    ///    .build();
    ///let graph = Hvg::new(&data, config);
    /// ```
    pub fn new(data: &'a [T], config: HvgConfig) -> Self {
        Hvg { data, start: 0, config }
    }

    /// Creates a graph builder using the default configuration.
    ///
    /// # Parameters
    /// * `data` - a reference to the time series, one value per position. Values may be
    ///            infinite but must not be NaN.
    ///
    /// # Returns
    /// * The graph builder instance.
    pub fn default_config(data: &'a [T]) -> Self {
        Hvg::new(data, HvgConfig::default())
    }

    /// Gives `data[0]` the position `start` instead of zero, e.g. when `data` is one slice of
    /// a longer series whose graphs will be merged later.
    pub fn starting_at(mut self, start: usize) -> Self {
        self.start = start;
        self
    }

    /// Builds the merge tree of the series by appending one sample at a time.
    ///
    /// # Returns
    /// * A result that, if successful, contains the merge tree of the whole series. Iterate
    ///   over its edges with [`MergeTree::edges`]. An error is returned if any value is NaN.
    ///
    /// # Examples
    /// ```
    ///use hvg::Hvg;
    ///
    ///let data = vec![1.0, 5.0, 3.0, 7.0, 2.0];
    ///let tree = Hvg::default_config(&data).build().unwrap();
    ///let pairs: Vec<_> = tree.edges().map(|edge| edge.pair()).collect();
    ///assert_eq!(pairs, vec![(0, 1), (1, 2), (1, 3), (2, 3), (3, 4)]);
    /// ```
    #[cfg(feature = "serial")]
    pub fn build(&self) -> Result<MergeTree<T>, HvgError> {
        DataValidator::new(self.data, self.start).validate_input_data()?;
        let mut stats = BuildStats::default();
        let tree = TreeBuilder::new(self.data, self.start, &self.config).build(&mut stats)?;
        debug!(len = tree.len(), edges = stats.edges, "built graph");
        self.verify(&tree);
        Ok(tree)
    }

    /// Builds one merge tree per chunk of the series, then merges neighbouring trees pairwise.
    /// Gives the same tree as [`Hvg::build`].
    ///
    /// # Returns
    /// * A result that, if successful, contains the merge tree of the whole series. An error
    ///   is returned if any value is NaN.
    #[cfg(feature = "serial")]
    pub fn build_chunked(&self) -> Result<MergeTree<T>, HvgError> {
        DataValidator::new(self.data, self.start).validate_input_data()?;
        let mut stats = BuildStats::default();
        let tree = TreeBuilder::new(self.data, self.start, &self.config).build_chunked(&mut stats)?;
        debug!(len = tree.len(), edges = stats.edges, visited = stats.visited, "built chunked graph");
        self.verify(&tree);
        Ok(tree)
    }

    /// Builds one merge tree per chunk of the series in parallel, then merges neighbouring
    /// trees pairwise, in parallel within each round. Not recommended for short series.
    /// Gives the same tree as [`Hvg::build`].
    ///
    /// # Returns
    /// * A result that, if successful, contains the merge tree of the whole series. An error
    ///   is returned if any value is NaN.
    ///
    /// # Examples
    /// ```
    ///use hvg::{Hvg, HvgConfig};
    ///
    ///let data: Vec<f64> = (0..10_000).map(|i| ((i * 31) % 97) as f64).collect();
    ///let config = HvgConfig::builder().chunk_size(1_000).build();
    ///let graph = Hvg::new(&data, config);
    ///assert_eq!(graph.build_par().unwrap(), graph.build().unwrap());
    /// ```
    #[cfg(feature = "parallel")]
    pub fn build_par(&self) -> Result<MergeTree<T>, HvgError> {
        DataValidator::new(self.data, self.start).validate_input_data()?;
        let (tree, stats) = TreeBuilderPar::new(self.data, self.start, &self.config).build_par()?;
        debug!(len = tree.len(), edges = stats.edges, visited = stats.visited, "built graph in parallel");
        self.verify(&tree);
        Ok(tree)
    }

    /// Streams the series through a [`StreamingHvg`], reporting edges and settled positions
    /// to `sink` as they are determined, and finalizes the stream.
    ///
    /// # Returns
    /// * A result that, if successful, hands back the sink. An error is returned, before
    ///   anything reaches the sink, if any value is NaN.
    ///
    /// # Examples
    /// ```
    ///use hvg::{BuildStats, Hvg};
    ///
    ///let data = vec![2.0, 2.0, 2.0, 2.0];
    ///let stats = Hvg::default_config(&data).stream(BuildStats::default()).unwrap();
    ///assert_eq!(3, stats.edges);
    ///assert_eq!(4, stats.settled);
    /// ```
    #[cfg(feature = "serial")]
    pub fn stream<S: EdgeSink<T>>(&self, sink: S) -> Result<S, HvgError> {
        DataValidator::new(self.data, self.start).validate_input_data()?;
        let mut stream = StreamingHvg::starting_at(self.start, sink);
        stream.extend(self.data.iter().copied())?;
        stream.finalize();
        let (tree, sink) = stream.into_parts();
        self.verify(&tree);
        Ok(sink)
    }

    /// The weight of an edge: its clearance, or the configured neighbour weight for edges
    /// between adjacent positions.
    pub fn weight(&self, edge: &Edge<T>) -> T {
        let neighbour_weight = T::from(self.config.neighbour_weight).unwrap_or_else(T::infinity);
        edge.weight(neighbour_weight)
    }

    fn verify(&self, tree: &MergeTree<T>) {
        if !self.config.verify_invariants {
            return;
        }
        if let Err(violation) = tree.check_invariants() {
            panic!("Built an invalid merge tree: {violation}");
        }
    }
}
