use super::chunk_start;
use crate::emitter::EdgeSink;
use crate::{HvgConfig, HvgError, MergeTree};
use num_traits::Float;
use std::fmt::Debug;

pub(crate) struct TreeBuilder<'a, T> {
    data: &'a [T],
    start: usize,
    chunk_size: usize,
}

impl<'a, T: Float + Debug> TreeBuilder<'a, T> {
    pub(crate) fn new(data: &'a [T], start: usize, config: &HvgConfig) -> Self {
        Self { data, start, chunk_size: config.chunk_size }
    }

    /// Appends every sample to a single tree.
    pub(crate) fn build<S>(&self, sink: &mut S) -> Result<MergeTree<T>, HvgError>
    where
        S: EdgeSink<T> + ?Sized,
    {
        MergeTree::from_values(self.start, self.data, sink)
    }

    /// Builds one tree per chunk, then merges neighbouring trees pairwise until one is left.
    pub(crate) fn build_chunked<S>(&self, sink: &mut S) -> Result<MergeTree<T>, HvgError>
    where
        S: EdgeSink<T> + ?Sized,
    {
        let trees = self
            .data
            .chunks(self.chunk_size)
            .enumerate()
            .map(|(n, chunk)| {
                MergeTree::from_values(chunk_start(self.start, self.chunk_size, n), chunk, &mut *sink)
            })
            .collect::<Result<Vec<_>, _>>()?;
        reduce_pairwise(trees, sink)
    }
}

/// Merges a left-to-right run of adjacent trees in a binary reduction: each round merges
/// trees `2k` and `2k + 1`, so there are `log2(trees.len())` rounds.
pub(crate) fn reduce_pairwise<T, S>(mut trees: Vec<MergeTree<T>>, sink: &mut S) -> Result<MergeTree<T>, HvgError>
where
    T: Float + Debug,
    S: EdgeSink<T> + ?Sized,
{
    while trees.len() > 1 {
        let mut merged = Vec::with_capacity(trees.len().div_ceil(2));
        let mut trees_iter = trees.into_iter();
        while let Some(left) = trees_iter.next() {
            match trees_iter.next() {
                Some(right) => merged.push(left.merge_with(right, &mut *sink)?),
                None => merged.push(left),
            }
        }
        trees = merged;
    }
    Ok(trees.pop().unwrap_or_default())
}
