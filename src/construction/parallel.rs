#![cfg(feature = "parallel")]
use super::chunk_start;
use crate::emitter::BuildStats;
use crate::{HvgConfig, HvgError, MergeTree};
use num_traits::Float;
use rayon::prelude::*;
use std::fmt::Debug;

pub(crate) struct TreeBuilderPar<'a, T> {
    data: &'a [T],
    start: usize,
    chunk_size: usize,
}

impl<'a, T: Float + Debug + Send + Sync> TreeBuilderPar<'a, T> {
    pub(crate) fn new(data: &'a [T], start: usize, config: &HvgConfig) -> Self {
        Self { data, start, chunk_size: config.chunk_size }
    }

    /// Builds one tree per chunk on the rayon pool, then merges neighbouring trees pairwise.
    /// The merges of a round are independent of one another and run in parallel too.
    pub(crate) fn build_par(&self) -> Result<(MergeTree<T>, BuildStats), HvgError> {
        let mut round: Vec<(MergeTree<T>, BuildStats)> = self
            .data
            .par_chunks(self.chunk_size)
            .enumerate()
            .map(|(n, chunk)| {
                let mut stats = BuildStats::default();
                let start = chunk_start(self.start, self.chunk_size, n);
                MergeTree::from_values(start, chunk, &mut stats).map(|tree| (tree, stats))
            })
            .collect::<Result<Vec<_>, _>>()?;

        while round.len() > 1 {
            round = round
                .into_par_iter()
                .chunks(2)
                .map(|pair| -> Result<(MergeTree<T>, BuildStats), HvgError> {
                    let mut pair = pair.into_iter();
                    let (left, mut stats) = pair.next().unwrap_or_default();
                    match pair.next() {
                        Some((right, right_stats)) => {
                            stats += right_stats;
                            let merged = left.merge_with(right, &mut stats)?;
                            Ok((merged, stats))
                        }
                        None => Ok((left, stats)),
                    }
                })
                .collect::<Result<Vec<_>, HvgError>>()?;
        }
        Ok(round.pop().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::Discard;

    #[test]
    fn parallel_matches_serial() {
        let data: Vec<f64> = (0..1000).map(|i| ((i * 7919) % 101) as f64).collect();
        let config = HvgConfig::builder().chunk_size(37).build();
        let (tree, stats) = TreeBuilderPar::new(&data, 0, &config).build_par().unwrap();
        let serial = MergeTree::from_values(0, &data, &mut Discard).unwrap();
        assert_eq!(serial, tree);
        assert_eq!(tree.edges().count(), stats.edges);
    }
}
