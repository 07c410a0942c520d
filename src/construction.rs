#[cfg(feature = "parallel")]
pub(crate) mod parallel;
#[cfg(feature = "serial")]
pub(crate) mod serial;

/// The position of the first sample of the `n`th chunk.
pub(crate) fn chunk_start(start: usize, chunk_size: usize, n: usize) -> usize {
    start + n * chunk_size
}
