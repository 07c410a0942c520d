use crate::data_wrappers::Sample;
use crate::emitter::EdgeSink;
use crate::validation::DataValidator;
use crate::{HvgError, MergeTree};
use num_traits::Float;
use std::fmt::Debug;
use tracing::debug;

/// Online construction of a horizontal visibility graph from a stream of values.
///
/// Positions are assigned automatically. Every edge reaches the sink as soon as both of its
/// endpoints have arrived, and each position is reported settled once its view to the right
/// is closed. [`StreamingHvg::finalize`] ends the stream and settles the positions still open
/// at its end.
///
/// # Examples
/// ```
///use hvg::StreamingHvg;
///
///let mut stream = StreamingHvg::new(Vec::new());
///stream.extend([1.0, 5.0, 3.0, 7.0, 2.0]).unwrap();
///stream.finalize();
///let (_tree, edges) = stream.into_parts();
///assert_eq!(5, edges.len());
/// ```
#[derive(Debug)]
pub struct StreamingHvg<T, S> {
    tree: MergeTree<T>,
    next_position: Option<usize>,
    sink: S,
    finalized: bool,
}

impl<T: Float + Debug, S: EdgeSink<T>> StreamingHvg<T, S> {
    /// Starts a stream at position zero.
    pub fn new(sink: S) -> Self {
        Self::starting_at(0, sink)
    }

    /// Starts a stream whose first value sits at `position`.
    pub fn starting_at(position: usize, sink: S) -> Self {
        StreamingHvg { tree: MergeTree::new(), next_position: Some(position), sink, finalized: false }
    }

    /// Adds the next value of the stream.
    ///
    /// # Returns
    /// * The position given to the value
    pub fn push(&mut self, value: T) -> Result<usize, HvgError> {
        if self.finalized {
            return Err(HvgError::Finalized);
        }
        let position = self.next_position.ok_or(HvgError::PositionOverflow { last: usize::MAX })?;
        self.tree.append_with(Sample::new(position, value), &mut self.sink)?;
        self.next_position = position.checked_add(1);
        Ok(position)
    }

    /// Adds values one at a time, stopping at the first that is rejected.
    pub fn extend<I: IntoIterator<Item = T>>(&mut self, values: I) -> Result<(), HvgError> {
        for value in values {
            self.push(value)?;
        }
        Ok(())
    }

    /// Builds a separate tree for a batch of values and merges it onto the stream.
    /// The batch is validated up front, so a rejected batch leaves the stream unchanged.
    pub fn push_batch(&mut self, values: &[T]) -> Result<(), HvgError> {
        if self.finalized {
            return Err(HvgError::Finalized);
        }
        if values.is_empty() {
            return Ok(());
        }
        let start = self.next_position.ok_or(HvgError::PositionOverflow { last: usize::MAX })?;
        DataValidator::new(values, start).validate_input_data()?;
        let batch = MergeTree::from_values(start, values, &mut self.sink)?;
        let tree = std::mem::take(&mut self.tree);
        match tree.merge_with(batch, &mut self.sink) {
            Ok(merged) => self.tree = merged,
            Err(err) => {
                let kind = err.kind.clone();
                self.tree = err.into_parts().0;
                return Err(kind);
            }
        }
        self.next_position = self.tree.max_position().and_then(|last| last.checked_add(1));
        Ok(())
    }

    /// Ends the stream. Positions still open on the right spine of the tree see nothing past
    /// the end of the sequence and are reported settled. Calling this again reports nothing.
    pub fn finalize(&mut self) {
        if self.finalized {
            return;
        }
        self.finalized = true;
        let spine = self.tree.right_spine();
        let mut open = 0;
        for (i, &position) in spine.iter().enumerate() {
            // Nodes followed by an equal value were settled when it arrived
            let blocked = spine
                .get(i + 1)
                .is_some_and(|&next| self.tree.value(next) == self.tree.value(position));
            if !blocked {
                self.sink.settled(position);
                open += 1;
            }
        }
        debug!(len = self.tree.len(), open, "finalized stream");
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// The position the next value will be given, or `None` once `usize::MAX` is taken.
    pub fn next_position(&self) -> Option<usize> {
        self.next_position
    }

    pub fn tree(&self) -> &MergeTree<T> {
        &self.tree
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_parts(self) -> (MergeTree<T>, S) {
        (self.tree, self.sink)
    }
}
