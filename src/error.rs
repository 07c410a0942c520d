use crate::MergeTree;
use std::fmt::Debug;
use thiserror::Error;

/// Possible errors that arise from feeding samples or trees to the graph builders.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HvgError {
    #[error("Sample positions out of order: expected position {expected}, found {found}")]
    OrderViolation { expected: usize, found: usize },
    #[error("Sample at position {position} is NaN and cannot be ordered")]
    NanValue { position: usize },
    #[error("The stream has been finalized and accepts no more samples")]
    Finalized,
    #[error("No sample position follows {last}")]
    PositionOverflow { last: usize },
}

/// A failed merge. Both input trees are handed back unchanged.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct MergeError<T: Debug> {
    pub kind: HvgError,
    left: MergeTree<T>,
    right: MergeTree<T>,
}

impl<T: Debug> MergeError<T> {
    pub(crate) fn new(kind: HvgError, left: MergeTree<T>, right: MergeTree<T>) -> Self {
        MergeError { kind, left, right }
    }

    /// Recovers the `(left, right)` operands of the failed merge.
    pub fn into_parts(self) -> (MergeTree<T>, MergeTree<T>) {
        (self.left, self.right)
    }
}

impl<T: Debug> From<MergeError<T>> for HvgError {
    fn from(err: MergeError<T>) -> Self {
        err.kind
    }
}

/// A broken structural invariant inside a merge tree. Only produced by a defect in the
/// append or merge logic, never by bad input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Merge tree invariant violated: {0}")]
pub struct InvariantViolation(pub String);
