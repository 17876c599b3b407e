//! Supporting types for ordered collections.

use serde::{Deserialize, Serialize};

/// Which range of indices an operation accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundsPolicy {
    /// `[0, len - 1]`: the index must address an existing element.
    Read,
    /// `[0, len]`: the index may also be one past the end.
    Insert,
}

impl BoundsPolicy {
    /// Check `idx` against a collection of length `len`.
    pub fn accepts(self, idx: usize, len: usize) -> bool {
        match self {
            BoundsPolicy::Read => idx < len,
            BoundsPolicy::Insert => idx <= len,
        }
    }
}

/// Result of walking a collection with `each`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EachOutcome<E> {
    /// True only if every item was visited.
    pub completed: bool,
    /// The callback error that stopped the walk, if any.
    pub error: Option<E>,
    /// Number of items the callback was invoked on.
    pub visited: usize,
}

impl<E> EachOutcome<E> {
    pub(crate) fn completed(visited: usize) -> Self {
        Self {
            completed: true,
            error: None,
            visited,
        }
    }

    pub(crate) fn aborted(error: E, visited: usize) -> Self {
        Self {
            completed: false,
            error: Some(error),
            visited,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Convert into a plain `Result`, surfacing the swallowed error.
    pub fn into_result(self) -> std::result::Result<usize, E> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.visited),
        }
    }
}
