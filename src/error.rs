//! Error types for the collection and the event bus.

use crate::ids::SubscriptionId;
use thiserror::Error;

/// Errors raised by [`OrderedCollection`](crate::OrderedCollection) operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollectionError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Indices above `isize::MAX` are reported as `isize::MAX`.
    #[error("Index [{index}] is out of bounds (len {len})")]
    IndexOutOfBounds { index: isize, len: usize },

    #[error("End of sequence")]
    EndOfSequence,
}

impl CollectionError {
    pub(crate) fn out_of_bounds(index: usize, len: usize) -> Self {
        CollectionError::IndexOutOfBounds {
            // Saturates; no Vec can hold more than isize::MAX elements.
            index: isize::try_from(index).unwrap_or(isize::MAX),
            len,
        }
    }
}

/// Boxed error returned by a failing subscriber.
pub type SubscriberError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised by [`EventBus`](crate::EventBus) dispatch.
#[derive(Debug, Error)]
pub enum BusError {
    #[error("Subscriber {id} on topic '{topic}' failed: {source}")]
    Subscriber {
        topic: String,
        id: SubscriptionId,
        #[source]
        source: SubscriberError,
    },
}

/// Result type for collection operations.
pub type CollectionResult<T> = std::result::Result<T, CollectionError>;

/// Result type for bus operations.
pub type BusResult<T> = std::result::Result<T, BusError>;
