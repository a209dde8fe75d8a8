//! Domain error types.

use thiserror::Error;

use crate::feed::FeedError;
use crate::payload::PayloadError;

/// Top-level error surfaced by an [`EventStore`](crate::store::EventStore).
///
/// `OptimisticLockConflict` is the only retryable kind: the caller may re-read
/// the stream and try again. Everything else needs external correction.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The stream has never been written to.
    #[error("event stream not found: {0}")]
    StreamNotFound(String),

    /// A stored event violates the persisted layout (bad version suffix,
    /// unparseable timestamp, out-of-order pagination).
    #[error("corrupt event data: {0}")]
    CorruptEventData(String),

    /// No deserializer is registered for a stored type tag.
    #[error("unknown payload type: {0}")]
    UnknownPayloadType(String),

    /// The store rejected an append because its current version differs from
    /// the expected version derived from the batch.
    #[error("optimistic lock conflict on stream {stream_id} (expected version {expected}): {detail}")]
    OptimisticLockConflict {
        /// The stream that had the conflict.
        stream_id: String,
        /// The expected version that was submitted.
        expected: i64,
        /// Detail reported by the store.
        detail: String,
    },

    /// An append batch starts at a negative playhead.
    #[error("invalid playhead {playhead} for stream {stream_id}: playheads start at 0")]
    InvalidPlayhead {
        /// The stream the batch was meant for.
        stream_id: String,
        /// The offending first playhead.
        playhead: i64,
    },

    /// A payload failed to serialize or deserialize.
    #[error(transparent)]
    Payload(#[from] PayloadError),

    /// Any other feed client failure, passed through untouched.
    #[error(transparent)]
    Feed(#[from] FeedError),
}

impl DomainError {
    /// Returns `true` if the caller may recover by re-reading the stream and
    /// retrying the append.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::OptimisticLockConflict { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::DomainError;
    use crate::feed::FeedError;

    #[test]
    fn test_only_lock_conflict_is_retryable() {
        let conflict = DomainError::OptimisticLockConflict {
            stream_id: "order-1".into(),
            expected: 3,
            detail: "actual version 4".into(),
        };

        assert!(conflict.is_retryable());
        assert!(!DomainError::StreamNotFound("order-1".into()).is_retryable());
        assert!(!DomainError::CorruptEventData("bad".into()).is_retryable());
        assert!(
            !DomainError::InvalidPlayhead {
                stream_id: "order-1".into(),
                playhead: -1,
            }
            .is_retryable()
        );
        assert!(!DomainError::from(FeedError::Transport("reset".into())).is_retryable());
    }

    #[test]
    fn test_feed_errors_pass_through_with_original_message() {
        let err = DomainError::from(FeedError::Transport("connection refused".into()));

        assert_eq!(err.to_string(), "feed transport error: connection refused");
    }
}
