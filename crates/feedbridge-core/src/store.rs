//! Event store abstraction consumed by domain code.

use async_trait::async_trait;

use crate::error::DomainError;
use crate::message::DomainEventStream;

/// Loads and appends ordered domain event streams.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Load every message of a stream, ordered by playhead.
    ///
    /// Fails with `DomainError::StreamNotFound` if the stream was never
    /// written to.
    async fn load(&self, stream_id: &str) -> Result<DomainEventStream, DomainError>;

    /// Append a contiguous, ordered batch. The first message's playhead fixes
    /// the expected version; a stale one fails with
    /// `DomainError::OptimisticLockConflict`. An empty batch is a no-op.
    async fn append(&self, stream_id: &str, stream: &DomainEventStream)
    -> Result<(), DomainError>;
}
