//! Feed-backed implementation of the `EventStore` trait.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use feedbridge_core::error::DomainError;
use feedbridge_core::feed::FeedClient;
use feedbridge_core::message::DomainEventStream;
use feedbridge_core::payload::PayloadRegistry;
use feedbridge_core::store::EventStore;
use tracing::instrument;

use crate::codec::MessageCodec;
use crate::reader::StreamReader;
use crate::writer::StreamWriter;

/// Event store backed by a remote, paginated event feed.
pub struct FeedEventStore<C: ?Sized> {
    client: Arc<C>,
    codec: MessageCodec,
}

impl<C: FeedClient + ?Sized> FeedEventStore<C> {
    /// Creates a new `FeedEventStore` decoding payloads through `registry`.
    #[must_use]
    pub fn new(client: Arc<C>, registry: Arc<PayloadRegistry>) -> Self {
        Self {
            client,
            codec: MessageCodec::new(registry),
        }
    }
}

impl<C: ?Sized> fmt::Debug for FeedEventStore<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeedEventStore")
            .field("codec", &self.codec)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<C: FeedClient + ?Sized> EventStore for FeedEventStore<C> {
    #[instrument(skip_all, fields(stream_id = %stream_id))]
    async fn load(&self, stream_id: &str) -> Result<DomainEventStream, DomainError> {
        StreamReader::new(self.client.as_ref(), &self.codec)
            .load(stream_id)
            .await
    }

    #[instrument(skip_all, fields(stream_id = %stream_id, messages = stream.len()))]
    async fn append(
        &self,
        stream_id: &str,
        stream: &DomainEventStream,
    ) -> Result<(), DomainError> {
        StreamWriter::new(self.client.as_ref(), &self.codec)
            .append(stream_id, stream)
            .await
    }
}
