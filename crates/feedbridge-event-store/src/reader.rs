//! Stream reader: rebuilds an ordered domain stream from feed pages.
//!
//! The store lists the newest page first and lists entries newest-first
//! within a page. Starting at the `last` page (the oldest) and following
//! `previous` links visits pages in ascending version order; sorting each
//! page's entries completes the ordering.

use feedbridge_core::error::DomainError;
use feedbridge_core::feed::{Feed, FeedClient, FeedError, LinkRelation};
use feedbridge_core::message::{DomainEventStream, DomainMessage};
use tracing::debug;

use crate::codec::MessageCodec;
use crate::ordering::sort_entries;

/// Reads one stream through a [`FeedClient`].
#[derive(Debug)]
pub struct StreamReader<'a, C: ?Sized> {
    client: &'a C,
    codec: &'a MessageCodec,
}

impl<'a, C: FeedClient + ?Sized> StreamReader<'a, C> {
    /// Creates a reader over `client`, decoding with `codec`.
    #[must_use]
    pub fn new(client: &'a C, codec: &'a MessageCodec) -> Self {
        Self { client, codec }
    }

    /// Loads every message of `stream_id` in ascending playhead order.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::StreamNotFound` if the store does not know the
    /// stream, `DomainError::CorruptEventData` for malformed locators,
    /// timestamps or non-increasing versions, `DomainError::UnknownPayloadType`
    /// for unregistered type tags, and `DomainError::Feed` for any other
    /// client failure.
    pub async fn load(&self, stream_id: &str) -> Result<DomainEventStream, DomainError> {
        let head = self
            .client
            .open_stream_feed(stream_id)
            .await
            .map_err(|err| match err {
                FeedError::StreamNotFound(_) => DomainError::StreamNotFound(stream_id.to_owned()),
                other => DomainError::Feed(other),
            })?;

        let mut messages: Vec<DomainMessage> = Vec::new();
        let mut page = Some(self.start_page(head).await?);
        let mut pages_read = 0_usize;

        while let Some(feed) = page {
            // Feeds link `previous` past the newest event for polling; an
            // empty page means there is nothing newer.
            if feed.entries().is_empty() {
                break;
            }

            let entries = sort_entries(feed.entries())?;
            debug!(stream_id, page = pages_read, entries = entries.len(), "reading feed page");

            for entry in &entries {
                let record = self.client.read_event(&entry.event_url).await?;
                let message = self.codec.decode(stream_id, record)?;
                if let Some(previous) = messages
                    .last()
                    .map(DomainMessage::playhead)
                    .filter(|&previous| message.playhead() <= previous)
                {
                    return Err(DomainError::CorruptEventData(format!(
                        "stream {stream_id} returned version {} after {previous}",
                        message.playhead()
                    )));
                }
                messages.push(message);
            }

            pages_read += 1;
            page = self
                .client
                .navigate_stream_feed(&feed, LinkRelation::Previous)
                .await?;
        }

        debug!(stream_id, pages = pages_read, messages = messages.len(), "loaded stream");
        Ok(DomainEventStream::new(messages))
    }

    /// Picks the oldest page to start from: `last` when the head links it,
    /// then `first`, then the head page itself.
    async fn start_page(&self, head: Feed) -> Result<Feed, DomainError> {
        for relation in [LinkRelation::Last, LinkRelation::First] {
            if !head.has_link(relation) {
                continue;
            }
            if let Some(feed) = self.client.navigate_stream_feed(&head, relation).await? {
                return Ok(feed);
            }
        }
        Ok(head)
    }
}
