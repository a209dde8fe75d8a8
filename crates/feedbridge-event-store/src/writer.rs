//! Stream writer: submits an ordered batch as one guarded append.

use feedbridge_core::error::DomainError;
use feedbridge_core::feed::{FeedClient, FeedError, WritableEvent};
use feedbridge_core::message::DomainEventStream;
use tracing::{debug, warn};

use crate::codec::MessageCodec;

/// Expected version for a batch whose first message sits at `first_playhead`:
/// the version of the event just before it. `None` for a negative playhead.
#[must_use]
pub fn expected_version(first_playhead: i64) -> Option<i64> {
    if first_playhead < 0 {
        return None;
    }
    first_playhead.checked_sub(1)
}

/// Appends batches to one feed client.
#[derive(Debug)]
pub struct StreamWriter<'a, C: ?Sized> {
    client: &'a C,
    codec: &'a MessageCodec,
}

impl<'a, C: FeedClient + ?Sized> StreamWriter<'a, C> {
    /// Creates a writer over `client`, encoding with `codec`.
    #[must_use]
    pub fn new(client: &'a C, codec: &'a MessageCodec) -> Self {
        Self { client, codec }
    }

    /// Appends `stream` to `stream_id` in a single write.
    ///
    /// The batch is trusted to be contiguous and ordered; only the first
    /// message's playhead is used. An empty batch makes no remote call.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPlayhead` if the first playhead is
    /// negative, `DomainError::OptimisticLockConflict` if the store's version no
    /// longer matches, `DomainError::Payload` if a payload fails to
    /// serialize (before anything is sent), and `DomainError::Feed` for any
    /// other client failure.
    pub async fn append(
        &self,
        stream_id: &str,
        stream: &DomainEventStream,
    ) -> Result<(), DomainError> {
        let Some(first) = stream.first() else {
            debug!(stream_id, "empty batch, nothing to append");
            return Ok(());
        };
        let Some(expected) = expected_version(first.playhead()) else {
            return Err(DomainError::InvalidPlayhead {
                stream_id: stream_id.to_owned(),
                playhead: first.playhead(),
            });
        };

        let events = stream
            .iter()
            .map(|message| self.codec.encode(message))
            .collect::<Result<Vec<WritableEvent>, _>>()?;

        debug!(stream_id, expected_version = expected, events = events.len(), "appending batch");

        self.client
            .write_to_stream(stream_id, &events, expected)
            .await
            .map_err(|err| match err {
                err @ FeedError::WrongExpectedVersion { .. } => {
                    warn!(stream_id, expected_version = expected, "optimistic lock conflict");
                    DomainError::OptimisticLockConflict {
                        stream_id: stream_id.to_owned(),
                        expected,
                        detail: err.to_string(),
                    }
                }
                other => DomainError::Feed(other),
            })
    }
}
