//! Domain messages and ordered streams of them.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::clock::Clock;
use crate::metadata::Metadata;
use crate::payload::Payload;

/// One recorded domain event, positioned within its stream.
///
/// Immutable once constructed.
#[derive(Debug, Clone)]
pub struct DomainMessage {
    stream_id: String,
    playhead: i64,
    metadata: Metadata,
    payload: Arc<dyn Payload>,
    recorded_on: DateTime<Utc>,
}

impl DomainMessage {
    /// Creates a message.
    #[must_use]
    pub fn new(
        stream_id: impl Into<String>,
        playhead: i64,
        metadata: Metadata,
        payload: Arc<dyn Payload>,
        recorded_on: DateTime<Utc>,
    ) -> Self {
        Self {
            stream_id: stream_id.into(),
            playhead,
            metadata,
            payload,
            recorded_on,
        }
    }

    /// Creates a message stamped with the clock's current time.
    #[must_use]
    pub fn record_now<P: Payload>(
        stream_id: impl Into<String>,
        playhead: i64,
        metadata: Metadata,
        payload: P,
        clock: &dyn Clock,
    ) -> Self {
        Self::new(stream_id, playhead, metadata, Arc::new(payload), clock.now())
    }

    /// The stream this message belongs to.
    #[must_use]
    pub fn stream_id(&self) -> &str {
        &self.stream_id
    }

    /// Zero-based position within the stream.
    #[must_use]
    pub fn playhead(&self) -> i64 {
        self.playhead
    }

    /// Metadata recorded alongside the payload.
    #[must_use]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// The event payload.
    #[must_use]
    pub fn payload(&self) -> &dyn Payload {
        self.payload.as_ref()
    }

    /// Type tag of the payload.
    #[must_use]
    pub fn payload_type(&self) -> &'static str {
        self.payload.payload_type()
    }

    /// Downcasts the payload to a concrete type.
    #[must_use]
    pub fn payload_as<T: Payload>(&self) -> Option<&T> {
        self.payload.as_any().downcast_ref::<T>()
    }

    /// When the message was recorded.
    #[must_use]
    pub fn recorded_on(&self) -> DateTime<Utc> {
        self.recorded_on
    }
}

/// An ordered sequence of domain messages.
#[derive(Debug, Clone, Default)]
pub struct DomainEventStream(Vec<DomainMessage>);

impl DomainEventStream {
    /// Wraps messages that are already in playhead order.
    #[must_use]
    pub fn new(messages: Vec<DomainMessage>) -> Self {
        Self(messages)
    }

    /// Iterates the messages in order.
    pub fn iter(&self) -> std::slice::Iter<'_, DomainMessage> {
        self.0.iter()
    }

    /// Number of messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the stream holds no messages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The first message, whose playhead fixes the append's expected version.
    #[must_use]
    pub fn first(&self) -> Option<&DomainMessage> {
        self.0.first()
    }

    /// Unwraps the messages.
    #[must_use]
    pub fn into_messages(self) -> Vec<DomainMessage> {
        self.0
    }
}

impl From<Vec<DomainMessage>> for DomainEventStream {
    fn from(messages: Vec<DomainMessage>) -> Self {
        Self(messages)
    }
}

impl FromIterator<DomainMessage> for DomainEventStream {
    fn from_iter<I: IntoIterator<Item = DomainMessage>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for DomainEventStream {
    type Item = DomainMessage;
    type IntoIter = std::vec::IntoIter<DomainMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a DomainEventStream {
    type Item = &'a DomainMessage;
    type IntoIter = std::slice::Iter<'a, DomainMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use serde::{Deserialize, Serialize};

    use super::{DomainEventStream, DomainMessage};
    use crate::clock::Clock;
    use crate::metadata::Metadata;
    use crate::payload::TypedPayload;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct AccountOpened {
        owner: String,
    }

    impl TypedPayload for AccountOpened {
        const PAYLOAD_TYPE: &'static str = "account.opened";
    }

    #[derive(Debug, Serialize, Deserialize)]
    struct AccountClosed {}

    impl TypedPayload for AccountClosed {
        const PAYLOAD_TYPE: &'static str = "account.closed";
    }

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    #[test]
    fn test_record_now_stamps_clock_time() {
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
        let clock = FixedClock(now);

        let message = DomainMessage::record_now(
            "account-1",
            0,
            Metadata::new(),
            AccountOpened {
                owner: "alice".into(),
            },
            &clock,
        );

        assert_eq!(message.recorded_on(), now);
        assert_eq!(message.stream_id(), "account-1");
        assert_eq!(message.playhead(), 0);
        assert_eq!(message.payload_type(), "account.opened");
    }

    #[test]
    fn test_payload_as_downcasts_only_to_the_stored_type() {
        let clock = FixedClock(Utc::now());
        let message = DomainMessage::record_now(
            "account-1",
            0,
            Metadata::new(),
            AccountOpened {
                owner: "bob".into(),
            },
            &clock,
        );

        assert_eq!(
            message.payload_as::<AccountOpened>().map(|p| p.owner.as_str()),
            Some("bob")
        );
        assert!(message.payload_as::<AccountClosed>().is_none());
    }

    #[test]
    fn test_stream_preserves_order() {
        let clock = FixedClock(Utc::now());
        let stream: DomainEventStream = (0..3)
            .map(|i| {
                DomainMessage::record_now(
                    "account-1",
                    i,
                    Metadata::new(),
                    AccountClosed {},
                    &clock,
                )
            })
            .collect();

        assert_eq!(stream.len(), 3);
        assert_eq!(stream.first().map(DomainMessage::playhead), Some(0));
        let playheads: Vec<i64> = stream.iter().map(DomainMessage::playhead).collect();
        assert_eq!(playheads, vec![0, 1, 2]);
    }
}
