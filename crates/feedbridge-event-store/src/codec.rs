//! Conversion between domain messages and the store's event shape.
//!
//! The remote store has no timestamp attribute on its event records, so the
//! message's recorded-on time travels inside the data mapping under
//! [`RECORDED_ON_KEY`]. It is written last on encode and stripped before the
//! payload decoder ever sees the data.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use feedbridge_core::error::DomainError;
use feedbridge_core::feed::{EventRecord, WritableEvent};
use feedbridge_core::message::DomainMessage;
use feedbridge_core::metadata::Metadata;
use feedbridge_core::payload::{Fields, PayloadRegistry};
use serde_json::Value;

/// Reserved data key carrying the recorded-on timestamp.
pub const RECORDED_ON_KEY: &str = "broadway_recorded_on";

/// Renders a recorded-on time the way it is persisted, e.g.
/// `2014-03-12T14:17:19.176169+00:00`.
#[must_use]
pub fn format_recorded_on(recorded_on: DateTime<Utc>) -> String {
    recorded_on.to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// Removes the reserved recorded-on key from `data` and parses it.
///
/// # Errors
///
/// Returns `DomainError::CorruptEventData` if the key is missing, not a
/// string, or not an RFC 3339 timestamp.
pub fn take_recorded_on(data: &mut Fields) -> Result<DateTime<Utc>, DomainError> {
    let raw = data.remove(RECORDED_ON_KEY).ok_or_else(|| {
        DomainError::CorruptEventData(format!("event data is missing {RECORDED_ON_KEY}"))
    })?;
    let Value::String(raw) = raw else {
        return Err(DomainError::CorruptEventData(format!(
            "{RECORDED_ON_KEY} is not a string: {raw}"
        )));
    };
    DateTime::parse_from_rfc3339(&raw)
        .map(|recorded_on| recorded_on.with_timezone(&Utc))
        .map_err(|err| {
            DomainError::CorruptEventData(format!("unparseable {RECORDED_ON_KEY} {raw:?}: {err}"))
        })
}

/// Encodes and decodes domain messages using an injected payload registry.
#[derive(Debug, Clone)]
pub struct MessageCodec {
    registry: Arc<PayloadRegistry>,
}

impl MessageCodec {
    /// Creates a codec decoding payloads through `registry`.
    #[must_use]
    pub fn new(registry: Arc<PayloadRegistry>) -> Self {
        Self { registry }
    }

    /// Converts a message into the store's writable shape.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Payload` if the payload cannot be serialized.
    pub fn encode(&self, message: &DomainMessage) -> Result<WritableEvent, DomainError> {
        let mut data = message.payload().serialize()?;
        data.insert(
            RECORDED_ON_KEY.to_owned(),
            Value::String(format_recorded_on(message.recorded_on())),
        );
        Ok(WritableEvent::new(
            message.payload_type(),
            data,
            message.metadata().serialize(),
        ))
    }

    /// Rebuilds a message of `stream_id` from a stored event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::CorruptEventData` for a negative version or a
    /// bad recorded-on field, `DomainError::UnknownPayloadType` if the type
    /// tag is not registered, and `DomainError::Payload` if the registered
    /// decoder rejects the data.
    pub fn decode(&self, stream_id: &str, record: EventRecord) -> Result<DomainMessage, DomainError> {
        let EventRecord {
            event_type,
            mut data,
            metadata,
            version,
        } = record;

        if version < 0 {
            return Err(DomainError::CorruptEventData(format!(
                "event {event_type} in stream {stream_id} has negative version {version}"
            )));
        }

        let recorded_on = take_recorded_on(&mut data)?;
        let payload = self.registry.deserialize(&event_type, data)?;

        Ok(DomainMessage::new(
            stream_id,
            version,
            Metadata::deserialize(metadata.unwrap_or_default()),
            payload,
            recorded_on,
        ))
    }
}
