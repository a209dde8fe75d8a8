//! Event payloads and the registry that rebuilds them from stored data.
//!
//! Stored events only carry a type tag and a flat field mapping. Turning that
//! back into a typed payload needs a decoder looked up by tag; the
//! [`PayloadRegistry`] holds those decoders. It is built once at start-up and
//! injected wherever decoding happens.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::error::DomainError;

/// Flat, string-keyed field mapping as stored by the remote event store.
pub type Fields = Map<String, Value>;

/// Failures while converting a payload to or from its field mapping.
#[derive(Debug, Error)]
pub enum PayloadError {
    /// The payload serialized to something other than a JSON object.
    #[error("payload {payload_type} did not serialize to an object")]
    NotAnObject {
        /// Type tag of the offending payload.
        payload_type: String,
    },

    /// Serialization failed.
    #[error("failed to serialize payload {payload_type}: {source}")]
    Serialize {
        /// Type tag of the payload.
        payload_type: String,
        /// Underlying serde error.
        #[source]
        source: serde_json::Error,
    },

    /// Deserialization failed.
    #[error("failed to deserialize payload {payload_type}: {source}")]
    Deserialize {
        /// Type tag of the payload.
        payload_type: String,
        /// Underlying serde error.
        #[source]
        source: serde_json::Error,
    },
}

/// A self-describing domain event payload.
pub trait Payload: fmt::Debug + Send + Sync + 'static {
    /// Type tag the payload is stored under.
    fn payload_type(&self) -> &'static str;

    /// Serializes the payload to a flat field mapping.
    ///
    /// # Errors
    ///
    /// Returns `PayloadError` if the payload cannot be represented as an
    /// object.
    fn serialize(&self) -> Result<Fields, PayloadError>;

    /// Upcast for typed access through [`DomainMessage::payload_as`].
    ///
    /// [`DomainMessage::payload_as`]: crate::message::DomainMessage::payload_as
    fn as_any(&self) -> &dyn Any;
}

/// A serde-backed payload with a fixed type tag.
///
/// Implementing this is enough to get [`Payload`] and to be registered with
/// [`PayloadRegistry::register`].
pub trait TypedPayload: Serialize + DeserializeOwned + fmt::Debug + Send + Sync + 'static {
    /// Type tag the payload is stored under.
    const PAYLOAD_TYPE: &'static str;
}

impl<T: TypedPayload> Payload for T {
    fn payload_type(&self) -> &'static str {
        T::PAYLOAD_TYPE
    }

    fn serialize(&self) -> Result<Fields, PayloadError> {
        let value = serde_json::to_value(self).map_err(|source| PayloadError::Serialize {
            payload_type: T::PAYLOAD_TYPE.to_owned(),
            source,
        })?;
        match value {
            Value::Object(fields) => Ok(fields),
            _ => Err(PayloadError::NotAnObject {
                payload_type: T::PAYLOAD_TYPE.to_owned(),
            }),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

type Decoder = Arc<dyn Fn(Fields) -> Result<Arc<dyn Payload>, PayloadError> + Send + Sync>;

/// Maps stored type tags to payload decoders.
#[derive(Default, Clone)]
pub struct PayloadRegistry {
    decoders: HashMap<String, Decoder>,
}

impl PayloadRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `T` under its `PAYLOAD_TYPE`.
    #[must_use]
    pub fn register<T: TypedPayload>(self) -> Self {
        self.register_with(T::PAYLOAD_TYPE, |data| {
            serde_json::from_value::<T>(Value::Object(data))
                .map(|payload| Arc::new(payload) as Arc<dyn Payload>)
                .map_err(|source| PayloadError::Deserialize {
                    payload_type: T::PAYLOAD_TYPE.to_owned(),
                    source,
                })
        })
    }

    /// Registers a hand-written decoder for `payload_type`. A later
    /// registration for the same tag replaces the earlier one.
    #[must_use]
    pub fn register_with<F>(mut self, payload_type: impl Into<String>, decoder: F) -> Self
    where
        F: Fn(Fields) -> Result<Arc<dyn Payload>, PayloadError> + Send + Sync + 'static,
    {
        self.decoders.insert(payload_type.into(), Arc::new(decoder));
        self
    }

    /// Returns `true` if a decoder exists for `payload_type`.
    #[must_use]
    pub fn contains(&self, payload_type: &str) -> bool {
        self.decoders.contains_key(payload_type)
    }

    /// Rebuilds a payload from its stored field mapping.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::UnknownPayloadType` if no decoder is registered
    /// for `payload_type`, or `DomainError::Payload` if the decoder rejects
    /// the data.
    pub fn deserialize(
        &self,
        payload_type: &str,
        data: Fields,
    ) -> Result<Arc<dyn Payload>, DomainError> {
        let decoder = self
            .decoders
            .get(payload_type)
            .ok_or_else(|| DomainError::UnknownPayloadType(payload_type.to_owned()))?;
        Ok(decoder(data)?)
    }
}

impl fmt::Debug for PayloadRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<&String> = self.decoders.keys().collect();
        tags.sort();
        f.debug_struct("PayloadRegistry")
            .field("payload_types", &tags)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    use super::{Fields, Payload, PayloadError, PayloadRegistry, TypedPayload};
    use crate::error::DomainError;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct ItemAdded {
        sku: String,
        quantity: u32,
    }

    impl TypedPayload for ItemAdded {
        const PAYLOAD_TYPE: &'static str = "cart.item_added";
    }

    #[derive(Debug, Serialize, Deserialize)]
    struct Bare(u32);

    impl TypedPayload for Bare {
        const PAYLOAD_TYPE: &'static str = "bare";
    }

    fn fields(value: serde_json::Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_typed_payload_serializes_to_fields() {
        let payload = ItemAdded {
            sku: "A-1".into(),
            quantity: 2,
        };

        let data = Payload::serialize(&payload).unwrap();

        assert_eq!(data, fields(json!({"sku": "A-1", "quantity": 2})));
        assert_eq!(payload.payload_type(), "cart.item_added");
    }

    #[test]
    fn test_non_object_payload_is_rejected() {
        let result = Payload::serialize(&Bare(3));

        match result {
            Err(PayloadError::NotAnObject { payload_type }) => assert_eq!(payload_type, "bare"),
            other => panic!("expected NotAnObject, got {other:?}"),
        }
    }

    #[test]
    fn test_registry_decodes_registered_type() {
        let registry = PayloadRegistry::new().register::<ItemAdded>();

        let payload = registry
            .deserialize("cart.item_added", fields(json!({"sku": "B-2", "quantity": 5})))
            .unwrap();

        let item = payload.as_any().downcast_ref::<ItemAdded>().unwrap();
        assert_eq!(item.sku, "B-2");
        assert_eq!(item.quantity, 5);
    }

    #[test]
    fn test_registry_rejects_unknown_type() {
        let registry = PayloadRegistry::new().register::<ItemAdded>();

        let result = registry.deserialize("cart.item_removed", Fields::new());

        match result {
            Err(DomainError::UnknownPayloadType(tag)) => assert_eq!(tag, "cart.item_removed"),
            other => panic!("expected UnknownPayloadType, got {other:?}"),
        }
    }

    #[test]
    fn test_registry_surfaces_decoder_failure() {
        let registry = PayloadRegistry::new().register::<ItemAdded>();

        let result = registry.deserialize("cart.item_added", fields(json!({"sku": 7})));

        assert!(matches!(
            result,
            Err(DomainError::Payload(PayloadError::Deserialize { .. }))
        ));
    }

    #[test]
    fn test_debug_lists_registered_types() {
        let registry = PayloadRegistry::new()
            .register::<ItemAdded>()
            .register::<Bare>();

        assert!(registry.contains("bare"));
        assert_eq!(
            format!("{registry:?}"),
            r#"PayloadRegistry { payload_types: ["bare", "cart.item_added"] }"#
        );
    }
}
