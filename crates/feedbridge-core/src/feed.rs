//! The paginated feed boundary.
//!
//! A remote event store exposes each stream as a chain of feed pages. Each
//! page lists entries pointing at individual event resources and carries
//! named links to its neighbours. The [`FeedClient`] trait is the only way the
//! event store talks to that remote side; transport, authentication and URL
//! layout all live behind it.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::payload::Fields;

/// Expected version meaning "the stream must not exist yet".
pub const EXPECTED_NO_STREAM: i64 = -1;

/// Navigation relation between feed pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkRelation {
    /// The head page, holding the newest entries.
    First,
    /// The page holding the oldest entries.
    Last,
    /// The next page towards older entries.
    Next,
    /// The next page towards newer entries.
    Previous,
    /// The page itself (`self`).
    #[serde(rename = "self")]
    Current,
}

impl LinkRelation {
    /// Returns the relation name as it appears on the wire.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Last => "last",
            Self::Next => "next",
            Self::Previous => "previous",
            Self::Current => "self",
        }
    }
}

impl fmt::Display for LinkRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One feed entry: a locator for a single stored event.
///
/// The trailing `/`-delimited segment of `event_url` is the event's version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Locator of the event resource.
    pub event_url: String,
}

impl Entry {
    /// Creates an entry pointing at `event_url`.
    #[must_use]
    pub fn new(event_url: impl Into<String>) -> Self {
        Self {
            event_url: event_url.into(),
        }
    }
}

/// A fetched feed page. Immutable once fetched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Feed {
    entries: Vec<Entry>,
    links: BTreeMap<LinkRelation, String>,
}

impl Feed {
    /// Creates a page with the given entries and no links.
    #[must_use]
    pub fn new(entries: Vec<Entry>) -> Self {
        Self {
            entries,
            links: BTreeMap::new(),
        }
    }

    /// Adds a link to the page.
    #[must_use]
    pub fn with_link(mut self, relation: LinkRelation, url: impl Into<String>) -> Self {
        self.links.insert(relation, url.into());
        self
    }

    /// Entries in the order the store listed them.
    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Returns the URL behind `relation`, if the page exposes it.
    #[must_use]
    pub fn link(&self, relation: LinkRelation) -> Option<&str> {
        self.links.get(&relation).map(String::as_str)
    }

    /// Returns `true` if the page exposes `relation`.
    #[must_use]
    pub fn has_link(&self, relation: LinkRelation) -> bool {
        self.links.contains_key(&relation)
    }
}

/// An event as returned by the store when an entry is resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    /// Type tag the event was written with.
    pub event_type: String,
    /// Raw data mapping, including the reserved recorded-on key.
    pub data: Fields,
    /// Raw metadata mapping, absent when the event was written without one.
    pub metadata: Option<Fields>,
    /// Zero-based version of the event within its stream.
    pub version: i64,
}

/// An event in the store's writable shape. Exists only for one append call.
#[derive(Debug, Clone, PartialEq)]
pub struct WritableEvent {
    /// Unique identifier the store uses to de-duplicate writes.
    pub event_id: Uuid,
    /// Type tag identifying the payload type.
    pub event_type: String,
    /// Payload fields plus the reserved recorded-on key.
    pub data: Fields,
    /// Serialized message metadata.
    pub metadata: Fields,
}

impl WritableEvent {
    /// Creates a writable event with a fresh identifier.
    #[must_use]
    pub fn new(event_type: impl Into<String>, data: Fields, metadata: Fields) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            event_type: event_type.into(),
            data,
            metadata,
        }
    }
}

/// Failures reported by a [`FeedClient`].
#[derive(Debug, Error)]
pub enum FeedError {
    /// The stream does not exist.
    #[error("stream not found: {0}")]
    StreamNotFound(String),

    /// The stream's current version differs from the expected version.
    #[error("wrong expected version on stream {stream_id}: expected {expected}, actual {actual}")]
    WrongExpectedVersion {
        /// The stream that was written to.
        stream_id: String,
        /// The expected version supplied with the write.
        expected: i64,
        /// The stream's actual current version.
        actual: i64,
    },

    /// An entry pointed at an event resource that could not be found.
    #[error("event not found: {0}")]
    EventNotFound(String),

    /// Transport, authentication, or any other remote failure.
    #[error("feed transport error: {0}")]
    Transport(String),
}

/// Client for a remote, paginated event store.
#[async_trait]
pub trait FeedClient: Send + Sync {
    /// Fetches the head page of a stream.
    async fn open_stream_feed(&self, stream_id: &str) -> Result<Feed, FeedError>;

    /// Follows `relation` from `feed`. Returns `None` if the page has no such
    /// link.
    async fn navigate_stream_feed(
        &self,
        feed: &Feed,
        relation: LinkRelation,
    ) -> Result<Option<Feed>, FeedError>;

    /// Resolves an entry locator to its stored event.
    async fn read_event(&self, event_url: &str) -> Result<EventRecord, FeedError>;

    /// Appends a batch atomically, guarded by `expected_version`.
    async fn write_to_stream(
        &self,
        stream_id: &str,
        events: &[WritableEvent],
        expected_version: i64,
    ) -> Result<(), FeedError>;
}
