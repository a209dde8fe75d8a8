//! Test feed clients — `FeedClient` implementations for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use feedbridge_core::feed::{
    EXPECTED_NO_STREAM, Entry, EventRecord, Feed, FeedClient, FeedError, LinkRelation,
    WritableEvent,
};

/// Page size used by [`InMemoryFeedClient::new`].
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// One recorded `write_to_stream` call.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteCall {
    /// Target stream.
    pub stream_id: String,
    /// Expected version supplied with the write.
    pub expected_version: i64,
    /// The submitted batch.
    pub events: Vec<WritableEvent>,
}

/// An in-memory event store that paginates streams the way HTTP event feeds
/// do.
///
/// The head page holds the newest events and every page lists its entries
/// newest-first. `first` points at the head page, `last` at the oldest page
/// (only when there is more than one), `next` towards older pages and
/// `previous` towards newer ones. The head page also links `previous` to an
/// empty page past the newest event, as a polling feed would.
///
/// Appends are atomic and version-checked. Every write attempt is recorded.
#[derive(Debug)]
pub struct InMemoryFeedClient {
    base_url: String,
    page_size: usize,
    streams: Mutex<HashMap<String, Vec<EventRecord>>>,
    writes: Mutex<Vec<WriteCall>>,
}

impl Default for InMemoryFeedClient {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryFeedClient {
    /// Creates an empty store with [`DEFAULT_PAGE_SIZE`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    /// Creates an empty store splitting streams into pages of `page_size`.
    ///
    /// # Panics
    ///
    /// Panics if `page_size` is zero.
    #[must_use]
    pub fn with_page_size(page_size: usize) -> Self {
        assert!(page_size > 0, "page size must be positive");
        Self {
            base_url: "memory://feed".to_owned(),
            page_size,
            streams: Mutex::new(HashMap::new()),
            writes: Mutex::new(Vec::new()),
        }
    }

    /// Returns a snapshot of every `write_to_stream` call, including rejected
    /// ones.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn write_calls(&self) -> Vec<WriteCall> {
        self.writes.lock().unwrap().clone()
    }

    /// Returns the records stored for `stream_id`, oldest first.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn stored_events(&self, stream_id: &str) -> Vec<EventRecord> {
        self.streams
            .lock()
            .unwrap()
            .get(stream_id)
            .cloned()
            .unwrap_or_default()
    }

    fn event_url(&self, stream_id: &str, version: usize) -> String {
        format!("{}/streams/{stream_id}/{version}", self.base_url)
    }

    fn page_url(&self, stream_id: &str, index: usize) -> String {
        format!("{}/streams/{stream_id}/page/{index}", self.base_url)
    }

    fn page_count(&self, len: usize) -> usize {
        len.div_ceil(self.page_size).max(1)
    }

    fn page(&self, stream_id: &str, index: usize, len: usize) -> Feed {
        let pages = self.page_count(len);
        let start = (index * self.page_size).min(len);
        let end = ((index + 1) * self.page_size).min(len);
        let entries = (start..end)
            .rev()
            .map(|version| Entry::new(self.event_url(stream_id, version)))
            .collect();

        let mut feed = Feed::new(entries)
            .with_link(LinkRelation::Current, self.page_url(stream_id, index))
            .with_link(LinkRelation::First, self.page_url(stream_id, pages - 1));
        if pages > 1 {
            feed = feed.with_link(LinkRelation::Last, self.page_url(stream_id, 0));
        }
        if index > 0 {
            feed = feed.with_link(LinkRelation::Next, self.page_url(stream_id, index - 1));
        }
        if index < pages {
            feed = feed.with_link(LinkRelation::Previous, self.page_url(stream_id, index + 1));
        }
        feed
    }

    fn parse_page_url<'u>(&self, url: &'u str) -> Option<(&'u str, usize)> {
        let rest = url.strip_prefix(self.base_url.as_str())?.strip_prefix("/streams/")?;
        let (stream_id, index) = rest.rsplit_once("/page/")?;
        Some((stream_id, index.parse().ok()?))
    }

    fn parse_event_url<'u>(&self, url: &'u str) -> Option<(&'u str, usize)> {
        let rest = url.strip_prefix(self.base_url.as_str())?.strip_prefix("/streams/")?;
        let (stream_id, version) = rest.rsplit_once('/')?;
        Some((stream_id, version.parse().ok()?))
    }
}

#[allow(clippy::cast_possible_wrap)]
fn last_version(len: usize) -> i64 {
    len as i64 - 1
}

#[async_trait]
impl FeedClient for InMemoryFeedClient {
    async fn open_stream_feed(&self, stream_id: &str) -> Result<Feed, FeedError> {
        let streams = self.streams.lock().unwrap();
        let len = streams
            .get(stream_id)
            .map(Vec::len)
            .ok_or_else(|| FeedError::StreamNotFound(stream_id.to_owned()))?;
        Ok(self.page(stream_id, self.page_count(len) - 1, len))
    }

    async fn navigate_stream_feed(
        &self,
        feed: &Feed,
        relation: LinkRelation,
    ) -> Result<Option<Feed>, FeedError> {
        let Some(url) = feed.link(relation) else {
            return Ok(None);
        };
        let (stream_id, index) = self
            .parse_page_url(url)
            .ok_or_else(|| FeedError::Transport(format!("unroutable page url {url}")))?;
        let streams = self.streams.lock().unwrap();
        let len = streams
            .get(stream_id)
            .map(Vec::len)
            .ok_or_else(|| FeedError::StreamNotFound(stream_id.to_owned()))?;
        Ok(Some(self.page(stream_id, index, len)))
    }

    async fn read_event(&self, event_url: &str) -> Result<EventRecord, FeedError> {
        let (stream_id, version) = self
            .parse_event_url(event_url)
            .ok_or_else(|| FeedError::EventNotFound(event_url.to_owned()))?;
        self.streams
            .lock()
            .unwrap()
            .get(stream_id)
            .and_then(|records| records.get(version))
            .cloned()
            .ok_or_else(|| FeedError::EventNotFound(event_url.to_owned()))
    }

    async fn write_to_stream(
        &self,
        stream_id: &str,
        events: &[WritableEvent],
        expected_version: i64,
    ) -> Result<(), FeedError> {
        self.writes.lock().unwrap().push(WriteCall {
            stream_id: stream_id.to_owned(),
            expected_version,
            events: events.to_vec(),
        });

        let mut streams = self.streams.lock().unwrap();
        let actual = streams
            .get(stream_id)
            .map_or(EXPECTED_NO_STREAM, |records| last_version(records.len()));
        if actual != expected_version {
            return Err(FeedError::WrongExpectedVersion {
                stream_id: stream_id.to_owned(),
                expected: expected_version,
                actual,
            });
        }

        let records = streams.entry(stream_id.to_owned()).or_default();
        let base = records.len();
        records.extend(events.iter().enumerate().map(|(offset, event)| EventRecord {
            event_type: event.event_type.clone(),
            data: event.data.clone(),
            metadata: Some(event.metadata.clone()),
            version: last_version(base + offset + 1),
        }));
        Ok(())
    }
}

/// A feed client serving hand-built pages and records.
///
/// Pages are looked up by the URL a link points at, so arbitrary (including
/// inconsistent) pagination can be modelled. Reads and writes are recorded in
/// call order; writes always succeed.
#[derive(Debug, Default)]
pub struct StaticFeedClient {
    head: Option<Feed>,
    pages: HashMap<String, Feed>,
    events: HashMap<String, EventRecord>,
    reads: Mutex<Vec<String>>,
    writes: Mutex<Vec<WriteCall>>,
}

impl StaticFeedClient {
    /// A client whose `open_stream_feed` returns `head` for any stream.
    #[must_use]
    pub fn new(head: Feed) -> Self {
        Self {
            head: Some(head),
            ..Self::default()
        }
    }

    /// A client that knows no streams.
    #[must_use]
    pub fn missing() -> Self {
        Self::default()
    }

    /// Serves `feed` when a link points at `url`.
    #[must_use]
    pub fn with_page(mut self, url: impl Into<String>, feed: Feed) -> Self {
        self.pages.insert(url.into(), feed);
        self
    }

    /// Serves `record` for the entry locator `url`.
    #[must_use]
    pub fn with_event(mut self, url: impl Into<String>, record: EventRecord) -> Self {
        self.events.insert(url.into(), record);
        self
    }

    /// Event locators read so far, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn read_urls(&self) -> Vec<String> {
        self.reads.lock().unwrap().clone()
    }

    /// Returns a snapshot of every `write_to_stream` call.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn write_calls(&self) -> Vec<WriteCall> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl FeedClient for StaticFeedClient {
    async fn open_stream_feed(&self, stream_id: &str) -> Result<Feed, FeedError> {
        self.head
            .clone()
            .ok_or_else(|| FeedError::StreamNotFound(stream_id.to_owned()))
    }

    async fn navigate_stream_feed(
        &self,
        feed: &Feed,
        relation: LinkRelation,
    ) -> Result<Option<Feed>, FeedError> {
        let Some(url) = feed.link(relation) else {
            return Ok(None);
        };
        self.pages
            .get(url)
            .cloned()
            .map(Some)
            .ok_or_else(|| FeedError::Transport(format!("no page at {url}")))
    }

    async fn read_event(&self, event_url: &str) -> Result<EventRecord, FeedError> {
        self.reads.lock().unwrap().push(event_url.to_owned());
        self.events
            .get(event_url)
            .cloned()
            .ok_or_else(|| FeedError::EventNotFound(event_url.to_owned()))
    }

    async fn write_to_stream(
        &self,
        stream_id: &str,
        events: &[WritableEvent],
        expected_version: i64,
    ) -> Result<(), FeedError> {
        self.writes.lock().unwrap().push(WriteCall {
            stream_id: stream_id.to_owned(),
            expected_version,
            events: events.to_vec(),
        });
        Ok(())
    }
}

/// A feed client that always fails with a transport error. Useful for testing
/// pass-through of collaborator failures.
#[derive(Debug)]
pub struct FailingFeedClient;

#[async_trait]
impl FeedClient for FailingFeedClient {
    async fn open_stream_feed(&self, _stream_id: &str) -> Result<Feed, FeedError> {
        Err(FeedError::Transport("connection refused".into()))
    }

    async fn navigate_stream_feed(
        &self,
        _feed: &Feed,
        _relation: LinkRelation,
    ) -> Result<Option<Feed>, FeedError> {
        Err(FeedError::Transport("connection refused".into()))
    }

    async fn read_event(&self, _event_url: &str) -> Result<EventRecord, FeedError> {
        Err(FeedError::Transport("connection refused".into()))
    }

    async fn write_to_stream(
        &self,
        _stream_id: &str,
        _events: &[WritableEvent],
        _expected_version: i64,
    ) -> Result<(), FeedError> {
        Err(FeedError::Transport("connection refused".into()))
    }
}

#[cfg(test)]
mod tests {
    use feedbridge_core::feed::{FeedClient, FeedError, LinkRelation, WritableEvent};
    use feedbridge_core::payload::Fields;

    use super::InMemoryFeedClient;

    fn batch(n: usize) -> Vec<WritableEvent> {
        (0..n)
            .map(|_| WritableEvent::new("Tick", Fields::new(), Fields::new()))
            .collect()
    }

    #[tokio::test]
    async fn test_head_page_lists_newest_entries_descending() {
        let client = InMemoryFeedClient::with_page_size(3);
        client.write_to_stream("s", &batch(5), -1).await.unwrap();

        let head = client.open_stream_feed("s").await.unwrap();

        let urls: Vec<&str> = head.entries().iter().map(|e| e.event_url.as_str()).collect();
        assert_eq!(urls, vec!["memory://feed/streams/s/4", "memory://feed/streams/s/3"]);
        assert!(head.has_link(LinkRelation::Last));
        assert!(head.has_link(LinkRelation::Next));
        assert!(head.has_link(LinkRelation::Previous));
    }

    #[tokio::test]
    async fn test_single_page_stream_has_no_last_link() {
        let client = InMemoryFeedClient::new();
        client.write_to_stream("s", &batch(2), -1).await.unwrap();

        let head = client.open_stream_feed("s").await.unwrap();

        assert!(!head.has_link(LinkRelation::Last));
        assert!(head.has_link(LinkRelation::First));
        assert_eq!(head.entries().len(), 2);
    }

    #[tokio::test]
    async fn test_page_past_head_is_empty_and_ends_the_chain() {
        let client = InMemoryFeedClient::new();
        client.write_to_stream("s", &batch(1), -1).await.unwrap();
        let head = client.open_stream_feed("s").await.unwrap();

        let beyond = client
            .navigate_stream_feed(&head, LinkRelation::Previous)
            .await
            .unwrap()
            .unwrap();

        assert!(beyond.entries().is_empty());
        assert!(!beyond.has_link(LinkRelation::Previous));
    }

    #[tokio::test]
    async fn test_write_with_stale_version_is_rejected() {
        let client = InMemoryFeedClient::new();
        client.write_to_stream("s", &batch(2), -1).await.unwrap();

        let result = client.write_to_stream("s", &batch(1), 0).await;

        match result {
            Err(FeedError::WrongExpectedVersion {
                expected, actual, ..
            }) => {
                assert_eq!(expected, 0);
                assert_eq!(actual, 1);
            }
            other => panic!("expected WrongExpectedVersion, got {other:?}"),
        }
        assert_eq!(client.stored_events("s").len(), 2);
        assert_eq!(client.write_calls().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_stream_is_not_found() {
        let client = InMemoryFeedClient::new();

        let result = client.open_stream_feed("nope").await;

        assert!(matches!(result, Err(FeedError::StreamNotFound(id)) if id == "nope"));
    }
}
