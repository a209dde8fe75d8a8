//! Feedbridge Event Store — synchronizes domain event streams with a
//! paginated, linked event feed.
//!
//! Reading walks the feed from its oldest page towards the newest, sorting
//! each page's entries by version and decoding every event into a
//! [`DomainMessage`](feedbridge_core::message::DomainMessage). Writing encodes
//! a batch and submits it as one append guarded by the version just before the
//! batch's first playhead.

pub mod codec;
pub mod feed_event_store;
pub mod ordering;
pub mod reader;
pub mod writer;

pub use codec::{MessageCodec, RECORDED_ON_KEY};
pub use feed_event_store::FeedEventStore;
