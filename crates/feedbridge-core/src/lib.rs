//! Feedbridge Core — domain event stream abstractions.
//!
//! This crate defines the domain-side message model, the payload registry,
//! and the two boundaries the event store sits between: the paginated
//! [`feed::FeedClient`] it consumes and the [`store::EventStore`] it provides.
//! It contains no infrastructure code.

pub mod clock;
pub mod error;
pub mod feed;
pub mod message;
pub mod metadata;
pub mod payload;
pub mod store;
