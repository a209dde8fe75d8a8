//! Shared test doubles for feedbridge.

mod clock;
mod feed_client;

pub use clock::FixedClock;
pub use feed_client::{
    DEFAULT_PAGE_SIZE, FailingFeedClient, InMemoryFeedClient, StaticFeedClient, WriteCall,
};
