//! Storage backends and the cache-aside layer on top of them.
//!
//! - `sqlite`: SQLite repositories, one per entity
//! - `cached`: cache-aside handlers wrapping those repositories

pub mod cached;
pub mod sqlite;

pub use cached::{
    AccountHandler, AmdHandler, CallHandler, ChannelHandler, CustomerHandler, DtmfHandler,
    ExternalMediaHandler, QueueHandler, SipAuthHandler,
};
pub use sqlite::Database;
