//! Pure building blocks for the dbhandler data-access layer.
//!
//! Nothing in this crate performs I/O. It defines the record envelope every
//! entity shares, the cache and repository contracts, the list-query builder
//! and the domain models. Storage and cache backends live in the `dbhandler`
//! crate.

pub mod cache;
pub mod models;
pub mod record;
pub mod serde_helpers;
pub mod storage;
pub mod time;

pub use record::{DeleteMode, Keyed, Record};
pub use time::{Clock, SystemClock, DEFAULT_TIMESTAMP};
