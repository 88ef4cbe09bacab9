//! SQLite storage backend.
//!
//! `rusqlite` does the work on a dedicated thread; `tokio-rusqlite` gives it an
//! async face. One repository per entity, all sharing one [`Database`].

mod account;
mod call;
mod channel;
mod conversions;
mod customer;
mod database;
mod error;
mod queue;
mod schema;
mod sip_auth;

pub use account::SqliteAccountRepository;
pub use call::{CallTransaction, SqliteCallRepository};
pub use channel::SqliteChannelRepository;
pub use customer::SqliteCustomerRepository;
pub use database::Database;
pub use queue::SqliteQueueRepository;
pub use sip_auth::SqliteSipAuthRepository;
