//! Cache-aside entity handlers.
//!
//! Each handler composes one [`CacheAside`] coordinator (or, for values that
//! never reach SQL, one [`CacheOnlyStore`]) with its SQLite repository.

mod account;
mod cache_only;
mod call;
mod channel;
mod coordinator;
mod customer;
mod ephemeral;
mod poll;
mod queue;
mod sip_auth;

pub use account::AccountHandler;
pub use cache_only::CacheOnlyStore;
pub use call::CallHandler;
pub use channel::ChannelHandler;
pub use coordinator::CacheAside;
pub use customer::CustomerHandler;
pub use ephemeral::{AmdHandler, DtmfHandler, ExternalMediaHandler};
pub use poll::poll_until;
pub use queue::QueueHandler;
pub use sip_auth::SipAuthHandler;
