//! Domain records persisted (or cached) by the data-access layer.

/// Implements the `Record` timestamp accessors for a struct with
/// `tm_create`, `tm_update` and `tm_delete` fields.
macro_rules! lifecycle_timestamps {
    () => {
        fn tm_create(&self) -> &str {
            &self.tm_create
        }

        fn tm_update(&self) -> &str {
            &self.tm_update
        }

        fn tm_delete(&self) -> &str {
            &self.tm_delete
        }
    };
}

mod account;
mod call;
mod channel;
mod customer;
mod ephemeral;
mod queue;
mod sip_auth;

pub use account::Account;
pub use call::{Address, Call, CallStatus, CallType, Direction, HangupBy, HangupReason};
pub use channel::{Channel, ChannelState};
pub use customer::Customer;
pub use ephemeral::{AmdResult, AmdStatus, DtmfBuffer, ExternalMedia};
pub use queue::{Queue, RoutingMethod};
pub use sip_auth::{AuthType, SipAuth};
