//! Cache-aside data access for the VoIP platform.
//!
//! SQLite is the system of record; a shared key-value cache (in-process LRU
//! or Redis) sits in front of it. Callers normally hold a [`DbHandler`] and
//! go through its per-entity handlers.

pub mod cache;
pub mod config;
pub mod handler;
pub mod storage;

#[cfg(test)]
mod test_support;

pub use config::Config;
pub use handler::DbHandler;
