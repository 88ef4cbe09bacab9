//! In-memory cache backend.
//!
//! Thread-safe LRU with TTL support for single-instance deployments and tests.

mod cache;

pub use cache::MemoryCache;
