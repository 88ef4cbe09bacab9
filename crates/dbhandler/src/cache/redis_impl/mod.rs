//! Redis cache backend.
//!
//! Shared cache for multi-instance deployments. Values are plain JSON bytes,
//! so slots can be inspected with `redis-cli`.

mod cache;
mod error;

pub use cache::RedisCache;
