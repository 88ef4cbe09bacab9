//! Cache backend implementations.
//!
//! Concrete implementations of `dbhandler_core::cache::Cache`. The in-memory
//! LRU is always available; Redis is behind the `redis` feature.
//!
//! # Feature Flags
//!
//! - `redis`: Redis cache using the redis crate, selected at runtime when
//!   `REDIS_URL` is set

pub mod memory;

#[cfg(feature = "redis")]
pub mod redis_impl;

pub use memory::MemoryCache;

#[cfg(feature = "redis")]
pub use redis_impl::RedisCache;
