//! Data layer: HTTP client, wire payloads, entity caches.

pub mod cache;
pub mod client;
pub mod payload;

pub use cache::{CacheStats, DiskEntityCache, EntityCache, MemoryEntityCache, NoOpCache};
pub use client::{DataClient, EntitySource};
