//! In-process read-through caching for hot storefront data.
//!
//! Each service owns a [`TtlCache`] typed to the values it caches. Entries
//! expire after a per-write TTL and the map is bounded by an LRU capacity, so
//! a long-lived process cannot grow without limit. Caches are plain values
//! built at startup and handed to services; nothing is process-global.
//!
//! ```toml
//! [cache]
//! enabled = true
//! capacity = 1024
//! default_ttl_seconds = 300
//! sweep_interval_seconds = 60
//! ```
//!
//! The cache is per process. Several server instances each keep their own
//! copy and may serve stale data until their entries expire.

mod config;
pub mod keys;
mod lock;
mod store;

pub use config::CacheConfig;
pub use store::{CacheEntry, CacheLookup, TtlCache};
