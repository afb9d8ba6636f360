//! Response caching.
//!
//! Two instances are created at startup and handed to the stock service:
//! the profile cache (ticker details) and the aggregate cache (fan-out
//! results, shorter TTL since it goes stale faster).

pub mod keys;
pub mod ttl;

pub use ttl::TtlCache;
