pub mod ttl_cache;

pub use ttl_cache::{CacheStats, TtlCache, DEFAULT_SWEEP_PERIOD, DEFAULT_TTL};
