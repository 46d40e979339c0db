//! PDF Viewer Cache Library
//!
//! Per-page tile grid cache with global invalidation and distance-based
//! eviction, plus its configuration.

pub mod config;
pub mod render_cache;

pub use config::{CacheConfig, ConfigError, DEFAULT_EVICTION_DISTANCE};
pub use render_cache::{vertical_gap, CacheStats, RenderCache};
