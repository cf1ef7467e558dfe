//! Infrastructure modules
//!
//! - `config` - TOML configuration loading
//! - `metrics` - Lock-free counters and latency histogram

pub mod config;
pub mod metrics;

// Re-export commonly used types
pub use config::Config;
pub use metrics::Metrics;
