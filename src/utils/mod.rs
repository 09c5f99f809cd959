//! # Utility Modules
//!
//! Supporting utilities shared by the codec.
//!
//! ## Components
//! - **Logging**: tracing subscriber configuration
//! - **Metrics**: Thread-safe observability counters

pub mod logging;
pub mod metrics;

pub use metrics::{global_metrics, CodecMetrics, MetricsSnapshot};
