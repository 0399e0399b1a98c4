//! Observability module
//!
//! In-process routing metrics. Each event is also logged through `tracing`
//! by the component that produces it.

pub mod metrics;

pub use metrics::{names, Counter, Histogram, MetricsCollector, MetricsSnapshot};
