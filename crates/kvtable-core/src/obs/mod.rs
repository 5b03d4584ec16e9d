//! Observability: runtime telemetry (metrics) and sink abstractions.
//!
//! This module does not access the store. Tables, indexes and cursors report
//! what they did through `sink::record`.

pub(crate) mod metrics;
pub(crate) mod sink;

// re-exports
pub use metrics::{EventOps, EventReport, TableCounters};
pub use sink::{MetricsEvent, MetricsSink, metrics_report, metrics_reset_all, with_metrics_sink};
