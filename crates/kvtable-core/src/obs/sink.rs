//! Metrics sink boundary.
//!
//! Table logic MUST NOT depend on obs::metrics directly.
//! All instrumentation flows through MetricsEvent and MetricsSink.
use crate::{db::identity::TablePath, obs::metrics};
use std::cell::RefCell;

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<*const dyn MetricsSink>> = RefCell::new(None);
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricsEvent {
    Upsert {
        path: TablePath,
    },
    Erase {
        path: TablePath,
    },
    Find {
        path: TablePath,
        hit: bool,
    },
    Range {
        path: TablePath,
        rows_scanned: u64,
    },
    CursorOpen {
        reused: bool,
    },
    CursorClose,
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent);
}

/// GlobalMetricsSink
/// Default sink that writes into the thread-local counters.
/// Acts as the concrete sink when no scoped override is installed.

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent) {
        metrics::with_state_mut(|m| match event {
            MetricsEvent::Upsert { path } => {
                m.ops.upsert_calls = m.ops.upsert_calls.saturating_add(1);
                let entry = m.tables.entry(path.to_string()).or_default();
                entry.upsert_calls = entry.upsert_calls.saturating_add(1);
            }

            MetricsEvent::Erase { path } => {
                m.ops.erase_calls = m.ops.erase_calls.saturating_add(1);
                let entry = m.tables.entry(path.to_string()).or_default();
                entry.erase_calls = entry.erase_calls.saturating_add(1);
            }

            MetricsEvent::Find { path, hit } => {
                let hits = u64::from(hit);
                m.ops.find_calls = m.ops.find_calls.saturating_add(1);
                m.ops.find_hits = m.ops.find_hits.saturating_add(hits);

                let entry = m.tables.entry(path.to_string()).or_default();
                entry.find_calls = entry.find_calls.saturating_add(1);
                entry.find_hits = entry.find_hits.saturating_add(hits);
            }

            MetricsEvent::Range { path, rows_scanned } => {
                m.ops.range_calls = m.ops.range_calls.saturating_add(1);
                m.ops.rows_scanned = m.ops.rows_scanned.saturating_add(rows_scanned);

                let entry = m.tables.entry(path.to_string()).or_default();
                entry.range_calls = entry.range_calls.saturating_add(1);
                entry.rows_scanned = entry.rows_scanned.saturating_add(rows_scanned);
            }

            MetricsEvent::CursorOpen { reused } => {
                if reused {
                    m.ops.cursors_reused = m.ops.cursors_reused.saturating_add(1);
                } else {
                    m.ops.cursors_created = m.ops.cursors_created.saturating_add(1);
                }
            }

            MetricsEvent::CursorClose => {
                m.ops.cursors_destroyed = m.ops.cursors_destroyed.saturating_add(1);
            }
        });
    }
}

pub(crate) const GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

pub(crate) fn record(event: MetricsEvent) {
    let override_ptr = SINK_OVERRIDE.with(|cell| *cell.borrow());
    if let Some(ptr) = override_ptr {
        // SAFETY:
        // - `ptr` was produced from a valid `&dyn MetricsSink` in `with_metrics_sink`.
        // - `with_metrics_sink` restores the previous pointer on every exit,
        //   including unwind, via `Guard::drop`.
        // - `record` is synchronous and never stores `ptr` beyond this call.
        unsafe { (&*ptr).record(event) };
    } else {
        GLOBAL_METRICS_SINK.record(event);
    }
}

/// Snapshot the current counters.
#[must_use]
pub fn metrics_report() -> metrics::EventReport {
    metrics::report()
}

/// Reset all counters.
pub fn metrics_reset_all() {
    metrics::reset_all();
}

/// Run a closure with a temporary metrics sink override.
pub fn with_metrics_sink<T>(sink: &dyn MetricsSink, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<*const dyn MetricsSink>);

    impl Drop for Guard {
        fn drop(&mut self) {
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = self.0;
            });
        }
    }

    // SAFETY:
    // - `sink_ptr` is installed only for this dynamic scope.
    // - `Guard` restores the previous slot on all exits, including panic.
    // - `record` only dereferences synchronously and never persists `sink_ptr`.
    let sink_ptr = unsafe { std::mem::transmute::<&dyn MetricsSink, *const dyn MetricsSink>(sink) };
    let prev = SINK_OVERRIDE.with(|cell| {
        let mut slot = cell.borrow_mut();
        slot.replace(sink_ptr)
    });
    let _guard = Guard(prev);

    f()
}

///
/// TESTS
///
