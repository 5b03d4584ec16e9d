use candid::CandidType;
use serde::{Deserialize, Serialize};
use std::{cell::RefCell, collections::BTreeMap};

///
/// EventState
/// Ephemeral, in-memory counters for table operations.
///

#[derive(Clone, Debug, Default)]
pub(crate) struct EventState {
    pub(crate) ops: EventOps,
    pub(crate) tables: BTreeMap<String, TableCounters>,
}

///
/// EventOps
///

#[derive(CandidType, Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EventOps {
    // Table entrypoints
    pub upsert_calls: u64,
    pub erase_calls: u64,
    pub find_calls: u64,
    pub find_hits: u64,
    pub range_calls: u64,

    // Rows decoded by range scans
    pub rows_scanned: u64,

    // Store-side cursor handles
    pub cursors_created: u64,
    pub cursors_destroyed: u64,
    pub cursors_reused: u64,
}

///
/// TableCounters
///

#[derive(CandidType, Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct TableCounters {
    pub upsert_calls: u64,
    pub erase_calls: u64,
    pub find_calls: u64,
    pub find_hits: u64,
    pub range_calls: u64,
    pub rows_scanned: u64,
}

///
/// EventReport
/// Point-in-time copy of the counters.
///

#[derive(CandidType, Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventReport {
    pub ops: EventOps,
    pub tables: BTreeMap<String, TableCounters>,
}

thread_local! {
    static EVENT_STATE: RefCell<EventState> = RefCell::new(EventState::default());
}

/// Borrow metrics immutably.
pub(crate) fn with_state<R>(f: impl FnOnce(&EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&m.borrow()))
}

/// Borrow metrics mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&mut m.borrow_mut()))
}

/// Reset all counters (useful in tests).
pub(crate) fn reset_all() {
    with_state_mut(|m| *m = EventState::default());
}

#[must_use]
pub(crate) fn report() -> EventReport {
    with_state(|m| EventReport {
        ops: m.ops.clone(),
        tables: m.tables.clone(),
    })
}
