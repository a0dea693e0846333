//! Refresh and replay counters
//!
//! - `auth_refresh_total` (counter): label `outcome` (`success`, `failure`, `superseded`)
//! - `auth_refresh_coalesced_total` (counter): 401s that joined an in-flight refresh
//! - `auth_replay_total` (counter): requests replayed after a successful refresh
//!
//! No recorder is installed by this crate; without one these are no-ops.

use crate::refresh::RefreshOutcome;

pub fn record_refresh(outcome: RefreshOutcome) {
    ::metrics::counter!("auth_refresh_total", "outcome" => outcome.label()).increment(1);
}

pub fn record_coalesced() {
    ::metrics::counter!("auth_refresh_coalesced_total").increment(1);
}

pub fn record_replay() {
    ::metrics::counter!("auth_replay_total").increment(1);
}
