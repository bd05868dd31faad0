// src/sync/state.rs
// =============================================================================
// This module is the heart of the freshness tracker: a small state machine
// that follows one documentation build from "are the docs current?" all the
// way to "fresh content is on screen".
//
// The machine is driven by actions. Applying an action never mutates the
// previous state; reduce() always hands back a brand new one, which keeps
// every transition easy to test in isolation.
//
// Rust concepts:
// - Enums with data: Actions and errors carry their payloads
// - Pattern matching: One match arm per transition
// - Ownership: reduce() borrows the old state and returns a new one
// =============================================================================

use serde::Serialize;
use thiserror::Error;

// The two result tokens a sync call may legally resolve with
pub const RESULT_CACHED: &str = "cached";
pub const RESULT_UPDATED: &str = "updated";

// Where the current sync conversation stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncStatus {
    /// Asking the backend whether the stored docs are current
    Checking,
    /// Fresh content is being fetched after a completed build
    Reloading,
    /// The backend is building new documentation right now
    Building,
    /// A build finished and produced newer content than what is shown
    BuildReady,
    /// The stored docs were already current
    UpToDate,
    /// The sync conversation failed
    Error,
}

// Everything we know about the sync conversation at one point in time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncState {
    /// Current position in the conversation
    pub status: SyncStatus,
    /// Build progress lines, in arrival order, for the current build
    pub log: Vec<String>,
    /// Most recent failure, if the conversation hit one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<SyncError>,
}

impl Default for SyncState {
    // Every sync conversation starts by checking, with nothing logged
    fn default() -> Self {
        SyncState {
            status: SyncStatus::Checking,
            log: Vec::new(),
            error: None,
        }
    }
}

// One step of the sync conversation, as reported by the driver
#[derive(Debug, Clone, PartialEq)]
pub enum SyncAction {
    // The sync call has been issued
    Checking,
    // A finished build is ready; fresh content is being fetched
    Reloading,
    // The backend is building; None means "the build is taking a while"
    // (which also starts a fresh log), Some(line) is one progress message
    Building { line: Option<String> },
    // The sync call resolved with a result token
    BuildReady { result: String },
    // The sync call failed
    Error(SyncError),
}

// Why a sync conversation failed
//
// Cloneable on purpose: the same error value is stored in state snapshots
// and compared in assertions.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum SyncError {
    /// No documentation exists for the entity
    #[error("documentation not found for {0}")]
    NotFound(String),
    /// The request to the backend failed (transport or HTTP level)
    #[error("request failed: {0}")]
    Request(String),
    /// The backend answered with something we could not interpret
    #[error("unexpected backend response: {0}")]
    Protocol(String),
}

// Applies one action to a state and returns the resulting state
//
// The input state is never modified. Each transition decides three things:
// the new status, what happens to the build log, and what happens to the
// stored error.
//
// Log rules:
// - A bare Building action and both BuildReady outcomes reset the log,
//   so each build cycle starts and ends clean
// - A Building action with a line appends it
// - Everything else leaves the log alone
//
// Panics if the BuildReady result is not one of the two known tokens;
// that can only come from a misbehaving driver, not from user input.
pub fn reduce(state: &SyncState, action: SyncAction) -> SyncState {
    match action {
        SyncAction::Checking => SyncState {
            status: SyncStatus::Checking,
            log: state.log.clone(),
            // A new check wipes the slate of earlier failures
            error: None,
        },
        SyncAction::Reloading => SyncState {
            status: SyncStatus::Reloading,
            log: state.log.clone(),
            error: state.error.clone(),
        },
        SyncAction::Building { line } => {
            let log = match line {
                Some(line) => {
                    let mut log = state.log.clone();
                    log.push(line);
                    log
                }
                None => Vec::new(),
            };
            SyncState {
                status: SyncStatus::Building,
                log,
                error: state.error.clone(),
            }
        }
        SyncAction::BuildReady { result } => {
            let status = match result.as_str() {
                RESULT_CACHED => SyncStatus::UpToDate,
                RESULT_UPDATED => SyncStatus::BuildReady,
                other => panic!("unexpected sync result: {:?}", other),
            };
            SyncState {
                status,
                log: Vec::new(),
                error: state.error.clone(),
            }
        }
        SyncAction::Error(error) => SyncState {
            status: SyncStatus::Error,
            log: state.log.clone(),
            error: Some(error),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let state = SyncState::default();
        assert_eq!(state.status, SyncStatus::Checking);
        assert!(state.log.is_empty());
        assert!(state.error.is_none());
    }

    #[test]
    fn test_checking_clears_previous_error() {
        let errored = reduce(
            &SyncState::default(),
            SyncAction::Error(SyncError::Request("boom".to_string())),
        );
        assert_eq!(errored.status, SyncStatus::Error);

        let rechecked = reduce(&errored, SyncAction::Checking);
        assert_eq!(rechecked.status, SyncStatus::Checking);
        assert!(rechecked.error.is_none());
    }

    #[test]
    fn test_bare_building_resets_log() {
        let mut state = SyncState::default();
        state.log = vec!["leftover from last build".to_string()];

        let building = reduce(&state, SyncAction::Building { line: None });
        assert_eq!(building.status, SyncStatus::Building);
        assert!(building.log.is_empty());
    }

    #[test]
    fn test_building_lines_accumulate_in_order() {
        let state = reduce(&SyncState::default(), SyncAction::Building { line: None });
        let state = reduce(
            &state,
            SyncAction::Building { line: Some("Line 1".to_string()) },
        );
        let state = reduce(
            &state,
            SyncAction::Building { line: Some("Line 2".to_string()) },
        );

        assert_eq!(state.status, SyncStatus::Building);
        assert_eq!(state.log, vec!["Line 1", "Line 2"]);
    }

    #[test]
    fn test_cached_result_means_up_to_date() {
        let state = reduce(
            &SyncState::default(),
            SyncAction::BuildReady { result: RESULT_CACHED.to_string() },
        );
        assert_eq!(state.status, SyncStatus::UpToDate);
    }

    #[test]
    fn test_updated_result_means_build_ready() {
        let state = reduce(
            &SyncState::default(),
            SyncAction::BuildReady { result: RESULT_UPDATED.to_string() },
        );
        assert_eq!(state.status, SyncStatus::BuildReady);
    }

    #[test]
    fn test_build_ready_resets_log() {
        let mut state = SyncState::default();
        state.status = SyncStatus::Building;
        state.log = vec!["Line 1".to_string(), "Line 2".to_string()];

        let done = reduce(
            &state,
            SyncAction::BuildReady { result: RESULT_UPDATED.to_string() },
        );
        assert!(done.log.is_empty());
    }

    #[test]
    #[should_panic(expected = "unexpected sync result")]
    fn test_unknown_result_panics() {
        reduce(
            &SyncState::default(),
            SyncAction::BuildReady { result: "sideways".to_string() },
        );
    }

    #[test]
    fn test_error_keeps_log_and_records_cause() {
        let mut state = SyncState::default();
        state.status = SyncStatus::Building;
        state.log = vec!["Line 1".to_string()];

        let failed = reduce(
            &state,
            SyncAction::Error(SyncError::NotFound("component:default/petstore".to_string())),
        );
        assert_eq!(failed.status, SyncStatus::Error);
        assert_eq!(failed.log, vec!["Line 1"]);
        assert_eq!(
            failed.error,
            Some(SyncError::NotFound("component:default/petstore".to_string()))
        );
    }

    #[test]
    fn test_reloading_touches_only_the_status() {
        let mut state = SyncState::default();
        state.status = SyncStatus::BuildReady;
        state.log = vec!["kept".to_string()];

        let reloading = reduce(&state, SyncAction::Reloading);
        assert_eq!(reloading.status, SyncStatus::Reloading);
        assert_eq!(reloading.log, vec!["kept"]);
    }

    #[test]
    fn test_reduce_never_mutates_its_input() {
        let mut state = SyncState::default();
        state.status = SyncStatus::Building;
        state.log = vec!["Line 1".to_string()];
        let before = state.clone();

        let _ = reduce(&state, SyncAction::Building { line: Some("Line 2".to_string()) });
        let _ = reduce(&state, SyncAction::BuildReady { result: RESULT_CACHED.to_string() });
        let _ = reduce(&state, SyncAction::Checking);

        assert_eq!(state, before);
    }

    #[test]
    fn test_status_serializes_in_wire_casing() {
        let json = serde_json::to_string(&SyncStatus::BuildReady).unwrap();
        assert_eq!(json, "\"BUILD_READY\"");
        let json = serde_json::to_string(&SyncStatus::UpToDate).unwrap();
        assert_eq!(json, "\"UP_TO_DATE\"");
    }
}
