// src/sync/mod.rs
// =============================================================================
// Documentation freshness tracking.
//
// How the pieces fit together:
// - state.rs: the sync state machine (status, build log, reducer)
// - content.rs: what the displayed-content side looks like to the tracker
// - status.rs: folds content and sync into one display status
// - driver.rs: runs a sync call and translates it into state actions
// - http.rs: the docs backend over HTTP, content pages and sync streaming
// =============================================================================

pub mod content;
pub mod driver;
pub mod http;
pub mod state;
pub mod status;
