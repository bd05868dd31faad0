// src/sync/content.rs
// =============================================================================
// This module describes the other half of the freshness picture: the
// content fetch. The sync conversation tells us what the backend is doing;
// the content side tells us what (if anything) we currently have on hand.
//
// The tracker only needs two things from a content provider: a snapshot of
// where the fetch stands, and a way to ask for a re-fetch once a build has
// produced newer content. That pair is the ContentDocs trait, and the HTTP
// implementation lives in sync/http.rs. Tests substitute their own.
// =============================================================================

use super::state::SyncError;

// Snapshot of the content fetch at one point in time
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContentState {
    /// A fetch is in flight
    pub loading: bool,
    /// The rendered page, once a fetch has succeeded
    pub value: Option<String>,
    /// Why the last fetch failed, if it did
    pub error: Option<SyncError>,
}

// What the freshness tracker needs from a content provider
pub trait ContentDocs {
    // Returns the current fetch snapshot
    fn state(&self) -> ContentState;

    // Starts a new fetch; loading must report true until it settles
    fn retry(&mut self);
}
