// src/sync/status.rs
// =============================================================================
// This module folds the two upstream states (content fetch + sync
// conversation) into the single status a viewer would present. It owns no
// state of its own: derive_status() is recomputed from scratch on every
// observation, so it can never drift out of step with its inputs.
//
// The branch order below is load-bearing. A loading content fetch wins over
// everything, RELOADING wins over the value checks, and only then do the
// with-content and without-content tables apply. Reordering the branches
// changes which status shows during the hand-off moments between states.
// =============================================================================

use serde::Serialize;

use super::content::ContentState;
use super::state::{SyncState, SyncStatus};

// What the viewer should show right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocsStatus {
    /// Looking into whether the docs are current; nothing to say yet
    Checking,
    /// No stored docs yet, and the very first build is running
    InitialBuild,
    /// Stale docs are on screen while a rebuild runs
    ContentStaleRefreshing,
    /// Stale docs are on screen and newer ones are ready to load
    ContentStaleReady,
    /// Stale docs are on screen and the refresh attempt failed
    ContentStaleError,
    /// No docs exist for this entity
    ContentNotFound,
    /// The docs on screen are the latest ones
    ContentFresh,
}

// Derives the display status from the two upstream states
pub fn derive_status(content: &ContentState, sync: &SyncState) -> DocsStatus {
    // An in-flight content fetch masks everything else
    if content.loading {
        return DocsStatus::Checking;
    }

    // Reloading means a build just finished and the fresh copy is on its
    // way; showing the stale statuses here would flicker
    if sync.status == SyncStatus::Reloading {
        return DocsStatus::Checking;
    }

    // Nothing on hand: either we are still finding out, a first build is
    // running, or the docs genuinely do not exist
    if content.value.is_none() {
        return match sync.status {
            SyncStatus::Checking => DocsStatus::Checking,
            SyncStatus::Building => DocsStatus::InitialBuild,
            _ => DocsStatus::ContentNotFound,
        };
    }

    // Content on hand: qualify it by what the sync side is up to
    match sync.status {
        SyncStatus::Building => DocsStatus::ContentStaleRefreshing,
        SyncStatus::BuildReady => DocsStatus::ContentStaleReady,
        SyncStatus::Error => DocsStatus::ContentStaleError,
        _ => DocsStatus::ContentFresh,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::state::SyncError;

    fn content(loading: bool, value: Option<&str>) -> ContentState {
        ContentState {
            loading,
            value: value.map(str::to_string),
            error: None,
        }
    }

    fn sync(status: SyncStatus) -> SyncState {
        SyncState {
            status,
            log: Vec::new(),
            error: None,
        }
    }

    #[test]
    fn test_loading_masks_every_sync_status() {
        for status in [
            SyncStatus::Checking,
            SyncStatus::Reloading,
            SyncStatus::Building,
            SyncStatus::BuildReady,
            SyncStatus::UpToDate,
            SyncStatus::Error,
        ] {
            assert_eq!(
                derive_status(&content(true, Some("old page")), &sync(status)),
                DocsStatus::Checking,
            );
        }
    }

    #[test]
    fn test_reloading_shows_checking_even_with_content() {
        assert_eq!(
            derive_status(&content(false, Some("old page")), &sync(SyncStatus::Reloading)),
            DocsStatus::Checking,
        );
    }

    #[test]
    fn test_without_content() {
        let cases = [
            (SyncStatus::Checking, DocsStatus::Checking),
            (SyncStatus::Building, DocsStatus::InitialBuild),
            (SyncStatus::BuildReady, DocsStatus::ContentNotFound),
            (SyncStatus::UpToDate, DocsStatus::ContentNotFound),
            (SyncStatus::Error, DocsStatus::ContentNotFound),
        ];
        for (status, expected) in cases {
            assert_eq!(derive_status(&content(false, None), &sync(status)), expected);
        }
    }

    #[test]
    fn test_with_content() {
        let cases = [
            (SyncStatus::Building, DocsStatus::ContentStaleRefreshing),
            (SyncStatus::BuildReady, DocsStatus::ContentStaleReady),
            (SyncStatus::Error, DocsStatus::ContentStaleError),
            (SyncStatus::Checking, DocsStatus::ContentFresh),
            (SyncStatus::UpToDate, DocsStatus::ContentFresh),
        ];
        for (status, expected) in cases {
            assert_eq!(
                derive_status(&content(false, Some("page")), &sync(status)),
                expected,
            );
        }
    }

    #[test]
    fn test_content_error_does_not_change_the_table() {
        // The content-side error rides along in the snapshot but the
        // derivation keys off loading and value only
        let state = ContentState {
            loading: false,
            value: None,
            error: Some(SyncError::NotFound("component:default/petstore".to_string())),
        };
        assert_eq!(
            derive_status(&state, &sync(SyncStatus::Error)),
            DocsStatus::ContentNotFound,
        );
    }

    #[test]
    fn test_status_serializes_in_wire_casing() {
        let json = serde_json::to_string(&DocsStatus::ContentStaleRefreshing).unwrap();
        assert_eq!(json, "\"CONTENT_STALE_REFRESHING\"");
    }
}
