// src/sync/driver.rs
// =============================================================================
// This module runs one sync conversation against the docs backend and turns
// it into the stream of actions the reducer understands.
//
// The choreography:
// 1. Dispatch Checking the moment the conversation starts
// 2. Arm a one-shot timer; if the backend call outlives it, dispatch a bare
//    Building so the viewer flips from "checking" to "building"
// 3. Forward every progress line the backend reports as its own Building
// 4. When the call settles, flush any lines still queued, then dispatch
//    BuildReady or Error - and never let the timer fire after that
//
// SyncTracker at the bottom owns the resulting state and carries the
// reconciliation rules that join the sync side to the content side.
//
// Rust concepts:
// - tokio::select!: Race several futures inside one task
// - Channels: Hand values between the backend callback and this loop
// - Trait objects: The backend is a dyn trait so tests can script it
// =============================================================================

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

use crate::entity::EntityRef;

use super::content::ContentDocs;
use super::state::{reduce, SyncAction, SyncError, SyncState, SyncStatus, RESULT_CACHED};

// How long a sync call may stay silent before we show the building state
pub const BUILDING_INDICATOR_DELAY: Duration = Duration::from_millis(1000);

// Callback the backend uses to report build progress lines
pub type LogSink<'a> = &'a (dyn Fn(String) + Send + Sync);

// The one thing the driver needs from a docs backend: ensure the stored
// docs for an entity are current, reporting progress lines along the way,
// and resolve with a result token ("cached" or "updated").
#[async_trait]
pub trait DocsSyncApi: Send + Sync {
    async fn sync_entity_docs(
        &self,
        entity: &EntityRef,
        on_log: LogSink<'_>,
    ) -> Result<String, SyncError>;
}

// Runs a single sync conversation to completion
//
// All actions are sent through `actions` in the order they happen. The
// whole conversation lives in one task: the backend call, its progress
// lines, and the building-indicator timer are raced in one select! loop,
// so nothing can arrive out of order and the timer dies with the loop.
//
// Send errors are ignored on purpose: a dropped receiver just means
// nobody is watching anymore.
pub async fn run_sync(
    api: Arc<dyn DocsSyncApi>,
    entity: EntityRef,
    actions: mpsc::UnboundedSender<SyncAction>,
    building_delay: Duration,
) {
    let _ = actions.send(SyncAction::Checking);

    // Progress lines flow through this channel; the closure end is handed
    // to the backend call as its logging callback
    let (line_tx, mut line_rx) = mpsc::unbounded_channel::<String>();
    let on_log = move |line: String| {
        let _ = line_tx.send(line);
    };

    let call = api.sync_entity_docs(&entity, &on_log);
    tokio::pin!(call);

    let indicator = tokio::time::sleep(building_delay);
    tokio::pin!(indicator);
    let mut indicator_armed = true;

    let outcome = loop {
        tokio::select! {
            _ = &mut indicator, if indicator_armed => {
                indicator_armed = false;
                let _ = actions.send(SyncAction::Building { line: None });
            }
            Some(line) = line_rx.recv() => {
                let _ = actions.send(SyncAction::Building { line: Some(line) });
            }
            outcome = &mut call => {
                break outcome;
            }
        }
    };

    // Lines the backend reported in its final moments are still sitting in
    // the channel; they belong before the completion action
    while let Ok(line) = line_rx.try_recv() {
        let _ = actions.send(SyncAction::Building { line: Some(line) });
    }

    match outcome {
        Ok(result) => {
            let _ = actions.send(SyncAction::BuildReady { result });
        }
        Err(error) => {
            let _ = actions.send(SyncAction::Error(error));
        }
    }
}

// Spawns run_sync on the runtime and returns the action stream
//
// The receiver closes once the conversation is over, so callers can just
// `while let Some(action) = rx.recv().await` until it ends.
pub fn spawn_sync(
    api: Arc<dyn DocsSyncApi>,
    entity: EntityRef,
    building_delay: Duration,
) -> mpsc::UnboundedReceiver<SyncAction> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(run_sync(api, entity, tx, building_delay));
    rx
}

// Owns the sync state for one entity and reconciles it with the content
// fetch after every observation
//
// A tracker is scoped to a single entity identity; to track a different
// entity, start a new tracker.
#[derive(Debug, Default)]
pub struct SyncTracker {
    state: SyncState,
}

impl SyncTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SyncState {
        &self.state
    }

    // Applies one action from the driver
    pub fn apply(&mut self, action: SyncAction) {
        debug!("sync action: {:?}", action);
        self.state = reduce(&self.state, action);
    }

    // Joins the sync side to the content side
    //
    // Call this after every state observation - after applying an action,
    // and after the content fetch settles. Two rules, and at most one
    // fires per call:
    // - A finished build with newer content triggers a content re-fetch
    //   and moves us to Reloading
    // - Once the re-fetch has landed, Reloading folds back to UpToDate
    //   (the freshly fetched copy IS the current one, so the conversation
    //   closes with the cached result)
    pub fn reconcile(&mut self, content: &mut dyn ContentDocs) {
        if content.state().loading {
            return;
        }
        match self.state.status {
            SyncStatus::BuildReady => {
                content.retry();
                self.apply(SyncAction::Reloading);
            }
            SyncStatus::Reloading => {
                self.apply(SyncAction::BuildReady {
                    result: RESULT_CACHED.to_string(),
                });
            }
            _ => {}
        }
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What is tokio::select!?
//    - Polls several futures at once and runs the branch of whichever
//      finishes first
//    - The `, if indicator_armed` part is a branch guard: once the timer
//      has fired we stop polling it (a one-shot timer stays "ready"
//      forever, so without the guard the branch would spin)
//
// 2. Why tokio::pin!?
//    - select! polls the same futures again and again across loop turns
//    - That requires the futures to be pinned (fixed in memory)
//    - tokio::pin! pins them to the stack so we can poll by &mut reference
//
// 3. Why an unbounded channel for log lines?
//    - The backend callback is synchronous (a plain Fn), so it cannot
//      await a bounded channel's capacity
//    - Build logs are small; unbounded is the honest choice here
//
// 4. What is Arc<dyn DocsSyncApi>?
//    - A reference-counted pointer to "anything implementing the trait"
//    - The spawned task and the caller can both hold the backend, and
//      tests can pass a scripted implementation instead of a real one
//
// 5. What does #[async_trait] do?
//    - Stable Rust (at this edition) cannot put async fns in traits that
//      are used as trait objects
//    - The macro rewrites them to return boxed futures behind the scenes
// -----------------------------------------------------------------------------
