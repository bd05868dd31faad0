// src/sync/http.rs
// =============================================================================
// HTTP implementations of the two collaborator seams in this module:
//
// - DocsBackend implements DocsSyncApi over the backend's sync endpoint.
//   GET {base}/sync/{namespace}/{kind}/{name} answers with a plain-text
//   stream: zero or more build progress lines, and the final non-empty
//   line is the result token ("cached" or "updated").
// - HttpEntityDocs implements ContentDocs over the content endpoint.
//   GET {base}/docs/{namespace}/{kind}/{name}/{page} answers with the
//   rendered page.
//
// The sync request carries no overall deadline - a cold build can stream
// for minutes - only a connect timeout. The content request is a normal
// bounded fetch.
// =============================================================================

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, StatusCode};
use tracing::debug;
use url::Url;

use crate::entity::EntityRef;

use super::content::{ContentDocs, ContentState};
use super::driver::{DocsSyncApi, LogSink};
use super::state::SyncError;

// Talks to one docs backend; cheap to share behind an Arc
pub struct DocsBackend {
    client: Client,
    base_url: Url,
}

impl DocsBackend {
    pub fn new(base_url: Url) -> Self {
        // Connect timeout only: the sync stream must be allowed to run
        // for as long as the build does
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        DocsBackend { client, base_url }
    }

    // Joins the base URL with an endpoint path
    fn api_url(&self, path: &str) -> Result<Url, SyncError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{}/{}", base, path))
            .map_err(|e| SyncError::Request(format!("invalid backend URL: {}", e)))
    }

    // Fetches one rendered documentation page for an entity
    //
    // Parameters:
    //   entity: whose docs to fetch
    //   page: path of the page inside the entity's doc site (e.g. "index.html")
    pub async fn fetch_page(&self, entity: &EntityRef, page: &str) -> Result<String, SyncError> {
        let url = self.api_url(&format!("docs/{}/{}", entity.path(), page))?;
        debug!("fetching docs page {}", url);

        let response = self
            .client
            .get(url)
            .timeout(Duration::from_secs(30))
            .send()
            .await
            .map_err(|e| SyncError::Request(format!("docs request failed: {}", e)))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(SyncError::NotFound(entity.to_string())),
            status if !status.is_success() => Err(SyncError::Request(format!(
                "docs request failed: HTTP {}",
                status.as_u16()
            ))),
            _ => response
                .text()
                .await
                .map_err(|e| SyncError::Request(format!("docs response failed: {}", e))),
        }
    }
}

#[async_trait]
impl DocsSyncApi for DocsBackend {
    async fn sync_entity_docs(
        &self,
        entity: &EntityRef,
        on_log: LogSink<'_>,
    ) -> Result<String, SyncError> {
        let url = self.api_url(&format!("sync/{}", entity.path()))?;
        debug!("starting docs sync against {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| SyncError::Request(format!("sync request failed: {}", e)))?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                return Err(SyncError::NotFound(entity.to_string()));
            }
            status if !status.is_success() => {
                return Err(SyncError::Request(format!(
                    "sync request failed: HTTP {}",
                    status.as_u16()
                )));
            }
            _ => {}
        }

        // Read the body as it streams in, splitting on newlines. Each
        // completed line is held back until the next one arrives: every
        // line turns out to be a progress message EXCEPT the last, which
        // is the result token and must not be logged.
        let mut body = response.bytes_stream();
        let mut buffer = String::new();
        let mut held: Option<String> = None;

        while let Some(chunk) = body.next().await {
            let chunk =
                chunk.map_err(|e| SyncError::Request(format!("sync stream failed: {}", e)))?;
            buffer.push_str(&String::from_utf8_lossy(&chunk));

            while let Some(newline) = buffer.find('\n') {
                let line = buffer[..newline].trim_end_matches('\r').to_string();
                buffer = buffer.split_off(newline + 1);

                if line.is_empty() {
                    continue;
                }
                if let Some(previous) = held.replace(line) {
                    on_log(previous);
                }
            }
        }

        // A final line without a trailing newline still counts
        let tail = buffer.trim();
        if !tail.is_empty() {
            if let Some(previous) = held.replace(tail.to_string()) {
                on_log(previous);
            }
        }

        held.ok_or_else(|| SyncError::Protocol(format!("empty sync response from {}", url)))
    }
}

// ContentDocs over the docs content endpoint
//
// The fetch itself runs in resolve(); retry() only marks it pending, so
// the caller decides when the await happens. One instance tracks one
// (entity, page) pair.
pub struct HttpEntityDocs {
    backend: Arc<DocsBackend>,
    entity: EntityRef,
    page: String,
    state: ContentState,
    pending: bool,
}

impl HttpEntityDocs {
    // Starts out loading, with the first fetch already pending
    pub fn new(backend: Arc<DocsBackend>, entity: EntityRef, page: &str) -> Self {
        HttpEntityDocs {
            backend,
            entity,
            page: page.to_string(),
            state: ContentState {
                loading: true,
                value: None,
                error: None,
            },
            pending: true,
        }
    }

    // True while a requested fetch has not run yet
    pub fn needs_resolve(&self) -> bool {
        self.pending
    }

    // Runs the pending fetch, if any, and settles the snapshot
    pub async fn resolve(&mut self) {
        if !self.pending {
            return;
        }
        self.pending = false;

        match self.backend.fetch_page(&self.entity, &self.page).await {
            Ok(page) => {
                self.state = ContentState {
                    loading: false,
                    value: Some(page),
                    error: None,
                };
            }
            Err(error) => {
                self.state = ContentState {
                    loading: false,
                    value: None,
                    error: Some(error),
                };
            }
        }
    }
}

impl ContentDocs for HttpEntityDocs {
    fn state(&self) -> ContentState {
        self.state.clone()
    }

    fn retry(&mut self) {
        self.state.loading = true;
        self.pending = true;
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What is bytes_stream()?
//    - Normally you read a whole response with .text() or .json()
//    - bytes_stream() instead yields chunks as they arrive over the wire
//    - That is what lets us show build progress while the build runs
//
// 2. Why from_utf8_lossy?
//    - A chunk boundary can fall anywhere, even mid-character in theory
//    - Build logs are ASCII in practice, so lossy conversion is safe and
//      never fails the whole sync over one odd byte
//
// 3. Why the one-line holdback?
//    - The wire format puts the result token on the last line
//    - While streaming we cannot know a line is the last one until the
//      body ends, so we always keep one line in hand before logging it
// -----------------------------------------------------------------------------
