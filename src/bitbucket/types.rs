// src/bitbucket/types.rs
// =============================================================================
// Wire shapes for the two Bitbucket API generations, plus the normalized
// repository descriptor this tool hands to its callers.
//
// The self-hosted (v1) API and the cloud (v2) API paginate differently and
// spell their fields differently; everything downstream of the parser works
// with RepoDescriptor and never sees the difference.
// =============================================================================

use serde::{Deserialize, Serialize};

// One page of a v1 (self-hosted) collection response
//
// v1 paginates with a numeric cursor: isLastPage says whether to continue,
// nextPageStart is the cursor for the following request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerPage<T> {
    /// Number of values in this page
    pub size: u32,
    /// Page size limit the server applied
    pub limit: u32,
    /// Whether this is the final page
    pub is_last_page: bool,
    /// Index of the first value in this page
    #[serde(default)]
    pub start: u32,
    /// Cursor for the next page; absent on the last page
    #[serde(default)]
    pub next_page_start: Option<u32>,
    /// The page's values
    pub values: Vec<T>,
}

// One page of a v2 (cloud) collection response
//
// v2 paginates with a ready-made URL: follow `next` until it disappears.
#[derive(Debug, Clone, Deserialize)]
pub struct CloudPage<T> {
    /// 1-based index of this page
    pub page: u32,
    /// Page size the server applied
    pub pagelen: u32,
    /// Total number of values across all pages, when the server knows it
    #[serde(default)]
    pub size: Option<u64>,
    /// URL of the next page; absent on the last page
    #[serde(default)]
    pub next: Option<String>,
    /// The page's values
    pub values: Vec<T>,
}

// One project entry from the v1 projects listing
#[derive(Debug, Clone, Deserialize)]
pub struct ServerProject {
    /// Project key, as used in repository URLs
    pub key: String,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
}

// A repository, normalized across both API generations
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoDescriptor {
    /// Human-readable repository name
    pub name: String,
    /// URL-safe repository identifier
    pub slug: String,
    /// Project key (v1) or workspace (v2) the repository belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    /// Browser URL of the repository
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_url: Option<String>,
    /// HTTP(S) clone URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clone_http: Option<String>,
    /// SSH clone URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clone_ssh: Option<String>,
    /// Default branch, when the provider reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_branch: Option<String>,
}
