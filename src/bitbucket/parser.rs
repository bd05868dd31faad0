// src/bitbucket/parser.rs
// =============================================================================
// Turns raw repository entries from the provider API into RepoDescriptors.
//
// The parser is a trait so callers can swap in their own mapping (filter by
// naming convention, read extra fields, and so on) without touching the
// pagination machinery. The two implementations here cover the stock
// shapes of the v1 and v2 APIs.
// =============================================================================

use serde_json::Value;

use super::client::CatalogError;
use super::types::RepoDescriptor;

// Maps one raw repository entry to a descriptor
//
// Ok(Some(_)) is a repository worth listing, Ok(None) skips the entry on
// purpose, and Err means the entry was malformed enough that continuing
// would hide real problems.
pub trait RepositoryParser {
    fn parse(&self, raw: &Value) -> Result<Option<RepoDescriptor>, CatalogError>;
}

// Parser for the v1 (self-hosted) repository shape
pub struct ServerRepositoryParser;

impl RepositoryParser for ServerRepositoryParser {
    fn parse(&self, raw: &Value) -> Result<Option<RepoDescriptor>, CatalogError> {
        // Repositories that are archived or mid-import report a state
        // other than AVAILABLE; those are skipped, not failed
        if let Some(state) = raw["state"].as_str() {
            if state != "AVAILABLE" {
                return Ok(None);
            }
        }

        let slug = required_str(raw, "slug")?;
        let name = raw["name"].as_str().unwrap_or(&slug).to_string();
        let project = raw["project"]["key"].as_str().map(str::to_string);
        let web_url = raw["links"]["self"][0]["href"].as_str().map(str::to_string);
        let default_branch = raw["defaultBranch"].as_str().map(str::to_string);
        let (clone_http, clone_ssh) = clone_links(raw);

        Ok(Some(RepoDescriptor {
            name,
            slug,
            project,
            web_url,
            clone_http,
            clone_ssh,
            default_branch,
        }))
    }
}

// Parser for the v2 (cloud) repository shape
pub struct CloudRepositoryParser;

impl RepositoryParser for CloudRepositoryParser {
    fn parse(&self, raw: &Value) -> Result<Option<RepoDescriptor>, CatalogError> {
        let slug = required_str(raw, "slug")?;
        let name = raw["name"].as_str().unwrap_or(&slug).to_string();

        // v2 spells the owning workspace two ways; take whichever is there
        let project = raw["workspace"]["slug"]
            .as_str()
            .map(str::to_string)
            .or_else(|| {
                raw["full_name"]
                    .as_str()
                    .and_then(|full| full.split('/').next())
                    .map(str::to_string)
            });

        let web_url = raw["links"]["html"]["href"].as_str().map(str::to_string);
        let default_branch = raw["mainbranch"]["name"].as_str().map(str::to_string);
        let (clone_http, clone_ssh) = clone_links(raw);

        Ok(Some(RepoDescriptor {
            name,
            slug,
            project,
            web_url,
            clone_http,
            clone_ssh,
            default_branch,
        }))
    }
}

// Reads a string field that the entry cannot do without
fn required_str(raw: &Value, field: &str) -> Result<String, CatalogError> {
    match raw[field].as_str() {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => Err(CatalogError::Parse {
            reason: format!("repository entry is missing '{}'", field),
        }),
    }
}

// Picks the HTTP and SSH clone URLs out of the links.clone array
//
// Both generations use the same array-of-{name, href} shape here; only
// the name varies ("http" on v1, "https" on v2).
fn clone_links(raw: &Value) -> (Option<String>, Option<String>) {
    let mut clone_http = None;
    let mut clone_ssh = None;

    if let Some(clones) = raw["links"]["clone"].as_array() {
        for link in clones {
            let href = match link["href"].as_str() {
                Some(href) => href.to_string(),
                None => continue,
            };
            match link["name"].as_str() {
                Some("http") | Some("https") => clone_http = Some(href),
                Some("ssh") => clone_ssh = Some(href),
                _ => {}
            }
        }
    }

    (clone_http, clone_ssh)
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why Result<Option<T>> instead of Result<T>?
//    - The two layers answer different questions
//    - The Result says "could this entry be understood at all?"
//    - The Option says "understood - but is it one we want to keep?"
//    - Collapsing them would force skips to masquerade as errors
//
// 2. Indexing into serde_json::Value
//    - raw["links"]["clone"] never panics: a missing key or wrong shape
//      just gives Value::Null, and as_str()/as_array() turn that into None
//    - That makes deep optional reads short, at the cost of not knowing
//      which level was missing - fine here, where most fields are optional
// -----------------------------------------------------------------------------
