// src/bitbucket/client.rs
// =============================================================================
// The HTTP client for Bitbucket-style providers.
//
// One client instance serves both API generations:
// - v1 (self-hosted): rest/api/1.0/projects and .../projects/{KEY}/repos,
//   paginated with start/limit cursors
// - v2 (cloud): 2.0/repositories/{workspace}, paginated with next-page URLs
//
// Listings come back as the lazy batch streams built in paging.rs. Raw
// repository entries are left as JSON values on purpose: mapping them to
// descriptors is the parser's job, and callers may bring their own.
// =============================================================================

use std::time::Duration;

use futures::stream::Stream;
use reqwest::header::LINK;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use url::Url;

use super::paging;
use super::types::{CloudPage, ServerPage, ServerProject};

// Why a catalog operation failed
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid provider URL: {0}")]
    BaseUrl(String),
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered HTTP {status}")]
    Http { status: u16, url: String },
    #[error("could not decode the response from {url}: {reason}")]
    Decode { url: String, reason: String },
    #[error("could not parse a repository entry: {reason}")]
    Parse { reason: String },
}

// How to authenticate against the provider
#[derive(Debug, Clone)]
pub enum Auth {
    // No credentials; only public resources are visible
    Anonymous,
    // Username plus app password, sent as HTTP basic auth
    Basic { username: String, app_password: String },
    // Personal access token, sent as a bearer header
    Token(String),
}

#[derive(Debug)]
pub struct BitbucketClient {
    client: Client,
    base_url: Url,
    auth: Auth,
    page_limit: u32,
}

impl BitbucketClient {
    // Builds a client for one provider instance
    //
    // Parameters:
    //   base_url: root of the provider, e.g. "https://bitbucket.example.com"
    //   auth: credentials to send with every request
    //   page_limit: page size hint passed to the provider
    pub fn new(base_url: &str, auth: Auth, page_limit: u32) -> Result<Self, CatalogError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| CatalogError::BaseUrl(format!("{}: {}", base_url, e)))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Ok(BitbucketClient { client, base_url, auth, page_limit })
    }

    // Lists every project visible to the credentials, one page per item
    //
    // The stream is lazy and finite; to list again, call this method again.
    pub fn projects(
        &self,
    ) -> Result<impl Stream<Item = Result<Vec<ServerProject>, CatalogError>> + '_, CatalogError>
    {
        let url = self.api_url("rest/api/1.0/projects")?;
        Ok(paging::paginated(move |start| {
            self.get_server_page(url.clone(), start)
        }))
    }

    // Lists one project's repositories (v1 API), one page per item
    //
    // Entries are raw JSON values; apply a RepositoryParser to map them.
    pub fn repositories<'a>(
        &'a self,
        project_key: &str,
    ) -> Result<impl Stream<Item = Result<Vec<Value>, CatalogError>> + 'a, CatalogError> {
        let url = self.api_url(&format!("rest/api/1.0/projects/{}/repos", project_key))?;
        Ok(paging::paginated(move |start| {
            self.get_server_page(url.clone(), start)
        }))
    }

    // Lists a workspace's repositories (v2 API), one page per item
    pub fn cloud_repositories<'a>(
        &'a self,
        workspace: &str,
    ) -> Result<impl Stream<Item = Result<Vec<Value>, CatalogError>> + 'a, CatalogError> {
        let mut first = self.api_url(&format!("2.0/repositories/{}", workspace))?;
        first
            .query_pairs_mut()
            .append_pair("pagelen", &self.page_limit.to_string());

        Ok(paging::paginated_cloud(first, move |url| {
            self.get_cloud_page(url)
        }))
    }

    // Joins the base URL with an endpoint path
    fn api_url(&self, path: &str) -> Result<Url, CatalogError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{}/{}", base, path))
            .map_err(|e| CatalogError::BaseUrl(format!("{}/{}: {}", base, path, e)))
    }

    // Attaches the configured credentials to a request
    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            Auth::Anonymous => request,
            Auth::Basic { username, app_password } => {
                request.basic_auth(username, Some(app_password))
            }
            Auth::Token(token) => request.bearer_auth(token),
        }
    }

    // Fetches one v1 page, appending the cursor and page-size parameters
    async fn get_server_page<T: DeserializeOwned>(
        &self,
        mut url: Url,
        start: Option<u32>,
    ) -> Result<ServerPage<T>, CatalogError> {
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("limit", &self.page_limit.to_string());
            if let Some(start) = start {
                query.append_pair("start", &start.to_string());
            }
        }
        debug!("fetching {}", url);

        let response = self
            .authed(self.client.get(url.clone()))
            .send()
            .await
            .map_err(|e| CatalogError::Transport { url: url.to_string(), source: e })?;
        let response = check_status(response)?;

        response.json::<ServerPage<T>>().await.map_err(|e| CatalogError::Decode {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    // Fetches one v2 page; the URL arrives ready-made from the pager
    async fn get_cloud_page(&self, url: Url) -> Result<CloudPage<Value>, CatalogError> {
        debug!("fetching {}", url);

        let response = self
            .authed(self.client.get(url.clone()))
            .send()
            .await
            .map_err(|e| CatalogError::Transport { url: url.to_string(), source: e })?;
        let response = check_status(response)?;

        // Some deployments put the next-page URL in a Link header instead
        // of the body; read it before the body consumes the response
        let link_next = next_from_link_header(&response);

        let mut page = response.json::<CloudPage<Value>>().await.map_err(|e| {
            CatalogError::Decode { url: url.to_string(), reason: e.to_string() }
        })?;

        if page.next.is_none() {
            page.next = link_next;
        }
        Ok(page)
    }
}

// Accepts 2xx responses, maps everything else to an HTTP error
fn check_status(response: Response) -> Result<Response, CatalogError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(CatalogError::Http {
            status: status.as_u16(),
            url: response.url().to_string(),
        })
    }
}

// Extracts the rel="next" target from a Link header value
//
// Example value:
//   <https://api.example.com/2.0/repositories/acme?page=2>; rel="next"
fn next_from_link_header(response: &Response) -> Option<String> {
    let header = response.headers().get(LINK)?.to_str().ok()?;

    for part in header.split(',') {
        let mut pieces = part.split(';');
        let target = pieces.next().unwrap_or("").trim();
        let is_next = pieces.any(|piece| {
            let piece = piece.trim();
            piece.eq_ignore_ascii_case("rel=\"next\"") || piece.eq_ignore_ascii_case("rel=next")
        });

        if is_next && target.starts_with('<') && target.ends_with('>') {
            return Some(target[1..target.len() - 1].to_string());
        }
    }
    None
}
