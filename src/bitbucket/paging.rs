// src/bitbucket/paging.rs
// =============================================================================
// The pagination engines. Both API generations are walked through the same
// contract: a lazy, finite stream of value batches, one batch per provider
// page. Nothing is fetched until the stream is polled, a fetch only happens
// when the previous batch has been consumed, and a finished stream cannot
// be restarted - list again by building a new one.
//
// paginated()       follows the v1 numeric cursor (isLastPage/nextPageStart)
// paginated_cloud() follows the v2 next-page URL
// =============================================================================

use std::future::Future;

use futures::stream::{self, Stream};
use tracing::debug;
use url::Url;

use super::client::CatalogError;
use super::types::{CloudPage, ServerPage};

// Walks a v1 collection, fetching pages until the server says stop
//
// `fetch` is called with the cursor to request: None for the first page,
// then each page's nextPageStart. A page that claims more results but
// carries no cursor ends the stream rather than looping forever.
pub fn paginated<T, F, Fut>(fetch: F) -> impl Stream<Item = Result<Vec<T>, CatalogError>>
where
    F: FnMut(Option<u32>) -> Fut,
    Fut: Future<Output = Result<ServerPage<T>, CatalogError>>,
{
    // State threads the cursor and the fetch function through the stream:
    // the outer Option is "are we done", the inner one is the cursor itself
    stream::try_unfold((Some(None), fetch), |(cursor, mut fetch)| async move {
        let start = match cursor {
            Some(start) => start,
            None => return Ok(None),
        };

        let page = fetch(start).await?;
        let next = if page.is_last_page {
            None
        } else {
            match page.next_page_start {
                Some(next) => Some(Some(next)),
                None => {
                    debug!("page claims more results but has no cursor; stopping");
                    None
                }
            }
        };

        Ok(Some((page.values, (next, fetch))))
    })
}

// Walks a v2 collection, following each page's `next` URL
//
// `first` is the URL of the opening request; every later request uses the
// URL the previous page handed back. A page whose `next` turns out to be
// malformed is still delivered in full; the error surfaces only when the
// following page is actually requested.
pub fn paginated_cloud<T, F, Fut>(
    first: Url,
    fetch: F,
) -> impl Stream<Item = Result<Vec<T>, CatalogError>>
where
    F: FnMut(Url) -> Fut,
    Fut: Future<Output = Result<CloudPage<T>, CatalogError>>,
{
    stream::try_unfold(
        (Some(first.to_string()), fetch),
        |(next, mut fetch)| async move {
            let target = match next {
                Some(target) => target,
                None => return Ok(None),
            };

            let url = Url::parse(&target).map_err(|e| CatalogError::Decode {
                url: target.clone(),
                reason: format!("invalid next-page URL: {}", e),
            })?;

            let page = fetch(url).await?;
            Ok(Some((page.values, (page.next, fetch))))
        },
    )
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What is try_unfold?
//    - It builds a stream from a seed state and a closure
//    - Each call gets the state, does its async work, and returns the next
//      item plus the next state - or None to end the stream
//    - Returning Err(e) emits the error and ends the stream
//
// 2. Why the where clause with F and Fut?
//    - The fetch function is generic so the engine works for any value
//      type and any caller (real HTTP in production, closures in tests)
//    - FnMut(Option<u32>) -> Fut says "callable many times, each call
//      returns a future"; Fut's bound says what that future must produce
//
// 3. Why does the closure take ownership of `fetch` and give it back?
//    - A stream cannot borrow from the closure that builds it, so the
//      fetch function rides along inside the stream's own state instead
// -----------------------------------------------------------------------------
