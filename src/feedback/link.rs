// src/feedback/link.rs
// =============================================================================
// Builds a "leave feedback" link for a rendered documentation page.
//
// Rendered pages carry an "Edit this page" anchor pointing at the source file
// on the hosting provider. When that host is a recognized GitHub or GitLab
// instance, we can offer readers a prefilled issue-creation URL instead of
// making them hunt for the right repository. Both pieces of the page we rely
// on (the edit anchor and the top-level h1) are stable output of the docs
// generator across versions.
//
// Rust concepts in this file:
// - Option chaining with the ? operator (bail out early, no error needed)
// - CSS selectors over parsed HTML with the scraper crate
// - Building query strings with url's form-urlencoded serializer
// =============================================================================

use scraper::{Html, Selector};
use serde::Serialize;
use url::Url;

// Host names that identify each provider flavor
//
// Self-hosted instances rarely run on the public host names, so both lists
// are configurable; the defaults cover the hosted products.
#[derive(Debug, Clone)]
pub struct ScmHosts {
    pub github_hosts: Vec<String>,
    pub gitlab_hosts: Vec<String>,
}

impl Default for ScmHosts {
    fn default() -> Self {
        ScmHosts {
            github_hosts: vec!["github.com".to_string()],
            gitlab_hosts: vec!["gitlab.com".to_string()],
        }
    }
}

impl ScmHosts {
    // Matches a URL's host against the configured lists
    pub fn classify(&self, url: &Url) -> Option<ScmProvider> {
        let host = url.host_str()?;
        if self.github_hosts.iter().any(|h| h.eq_ignore_ascii_case(host)) {
            return Some(ScmProvider::GitHub);
        }
        if self.gitlab_hosts.iter().any(|h| h.eq_ignore_ascii_case(host)) {
            return Some(ScmProvider::GitLab);
        }
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScmProvider {
    GitHub,
    GitLab,
}

impl ScmProvider {
    pub fn name(&self) -> &'static str {
        match self {
            ScmProvider::GitHub => "GitHub",
            ScmProvider::GitLab => "GitLab",
        }
    }
}

// A constructed feedback link, ready to render next to the edit anchor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackLink {
    pub provider: ScmProvider,
    /// Title of the page the feedback is about
    pub page_title: String,
    /// The edit URL the link was derived from
    pub edit_url: String,
    /// Issue-creation URL with prefilled title and description
    pub feedback_url: String,
}

// Builds the feedback link for one rendered page
//
// Parameters:
//   html: the rendered page markup
//   hosts: host lists used to recognize the providers
//
// Returns:
//   Some(FeedbackLink), or None when the page has no usable edit anchor,
//   the host is not a recognized provider, or the page title is missing.
//   None is a normal outcome, not an error: the caller simply omits the link.
pub fn feedback_link(html: &str, hosts: &ScmHosts) -> Option<FeedbackLink> {
    let document = Html::parse_document(html);

    let edit_url = edit_link(&document)?;
    let provider = hosts.classify(&edit_url)?;
    let title = page_title(&document)?;

    let repo_path = match provider {
        ScmProvider::GitHub => github_repo_path(&edit_url)?,
        ScmProvider::GitLab => gitlab_repo_path(&edit_url)?,
    };

    let issue_title = format!("Documentation Feedback: {}", title);
    let issue_body = format!("Page source:\n{}\n\nFeedback:", edit_url);

    // origin() drops the path, keeping scheme, host and port
    let origin = edit_url.origin().ascii_serialization();
    let mut issue_url = Url::parse(&format!("{}/{}/issues/new", origin, repo_path)).ok()?;
    {
        // The two products name their prefill parameters differently
        let mut query = issue_url.query_pairs_mut();
        match provider {
            ScmProvider::GitHub => {
                query.append_pair("title", &issue_title);
                query.append_pair("body", &issue_body);
            }
            ScmProvider::GitLab => {
                query.append_pair("issue[title]", &issue_title);
                query.append_pair("issue[description]", &issue_body);
            }
        }
    }

    Some(FeedbackLink {
        provider,
        page_title: title,
        edit_url: edit_url.to_string(),
        feedback_url: issue_url.to_string(),
    })
}

// Finds the edit anchor and parses its target
//
// The title prefix match survives generator updates that add a suffix
// (some themes render 'Edit this page on GitHub').
fn edit_link(document: &Html) -> Option<Url> {
    // Constant selector, known to be valid, so unwrap is safe here
    let selector = Selector::parse(r#"a[title^="Edit this page"]"#).unwrap();

    let anchor = document.select(&selector).next()?;
    let href = anchor.value().attr("href")?.trim();
    if href.is_empty() {
        return None;
    }
    // Relative hrefs fail to parse and drop the link, which is what we want:
    // a relative edit target cannot identify a provider anyway
    Url::parse(href).ok()
}

// Reads the page title from the top-level heading
//
// The generator appends a permalink anchor inside the h1, so we take the
// first non-empty text node rather than the whole text content.
fn page_title(document: &Html) -> Option<String> {
    // Constant selector, known to be valid, so unwrap is safe here
    let selector = Selector::parse("article > h1").unwrap();

    let heading = document.select(&selector).next()?;
    heading
        .children()
        .filter_map(|child| child.value().as_text())
        .map(|text| text.trim())
        .find(|text| !text.is_empty())
        .map(|text| text.to_string())
}

// GitHub edit URLs look like /{owner}/{repo}/edit/{branch}/{path}
fn github_repo_path(edit_url: &Url) -> Option<String> {
    let mut segments = edit_url.path_segments()?;
    let owner = segments.next()?;
    let repo = segments.next()?;
    if owner.is_empty() || repo.is_empty() {
        return None;
    }
    Some(format!("{}/{}", owner, repo))
}

// GitLab edit URLs look like /{group}/.../{project}/-/edit/{branch}/{path}
//
// Everything before the '-' separator is the project path, which keeps
// subgroups intact. Without a separator we fall back to the first two
// segments, like GitHub.
fn gitlab_repo_path(edit_url: &Url) -> Option<String> {
    let segments: Vec<&str> = edit_url.path_segments()?.collect();

    let path: Vec<&str> = match segments.iter().position(|s| *s == "-") {
        Some(index) if index >= 2 => segments[..index].to_vec(),
        _ => segments.into_iter().take(2).collect(),
    };

    if path.len() < 2 || path.iter().any(|s| s.is_empty()) {
        return None;
    }
    Some(path.join("/"))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    // A minimal rendered page in the generator's shape
    fn rendered_page(edit_href: &str) -> String {
        format!(
            concat!(
                "<html><body><article class=\"md-content__inner\">",
                "<a href=\"{href}\" title=\"Edit this page\" class=\"md-content__button\">Edit</a>",
                "<h1>\n  Getting Started\n  ",
                "<a class=\"headerlink\" href=\"#getting-started\">&para;</a></h1>",
                "<p>Welcome.</p>",
                "</article></body></html>"
            ),
            href = edit_href
        )
    }

    // Decodes a link's query string back into key/value pairs
    fn query_of(href: &str) -> HashMap<String, String> {
        Url::parse(href)
            .unwrap()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn test_github_link_targets_the_repository_issue_form() {
        let html = rendered_page("https://github.com/acme/docs-site/edit/main/docs/index.md");

        let link = feedback_link(&html, &ScmHosts::default()).unwrap();

        assert_eq!(link.provider, ScmProvider::GitHub);
        assert_eq!(link.page_title, "Getting Started");
        assert!(link
            .feedback_url
            .starts_with("https://github.com/acme/docs-site/issues/new?"));
        assert_eq!(
            link.edit_url,
            "https://github.com/acme/docs-site/edit/main/docs/index.md"
        );
    }

    #[test]
    fn test_github_params_carry_title_and_body() {
        let html = rendered_page("https://github.com/acme/docs-site/edit/main/docs/index.md");

        let link = feedback_link(&html, &ScmHosts::default()).unwrap();
        let query = query_of(&link.feedback_url);

        assert_eq!(
            query["title"],
            "Documentation Feedback: Getting Started"
        );
        assert_eq!(
            query["body"],
            "Page source:\nhttps://github.com/acme/docs-site/edit/main/docs/index.md\n\nFeedback:"
        );
    }

    #[test]
    fn test_gitlab_params_use_the_issue_prefix() {
        let html =
            rendered_page("https://gitlab.com/acme/handbook/-/edit/main/docs/index.md");

        let link = feedback_link(&html, &ScmHosts::default()).unwrap();
        let query = query_of(&link.feedback_url);

        assert_eq!(link.provider, ScmProvider::GitLab);
        assert!(link
            .feedback_url
            .starts_with("https://gitlab.com/acme/handbook/issues/new?"));
        assert_eq!(
            query["issue[title]"],
            "Documentation Feedback: Getting Started"
        );
        assert!(query["issue[description]"].starts_with("Page source:\n"));
    }

    #[test]
    fn test_gitlab_subgroups_stay_in_the_repo_path() {
        let html = rendered_page(
            "https://gitlab.com/acme/platform/handbook/-/edit/main/docs/index.md",
        );

        let link = feedback_link(&html, &ScmHosts::default()).unwrap();

        assert!(link
            .feedback_url
            .starts_with("https://gitlab.com/acme/platform/handbook/issues/new?"));
    }

    #[test]
    fn test_unrecognized_host_omits_the_link() {
        let html =
            rendered_page("https://bitbucket.example.com/acme/docs/edit/main/index.md");

        assert_eq!(feedback_link(&html, &ScmHosts::default()), None);
    }

    #[test]
    fn test_configured_hosts_recognize_self_hosted_instances() {
        let html = rendered_page(
            "https://git.internal.example.com/acme/docs-site/edit/main/docs/index.md",
        );
        let hosts = ScmHosts {
            github_hosts: vec!["git.internal.example.com".to_string()],
            gitlab_hosts: Vec::new(),
        };

        let link = feedback_link(&html, &hosts).unwrap();

        assert_eq!(link.provider, ScmProvider::GitHub);
        assert!(link
            .feedback_url
            .starts_with("https://git.internal.example.com/acme/docs-site/issues/new?"));
    }

    #[test]
    fn test_missing_anchor_omits_the_link() {
        let html = "<html><body><article><h1>Lonely Page</h1></article></body></html>";

        assert_eq!(feedback_link(html, &ScmHosts::default()), None);
    }

    #[test]
    fn test_empty_or_relative_href_omits_the_link() {
        let empty = rendered_page("");
        let relative = rendered_page("../edit/main/docs/index.md");

        assert_eq!(feedback_link(&empty, &ScmHosts::default()), None);
        assert_eq!(feedback_link(&relative, &ScmHosts::default()), None);
    }

    #[test]
    fn test_missing_title_omits_the_link() {
        let html = concat!(
            "<html><body><article>",
            "<a href=\"https://github.com/acme/docs/edit/main/index.md\" ",
            "title=\"Edit this page\">Edit</a>",
            "<p>No heading here.</p>",
            "</article></body></html>"
        );

        assert_eq!(feedback_link(html, &ScmHosts::default()), None);
    }

    #[test]
    fn test_title_prefix_matches_decorated_anchors() {
        let html = concat!(
            "<html><body><article>",
            "<a href=\"https://github.com/acme/docs/edit/main/index.md\" ",
            "title=\"Edit this page on GitHub\">Edit</a>",
            "<h1>Release Notes<a class=\"headerlink\" href=\"#rn\">&para;</a></h1>",
            "</article></body></html>"
        );

        let link = feedback_link(html, &ScmHosts::default()).unwrap();
        let query = query_of(&link.feedback_url);

        assert_eq!(query["title"], "Documentation Feedback: Release Notes");
    }
}

// =============================================================================
// BEGINNER NOTES
// =============================================================================
//
// 1. Why Option instead of Result here?
//    - A page without an edit anchor is not broken, it just has nothing
//      to offer feedback on
//    - The ? operator works on Option too: any None bails out of the
//      function with None, so the happy path reads top to bottom
//
// 2. Why parse the query with query_pairs_mut()?
//    - Titles and bodies contain spaces, colons and newlines, which must
//      be percent-encoded in a URL
//    - The serializer handles the encoding rules, including '+' for
//      spaces, so we never hand-build escape sequences
//
// 3. Why does the GitLab branch look for a '-' path segment?
//    - GitLab URLs separate the project path from the resource path with
//      a literal '-' segment: /group/sub/project/-/edit/main/file.md
//    - Splitting there keeps nested groups in the repository path, which
//      first-two-segments would truncate
// =============================================================================
