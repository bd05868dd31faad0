// src/config.rs
// =============================================================================
// Optional TOML configuration file.
//
// Everything the tool needs can be given on the command line; the config file
// exists so teams can check their backend URL and provider hosts into the
// repo once instead of repeating flags. Flags always override file values.
//
// Rust concepts in this file:
// - serde defaults: a missing section or key falls back per field
// - deny_unknown_fields: typos in the file fail loudly instead of silently
// - anyhow context: errors name the file that caused them
// =============================================================================

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::feedback::link::ScmHosts;
use crate::sync::driver::BUILDING_INDICATOR_DELAY;

// Looked for in the working directory when --config is not given
pub const DEFAULT_CONFIG_FILE: &str = "doc-guardian.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub sync: SyncSection,
    pub catalog: CatalogSection,
    pub feedback: FeedbackSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncSection {
    /// Root URL of the docs backend
    pub base_url: String,
    /// How long a sync may stay silent before the UI shows "building"
    pub building_indicator_ms: u64,
}

impl Default for SyncSection {
    fn default() -> Self {
        SyncSection {
            base_url: "http://localhost:7007/api/docs".to_string(),
            building_indicator_ms: BUILDING_INDICATOR_DELAY.as_millis() as u64,
        }
    }
}

impl SyncSection {
    pub fn indicator_delay(&self) -> Duration {
        Duration::from_millis(self.building_indicator_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogSection {
    /// Root URL of the source-hosting provider, e.g. "https://bitbucket.example.com"
    pub base_url: Option<String>,
    /// Page size requested from the provider
    pub page_limit: u32,
}

impl Default for CatalogSection {
    fn default() -> Self {
        CatalogSection {
            base_url: None,
            page_limit: 25,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeedbackSection {
    /// Hosts treated as GitHub instances
    pub github_hosts: Vec<String>,
    /// Hosts treated as GitLab instances
    pub gitlab_hosts: Vec<String>,
}

impl Default for FeedbackSection {
    fn default() -> Self {
        let hosts = ScmHosts::default();
        FeedbackSection {
            github_hosts: hosts.github_hosts,
            gitlab_hosts: hosts.gitlab_hosts,
        }
    }
}

impl FeedbackSection {
    pub fn hosts(&self) -> ScmHosts {
        ScmHosts {
            github_hosts: self.github_hosts.clone(),
            gitlab_hosts: self.gitlab_hosts.clone(),
        }
    }
}

impl Config {
    // Loads the configuration
    //
    // Three cases:
    // - an explicit path must be readable, anything else is an error
    // - no path given: the default file is used when it exists
    // - no path and no default file: built-in defaults
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    return Ok(Config::default());
                }
                default
            }
        };

        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = toml::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_means_defaults() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(config.sync.base_url, "http://localhost:7007/api/docs");
        assert_eq!(config.sync.building_indicator_ms, 1000);
        assert_eq!(config.catalog.base_url, None);
        assert_eq!(config.catalog.page_limit, 25);
        assert_eq!(config.feedback.github_hosts, vec!["github.com"]);
        assert_eq!(config.feedback.gitlab_hosts, vec!["gitlab.com"]);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let config: Config = toml::from_str(
            r#"
            [sync]
            base_url = "https://portal.example.com/api/docs"
            "#,
        )
        .unwrap();

        assert_eq!(config.sync.base_url, "https://portal.example.com/api/docs");
        assert_eq!(config.sync.building_indicator_ms, 1000);
        assert_eq!(config.catalog.page_limit, 25);
    }

    #[test]
    fn test_full_file_parses_every_section() {
        let config: Config = toml::from_str(
            r#"
            [sync]
            base_url = "https://portal.example.com/api/docs"
            building_indicator_ms = 250

            [catalog]
            base_url = "https://bitbucket.example.com"
            page_limit = 100

            [feedback]
            github_hosts = ["github.com", "git.example.com"]
            gitlab_hosts = []
            "#,
        )
        .unwrap();

        assert_eq!(config.sync.indicator_delay(), Duration::from_millis(250));
        assert_eq!(
            config.catalog.base_url.as_deref(),
            Some("https://bitbucket.example.com")
        );
        assert_eq!(config.catalog.page_limit, 100);
        assert_eq!(config.feedback.github_hosts.len(), 2);
        assert!(config.feedback.gitlab_hosts.is_empty());
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let result: std::result::Result<Config, _> = toml::from_str(
            r#"
            [sync]
            base_uri = "https://typo.example.com"
            "#,
        );

        assert!(result.is_err());
    }

    #[test]
    fn test_explicit_missing_path_is_an_error() {
        let result = Config::load(Some(Path::new("/definitely/not/here.toml")));

        assert!(result.is_err());
    }

    #[test]
    fn test_load_reads_an_explicit_path() {
        let path = std::env::temp_dir().join(format!(
            "doc-guardian-config-test-{}.toml",
            std::process::id()
        ));
        fs::write(&path, "[catalog]\npage_limit = 50\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(config.catalog.page_limit, 50);
    }
}

// =============================================================================
// BEGINNER NOTES
// =============================================================================
//
// 1. How do the serde attributes interact?
//    - #[serde(default)] on the struct: any missing key or whole missing
//      section uses the Default impl for that field
//    - deny_unknown_fields: a key that is not part of the struct is an
//      error, so a typo like "base_uri" cannot be silently ignored
//    - Together: you may write as little of the file as you want, but
//      what you write must be spelled right
//
// 2. Why Option<String> for the catalog base URL?
//    - The sync backend has a sensible localhost default, but there is
//      no sensible default for someone else's Bitbucket instance
//    - None forces the user to provide it via flag or file, with a clear
//      message instead of a connection error to a made-up host
// =============================================================================
