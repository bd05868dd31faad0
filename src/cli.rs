// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// clap is a popular Rust library for parsing command-line arguments.
// We use the "derive" API which lets us define the CLI structure using
// Rust structs and attributes (the #[...] things).
//
// Three subcommands, one per feature area:
// - sync: keep one entity's documentation fresh
// - catalog: discover repositories on a Bitbucket-style provider
// - feedback: build a feedback link for a rendered page
// =============================================================================

use std::path::PathBuf;

use clap::{Parser, Subcommand};

// This struct represents our entire CLI application
//
// #[derive(Parser)] tells clap to automatically generate parsing code
// The #[command(...)] attributes configure how the CLI behaves
#[derive(Parser, Debug)]
#[command(
    name = "doc-guardian",
    version = "0.1.0",
    about = "A CLI tool to keep developer-portal documentation fresh and discover catalog repositories",
    long_about = "doc-guardian talks to a docs backend to keep generated documentation up to date, \
                  lists repositories on a Bitbucket-style source-hosting provider, and builds \
                  feedback links for rendered documentation pages."
)]
pub struct Cli {
    /// Path to a TOML config file (default: doc-guardian.toml when present)
    ///
    /// global = true makes the flag usable after any subcommand too
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    // The #[command(subcommand)] attribute tells clap that this field
    // will hold one of the subcommands defined in the Commands enum
    #[command(subcommand)]
    pub command: Commands,
}

// This enum defines our subcommands (sync, catalog, feedback)
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check an entity's documentation and rebuild it if it is stale
    ///
    /// Example: doc-guardian sync component:default/payments-service
    Sync {
        /// Entity reference: kind:namespace/name (kind and namespace may be omitted)
        entity: String,

        /// Root URL of the docs backend (overrides the config file)
        #[arg(long)]
        base_url: Option<String>,

        /// Documentation page to load while syncing
        #[arg(long, default_value = "index.html")]
        page: String,

        /// Print a final JSON report instead of live progress
        #[arg(long)]
        json: bool,
    },

    /// List repositories on a Bitbucket-style source-hosting provider
    ///
    /// With --project the v1 API is used, with --workspace the v2 API.
    /// With neither, every visible project is enumerated in turn.
    Catalog {
        /// Root URL of the provider (overrides the config file)
        #[arg(long)]
        base_url: Option<String>,

        /// List one project's repositories (v1 generation)
        #[arg(long, conflicts_with = "workspace")]
        project: Option<String>,

        /// List a workspace's repositories (v2 generation)
        #[arg(long)]
        workspace: Option<String>,

        /// Access token for bearer auth (falls back to $BITBUCKET_TOKEN)
        #[arg(long, conflicts_with_all = ["username", "app_password"])]
        token: Option<String>,

        /// Username for basic auth (needs --app-password)
        #[arg(long, requires = "app_password")]
        username: Option<String>,

        /// App password for basic auth (needs --username)
        #[arg(long, requires = "username")]
        app_password: Option<String>,

        /// Page size requested from the provider (overrides the config file)
        #[arg(long)]
        limit: Option<u32>,

        /// Output results in JSON format instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Build a feedback link for a rendered documentation page
    ///
    /// Example: doc-guardian feedback ./site/index.html
    Feedback {
        /// Page to inspect: a local HTML file or an http(s) URL
        page: String,

        /// Output the link as JSON
        #[arg(long)]
        json: bool,
    },
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        // Catches misconfigured args (bad ids in conflicts_with etc.) at test
        // time instead of at first parse
        Cli::command().debug_assert();
    }

    #[test]
    fn test_project_and_workspace_exclude_each_other() {
        let result = Cli::try_parse_from([
            "doc-guardian",
            "catalog",
            "--base-url",
            "https://bitbucket.example.com",
            "--project",
            "DOCS",
            "--workspace",
            "acme",
        ]);

        assert!(result.is_err());
    }

    #[test]
    fn test_username_requires_app_password() {
        let result = Cli::try_parse_from([
            "doc-guardian",
            "catalog",
            "--base-url",
            "https://bitbucket.example.com",
            "--username",
            "reader",
        ]);

        assert!(result.is_err());
    }

    #[test]
    fn test_global_config_flag_works_after_the_subcommand() {
        let cli = Cli::try_parse_from([
            "doc-guardian",
            "sync",
            "my-service",
            "--config",
            "custom.toml",
        ])
        .unwrap();

        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("custom.toml")));
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What does Option<String> mean for a flag?
//    - The flag may be left out entirely; you get None instead of a default
//    - Useful when "not given" means "look in the config file instead"
//
// 2. What do conflicts_with and requires do?
//    - conflicts_with: clap rejects the parse when both flags appear
//    - requires: giving one flag without the other is an error
//    - The names refer to field identifiers, not the --kebab-case flags
//
// 3. Why is --config marked global?
//    - Normally a flag defined on the top-level struct must come before
//      the subcommand name
//    - global = true lets users write it anywhere on the line, which is
//      what everyone expects from a config flag
// -----------------------------------------------------------------------------
