// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Load the optional TOML config file (flags win over file values)
// 3. Dispatch to the appropriate subcommand handler
// 4. Exit with proper code (0 = success, 1 = findings, 2 = error)
//
// Rust concepts used:
// - async/await: The sync conversation and the catalog walks are all I/O
// - Result<T, E>: For error handling (T = success type, E = error type)
// - match: Pattern matching to handle different subcommands
// =============================================================================

// Module declarations - tells Rust about our other source files
mod bitbucket;     // src/bitbucket/ - repository discovery on the provider
mod cli;           // src/cli.rs - command-line parsing
mod config;        // src/config.rs - optional TOML configuration
mod entity;        // src/entity.rs - entity reference parsing
mod feedback;      // src/feedback/ - feedback links for rendered pages
mod sync;          // src/sync/ - documentation freshness tracking

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use futures::{pin_mut, Stream, TryStreamExt};
use serde::Serialize;
use serde_json::Value;
use tracing_subscriber::EnvFilter;
use url::Url;

use bitbucket::client::{Auth, BitbucketClient, CatalogError};
use bitbucket::parser::{CloudRepositoryParser, RepositoryParser, ServerRepositoryParser};
use bitbucket::types::RepoDescriptor;
use cli::{Cli, Commands};
use config::Config;
use entity::EntityRef;
use feedback::link::feedback_link;
use sync::content::ContentDocs;
use sync::driver::{spawn_sync, SyncTracker};
use sync::http::{DocsBackend, HttpEntityDocs};
use sync::state::{SyncAction, SyncState};
use sync::status::{derive_status, DocsStatus};

// The #[tokio::main] attribute transforms our async main into a real main function
// It creates a tokio runtime and runs our async code inside it
#[tokio::main]
async fn main() {
    // Diagnostics go to stderr so stdout stays clean for results;
    // RUST_LOG=debug turns on the noisy details
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Run our application logic and capture the exit code
    // std::process::exit() terminates the program with the given code
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            // If an unexpected error occurred, print it and exit with code 2
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// This is the main application logic
// Returns:
//   Ok(0) = success
//   Ok(1) = findings (stale or missing docs, no feedback link)
//   Err = unexpected error (becomes exit code 2)
async fn run() -> Result<i32> {
    // Parse command-line arguments into our Cli struct
    // This will automatically handle --help, --version, etc.
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?;

    // Match on which subcommand was used
    match cli.command {
        Commands::Sync { entity, base_url, page, json } => {
            handle_sync(&config, &entity, base_url.as_deref(), &page, json).await
        }
        Commands::Catalog {
            base_url,
            project,
            workspace,
            token,
            username,
            app_password,
            limit,
            json,
        } => {
            let auth = resolve_auth(token, username, app_password);
            handle_catalog(
                &config,
                base_url.as_deref(),
                project.as_deref(),
                workspace.as_deref(),
                auth,
                limit,
                json,
            )
            .await
        }
        Commands::Feedback { page, json } => handle_feedback(&config, &page, json).await,
    }
}

// Final report for `sync --json`
#[derive(Serialize)]
struct SyncReport<'a> {
    entity: &'a EntityRef,
    status: DocsStatus,
    sync: &'a SyncState,
}

// Handles the 'sync' subcommand
//
// Runs one full sync conversation for the entity: load the current page,
// ask the backend to bring the docs up to date, and print every display
// status the viewer would move through along the way.
//
// Parameters:
//   entity_arg: entity reference string, e.g. "component:default/payments"
//   base_url: docs backend root from the flag, if given
//   page: which rendered page to load while syncing
//   json: whether to print a final JSON report instead of live progress
async fn handle_sync(
    config: &Config,
    entity_arg: &str,
    base_url: Option<&str>,
    page: &str,
    json: bool,
) -> Result<i32> {
    let entity: EntityRef = entity_arg.parse()?;

    let base = base_url.unwrap_or(&config.sync.base_url);
    let base = Url::parse(base).with_context(|| format!("Invalid docs backend URL: {}", base))?;

    if !json {
        println!("🔍 Syncing docs for {}", entity);
    }

    let backend = Arc::new(DocsBackend::new(base));
    let mut content = HttpEntityDocs::new(backend.clone(), entity.clone(), page);
    let mut tracker = SyncTracker::new();

    // The conversation runs in its own task; we watch its actions here
    let mut actions = spawn_sync(backend, entity.clone(), config.sync.indicator_delay());

    // First content load, so early statuses are derived against a settled
    // snapshot instead of a permanent "loading"
    content.resolve().await;
    let mut last_shown = None;
    observe(&tracker, &content, &mut last_shown, json);

    while let Some(action) = actions.recv().await {
        if !json {
            if let SyncAction::Building { line: Some(line) } = &action {
                println!("   📝 {}", line);
            }
        }
        tracker.apply(action);
        settle(&mut tracker, &mut content).await;
        observe(&tracker, &content, &mut last_shown, json);
    }

    let status = derive_status(&content.state(), tracker.state());

    if json {
        let report = SyncReport {
            entity: &entity,
            status,
            sync: tracker.state(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if let Some(error) = &tracker.state().error {
        println!("   ⚠️  {}", error);
    }

    // CONTENT_FRESH is the one good resting state; everything else means
    // the reader is not seeing current docs
    Ok(if status == DocsStatus::ContentFresh { 0 } else { 1 })
}

// Lets the tracker and the content fetch react to each other until
// neither side has anything left to do
async fn settle(tracker: &mut SyncTracker, content: &mut HttpEntityDocs) {
    loop {
        tracker.reconcile(content);
        if content.needs_resolve() {
            content.resolve().await;
        } else {
            break;
        }
    }
}

// Prints the display status when it changes between observations
fn observe(
    tracker: &SyncTracker,
    content: &HttpEntityDocs,
    last_shown: &mut Option<DocsStatus>,
    json: bool,
) {
    let status = derive_status(&content.state(), tracker.state());
    if *last_shown != Some(status) {
        *last_shown = Some(status);
        if !json {
            println!("{}", format_status(status));
        }
    }
}

// Formats the derived display status as a labeled line
fn format_status(status: DocsStatus) -> &'static str {
    match status {
        DocsStatus::Checking => "🔍 CHECKING - looking for updates",
        DocsStatus::InitialBuild => "🏗️  INITIAL_BUILD - building these docs for the first time",
        DocsStatus::ContentStaleRefreshing => {
            "♻️  CONTENT_STALE_REFRESHING - newer docs are building"
        }
        DocsStatus::ContentStaleReady => "🔄 CONTENT_STALE_READY - newer docs are ready to load",
        DocsStatus::ContentStaleError => {
            "⚠️  CONTENT_STALE_ERROR - refresh failed, showing the old copy"
        }
        DocsStatus::ContentNotFound => "❌ CONTENT_NOT_FOUND - no docs exist for this entity",
        DocsStatus::ContentFresh => "✅ CONTENT_FRESH - docs are up to date",
    }
}

// Handles the 'catalog' subcommand
//
// Parameters:
//   base_url: provider root from the flag, if given
//   project: list one project's repositories (v1 API)
//   workspace: list a workspace's repositories (v2 API)
//   auth: resolved credentials
//   limit: page size from the flag, if given
//   json: whether to output JSON format
async fn handle_catalog(
    config: &Config,
    base_url: Option<&str>,
    project: Option<&str>,
    workspace: Option<&str>,
    auth: Auth,
    limit: Option<u32>,
    json: bool,
) -> Result<i32> {
    let base = base_url
        .or(config.catalog.base_url.as_deref())
        .context("No provider URL: pass --base-url or set [catalog] base_url in the config file")?;
    let page_limit = limit.unwrap_or(config.catalog.page_limit);

    let client = BitbucketClient::new(base, auth, page_limit)?;

    let repos = if let Some(workspace) = workspace {
        if !json {
            println!("🔍 Listing repositories in workspace {}", workspace);
        }
        collect_repositories(client.cloud_repositories(workspace)?, &CloudRepositoryParser).await?
    } else if let Some(project) = project {
        if !json {
            println!("🔍 Listing repositories in project {}", project);
        }
        collect_repositories(client.repositories(project)?, &ServerRepositoryParser).await?
    } else {
        if !json {
            println!("🔍 Listing repositories in every visible project");
        }

        // Project keys are collected up front so each project's listing
        // arrives as one block
        let mut keys = Vec::new();
        {
            let projects = client.projects()?;
            pin_mut!(projects);
            while let Some(page) = projects.try_next().await? {
                keys.extend(page.into_iter().map(|project| project.key));
            }
        }

        let mut repos = Vec::new();
        for key in keys {
            let batch =
                collect_repositories(client.repositories(&key)?, &ServerRepositoryParser).await?;
            if !json {
                println!("   📁 {}: {} repositories", key, batch.len());
            }
            repos.extend(batch);
        }
        repos
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&repos)?);
    } else {
        print_repositories(&repos);
    }

    Ok(0)
}

// Drains one repository stream, mapping raw entries through the parser
//
// Entries the parser skips (archived or otherwise unavailable) are dropped.
async fn collect_repositories<S>(
    stream: S,
    parser: &dyn RepositoryParser,
) -> Result<Vec<RepoDescriptor>, CatalogError>
where
    S: Stream<Item = Result<Vec<Value>, CatalogError>>,
{
    pin_mut!(stream);

    let mut repos = Vec::new();
    while let Some(page) = stream.try_next().await? {
        for raw in &page {
            if let Some(repo) = parser.parse(raw)? {
                repos.push(repo);
            }
        }
    }
    Ok(repos)
}

// Picks the auth scheme from the flags, falling back to $BITBUCKET_TOKEN
fn resolve_auth(
    token: Option<String>,
    username: Option<String>,
    app_password: Option<String>,
) -> Auth {
    if let Some(token) = token {
        return Auth::Token(token);
    }
    if let (Some(username), Some(app_password)) = (username, app_password) {
        return Auth::Basic { username, app_password };
    }
    match std::env::var("BITBUCKET_TOKEN") {
        Ok(token) if !token.is_empty() => Auth::Token(token),
        _ => Auth::Anonymous,
    }
}

// Prints repositories as a human-readable table in the terminal
fn print_repositories(repos: &[RepoDescriptor]) {
    if repos.is_empty() {
        println!("⚠️  No repositories found");
        return;
    }

    // Print table header
    println!("{:<30} {:<12} {:<45}", "SLUG", "PROJECT", "URL");
    println!("{}", "=".repeat(88));

    for repo in repos {
        let project = repo.project.as_deref().unwrap_or("-");

        // Truncate URL if too long for display
        let url = match repo.web_url.as_deref() {
            Some(url) if url.len() > 42 => format!("{}...", &url[..42]),
            Some(url) => url.to_string(),
            None => "-".to_string(),
        };

        println!("{:<30} {:<12} {:<45}", repo.slug, project, url);
    }

    println!();

    // Print summary
    let with_branch = repos.iter().filter(|r| r.default_branch.is_some()).count();

    println!("📊 Summary:");
    println!("   📦 Repositories: {}", repos.len());
    println!("   🌿 With a default branch: {}", with_branch);
}

// Handles the 'feedback' subcommand
//
// Parameters:
//   page: local HTML file path, or an http(s) URL to fetch
//   json: whether to output the link as JSON
async fn handle_feedback(config: &Config, page: &str, json: bool) -> Result<i32> {
    let html = load_page(page).await?;
    let hosts = config.feedback.hosts();

    let link = feedback_link(&html, &hosts);

    if json {
        // Serializes to null when no link applies
        println!("{}", serde_json::to_string_pretty(&link)?);
    }

    match link {
        Some(link) => {
            if !json {
                println!("✅ Feedback link ({})", link.provider.name());
                println!("   📄 Page:  {}", link.page_title);
                println!("   ✏️  Edit:  {}", link.edit_url);
                println!("   🔗 Issue: {}", link.feedback_url);
            }
            Ok(0)
        }
        None => {
            if !json {
                println!("⚠️  No feedback link applies to this page");
            }
            Ok(1)
        }
    }
}

// Loads the page markup from a local file or over HTTP
async fn load_page(page: &str) -> Result<String> {
    if page.starts_with("http://") || page.starts_with("https://") {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        let response = client
            .get(page)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", page))?;
        if !response.status().is_success() {
            anyhow::bail!("{} answered HTTP {}", page, response.status().as_u16());
        }
        response
            .text()
            .await
            .with_context(|| format!("Failed to read the response from {}", page))
    } else {
        std::fs::read_to_string(page).with_context(|| format!("Failed to read {}", page))
    }
}
