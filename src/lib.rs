//! Equilink admin: the data core of the marketplace's back-office dashboard.
//!
//! The crate lists, searches, paginates and mutates the marketplace's
//! collections (categories, posts, businesses, services, events, feedback,
//! subscribers, customers) over a PostgREST-style backend:
//! - Paginated listings with an exact total count
//! - Case-insensitive substring search per resource
//! - Two-level category trees (categories with their subcategories)
//! - Insert, update and batch delete with cache invalidation
//! - Dashboard counters and recent-activity feeds
//! - An email/password sign-in with a single-admin gate

#![allow(clippy::multiple_crate_versions)]

//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  CLI shim (main.rs, cli.rs)                         │  ← Entry point
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Runtime (runtime.rs)                               │  ← Event loop
//! │  Application Layer (app/)                           │  ← Grid state
//! │  - Event handling, debounced search                 │
//! │  - Selection, expansion, client-side sort/filter    │
//! │  - View model computation                           │
//! └─────────────────────────────────────────────────────┘
//!         │                    │                    │
//! ┌───────────────┐   ┌───────────────┐   ┌───────────────┐
//! │ UI (ui/)      │   │ Listing       │   │ Worker        │
//! │ - View models │   │ (listing/)    │   │ (worker/)     │
//! │ - Tables      │   │ - Query plans │   │ - Query cache │
//! │               │   │ - Mutations   │   │ - Invalidation│
//! └───────────────┘   └───────────────┘   └───────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────┐
//! │  Client (client/)        Auth (auth.rs)             │
//! │  - PostgREST over HTTP   - Sign-in, admin gate      │
//! │  - In-memory backend                                │
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Domain (domain/), Infrastructure, Observability    │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Configuration
//!
//! Configuration is a TOML file (see [`Config`]) with `EQUILINK_*`
//! environment overrides:
//!
//! ```toml
//! backend_url = "https://project.supabase.co"
//! anon_key = "public-anon-key"
//! admin_email = "admin@equilinkapp.com"
//! page_size = 8
//! search_debounce_ms = 300
//! trace_level = "equilink_admin=debug"
//! ```
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use chrono::Utc;
//! use equilink_admin::client::MemoryBackend;
//! use equilink_admin::domain::{Record, Resource};
//! use equilink_admin::{Config, Dashboard, Event};
//!
//! let backend = MemoryBackend::new();
//! backend.seed(
//!     Resource::Subscribers,
//!     vec![Record::new("s1", Utc::now()).with_field("user_id", "u1").with_field("business_id", "b1")],
//! )?;
//!
//! let mut dashboard = Dashboard::new(Arc::new(backend), &Config::default(), Resource::Subscribers)?;
//! dashboard.dispatch(Event::Load)?;
//! dashboard.settle(Duration::from_secs(5))?;
//!
//! assert_eq!(dashboard.state().total(), Some(1));
//! # Ok::<(), equilink_admin::AdminError>(())
//! ```

pub mod app;
pub mod auth;
pub mod cache;
pub mod cli;
pub mod client;
pub mod domain;
pub mod infrastructure;
pub mod listing;
pub mod observability;
pub mod runtime;
pub mod ui;
pub mod worker;

pub use app::{handle_event, Action, Event, GridState};
pub use domain::{AdminError, Record, Resource, Result};
pub use runtime::Dashboard;

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use client::ResourceClient;

/// Dashboard configuration.
///
/// Every field has a default, so an empty file is valid. Remote access needs
/// both `backend_url` and `anon_key`; see [`Config::validate_remote`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Base URL of the backend project, without the `/rest/v1` suffix.
    pub backend_url: Option<String>,

    /// Public anonymous API key sent as `apikey` on every request.
    pub anon_key: Option<String>,

    /// The only account allowed past sign-in.
    pub admin_email: String,

    /// Rows per page. Default: 8
    pub page_size: u64,

    /// Quiet period after the last keystroke before a search is sent.
    pub search_debounce_ms: u64,

    /// Paginate search results on resources that return every match by
    /// default.
    pub paginate_search: bool,

    /// Maximum number of cached query results.
    pub cache_capacity: u64,

    /// Per-request HTTP timeout.
    pub request_timeout_secs: u64,

    /// `EnvFilter` directives, e.g. `info` or `equilink_admin=debug`.
    pub trace_level: Option<String>,

    /// Where trace files go; `~` is expanded. Defaults to the XDG data dir.
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: None,
            anon_key: None,
            admin_email: "admin@equilinkapp.com".to_string(),
            page_size: 8,
            search_debounce_ms: 300,
            paginate_search: false,
            cache_capacity: 256,
            request_timeout_secs: 30,
            trace_level: None,
            data_dir: None,
        }
    }
}

impl Config {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Config`] for malformed TOML or unknown keys.
    ///
    /// ```
    /// use equilink_admin::Config;
    ///
    /// let config = Config::from_toml_str("page_size = 20").unwrap();
    /// assert_eq!(config.page_size, 20);
    /// assert_eq!(config.search_debounce_ms, 300);
    /// ```
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| AdminError::Config(e.to_string()))
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Io`] when the file cannot be read and
    /// [`AdminError::Config`] when it does not parse.
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source).map_err(|e| match e {
            AdminError::Config(message) => AdminError::Config(format!("{}: {message}", path.display())),
            other => other,
        })
    }

    /// Loads `path` if given, else the default config file if it exists,
    /// else the defaults. Environment overrides are applied last.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be read or parsed.
    pub fn discover(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::load(path)?,
            None => match infrastructure::default_config_path().filter(|p| p.is_file()) {
                Some(path) => Self::load(&path)?,
                None => Self::default(),
            },
        };
        Ok(config.with_env_overrides())
    }

    /// Applies `EQUILINK_BACKEND_URL`, `EQUILINK_ANON_KEY`,
    /// `EQUILINK_ADMIN_EMAIL` and `EQUILINK_TRACE_LEVEL`.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok().filter(|v| !v.trim().is_empty()))
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup("EQUILINK_BACKEND_URL") {
            self.backend_url = Some(url);
        }
        if let Some(key) = lookup("EQUILINK_ANON_KEY") {
            self.anon_key = Some(key);
        }
        if let Some(email) = lookup("EQUILINK_ADMIN_EMAIL") {
            self.admin_email = email;
        }
        if let Some(level) = lookup("EQUILINK_TRACE_LEVEL") {
            self.trace_level = Some(level);
        }
        self
    }

    /// Resolved data directory: `data_dir` when set, else
    /// [`get_data_dir`](infrastructure::get_data_dir).
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.as_ref().map_or_else(infrastructure::get_data_dir, |dir| {
            PathBuf::from(infrastructure::expand_tilde(&dir.to_string_lossy()))
        })
    }

    /// Returns the backend URL and anonymous key.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Config`] when either is missing or blank, or
    /// the URL is not http(s).
    pub fn validate_remote(&self) -> Result<(&str, &str)> {
        let url = self
            .backend_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| AdminError::Config("backend_url is not set".to_string()))?;
        let key = self
            .anon_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| AdminError::Config("anon_key is not set".to_string()))?;

        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(AdminError::Config(format!("backend_url must be http(s): {url}")));
        }
        Ok((url, key))
    }
}

/// Installs tracing and opens a dashboard on `resource`.
///
/// # Errors
///
/// Returns an error if the query worker cannot be started.
pub fn initialize(config: &Config, client: Arc<dyn ResourceClient>, resource: Resource) -> Result<Dashboard> {
    observability::init_tracing(config);
    tracing::debug!(%resource, "initializing equilink admin dashboard");
    Dashboard::new(client, config, resource)
}
