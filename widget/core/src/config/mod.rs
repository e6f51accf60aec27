//! Widget Configuration
//!
//! Centralized configuration loading for the widget, supporting a TOML file
//! at `~/.config/bookchat/widget.toml`.
//!
//! # Configuration Priority
//!
//! Values are layered with the following priority (highest first):
//! 1. Embedding options (CLI arguments or the host's embed call)
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [widget]
//! api_url = "https://books.example.com/api/chat"
//! widget_title = "Book Buddy"
//! description_budget = 80
//!
//! [affiliate]
//! amazon_tag = "bookgpt-20"
//!
//! [analytics]
//! endpoint = "https://books.example.com/api/track"
//! enabled = true
//!
//! [host]
//! hostname = "books.example.com"
//! origin = "https://books.example.com"
//! ```
//!
//! # Endpoint Detection
//!
//! When no `api_url` is configured the endpoint is derived from the host:
//! a local host talks to the development backend on port 8005, anything else
//! uses `/api/chat` on its own origin. Without an origin there is nothing to
//! resolve against and the widget reports a configuration error.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::WidgetError;
use crate::render::RenderOptions;

/// Origin of the backend on a local development machine
pub const LOCAL_ORIGIN: &str = "http://localhost:8005";

/// Endpoint used when the host is a local development machine
pub const LOCAL_CHAT_ENDPOINT: &str = "http://localhost:8005/api/chat";

/// Chat path on a deployed host's origin
pub const DEPLOYED_CHAT_PATH: &str = "/api/chat";

/// Analytics path on a deployed host's origin
pub const DEFAULT_ANALYTICS_PATH: &str = "/api/track";

/// Default marketplace affiliate tag
pub const DEFAULT_AFFILIATE_TAG: &str = "bookgpt-20";

/// Default header title
pub const DEFAULT_WIDGET_TITLE: &str = "Book Buddy";

/// Default description budget in characters
pub const DEFAULT_DESCRIPTION_BUDGET: usize = 80;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where the chat endpoint came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument or embed call
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value (endpoint detection)
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// `[widget]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetSectionToml {
    /// Chat endpoint
    pub api_url: Option<String>,
    /// Header title
    pub widget_title: Option<String>,
    /// Description budget in characters
    pub description_budget: Option<usize>,
    /// Request timeout in seconds (absent = no timeout)
    pub request_timeout_secs: Option<u64>,
}

/// `[affiliate]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AffiliateToml {
    /// Marketplace affiliate tag
    pub amazon_tag: Option<String>,
}

/// `[analytics]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsToml {
    /// Sink URL
    pub endpoint: Option<String>,
    /// Whether analytics events are posted
    pub enabled: Option<bool>,
}

/// `[host]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HostToml {
    /// Hostname of the embedding page
    pub hostname: Option<String>,
    /// Origin of the embedding page (`scheme://host[:port]`)
    pub origin: Option<String>,
}

/// Root of the TOML file
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetToml {
    /// `[widget]`
    pub widget: WidgetSectionToml,
    /// `[affiliate]`
    pub affiliate: AffiliateToml,
    /// `[analytics]`
    pub analytics: AnalyticsToml,
    /// `[host]`
    pub host: HostToml,
}

// =============================================================================
// Resolved Configuration
// =============================================================================

/// Where the widget is embedded
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HostEnvironment {
    /// Hostname (e.g. `localhost`, `books.example.com`)
    pub hostname: Option<String>,
    /// Origin used to resolve relative endpoints
    pub origin: Option<String>,
}

impl HostEnvironment {
    /// A local development host
    ///
    /// Relative endpoints resolve against the local backend.
    #[must_use]
    pub fn localhost() -> Self {
        Self {
            hostname: Some("localhost".to_string()),
            origin: Some(LOCAL_ORIGIN.to_string()),
        }
    }

    /// A deployed host served from `origin`
    ///
    /// The hostname is taken from the origin when it parses.
    pub fn deployed(origin: impl Into<String>) -> Self {
        let origin = origin.into();
        let hostname = url::Url::parse(&origin)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string));
        Self {
            hostname,
            origin: Some(origin),
        }
    }

    /// Whether the host is a local development machine
    #[must_use]
    pub fn is_local(&self) -> bool {
        matches!(self.hostname.as_deref(), Some("localhost" | "127.0.0.1"))
    }

    /// Resolve an absolute or origin-relative URL
    fn resolve(&self, target: &str) -> Result<String, String> {
        if let Ok(absolute) = url::Url::parse(target) {
            return Ok(absolute.to_string());
        }
        let origin = self
            .origin
            .as_deref()
            .ok_or_else(|| format!("no host origin to resolve '{target}' against"))?;
        let base = url::Url::parse(origin).map_err(|e| format!("invalid host origin '{origin}': {e}"))?;
        base.join(target)
            .map(|u| u.to_string())
            .map_err(|e| format!("cannot resolve '{target}' against '{origin}': {e}"))
    }
}

/// Fully layered widget configuration
#[derive(Clone, Debug)]
pub struct WidgetConfig {
    /// Chat endpoint override (absent = endpoint detection)
    pub api_url: Option<String>,
    /// Marketplace affiliate tag
    pub amazon_affiliate_tag: String,
    /// Header title
    pub widget_title: String,
    /// Analytics sink override (absent = `/api/track` on the host origin)
    pub analytics_endpoint: Option<String>,
    /// Whether analytics events are posted
    pub enable_analytics: bool,
    /// Description budget in characters
    pub description_budget: usize,
    /// Optional request timeout for the chat transport
    pub request_timeout: Option<Duration>,
    /// Embedding host
    pub host: HostEnvironment,
    /// Where the chat endpoint came from
    source: ConfigSource,
    /// Path of the loaded config file, if any
    config_file_path: Option<PathBuf>,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            amazon_affiliate_tag: DEFAULT_AFFILIATE_TAG.to_string(),
            widget_title: DEFAULT_WIDGET_TITLE.to_string(),
            analytics_endpoint: None,
            enable_analytics: true,
            description_budget: DEFAULT_DESCRIPTION_BUDGET,
            request_timeout: None,
            host: HostEnvironment::default(),
            source: ConfigSource::Default,
            config_file_path: None,
        }
    }
}

impl WidgetConfig {
    /// Configuration with an explicit endpoint and defaults for the rest
    pub fn with_endpoint(api_url: impl Into<String>) -> Self {
        Self {
            api_url: Some(api_url.into()),
            source: ConfigSource::Cli,
            ..Default::default()
        }
    }

    /// Where the chat endpoint came from
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Path of the loaded config file
    #[must_use]
    pub fn config_file_path(&self) -> Option<&PathBuf> {
        self.config_file_path.as_ref()
    }

    /// Resolve the chat endpoint
    ///
    /// # Errors
    ///
    /// Returns [`WidgetError::Configuration`] when no endpoint is configured
    /// and none can be derived from the host.
    pub fn resolve_endpoint(&self) -> Result<String, WidgetError> {
        if let Some(api_url) = self.api_url.as_deref().filter(|u| !u.trim().is_empty()) {
            return self
                .host
                .resolve(api_url.trim())
                .map_err(WidgetError::Configuration);
        }

        if self.host.is_local() {
            return Ok(LOCAL_CHAT_ENDPOINT.to_string());
        }

        self.host
            .resolve(DEPLOYED_CHAT_PATH)
            .map_err(|e| WidgetError::Configuration(format!("no chat endpoint ({e})")))
    }

    /// Resolve the analytics sink URL
    ///
    /// `None` when analytics are disabled or the URL cannot be resolved.
    #[must_use]
    pub fn resolve_analytics_endpoint(&self) -> Option<String> {
        if !self.enable_analytics {
            return None;
        }
        let target = self
            .analytics_endpoint
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or(DEFAULT_ANALYTICS_PATH);
        match self.host.resolve(target.trim()) {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::debug!("Analytics endpoint unavailable: {}", e);
                None
            }
        }
    }

    /// Options for the message renderer
    #[must_use]
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            affiliate_tag: self.amazon_affiliate_tag.clone(),
            description_budget: self.description_budget,
        }
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] for a zero description budget
    /// or an empty affiliate tag.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.description_budget == 0 {
            return Err(ConfigError::ValidationError(
                "description_budget must be greater than zero".to_string(),
            ));
        }
        if self.amazon_affiliate_tag.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "amazon affiliate tag must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Loading
// =============================================================================

/// Get the default config file path (`$XDG_CONFIG_HOME/bookchat/widget.toml`)
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("bookchat").join("widget.toml"))
}

/// Load configuration from the default path plus the process environment
///
/// # Errors
///
/// See [`load_config_from_path`].
pub fn load_config() -> Result<WidgetConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from `path` (if it exists) plus the process environment
///
/// A missing file is not an error; defaults are used instead.
///
/// # Errors
///
/// Returns [`ConfigError::ReadError`] if the file exists but cannot be read
/// and [`ConfigError::ParseError`] if it is not valid TOML.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<WidgetConfig, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

/// Load configuration, reading environment variables through `env`
///
/// # Errors
///
/// See [`load_config_from_path`].
pub fn load_config_with_env<F>(path: Option<PathBuf>, env: F) -> Result<WidgetConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = WidgetConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: WidgetToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config, env);

    Ok(config)
}

/// Apply TOML configuration values
fn apply_toml_config(config: &mut WidgetConfig, toml: &WidgetToml) {
    if toml.widget.api_url.is_some() {
        config.api_url = toml.widget.api_url.clone();
        config.source = ConfigSource::File;
    }
    if let Some(ref title) = toml.widget.widget_title {
        config.widget_title = title.clone();
    }
    if let Some(budget) = toml.widget.description_budget {
        config.description_budget = budget;
    }
    if let Some(secs) = toml.widget.request_timeout_secs {
        config.request_timeout = Some(Duration::from_secs(secs));
    }

    if let Some(ref tag) = toml.affiliate.amazon_tag {
        config.amazon_affiliate_tag = tag.clone();
    }

    if toml.analytics.endpoint.is_some() {
        config.analytics_endpoint = toml.analytics.endpoint.clone();
    }
    if let Some(enabled) = toml.analytics.enabled {
        config.enable_analytics = enabled;
    }

    if toml.host.hostname.is_some() {
        config.host.hostname = toml.host.hostname.clone();
    }
    if toml.host.origin.is_some() {
        config.host.origin = toml.host.origin.clone();
    }
}

/// Apply environment variable overrides
fn apply_env_config<F>(config: &mut WidgetConfig, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = env("BOOKCHAT_API_URL") {
        config.api_url = Some(url);
        config.source = ConfigSource::Env;
    }
    if let Some(tag) = env("BOOKCHAT_AFFILIATE_TAG") {
        config.amazon_affiliate_tag = tag;
    }
    if let Some(title) = env("BOOKCHAT_WIDGET_TITLE") {
        config.widget_title = title;
    }
    if let Some(url) = env("BOOKCHAT_ANALYTICS_URL") {
        config.analytics_endpoint = Some(url);
    }
    if let Some(flag) = env("BOOKCHAT_ANALYTICS") {
        config.enable_analytics = flag != "0" && flag.to_lowercase() != "false";
    }
    if let Some(hostname) = env("BOOKCHAT_HOST") {
        config.host.hostname = Some(hostname);
    }
    if let Some(origin) = env("BOOKCHAT_ORIGIN") {
        config.host.origin = Some(origin);
    }
}

// =============================================================================
// Embedding Options
// =============================================================================

/// Options passed by the embedding host (or the CLI)
///
/// These take precedence over every other layer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EmbedOptions {
    /// Overrides the chat endpoint
    pub api_url: Option<String>,
    /// Overrides the affiliate tag
    pub amazon_affiliate_tag: Option<String>,
    /// Header title
    pub widget_title: Option<String>,
    /// Overrides the analytics sink URL
    pub analytics_endpoint: Option<String>,
    /// Enables or disables analytics
    pub enable_analytics: Option<bool>,
    /// Overrides the description budget
    pub description_budget: Option<usize>,
}

impl EmbedOptions {
    /// Create an empty set of options
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the chat endpoint
    #[must_use]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    /// Set the affiliate tag
    #[must_use]
    pub fn with_affiliate_tag(mut self, tag: impl Into<String>) -> Self {
        self.amazon_affiliate_tag = Some(tag.into());
        self
    }

    /// Set the header title
    #[must_use]
    pub fn with_widget_title(mut self, title: impl Into<String>) -> Self {
        self.widget_title = Some(title.into());
        self
    }

    /// Set the analytics sink URL
    #[must_use]
    pub fn with_analytics_endpoint(mut self, url: impl Into<String>) -> Self {
        self.analytics_endpoint = Some(url.into());
        self
    }

    /// Enable or disable analytics
    #[must_use]
    pub fn with_analytics(mut self, enabled: bool) -> Self {
        self.enable_analytics = Some(enabled);
        self
    }

    /// Apply the options to a configuration
    pub fn apply(&self, config: &mut WidgetConfig) {
        if let Some(ref url) = self.api_url {
            config.api_url = Some(url.clone());
            config.source = ConfigSource::Cli;
        }
        if let Some(ref tag) = self.amazon_affiliate_tag {
            config.amazon_affiliate_tag = tag.clone();
        }
        if let Some(ref title) = self.widget_title {
            config.widget_title = title.clone();
        }
        if let Some(ref url) = self.analytics_endpoint {
            config.analytics_endpoint = Some(url.clone());
        }
        if let Some(enabled) = self.enable_analytics {
            config.enable_analytics = enabled;
        }
        if let Some(budget) = self.description_budget {
            config.description_budget = budget;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
