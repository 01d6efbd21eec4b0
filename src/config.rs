//! Global configuration parsing, validation, and credential loading.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::{AppError, Result};

const KEYRING_SERVICE: &str = "lesson-admin";

/// Hosted platform connectivity.
///
/// The service key is loaded at runtime via OS keychain or environment
/// variable, never from the TOML file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct PlatformConfig {
    /// Base URL of the hosted platform, e.g. `https://project.example.net`.
    #[serde(default)]
    pub url: String,
    /// Per-request timeout for platform calls.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// Service key sent with every platform request (populated at runtime).
    #[serde(skip)]
    pub service_key: String,
}

impl PlatformConfig {
    /// Whether a platform URL was configured.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.url.is_empty()
    }

    /// Request timeout as a [`Duration`].
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            request_timeout_seconds: default_request_timeout(),
            service_key: String::new(),
        }
    }
}

fn default_request_timeout() -> u64 {
    30
}

/// Location of the precomputed duplicate-analysis report.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ReportConfig {
    /// Report path; relative paths resolve against `data_dir`.
    pub path: PathBuf,
}

/// Duplicate review behavior.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ReviewConfig {
    /// Reason string sent with every dismissal.
    #[serde(default = "default_dismiss_reason")]
    pub dismiss_reason: String,
    /// How long a just-resolved group stays hidden from reloaded queues.
    #[serde(default = "default_recently_resolved_ttl")]
    pub recently_resolved_ttl_seconds: u64,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            dismiss_reason: default_dismiss_reason(),
            recently_resolved_ttl_seconds: default_recently_resolved_ttl(),
        }
    }
}

fn default_dismiss_reason() -> String {
    "Reviewed by admin: not duplicates".into()
}

fn default_recently_resolved_ttl() -> u64 {
    300
}

/// Invitation lifecycle settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct InvitationConfig {
    /// Days before a pending invitation expires.
    #[serde(default = "default_expiry_days")]
    pub expiry_days: u32,
}

impl Default for InvitationConfig {
    fn default() -> Self {
        Self {
            expiry_days: default_expiry_days(),
        }
    }
}

fn default_expiry_days() -> u32 {
    7
}

fn default_retention_days() -> u32 {
    30
}

fn default_http_port() -> u16 {
    3000
}

/// Global configuration parsed from `config.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// Directory holding the `SQLite` database and, by default, the report.
    pub data_dir: PathBuf,
    /// HTTP port for the admin API.
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    /// Public base URL used when building invitation links.
    pub public_url: String,
    /// Days after which revoked or expired invitations are purged.
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
    /// Hosted platform connectivity.
    #[serde(default)]
    pub platform: PlatformConfig,
    /// Duplicate report location.
    pub report: ReportConfig,
    /// Duplicate review behavior.
    #[serde(default)]
    pub review: ReviewConfig,
    /// Invitation lifecycle settings.
    #[serde(default)]
    pub invitations: InvitationConfig,
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string and normalize paths.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the platform service key from OS keychain with env-var fallback.
    ///
    /// Skipped when no platform URL is configured.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a platform is configured but neither
    /// keychain nor env var provides the key.
    pub async fn load_credentials(&mut self) -> Result<()> {
        if !self.platform.is_configured() {
            return Ok(());
        }
        self.platform.service_key =
            load_credential("platform_service_key", "PLATFORM_SERVICE_KEY").await?;
        Ok(())
    }

    /// Path of the `SQLite` database file.
    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("lesson-admin.db")
    }

    /// Absolute path of the duplicate report.
    #[must_use]
    pub fn report_path(&self) -> PathBuf {
        if self.report.path.is_absolute() {
            self.report.path.clone()
        } else {
            self.data_dir.join(&self.report.path)
        }
    }

    /// TTL applied to the recently-resolved filter.
    #[must_use]
    pub fn recently_resolved_ttl(&self) -> Duration {
        Duration::from_secs(self.review.recently_resolved_ttl_seconds)
    }

    fn validate(&mut self) -> Result<()> {
        if self.public_url.trim().is_empty() {
            return Err(AppError::Config("public_url must not be empty".into()));
        }
        self.public_url = self.public_url.trim_end_matches('/').to_owned();

        if self.report.path.as_os_str().is_empty() {
            return Err(AppError::Config("report.path must not be empty".into()));
        }

        if self.invitations.expiry_days == 0 {
            return Err(AppError::Config(
                "invitations.expiry_days must be greater than zero".into(),
            ));
        }

        if self.review.dismiss_reason.trim().is_empty() {
            return Err(AppError::Config(
                "review.dismiss_reason must not be empty".into(),
            ));
        }

        if self.platform.is_configured() {
            if !(self.platform.url.starts_with("http://")
                || self.platform.url.starts_with("https://"))
            {
                return Err(AppError::Config(
                    "platform.url must be an http(s) URL".into(),
                ));
            }
            self.platform.url = self.platform.url.trim_end_matches('/').to_owned();
        }

        let canonical = self
            .data_dir
            .canonicalize()
            .map_err(|err| AppError::Config(format!("data_dir invalid: {err}")))?;
        self.data_dir = canonical;

        Ok(())
    }
}

/// Load a single credential from OS keychain with env-var fallback.
async fn load_credential(keyring_key: &str, env_key: &str) -> Result<String> {
    let key = keyring_key.to_owned();

    // keyring is synchronous I/O.
    let keychain_result = tokio::task::spawn_blocking(move || {
        keyring::Entry::new(KEYRING_SERVICE, &key).and_then(|entry| entry.get_password())
    })
    .await
    .map_err(|err| AppError::Config(format!("keychain task panicked: {err}")))?;

    match keychain_result {
        Ok(value) if !value.is_empty() => return Ok(value),
        Ok(_) => {
            warn!(key = keyring_key, "keychain entry is empty, trying env var");
        }
        Err(err) => {
            warn!(
                key = keyring_key,
                ?err,
                "keychain lookup failed, trying env var"
            );
        }
    }

    env::var(env_key)
        .ok()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            AppError::Config(format!(
                "credential {keyring_key} not found in keychain or {env_key} env var"
            ))
        })
}
