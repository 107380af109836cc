//! Client configuration.
//!
//! Everything comes from the environment except the backend URL, which is
//! the one value remembered between runs: an explicit override wins and is
//! persisted, otherwise the persisted value is used.

use std::path::{Path, PathBuf};

use anyhow::Context;
use reqwest::Url;
use tokio::time::Duration;

use vuzoll_core::{Action, Operator};

use crate::poller::{
    DEFAULT_GROWTH_FACTOR, DEFAULT_IDLE_THRESHOLD, DEFAULT_MAX_INTERVAL, DEFAULT_MIN_INTERVAL,
    PollingConfig, PollingConfigError,
};

pub const API_URL_ENV: &str = "VUZOLL_API_URL";
pub const USER_ID_ENV: &str = "VUZOLL_USER_ID";
pub const USER_NAME_ENV: &str = "VUZOLL_USER_NAME";
pub const DEFAULT_ACTION_ENV: &str = "VUZOLL_DEFAULT_ACTION";
pub const POLL_MIN_MS_ENV: &str = "VUZOLL_POLL_MIN_MS";
pub const POLL_MAX_MS_ENV: &str = "VUZOLL_POLL_MAX_MS";
pub const REQUEST_TIMEOUT_MS_ENV: &str = "VUZOLL_REQUEST_TIMEOUT_MS";

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("backend URL is not configured; pass --api <url> or set VUZOLL_API_URL")]
    MissingApiBase,
    #[error("invalid backend URL {url:?}: {reason}")]
    InvalidApiBase { url: String, reason: String },
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
    #[error(transparent)]
    Polling(#[from] PollingConfigError),
}

/// Where the backend URL is remembered between runs.
#[derive(Debug, Clone)]
pub struct ApiUrlStore {
    path: PathBuf,
}

impl ApiUrlStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<user config dir>/vuzoll/api_url`, if the platform has a config dir.
    pub fn default_location() -> Option<Self> {
        dirs::config_dir().map(|dir| Self::new(dir.join("vuzoll").join("api_url")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> anyhow::Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => {
                let trimmed = raw.trim();
                Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err)
                .with_context(|| format!("failed to read backend URL from {:?}", self.path)),
        }
    }

    pub fn save(&self, api_url: &str) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create config directory at {:?}", parent))?;
        }
        std::fs::write(&self.path, api_url)
            .with_context(|| format!("failed to write backend URL to {:?}", self.path))
    }
}

/// Strip whitespace and trailing slashes, then require an http(s) URL.
pub fn normalize_api_url(raw: &str) -> Result<String, ConfigError> {
    let cleaned = raw.trim().trim_end_matches('/').to_string();
    let url = Url::parse(&cleaned).map_err(|e| ConfigError::InvalidApiBase {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidApiBase {
            url: raw.to_string(),
            reason: format!("unsupported scheme {}", url.scheme()),
        });
    }
    Ok(cleaned)
}

/// Pick the backend URL: override (persisted) > stored value > error.
///
/// Failing to persist an override is logged, not fatal.
pub fn resolve_api_base(
    override_url: Option<&str>,
    store: Option<&ApiUrlStore>,
) -> Result<String, ConfigError> {
    if let Some(raw) = override_url.filter(|s| !s.trim().is_empty()) {
        let api_url = normalize_api_url(raw)?;
        if let Some(store) = store {
            if let Err(err) = store.save(&api_url) {
                tracing::warn!(path = ?store.path(), error = ?err, "could not remember backend URL");
            }
        }
        return Ok(api_url);
    }

    let stored = match store.map(ApiUrlStore::load).transpose() {
        Ok(stored) => stored.flatten(),
        Err(err) => {
            tracing::warn!(error = ?err, "could not read remembered backend URL");
            None
        }
    };

    match stored {
        Some(raw) => normalize_api_url(&raw),
        None => Err(ConfigError::MissingApiBase),
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub operator: Operator,
    pub default_action: Action,
    pub polling: PollingConfig,
    pub request_timeout: Duration,
    pub probe_timeout: Duration,
}

impl ClientConfig {
    /// Load from the process environment.
    ///
    /// `api_override` is the `--api` argument; `VUZOLL_API_URL` is used when
    /// it is absent.
    pub fn from_env(
        api_override: Option<String>,
        store: Option<&ApiUrlStore>,
    ) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok(), api_override, store)
    }

    pub fn from_lookup<F>(
        lookup: F,
        api_override: Option<String>,
        store: Option<&ApiUrlStore>,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_override = api_override.or_else(|| lookup(API_URL_ENV));
        let api_url = resolve_api_base(api_override.as_deref(), store)?;

        let user_id = match lookup(USER_ID_ENV) {
            Some(raw) => Some(raw.trim().parse::<i64>().map_err(|_| ConfigError::InvalidValue {
                key: USER_ID_ENV,
                value: raw.clone(),
            })?),
            None => None,
        };
        let user_name = lookup(USER_NAME_ENV).filter(|s| !s.trim().is_empty());

        let default_action = match lookup(DEFAULT_ACTION_ENV) {
            Some(raw) => raw.parse::<Action>().map_err(|_| ConfigError::InvalidValue {
                key: DEFAULT_ACTION_ENV,
                value: raw.clone(),
            })?,
            None => Action::default(),
        };

        let polling = PollingConfig::new(
            millis(&lookup, POLL_MIN_MS_ENV)?.unwrap_or(DEFAULT_MIN_INTERVAL),
            millis(&lookup, POLL_MAX_MS_ENV)?.unwrap_or(DEFAULT_MAX_INTERVAL),
            DEFAULT_GROWTH_FACTOR,
            DEFAULT_IDLE_THRESHOLD,
        )?;

        let request_timeout =
            millis(&lookup, REQUEST_TIMEOUT_MS_ENV)?.unwrap_or(DEFAULT_REQUEST_TIMEOUT);

        Ok(Self {
            api_url,
            operator: Operator::new(user_id, user_name),
            default_action,
            polling,
            request_timeout,
            probe_timeout: DEFAULT_PROBE_TIMEOUT.min(request_timeout),
        })
    }
}

fn millis<F>(lookup: &F, key: &'static str) -> Result<Option<Duration>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(|ms| Some(Duration::from_millis(ms)))
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
        None => Ok(None),
    }
}
