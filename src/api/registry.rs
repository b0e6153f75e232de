//! Named remote API configurations
//!
//! Shared between the loop thread (`api設定`) and background calls, so every
//! operation holds the lock for its whole body.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/* ===================== Configuration ===================== */

#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default)]
    pub show_secret: bool,
}

impl ApiConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_basic(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// `Authorization` header value, if credentials are configured
    ///
    /// A key with an explicit `Bearer `/`Basic ` scheme is sent as is, any
    /// other key is sent as a bearer token. Without a key, a username is sent
    /// as basic auth.
    pub fn authorization(&self) -> Option<String> {
        if let Some(key) = self.key.as_deref().filter(|key| !key.is_empty()) {
            if key.starts_with("Bearer ") || key.starts_with("Basic ") {
                return Some(key.to_string());
            }
            return Some(format!("Bearer {key}"));
        }
        let username = self.username.as_deref().filter(|user| !user.is_empty())?;
        let password = self.password.as_deref().unwrap_or("");
        Some(format!("Basic {}", STANDARD.encode(format!("{username}:{password}"))))
    }
}

fn mask(secret: &Option<String>, show: bool) -> Option<&str> {
    match secret {
        Some(value) if show => Some(value.as_str()),
        Some(_) => Some("***"),
        None => None,
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("url", &self.url)
            .field("key", &mask(&self.key, self.show_secret))
            .field("username", &self.username)
            .field("password", &mask(&self.password, self.show_secret))
            .field("show_secret", &self.show_secret)
            .finish()
    }
}

/// Add a scheme to a bare host
///
/// Local addresses and `host:port` forms get `http://`, everything else
/// `https://`. An empty URL becomes `https://localhost`.
pub fn ensure_url_scheme(url: &str) -> String {
    let url = url.trim();
    if url.is_empty() {
        return "https://localhost".to_string();
    }
    if url.contains("://") {
        return url.to_string();
    }
    if url.starts_with("localhost") || url.starts_with("127.0.0.1") || url.contains(':') {
        return format!("http://{url}");
    }
    format!("https://{url}")
}

/// Resolve `path` against `base` with RFC 3986 rules; falls back to `base`
pub fn join_url(base: &str, path: &str) -> String {
    if path.is_empty() {
        return base.to_string();
    }
    match url::Url::parse(base).and_then(|base| base.join(path)) {
        Ok(joined) => joined.to_string(),
        Err(err) => {
            warn!(base, path, error = %err, "failed to join URL");
            base.to_string()
        }
    }
}

/* ===================== Registry ===================== */

#[derive(Debug, Default)]
pub struct ApiRegistry {
    apis: Mutex<HashMap<String, ApiConfig>>,
}

impl ApiRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, ApiConfig>> {
        self.apis.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add or replace an API; the URL gets a scheme if it has none
    pub fn add_api(&self, name: &str, mut config: ApiConfig) {
        config.url = ensure_url_scheme(&config.url);
        info!(api = name, url = %config.url, "API configured");
        self.lock().insert(name.to_string(), config);
    }

    pub fn remove_api(&self, name: &str) -> bool {
        let removed = self.lock().remove(name).is_some();
        if removed {
            info!(api = name, "API removed");
        } else {
            warn!(api = name, "API not found");
        }
        removed
    }

    pub fn get_api(&self, name: &str) -> Option<ApiConfig> {
        self.lock().get(name).cloned()
    }

    /// All configurations, sorted by name
    pub fn list_apis(&self) -> BTreeMap<String, ApiConfig> {
        self.lock()
            .iter()
            .map(|(name, config)| (name.clone(), config.clone()))
            .collect()
    }

    /// Replace the given credentials, leaving the others untouched
    pub fn update_auth(
        &self,
        name: &str,
        key: Option<String>,
        username: Option<String>,
        password: Option<String>,
    ) -> bool {
        let mut apis = self.lock();
        let Some(config) = apis.get_mut(name) else {
            warn!(api = name, "API not found");
            return false;
        };
        if key.is_some() {
            config.key = key;
        }
        if username.is_some() {
            config.username = username;
        }
        if password.is_some() {
            config.password = password;
        }
        info!(api = name, "API credentials updated");
        true
    }

    pub fn clear(&self) {
        self.lock().clear();
        info!("all API configurations cleared");
    }

    pub fn count(&self) -> usize {
        self.lock().len()
    }

    pub fn export(&self) -> BTreeMap<String, ApiConfig> {
        self.list_apis()
    }

    /// Import configurations; returns how many were stored
    pub fn import(&self, configs: BTreeMap<String, ApiConfig>, overwrite: bool) -> usize {
        let mut apis = self.lock();
        let total = configs.len();
        let mut imported = 0;
        for (name, config) in configs {
            if overwrite || !apis.contains_key(&name) {
                debug!(api = %name, "API imported");
                apis.insert(name, config);
                imported += 1;
            }
        }
        info!(imported, total, "API configurations imported");
        imported
    }
}
