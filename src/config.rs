//! Startup configuration
//!
//! Values are layered: built-in defaults, then a TOML file (`--config` or
//! `menu.toml` in the working directory), then `MENU_`-prefixed environment
//! variables (`MENU_API__TIMEOUT_SECS=5`), then explicit overrides from the CLI.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::parser::parse_offset;

pub const DEFAULT_CONFIG_FILE: &str = "menu.toml";
pub const ENV_PREFIX: &str = "MENU";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub debug: bool,
    pub log_level: String,
    pub window: WindowConfig,
    pub api: ApiSettings,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub default_width: u32,
    pub default_height: u32,
    pub default_title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Per-request timeout for remote calls
    pub timeout_secs: u64,
    /// Timeout for connection tests and TCP connect
    pub connection_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub show_toolbar: bool,
    pub show_statusbar: bool,
    pub theme: String,
    pub language: String,
    pub resize_debounce_ms: u64,
    pub popup_width: u32,
    pub popup_height: u32,
    pub popup_offset: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: false,
            log_level: "info".to_string(),
            window: WindowConfig::default(),
            api: ApiSettings::default(),
            ui: UiConfig::default(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            default_width: 800,
            default_height: 600,
            default_title: "MENU Application".to_string(),
        }
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            connection_timeout_secs: 10,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            show_toolbar: true,
            show_statusbar: true,
            theme: "default".to_string(),
            language: crate::language::DEFAULT_LANGUAGE.to_string(),
            resize_debounce_ms: 100,
            popup_width: 400,
            popup_height: 300,
            popup_offset: "50,50".to_string(),
        }
    }
}

impl ApiSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }
}

impl UiConfig {
    pub fn resize_debounce(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms)
    }

    /// Popup offset relative to the main window; malformed values fall back to 50,50
    pub fn popup_offset(&self) -> (i32, i32) {
        parse_offset(&self.popup_offset).unwrap_or((50, 50))
    }
}

impl Config {
    /// Load configuration from the default file and the environment
    pub fn load() -> Result<Self> {
        Self::builder().build()
    }

    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to render configuration")
    }
}

/// Builder for layering overrides on top of file and environment sources
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config_path: Option<PathBuf>,
    log_level: Option<String>,
    debug: Option<bool>,
}

impl ConfigBuilder {
    /// Use this file instead of `menu.toml`; the file must exist
    pub fn config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = Some(debug);
        self
    }

    pub fn build(self) -> Result<Config> {
        let mut builder = config::Config::builder();

        builder = match &self.config_path {
            Some(path) => builder.add_source(config::File::from(path.as_path()).required(true)),
            None => builder
                .add_source(config::File::from(Path::new(DEFAULT_CONFIG_FILE)).required(false)),
        };

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        if let Some(level) = &self.log_level {
            builder = builder.set_override("log_level", level.as_str())?;
        }
        if let Some(debug) = self.debug.filter(|d| *d) {
            builder = builder.set_override("debug", debug)?;
        }

        let config: Config = builder
            .build()
            .context("failed to read configuration sources")?
            .try_deserialize()
            .context("invalid configuration")?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.window.default_width, 800);
        assert_eq!(config.window.default_height, 600);
        assert_eq!(config.api.timeout(), Duration::from_secs(30));
        assert_eq!(config.api.connection_timeout(), Duration::from_secs(10));
        assert_eq!(config.ui.popup_offset(), (50, 50));
        assert!(!config.debug);
    }

    #[test]
    fn test_file_and_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "log_level = \"warn\"").unwrap();
        writeln!(file, "[window]").unwrap();
        writeln!(file, "default_width = 1024").unwrap();
        writeln!(file, "[ui]").unwrap();
        writeln!(file, "show_toolbar = false").unwrap();
        drop(file);

        let config = Config::builder()
            .config_path(&path)
            .debug(true)
            .build()
            .unwrap();

        assert_eq!(config.window.default_width, 1024);
        assert_eq!(config.window.default_height, 600);
        assert!(!config.ui.show_toolbar);
        assert!(config.debug);

        let config = Config::builder()
            .config_path(&path)
            .log_level("trace")
            .build()
            .unwrap();
        assert_eq!(config.log_level, "trace");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result = Config::builder()
            .config_path("/definitely/not/here/menu.toml")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_to_toml_round_trip() {
        let config = Config::default();
        let text = config.to_toml().unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
