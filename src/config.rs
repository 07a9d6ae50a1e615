use std::path::PathBuf;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::{ReloadrError, Result};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Browser configuration
    #[serde(default)]
    pub browser: BrowserConfig,

    /// Reload run defaults
    #[serde(default)]
    pub run: RunConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Browser executable path (overrides auto-discovery)
    pub executable: Option<String>,

    /// Default headless mode
    #[serde(default)]
    pub headless: bool,

    /// CDP debugging port
    #[serde(default = "default_cdp_port")]
    pub cdp_port: u16,

    /// Seconds to wait for a navigation to settle
    #[serde(default = "default_implicit_wait")]
    pub implicit_wait_secs: f64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            executable: None,
            headless: false,
            cdp_port: default_cdp_port(),
            implicit_wait_secs: default_implicit_wait(),
        }
    }
}

fn default_cdp_port() -> u16 {
    9222
}

fn default_implicit_wait() -> f64 {
    5.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Default minimum delay between reloads (seconds)
    #[serde(default = "default_min_delay")]
    pub min_delay: f64,

    /// Default maximum delay between reloads (seconds)
    #[serde(default = "default_max_delay")]
    pub max_delay: f64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            min_delay: default_min_delay(),
            max_delay: default_max_delay(),
        }
    }
}

fn default_min_delay() -> f64 {
    1.5
}

fn default_max_delay() -> f64 {
    3.5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browser: BrowserConfig::default(),
            run: RunConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from all sources (file, env, defaults)
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        let config: Config = Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Config::default()))
            // Merge config file if exists
            .merge(Toml::file(&config_path))
            // Merge environment variables (RELOADR_*)
            .merge(Env::prefixed("RELOADR_").split("_"))
            .extract()
            .map_err(|e| ReloadrError::ConfigError(e.to_string()))?;

        Ok(config)
    }

    /// Get the configuration file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("reloadr")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_documented_defaults() {
        let config = Config::default();

        assert_eq!(config.browser.cdp_port, 9222);
        assert_eq!(config.browser.implicit_wait_secs, 5.0);
        assert!(!config.browser.headless);
        assert_eq!(config.run.min_delay, 1.5);
        assert_eq!(config.run.max_delay, 3.5);
    }

    #[test]
    fn toml_overrides_defaults() {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::string(
                r#"
                [browser]
                headless = true
                cdp_port = 9333

                [run]
                min_delay = 0.5
            "#,
            ))
            .extract()
            .unwrap();

        assert!(config.browser.headless);
        assert_eq!(config.browser.cdp_port, 9333);
        assert_eq!(config.run.min_delay, 0.5);
        // Untouched keys keep their defaults
        assert_eq!(config.run.max_delay, 3.5);
    }

    #[test]
    fn partial_toml_keeps_browser_defaults() {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::string("[run]\nmax_delay = 10.0\n"))
            .extract()
            .unwrap();

        assert_eq!(config.browser.cdp_port, 9222);
        assert_eq!(config.run.max_delay, 10.0);
    }
}
