//! Host configuration.
//!
//! ```toml
//! application_name = "TradeDangerous"   # shown to DirectOutput; unique per app
//! debounce_ms = 200
//! driver_path = 'C:\Program Files\Logitech\DirectOutput\DirectOutput.dll'
//! profile = "x52.pr0"
//! content = "pages.toml"
//! page_name = "MFD"
//! placeholder = "-- empty --"
//! ```
//!
//! Every key is optional. Relative `profile`/`content` paths resolve against
//! the directory of the config file when loaded with [`Config::load`].

use crate::error::{ConfigError, Result};
use crate::nav::DEFAULT_PLACEHOLDER;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

fn default_application_name() -> String {
    "stickmfd".to_string()
}
fn default_debounce_ms() -> u64 {
    200
}
fn default_page_name() -> String {
    "MFD".to_string()
}
fn default_placeholder() -> String {
    DEFAULT_PLACEHOLDER.to_string()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "default_application_name")]
    pub application_name: String,
    /// Soft-button debounce window in milliseconds.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Explicit `DirectOutput.dll` location.
    #[serde(default)]
    pub driver_path: Option<PathBuf>,
    /// Profile activated on the device at startup (overrides the content file's).
    #[serde(default)]
    pub profile: Option<PathBuf>,
    /// Content file (TOML or JSON).
    #[serde(default)]
    pub content: Option<PathBuf>,
    #[serde(default = "default_page_name")]
    pub page_name: String,
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            application_name: default_application_name(),
            debounce_ms: default_debounce_ms(),
            driver_path: None,
            profile: None,
            content: None,
            page_name: default_page_name(),
            placeholder: default_placeholder(),
        }
    }
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s).map_err(ConfigError::from)?)
    }

    /// Read a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut cfg = Self::from_toml_str(&text)?;
        if let Some(base) = path.parent() {
            cfg.resolve_relative_to(base);
        }
        tracing::debug!(path = %path.display(), ?cfg, "loaded config");
        Ok(cfg)
    }

    fn resolve_relative_to(&mut self, base: &Path) {
        for p in [&mut self.profile, &mut self.content].into_iter().flatten() {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let cfg = Config::from_toml_str("").unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.debounce(), Duration::from_millis(200));
        assert_eq!(cfg.page_name, "MFD");
    }

    #[test]
    fn parses_all_keys() {
        let cfg = Config::from_toml_str(
            r#"
            application_name = "TradeDangerous"
            debounce_ms = 150
            driver_path = 'C:\DirectOutput.dll'
            profile = "x52.pr0"
            content = "pages.json"
            page_name = "TD"
            placeholder = "nothing"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.application_name, "TradeDangerous");
        assert_eq!(cfg.debounce_ms, 150);
        assert_eq!(cfg.driver_path, Some(PathBuf::from(r"C:\DirectOutput.dll")));
        assert_eq!(cfg.content, Some(PathBuf::from("pages.json")));
        assert_eq!(cfg.placeholder, "nothing");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Config::from_toml_str("debounce = 5").is_err());
    }

    #[test]
    fn relative_paths_follow_config_dir() {
        let mut cfg = Config {
            profile: Some("x52.pr0".into()),
            content: Some(PathBuf::from("pages.toml")),
            ..Config::default()
        };
        cfg.resolve_relative_to(Path::new("conf"));
        assert_eq!(cfg.profile, Some(Path::new("conf").join("x52.pr0")));
        assert_eq!(cfg.content, Some(Path::new("conf").join("pages.toml")));
    }
}
