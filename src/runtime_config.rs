//! # Runtime Configuration Module
//!
//! Environment variable based configuration for rendering.
//!
//! ## Environment Variables
//!
//! ### `KEML_TEMPLATE_DIR`
//!
//! Directory that top-level template names resolve against.
//!
//! Default: `templates`
//!
//! ### `KEML_DATETIME_FORMAT`
//!
//! Default strftime format used by the `ftime` template builtin when no format
//! argument is given.
//!
//! Default: `%c`
//!
//! ### `KEML_HOT_RELOAD`
//!
//! `1` or `true` starts a filesystem watcher that evicts changed templates
//! from the document cache. Modification times are checked on every resolve
//! either way; the watcher only drops stale entries earlier.
//!
//! Default: off
//!
//! ## Usage
//!
//! ```rust
//! use keml::runtime_config::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_env();
//! println!("Templates: {}", config.template_dir.display());
//! ```

use std::env;
use std::path::PathBuf;

use crate::builtins::DEFAULT_DATETIME_FORMAT;

/// Default template directory
pub const DEFAULT_TEMPLATE_DIR: &str = "templates";

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Directory holding the templates
    pub template_dir: PathBuf,
    /// Default `ftime` format
    pub datetime_format: String,
    /// Watch the template directory for changes
    pub hot_reload: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            template_dir: PathBuf::from(DEFAULT_TEMPLATE_DIR),
            datetime_format: DEFAULT_DATETIME_FORMAT.to_string(),
            hot_reload: false,
        }
    }
}

fn parse_flag(val: &str) -> bool {
    matches!(
        val.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_vars<F>(var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        RuntimeConfig {
            template_dir: var("KEML_TEMPLATE_DIR")
                .filter(|s| !s.is_empty())
                .map_or(defaults.template_dir, PathBuf::from),
            datetime_format: var("KEML_DATETIME_FORMAT")
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.datetime_format),
            hot_reload: var("KEML_HOT_RELOAD").is_some_and(|s| parse_flag(&s)),
        }
    }
}
