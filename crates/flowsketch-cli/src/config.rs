//! Configuration file loading for the CLI
//!
//! The configuration comes from the first [`ConfigSource`] that applies,
//! then selected inference settings can be overridden from the environment:
//!
//! | variable | effect |
//! |---|---|
//! | `FLOWSKETCH_CONFIG` | configuration file path, when `--config` is absent |
//! | `FLOWSKETCH_MODEL` | `inference.model` |
//! | `FLOWSKETCH_BASE_URL` | `inference.base_url` |
//! | `FLOWSKETCH_API_KEY_ENV` | `inference.api_key_env` |

use std::{
    env, fmt, fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use thiserror::Error;

use flowsketch::{FlowsketchError, config::AppConfig};

pub const CONFIG_ENV: &str = "FLOWSKETCH_CONFIG";
pub const MODEL_ENV: &str = "FLOWSKETCH_MODEL";
pub const BASE_URL_ENV: &str = "FLOWSKETCH_BASE_URL";
pub const API_KEY_ENV_ENV: &str = "FLOWSKETCH_API_KEY_ENV";

const LOCAL_CONFIG: &str = "flowsketch/config.toml";

/// Configuration-related errors for CLI
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse TOML configuration: {0}")]
    Parse(String),

    #[error("Missing configuration file: {0}")]
    MissingFile(PathBuf),
}

impl From<ConfigError> for FlowsketchError {
    fn from(err: ConfigError) -> Self {
        FlowsketchError::Configuration(err.to_string())
    }
}

/// A place a configuration file may come from, in lookup order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// `--config`; the file must exist.
    Explicit(PathBuf),
    /// `FLOWSKETCH_CONFIG`; the file must exist.
    Environment(PathBuf),
    /// `flowsketch/config.toml` in the working directory.
    Local(PathBuf),
    /// `config.toml` in the platform configuration directory.
    System(PathBuf),
}

impl ConfigSource {
    pub fn path(&self) -> &Path {
        match self {
            ConfigSource::Explicit(path)
            | ConfigSource::Environment(path)
            | ConfigSource::Local(path)
            | ConfigSource::System(path) => path,
        }
    }

    /// Whether a missing file at this source is an error rather than a skip.
    pub fn is_required(&self) -> bool {
        matches!(
            self,
            ConfigSource::Explicit(_) | ConfigSource::Environment(_)
        )
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            ConfigSource::Explicit(_) => "explicit",
            ConfigSource::Environment(_) => "environment",
            ConfigSource::Local(_) => "local",
            ConfigSource::System(_) => "system",
        };
        f.write_str(kind)
    }
}

/// Lists the configuration sources to try, most specific first.
///
/// A required source ends the list: nothing after it is consulted.
fn config_sources(
    explicit: Option<&Path>,
    lookup: &dyn Fn(&str) -> Option<String>,
) -> Vec<ConfigSource> {
    if let Some(path) = explicit {
        return vec![ConfigSource::Explicit(path.to_path_buf())];
    }
    if let Some(path) = lookup(CONFIG_ENV) {
        return vec![ConfigSource::Environment(PathBuf::from(path))];
    }

    let mut sources = vec![ConfigSource::Local(PathBuf::from(LOCAL_CONFIG))];
    match ProjectDirs::from("com", "flowsketch", "flowsketch") {
        Some(proj_dirs) => {
            sources.push(ConfigSource::System(
                proj_dirs.config_dir().join("config.toml"),
            ));
        }
        None => debug!("Could not determine platform-specific config directory"),
    }
    sources
}

/// Load the configuration for a CLI run
///
/// # Errors
///
/// Returns error if:
/// - `--config` or `FLOWSKETCH_CONFIG` names a file that doesn't exist
/// - The chosen file cannot be parsed
pub fn load_config(explicit_path: Option<impl AsRef<Path>>) -> Result<AppConfig, FlowsketchError> {
    let lookup = |name: &str| env::var(name).ok().filter(|value| !value.is_empty());
    load_config_with(explicit_path.as_ref().map(|path| path.as_ref()), &lookup)
}

fn load_config_with(
    explicit: Option<&Path>,
    lookup: &dyn Fn(&str) -> Option<String>,
) -> Result<AppConfig, FlowsketchError> {
    let mut config = None;

    for source in config_sources(explicit, lookup) {
        let path = source.path();
        if !source.is_required() && !path.exists() {
            debug!(source:% = source, path:? = path; "Configuration file not found");
            continue;
        }

        info!(source:% = source, path:? = path; "Loading configuration");
        config = Some(load_config_file(path)?);
        break;
    }

    let config = config.unwrap_or_else(|| {
        debug!("No configuration file found, using default configuration");
        AppConfig::default()
    });
    Ok(apply_env_overrides(config, lookup))
}

fn apply_env_overrides(config: AppConfig, lookup: &dyn Fn(&str) -> Option<String>) -> AppConfig {
    let mut inference = config.inference().clone();

    if let Some(model) = lookup(MODEL_ENV) {
        info!(model; "Model overridden from environment");
        inference = inference.with_model(model);
    }
    if let Some(base_url) = lookup(BASE_URL_ENV) {
        info!(base_url; "Base URL overridden from environment");
        inference = inference.with_base_url(base_url);
    }
    if let Some(api_key_env) = lookup(API_KEY_ENV_ENV) {
        info!(api_key_env; "API key variable overridden from environment");
        inference = inference.with_api_key_env(api_key_env);
    }

    config.with_inference(inference)
}

fn load_config_file(path: &Path) -> Result<AppConfig, FlowsketchError> {
    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()).into());
    }

    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

fn parse_config(content: &str) -> Result<AppConfig, FlowsketchError> {
    let config: AppConfig =
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
    Ok(config)
}
