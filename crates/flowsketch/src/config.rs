//! Configuration types for the Flowsketch pipeline.
//!
//! All types implement [`serde::Deserialize`] so the CLI can load them from a
//! TOML file; every field has a default.
//!
//! - [`AppConfig`] - Top-level configuration combining inference and limit settings.
//! - [`InferenceConfig`] - Which model service to call and how.
//! - [`LimitsConfig`] - Input size limits.
//!
//! # Example
//!
//! ```
//! # use flowsketch::config::{AppConfig, Interface};
//! let config = AppConfig::default();
//! assert_eq!(config.inference().model(), "gpt-4o");
//! assert_eq!(config.inference().interface(), Interface::Auto);
//! assert_eq!(config.limits().max_image_bytes(), 10 * 1024 * 1024);
//! ```

use std::time::Duration;

use serde::Deserialize;

/// Base URL of the hosted OpenAI API.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Inference service section.
    #[serde(default)]
    inference: InferenceConfig,

    /// Input limits section.
    #[serde(default)]
    limits: LimitsConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    pub fn new(inference: InferenceConfig, limits: LimitsConfig) -> Self {
        Self { inference, limits }
    }

    /// Returns the inference configuration.
    pub fn inference(&self) -> &InferenceConfig {
        &self.inference
    }

    /// Returns the input limits.
    pub fn limits(&self) -> &LimitsConfig {
        &self.limits
    }

    /// Replaces the inference section (builder style).
    pub fn with_inference(mut self, inference: InferenceConfig) -> Self {
        self.inference = inference;
        self
    }
}

/// Which model interface the pipeline calls first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interface {
    /// Ask the backend which interfaces it supports.
    ///
    /// The OpenAI backend reports the instruction interface only when
    /// `base_url` is exactly [`OPENAI_BASE_URL`]; proxies and other hosts of
    /// the same API start on chat unless `instruction` is set.
    #[default]
    Auto,
    /// Always start with the instruction interface.
    Instruction,
    /// Always use the chat interface.
    Chat,
}

/// Model service settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    model: String,
    base_url: String,
    api_key_env: String,
    interface: Interface,
    timeout_secs: Option<u64>,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            base_url: OPENAI_BASE_URL.to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            interface: Interface::Auto,
            timeout_secs: None,
        }
    }
}

impl InferenceConfig {
    /// Model identifier sent with every request.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// API base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Name of the environment variable holding the API key.
    pub fn api_key_env(&self) -> &str {
        &self.api_key_env
    }

    pub fn interface(&self) -> Interface {
        self.interface
    }

    /// Request timeout; `None` waits indefinitely.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Sets the model identifier (builder style).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the API base URL (builder style).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the name of the API key variable (builder style).
    pub fn with_api_key_env(mut self, api_key_env: impl Into<String>) -> Self {
        self.api_key_env = api_key_env.into();
        self
    }

    /// Sets the interface selection (builder style).
    pub fn with_interface(mut self, interface: Interface) -> Self {
        self.interface = interface;
        self
    }
}

/// Limits applied to pipeline inputs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    max_image_bytes: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_image_bytes: 10 * 1024 * 1024,
        }
    }
}

impl LimitsConfig {
    pub fn new(max_image_bytes: u64) -> Self {
        Self { max_image_bytes }
    }

    /// Largest accepted image, in bytes.
    pub fn max_image_bytes(&self) -> u64 {
        self.max_image_bytes
    }
}
