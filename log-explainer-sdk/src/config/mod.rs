//! Configuration management for the explainer client
//!
//! This module provides utilities for loading and validating client
//! configuration, with support for environment variables.

use std::collections::HashMap;
use std::env;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ServiceError};
use crate::services::explainer::AnalyzeOptions;

/// Default API base URL when none is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Default overall analysis deadline; free models commonly take 30-60s
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 120;

/// Base trait for configuration providers
pub trait ConfigProvider: Send + Sync {
    /// Get a string configuration value
    fn get_string(&self, key: &str) -> Result<String>;
}

/// Extension methods for configuration providers
pub trait ConfigProviderExt: ConfigProvider {
    /// Get an integer configuration value
    fn get_int(&self, key: &str) -> Result<i64> {
        let value = self.get_string(key)?;
        value.trim().parse::<i64>().map_err(|e| {
            ServiceError::configuration(format!("Invalid integer for key {}: {}", key, e))
        })
    }

    /// Get a boolean configuration value
    fn get_bool(&self, key: &str) -> Result<bool> {
        let value = self.get_string(key)?;
        match value.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" | "on" => Ok(true),
            "false" | "no" | "0" | "off" => Ok(false),
            _ => Err(ServiceError::configuration(format!(
                "Invalid boolean value for key {}: {}",
                key, value
            ))),
        }
    }

    /// Get a string configuration value with a default
    fn get_string_or(&self, key: &str, default: &str) -> String {
        self.get_string(key).unwrap_or_else(|_| default.to_string())
    }

    /// Get an integer configuration value with a default
    fn get_int_or(&self, key: &str, default: i64) -> i64 {
        self.get_int(key).unwrap_or(default)
    }

    /// Get a boolean configuration value with a default
    fn get_bool_or(&self, key: &str, default: bool) -> bool {
        self.get_bool(key).unwrap_or(default)
    }
}

impl<T: ConfigProvider + ?Sized> ConfigProviderExt for T {}

/// Environment variable based configuration provider
#[derive(Debug, Clone, Default)]
pub struct EnvConfigProvider {
    /// Optional prefix for environment variables
    prefix: Option<String>,

    /// Optional namespace for variables
    namespace: Option<String>,
}

impl EnvConfigProvider {
    /// Create a new environment variable config provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a prefix for environment variables
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Set a namespace for environment variables
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Format a configuration key as an environment variable
    pub(crate) fn format_key(&self, key: &str) -> String {
        let mut env_key = String::new();

        if let Some(ref prefix) = self.prefix {
            env_key.push_str(prefix);
            env_key.push('_');
        }

        if let Some(ref namespace) = self.namespace {
            env_key.push_str(namespace);
            env_key.push('_');
        }

        // Uppercase, non-alphanumeric becomes underscore
        env_key.push_str(
            &key.to_uppercase()
                .replace(|c: char| !c.is_ascii_alphanumeric(), "_"),
        );

        env_key
    }
}

impl ConfigProvider for EnvConfigProvider {
    fn get_string(&self, key: &str) -> Result<String> {
        let env_key = self.format_key(key);

        env::var(&env_key).map_err(|e| match e {
            env::VarError::NotPresent => {
                ServiceError::configuration(format!("Environment variable not set: {}", env_key))
            }
            env::VarError::NotUnicode(_) => ServiceError::configuration(format!(
                "Environment variable is not valid unicode: {}",
                env_key
            )),
        })
    }
}

/// In-memory config provider for testing or static configuration
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigProvider {
    /// Configuration values
    values: HashMap<String, String>,
}

impl MemoryConfigProvider {
    /// Create a new empty memory config provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a memory config provider with initial values
    pub fn with_values(values: HashMap<String, String>) -> Self {
        Self { values }
    }

    /// Set a configuration value
    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: ToString,
    {
        self.values.insert(key.into(), value.to_string());
    }
}

impl ConfigProvider for MemoryConfigProvider {
    fn get_string(&self, key: &str) -> Result<String> {
        self.values.get(key).cloned().ok_or_else(|| {
            ServiceError::configuration(format!("Configuration key not found: {}", key))
        })
    }
}

/// A composite config provider that tries multiple providers in order
#[derive(Default)]
pub struct CompositeConfigProvider {
    /// Ordered list of config providers to try
    providers: Vec<Box<dyn ConfigProvider>>,
}

impl CompositeConfigProvider {
    /// Create a new composite config provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a provider to the chain
    pub fn add_provider(&mut self, provider: impl ConfigProvider + 'static) {
        self.providers.push(Box::new(provider));
    }
}

impl ConfigProvider for CompositeConfigProvider {
    fn get_string(&self, key: &str) -> Result<String> {
        for provider in &self.providers {
            if let Ok(value) = provider.get_string(key) {
                return Ok(value);
            }
        }

        Err(ServiceError::configuration(format!(
            "Configuration key not found in any provider: {}",
            key
        )))
    }
}

/// Global default configuration provider (`LOG_EXPLAINER_*` variables)
pub static DEFAULT_PROVIDER: Lazy<Arc<EnvConfigProvider>> =
    Lazy::new(|| Arc::new(EnvConfigProvider::new().with_prefix("LOG_EXPLAINER")));

/// Trait for service-specific configuration
pub trait ServiceConfig: Debug + Send + Sync {
    /// Validate this configuration
    fn validate(&self) -> Result<()>;

    /// Service name
    fn service_name(&self) -> &str;
}

/// Configuration for the explainer API client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplainerConfig {
    /// Base URL of the analysis API
    pub base_url: String,

    /// Overall deadline per analysis in seconds; 0 disables it
    pub timeout_seconds: u64,

    /// Try the event-stream transport before the single-shot one
    pub prefer_stream: bool,

    /// Mask credential-like substrings before submission
    pub redact: bool,

    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for ExplainerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            prefer_stream: true,
            redact: false,
            user_agent: format!("log-explainer/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ExplainerConfig {
    /// Load configuration from a config provider
    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> Result<Self> {
        let defaults = Self::default();

        let base_url = provider.get_string_or("api_url", DEFAULT_BASE_URL);
        let timeout_seconds = provider
            .get_int_or("timeout_seconds", DEFAULT_TIMEOUT_SECONDS as i64)
            .max(0) as u64;
        let prefer_stream = provider.get_bool_or("prefer_stream", true);
        let redact = provider.get_bool_or("redact", false);
        let user_agent = provider.get_string_or("user_agent", &defaults.user_agent);

        let config = Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            timeout_seconds,
            prefer_stream,
            redact,
            user_agent,
        };

        config.validate()?;
        Ok(config)
    }

    /// The analysis deadline, if enabled
    pub fn timeout(&self) -> Option<Duration> {
        match self.timeout_seconds {
            0 => None,
            seconds => Some(Duration::from_secs(seconds)),
        }
    }

    /// Session options derived from this configuration
    pub fn analyze_options(&self) -> AnalyzeOptions {
        AnalyzeOptions {
            redact: self.redact,
            prefer_stream: self.prefer_stream,
            timeout: self.timeout(),
        }
    }
}

impl ServiceConfig for ExplainerConfig {
    fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(ServiceError::configuration("API base URL is required"));
        }

        let url = url::Url::parse(&self.base_url).map_err(|e| {
            ServiceError::configuration(format!("Invalid API base URL {}: {}", self.base_url, e))
        })?;

        match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(ServiceError::configuration(format!(
                "Unsupported URL scheme for API base URL: {}",
                scheme
            ))),
        }
    }

    fn service_name(&self) -> &str {
        "explainer"
    }
}
