//! Configuration types for the SOA sync system
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};

/// Provider used when none is configured
pub const DEFAULT_PROVIDER: &str = "linode";

/// Main sync configuration
///
/// Passed explicitly to the reconciler; nothing is read from process-wide
/// state at event time.
#[derive(Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Whether slave-zone sync is switched on at all
    #[serde(default)]
    pub enabled: bool,

    /// Registered provider type name
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Provider API key; absence is handled per event
    #[serde(default)]
    pub api_key: Option<String>,

    /// Override of the provider API endpoint
    #[serde(default)]
    pub api_url: Option<String>,

    /// Log intended mutations instead of sending them
    #[serde(default)]
    pub dry_run: bool,
}

// Keeps the API key out of logs
impl std::fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncConfig")
            .field("enabled", &self.enabled)
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_ref().map(|_| "<REDACTED>"))
            .field("api_url", &self.api_url)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl SyncConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            enabled: false,
            provider: default_provider(),
            api_key: None,
            api_url: None,
            dry_run: false,
        }
    }

    /// Set the API key
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Enable or disable the sync
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Enable or disable dry-run mode
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Validate the configuration
    ///
    /// A missing API key is not a validation error: it is reported per event.
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.provider.trim().is_empty() {
            return Err(crate::Error::config("Provider type cannot be empty"));
        }

        if let Some(url) = &self.api_url
            && !url.starts_with("https://")
            && !url.starts_with("http://")
        {
            return Err(crate::Error::config(format!(
                "Provider API URL must use HTTP or HTTPS scheme. Got: {}",
                url
            )));
        }

        Ok(())
    }

    /// Build the provider settings for one operation
    ///
    /// # Returns
    ///
    /// - `Ok(ProviderConfig)`: the credential is set
    /// - `Err(Error::Config)`: no usable API key
    pub fn provider_config(&self) -> Result<ProviderConfig, crate::Error> {
        let api_key = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| crate::Error::config("API key not set"))?;

        Ok(ProviderConfig {
            api_key: api_key.to_string(),
            api_url: self.api_url.clone(),
            dry_run: self.dry_run,
        })
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Settings handed to a provider factory
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Provider API key
    pub api_key: String,
    /// Override of the provider API endpoint
    pub api_url: Option<String>,
    /// Log intended mutations instead of sending them
    pub dry_run: bool,
}

impl ProviderConfig {
    /// Create settings for the default endpoint
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_url: None,
            dry_run: false,
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &"<REDACTED>")
            .field("api_url", &self.api_url)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

fn default_provider() -> String {
    DEFAULT_PROVIDER.to_string()
}
