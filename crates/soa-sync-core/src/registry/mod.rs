//! Plugin-based provider registry
//!
//! The registry allows slave-zone providers to be registered by name at
//! runtime, so the daemon selects a provider from configuration instead of a
//! hardcoded if-else chain.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use soa_sync_core::registry::ProviderRegistry;
//!
//! let registry = ProviderRegistry::new();
//! soa_sync_provider_linode::register(&registry);
//!
//! let factory = registry.factory("linode")?;
//! ```

use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::traits::{SlaveProviderFactory, SlaveZoneProvider};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Registry of slave-zone provider factories
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: RwLock<HashMap<String, Arc<dyn SlaveProviderFactory>>>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider factory
    ///
    /// # Parameters
    ///
    /// - `name`: Provider type name (e.g., "linode")
    /// - `factory`: Factory object for creating provider instances
    pub fn register_provider(
        &self,
        name: impl Into<String>,
        factory: Box<dyn SlaveProviderFactory>,
    ) {
        let name = name.into();
        let mut providers = self
            .providers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        providers.insert(name, Arc::from(factory));
    }

    /// Look up the factory registered under `name`
    ///
    /// # Returns
    ///
    /// - `Ok(Arc<dyn SlaveProviderFactory>)`: the registered factory
    /// - `Err(Error::Config)`: if no provider of that type is registered
    pub fn factory(&self, name: &str) -> Result<Arc<dyn SlaveProviderFactory>> {
        let providers = self
            .providers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        providers
            .get(name)
            .cloned()
            .ok_or_else(|| Error::config(format!("Unknown provider type: {}", name)))
    }

    /// Create a provider client directly
    pub fn create_provider(
        &self,
        name: &str,
        config: &ProviderConfig,
    ) -> Result<Box<dyn SlaveZoneProvider>> {
        self.factory(name)?.create(config)
    }

    /// List all registered provider types
    pub fn list_providers(&self) -> Vec<String> {
        let providers = self
            .providers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        providers.keys().cloned().collect()
    }

    /// Check if a provider type is registered
    pub fn has_provider(&self, name: &str) -> bool {
        let providers = self
            .providers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        providers.contains_key(name)
    }
}
