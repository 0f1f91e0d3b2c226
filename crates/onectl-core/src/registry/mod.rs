//! Plugin-based provider registry
//!
//! The registry lets provider crates register themselves by type name so the
//! CLI can build a provider from [`ProviderConfig`] without an if-else chain.
//!
//! ## Registration
//!
//! ```rust,ignore
//! // In onectl-provider-oneandone
//! pub fn register(registry: &ProviderRegistry) -> Result<()> {
//!     registry.register_provider("oneandone", Box::new(OneandoneFactory))
//! }
//! ```

use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::traits::{CloudProvider, CloudProviderFactory};
use std::collections::HashMap;
use std::sync::RwLock;

/// Provider registry for plugin-based provider creation
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: RwLock<HashMap<String, Box<dyn CloudProviderFactory>>>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider factory under `name`, replacing any previous one
    pub fn register_provider(
        &self,
        name: impl Into<String>,
        factory: Box<dyn CloudProviderFactory>,
    ) -> Result<()> {
        let mut providers = self
            .providers
            .write()
            .map_err(|_| Error::Other("provider registry lock poisoned".to_string()))?;
        providers.insert(name.into(), factory);
        Ok(())
    }

    /// Create a provider from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn CloudProvider>)`: Created provider instance
    /// - `Err(Error)`: If the configuration is invalid, the provider type is
    ///   not registered, or creation fails
    pub fn create_provider(&self, config: &ProviderConfig) -> Result<Box<dyn CloudProvider>> {
        config.validate()?;

        let provider_type = config.type_name();
        let providers = self
            .providers
            .read()
            .map_err(|_| Error::Other("provider registry lock poisoned".to_string()))?;

        let factory = providers
            .get(provider_type)
            .ok_or_else(|| Error::config(format!("Unknown provider type: {}", provider_type)))?;

        factory.create(config)
    }

    /// List all registered provider types
    pub fn list_providers(&self) -> Vec<String> {
        self.providers
            .read()
            .map(|providers| providers.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Check if a provider type is registered
    pub fn has_provider(&self, name: &str) -> bool {
        self.providers
            .read()
            .map(|providers| providers.contains_key(name))
            .unwrap_or(false)
    }
}
