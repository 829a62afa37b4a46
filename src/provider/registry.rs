//! Provider registry
//!
//! Ordered registry of metric providers. Lookup misses fail loudly instead
//! of silently reloading, and registration order is preserved because
//! snapshot and notification ordering follow it.

use super::traits::MetricProvider;
use crate::error::ProviderError;

/// Ordered registry of metric providers
#[derive(Default)]
pub struct ProviderRegistry {
    providers: Vec<Box<dyn MetricProvider>>,
}

impl ProviderRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Register a provider, preserving registration order.
    ///
    /// A provider re-registered under an existing name replaces the old
    /// entry in place so ordering stays stable.
    pub fn register(&mut self, provider: Box<dyn MetricProvider>) {
        if let Some(existing) = self
            .providers
            .iter_mut()
            .find(|p| p.name() == provider.name())
        {
            log::warn!("provider '{}' re-registered, replacing", provider.name());
            *existing = provider;
        } else {
            self.providers.push(provider);
        }
    }

    /// Look up a provider by name, failing loudly on a miss
    pub fn get(&self, name: &str) -> Result<&dyn MetricProvider, ProviderError> {
        self.providers
            .iter()
            .find(|p| p.name() == name)
            .map(|p| p.as_ref())
            .ok_or_else(|| ProviderError::NotLoaded(name.to_string()))
    }

    /// Provider names in registration order
    pub fn names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    /// Number of registered providers
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockProvider;

    #[test]
    fn test_register_and_get() {
        let mut registry = ProviderRegistry::new();
        registry.register(Box::new(MockProvider::healthy("cpu", 42.0)));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("cpu").unwrap().name(), "cpu");
    }

    #[test]
    fn test_get_miss_fails_loudly() {
        let registry = ProviderRegistry::new();
        let err = registry.get("disk").unwrap_err();
        assert!(matches!(err, ProviderError::NotLoaded(name) if name == "disk"));
    }

    #[test]
    fn test_names_preserve_registration_order() {
        let mut registry = ProviderRegistry::new();
        registry.register(Box::new(MockProvider::healthy("cpu", 1.0)));
        registry.register(Box::new(MockProvider::healthy("memory", 2.0)));
        registry.register(Box::new(MockProvider::healthy("disk", 3.0)));

        assert_eq!(registry.names(), vec!["cpu", "memory", "disk"]);
    }

    #[test]
    fn test_reregister_replaces_in_place() {
        let mut registry = ProviderRegistry::new();
        registry.register(Box::new(MockProvider::healthy("cpu", 1.0)));
        registry.register(Box::new(MockProvider::healthy("memory", 2.0)));
        registry.register(Box::new(MockProvider::healthy("cpu", 9.0)));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["cpu", "memory"]);
    }
}
