//! Plugin-based resolver registry
//!
//! The registry allows resolver strategies to be registered dynamically at
//! runtime, avoiding hardcoded if-else chains.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use iplog_core::registry::ResolverRegistry;
//! use iplog_core::config::ResolverConfig;
//!
//! let registry = ResolverRegistry::new();
//!
//! // Resolver crates register themselves
//! iplog_resolver_http::register(&registry);
//! iplog_resolver_dns::register(&registry);
//!
//! // Create the configured resolver
//! let resolver = registry.create_resolver(&ResolverConfig::dns())?;
//! ```

use crate::config::ResolverConfig;
use crate::error::{Error, Result};
use crate::traits::{Resolver, ResolverFactory};
use std::collections::HashMap;
use std::sync::RwLock;

/// Resolver registry for plugin-based resolver creation
///
/// The registry maintains a map of strategy names to factory objects,
/// allowing dynamic instantiation of resolvers based on configuration.
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct ResolverRegistry {
    /// Registered resolver factories
    resolvers: RwLock<HashMap<String, Box<dyn ResolverFactory>>>,
}

impl ResolverRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resolver factory
    ///
    /// # Parameters
    ///
    /// - `name`: Strategy name (e.g., "http", "dns")
    /// - `factory`: Factory object for creating resolver instances
    pub fn register_resolver(&self, name: impl Into<String>, factory: Box<dyn ResolverFactory>) {
        let name = name.into();
        let mut resolvers = self
            .resolvers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        resolvers.insert(name, factory);
    }

    /// Create a resolver from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn Resolver>)`: Created resolver instance
    /// - `Err(Error)`: If the strategy is not registered or creation fails
    pub fn create_resolver(&self, config: &ResolverConfig) -> Result<Box<dyn Resolver>> {
        config.validate()?;

        let strategy = config.type_name();
        let resolvers = self
            .resolvers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let factory = resolvers
            .get(strategy)
            .ok_or_else(|| Error::config(format!("Unknown resolver strategy: {}", strategy)))?;

        factory.create(config)
    }

    /// List all registered strategy names
    pub fn list_resolvers(&self) -> Vec<String> {
        let resolvers = self
            .resolvers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut names: Vec<String> = resolvers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a strategy is registered
    pub fn has_resolver(&self, name: &str) -> bool {
        let resolvers = self
            .resolvers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        resolvers.contains_key(name)
    }
}
