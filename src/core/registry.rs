//! Name-based lookup of OCR backends.
//!
//! The registry is an ordinary value: it is built at startup by explicit
//! [`AdapterRegistry::register`] calls and handed to whoever needs to pick a
//! backend. A backend is constructed only when it is resolved, so an
//! unconfigured backend costs nothing until it is asked for.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::core::OCRError;
use crate::core::config::ServiceConfig;
use crate::core::traits::OcrPort;

/// Builds a backend from the service configuration.
pub type AdapterFactory =
    Box<dyn Fn(&ServiceConfig) -> Result<Arc<dyn OcrPort>, OCRError> + Send + Sync>;

/// Maps backend names to factories.
#[derive(Default)]
pub struct AdapterRegistry {
    factories: HashMap<String, AdapterFactory>,
}

impl fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("adapters", &self.names())
            .finish()
    }
}

impl AdapterRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in backends.
    pub fn with_builtin_adapters() -> Result<Self, OCRError> {
        let mut registry = Self::new();
        crate::models::register_default_adapters(&mut registry)?;
        Ok(registry)
    }

    /// Registers a factory under `name`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the name is already taken.
    pub fn register<F>(&mut self, name: &str, factory: F) -> Result<(), OCRError>
    where
        F: Fn(&ServiceConfig) -> Result<Arc<dyn OcrPort>, OCRError> + Send + Sync + 'static,
    {
        if self.factories.contains_key(name) {
            return Err(OCRError::config_error(format!(
                "an OCR adapter is already registered under name '{name}'"
            )));
        }
        debug!("Registering OCR adapter '{}'", name);
        self.factories.insert(name.to_string(), Box::new(factory));
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Constructs the backend registered under `name`.
    ///
    /// # Errors
    ///
    /// Fails for unknown names and propagates construction errors.
    pub fn resolve(&self, name: &str, config: &ServiceConfig) -> Result<Arc<dyn OcrPort>, OCRError> {
        let factory = self.factories.get(name).ok_or_else(|| {
            OCRError::config_error(format!(
                "No OCR adapter registered under name '{}' (available: {})",
                name,
                self.names().join(", ")
            ))
        })?;
        let adapter = factory(config)?;
        info!("Using OCR adapter '{}'", adapter.name());
        Ok(adapter)
    }

    /// Constructs the backend named by `config.ocr_adapter`.
    pub fn resolve_configured(&self, config: &ServiceConfig) -> Result<Arc<dyn OcrPort>, OCRError> {
        self.resolve(&config.ocr_adapter, config)
    }
}
