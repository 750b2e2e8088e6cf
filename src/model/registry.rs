use super::ModelConfig;
use crate::core::{Result, ScopeError};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{Level, event};

#[derive(Debug, Deserialize)]
struct RegistryDocument {
    #[serde(default)]
    models: Vec<ModelConfig>,
}

/// Holds the immutable configuration of every registered model.
#[derive(Debug, Default, Clone)]
pub struct ModelRegistry {
    models: HashMap<String, Arc<ModelConfig>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `{ "models": [...] }` document.
    ///
    /// ```
    /// # use shardscope::ModelRegistry;
    /// let registry = ModelRegistry::from_json_str(r#"{
    ///     "models": [{
    ///         "name": "Order",
    ///         "table_name": "orders",
    ///         "partitioning": { "enabled": true, "partition_key": "customer_id", "primary_key": "id" }
    ///     }]
    /// }"#).unwrap();
    /// assert!(registry.get("Order").is_ok());
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self> {
        let document: RegistryDocument = serde_json::from_str(json)?;
        let mut registry = Self::new();
        for config in document.models {
            registry.register(config)?;
        }
        Ok(registry)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&json)
    }

    /// Validate and register a model. Names must be unique.
    pub fn register(&mut self, config: ModelConfig) -> Result<Arc<ModelConfig>> {
        config.validate()?;
        if self.models.contains_key(&config.name) {
            return Err(ScopeError::Config(format!(
                "model '{}' is already registered",
                config.name
            )));
        }

        event!(
            Level::DEBUG,
            model = %config.name,
            table = %config.table_name,
            partitioned = config.partitioning.enabled,
            "model registered"
        );

        let config = Arc::new(config);
        self.models.insert(config.name.clone(), Arc::clone(&config));
        Ok(config)
    }

    pub fn get(&self, name: &str) -> Result<Arc<ModelConfig>> {
        self.models
            .get(name)
            .cloned()
            .ok_or_else(|| ScopeError::UnknownModel(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn model_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.models.keys().cloned().collect();
        names.sort();
        names
    }
}
