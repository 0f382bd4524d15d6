//! Type registry
//!
//! Maps type URIs to class templates and constructs fresh empty instances.
//! Definitions load from YAML or JSON documents so adapters can ship their
//! model as data.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::asset::Asset;
use crate::models::template::ClassTemplate;

/// Registry lookup or definition loading failure.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("unknown type '{0}'")]
    UnknownType(String),
    #[error("invalid registry definition: {0}")]
    Definition(String),
}

/// Serialized shape of a registry definition document.
#[derive(Debug, Serialize, Deserialize)]
struct RegistryDocument {
    classes: Vec<ClassTemplate>,
}

/// Class templates keyed by type URI.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    classes: BTreeMap<String, ClassTemplate>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the given classes.
    pub fn from_classes(classes: Vec<ClassTemplate>) -> Self {
        let mut registry = Self::new();
        for class in classes {
            registry.register(class);
        }
        registry
    }

    /// Load a registry from a YAML definition document.
    pub fn from_yaml(document: &str) -> Result<Self, RegistryError> {
        let doc: RegistryDocument =
            serde_yaml::from_str(document).map_err(|e| RegistryError::Definition(e.to_string()))?;
        Ok(Self::from_classes(doc.classes))
    }

    /// Load a registry from a JSON definition document.
    pub fn from_json(document: &str) -> Result<Self, RegistryError> {
        let doc: RegistryDocument =
            serde_json::from_str(document).map_err(|e| RegistryError::Definition(e.to_string()))?;
        Ok(Self::from_classes(doc.classes))
    }

    /// Register a class, replacing any previous template for the same URI.
    pub fn register(&mut self, class: ClassTemplate) {
        if self.classes.contains_key(&class.type_uri) {
            debug!(type_uri = %class.type_uri, "replacing registered class template");
        }
        self.classes.insert(class.type_uri.clone(), class);
    }

    /// Template for a type URI.
    pub fn class(&self, type_uri: &str) -> Option<&ClassTemplate> {
        self.classes.get(type_uri)
    }

    /// Construct a fresh, empty instance of a type.
    pub fn instantiate(&self, type_uri: &str) -> Result<Asset, RegistryError> {
        let class = self
            .class(type_uri)
            .ok_or_else(|| RegistryError::UnknownType(type_uri.to_string()))?;
        Ok(Asset::from_class(class))
    }

    /// Registered type URIs in sorted order.
    pub fn type_uris(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
