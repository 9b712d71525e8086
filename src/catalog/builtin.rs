//! Entity catalog and the built-in Bunny definitions
//!
//! The Bunny catalog is embedded in the binary so the tap works without
//! any file besides its config.

use super::types::{EntityDefinition, EntityDescriptor};
use crate::error::{Error, Result, ResultExt};
use serde::{Deserialize, Serialize};

/// Built-in catalog YAML
pub static BUNNY_CATALOG_YAML: &str = include_str!("../../catalog/bunny.yaml");

/// Serialized catalog file
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    entities: Vec<EntityDefinition>,
}

/// Ordered set of entities
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entities: Vec<EntityDescriptor>,
}

impl Catalog {
    /// Create a catalog from descriptors
    pub fn new(entities: Vec<EntityDescriptor>) -> Self {
        Self { entities }
    }

    /// Parse a catalog from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let file: CatalogFile = serde_yaml::from_str(yaml)?;

        let mut catalog = Self::default();
        for def in file.entities {
            if catalog.get(&def.name).is_some() {
                return Err(Error::config(format!(
                    "Duplicate entity '{}' in catalog",
                    def.name
                )));
            }
            if def.query.trim().is_empty() {
                return Err(Error::config(format!(
                    "Entity '{}' has an empty query",
                    def.name
                )));
            }
            catalog.entities.push(def.into());
        }
        Ok(catalog)
    }

    /// Load a catalog file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog {}", path.display()))?;
        Self::from_yaml(&contents)
    }

    /// The embedded Bunny catalog
    pub fn bunny() -> Result<Self> {
        Self::from_yaml(BUNNY_CATALOG_YAML)
    }

    /// Look up an entity by name
    pub fn get(&self, name: &str) -> Option<&EntityDescriptor> {
        self.entities.iter().find(|e| e.name == name)
    }

    /// Entity names in catalog order
    pub fn names(&self) -> Vec<&str> {
        self.entities.iter().map(|e| e.name.as_str()).collect()
    }

    /// Pick entities by name, preserving the requested order
    ///
    /// An empty selection returns every entity.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<EntityDescriptor>> {
        if names.is_empty() {
            return Ok(self.entities.clone());
        }
        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.get(name)
                    .cloned()
                    .ok_or_else(|| Error::EntityNotFound {
                        entity: name.to_string(),
                    })
            })
            .collect()
    }

    /// Iterate over entities
    pub fn iter(&self) -> impl Iterator<Item = &EntityDescriptor> {
        self.entities.iter()
    }

    /// Number of entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
