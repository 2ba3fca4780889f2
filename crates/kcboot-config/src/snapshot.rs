//! Build-time snapshot
//!
//! The set of property values frozen into a server image when it was
//! composed. A snapshot is never patched: rebuilding produces a new snapshot
//! that replaces the old one as a whole.

use crate::ConfigError;
use crate::classifier::PropertyClassifier;
use crate::sources::{ConfigSource, flatten_toml};

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Immutable mapping of property names to their baked values
///
/// Cloning is cheap; clones share the same storage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildTimeSnapshot {
    properties: Arc<BTreeMap<String, String>>,
}

impl BuildTimeSnapshot {
    /// A snapshot with no baked values (every lookup misses)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Install a snapshot from a caller-supplied mapping
    pub fn from_map<K, V>(properties: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            properties: Arc::new(
                properties
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    /// Compose a snapshot from the live configuration
    ///
    /// Takes every property inside `namespace` that currently has a value and
    /// is either build-time or supplied by the source named by `baked_source`.
    /// Run-time values baked this way are later checked for drift. This is
    /// what an image build persists.
    pub fn capture<S, C>(source: &S, classifier: &C, namespace: &str, baked_source: &str) -> Self
    where
        S: ConfigSource + ?Sized,
        C: PropertyClassifier + ?Sized,
    {
        let mut properties = BTreeMap::new();

        for name in source.property_names() {
            if !name.starts_with(namespace) {
                continue;
            }
            let live = source.config_value(&name);
            let phase = classifier.classify(&name);
            if !phase.is_build_time() && !live.is_from(baked_source) {
                continue;
            }
            if let Some(value) = live.value {
                debug!(property = %name, %phase, "Capturing property");
                properties.insert(name, value);
            }
        }

        info!(count = properties.len(), "Captured server image snapshot");
        Self {
            properties: Arc::new(properties),
        }
    }

    /// Baked value of a property, if any
    pub fn get(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Iterate entries in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parse a persisted snapshot
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let table: toml::Table = toml::from_str(toml_str)
            .map_err(|e| ConfigError::parse(format!("Snapshot parse error: {e}")))?;

        Ok(Self {
            properties: Arc::new(flatten_toml(&table)?),
        })
    }

    /// Serialize as a flat TOML table of quoted names
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string(&*self.properties)
            .map_err(|e| ConfigError::parse(format!("Snapshot serialize error: {e}")))
    }

    /// Load a persisted snapshot from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Persist the snapshot to disk, replacing any previous one
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        std::fs::write(path.as_ref(), self.to_toml_string()?)?;
        Ok(())
    }
}
