//! Live configuration sources
//!
//! The reconciliation engine only needs three things from the live
//! configuration: the list of known names, the effective value of a name with
//! its provenance, and the raw (un-interpolated) value. [`ConfigSource`]
//! captures that contract; [`LayeredConfig`] is the implementation used by
//! the server bootstrap:
//! - `keycloak.properties` file baked into the image
//! - Environment variables (`KEYCLOAK_*`)
//! - Command-line overrides

mod interpolate;
mod layer;

pub use layer::{ConfigLayer, flatten_toml};

use std::collections::BTreeSet;

/// Effective value of a property together with the source that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigValue {
    pub name: String,
    /// Interpolated value, `None` when no source defines the name
    pub value: Option<String>,
    /// Name of the layer that supplied the value
    pub source_name: Option<String>,
}

impl ConfigValue {
    /// A value that no source defines
    pub fn absent(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
            source_name: None,
        }
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn source_name(&self) -> Option<&str> {
        self.source_name.as_deref()
    }

    /// Check whether the value came from a source whose name contains `marker`
    pub fn is_from(&self, marker: &str) -> bool {
        self.source_name
            .as_deref()
            .is_some_and(|name| name.contains(marker))
    }
}

/// Provenance-tracking key/value resolver
pub trait ConfigSource {
    /// Every name defined by at least one source
    fn property_names(&self) -> Vec<String>;

    /// Effective value of `name` after interpolation, with provenance
    fn config_value(&self, name: &str) -> ConfigValue;

    /// Effective value of `name` without interpolation
    fn raw_value(&self, name: &str) -> Option<String>;
}

/// Ordered stack of named configuration layers
///
/// Layers are consulted by descending ordinal; among layers with the same
/// ordinal the one added last wins.
#[derive(Debug, Clone, Default)]
pub struct LayeredConfig {
    layers: Vec<ConfigLayer>,
}

impl LayeredConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a layer, keeping the stack ordered by ordinal
    pub fn with_layer(mut self, layer: ConfigLayer) -> Self {
        self.push(layer);
        self
    }

    pub fn push(&mut self, layer: ConfigLayer) {
        self.layers.push(layer);
        // Stable sort keeps insertion order among equal ordinals
        self.layers.sort_by_key(ConfigLayer::ordinal);
    }

    pub fn layers(&self) -> &[ConfigLayer] {
        &self.layers
    }

    /// Find the winning layer for a name
    fn lookup(&self, name: &str) -> Option<(&ConfigLayer, &str)> {
        self.layers
            .iter()
            .rev()
            .find_map(|layer| layer.get(name).map(|value| (layer, value)))
    }
}

impl ConfigSource for LayeredConfig {
    fn property_names(&self) -> Vec<String> {
        let names: BTreeSet<&str> = self.layers.iter().flat_map(ConfigLayer::names).collect();
        names.into_iter().map(str::to_owned).collect()
    }

    fn config_value(&self, name: &str) -> ConfigValue {
        match self.lookup(name) {
            Some((layer, raw)) => ConfigValue {
                name: name.to_owned(),
                value: Some(interpolate::expand(raw, &|key: &str| self.raw_value(key))),
                source_name: Some(layer.name().to_owned()),
            },
            None => ConfigValue::absent(name),
        }
    }

    fn raw_value(&self, name: &str) -> Option<String> {
        self.lookup(name).map(|(_, value)| value.to_owned())
    }
}
