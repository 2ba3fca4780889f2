//! Named configuration layers
//!
//! Each layer is a flat map of dotted property names to string values plus
//! the provenance name and ordinal it is consulted with.

use crate::ConfigError;

use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

/// One named layer of a [`LayeredConfig`](super::LayeredConfig)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLayer {
    name: String,
    ordinal: i32,
    values: BTreeMap<String, String>,
}

impl ConfigLayer {
    /// Create an empty layer
    pub fn new(name: impl Into<String>, ordinal: i32) -> Self {
        Self {
            name: name.into(),
            ordinal,
            values: BTreeMap::new(),
        }
    }

    /// Add a single value
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Create a layer from explicit key/value pairs
    pub fn from_pairs<K, V>(
        name: impl Into<String>,
        ordinal: i32,
        pairs: impl IntoIterator<Item = (K, V)>,
    ) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        pairs
            .into_iter()
            .fold(Self::new(name, ordinal), |layer, (k, v)| layer.with(k, v))
    }

    /// Parse a TOML document, flattening nested tables to dotted names
    pub fn from_toml_str(
        name: impl Into<String>,
        ordinal: i32,
        toml_str: &str,
    ) -> Result<Self, ConfigError> {
        let table: toml::Table = toml::from_str(toml_str)
            .map_err(|e| ConfigError::parse(format!("TOML parse error: {e}")))?;

        Ok(Self {
            name: name.into(),
            ordinal,
            values: flatten_toml(&table)?,
        })
    }

    /// Read a TOML file; a missing file yields an empty layer
    pub fn from_toml_file(
        name: impl Into<String>,
        ordinal: i32,
        path: impl AsRef<Path>,
    ) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            warn!("Config file does not exist: {:?}", path);
            return Ok(Self::new(name, ordinal));
        }

        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(name, ordinal, &content)
    }

    /// Map environment variables into the namespace
    ///
    /// `KEYCLOAK_DB_URL` becomes `keycloak.db.url` and a double underscore
    /// becomes a hyphen (`KEYCLOAK_FEATURES__DISABLED` is
    /// `keycloak.features-disabled`). Variables without `prefix` are ignored.
    pub fn from_env<I>(name: impl Into<String>, ordinal: i32, prefix: &str, namespace: &str, vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut layer = Self::new(name, ordinal);

        for (key, value) in vars {
            let Some(rest) = key.strip_prefix(prefix) else {
                continue;
            };
            if rest.is_empty() {
                continue;
            }

            let property = format!(
                "{namespace}{}",
                rest.to_lowercase().replace("__", "-").replace('_', ".")
            );
            debug!(variable = %key, property = %property, "Mapped environment variable");
            layer.values.insert(property, value);
        }

        layer
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ordinal(&self) -> i32 {
        self.ordinal
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Flatten a TOML table into dotted names
///
/// Scalars are stringified and arrays of scalars are joined with `,`.
pub fn flatten_toml(table: &toml::Table) -> Result<BTreeMap<String, String>, ConfigError> {
    let mut out = BTreeMap::new();
    flatten_into(&mut out, None, table)?;
    Ok(out)
}

fn flatten_into(
    out: &mut BTreeMap<String, String>,
    prefix: Option<&str>,
    table: &toml::Table,
) -> Result<(), ConfigError> {
    for (key, value) in table {
        let name = match prefix {
            Some(prefix) => format!("{prefix}.{key}"),
            None => key.clone(),
        };

        match value {
            toml::Value::Table(nested) => flatten_into(out, Some(&name), nested)?,
            toml::Value::Array(items) => {
                let joined = items
                    .iter()
                    .map(|item| {
                        scalar_to_string(item).ok_or_else(|| {
                            ConfigError::parse(format!("'{name}' must be an array of scalar values"))
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?
                    .join(",");
                out.insert(name, joined);
            }
            scalar => {
                if let Some(s) = scalar_to_string(scalar) {
                    out.insert(name, s);
                }
            }
        }
    }
    Ok(())
}

fn scalar_to_string(value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(s) => Some(s.clone()),
        toml::Value::Integer(i) => Some(i.to_string()),
        toml::Value::Float(f) => Some(f.to_string()),
        toml::Value::Boolean(b) => Some(b.to_string()),
        toml::Value::Datetime(d) => Some(d.to_string()),
        toml::Value::Array(_) | toml::Value::Table(_) => None,
    }
}
