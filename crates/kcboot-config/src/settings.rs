//! Settings of the reconciliation engine itself
//!
//! Loaded from an optional TOML file with `KCBOOT__*` environment overrides,
//! e.g. `KCBOOT__NAMESPACE=kc.` or `KCBOOT__FEATURES__ROOT=kc.features`.
//! The build-time table lists take comma-separated values,
//! e.g. `KCBOOT__BUILD_TIME__NAMES=keycloak.db,keycloak.features`.

use crate::ConfigError;
use crate::classifier::BuildTimeTable;
use crate::features::FeatureNaming;
use crate::reconcile::Reconciler;
use crate::{DEFAULT_BAKED_SOURCE, DEFAULT_NAMESPACE};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Namespace, provenance marker, build-time table and feature naming
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSettings {
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_baked_source")]
    pub baked_source: String,
    #[serde(default = "BuildTimeTable::with_defaults")]
    pub build_time: BuildTimeTable,
    #[serde(default)]
    pub features: FeatureNaming,
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_baked_source() -> String {
    DEFAULT_BAKED_SOURCE.to_string()
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            baked_source: default_baked_source(),
            build_time: BuildTimeTable::with_defaults(),
            features: FeatureNaming::default(),
        }
    }
}

impl EngineSettings {
    /// Load settings; a missing file falls back to defaults
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(path, environment())
    }

    fn load_with(path: Option<&Path>, env: Environment) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            if path.exists() {
                builder = builder.add_source(File::from(path));
            }
        }
        builder = builder.add_source(env);

        let settings: Self = builder
            .build()
            .map_err(|e| ConfigError::parse(format!("config build error: {e}")))?
            .try_deserialize()
            .map_err(|e| ConfigError::parse(format!("config deserialize error: {e}")))?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.namespace.is_empty() {
            return Err(ConfigError::validation("namespace must not be empty"));
        }
        if self.baked_source.is_empty() {
            return Err(ConfigError::validation("baked_source must not be empty"));
        }
        if self.features.profile_prefix.is_empty() || self.features.root.is_empty() {
            return Err(ConfigError::validation(
                "features.profile_prefix and features.root must not be empty",
            ));
        }
        Ok(())
    }

    /// Reconciler configured from these settings
    pub fn reconciler(&self) -> Reconciler<BuildTimeTable> {
        Reconciler::new(self.build_time.clone())
            .with_namespace(self.namespace.clone())
            .with_baked_source(self.baked_source.clone())
    }
}

/// `KCBOOT__*` overrides
fn environment() -> Environment {
    Environment::with_prefix("KCBOOT")
        .try_parsing(true)
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("build_time.names")
        .with_list_parse_key("build_time.prefixes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::PropertyClassifier;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = EngineSettings::default();
        assert_eq!(settings.namespace, "keycloak.");
        assert_eq!(settings.baked_source, "keycloak.properties");
        assert!(settings.validate().is_ok());
        assert!(settings.reconciler().classifier().is_build_time("keycloak.db"));
    }

    #[test]
    fn test_load_without_file() {
        let settings = EngineSettings::load(None).unwrap();
        assert_eq!(settings.features, FeatureNaming::default());
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("kcboot.toml");
        std::fs::write(
            &path,
            r#"
namespace = "kc."
baked_source = "keycloak.conf"

[build_time]
names = ["kc.db"]
prefixes = ["kc.spi."]

[features]
profile_prefix = "keycloak.profile.feature"
root = "kc.features"
"#,
        )
        .unwrap();

        let settings = EngineSettings::load(Some(path.as_path())).unwrap();
        let reconciler = settings.reconciler();
        assert_eq!(reconciler.namespace(), "kc.");
        assert_eq!(reconciler.baked_source(), "keycloak.conf");
        assert!(reconciler.classifier().is_build_time("kc.spi.events"));
        assert!(!reconciler.classifier().is_build_time("keycloak.db"));
        assert_eq!(settings.features.root, "kc.features");
    }

    #[test]
    fn test_env_overrides_lists() {
        let vars = config::Map::from([
            (
                "KCBOOT__BUILD_TIME__NAMES".to_string(),
                "keycloak.db,keycloak.cache".to_string(),
            ),
            ("KCBOOT__BUILD_TIME__PREFIXES".to_string(), "keycloak.spi.".to_string()),
            ("KCBOOT__NAMESPACE".to_string(), "keycloak.".to_string()),
        ]);

        let settings = EngineSettings::load_with(None, environment().source(Some(vars))).unwrap();
        assert_eq!(settings.namespace, "keycloak.");
        let reconciler = settings.reconciler();
        assert!(reconciler.classifier().is_build_time("keycloak.db"));
        assert!(reconciler.classifier().is_build_time("keycloak.cache"));
        assert!(reconciler.classifier().is_build_time("keycloak.spi.events"));
        // The whole table comes from the environment once it is overridden
        assert!(!reconciler.classifier().is_build_time("keycloak.features"));
    }

    #[test]
    fn test_validation_rejects_empty_namespace() {
        let settings = EngineSettings {
            namespace: String::new(),
            ..Default::default()
        };
        assert!(matches!(settings.validate(), Err(ConfigError::Validation(_))));
    }
}
