//! Human-readable report of baked and live configuration

use crate::classifier::{Phase, PropertyClassifier};
use crate::snapshot::BuildTimeSnapshot;
use crate::sources::ConfigSource;

use serde::Serialize;
use std::fmt;

const MASK: &str = "*******";

/// One line of the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    pub name: String,
    pub value: String,
    pub phase: Phase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Snapshot and live namespaced properties, with sensitive values masked
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConfigReport {
    pub baked: Vec<ReportEntry>,
    pub live: Vec<ReportEntry>,
}

impl ConfigReport {
    pub fn collect<S, C>(
        snapshot: &BuildTimeSnapshot,
        source: &S,
        classifier: &C,
        namespace: &str,
    ) -> Self
    where
        S: ConfigSource + ?Sized,
        C: PropertyClassifier + ?Sized,
    {
        let baked = snapshot
            .iter()
            .map(|(name, value)| ReportEntry {
                name: name.to_owned(),
                value: masked(name, value),
                phase: classifier.classify(name),
                source: None,
            })
            .collect();

        let mut names = source.property_names();
        names.retain(|name| name.starts_with(namespace));
        names.sort();

        let live = names
            .into_iter()
            .filter_map(|name| {
                let live = source.config_value(&name);
                let value = live.value.as_deref().map(|v| masked(&name, v))?;
                Some(ReportEntry {
                    phase: classifier.classify(&name),
                    source: live.source_name,
                    name,
                    value,
                })
            })
            .collect();

        Self { baked, live }
    }
}

impl fmt::Display for ConfigReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Server image configuration:")?;
        if self.baked.is_empty() {
            writeln!(f, "  (none)")?;
        }
        for entry in &self.baked {
            writeln!(f, "  {} = {}", entry.name, entry.value)?;
        }

        writeln!(f, "Current configuration:")?;
        if self.live.is_empty() {
            writeln!(f, "  (none)")?;
        }
        for entry in &self.live {
            writeln!(
                f,
                "  {} = {} ({}, {})",
                entry.name,
                entry.value,
                entry.phase,
                entry.source.as_deref().unwrap_or("unknown source")
            )?;
        }
        Ok(())
    }
}

fn masked(name: &str, value: &str) -> String {
    let lower = name.to_ascii_lowercase();
    if lower.contains("password") || lower.contains("secret") {
        MASK.to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::BuildTimeTable;
    use crate::sources::{ConfigLayer, LayeredConfig};

    fn fixture() -> ConfigReport {
        let snapshot = BuildTimeSnapshot::from_map([("keycloak.db", "postgres")]);
        let source = LayeredConfig::new()
            .with_layer(
                ConfigLayer::new("keycloak.properties", 100)
                    .with("keycloak.db", "postgres")
                    .with("quarkus.log.level", "INFO"),
            )
            .with_layer(
                ConfigLayer::new("EnvConfigSource", 300)
                    .with("keycloak.db.password", "hunter2")
                    .with("keycloak.hostname", "auth.example.com"),
            );
        let table = BuildTimeTable::new().name("keycloak.db");
        ConfigReport::collect(&snapshot, &source, &table, "keycloak.")
    }

    #[test]
    fn test_collect() {
        let report = fixture();
        assert_eq!(report.baked.len(), 1);
        assert_eq!(report.baked[0].phase, Phase::BuildTime);

        let names: Vec<_> = report.live.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["keycloak.db", "keycloak.db.password", "keycloak.hostname"]);
        assert_eq!(report.live[2].source.as_deref(), Some("EnvConfigSource"));
        assert_eq!(report.live[2].phase, Phase::RunTime);
    }

    #[test]
    fn test_secrets_masked() {
        let report = fixture();
        assert_eq!(report.live[1].value, MASK);
        assert!(!report.to_string().contains("hunter2"));
    }

    #[test]
    fn test_display() {
        let text = fixture().to_string();
        assert!(text.starts_with("Server image configuration:\n  keycloak.db = postgres\n"));
        assert!(text.contains("  keycloak.hostname = auth.example.com (run-time, EnvConfigSource)"));
        assert!(!text.contains("quarkus.log.level"));
    }

    #[test]
    fn test_empty_report() {
        let text = ConfigReport::default().to_string();
        assert_eq!(text, "Server image configuration:\n  (none)\nCurrent configuration:\n  (none)\n");
    }
}
