//! Build-time / run-time classification of property names
//!
//! Classification depends on the name only. Values, sources and the current
//! snapshot never influence it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Phase in which a property may be set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Baked into the image; changing it requires a rebuild
    BuildTime,
    /// May differ per running instance
    RunTime,
}

impl Phase {
    pub fn is_build_time(self) -> bool {
        matches!(self, Phase::BuildTime)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BuildTime => write!(f, "build-time"),
            Self::RunTime => write!(f, "run-time"),
        }
    }
}

/// Maps a property name to the phase in which it may be set
///
/// Implementations must be total and pure: unknown names are [`Phase::RunTime`].
pub trait PropertyClassifier {
    fn classify(&self, name: &str) -> Phase;

    fn is_build_time(&self, name: &str) -> bool {
        self.classify(name).is_build_time()
    }
}

impl<F> PropertyClassifier for F
where
    F: Fn(&str) -> Phase,
{
    fn classify(&self, name: &str) -> Phase {
        self(name)
    }
}

/// Table of build-time-only settings
///
/// A name is build-time if it is listed in `names` or starts with one of
/// `prefixes`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildTimeTable {
    #[serde(default)]
    names: BTreeSet<String>,
    #[serde(default)]
    prefixes: BTreeSet<String>,
}

impl BuildTimeTable {
    /// Create an empty table (everything is run-time)
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with the stock build-time options of the server
    pub fn with_defaults() -> Self {
        Self::new()
            .name("keycloak.db")
            .name("keycloak.features")
            .name("keycloak.features-disabled")
            .name("keycloak.cluster")
            .name("keycloak.cache")
            .name("keycloak.cache.stack")
            .name("keycloak.metrics.enabled")
            .name("keycloak.health.enabled")
            .name("keycloak.http.relative-path")
            .name("keycloak.vault")
            .prefix("keycloak.profile.feature.")
            .prefix("keycloak.spi.")
    }

    /// Add an exact build-time name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.names.insert(name.into());
        self
    }

    /// Add a build-time prefix
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefixes.insert(prefix.into());
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.prefixes.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty() && self.prefixes.is_empty()
    }
}

impl PropertyClassifier for BuildTimeTable {
    fn classify(&self, name: &str) -> Phase {
        if self.names.contains(name) || self.prefixes.iter().any(|p| name.starts_with(p.as_str())) {
            Phase::BuildTime
        } else {
            Phase::RunTime
        }
    }
}
