//! Feature flag lookup across naming conventions
//!
//! Feature toggles are queried with the dotted `profile.feature.<name>`
//! convention but may have been supplied as `features.<name>` or
//! `features-<name>`, either baked into the image or set on the live
//! configuration. Lookups translate the key and fall back in order:
//!
//! 1. Snapshot, translated key (`features.<name>`)
//! 2. Snapshot, hyphen variant (`features-<name>`)
//! 3. Live configuration, raw value of the translated key
//!
//! Keys that do not follow the dotted convention are looked up as the
//! aggregate `features` key.

use crate::snapshot::BuildTimeSnapshot;
use crate::sources::ConfigSource;

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

/// The two naming conventions for feature keys
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureNaming {
    /// Dotted convention used by callers (without trailing dot)
    pub profile_prefix: String,
    /// Root of the prefixed convention, also the aggregate key
    pub root: String,
}

impl Default for FeatureNaming {
    fn default() -> Self {
        Self {
            profile_prefix: "profile.feature".to_string(),
            root: "features".to_string(),
        }
    }
}

impl FeatureNaming {
    pub fn new(profile_prefix: impl Into<String>, root: impl Into<String>) -> Self {
        Self {
            profile_prefix: profile_prefix.into(),
            root: root.into(),
        }
    }

    /// Rewrite a lookup key into the prefixed convention
    ///
    /// `profile.feature.x` becomes `features.x`; any other key becomes the
    /// aggregate `features` key.
    pub fn translate(&self, key: &str) -> String {
        match key.strip_prefix(self.profile_prefix.as_str()) {
            Some(rest) => format!("{}{rest}", self.root),
            None => self.root.clone(),
        }
    }

    /// `features.x` becomes `features-x`; the aggregate key has no variant
    pub fn hyphen_variant(&self, key: &str) -> Option<String> {
        key.strip_prefix(self.root.as_str())
            .and_then(|rest| rest.strip_prefix('.'))
            .map(|rest| format!("{}-{rest}", self.root))
    }

    /// Lookup key for a bare feature name
    pub fn profile_key(&self, feature: &str) -> String {
        format!("{}.{feature}", self.profile_prefix)
    }
}

/// Parsed state of a feature toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureState {
    Enabled,
    Disabled,
}

impl FeatureState {
    pub fn is_enabled(self) -> bool {
        matches!(self, FeatureState::Enabled)
    }
}

impl FromStr for FeatureState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("enabled") {
            Ok(Self::Enabled)
        } else if s.eq_ignore_ascii_case("disabled") {
            Ok(Self::Disabled)
        } else {
            Err(format!("unknown feature state '{s}'"))
        }
    }
}

/// Resolves feature values from a snapshot and a live source
///
/// Never fails: a feature that is set nowhere resolves to `None` and the
/// caller picks the default.
pub struct FeatureResolver<'a, S: ?Sized> {
    snapshot: &'a BuildTimeSnapshot,
    source: &'a S,
    naming: FeatureNaming,
}

impl<'a, S> FeatureResolver<'a, S>
where
    S: ConfigSource + ?Sized,
{
    pub fn new(snapshot: &'a BuildTimeSnapshot, source: &'a S) -> Self {
        Self {
            snapshot,
            source,
            naming: FeatureNaming::default(),
        }
    }

    pub fn with_naming(mut self, naming: FeatureNaming) -> Self {
        self.naming = naming;
        self
    }

    pub fn naming(&self) -> &FeatureNaming {
        &self.naming
    }

    /// Resolve a lookup key through the three-tier fallback
    pub fn resolve(&self, lookup_key: &str) -> Option<String> {
        let key = self.naming.translate(lookup_key);

        if let Some(value) = self.snapshot.get(&key) {
            debug!(lookup_key, key = %key, "Feature resolved from build-time snapshot");
            return Some(value.to_owned());
        }

        if let Some(hyphenated) = self.naming.hyphen_variant(&key) {
            if let Some(value) = self.snapshot.get(&hyphenated) {
                debug!(lookup_key, key = %hyphenated, "Feature resolved from build-time snapshot");
                return Some(value.to_owned());
            }
        }

        let value = self.source.raw_value(&key);
        debug!(lookup_key, key = %key, found = value.is_some(), "Feature looked up in live configuration");
        value
    }

    /// State of a feature by bare name; unknown values resolve to `None`
    pub fn feature_state(&self, feature: &str) -> Option<FeatureState> {
        self.resolve(&self.naming.profile_key(feature))
            .and_then(|value| value.parse().ok())
    }
}
