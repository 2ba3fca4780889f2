//! Reconciliation of the build-time snapshot against the live configuration
//!
//! Runs once during startup, before the server accepts requests. Every
//! property under the managed namespace is checked:
//!
//! 1. Build-time property, not rebuilding: the live value must match the baked
//!    value.
//! 2. Build-time property: the live value must come from the baked-properties
//!    source, even when rebuilding.
//! 3. Run-time property: a live value must match any value baked for it.
//!
//! Values are compared case-insensitively without trimming. A missing baked
//! value or a missing live value never counts as a mismatch.
//!
//! Violations are returned as [`ReconcileError`]; terminating the process is
//! left to the caller.

use crate::classifier::PropertyClassifier;
use crate::snapshot::BuildTimeSnapshot;
use crate::sources::{ConfigSource, ConfigValue};
use crate::{DEFAULT_BAKED_SOURCE, DEFAULT_NAMESPACE};

use tracing::{debug, info};

/// Exit status used when reconciliation fails
pub const FAILURE_EXIT_CODE: i32 = 1;

/// Fatal disagreement between the baked snapshot and the live configuration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconcileError {
    /// A build-time property was changed without rebuilding the image
    #[error(
        "The value [{value}] for property [{property}] differs from the value [{baked}] set into the server image. Please, run the 'config' command to configure the server with the new value."
    )]
    BuildTimeDrift {
        property: String,
        value: String,
        baked: String,
    },

    /// A build-time property was supplied by a source other than the baked properties
    #[error(
        "The property [{property}] can only be set when configuring the server. Please, run the 'config' command."
    )]
    UnauthorizedSource {
        property: String,
        source_name: Option<String>,
    },

    /// A run-time value contradicts a value baked into the image
    #[error(
        "The value [{value}] of property [{property}] differs from the value [{baked}] set into the server image"
    )]
    RuntimeDrift {
        property: String,
        value: String,
        baked: String,
    },
}

impl ReconcileError {
    /// Name of the offending property
    pub fn property(&self) -> &str {
        match self {
            Self::BuildTimeDrift { property, .. }
            | Self::UnauthorizedSource { property, .. }
            | Self::RuntimeDrift { property, .. } => property,
        }
    }

    /// Process exit status for this failure
    pub fn exit_code(&self) -> i32 {
        FAILURE_EXIT_CODE
    }
}

/// Compares a build-time snapshot with a live [`ConfigSource`]
#[derive(Debug, Clone)]
pub struct Reconciler<C> {
    classifier: C,
    namespace: String,
    baked_source: String,
}

impl<C: PropertyClassifier> Reconciler<C> {
    /// Create with the default namespace and baked-properties source
    pub fn new(classifier: C) -> Self {
        Self {
            classifier,
            namespace: DEFAULT_NAMESPACE.to_string(),
            baked_source: DEFAULT_BAKED_SOURCE.to_string(),
        }
    }

    /// Only names starting with `namespace` are reconciled
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Build-time values must come from a source whose name contains `marker`
    pub fn with_baked_source(mut self, marker: impl Into<String>) -> Self {
        self.baked_source = marker.into();
        self
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn baked_source(&self) -> &str {
        &self.baked_source
    }

    /// Validate every namespaced property and install the snapshot
    ///
    /// Stops at the first violation, in name order. On success the snapshot
    /// is handed back for the rest of startup to read from.
    pub fn reconcile<S>(
        &self,
        snapshot: BuildTimeSnapshot,
        source: &S,
        rebuild: bool,
    ) -> Result<BuildTimeSnapshot, ReconcileError>
    where
        S: ConfigSource + ?Sized,
    {
        let mut checked = 0usize;

        for name in self.managed_names(source) {
            if let Some(violation) = self.check_property(&snapshot, source, &name, rebuild).into_iter().next() {
                return Err(violation);
            }
            checked += 1;
        }

        info!(
            checked,
            baked = snapshot.len(),
            rebuild,
            "Build-time configuration reconciled"
        );
        Ok(snapshot)
    }

    /// Compose the snapshot an image build would persist from `source`
    pub fn capture<S>(&self, source: &S) -> BuildTimeSnapshot
    where
        S: ConfigSource + ?Sized,
    {
        BuildTimeSnapshot::capture(source, &self.classifier, &self.namespace, &self.baked_source)
    }

    /// Collect every violation instead of stopping at the first one
    pub fn violations<S>(
        &self,
        snapshot: &BuildTimeSnapshot,
        source: &S,
        rebuild: bool,
    ) -> Vec<ReconcileError>
    where
        S: ConfigSource + ?Sized,
    {
        self.managed_names(source)
            .iter()
            .flat_map(|name| self.check_property(snapshot, source, name, rebuild))
            .collect()
    }

    fn managed_names<S>(&self, source: &S) -> Vec<String>
    where
        S: ConfigSource + ?Sized,
    {
        let mut names: Vec<String> = source
            .property_names()
            .into_iter()
            .filter(|name| name.starts_with(self.namespace.as_str()))
            .collect();
        names.sort();
        names.dedup();
        names
    }

    fn check_property<S>(
        &self,
        snapshot: &BuildTimeSnapshot,
        source: &S,
        name: &str,
        rebuild: bool,
    ) -> Vec<ReconcileError>
    where
        S: ConfigSource + ?Sized,
    {
        let mut found = Vec::new();
        let baked = snapshot.get(name);
        let live = source.config_value(name);
        let phase = self.classifier.classify(name);

        debug!(
            property = %name,
            %phase,
            source = live.source_name().unwrap_or("-"),
            baked = baked.is_some(),
            "Reconciling property"
        );

        if phase.is_build_time() {
            if !rebuild {
                if let Some((value, baked)) = drift(baked, live.value()) {
                    found.push(ReconcileError::BuildTimeDrift {
                        property: name.to_owned(),
                        value,
                        baked,
                    });
                }
            }
            // Nothing was set when the value is absent, so there is no source to check
            if live.value().is_some() && !live.is_from(&self.baked_source) {
                found.push(ReconcileError::UnauthorizedSource {
                    property: name.to_owned(),
                    source_name: live.source_name.clone(),
                });
            }
        } else if self.is_runtime_value(&live) {
            if let Some((value, baked)) = drift(baked, live.value()) {
                found.push(ReconcileError::RuntimeDrift {
                    property: name.to_owned(),
                    value,
                    baked,
                });
            }
        }

        found
    }

    /// A live value that may legitimately be set at run time
    fn is_runtime_value(&self, value: &ConfigValue) -> bool {
        value.value.is_some() && !self.classifier.is_build_time(&value.name)
    }
}

/// `(live, baked)` when both values are present and differ
fn drift(baked: Option<&str>, live: Option<&str>) -> Option<(String, String)> {
    match (baked, live) {
        (Some(baked), Some(live)) if !values_match(baked, live) => {
            Some((live.to_owned(), baked.to_owned()))
        }
        _ => None,
    }
}

/// Case-insensitive equality; whitespace is significant
pub fn values_match(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
        || a.chars()
            .flat_map(char::to_lowercase)
            .eq(b.chars().flat_map(char::to_lowercase))
}
