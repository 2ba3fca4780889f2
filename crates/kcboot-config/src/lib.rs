//! Build-time / run-time configuration reconciliation for Keycloak server images
//!
//! A server image is composed once with a set of *build-time* properties baked
//! into it. Every later start compares that snapshot against the live
//! configuration and refuses to run when the two disagree.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐      ┌─────────────────────┐
//! │  BuildTimeSnapshot   │      │  ConfigSource       │
//! │  (baked, immutable)  │      │  (live, layered)    │
//! └──────────┬───────────┘      └──────────┬──────────┘
//!            │                             │
//!            │     ┌────────────────┐      │
//!            ├────▶│   Reconciler   │◀─────┤
//!            │     │ (+ Classifier) │      │
//!            │     └────────────────┘      │
//!            │                             │
//!            │    ┌─────────────────┐      │
//!            └───▶│ FeatureResolver │◀─────┘
//!                 └─────────────────┘
//! ```
//!
//! The library never terminates the process. Reconciliation failures come back
//! as [`ReconcileError`] and the caller decides how to exit.

pub mod classifier;
pub mod features;
pub mod reconcile;
pub mod settings;
pub mod show;
pub mod snapshot;
pub mod sources;

// Re-export main types
pub use classifier::{BuildTimeTable, Phase, PropertyClassifier};
pub use features::{FeatureNaming, FeatureResolver, FeatureState};
pub use reconcile::{ReconcileError, Reconciler};
pub use settings::EngineSettings;
pub use show::{ConfigReport, ReportEntry};
pub use snapshot::BuildTimeSnapshot;
pub use sources::{ConfigLayer, ConfigSource, ConfigValue, LayeredConfig};

/// Root prefix of the properties that take part in reconciliation
pub const DEFAULT_NAMESPACE: &str = "keycloak.";

/// Marker contained in the name of the source that holds image-baked properties
pub const DEFAULT_BAKED_SOURCE: &str = "keycloak.properties";

/// Error types for loading configuration inputs
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl ConfigError {
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;
