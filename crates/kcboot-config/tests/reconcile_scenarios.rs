//! Startup scenarios for build-time reconciliation and feature lookup.
//!
//! These tests drive the public API the way a server bootstrap does: install a
//! snapshot, reconcile it against layered live configuration, then query
//! features from the installed snapshot.

use kcboot_config::{
    BuildTimeSnapshot, BuildTimeTable, ConfigLayer, EngineSettings, FeatureResolver, LayeredConfig,
    ReconcileError, Reconciler,
};

const BAKED: &str = "PropertiesConfigSource[source=keycloak.properties]";

fn reconciler() -> Reconciler<BuildTimeTable> {
    Reconciler::new(BuildTimeTable::new().name("keycloak.db"))
}

fn live(layers: Vec<ConfigLayer>) -> LayeredConfig {
    layers
        .into_iter()
        .fold(LayeredConfig::new(), LayeredConfig::with_layer)
}

// =============================================================================
// Reconciliation
// =============================================================================

#[test]
fn test_matching_baked_value_starts() {
    let snapshot = BuildTimeSnapshot::from_map([("keycloak.db", "postgres")]);
    let source = live(vec![ConfigLayer::new(BAKED, 100).with("keycloak.db", "postgres")]);

    let installed = reconciler()
        .reconcile(snapshot, &source, false)
        .expect("matching configuration should reconcile");
    assert_eq!(installed.get("keycloak.db"), Some("postgres"));
}

#[test]
fn test_changed_baked_value_is_rejected() {
    let snapshot = BuildTimeSnapshot::from_map([("keycloak.db", "postgres")]);
    let source = live(vec![ConfigLayer::new(BAKED, 100).with("keycloak.db", "mysql")]);

    let err = reconciler()
        .reconcile(snapshot, &source, false)
        .expect_err("drifted build-time value must fail");
    let message = err.to_string();

    assert!(message.contains("keycloak.db"));
    assert!(message.contains("mysql"));
    assert!(message.contains("postgres"));
    assert!(message.contains("'config' command"));
    assert_eq!(err.exit_code(), 1);
}

#[test]
fn test_rebuild_accepts_new_value_from_baked_source() {
    let snapshot = BuildTimeSnapshot::from_map([("keycloak.db", "postgres")]);
    let source = live(vec![ConfigLayer::new(BAKED, 100).with("keycloak.db", "mysql")]);

    assert!(reconciler().reconcile(snapshot, &source, true).is_ok());
}

#[test]
fn test_rebuild_still_rejects_override_from_environment() {
    let snapshot = BuildTimeSnapshot::from_map([("keycloak.db", "postgres")]);
    let source = live(vec![
        ConfigLayer::new(BAKED, 100).with("keycloak.db", "postgres"),
        ConfigLayer::new("EnvConfigSource", 300).with("keycloak.db", "postgres"),
    ]);

    let err = reconciler().reconcile(snapshot, &source, true).unwrap_err();
    assert_eq!(
        err.to_string(),
        "The property [keycloak.db] can only be set when configuring the server. Please, run the 'config' command."
    );
}

#[test]
fn test_case_insensitive_but_whitespace_sensitive() {
    let snapshot = BuildTimeSnapshot::from_map([("keycloak.db", "abc")]);

    let upper = live(vec![ConfigLayer::new(BAKED, 100).with("keycloak.db", "ABC")]);
    assert!(reconciler().reconcile(snapshot.clone(), &upper, false).is_ok());

    let padded = live(vec![ConfigLayer::new(BAKED, 100).with("keycloak.db", "abc ")]);
    let err = reconciler().reconcile(snapshot, &padded, false).unwrap_err();
    assert!(matches!(err, ReconcileError::BuildTimeDrift { ref value, .. } if value == "abc "));
}

#[test]
fn test_runtime_override_of_baked_runtime_value() {
    let snapshot = BuildTimeSnapshot::from_map([("keycloak.hostname", "auth.example.com")]);
    let source = live(vec![
        ConfigLayer::new(BAKED, 100).with("keycloak.hostname", "auth.example.com"),
        ConfigLayer::new("CliArgs", 400).with("keycloak.hostname", "other.example.com"),
    ]);

    let err = reconciler().reconcile(snapshot, &source, false).unwrap_err();
    assert!(matches!(err, ReconcileError::RuntimeDrift { .. }));
}

#[test]
fn test_interpolated_value_is_compared() {
    let snapshot = BuildTimeSnapshot::from_map([("keycloak.db", "postgres")]);
    let source = live(vec![
        ConfigLayer::new(BAKED, 100).with("keycloak.db", "${db.vendor:postgres}"),
    ]);

    assert!(reconciler().reconcile(snapshot, &source, false).is_ok());
}

#[test]
fn test_default_settings_end_to_end() {
    let settings = EngineSettings::default();
    let source = live(vec![
        ConfigLayer::from_toml_str(
            "keycloak.properties",
            100,
            r#"
[keycloak]
db = "postgres"
features = "scripts"
hostname = "auth.example.com"
"#,
        )
        .unwrap(),
    ]);

    // Build the image, then start it with the same configuration
    let reconciler = settings.reconciler();
    let snapshot = reconciler.capture(&source);
    assert_eq!(snapshot.get("keycloak.db"), Some("postgres"));
    assert_eq!(snapshot.get("keycloak.hostname"), Some("auth.example.com"));

    let installed = reconciler.reconcile(snapshot, &source, false).unwrap();
    assert_eq!(installed.len(), 3);
}

// =============================================================================
// Feature lookup after reconciliation
// =============================================================================

#[test]
fn test_feature_lookup_uses_installed_snapshot() {
    let snapshot = BuildTimeSnapshot::from_map([("features.x", "enabled"), ("features", "x,y")]);
    let source = LayeredConfig::new();
    let installed = Reconciler::new(BuildTimeTable::new())
        .reconcile(snapshot, &source, false)
        .unwrap();

    let resolver = FeatureResolver::new(&installed, &source);
    assert_eq!(resolver.resolve("profile.feature.x").as_deref(), Some("enabled"));
    assert_eq!(resolver.resolve("something-else").as_deref(), Some("x,y"));
}

#[test]
fn test_feature_lookup_hyphen_and_live_fallbacks() {
    let snapshot = BuildTimeSnapshot::from_map([("features-x", "enabled")]);
    let source = live(vec![ConfigLayer::new("CliArgs", 400).with("features.y", "disabled")]);
    let resolver = FeatureResolver::new(&snapshot, &source);

    assert_eq!(resolver.resolve("profile.feature.x").as_deref(), Some("enabled"));
    assert_eq!(resolver.resolve("profile.feature.y").as_deref(), Some("disabled"));
    assert_eq!(resolver.resolve("profile.feature.z"), None);
}

#[test]
fn test_feature_lookup_before_reconciliation() {
    // An empty snapshot is a valid starting state
    let snapshot = BuildTimeSnapshot::empty();
    let source = LayeredConfig::new();
    assert_eq!(FeatureResolver::new(&snapshot, &source).resolve("profile.feature.x"), None);
}
