//! Configuration-driven pipeline tests.
//!
//! These tests load JSON documents the way a host would at startup and run
//! them through the pipeline builder.

use ordinance_core::config::{ConfigError, PipelineConfig};
use ordinance_schedule::{DiagnosticKind, PipelineBuilder, PipelineError, ValidationMode};

#[test]
fn default_configuration_builds_the_catalog_pipeline() {
    let config = PipelineConfig::default();
    let registry = config.registry().unwrap();

    let result = PipelineBuilder::new(&registry)
        .build(&config.request())
        .unwrap();

    assert!(result.is_valid());
    assert_eq!(result.len(), ordinance_core::DEFAULT_PIPELINE.len());
    assert!(result.capabilities_provided().contains("signatures:rendered"));
}

#[test]
fn custom_plugins_follow_builtins_in_tie_breaks() {
    let config = PipelineConfig::from_json(
        r#"{
            "enabled_plugins": ["watermark", "signature-lines"],
            "plugins": [ { "name": "watermark", "phase": "POST_PROCESSING" } ]
        }"#,
    )
    .unwrap();
    let registry = config.registry().unwrap();

    let result = PipelineBuilder::new(&registry)
        .build(&config.request())
        .unwrap();
    assert_eq!(result.order(), ["signature-lines", "watermark"]);
}

#[test]
fn custom_plugin_can_conflict_with_builtin() {
    let config = PipelineConfig::from_json(
        r#"{
            "validation_mode": "warn",
            "enabled_plugins": ["signature-lines", "plain-signatures"],
            "plugins": [
                { "name": "plain-signatures", "phase": "POST_PROCESSING", "conflicts": ["signature-lines"] }
            ]
        }"#,
    )
    .unwrap();
    let registry = config.registry().unwrap();

    let result = PipelineBuilder::new(&registry)
        .build(&config.request())
        .unwrap();
    assert_eq!(result.order(), ["signature-lines"]);
    assert_eq!(result.excluded(), ["plain-signatures"]);
    assert_eq!(result.mode(), ValidationMode::Warn);
}

#[test]
fn standalone_registry_rejects_unknown_builtin_names() {
    let config = PipelineConfig::from_json(
        r#"{
            "use_builtin_catalog": false,
            "enabled_plugins": ["imports"]
        }"#,
    )
    .unwrap();
    let registry = config.registry().unwrap();
    assert!(registry.is_empty());

    let err = PipelineBuilder::new(&registry)
        .build(&config.request())
        .unwrap_err();
    assert!(matches!(err, PipelineError::UnknownPlugin { ref names, .. } if names == &["imports"]));
    assert_eq!(err.diagnostics().of_kind(DiagnosticKind::UnknownPlugin).count(), 1);
}

#[test]
fn manifest_with_empty_name_is_rejected() {
    let config = PipelineConfig::from_json(
        r#"{ "plugins": [ { "name": "", "phase": "POST_PROCESSING" } ] }"#,
    )
    .unwrap();

    assert!(matches!(config.registry(), Err(ConfigError::Registry(_))));
}

#[test]
fn malformed_phase_is_a_parse_error() {
    let err = PipelineConfig::from_json(
        r#"{ "plugins": [ { "name": "x", "phase": "PHASE_SIX" } ] }"#,
    )
    .unwrap_err();

    assert!(matches!(err, ConfigError::Parse(_)));
    assert!(err.to_string().starts_with("invalid pipeline configuration"));
}
