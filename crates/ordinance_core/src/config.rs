//! JSON pipeline configuration.
//!
//! A [`PipelineConfig`] bundles everything a host needs to compute a
//! pipeline: which catalog to start from, extra plugin manifests, the
//! enabled plugins, the validation mode, and logging preferences.
//!
//! ```
//! use ordinance_core::config::PipelineConfig;
//! use ordinance_schedule::PipelineBuilder;
//!
//! let config = PipelineConfig::from_json(r#"{
//!     "validation_mode": "warn",
//!     "enabled_plugins": ["imports", "template-fields", "stamp"],
//!     "plugins": [
//!         { "name": "stamp", "phase": "POST_PROCESSING", "requires_capabilities": ["fields:expanded"] }
//!     ]
//! }"#).unwrap();
//!
//! let registry = config.registry().unwrap();
//! let result = PipelineBuilder::new(&registry).build(&config.request()).unwrap();
//! assert_eq!(result.order(), ["imports", "template-fields", "stamp"]);
//! ```

use core::str::FromStr;

use ordinance_registry::{PluginMetadata, PluginRegistry, RegistryError};
use ordinance_schedule::{PipelineRequest, ValidationMode};
use serde::{Deserialize, Serialize};
use tracing::Level;

use crate::catalog;
use crate::telemetry::{TracingConfig, TracingFormat};

/// Errors from loading a [`PipelineConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The document is not valid configuration JSON.
    #[error("invalid pipeline configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// A plugin manifest could not be registered.
    #[error("invalid plugin manifest: {0}")]
    Registry(#[from] RegistryError),

    /// The tracing level is not one of trace, debug, info, warn, error.
    #[error("unknown tracing level '{0}'")]
    UnknownLevel(String),
}

/// Logging section of a [`PipelineConfig`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TracingSettings {
    /// Maximum level, e.g. `"debug"`. Defaults to info.
    pub level: Option<String>,
    /// Output format.
    pub format: TracingFormat,
    /// Target-specific filter directives.
    pub env_filter: Option<String>,
    /// Whether to log span enter/exit events.
    pub span_events: bool,
}

fn default_true() -> bool {
    true
}

/// Pipeline configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Validation policy.
    #[serde(default)]
    pub validation_mode: ValidationMode,
    /// Plugins to enable. When absent, the default catalog pipeline is used.
    #[serde(default)]
    pub enabled_plugins: Option<Vec<String>>,
    /// Whether the built-in catalog is registered before `plugins`.
    #[serde(default = "default_true")]
    pub use_builtin_catalog: bool,
    /// Extra plugin manifests, registered in order after the catalog.
    #[serde(default)]
    pub plugins: Vec<PluginMetadata>,
    /// Logging preferences.
    #[serde(default)]
    pub tracing: TracingSettings,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            validation_mode: ValidationMode::default(),
            enabled_plugins: None,
            use_builtin_catalog: true,
            plugins: Vec::new(),
            tracing: TracingSettings::default(),
        }
    }
}

impl PipelineConfig {
    /// Parses a configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if `json` is malformed or contains
    /// unknown keys.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Builds the registry this configuration describes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Registry`] if a manifest has an empty name or
    /// reuses a name that is already registered.
    pub fn registry(&self) -> Result<PluginRegistry, ConfigError> {
        let mut registry = PluginRegistry::new();
        if self.use_builtin_catalog {
            catalog::register_builtins(&mut registry)?;
        }
        registry.register_all(self.plugins.iter().cloned())?;

        tracing::debug!(
            plugins = registry.len(),
            builtin = self.use_builtin_catalog,
            "registry built from configuration"
        );
        Ok(registry)
    }

    /// Returns the enabled plugin names.
    ///
    /// Falls back to [`catalog::DEFAULT_PIPELINE`] when the document does
    /// not list any.
    #[must_use]
    pub fn enabled(&self) -> Vec<String> {
        match &self.enabled_plugins {
            Some(names) => names.clone(),
            None => catalog::DEFAULT_PIPELINE
                .iter()
                .map(|name| (*name).to_string())
                .collect(),
        }
    }

    /// Returns the pipeline request this configuration describes.
    #[must_use]
    pub fn request(&self) -> PipelineRequest {
        PipelineRequest::new(self.enabled()).with_mode(self.validation_mode)
    }

    /// Returns the tracing setup this configuration describes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownLevel`] if the level is not recognized.
    pub fn tracing_config(&self) -> Result<TracingConfig, ConfigError> {
        let settings = &self.tracing;
        let mut config = TracingConfig::new()
            .with_format(settings.format)
            .with_span_events(settings.span_events);

        if let Some(level) = &settings.level {
            let level =
                Level::from_str(level).map_err(|_| ConfigError::UnknownLevel(level.clone()))?;
            config = config.with_level(level);
        }
        if let Some(filter) = &settings.env_filter {
            config = config.with_env_filter(filter);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ordinance_registry::Phase;

    #[test]
    fn empty_document_uses_defaults() {
        let config = PipelineConfig::from_json("{}").unwrap();

        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.request().validation_mode, ValidationMode::Strict);
        assert_eq!(config.enabled(), catalog::DEFAULT_PIPELINE);
    }

    #[test]
    fn full_document_parses() {
        let config = PipelineConfig::from_json(
            r#"{
                "validation_mode": "silent",
                "enabled_plugins": ["imports"],
                "use_builtin_catalog": false,
                "plugins": [
                    { "name": "imports", "phase": "CONTENT_LOADING", "capabilities": ["content:imported"] }
                ],
                "tracing": { "level": "debug", "format": "json", "env_filter": "ordinance_schedule=trace" }
            }"#,
        )
        .unwrap();

        assert_eq!(config.validation_mode, ValidationMode::Silent);
        assert!(!config.use_builtin_catalog);

        let registry = config.registry().unwrap();
        assert_eq!(registry.len(), 1);
        let imports = registry.get("imports").unwrap();
        assert_eq!(imports.phase, Phase::ContentLoading);
        assert!(imports.required);

        let tracing = config.tracing_config().unwrap();
        assert_eq!(tracing.level(), Level::DEBUG);
        assert_eq!(tracing.format(), TracingFormat::Json);
        assert_eq!(tracing.env_filter(), Some("ordinance_schedule=trace"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = PipelineConfig::from_json(r#"{ "validation": "warn" }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn manifest_shadowing_builtin_is_rejected() {
        let config = PipelineConfig::from_json(
            r#"{ "plugins": [ { "name": "loops", "phase": "CONDITIONAL_EVAL" } ] }"#,
        )
        .unwrap();

        let err = config.registry().unwrap_err();
        assert!(matches!(err, ConfigError::Registry(RegistryError::DuplicateName(ref n)) if n == "loops"));
    }

    #[test]
    fn unknown_level_is_reported() {
        let config =
            PipelineConfig::from_json(r#"{ "tracing": { "level": "chatty" } }"#).unwrap();
        assert!(matches!(
            config.tracing_config(),
            Err(ConfigError::UnknownLevel(level)) if level == "chatty"
        ));
    }
}
