//! Built-in legal-markdown plugin catalog.
//!
//! The catalog describes the standard document transformations a legal
//! markdown host ships with. Hosts typically register the catalog first and
//! add their own plugins afterwards, so built-in plugins win every
//! registration-order tie-break.
//!
//! | Plugin | Phase | Provides | Requires |
//! |--------|-------|----------|----------|
//! | `imports` | content loading | `content:imported` | |
//! | `mixins` | variable expansion | `mixins:expanded` | `content:imported` |
//! | `template-fields` | variable expansion | `fields:expanded`, `variables:resolved` | |
//! | `dates` | variable expansion | `dates:formatted` | `variables:resolved` |
//! | `clauses` | conditional eval | `clauses:evaluated` | `variables:resolved` |
//! | `loops` | conditional eval | `loops:expanded` | `variables:resolved` |
//! | `headers` | structure parsing | `headers:numbered` | |
//! | `cross-references` | structure parsing | `references:resolved` | `headers:numbered` |
//! | `field-tracking` | post processing | `tracking:applied` | `fields:expanded` |
//! | `signature-lines` | post processing | `signatures:rendered` | |
//! | `debug-fields` | post processing | | `tracking:applied` (optional) |

use ordinance_registry::{Phase, PluginMetadata, PluginRegistry, RegistryError};

/// The plugins enabled by default, in phase order.
///
/// `debug-fields` is left out; it only annotates output for authors.
pub const DEFAULT_PIPELINE: &[&str] = &[
    "imports",
    "mixins",
    "template-fields",
    "dates",
    "clauses",
    "loops",
    "headers",
    "cross-references",
    "field-tracking",
    "signature-lines",
];

/// Returns the metadata of every built-in plugin, in registration order.
#[must_use]
pub fn builtin_plugins() -> Vec<PluginMetadata> {
    vec![
        PluginMetadata::new("imports", Phase::ContentLoading)
            .with_description("Inlines files referenced by @import directives")
            .provides("content:imported"),
        PluginMetadata::new("mixins", Phase::VariableExpansion)
            .with_description("Expands reusable text blocks declared in front matter")
            .provides("mixins:expanded")
            .requires("content:imported")
            .requires_phase(Phase::ContentLoading),
        PluginMetadata::new("template-fields", Phase::VariableExpansion)
            .with_description("Substitutes {{field}} placeholders with metadata values")
            .provides("fields:expanded")
            .provides("variables:resolved")
            .run_after("mixins"),
        PluginMetadata::new("dates", Phase::VariableExpansion)
            .with_description("Formats @today and date fields")
            .provides("dates:formatted")
            .requires("variables:resolved")
            .run_after("template-fields"),
        PluginMetadata::new("clauses", Phase::ConditionalEval)
            .with_description("Keeps or removes [optional clauses]{condition}")
            .provides("clauses:evaluated")
            .requires("variables:resolved")
            .requires_phase(Phase::VariableExpansion),
        PluginMetadata::new("loops", Phase::ConditionalEval)
            .with_description("Repeats blocks over list fields")
            .provides("loops:expanded")
            .requires("variables:resolved")
            .run_after("clauses"),
        PluginMetadata::new("headers", Phase::StructureParsing)
            .with_description("Numbers l., ll., lll. headers")
            .provides("headers:numbered")
            .requires_phase(Phase::ConditionalEval),
        PluginMetadata::new("cross-references", Phase::StructureParsing)
            .with_description("Resolves |reference| markers to header numbers")
            .provides("references:resolved")
            .requires("headers:numbered")
            .run_after("headers"),
        PluginMetadata::new("field-tracking", Phase::PostProcessing)
            .with_description("Wraps substituted fields in tracking spans")
            .provides("tracking:applied")
            .requires("fields:expanded"),
        PluginMetadata::new("signature-lines", Phase::PostProcessing)
            .with_description("Renders signature blocks")
            .provides("signatures:rendered"),
        PluginMetadata::new("debug-fields", Phase::PostProcessing)
            .with_description("Highlights unresolved fields for authors")
            .requires("tracking:applied")
            .run_after("field-tracking")
            .optional(),
    ]
}

/// Registers every built-in plugin into `registry`.
///
/// # Errors
///
/// Returns [`RegistryError::DuplicateName`] if `registry` rejects
/// duplicates and already holds a plugin with a built-in name.
pub fn register_builtins(registry: &mut PluginRegistry) -> Result<(), RegistryError> {
    registry.register_all(builtin_plugins())
}

/// Returns a fresh registry holding the built-in catalog.
///
/// # Errors
///
/// Returns the first [`RegistryError`] raised while registering the
/// catalog, such as a repeated built-in name.
pub fn builtin_registry() -> Result<PluginRegistry, RegistryError> {
    let mut registry = PluginRegistry::new();
    register_builtins(&mut registry)?;
    Ok(registry)
}
