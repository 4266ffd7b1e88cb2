//! Error types for the plugin registry.

/// Error registering plugin metadata.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// A plugin with the same name is already registered and the registry
    /// does not allow overwrites.
    #[error("plugin '{0}' is already registered")]
    DuplicateName(String),

    /// The plugin name is empty or whitespace.
    #[error("plugin name must not be empty")]
    EmptyName,
}

/// Error parsing a [`Phase`](crate::Phase) from its textual name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown phase '{0}': expected one of CONTENT_LOADING, VARIABLE_EXPANSION, CONDITIONAL_EVAL, STRUCTURE_PARSING, POST_PROCESSING")]
pub struct ParsePhaseError(pub String);
