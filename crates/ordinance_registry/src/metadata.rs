//! Plugin scheduling metadata.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::phase::Phase;

/// Version assigned to metadata that does not declare one.
pub const DEFAULT_VERSION: &str = "1.0.0";

/// Scheduling metadata for a single plugin.
///
/// Metadata is an inert record: it names a plugin, places it in a [`Phase`],
/// and declares the capabilities it provides and needs together with its
/// ordering constraints. It never carries the plugin's behaviour.
///
/// Capabilities are free-form `namespace:action` tags such as
/// `variables:resolved`. Set-valued fields keep their declaration order so
/// that everything derived from them (edges, diagnostics) is deterministic.
///
/// # Example
///
/// ```
/// use ordinance_registry::{Phase, PluginMetadata};
///
/// let loops = PluginMetadata::new("loops", Phase::ConditionalEval)
///     .with_description("Expands {{#items}} loop blocks")
///     .provides("loops:expanded")
///     .requires("variables:resolved")
///     .requires_phase(Phase::VariableExpansion)
///     .run_after("clauses");
///
/// assert!(loops.required);
/// assert!(loops.requires_capabilities.contains("variables:resolved"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginMetadata {
    /// Unique plugin identifier.
    pub name: String,
    /// The phase this plugin runs in.
    pub phase: Phase,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Capabilities this plugin establishes once it has run.
    #[serde(default)]
    pub capabilities: IndexSet<String>,
    /// Capabilities that must be provided by an earlier plugin.
    #[serde(default)]
    pub requires_capabilities: IndexSet<String>,
    /// Phases that must have completed before this plugin runs.
    ///
    /// Only phases strictly earlier than [`phase`](Self::phase) can be
    /// satisfied.
    #[serde(default)]
    pub requires_phases: IndexSet<Phase>,
    /// Plugins of the same phase this plugin must run before.
    #[serde(default)]
    pub run_before: IndexSet<String>,
    /// Plugins of the same phase this plugin must run after.
    #[serde(default)]
    pub run_after: IndexSet<String>,
    /// Plugins that cannot be enabled together with this one.
    #[serde(default)]
    pub conflicts: IndexSet<String>,
    /// Whether a missing capability blocks the pipeline (`true`) or only
    /// degrades this plugin (`false`).
    #[serde(default = "default_required")]
    pub required: bool,
    /// Plugin version.
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_required() -> bool {
    true
}

fn default_version() -> String {
    DEFAULT_VERSION.to_string()
}

impl PluginMetadata {
    /// Creates metadata for a required plugin with no capabilities or
    /// constraints.
    #[must_use]
    pub fn new(name: impl Into<String>, phase: Phase) -> Self {
        Self {
            name: name.into(),
            phase,
            description: String::new(),
            capabilities: IndexSet::new(),
            requires_capabilities: IndexSet::new(),
            requires_phases: IndexSet::new(),
            run_before: IndexSet::new(),
            run_after: IndexSet::new(),
            conflicts: IndexSet::new(),
            required: true,
            version: default_version(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the version.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Declares a capability this plugin provides.
    #[must_use]
    pub fn provides(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.insert(capability.into());
        self
    }

    /// Declares a capability this plugin requires.
    #[must_use]
    pub fn requires(mut self, capability: impl Into<String>) -> Self {
        self.requires_capabilities.insert(capability.into());
        self
    }

    /// Declares a phase that must have completed before this plugin runs.
    #[must_use]
    pub fn requires_phase(mut self, phase: Phase) -> Self {
        self.requires_phases.insert(phase);
        self
    }

    /// Declares that this plugin runs before `plugin`.
    #[must_use]
    pub fn run_before(mut self, plugin: impl Into<String>) -> Self {
        self.run_before.insert(plugin.into());
        self
    }

    /// Declares that this plugin runs after `plugin`.
    #[must_use]
    pub fn run_after(mut self, plugin: impl Into<String>) -> Self {
        self.run_after.insert(plugin.into());
        self
    }

    /// Declares that this plugin cannot be enabled together with `plugin`.
    #[must_use]
    pub fn conflicts_with(mut self, plugin: impl Into<String>) -> Self {
        self.conflicts.insert(plugin.into());
        self
    }

    /// Marks the plugin as optional: missing capabilities become warnings.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Returns true if this plugin advertises `capability`.
    #[must_use]
    pub fn provides_capability(&self, capability: &str) -> bool {
        self.capabilities.contains(capability)
    }

    /// Returns true if either plugin lists the other in its conflicts.
    #[must_use]
    pub fn conflicts_with_plugin(&self, other: &PluginMetadata) -> bool {
        self.conflicts.contains(&other.name) || other.conflicts.contains(&self.name)
    }

    /// Returns the declared phase dependencies that cannot be satisfied
    /// because they do not precede this plugin's own phase.
    pub fn unsatisfiable_phases(&self) -> impl Iterator<Item = Phase> + '_ {
        self.requires_phases
            .iter()
            .copied()
            .filter(move |required| *required >= self.phase)
    }
}
