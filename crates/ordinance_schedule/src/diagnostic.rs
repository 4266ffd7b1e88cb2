//! Structured diagnostics produced while building a pipeline.
//!
//! No scheduling component fails on its own. Each one appends
//! [`Diagnostic`] records to a shared [`Diagnostics`] accumulator, and only
//! the [`PipelineBuilder`](crate::pipeline::PipelineBuilder) decides whether
//! the aggregate is fatal.

use core::fmt;

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Severity & Kind
// ─────────────────────────────────────────────────────────────────────────────

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The pipeline is still usable; output may be degraded.
    Warning,
    /// The pipeline order cannot be trusted.
    Error,
}

impl Severity {
    /// Returns the stable lower-case tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The category of ordering defect a diagnostic reports.
///
/// The serialized tag is stable and intended for hosts that surface
/// diagnostics programmatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A requested plugin name is not registered.
    UnknownPlugin,
    /// Ordering constraints within a phase form a cycle.
    CircularDependency,
    /// A required capability is not provided by any earlier plugin.
    CapabilityMissing,
    /// A plugin depends on its own phase or a later one.
    PhaseDependency,
    /// Two enabled plugins are mutually exclusive.
    Conflict,
}

impl DiagnosticKind {
    /// Returns the stable `snake_case` tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            DiagnosticKind::UnknownPlugin => "unknown_plugin",
            DiagnosticKind::CircularDependency => "circular_dependency",
            DiagnosticKind::CapabilityMissing => "capability_missing",
            DiagnosticKind::PhaseDependency => "phase_dependency",
            DiagnosticKind::Conflict => "conflict",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Diagnostic
// ─────────────────────────────────────────────────────────────────────────────

/// A single ordering defect.
///
/// Every diagnostic carries a stable [`kind`](Self::kind), the offending
/// plugin, and a human-readable message. Kind-specific context lives in the
/// optional fields:
///
/// - `related_plugin` - the other side of a conflict, the candidate provider
///   of a missing capability, or the source of a dropped cycle edge
/// - `capability` - the missing capability
/// - `members` - every plugin left unresolved by a cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The defect category.
    pub kind: DiagnosticKind,
    /// The offending plugin.
    pub plugin: String,
    /// A second plugin involved in the defect, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_plugin: Option<String>,
    /// The capability involved, for [`DiagnosticKind::CapabilityMissing`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capability: Option<String>,
    /// All plugins involved, for [`DiagnosticKind::CircularDependency`].
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<String>,
    /// Human-readable description.
    pub message: String,
    /// Error or warning.
    pub severity: Severity,
}

impl Diagnostic {
    /// Creates a diagnostic with no related plugin, capability, or members.
    #[must_use]
    pub fn new(
        kind: DiagnosticKind,
        severity: Severity,
        plugin: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            plugin: plugin.into(),
            related_plugin: None,
            capability: None,
            members: Vec::new(),
            message: message.into(),
            severity,
        }
    }

    /// Shorthand for an error-severity diagnostic.
    #[must_use]
    pub fn error(kind: DiagnosticKind, plugin: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(kind, Severity::Error, plugin, message)
    }

    /// Shorthand for a warning-severity diagnostic.
    #[must_use]
    pub fn warning(
        kind: DiagnosticKind,
        plugin: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(kind, Severity::Warning, plugin, message)
    }

    /// Attaches a related plugin.
    #[must_use]
    pub fn with_related(mut self, plugin: impl Into<String>) -> Self {
        self.related_plugin = Some(plugin.into());
        self
    }

    /// Attaches the capability involved.
    #[must_use]
    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capability = Some(capability.into());
        self
    }

    /// Attaches the full list of involved plugins.
    #[must_use]
    pub fn with_members(mut self, members: Vec<String>) -> Self {
        self.members = members;
        self
    }

    /// Returns true for error-severity diagnostics.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Returns true if `name` is the offending plugin, the related plugin,
    /// or one of the members.
    #[must_use]
    pub fn involves(&self, name: &str) -> bool {
        self.plugin == name
            || self.related_plugin.as_deref() == Some(name)
            || self.members.iter().any(|member| member == name)
    }

    /// Emits this diagnostic to the `tracing` sink at a level matching its
    /// severity.
    pub fn emit(&self) {
        match self.severity {
            Severity::Error => tracing::error!(
                kind = %self.kind,
                plugin = %self.plugin,
                related = ?self.related_plugin,
                "{}",
                self.message
            ),
            Severity::Warning => tracing::warn!(
                kind = %self.kind,
                plugin = %self.plugin,
                related = ?self.related_plugin,
                "{}",
                self.message
            ),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}] {}: {}",
            self.severity, self.kind, self.plugin, self.message
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Diagnostics
// ─────────────────────────────────────────────────────────────────────────────

/// Ordered accumulator of [`Diagnostic`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Creates an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a diagnostic.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    /// Appends every diagnostic from `other`, preserving order.
    pub fn append(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    /// Iterates over all diagnostics in the order they were produced.
    pub fn iter(&self) -> core::slice::Iter<'_, Diagnostic> {
        self.items.iter()
    }

    /// Iterates over error-severity diagnostics.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> + '_ {
        self.items.iter().filter(|d| d.severity == Severity::Error)
    }

    /// Iterates over warning-severity diagnostics.
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> + '_ {
        self.items.iter().filter(|d| d.severity == Severity::Warning)
    }

    /// Iterates over diagnostics of one kind.
    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> + '_ {
        self.items.iter().filter(move |d| d.kind == kind)
    }

    /// Returns true if any diagnostic has error severity.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.items.iter().any(Diagnostic::is_error)
    }

    /// Returns the number of error-severity diagnostics.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    /// Returns the number of diagnostics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if there are no diagnostics.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the diagnostics as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.items
    }

    /// Emits every diagnostic to the `tracing` sink.
    pub fn emit_all(&self) {
        for diagnostic in &self.items {
            diagnostic.emit();
        }
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = core::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl Extend<Diagnostic> for Diagnostics {
    fn extend<T: IntoIterator<Item = Diagnostic>>(&mut self, iter: T) {
        self.items.extend(iter);
    }
}

impl FromIterator<Diagnostic> for Diagnostics {
    fn from_iter<T: IntoIterator<Item = Diagnostic>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}
