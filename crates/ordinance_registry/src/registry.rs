//! Insertion-ordered plugin registry.

use indexmap::IndexMap;

use crate::error::RegistryError;
use crate::metadata::PluginMetadata;

/// How a registry reacts to a second registration under an existing name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RegistrationPolicy {
    /// Reject the registration with [`RegistryError::DuplicateName`].
    #[default]
    Reject,
    /// Replace the existing metadata in place, keeping its original
    /// registration position.
    ///
    /// Intended for isolated registries built by tests.
    Overwrite,
}

/// Insertion-ordered store of [`PluginMetadata`] keyed by plugin name.
///
/// The registry is built once (typically at startup) and then shared
/// read-only with every scheduling call. Registration order is significant:
/// it is the deterministic tie-break used when several plugins are free to
/// run at the same time.
///
/// The registry is a plain value. Hosts construct it explicitly and pass it
/// to the scheduler; wrap it in an `Arc` to share it across threads.
///
/// # Example
///
/// ```
/// use ordinance_registry::{Phase, PluginMetadata, PluginRegistry, RegistryError};
///
/// let mut registry = PluginRegistry::new();
/// registry.register(PluginMetadata::new("headers", Phase::StructureParsing)).unwrap();
///
/// let err = registry
///     .register(PluginMetadata::new("headers", Phase::StructureParsing))
///     .unwrap_err();
/// assert_eq!(err, RegistryError::DuplicateName("headers".into()));
/// ```
#[derive(Debug, Clone, Default)]
pub struct PluginRegistry {
    plugins: IndexMap<String, PluginMetadata>,
    policy: RegistrationPolicy,
}

impl PluginRegistry {
    /// Creates an empty registry that rejects duplicate names.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry that overwrites duplicate names in place.
    #[must_use]
    pub fn with_overwrite() -> Self {
        Self {
            plugins: IndexMap::new(),
            policy: RegistrationPolicy::Overwrite,
        }
    }

    /// Returns the registration policy.
    #[must_use]
    pub fn policy(&self) -> RegistrationPolicy {
        self.policy
    }

    /// Registers plugin metadata.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::EmptyName`] if the name is blank
    /// - [`RegistryError::DuplicateName`] if the name is already registered
    ///   and the policy is [`RegistrationPolicy::Reject`]
    pub fn register(&mut self, metadata: PluginMetadata) -> Result<(), RegistryError> {
        if metadata.name.trim().is_empty() {
            return Err(RegistryError::EmptyName);
        }

        if let Some(existing) = self.plugins.get_mut(&metadata.name) {
            return match self.policy {
                RegistrationPolicy::Reject => Err(RegistryError::DuplicateName(metadata.name)),
                RegistrationPolicy::Overwrite => {
                    *existing = metadata;
                    Ok(())
                }
            };
        }

        self.plugins.insert(metadata.name.clone(), metadata);
        Ok(())
    }

    /// Registers every item in order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first error reported by [`register`](Self::register).
    /// Items before the failing one stay registered.
    pub fn register_all<I>(&mut self, plugins: I) -> Result<(), RegistryError>
    where
        I: IntoIterator<Item = PluginMetadata>,
    {
        for metadata in plugins {
            self.register(metadata)?;
        }
        Ok(())
    }

    /// Looks up metadata by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PluginMetadata> {
        self.plugins.get(name)
    }

    /// Returns true if a plugin with this name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.plugins.contains_key(name)
    }

    /// Returns the zero-based registration position of `name`.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.plugins.get_index_of(name)
    }

    /// Iterates over all metadata in registration order.
    ///
    /// The iterator is cheap to clone, so it can be restarted freely.
    pub fn all(&self) -> indexmap::map::Values<'_, String, PluginMetadata> {
        self.plugins.values()
    }

    /// Iterates over all plugin names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.plugins.keys().map(String::as_str)
    }

    /// Iterates over every registered plugin advertising `capability`, in
    /// registration order.
    pub fn providers_of<'a>(
        &'a self,
        capability: &'a str,
    ) -> impl Iterator<Item = &'a PluginMetadata> + 'a {
        self.all()
            .filter(move |metadata| metadata.provides_capability(capability))
    }

    /// Returns the number of registered plugins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Returns true if no plugins are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl<'a> IntoIterator for &'a PluginRegistry {
    type Item = &'a PluginMetadata;
    type IntoIter = indexmap::map::Values<'a, String, PluginMetadata>;

    fn into_iter(self) -> Self::IntoIter {
        self.all()
    }
}
