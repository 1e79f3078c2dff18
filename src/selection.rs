//! Model selection state.
//!
//! Selection changes are expressed as [`SelectionCommand`] values fed
//! through [`reduce`], a pure function of the previous set. Whatever front
//! end is driving the console (CLI flags today) only produces commands.

use std::collections::BTreeSet;

use crate::catalog::{ModelCatalog, UnknownModelError};

/// Subset of catalog display names currently chosen. Starts empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    names: BTreeSet<String>,
}

impl SelectionSet {
    /// Whether nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Number of selected models.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether `name` is selected.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Selected names (sorted, not catalog order).
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

/// A requested change to the selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionCommand {
    /// Add the model if absent, remove it if present.
    Toggle(String),
    /// Deselect everything.
    Clear,
}

/// Apply one command to a selection.
///
/// # Errors
///
/// Returns [`UnknownModelError`] when a toggle names a model the catalog
/// does not have. The previous state is left untouched in that case.
pub fn reduce(
    catalog: &ModelCatalog,
    state: &SelectionSet,
    command: &SelectionCommand,
) -> Result<SelectionSet, UnknownModelError> {
    match command {
        SelectionCommand::Toggle(name) => {
            if !catalog.contains(name) {
                return Err(UnknownModelError { name: name.clone() });
            }
            let mut next = state.clone();
            if !next.names.remove(name) {
                next.names.insert(name.clone());
            }
            Ok(next)
        }
        SelectionCommand::Clear => Ok(SelectionSet::default()),
    }
}

/// Resolve selected names to artifact paths in catalog order.
///
/// The order of `selection` never affects the output, which keeps worker
/// arguments deterministic.
///
/// # Errors
///
/// Returns [`UnknownModelError`] if the selection names a model outside the
/// catalog.
pub fn resolve_artifact_paths(
    catalog: &ModelCatalog,
    selection: &SelectionSet,
) -> Result<Vec<String>, UnknownModelError> {
    if let Some(stray) = selection.iter().find(|name| !catalog.contains(name)) {
        return Err(UnknownModelError {
            name: stray.to_owned(),
        });
    }
    Ok(catalog
        .entries()
        .filter(|entry| selection.contains(entry.name))
        .map(|entry| entry.artifact_path.to_owned())
        .collect())
}

/// Catalog plus the current session's selection. Not persisted.
#[derive(Debug, Clone, Default)]
pub struct ModelSelectionRegistry {
    catalog: ModelCatalog,
    selection: SelectionSet,
}

impl ModelSelectionRegistry {
    /// Start a session over `catalog` with nothing selected.
    pub fn new(catalog: ModelCatalog) -> Self {
        Self {
            catalog,
            selection: SelectionSet::default(),
        }
    }

    /// The catalog backing this registry.
    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    /// Apply a command to the current selection.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownModelError`] for unrecognised names.
    pub fn apply(&mut self, command: &SelectionCommand) -> Result<(), UnknownModelError> {
        self.selection = reduce(&self.catalog, &self.selection, command)?;
        Ok(())
    }

    /// Flip membership of `name`.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownModelError`] for unrecognised names.
    pub fn toggle(&mut self, name: &str) -> Result<(), UnknownModelError> {
        self.apply(&SelectionCommand::Toggle(name.to_owned()))
    }

    /// Current selection.
    pub fn selected(&self) -> &SelectionSet {
        &self.selection
    }

    /// Artifact paths for `selection`, in catalog order.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownModelError`] if `selection` names an unknown model.
    pub fn resolve_artifact_paths(
        &self,
        selection: &SelectionSet,
    ) -> Result<Vec<String>, UnknownModelError> {
        resolve_artifact_paths(&self.catalog, selection)
    }
}
