//! Compiled-in catalog of detection models.

use thiserror::Error;

/// A name that is not in the catalog was used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown detection model: {name}")]
pub struct UnknownModelError {
    /// The unrecognised display name.
    pub name: String,
}

/// One detection model: what the operator sees and what the worker loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Display name shown to the operator.
    pub name: &'static str,
    /// Filesystem path of the model artifact handed to the worker.
    pub artifact_path: &'static str,
}

const DEFAULT_ENTRIES: &[CatalogEntry] = &[
    CatalogEntry {
        name: "Detect Accident",
        artifact_path: "accident_detection.pt",
    },
    CatalogEntry {
        name: "Fire Accident Detection",
        artifact_path: "activity_detection.pt",
    },
    CatalogEntry {
        name: "Shop Lift",
        artifact_path: "shoplift.pt",
    },
    CatalogEntry {
        name: "Human Activity",
        artifact_path: "yolov8n-pose.pt",
    },
    CatalogEntry {
        name: "Precrime Detection",
        artifact_path: "precrime.pt",
    },
    CatalogEntry {
        name: "Weapon Detection",
        artifact_path: "weapon_detection.pt",
    },
];

/// Ordered, immutable display-name to artifact-path mapping.
///
/// Iteration order is the catalog order and is what fixes the order of
/// artifact paths on the worker command line.
#[derive(Debug, Clone, Copy)]
pub struct ModelCatalog {
    entries: &'static [CatalogEntry],
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_ENTRIES)
    }
}

impl ModelCatalog {
    /// Build a catalog over a fixed entry list.
    pub const fn new(entries: &'static [CatalogEntry]) -> Self {
        Self { entries }
    }

    /// Entries in catalog order.
    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter()
    }

    /// Number of models in the catalog.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog has no models.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry by display name.
    pub fn get(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    /// Whether `name` is a known display name.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Artifact path for `name`.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownModelError`] when `name` is not in the catalog.
    pub fn artifact_path(&self, name: &str) -> Result<&'static str, UnknownModelError> {
        self.get(name)
            .map(|entry| entry.artifact_path)
            .ok_or_else(|| UnknownModelError {
                name: name.to_owned(),
            })
    }
}
