//! Name-keyed diff between a target snapshot and a source snapshot.

use std::collections::HashSet;

use crate::model::{normalize_name, Named};

/// Entries to create in, and delete from, the target store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileResult<E> {
    /// Entries of the updated snapshot missing from the original one.
    pub create: Vec<E>,
    /// Entries of the original snapshot missing from the updated one.
    pub delete: Vec<E>,
}

impl<E> ReconcileResult<E> {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.create.is_empty() && self.delete.is_empty()
    }
}

impl<E> Default for ReconcileResult<E> {
    fn default() -> Self {
        Self {
            create: Vec::new(),
            delete: Vec::new(),
        }
    }
}

/// Computes the create/delete sets turning `original` into `updated`.
///
/// Names are compared case-insensitively and exactly. Entries present on both
/// sides appear in neither set, whatever their other attributes. A name that
/// occurs more than once on one side yields at most one entry.
pub fn reconcile<E>(original: &[E], updated: &[E]) -> ReconcileResult<E>
where
    E: Named + Clone,
{
    let original_names: HashSet<String> =
        original.iter().map(|e| normalize_name(e.name())).collect();
    let updated_names: HashSet<String> =
        updated.iter().map(|e| normalize_name(e.name())).collect();

    ReconcileResult {
        create: missing_from(updated, &original_names),
        delete: missing_from(original, &updated_names),
    }
}

fn missing_from<E>(entries: &[E], other: &HashSet<String>) -> Vec<E>
where
    E: Named + Clone,
{
    let mut seen = HashSet::new();
    entries
        .iter()
        .filter(|e| {
            let key = normalize_name(e.name());
            !other.contains(&key) && seen.insert(key)
        })
        .cloned()
        .collect()
}
