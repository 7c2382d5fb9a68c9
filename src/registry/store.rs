//! In-memory adapter registry store.
//!
//! A mutex-guarded map from adapter id to descriptor. The store owns all
//! stored data; callers only ever receive independent deep copies.

use std::collections::BTreeMap;

use parking_lot::Mutex;
use thiserror::Error;

use super::entry::AdapterEntry;

/// Errors surfaced by registry operations.
#[derive(Debug, Error, PartialEq)]
pub enum RegistryError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Adapter not found: {0}")]
    NotFound(String),

    #[error("Out of memory")]
    OutOfMemory,
}

/// Thread-safe catalog of LoRA adapter descriptors.
///
/// All operations serialize on a single lock; critical sections are
/// bounded by allocation cost and never wait on another component.
/// Iteration order is by adapter id, not insertion order, so enumeration
/// is deterministic.
pub struct AdapterRegistry {
    entries: Mutex<BTreeMap<String, AdapterEntry>>,
}

impl AdapterRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { entries: Mutex::new(BTreeMap::new()) }
    }

    /// Register an adapter, replacing any prior entry with the same id.
    ///
    /// The entry is deep-copied; the caller retains ownership of the
    /// original. The copy is fully constructed before the store is
    /// touched, so a failed copy leaves the registry unchanged; any
    /// prior value under the id is released only after the swap.
    pub fn register(&self, entry: &AdapterEntry) -> Result<(), RegistryError> {
        self.register_via(entry, AdapterEntry::try_clone)
    }

    /// Copy-then-swap seam: `copy` produces the stored value.
    ///
    /// Kept separate from [`register`](Self::register) so tests can
    /// inject a failing copy and observe the rollback contract.
    fn register_via<F>(&self, entry: &AdapterEntry, copy: F) -> Result<(), RegistryError>
    where
        F: FnOnce(&AdapterEntry) -> Result<AdapterEntry, RegistryError>,
    {
        if entry.id.is_empty() {
            return Err(RegistryError::InvalidArgument("adapter id is required".into()));
        }
        let stored = copy(entry)?;
        let mut entries = self.entries.lock();
        let replaced = entries.insert(stored.id.clone(), stored);
        drop(entries);
        // Prior value (if any) is dropped here, after the swap committed.
        drop(replaced);
        tracing::debug!(adapter_id = %entry.id, "LoRA adapter registered");
        Ok(())
    }

    /// Remove an adapter by id.
    pub fn remove(&self, adapter_id: &str) -> Result<(), RegistryError> {
        let mut entries = self.entries.lock();
        match entries.remove(adapter_id) {
            Some(_) => {
                tracing::debug!(adapter_id, "LoRA adapter removed");
                Ok(())
            }
            None => Err(RegistryError::NotFound(adapter_id.to_string())),
        }
    }

    /// Get a deep copy of one adapter entry.
    pub fn get(&self, adapter_id: &str) -> Result<AdapterEntry, RegistryError> {
        let entries = self.entries.lock();
        entries
            .get(adapter_id)
            .ok_or_else(|| RegistryError::NotFound(adapter_id.to_string()))?
            .try_clone()
    }

    /// Get deep copies of every entry, ordered by adapter id.
    ///
    /// An empty registry yields an empty vec, not an error.
    pub fn get_all(&self) -> Result<Vec<AdapterEntry>, RegistryError> {
        let entries = self.entries.lock();
        let mut out = Vec::new();
        out.try_reserve_exact(entries.len())
            .map_err(|_| RegistryError::OutOfMemory)?;
        for entry in entries.values() {
            out.push(entry.try_clone()?);
        }
        Ok(out)
    }

    /// Get deep copies of every entry compatible with `model_id`.
    ///
    /// Linear scan with exact string matching. No index is maintained:
    /// catalogs are small and queries infrequent.
    pub fn get_for_model(&self, model_id: &str) -> Result<Vec<AdapterEntry>, RegistryError> {
        let entries = self.entries.lock();
        let mut out = Vec::new();
        for entry in entries.values() {
            if entry.is_compatible_with(model_id) {
                out.push(entry.try_clone()?);
            }
        }
        Ok(out)
    }

    /// Number of registered adapters.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// True if no adapters are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, models: &[&str]) -> AdapterEntry {
        let mut e = AdapterEntry::new(id);
        e.compatible_model_ids = models.iter().map(|m| m.to_string()).collect();
        e
    }

    #[test]
    fn register_rejects_empty_id() {
        let registry = AdapterRegistry::new();
        let err = registry.register(&AdapterEntry::new("")).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidArgument(_)));
        assert!(registry.is_empty());
    }

    #[test]
    fn failed_copy_leaves_prior_value_intact() {
        let registry = AdapterRegistry::new();
        let mut first = entry("lora1", &["modelA"]);
        first.default_scale = 0.5;
        registry.register(&first).unwrap();

        let mut second = entry("lora1", &["modelB"]);
        second.default_scale = 0.9;
        let err = registry
            .register_via(&second, |_| Err(RegistryError::OutOfMemory))
            .unwrap_err();
        assert_eq!(err, RegistryError::OutOfMemory);

        let stored = registry.get("lora1").unwrap();
        assert_eq!(stored.default_scale, 0.5);
        assert_eq!(stored.compatible_model_ids, vec!["modelA".to_string()]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn enumeration_is_ordered_by_id() {
        let registry = AdapterRegistry::new();
        registry.register(&entry("zeta", &[])).unwrap();
        registry.register(&entry("alpha", &[])).unwrap();
        registry.register(&entry("mid", &[])).unwrap();

        let ids: Vec<String> =
            registry.get_all().unwrap().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["alpha", "mid", "zeta"]);
    }
}
