use std::{collections::HashMap, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::tree::ids::StructureKey;

/// Deduplicating store for molecular structures.
///
/// Each key maps to the canonical string of its molecule, and each canonical
/// string maps to exactly one shared object. Two keys registered with equal
/// canonical strings therefore resolve to the same `Arc`, however the molecule
/// was reached. The registry belongs to one planner run and is dropped with it.
#[derive(Debug, Clone)]
pub struct StructureRegistry<M> {
    keys: HashMap<StructureKey, String>,
    store: HashMap<String, Arc<M>>,
}

impl<M> Default for StructureRegistry<M> {
    fn default() -> Self {
        StructureRegistry {
            keys: HashMap::new(),
            store: HashMap::new(),
        }
    }
}

impl<M> StructureRegistry<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `structure` under `key` and return the shared object.
    /// When the canonical form is already stored, the incoming value is dropped
    /// and the existing object is returned.
    pub fn insert(&mut self, key: StructureKey, structure: M, canonical: String) -> Arc<M> {
        let shared = self
            .store
            .entry(canonical.clone())
            .or_insert_with(|| Arc::new(structure))
            .clone();
        self.keys.insert(key, canonical);
        shared
    }

    /// Resolve a key to its shared structure.
    pub fn get(&self, key: StructureKey) -> Option<&Arc<M>> {
        self.keys
            .get(&key)
            .and_then(|canonical| self.store.get(canonical))
    }

    /// Look a structure up by canonical string.
    pub fn get_by_canonical(&self, canonical: &str) -> Option<&Arc<M>> {
        self.store.get(canonical)
    }

    /// Canonical string registered for a key.
    pub fn canonical(&self, key: StructureKey) -> Option<&str> {
        self.keys.get(&key).map(String::as_str)
    }

    pub fn contains_key(&self, key: StructureKey) -> bool {
        self.keys.contains_key(&key)
    }

    /// Forget a key. The shared object stays in the store because other keys may use it.
    pub fn remove(&mut self, key: StructureKey) -> Option<String> {
        self.keys.remove(&key)
    }

    /// Number of registered keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Number of distinct canonical objects held.
    pub fn unique_structures(&self) -> usize {
        self.store.len()
    }
}

impl<M: Clone> StructureRegistry<M> {
    /// Capture keys and store in a serializable, deterministic order.
    pub fn snapshot(&self) -> RegistrySnapshot<M> {
        let mut keys: Vec<(u64, String)> = self
            .keys
            .iter()
            .map(|(key, canonical)| (key.value(), canonical.clone()))
            .collect();
        keys.sort_by_key(|(key, _)| *key);

        let mut store: Vec<(String, M)> = self
            .store
            .iter()
            .map(|(canonical, structure)| (canonical.clone(), structure.as_ref().clone()))
            .collect();
        store.sort_by(|a, b| a.0.cmp(&b.0));

        RegistrySnapshot { keys, store }
    }

    /// Rebuild a live registry; every key must point at a stored canonical form.
    pub fn from_snapshot(snapshot: RegistrySnapshot<M>) -> Result<Self, String> {
        let store: HashMap<String, Arc<M>> = snapshot
            .store
            .into_iter()
            .map(|(canonical, structure)| (canonical, Arc::new(structure)))
            .collect();

        let mut keys = HashMap::with_capacity(snapshot.keys.len());
        for (key, canonical) in snapshot.keys {
            if !store.contains_key(&canonical) {
                return Err(format!(
                    "key {key} references unknown structure '{canonical}'"
                ));
            }
            keys.insert(StructureKey::from(key), canonical);
        }

        Ok(StructureRegistry { keys, store })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Serialized form of a [`StructureRegistry`].
pub struct RegistrySnapshot<M> {
    pub keys: Vec<(u64, String)>,
    pub store: Vec<(String, M)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_canonical_forms_share_one_object() {
        let mut registry = StructureRegistry::new();
        let a = registry.insert(StructureKey::from(1), "C.O".to_string(), "C.O".to_string());
        let b = registry.insert(StructureKey::from(2), "O.C".to_string(), "C.O".to_string());

        assert!(Arc::ptr_eq(&a, &b));
        let resolved_a = registry.get(StructureKey::from(1)).expect("key 1");
        let resolved_b = registry.get(StructureKey::from(2)).expect("key 2");
        assert!(Arc::ptr_eq(resolved_a, resolved_b));
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.unique_structures(), 1);
    }

    #[test]
    fn removing_a_key_keeps_the_shared_object() {
        let mut registry = StructureRegistry::new();
        registry.insert(StructureKey::from(1), "N", "N".to_string());
        registry.insert(StructureKey::from(2), "N", "N".to_string());

        assert_eq!(registry.remove(StructureKey::from(1)).as_deref(), Some("N"));
        assert!(registry.get(StructureKey::from(1)).is_none());
        assert!(registry.get(StructureKey::from(2)).is_some());
        assert!(registry.get_by_canonical("N").is_some());

        registry.remove(StructureKey::from(2));
        assert!(registry.is_empty());
        assert_eq!(registry.unique_structures(), 1);
    }

    #[test]
    fn snapshot_rejects_dangling_keys() {
        let snapshot: RegistrySnapshot<String> = RegistrySnapshot {
            keys: vec![(3, "missing".to_string())],
            store: Vec::new(),
        };
        assert!(StructureRegistry::from_snapshot(snapshot).is_err());
    }
}
