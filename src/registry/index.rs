//! Normalized alias → person index.
//!
//! The forward map answers lookups; the reverse map records which keys each
//! record owns so a merged-away record can release exactly its own keys.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::config::AliasNormalization;
use crate::person::PersonId;

#[derive(Debug, Clone, Default)]
pub(crate) struct AliasIndex {
    normalization: AliasNormalization,
    forward: HashMap<String, PersonId>,
    owned: HashMap<PersonId, HashSet<String>>,
}

impl AliasIndex {
    pub(crate) fn new(normalization: AliasNormalization) -> Self {
        Self {
            normalization,
            ..Self::default()
        }
    }

    pub(crate) fn key(&self, alias: &str) -> String {
        self.normalization.apply(alias)
    }

    pub(crate) fn get(&self, alias: &str) -> Option<PersonId> {
        self.forward.get(&self.key(alias)).copied()
    }

    /// Points `alias` at `id`, taking the key from any previous owner.
    pub(crate) fn claim(&mut self, alias: &str, id: PersonId) {
        let key = self.key(alias);
        if let Some(previous) = self.forward.insert(key.clone(), id) {
            if previous != id {
                self.disown(previous, &key);
            }
        }
        self.owned.entry(id).or_default().insert(key);
    }

    /// Points `alias` at `id` only if no record holds it yet.
    pub(crate) fn insert_if_vacant(&mut self, alias: &str, id: PersonId) -> bool {
        let key = self.key(alias);
        if self.forward.contains_key(&key) {
            return false;
        }
        self.forward.insert(key.clone(), id);
        self.owned.entry(id).or_default().insert(key);
        true
    }

    /// Removes every key owned by `id`. Returns how many were removed.
    pub(crate) fn release_all(&mut self, id: PersonId) -> usize {
        let Some(keys) = self.owned.remove(&id) else {
            return 0;
        };
        let mut released = 0;
        for key in keys {
            if self.forward.get(&key) == Some(&id) {
                self.forward.remove(&key);
                released += 1;
            }
        }
        released
    }

    /// Removes `alias` if `id` holds it. Anything else is logged and
    /// ignored.
    pub(crate) fn release(&mut self, alias: &str, id: PersonId) -> bool {
        let key = self.key(alias);
        match self.forward.get(&key).copied() {
            Some(holder) if holder == id => {
                self.forward.remove(&key);
                self.disown(id, &key);
                true
            }
            Some(holder) => {
                debug!(alias, %id, %holder, "alias is held by another record");
                false
            }
            None => {
                debug!(alias, %id, "alias was never indexed");
                false
            }
        }
    }

    pub(crate) fn clear(&mut self) {
        self.forward.clear();
        self.owned.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.forward.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, PersonId)> {
        self.forward.iter().map(|(k, id)| (k.as_str(), *id))
    }

    pub(crate) fn owners(&self) -> impl Iterator<Item = (PersonId, &HashSet<String>)> {
        self.owned.iter().map(|(id, keys)| (*id, keys))
    }

    fn disown(&mut self, id: PersonId, key: &str) {
        if let Some(keys) = self.owned.get_mut(&id) {
            keys.remove(key);
            if keys.is_empty() {
                self.owned.remove(&id);
            }
        }
    }
}
