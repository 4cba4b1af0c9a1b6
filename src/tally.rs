//! Insertion-ordered multiset of strings.
//!
//! `Tally` backs both the position evidence and the alias list of a
//! [`Person`](crate::Person). Counts accumulate on every insert; iteration
//! order is first-seen order, which is what breaks ties when picking the most
//! common entry. Equality ignores order.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A string multiset with first-seen ordering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tally(IndexMap<String, u64>);

impl Tally {
    /// Creates an empty tally.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `n` occurrences of `key`.
    pub fn add(&mut self, key: impl Into<String>, n: u64) {
        let slot = self.0.entry(key.into()).or_insert(0);
        *slot = slot.saturating_add(n);
    }

    /// Overwrites the count of `key`, keeping its original position if it was
    /// already present.
    pub fn set(&mut self, key: impl Into<String>, n: u64) {
        self.0.insert(key.into(), n);
    }

    /// Adds every entry of `other` into this tally.
    pub fn absorb(&mut self, other: &Tally) {
        for (key, n) in &other.0 {
            self.add(key.clone(), *n);
        }
    }

    /// Returns the sum of both tallies without modifying either.
    #[must_use]
    pub fn combined(&self, other: &Tally) -> Tally {
        let mut out = self.clone();
        out.absorb(other);
        out
    }

    /// Returns the count for `key` (zero when absent).
    #[must_use]
    pub fn get(&self, key: &str) -> u64 {
        self.0.get(key).copied().unwrap_or(0)
    }

    /// Returns true if `key` has been seen.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no key has been seen.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of all counts.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.0.values().fold(0u64, |acc, n| acc.saturating_add(*n))
    }

    /// Iterates `(key, count)` in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(k, n)| (k.as_str(), *n))
    }

    /// Iterates keys in first-seen order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Returns the entry with the highest count; the earliest-seen entry wins
    /// ties.
    #[must_use]
    pub fn most_common(&self) -> Option<(&str, u64)> {
        let mut best: Option<(&str, u64)> = None;
        for (key, n) in self.iter() {
            match best {
                Some((_, top)) if top >= n => {}
                _ => best = Some((key, n)),
            }
        }
        best
    }

    /// Entries sorted by key, for order-independent hashing.
    #[must_use]
    pub fn sorted_entries(&self) -> Vec<(&str, u64)> {
        let mut entries: Vec<(&str, u64)> = self.iter().collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

impl FromIterator<(String, u64)> for Tally {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        let mut out = Tally::new();
        for (key, n) in iter {
            out.add(key, n);
        }
        out
    }
}

impl<'a> FromIterator<&'a str> for Tally {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut out = Tally::new();
        for key in iter {
            out.add(key, 1);
        }
        out
    }
}
