//! Canonical person records.
//!
//! A [`Person`] is one resolved individual (or, before merging, one candidate
//! spelling). Records live in the registry arena and are addressed by
//! [`PersonId`]; equality and hashing go through the id, so a record can be
//! mutated without invalidating any index keyed on it. Content comparison is
//! the explicit [`Person::same_content`].

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::parser::ParsedName;
use crate::tally::Tally;

/// Returned by [`Person::most_likely_position`] when nothing is known.
pub const NO_POSITIONS: &str = "no positions available";

/// Stable arena identifier of a person record. Ids are never reused.
///
/// # Examples
///
/// ```
/// use namesake::PersonId;
///
/// let id = PersonId::from_raw(7);
/// assert_eq!(id.as_u64(), 7);
/// assert_eq!(id.to_string(), "#7");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(u64);

impl PersonId {
    /// Wraps a raw id.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw id.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns the id following this one.
    #[must_use]
    pub(crate) const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A resolved person with its alias and position evidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    pub(crate) id: PersonId,
    pub(crate) last: String,
    pub(crate) first: String,
    pub(crate) middle: String,
    pub(crate) positions: Tally,
    pub(crate) aliases: Tally,
    pub(crate) count: u64,
}

impl Person {
    /// Builds a record for the first sighting of `raw`.
    pub(crate) fn from_parsed(id: PersonId, parsed: &ParsedName, raw: &str, count: u64) -> Self {
        let mut aliases = Tally::new();
        aliases.add(raw, count);
        Self {
            id,
            last: parsed.last.to_uppercase(),
            first: parsed.first.to_uppercase(),
            middle: parsed.middle.to_uppercase(),
            positions: parsed.positions.clone(),
            aliases,
            count,
        }
    }

    /// Arena id.
    #[must_use]
    pub const fn id(&self) -> PersonId {
        self.id
    }

    /// Last name, upper case.
    #[must_use]
    pub fn last(&self) -> &str {
        &self.last
    }

    /// First name or initial, upper case. May be empty.
    #[must_use]
    pub fn first(&self) -> &str {
        &self.first
    }

    /// Middle name or initial, upper case. May be empty.
    #[must_use]
    pub fn middle(&self) -> &str {
        &self.middle
    }

    /// Position evidence.
    #[must_use]
    pub fn positions(&self) -> &Tally {
        &self.positions
    }

    /// Every raw string that resolved to this person.
    #[must_use]
    pub fn aliases(&self) -> &Tally {
        &self.aliases
    }

    /// Total number of source occurrences.
    #[must_use]
    pub const fn count(&self) -> u64 {
        self.count
    }

    /// `"FIRST MIDDLE LAST"` with empty parts left out.
    #[must_use]
    pub fn full_name(&self) -> String {
        [&self.first, &self.middle, &self.last]
            .into_iter()
            .filter(|part| !part.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Highest-count position, earliest seen on ties, or [`NO_POSITIONS`].
    #[must_use]
    pub fn most_likely_position(&self) -> &str {
        self.positions
            .most_common()
            .map_or(NO_POSITIONS, |(position, _)| position)
    }

    /// Content equality: name, positions and aliases. Ids and counts are
    /// not compared.
    #[must_use]
    pub fn same_content(&self, other: &Self) -> bool {
        self.last == other.last
            && self.first == other.first
            && self.middle == other.middle
            && self.positions == other.positions
            && self.aliases == other.aliases
    }

    /// Order-independent digest of the record content.
    #[must_use]
    pub fn fingerprint(&self) -> blake3::Hash {
        let mut hasher = blake3::Hasher::new();
        for part in [&self.last, &self.first, &self.middle] {
            hash_str(&mut hasher, part);
        }
        for tally in [&self.positions, &self.aliases] {
            let entries = tally.sorted_entries();
            hasher.update(&(entries.len() as u64).to_le_bytes());
            for (key, n) in entries {
                hash_str(&mut hasher, key);
                hasher.update(&n.to_le_bytes());
            }
        }
        hasher.finalize()
    }
}

fn hash_str(hasher: &mut blake3::Hasher, s: &str) {
    hasher.update(&(s.len() as u64).to_le_bytes());
    hasher.update(s.as_bytes());
}

impl PartialEq for Person {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Person {}

impl Hash for Person {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
