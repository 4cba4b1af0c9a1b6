//! Organization canonicalization dictionary.
//!
//! Maps raw organization spellings found in document metadata ("B&W",
//! "COVINGTON AND BURLING") to a clean name ("Brown & Williamson",
//! "Covington & Burling"). The clean name [`SKIP_SENTINEL`] marks known noise
//! tokens such as "UNK" that should be dropped entirely.
//!
//! Entries come from two places:
//! - **curated** entries loaded from the JSON table; only these are searched
//!   for as substrings of raw names by the parser
//! - **observed** entries added by the registry as self-mappings for
//!   positions seen in the data; they only affect [`OrgDictionary::lookup`]

use std::collections::BTreeMap;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Clean name marking a raw organization string as noise.
pub const SKIP_SENTINEL: &str = "@skip@";

/// Where a dictionary entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryOrigin {
    /// Loaded from the curated clean-name table.
    Curated,
    /// Added at runtime from positions observed in the data.
    Observed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct OrgEntry {
    clean: String,
    origin: EntryOrigin,
}

/// Whole-word matcher for one curated raw organization string.
#[derive(Debug, Clone)]
pub(crate) struct OrgMatcher {
    pub(crate) raw: String,
    pub(crate) clean: String,
    pub(crate) pattern: Regex,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct OrgDictionaryRepr {
    entries: BTreeMap<String, OrgEntry>,
}

/// Raw organization name → clean organization name lookup table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "OrgDictionaryRepr", into = "OrgDictionaryRepr")]
pub struct OrgDictionary {
    entries: BTreeMap<String, OrgEntry>,
    matchers: Vec<OrgMatcher>,
}

impl OrgDictionary {
    /// Creates an empty dictionary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a dictionary from a clean-name → raw-variants table.
    ///
    /// Every clean name also maps to itself.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] if a raw variant cannot be turned into
    /// a matcher.
    pub fn from_clean_to_raw<I, V>(table: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, V)>,
        V: IntoIterator<Item = String>,
    {
        let mut entries = BTreeMap::new();
        for (clean, variants) in table {
            for raw in variants {
                entries.insert(
                    raw,
                    OrgEntry {
                        clean: clean.clone(),
                        origin: EntryOrigin::Curated,
                    },
                );
            }
            entries.insert(
                clean.clone(),
                OrgEntry {
                    clean,
                    origin: EntryOrigin::Curated,
                },
            );
        }
        Self::from_entries(entries)
    }

    /// Parses the JSON form `{"Clean Name": ["RAW 1", "RAW 2"], ...}`.
    ///
    /// # Errors
    /// Returns [`ConfigError::Decode`] on malformed JSON.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let table: BTreeMap<String, Vec<String>> =
            serde_json::from_str(json).map_err(|e| ConfigError::Decode {
                what: "organization dictionary".to_string(),
                message: e.to_string(),
            })?;
        Self::from_clean_to_raw(table)
    }

    /// Reads and parses a JSON dictionary file.
    ///
    /// # Errors
    /// Returns [`ConfigError::Read`] if the file cannot be read, or a decode
    /// error from [`OrgDictionary::from_json_str`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json_str(&json)
    }

    fn from_entries(entries: BTreeMap<String, OrgEntry>) -> Result<Self, ConfigError> {
        let mut dict = Self {
            entries,
            matchers: Vec::new(),
        };
        dict.rebuild_matchers()?;
        Ok(dict)
    }

    fn rebuild_matchers(&mut self) -> Result<(), ConfigError> {
        let mut matchers = Vec::new();
        for (raw, entry) in &self.entries {
            if entry.origin != EntryOrigin::Curated || raw.trim().is_empty() || is_skip(raw) {
                continue;
            }
            let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(raw))).map_err(|e| {
                ConfigError::Invalid {
                    reason: format!("organization {raw:?} cannot be matched: {e}"),
                }
            })?;
            matchers.push(OrgMatcher {
                raw: raw.clone(),
                clean: entry.clean.clone(),
                pattern,
            });
        }
        // Most specific first: "COVINGTON AND BURLING" must win over "BURLING".
        matchers.sort_by(|a, b| {
            b.raw
                .chars()
                .count()
                .cmp(&a.raw.chars().count())
                .then_with(|| a.raw.cmp(&b.raw))
        });
        self.matchers = matchers;
        Ok(())
    }

    /// Adds or replaces a curated mapping.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] if the raw string cannot be matched.
    pub fn insert_curated(
        &mut self,
        raw: impl Into<String>,
        clean: impl Into<String>,
    ) -> Result<(), ConfigError> {
        self.entries.insert(
            raw.into(),
            OrgEntry {
                clean: clean.into(),
                origin: EntryOrigin::Curated,
            },
        );
        self.rebuild_matchers()
    }

    /// Widens the table with an observed mapping. Existing entries are left
    /// untouched; returns true if the entry was new.
    pub fn add(&mut self, raw: impl Into<String>, clean: impl Into<String>) -> bool {
        let raw = raw.into();
        if self.entries.contains_key(&raw) {
            return false;
        }
        self.entries.insert(
            raw,
            OrgEntry {
                clean: clean.into(),
                origin: EntryOrigin::Observed,
            },
        );
        true
    }

    /// Returns the clean name (possibly [`SKIP_SENTINEL`]) for a raw string.
    #[must_use]
    pub fn lookup(&self, raw: &str) -> Option<&str> {
        self.entries.get(raw).map(|e| e.clean.as_str())
    }

    /// Returns true if the raw string is known.
    #[must_use]
    pub fn contains(&self, raw: &str) -> bool {
        self.entries.contains_key(raw)
    }

    /// Returns where an entry came from.
    #[must_use]
    pub fn origin(&self, raw: &str) -> Option<EntryOrigin> {
        self.entries.get(raw).map(|e| e.origin)
    }

    /// Maps a token to its clean name, leaving unknown tokens as they are.
    /// Returns `None` for tokens mapped to the skip sentinel.
    #[must_use]
    pub fn canonicalize<'a>(&'a self, token: &'a str) -> Option<&'a str> {
        match self.lookup(token) {
            Some(clean) if is_skip(clean) => None,
            Some(clean) => Some(clean),
            None => Some(token),
        }
    }

    /// Number of entries (curated and observed).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the dictionary has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of curated entries.
    #[must_use]
    pub fn curated_len(&self) -> usize {
        self.entries
            .values()
            .filter(|e| e.origin == EntryOrigin::Curated)
            .count()
    }

    pub(crate) fn matchers(&self) -> &[OrgMatcher] {
        &self.matchers
    }
}

/// Returns true if a clean name is the skip sentinel.
#[must_use]
pub fn is_skip(clean: &str) -> bool {
    clean == SKIP_SENTINEL
}

impl TryFrom<OrgDictionaryRepr> for OrgDictionary {
    type Error = ConfigError;

    fn try_from(repr: OrgDictionaryRepr) -> Result<Self, Self::Error> {
        Self::from_entries(repr.entries)
    }
}

impl From<OrgDictionary> for OrgDictionaryRepr {
    fn from(dict: OrgDictionary) -> Self {
        Self {
            entries: dict.entries,
        }
    }
}

impl PartialEq for OrgDictionary {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for OrgDictionary {}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> OrgDictionary {
        OrgDictionary::from_json_str(
            r#"{
                "Covington & Burling": ["COVINGTON AND BURLING", "COVINGTON"],
                "Philip Morris": ["PM"],
                "@skip@": ["UNK"]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_inverts_clean_to_raw() {
        let dict = sample();
        assert_eq!(dict.lookup("COVINGTON AND BURLING"), Some("Covington & Burling"));
        assert_eq!(dict.lookup("Covington & Burling"), Some("Covington & Burling"));
        assert_eq!(dict.lookup("PM"), Some("Philip Morris"));
        assert_eq!(dict.lookup("nope"), None);
        assert_eq!(dict.origin("PM"), Some(EntryOrigin::Curated));
    }

    #[test]
    fn test_canonicalize_drops_skip_tokens() {
        let dict = sample();
        assert_eq!(dict.canonicalize("UNK"), None);
        assert_eq!(dict.canonicalize("PM"), Some("Philip Morris"));
        assert_eq!(dict.canonicalize("LORILLARD"), Some("LORILLARD"));
    }

    #[test]
    fn test_matchers_are_longest_first_and_curated_only() {
        let mut dict = sample();
        assert!(dict.add("JR", "JR"));
        assert!(!dict.add("PM", "something else"));
        assert_eq!(dict.lookup("PM"), Some("Philip Morris"));
        assert_eq!(dict.origin("JR"), Some(EntryOrigin::Observed));

        let raws: Vec<&str> = dict.matchers().iter().map(|m| m.raw.as_str()).collect();
        assert_eq!(raws.first(), Some(&"COVINGTON AND BURLING"));
        assert!(!raws.contains(&"JR"));
        for pair in raws.windows(2) {
            assert!(pair[0].chars().count() >= pair[1].chars().count());
        }
    }

    #[test]
    fn test_insert_curated_adds_a_matcher() {
        let mut dict = sample();
        let before = dict.curated_len();
        assert!(dict.add("LORILLARD", "LORILLARD"));
        assert!(!dict.matchers().iter().any(|m| m.raw == "LORILLARD"));

        dict.insert_curated("LORILLARD", "Lorillard").unwrap();
        assert_eq!(dict.lookup("LORILLARD"), Some("Lorillard"));
        assert_eq!(dict.origin("LORILLARD"), Some(EntryOrigin::Curated));
        assert_eq!(dict.curated_len(), before + 1);
        let matcher = dict.matchers().iter().find(|m| m.raw == "LORILLARD").unwrap();
        assert_eq!(matcher.clean, "Lorillard");
        assert!(matcher.pattern.is_match("SMITH J, LORILLARD"));

        dict.insert_curated("PM", "Philip Morris Inc").unwrap();
        assert_eq!(dict.lookup("PM"), Some("Philip Morris Inc"));
        assert_eq!(dict.curated_len(), before + 1);
    }

    #[test]
    fn test_malformed_json_is_a_decode_error() {
        let err = OrgDictionary::from_json_str("[1, 2").unwrap_err();
        assert!(matches!(err, ConfigError::Decode { .. }));
    }

    #[test]
    fn test_serde_roundtrip_rebuilds_matchers() {
        let mut dict = sample();
        dict.add("LORILLARD", "LORILLARD");
        let json = serde_json::to_string(&dict).unwrap();
        let back: OrgDictionary = serde_json::from_str(&json).unwrap();
        assert_eq!(back, dict);
        assert_eq!(back.matchers().len(), dict.matchers().len());
        assert_eq!(back.curated_len(), dict.curated_len());
    }
}
