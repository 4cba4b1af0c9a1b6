//! The person registry: arena of [`Person`] records plus the alias index.
//!
//! Every mutation of the arena is paired with the matching index update in
//! the same method, so after any public call every raw alias of every record
//! resolves back to that record and no key points at a removed record.
//! [`PersonRegistry::verify_index`] checks exactly that.

mod index;
mod merge;

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, info, warn};

pub use merge::{merge_verdict, MergeReport, MergeRule, Verdict, MERGE_RULES};

use crate::config::RegistryConfig;
use crate::error::{ConfigError, RegistryError};
use crate::org_dictionary::OrgDictionary;
use crate::parser::{normalize_position, parse_raw_name};
use crate::person::{Person, PersonId};
use crate::tally::Tally;

pub(crate) use index::AliasIndex;

/// Organization evidence supplied alongside a raw name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PositionHint {
    /// Nothing known.
    #[default]
    None,
    /// One organization, counted once per occurrence of the name.
    Single(String),
    /// Organizations with their own counts.
    Counter(Tally),
}

impl From<&str> for PositionHint {
    fn from(position: &str) -> Self {
        Self::Single(position.to_string())
    }
}

impl From<String> for PositionHint {
    fn from(position: String) -> Self {
        Self::Single(position)
    }
}

impl From<Tally> for PositionHint {
    fn from(positions: Tally) -> Self {
        Self::Counter(positions)
    }
}

/// What [`PersonRegistry::add_person_raw`] did with a raw name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// A new record was created.
    Created(PersonId),
    /// The raw name resolved to an existing record, which was updated.
    Updated(PersonId),
    /// The raw name was not usable; nothing changed.
    Skipped {
        /// Why the name was skipped.
        reason: String,
    },
}

impl AddOutcome {
    /// Id of the created or updated record.
    #[must_use]
    pub const fn id(&self) -> Option<PersonId> {
        match self {
            Self::Created(id) | Self::Updated(id) => Some(*id),
            Self::Skipped { .. } => None,
        }
    }

    /// Returns true if the name was skipped.
    #[must_use]
    pub const fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }
}

/// How many people list a position, for dictionary curation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionCount {
    /// Position as stored on the records.
    pub position: String,
    /// Number of people with this position.
    pub people: usize,
    /// Clean name the dictionary maps the position to, if any.
    pub clean: Option<String>,
}

/// Owns all person records, the alias index and the organization
/// dictionary.
///
/// # Examples
///
/// ```
/// use namesake::{OrgDictionary, PersonRegistry, PositionHint};
///
/// let mut registry = PersonRegistry::new(OrgDictionary::new());
/// registry.add_person_raw("Dunn, WL", 2, PositionHint::None);
/// registry.add_person_raw("Dunn, William L", 4, PositionHint::None);
/// registry.merge_duplicates().unwrap();
///
/// let dunn = registry.person_for_alias("dunn, wl").unwrap();
/// assert_eq!(dunn.full_name(), "WILLIAM L DUNN");
/// assert_eq!(dunn.count(), 6);
/// ```
#[derive(Debug, Clone)]
pub struct PersonRegistry {
    pub(crate) people: BTreeMap<PersonId, Person>,
    pub(crate) index: AliasIndex,
    pub(crate) dictionary: OrgDictionary,
    pub(crate) config: RegistryConfig,
    pub(crate) next_id: PersonId,
}

impl Default for PersonRegistry {
    fn default() -> Self {
        Self::new(OrgDictionary::new())
    }
}

impl PersonRegistry {
    /// Creates an empty registry with the default configuration.
    #[must_use]
    pub fn new(dictionary: OrgDictionary) -> Self {
        Self::from_parts(dictionary, RegistryConfig::default())
    }

    /// Creates an empty registry after validating `config`.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] if the configuration is rejected.
    pub fn with_config(
        dictionary: OrgDictionary,
        config: RegistryConfig,
    ) -> Result<Self, ConfigError> {
        Ok(Self::from_parts(dictionary, config.validate()?))
    }

    pub(crate) fn from_parts(dictionary: OrgDictionary, config: RegistryConfig) -> Self {
        Self {
            people: BTreeMap::new(),
            index: AliasIndex::new(config.alias_normalization),
            dictionary,
            config,
            next_id: PersonId::from_raw(1),
        }
    }

    /// Adds `count` occurrences of a raw name.
    ///
    /// The name is parsed and the hint's organizations are added to the
    /// parsed positions. If the raw string (normalized) is already known the
    /// matching record is updated, otherwise a new record is created. Either
    /// way, positions the dictionary does not know yet are added to it as
    /// self-mappings.
    ///
    /// Unparseable names and zero counts are skipped and logged; they never
    /// abort a batch.
    pub fn add_person_raw(&mut self, raw: &str, count: u64, hint: PositionHint) -> AddOutcome {
        if count == 0 {
            return skipped(raw, "zero occurrence count".to_string());
        }

        let mut parsed = match parse_raw_name(raw, count, &self.dictionary) {
            Ok(parsed) => parsed,
            Err(err) => return skipped(raw, err.to_string()),
        };
        self.merge_hint(&mut parsed.positions, hint, count);

        let outcome = match self.index.get(raw).and_then(|id| self.people.get_mut(&id)) {
            Some(person) => {
                person.positions.absorb(&parsed.positions);
                person.aliases.add(raw, count);
                person.count = person.count.saturating_add(count);
                let id = person.id;
                let full_name = person.full_name();
                self.index.claim(raw, id);
                self.index.insert_if_vacant(&full_name, id);
                AddOutcome::Updated(id)
            }
            None => {
                let id = self.allocate_id();
                let person = Person::from_parsed(id, &parsed, raw, count);
                let full_name = person.full_name();
                self.people.insert(id, person);
                self.index.claim(raw, id);
                self.index.insert_if_vacant(&full_name, id);
                AddOutcome::Created(id)
            }
        };

        if let Some(id) = outcome.id() {
            self.widen_dictionary(id);
        }
        outcome
    }

    fn merge_hint(&self, positions: &mut Tally, hint: PositionHint, count: u64) {
        let mut add = |token: &str, n: u64| {
            if let Some(clean) = self.dictionary.canonicalize(token) {
                let normalized = normalize_position(clean);
                if !normalized.is_empty() {
                    positions.add(normalized, n);
                }
            }
        };
        match hint {
            PositionHint::None => {}
            PositionHint::Single(token) => add(&token, count),
            PositionHint::Counter(tally) => {
                for (token, n) in tally.iter() {
                    add(token, n);
                }
            }
        }
    }

    fn widen_dictionary(&mut self, id: PersonId) {
        let Some(person) = self.people.get(&id) else {
            return;
        };
        for position in person.positions.keys() {
            if !self.dictionary.contains(position) {
                self.dictionary.add(position, position);
            }
        }
    }

    pub(crate) fn allocate_id(&mut self) -> PersonId {
        let id = self.next_id;
        self.next_id = id.next();
        id
    }

    /// Indexes a record's full name.
    ///
    /// The key is taken from another record only when it is that record's
    /// full name rather than one of its raw aliases.
    pub(crate) fn index_full_name(&mut self, id: PersonId) {
        let Some(person) = self.people.get(&id) else {
            return;
        };
        let full_name = person.full_name();
        match self.index.get(&full_name) {
            None => self.index.claim(&full_name, id),
            Some(holder) if holder == id => {}
            Some(holder) => {
                let key = self.index.key(&full_name);
                let is_raw_alias = self.people.get(&holder).is_some_and(|other| {
                    other.aliases.keys().any(|alias| self.index.key(alias) == key)
                });
                if is_raw_alias {
                    debug!(%id, %holder, %full_name, "full name is another record's alias");
                } else {
                    self.index.claim(&full_name, id);
                }
            }
        }
    }

    /// Points every alias and the full name of a record at it.
    pub(crate) fn index_person(&mut self, id: PersonId) {
        let Some(person) = self.people.get(&id) else {
            return;
        };
        let aliases: Vec<String> = person.aliases.keys().map(str::to_string).collect();
        for alias in &aliases {
            self.index.claim(alias, id);
        }
        self.index_full_name(id);
    }

    /// Rebuilds the alias index from the arena.
    pub(crate) fn rebuild_index(&mut self) {
        self.index.clear();
        let ids: Vec<PersonId> = self.people.keys().copied().collect();
        for &id in &ids {
            if let Some(person) = self.people.get(&id) {
                for alias in person.aliases.keys() {
                    self.index.claim(alias, id);
                }
            }
        }
        for &id in &ids {
            if let Some(full_name) = self.people.get(&id).map(Person::full_name) {
                self.index.insert_if_vacant(&full_name, id);
            }
        }
        self.next_id = self
            .people
            .keys()
            .next_back()
            .map_or(PersonId::from_raw(1), |last| last.next());
    }

    /// Removes a record together with every index key it owns.
    pub(crate) fn remove_person(&mut self, id: PersonId) -> Option<Person> {
        let person = self.people.remove(&id)?;
        self.index.release_all(id);
        Some(person)
    }

    /// Resolves an alias to the id of a live record.
    ///
    /// # Errors
    /// Returns [`RegistryError::IndexInconsistency`] if the alias points at a
    /// record that is not in the arena.
    pub(crate) fn resolve_alias(&self, alias: &str) -> Result<Option<PersonId>, RegistryError> {
        match self.index.get(alias) {
            Some(id) if !self.people.contains_key(&id) => Err(RegistryError::IndexInconsistency {
                message: format!("alias {alias:?} points to missing record {id}"),
            }),
            found => Ok(found),
        }
    }

    /// Looks up a record by id.
    #[must_use]
    pub fn get(&self, id: PersonId) -> Option<&Person> {
        self.people.get(&id)
    }

    /// Resolves an alias (raw string or full name, any case) to its record.
    #[must_use]
    pub fn person_for_alias(&self, alias: &str) -> Option<&Person> {
        self.index.get(alias).and_then(|id| self.people.get(&id))
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.people.len()
    }

    /// Returns true if the registry holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }

    /// Number of index keys.
    #[must_use]
    pub fn alias_count(&self) -> usize {
        self.index.len()
    }

    /// Iterates records in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Person> {
        self.people.values()
    }

    /// Records with the given last name (any case), in id order.
    #[must_use]
    pub fn people_by_last_name(&self, last: &str) -> Vec<&Person> {
        let last = last.to_uppercase();
        self.people.values().filter(|p| p.last == last).collect()
    }

    /// The organization dictionary, including observed entries.
    #[must_use]
    pub fn dictionary(&self) -> &OrgDictionary {
        &self.dictionary
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Compares two registries as multisets of record content, ignoring ids.
    #[must_use]
    pub fn content_eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        let mut ours: Vec<blake3::Hash> = self.iter().map(Person::fingerprint).collect();
        let mut theirs: Vec<blake3::Hash> = other.iter().map(Person::fingerprint).collect();
        ours.sort_unstable_by(|a, b| a.as_bytes().cmp(b.as_bytes()));
        theirs.sort_unstable_by(|a, b| a.as_bytes().cmp(b.as_bytes()));
        ours == theirs
    }

    /// Checks the alias index against the arena.
    ///
    /// # Errors
    /// Returns [`RegistryError::IndexInconsistency`] if a key points at a
    /// record that is not in the arena, a raw alias of a record does not
    /// resolve back to it, or a record's count differs from the sum of its
    /// alias counts.
    pub fn verify_index(&self) -> Result<(), RegistryError> {
        for (key, id) in self.index.iter() {
            if !self.people.contains_key(&id) {
                return Err(RegistryError::IndexInconsistency {
                    message: format!("key {key:?} points to missing record {id}"),
                });
            }
        }

        for (id, keys) in self.index.owners() {
            if !self.people.contains_key(&id) {
                return Err(RegistryError::IndexInconsistency {
                    message: format!("missing record {id} still owns {} keys", keys.len()),
                });
            }
        }

        for person in self.people.values() {
            if person.count != person.aliases.total() {
                return Err(RegistryError::IndexInconsistency {
                    message: format!(
                        "{} counts {} occurrences but its aliases sum to {}",
                        person.id,
                        person.count,
                        person.aliases.total()
                    ),
                });
            }
            for alias in person.aliases.keys() {
                match self.index.get(alias) {
                    Some(id) if id == person.id => {}
                    Some(id) => {
                        return Err(RegistryError::IndexInconsistency {
                            message: format!(
                                "alias {alias:?} of {} resolves to {id}",
                                person.id
                            ),
                        });
                    }
                    None => {
                        return Err(RegistryError::IndexInconsistency {
                            message: format!("alias {alias:?} of {} is not indexed", person.id),
                        });
                    }
                }
            }
        }

        Ok(())
    }

    /// Number of people per position, most common first.
    #[must_use]
    pub fn position_summary(&self) -> Vec<PositionCount> {
        let mut people_per_position: HashMap<&str, usize> = HashMap::new();
        for person in self.people.values() {
            for position in person.positions.keys() {
                *people_per_position.entry(position).or_insert(0) += 1;
            }
        }

        let mut summary: Vec<PositionCount> = people_per_position
            .into_iter()
            .map(|(position, people)| PositionCount {
                position: position.to_string(),
                people,
                clean: self.dictionary.lookup(position).map(str::to_string),
            })
            .collect();
        summary.sort_by(|a, b| b.people.cmp(&a.people).then_with(|| a.position.cmp(&b.position)));
        summary
    }

    /// Removes records that are company accounts rather than people, as
    /// listed in [`RegistryConfig::skip_aliases`]. Returns how many were
    /// removed.
    pub fn drop_company_accounts(&mut self) -> usize {
        let doomed: Vec<PersonId> = self
            .people
            .values()
            .filter(|person| {
                self.config.is_skip_alias(&person.full_name())
                    || person.aliases.keys().any(|alias| self.config.is_skip_alias(alias))
            })
            .map(|person| person.id)
            .collect();

        for id in &doomed {
            if let Some(person) = self.remove_person(*id) {
                debug!(%id, full_name = %person.full_name(), "dropped company account");
            }
        }
        if !doomed.is_empty() {
            info!(dropped = doomed.len(), "removed company accounts");
        }
        doomed.len()
    }
}

fn skipped(raw: &str, reason: String) -> AddOutcome {
    warn!(raw, %reason, "skipping raw name");
    AddOutcome::Skipped { reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dictionary() -> OrgDictionary {
        OrgDictionary::from_json_str(
            r#"{
                "Covington & Burling": ["COVINGTON AND BURLING"],
                "Philip Morris": ["PM"],
                "@skip@": ["UNK"]
            }"#,
        )
        .unwrap()
    }

    fn registry() -> PersonRegistry {
        PersonRegistry::new(dictionary())
    }

    #[test]
    fn test_readding_accumulates_on_one_record() {
        let mut reg = registry();
        let first = reg.add_person_raw("Dunn, WL", 3, PositionHint::None);
        let second = reg.add_person_raw("Dunn, WL", 3, PositionHint::None);
        assert!(matches!(first, AddOutcome::Created(_)));
        assert_eq!(second, AddOutcome::Updated(first.id().unwrap()));
        assert_eq!(reg.len(), 1);

        let dunn = reg.person_for_alias("Dunn, WL").unwrap();
        assert_eq!(dunn.count(), 6);
        assert_eq!(dunn.aliases().get("Dunn, WL"), 6);
        reg.verify_index().unwrap();
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let mut reg = registry();
        let a = reg.add_person_raw("Dunn, WL", 1, PositionHint::None);
        let b = reg.add_person_raw("DUNN, WL", 1, PositionHint::None);
        assert_eq!(b, AddOutcome::Updated(a.id().unwrap()));
        let dunn = reg.get(a.id().unwrap()).unwrap();
        assert_eq!(dunn.aliases().len(), 2);
        assert_eq!(dunn.count(), 2);
        reg.verify_index().unwrap();
    }

    #[test]
    fn test_full_name_is_a_secondary_alias() {
        let mut reg = registry();
        let id = reg.add_person_raw("Dunn, William L", 1, PositionHint::None).id().unwrap();
        assert_eq!(reg.person_for_alias("william l dunn").map(Person::id), Some(id));

        let again = reg.add_person_raw("WILLIAM L DUNN", 2, PositionHint::None);
        assert_eq!(again, AddOutcome::Updated(id));
        assert_eq!(reg.get(id).unwrap().count(), 3);
        reg.verify_index().unwrap();
    }

    #[test]
    fn test_skips_bad_input_without_side_effects() {
        let mut reg = registry();
        assert!(reg.add_person_raw("  # ", 1, PositionHint::None).is_skipped());
        assert!(reg.add_person_raw("PM", 1, PositionHint::None).is_skipped());
        assert!(reg.add_person_raw("Dunn, WL", 0, PositionHint::None).is_skipped());
        assert!(reg.is_empty());
        assert_eq!(reg.alias_count(), 0);
    }

    #[test]
    fn test_hint_positions_are_canonicalized() {
        let mut reg = registry();
        let id = reg
            .add_person_raw("Temko, SL", 2, PositionHint::from("COVINGTON AND BURLING"))
            .id()
            .unwrap();
        let counter: Tally = vec![("PM".to_string(), 5), ("UNK".to_string(), 9)]
            .into_iter()
            .collect();
        reg.add_person_raw("Temko, SL", 1, PositionHint::Counter(counter));

        let temko = reg.get(id).unwrap();
        assert_eq!(temko.positions().get("COVINGTON & BURLING"), 2);
        assert_eq!(temko.positions().get("PHILIP MORRIS"), 5);
        assert!(!temko.positions().contains("UNK"));
        assert_eq!(temko.most_likely_position(), "PHILIP MORRIS");
    }

    #[test]
    fn test_new_positions_widen_dictionary() {
        let mut reg = registry();
        reg.add_person_raw(
            "BAKER, T E - NATIONAL ASSOCIATION OF ATTORNEYS GENERAL",
            1,
            PositionHint::None,
        );
        assert_eq!(
            reg.dictionary().lookup("NATIONAL ASSOCIATION OF ATTORNEYS GENERAL"),
            Some("NATIONAL ASSOCIATION OF ATTORNEYS GENERAL")
        );
        assert_eq!(reg.dictionary().curated_len(), dictionary().curated_len());
    }

    #[test]
    fn test_people_by_last_name() {
        let mut reg = registry();
        reg.add_person_raw("Dunn, WL", 1, PositionHint::None);
        reg.add_person_raw("Dunn, Frank", 1, PositionHint::None);
        reg.add_person_raw("Temko, SL", 1, PositionHint::None);
        assert_eq!(reg.people_by_last_name("dunn").len(), 2);
        assert_eq!(reg.people_by_last_name("TEMKO").len(), 1);
    }

    #[test]
    fn test_position_summary() {
        let mut reg = registry();
        reg.add_person_raw("Temko, SL", 1, PositionHint::from("PM"));
        reg.add_person_raw("Dunn, WL", 1, PositionHint::from("PM"));
        reg.add_person_raw("Henson, A", 1, PositionHint::from("COVINGTON AND BURLING"));

        let summary = reg.position_summary();
        assert_eq!(summary[0].position, "PHILIP MORRIS");
        assert_eq!(summary[0].people, 2);
        assert_eq!(summary[1].position, "COVINGTON & BURLING");
        assert_eq!(summary[1].clean.as_deref(), Some("COVINGTON & BURLING"));
    }

    #[test]
    fn test_drop_company_accounts() {
        let config = RegistryConfig {
            skip_aliases: vec!["rjr".to_string()],
            ..RegistryConfig::default()
        };
        let mut reg = PersonRegistry::with_config(dictionary(), config).unwrap();
        reg.add_person_raw("R J R", 4, PositionHint::None);
        reg.add_person_raw("Dunn, WL", 1, PositionHint::None);
        assert_eq!(reg.len(), 2);

        assert_eq!(reg.drop_company_accounts(), 1);
        assert_eq!(reg.len(), 1);
        assert!(reg.person_for_alias("R J R").is_none());
        reg.verify_index().unwrap();
    }

    #[test]
    fn test_verify_index_detects_dangling_key() {
        let mut reg = registry();
        let id = reg.add_person_raw("Dunn, WL", 1, PositionHint::None).id().unwrap();
        reg.people.remove(&id);
        let err = reg.verify_index().unwrap_err();
        assert!(matches!(err, RegistryError::IndexInconsistency { .. }));
    }

    #[test]
    fn test_verify_index_detects_count_drift() {
        let mut reg = registry();
        let id = reg.add_person_raw("Dunn, WL", 2, PositionHint::None).id().unwrap();
        reg.add_person_raw("Dunn, WL", 3, PositionHint::None);
        reg.verify_index().unwrap();

        reg.people.get_mut(&id).unwrap().count = 4;
        let err = reg.verify_index().unwrap_err();
        assert!(err.to_string().contains("sum to 5"), "got {err}");
    }

    #[test]
    fn test_rebuild_index_restores_lookups() {
        let mut reg = registry();
        let id = reg.add_person_raw("Dunn, WL", 1, PositionHint::None).id().unwrap();
        reg.index.clear();
        assert!(reg.person_for_alias("Dunn, WL").is_none());
        reg.rebuild_index();
        assert_eq!(reg.person_for_alias("w l dunn").map(Person::id), Some(id));
        assert_eq!(reg.allocate_id(), id.next());
    }
}
