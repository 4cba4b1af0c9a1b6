//! Hand-curated merges for names the automatic rules cannot join.
//!
//! Each entry names the correct spelling of a person and a chain of raw
//! aliases known to belong to them. Adjacent aliases are resolved and merged
//! pairwise, so after applying an entry every alias that exists in the
//! registry resolves to one record carrying the authoritative name.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ConfigError, RegistryError};
use crate::parser::normalize_position;
use crate::person::{Person, PersonId};
use crate::registry::PersonRegistry;

/// Count given to a pinned affiliation so it always wins
/// [`Person::most_likely_position`].
pub const PINNED_AFFILIATION_COUNT: u64 = 9999;

/// The correct spelling of a person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthoritativeName {
    /// Last name.
    pub last: String,
    /// First name.
    pub first: String,
    /// Middle name; may be empty.
    #[serde(default)]
    pub middle: String,
    /// Organization pinned as the person's position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affiliation: Option<String>,
}

impl AuthoritativeName {
    /// Creates a name without affiliation.
    #[must_use]
    pub fn new(last: &str, first: &str, middle: &str) -> Self {
        Self {
            last: last.to_string(),
            first: first.to_string(),
            middle: middle.to_string(),
            affiliation: None,
        }
    }

    /// Pins an affiliation.
    #[must_use]
    pub fn with_affiliation(mut self, affiliation: &str) -> Self {
        self.affiliation = Some(affiliation.to_string());
        self
    }

    /// Overwrites the name of `person` and pins the affiliation, if any.
    pub(crate) fn apply_to(&self, person: &mut Person) {
        person.last = self.last.to_uppercase();
        person.first = self.first.to_uppercase();
        person.middle = self.middle.to_uppercase();
        if let Some(affiliation) = &self.affiliation {
            let position = normalize_position(affiliation);
            if !position.is_empty() {
                person.positions.set(position, PINNED_AFFILIATION_COUNT);
            }
        }
    }
}

/// One manual merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideEntry {
    /// Spelling the merged record ends up with.
    pub authoritative_name: AuthoritativeName,
    /// Raw aliases of the same person, merged pairwise in order.
    pub aliases_to_merge: Vec<String>,
}

impl OverrideEntry {
    /// Creates an entry.
    #[must_use]
    pub fn new(name: AuthoritativeName, aliases: &[&str]) -> Self {
        Self {
            authoritative_name: name,
            aliases_to_merge: aliases.iter().map(|a| (*a).to_string()).collect(),
        }
    }
}

/// Ordered list of manual merges.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OverrideTable {
    entries: Vec<OverrideEntry>,
}

/// Outcome of [`PersonRegistry::apply_overrides`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverrideReport {
    /// Alias pairs that resolved to two records and were merged.
    pub merged: usize,
    /// Alias pairs already on one record, which was renamed.
    pub renamed: usize,
    /// Alias pairs skipped because an alias is not in the registry.
    pub missing: usize,
}

impl OverrideTable {
    /// Creates a table from entries.
    #[must_use]
    pub fn new(entries: Vec<OverrideEntry>) -> Self {
        Self { entries }
    }

    /// Corrections known for the tobacco-industry correspondence corpus.
    #[must_use]
    pub fn builtin() -> Self {
        let name = AuthoritativeName::new;
        Self::new(vec![
            OverrideEntry::new(
                name("Ahrensfeld", "Thomas", "F"),
                &["AHRENSFELD,TF", "AHRENSFELD,T"],
            ),
            OverrideEntry::new(
                name("Bryant", "H", "DeBaun"),
                &["Bryant, H", "BRYANT,D", "Bryant, DeBaun", "BRYANT,HD"],
            ),
            OverrideEntry::new(
                name("Haas", "Frederick", "P").with_affiliation("Liggett & Myers"),
                &["Haas, F", "HAAS,FP", "HAAS FP, LM"],
            ),
            OverrideEntry::new(
                name("Hardy", "David", "Ross"),
                &[
                    "HARDY,DR",
                    "Hardy, D",
                    "HARDY,DR/SHOOK, HARDY & BACON",
                    "Hardy-DR, Shook Hardy",
                ],
            ),
            OverrideEntry::new(
                name("Hetsko", "Cyril", "F"),
                &[
                    "Hetsko-CF",
                    "Hetsko-CF, American Brands Inc",
                    "HETSKO CF, AMER BRANDS",
                    "Hetsko-CF American Brands Inc",
                    "Hetsko, C",
                    "Hetsko-CF, American Brands",
                ],
            ),
            OverrideEntry::new(
                name("Holtzman", "Alexander", ""),
                &[
                    "HOLTZMAN,A",
                    "Holtzman, Alexander",
                    "Holtzmann, Alexander [Privlog:] HOLTZMAN,A",
                ],
            ),
            OverrideEntry::new(
                name("Hughes", "Ivor", "Wallace"),
                &["HUGHES,IW", "Hughes-I", "HUGHES,IW/X"],
            ),
            OverrideEntry::new(name("Senkus", "Murray", ""), &["SENKUS M", "Senkus, Murray"]),
            OverrideEntry::new(
                name("Ramm", "Henry", "H"),
                &["RAMM HH", "RAMM H, CTR", "Ramm-HH Council For Tobacco Research"],
            ),
            OverrideEntry::new(
                name("Roemer", "Henry", "C").with_affiliation("R.J. Reynolds"),
                &["ROEMER HC JR", "Roemer, H"],
            ),
            OverrideEntry::new(
                name("Shinn", "William", "W"),
                &[
                    "SHINN,WW",
                    "SHINN,W",
                    "SHINN,WW/SHOOK, HARDY & BACON",
                    "Shinn-WW, Shook Hardy",
                ],
            ),
            OverrideEntry::new(
                name("Teague", "Claude", "Edward").with_affiliation("R.J. Reynolds"),
                &["TEAGUE CE JR", "TEAGUE,C"],
            ),
            OverrideEntry::new(name("Wakeham", "Helmut", "R"), &["WAKEHAM,H", "WAKEHAM,HR"]),
            OverrideEntry::new(
                name("Yeaman", "Addison", "Y"),
                &["YEAMAN,A", "YEAMAN AY, CTR", "YEAMAN,A/X", "Yeaman, Addison"],
            ),
        ])
    }

    /// Parses a JSON list of entries.
    ///
    /// # Errors
    /// Returns [`ConfigError::Decode`] on malformed JSON.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Decode {
            what: "override table".to_string(),
            message: e.to_string(),
        })
    }

    /// Reads and parses a JSON override file.
    ///
    /// # Errors
    /// Returns [`ConfigError::Read`] if the file cannot be read, or a decode
    /// error.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json_str(&json)
    }

    /// Entries in application order.
    #[must_use]
    pub fn entries(&self) -> &[OverrideEntry] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PersonRegistry {
    /// Applies manual merges after automatic merging.
    ///
    /// For each adjacent alias pair of an entry: two different records are
    /// merged under the authoritative name; a single record is renamed in
    /// place. Aliases missing from the registry are logged and skipped.
    ///
    /// # Errors
    /// Returns [`RegistryError::IndexInconsistency`] if an alias points at a
    /// record that is no longer in the arena.
    pub fn apply_overrides(
        &mut self,
        table: &OverrideTable,
    ) -> Result<OverrideReport, RegistryError> {
        let mut report = OverrideReport::default();

        for entry in table.entries() {
            let name = &entry.authoritative_name;
            for pair in entry.aliases_to_merge.windows(2) {
                let (alias1, alias2) = (&pair[0], &pair[1]);
                let p1 = self.resolve_alias(alias1)?;
                let p2 = self.resolve_alias(alias2)?;
                let (Some(p1), Some(p2)) = (p1, p2) else {
                    warn!(alias1 = %alias1, alias2 = %alias2, "override alias not found");
                    report.missing += 1;
                    continue;
                };

                if p1 == p2 {
                    self.rename(p1, name)?;
                    report.renamed += 1;
                } else {
                    let id = self.merge_two_persons(p1, p2, Some(name))?;
                    debug!(%id, alias1 = %alias1, alias2 = %alias2, "applied manual merge");
                    report.merged += 1;
                }
            }
        }

        info!(
            merged = report.merged,
            renamed = report.renamed,
            missing = report.missing,
            "applied manual overrides"
        );
        Ok(report)
    }

    fn rename(&mut self, id: PersonId, name: &AuthoritativeName) -> Result<(), RegistryError> {
        let person = self
            .people
            .get_mut(&id)
            .ok_or(RegistryError::PersonNotFound { id })?;
        let previous = person.full_name();
        name.apply_to(person);
        if person.full_name() != previous {
            self.index.release(&previous, id);
        }
        self.index_person(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::org_dictionary::OrgDictionary;
    use crate::registry::PositionHint;

    fn registry(names: &[(&str, u64)]) -> PersonRegistry {
        let mut reg = PersonRegistry::new(OrgDictionary::new());
        for (raw, count) in names {
            reg.add_person_raw(raw, *count, PositionHint::None);
        }
        reg
    }

    #[test]
    fn test_builtin_table() {
        let table = OverrideTable::builtin();
        assert_eq!(table.len(), 14);
        let teague = table
            .entries()
            .iter()
            .find(|e| e.authoritative_name.last == "Teague")
            .unwrap();
        assert_eq!(teague.authoritative_name.affiliation.as_deref(), Some("R.J. Reynolds"));
    }

    #[test]
    fn test_merges_under_authoritative_name() {
        let mut reg = registry(&[("TEAGUE CE JR", 5), ("TEAGUE,C", 2)]);
        assert_eq!(reg.len(), 2);

        let report = reg.apply_overrides(&OverrideTable::builtin()).unwrap();
        assert_eq!(report.merged, 1);
        assert_eq!(reg.len(), 1);

        let teague = reg.person_for_alias("TEAGUE,C").unwrap();
        assert_eq!(teague.full_name(), "CLAUDE EDWARD TEAGUE");
        assert_eq!(teague.count(), 7);
        assert_eq!(teague.positions().get("RJ REYNOLDS"), PINNED_AFFILIATION_COUNT);
        assert_eq!(teague.most_likely_position(), "RJ REYNOLDS");
        assert_eq!(
            reg.person_for_alias("claude edward teague").map(Person::id),
            Some(teague.id())
        );
        reg.verify_index().unwrap();
    }

    #[test]
    fn test_chain_of_aliases_collapses_to_one_record() {
        let mut reg = registry(&[
            ("YEAMAN,A", 3),
            ("YEAMAN AY, CTR", 2),
            ("YEAMAN,A/X", 1),
            ("Yeaman, Addison", 4),
        ]);
        let report = reg.apply_overrides(&OverrideTable::builtin()).unwrap();
        assert_eq!(report.merged, 3);
        assert_eq!(reg.len(), 1);
        let yeaman = reg.person_for_alias("Yeaman, Addison").unwrap();
        assert_eq!(yeaman.full_name(), "ADDISON Y YEAMAN");
        assert_eq!(yeaman.count(), 10);
        reg.verify_index().unwrap();
    }

    #[test]
    fn test_same_record_is_renamed() {
        let mut reg = registry(&[("Senkus, Murray", 2)]);
        reg.add_person_raw("SENKUS, MURRAY", 1, PositionHint::None);
        let table = OverrideTable::new(vec![OverrideEntry::new(
            AuthoritativeName::new("Senkus", "Murray", "J").with_affiliation("PM"),
            &["Senkus, Murray", "SENKUS, MURRAY"],
        )]);

        let report = reg.apply_overrides(&table).unwrap();
        assert_eq!(report.renamed, 1);
        let senkus = reg.person_for_alias("murray j senkus").unwrap();
        assert_eq!(senkus.middle(), "J");
        assert_eq!(senkus.most_likely_position(), "PM");
        assert!(reg.person_for_alias("murray senkus").is_none());
        reg.verify_index().unwrap();
    }

    #[test]
    fn test_missing_aliases_are_skipped() {
        let mut reg = registry(&[("WAKEHAM,H", 1)]);
        let report = reg.apply_overrides(&OverrideTable::builtin()).unwrap();
        assert_eq!(report.merged, 0);
        assert!(report.missing >= 1);
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.person_for_alias("WAKEHAM,H").unwrap().first(), "H");
    }

    #[test]
    fn test_stale_index_entry_is_an_invariant_violation() {
        let mut reg = registry(&[("TEAGUE CE JR", 5), ("TEAGUE,C", 2)]);
        let stale = reg.person_for_alias("TEAGUE,C").unwrap().id();
        reg.people.remove(&stale);

        let err = reg.apply_overrides(&OverrideTable::builtin()).unwrap_err();
        assert!(matches!(err, RegistryError::IndexInconsistency { .. }), "got {err}");
        assert!(crate::error::NamesakeError::from(err).is_invariant_violation());
    }

    #[test]
    fn test_stale_index_entry_fails_rename() {
        let mut reg = registry(&[("Senkus, Murray", 2)]);
        let stale = reg.person_for_alias("Senkus, Murray").unwrap().id();
        reg.people.remove(&stale);
        let table = OverrideTable::new(vec![OverrideEntry::new(
            AuthoritativeName::new("Senkus", "Murray", ""),
            &["Senkus, Murray", "Senkus, Murray"],
        )]);

        let err = reg.apply_overrides(&table).unwrap_err();
        assert!(matches!(err, RegistryError::IndexInconsistency { .. }), "got {err}");
    }

    #[test]
    fn test_json_table() {
        let table = OverrideTable::from_json_str(
            r#"[{
                "authoritative_name": {"last": "Dunn", "first": "William", "middle": "L"},
                "aliases_to_merge": ["DUNN,W", "Dunn, William"]
            }]"#,
        )
        .unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.entries()[0].authoritative_name.affiliation, None);

        let json = serde_json::to_string(&OverrideTable::builtin()).unwrap();
        assert_eq!(OverrideTable::from_json_str(&json).unwrap(), OverrideTable::builtin());

        assert!(matches!(
            OverrideTable::from_json_str("{}"),
            Err(ConfigError::Decode { .. })
        ));
    }
}
