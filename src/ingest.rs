//! Document metadata ingestion.
//!
//! A document lists authors and recipients in free-text person columns and
//! their organizations in separate organization columns. Person columns are
//! split on `;` and `|`; organization columns additionally on `,`. Every
//! organization of a side becomes position evidence for every person of
//! that side.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::org_dictionary::{is_skip, OrgDictionary};
use crate::parser::{middle_word_count, parse_raw_name};
use crate::registry::{AddOutcome, PersonRegistry, PositionHint};
use crate::tally::Tally;

/// Split items must be shorter than this many characters.
const MAX_ITEM_CHARS: usize = 100;

/// Person-column entries shorter than this are noise.
const MIN_PERSON_CHARS: usize = 4;

static ORGANIZATION_SHAPE: OnceLock<Regex> = OnceLock::new();

fn organization_shape() -> &'static Regex {
    ORGANIZATION_SHAPE.get_or_init(|| {
        Regex::new(r"^[a-zA-Z]+ [a-zA-Z]+ [a-zA-Z ]+$").expect("static regex is valid")
    })
}

/// Splits a person column on `;` and `|`, keeping non-empty items shorter
/// than 100 characters.
#[must_use]
pub fn split_person_column(column: &str) -> Vec<String> {
    split_on(column, &[';', '|'])
}

/// Splits an organization column on `;`, `|` and `,`.
#[must_use]
pub fn split_org_column(column: &str) -> Vec<String> {
    split_on(column, &[';', '|', ','])
}

fn split_on(column: &str, delimiters: &[char]) -> Vec<String> {
    column
        .split(|c| delimiters.contains(&c))
        .map(str::trim)
        .filter(|item| !item.is_empty() && item.chars().count() < MAX_ITEM_CHARS)
        .map(str::to_string)
        .collect()
}

/// Three or more purely alphabetic words, e.g. `"US HOUSE COMM ON
/// INTERSTATE"`.
#[must_use]
pub fn looks_like_organization(name: &str) -> bool {
    organization_shape().is_match(name)
}

/// Parses, and has at most one middle name as written. Longer runs of words
/// are committee or department names.
fn looks_like_person(name: &str, dictionary: &OrgDictionary) -> bool {
    parse_raw_name(name, 1, dictionary).is_ok()
        && middle_word_count(name, dictionary).is_some_and(|words| words <= 1)
}

/// Raw author/recipient metadata of one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Raw author names.
    pub authors: Vec<String>,
    /// Raw recipient names.
    pub recipients: Vec<String>,
    /// Raw author organizations.
    pub author_orgs: Vec<String>,
    /// Raw recipient organizations.
    pub recipient_orgs: Vec<String>,
}

impl DocumentRecord {
    /// Builds a record from unsplit metadata columns.
    #[must_use]
    pub fn from_columns(
        authors: &str,
        recipients: &str,
        author_orgs: &str,
        recipient_orgs: &str,
    ) -> Self {
        Self {
            authors: split_person_column(authors),
            recipients: split_person_column(recipients),
            author_orgs: split_org_column(author_orgs),
            recipient_orgs: split_org_column(recipient_orgs),
        }
    }
}

/// Counts from [`PersonRegistry::ingest_document`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Person names added (created or updated).
    pub people: usize,
    /// Organizations used as position evidence.
    pub organizations: usize,
    /// Entries that were neither a person nor an organization.
    pub invalid: usize,
    /// Sides ignored for listing too many people.
    pub oversized_sides: usize,
}

impl IngestReport {
    fn absorb(&mut self, other: Self) {
        self.people += other.people;
        self.organizations += other.organizations;
        self.invalid += other.invalid;
        self.oversized_sides += other.oversized_sides;
    }
}

impl PersonRegistry {
    /// Adds the authors and recipients of one document, each with their
    /// side's organizations as position evidence.
    pub fn ingest_document(&mut self, document: &DocumentRecord) -> IngestReport {
        let mut report = self.ingest_side(&document.authors, &document.author_orgs);
        report.absorb(self.ingest_side(&document.recipients, &document.recipient_orgs));
        report
    }

    fn ingest_side(&mut self, names: &[String], org_column: &[String]) -> IngestReport {
        let mut report = IngestReport::default();
        let mut people: Vec<&str> = Vec::new();
        let mut organizations = Tally::new();

        for org in org_column {
            match self.dictionary.lookup(org) {
                Some(clean) if is_skip(clean) => {}
                Some(clean) => organizations.add(clean, 1),
                None if looks_like_organization(org) => organizations.add(org.as_str(), 1),
                None => report.invalid += 1,
            }
        }

        for name in names {
            if let Some(clean) = self.dictionary.lookup(name) {
                if !is_skip(clean) {
                    organizations.add(clean, 1);
                }
                continue;
            }
            if name.chars().count() < MIN_PERSON_CHARS {
                trace!(name = %name, "too short for a person");
                continue;
            }
            if looks_like_person(name, &self.dictionary) {
                people.push(name);
            } else if looks_like_organization(name) {
                organizations.add(name.as_str(), 1);
            } else {
                report.invalid += 1;
            }
        }

        if people.len() > self.config.max_aliases_per_side {
            debug!(people = people.len(), "ignoring oversized document side");
            report.oversized_sides += 1;
            return report;
        }

        report.organizations = organizations.len();
        for name in people {
            let hint = if organizations.is_empty() {
                PositionHint::None
            } else {
                PositionHint::Counter(organizations.clone())
            };
            if !matches!(self.add_person_raw(name, 1, hint), AddOutcome::Skipped { .. }) {
                report.people += 1;
            }
        }
        report
    }
}
