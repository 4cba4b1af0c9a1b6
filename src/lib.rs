//! # Namesake - name disambiguation for messy document metadata
//!
//! Document collections list their authors and recipients as free text:
//! `"Dunn, WL"`, `"DUNN, WILLIAM L (PM)"`, `"TEMKO SL, COVINGTON AND
//! BURLING"`. Namesake turns those strings into a deduplicated set of people,
//! each with every raw spelling it was seen under and a tally of the
//! organizations it was associated with.
//!
//! ## Core Concepts
//!
//! - **Parser**: splits a raw string into first/middle/last name and
//!   organization positions, using an [`OrgDictionary`]
//! - **Person**: a resolved identity with alias and position multisets
//! - **Registry**: owns all people plus an alias index; incremental
//!   [`PersonRegistry::add_person_raw`] and rule-driven
//!   [`PersonRegistry::merge_duplicates`]
//! - **Overrides**: hand-curated corrections applied after merging
//!
//! ## Usage
//!
//! ```rust
//! use namesake::{OrgDictionary, OverrideTable, PersonRegistry, PositionHint};
//!
//! let dictionary = OrgDictionary::from_json_str(
//!     r#"{"Covington & Burling": ["COVINGTON AND BURLING"]}"#,
//! )?;
//! let mut registry = PersonRegistry::new(dictionary);
//!
//! registry.add_person_raw("TEMKO SL, COVINGTON AND BURLING", 3, PositionHint::None);
//! registry.add_person_raw("Temko, Stanley L", 5, PositionHint::None);
//! registry.merge_duplicates()?;
//! registry.apply_overrides(&OverrideTable::builtin())?;
//!
//! let temko = registry.person_for_alias("temko, stanley l").expect("indexed");
//! assert_eq!(temko.full_name(), "STANLEY L TEMKO");
//! assert_eq!(temko.most_likely_position(), "COVINGTON & BURLING");
//! # Ok::<(), namesake::NamesakeError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Core types
pub mod config;
pub mod error;
pub mod org_dictionary;
pub mod person;
pub mod tally;

// Parsing and resolution
pub mod ingest;
pub mod overrides;
pub mod parser;
pub mod registry;

// Persistence
pub mod storage;

// Re-export primary types at crate root for convenience
pub use config::{AliasNormalization, RegistryConfig};
pub use error::{
    ConfigError, NamesakeError, NamesakeResult, ParseError, RegistryError, StorageError,
};
pub use org_dictionary::{EntryOrigin, OrgDictionary, SKIP_SENTINEL};
pub use person::{Person, PersonId, NO_POSITIONS};
pub use tally::Tally;

pub use ingest::{split_org_column, split_person_column, DocumentRecord, IngestReport};
pub use overrides::{
    AuthoritativeName, OverrideEntry, OverrideReport, OverrideTable, PINNED_AFFILIATION_COUNT,
};
pub use parser::{normalize_position, parse_raw_name, HumanName, ParsedName};
pub use registry::{
    merge_verdict, AddOutcome, MergeReport, MergeRule, PersonRegistry, PositionCount,
    PositionHint, Verdict, MERGE_RULES,
};
pub use storage::SnapshotHeader;
