//! Raw name parsing.
//!
//! [`parse_raw_name`] turns a messy metadata string such as
//! `"TEMKO SL, COVINGTON AND BURLING"` into a [`ParsedName`]: display-case
//! first/middle/last plus a tally of the position tokens (organizations,
//! titles, suffixes) found around the name.
//!
//! The pipeline runs in a fixed order and each stage removes what it
//! recognised before the next one sees the string:
//!
//! 1. privilege-log annotations are dropped
//! 2. a single `" - "` splits off a position
//! 3. parenthesized groups become positions
//! 4. curated organization strings become positions
//! 5. stray `#` and `-WL` style initials are cleaned up
//! 6. the rest is split by [`HumanName`] and post-processed
//! 7. position tokens are canonicalized through the dictionary

mod human_name;
mod stages;

use std::sync::OnceLock;

use regex::Regex;

pub use human_name::HumanName;

use crate::error::ParseError;
use crate::org_dictionary::OrgDictionary;
use crate::tally::Tally;

/// Suffixes this long with several periods are other people's names that
/// leaked in ("Murray, J., Henson, A.").
const MAX_SUFFIX_CHARS: usize = 20;

static DOTTED_INITIALS: OnceLock<Regex> = OnceLock::new();

fn dotted_initials() -> &'static Regex {
    DOTTED_INITIALS
        .get_or_init(|| Regex::new(r"^[a-zA-Z]\.[a-zA-Z]\.").expect("static regex is valid"))
}

/// Result of parsing one raw name string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    /// First name or initial, display case.
    pub first: String,
    /// Middle name(s) or initial, display case.
    pub middle: String,
    /// Last name, display case. Never empty.
    pub last: String,
    /// Cleaned position token → occurrence count.
    pub positions: Tally,
}

/// Parses `raw` into name components and positions.
///
/// Every position found is counted `count` times. The dictionary is only
/// read.
///
/// # Errors
/// - [`ParseError::Empty`] if nothing is left after extraction
/// - [`ParseError::MissingLastName`] if no last name can be recovered
pub fn parse_raw_name(
    raw: &str,
    count: u64,
    dictionary: &OrgDictionary,
) -> Result<ParsedName, ParseError> {
    let mut tokens: Vec<String> = Vec::new();
    let mut human = split_name(raw, dictionary, &mut tokens)?;
    post_process(&mut human);

    if human.last.is_empty() {
        return Err(ParseError::MissingLastName {
            raw: raw.to_string(),
        });
    }

    if keep_suffix(&human.suffix) {
        tokens.push(human.suffix);
    }

    let mut positions = Tally::new();
    for token in &tokens {
        let Some(clean) = dictionary.canonicalize(token) else {
            continue;
        };
        let normalized = normalize_position(clean);
        if !normalized.is_empty() {
            positions.add(normalized, count);
        }
    }

    Ok(ParsedName {
        first: human.first,
        middle: human.middle,
        last: human.last,
        positions,
    })
}

/// Number of middle words `raw` splits into before initials are
/// expanded, or `None` if nothing name-like is left after extraction.
///
/// `"US HOUSE COMM ON INTERSTATE"` has three; post-processing would turn its
/// leading `"US"` into two initials and hide them.
pub(crate) fn middle_word_count(raw: &str, dictionary: &OrgDictionary) -> Option<usize> {
    let mut tokens = Vec::new();
    split_name(raw, dictionary, &mut tokens)
        .ok()
        .map(|human| human.middle.split_whitespace().count())
}

/// Runs the extraction stages and splits what is left.
fn split_name(
    raw: &str,
    dictionary: &OrgDictionary,
    tokens: &mut Vec<String>,
) -> Result<HumanName, ParseError> {
    let name = stages::strip_privlog(raw);
    let name = stages::split_dash_position(name, tokens);
    let name = stages::extract_parentheticals(&name, tokens);
    let name = stages::extract_organizations(&name, dictionary, tokens);
    let name = stages::clean_punctuation(&name);

    if name.trim().is_empty() {
        return Err(ParseError::Empty {
            raw: raw.to_string(),
        });
    }
    Ok(HumanName::parse(&name))
}

/// Normalized form of a position token: periods removed, upper case,
/// surrounding whitespace trimmed.
#[must_use]
pub fn normalize_position(token: &str) -> String {
    token.replace('.', "").trim().to_uppercase()
}

fn post_process(name: &mut HumanName) {
    // "Dunn W" splits as first=Dunn, last=W.
    if name.last.chars().count() <= 2 && name.first.chars().count() > 2 {
        std::mem::swap(&mut name.first, &mut name.last);
    }

    strip_initial_period(&mut name.first);
    strip_initial_period(&mut name.middle);

    let first: Vec<char> = name.first.chars().collect();
    if first.len() == 2 && first.iter().all(|c| c.is_alphabetic()) {
        name.middle = first[1].to_string();
        name.first = first[0].to_string();
    } else if dotted_initials().is_match(&name.first) {
        name.middle = first[2].to_string();
        name.first = first[0].to_string();
    }

    name.first = capitalize(&name.first);
    name.middle = capitalize(&name.middle);
    name.last = capitalize(&name.last);
}

fn strip_initial_period(part: &mut String) {
    let mut chars = part.chars();
    if let (Some(c), Some('.'), None) = (chars.next(), chars.next(), chars.next()) {
        *part = c.to_string();
    }
}

/// First character upper case, the rest lower case.
fn capitalize(part: &str) -> String {
    let mut chars = part.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn keep_suffix(suffix: &str) -> bool {
    if suffix.is_empty() {
        return false;
    }
    if suffix.chars().count() > MAX_SUFFIX_CHARS && suffix.matches('.').count() >= 2 {
        return false;
    }
    // A stray initial means a second person's name, not a suffix.
    !suffix
        .split(',')
        .flat_map(str::split_whitespace)
        .any(human_name::is_initial)
}
