//! Extraction stages run before the name itself is split.
//!
//! Each stage takes the working string and returns what is left of it,
//! pushing any extracted position tokens onto the accumulator.

use std::sync::OnceLock;

use regex::Regex;

use crate::org_dictionary::{is_skip, OrgDictionary};
use crate::parser::human_name::HumanName;

const PRIVLOG_MARKER: &str = "[Privlog:]";
const DASH_DELIMITER: &str = " - ";

static PARENTHETICAL: OnceLock<Regex> = OnceLock::new();
static TRAILING_INITIALS: OnceLock<Regex> = OnceLock::new();

fn parenthetical() -> &'static Regex {
    PARENTHETICAL.get_or_init(|| Regex::new(r"\([^(]+\)").expect("static regex is valid"))
}

fn trailing_initials() -> &'static Regex {
    TRAILING_INITIALS
        .get_or_init(|| Regex::new(r"-([A-Za-z]{1,2})$").expect("static regex is valid"))
}

/// Drops privilege-log annotations such as
/// `"Temko, Stanley L [Privlog:] TEMKO,SL"`.
///
/// When the marker leads the string, the text up to the next marker is kept.
pub(crate) fn strip_privlog(name: &str) -> &str {
    match name.find(PRIVLOG_MARKER) {
        Some(0) => {
            let rest = &name[PRIVLOG_MARKER.len()..];
            match rest.find(PRIVLOG_MARKER) {
                Some(end) => &rest[..end],
                None => rest,
            }
        }
        Some(idx) => &name[..idx],
        None => name,
    }
}

/// `"BAKER, T E - NATIONAL ASSOCIATION OF ATTORNEYS GENERAL"`: a single
/// `" - "` separates the name from a position.
pub(crate) fn split_dash_position(name: &str, positions: &mut Vec<String>) -> String {
    if name.matches(DASH_DELIMITER).count() != 1 {
        return name.to_string();
    }
    match name.split_once(DASH_DELIMITER) {
        Some((head, tail)) => {
            let tail = tail.trim();
            if !tail.is_empty() {
                positions.push(tail.to_string());
            }
            head.to_string()
        }
        None => name.to_string(),
    }
}

/// `"Henson, A (Chadbourne & Parke)"`: every non-nested parenthesized group
/// is a position.
pub(crate) fn extract_parentheticals(name: &str, positions: &mut Vec<String>) -> String {
    let groups: Vec<String> = parenthetical()
        .find_iter(name)
        .map(|m| m.as_str().to_string())
        .collect();

    let mut out = name.to_string();
    for group in groups {
        let token = group.trim_matches(|c| matches!(c, ',' | '#' | '(' | ')' | ' '));
        if !token.is_empty() {
            positions.push(token.to_string());
        }
        out = out.replace(&group, "");
    }
    out
}

/// Removes curated organization names that appear as whole words.
///
/// The right-most hit of each raw string is removed repeatedly until none is
/// left. Two-character abbreviations ("PM", "BW") are only removed when the
/// rest still reads as a first and last name, because they are just as often
/// a person's initials.
pub(crate) fn extract_organizations(
    name: &str,
    dictionary: &OrgDictionary,
    positions: &mut Vec<String>,
) -> String {
    let mut out = name.to_string();

    for matcher in dictionary.matchers() {
        let width = matcher.raw.chars().count();
        if width < 2 {
            continue;
        }

        loop {
            let Some(hit) = matcher.pattern.find_iter(&out).last() else {
                break;
            };
            let candidate = format!("{}{}", &out[..hit.start()], &out[hit.end()..]);

            if width == 2 {
                let probe = HumanName::parse(&candidate);
                if probe.first.is_empty() || probe.last.is_empty() {
                    break;
                }
            }

            out = candidate;
            if !is_skip(&matcher.clean) {
                positions.push(matcher.clean.clone());
            }
        }
    }

    out.trim_matches(|c| c == ',' || c == ' ').to_string()
}

/// Strips stray `#` and turns `"DUNN-WL"` into `"DUNN WL"`.
pub(crate) fn clean_punctuation(name: &str) -> String {
    let trimmed = name.trim_matches(|c| c == ' ' || c == '#');
    trailing_initials().replace(trimmed, " $1").into_owned()
}
