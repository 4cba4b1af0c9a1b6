//! Comma/whitespace splitting of a cleaned name into its components.
//!
//! Three shapes are recognised:
//!
//! ```text
//! Last, First Middle[, Suffix[, Suffix]]   lastname comma
//! First Middle Last, Suffix                suffix comma
//! First Middle Last [Suffix]               no comma
//! ```
//!
//! Titles are never recognised ("DR" and "MR" are far more often initials in
//! this corpus). Single letters are never suffixes, so "Baker, JR" keeps
//! "JR" as initials.

const SUFFIXES: &[&str] = &[
    "jr", "sr", "ii", "iii", "iv", "esq", "esquire", "phd", "md", "dds", "dmd", "dvm", "mph",
    "jd", "llb", "llm", "lld", "mba", "cpa", "rn",
];

const LAST_NAME_PARTICLES: &[&str] = &[
    "van", "von", "de", "del", "della", "der", "di", "da", "du", "la", "le", "st", "ten", "ter",
];

/// Components of a name as split by [`HumanName::parse`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HumanName {
    /// First given name or initial.
    pub first: String,
    /// Remaining given names, space separated.
    pub middle: String,
    /// Family name, space separated when it has particles.
    pub last: String,
    /// Suffixes joined with `", "`.
    pub suffix: String,
}

#[derive(Default)]
struct Pieces<'a> {
    first: Option<&'a str>,
    middle: Vec<&'a str>,
    last: Vec<&'a str>,
    suffix: Vec<&'a str>,
}

impl HumanName {
    /// Splits `input` into first/middle/last/suffix.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let collapsed = input.split_whitespace().collect::<Vec<_>>().join(" ");
        let trimmed = collapsed.trim_end_matches(|c: char| c == ',' || c.is_whitespace());

        let parts: Vec<&str> = trimmed
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();

        let pieces = match parts.as_slice() {
            [] => Pieces::default(),
            [only] => split_plain(&words(only)),
            [head, second, ..] => {
                let head_words = words(head);
                let second_words = words(second);
                if head_words.len() > 1
                    && !second_words.is_empty()
                    && second_words.iter().all(|w| is_suffix(w))
                {
                    let mut pieces = split_plain(&head_words);
                    pieces.suffix.extend(parts[1..].iter().copied());
                    pieces
                } else {
                    split_lastname_comma(&head_words, &second_words, &parts[2..])
                }
            }
        };

        Self {
            first: pieces.first.unwrap_or_default().to_string(),
            middle: pieces.middle.join(" "),
            last: pieces.last.join(" "),
            suffix: pieces.suffix.join(", "),
        }
    }
}

fn words(part: &str) -> Vec<&str> {
    part.split_whitespace().collect()
}

fn split_plain<'a>(words: &[&'a str]) -> Pieces<'a> {
    let mut pieces = Pieces::default();
    let Some((&first, rest)) = words.split_first() else {
        return pieces;
    };
    pieces.first = Some(first);

    for (i, &word) in rest.iter().enumerate() {
        let after = &rest[i + 1..];
        if after.iter().all(|w| is_suffix(w)) {
            pieces.last.push(word);
            pieces.suffix.extend(after.iter().copied());
            break;
        }
        if is_particle(word) {
            let mut end = rest.len();
            while end > i + 1 && is_suffix(rest[end - 1]) {
                end -= 1;
            }
            pieces.last.extend(rest[i..end].iter().copied());
            pieces.suffix.extend(rest[end..].iter().copied());
            break;
        }
        pieces.middle.push(word);
    }
    pieces
}

fn split_lastname_comma<'a>(
    family: &[&'a str],
    given: &[&'a str],
    trailing: &[&'a str],
) -> Pieces<'a> {
    let mut pieces = Pieces::default();

    for (i, &word) in family.iter().enumerate() {
        // The leading word is always a family name, even if it looks like a suffix.
        if i > 0 && is_suffix(word) {
            pieces.suffix.push(word);
        } else {
            pieces.last.push(word);
        }
    }

    for &word in given {
        if pieces.first.is_none() {
            pieces.first = Some(word);
        } else if is_suffix(word) {
            pieces.suffix.push(word);
        } else {
            pieces.middle.push(word);
        }
    }

    pieces.suffix.extend(trailing.iter().copied());
    pieces
}

/// A single letter, optionally followed by a period.
pub(crate) fn is_initial(word: &str) -> bool {
    let mut chars = word.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some(c), None, None) => c.is_alphabetic(),
        (Some(c), Some('.'), None) => c.is_alphabetic(),
        _ => false,
    }
}

pub(crate) fn is_suffix(word: &str) -> bool {
    if is_initial(word) {
        return false;
    }
    let key = word.to_lowercase().replace('.', "");
    SUFFIXES.contains(&key.as_str())
}

fn is_particle(word: &str) -> bool {
    LAST_NAME_PARTICLES.contains(&word.to_lowercase().as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(input: &str) -> (String, String, String, String) {
        let n = HumanName::parse(input);
        (n.first, n.middle, n.last, n.suffix)
    }

    fn owned(a: &str, b: &str, c: &str, d: &str) -> (String, String, String, String) {
        (a.to_string(), b.to_string(), c.to_string(), d.to_string())
    }

    #[test]
    fn test_lastname_comma() {
        assert_eq!(split("Dunn, William L"), owned("William", "L", "Dunn", ""));
        assert_eq!(split("Dunn, W. L."), owned("W.", "L.", "Dunn", ""));
        assert_eq!(split("Baker, JR"), owned("JR", "", "Baker", ""));
    }

    #[test]
    fn test_lastname_comma_with_trailing_suffixes() {
        assert_eq!(
            split("Teague, Claude Edward, Jr., Ph.D."),
            owned("Claude", "Edward", "Teague", "Jr., Ph.D.")
        );
        assert_eq!(split("Smith, Andy B, J.R."), owned("Andy", "B", "Smith", "J.R."));
    }

    #[test]
    fn test_no_comma_puts_last_word_in_last() {
        assert_eq!(split("TEAGUE CE JR"), owned("TEAGUE", "", "CE", "JR"));
        assert_eq!(split("A B Cantrell"), owned("A", "B", "Cantrell", ""));
        assert_eq!(split("TEMKO"), owned("TEMKO", "", "", ""));
    }

    #[test]
    fn test_suffix_comma() {
        assert_eq!(split("Claude Teague, Jr."), owned("Claude", "", "Teague", "Jr."));
    }

    #[test]
    fn test_particles_join_last_name() {
        assert_eq!(split("J van der Berg"), owned("J", "", "van der Berg", ""));
        assert_eq!(split("J van der Berg Jr"), owned("J", "", "van der Berg", "Jr"));
    }

    #[test]
    fn test_whitespace_and_trailing_commas() {
        assert_eq!(split("  TEMKO   PM ,  "), owned("TEMKO", "", "PM", ""));
        assert_eq!(split(""), owned("", "", "", ""));
        assert_eq!(split(" , "), owned("", "", "", ""));
    }

    #[test]
    fn test_initials_are_never_suffixes() {
        assert!(is_initial("W"));
        assert!(is_initial("W."));
        assert!(!is_initial("WL"));
        assert!(is_suffix("Jr."));
        assert!(is_suffix("PH.D."));
        assert!(!is_suffix("J"));
    }
}
