//! Duplicate detection and merging.
//!
//! Records are grouped by last name. Within a group the ordered pairs are
//! checked against [`MERGE_RULES`]; the first rule with an opinion decides.
//! A merge replaces both records with a new one, after which only that
//! group is scanned again. Every merge shrinks the group by one, so the scan
//! terminates.

use std::collections::BTreeMap;

use tracing::{debug, info, trace};

use crate::error::RegistryError;
use crate::overrides::AuthoritativeName;
use crate::person::{Person, PersonId};
use crate::registry::PersonRegistry;

/// Decision of a merge rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The two records denote the same person.
    Merge,
    /// Keep the records apart.
    Skip,
}

/// One named step of the merge decision.
#[derive(Clone, Copy)]
pub struct MergeRule {
    /// Short identifier used in logs.
    pub name: &'static str,
    /// Returns a verdict if the rule applies to the pair.
    pub check: fn(&Person, &Person) -> Option<Verdict>,
}

impl std::fmt::Debug for MergeRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MergeRule").field("name", &self.name).finish()
    }
}

/// Merge rules in precedence order.
pub const MERGE_RULES: &[MergeRule] = &[
    MergeRule {
        name: "same_record",
        check: same_record,
    },
    MergeRule {
        name: "shared_alias",
        check: shared_alias,
    },
    MergeRule {
        name: "no_given_names",
        check: no_given_names,
    },
    MergeRule {
        name: "given_names_equal",
        check: given_names_equal,
    },
    MergeRule {
        name: "full_first_names_differ",
        check: full_first_names_differ,
    },
    MergeRule {
        name: "full_middle_names_differ",
        check: full_middle_names_differ,
    },
    MergeRule {
        name: "first_initials_differ",
        check: first_initials_differ,
    },
    MergeRule {
        name: "initials_agree",
        check: initials_agree,
    },
    MergeRule {
        name: "lone_first_initial",
        check: lone_first_initial,
    },
];

fn same_record(p1: &Person, p2: &Person) -> Option<Verdict> {
    (p1.id == p2.id).then_some(Verdict::Skip)
}

fn shared_alias(p1: &Person, p2: &Person) -> Option<Verdict> {
    p1.aliases
        .keys()
        .any(|alias| p2.aliases.contains(alias))
        .then_some(Verdict::Merge)
}

fn no_given_names(p1: &Person, p2: &Person) -> Option<Verdict> {
    let bare = |p: &Person| p.first.is_empty() && p.middle.is_empty();
    (bare(p1) || bare(p2)).then_some(Verdict::Skip)
}

fn given_names_equal(p1: &Person, p2: &Person) -> Option<Verdict> {
    (p1.first == p2.first && p1.middle == p2.middle).then_some(Verdict::Merge)
}

fn full_first_names_differ(p1: &Person, p2: &Person) -> Option<Verdict> {
    (is_full(&p1.first) && is_full(&p2.first) && p1.first != p2.first).then_some(Verdict::Skip)
}

fn full_middle_names_differ(p1: &Person, p2: &Person) -> Option<Verdict> {
    (is_full(&p1.middle) && is_full(&p2.middle) && p1.middle != p2.middle)
        .then_some(Verdict::Skip)
}

fn first_initials_differ(p1: &Person, p2: &Person) -> Option<Verdict> {
    match (initial(&p1.first), initial(&p2.first)) {
        (Some(a), Some(b)) if a != b => Some(Verdict::Skip),
        _ => None,
    }
}

fn initials_agree(p1: &Person, p2: &Person) -> Option<Verdict> {
    let both = |p: &Person| !p.first.is_empty() && !p.middle.is_empty();
    if !(both(p1) && both(p2)) {
        return None;
    }
    let agree = initial(&p1.first) == initial(&p2.first)
        && initial(&p1.middle) == initial(&p2.middle);
    Some(if agree { Verdict::Merge } else { Verdict::Skip })
}

// "W Dunn" could be any of several W Dunns; a middle initial is required.
fn lone_first_initial(p1: &Person, p2: &Person) -> Option<Verdict> {
    let lone = |p: &Person| p.first.chars().count() == 1 && p.middle.is_empty();
    (lone(p1) || lone(p2)).then_some(Verdict::Skip)
}

fn is_full(name: &str) -> bool {
    name.chars().count() > 2
}

fn initial(name: &str) -> Option<char> {
    name.chars().next()
}

/// Runs [`MERGE_RULES`] on a pair. Returns the verdict and the name of the
/// deciding rule; `"fallthrough"` means no rule applied and the pair is kept
/// apart.
#[must_use]
pub fn merge_verdict(p1: &Person, p2: &Person) -> (Verdict, &'static str) {
    MERGE_RULES
        .iter()
        .find_map(|rule| (rule.check)(p1, p2).map(|verdict| (verdict, rule.name)))
        .unwrap_or((Verdict::Skip, "fallthrough"))
}

/// Summary of a [`PersonRegistry::merge_duplicates`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Last-name groups examined.
    pub groups_scanned: usize,
    /// Merges performed.
    pub merges: usize,
    /// Records before merging.
    pub people_before: usize,
    /// Records after merging.
    pub people_after: usize,
}

/// Value containing `/` (e.g. `"DK/SHOOK"`) is a garbled name part.
fn pick_part<'a>(p1: &'a str, p2: &'a str) -> &'a str {
    let garbled = |s: &str| s.contains('/');
    match (garbled(p1), garbled(p2)) {
        (true, false) => p2,
        (false, true) => p1,
        _ if p2.chars().count() > p1.chars().count() => p2,
        _ => p1,
    }
}

impl PersonRegistry {
    /// Collapses spelling variants of the same person.
    ///
    /// # Errors
    /// Returns [`RegistryError`] if a record referenced by a group has gone
    /// missing, which means the arena and the grouping disagree.
    pub fn merge_duplicates(&mut self) -> Result<MergeReport, RegistryError> {
        let mut report = MergeReport {
            people_before: self.len(),
            ..MergeReport::default()
        };

        let mut groups: BTreeMap<String, Vec<PersonId>> = BTreeMap::new();
        for person in self.people.values() {
            groups.entry(person.last.clone()).or_default().push(person.id);
        }

        for (last, mut ids) in groups {
            report.groups_scanned += 1;
            while ids.len() > 1 {
                self.order_group(&mut ids)?;
                let Some((p1, p2)) = self.find_merge_candidate(&ids)? else {
                    break;
                };
                let merged = self.merge_two_persons(p1, p2, None)?;
                ids.retain(|id| *id != p1 && *id != p2);
                ids.push(merged);
                report.merges += 1;
            }
            trace!(last = %last, remaining = ids.len(), "group settled");
        }

        report.people_after = self.len();
        info!(
            groups = report.groups_scanned,
            merges = report.merges,
            before = report.people_before,
            after = report.people_after,
            "merged duplicates"
        );
        Ok(report)
    }

    /// Most occurrences first, ties by id.
    fn order_group(&self, ids: &mut [PersonId]) -> Result<(), RegistryError> {
        let mut keyed = Vec::with_capacity(ids.len());
        for id in ids.iter() {
            keyed.push((self.require(*id)?.count, *id));
        }
        keyed.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
        for (slot, (_, id)) in ids.iter_mut().zip(keyed) {
            *slot = id;
        }
        Ok(())
    }

    fn find_merge_candidate(
        &self,
        ids: &[PersonId],
    ) -> Result<Option<(PersonId, PersonId)>, RegistryError> {
        for &a in ids {
            let p1 = self.require(a)?;
            for &b in ids {
                let p2 = self.require(b)?;
                let (verdict, rule) = merge_verdict(p1, p2);
                trace!(p1 = %p1.full_name(), p2 = %p2.full_name(), rule, ?verdict, "merge rule");
                if verdict == Verdict::Merge {
                    return Ok(Some((a, b)));
                }
            }
        }
        Ok(None)
    }

    fn require(&self, id: PersonId) -> Result<&Person, RegistryError> {
        self.people
            .get(&id)
            .ok_or(RegistryError::PersonNotFound { id })
    }

    /// Replaces `p1` and `p2` with a single merged record and returns its id.
    ///
    /// The last name comes from `p1`; each given name takes the longer of the
    /// two values (ties go to `p1`, values containing `/` lose). Positions,
    /// aliases and counts are summed. With an authoritative name, its
    /// spelling replaces the merged name and its affiliation is pinned.
    ///
    /// # Errors
    /// - [`RegistryError::SelfMerge`] if `p1 == p2`
    /// - [`RegistryError::PersonNotFound`] if either id is not in the arena
    pub fn merge_two_persons(
        &mut self,
        p1: PersonId,
        p2: PersonId,
        authoritative: Option<&AuthoritativeName>,
    ) -> Result<PersonId, RegistryError> {
        if p1 == p2 {
            return Err(RegistryError::SelfMerge { id: p1 });
        }
        let a = self.require(p1)?;
        let b = self.require(p2)?;

        let mut merged = Person {
            id: p1,
            last: a.last.clone(),
            first: pick_part(&a.first, &b.first).to_string(),
            middle: pick_part(&a.middle, &b.middle).to_string(),
            positions: a.positions.combined(&b.positions),
            aliases: a.aliases.combined(&b.aliases),
            count: a.count.saturating_add(b.count),
        };
        let sources = format!("{} + {}", a.full_name(), b.full_name());
        if let Some(name) = authoritative {
            name.apply_to(&mut merged);
        }

        let id = self.allocate_id();
        merged.id = id;
        debug!(%p1, %p2, %id, from = %sources, into = %merged.full_name(), "merging records");

        self.remove_person(p1);
        self.remove_person(p2);
        self.people.insert(id, merged);
        self.index_person(id);
        Ok(id)
    }
}
