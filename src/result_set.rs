use crate::notify::dedupe_key;
use crate::types::{PriorityLevel, ScoredProposal};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

/// A record skipped during filtering, with the reason it was rejected
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Position of the record in the submitted batch
    pub index: usize,
    /// Identifier, when the record carried one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Where the record came from (file path, stdin line)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    pub reason: String,
}

/// Result-set ordering: priority descending, then last modification
/// descending
pub fn compare_entries(a: &ScoredProposal, b: &ScoredProposal) -> Ordering {
    b.priority()
        .cmp(&a.priority())
        .then_with(|| b.last_modified().cmp(&a.last_modified()))
}

/// Ordered output of one filtering cycle.
///
/// Entries are sorted with a stable sort, so proposals that tie on both
/// priority and timestamp keep their submission order. An empty result set
/// means "no relevant items this cycle".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultSet {
    entries: Vec<ScoredProposal>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    diagnostics: Vec<Diagnostic>,
}

impl ResultSet {
    pub(crate) fn new(mut entries: Vec<ScoredProposal>, diagnostics: Vec<Diagnostic>) -> Self {
        entries.sort_by(compare_entries);
        Self {
            entries,
            diagnostics,
        }
    }

    pub fn entries(&self) -> &[ScoredProposal] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScoredProposal> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records skipped because they were malformed
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Entries at or above `level`, in result order
    pub fn at_least(&self, level: PriorityLevel) -> impl Iterator<Item = &ScoredProposal> {
        self.entries.iter().filter(move |e| e.priority() >= level)
    }

    /// Entries worth a push notification (Critical and High)
    pub fn notifiable(&self) -> impl Iterator<Item = &ScoredProposal> {
        self.at_least(PriorityLevel::High)
    }

    /// Number of entries per level; every level is present, possibly with 0
    pub fn count_by_level(&self) -> BTreeMap<PriorityLevel, usize> {
        let mut counts: BTreeMap<PriorityLevel, usize> =
            PriorityLevel::ALL.iter().map(|l| (*l, 0)).collect();
        for entry in &self.entries {
            *counts.entry(entry.priority()).or_insert(0) += 1;
        }
        counts
    }

    /// Entries whose dedupe key is not in `seen`, in result order
    pub fn unseen<'a>(&'a self, seen: &'a HashSet<String>) -> impl Iterator<Item = &'a ScoredProposal> {
        self.entries
            .iter()
            .filter(move |e| !seen.contains(&dedupe_key(e)))
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a ScoredProposal;
    type IntoIter = std::slice::Iter<'a, ScoredProposal>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl IntoIterator for ResultSet {
    type Item = ScoredProposal;
    type IntoIter = std::vec::IntoIter<ScoredProposal>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
