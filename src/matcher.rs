//! Topic matcher - tests proposal text against the keyword taxonomy
//!
//! Pure functions of (text, taxonomy). No I/O, no shared state.

use crate::taxonomy::{Keyword, Taxonomy, Topic};
use crate::text::searchable_text;
use crate::types::Proposal;
use std::collections::BTreeSet;

/// The topics a proposal satisfies, with the keywords that triggered them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchSet {
    topics: BTreeSet<String>,
    triggers: BTreeSet<String>,
    critical: bool,
}

impl MatchSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a match set from topics directly, as if each had been hit by a
    /// non-critical keyword
    pub fn from_topics<'a>(topics: impl IntoIterator<Item = &'a Topic>) -> Self {
        let mut set = Self::new();
        for topic in topics {
            set.insert(topic, None);
        }
        set
    }

    /// Record a topic hit, optionally with the keyword responsible
    pub fn insert(&mut self, topic: &Topic, trigger: Option<&Keyword>) {
        self.topics.insert(topic.name().to_string());
        if topic.is_always_critical() {
            self.critical = true;
        }
        if let Some(keyword) = trigger {
            self.triggers.insert(keyword.pattern().to_string());
            if keyword.is_critical() {
                self.critical = true;
            }
        }
    }

    pub fn topics(&self) -> &BTreeSet<String> {
        &self.topics
    }

    pub fn triggers(&self) -> &BTreeSet<String> {
        &self.triggers
    }

    /// True when an always-critical topic or a critical keyword matched
    pub fn has_critical(&self) -> bool {
        self.critical
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    pub(crate) fn into_parts(self) -> (BTreeSet<String>, BTreeSet<String>) {
        (self.topics, self.triggers)
    }
}

/// Match already-normalized text against the taxonomy.
///
/// Exclusion patterns are checked first; a hit on any of them yields an
/// empty match set. Every keyword of every topic is tested so that all
/// triggers are reported.
pub fn match_text(normalized_text: &str, taxonomy: &Taxonomy) -> MatchSet {
    let mut set = MatchSet::new();
    if normalized_text.is_empty() {
        return set;
    }

    if let Some(excluded) = taxonomy
        .exclusions()
        .iter()
        .find(|kw| kw.occurs_in(normalized_text))
    {
        log::debug!("Text excluded by pattern '{}'", excluded.pattern());
        return set;
    }

    for topic in taxonomy.topics() {
        for keyword in topic.keywords() {
            if keyword.occurs_in(normalized_text) {
                set.insert(topic, Some(keyword));
            }
        }
    }
    set
}

/// Match a proposal's searchable text (title, summary, source keywords)
pub fn match_topics(proposal: &Proposal, taxonomy: &Taxonomy) -> MatchSet {
    let text = searchable_text(proposal.searchable_parts());
    match_text(&text, taxonomy)
}
