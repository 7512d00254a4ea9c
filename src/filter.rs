//! Relevance filter: runs the matcher and the scorer over a batch and builds
//! the ordered result set.

use crate::matcher::match_topics;
use crate::result_set::{Diagnostic, ResultSet};
use crate::scorer::{evaluate, relevance};
use crate::taxonomy::Taxonomy;
use crate::types::{Proposal, RawProposal, ScoredProposal};

/// Filter result for a single proposal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterResult {
    Keep(ScoredProposal),
    FilterOut,
}

/// A raw record together with where it was read from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourcedRecord {
    pub origin: Option<String>,
    pub record: RawProposal,
}

impl From<RawProposal> for SourcedRecord {
    fn from(record: RawProposal) -> Self {
        Self {
            origin: None,
            record,
        }
    }
}

/// Applies a taxonomy to proposals. Holds the taxonomy by reference only,
/// so one taxonomy can back any number of filters, including on other
/// threads.
#[derive(Debug, Clone, Copy)]
pub struct RelevanceFilter<'a> {
    taxonomy: &'a Taxonomy,
}

impl<'a> RelevanceFilter<'a> {
    pub fn new(taxonomy: &'a Taxonomy) -> Self {
        Self { taxonomy }
    }

    /// Match and score one proposal. Proposals matching no topic are
    /// filtered out before scoring.
    pub fn should_keep(&self, proposal: &Proposal) -> FilterResult {
        let matches = match_topics(proposal, self.taxonomy);
        if matches.is_empty() {
            return FilterResult::FilterOut;
        }

        let (rule, priority) = evaluate(proposal, &matches, self.taxonomy);
        let relevance = relevance(proposal, &matches, self.taxonomy);
        let (topics, triggers) = matches.into_parts();
        FilterResult::Keep(ScoredProposal::new(
            proposal.clone(),
            topics,
            triggers,
            priority,
            rule,
            relevance,
        ))
    }

    /// Filter a batch of validated proposals
    pub fn filter(&self, proposals: &[Proposal]) -> ResultSet {
        let entries: Vec<ScoredProposal> = proposals
            .iter()
            .filter_map(|p| match self.should_keep(p) {
                FilterResult::Keep(scored) => Some(scored),
                FilterResult::FilterOut => None,
            })
            .collect();
        log::info!(
            "Filtered {} proposals: {} relevant",
            proposals.len(),
            entries.len()
        );
        ResultSet::new(entries, Vec::new())
    }

    /// Validate and filter a batch of raw records. Records missing a
    /// required field are skipped and reported as diagnostics; the rest of
    /// the batch is processed normally.
    pub fn filter_records<I, R>(&self, records: I) -> ResultSet
    where
        I: IntoIterator<Item = R>,
        R: Into<SourcedRecord>,
    {
        let mut entries = Vec::new();
        let mut diagnostics = Vec::new();
        let mut total = 0usize;

        for (index, sourced) in records.into_iter().map(Into::into).enumerate() {
            total += 1;
            let SourcedRecord { origin, record } = sourced;
            let id = record.id.clone();
            let proposal = match Proposal::try_from(record) {
                Ok(p) => p,
                Err(e) => {
                    log::warn!(
                        "Skipping record {} ({}): {}",
                        index,
                        origin.as_deref().or(id.as_deref()).unwrap_or("unknown"),
                        e
                    );
                    diagnostics.push(Diagnostic {
                        index,
                        id,
                        origin,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            match self.should_keep(&proposal) {
                FilterResult::Keep(scored) => entries.push(scored),
                FilterResult::FilterOut => {
                    log::debug!("No topic matched proposal {}", proposal.id);
                }
            }
        }

        log::info!(
            "Filtered {} records: {} relevant, {} malformed",
            total,
            entries.len(),
            diagnostics.len()
        );
        ResultSet::new(entries, diagnostics)
    }
}

/// Filter a batch of proposals against a taxonomy
pub fn filter(proposals: &[Proposal], taxonomy: &Taxonomy) -> ResultSet {
    RelevanceFilter::new(taxonomy).filter(proposals)
}

/// Validate, filter and order a batch of raw records
pub fn filter_records<I, R>(records: I, taxonomy: &Taxonomy) -> ResultSet
where
    I: IntoIterator<Item = R>,
    R: Into<SourcedRecord>,
{
    RelevanceFilter::new(taxonomy).filter_records(records)
}
