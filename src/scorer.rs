//! Priority scorer
//!
//! The priority of a matched proposal is decided by an ordered rule table.
//! Rules are evaluated top to bottom and the first one whose predicate holds
//! wins. The last rule always applies, so scoring cannot fail.

use crate::matcher::MatchSet;
use crate::taxonomy::{ScoringPolicy, Taxonomy};
use crate::text::normalize_text;
use crate::types::{PriorityLevel, Proposal};
use serde::Serialize;
use std::fmt;

/// Largest contribution a single topic makes to the relevance score
const TOPIC_WEIGHT_CAP: u32 = 15;
/// Points per unit of proposal-kind weight
const KIND_WEIGHT_FACTOR: u32 = 3;
/// Bonus when the proposal is moving through the legislature
const ACTIVE_MOVEMENT_BONUS: u32 = 15;

/// Identifies the rule that produced a priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    AlwaysCritical,
    ActiveMovement,
    CrossCutting,
    SingleTopic,
    Fallback,
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlwaysCritical => write!(f, "always_critical"),
            Self::ActiveMovement => write!(f, "active_movement"),
            Self::CrossCutting => write!(f, "cross_cutting"),
            Self::SingleTopic => write!(f, "single_topic"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

/// Everything a rule predicate may look at
pub struct RuleInput<'a> {
    pub proposal: &'a Proposal,
    pub matches: &'a MatchSet,
    pub policy: &'a ScoringPolicy,
}

/// One entry of the precedence table
pub struct Rule {
    pub kind: RuleKind,
    pub level: PriorityLevel,
    predicate: fn(&RuleInput<'_>) -> bool,
}

impl Rule {
    pub fn applies(&self, input: &RuleInput<'_>) -> bool {
        (self.predicate)(input)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("kind", &self.kind)
            .field("level", &self.level)
            .finish()
    }
}

fn matched_critical(input: &RuleInput<'_>) -> bool {
    input.matches.has_critical()
}

fn moving_with_matches(input: &RuleInput<'_>) -> bool {
    !input.matches.is_empty() && is_active_movement(input.proposal, input.policy)
}

fn several_topics(input: &RuleInput<'_>) -> bool {
    input.matches.len() >= 2
}

fn single_topic(input: &RuleInput<'_>) -> bool {
    input.matches.len() == 1
}

fn always(_: &RuleInput<'_>) -> bool {
    true
}

/// The precedence table, highest precedence first
pub const RULES: &[Rule] = &[
    Rule {
        kind: RuleKind::AlwaysCritical,
        level: PriorityLevel::Critical,
        predicate: matched_critical,
    },
    Rule {
        kind: RuleKind::ActiveMovement,
        level: PriorityLevel::High,
        predicate: moving_with_matches,
    },
    Rule {
        kind: RuleKind::CrossCutting,
        level: PriorityLevel::Medium,
        predicate: several_topics,
    },
    Rule {
        kind: RuleKind::SingleTopic,
        level: PriorityLevel::Low,
        predicate: single_topic,
    },
    Rule {
        kind: RuleKind::Fallback,
        level: PriorityLevel::Info,
        predicate: always,
    },
];

/// Whether the proposal's status or regime signals active legislative
/// movement under the given policy
pub fn is_active_movement(proposal: &Proposal, policy: &ScoringPolicy) -> bool {
    let status = normalize_text(&proposal.status);
    if !status.is_empty()
        && policy
            .active_statuses()
            .iter()
            .any(|s| status.contains(s.as_str()))
    {
        return true;
    }

    let regime = proposal.regime.as_deref().map(normalize_text).unwrap_or_default();
    !regime.is_empty()
        && policy
            .urgent_regimes()
            .iter()
            .any(|r| regime.contains(r.as_str()))
}

/// Evaluate the rule table and report which rule fired
pub fn evaluate(proposal: &Proposal, matches: &MatchSet, taxonomy: &Taxonomy) -> (RuleKind, PriorityLevel) {
    let input = RuleInput {
        proposal,
        matches,
        policy: taxonomy.policy(),
    };
    RULES
        .iter()
        .find(|rule| rule.applies(&input))
        .map(|rule| (rule.kind, rule.level))
        .unwrap_or((RuleKind::Fallback, PriorityLevel::Info))
}

/// Compute the priority level of a matched proposal
pub fn score(proposal: &Proposal, matches: &MatchSet, taxonomy: &Taxonomy) -> PriorityLevel {
    evaluate(proposal, matches, taxonomy).1
}

/// Informational relevance score from 0 to 100. Combines topic weights, the
/// weight of the proposal kind and procedural movement. It does not affect
/// the priority level or the result ordering.
pub fn relevance(proposal: &Proposal, matches: &MatchSet, taxonomy: &Taxonomy) -> u8 {
    let policy = taxonomy.policy();
    let topics: u32 = matches
        .topics()
        .iter()
        .filter_map(|name| taxonomy.topic(name))
        .map(|topic| topic.weight().min(TOPIC_WEIGHT_CAP))
        .sum();
    let kind = policy
        .kind_weight(proposal.kind.as_deref())
        .saturating_mul(KIND_WEIGHT_FACTOR);
    let movement = if is_active_movement(proposal, policy) {
        ACTIVE_MOVEMENT_BONUS
    } else {
        0
    };
    topics.saturating_add(kind).saturating_add(movement).min(100) as u8
}
