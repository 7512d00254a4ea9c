//! Selection helpers for notification collaborators.
//!
//! Delivery itself (Telegram, e-mail) lives outside this crate. What lives
//! here is the decision of *which* entries go out: level threshold, quiet
//! hours, already-delivered keys, and the daily digest summary.

use crate::error::{Error, Result};
use crate::result_set::ResultSet;
use crate::types::{PriorityLevel, ScoredProposal, BRASILIA_UTC_OFFSET_SECS};
use chrono::{DateTime, Timelike, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Critical entries listed by name in a digest
const DIGEST_CRITICAL_LIMIT: usize = 3;
/// High entries listed by name in a digest
const DIGEST_HIGH_LIMIT: usize = 5;

/// Key identifying one delivered state of a proposal. A proposal is notified
/// again only after its status timestamp changes.
pub fn dedupe_key(entry: &ScoredProposal) -> String {
    format!("{}::{}", entry.id(), entry.last_modified().to_rfc3339())
}

/// Hour of the day in Brasília at the instant `now`. Quiet hours are
/// expressed in this zone whatever the host clock is set to.
pub fn brasilia_hour(now: DateTime<Utc>) -> u32 {
    let secs = now.num_seconds_from_midnight() as i32 + BRASILIA_UTC_OFFSET_SECS;
    (secs.rem_euclid(86_400) / 3600) as u32
}

/// Hours of the day during which only critical entries are delivered.
/// `start` is inclusive and `end` exclusive; `start > end` wraps midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuietHours {
    start: u32,
    end: u32,
}

impl QuietHours {
    pub fn new(start: u32, end: u32) -> Result<Self> {
        if start > 23 || end > 23 {
            return Err(Error::Config(format!(
                "Quiet hours must be between 0 and 23, got {}-{}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, hour: u32) -> bool {
        if self.start > self.end {
            hour >= self.start || hour < self.end
        } else {
            self.start <= hour && hour < self.end
        }
    }
}

impl std::str::FromStr for QuietHours {
    type Err = Error;

    /// Parse `"22-7"`
    fn from_str(s: &str) -> Result<Self> {
        let (start, end) = s
            .split_once('-')
            .ok_or_else(|| Error::Config(format!("Invalid quiet hours '{}', expected START-END", s)))?;
        let parse = |v: &str| {
            v.trim()
                .parse::<u32>()
                .map_err(|_| Error::Config(format!("Invalid hour '{}' in quiet hours", v.trim())))
        };
        Self::new(parse(start)?, parse(end)?)
    }
}

/// Which result-set entries warrant a push notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationPolicy {
    pub min_level: PriorityLevel,
    pub quiet_hours: Option<QuietHours>,
}

impl Default for NotificationPolicy {
    fn default() -> Self {
        Self {
            min_level: PriorityLevel::High,
            quiet_hours: None,
        }
    }
}

impl NotificationPolicy {
    /// Effective threshold at a given hour of the day
    pub fn threshold_at(&self, hour: u32) -> PriorityLevel {
        match self.quiet_hours {
            Some(quiet) if quiet.contains(hour) => PriorityLevel::Critical,
            _ => self.min_level,
        }
    }

    /// Entries to deliver at `hour`, in result order
    pub fn select<'a>(&self, results: &'a ResultSet, hour: u32) -> Vec<&'a ScoredProposal> {
        results.at_least(self.threshold_at(hour)).collect()
    }
}

/// Summary of one cycle, as sent in the end-of-day message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Digest {
    pub total: usize,
    pub counts: BTreeMap<PriorityLevel, usize>,
    /// Labels of the first critical entries
    pub critical: Vec<String>,
    /// Labels of the first high entries
    pub high: Vec<String>,
    /// Entries below High
    pub others: usize,
}

impl Digest {
    pub fn from_results(results: &ResultSet) -> Self {
        let labels = |level: PriorityLevel, limit: usize| -> Vec<String> {
            results
                .iter()
                .filter(|e| e.priority() == level)
                .take(limit)
                .map(|e| e.proposal().label())
                .collect()
        };
        let counts = results.count_by_level();
        let others = results
            .iter()
            .filter(|e| e.priority() < PriorityLevel::High)
            .count();

        Self {
            total: results.len(),
            critical: labels(PriorityLevel::Critical, DIGEST_CRITICAL_LIMIT),
            high: labels(PriorityLevel::High, DIGEST_HIGH_LIMIT),
            counts,
            others,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}
