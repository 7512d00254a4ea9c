use crate::error::{Error, Result};
use crate::scorer::RuleKind;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Brasília's offset from UTC. The Câmara open-data API reports naive
/// timestamps in this zone, which has had no daylight saving since 2019.
pub const BRASILIA_UTC_OFFSET_SECS: i32 = -3 * 3600;

/// A legislative proposal as decoded from the data source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    /// Stable, source-assigned identifier
    pub id: String,
    pub title: String,
    pub summary: String,
    /// Procedural situation, as published by the source
    pub status: String,
    /// Body currently holding the proposal (committee, plenary, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authoring_body: Option<String>,
    pub last_modified: DateTime<Utc>,
    /// Proposal kind abbreviation, e.g. `PL`, `PEC`, `MPV`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    /// Procedural regime, e.g. "Urgência (Art. 155, RICD)"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regime: Option<String>,
    /// Indexing keywords assigned by the source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
}

impl Proposal {
    /// Human-readable label: "PL 1234/2025" when kind, number and year are
    /// known, otherwise the identifier.
    pub fn label(&self) -> String {
        match (&self.kind, &self.number, &self.year) {
            (Some(kind), Some(number), Some(year))
                if !kind.trim().is_empty()
                    && !number.trim().is_empty()
                    && !year.trim().is_empty() =>
            {
                format!("{} {}/{}", kind.trim(), number.trim(), year.trim())
            }
            _ => self.id.clone(),
        }
    }

    /// Whole days elapsed between the last modification and `as_of`.
    /// Negative spans (clock skew, future timestamps) clamp to zero.
    pub fn days_idle(&self, as_of: DateTime<Utc>) -> i64 {
        (as_of - self.last_modified).num_days().max(0)
    }

    /// The parts of the proposal searched by the matcher
    pub fn searchable_parts(&self) -> impl Iterator<Item = &str> {
        [
            Some(self.title.as_str()),
            Some(self.summary.as_str()),
            self.keywords.as_deref(),
        ]
        .into_iter()
        .flatten()
    }
}

/// A proposal record before validation. Every field is optional so that a
/// malformed record can be reported instead of failing the whole batch.
/// Built from decoded JSON by the functions in [`crate::selectors`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawProposal {
    pub id: Option<String>,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub status: Option<String>,
    pub authoring_body: Option<String>,
    pub last_modified: Option<String>,
    pub kind: Option<String>,
    pub number: Option<String>,
    pub year: Option<String>,
    pub regime: Option<String>,
    pub keywords: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl TryFrom<RawProposal> for Proposal {
    type Error = Error;

    fn try_from(raw: RawProposal) -> Result<Self> {
        let id = non_blank(raw.id).ok_or(Error::MissingField { field: "id" })?;
        let title = raw.title.ok_or(Error::MissingField { field: "title" })?;
        let summary = raw.summary.ok_or(Error::MissingField { field: "summary" })?;
        let status = raw.status.ok_or(Error::MissingField { field: "status" })?;
        let last_modified = non_blank(raw.last_modified).ok_or(Error::MissingField {
            field: "last_modified",
        })?;
        let last_modified = parse_timestamp(&last_modified)
            .ok_or_else(|| Error::InvalidTimestamp(last_modified.clone()))?;

        Ok(Proposal {
            id: id.trim().to_string(),
            title,
            summary,
            status,
            authoring_body: non_blank(raw.authoring_body),
            last_modified,
            kind: non_blank(raw.kind),
            number: non_blank(raw.number),
            year: non_blank(raw.year),
            regime: non_blank(raw.regime),
            keywords: non_blank(raw.keywords),
        })
    }
}

/// Parse a source timestamp. Accepts RFC 3339, naive date-times with or
/// without seconds, and bare dates (midnight). Naive values are read as
/// Brasília local time.
pub fn parse_timestamp(timestamp_str: &str) -> Option<DateTime<Utc>> {
    let s = timestamp_str.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    let offset = FixedOffset::east_opt(BRASILIA_UTC_OFFSET_SECS)?;
    let naive = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;

    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Discrete urgency ranking. Variants are declared from least to most urgent
/// so that the derived ordering gives `Critical > High > Medium > Low > Info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityLevel {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl PriorityLevel {
    /// All levels, most urgent first
    pub const ALL: [PriorityLevel; 5] = [
        PriorityLevel::Critical,
        PriorityLevel::High,
        PriorityLevel::Medium,
        PriorityLevel::Low,
        PriorityLevel::Info,
    ];
}

impl fmt::Display for PriorityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Critical => write!(f, "critical"),
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
            Self::Low => write!(f, "low"),
            Self::Info => write!(f, "info"),
        }
    }
}

impl FromStr for PriorityLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        // Portuguese names are what the dashboards and alert channels use
        match crate::text::normalize_text(s).as_str() {
            "critical" | "critico" => Ok(Self::Critical),
            "high" | "alto" => Ok(Self::High),
            "medium" | "medio" => Ok(Self::Medium),
            "low" | "baixo" => Ok(Self::Low),
            "info" => Ok(Self::Info),
            _ => Err(Error::Config(format!(
                "Invalid priority level '{}'. Use: critical, high, medium, low, info",
                s
            ))),
        }
    }
}

/// A matched and scored proposal. Only the relevance filter builds these, so
/// every instance carries at least one matched topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoredProposal {
    proposal: Proposal,
    topics: BTreeSet<String>,
    triggers: BTreeSet<String>,
    priority: PriorityLevel,
    rule: RuleKind,
    relevance: u8,
}

impl ScoredProposal {
    pub(crate) fn new(
        proposal: Proposal,
        topics: BTreeSet<String>,
        triggers: BTreeSet<String>,
        priority: PriorityLevel,
        rule: RuleKind,
        relevance: u8,
    ) -> Self {
        debug_assert!(!topics.is_empty(), "scored proposal without topics");
        Self {
            proposal,
            topics,
            triggers,
            priority,
            rule,
            relevance,
        }
    }

    pub fn proposal(&self) -> &Proposal {
        &self.proposal
    }

    /// Names of the matched topics
    pub fn topics(&self) -> &BTreeSet<String> {
        &self.topics
    }

    /// Normalized keywords that produced the match
    pub fn triggers(&self) -> &BTreeSet<String> {
        &self.triggers
    }

    pub fn priority(&self) -> PriorityLevel {
        self.priority
    }

    /// The scoring rule that decided the priority
    pub fn rule(&self) -> RuleKind {
        self.rule
    }

    /// Informational relevance score, 0 to 100
    pub fn relevance(&self) -> u8 {
        self.relevance
    }

    pub fn id(&self) -> &str {
        &self.proposal.id
    }

    pub fn last_modified(&self) -> DateTime<Utc> {
        self.proposal.last_modified
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> RawProposal {
        RawProposal {
            id: Some("2345678".to_string()),
            title: Some("Dispõe sobre o reajuste salarial".to_string()),
            summary: Some(String::new()),
            status: Some("Aguardando Parecer".to_string()),
            last_modified: Some("2025-03-10T14:30:00Z".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_priority_total_order() {
        assert!(PriorityLevel::Critical > PriorityLevel::High);
        assert!(PriorityLevel::High > PriorityLevel::Medium);
        assert!(PriorityLevel::Medium > PriorityLevel::Low);
        assert!(PriorityLevel::Low > PriorityLevel::Info);
        let mut sorted = PriorityLevel::ALL.to_vec();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(sorted, PriorityLevel::ALL.to_vec());
    }

    #[test]
    fn test_priority_from_str() {
        assert_eq!("HIGH".parse::<PriorityLevel>().unwrap(), PriorityLevel::High);
        assert_eq!("crítico".parse::<PriorityLevel>().unwrap(), PriorityLevel::Critical);
        assert_eq!("medio".parse::<PriorityLevel>().unwrap(), PriorityLevel::Medium);
        assert!("urgent".parse::<PriorityLevel>().is_err());
    }

    #[test]
    fn test_raw_proposal_into_proposal() {
        let proposal = Proposal::try_from(raw()).unwrap();
        assert_eq!(proposal.id, "2345678");
        assert_eq!(proposal.summary, "");
        assert_eq!(proposal.last_modified.to_rfc3339(), "2025-03-10T14:30:00+00:00");
    }

    #[test]
    fn test_missing_fields_are_reported() {
        let mut r = raw();
        r.status = None;
        assert!(matches!(
            Proposal::try_from(r),
            Err(Error::MissingField { field: "status" })
        ));

        let mut r = raw();
        r.id = Some("   ".to_string());
        assert!(matches!(
            Proposal::try_from(r),
            Err(Error::MissingField { field: "id" })
        ));

        let mut r = raw();
        r.last_modified = Some("yesterday".to_string());
        assert!(matches!(Proposal::try_from(r), Err(Error::InvalidTimestamp(_))));
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let utc = parse_timestamp("2025-01-15T14:30:00Z").unwrap();
        assert_eq!(utc.to_rfc3339(), "2025-01-15T14:30:00+00:00");

        // Naive timestamps are Brasília time (UTC-3)
        let naive = parse_timestamp("2025-01-15T14:30").unwrap();
        assert_eq!(naive.to_rfc3339(), "2025-01-15T17:30:00+00:00");

        let date = parse_timestamp("2025-01-15").unwrap();
        assert_eq!(date.to_rfc3339(), "2025-01-15T03:00:00+00:00");

        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("15/01/2025").is_none());
    }

    #[test]
    fn test_label_and_days_idle() {
        let mut proposal = Proposal::try_from(raw()).unwrap();
        assert_eq!(proposal.label(), "2345678");

        proposal.kind = Some("PL".to_string());
        proposal.number = Some("1234".to_string());
        proposal.year = Some("2025".to_string());
        assert_eq!(proposal.label(), "PL 1234/2025");

        let as_of = parse_timestamp("2025-03-15T14:30:00Z").unwrap();
        assert_eq!(proposal.days_idle(as_of), 5);
        let before = parse_timestamp("2025-03-01T00:00:00Z").unwrap();
        assert_eq!(proposal.days_idle(before), 0);
    }
}
