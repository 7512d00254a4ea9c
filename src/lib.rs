//! Keyword matching and priority scoring of legislative proposals.
//!
//! Proposals fetched from a legislative open-data API are matched against a
//! keyword taxonomy, scored into a discrete priority level and returned as an
//! ordered result set for dashboards, exporters and notifiers to consume.

pub mod config;
pub mod error;
pub mod filter;
pub mod matcher;
pub mod notify;
pub mod result_set;
pub mod scorer;
pub mod selectors;
pub mod source;
pub mod taxonomy;
pub mod text;
pub mod types;

pub use config::{ScanConfig, ScanConfigBuilder};
pub use error::{Error, Result};
pub use filter::{filter, filter_records, FilterResult, RelevanceFilter, SourcedRecord};
pub use matcher::{match_text, match_topics, MatchSet};
pub use notify::{brasilia_hour, dedupe_key, Digest, NotificationPolicy, QuietHours};
pub use result_set::{Diagnostic, ResultSet};
pub use scorer::{score, RuleKind};
pub use source::ProposalSource;
pub use taxonomy::{Taxonomy, TaxonomyBuilder, Topic, TopicSpec};
pub use types::{PriorityLevel, Proposal, RawProposal, ScoredProposal};

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::config::{ScanConfig, ScanConfigBuilder};
    pub use crate::error::{Error, Result};
    pub use crate::filter::{filter, filter_records, RelevanceFilter, SourcedRecord};
    pub use crate::notify::{Digest, NotificationPolicy};
    pub use crate::result_set::ResultSet;
    pub use crate::source::ProposalSource;
    pub use crate::taxonomy::{Taxonomy, TopicSpec};
    pub use crate::types::{PriorityLevel, Proposal, RawProposal, ScoredProposal};
    pub use futures::StreamExt;
}
