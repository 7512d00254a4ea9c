//! Keyword taxonomy: the monitored topics and the scoring policy that goes
//! with them.
//!
//! A taxonomy is loaded once (TOML or YAML) or assembled with
//! [`TaxonomyBuilder`], validated, and then only ever read. Keywords are
//! normalized and token patterns compiled at construction so that matching
//! itself cannot fail.
//!
//! ```toml
//! exclusions = ["homenagem"]
//! active_statuses = ["pronta para pauta", "aguardando parecer"]
//! urgent_regimes = ["urgencia"]
//!
//! [kind_weights]
//! PEC = 5
//!
//! [topics.sindical]
//! name = "Sindical"
//! keywords = ["sindicato", "negociação coletiva"]
//! critical_keywords = ["greve"]
//! whole_words = ["clt"]
//! weight = 12
//! ```

use crate::error::{Error, Result};
use crate::text::normalize_text;
use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

fn default_weight() -> u32 {
    10
}

/// How a keyword is searched for in normalized text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Plain substring: "previdencia" also hits "previdenciario"
    Substring,
    /// Token match: the pattern must start and end on word boundaries
    WholeWord,
}

/// A normalized keyword pattern
#[derive(Debug, Clone)]
pub struct Keyword {
    pattern: String,
    mode: MatchMode,
    critical: bool,
    token_regex: Option<Regex>,
}

impl Keyword {
    /// Build a keyword from its configured spelling. Returns `Ok(None)` when
    /// the keyword normalizes to nothing.
    fn compile(raw: &str, mode: MatchMode, critical: bool) -> Result<Option<Self>> {
        let pattern = normalize_text(raw);
        if pattern.is_empty() {
            return Ok(None);
        }
        let token_regex = match mode {
            MatchMode::Substring => None,
            MatchMode::WholeWord => Some(Regex::new(&format!(
                r"(?:^|\W){}(?:$|\W)",
                regex::escape(&pattern)
            ))?),
        };
        Ok(Some(Self {
            pattern,
            mode,
            critical,
            token_regex,
        }))
    }

    /// The normalized pattern
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    /// Whether a hit on this keyword alone makes the proposal critical
    pub fn is_critical(&self) -> bool {
        self.critical
    }

    /// Test the keyword against already-normalized text
    pub fn occurs_in(&self, normalized_text: &str) -> bool {
        match &self.token_regex {
            Some(re) => re.is_match(normalized_text),
            None => normalized_text.contains(&self.pattern),
        }
    }
}

/// One monitored subject area
#[derive(Debug, Clone)]
pub struct Topic {
    name: String,
    keywords: Vec<Keyword>,
    weight: u32,
    always_critical: bool,
}

impl Topic {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn keywords(&self) -> &[Keyword] {
        &self.keywords
    }

    /// Contribution of the topic to the relevance score
    pub fn weight(&self) -> u32 {
        self.weight
    }

    /// Any match on this topic is critical regardless of procedural stage
    pub fn is_always_critical(&self) -> bool {
        self.always_critical
    }
}

/// Topic definition as written in a taxonomy file, also usable as a builder
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TopicSpec {
    /// Display name; the table key is used when absent
    #[serde(default, alias = "nome")]
    pub name: Option<String>,
    #[serde(default, alias = "palavras")]
    pub keywords: Vec<String>,
    /// Keywords matched as whole tokens only (short acronyms such as "ia")
    #[serde(default)]
    pub whole_words: Vec<String>,
    /// Keywords that make a proposal critical on their own
    #[serde(default)]
    pub critical_keywords: Vec<String>,
    #[serde(default = "default_weight", alias = "peso")]
    pub weight: u32,
    #[serde(default)]
    pub always_critical: bool,
}

impl TopicSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            weight: default_weight(),
            ..Default::default()
        }
    }

    pub fn keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords.extend(keywords.into_iter().map(Into::into));
        self
    }

    pub fn whole_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.whole_words.extend(words.into_iter().map(Into::into));
        self
    }

    pub fn critical_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.critical_keywords
            .extend(keywords.into_iter().map(Into::into));
        self
    }

    pub fn weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    pub fn always_critical(mut self, always_critical: bool) -> Self {
        self.always_critical = always_critical;
        self
    }

    fn compile(self, fallback_name: Option<&str>) -> Result<Topic> {
        let name = self
            .name
            .as_deref()
            .or(fallback_name)
            .map(str::trim)
            .unwrap_or("")
            .to_string();
        if name.is_empty() {
            return Err(Error::Config("Topic with an empty name".to_string()));
        }

        let mut keywords: Vec<Keyword> = Vec::new();
        let groups = [
            (&self.critical_keywords, MatchMode::Substring, true),
            (&self.keywords, MatchMode::Substring, false),
            (&self.whole_words, MatchMode::WholeWord, false),
        ];
        for (raws, mode, critical) in groups {
            for raw in raws {
                if let Some(kw) = Keyword::compile(raw, mode, critical)? {
                    let duplicate = keywords
                        .iter()
                        .any(|k| k.pattern == kw.pattern && k.mode == kw.mode);
                    if !duplicate {
                        keywords.push(kw);
                    }
                }
            }
        }

        if keywords.is_empty() {
            return Err(Error::Config(format!(
                "Topic '{}' has no usable keywords",
                name
            )));
        }

        Ok(Topic {
            name,
            keywords,
            weight: self.weight,
            always_critical: self.always_critical,
        })
    }
}

/// Deployment-specific signals consulted by the priority scorer
#[derive(Debug, Clone, Default)]
pub struct ScoringPolicy {
    active_statuses: Vec<String>,
    urgent_regimes: Vec<String>,
    kind_weights: HashMap<String, u32>,
}

impl ScoringPolicy {
    /// Normalized status fragments that signal active legislative movement
    pub fn active_statuses(&self) -> &[String] {
        &self.active_statuses
    }

    /// Normalized regime fragments that signal urgency
    pub fn urgent_regimes(&self) -> &[String] {
        &self.urgent_regimes
    }

    /// Weight of a proposal kind; unknown kinds weigh 1
    pub fn kind_weight(&self, kind: Option<&str>) -> u32 {
        kind.and_then(|k| self.kind_weights.get(&k.trim().to_uppercase()))
            .copied()
            .unwrap_or(1)
    }
}

/// The immutable, validated keyword taxonomy
#[derive(Debug, Clone, Default)]
pub struct Taxonomy {
    topics: Vec<Topic>,
    exclusions: Vec<Keyword>,
    policy: ScoringPolicy,
}

impl Taxonomy {
    /// A taxonomy with no topics; every match set against it is empty
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builder() -> TaxonomyBuilder {
        TaxonomyBuilder::new()
    }

    /// Load a taxonomy file; the format is chosen by extension
    /// (`.toml`, `.yml`, `.yaml`)
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());
        let taxonomy = match ext.as_deref() {
            Some("toml") => Self::from_toml_str(&contents)?,
            Some("yml") | Some("yaml") => Self::from_yaml_str(&contents)?,
            _ => {
                return Err(Error::Config(format!(
                    "Unsupported taxonomy format: {} (expected .toml, .yml or .yaml)",
                    path.display()
                )))
            }
        };
        log::debug!(
            "Loaded taxonomy from {} ({} topics)",
            path.display(),
            taxonomy.topics.len()
        );
        Ok(taxonomy)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let file: TaxonomyFile = toml::from_str(contents)?;
        file.into_taxonomy()
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let file: TaxonomyFile = serde_yaml::from_str(contents)?;
        file.into_taxonomy()
    }

    /// Topics ordered by name
    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    pub fn topic(&self, name: &str) -> Option<&Topic> {
        self.topics.iter().find(|t| t.name == name)
    }

    /// Patterns that disqualify a proposal outright
    pub fn exclusions(&self) -> &[Keyword] {
        &self.exclusions
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}

/// On-disk taxonomy layout
#[derive(Debug, Deserialize)]
struct TaxonomyFile {
    #[serde(default, alias = "temas")]
    topics: BTreeMap<String, TopicSpec>,
    #[serde(default, alias = "exclusoes")]
    exclusions: Vec<String>,
    #[serde(default)]
    active_statuses: Vec<String>,
    #[serde(default)]
    urgent_regimes: Vec<String>,
    #[serde(default)]
    kind_weights: BTreeMap<String, u32>,
}

impl TaxonomyFile {
    fn into_taxonomy(self) -> Result<Taxonomy> {
        let mut builder = TaxonomyBuilder::new()
            .exclusions(self.exclusions)
            .active_statuses(self.active_statuses)
            .urgent_regimes(self.urgent_regimes);
        for (kind, weight) in self.kind_weights {
            builder = builder.kind_weight(kind, weight);
        }
        for (key, spec) in self.topics {
            builder = builder.keyed_topic(key, spec);
        }
        builder.build()
    }
}

/// Builder for creating taxonomies
#[derive(Debug, Clone, Default)]
pub struct TaxonomyBuilder {
    topics: Vec<(Option<String>, TopicSpec)>,
    exclusions: Vec<String>,
    active_statuses: Vec<String>,
    urgent_regimes: Vec<String>,
    kind_weights: HashMap<String, u32>,
}

impl TaxonomyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a topic
    pub fn topic(mut self, spec: TopicSpec) -> Self {
        self.topics.push((None, spec));
        self
    }

    fn keyed_topic(mut self, key: String, spec: TopicSpec) -> Self {
        self.topics.push((Some(key), spec));
        self
    }

    pub fn exclusions<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclusions.extend(patterns.into_iter().map(Into::into));
        self
    }

    pub fn active_statuses<I, S>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.active_statuses
            .extend(statuses.into_iter().map(Into::into));
        self
    }

    pub fn urgent_regimes<I, S>(mut self, regimes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.urgent_regimes
            .extend(regimes.into_iter().map(Into::into));
        self
    }

    /// Set the relevance weight of a proposal kind (`PEC`, `PL`, ...)
    pub fn kind_weight(mut self, kind: impl Into<String>, weight: u32) -> Self {
        self.kind_weights
            .insert(kind.into().trim().to_uppercase(), weight);
        self
    }

    /// Validate and build the final taxonomy
    pub fn build(self) -> Result<Taxonomy> {
        let mut topics = Vec::with_capacity(self.topics.len());
        let mut seen = HashSet::new();
        for (key, spec) in self.topics {
            let topic = spec.compile(key.as_deref())?;
            if !seen.insert(topic.name.clone()) {
                return Err(Error::Config(format!(
                    "Duplicate topic name '{}'",
                    topic.name
                )));
            }
            topics.push(topic);
        }
        topics.sort_by(|a, b| a.name.cmp(&b.name));

        let mut exclusions = Vec::new();
        for raw in &self.exclusions {
            if let Some(kw) = Keyword::compile(raw, MatchMode::Substring, false)? {
                exclusions.push(kw);
            }
        }

        let normalize_all = |values: Vec<String>| -> Vec<String> {
            values
                .iter()
                .map(|v| normalize_text(v))
                .filter(|v| !v.is_empty())
                .collect()
        };

        Ok(Taxonomy {
            topics,
            exclusions,
            policy: ScoringPolicy {
                active_statuses: normalize_all(self.active_statuses),
                urgent_regimes: normalize_all(self.urgent_regimes),
                kind_weights: self.kind_weights,
            },
        })
    }
}
