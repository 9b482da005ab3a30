//! Core types for catalog search verification

use serde::{Deserialize, Serialize};

use crate::normalize::normalize_title;

/// Sort order requested from the catalog
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    Relevance,
    AvgRating,
}

impl SortBy {
    /// Sort key as understood by the search API
    pub fn api_key(&self) -> &'static str {
        match self {
            SortBy::Relevance => "relevance",
            SortBy::AvgRating => "avgRating",
        }
    }
}

impl std::fmt::Display for SortBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortBy::Relevance => write!(f, "relevance"),
            SortBy::AvgRating => write!(f, "avg_rating"),
        }
    }
}

/// A single catalog search action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub text: String,
    #[serde(default)]
    pub skill: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub sort_by: SortBy,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            skill: None,
            level: None,
            sort_by: SortBy::default(),
        }
    }

    pub fn with_skill(mut self, skill: impl Into<String>) -> Self {
        self.skill = Some(skill.into());
        self
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }

    pub fn sorted_by(mut self, sort_by: SortBy) -> Self {
        self.sort_by = sort_by;
        self
    }

    /// Skill facet, if one is actually set. Blank filters mean a broad search.
    pub fn skill_filter(&self) -> Option<&str> {
        non_blank(self.skill.as_deref())
    }

    /// Level facet, if one is actually set
    pub fn level_filter(&self) -> Option<&str> {
        non_blank(self.level.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// One hit returned by the search API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiHit {
    /// Title with highlight markup around the matched substrings
    pub highlighted_title: String,
}

impl ApiHit {
    pub fn new(highlighted_title: impl Into<String>) -> Self {
        Self {
            highlighted_title: highlighted_title.into(),
        }
    }
}

/// Hits returned by one search API call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResultSet {
    pub hits: Vec<ApiHit>,

    /// Hits in the raw response, including those without a title
    #[serde(default)]
    pub raw_hit_count: usize,
}

impl ApiResultSet {
    pub fn new(hits: Vec<ApiHit>) -> Self {
        let raw_hit_count = hits.len();
        Self { hits, raw_hit_count }
    }

    pub fn from_titles<I, S>(titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(titles.into_iter().map(ApiHit::new).collect())
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Hits the API reported, titled or not
    pub fn hit_count(&self) -> usize {
        self.raw_hit_count.max(self.hits.len())
    }

    /// Normalized, de-duplicated titles in first-seen order
    pub fn unique_titles(&self) -> Vec<String> {
        let mut unique: Vec<String> = Vec::with_capacity(self.hits.len());
        for hit in &self.hits {
            let title = normalize_title(&hit.highlighted_title);
            if !unique.contains(&title) {
                unique.push(title);
            }
        }
        unique
    }
}

/// Results as rendered in the browser, in display order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiResultSet {
    pub titles: Vec<String>,

    /// Whether the "no results" indicator is visible
    #[serde(default)]
    pub no_results_visible: bool,

    /// Text of the "no results" indicator when visible
    #[serde(default)]
    pub no_results_text: Option<String>,
}

impl UiResultSet {
    /// A page rendering the given result titles
    pub fn rendered<I, S>(titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            titles: titles.into_iter().map(Into::into).collect(),
            no_results_visible: false,
            no_results_text: None,
        }
    }

    /// A page showing the "no results" indicator with the given message
    pub fn no_results(message: impl Into<String>) -> Self {
        Self {
            titles: Vec::new(),
            no_results_visible: true,
            no_results_text: Some(message.into()),
        }
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }
}

/// Which check recorded a mismatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchKind {
    /// UI entry with no counterpart anywhere in the API titles
    Content,
    /// UI and API entries at the same position disagree
    Order,
}

/// A single disagreement between the UI and the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mismatch {
    pub kind: MismatchKind,
    /// 1-based display position
    pub position: usize,
    pub ui_value: String,
    pub api_value: Option<String>,
}

impl std::fmt::Display for Mismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.api_value {
            Some(api) => write!(f, "#{}: ui={:?} api={:?}", self.position, self.ui_value, api),
            None => write!(f, "#{}: ui={:?} not found in API", self.position, self.ui_value),
        }
    }
}

/// Result of reconciling one UI result set against one API result set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationOutcome {
    pub counts_match: bool,
    pub content_match: bool,
    pub order_match: bool,
    pub mismatches: Vec<Mismatch>,
}

impl ReconciliationOutcome {
    pub(crate) fn clean() -> Self {
        Self {
            counts_match: true,
            content_match: true,
            order_match: true,
            mismatches: Vec::new(),
        }
    }

    /// Every check agreed, including ordering
    pub fn is_exact(&self) -> bool {
        self.counts_match && self.content_match && self.order_match
    }

    pub fn order_mismatches(&self) -> impl Iterator<Item = &Mismatch> {
        self.mismatches
            .iter()
            .filter(|m| m.kind == MismatchKind::Order)
    }
}
