//! Selector map for the catalog DOM contract

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::E2eResult;

/// Placeholder substituted by [`SelectorMap::level_option_for`]
const LEVEL_PLACEHOLDER: &str = "{level}";

/// CSS / Playwright selectors for every element the runner touches.
///
/// Missing keys in a selector file fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SelectorMap {
    /// Header
    pub catalog_link: String,

    /// Search
    pub search_button: String,
    pub search_box: String,
    /// Heading that echoes the search text once results load
    pub results_heading: String,

    /// Result titles, one element per rendered result
    pub result_titles: String,
    pub no_results: String,

    /// Sorting
    pub sort_dropdown: String,
    pub highly_rated_option: String,

    /// Skill facet
    pub skill_facet: String,
    pub skill_search: String,
    pub skill_chip: String,

    /// Level facet. `level_option` may contain `{level}`.
    pub level_facet: String,
    pub level_option: String,
    pub level_chip: String,
}

impl Default for SelectorMap {
    fn default() -> Self {
        Self {
            catalog_link: r#"header a[href*="/catalog"]"#.to_string(),
            search_button: r#"[data-testid="catalog-search-button"]"#.to_string(),
            search_box: r#"input[type="search"]"#.to_string(),
            results_heading: r#"[data-testid="search-results-heading"]"#.to_string(),
            result_titles: r#"[data-testid="catalog-card"] h3"#.to_string(),
            no_results: r#"[data-testid="no-results"]"#.to_string(),
            sort_dropdown: r#"[data-testid="sort-by-dropdown"]"#.to_string(),
            highly_rated_option: r#"[role="option"]:has-text("Highly Rated")"#.to_string(),
            skill_facet: r#"[data-testid="skill-filter"]"#.to_string(),
            skill_search: r#"[data-testid="skill-filter"] input"#.to_string(),
            skill_chip: r#"[data-testid="applied-skill-filter"]"#.to_string(),
            level_facet: r#"[data-testid="level-filter"]"#.to_string(),
            level_option: r#"[data-testid="level-filter"] label:has-text("{level}")"#.to_string(),
            level_chip: r#"[data-testid="applied-level-filter"]"#.to_string(),
        }
    }
}

impl SelectorMap {
    /// Load a selector map from a JSON file
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Load from `path` when given, otherwise use the defaults
    pub fn load(path: Option<&Path>) -> E2eResult<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Selector of the checkbox for one difficulty level
    pub fn level_option_for(&self, level: &str) -> String {
        self.level_option.replace(LEVEL_PLACEHOLDER, level)
    }
}
