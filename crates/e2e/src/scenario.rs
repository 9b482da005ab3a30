//! Declarative YAML search scenarios and catalog test data

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use catalog_probe_common::{SearchQuery, SortBy};

use crate::error::{E2eError, E2eResult};
use crate::pages::is_rating_sort;

/// One search scenario parsed from YAML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Unique name for this scenario
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Tags for filtering scenarios
    #[serde(default)]
    pub tags: Vec<String>,

    /// Text typed into the catalog search box
    pub search: String,

    /// Sort dropdown label, e.g. "Highly Rated"
    #[serde(default)]
    pub sort: Option<String>,

    #[serde(default)]
    pub skill: Option<SkillFilter>,

    #[serde(default)]
    pub level: Option<LevelFilter>,

    /// Fail when UI and API disagree on ordering. Deliberately has no
    /// default: every scenario must state it.
    pub enforce_order: bool,
}

/// Skill facet as typed in the UI and as sent to the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillFilter {
    /// Text typed into the facet search
    pub input: String,

    /// API facet value, when it differs from `input`
    #[serde(default)]
    pub value: Option<String>,
}

/// Difficulty facet as labelled in the UI and as sent to the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelFilter {
    pub label: String,

    #[serde(default)]
    pub value: Option<String>,
}

impl Scenario {
    /// Parse a scenario from YAML string
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        serde_yaml::from_str(yaml).map_err(E2eError::from)
    }

    /// Parse a scenario from a YAML file
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content).map_err(|e| {
            E2eError::ScenarioParse(format!("{}: {}", path.display(), e))
        })
    }

    /// Load all scenarios from a directory, in path order
    pub fn load_all(dir: &Path) -> E2eResult<Vec<Self>> {
        let mut paths: Vec<_> = walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
            .map(|e| e.into_path())
            .collect();
        paths.sort();

        paths.iter().map(|p| Self::from_file(p)).collect()
    }

    /// Matches `tag` with or without a leading `@`
    pub fn has_tag(&self, tag: &str) -> bool {
        let wanted = tag.trim_start_matches('@');
        self.tags.iter().any(|t| t.trim_start_matches('@') == wanted)
    }

    /// Filter scenarios by tag
    pub fn filter_by_tag<'a>(scenarios: &'a [Self], tag: &str) -> Vec<&'a Self> {
        scenarios.iter().filter(|s| s.has_tag(tag)).collect()
    }

    /// Replace `{{key}}` placeholders with catalog test data
    pub fn resolve(&self, data: &CatalogData) -> E2eResult<Self> {
        let resolve_opt = |value: &Option<String>| -> E2eResult<Option<String>> {
            value.as_deref().map(|v| data.resolve(v)).transpose()
        };

        Ok(Self {
            name: self.name.clone(),
            description: self.description.clone(),
            tags: self.tags.clone(),
            search: data.resolve(&self.search)?,
            sort: resolve_opt(&self.sort)?,
            skill: match &self.skill {
                Some(skill) => Some(SkillFilter {
                    input: data.resolve(&skill.input)?,
                    value: resolve_opt(&skill.value)?,
                }),
                None => None,
            },
            level: match &self.level {
                Some(level) => Some(LevelFilter {
                    label: data.resolve(&level.label)?,
                    value: resolve_opt(&level.value)?,
                }),
                None => None,
            },
            enforce_order: self.enforce_order,
        })
    }

    /// The API query equivalent to this scenario's UI interactions
    pub fn query(&self) -> SearchQuery {
        let mut query = SearchQuery::new(self.search.clone());

        if self.sort.as_deref().map(is_rating_sort).unwrap_or(false) {
            query = query.sorted_by(SortBy::AvgRating);
        }
        if let Some(skill) = &self.skill {
            query = query.with_skill(skill.value.clone().unwrap_or_else(|| skill.input.clone()));
        }
        if let Some(level) = &self.level {
            query = query.with_level(level.value.clone().unwrap_or_else(|| level.label.clone()));
        }

        query
    }
}

fn default_no_results_text() -> String {
    "No results found".to_string()
}

/// Catalog test data shared by scenarios
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogData {
    /// Expected title of the launch page; unchecked when absent
    #[serde(default)]
    pub launch_page_title: Option<String>,

    /// Message the no-results indicator displays
    #[serde(default = "default_no_results_text")]
    pub no_results_text: String,

    /// Values available to `{{key}}` placeholders
    #[serde(flatten)]
    pub values: BTreeMap<String, serde_json::Value>,
}

impl Default for CatalogData {
    fn default() -> Self {
        Self {
            launch_page_title: None,
            no_results_text: default_no_results_text(),
            values: BTreeMap::new(),
        }
    }
}

impl CatalogData {
    /// Load test data from a JSON file
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

    /// Resolve `raw` if it is a whole-string `{{key}}` placeholder
    pub fn resolve(&self, raw: &str) -> E2eResult<String> {
        let trimmed = raw.trim();
        let key = match trimmed
            .strip_prefix("{{")
            .and_then(|rest| rest.strip_suffix("}}"))
        {
            Some(key) => key.trim(),
            None => return Ok(raw.to_string()),
        };

        // Named fields are consumed by serde and never reach `values`
        match key {
            "noResultsText" => return Ok(self.no_results_text.clone()),
            "launchPageTitle" => {
                if let Some(title) = &self.launch_page_title {
                    return Ok(title.clone());
                }
            }
            _ => {}
        }

        match self.values.get(key) {
            Some(serde_json::Value::String(s)) => Ok(s.clone()),
            Some(other) => Ok(other.to_string()),
            None => Err(E2eError::ScenarioParse(format!(
                "Unknown test data key: {}",
                key
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_SEARCH: &str = r#"
name: catalog-search-valid
description: Search, sort and filter with valid data
tags:
  - "@smoke"
search: "{{validSearchText}}"
sort: "{{ratingFilter}}"
skill:
  input: "{{skillSearchInput}}"
  value: "{{skillValue}}"
level:
  label: Intermediate
  value: intermediate
enforce_order: true
"#;

    fn data() -> CatalogData {
        serde_json::from_str(
            r#"{
                "launchPageTitle": "Udacity",
                "noResultsText": "No results found",
                "validSearchText": "Cloud",
                "ratingFilter": "Highly Rated",
                "skillSearchInput": "AWS",
                "skillValue": "Amazon Web Services"
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_parse_scenario() {
        let scenario = Scenario::from_yaml(VALID_SEARCH).unwrap();
        assert_eq!(scenario.name, "catalog-search-valid");
        assert!(scenario.enforce_order);
        assert!(scenario.has_tag("smoke"));
        assert!(scenario.has_tag("@smoke"));
    }

    #[test]
    fn test_enforce_order_is_required() {
        let yaml = "name: x\nsearch: Cloud\n";
        assert!(Scenario::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_resolve_and_build_query() {
        let scenario = Scenario::from_yaml(VALID_SEARCH)
            .unwrap()
            .resolve(&data())
            .unwrap();
        assert_eq!(scenario.search, "Cloud");
        assert_eq!(scenario.skill.as_ref().unwrap().input, "AWS");

        let query = scenario.query();
        assert_eq!(query.text, "Cloud");
        assert_eq!(query.sort_by, SortBy::AvgRating);
        assert_eq!(query.skill_filter(), Some("Amazon Web Services"));
        assert_eq!(query.level_filter(), Some("intermediate"));
    }

    #[test]
    fn test_unknown_placeholder_fails() {
        let scenario = Scenario::from_yaml(VALID_SEARCH).unwrap();
        let err = scenario.resolve(&CatalogData::default()).unwrap_err();
        assert!(err.to_string().contains("validSearchText"));
    }

    #[test]
    fn test_broad_query_without_facets() {
        let scenario = Scenario::from_yaml(
            "name: invalid\nsearch: zzznonexistentzzz\nenforce_order: false\n",
        )
        .unwrap();
        let query = scenario.query();
        assert_eq!(query.sort_by, SortBy::Relevance);
        assert_eq!(query.skill_filter(), None);
        assert_eq!(query.level_filter(), None);
    }

    #[test]
    fn test_load_all_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("b.yaml"),
            "name: second\nsearch: b\nenforce_order: false\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("a.yml"),
            "name: first\nsearch: a\nenforce_order: true\ntags: [smoke]\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let scenarios = Scenario::load_all(dir.path()).unwrap();
        let names: Vec<_> = scenarios.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second"]);
        assert_eq!(Scenario::filter_by_tag(&scenarios, "smoke").len(), 1);
    }

    #[test]
    fn test_named_fields_resolve_as_placeholders() {
        let data = data();
        assert_eq!(data.resolve("{{noResultsText}}").unwrap(), "No results found");
        assert_eq!(data.resolve("{{ launchPageTitle }}").unwrap(), "Udacity");
        assert!(CatalogData::default().resolve("{{launchPageTitle}}").is_err());
    }

    #[test]
    fn test_catalog_data_defaults() {
        let data: CatalogData = serde_json::from_str("{}").unwrap();
        assert_eq!(data.no_results_text, "No results found");
        assert_eq!(data.launch_page_title, None);
        assert_eq!(data.resolve("plain").unwrap(), "plain");
    }
}
