//! Reading rendered results back out of the browser

use serde::{Deserialize, Serialize};

use catalog_probe_common::UiResultSet;

/// Read access to the results a page currently renders.
///
/// Callers must only read once the page has settled after the last search,
/// sort or filter action.
pub trait ResultExtractor {
    /// Result titles in on-screen display order
    fn extract_results(&self) -> UiResultSet;

    fn is_empty_state_visible(&self) -> bool;
}

/// State of the catalog page captured after all queued actions completed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSnapshot {
    /// URL at capture time
    #[serde(default)]
    pub url: String,

    /// `allTextContents()` of the result title elements
    #[serde(default)]
    pub titles: Vec<String>,

    #[serde(default)]
    pub no_results_visible: bool,

    #[serde(default)]
    pub no_results_text: Option<String>,
}

impl ResultExtractor for PageSnapshot {
    fn extract_results(&self) -> UiResultSet {
        UiResultSet {
            titles: self.titles.iter().map(|t| t.trim().to_string()).collect(),
            no_results_visible: self.no_results_visible,
            no_results_text: self
                .no_results_text
                .as_ref()
                .map(|t| t.trim().to_string()),
        }
    }

    fn is_empty_state_visible(&self) -> bool {
        self.no_results_visible
    }
}
