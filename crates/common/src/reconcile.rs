//! UI/API result reconciliation
//!
//! Cross-checks the titles a browser rendered against the hits the search API
//! returned for the same query. Checks run in a fixed order and the first
//! hard failure wins:
//!
//! 1. emptiness: both sources agree there is nothing to show
//! 2. count: UI entries vs. de-duplicated API titles
//! 3. content: every UI entry has a counterpart somewhere in the API titles
//! 4. order: entries agree position by position (fatal only when enforced)

use tracing::{debug, info, warn};

use crate::error::{ReconcileError, Result};
use crate::normalize::{normalize_text, titles_match};
use crate::types::{
    ApiResultSet, Mismatch, MismatchKind, ReconciliationOutcome, SearchQuery, UiResultSet,
};

/// Reconciles rendered results against API results
#[derive(Debug, Clone)]
pub struct Reconciler {
    /// Message the "no results" indicator must display
    no_results_message: String,
}

impl Reconciler {
    pub fn new(no_results_message: impl Into<String>) -> Self {
        Self {
            no_results_message: no_results_message.into(),
        }
    }

    pub fn no_results_message(&self) -> &str {
        &self.no_results_message
    }

    /// Reconcile `ui` against `api` for `query`.
    ///
    /// With `enforce_order` false, positional disagreements are recorded in
    /// the outcome without failing the call.
    pub fn reconcile(
        &self,
        query: &SearchQuery,
        ui: &UiResultSet,
        api: &ApiResultSet,
        enforce_order: bool,
    ) -> Result<ReconciliationOutcome> {
        let normalized_ui: Vec<String> = ui.titles.iter().map(|t| normalize_text(t)).collect();
        let unique_api = api.unique_titles();

        debug!("ui order: {:?}", normalized_ui);
        let hit_count = api.hit_count();
        debug!(
            "api: {} hit(s), {} unique title(s): {:?}",
            hit_count,
            unique_api.len(),
            unique_api
        );

        if hit_count == 0 {
            self.check_no_results(query, ui, &normalized_ui)?;
            info!("'{}': UI and API agree there are no results", query.text);
            return Ok(ReconciliationOutcome::clean());
        }

        if normalized_ui.is_empty() && ui.no_results_visible {
            return Err(ReconcileError::InvariantViolation {
                query: query.text.clone(),
                reason: format!(
                    "UI shows the no-results indicator but the API returned {} hit(s)",
                    hit_count
                ),
                ui: normalized_ui,
                api: unique_api,
            });
        }

        if normalized_ui.is_empty() && unique_api.is_empty() {
            return Err(ReconcileError::InvariantViolation {
                query: query.text.clone(),
                reason: format!(
                    "API returned {} hit(s) but none carry a title, and the UI rendered nothing",
                    hit_count
                ),
                ui: normalized_ui,
                api: unique_api,
            });
        }

        if normalized_ui.len() != unique_api.len() {
            return Err(ReconcileError::CountMismatch {
                query: query.text.clone(),
                ui_count: normalized_ui.len(),
                api_count: unique_api.len(),
                ui: normalized_ui,
                api: unique_api,
            });
        }

        let mut outcome = ReconciliationOutcome::clean();

        for (index, ui_title) in normalized_ui.iter().enumerate() {
            let found = unique_api.iter().any(|api_title| titles_match(ui_title, api_title));
            if !found {
                warn!("UI result not found in API: {:?}", ui_title);
                outcome.mismatches.push(Mismatch {
                    kind: MismatchKind::Content,
                    position: index + 1,
                    ui_value: ui_title.clone(),
                    api_value: None,
                });
            }
        }

        if !outcome.mismatches.is_empty() {
            return Err(ReconcileError::ContentMismatch {
                query: query.text.clone(),
                unmatched: outcome.mismatches.into_iter().map(|m| m.ui_value).collect(),
                ui: normalized_ui,
                api: unique_api,
            });
        }

        for (index, (ui_title, api_title)) in normalized_ui.iter().zip(&unique_api).enumerate() {
            if !titles_match(ui_title, api_title) {
                outcome.mismatches.push(Mismatch {
                    kind: MismatchKind::Order,
                    position: index + 1,
                    ui_value: ui_title.clone(),
                    api_value: Some(api_title.clone()),
                });
            }
        }

        if !outcome.mismatches.is_empty() {
            outcome.order_match = false;
            let positions: Vec<usize> = outcome.mismatches.iter().map(|m| m.position).collect();

            if enforce_order {
                return Err(ReconcileError::OrderMismatch {
                    query: query.text.clone(),
                    positions,
                    ui: normalized_ui,
                    api: unique_api,
                });
            }

            warn!(
                "'{}': order differs at position(s) {:?} (not enforced)",
                query.text, positions
            );
        } else {
            info!(
                "'{}': all {} UI result(s) match API results",
                query.text,
                normalized_ui.len()
            );
        }

        Ok(outcome)
    }

    /// The API returned nothing: the UI must render nothing and say so
    fn check_no_results(
        &self,
        query: &SearchQuery,
        ui: &UiResultSet,
        normalized_ui: &[String],
    ) -> Result<()> {
        let violation = |reason: String| ReconcileError::InvariantViolation {
            query: query.text.clone(),
            reason,
            ui: normalized_ui.to_vec(),
            api: Vec::new(),
        };

        if !normalized_ui.is_empty() {
            return Err(violation(format!(
                "API returned no hits but the UI rendered {} result(s)",
                normalized_ui.len()
            )));
        }

        if !ui.no_results_visible {
            return Err(violation(
                "API returned no hits but the no-results indicator is not visible".to_string(),
            ));
        }

        let shown = normalize_text(ui.no_results_text.as_deref().unwrap_or_default());
        let expected = normalize_text(&self.no_results_message);
        if !shown.contains(&expected) {
            return Err(violation(format!(
                "no-results indicator shows {:?}, expected it to contain {:?}",
                shown, expected
            )));
        }

        Ok(())
    }
}
