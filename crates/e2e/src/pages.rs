//! Page objects for the catalog site
//!
//! Each method returns one [`Action`]: the steps a user-level interaction
//! expands to, including the checks that it took effect.

use crate::playwright::{Action, BrowserStep, LoadState, WaitState};
use crate::selectors::SelectorMap;

/// Sort label that switches the catalog to rating order
pub const HIGHLY_RATED: &str = "Highly Rated";

/// URL fragment present once rating order is applied
const RATING_SORT_FRAGMENT: &str = "highest-rated";

/// Settle time after a sort or facet change
const FILTER_SETTLE_MS: u64 = 1000;

/// Open the site root and check the page title when one is expected
pub fn launch(expected_title: Option<&str>) -> Action {
    let mut steps = vec![
        BrowserStep::Navigate { url: "/".to_string() },
        BrowserStep::WaitForLoadState(LoadState::DomContentLoaded),
    ];
    if let Some(title) = expected_title {
        steps.push(BrowserStep::ExpectTitle {
            title: title.to_string(),
        });
    }
    Action::new("Navigate to launch page", steps)
}

pub struct HeaderPage<'a> {
    selectors: &'a SelectorMap,
}

impl<'a> HeaderPage<'a> {
    pub fn new(selectors: &'a SelectorMap) -> Self {
        Self { selectors }
    }

    /// Follow the catalog link and check we landed on the catalog
    pub fn catalog(&self) -> Action {
        let link = &self.selectors.catalog_link;
        Action::new(
            "Click on Catalog link",
            vec![
                BrowserStep::WaitFor {
                    selector: link.clone(),
                    state: WaitState::Visible,
                },
                BrowserStep::Click {
                    selector: link.clone(),
                    force: false,
                },
                BrowserStep::WaitForLoadState(LoadState::DomContentLoaded),
                BrowserStep::ExpectUrlContains {
                    fragment: "/catalog".to_string(),
                },
            ],
        )
    }
}

pub struct CatalogPage<'a> {
    selectors: &'a SelectorMap,
}

impl<'a> CatalogPage<'a> {
    pub fn new(selectors: &'a SelectorMap) -> Self {
        Self { selectors }
    }

    pub fn search(&self, text: &str) -> Action {
        let s = self.selectors;
        Action::new(
            "Broad Search",
            vec![
                BrowserStep::Click {
                    selector: s.search_button.clone(),
                    force: false,
                },
                BrowserStep::Fill {
                    selector: s.search_box.clone(),
                    value: text.to_string(),
                },
                BrowserStep::Press {
                    key: "Enter".to_string(),
                },
                BrowserStep::ExpectVisible {
                    selector: s.results_heading.clone(),
                },
                BrowserStep::ExpectText {
                    selector: s.results_heading.clone(),
                    contains: text.to_string(),
                },
                BrowserStep::ExpectUrlContains {
                    fragment: text.to_string(),
                },
            ],
        )
    }

    /// Open the sort dropdown and pick `label`.
    ///
    /// Only [`HIGHLY_RATED`] changes the order; any other label leaves the
    /// default ordering in place after the dropdown is opened.
    pub fn sort_by_rating(&self, label: &str) -> Action {
        let s = self.selectors;
        let mut steps = vec![
            BrowserStep::Click {
                selector: s.sort_dropdown.clone(),
                force: true,
            },
            BrowserStep::WaitFor {
                selector: s.highly_rated_option.clone(),
                state: WaitState::Visible,
            },
        ];

        if is_rating_sort(label) {
            steps.extend([
                BrowserStep::Click {
                    selector: s.highly_rated_option.clone(),
                    force: true,
                },
                BrowserStep::Sleep {
                    ms: FILTER_SETTLE_MS,
                },
                BrowserStep::ExpectUrlContains {
                    fragment: RATING_SORT_FRAGMENT.to_string(),
                },
            ]);
        }

        steps.push(BrowserStep::WaitForLoadState(LoadState::Load));
        Action::new(format!("Sort by Rating: {}", label), steps)
    }

    /// Type `input` into the skill facet search and apply it
    pub fn skill_filter(&self, input: &str) -> Action {
        let s = self.selectors;
        Action::new(
            format!("Skill Filter with value: {}", input),
            vec![
                BrowserStep::WaitFor {
                    selector: s.skill_facet.clone(),
                    state: WaitState::Visible,
                },
                BrowserStep::Click {
                    selector: s.skill_facet.clone(),
                    force: false,
                },
                BrowserStep::Click {
                    selector: s.skill_search.clone(),
                    force: false,
                },
                BrowserStep::WaitForLoadState(LoadState::Load),
                BrowserStep::Type {
                    selector: s.skill_search.clone(),
                    text: input.to_string(),
                },
                BrowserStep::Press {
                    key: "Enter".to_string(),
                },
                BrowserStep::WaitFor {
                    selector: s.skill_chip.clone(),
                    state: WaitState::Visible,
                },
                BrowserStep::ExpectText {
                    selector: s.skill_chip.clone(),
                    contains: input.to_string(),
                },
                BrowserStep::ExpectUrlContains {
                    fragment: input.to_string(),
                },
            ],
        )
    }

    /// Tick the checkbox for difficulty `label`
    pub fn level_filter(&self, label: &str) -> Action {
        let s = self.selectors;
        Action::new(
            format!("Level Filter: {}", label),
            vec![
                BrowserStep::Click {
                    selector: s.level_facet.clone(),
                    force: false,
                },
                BrowserStep::Click {
                    selector: s.level_option_for(label),
                    force: false,
                },
                BrowserStep::ScrollIntoView {
                    selector: s.level_chip.clone(),
                },
                BrowserStep::WaitFor {
                    selector: s.level_chip.clone(),
                    state: WaitState::Visible,
                },
                BrowserStep::ExpectText {
                    selector: s.level_chip.clone(),
                    contains: label.to_string(),
                },
                BrowserStep::Sleep {
                    ms: FILTER_SETTLE_MS,
                },
                BrowserStep::ExpectUrlContains {
                    fragment: label.to_string(),
                },
            ],
        )
    }
}

/// Whether a sort label selects rating order
pub fn is_rating_sort(label: &str) -> bool {
    label.trim().eq_ignore_ascii_case(HIGHLY_RATED)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_title_is_optional() {
        assert_eq!(launch(None).steps.len(), 2);
        let action = launch(Some("Catalog | Udacity"));
        assert_eq!(
            action.steps.last(),
            Some(&BrowserStep::ExpectTitle {
                title: "Catalog | Udacity".to_string()
            })
        );
    }

    #[test]
    fn test_search_checks_url_and_heading() {
        let selectors = SelectorMap::default();
        let action = CatalogPage::new(&selectors).search("Cloud");

        assert!(action.steps.contains(&BrowserStep::Fill {
            selector: selectors.search_box.clone(),
            value: "Cloud".to_string(),
        }));
        assert!(action.steps.contains(&BrowserStep::ExpectUrlContains {
            fragment: "Cloud".to_string(),
        }));
    }

    #[test]
    fn test_rating_sort_only_when_highly_rated() {
        let selectors = SelectorMap::default();
        let page = CatalogPage::new(&selectors);
        let expects_rating_url = |action: &Action| {
            action.steps.contains(&BrowserStep::ExpectUrlContains {
                fragment: RATING_SORT_FRAGMENT.to_string(),
            })
        };

        assert!(expects_rating_url(&page.sort_by_rating("Highly Rated")));
        assert!(expects_rating_url(&page.sort_by_rating("highly rated")));
        assert!(!expects_rating_url(&page.sort_by_rating("Most Popular")));
    }

    #[test]
    fn test_level_filter_uses_option_template() {
        let selectors = SelectorMap {
            level_option: "#level-{level}".to_string(),
            ..Default::default()
        };
        let action = CatalogPage::new(&selectors).level_filter("intermediate");
        assert_eq!(
            action.steps[1],
            BrowserStep::Click {
                selector: "#level-intermediate".to_string(),
                force: false,
            }
        );
    }

    #[test]
    fn test_header_catalog_lands_on_catalog() {
        let selectors = SelectorMap::default();
        let action = HeaderPage::new(&selectors).catalog();
        assert_eq!(
            action.steps.last(),
            Some(&BrowserStep::ExpectUrlContains {
                fragment: "/catalog".to_string()
            })
        );
    }
}
