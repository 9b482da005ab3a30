use catalog_probe_common::{
    ApiResultSet, MismatchKind, ReconcileError, Reconciler, SearchQuery, SortBy, UiResultSet,
};

const NO_RESULTS: &str = "No results found";

fn reconciler() -> Reconciler {
    Reconciler::new(NO_RESULTS)
}

fn cloud_query() -> SearchQuery {
    SearchQuery::new("Cloud").sorted_by(SortBy::AvgRating)
}

fn cloud_api() -> ApiResultSet {
    ApiResultSet::from_titles([
        "Intro to <em>Cloud</em> Computing",
        "<em>Cloud</em> Computing Fundamentals",
    ])
}

/// Same titles in the same order, strict ordering.
#[test]
fn matching_results_in_order_pass() {
    let ui = UiResultSet::rendered(["Intro to Cloud Computing", "Cloud Computing Fundamentals"]);

    let outcome = reconciler()
        .reconcile(&cloud_query(), &ui, &cloud_api(), true)
        .expect("results should reconcile");

    assert!(outcome.counts_match);
    assert!(outcome.content_match);
    assert!(outcome.order_match);
    assert!(outcome.mismatches.is_empty());
}

/// Swapped UI order fails when ordering is enforced.
#[test]
fn swapped_results_fail_strict_order() {
    let ui = UiResultSet::rendered(["Cloud Computing Fundamentals", "Intro to Cloud Computing"]);

    let err = reconciler()
        .reconcile(&cloud_query(), &ui, &cloud_api(), true)
        .expect_err("strict order must fail");

    match &err {
        ReconcileError::OrderMismatch { positions, ui, api, .. } => {
            assert!(positions.contains(&1), "position 1 must be cited: {positions:?}");
            assert_eq!(ui, &["cloud computing fundamentals", "intro to cloud computing"]);
            assert_eq!(api, &["intro to cloud computing", "cloud computing fundamentals"]);
        }
        other => panic!("expected OrderMismatch, got {other:?}"),
    }

    // Both full lists must appear in the failure message
    let message = err.to_string();
    assert!(message.contains("intro to cloud computing"));
    assert!(message.contains("cloud computing fundamentals"));
}

/// Swapped UI order is recorded but tolerated when ordering is not enforced.
#[test]
fn swapped_results_pass_lenient_order() {
    let ui = UiResultSet::rendered(["Cloud Computing Fundamentals", "Intro to Cloud Computing"]);

    let outcome = reconciler()
        .reconcile(&cloud_query(), &ui, &cloud_api(), false)
        .expect("lenient order must not fail");

    assert!(outcome.counts_match);
    assert!(outcome.content_match);
    assert!(!outcome.order_match);
    let positions: Vec<usize> = outcome.order_mismatches().map(|m| m.position).collect();
    assert_eq!(positions, vec![1, 2]);
    assert!(outcome.mismatches.iter().all(|m| m.kind == MismatchKind::Order));
}

/// No hits and a visible no-results indicator is the expected empty path.
#[test]
fn no_hits_with_no_results_indicator_pass() {
    let query = SearchQuery::new("zzznonexistentzzz");
    let ui = UiResultSet::no_results("No results found for \"zzznonexistentzzz\"");

    let outcome = reconciler()
        .reconcile(&query, &ui, &ApiResultSet::default(), false)
        .expect("empty path should pass");

    assert!(outcome.is_exact());
}

/// No hits while the UI still renders results breaks the emptiness invariant.
#[test]
fn no_hits_with_rendered_results_fail() {
    let query = SearchQuery::new("zzznonexistentzzz");
    let ui = UiResultSet::rendered(["Intro to Cloud Computing"]);

    let err = reconciler()
        .reconcile(&query, &ui, &ApiResultSet::default(), false)
        .expect_err("emptiness disagreement must fail");

    assert!(matches!(err, ReconcileError::InvariantViolation { .. }));
}

/// Count mismatch is reported before content or order are looked at.
#[test]
fn fewer_ui_results_fail_count_check() {
    let api = ApiResultSet::from_titles([
        "Intro to <em>Cloud</em> Computing",
        "<em>Cloud</em> Computing Fundamentals",
        "<em>Cloud</em> DevOps",
    ]);
    // The second entry would also fail the content check
    let ui = UiResultSet::rendered(["Intro to Cloud Computing", "Data Analyst"]);

    let err = reconciler()
        .reconcile(&cloud_query(), &ui, &api, true)
        .expect_err("count mismatch must fail");

    match err {
        ReconcileError::CountMismatch { ui_count, api_count, .. } => {
            assert_eq!(ui_count, 2);
            assert_eq!(api_count, 3);
        }
        other => panic!("expected CountMismatch, got {other:?}"),
    }
}

#[test]
fn reconcile_is_idempotent() {
    let ui = UiResultSet::rendered(["Cloud Computing Fundamentals", "Intro to Cloud Computing"]);
    let api = cloud_api();
    let r = reconciler();

    let first = r.reconcile(&cloud_query(), &ui, &api, false);
    let second = r.reconcile(&cloud_query(), &ui, &api, false);
    assert_eq!(first, second);

    let first = r.reconcile(&cloud_query(), &ui, &api, true);
    let second = r.reconcile(&cloud_query(), &ui, &api, true);
    assert_eq!(first, second);
}

/// apiCount == 0 succeeds iff the UI is empty and shows the indicator.
#[test]
fn empty_api_succeeds_only_on_empty_ui_with_indicator() {
    let query = SearchQuery::new("zzz");
    let api = ApiResultSet::default();
    let cases = [
        (UiResultSet::no_results(NO_RESULTS), true),
        (UiResultSet::default(), false),
        (UiResultSet::rendered(["Cloud"]), false),
        (
            UiResultSet {
                titles: vec!["Cloud".to_string()],
                no_results_visible: true,
                no_results_text: Some(NO_RESULTS.to_string()),
            },
            false,
        ),
    ];

    for (ui, should_pass) in cases {
        let result = reconciler().reconcile(&query, &ui, &api, true);
        assert_eq!(result.is_ok(), should_pass, "ui: {ui:?}");
    }
}
