//! Built-in suites run against the in-memory login site

mod common;

use std::sync::Arc;

use common::{fixture, runner_config, Behavior, FakeSite, BASE_URL};
use loginflow_e2e::runner::{Phase, ScenarioFilter, ScenarioRunner};
use loginflow_e2e::scenario::ValidationTrigger;
use loginflow_e2e::suites::{self, LOGIN_SUITE, PASSWORD_RESET_SUITE};
use loginflow_e2e::{FailureKind, LoginSite, Suite, SuiteSummary};
use test_case::test_case;

fn runner(site: &FakeSite, workers: usize) -> ScenarioRunner {
    ScenarioRunner::new(runner_config(workers), Arc::new(site.clone()), Arc::new(fixture()))
}

fn builtin() -> Vec<Suite> {
    suites::builtin(&LoginSite::default())
}

fn only(name: &str) -> ScenarioFilter {
    ScenarioFilter {
        name: Some(name.to_string()),
        ..Default::default()
    }
}

fn failures(summary: &SuiteSummary) -> Vec<String> {
    summary
        .results
        .iter()
        .filter_map(|r| r.failure.as_ref().map(|f| format!("{}: {}", r.name, f.message)))
        .collect()
}

#[tokio::test]
async fn test_builtin_suites_pass() {
    let site = FakeSite::new(Behavior::default());
    let summary = runner(&site, 4).run_suites(&builtin(), &ScenarioFilter::default()).await;

    assert_eq!(summary.total, 16);
    assert!(summary.success(), "unexpected failures: {:#?}", failures(&summary));
    assert_eq!(site.opened(), 16);
    assert_eq!(site.open(), 0);
}

#[test_case("login-form-elements" ; "login ui")]
#[test_case("password-visibility-toggle" ; "password toggle")]
#[test_case("login-valid-credentials" ; "valid login")]
#[test_case("login-wrong-password" ; "wrong password")]
#[test_case("login-missing-password" ; "missing password")]
#[test_case("login-empty-fields" ; "empty login")]
#[test_case("login-unknown-account" ; "unknown account")]
#[test_case("login-malformed-email-on-blur" ; "login blur")]
#[test_case("reset-form-elements" ; "reset ui")]
#[test_case("reset-valid-email" ; "reset valid")]
#[test_case("reset-close-icon-valid-email" ; "reset header close")]
#[test_case("reset-empty-email" ; "reset empty")]
#[test_case("reset-unknown-email" ; "reset unknown")]
#[test_case("reset-malformed-email-on-blur" ; "reset blur")]
#[test_case("reset-malformed-email-on-submit" ; "reset submit")]
#[test_case("reset-sent-dialog-elements" ; "sent dialog")]
#[tokio::test]
async fn test_single_scenario_passes(name: &str) {
    let site = FakeSite::new(Behavior::default());
    let summary = runner(&site, 1).run_suites(&builtin(), &only(name)).await;

    assert_eq!(summary.total, 1);
    assert!(summary.success(), "{:#?}", failures(&summary));
    assert_eq!(site.opened(), 1);
}

#[tokio::test]
async fn test_baseline_runs_before_scenario_steps() {
    let site = FakeSite::new(Behavior::default());
    let summary = runner(&site, 1)
        .run_suites(&builtin(), &only("reset-valid-email"))
        .await;
    assert!(summary.success(), "{:#?}", failures(&summary));

    let sessions = site.sessions();
    assert_eq!(sessions.len(), 1);
    let ops = &sessions[0];
    assert_eq!(ops[0], format!("goto {}/login", BASE_URL));
    assert_eq!(ops[1], "click ConsentReject");
    assert_eq!(ops[2], "click ForgotPassword");
    assert_eq!(ops[3], "fill ResetEmail");

    let result = &summary.results[0];
    let first_scenario_step = result
        .steps
        .iter()
        .position(|s| s.phase == Phase::Scenario)
        .unwrap();
    assert!(result.steps[..first_scenario_step]
        .iter()
        .all(|s| s.phase == Phase::Baseline && s.success));
}

#[tokio::test]
async fn test_each_scenario_gets_a_fresh_page() {
    let site = FakeSite::new(Behavior::default());
    let filter = ScenarioFilter {
        suite: Some(LOGIN_SUITE.to_string()),
        ..Default::default()
    };
    let summary = runner(&site, 2).run_suites(&builtin(), &filter).await;
    assert!(summary.success(), "{:#?}", failures(&summary));

    // Every page starts from navigation, so no state leaks between scenarios
    let sessions = site.sessions();
    assert_eq!(sessions.len(), 8);
    for ops in &sessions {
        assert!(ops[0].starts_with("goto "));
        assert_eq!(ops.iter().filter(|op| op.starts_with("goto ")).count(), 1);
    }
}

#[tokio::test]
async fn test_workers_bound_concurrency() {
    let site = FakeSite::new(Behavior::default());
    let summary = runner(&site, 3).run_suites(&builtin(), &ScenarioFilter::default()).await;

    assert!(summary.success(), "{:#?}", failures(&summary));
    assert!(site.max_open() >= 2, "scenarios never overlapped");
    assert!(site.max_open() <= 3, "more pages than workers: {}", site.max_open());
}

#[tokio::test]
async fn test_results_keep_definition_order() {
    let site = FakeSite::new(Behavior::default());
    let suites = builtin();
    let summary = runner(&site, 4).run_suites(&suites, &ScenarioFilter::default()).await;

    let expected: Vec<&str> = suites
        .iter()
        .flat_map(|s| s.scenarios.iter().map(|sc| sc.name.as_str()))
        .collect();
    let actual: Vec<&str> = summary.results.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(actual, expected);
}

#[tokio::test]
async fn test_repeated_runs_give_the_same_outcome() {
    let site = FakeSite::new(Behavior::default());
    let runner = runner(&site, 4);
    let first = runner.run_suites(&builtin(), &ScenarioFilter::default()).await;
    let second = runner.run_suites(&builtin(), &ScenarioFilter::default()).await;

    let outcome = |s: &SuiteSummary| -> Vec<(String, bool)> {
        s.results.iter().map(|r| (r.name.clone(), r.success)).collect()
    };
    assert_eq!(outcome(&first), outcome(&second));
    assert!(second.success());
    assert_eq!(site.opened(), 32);
}

#[tokio::test]
async fn test_fixture_is_not_modified_by_a_run() {
    let site = FakeSite::new(Behavior::default());
    let shared = Arc::new(fixture());
    let runner = ScenarioRunner::new(runner_config(4), Arc::new(site.clone()), shared.clone());

    runner.run_suites(&builtin(), &ScenarioFilter::default()).await;
    assert_eq!(*shared, fixture());
}

#[tokio::test]
async fn test_unreachable_site_is_a_navigation_failure() {
    let site = FakeSite::new(Behavior {
        reachable: false,
        ..Default::default()
    });
    let filter = ScenarioFilter {
        suite: Some(PASSWORD_RESET_SUITE.to_string()),
        ..Default::default()
    };
    let summary = runner(&site, 4).run_suites(&builtin(), &filter).await;

    assert_eq!(summary.failed, 8);
    assert_eq!(summary.count_kind(FailureKind::NavigationFailure), 8);
    for result in &summary.results {
        let failure = result.failure.as_ref().unwrap();
        assert_eq!(failure.phase, Phase::Baseline);
        assert_eq!(failure.target.as_deref(), Some("https://shop.test/login"));
        assert_eq!(result.steps.len(), 1);
    }
    assert_eq!(site.open(), 0);
}

#[tokio::test]
async fn test_element_that_never_becomes_actionable_times_out() {
    let site = FakeSite::new(Behavior {
        login_button_enabled: false,
        ..Default::default()
    });
    let summary = runner(&site, 1)
        .run_suites(&builtin(), &only("login-valid-credentials"))
        .await;

    let result = &summary.results[0];
    assert!(!result.success);
    let failure = result.failure.as_ref().unwrap();
    assert_eq!(failure.kind, FailureKind::Timeout);
    assert_eq!(failure.phase, Phase::Scenario);
    assert!(failure.step.starts_with("submit:"));
    assert!(failure.target.as_deref().unwrap().contains("Anmelden"));
    assert!(result.duration_ms >= 200);
}

#[tokio::test]
async fn test_wrong_page_state_is_a_predicate_mismatch() {
    let site = FakeSite::new(Behavior {
        accepts_valid_user: false,
        ..Default::default()
    });
    let summary = runner(&site, 1)
        .run_suites(&builtin(), &only("login-valid-credentials"))
        .await;

    let failure = summary.results[0].failure.as_ref().unwrap();
    assert_eq!(failure.kind, FailureKind::PredicateMismatch);
    assert_eq!(failure.expected.as_deref(), Some("class containing \"account-page\""));
    assert_eq!(failure.actual.as_deref(), Some("class=\"grid\""));
}

#[tokio::test]
async fn test_one_failure_does_not_stop_other_scenarios() {
    let site = FakeSite::new(Behavior {
        accepts_valid_user: false,
        ..Default::default()
    });
    let summary = runner(&site, 4).run_suites(&builtin(), &ScenarioFilter::default()).await;

    assert_eq!(summary.total, 16);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.results.iter().filter(|r| !r.success).count(), 1);
    assert!(!summary.success());
}

#[tokio::test]
async fn test_close_button_must_close_the_whole_dialog() {
    let site = FakeSite::new(Behavior {
        close_button_closes_dialog: false,
        ..Default::default()
    });
    let summary = runner(&site, 1)
        .run_suites(&builtin(), &only("reset-valid-email"))
        .await;

    // The confirmation is gone but the form behind it is still showing
    let failure = summary.results[0].failure.as_ref().unwrap();
    assert_eq!(failure.kind, FailureKind::PredicateMismatch);
    assert_eq!(failure.expected.as_deref(), Some("hidden"));
    assert!(failure.target.as_deref().unwrap().contains("E-Mail"), "{:?}", failure.target);
}

#[test_case("login-malformed-email-on-blur", ValidationTrigger::Blur, "blur:" ; "blur validation")]
#[test_case("login-wrong-password", ValidationTrigger::Submit, "submit:" ; "submit validation")]
#[tokio::test]
async fn test_step_trace_records_the_validation_trigger(name: &str, trigger: ValidationTrigger, prefix: &str) {
    let site = FakeSite::new(Behavior::default());
    let summary = runner(&site, 1).run_suites(&builtin(), &only(name)).await;
    assert!(summary.success(), "{:#?}", failures(&summary));

    let steps = &summary.results[0].steps;
    let triggered: Vec<_> = steps.iter().filter(|s| s.trigger.is_some()).collect();
    assert_eq!(triggered.len(), 1);
    assert_eq!(triggered[0].trigger, Some(trigger));
    assert!(triggered[0].step.starts_with(prefix), "{}", triggered[0].step);
    assert!(steps.iter().filter(|s| s.phase == Phase::Baseline).all(|s| s.trigger.is_none()));
}
