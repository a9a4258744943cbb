//! Scenario files replayed through the registry and the CLI route.

use overlayq::cli::{run_scenario, Commands, RunContext, Scenario};
use overlayq::config::OverlayConfig;
use overlayq::Registry;
use tempfile::TempDir;

const SCENARIO: &str = r#"
settle_ms = 50

[containers.modal]
policy = { kind = "one_by_one_wait_finish" }
delay_ms = 20

[[step]]
op = "show"
container = "modal"
label = "first"

[[step]]
op = "show"
container = "modal"
label = "second"

[[step]]
at_ms = 10
op = "query"
container = "modal"

[[step]]
at_ms = 10
op = "dismiss"
label = "first"
"#;

fn labels(report: &overlayq::cli::ScenarioReport, views: &[overlayq::ItemView]) -> Vec<String> {
    views.iter().map(|view| report.label_for(view.id)).collect()
}

#[tokio::test(start_paused = true)]
async fn test_scenario_replay_promotes_after_dismissal() {
    let scenario = Scenario::parse(SCENARIO).unwrap();
    let registry = Registry::default();

    let report = run_scenario(&registry, &scenario).await.unwrap();

    assert_eq!(report.queries.len(), 1);
    let (at_ms, name, snapshot) = &report.queries[0];
    assert_eq!(*at_ms, 10);
    assert_eq!(name, "modal");
    assert_eq!(labels(&report, &snapshot.main), vec!["first"]);
    assert_eq!(labels(&report, &snapshot.temporary), vec!["second"]);

    let (name, last) = &report.containers[0];
    assert_eq!(name, "modal");
    assert_eq!(labels(&report, &last.main), vec!["second"]);
    assert!(last.temporary.is_empty());
    registry.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_release_step_dismisses_item() {
    let scenario = Scenario::parse(
        r#"
[containers.toasts]
policy = { kind = "multiple", capacity = 3 }

[[step]]
op = "show"
container = "toasts"
label = "a"

[[step]]
op = "show"
container = "toasts"
label = "b"

[[step]]
at_ms = 5
op = "release"
label = "a"

[[step]]
at_ms = 10
op = "query"
container = "toasts"
"#,
    )
    .unwrap();
    let registry = Registry::default();

    let report = run_scenario(&registry, &scenario).await.unwrap();
    let (_, _, snapshot) = &report.queries[0];
    assert_eq!(labels(&report, &snapshot.main), vec!["b"]);
    registry.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_unknown_label_fails_the_run() {
    let scenario = Scenario::parse(
        r#"
[containers.toasts]
policy = { kind = "multiple", capacity = 3 }

[[step]]
op = "dismiss"
container = "toasts"
label = "ghost"
"#,
    )
    .unwrap();
    let registry = Registry::default();

    let err = run_scenario(&registry, &scenario).await.unwrap_err();
    assert!(err.to_string().contains("ghost"));
    registry.shutdown().await;
}

#[test]
fn test_run_command_renders_report() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("scenario.toml");
    std::fs::write(&path, SCENARIO).unwrap();

    let context = RunContext::from_config(OverlayConfig::default());
    let output = context
        .execute(&Commands::Run {
            scenario: path,
            format: "json".to_string(),
        })
        .unwrap();

    let report: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert!(report.is_object());
}

#[test]
fn test_validate_command_lists_containers() {
    let mut config = OverlayConfig::default();
    config.containers.insert(
        "toasts".to_string(),
        overlayq::ContainerConfig::new(overlayq::Policy::Multiple { capacity: 4 }),
    );
    let context = RunContext::from_config(config);

    let output = context
        .execute(&Commands::Validate {
            format: "text".to_string(),
        })
        .unwrap();
    assert!(output.contains("toasts"));
}
