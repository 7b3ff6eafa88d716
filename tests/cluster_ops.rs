//! Multi-node command behavior against in-memory cluster doubles.

mod common;

use serde_json::json;
use tempfile::TempDir;

use common::{grouped_node, manager_node, MockDirectory, MockRemote};
use rbcli::commands::{service, CommandContext};
use rbcli::config::Settings;
use rbcli::error::CliError;
use rbcli::services::ensure_redundancy;

fn test_settings(tmp: &TempDir) -> Settings {
    let mut settings = Settings::default();
    settings.paths.services_file = tmp.path().join("services.json");
    settings.paths.postgres_data_dir = tmp.path().join("pgsql-data");
    settings
}

#[test]
fn start_all_fans_out_in_membership_order() {
    let tmp = TempDir::new().unwrap();
    let settings = test_settings(&tmp);
    let directory = MockDirectory::new(&["rb03", "rb01", "rb02"])
        .with_node("rb03", grouped_node("rb03"))
        .with_node("rb01", grouped_node("rb01"))
        .with_node("rb02", grouped_node("rb02"));
    let remote = MockRemote::default();
    let ctx = CommandContext {
        settings: &settings,
        directory: &directory,
        remote: &remote,
        local_host: "ctl".to_string(),
    };

    service::start(&ctx, Some("all".to_string()), &["g2".to_string()]).unwrap();

    let calls = remote.recorded();
    let order: Vec<&str> = calls.iter().map(|(node, _)| node.as_str()).collect();
    assert_eq!(order, vec!["rb03", "rb01", "rb02"]);
    assert!(calls.iter().all(|(_, cmd)| cmd.contains("systemctl start g2")));
}

#[test]
fn batch_continues_past_failing_node_and_reports_failure() {
    let tmp = TempDir::new().unwrap();
    let settings = test_settings(&tmp);
    let directory = MockDirectory::new(&["rb01", "rb02", "rb03"])
        .with_node("rb01", grouped_node("rb01"))
        .with_node("rb02", grouped_node("rb02"))
        .with_node("rb03", grouped_node("rb03"));
    let remote = MockRemote::failing_on(&["rb02"]);
    let ctx = CommandContext {
        settings: &settings,
        directory: &directory,
        remote: &remote,
        local_host: "ctl".to_string(),
    };

    let result = service::stop(&ctx, Some("all".to_string()), &["g1".to_string()]);

    // The failing node does not stop the batch, but it is reported.
    assert!(matches!(result, Err(CliError::ExecutionFailed { .. })));
    let calls = remote.recorded();
    let touched: Vec<&str> = calls.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(touched, vec!["rb01", "rb02", "rb03"]);
}

#[test]
fn unknown_unit_is_skipped_without_failing_the_batch() {
    let tmp = TempDir::new().unwrap();
    let settings = test_settings(&tmp);
    let directory =
        MockDirectory::new(&["rb01"]).with_node("rb01", grouped_node("rb01"));
    let remote = MockRemote::default();
    let ctx = CommandContext {
        settings: &settings,
        directory: &directory,
        remote: &remote,
        local_host: "ctl".to_string(),
    };

    service::start(&ctx, Some("rb01".to_string()), &["ghost".to_string()]).unwrap();
    assert!(remote.recorded().is_empty());
}

#[test]
fn manager_disable_toggles_the_whole_unit_group() {
    let tmp = TempDir::new().unwrap();
    let settings = test_settings(&tmp);
    let directory = MockDirectory::new(&["rb01"])
        .with_node("rb01", manager_node("rb01"))
        .with_role("rb01", json!({"name": "rb01"}));
    let remote = MockRemote::default();
    let ctx = CommandContext {
        settings: &settings,
        directory: &directory,
        remote: &remote,
        local_host: "ctl".to_string(),
    };

    service::disable(&ctx, Some("rb01".to_string()), "svc_a").unwrap();

    // svc_a and svc_b share a unit vector, so both flip; svc_c is untouched.
    let role = directory.role_document("rb01").unwrap();
    let services = &role["override_attributes"]["redborder"]["services"];
    assert_eq!(services["svc_a"], json!(false));
    assert_eq!(services["svc_b"], json!(false));
    assert!(services.get("svc_c").is_none());

    let node = directory.node_document("rb01").unwrap();
    let overwrite = &node["override"]["redborder"]["services"]["overwrite"];
    assert_eq!(overwrite["svc_a"], json!(false));
    assert_eq!(overwrite["svc_b"], json!(false));
}

#[test]
fn non_manager_enable_persists_to_the_services_file() {
    let tmp = TempDir::new().unwrap();
    let settings = test_settings(&tmp);
    std::fs::write(
        &settings.paths.services_file,
        r#"{"g1": false, "g2": true, "custom-unit": true}"#,
    )
    .unwrap();
    let directory =
        MockDirectory::new(&["rb01"]).with_node("rb01", grouped_node("rb01"));
    let remote = MockRemote::default();
    let ctx = CommandContext {
        settings: &settings,
        directory: &directory,
        remote: &remote,
        local_host: "ctl".to_string(),
    };

    service::enable(&ctx, Some("rb01".to_string()), "g1").unwrap();

    let written: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(&settings.paths.services_file).unwrap(),
    )
    .unwrap();
    assert_eq!(written["g1"], json!(true));
    // Keys the node does not model survive the rewrite.
    assert_eq!(written["custom-unit"], json!(true));

    // svc_a and svc_b both map to unit g1, so the override lands on both.
    let node = directory.node_document("rb01").unwrap();
    let overrides = &node["override"]["redborder"]["services"];
    assert_eq!(overrides["svc_a"], json!(true));
    assert_eq!(overrides["svc_b"], json!(true));
    assert!(overrides.get("svc_c").is_none());
}

#[test]
fn protected_service_refuses_to_drop_below_two_nodes() {
    let directory = MockDirectory::new(&["rb01", "rb02"])
        .with_node("rb01", manager_node("rb01"))
        .with_node(
            "rb02",
            json!({
                "name": "rb02",
                "run_list": ["role[proxy]"],
                "redborder": {"services": {"s3": false}}
            }),
        );

    let result = ensure_redundancy(&directory, "s3");
    assert!(matches!(result, Err(CliError::PolicyViolation { .. })));

    // An unprotected service never trips the guard.
    ensure_redundancy(&directory, "svc_a").unwrap();
}

#[test]
fn protected_service_allows_disable_with_redundancy() {
    let directory = MockDirectory::new(&["rb01", "rb02"])
        .with_node("rb01", manager_node("rb01"))
        .with_node("rb02", manager_node("rb02"));
    ensure_redundancy(&directory, "s3").unwrap();
}

#[test]
fn role_override_wins_over_node_map_for_redundancy() {
    // Both node maps say enabled, but the role policy has already disabled
    // one of them; only one node counts.
    let directory = MockDirectory::new(&["rb01", "rb02"])
        .with_node("rb01", manager_node("rb01"))
        .with_node("rb02", manager_node("rb02"))
        .with_role(
            "rb02",
            json!({
                "name": "rb02",
                "override_attributes": {"redborder": {"services": {"s3": false}}}
            }),
        );

    let result = ensure_redundancy(&directory, "s3");
    assert!(matches!(result, Err(CliError::PolicyViolation { .. })));
}
