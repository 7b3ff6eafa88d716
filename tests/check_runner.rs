//! Check discovery and execution against a scratch check tree.

use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use tempfile::TempDir;

use rbcli::commands::check::{self, CheckFlags, COMMON_CHECKS};
use rbcli::error::CliError;

fn write_script(path: &Path, body: &str) {
    std::fs::write(path, body).unwrap();
    let mut perms = std::fs::metadata(path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(path, perms).unwrap();
}

/// Commons scripts that exit zero and echo their own name.
fn make_commons(root: &Path) {
    let commons = root.join("commons");
    std::fs::create_dir_all(&commons).unwrap();
    for name in COMMON_CHECKS {
        write_script(
            &commons.join(format!("rb_check_{}.rb", name)),
            &format!("#!/bin/sh\necho check {} ok\nexit 0\n", name),
        );
    }
    // Helper file that must never be picked up as a check.
    write_script(
        &commons.join("rb_functions.rb"),
        "#!/bin/sh\nexit 1\n",
    );
}

#[test]
fn discovery_lists_commons_then_service_dirs() {
    let tmp = TempDir::new().unwrap();
    make_commons(tmp.path());
    let kafka = tmp.path().join("kafka");
    std::fs::create_dir_all(&kafka).unwrap();
    write_script(&kafka.join("rb_check_kafka.rb"), "#!/bin/sh\nexit 0\n");
    write_script(&kafka.join("rb_check_functions.rb"), "#!/bin/sh\nexit 1\n");

    let scripts = check::discover(tmp.path()).unwrap();
    let names: Vec<&str> = scripts.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["hd", "install", "io", "killed", "licenses", "memory", "kafka"]
    );
}

#[test]
fn all_checks_run_and_failures_aggregate() {
    let tmp = TempDir::new().unwrap();
    make_commons(tmp.path());
    let broken = tmp.path().join("broken");
    std::fs::create_dir_all(&broken).unwrap();
    write_script(
        &broken.join("rb_check_broken.rb"),
        "#!/bin/sh\necho broken check ran\nexit 1\n",
    );

    let output = tmp.path().join("report.txt");
    let result = check::status(
        tmp.path(),
        None,
        Some(&output),
        CheckFlags::default(),
    );

    match result {
        Err(CliError::ExecutionFailed { message }) => {
            assert!(message.contains("1 check(s) failed"), "got: {}", message);
        }
        other => panic!("expected aggregated failure, got {:?}", other),
    }

    // Every check ran to completion despite the failure, and the report
    // captured all of it.
    let report = std::fs::read_to_string(&output).unwrap();
    assert!(report.starts_with("DATE:"));
    for name in COMMON_CHECKS {
        assert!(report.contains(&format!("check {} ok", name)));
    }
    assert!(report.contains("broken check ran"));
}

#[test]
fn single_check_modes() {
    let tmp = TempDir::new().unwrap();
    make_commons(tmp.path());
    let kafka = tmp.path().join("kafka");
    std::fs::create_dir_all(&kafka).unwrap();
    write_script(&kafka.join("rb_check_kafka.rb"), "#!/bin/sh\nexit 0\n");

    let commons = check::discover_one(tmp.path(), "memory").unwrap();
    assert_eq!(commons.len(), 1);
    assert!(commons[0].path.ends_with("commons/rb_check_memory.rb"));

    let service = check::discover_one(tmp.path(), "kafka").unwrap();
    assert_eq!(service.len(), 1);
    assert!(service[0].path.ends_with("kafka/rb_check_kafka.rb"));

    assert!(matches!(
        check::discover_one(tmp.path(), "ghost"),
        Err(CliError::NotFound { .. })
    ));
}

#[test]
fn flags_are_forwarded_as_one_argument() {
    let tmp = TempDir::new().unwrap();
    make_commons(tmp.path());
    // A probe that fails unless it received the combined flag string.
    let probe = tmp.path().join("probe");
    std::fs::create_dir_all(&probe).unwrap();
    write_script(
        &probe.join("rb_check_probe.rb"),
        "#!/bin/sh\ntest \"$1\" = \"--colorless --quiet\"\n",
    );

    let flags = CheckFlags {
        colorless: true,
        extended: false,
        quiet: true,
    };
    check::status(tmp.path(), Some("probe"), None, flags).unwrap();
}
