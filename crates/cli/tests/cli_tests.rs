//! CLI integration tests

use std::process::{Command, Output};

fn vmcost(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_vmcost"))
        .args(args)
        .env("HOME", std::env::temp_dir())
        .output()
        .expect("Failed to execute command")
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = vmcost(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("VM cost service"), "Should show about text");
    for command in ["inventory", "costs", "optimize", "setup", "session", "export"] {
        assert!(stdout.contains(command), "Should show {} command", command);
    }
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = vmcost(&["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("vmcost"), "Should show binary name");
}

#[test]
fn test_setup_help_lists_paths() {
    let output = vmcost(&["setup", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    for path in ["quick", "guided", "advanced", "demo", "reset"] {
        assert!(stdout.contains(path), "Should show {} path", path);
    }
}

#[test]
fn test_guided_help_shows_inputs() {
    let output = vmcost(&["setup", "guided", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("--investment"));
    assert!(stdout.contains("--depreciation-years"));
    assert!(stdout.contains("--vmware-annual"));
}

#[test]
fn test_costs_show_help() {
    let output = vmcost(&["costs", "show", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("--group-by"));
}

/// Test invalid command handling
#[test]
fn test_invalid_command() {
    let output = vmcost(&["invalid-command"]);
    assert!(!output.status.success(), "Invalid command should fail");
}

#[test]
fn test_invalid_group_by_is_rejected() {
    let output = vmcost(&["costs", "show", "--group-by", "owner"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.contains("unknown grouping"));
}

#[test]
fn test_year_requires_month() {
    let output = vmcost(&["export", "focus", "--year", "2024"]);
    assert!(!output.status.success(), "--year without --month should fail");
}

#[test]
fn test_unreachable_server_exits_with_error() {
    let output = vmcost(&["--api-url", "http://127.0.0.1:1", "inventory"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.contains("Failed to send request"));
}
