use super::*;
use predicates::prelude::*;

#[test]
fn init_runs_without_error() {
    let ctx = TestContext::new();
    let result = ctx.run_artman(&["init"]);

    assert_success(&result);
    ctx.assert_file_exists("artman.toml");
}

#[test]
fn help_lists_all_subcommands() {
    let ctx = TestContext::new();
    let result = ctx.run_artman(&["--help"]);

    assert_success(&result);
    for subcommand in ["init", "scan", "fetch", "pack", "map"] {
        assert!(
            predicate::str::contains(subcommand).eval(&result.stdout),
            "help output missing `{subcommand}`:\n{}",
            result.stdout
        );
    }
}

#[test]
fn version_flag_reports_the_binary_name() {
    let ctx = TestContext::new();
    let result = ctx.run_artman(&["--version"]);

    assert_success(&result);
    assert!(predicate::str::contains("artman").eval(&result.stdout));
}

#[test]
fn scan_fails_outside_a_project() {
    let ctx = TestContext::new();
    let result = ctx.run_artman(&["scan"]);

    assert!(!result.success(), "scan should fail without artman.toml");
    assert!(
        predicate::str::contains("artman.toml").eval(&result.stderr),
        "Expected missing artman.toml error, got stderr: {}",
        result.stderr
    );
}
