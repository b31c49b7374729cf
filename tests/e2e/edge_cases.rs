use super::*;

#[test]
fn init_refuses_to_overwrite_existing_config() {
    let ctx = TestContext::new();
    ctx.write_file("artman.toml", "# existing config\n");

    let result = ctx.run_artman(&["init"]);

    assert!(!result.success(), "init should refuse to overwrite");
    assert!(
        result.stderr.contains("already exists"),
        "Expected overwrite refusal, got stderr: {}",
        result.stderr
    );
    ctx.assert_file_contains("artman.toml", "# existing config");
}

#[test]
fn scan_survives_a_malformed_definition() {
    let ctx = TestContext::new();
    ctx.init_fixture_project();
    ctx.write_file("artifacts/broken.yaml", "name: [unclosed\n  nope: {{{\n");

    let result = ctx.run_artman(&["scan"]);

    assert_success(&result);
    assert!(
        result.stdout.contains("2 artifacts scanned, 1 failed to parse"),
        "unexpected summary:\n{}",
        result.stdout
    );
    assert!(result.stdout.contains("broken.yaml"));
}

#[test]
fn scan_reports_url_conflicts() {
    let ctx = TestContext::new();
    ctx.init_fixture_project();
    ctx.write_file(
        "artifacts/D.yaml",
        "name: D\ntools:\n  - name: X\n    url: http://other/x.bin\n",
    );

    let result = ctx.run_artman(&["scan"]);

    assert_success(&result);
    assert!(
        result.stdout.contains("url conflict: tool `X` in `D`"),
        "expected conflict report:\n{}",
        result.stdout
    );
}

#[test]
fn pack_include_filter_omits_tools_of_excluded_artifacts() {
    let ctx = TestContext::new();
    ctx.init_fixture_project();
    ctx.seed_cache_for_x();

    let result = ctx.run_artman(&["pack", "--output", "collector", "--include", "B"]);

    assert_success(&result);
    ctx.assert_file_exists("collector/artifacts/B.yaml");
    assert!(!ctx.file_path("collector/artifacts/A.yaml").exists());
    // X is still used by B, so it stays; Y remains missing
    ctx.assert_file_exists("collector/tools/X/x.bin");
    ctx.assert_file_contains("collector/manifest.json", "\"Y\"");
}

#[test]
fn pack_with_cold_cache_reports_all_tools_missing() {
    let ctx = TestContext::new();
    ctx.init_fixture_project();

    let result = ctx.run_artman(&["pack", "--output", "collector"]);

    assert_success(&result);
    ctx.assert_file_exists("collector/manifest.json");
    assert!(result.stdout.contains("missing tool: X"));
    assert!(result.stdout.contains("missing tool: Y"));
    assert!(!ctx.file_path("collector/tools/X").exists());
}

#[test]
fn scan_path_override_needs_no_project() {
    let ctx = TestContext::new();
    ctx.write_file("defs/A.yaml", "name: A\n");

    let result = ctx.run_artman(&["scan", "--path", "defs"]);

    assert_success(&result);
    assert!(
        result.stdout.contains("1 artifacts scanned, 0 failed to parse"),
        "unexpected summary:\n{}",
        result.stdout
    );
}

#[test]
fn scan_fails_when_artifact_dir_is_missing() {
    let ctx = TestContext::new();
    ctx.write_file(
        "artman.toml",
        "[project]\nname = \"empty\"\nartifact_dir = \"nowhere\"\n",
    );

    let result = ctx.run_artman(&["scan"]);

    assert!(!result.success(), "scan should fail for a missing root");
    assert!(
        result.stderr.contains("not found"),
        "Expected not-found error, got stderr: {}",
        result.stderr
    );
}
