use super::*;
use artman::config::RootConfig;

#[test]
fn init_creates_valid_project_structure() {
    let ctx = TestContext::new();
    let result = ctx.run_artman(&["init", "--name", "field-lab"]);

    assert_success(&result);
    ctx.assert_file_exists("artman.toml");
    assert!(ctx.file_path("artifacts").is_dir());

    let config = RootConfig::load(&ctx.file_path("artman.toml")).unwrap();
    assert_eq!(config.project.name, "field-lab");
    assert_eq!(config.project.artifact_dir.to_str(), Some("artifacts"));
    assert_eq!(config.fetch.concurrency, 4);
}

#[test]
fn scan_reports_partial_success_summary() {
    let ctx = TestContext::new();
    ctx.init_fixture_project();

    let result = ctx.run_artman(&["scan"]);

    assert_success(&result);
    assert!(
        result.stdout.contains("2 artifacts scanned, 0 failed to parse"),
        "unexpected summary:\n{}",
        result.stdout
    );
    assert!(result.stdout.contains("2 distinct tools referenced"));
}

#[test]
fn map_table_lists_every_artifact_tool_pair() {
    let ctx = TestContext::new();
    ctx.init_fixture_project();
    ctx.write_file("artifacts/C.yaml", "name: C\n");

    let result = ctx.run_artman(&["map"]);

    assert_success(&result);
    let lines: Vec<&str> = result.stdout.lines().collect();
    assert_eq!(
        lines,
        ["ArtifactName,ToolName", "A,X", "B,X", "B,Y", "C,None"]
    );
}

#[test]
fn map_json_reports_totals() {
    let ctx = TestContext::new();
    ctx.init_fixture_project();

    let result = ctx.run_artman(&["map", "--format", "json", "--output", "mapping.json"]);

    assert_success(&result);
    let value: serde_json::Value = serde_json::from_str(&ctx.read_file("mapping.json")).unwrap();
    assert_eq!(value["totalArtifacts"], 2);
    assert_eq!(value["totalTools"], 2);
    assert_eq!(value["rows"].as_array().unwrap().len(), 3);
}

#[test]
fn fetch_dry_run_reports_cache_state_without_network() {
    let ctx = TestContext::new();
    ctx.init_fixture_project();
    ctx.seed_cache_for_x();

    let result = ctx.run_artman(&["fetch", "--dry-run"]);

    assert_success(&result);
    assert!(
        result.stdout.contains("2 tools registered, 1 already cached"),
        "unexpected dry-run output:\n{}",
        result.stdout
    );
    assert!(result.stdout.contains("cannot fetch Y (no url declared)"));
}

#[test]
fn pack_assembles_offline_collector_from_warm_cache() {
    let ctx = TestContext::new();
    ctx.init_fixture_project();
    ctx.seed_cache_for_x();

    let result = ctx.run_artman(&["pack", "--output", "collector"]);

    assert_success(&result);
    ctx.assert_file_exists("collector/manifest.json");
    ctx.assert_file_exists("collector/artifacts/A.yaml");
    ctx.assert_file_exists("collector/artifacts/B.yaml");
    ctx.assert_file_exists("collector/tools/X/x.bin");

    ctx.assert_file_contains("collector/manifest.json", "\"missingTools\"");
    ctx.assert_file_contains("collector/manifest.json", "\"Y\"");
    assert!(result.stdout.contains("missing tool: Y"));
}

#[test]
fn pack_archive_writes_zip_next_to_directory() {
    let ctx = TestContext::new();
    ctx.init_fixture_project();
    ctx.seed_cache_for_x();

    let result = ctx.run_artman(&["pack", "--output", "collector", "--archive"]);

    assert_success(&result);
    ctx.assert_file_exists("collector.zip");
    ctx.assert_file_exists("collector/manifest.json");
}
