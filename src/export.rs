//! Artifact-to-tool mapping reports.
//!
//! Pure views over a [`ScanResult`]: no I/O, no mutation, safe to run
//! while downloads are in flight. Both output formats are rendered from
//! the same sorted row sequence so they can never disagree.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::scanner::ScanResult;

/// Placeholder tool name for artifacts that declare no tools, so every
/// artifact shows up in the report at least once.
pub const NO_TOOL: &str = "None";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct MappingRow {
    pub artifact: String,
    pub tool: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MappingDocument {
    total_artifacts: usize,
    total_tools: usize,
    rows: Vec<MappingRow>,
}

/// One row per (artifact, tool) pair, sorted by artifact then tool name,
/// plus a synthetic [`NO_TOOL`] row per tool-less artifact.
pub fn mapping_rows(scan: &ScanResult) -> Vec<MappingRow> {
    let mut rows = Vec::new();

    for artifact in &scan.artifacts {
        if artifact.tools.is_empty() {
            rows.push(MappingRow {
                artifact: artifact.name.clone(),
                tool: NO_TOOL.to_string(),
            });
            continue;
        }

        for tool in &artifact.tools {
            rows.push(MappingRow {
                artifact: artifact.name.clone(),
                tool: tool.name.clone(),
            });
        }
    }

    rows.sort();
    rows
}

/// Delimited table with an `ArtifactName,ToolName` header row.
pub fn render_table(scan: &ScanResult) -> String {
    let mut out = String::from("ArtifactName,ToolName\n");

    for row in mapping_rows(scan) {
        out.push_str(&row.artifact);
        out.push(',');
        out.push_str(&row.tool);
        out.push('\n');
    }

    out
}

/// JSON report: `{"totalArtifacts":n,"totalTools":n,"rows":[...]}`.
pub fn render_json(scan: &ScanResult) -> Result<String> {
    let rows = mapping_rows(scan);

    let distinct_tools: BTreeSet<String> = scan
        .artifacts
        .iter()
        .flat_map(|a| a.tools.iter())
        .map(|t| t.name.to_lowercase())
        .collect();

    let document = MappingDocument {
        total_artifacts: scan.artifacts.len(),
        total_tools: distinct_tools.len(),
        rows,
    };

    serde_json::to_string_pretty(&document)
        .map_err(|err| Error::Io(std::io::Error::other(err.to_string())))
}
