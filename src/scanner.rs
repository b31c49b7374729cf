//! Artifact definition scanning.
//!
//! Walks a directory of YAML artifact definitions, extracts the
//! third-party tool references each one declares, and reports per-file
//! parse failures without aborting the scan.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde_yaml_ng::Value;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Keys that identify the tool's name inside a reference mapping.
const NAME_KEYS: &[&str] = &["name", "tool", "tool_name"];

/// Keys that identify where the tool binary can be fetched from.
const URL_KEYS: &[&str] = &["url", "github_release", "download_url"];

const VERSION_KEYS: &[&str] = &["version", "tool_version"];
const HASH_KEYS: &[&str] = &["expected_hash", "sha256", "hash"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArtifactKind {
    Client,
    Server,
    #[default]
    Other,
}

impl ArtifactKind {
    fn from_label(label: &str) -> Self {
        let folded = label.to_ascii_lowercase();
        if folded.contains("client") {
            ArtifactKind::Client
        } else if folded.contains("server") {
            ArtifactKind::Server
        } else {
            ArtifactKind::Other
        }
    }
}

/// A tool dependency as declared inside an artifact definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolReference {
    pub name: String,
    pub url: Option<String>,
    pub version: Option<String>,
    pub expected_hash: Option<String>,
}

/// One parsed artifact definition file.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub name: String,
    pub source_path: PathBuf,
    pub kind: ArtifactKind,
    pub author: Option<String>,
    pub description: Option<String>,
    pub tools: Vec<ToolReference>,
}

/// A per-file failure recorded during a scan. Never fatal to the scan.
#[derive(Debug)]
pub struct ScanIssue {
    pub path: PathBuf,
    pub error: Error,
}

/// Everything a scan produced: parsed artifacts plus recorded issues.
#[derive(Debug)]
pub struct ScanResult {
    pub root: PathBuf,
    pub artifacts: Vec<Artifact>,
    pub issues: Vec<ScanIssue>,
    pub scanned_at: DateTime<Utc>,
}

impl ScanResult {
    pub fn artifact(&self, name: &str) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.name == name)
    }
}

fn build_include_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();

    let defaults = [String::from("*")];
    let effective = if patterns.is_empty() {
        &defaults[..]
    } else {
        patterns
    };

    for pattern in effective {
        let glob = Glob::new(pattern).map_err(|err| Error::Pattern {
            pattern: pattern.clone(),
            reason: err.to_string(),
        })?;
        builder.add(glob);
    }

    builder.build().map_err(|err| Error::Pattern {
        pattern: effective.join(","),
        reason: err.to_string(),
    })
}

fn is_definition_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

/// Scan `root` for artifact definition files matching `include_patterns`
/// (file-name globs, empty means all).
///
/// A file that fails to parse is recorded as a [`ScanIssue`] and the scan
/// continues; a missing root directory is the only fatal condition.
pub fn scan(root: &Path, include_patterns: &[String]) -> Result<ScanResult> {
    if !root.exists() {
        return Err(Error::NotFound {
            path: root.to_path_buf(),
        });
    }

    let includes = build_include_set(include_patterns)?;

    let mut artifacts = Vec::new();
    let mut issues = Vec::new();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file());

    for entry in walker {
        let path = entry.path();

        if !is_definition_file(path) {
            continue;
        }

        let file_name = entry.file_name().to_string_lossy();
        if !includes.is_match(file_name.as_ref()) {
            continue;
        }

        match parse_artifact(path) {
            Ok(artifact) => {
                debug!(
                    artifact = %artifact.name,
                    tools = artifact.tools.len(),
                    "parsed artifact definition"
                );
                artifacts.push(artifact);
            }
            Err(error) => {
                warn!(path = %path.display(), %error, "skipping unparseable definition");
                issues.push(ScanIssue {
                    path: path.to_path_buf(),
                    error,
                });
            }
        }
    }

    Ok(ScanResult {
        root: root.to_path_buf(),
        artifacts,
        issues,
        scanned_at: Utc::now(),
    })
}

fn parse_artifact(path: &Path) -> Result<Artifact> {
    let content = std::fs::read_to_string(path)?;

    let doc: Value = serde_yaml_ng::from_str(&content).map_err(|err| Error::Parse {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;

    let name = lookup_str(&doc, NAME_KEYS)
        .map(str::to_string)
        .unwrap_or_else(|| {
            path.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string())
        });

    let kind = lookup_str(&doc, &["type"])
        .map(ArtifactKind::from_label)
        .unwrap_or_default();

    let mut tools = Vec::new();
    collect_tool_refs(&doc, &mut tools);

    Ok(Artifact {
        name,
        source_path: path.to_path_buf(),
        kind,
        author: lookup_str(&doc, &["author"]).map(str::to_string),
        description: lookup_str(&doc, &["description"]).map(str::to_string),
        tools,
    })
}

/// Look up a string value by any of the candidate keys, case-insensitive.
fn lookup_str<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a str> {
    let mapping = value.as_mapping()?;

    for (key, val) in mapping {
        let Some(key) = key.as_str() else { continue };
        if keys.iter().any(|k| key.eq_ignore_ascii_case(k)) {
            return val.as_str();
        }
    }

    None
}

/// Recursively harvest tool references from the document tree.
///
/// Detection is structural rather than keyed to a fixed schema: any
/// sequence holding at least one mapping that carries a name-like field
/// plus a url-like field is treated as a tool-reference list, and every
/// named mapping in that sequence becomes a reference (url optional, so
/// name-only entries in a tool list still register). This is a known
/// heuristic that tolerates schema drift across artifact vintages.
fn collect_tool_refs(value: &Value, out: &mut Vec<ToolReference>) {
    match value {
        Value::Mapping(mapping) => {
            for (_, val) in mapping {
                collect_tool_refs(val, out);
            }
        }
        Value::Sequence(items) => {
            if sequence_is_tool_list(items) {
                for item in items {
                    if let Some(reference) = tool_ref_from_mapping(item) {
                        out.push(reference);
                    }
                }
            } else {
                for item in items {
                    collect_tool_refs(item, out);
                }
            }
        }
        Value::Tagged(tagged) => collect_tool_refs(&tagged.value, out),
        _ => {}
    }
}

fn sequence_is_tool_list(items: &[Value]) -> bool {
    items
        .iter()
        .any(|item| lookup_str(item, NAME_KEYS).is_some() && lookup_str(item, URL_KEYS).is_some())
}

fn tool_ref_from_mapping(value: &Value) -> Option<ToolReference> {
    let name = lookup_str(value, NAME_KEYS)?;

    Some(ToolReference {
        name: name.to_string(),
        url: lookup_str(value, URL_KEYS).map(str::to_string),
        version: lookup_str(value, VERSION_KEYS).map(str::to_string),
        expected_hash: lookup_str(value, HASH_KEYS).map(str::to_string),
    })
}
