//! Offline collector package assembly.
//!
//! Combines scanned artifact definitions and the tool cache into a
//! self-contained directory: `artifacts/`, `tools/`, `manifest.json`.
//! The manifest is written last, so its presence on disk means the
//! assembly completed.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Write as _;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;

use crate::download::hash_file;
use crate::error::{Error, Result};
use crate::registry::{DownloadStatus, ToolRegistry};
use crate::scanner::ScanResult;

pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestTool {
    pub name: String,
    pub version: Option<String>,
    pub hash: Option<String>,
    pub path: String,
}

/// Single source of truth for what a package contains. Written once per
/// assembly run, never patched.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageManifest {
    pub artifacts: Vec<String>,
    pub tools: Vec<ManifestTool>,
    pub missing_tools: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct PackageOptions {
    /// Artifact names to include; `None` means every scanned artifact.
    pub include: Option<Vec<String>>,
}

/// Assemble an offline collector package under `output_dir`.
///
/// Tools are taken from the cache only when their status is `Verified`
/// or `Skipped`; anything else used by an included artifact lands in the
/// manifest's `missingTools` list instead of aborting the assembly.
pub fn assemble_package(
    scan: &ScanResult,
    registry: &ToolRegistry,
    output_dir: &Path,
    options: &PackageOptions,
) -> Result<PackageManifest> {
    let artifacts_dir = output_dir.join("artifacts");
    let tools_dir = output_dir.join("tools");
    std::fs::create_dir_all(&artifacts_dir)?;
    std::fs::create_dir_all(&tools_dir)?;

    let included: Vec<&crate::scanner::Artifact> = match &options.include {
        Some(names) => scan
            .artifacts
            .iter()
            .filter(|a| names.iter().any(|n| n == &a.name))
            .collect(),
        None => scan.artifacts.iter().collect(),
    };

    let included_names: BTreeSet<&str> = included.iter().map(|a| a.name.as_str()).collect();

    // copy definitions, preserving scan-root-relative layout
    let mut claimed: BTreeMap<PathBuf, String> = BTreeMap::new();

    for artifact in &included {
        let relative = artifact
            .source_path
            .strip_prefix(&scan.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| {
                PathBuf::from(artifact.source_path.file_name().unwrap_or_default())
            });

        if let Some(first) = claimed.get(&relative) {
            return Err(Error::AssemblyCollision {
                path: relative,
                first: first.clone(),
                second: artifact.name.clone(),
            });
        }
        claimed.insert(relative.clone(), artifact.name.clone());

        let dest = artifacts_dir.join(&relative);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(&artifact.source_path, &dest)?;
        debug!(artifact = %artifact.name, dest = %dest.display(), "copied definition");
    }

    // only tools actually used by an included artifact, registry order
    let mut tools = Vec::new();
    let mut missing = Vec::new();

    for tool in registry.iter() {
        if !tool.used_by.iter().any(|a| included_names.contains(a.as_str())) {
            continue;
        }

        let ready = matches!(
            tool.status,
            DownloadStatus::Verified | DownloadStatus::Skipped
        );

        let Some(source) = tool.local_path.as_deref().filter(|_| ready) else {
            missing.push(tool.name.clone());
            continue;
        };

        let file_name = source
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| tool.name.clone());

        let tool_dir = tools_dir.join(&tool.name);
        std::fs::create_dir_all(&tool_dir)?;
        std::fs::copy(source, tool_dir.join(&file_name))?;

        let hash = match &tool.actual_hash {
            Some(hash) => Some(hash.clone()),
            None => Some(hash_file(source)?),
        };

        tools.push(ManifestTool {
            name: tool.name.clone(),
            version: tool.version.clone(),
            hash,
            path: format!("tools/{}/{}", tool.name, file_name),
        });
    }

    let manifest = PackageManifest {
        artifacts: included.iter().map(|a| a.name.clone()).collect(),
        tools,
        missing_tools: missing,
        created_at: Utc::now(),
    };

    // written last: a manifest on disk means the assembly completed
    let json = serde_json::to_string_pretty(&manifest).map_err(|err| {
        Error::Io(std::io::Error::other(format!(
            "failed to serialize manifest: {err}"
        )))
    })?;
    std::fs::write(output_dir.join(MANIFEST_FILE), json)?;

    info!(
        artifacts = manifest.artifacts.len(),
        tools = manifest.tools.len(),
        missing = manifest.missing_tools.len(),
        "package assembled"
    );

    Ok(manifest)
}

/// Compress a finished package directory into `<dir>.zip` next to it.
/// Purely additive: a failure here leaves the directory untouched.
pub fn archive_package(package_dir: &Path) -> Result<PathBuf> {
    let zip_path = package_dir.with_extension("zip");
    let file = std::fs::File::create(&zip_path)?;
    let mut zip = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default();

    for entry in WalkDir::new(package_dir).sort_by_file_name() {
        let entry = entry.map_err(|err| Error::Io(std::io::Error::other(err.to_string())))?;
        let path = entry.path();

        let Ok(relative) = path.strip_prefix(package_dir) else {
            continue;
        };
        if relative.as_os_str().is_empty() {
            continue;
        }

        let name = relative.to_string_lossy().replace('\\', "/");

        if entry.file_type().is_dir() {
            zip.add_directory(name, options)
                .map_err(|err| Error::Io(std::io::Error::other(err.to_string())))?;
        } else {
            zip.start_file(name, options)
                .map_err(|err| Error::Io(std::io::Error::other(err.to_string())))?;
            let content = std::fs::read(path)?;
            zip.write_all(&content)?;
        }
    }

    zip.finish()
        .map_err(|err| Error::Io(std::io::Error::other(err.to_string())))?;

    Ok(zip_path)
}
