//! Deduplicated tool registry built from scanned artifacts.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use crate::scanner::Artifact;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DownloadStatus {
    #[default]
    Pending,
    InProgress,
    Verified,
    Failed,
    Skipped,
}

impl std::fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            DownloadStatus::Pending => "pending",
            DownloadStatus::InProgress => "in-progress",
            DownloadStatus::Verified => "verified",
            DownloadStatus::Failed => "failed",
            DownloadStatus::Skipped => "skipped",
        };
        f.write_str(label)
    }
}

/// Canonical record for one tool, merged across every artifact that
/// references it. Download state lives here and is only ever advanced
/// by the download manager.
#[derive(Debug, Clone)]
pub struct Tool {
    /// Canonical spelling, taken from the first reference seen.
    pub name: String,
    pub url: Option<String>,
    pub version: Option<String>,
    pub expected_hash: Option<String>,
    pub used_by: BTreeSet<String>,
    pub status: DownloadStatus,
    pub local_path: Option<PathBuf>,
    pub actual_hash: Option<String>,
}

/// Two artifacts declared the same tool name with different urls.
/// Informational, never fatal: the first-seen url wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlConflict {
    pub tool: String,
    pub artifact: String,
    pub kept: String,
    pub rejected: String,
}

#[derive(Debug, Default)]
pub struct ToolRegistry {
    /// Keyed by case-folded tool name so iteration is always sorted.
    tools: BTreeMap<String, Tool>,
    pub conflicts: Vec<UrlConflict>,
}

impl ToolRegistry {
    /// Build the registry from every tool reference across `artifacts`,
    /// deduplicating by case-insensitive name.
    pub fn build(artifacts: &[Artifact]) -> Self {
        let mut registry = Self::default();

        for artifact in artifacts {
            for reference in &artifact.tools {
                registry.upsert(artifact, reference);
            }
        }

        registry
    }

    fn upsert(&mut self, artifact: &Artifact, reference: &crate::scanner::ToolReference) {
        let key = reference.name.to_lowercase();

        let entry = self.tools.entry(key).or_insert_with(|| Tool {
            name: reference.name.clone(),
            url: None,
            version: None,
            expected_hash: None,
            used_by: BTreeSet::new(),
            status: DownloadStatus::Pending,
            local_path: None,
            actual_hash: None,
        });

        entry.used_by.insert(artifact.name.clone());

        if let Some(url) = &reference.url {
            match &entry.url {
                None => entry.url = Some(url.clone()),
                Some(kept) if kept != url => {
                    self.conflicts.push(UrlConflict {
                        tool: entry.name.clone(),
                        artifact: artifact.name.clone(),
                        kept: kept.clone(),
                        rejected: url.clone(),
                    });
                }
                Some(_) => {}
            }
        }

        if entry.version.is_none() {
            entry.version = reference.version.clone();
        }

        if entry.expected_hash.is_none() {
            entry.expected_hash = reference.expected_hash.clone();
        }
    }

    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.tools.get(&name.to_lowercase())
    }

    /// Iterate tools in sorted (case-folded name) order.
    pub fn iter(&self) -> impl Iterator<Item = &Tool> {
        self.tools.values()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Remove and return every tool still in `Pending` state. Used by the
    /// download manager so each in-flight tool has exactly one owner; the
    /// updated records are put back with [`ToolRegistry::restore`].
    pub(crate) fn take_pending(&mut self) -> Vec<Tool> {
        let keys: Vec<String> = self
            .tools
            .iter()
            .filter(|(_, tool)| tool.status == DownloadStatus::Pending)
            .map(|(key, _)| key.clone())
            .collect();

        keys.into_iter()
            .filter_map(|key| self.tools.remove(&key))
            .collect()
    }

    pub(crate) fn restore(&mut self, tool: Tool) {
        self.tools.insert(tool.name.to_lowercase(), tool);
    }
}
