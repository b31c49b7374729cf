use std::path::{Path, PathBuf};

use miette::{Context as _, IntoDiagnostic as _};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE: &str = "artman.toml";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProjectConfig {
    pub name: String,

    /// Directory holding the artifact definition files, relative to the
    /// project root.
    pub artifact_dir: PathBuf,

    /// File-name globs selecting which definitions to scan. Empty means
    /// everything.
    #[serde(default)]
    pub include: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FetchConfig {
    /// Tool cache directory; defaults to the platform cache dir.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_concurrency() -> usize {
    4
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            concurrency: default_concurrency(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RootConfig {
    pub project: ProjectConfig,

    #[serde(default)]
    pub fetch: FetchConfig,
}

impl RootConfig {
    pub fn load(path: &Path) -> miette::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .into_diagnostic()
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Self = toml::from_str(&contents).into_diagnostic()?;

        Ok(config)
    }

    pub fn save(&self, path: &Path) -> miette::Result<()> {
        let contents = toml::to_string_pretty(self).into_diagnostic()?;
        std::fs::write(path, contents).into_diagnostic()?;
        Ok(())
    }
}
