use std::path::PathBuf;

use miette::{Context as _, IntoDiagnostic as _};

use crate::config::{CONFIG_FILE, RootConfig};

// crawl up the directory tree until we find an artman.toml file
pub fn project_root() -> miette::Result<PathBuf> {
    let mut cwd = std::env::current_dir().into_diagnostic()?;

    loop {
        if cwd.join(CONFIG_FILE).exists() {
            return Ok(cwd);
        }

        let Some(parent) = cwd.parent() else {
            return Err(miette::miette!(
                "No {CONFIG_FILE} found in current directory or any parent"
            ));
        };

        cwd = parent.to_path_buf();
    }
}

pub fn load_config() -> miette::Result<(PathBuf, RootConfig)> {
    let root = project_root()?;
    let config = RootConfig::load(&root.join(CONFIG_FILE))?;
    Ok((root, config))
}

/// Resolve the tool cache directory: configured path (relative to the
/// project root) or the platform cache dir. Created if absent.
pub fn cache_dir(root: &std::path::Path, config: &RootConfig) -> miette::Result<PathBuf> {
    let dir = match &config.fetch.cache_dir {
        Some(configured) if configured.is_absolute() => configured.clone(),
        Some(configured) => root.join(configured),
        None => dirs::cache_dir()
            .ok_or_else(|| miette::miette!("failed to get platform cache directory"))?
            .join("artman")
            .join("tools"),
    };

    if !dir.exists() {
        std::fs::create_dir_all(&dir)
            .into_diagnostic()
            .context("creating tool cache directory")?;
    }

    Ok(dir)
}
