use clap::Args as ClapArgs;
use miette::IntoDiagnostic as _;

use crate::config::RootConfig;
use crate::download::{self, Downloader};
use crate::registry::{DownloadStatus, ToolRegistry};
use crate::scanner;

#[derive(ClapArgs)]
pub struct Args {
    /// List what would be downloaded without fetching anything
    #[arg(long)]
    dry_run: bool,

    /// Parallel downloads; overrides the config
    #[arg(long)]
    concurrency: Option<usize>,
}

pub fn run(args: Args, root: &std::path::Path, config: &RootConfig) -> miette::Result<()> {
    let scan_root = root.join(&config.project.artifact_dir);
    let result = scanner::scan(&scan_root, &config.project.include)?;

    if !result.issues.is_empty() {
        println!(
            "warning: {} definition file(s) failed to parse and were skipped",
            result.issues.len()
        );
    }

    let mut registry = ToolRegistry::build(&result.artifacts);
    let cache_dir = crate::dirs::cache_dir(root, config)?;

    let cached = download::mark_cached(&mut registry, &cache_dir);

    if args.dry_run {
        println!("{} tools registered, {} already cached", registry.len(), cached);
        for tool in registry.iter() {
            if tool.status != DownloadStatus::Pending {
                continue;
            }
            match &tool.url {
                Some(url) => println!("  would fetch {} from {}", tool.name, url),
                None => println!("  cannot fetch {} (no url declared)", tool.name),
            }
        }
        return Ok(());
    }

    let downloader = Downloader::new(
        args.concurrency.unwrap_or(config.fetch.concurrency),
        config.fetch.timeout_secs,
        config.fetch.max_retries,
    )?;

    let runtime = tokio::runtime::Runtime::new().into_diagnostic()?;
    let report = runtime.block_on(downloader.download_all(&mut registry, &cache_dir));

    println!(
        "{} tools registered: {} downloaded, {} cached, {} failed",
        registry.len(),
        report.verified(),
        report.skipped() + cached,
        report.failed()
    );

    for failure in report.failures() {
        if let Some(error) = &failure.error {
            println!("  failed: {}: {}", failure.name, error);
        }
    }

    Ok(())
}
