use std::path::PathBuf;

use clap::Args as ClapArgs;
use tracing::warn;

use crate::config::RootConfig;
use crate::download;
use crate::package::{self, PackageOptions};
use crate::registry::ToolRegistry;
use crate::scanner;

#[derive(ClapArgs)]
pub struct Args {
    /// Package output directory
    #[arg(long, default_value = "collector")]
    output: PathBuf,

    /// Artifact names to include (repeatable); default is everything
    #[arg(long)]
    include: Vec<String>,

    /// Also compress the finished package into <output>.zip
    #[arg(long)]
    archive: bool,
}

pub fn run(args: Args, root: &std::path::Path, config: &RootConfig) -> miette::Result<()> {
    let scan_root = root.join(&config.project.artifact_dir);
    let result = scanner::scan(&scan_root, &config.project.include)?;

    let mut registry = ToolRegistry::build(&result.artifacts);
    let cache_dir = crate::dirs::cache_dir(root, config)?;

    // assemble from whatever the cache already holds; `artman fetch`
    // is the step that actually talks to the network
    download::mark_cached(&mut registry, &cache_dir);

    let output = if args.output.is_absolute() {
        args.output.clone()
    } else {
        root.join(&args.output)
    };

    let options = PackageOptions {
        include: (!args.include.is_empty()).then_some(args.include),
    };

    let manifest = package::assemble_package(&result, &registry, &output, &options)?;

    println!(
        "package assembled at {}: {} artifacts, {} tools, {} missing",
        output.display(),
        manifest.artifacts.len(),
        manifest.tools.len(),
        manifest.missing_tools.len()
    );

    for missing in &manifest.missing_tools {
        println!("  missing tool: {missing} (run `artman fetch`)");
    }

    if args.archive {
        // additive step: the assembled directory stays valid either way
        match package::archive_package(&output) {
            Ok(zip_path) => println!("archive written to {}", zip_path.display()),
            Err(error) => warn!(%error, "failed to compress package"),
        }
    }

    Ok(())
}
