use std::path::PathBuf;

use clap::Args as ClapArgs;

use crate::registry::ToolRegistry;
use crate::scanner;

#[derive(ClapArgs)]
pub struct Args {
    /// Scan root; overrides the configured artifact directory
    #[arg(long)]
    path: Option<PathBuf>,

    /// File-name globs to include (repeatable); overrides the config
    #[arg(long)]
    include: Vec<String>,

    /// List each artifact and its tool references
    #[arg(long)]
    detail: bool,
}

pub fn run(args: Args) -> miette::Result<()> {
    // config is only needed when no explicit scan root was given, so an
    // ad hoc `scan --path` works outside any artman project
    let (scan_root, include) = match args.path {
        Some(path) => (path, args.include),
        None => {
            let (root, config) = crate::dirs::load_config()?;
            let include = if args.include.is_empty() {
                config.project.include
            } else {
                args.include
            };
            (root.join(&config.project.artifact_dir), include)
        }
    };

    let result = scanner::scan(&scan_root, &include)?;
    let registry = ToolRegistry::build(&result.artifacts);

    println!(
        "{} artifacts scanned, {} failed to parse",
        result.artifacts.len(),
        result.issues.len()
    );
    println!("{} distinct tools referenced", registry.len());

    for issue in &result.issues {
        println!("  parse error: {}: {}", issue.path.display(), issue.error);
    }

    for conflict in &registry.conflicts {
        println!(
            "  url conflict: tool `{}` in `{}` declares {} (keeping {})",
            conflict.tool, conflict.artifact, conflict.rejected, conflict.kept
        );
    }

    if args.detail {
        for artifact in &result.artifacts {
            println!("{} ({})", artifact.name, artifact.source_path.display());
            for tool in &artifact.tools {
                match &tool.url {
                    Some(url) => println!("  - {} <{}>", tool.name, url),
                    None => println!("  - {} <no url>", tool.name),
                }
            }
        }
    }

    Ok(())
}
