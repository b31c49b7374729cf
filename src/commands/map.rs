use std::path::PathBuf;

use clap::{Args as ClapArgs, ValueEnum};
use miette::IntoDiagnostic as _;

use crate::config::RootConfig;
use crate::export;
use crate::scanner;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Format {
    Table,
    Json,
}

#[derive(ClapArgs)]
pub struct Args {
    /// Report format
    #[arg(long, value_enum, default_value_t = Format::Table)]
    format: Format,

    /// Write the report to a file instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

pub fn run(args: Args, root: &std::path::Path, config: &RootConfig) -> miette::Result<()> {
    let scan_root = root.join(&config.project.artifact_dir);
    let result = scanner::scan(&scan_root, &config.project.include)?;

    let report = match args.format {
        Format::Table => export::render_table(&result),
        Format::Json => export::render_json(&result)?,
    };

    match args.output {
        Some(path) => {
            std::fs::write(&path, report).into_diagnostic()?;
            println!("mapping written to {}", path.display());
        }
        None => print!("{report}"),
    }

    Ok(())
}
