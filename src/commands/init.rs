use clap::Args as ClapArgs;
use miette::IntoDiagnostic as _;

use crate::config::{CONFIG_FILE, FetchConfig, ProjectConfig, RootConfig};

const DEFAULT_PROJECT_NAME: &str = "my-collector";
const DEFAULT_ARTIFACT_DIR: &str = "artifacts";

#[derive(ClapArgs)]
pub struct Args {
    /// Project name (defaults to the current directory name)
    #[arg(long)]
    name: Option<String>,

    /// Directory that will hold artifact definitions
    #[arg(long, default_value = DEFAULT_ARTIFACT_DIR)]
    artifact_dir: String,
}

fn infer_project_name() -> String {
    let current_dir = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(_) => return DEFAULT_PROJECT_NAME.to_string(),
    };

    current_dir
        .file_name()
        .and_then(|f| f.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| DEFAULT_PROJECT_NAME.to_string())
}

pub fn run(args: Args) -> miette::Result<()> {
    let config_path = std::env::current_dir()
        .into_diagnostic()?
        .join(CONFIG_FILE);

    if config_path.exists() {
        miette::bail!("{CONFIG_FILE} already exists in this directory");
    }

    let config = RootConfig {
        project: ProjectConfig {
            name: args.name.unwrap_or_else(infer_project_name),
            artifact_dir: args.artifact_dir.clone().into(),
            include: Vec::new(),
        },
        fetch: FetchConfig::default(),
    };

    config.save(&config_path)?;

    if !std::path::Path::new(&args.artifact_dir).exists() {
        std::fs::create_dir_all(&args.artifact_dir).into_diagnostic()?;
    }

    println!("Created {CONFIG_FILE} for project `{}`", config.project.name);
    println!("Drop artifact definitions into `{}/` and run `artman scan`", args.artifact_dir);

    Ok(())
}
