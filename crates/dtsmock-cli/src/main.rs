use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dtsmock_cli::diagnostic::report_failure;
use dtsmock_cli::tracing_config::init_tracing;
use dtsmock_core::MockConfig;

const DEFAULT_CONFIG: &str = "dtsmock.toml";

#[derive(Parser, Debug)]
#[command(
    name = "dtsmock",
    version,
    about = "Generate previewer mocks from TypeScript declaration files"
)]
struct Cli {
    /// Enable verbose debug logging
    #[arg(short, long)]
    debug: bool,

    /// Configuration file (default: ./dtsmock.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate mock scripts and dispatch tables for an API directory
    Generate {
        /// Root of the declaration tree
        api_dir: PathBuf,
        /// Output directory
        #[arg(short, long)]
        output: PathBuf,
        /// Also write mock-report.json to the output directory
        #[arg(long)]
        report: bool,
    },
    /// Print the extracted entity tree of one declaration file as JSON
    Inspect {
        /// Declaration file to inspect
        file: PathBuf,
    },
}

fn load_config(explicit: Option<&Path>) -> Result<MockConfig> {
    match explicit {
        Some(path) => MockConfig::load_from_path(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => MockConfig::load_or_default(Path::new(DEFAULT_CONFIG))
            .context("failed to load dtsmock.toml"),
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Command::Generate {
            api_dir,
            output,
            report,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let result = dtsmock_cli::generate(&api_dir, &output, config, report)?;

            for failure in &result.failures {
                report_failure(failure);
            }
            let warnings: usize = result.files.iter().map(|f| f.warnings.len()).sum::<usize>()
                + result.warnings.len();
            eprintln!(
                "Generated {} files into {} ({} warnings, {} failures)",
                result.files.len(),
                output.display(),
                warnings,
                result.failures.len()
            );

            if result.failures.is_empty() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        Command::Inspect { file } => {
            println!("{}", dtsmock_cli::inspect(&file)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
