//! Library half of the `dtsmock` binary, kept separate so integration tests
//! can drive whole runs without spawning a process.

pub mod diagnostic;
pub mod output;
pub mod report;
pub mod tracing_config;

use anyhow::{bail, Context, Result};
use dtsmock_core::{extract, FileSystemSource, MockConfig, Pipeline, PipelineOutput, Warning};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// File name of the optional run report, written next to the generated tree.
pub const REPORT_FILE: &str = "mock-report.json";

/// Generate mocks for every declaration file under `api_dir` into `out_dir`.
///
/// Per-file failures are returned in the output rather than as an error; only
/// I/O problems on the output side abort the run.
pub fn generate(
    api_dir: &Path,
    out_dir: &Path,
    config: MockConfig,
    report: bool,
) -> Result<PipelineOutput> {
    if !api_dir.is_dir() {
        bail!("API directory {} does not exist", api_dir.display());
    }

    let inputs = output::collect_inputs(api_dir, &config)?;
    tracing::info!(count = inputs.len(), "generating mocks");

    let pipeline = Pipeline::new(FileSystemSource::new(api_dir), config);
    let result = pipeline.run(&inputs);

    output::write_output(out_dir, &result)?;
    if report {
        report::write_report(&out_dir.join(REPORT_FILE), &result)?;
    }
    Ok(result)
}

#[derive(Serialize)]
struct Inspection<'a> {
    entity: &'a dtsmock_core::SourceFileEntity,
    warnings: &'a [Warning],
}

/// Extracted entity tree of a single declaration file as pretty JSON.
pub fn inspect(file: &Path) -> Result<String> {
    let source = fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;

    let parsed = match dtsmock_syntax::parse(&source) {
        Ok(parsed) => parsed,
        Err(error) => {
            let db = diagnostic::SourceDb::new(file.display().to_string(), source.clone());
            let span = error.span();
            let start = span.start.min(source.len());
            let end = span.end.min(source.len()).max(start);
            db.report_parse_error(&error.message, start..end);
            bail!("failed to parse {}", file.display());
        }
    };

    let extraction = extract(file, &source, &parsed);
    let inspection = Inspection {
        entity: &extraction.entity,
        warnings: &extraction.warnings,
    };
    serde_json::to_string_pretty(&inspection).context("failed to serialize entity tree")
}
