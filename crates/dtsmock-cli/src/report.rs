//! `mock-report.json`: what was generated, what was skipped and why.

use anyhow::{Context, Result};
use dtsmock_core::{IndexEntry, PipelineOutput, Warning};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub generated: Vec<GeneratedReport<'a>>,
    pub failures: Vec<FailureReport>,
    /// Warnings not tied to a generated file.
    pub warnings: &'a [Warning],
    pub napi_entries: &'a [IndexEntry],
    pub system_entries: &'a [IndexEntry],
}

#[derive(Debug, Serialize)]
pub struct GeneratedReport<'a> {
    pub source: &'a Path,
    pub output: &'a Path,
    pub warnings: &'a [Warning],
}

#[derive(Debug, Serialize)]
pub struct FailureReport {
    pub path: PathBuf,
    pub message: String,
}

impl<'a> Report<'a> {
    pub fn new(output: &'a PipelineOutput) -> Self {
        Self {
            generated: output
                .files
                .iter()
                .map(|file| GeneratedReport {
                    source: &file.source,
                    output: &file.output,
                    warnings: &file.warnings,
                })
                .collect(),
            failures: output
                .failures
                .iter()
                .map(|error| FailureReport {
                    path: error.path().clone(),
                    message: error.to_string(),
                })
                .collect(),
            warnings: &output.warnings,
            napi_entries: &output.napi_entries,
            system_entries: &output.system_entries,
        }
    }
}

/// Serialize the report for `output` as pretty JSON at `path`.
pub fn write_report(path: &Path, output: &PipelineOutput) -> Result<()> {
    let report = Report::new(output);
    let json = serde_json::to_string_pretty(&report).context("failed to serialize report")?;
    fs::write(path, json + "\n")
        .with_context(|| format!("failed to write report {}", path.display()))?;
    tracing::debug!(path = %path.display(), "wrote report");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dtsmock_core::{PipelineError, WarningKind};

    #[test]
    fn test_report_lists_failures_and_warnings() {
        let output = PipelineOutput {
            failures: vec![PipelineError::Missing(PathBuf::from("gone.d.ts"))],
            warnings: vec![Warning::new(WarningKind::Missing, "ref.d.ts")],
            ..Default::default()
        };
        let value = serde_json::to_value(Report::new(&output)).unwrap();
        assert_eq!(value["failures"][0]["path"], "gone.d.ts");
        assert_eq!(value["failures"][0]["message"], "gone.d.ts does not exist");
        assert_eq!(value["warnings"][0]["kind"], "missing");
        assert_eq!(value["generated"].as_array().unwrap().len(), 0);
    }
}
