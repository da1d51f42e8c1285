//! Errors surfaced to the pipeline's caller.

use dtsmock_syntax::ParseError;
use std::path::PathBuf;

/// A required input that could not be processed. Only that file is skipped.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {error}", .path.display())]
    Parse {
        path: PathBuf,
        source_code: String,
        #[source]
        error: ParseError,
    },
    #[error("{} does not exist", .0.display())]
    Missing(PathBuf),
}

impl PipelineError {
    pub fn path(&self) -> &PathBuf {
        match self {
            PipelineError::Read { path, .. } | PipelineError::Parse { path, .. } => path,
            PipelineError::Missing(path) => path,
        }
    }
}
