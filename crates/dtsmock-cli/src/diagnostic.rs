//! Rich error reporting using codespan-reporting.

use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use dtsmock_core::PipelineError;
use std::ops::Range;

fn emit_diagnostic_to_stderr(files: &SimpleFiles<String, String>, diagnostic: &Diagnostic<usize>) {
    let writer = StandardStream::stderr(ColorChoice::Auto);
    let config = term::Config::default();
    let _ = term::emit(&mut writer.lock(), &config, files, diagnostic);
}

/// A source file database for codespan-reporting.
pub struct SourceDb {
    files: SimpleFiles<String, String>,
    file_id: usize,
}

impl SourceDb {
    /// Create a new source database with a single file.
    pub fn new(name: String, source: String) -> Self {
        let mut files = SimpleFiles::new();
        let file_id = files.add(name, source);
        Self { files, file_id }
    }

    /// Report a parse error with source context.
    pub fn report_parse_error(&self, message: &str, span: Range<usize>) {
        let diagnostic = Diagnostic::error()
            .with_message(message)
            .with_labels(vec![
                Label::primary(self.file_id, span).with_message("error occurs here")
            ]);
        emit_diagnostic_to_stderr(&self.files, &diagnostic);
    }
}

/// Print one pipeline failure; parse failures point into the source.
pub fn report_failure(error: &PipelineError) {
    match error {
        PipelineError::Parse {
            path,
            source_code,
            error,
        } => {
            let len = source_code.len();
            let span = error.span();
            let start = span.start.min(len);
            let end = span.end.min(len).max(start);
            let db = SourceDb::new(path.display().to_string(), source_code.clone());
            db.report_parse_error(&error.message, start..end);
        }
        other => {
            let files = SimpleFiles::new();
            let diagnostic = Diagnostic::error().with_message(other.to_string());
            emit_diagnostic_to_stderr(&files, &diagnostic);
        }
    }
}
