//! Non-fatal diagnostics collected while generating a file.

use serde::Serialize;

/// A warning recorded during extraction or synthesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// A type or import reference that could not be resolved.
    Unresolved,
    /// A referenced file that does not exist.
    Missing,
    /// A statement that contributes nothing to the output.
    Skipped,
    /// A construct rendered with a simpler shape than declared.
    Simplified,
}

impl Warning {
    pub fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}
