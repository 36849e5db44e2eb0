//! Structured request errors.

use serde::Serialize;

use super::error_code::ErrorCode;

/// A single problem found in a PageRank request.
///
/// `path` is a JSON-pointer-like location (`/alpha`, `/seeds/3`,
/// `/warm_start/12`) so a caller can point at the offending input.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[error("{code} at {path}: {message}")]
pub struct PprSpecError {
    pub code: ErrorCode,
    pub path: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl PprSpecError {
    pub fn new(code: ErrorCode, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            path: path.into(),
            message: message.into(),
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
