//! Crate-level error type.

use thiserror::Error;

use crate::pipeline::validation::ValidationReport;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures that stop a computation before any output is written.
///
/// Running out of budget is not an error; it is reported through
/// [`LocalPageRankResult::converged`](crate::pagerank::LocalPageRankResult).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("unknown method \"{0}\", expected \"acl\" or \"l1reg\"")]
    UnknownMethod(String),

    #[error("invalid graph: {0}")]
    InvalidGraph(String),

    #[error("invalid input: {0}")]
    InvalidInput(ValidationReport),
}
