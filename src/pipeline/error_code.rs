//! Stable, machine-readable diagnostic codes.

use serde::Serialize;

/// Category of a validation finding.
///
/// Serialized in `snake_case` so callers (and JSON consumers) can match on
/// the code rather than the human-readable message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// A numeric parameter is outside its admissible range.
    InvalidParameter,
    /// A node id is not in `[0, n)`.
    NodeOutOfRange,
    /// The reference set is empty.
    EmptySeeds,
    /// The same reference node was listed more than once.
    DuplicateSeed,
    /// A warm start was supplied to an engine that cannot use it.
    WarmStartIgnored,
    /// Edge weights were dropped because the unweighted contract was requested.
    WeightsDiscarded,
    /// l1reg was asked to solve on a graph whose adjacency is not symmetric.
    AsymmetricAdjacency,
    /// A field in the request was not recognized.
    UnknownField,
    /// Catch-all for custom rules.
    ValidationFailed,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidParameter => "invalid_parameter",
            Self::NodeOutOfRange => "node_out_of_range",
            Self::EmptySeeds => "empty_seeds",
            Self::DuplicateSeed => "duplicate_seed",
            Self::WarmStartIgnored => "warm_start_ignored",
            Self::WeightsDiscarded => "weights_discarded",
            Self::AsymmetricAdjacency => "asymmetric_adjacency",
            Self::UnknownField => "unknown_field",
            Self::ValidationFailed => "validation_failed",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
