//! Request specification types.
//!
//! A [`PprSpec`] names the engine, the graph contract (weighted or not), the
//! numeric parameters and the work budget of one personalized PageRank
//! request. It is the input to the
//! [`ValidationEngine`](super::validation::ValidationEngine) and the
//! dispatcher.
//!
//! # JSON shape
//!
//! ```json
//! {
//!   "method": "l1reg",
//!   "weighted": false,
//!   "alpha": 0.15,
//!   "rho": 1e-4,
//!   "epsilon": 1e-2,
//!   "iterations": 1000,
//!   "timeout": 10.0,
//!   "strict": false
//! }
//! ```
//!
//! Every field is optional; omitted fields take the defaults of
//! [`PprSpec::default`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::pagerank::Method;
use crate::Result;

/// Personalized PageRank request (parameters only, no graph or seeds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PprSpec {
    /// Engine name, `"acl"` or `"l1reg"`. Kept as text so an unknown name is
    /// reported by the dispatcher rather than by the deserializer.
    pub method: String,

    /// Use edge weights for degrees and pushes.
    pub weighted: bool,

    /// Teleportation probability, in `(0, 1)`.
    pub alpha: f64,

    /// Approximation (ACL) or regularization (l1reg) strength.
    pub rho: f64,

    /// Relative tolerance of the l1reg stopping rule.
    pub epsilon: f64,

    /// Maximum pushes (ACL) or outer iterations (l1reg).
    pub iterations: usize,

    /// Wall-clock limit in seconds.
    pub timeout: f64,

    /// If `true`, unrecognized fields are errors; if `false`, warnings.
    pub strict: bool,

    /// Captures any fields not recognized by the schema.
    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_json::Value>,
}

impl Default for PprSpec {
    fn default() -> Self {
        Self {
            method: Method::Acl.as_str().to_string(),
            weighted: false,
            alpha: 0.15,
            rho: 1.0e-6,
            epsilon: 1.0e-2,
            iterations: 100_000,
            timeout: 100.0,
            strict: false,
            unknown_fields: HashMap::new(),
        }
    }
}

impl PprSpec {
    /// Default request for the ACL push engine
    pub fn acl() -> Self {
        Self::default()
    }

    /// Default request for the l1-regularized solver
    pub fn l1reg() -> Self {
        Self::default().with_method(Method::L1Reg.as_str())
    }

    /// Parse the engine name
    pub fn method(&self) -> Result<Method> {
        self.method.parse()
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn with_weighted(mut self, weighted: bool) -> Self {
        self.weighted = weighted;
        self
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_rho(mut self, rho: f64) -> Self {
        self.rho = rho;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_timeout(mut self, timeout: f64) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}
