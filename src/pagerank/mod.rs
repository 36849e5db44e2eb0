//! Local personalized PageRank engines
//!
//! Two engines compute a PageRank vector localized around a set of seed
//! nodes without visiting the whole graph:
//!
//! - [`acl::AclPush`]: Andersen–Chung–Lang local push.
//! - [`proxl1::ProxL1Solver`]: l1-regularized PageRank solved by accelerated
//!   proximal gradient, with optional warm start.
//!
//! Both implement [`LocalPageRank`] and are selected by [`Method`].

pub mod acl;
pub mod budget;
pub mod proxl1;

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::graph::view::GraphView;
use crate::pipeline::observer::SolverObserver;
use crate::Error;

/// Which engine computes the vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// Andersen–Chung–Lang push
    Acl,
    /// l1-regularized PageRank via FISTA
    L1Reg,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Acl => "acl",
            Method::L1Reg => "l1reg",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "acl" => Ok(Method::Acl),
            "l1reg" => Ok(Method::L1Reg),
            _ => Err(Error::UnknownMethod(value.to_string())),
        }
    }
}

/// Compute an approximate personalized PageRank vector given a graph, a seed
/// set and the engine's own budget.
///
/// Seeds must be valid node ids of `view`; the dispatcher checks this before
/// calling an engine, direct callers get a panic on an out-of-range id.
pub trait LocalPageRank {
    fn method(&self) -> Method;

    fn compute<O: SolverObserver>(
        &self,
        view: GraphView<'_>,
        seeds: &[u32],
        observer: &mut O,
    ) -> LocalPageRankResult;
}

/// Result of a local PageRank computation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocalPageRankResult {
    /// Nonzero entries, sorted by decreasing value (ties by node id)
    pub support: Vec<(u32, f64)>,
    /// Pushes (ACL) or outer iterations (FISTA) performed
    pub iterations: usize,
    /// Final stopping quantity: largest remaining `r[v]/d[v]` for ACL, the
    /// scaled gradient norm for FISTA
    pub delta: f64,
    /// Whether the stopping rule was met before the budget ran out
    pub converged: bool,
}

impl LocalPageRankResult {
    /// Create a new result
    pub fn new(support: Vec<(u32, f64)>, iterations: usize, delta: f64, converged: bool) -> Self {
        Self {
            support,
            iterations,
            delta,
            converged,
        }
    }

    /// Get top N nodes by score
    pub fn top_n(&self, n: usize) -> Vec<(u32, f64)> {
        self.support.iter().take(n).copied().collect()
    }

    /// Get the score for a specific node (0.0 outside the support)
    pub fn score(&self, node: u32) -> f64 {
        self.support
            .iter()
            .find(|(id, _)| *id == node)
            .map_or(0.0, |&(_, s)| s)
    }

    /// Sum of the returned values
    pub fn mass(&self) -> f64 {
        self.support.iter().map(|&(_, s)| s).sum()
    }

    /// Write the support into `out`, zeroing every other entry
    ///
    /// Support ids at or beyond `out.len()` are skipped.
    pub fn scatter_into(&self, out: &mut [f64]) {
        out.fill(0.0);
        for &(node, score) in &self.support {
            if let Some(slot) = out.get_mut(node as usize) {
                *slot = score;
            }
        }
    }

    /// Dense vector of length `num_nodes`
    pub fn to_dense(&self, num_nodes: usize) -> Vec<f64> {
        let mut dense = vec![0.0; num_nodes];
        self.scatter_into(&mut dense);
        dense
    }
}
