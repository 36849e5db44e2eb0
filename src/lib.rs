//! # rapid-ppr
//!
//! Local personalized PageRank for local graph clustering.
//!
//! Given a sparse graph and a small set of seed nodes, compute a PageRank
//! vector concentrated around the seeds while touching only the part of the
//! graph near them. Two engines are available:
//!
//! - **ACL push** (`"acl"`): repeatedly moves residual probability from nodes
//!   whose residual exceeds `rho` times their degree.
//! - **l1-regularized PageRank** (`"l1reg"`): solves an l1-penalized quadratic
//!   program with accelerated proximal gradient, optionally warm-started from
//!   a previous solution.
//!
//! ## Example
//!
//! ```rust
//! use rapid_ppr::{approximate_pagerank, GraphBuilder, PprSpec};
//!
//! let graph = GraphBuilder::from_undirected_edges(4, &[(0, 1), (1, 2), (2, 3), (3, 0)]).build();
//! let outcome = approximate_pagerank(&graph, &[0], &PprSpec::acl().with_rho(1e-4), None).unwrap();
//!
//! assert_eq!(outcome.vector.len(), 4);
//! assert_eq!(outcome.result.support[0].0, 0);
//! ```

pub mod error;
pub mod graph;
pub mod pagerank;
pub mod pipeline;
pub mod sparse;

pub use error::{Error, Result};
pub use graph::builder::GraphBuilder;
pub use graph::csr::CsrGraph;
pub use graph::view::{DegreeVectors, GraphView};
pub use pagerank::acl::{AclPush, FifoFrontier, Frontier, LifoFrontier};
pub use pagerank::proxl1::ProxL1Solver;
pub use pagerank::{LocalPageRank, LocalPageRankResult, Method};
pub use pipeline::observer::{NoopObserver, SolveReport, SolverObserver, TimingObserver};
pub use pipeline::runner::{
    approximate_pagerank, approximate_pagerank_batch, approximate_pagerank_into,
    approximate_pagerank_with_observer, PprOutcome,
};
pub use pipeline::spec::PprSpec;
pub use pipeline::validation::{ValidationEngine, ValidationReport};
pub use sparse::SparseVec;
