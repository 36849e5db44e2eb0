//! Dispatcher: validates a request, runs the selected engine and assembles
//! the dense result vector.
//!
//! Control flow of every entry point:
//!
//! 1. Parse the method name (unknown names fail before anything else).
//! 2. Run the [`ValidationEngine`] and collect every diagnostic; any error
//!    aborts with [`Error::InvalidInput`].
//! 3. Fold repeated seeds and build degree vectors for the requested
//!    (weighted or unweighted) contract.
//! 4. Run the engine under its budget.
//! 5. Scatter the support into a dense vector of length `n`.
//!
//! # Parallel batches
//!
//! [`approximate_pagerank_batch`] runs independent queries against one
//! shared graph with rayon. Engines themselves are sequential.

use rayon::prelude::*;
use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::graph::csr::CsrGraph;
use crate::graph::view::{DegreeVectors, GraphView};
use crate::pagerank::acl::AclPush;
use crate::pagerank::proxl1::ProxL1Solver;
use crate::pagerank::{LocalPageRank, LocalPageRankResult, Method};
use crate::pipeline::observer::{NoopObserver, SolverObserver};
use crate::pipeline::spec::PprSpec;
use crate::pipeline::validation::{PprRequest, ValidationEngine, ValidationReport};
use crate::sparse::SparseVec;
use crate::{Error, Result};

// ---------------------------------------------------------------------------
// Conditional tracing support
// ---------------------------------------------------------------------------

/// Enter a tracing span for one engine run (when the `tracing` feature is
/// enabled). When disabled, this is a no-op and the compiler eliminates it.
macro_rules! trace_engine {
    ($method:expr) => {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("ppr_engine", method = $method).entered();
    };
}

/// Dense vector plus everything the engine and validator reported.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PprOutcome {
    /// Length `n`, zero outside the support
    pub vector: Vec<f64>,
    pub result: LocalPageRankResult,
    /// Warnings raised while validating the request
    pub report: ValidationReport,
}

/// Compute a localized personalized PageRank vector.
///
/// `warm_start` is only used by the `l1reg` method; `acl` ignores it with a
/// `warm_start_ignored` warning.
pub fn approximate_pagerank(
    graph: &CsrGraph,
    seeds: &[u32],
    spec: &PprSpec,
    warm_start: Option<&SparseVec>,
) -> Result<PprOutcome> {
    approximate_pagerank_with_observer(graph, seeds, spec, warm_start, &mut NoopObserver)
}

/// Like [`approximate_pagerank`], forwarding engine events to `observer`.
pub fn approximate_pagerank_with_observer<O: SolverObserver>(
    graph: &CsrGraph,
    seeds: &[u32],
    spec: &PprSpec,
    warm_start: Option<&SparseVec>,
    observer: &mut O,
) -> Result<PprOutcome> {
    let engine = ValidationEngine::with_defaults();
    let (result, report) = solve(&engine, graph, seeds, spec, warm_start, observer)?;
    Ok(PprOutcome {
        vector: result.to_dense(graph.num_nodes),
        result,
        report,
    })
}

/// Compute into a caller-owned buffer.
///
/// On success `out` is resized to `n` and overwritten; on any error it is
/// left exactly as it was.
pub fn approximate_pagerank_into(
    graph: &CsrGraph,
    seeds: &[u32],
    spec: &PprSpec,
    warm_start: Option<&SparseVec>,
    out: &mut Vec<f64>,
) -> Result<(LocalPageRankResult, ValidationReport)> {
    let engine = ValidationEngine::with_defaults();
    let (result, report) = solve(&engine, graph, seeds, spec, warm_start, &mut NoopObserver)?;
    out.resize(graph.num_nodes, 0.0);
    result.scatter_into(out);
    Ok((result, report))
}

/// Run one query per seed set in parallel over the shared graph.
///
/// Results are returned in input order; each query succeeds or fails on its
/// own.
pub fn approximate_pagerank_batch<S>(
    graph: &CsrGraph,
    seed_sets: &[S],
    spec: &PprSpec,
) -> Vec<Result<PprOutcome>>
where
    S: AsRef<[u32]> + Sync,
{
    let engine = ValidationEngine::with_defaults();
    seed_sets
        .par_iter()
        .map(|seeds| -> Result<PprOutcome> {
            let (result, report) =
                solve(&engine, graph, seeds.as_ref(), spec, None, &mut NoopObserver)?;
            Ok(PprOutcome {
                vector: result.to_dense(graph.num_nodes),
                result,
                report,
            })
        })
        .collect()
}

fn solve<O: SolverObserver>(
    engine: &ValidationEngine,
    graph: &CsrGraph,
    seeds: &[u32],
    spec: &PprSpec,
    warm_start: Option<&SparseVec>,
    observer: &mut O,
) -> Result<(LocalPageRankResult, ValidationReport)> {
    let method = spec.method()?;
    trace_engine!(method.as_str());

    let request = PprRequest::new(spec, method, graph, seeds).with_warm_start(warm_start);
    let report = engine.validate(&request);
    if report.has_errors() {
        return Err(Error::InvalidInput(report));
    }

    #[cfg(feature = "tracing")]
    for warning in report.warnings() {
        tracing::warn!(code = %warning.code, path = %warning.path, "{}", warning.message);
    }

    let seeds = unique_seeds(seeds);
    let degrees = DegreeVectors::from_graph(graph, spec.weighted);
    let view = GraphView::new(graph, &degrees, spec.weighted);

    let result = match method {
        Method::Acl => AclPush::from_spec(spec).compute(view, &seeds, observer),
        Method::L1Reg => {
            let mut solver = ProxL1Solver::from_spec(spec);
            if let Some(ws) = warm_start {
                solver = solver.with_warm_start(ws.clone());
            }
            solver.compute(view, &seeds, observer)
        }
    };

    #[cfg(feature = "tracing")]
    tracing::debug!(
        iterations = result.iterations,
        converged = result.converged,
        support = result.support.len(),
        "engine finished"
    );

    Ok((result, report))
}

/// Drop repeated seeds, keeping first occurrences in order
fn unique_seeds(seeds: &[u32]) -> Vec<u32> {
    let mut seen = FxHashSet::default();
    seeds.iter().copied().filter(|s| seen.insert(*s)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::builder::GraphBuilder;
    use crate::pipeline::error_code::ErrorCode;
    use crate::pipeline::observer::TimingObserver;

    /// Two triangles {0,1,2} and {3,4,5} joined by the edge 2-3.
    fn barbell() -> CsrGraph {
        GraphBuilder::from_undirected_edges(
            6,
            &[(0, 1), (1, 2), (0, 2), (2, 3), (3, 4), (4, 5), (3, 5)],
        )
        .build()
    }

    fn weighted_barbell() -> CsrGraph {
        let mut builder = GraphBuilder::with_nodes(6);
        for (a, b, w) in [
            (0, 1, 3.0),
            (1, 2, 1.0),
            (0, 2, 1.0),
            (2, 3, 0.5),
            (3, 4, 1.0),
            (4, 5, 1.0),
            (3, 5, 2.0),
        ] {
            builder.add_undirected_edge(a, b, w);
        }
        builder.build()
    }

    #[test]
    fn test_dense_vector_has_graph_length() {
        let graph = barbell();
        let outcome = approximate_pagerank(&graph, &[0], &PprSpec::acl().with_rho(1e-4), None).unwrap();

        assert_eq!(outcome.vector.len(), 6);
        assert!(outcome.result.converged);
        assert!(outcome.report.is_empty());
        for (node, &value) in outcome.vector.iter().enumerate() {
            assert_eq!(value, outcome.result.score(node as u32));
        }
        assert!(outcome.vector.iter().all(|&v| v >= 0.0));
        assert!(outcome.vector.iter().sum::<f64>() <= 1.0 + 1e-12);
    }

    #[test]
    fn test_unknown_method_leaves_buffer_untouched() {
        let graph = barbell();
        let mut out = vec![7.0; 3];
        let spec = PprSpec::default().with_method("bogus");
        // seeds are invalid too; the method is reported first
        let err = approximate_pagerank_into(&graph, &[99], &spec, None, &mut out).unwrap_err();

        assert!(matches!(err, Error::UnknownMethod(ref m) if m == "bogus"));
        assert_eq!(out, vec![7.0; 3]);
    }

    #[test]
    fn test_invalid_input_collects_all_errors() {
        let graph = barbell();
        let mut out = vec![1.0, 2.0];
        let spec = PprSpec::l1reg().with_alpha(1.5).with_epsilon(-1.0);
        let err = approximate_pagerank_into(&graph, &[0, 9], &spec, None, &mut out).unwrap_err();

        let Error::InvalidInput(report) = err else {
            panic!("expected InvalidInput");
        };
        let paths: Vec<_> = report.errors().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["/alpha", "/epsilon", "/seeds/1"]);
        assert_eq!(out, vec![1.0, 2.0]);
    }

    #[test]
    fn test_l1reg_rejects_directed_graph() {
        // 0 -> {1, 2, 3}, 1 -> 0, 2 -> 3, 3 -> 0
        let graph =
            CsrGraph::from_csr(vec![0, 3, 4, 5, 6], vec![1, 2, 3, 0, 3, 0], None).unwrap();
        let mut out = vec![5.0; 4];
        let err = approximate_pagerank_into(&graph, &[0], &PprSpec::l1reg(), None, &mut out)
            .unwrap_err();

        let Error::InvalidInput(report) = err else {
            panic!("expected InvalidInput");
        };
        assert!(report.contains(ErrorCode::AsymmetricAdjacency));
        assert_eq!(out, vec![5.0; 4]);

        let outcome = approximate_pagerank(&graph, &[0], &PprSpec::acl(), None).unwrap();
        assert!(outcome.report.is_empty());
        assert!(outcome.result.score(0) > 0.0);
    }

    #[test]
    fn test_into_overwrites_buffer_on_success() {
        let graph = barbell();
        let mut out = vec![5.0; 10];
        let (result, _) =
            approximate_pagerank_into(&graph, &[3], &PprSpec::acl().with_rho(1e-4), None, &mut out)
                .unwrap();

        assert_eq!(out, result.to_dense(6));
    }

    #[test]
    fn test_acl_ignores_warm_start_with_warning() {
        let graph = barbell();
        let spec = PprSpec::acl().with_rho(1e-4);
        let warm = SparseVec::from_pairs([(0, 0.3), (1, 0.2)]);

        let with = approximate_pagerank(&graph, &[0], &spec, Some(&warm)).unwrap();
        let without = approximate_pagerank(&graph, &[0], &spec, None).unwrap();

        assert!(with.report.contains(ErrorCode::WarmStartIgnored));
        assert_eq!(with.vector, without.vector);
        assert_eq!(with.result, without.result);
    }

    #[test]
    fn test_unweighted_contract_discards_weights() {
        let spec = PprSpec::acl().with_rho(1e-4);
        let weighted = approximate_pagerank(&weighted_barbell(), &[0], &spec, None).unwrap();
        let plain = approximate_pagerank(&barbell(), &[0], &spec, None).unwrap();

        assert!(weighted.report.contains(ErrorCode::WeightsDiscarded));
        assert_eq!(weighted.vector, plain.vector);
    }

    #[test]
    fn test_weighted_contract_uses_weights() {
        let spec = PprSpec::acl().with_rho(1e-4).with_weighted(true);
        let weighted = approximate_pagerank(&weighted_barbell(), &[0], &spec, None).unwrap();
        let plain = approximate_pagerank(&barbell(), &[0], &spec, None).unwrap();

        assert!(weighted.report.is_empty());
        // the heavy 0-1 edge pulls mass toward node 1
        assert!(weighted.vector[1] > plain.vector[1]);
    }

    #[test]
    fn test_duplicate_seeds_are_folded() {
        let graph = barbell();
        let spec = PprSpec::acl().with_rho(1e-4);
        let repeated = approximate_pagerank(&graph, &[0, 0, 0], &spec, None).unwrap();
        let single = approximate_pagerank(&graph, &[0], &spec, None).unwrap();

        assert_eq!(repeated.report.warnings().count(), 2);
        assert_eq!(repeated.vector, single.vector);
    }

    #[test]
    fn test_l1reg_warm_start_through_dispatcher() {
        let graph = barbell();
        let spec = PprSpec::l1reg().with_rho(1e-4);
        let first = approximate_pagerank(&graph, &[0], &spec, None).unwrap();
        let warm = SparseVec::from(first.result.support.clone());
        let second = approximate_pagerank(&graph, &[0], &spec, Some(&warm)).unwrap();

        assert!(second.report.is_empty());
        assert!(second.result.converged);
        assert!(second.result.iterations <= 1);
    }

    #[test]
    fn test_observer_receives_finish_report() {
        let graph = barbell();
        let mut timing = TimingObserver::new();
        let outcome = approximate_pagerank_with_observer(
            &graph,
            &[2],
            &PprSpec::l1reg().with_rho(1e-3),
            None,
            &mut timing,
        )
        .unwrap();

        assert_eq!(timing.reports.len(), 1);
        assert_eq!(timing.reports[0].method, Method::L1Reg);
        assert_eq!(timing.reports[0].iterations, outcome.result.iterations);
        assert_eq!(timing.reports[0].support_len, outcome.result.support.len());
    }

    #[test]
    fn test_batch_matches_sequential() {
        let graph = barbell();
        let seed_sets: Vec<Vec<u32>> = vec![vec![0], vec![5], vec![2, 3], vec![], vec![1, 4]];
        for spec in [PprSpec::acl().with_rho(1e-4), PprSpec::l1reg().with_rho(1e-4)] {
            let batch = approximate_pagerank_batch(&graph, &seed_sets, &spec);
            assert_eq!(batch.len(), seed_sets.len());

            for (seeds, parallel) in seed_sets.iter().zip(&batch) {
                match (approximate_pagerank(&graph, seeds, &spec, None), parallel) {
                    (Ok(sequential), Ok(parallel)) => {
                        assert_eq!(sequential.vector, parallel.vector);
                        assert_eq!(sequential.result.support, parallel.result.support);
                        assert_eq!(sequential.result.iterations, parallel.result.iterations);
                    }
                    (Err(Error::InvalidInput(a)), Err(Error::InvalidInput(b))) => {
                        assert_eq!(&a, b);
                    }
                    (a, b) => panic!("batch and sequential disagree: {a:?} vs {b:?}"),
                }
            }
            assert!(batch[3].is_err());
        }
    }

    #[test]
    fn test_unique_seeds_keeps_first_occurrence_order() {
        assert_eq!(unique_seeds(&[4, 1, 4, 2, 1]), vec![4, 1, 2]);
    }
}
