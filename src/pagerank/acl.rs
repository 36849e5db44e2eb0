//! Andersen–Chung–Lang (ACL) local push
//!
//! Keeps a residual `r` and an estimate `p`. The seeds start with residual
//! `1/|S|` each. A node `v` is active while `r[v] > rho * d[v]`; pushing it
//! moves `alpha * r[v]` into `p[v]` and spreads the rest over its
//! out-neighbors in proportion to edge weight. Only active nodes and their
//! neighbors are ever touched, so the work is independent of graph size.
//!
//! Every push conserves `sum(p) + sum(r)`, and both vectors stay
//! non-negative.

use std::collections::VecDeque;

use rustc_hash::FxHashSet;

use super::budget::Budget;
use super::{LocalPageRank, LocalPageRankResult, Method};
use crate::graph::view::GraphView;
use crate::pipeline::observer::{SolveReport, SolverObserver};
use crate::pipeline::spec::PprSpec;
use crate::sparse::SparseVec;

/// Order in which active nodes are pushed.
///
/// The final vector depends on the order only within the approximation
/// guarantee (every order ends with `r[v] <= rho * d[v]` everywhere).
pub trait Frontier {
    fn push(&mut self, node: u32);
    fn pop(&mut self) -> Option<u32>;
    fn is_empty(&self) -> bool;
}

/// First-in first-out queue of active nodes (the default)
#[derive(Debug, Clone, Default)]
pub struct FifoFrontier(VecDeque<u32>);

impl Frontier for FifoFrontier {
    fn push(&mut self, node: u32) {
        self.0.push_back(node);
    }

    fn pop(&mut self) -> Option<u32> {
        self.0.pop_front()
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Last-in first-out stack of active nodes
#[derive(Debug, Clone, Default)]
pub struct LifoFrontier(Vec<u32>);

impl Frontier for LifoFrontier {
    fn push(&mut self, node: u32) {
        self.0.push(node);
    }

    fn pop(&mut self) -> Option<u32> {
        self.0.pop()
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// ACL push engine
#[derive(Debug, Clone)]
pub struct AclPush {
    /// Teleportation probability
    pub alpha: f64,
    /// Degree-normalized residual threshold
    pub rho: f64,
    /// Maximum number of pushes
    pub max_iterations: usize,
    /// Wall-clock limit in seconds
    pub max_time: f64,
}

impl Default for AclPush {
    fn default() -> Self {
        Self {
            alpha: 0.15,
            rho: 1.0e-6,
            max_iterations: 100_000,
            max_time: 100.0,
        }
    }
}

impl AclPush {
    /// Create a new AclPush with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Take alpha, rho, iterations and timeout from a request
    pub fn from_spec(spec: &PprSpec) -> Self {
        Self {
            alpha: spec.alpha,
            rho: spec.rho,
            max_iterations: spec.iterations,
            max_time: spec.timeout,
        }
    }

    /// Set the teleportation probability
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Set the residual threshold
    pub fn with_rho(mut self, rho: f64) -> Self {
        self.rho = rho;
        self
    }

    /// Set the maximum number of pushes
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the wall-clock limit in seconds
    pub fn with_max_time(mut self, max_time: f64) -> Self {
        self.max_time = max_time;
        self
    }

    /// Run the push loop with a caller-chosen activation order
    ///
    /// `frontier` should be empty on entry.
    pub fn compute_with_frontier<F: Frontier, O: SolverObserver>(
        &self,
        view: GraphView<'_>,
        seeds: &[u32],
        frontier: &mut F,
        observer: &mut O,
    ) -> LocalPageRankResult {
        let mut budget = Budget::new(self.max_iterations, self.max_time);
        let mut estimate = SparseVec::with_capacity(seeds.len() * 4);
        let mut residual = SparseVec::with_capacity(seeds.len() * 16);
        let mut queued: FxHashSet<u32> = FxHashSet::default();

        if !seeds.is_empty() {
            let share = 1.0 / seeds.len() as f64;
            for &s in seeds {
                residual.add(s, share);
            }
        }
        for &s in seeds {
            if self.is_active(view, s, residual.get(s)) && queued.insert(s) {
                frontier.push(s);
            }
        }

        let keep = 1.0 - self.alpha;
        while !frontier.is_empty() && !budget.exhausted() {
            let Some(v) = frontier.pop() else { break };
            queued.remove(&v);
            if !self.is_active(view, v, residual.get(v)) {
                continue;
            }

            let mass = residual.take(v);
            estimate.add(v, self.alpha * mass);
            let spread = keep * mass / view.degree(v);
            for (u, w) in view.neighbors(v) {
                let ru = residual.add(u, spread * w);
                if !queued.contains(&u) && self.is_active(view, u, ru) {
                    queued.insert(u);
                    frontier.push(u);
                }
            }

            budget.charge();
            observer.on_push(v, &estimate, &residual);
        }

        let converged = frontier.is_empty();
        let delta = residual
            .iter()
            .filter(|&(v, _)| view.degree(v) > 0.0)
            .map(|(v, r)| r.max(0.0) / view.degree(v))
            .fold(0.0, f64::max);

        #[cfg(feature = "tracing")]
        if !converged {
            tracing::debug!(
                pushes = budget.steps(),
                delta,
                "acl push stopped before the residual fell below rho"
            );
        }

        let support = estimate.support();
        observer.on_finish(&SolveReport {
            method: Method::Acl,
            iterations: budget.steps(),
            converged,
            support_len: support.len(),
            elapsed: budget.elapsed(),
        });

        LocalPageRankResult::new(support, budget.steps(), delta, converged)
    }

    /// `r[v] > rho * d[v]`; isolated nodes are never active
    #[inline]
    fn is_active(&self, view: GraphView<'_>, node: u32, residual: f64) -> bool {
        let d = view.degree(node);
        d > 0.0 && residual.max(0.0) > self.rho * d
    }
}

impl LocalPageRank for AclPush {
    fn method(&self) -> Method {
        Method::Acl
    }

    fn compute<O: SolverObserver>(
        &self,
        view: GraphView<'_>,
        seeds: &[u32],
        observer: &mut O,
    ) -> LocalPageRankResult {
        self.compute_with_frontier(view, seeds, &mut FifoFrontier::default(), observer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::builder::GraphBuilder;
    use crate::graph::csr::CsrGraph;
    use crate::graph::view::DegreeVectors;
    use crate::pipeline::observer::NoopObserver;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn directed_cycle() -> CsrGraph {
        CsrGraph::from_csr(vec![0, 1, 2, 3, 4], vec![1, 2, 3, 0], None).unwrap()
    }

    /// Two triangles {0,1,2} and {3,4,5} joined by the edge 2-3.
    fn barbell() -> CsrGraph {
        GraphBuilder::from_undirected_edges(
            6,
            &[(0, 1), (1, 2), (0, 2), (2, 3), (3, 4), (4, 5), (3, 5)],
        )
        .build()
    }

    fn grid(side: u32) -> CsrGraph {
        let mut edges = Vec::new();
        for r in 0..side {
            for c in 0..side {
                let v = r * side + c;
                if c + 1 < side {
                    edges.push((v, v + 1));
                }
                if r + 1 < side {
                    edges.push((v, v + side));
                }
            }
        }
        GraphBuilder::from_undirected_edges((side * side) as usize, &edges).build()
    }

    fn run(graph: &CsrGraph, seeds: &[u32], acl: &AclPush) -> LocalPageRankResult {
        let degrees = DegreeVectors::from_graph(graph, false);
        acl.compute(GraphView::new(graph, &degrees, false), seeds, &mut NoopObserver)
    }

    /// Checks mass conservation and sign after every push.
    #[derive(Default)]
    struct InvariantObserver {
        pushes: usize,
        worst_mass_error: f64,
        min_value: f64,
    }

    impl SolverObserver for InvariantObserver {
        fn on_push(&mut self, _node: u32, estimate: &SparseVec, residual: &SparseVec) {
            self.pushes += 1;
            let mass = estimate.sum() + residual.sum();
            self.worst_mass_error = self.worst_mass_error.max((mass - 1.0).abs());
            self.min_value = self
                .min_value
                .min(estimate.min_value())
                .min(residual.min_value());
        }
    }

    struct RandomFrontier {
        items: Vec<u32>,
        rng: StdRng,
    }

    impl Frontier for RandomFrontier {
        fn push(&mut self, node: u32) {
            self.items.push(node);
        }

        fn pop(&mut self) -> Option<u32> {
            if self.items.is_empty() {
                return None;
            }
            let i = self.rng.gen_range(0..self.items.len());
            Some(self.items.swap_remove(i))
        }

        fn is_empty(&self) -> bool {
            self.items.is_empty()
        }
    }

    #[test]
    fn test_directed_cycle_closed_form() {
        let graph = directed_cycle();
        let alpha = 0.15;
        let rho = 1e-4;
        let result = run(&graph, &[0], &AclPush::new().with_alpha(alpha).with_rho(rho));

        // On a cycle with unit degrees only one node is ever active, so the
        // k-th push moves (1-alpha)^k from node k mod 4.
        let keep = 1.0 - alpha;
        let mut expected = [0.0; 4];
        let mut mass: f64 = 1.0;
        let mut pushes = 0;
        while mass > rho {
            expected[pushes % 4] += alpha * mass;
            mass = keep * mass / 1.0;
            pushes += 1;
        }

        assert!(result.converged);
        assert_eq!(pushes, 57);
        assert_eq!(result.iterations, pushes);
        let dense = result.to_dense(4);
        for v in 0..4 {
            assert_relative_eq!(dense[v], expected[v], max_relative = 1e-12);
        }
        assert_eq!(result.support[0].0, 0);
        assert!(dense[0] > dense[1] && dense[1] > dense[2] && dense[2] > dense[3]);
    }

    #[test]
    fn test_directed_cycle_large_rho_strict_subset() {
        let graph = directed_cycle();
        let result = run(&graph, &[0], &AclPush::new().with_alpha(0.15).with_rho(0.7));

        assert!(result.converged);
        assert_eq!(result.iterations, 3);
        let nodes: Vec<u32> = result.support.iter().map(|&(v, _)| v).collect();
        assert_eq!(nodes, vec![0, 1, 2]);
        assert_relative_eq!(result.score(0), 0.15, max_relative = 1e-12);
    }

    #[test]
    fn test_mass_conservation_and_non_negativity() {
        let graph = grid(6);
        let degrees = DegreeVectors::from_graph(&graph, false);
        let mut obs = InvariantObserver::default();
        let result = AclPush::new().with_rho(1e-5).compute(
            GraphView::new(&graph, &degrees, false),
            &[0, 14, 35],
            &mut obs,
        );

        assert!(result.converged);
        assert_eq!(obs.pushes, result.iterations);
        assert!(obs.worst_mass_error < 1e-10);
        assert!(obs.min_value >= 0.0);
        assert!(result.support.iter().all(|&(_, s)| s > 0.0));
    }

    #[test]
    fn test_residual_below_threshold_at_convergence() {
        let graph = barbell();
        let rho = 1e-3;
        let result = run(&graph, &[0], &AclPush::new().with_rho(rho));

        assert!(result.converged);
        assert!(result.delta <= rho * (1.0 + 1e-12));
    }

    #[test]
    fn test_reproducible_push_count_and_bitwise_determinism() {
        let graph = grid(5);
        let acl = AclPush::new().with_rho(1e-4);
        let a = run(&graph, &[12], &acl);
        let b = run(&graph, &[12], &acl);

        assert_eq!(a.iterations, b.iterations);
        assert_eq!(a.support.len(), b.support.len());
        for (x, y) in a.support.iter().zip(&b.support) {
            assert_eq!(x.0, y.0);
            assert_eq!(x.1.to_bits(), y.1.to_bits());
        }
    }

    #[test]
    fn test_activation_order_agrees_within_guarantee() {
        let graph = grid(6);
        let rho = 1e-4;
        let acl = AclPush::new().with_rho(rho);
        let degrees = DegreeVectors::from_graph(&graph, false);
        let view = GraphView::new(&graph, &degrees, false);
        let volume: f64 = degrees.d.iter().sum();

        let fifo = acl.compute(view, &[7], &mut NoopObserver).to_dense(36);
        let lifo = acl
            .compute_with_frontier(view, &[7], &mut LifoFrontier::default(), &mut NoopObserver)
            .to_dense(36);

        let mut orders = vec![lifo];
        for seed in 0..8u64 {
            let mut frontier = RandomFrontier {
                items: Vec::new(),
                rng: StdRng::seed_from_u64(seed),
            };
            let result = acl.compute_with_frontier(view, &[7], &mut frontier, &mut NoopObserver);
            assert!(result.converged);
            orders.push(result.to_dense(36));
        }

        // Each run equals ppr(s) - ppr(r) with 0 <= r <= rho * d, so two runs
        // differ by at most 2 * rho * vol(G) in l1.
        for other in &orders {
            let l1: f64 = fifo.iter().zip(other).map(|(a, b)| (a - b).abs()).sum();
            assert!(l1 <= 2.0 * rho * volume, "l1 gap {l1}");
            let argmax = other
                .iter()
                .enumerate()
                .fold((0, f64::MIN), |acc, (i, &x)| if x > acc.1 { (i, x) } else { acc });
            assert_eq!(argmax.0, 7);
        }
    }

    #[test]
    fn test_iteration_cap_returns_partial() {
        let graph = barbell();
        let result = run(&graph, &[0], &AclPush::new().with_rho(1e-8).with_max_iterations(1));

        assert!(!result.converged);
        assert_eq!(result.iterations, 1);
        assert_eq!(result.support, vec![(0, 0.15)]);
    }

    #[test]
    fn test_timeout_returns_partial() {
        let graph = grid(10);
        let result = run(&graph, &[0], &AclPush::new().with_rho(1e-12).with_max_time(0.0));

        assert!(!result.converged);
        assert_eq!(result.iterations, 0);
        assert!(result.support.is_empty());
    }

    #[test]
    fn test_isolated_seed_is_never_pushed() {
        let graph = GraphBuilder::from_undirected_edges(3, &[(0, 1)]).build();
        let result = run(&graph, &[2], &AclPush::new());

        assert!(result.converged);
        assert_eq!(result.iterations, 0);
        assert!(result.support.is_empty());
    }

    #[test]
    fn test_self_loop_returns_mass() {
        let mut builder = GraphBuilder::with_nodes(2);
        builder.add_edge(0, 0, 1.0);
        builder.add_edge(0, 1, 1.0);
        let graph = builder.build();
        let degrees = DegreeVectors::from_graph(&graph, false);
        let mut obs = InvariantObserver::default();
        let result =
            AclPush::new()
                .with_rho(1e-6)
                .compute(GraphView::new(&graph, &degrees, false), &[0], &mut obs);

        assert!(result.converged);
        assert!(obs.worst_mass_error < 1e-10);
        // node 1 is dangling, so its residual is never pushed
        assert_eq!(result.score(1), 0.0);
        assert!(result.score(0) > 0.15);
    }

    #[test]
    fn test_weighted_push_follows_weights() {
        let mut builder = GraphBuilder::with_nodes(3);
        builder.add_undirected_edge(0, 1, 9.0);
        builder.add_undirected_edge(0, 2, 1.0);
        let graph = builder.build();
        let degrees = DegreeVectors::from_graph(&graph, true);
        let view = GraphView::new(&graph, &degrees, true);
        let full = AclPush::new().with_rho(1e-6).compute(view, &[0], &mut NoopObserver);
        assert!(full.score(1) > full.score(2));

        let unweighted_degrees = DegreeVectors::from_graph(&graph, false);
        let plain = AclPush::new().with_rho(1e-6).compute(
            GraphView::new(&graph, &unweighted_degrees, false),
            &[0],
            &mut NoopObserver,
        );
        assert_relative_eq!(plain.score(1), plain.score(2), max_relative = 1e-12);
    }

    #[test]
    fn test_multiple_seeds_split_mass() {
        let graph = GraphBuilder::from_undirected_edges(4, &[(0, 1), (2, 3)]).build();
        let result = run(&graph, &[0, 2], &AclPush::new().with_rho(1e-8));

        assert_relative_eq!(result.score(0), result.score(2), max_relative = 1e-12);
        assert!(result.mass() > 0.99 && result.mass() <= 1.0 + 1e-12);
    }
}
