//! l1-regularized PageRank via accelerated proximal gradient (FISTA)
//!
//! Solves
//!
//! ```text
//! min_q  F(q) = ½ qᵀQq − ⟨b, q⟩ + rho·alpha·Σ d_sqrt[i]·|q[i]|
//!
//! Q = (1+alpha)/2 · I − (1−alpha)/2 · D^{-1/2} A D^{-1/2}
//! b = alpha · D^{-1/2} s
//! ```
//!
//! where `s` is the uniform distribution over the seeds, and reports
//! `p = D^{1/2} q`. For a symmetric adjacency the spectrum of `Q` lies in
//! `[alpha, 1]`, so a unit step is admissible and the momentum uses the
//! strongly convex constant `(1 − √alpha) / (1 + √alpha)`.
//!
//! `Q` is never formed. Products scatter from the nonzero entries of the
//! iterate into their one-hop neighborhood, and the soft-threshold step only
//! visits the gradient's support, so an iteration costs time proportional to
//! the edges around the current support.

use super::budget::Budget;
use super::{LocalPageRank, LocalPageRankResult, Method};
use crate::graph::view::{DegreeVectors, GraphView};
use crate::pipeline::observer::{SolveReport, SolverObserver};
use crate::pipeline::spec::PprSpec;
use crate::sparse::SparseVec;

/// Proximal-gradient solver for l1-regularized PageRank
#[derive(Debug, Clone)]
pub struct ProxL1Solver {
    /// Teleportation probability
    pub alpha: f64,
    /// l1 regularization strength
    pub rho: f64,
    /// Relative tolerance on the optimality condition
    pub epsilon: f64,
    /// Maximum number of outer iterations
    pub max_iterations: usize,
    /// Wall-clock limit in seconds
    pub max_time: f64,
    /// Initial solution in output (probability) units
    warm_start: Option<SparseVec>,
}

impl Default for ProxL1Solver {
    fn default() -> Self {
        Self {
            alpha: 0.15,
            rho: 1.0e-6,
            epsilon: 1.0e-2,
            max_iterations: 100_000,
            max_time: 100.0,
            warm_start: None,
        }
    }
}

impl ProxL1Solver {
    /// Create a new ProxL1Solver with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Take alpha, rho, epsilon, iterations and timeout from a request
    pub fn from_spec(spec: &PprSpec) -> Self {
        Self {
            alpha: spec.alpha,
            rho: spec.rho,
            epsilon: spec.epsilon,
            max_iterations: spec.iterations,
            max_time: spec.timeout,
            warm_start: None,
        }
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

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_max_time(mut self, max_time: f64) -> Self {
        self.max_time = max_time;
        self
    }

    /// Start from a previous solution instead of zero
    ///
    /// The vector is in the same units as the solver's output.
    pub fn with_warm_start(mut self, warm_start: SparseVec) -> Self {
        self.warm_start = Some(warm_start);
        self
    }

    /// Objective value of an output-unit vector `p`
    pub fn objective(&self, view: GraphView<'_>, seeds: &[u32], p: &SparseVec) -> f64 {
        let degrees = view.degrees;
        let b = self.linear_term(degrees, seeds);
        let q: SparseVec = p
            .iter()
            .map(|(i, v)| (i, v * degrees.dn_sqrt[i as usize]))
            .collect();
        let mut qq = SparseVec::new();
        apply_q(view, self.alpha, &q, &mut qq);
        objective(&q, &qq, &b, degrees, self.rho * self.alpha)
    }

    fn linear_term(&self, degrees: &DegreeVectors, seeds: &[u32]) -> SparseVec {
        if seeds.is_empty() {
            return SparseVec::new();
        }
        let share = 1.0 / seeds.len() as f64;
        seeds
            .iter()
            .map(|&s| (s, self.alpha * degrees.dn_sqrt[s as usize] * share))
            .collect()
    }
}

impl LocalPageRank for ProxL1Solver {
    fn method(&self) -> Method {
        Method::L1Reg
    }

    fn compute<O: SolverObserver>(
        &self,
        view: GraphView<'_>,
        seeds: &[u32],
        observer: &mut O,
    ) -> LocalPageRankResult {
        let degrees = view.degrees;
        let ra = self.rho * self.alpha;
        let sqrt_alpha = self.alpha.sqrt();
        let beta = (1.0 - sqrt_alpha) / (1.0 + sqrt_alpha);
        let mut budget = Budget::new(self.max_iterations, self.max_time);

        let b = self.linear_term(degrees, seeds);
        let tolerance = stopping_tolerance(ra, self.epsilon, &b, degrees);

        let mut q_prev = SparseVec::new();
        if let Some(ws) = &self.warm_start {
            for (i, v) in ws.iter() {
                let scaled = v * degrees.dn_sqrt[i as usize];
                if scaled != 0.0 {
                    q_prev.set(i, scaled);
                }
            }
        }
        let mut qq_prev = SparseVec::new();
        apply_q(view, self.alpha, &q_prev, &mut qq_prev);
        let mut f_prev = objective(&q_prev, &qq_prev, &b, degrees, ra);

        // y is the extrapolated point, qy = Q y
        let mut y = q_prev.clone();
        let mut qy = qq_prev.clone();
        let mut q_new = SparseVec::new();
        let mut qq_new = SparseVec::new();
        let mut grad = SparseVec::new();

        let mut delta = optimality_gap(&qq_prev, &b, degrees);
        let mut converged = false;
        observer.on_iteration(0, f_prev, &q_prev);

        loop {
            if delta <= tolerance {
                converged = true;
                break;
            }
            if budget.exhausted() {
                break;
            }
            budget.charge();

            gradient(&qy, &b, &mut grad);
            prox_step(&y, &grad, degrees, ra, &mut q_new);
            apply_q(view, self.alpha, &q_new, &mut qq_new);
            let mut f_new = objective(&q_new, &qq_new, &b, degrees, ra);

            // Momentum made things worse: fall back to a plain proximal step
            // from the previous solution, which cannot increase F.
            let restarted = f_new > f_prev;
            if restarted {
                #[cfg(feature = "tracing")]
                tracing::debug!(iteration = budget.steps(), "fista momentum restart");

                gradient(&qq_prev, &b, &mut grad);
                prox_step(&q_prev, &grad, degrees, ra, &mut q_new);
                apply_q(view, self.alpha, &q_new, &mut qq_new);
                f_new = objective(&q_new, &qq_new, &b, degrees, ra);
            }

            let momentum = if restarted { 0.0 } else { beta };
            extrapolate(&q_new, &q_prev, momentum, &mut y);
            extrapolate(&qq_new, &qq_prev, momentum, &mut qy);

            std::mem::swap(&mut q_prev, &mut q_new);
            std::mem::swap(&mut qq_prev, &mut qq_new);
            f_prev = f_new;
            delta = optimality_gap(&qq_prev, &b, degrees);

            observer.on_iteration(budget.steps(), f_prev, &q_prev);
        }

        #[cfg(feature = "tracing")]
        if !converged {
            tracing::debug!(
                iterations = budget.steps(),
                delta,
                tolerance,
                "fista stopped before reaching tolerance"
            );
        }

        let support = q_prev
            .iter()
            .map(|(i, v)| (i, v * degrees.d_sqrt[i as usize]))
            .collect::<SparseVec>()
            .support();

        observer.on_finish(&SolveReport {
            method: Method::L1Reg,
            iterations: budget.steps(),
            converged,
            support_len: support.len(),
            elapsed: budget.elapsed(),
        });

        LocalPageRankResult::new(support, budget.steps(), delta, converged)
    }
}

/// `out = Q x`, touching only the support of `x` and its neighbors
///
/// Products scatter along stored rows, i.e. compute `Aᵀx`; this equals `Ax`
/// for the symmetric adjacency the solver assumes.
fn apply_q(view: GraphView<'_>, alpha: f64, x: &SparseVec, out: &mut SparseVec) {
    out.clear();
    let dn = &view.degrees.dn_sqrt;
    let diag = 0.5 * (1.0 + alpha);
    let off = 0.5 * (1.0 - alpha);
    for (i, xi) in x.iter() {
        if xi == 0.0 {
            continue;
        }
        out.add(i, diag * xi);
        let scaled = off * dn[i as usize] * xi;
        if scaled == 0.0 {
            continue;
        }
        for (j, w) in view.neighbors(i) {
            out.add(j, -scaled * w * dn[j as usize]);
        }
    }
}

/// `out = Qx − b` given `qx = Qx`
fn gradient(qx: &SparseVec, b: &SparseVec, out: &mut SparseVec) {
    out.clear();
    for (i, v) in qx.iter() {
        out.add(i, v);
    }
    for (i, bi) in b.iter() {
        out.add(i, -bi);
    }
}

/// Soft-threshold `y − grad` with per-coordinate threshold `ra·d_sqrt[i]`
fn prox_step(
    y: &SparseVec,
    grad: &SparseVec,
    degrees: &DegreeVectors,
    ra: f64,
    out: &mut SparseVec,
) {
    out.clear();
    let mut shrink = |i: u32, z: f64| {
        let t = ra * degrees.d_sqrt[i as usize];
        if z > t {
            out.set(i, z - t);
        } else if z < -t {
            out.set(i, z + t);
        }
    };
    for (i, g) in grad.iter() {
        shrink(i, y.get(i) - g);
    }
    for (i, yi) in y.iter() {
        if !grad.contains(i) {
            shrink(i, yi);
        }
    }
}

/// `out = (1 + beta)·a − beta·b`
fn extrapolate(a: &SparseVec, b: &SparseVec, beta: f64, out: &mut SparseVec) {
    out.clear();
    for (i, v) in a.iter() {
        out.add(i, (1.0 + beta) * v);
    }
    if beta != 0.0 {
        for (i, v) in b.iter() {
            out.add(i, -beta * v);
        }
    }
}

fn objective(q: &SparseVec, qq: &SparseVec, b: &SparseVec, degrees: &DegreeVectors, ra: f64) -> f64 {
    q.iter()
        .map(|(i, qi)| {
            0.5 * qi * qq.get(i) - b.get(i) * qi + ra * degrees.d_sqrt[i as usize] * qi.abs()
        })
        .sum()
}

/// Threshold for [`optimality_gap`]: `(1 + epsilon)·ra`, but never closer
/// to `ra` than the rounding noise of the gradient, which scales with `b`
fn stopping_tolerance(ra: f64, epsilon: f64, b: &SparseVec, degrees: &DegreeVectors) -> f64 {
    let b_scale = b
        .iter()
        .map(|(i, bi)| bi.abs() * degrees.dn_sqrt[i as usize])
        .fold(0.0, f64::max);
    ((1.0 + epsilon) * ra).max(ra + 64.0 * f64::EPSILON * b_scale)
}

/// `max_i |(Qq − b)_i| / d_sqrt[i]` over non-isolated nodes
///
/// At the optimum this equals `rho·alpha` on the support and is at most that
/// elsewhere.
fn optimality_gap(qq: &SparseVec, b: &SparseVec, degrees: &DegreeVectors) -> f64 {
    let scaled = |i: u32, g: f64| g.abs() * degrees.dn_sqrt[i as usize];
    let on_support = qq
        .iter()
        .map(|(i, v)| scaled(i, v - b.get(i)))
        .fold(0.0, f64::max);
    b.iter()
        .filter(|&(i, _)| !qq.contains(i))
        .map(|(i, bi)| scaled(i, bi))
        .fold(on_support, f64::max)
}
