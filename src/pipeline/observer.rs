//! Solver observer: hooks for logging, profiling and debugging.
//!
//! Observers receive notifications from inside the engines without coupling
//! to engine logic. Use cases include checking invariants after every push,
//! recording the objective trace of the proximal solver, and timing runs.
//!
//! All hooks have empty default bodies, so an observer only implements what
//! it needs. [`NoopObserver`] is zero-sized and compiles away entirely.

use std::time::Duration;

use serde::Serialize;

use crate::pagerank::Method;
use crate::sparse::SparseVec;

/// Summary of a finished engine run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolveReport {
    pub method: Method,
    pub iterations: usize,
    pub converged: bool,
    pub support_len: usize,
    #[serde(serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64() * 1e3)
}

/// Hooks invoked by the engines.
pub trait SolverObserver {
    /// After each ACL push of `node`, with the current estimate and residual.
    fn on_push(&mut self, _node: u32, _estimate: &SparseVec, _residual: &SparseVec) {}

    /// After each proximal-gradient iteration (and once for iteration 0, the
    /// starting point), with the objective value of `solution`.
    ///
    /// `solution` is in the solver's internal degree-normalized units.
    fn on_iteration(&mut self, _iteration: usize, _objective: f64, _solution: &SparseVec) {}

    /// Once per run, after the stopping rule or the budget ended it.
    fn on_finish(&mut self, _report: &SolveReport) {}
}

/// Observer that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl SolverObserver for NoopObserver {}

/// Observer that keeps every [`SolveReport`] it sees.
#[derive(Debug, Clone, Default)]
pub struct TimingObserver {
    pub reports: Vec<SolveReport>,
}

impl TimingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total wall-clock time across recorded runs
    pub fn total(&self) -> Duration {
        self.reports.iter().map(|r| r.elapsed).sum()
    }
}

impl SolverObserver for TimingObserver {
    fn on_finish(&mut self, report: &SolveReport) {
        self.reports.push(report.clone());
    }
}

impl<O: SolverObserver + ?Sized> SolverObserver for &mut O {
    fn on_push(&mut self, node: u32, estimate: &SparseVec, residual: &SparseVec) {
        (**self).on_push(node, estimate, residual);
    }

    fn on_iteration(&mut self, iteration: usize, objective: f64, solution: &SparseVec) {
        (**self).on_iteration(iteration, objective, solution);
    }

    fn on_finish(&mut self, report: &SolveReport) {
        (**self).on_finish(report);
    }
}
