//! Validation engine for PageRank requests.
//!
//! The engine runs every registered [`ValidationRule`] against a
//! [`PprRequest`]. Rules write their findings into one shared
//! [`ValidationReport`], and nothing short-circuits, so a caller sees every
//! problem with a request at once.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use rapid_ppr::pipeline::validation::{PprRequest, ValidationEngine};
//!
//! let report = ValidationEngine::with_defaults()
//!     .validate(&PprRequest::new(&spec, method, &graph, &seeds));
//! for err in report.errors() {
//!     eprintln!("{err}");
//! }
//! ```

use rustc_hash::FxHashSet;
use serde::Serialize;

use super::error_code::ErrorCode;
use super::errors::PprSpecError;
use super::spec::PprSpec;
use crate::graph::csr::CsrGraph;
use crate::pagerank::Method;
use crate::sparse::SparseVec;

/// Whether a finding rejects the request or only reports on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

/// One finding with its severity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationDiagnostic {
    pub severity: Severity,
    #[serde(flatten)]
    pub error: PprSpecError,
}

/// Every finding for one request, in rule order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub diagnostics: Vec<ValidationDiagnostic>,
}

impl ValidationReport {
    pub fn push(&mut self, severity: Severity, error: PprSpecError) {
        self.diagnostics.push(ValidationDiagnostic { severity, error });
    }

    pub fn error(&mut self, error: PprSpecError) {
        self.push(Severity::Error, error);
    }

    pub fn warn(&mut self, error: PprSpecError) {
        self.push(Severity::Warning, error);
    }

    fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &PprSpecError> {
        self.diagnostics
            .iter()
            .filter(move |d| d.severity == severity)
            .map(|d| &d.error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &PprSpecError> {
        self.with_severity(Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &PprSpecError> {
        self.with_severity(Severity::Warning)
    }

    /// Any error-severity finding rejects the request
    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    /// Whether some finding, of either severity, carries `code`
    pub fn contains(&self, code: ErrorCode) -> bool {
        self.diagnostics.iter().any(|d| d.error.code == code)
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Errors only, separated by `; `
impl std::fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, err) in self.errors().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

/// Everything a rule may inspect about one call.
///
/// `method` is already parsed; an unknown name never reaches validation.
#[derive(Debug, Clone, Copy)]
pub struct PprRequest<'a> {
    pub spec: &'a PprSpec,
    pub method: Method,
    pub graph: &'a CsrGraph,
    pub seeds: &'a [u32],
    pub warm_start: Option<&'a SparseVec>,
}

impl<'a> PprRequest<'a> {
    pub fn new(spec: &'a PprSpec, method: Method, graph: &'a CsrGraph, seeds: &'a [u32]) -> Self {
        Self {
            spec,
            method,
            graph,
            seeds,
            warm_start: None,
        }
    }

    pub fn with_warm_start(mut self, warm_start: Option<&'a SparseVec>) -> Self {
        self.warm_start = warm_start;
        self
    }
}

/// A stateless check over a [`PprRequest`].
///
/// `Send + Sync` so one engine can serve parallel batch queries.
pub trait ValidationRule: Send + Sync {
    /// Stable identifier, e.g. `"seed_nodes"`
    fn name(&self) -> &str;

    fn check(&self, request: &PprRequest<'_>, report: &mut ValidationReport);
}

/// Ordered set of rules
pub struct ValidationEngine {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl ValidationEngine {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn with_defaults() -> Self {
        let mut engine = Self::new();
        engine.add_rule(Box::new(ParameterRangesRule));
        engine.add_rule(Box::new(SeedNodesRule));
        engine.add_rule(Box::new(WarmStartRule));
        engine.add_rule(Box::new(EdgeWeightsRule));
        engine.add_rule(Box::new(SymmetricAdjacencyRule));
        engine.add_rule(Box::new(UnknownFieldsRule));
        engine
    }

    pub fn add_rule(&mut self, rule: Box<dyn ValidationRule>) {
        self.rules.push(rule);
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn validate(&self, request: &PprRequest<'_>) -> ValidationReport {
        let mut report = ValidationReport::default();
        for rule in &self.rules {
            rule.check(request, &mut report);
        }
        report
    }
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// ─── parameter_ranges ───────────────────────────────────────────────────────

struct ParameterRangesRule;

impl ParameterRangesRule {
    fn out_of_range(field: &str, value: impl std::fmt::Display, expected: &str) -> PprSpecError {
        PprSpecError::new(
            ErrorCode::InvalidParameter,
            format!("/{field}"),
            format!("{field} = {value} is outside {expected}"),
        )
        .with_hint(format!("Set {field} to a value in {expected}"))
    }
}

impl ValidationRule for ParameterRangesRule {
    fn name(&self) -> &str {
        "parameter_ranges"
    }

    fn check(&self, request: &PprRequest<'_>, report: &mut ValidationReport) {
        let spec = request.spec;

        // Negated comparisons so NaN is rejected too.
        if !(spec.alpha > 0.0 && spec.alpha < 1.0) {
            report.error(Self::out_of_range("alpha", spec.alpha, "(0, 1)"));
        }
        if !(spec.rho > 0.0) {
            report.error(Self::out_of_range("rho", spec.rho, "(0, inf)"));
        }
        if request.method == Method::L1Reg && !(spec.epsilon > 0.0) {
            report.error(Self::out_of_range("epsilon", spec.epsilon, "(0, inf)"));
        }
        if spec.iterations == 0 {
            report.error(Self::out_of_range("iterations", spec.iterations, "[1, inf)"));
        }
        if !(spec.timeout > 0.0) {
            report.error(Self::out_of_range("timeout", spec.timeout, "(0, inf)"));
        }
    }
}

// ─── seed_nodes ─────────────────────────────────────────────────────────────

struct SeedNodesRule;

impl ValidationRule for SeedNodesRule {
    fn name(&self) -> &str {
        "seed_nodes"
    }

    fn check(&self, request: &PprRequest<'_>, report: &mut ValidationReport) {
        if request.seeds.is_empty() {
            report.error(
                PprSpecError::new(ErrorCode::EmptySeeds, "/seeds", "reference set is empty")
                    .with_hint("Pass at least one node id"),
            );
            return;
        }

        let n = request.graph.num_nodes;
        let mut seen = FxHashSet::default();
        for (i, &seed) in request.seeds.iter().enumerate() {
            if !request.graph.contains(seed) {
                report.error(
                    PprSpecError::new(
                        ErrorCode::NodeOutOfRange,
                        format!("/seeds/{i}"),
                        format!("seed {seed} is not a node of a graph with {n} nodes"),
                    )
                    .with_hint(format!("Node ids must be in [0, {n})")),
                );
            } else if !seen.insert(seed) {
                report.warn(PprSpecError::new(
                    ErrorCode::DuplicateSeed,
                    format!("/seeds/{i}"),
                    format!("seed {seed} is listed more than once; repeats are ignored"),
                ));
            }
        }
    }
}

// ─── warm_start ─────────────────────────────────────────────────────────────

struct WarmStartRule;

impl ValidationRule for WarmStartRule {
    fn name(&self) -> &str {
        "warm_start"
    }

    fn check(&self, request: &PprRequest<'_>, report: &mut ValidationReport) {
        let Some(warm_start) = request.warm_start else {
            return;
        };

        if request.method == Method::Acl {
            report.warn(
                PprSpecError::new(
                    ErrorCode::WarmStartIgnored,
                    "/warm_start",
                    "the acl method does not use a warm start",
                )
                .with_hint("Use method \"l1reg\" or drop the warm start"),
            );
            return;
        }

        let n = request.graph.num_nodes;
        let mut entries: Vec<(u32, f64)> = warm_start.iter().collect();
        entries.sort_unstable_by_key(|&(node, _)| node);

        for (node, value) in entries {
            if !request.graph.contains(node) {
                report.error(PprSpecError::new(
                    ErrorCode::NodeOutOfRange,
                    format!("/warm_start/{node}"),
                    format!("warm start entry {node} is not a node of a graph with {n} nodes"),
                ));
            } else if !value.is_finite() {
                report.error(PprSpecError::new(
                    ErrorCode::InvalidParameter,
                    format!("/warm_start/{node}"),
                    format!("warm start value {value} is not finite"),
                ));
            }
        }
    }
}

// ─── edge_weights ───────────────────────────────────────────────────────────

struct EdgeWeightsRule;

impl ValidationRule for EdgeWeightsRule {
    fn name(&self) -> &str {
        "edge_weights"
    }

    fn check(&self, request: &PprRequest<'_>, report: &mut ValidationReport) {
        if request.graph.is_weighted() && !request.spec.weighted {
            report.warn(
                PprSpecError::new(
                    ErrorCode::WeightsDiscarded,
                    "/weighted",
                    "graph has edge weights but the unweighted method was requested",
                )
                .with_hint("Set \"weighted\": true to use them"),
            );
        }
    }
}

// ─── symmetric_adjacency ────────────────────────────────────────────────────

/// The l1reg objective is only a convex quadratic, and its gradient only the
/// solver's step direction, when `A` equals `Aᵀ` under the chosen contract.
struct SymmetricAdjacencyRule;

impl ValidationRule for SymmetricAdjacencyRule {
    fn name(&self) -> &str {
        "symmetric_adjacency"
    }

    fn check(&self, request: &PprRequest<'_>, report: &mut ValidationReport) {
        if request.method != Method::L1Reg {
            return;
        }
        if let Some((u, v)) = request.graph.first_asymmetric_edge(request.spec.weighted) {
            report.error(
                PprSpecError::new(
                    ErrorCode::AsymmetricAdjacency,
                    format!("/graph/{u}/{v}"),
                    format!("edge {u} -> {v} has no matching {v} -> {u}"),
                )
                .with_hint("l1reg needs an undirected graph; use \"acl\" for directed graphs"),
            );
        }
    }
}

// ─── unknown_fields (strict → error, otherwise warning) ─────────────────────

struct UnknownFieldsRule;

impl ValidationRule for UnknownFieldsRule {
    fn name(&self) -> &str {
        "unknown_fields"
    }

    fn check(&self, request: &PprRequest<'_>, report: &mut ValidationReport) {
        let spec = request.spec;
        let severity = if spec.strict {
            Severity::Error
        } else {
            Severity::Warning
        };

        let mut keys: Vec<&String> = spec.unknown_fields.keys().collect();
        keys.sort();
        for key in keys {
            report.push(
                severity,
                PprSpecError::new(
                    ErrorCode::UnknownField,
                    format!("/{key}"),
                    format!("unrecognized field \"{key}\""),
                )
                .with_hint("Check spelling or remove this field"),
            );
        }
    }
}
