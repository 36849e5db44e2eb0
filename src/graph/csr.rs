//! Compressed Sparse Row (CSR) graph representation
//!
//! CSR is optimized for iteration over neighbors, which is exactly what both
//! local engines need: a push touches the out-edges of one node, and the
//! proximal solver's mat-vec scatters along the rows of its current support.

use rustc_hash::FxHashMap;

use super::builder::GraphBuilder;
use crate::{Error, Result};

/// A graph in Compressed Sparse Row format
///
/// Node `i`'s out-edges are `col_idx[row_ptr[i]..row_ptr[i + 1]]`, with the
/// matching entries of `weights` when the graph is weighted. The structure is
/// immutable once built and is safe to share across threads.
#[derive(Debug, Clone)]
pub struct CsrGraph {
    /// Number of nodes
    pub num_nodes: usize,
    /// Row pointers: node i's edges are at indices row_ptr[i]..row_ptr[i+1]
    pub row_ptr: Vec<usize>,
    /// Column indices (target nodes) for each edge
    pub col_idx: Vec<u32>,
    /// Edge weights, aligned with `col_idx`
    pub weights: Option<Vec<f64>>,
    /// Out-degree for each node
    pub out_degree: Vec<u32>,
    /// Total outgoing weight for each node (equals `out_degree` when unweighted)
    pub total_weight: Vec<f64>,
}

impl CsrGraph {
    /// Build a graph from raw CSR arrays, checking the structural invariants
    ///
    /// - `row_ptr` is non-empty, starts at 0 and never decreases
    /// - `row_ptr[n] == col_idx.len()`
    /// - every column index is in `[0, n)`
    /// - `weights`, when given, has one finite, non-negative entry per edge
    pub fn from_csr(
        row_ptr: Vec<usize>,
        col_idx: Vec<u32>,
        weights: Option<Vec<f64>>,
    ) -> Result<Self> {
        let num_nodes = match row_ptr.len() {
            0 => return Err(Error::InvalidGraph("row_ptr must have n + 1 entries".into())),
            len => len - 1,
        };

        if row_ptr[0] != 0 {
            return Err(Error::InvalidGraph(format!(
                "row_ptr[0] must be 0, found {}",
                row_ptr[0]
            )));
        }
        if let Some(i) = row_ptr.windows(2).position(|w| w[0] > w[1]) {
            return Err(Error::InvalidGraph(format!(
                "row_ptr decreases between entries {} and {}",
                i,
                i + 1
            )));
        }
        if row_ptr[num_nodes] != col_idx.len() {
            return Err(Error::InvalidGraph(format!(
                "row_ptr[n] = {} but there are {} column indices",
                row_ptr[num_nodes],
                col_idx.len()
            )));
        }
        if let Some(&c) = col_idx.iter().find(|&&c| c as usize >= num_nodes) {
            return Err(Error::InvalidGraph(format!(
                "column index {c} out of range for {num_nodes} nodes"
            )));
        }
        if let Some(w) = &weights {
            if w.len() != col_idx.len() {
                return Err(Error::InvalidGraph(format!(
                    "{} edge weights for {} edges",
                    w.len(),
                    col_idx.len()
                )));
            }
            if let Some(i) = w.iter().position(|x| !x.is_finite() || *x < 0.0) {
                return Err(Error::InvalidGraph(format!(
                    "edge weight {} at position {i} must be finite and non-negative",
                    w[i]
                )));
            }
        }

        let out_degree: Vec<u32> = row_ptr.windows(2).map(|w| (w[1] - w[0]) as u32).collect();
        let total_weight = match &weights {
            Some(w) => row_ptr.windows(2).map(|r| w[r[0]..r[1]].iter().sum()).collect(),
            None => out_degree.iter().map(|&d| d as f64).collect(),
        };

        Ok(Self {
            num_nodes,
            row_ptr,
            col_idx,
            weights,
            out_degree,
            total_weight,
        })
    }

    /// Convert a GraphBuilder into CSR format
    ///
    /// Weights are stored only if some edge weight differs from 1.0.
    pub fn from_builder(builder: &GraphBuilder) -> Self {
        let num_nodes = builder.node_count();
        let mut row_ptr = Vec::with_capacity(num_nodes + 1);
        let mut col_idx = Vec::new();
        let mut weights = Vec::new();
        let mut out_degree = Vec::with_capacity(num_nodes);
        let mut total_weight = Vec::with_capacity(num_nodes);

        row_ptr.push(0);

        for (_, edges) in builder.nodes() {
            // Collect and sort edges for deterministic iteration
            let mut edges: Vec<_> = edges.iter().map(|(&k, &v)| (k, v)).collect();
            edges.sort_by_key(|(k, _)| *k);

            out_degree.push(edges.len() as u32);
            total_weight.push(edges.iter().map(|(_, w)| w).sum());

            for (target, weight) in edges {
                col_idx.push(target);
                weights.push(weight);
            }

            row_ptr.push(col_idx.len());
        }

        let weights = if weights.iter().any(|&w| w != 1.0) {
            Some(weights)
        } else {
            None
        };

        Self {
            num_nodes,
            row_ptr,
            col_idx,
            weights,
            out_degree,
            total_weight,
        }
    }

    /// Iterate over out-neighbors of a node with their edge weights
    ///
    /// Unweighted graphs report a weight of 1.0 for every edge.
    pub fn neighbors(&self, node: u32) -> impl Iterator<Item = (u32, f64)> + '_ {
        let start = self.row_ptr[node as usize];
        let end = self.row_ptr[node as usize + 1];
        let weights = self.weights.as_deref();
        (start..end).map(move |i| (self.col_idx[i], weights.map_or(1.0, |w| w[i])))
    }

    /// Get the out-degree of a node
    pub fn degree(&self, node: u32) -> u32 {
        self.out_degree[node as usize]
    }

    /// Whether explicit edge weights are stored
    pub fn is_weighted(&self) -> bool {
        self.weights.is_some()
    }

    /// Check if the graph is empty
    pub fn is_empty(&self) -> bool {
        self.num_nodes == 0
    }

    /// Get the number of stored (directed) edge entries
    pub fn num_edges(&self) -> usize {
        self.col_idx.len()
    }

    /// Whether `node` is a valid id for this graph
    pub fn contains(&self, node: u32) -> bool {
        (node as usize) < self.num_nodes
    }

    /// First stored edge `u -> v` (in row order) without a matching `v -> u`
    ///
    /// With `weighted` the two directions must also carry the same total
    /// weight up to rounding. Repeated entries of one pair are summed.
    pub fn first_asymmetric_edge(&self, weighted: bool) -> Option<(u32, u32)> {
        let mut pairs: FxHashMap<(u32, u32), f64> = FxHashMap::default();
        for u in 0..self.num_nodes as u32 {
            for (v, w) in self.neighbors(u) {
                *pairs.entry((u, v)).or_insert(0.0) += if weighted { w } else { 1.0 };
            }
        }

        (0..self.num_nodes as u32)
            .flat_map(|u| self.neighbors(u).map(move |(v, _)| (u, v)))
            .find(|&(u, v)| {
                let forward = pairs.get(&(u, v)).copied().unwrap_or(0.0);
                match pairs.get(&(v, u)) {
                    None => true,
                    Some(&back) => {
                        (forward - back).abs() > 1e-12 * forward.abs().max(back.abs())
                    }
                }
            })
    }
}

impl Default for CsrGraph {
    fn default() -> Self {
        Self {
            num_nodes: 0,
            row_ptr: vec![0],
            col_idx: Vec::new(),
            weights: None,
            out_degree: Vec::new(),
            total_weight: Vec::new(),
        }
    }
}
