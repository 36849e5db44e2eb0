//! Graph builder with efficient edge handling
//!
//! This module provides a mutable graph builder that uses FxHashMap
//! for O(1) edge lookups during construction. Repeated edges accumulate
//! their weights, and self-loops are kept.

use rustc_hash::FxHashMap;

use super::csr::CsrGraph;

/// A mutable graph builder optimized for incremental construction
#[derive(Debug, Default)]
pub struct GraphBuilder {
    /// Per-node adjacency: target node ID -> edge weight
    nodes: Vec<FxHashMap<u32, f64>>,
}

impl GraphBuilder {
    /// Create a new empty graph builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a graph builder with `n` isolated nodes
    pub fn with_nodes(n: usize) -> Self {
        Self {
            nodes: vec![FxHashMap::default(); n],
        }
    }

    /// Build an undirected, unweighted graph from an edge list
    pub fn from_undirected_edges(n: usize, edges: &[(u32, u32)]) -> Self {
        let mut builder = Self::with_nodes(n);
        for &(a, b) in edges {
            builder.add_undirected_edge(a, b, 1.0);
        }
        builder
    }

    /// Append a new isolated node, returning its ID
    pub fn add_node(&mut self) -> u32 {
        self.nodes.push(FxHashMap::default());
        (self.nodes.len() - 1) as u32
    }

    /// Grow the node set so that `node` is a valid ID
    fn ensure_node(&mut self, node: u32) {
        if node as usize >= self.nodes.len() {
            self.nodes.resize_with(node as usize + 1, FxHashMap::default);
        }
    }

    /// Add `weight` to the directed edge `from -> to`
    pub fn add_edge(&mut self, from: u32, to: u32, weight: f64) {
        self.ensure_node(from.max(to));
        *self.nodes[from as usize].entry(to).or_insert(0.0) += weight;
    }

    /// Add `weight` to the edge in both directions
    ///
    /// A self-loop is stored once.
    pub fn add_undirected_edge(&mut self, a: u32, b: u32, weight: f64) {
        self.add_edge(a, b, weight);
        if a != b {
            self.add_edge(b, a, weight);
        }
    }

    /// Get the number of nodes in the graph
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get the number of stored directed edges
    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|n| n.len()).sum()
    }

    /// Iterate over all nodes and their adjacency maps
    pub fn nodes(&self) -> impl Iterator<Item = (u32, &FxHashMap<u32, f64>)> {
        self.nodes.iter().enumerate().map(|(i, n)| (i as u32, n))
    }

    /// Check if the graph is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Freeze into CSR
    pub fn build(&self) -> CsrGraph {
        CsrGraph::from_builder(self)
    }
}
