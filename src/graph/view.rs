//! Degree normalization and the read-only view handed to the engines.

use super::csr::CsrGraph;

/// Degree vector and its square-root normalizations
///
/// `dn_sqrt[v]` is 0 for isolated nodes so the normalized operators never
/// divide by zero.
#[derive(Debug, Clone, PartialEq)]
pub struct DegreeVectors {
    pub d: Vec<f64>,
    pub d_sqrt: Vec<f64>,
    pub dn_sqrt: Vec<f64>,
}

impl DegreeVectors {
    /// Derive degrees from `graph`
    ///
    /// With `weighted` the degree is the total out-edge weight; otherwise it
    /// is the out-edge count and stored weights are ignored.
    pub fn from_graph(graph: &CsrGraph, weighted: bool) -> Self {
        let d: Vec<f64> = if weighted {
            graph.total_weight.clone()
        } else {
            graph.out_degree.iter().map(|&k| k as f64).collect()
        };
        Self::from_degrees(d)
    }

    /// Build the normalizations from an explicit degree vector
    pub fn from_degrees(d: Vec<f64>) -> Self {
        let d_sqrt: Vec<f64> = d.iter().map(|&x| x.sqrt()).collect();
        let dn_sqrt = d_sqrt
            .iter()
            .map(|&s| if s > 0.0 { 1.0 / s } else { 0.0 })
            .collect();
        Self { d, d_sqrt, dn_sqrt }
    }

    pub fn len(&self) -> usize {
        self.d.len()
    }

    pub fn is_empty(&self) -> bool {
        self.d.is_empty()
    }
}

/// A graph together with the degree vectors of the requested contract
///
/// `weighted == false` makes [`GraphView::neighbors`] report unit weights even
/// when the underlying graph stores edge weights.
#[derive(Debug, Clone, Copy)]
pub struct GraphView<'a> {
    pub graph: &'a CsrGraph,
    pub degrees: &'a DegreeVectors,
    pub weighted: bool,
}

impl<'a> GraphView<'a> {
    pub fn new(graph: &'a CsrGraph, degrees: &'a DegreeVectors, weighted: bool) -> Self {
        debug_assert_eq!(graph.num_nodes, degrees.len());
        Self {
            graph,
            degrees,
            weighted,
        }
    }

    /// Out-neighbors of `node` with the weight used by the current contract
    #[inline]
    pub fn neighbors(&self, node: u32) -> impl Iterator<Item = (u32, f64)> + 'a {
        let weighted = self.weighted;
        self.graph
            .neighbors(node)
            .map(move |(v, w)| (v, if weighted { w } else { 1.0 }))
    }

    #[inline]
    pub fn degree(&self, node: u32) -> f64 {
        self.degrees.d[node as usize]
    }

    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.graph.num_nodes
    }
}
