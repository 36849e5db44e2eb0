//! Sparse vector storage
//!
//! [`SparseVec`] backs the residual and estimate of the push engine and the
//! iterates, gradients and mat-vec accumulators of the proximal solver. It is
//! an arena of `(node, value)` entries with an `FxHashMap` index, so lookups
//! are O(1) amortized and iteration walks a dense `Vec` in insertion order.
//!
//! A touched node stays in the arena even when its value returns to zero;
//! use [`SparseVec::support`] to get the nonzero entries only.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// A mapping from node id to `f64`, absent nodes read as zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<(u32, f64)>", into = "Vec<(u32, f64)>")]
pub struct SparseVec {
    entries: Vec<(u32, f64)>,
    index: FxHashMap<u32, usize>,
}

impl SparseVec {
    /// Create an empty vector
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty vector with room for `capacity` entries
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    /// Build from `(node, value)` pairs. Repeated nodes are summed.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (u32, f64)>,
    {
        let mut v = Self::new();
        for (node, value) in pairs {
            v.add(node, value);
        }
        v
    }

    /// Value stored for `node`, or 0.0
    #[inline]
    pub fn get(&self, node: u32) -> f64 {
        match self.index.get(&node) {
            Some(&slot) => self.entries[slot].1,
            None => 0.0,
        }
    }

    /// Overwrite the value for `node`
    #[inline]
    pub fn set(&mut self, node: u32, value: f64) {
        let slot = self.slot(node);
        self.entries[slot].1 = value;
    }

    /// Add `delta` to the value for `node` and return the new value
    #[inline]
    pub fn add(&mut self, node: u32, delta: f64) -> f64 {
        let slot = self.slot(node);
        self.entries[slot].1 += delta;
        self.entries[slot].1
    }

    /// Replace the value for `node` with 0.0 and return the old value
    #[inline]
    pub fn take(&mut self, node: u32) -> f64 {
        match self.index.get(&node) {
            Some(&slot) => std::mem::take(&mut self.entries[slot].1),
            None => 0.0,
        }
    }

    /// Whether `node` has been touched
    pub fn contains(&self, node: u32) -> bool {
        self.index.contains_key(&node)
    }

    /// Number of touched nodes (including those whose value is zero)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all entries but keep the allocations
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }

    /// Iterate over touched entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.entries.iter().copied()
    }

    /// Sum of all stored values
    pub fn sum(&self) -> f64 {
        self.entries.iter().map(|&(_, v)| v).sum()
    }

    /// Smallest stored value, or 0.0 when empty
    pub fn min_value(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        self.entries
            .iter()
            .map(|&(_, v)| v)
            .fold(f64::INFINITY, f64::min)
    }

    /// Nonzero entries sorted by decreasing value, ties broken by node id
    pub fn support(&self) -> Vec<(u32, f64)> {
        let mut out: Vec<_> = self
            .entries
            .iter()
            .copied()
            .filter(|&(_, v)| v != 0.0)
            .collect();
        out.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        out
    }

    #[inline]
    fn slot(&mut self, node: u32) -> usize {
        let entries = &mut self.entries;
        *self.index.entry(node).or_insert_with(|| {
            entries.push((node, 0.0));
            entries.len() - 1
        })
    }
}

impl PartialEq for SparseVec {
    /// Two vectors are equal when every node reads the same value.
    fn eq(&self, other: &Self) -> bool {
        self.iter().all(|(n, v)| other.get(n) == v) && other.iter().all(|(n, v)| self.get(n) == v)
    }
}

impl From<Vec<(u32, f64)>> for SparseVec {
    fn from(pairs: Vec<(u32, f64)>) -> Self {
        Self::from_pairs(pairs)
    }
}

impl From<SparseVec> for Vec<(u32, f64)> {
    fn from(v: SparseVec) -> Self {
        v.entries
    }
}

impl FromIterator<(u32, f64)> for SparseVec {
    fn from_iter<I: IntoIterator<Item = (u32, f64)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}
