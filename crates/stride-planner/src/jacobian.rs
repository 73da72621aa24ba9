//! Sparse Jacobian rows
//!
//! A row holds `∂f/∂xⱼ` only for the columns `j` a value actually
//! depends on. A foot state sampled at one instant touches at most the
//! four parameters of the swing it is in, out of potentially dozens.

use std::collections::BTreeMap;

use nalgebra::DVector;

/// Sparse row of partial derivatives, keyed by column
///
/// Stored entries are structural: an entry may hold zero (e.g. at the
/// first instant of a swing) and is still reported, so the sparsity
/// pattern does not change with the query time inside a phase.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JacobianRow {
    entries: BTreeMap<usize, f64>,
}

impl JacobianRow {
    /// Create an empty (identically zero) row
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `value` to column `col`
    pub fn add(&mut self, col: usize, value: f64) {
        *self.entries.entry(col).or_insert(0.0) += value;
    }

    /// Value at column `col` (zero if not stored)
    pub fn get(&self, col: usize) -> f64 {
        self.entries.get(&col).copied().unwrap_or(0.0)
    }

    /// Number of stored entries
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether every stored value is exactly zero
    pub fn is_zero(&self) -> bool {
        self.entries.values().all(|v| *v == 0.0)
    }

    /// Stored `(column, value)` pairs in increasing column order
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.entries.iter().map(|(c, v)| (*c, *v))
    }

    /// Largest stored column, if any
    pub fn max_column(&self) -> Option<usize> {
        self.entries.keys().next_back().copied()
    }

    /// Same row with every column moved by `offset`
    ///
    /// Used to place a local row into a larger decision vector.
    pub fn shifted(&self, offset: usize) -> Self {
        Self {
            entries: self.entries.iter().map(|(c, v)| (c + offset, *v)).collect(),
        }
    }

    /// Dense copy with `ncols` columns
    ///
    /// # Panics
    /// If a stored column does not fit into `ncols`.
    pub fn to_dense(&self, ncols: usize) -> DVector<f64> {
        let mut dense = DVector::zeros(ncols);
        for (c, v) in self.iter() {
            assert!(c < ncols, "column {c} outside dense row of {ncols} columns");
            dense[c] = v;
        }
        dense
    }
}
