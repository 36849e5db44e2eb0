//! Graph construction and representation
//!
//! This module provides the CSR adjacency the engines run on, a builder for
//! assembling it from edge lists, and the degree normalizations.

pub mod builder;
pub mod csr;
pub mod view;
