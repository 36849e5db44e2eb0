//! Request handling around the engines
//!
//! A request flows through [`spec::PprSpec`] (what to compute),
//! [`validation`] (is it well-formed) and [`runner`] (run the engine and
//! assemble the dense vector). [`observer`] exposes the engines' progress to
//! callers.

pub mod error_code;
pub mod errors;
pub mod observer;
pub mod runner;
pub mod spec;
pub mod validation;
