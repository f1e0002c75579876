//! Test-matrix front end.
//!
//! Picks a generation mode from [`MatrixConfig`], expands composite keys,
//! and enforces [`MatrixLimits`] before any work starts:
//!
//! 1. `aetg`: greedy t-wise covering array (default, seeded with 0).
//! 2. `matrix`: the full cartesian product.

pub mod config;
pub mod select;

pub use config::{ConfigError, MatrixConfig, MatrixLimits, MatrixMode};
pub use select::{
    from_definition, generator_for, tmatrix, Matrix, RangeKey, SelectError, Selection,
};
pub use tmatrix_explore::{CaseGenerator, CoverageReport, TestCase};
pub use tmatrix_ir::Value;
