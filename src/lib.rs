//! Implicitly restarted Arnoldi method (IRAM) for a few eigenpairs of large, possibly
//! non-symmetric linear operators.
//!
//! The solver only touches the operator through matrix-vector products and delegates its dense
//! work (QR factorisations, small Hessenberg eigenproblems, matrix products) to a
//! [`NumericalBackend`](backend::NumericalBackend). [`HostBackend`](host::HostBackend) is a
//! CPU implementation built on the dense kernels of this crate.
//!
//! All data is complex: Ritz values of a real non-symmetric operator come in conjugate pairs
//! and restart shifts are taken from them.

pub mod backend;
pub mod eig;
pub mod givens;
pub mod host;
pub mod householder;
#[cfg(feature = "iterative")]
pub mod iram;
pub mod norm;
pub mod operator;
pub mod qr;
pub mod reflection;
pub mod triangular;
pub mod verify;

pub use num_complex::Complex;

use ndarray::{ArrayBase, Ix2, RawData};
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LinalgError {
    #[error("Matrix with {rows} rows and {cols} cols is not square")]
    NotSquare { rows: usize, cols: usize },
    #[error("Matrix with {rows} rows and {cols} cols must have at least as many rows as cols")]
    NotTall { rows: usize, cols: usize },
    #[error("Matrix has a non-zero entry at ({row}, {col}) below the first subdiagonal")]
    NotHessenberg { row: usize, col: usize },
    #[error("Expected {expected} rows, got {actual}")]
    WrongRows { expected: usize, actual: usize },
    #[error("Expected {expected} columns, got {actual}")]
    WrongColumns { expected: usize, actual: usize },
    #[error("Operand of shape {actual:?} does not match expected shape {expected:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },
    #[error("Restart size must be at least 1")]
    EmptyRestart,
    #[error("Restart size {restart} must be smaller than basis size {basis}")]
    RestartTooLarge { restart: usize, basis: usize },
    #[error("Basis size {basis} must be smaller than operator dimension {dim}")]
    BasisTooLarge { basis: usize, dim: usize },
    #[error("Shift batch of {shifts} must be smaller than operator dimension {dim}")]
    ShiftBatchTooLarge { shifts: usize, dim: usize },
    #[error("Tolerance must be positive and finite")]
    InvalidTolerance,
    #[error("Operator has dimension {actual}, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("Allocation of {rows}x{cols} elements exceeds backend capacity")]
    Allocation { rows: usize, cols: usize },
    #[error("Transfer of {actual:?} elements into a buffer of {expected:?} elements")]
    TransferSize {
        expected: (usize, usize),
        actual: (usize, usize),
    },
    #[error("Backend produced a non-finite value")]
    NonFinite,
    #[error("Backend failure: {0}")]
    Backend(String),
    #[error("Hessenberg eigensolver did not converge after {iterations} sweeps")]
    EigNotConverged { iterations: usize },
    #[error("Invariant violated: {0}")]
    Invariant(String),
    #[error("Computation was cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, LinalgError>;

/// Which Ritz values are treated as unwanted and used as restart shifts.
///
/// The retained Ritz values are the complement, reported largest first under the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShiftPolicy {
    /// Shift away the smallest magnitudes, keep the largest
    #[default]
    SmallestMagnitude,
    /// Shift away the leftmost real parts, keep the rightmost
    SmallestRealPart,
}

pub(crate) fn check_square<S: RawData>(arr: &ArrayBase<S, Ix2>) -> Result<usize> {
    let (rows, cols) = arr.dim();
    if rows != cols {
        Err(LinalgError::NotSquare { rows, cols })
    } else {
        Ok(rows)
    }
}
