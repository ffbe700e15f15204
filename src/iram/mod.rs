//!
//! The Implicitly Restarted Arnoldi Method (IRAM) computes a few eigenpairs of a large linear
//! operator
//! ```text
//! M x = lambda x
//! ```
//! where M need neither be symmetric nor be stored explicitly. It has the following properties:
//! * matrix free: only evaluates matrix-vector products with M
//! * bounded memory: the Krylov basis never grows beyond a fixed number of columns, it is
//!   compressed by shifted QR steps on the small projected matrix whenever it is full
//! * non-symmetric: eigenvalues and eigenvectors are complex in general
//!
//! See also the wikipedia article at [Arnoldi iteration](https://en.wikipedia.org/wiki/Arnoldi_iteration)
//!
mod algorithm;
mod arnoldi;
mod eig;
mod ritz;
mod shift;
mod workspace;

use ndarray::prelude::*;
use num_complex::Complex;
use rand::prelude::*;

pub use crate::{LinalgError, ShiftPolicy};
pub use algorithm::iram;
pub use eig::TruncatedArnoldi;
pub use shift::select_shifts;

/// Generate a random complex array with components uniformly distributed in `[-1, 1)`
pub(crate) fn random<A, Sh, D, R: Rng>(sh: Sh, rng: &mut R) -> Array<Complex<A>, D>
where
    A: NdFloat,
    D: Dimension,
    Sh: ShapeBuilder<Dim = D>,
{
    let mut uniform = || A::from(2.0 * rng.gen::<f64>() - 1.0).unwrap();
    ArrayBase::from_shape_fn(sh, |_| Complex::new(uniform(), uniform()))
}

/// The result of the eigensolver
///
/// Running out of cycles is not an error: the solver then returns `Ok` with the best Ritz pairs
/// it found and `converged` set to false. If an error occurs it is returned in `Err`, together
/// with the best result if there is one. Precondition and backend failures carry `None`, a
/// cancelled run carries the pairs of the last completed cycle.
pub type IramResult<A> = std::result::Result<ArnoldiEig<A>, (LinalgError, Option<ArnoldiEig<A>>)>;

/// Approximate eigenpairs found by the solver
#[derive(Debug, Clone, PartialEq)]
pub struct ArnoldiEig<A> {
    /// Ritz values, ordered by the retained-set key, largest first
    pub eigvals: Array1<Complex<A>>,
    /// Unit Ritz vectors, one per column
    pub eigvecs: Array2<Complex<A>>,
    /// Residual norm estimate `|M v - lambda v|` of each pair
    pub rnorm: Vec<A>,
    /// Whether the residual estimate of each pair meets the tolerance
    pub converged_pairs: Vec<bool>,
    /// Whether every residual estimate met the tolerance
    pub converged: bool,
    /// Number of restart cycles that were run
    pub cycles: usize,
    /// Number of invariant subspaces found while extending the basis
    pub breakdowns: usize,
}

impl<A> ArnoldiEig<A> {
    pub fn count(&self) -> usize {
        self.eigvals.len()
    }
}

/// Run-time configuration of [`iram`]
#[derive(Debug, Clone, PartialEq)]
pub struct IramParams<A> {
    /// Dimension of the operator
    pub dim: usize,
    /// Cap on the number of Arnoldi steps, the run stops after `ceil(max_iters / basis_size)`
    /// cycles
    pub max_iters: usize,
    /// Number of basis columns before a restart
    pub basis_size: usize,
    /// Number of wanted eigenpairs, and of basis columns kept by a restart
    pub restart_size: usize,
    /// Residual tolerance relative to the operator norm estimate
    pub tolerance: A,
    pub shift_policy: ShiftPolicy,
}

impl<A: NdFloat> IramParams<A> {
    pub fn new(dim: usize, basis_size: usize, restart_size: usize) -> Self {
        Self {
            dim,
            max_iters: 10 * dim,
            basis_size,
            restart_size,
            tolerance: A::from(1e-6).unwrap(),
            shift_policy: ShiftPolicy::default(),
        }
    }

    /// Checks `0 < restart_size < basis_size < dim` and the tolerance
    pub fn validate(&self) -> crate::Result<()> {
        if self.restart_size == 0 {
            return Err(LinalgError::EmptyRestart);
        }
        if self.restart_size >= self.basis_size {
            return Err(LinalgError::RestartTooLarge {
                restart: self.restart_size,
                basis: self.basis_size,
            });
        }
        if self.basis_size >= self.dim {
            return Err(LinalgError::BasisTooLarge {
                basis: self.basis_size,
                dim: self.dim,
            });
        }
        let shifts = self.basis_size - self.restart_size;
        if shifts >= self.dim {
            return Err(LinalgError::ShiftBatchTooLarge {
                shifts,
                dim: self.dim,
            });
        }
        if !(self.tolerance.is_finite() && self.tolerance > A::zero()) {
            return Err(LinalgError::InvalidTolerance);
        }
        Ok(())
    }

    /// Number of restart cycles allowed by `max_iters`, at least one
    pub fn max_cycles(&self) -> usize {
        let cycles = (self.max_iters + self.basis_size - 1) / self.basis_size.max(1);
        cycles.max(1)
    }
}
