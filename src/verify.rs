//! Hooks for checking the invariants of the Arnoldi factorisation while the solver runs
//!
//! The driver calls a [`Verifier`] at fixed points of every cycle with host copies of the basis
//! and the Hessenberg projection. Production runs use [`NoVerify`], which compiles to nothing;
//! tests and validation runs plug in [`InvariantChecker`] or their own implementation.

use ndarray::{prelude::*, Data, NdFloat};
use num_complex::Complex;

use crate::{norm::Norm, triangular::Triangular, LinalgError, Result};

pub trait Verifier<A: NdFloat> {
    /// Called after every extension with the full `N x (B + 1)` basis and the `(B + 1) x B`
    /// Hessenberg matrix
    fn after_extension(
        &mut self,
        _basis: ArrayView2<Complex<A>>,
        _hessenberg: ArrayView2<Complex<A>>,
    ) -> Result<()> {
        Ok(())
    }

    /// Called after every restart, when only the first `retained` columns are valid
    fn after_restart(
        &mut self,
        _basis: ArrayView2<Complex<A>>,
        _hessenberg: ArrayView2<Complex<A>>,
        _retained: usize,
    ) -> Result<()> {
        Ok(())
    }

    /// Called with the accumulated unitary transform of a restart
    fn shift_transform(&mut self, _transform: ArrayView2<Complex<A>>) -> Result<()> {
        Ok(())
    }
}

/// Verifier that accepts everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoVerify;

impl<A: NdFloat> Verifier<A> for NoVerify {}

/// Largest deviation of `Q^H Q` from the identity
pub fn orthonormality_error<A: NdFloat, S: Data<Elem = Complex<A>>>(q: &ArrayBase<S, Ix2>) -> A {
    let gram = q.t().mapv(|x| x.conj()).dot(q);
    let eye = Array2::<Complex<A>>::eye(q.ncols());
    (&gram - &eye).norm_max()
}

/// Checks orthonormality of the valid basis columns, the Hessenberg structure of the projection
/// and unitarity of the restart transforms
#[derive(Debug, Clone)]
pub struct InvariantChecker<A> {
    tolerance: A,
    extensions: usize,
    restarts: usize,
}

impl<A: NdFloat> InvariantChecker<A> {
    pub fn new(tolerance: A) -> Self {
        Self {
            tolerance,
            extensions: 0,
            restarts: 0,
        }
    }

    /// Number of extensions checked so far
    pub fn extensions(&self) -> usize {
        self.extensions
    }

    /// Number of restarts checked so far
    pub fn restarts(&self) -> usize {
        self.restarts
    }

    fn check_orthonormal(&self, what: &str, q: ArrayView2<Complex<A>>) -> Result<()> {
        let err = orthonormality_error(&q);
        if err > self.tolerance || !err.is_finite() {
            return Err(LinalgError::Invariant(format!(
                "{} deviates from orthonormality by {}",
                what, err
            )));
        }
        Ok(())
    }

    fn check_hessenberg(&self, h: ArrayView2<Complex<A>>) -> Result<()> {
        match h.hessenberg_violation() {
            Some((row, col)) => Err(LinalgError::Invariant(format!(
                "projection has a non-zero entry at ({}, {}) below the subdiagonal",
                row, col
            ))),
            None => Ok(()),
        }
    }
}

impl<A: NdFloat> Verifier<A> for InvariantChecker<A> {
    fn after_extension(
        &mut self,
        basis: ArrayView2<Complex<A>>,
        hessenberg: ArrayView2<Complex<A>>,
    ) -> Result<()> {
        self.extensions += 1;
        self.check_orthonormal("basis", basis)?;
        self.check_hessenberg(hessenberg)
    }

    fn after_restart(
        &mut self,
        basis: ArrayView2<Complex<A>>,
        hessenberg: ArrayView2<Complex<A>>,
        retained: usize,
    ) -> Result<()> {
        self.restarts += 1;
        self.check_orthonormal("retained basis", basis.slice(s![.., ..retained]))?;
        self.check_hessenberg(hessenberg.slice(s![..retained, ..retained]))?;
        self.check_hessenberg(hessenberg)
    }

    fn shift_transform(&mut self, transform: ArrayView2<Complex<A>>) -> Result<()> {
        self.check_orthonormal("restart transform", transform)
    }
}
