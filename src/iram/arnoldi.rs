//! Extension of an Arnoldi factorisation `M Q_k = Q_k H_k + f_k e_k^T`

use log::warn;
use ndarray::{prelude::*, NdFloat};
use num_complex::Complex;
use rand::Rng;

use super::{random, workspace::Workspace};
use crate::{backend::NumericalBackend, operator::LinearOperator, LinalgError, Result};

/// A second Gram-Schmidt pass is run when a pass removes more than this fraction of the norm
const REORTH_RATIO: f64 = std::f64::consts::FRAC_1_SQRT_2;
const MAX_PASSES: usize = 3;
/// Residuals below `BREAKDOWN_FACTOR * eps * |M|` are treated as zero
const BREAKDOWN_FACTOR: f64 = 100.0;

/// Builds Krylov columns with classical Gram-Schmidt and DGKS re-orthogonalisation
pub(crate) struct KrylovBuilder<'a, A, B, O> {
    backend: &'a B,
    operator: &'a O,
    breakdown_tol: A,
}

impl<'a, A, B, O> KrylovBuilder<'a, A, B, O>
where
    A: NdFloat,
    B: NumericalBackend<A>,
    O: LinearOperator<A, B>,
{
    pub fn new(backend: &'a B, operator: &'a O) -> Self {
        let breakdown_tol =
            operator.norm_estimate() * A::epsilon() * A::from(BREAKDOWN_FACTOR).unwrap();
        KrylovBuilder {
            backend,
            operator,
            breakdown_tol,
        }
    }

    /// Removes the components of `ws.residual` along the first `k` basis columns
    ///
    /// Returns the accumulated projection coefficients and the remaining norm.
    fn orthogonalize(
        &self,
        ws: &mut Workspace<A, B>,
        k: usize,
    ) -> Result<(Array1<Complex<A>>, A)> {
        let ratio = A::from(REORTH_RATIO).unwrap();
        let mut coeffs = Array1::zeros(k);
        let mut norm = self.backend.norm(&ws.residual)?;

        for _ in 0..MAX_PASSES {
            let before = norm;
            let proj = self.backend.project(&ws.basis, k, &ws.residual)?;
            self.backend
                .subtract_projection(&ws.basis, proj.view(), &mut ws.residual)?;
            coeffs += &proj;
            norm = self.backend.norm(&ws.residual)?;

            if norm >= ratio * before {
                break;
            }
        }

        Ok((coeffs, norm))
    }

    /// Extends the factorisation from `start` to `end` columns
    ///
    /// Column `j` of the Hessenberg matrix and column `j + 1` of the basis are (re)computed for
    /// every `j` in `start..end`, so the first `start + 1` basis columns must be orthonormal on
    /// entry. Returns the number of breakdowns, i.e. steps where the Krylov space became
    /// invariant and a random direction had to be substituted.
    pub fn extend<R: Rng>(
        &self,
        ws: &mut Workspace<A, B>,
        start: usize,
        end: usize,
        rng: &mut R,
    ) -> Result<usize> {
        let zero = Complex::new(A::zero(), A::zero());
        let mut breakdowns = 0;

        for j in start..end {
            self.backend.copy_columns(&ws.basis, j, &mut ws.input, 0, 1)?;
            self.operator
                .apply(self.backend, &ws.input, &mut ws.residual)?;

            let (coeffs, beta) = self.orthogonalize(ws, j + 1)?;
            let mut column = ws.hessenberg.column_mut(j);
            column.fill(zero);
            column.slice_mut(s![..=j]).assign(&coeffs);

            if beta > self.breakdown_tol {
                ws.hessenberg[(j + 1, j)] = Complex::new(beta, A::zero());
                self.backend
                    .scale(&mut ws.residual, Complex::new(beta.recip(), A::zero()))?;
            } else {
                breakdowns += 1;
                warn!(
                    "invariant subspace found at column {} (residual norm {:e}), continuing with a random direction",
                    j, beta
                );
                self.substitute_random(ws, j + 1, rng)?;
            }
            self.backend
                .copy_columns(&ws.residual, 0, &mut ws.basis, j + 1, 1)?;
        }

        Ok(breakdowns)
    }

    /// Replaces the residual by a random unit vector orthogonal to the first `k` basis columns
    ///
    /// The Hessenberg entry of the step stays zero, which decouples the invariant block.
    fn substitute_random<R: Rng>(&self, ws: &mut Workspace<A, B>, k: usize, rng: &mut R) -> Result<()> {
        let candidate: Array2<Complex<A>> = random((ws.host_basis.nrows(), 1), rng);
        self.backend.upload(candidate.view(), &mut ws.residual)?;

        // the random vector is orthogonalised twice unconditionally
        self.orthogonalize(ws, k)?;
        let (_, norm) = self.orthogonalize(ws, k)?;
        if norm <= self.breakdown_tol {
            return Err(LinalgError::Invariant(format!(
                "random direction lies in the span of the first {} basis columns",
                k
            )));
        }
        self.backend
            .scale(&mut ws.residual, Complex::new(norm.recip(), A::zero()))
    }
}
