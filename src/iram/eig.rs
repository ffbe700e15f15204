//! Truncated eigenvalue decomposition of non-symmetric operators
//!
use std::sync::{atomic::AtomicBool, Arc};

use ndarray::prelude::*;
use rand::Rng;

use super::{iram, ArnoldiEig, IramParams, IramResult};
use crate::{
    backend::NumericalBackend,
    operator::LinearOperator,
    verify::{NoVerify, Verifier},
    ShiftPolicy,
};

/// Truncated eigenproblem solver
///
/// This struct wraps the IRAM algorithm and provides convenient builder-pattern access to
/// parameters like the basis size, maximal iteration and precision.
///
/// # Example
///
/// ```rust
/// use ndarray::{arr1, Array2};
/// use linfa_arnoldi::{host::HostBackend, iram::TruncatedArnoldi, operator::DenseOperator};
/// use rand::SeedableRng;
/// use rand_xoshiro::Xoshiro256Plus;
///
/// let diag = arr1(&[1., 2., 3., 4., 5., 6., 7., 8., 9., 10.]);
/// let a = DenseOperator::from_real(&Array2::from_diag(&diag)).unwrap();
///
/// let backend = HostBackend::<f64>::new();
/// let mut eig = TruncatedArnoldi::new_with_rng(backend, a, Xoshiro256Plus::seed_from_u64(42))
///     .precision(1e-8)
///     .maxiter(500);
///
/// let res = eig.decompose(2).unwrap();
/// assert!((res.eigvals[0].re - 10.).abs() < 1e-6);
/// ```
pub struct TruncatedArnoldi<A, B, O, R> {
    backend: B,
    operator: O,
    basis_size: Option<usize>,
    maxiter: usize,
    precision: A,
    shift_policy: ShiftPolicy,
    cancel: Option<Arc<AtomicBool>>,
    rng: R,
}

impl<A, B, O, R> TruncatedArnoldi<A, B, O, R>
where
    A: NdFloat,
    B: NumericalBackend<A>,
    O: LinearOperator<A, B>,
    R: Rng,
{
    /// Create a new truncated eigenproblem solver
    ///
    /// # Properties
    /// * `backend`: numerical backend the solver runs on
    /// * `operator`: problem operator
    /// * `rng`: random number generator
    pub fn new_with_rng(backend: B, operator: O, rng: R) -> TruncatedArnoldi<A, B, O, R> {
        TruncatedArnoldi {
            maxiter: operator.dim() * 10,
            precision: A::from(1e-6).unwrap(),
            basis_size: None,
            shift_policy: ShiftPolicy::default(),
            cancel: None,
            backend,
            operator,
            rng,
        }
    }

    /// Set the number of Krylov basis vectors
    ///
    /// Must be larger than the number of requested eigenpairs and smaller than the dimension of
    /// the operator. By default `max(2 * num + 1, 20)` is used, capped by the dimension.
    pub fn basis_size(mut self, basis_size: usize) -> Self {
        self.basis_size = Some(basis_size);

        self
    }

    /// Set the maximal number of Arnoldi steps
    ///
    /// The solver stops after `ceil(maxiter / basis_size)` restart cycles and then returns the
    /// best pairs it found, with [`converged`](ArnoldiEig::converged) set to false.
    pub fn maxiter(mut self, maxiter: usize) -> Self {
        self.maxiter = maxiter;

        self
    }

    /// Set desired precision
    ///
    /// A pair is converged once its residual norm is below this value times the norm estimate
    /// of the operator.
    pub fn precision(mut self, precision: A) -> Self {
        self.precision = precision;

        self
    }

    /// Select which Ritz values are discarded on restart, see [ShiftPolicy]
    pub fn shift_policy(mut self, shift_policy: ShiftPolicy) -> Self {
        self.shift_policy = shift_policy;

        self
    }

    /// Stop the solver after the running cycle once `flag` is set
    pub fn cancel_on(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);

        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn params(&self, num: usize) -> IramParams<A> {
        let dim = self.operator.dim();
        let basis_size = self
            .basis_size
            .unwrap_or_else(|| (2 * num + 1).max(20).min(dim.saturating_sub(1)));

        IramParams {
            dim,
            max_iters: self.maxiter,
            basis_size,
            restart_size: num,
            tolerance: self.precision,
            shift_policy: self.shift_policy,
        }
    }

    /// Calculate the eigenvalue decomposition
    ///
    /// # Parameters
    ///
    ///  * `num`: number of eigenpairs, ordered by the shift policy with the largest key first
    pub fn decompose(&mut self, num: usize) -> IramResult<A> {
        self.decompose_verified(num, &mut NoVerify)
    }

    /// Calculate the eigenvalue decomposition, checking the factorisation with `verifier` along
    /// the way
    pub fn decompose_verified<V: Verifier<A>>(
        &mut self,
        num: usize,
        verifier: &mut V,
    ) -> IramResult<A> {
        if num == 0 {
            // return empty solution if requested eigenvalue number is zero
            return Ok(ArnoldiEig {
                eigvals: Array1::zeros(0),
                eigvecs: Array2::zeros((self.operator.dim(), 0)),
                rnorm: Vec::new(),
                converged_pairs: Vec::new(),
                converged: true,
                cycles: 0,
                breakdowns: 0,
            });
        }

        let params = self.params(num);
        iram(
            &self.backend,
            &self.operator,
            &params,
            &mut self.rng,
            verifier,
            self.cancel.as_deref(),
        )
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256Plus;

    use super::*;
    use crate::{host::HostBackend, operator::DenseOperator, verify::InvariantChecker, LinalgError};

    fn solver(n: usize) -> TruncatedArnoldi<f64, HostBackend<f64>, DenseOperator<f64>, Xoshiro256Plus> {
        let diag = Array1::linspace(1., n as f64, n);
        let op = DenseOperator::from_real(&Array2::from_diag(&diag)).unwrap();
        TruncatedArnoldi::new_with_rng(HostBackend::new(), op, Xoshiro256Plus::seed_from_u64(42))
    }

    #[test]
    fn test_truncated_arnoldi() {
        let mut eig = solver(40).precision(1e-8).maxiter(1000);
        let mut checker = InvariantChecker::new(1e-10);
        let res = eig.decompose_verified(3, &mut checker).unwrap();

        assert!(res.converged);
        assert!(checker.extensions() >= 1);
        assert_eq!(checker.extensions(), checker.restarts());
        for (val, expected) in res.eigvals.iter().zip([40., 39., 38.]) {
            assert_abs_diff_eq!(val.re, expected, epsilon = 1e-6);
        }
        assert_eq!(eig.backend().live_elements(), 0);
    }

    #[test]
    fn default_basis_size() {
        let eig = solver(15);
        let params = eig.params(3);
        assert_eq!(params.basis_size, 14);
        assert_eq!(params.max_iters, 150);
        let eig = solver(100);
        assert_eq!(eig.params(3).basis_size, 20);
        assert_eq!(eig.params(15).basis_size, 31);
    }

    #[test]
    fn empty_and_invalid() {
        let mut eig = solver(10);
        let res = eig.decompose(0).unwrap();
        assert_eq!(res.count(), 0);
        assert_eq!(res.eigvecs.dim(), (10, 0));

        let mut eig = solver(10).basis_size(4);
        assert!(matches!(
            eig.decompose(4),
            Err((LinalgError::RestartTooLarge { .. }, None))
        ));
    }
}
