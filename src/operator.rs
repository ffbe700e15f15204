//! Linear operators the eigensolver can be applied to
//!
//! The solver never looks inside an operator: it only asks for its dimension, a norm estimate
//! used to scale tolerances, and products with single-column backend buffers.

use ndarray::linalg::general_mat_vec_mul;
use ndarray::{prelude::*, Data, NdFloat};
use num_complex::Complex;

use crate::{
    backend::{DeviceBuffer, NumericalBackend},
    check_square,
    host::{HostBackend, HostBuffer},
    norm::Norm,
    LinalgError, Result,
};

pub trait LinearOperator<A: NdFloat, B: NumericalBackend<A>> {
    /// Number of rows (and columns) of the operator
    fn dim(&self) -> usize;

    /// Performs `y = M x` for single-column buffers of `dim()` rows
    fn apply(&self, backend: &B, x: &B::Buffer, y: &mut B::Buffer) -> Result<()>;

    /// Estimate of the operator norm, tolerances are taken relative to it
    fn norm_estimate(&self) -> A;
}

impl<A: NdFloat, B: NumericalBackend<A>, O: LinearOperator<A, B>> LinearOperator<A, B> for &O {
    fn dim(&self) -> usize {
        (**self).dim()
    }

    fn apply(&self, backend: &B, x: &B::Buffer, y: &mut B::Buffer) -> Result<()> {
        (**self).apply(backend, x, y)
    }

    fn norm_estimate(&self) -> A {
        (**self).norm_estimate()
    }
}

fn check_io<A>(dim: usize, x: &HostBuffer<A>, y: &HostBuffer<A>) -> Result<()> {
    for buf in [x, y] {
        if buf.dim() != (dim, 1) {
            return Err(LinalgError::ShapeMismatch {
                expected: (dim, 1),
                actual: buf.dim(),
            });
        }
    }
    Ok(())
}

/// Dense square matrix held on the host
#[derive(Debug, Clone)]
pub struct DenseOperator<A> {
    matrix: Array2<Complex<A>>,
    norm: A,
}

impl<A: NdFloat> DenseOperator<A> {
    pub fn new(matrix: Array2<Complex<A>>) -> Result<Self> {
        check_square(&matrix)?;
        let norm = matrix.norm_l2();
        Ok(Self { matrix, norm })
    }

    /// Lift a real matrix to the complex working element
    pub fn from_real<S: Data<Elem = A>>(matrix: &ArrayBase<S, Ix2>) -> Result<Self> {
        Self::new(matrix.mapv(|x| Complex::new(x, A::zero())))
    }

    pub fn matrix(&self) -> ArrayView2<Complex<A>> {
        self.matrix.view()
    }
}

impl<A: NdFloat> LinearOperator<A, HostBackend<A>> for DenseOperator<A> {
    fn dim(&self) -> usize {
        self.matrix.nrows()
    }

    fn apply(&self, _: &HostBackend<A>, x: &HostBuffer<A>, y: &mut HostBuffer<A>) -> Result<()> {
        check_io(self.matrix.nrows(), x, y)?;
        general_mat_vec_mul(
            Complex::new(A::one(), A::zero()),
            &self.matrix,
            &x.view().column(0),
            Complex::new(A::zero(), A::zero()),
            &mut y.view_mut().column_mut(0),
        );
        Ok(())
    }

    /// Frobenius norm, an upper bound of the spectral norm
    fn norm_estimate(&self) -> A {
        self.norm
    }
}

/// Operator given as a closure over host vectors
///
/// # Example
///
/// ```rust
/// use linfa_arnoldi::{host::HostBackend, operator::{LinearOperator, MatrixFreeOperator}};
///
/// // shift operator on a ring of 8 sites
/// let ring = MatrixFreeOperator::new(8, 1.0, |x| {
///     let n = x.len();
///     (0..n).map(|i| x[(i + 1) % n]).collect()
/// });
/// assert_eq!(LinearOperator::<f64, HostBackend<f64>>::dim(&ring), 8);
/// ```
pub struct MatrixFreeOperator<A, F> {
    dim: usize,
    norm: A,
    op: F,
}

impl<A, F> MatrixFreeOperator<A, F>
where
    A: NdFloat,
    F: Fn(ArrayView1<Complex<A>>) -> Array1<Complex<A>>,
{
    pub fn new(dim: usize, norm: A, op: F) -> Self {
        Self { dim, norm, op }
    }
}

impl<A, F> LinearOperator<A, HostBackend<A>> for MatrixFreeOperator<A, F>
where
    A: NdFloat,
    F: Fn(ArrayView1<Complex<A>>) -> Array1<Complex<A>>,
{
    fn dim(&self) -> usize {
        self.dim
    }

    fn apply(&self, _: &HostBackend<A>, x: &HostBuffer<A>, y: &mut HostBuffer<A>) -> Result<()> {
        check_io(self.dim, x, y)?;
        let out = (self.op)(x.view().column(0));
        if out.len() != self.dim {
            return Err(LinalgError::DimensionMismatch {
                expected: self.dim,
                actual: out.len(),
            });
        }
        y.view_mut().column_mut(0).assign(&out);
        Ok(())
    }

    fn norm_estimate(&self) -> A {
        self.norm
    }
}
