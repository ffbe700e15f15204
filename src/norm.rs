//! Norm of complex vectors and matrices

use ndarray::{prelude::*, Data};
use num_complex::Complex;

/// Define norm as a metric linear space, treating the whole matrix as one big vector.
pub trait Norm {
    type Output;

    /// L-1 norm
    fn norm_l1(&self) -> Self::Output;
    /// L-2 norm, the Frobenius norm for matrices
    fn norm_l2(&self) -> Self::Output;
    /// Maximum modulus (L-infinite)
    fn norm_max(&self) -> Self::Output;
}

impl<A, S, D> Norm for ArrayBase<S, D>
where
    A: NdFloat,
    S: Data<Elem = Complex<A>>,
    D: Dimension,
{
    type Output = A;

    fn norm_l1(&self) -> Self::Output {
        self.iter().fold(A::zero(), |acc, x| acc + x.norm())
    }

    fn norm_l2(&self) -> Self::Output {
        self.iter()
            .fold(A::zero(), |acc, x| acc + x.norm_sqr())
            .sqrt()
    }

    fn norm_max(&self) -> Self::Output {
        self.iter().fold(A::zero(), |f, x| x.norm().max(f))
    }
}
