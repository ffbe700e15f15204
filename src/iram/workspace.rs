use ndarray::{prelude::*, NdFloat};
use num_complex::Complex;

use crate::{backend::NumericalBackend, Result};

/// Buffers of one solver run
///
/// Allocated once before the first cycle and reused by every cycle. Device buffers are released
/// when the workspace is dropped, on every exit path of the driver.
pub(crate) struct Workspace<A: NdFloat, B: NumericalBackend<A>> {
    /// Krylov basis, `N x (B + 1)`
    pub basis: B::Buffer,
    /// Column the operator is applied to
    pub input: B::Buffer,
    /// Vector being orthogonalised against the basis
    pub residual: B::Buffer,
    /// Host copy of the basis, valid after each download
    pub host_basis: Array2<Complex<A>>,
    /// Hessenberg projection, `(B + 1) x B`
    pub hessenberg: Array2<Complex<A>>,
}

impl<A: NdFloat, B: NumericalBackend<A>> Workspace<A, B> {
    pub fn new(backend: &B, dim: usize, basis_size: usize) -> Result<Self> {
        Ok(Workspace {
            basis: backend.alloc(dim, basis_size + 1)?,
            input: backend.alloc(dim, 1)?,
            residual: backend.alloc(dim, 1)?,
            host_basis: Array2::zeros((dim, basis_size + 1)),
            hessenberg: Array2::zeros((basis_size + 1, basis_size)),
        })
    }

    /// Keep the first `retained` columns of `new_basis` and the leading block of `new_hessenberg`,
    /// zero everything else
    pub fn truncate(
        &mut self,
        new_basis: ArrayView2<Complex<A>>,
        new_hessenberg: ArrayView2<Complex<A>>,
        retained: usize,
    ) {
        let zero = Complex::new(A::zero(), A::zero());
        self.host_basis.fill(zero);
        self.host_basis
            .slice_mut(s![.., ..retained])
            .assign(&new_basis.slice(s![.., ..retained]));
        self.hessenberg.fill(zero);
        self.hessenberg
            .slice_mut(s![..retained, ..retained])
            .assign(&new_hessenberg.slice(s![..retained, ..retained]));
    }
}
