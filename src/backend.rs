//! Contract between the Arnoldi driver and the numerical kernels it delegates to
//!
//! A backend owns "device" memory: the Krylov basis and the scratch vectors live in buffers the
//! driver can only reach through the methods below. Every method blocks until the operation has
//! completed, so a returned value can be read immediately on the host.
//!
//! Transfers are size-exact in units of the working element. A host array whose shape differs
//! from the buffer it is copied into (or out of) is rejected with
//! [`LinalgError::TransferSize`](crate::LinalgError::TransferSize), never truncated or padded.

use std::ops::Range;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, ArrayViewMut2, NdFloat};
use num_complex::Complex;

use crate::{qr::OwnedQR, Result};

/// A dense matrix resident on the backend
pub trait DeviceBuffer {
    /// Shape as `(rows, cols)`
    fn dim(&self) -> (usize, usize);

    fn nrows(&self) -> usize {
        self.dim().0
    }

    fn ncols(&self) -> usize {
        self.dim().1
    }
}

pub trait NumericalBackend<A: NdFloat> {
    type Buffer: DeviceBuffer;

    /// Allocate a zero-filled `rows x cols` buffer
    fn alloc(&self, rows: usize, cols: usize) -> Result<Self::Buffer>;

    /// Host to device copy of a whole buffer
    fn upload(&self, src: ArrayView2<Complex<A>>, dst: &mut Self::Buffer) -> Result<()>;

    /// Device to host copy of a whole buffer
    fn download(&self, src: &Self::Buffer, dst: ArrayViewMut2<Complex<A>>) -> Result<()>;

    /// Device to device copy of `count` columns, from `src[:, src_col..]` to `dst[:, dst_col..]`
    fn copy_columns(
        &self,
        src: &Self::Buffer,
        src_col: usize,
        dst: &mut Self::Buffer,
        dst_col: usize,
        count: usize,
    ) -> Result<()>;

    fn zero_columns(&self, buf: &mut Self::Buffer, cols: Range<usize>) -> Result<()>;

    /// Projection coefficients `Q[:, ..k]^H x` of a single-column buffer `x` onto the first `k`
    /// basis columns, returned to the host
    fn project(&self, basis: &Self::Buffer, k: usize, x: &Self::Buffer)
        -> Result<Array1<Complex<A>>>;

    /// Performs `x -= Q[:, ..k] coeffs` with `k = coeffs.len()`
    fn subtract_projection(
        &self,
        basis: &Self::Buffer,
        coeffs: ArrayView1<Complex<A>>,
        x: &mut Self::Buffer,
    ) -> Result<()>;

    /// Euclidean norm of a single-column buffer
    fn norm(&self, x: &Self::Buffer) -> Result<A>;

    fn scale(&self, x: &mut Self::Buffer, alpha: Complex<A>) -> Result<()>;

    /// Compact QR factorisation of a tall matrix
    fn qr_factorize(&self, a: Array2<Complex<A>>) -> Result<OwnedQR<A>>;

    /// QR factorisation of independent matrices
    ///
    /// Backends with a native batched kernel should override the sequential default.
    fn qr_factorize_batched(&self, batch: Vec<Array2<Complex<A>>>) -> Result<Vec<OwnedQR<A>>> {
        batch.into_iter().map(|a| self.qr_factorize(a)).collect()
    }

    /// Explicit unitary factor of a factorisation
    fn reconstruct_orthogonal(&self, qr: &OwnedQR<A>) -> Result<Array2<Complex<A>>>;

    /// Eigenvalues and unit eigenvectors of a small upper Hessenberg matrix
    fn dense_eig(
        &self,
        hessenberg: ArrayView2<Complex<A>>,
    ) -> Result<(Array1<Complex<A>>, Array2<Complex<A>>)>;

    /// Dense product `a * b`
    fn gemm(
        &self,
        a: ArrayView2<Complex<A>>,
        b: ArrayView2<Complex<A>>,
    ) -> Result<Array2<Complex<A>>>;
}
