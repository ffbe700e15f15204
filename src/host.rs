//! CPU implementation of [`NumericalBackend`] on top of the dense kernels of this crate

use std::marker::PhantomData;
use std::ops::Range;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use ndarray::linalg::general_mat_vec_mul;
use ndarray::{prelude::*, NdFloat};
use num_complex::Complex;

use crate::{
    backend::{DeviceBuffer, NumericalBackend},
    eig::EigHessenberg,
    norm::Norm,
    qr::{OwnedQR, QRInto},
    LinalgError, Result,
};

/// Host memory "device" for elements of type `Complex<A>`
///
/// Keeps a ledger of the elements held by its live buffers. With a capacity set, allocations
/// that would exceed it fail with [`LinalgError::Allocation`].
#[derive(Debug)]
pub struct HostBackend<A> {
    ledger: Arc<AtomicUsize>,
    capacity: Option<usize>,
    elem: PhantomData<A>,
}

impl<A> Default for HostBackend<A> {
    fn default() -> Self {
        Self {
            ledger: Arc::default(),
            capacity: None,
            elem: PhantomData,
        }
    }
}

impl<A> Clone for HostBackend<A> {
    fn clone(&self) -> Self {
        Self {
            ledger: self.ledger.clone(),
            capacity: self.capacity,
            elem: PhantomData,
        }
    }
}

impl<A> HostBackend<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend that refuses to hold more than `elements` elements at once
    pub fn with_capacity(elements: usize) -> Self {
        Self {
            capacity: Some(elements),
            ..Self::default()
        }
    }

    /// Number of elements currently held by buffers of this backend
    pub fn live_elements(&self) -> usize {
        self.ledger.load(Ordering::SeqCst)
    }
}

/// Buffer of a [`HostBackend`], released from the ledger on drop
#[derive(Debug)]
pub struct HostBuffer<A> {
    data: Array2<Complex<A>>,
    ledger: Arc<AtomicUsize>,
}

impl<A> HostBuffer<A> {
    pub fn view(&self) -> ArrayView2<Complex<A>> {
        self.data.view()
    }

    pub fn view_mut(&mut self) -> ArrayViewMut2<Complex<A>> {
        self.data.view_mut()
    }
}

impl<A> DeviceBuffer for HostBuffer<A> {
    fn dim(&self) -> (usize, usize) {
        self.data.dim()
    }
}

impl<A> Drop for HostBuffer<A> {
    fn drop(&mut self) {
        self.ledger.fetch_sub(self.data.len(), Ordering::SeqCst);
    }
}

fn check_transfer(expected: (usize, usize), actual: (usize, usize)) -> Result<()> {
    if expected != actual {
        Err(LinalgError::TransferSize { expected, actual })
    } else {
        Ok(())
    }
}

fn check_vector<A>(x: &HostBuffer<A>, rows: usize) -> Result<()> {
    if x.dim() != (rows, 1) {
        Err(LinalgError::ShapeMismatch {
            expected: (rows, 1),
            actual: x.dim(),
        })
    } else {
        Ok(())
    }
}

impl<A: NdFloat> NumericalBackend<A> for HostBackend<A> {
    type Buffer = HostBuffer<A>;

    fn alloc(&self, rows: usize, cols: usize) -> Result<HostBuffer<A>> {
        let len = rows
            .checked_mul(cols)
            .ok_or(LinalgError::Allocation { rows, cols })?;
        if let Some(capacity) = self.capacity {
            if self.live_elements() + len > capacity {
                return Err(LinalgError::Allocation { rows, cols });
            }
        }
        self.ledger.fetch_add(len, Ordering::SeqCst);

        Ok(HostBuffer {
            data: Array2::zeros((rows, cols)),
            ledger: self.ledger.clone(),
        })
    }

    fn upload(&self, src: ArrayView2<Complex<A>>, dst: &mut HostBuffer<A>) -> Result<()> {
        check_transfer(dst.dim(), src.dim())?;
        dst.data.assign(&src);
        Ok(())
    }

    fn download(&self, src: &HostBuffer<A>, mut dst: ArrayViewMut2<Complex<A>>) -> Result<()> {
        check_transfer(dst.dim(), src.dim())?;
        dst.assign(&src.data);
        Ok(())
    }

    fn copy_columns(
        &self,
        src: &HostBuffer<A>,
        src_col: usize,
        dst: &mut HostBuffer<A>,
        dst_col: usize,
        count: usize,
    ) -> Result<()> {
        if src_col + count > src.ncols() {
            return Err(LinalgError::TransferSize {
                expected: src.dim(),
                actual: (src.nrows(), src_col + count),
            });
        }
        if dst_col + count > dst.ncols() {
            return Err(LinalgError::TransferSize {
                expected: dst.dim(),
                actual: (dst.nrows(), dst_col + count),
            });
        }
        check_transfer((dst.nrows(), count), (src.nrows(), count))?;

        dst.data
            .slice_mut(s![.., dst_col..dst_col + count])
            .assign(&src.data.slice(s![.., src_col..src_col + count]));
        Ok(())
    }

    fn zero_columns(&self, buf: &mut HostBuffer<A>, cols: Range<usize>) -> Result<()> {
        if cols.start > cols.end || cols.end > buf.ncols() {
            return Err(LinalgError::TransferSize {
                expected: buf.dim(),
                actual: (buf.nrows(), cols.end),
            });
        }
        buf.data
            .slice_mut(s![.., cols])
            .fill(Complex::new(A::zero(), A::zero()));
        Ok(())
    }

    fn project(
        &self,
        basis: &HostBuffer<A>,
        k: usize,
        x: &HostBuffer<A>,
    ) -> Result<Array1<Complex<A>>> {
        check_vector(x, basis.nrows())?;
        if k > basis.ncols() {
            return Err(LinalgError::WrongColumns {
                expected: basis.ncols(),
                actual: k,
            });
        }

        let x = x.data.column(0);
        let coeffs = basis
            .data
            .slice(s![.., ..k])
            .columns()
            .into_iter()
            .map(|q| {
                q.iter()
                    .zip(x.iter())
                    .fold(Complex::new(A::zero(), A::zero()), |acc, (q, x)| {
                        acc + q.conj() * *x
                    })
            })
            .collect();
        Ok(coeffs)
    }

    fn subtract_projection(
        &self,
        basis: &HostBuffer<A>,
        coeffs: ArrayView1<Complex<A>>,
        x: &mut HostBuffer<A>,
    ) -> Result<()> {
        check_vector(x, basis.nrows())?;
        let k = coeffs.len();
        if k > basis.ncols() {
            return Err(LinalgError::WrongColumns {
                expected: basis.ncols(),
                actual: k,
            });
        }

        let one = Complex::new(A::one(), A::zero());
        general_mat_vec_mul(
            -one,
            &basis.data.slice(s![.., ..k]),
            &coeffs,
            one,
            &mut x.data.column_mut(0),
        );
        Ok(())
    }

    fn norm(&self, x: &HostBuffer<A>) -> Result<A> {
        let norm = x.data.norm_l2();
        if norm.is_finite() {
            Ok(norm)
        } else {
            Err(LinalgError::NonFinite)
        }
    }

    fn scale(&self, x: &mut HostBuffer<A>, alpha: Complex<A>) -> Result<()> {
        if !(alpha.re.is_finite() && alpha.im.is_finite()) {
            return Err(LinalgError::NonFinite);
        }
        x.data.mapv_inplace(|e| e * alpha);
        Ok(())
    }

    fn qr_factorize(&self, a: Array2<Complex<A>>) -> Result<OwnedQR<A>> {
        a.qr_into()
    }

    fn reconstruct_orthogonal(&self, qr: &OwnedQR<A>) -> Result<Array2<Complex<A>>> {
        Ok(qr.q())
    }

    fn dense_eig(
        &self,
        hessenberg: ArrayView2<Complex<A>>,
    ) -> Result<(Array1<Complex<A>>, Array2<Complex<A>>)> {
        let (vals, vecs) = hessenberg.eig_hessenberg()?;
        if vals.iter().chain(vecs.iter()).all(|x| x.re.is_finite() && x.im.is_finite()) {
            Ok((vals, vecs))
        } else {
            Err(LinalgError::NonFinite)
        }
    }

    fn gemm(
        &self,
        a: ArrayView2<Complex<A>>,
        b: ArrayView2<Complex<A>>,
    ) -> Result<Array2<Complex<A>>> {
        if a.ncols() != b.nrows() {
            return Err(LinalgError::ShapeMismatch {
                expected: (a.ncols(), b.ncols()),
                actual: b.dim(),
            });
        }
        Ok(a.dot(&b))
    }
}
