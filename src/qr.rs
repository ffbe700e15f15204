use crate::{
    householder,
    triangular::IntoTriangular,
    LinalgError, Result,
};

use ndarray::{prelude::*, Data, DataMut, OwnedRepr, RawDataClone};
use num_complex::Complex;

pub trait QRInto {
    type Decomp;

    fn qr_into(self) -> Result<Self::Decomp>;
}

impl<A: NdFloat, S: DataMut<Elem = Complex<A>>> QRInto for ArrayBase<S, Ix2> {
    type Decomp = QRDecomp<A, S>;

    fn qr_into(mut self) -> Result<Self::Decomp> {
        let (rows, cols) = self.dim();
        if self.nrows() < self.ncols() {
            return Err(LinalgError::NotTall { rows, cols });
        }

        let mut diag = Array::zeros(cols);
        for i in 0..cols {
            diag[i] = householder::clear_column(&mut self, i);
        }

        Ok(QRDecomp { qr: self, diag })
    }
}

pub trait QR {
    type Decomp;

    fn qr(&self) -> Result<Self::Decomp>;
}

impl<A: NdFloat, S: Data<Elem = Complex<A>>> QR for ArrayBase<S, Ix2> {
    type Decomp = QRDecomp<A, OwnedRepr<Complex<A>>>;

    fn qr(&self) -> Result<Self::Decomp> {
        self.to_owned().qr_into()
    }
}

/// Householder QR factors of an owned matrix, as returned by the numerical backends
pub type OwnedQR<A> = QRDecomp<A, OwnedRepr<Complex<A>>>;

/// Compact Householder QR factorisation of a complex matrix
///
/// The unitary factor is kept implicitly as reflection axes below the diagonal; [`q`](Self::q)
/// reconstructs it explicitly.
#[derive(Debug)]
pub struct QRDecomp<A, S: DataMut<Elem = Complex<A>>> {
    // qr must be a "tall" matrix (rows >= cols)
    qr: ArrayBase<S, Ix2>,
    // diag length must be equal to qr.ncols
    diag: Array1<Complex<A>>,
}

impl<A: Clone, S: DataMut<Elem = Complex<A>> + RawDataClone> Clone for QRDecomp<A, S> {
    fn clone(&self) -> Self {
        Self {
            qr: self.qr.clone(),
            diag: self.diag.clone(),
        }
    }
}

impl<A: NdFloat, S: DataMut<Elem = Complex<A>>> QRDecomp<A, S> {
    /// Explicit unitary factor with orthonormal columns
    pub fn q(&self) -> Array2<Complex<A>> {
        householder::assemble_q(&self.qr)
    }

    pub fn dim(&self) -> (usize, usize) {
        self.qr.dim()
    }

    /// A square factorisation is invertible when no diagonal element of `R` vanishes
    pub fn is_invertible(&self) -> bool {
        self.qr.nrows() == self.qr.ncols() && self.diag.iter().all(|d| !d.norm().is_zero())
    }

    pub fn into_r(self) -> ArrayBase<S, Ix2> {
        let ncols = self.qr.ncols();
        let mut r = self.qr.slice_move(s![..ncols, ..ncols]);
        // Only fails for non-square input, which the slice above rules out
        if r.upper_triangular_inplace().is_ok() {
            r.diag_mut().assign(&self.diag);
        }
        r
    }

    pub fn into_decomp(self) -> (Array2<Complex<A>>, ArrayBase<S, Ix2>) {
        let q = self.q();
        (q, self.into_r())
    }
}
