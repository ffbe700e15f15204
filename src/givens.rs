use ndarray::{ArrayBase, DataMut, Ix2, NdFloat};
use num_complex::Complex;

use crate::{LinalgError, Result};

/// A complex Givens Rotation
///
/// Represents the unitary matrix
/// ```text
///  [  c       s ]
///  [ -conj(s) c ]
/// ```
/// with real `c`.
#[derive(Debug, Clone)]
pub struct GivensRotation<A> {
    c: A,
    s: Complex<A>,
}

impl<A: NdFloat> GivensRotation<A> {
    /// Computes rotation `G` such that the `y` component of `G * [x, y].t` is 0
    ///
    /// Returns `None` if `y` is 0 (no rotation needed), otherwise return the rotation and the norm
    /// of vector `[x, y]`.
    pub fn cancel_y(x: Complex<A>, y: Complex<A>) -> Option<(Self, A)> {
        let y_abs = y.norm();
        if y_abs.is_zero() {
            return None;
        }
        let x_abs = x.norm();
        let r = x_abs.hypot(y_abs);
        if x_abs.is_zero() {
            Some((
                Self {
                    c: A::zero(),
                    s: y.conj() / y_abs,
                },
                r,
            ))
        } else {
            let c = x_abs / r;
            let s = x / x_abs * y.conj() / r;
            Some((Self { c, s }, r))
        }
    }

    /// Performs `rows = G * rows` in-place on a matrix with two rows.
    pub fn rotate_rows<S: DataMut<Elem = Complex<A>>>(
        &self,
        rows: &mut ArrayBase<S, Ix2>,
    ) -> Result<()> {
        let nrows = rows.nrows();
        if nrows != 2 {
            return Err(LinalgError::WrongRows {
                expected: 2,
                actual: nrows,
            });
        }
        let c = self.c;
        let s = self.s;

        for j in 0..rows.ncols() {
            let a = rows[(0, j)];
            let b = rows[(1, j)];
            rows[(0, j)] = a * c + s * b;
            rows[(1, j)] = b * c - s.conj() * a;
        }

        Ok(())
    }

    /// Performs `cols = cols * G^H` in-place on a matrix with two columns.
    pub fn rotate_cols_adjoint<S: DataMut<Elem = Complex<A>>>(
        &self,
        cols: &mut ArrayBase<S, Ix2>,
    ) -> Result<()> {
        let ncols = cols.ncols();
        if ncols != 2 {
            return Err(LinalgError::WrongColumns {
                expected: 2,
                actual: ncols,
            });
        }
        let c = self.c;
        let s = self.s;

        for i in 0..cols.nrows() {
            let a = cols[(i, 0)];
            let b = cols[(i, 1)];
            cols[(i, 0)] = a * c + b * s.conj();
            cols[(i, 1)] = b * c - a * s;
        }

        Ok(())
    }
}
