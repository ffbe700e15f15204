use ndarray::{s, Array2, ArrayBase, Data, DataMut, Ix1, Ix2, NdFloat};
use num_complex::Complex;

use crate::reflection::Reflection;

/// Turns `col` into the unit axis of the Householder reflection mapping it onto a multiple of
/// the first basis vector.
///
/// Returns what would be the first component of column after reflection if a reflection was
/// actually performed, or `None` for a zero column.
pub fn reflection_axis_mut<A: NdFloat, S: DataMut<Elem = Complex<A>>>(
    col: &mut ArrayBase<S, Ix1>,
) -> Option<Complex<A>> {
    let reflection_norm_sq = col.iter().fold(A::zero(), |acc, x| acc + x.norm_sqr());
    let reflection_norm = reflection_norm_sq.sqrt();

    let first = col[0];
    let first_abs = first.norm();
    let phase = if first_abs.is_zero() {
        Complex::new(A::one(), A::zero())
    } else {
        first / first_abs
    };
    let signed_norm = phase * reflection_norm;
    col[0] = first + signed_norm;
    // Equal to `norm(col)^2` after the update above
    let new_norm_sq = (reflection_norm_sq + first_abs * reflection_norm) * A::from(2.0f64).unwrap();

    if !new_norm_sq.is_zero() {
        let new_norm = new_norm_sq.sqrt();
        col.mapv_inplace(|x| x / new_norm);
        Some(-signed_norm)
    } else {
        None
    }
}

/// Uses an householder reflection to zero out the `icol`-th column below the diagonal.
///
/// The axis of the reflection is left in place of the cleared entries (diagonal included).
/// Returns the new diagonal element.
pub fn clear_column<A: NdFloat, S: DataMut<Elem = Complex<A>>>(
    matrix: &mut ArrayBase<S, Ix2>,
    icol: usize,
) -> Complex<A> {
    let (mut left, mut right) = matrix.multi_slice_mut((s![.., icol], s![.., icol + 1..]));
    let mut axis = left.slice_mut(s![icol..]);
    let refl_norm = reflection_axis_mut(&mut axis);

    if refl_norm.is_some() {
        let refl = Reflection::new(axis);
        let mut refl_rows = right.slice_mut(s![icol.., ..]);
        refl.reflect_cols(&mut refl_rows);
    }
    refl_norm.unwrap_or_else(|| Complex::new(A::zero(), A::zero()))
}

/// Assembles the unitary factor from the reflection axes stored below the diagonal of
/// `matrix`.
///
/// The result has as many rows as `matrix` and `min(rows, cols)` columns.
pub fn assemble_q<A: NdFloat, S: Data<Elem = Complex<A>>>(
    matrix: &ArrayBase<S, Ix2>,
) -> Array2<Complex<A>> {
    let (nrows, ncols) = matrix.dim();
    let dim = nrows.min(ncols);
    let mut res = Array2::zeros((nrows, dim));
    res.diag_mut().fill(Complex::new(A::one(), A::zero()));

    for i in (0..dim).rev() {
        let axis = matrix.slice(s![i.., i]);
        let refl = Reflection::new(axis);

        let mut res_rows = res.slice_mut(s![i.., i..]);
        refl.reflect_cols(&mut res_rows);
    }

    res
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    use super::*;
    use crate::norm::Norm;

    fn c(re: f64, im: f64) -> Complex<f64> {
        Complex::new(re, im)
    }

    #[test]
    fn householder() {
        let mut arr = array![c(1.5, 0.), c(2., 0.), c(3., 0.)];
        let ret = reflection_axis_mut(&mut arr).unwrap();
        assert_abs_diff_eq!(ret.re, -3.90512, epsilon = 1e-4);
        assert_abs_diff_eq!(ret.im, 0.);
        assert_abs_diff_eq!(arr.map(|x| x.re), array![0.8319, 0.3078, 0.4617], epsilon = 1e-4);
        assert_abs_diff_eq!(arr.norm_l2(), 1.0, epsilon = 1e-12);

        // The reflected vector keeps the phase of the leading entry
        let mut arr = array![c(0., 3.), c(0., 0.), c(4., 0.)];
        let orig = arr.clone();
        let ret = reflection_axis_mut(&mut arr).unwrap();
        assert_abs_diff_eq!(ret.re, 0., epsilon = 1e-12);
        assert_abs_diff_eq!(ret.im, -5., epsilon = 1e-12);
        let mut col = orig.insert_axis(ndarray::Axis(1));
        Reflection::new(arr.view()).reflect_cols(&mut col);
        assert_abs_diff_eq!(
            (&col.column(0) - &array![ret, c(0., 0.), c(0., 0.)]).norm_l2(),
            0.,
            epsilon = 1e-12
        );

        let mut arr = array![c(0., 0.), c(0., 0.)];
        assert_eq!(reflection_axis_mut(&mut arr), None);
        assert_abs_diff_eq!(arr.norm_l2(), 0.);
    }

    #[test]
    fn assemble_unitary() {
        let mut arr = array![
            [c(1., 2.), c(0., 1.)],
            [c(-1., 0.), c(2., 2.)],
            [c(0.5, -1.), c(3., 0.)]
        ];
        for i in 0..2 {
            clear_column(&mut arr, i);
        }
        let q = assemble_q(&arr);
        assert_eq!(q.dim(), (3, 2));
        let gram = q.t().mapv(|x| x.conj()).dot(&q);
        assert_abs_diff_eq!((&gram - &Array2::<Complex<f64>>::eye(2)).norm_l2(), 0., epsilon = 1e-12);
    }
}
