//! Eigendecomposition of small, dense upper Hessenberg matrices
//!
//! The matrix is reduced to complex Schur form `H = Z T Z^H` by single-shift QR sweeps, with
//! Wilkinson shifts and Givens rotations chasing the bulge down the subdiagonal. Eigenvectors
//! are recovered by back-substitution on the triangular factor `T`.

use ndarray::{prelude::*, Data};
use num_complex::Complex;

use crate::{
    check_square, givens::GivensRotation, norm::Norm, triangular::Triangular, LinalgError, Result,
};

/// Eigenvalues and eigenvectors of an upper Hessenberg matrix
///
/// Eigenvalues are returned in the order they appear on the diagonal of the Schur form, the
/// corresponding eigenvectors are the columns of the second matrix and have unit norm.
pub trait EigHessenberg {
    type Elem;

    fn eig_hessenberg(&self) -> Result<(Array1<Self::Elem>, Array2<Self::Elem>)>;

    fn eigvals_hessenberg(&self) -> Result<Array1<Self::Elem>>;
}

impl<A: NdFloat, S: Data<Elem = Complex<A>>> EigHessenberg for ArrayBase<S, Ix2> {
    type Elem = Complex<A>;

    fn eig_hessenberg(&self) -> Result<(Array1<Complex<A>>, Array2<Complex<A>>)> {
        let n = check_hessenberg(self)?;
        let mut t = self.to_owned();
        let mut z = Array2::eye(n);
        hessenberg_schur(&mut t, Some(&mut z))?;
        let vecs = triangular_eigenvectors(&t, &z);
        Ok((t.diag().to_owned(), vecs))
    }

    fn eigvals_hessenberg(&self) -> Result<Array1<Complex<A>>> {
        check_hessenberg(self)?;
        let mut t = self.to_owned();
        hessenberg_schur(&mut t, None)?;
        Ok(t.diag().to_owned())
    }
}

fn check_hessenberg<A, S: Data<Elem = Complex<A>>>(matrix: &ArrayBase<S, Ix2>) -> Result<usize>
where
    A: NdFloat,
{
    let n = check_square(matrix)?;
    match matrix.hessenberg_violation() {
        Some((row, col)) => Err(LinalgError::NotHessenberg { row, col }),
        None => Ok(n),
    }
}

/// Reduce `t` to upper triangular Schur form in place, accumulating the similarity transform
/// into `z` if given.
fn hessenberg_schur<A: NdFloat>(
    t: &mut Array2<Complex<A>>,
    mut z: Option<&mut Array2<Complex<A>>>,
) -> Result<()> {
    let n = t.nrows();
    if n == 0 {
        return Ok(());
    }

    let eps = A::epsilon();
    let small = A::min_positive_value() / eps;
    let max_sweeps = 30 * n.max(10) * n;
    let mut sweeps = 0;
    let mut since_deflation = 0;

    let mut hi = n - 1;
    while hi > 0 {
        let lo = delimit_subproblem(t, hi, eps, small);
        if lo == hi {
            hi -= 1;
            since_deflation = 0;
            continue;
        }

        sweeps += 1;
        since_deflation += 1;
        if sweeps > max_sweeps {
            return Err(LinalgError::EigNotConverged { iterations: sweeps });
        }

        let shift = if since_deflation % 10 == 0 {
            // break cycles of the standard shift
            t[(hi, hi)] + t[(hi, hi - 1)].norm() * A::from(1.5).unwrap()
        } else {
            wilkinson_shift(
                t[(hi - 1, hi - 1)],
                t[(hi - 1, hi)],
                t[(hi, hi - 1)],
                t[(hi, hi)],
            )
        };
        qr_sweep(t, z.as_deref_mut(), lo, hi, shift)?;
    }

    Ok(())
}

/// Walks up the subdiagonal from `hi` until a negligible element is found, sets it to zero, and
/// returns the first row of the unreduced block ending at `hi`.
fn delimit_subproblem<A: NdFloat>(
    t: &mut Array2<Complex<A>>,
    hi: usize,
    eps: A,
    small: A,
) -> usize {
    let mut lo = hi;
    while lo > 0 {
        let sub = t[(lo, lo - 1)].norm();
        let local = t[(lo - 1, lo - 1)].norm() + t[(lo, lo)].norm();
        if sub <= eps * local || sub <= small {
            t[(lo, lo - 1)] = Complex::new(A::zero(), A::zero());
            break;
        }
        lo -= 1;
    }
    lo
}

/// Computes the wilkinson shift, i.e., the eigenvalue of the trailing 2x2 block closest to its
/// bottom-right element `d`.
///
/// The inputs are interpreted as the 2x2 matrix:
///     a  b
///     c  d
fn wilkinson_shift<A: NdFloat>(
    a: Complex<A>,
    b: Complex<A>,
    c: Complex<A>,
    d: Complex<A>,
) -> Complex<A> {
    let half = A::from(0.5).unwrap();
    let mean = (a + d) * half;
    let delta = (a - d) * half;
    let disc = (delta * delta + b * c).sqrt();
    let (m1, m2) = (mean + disc, mean - disc);
    if (m1 - d).norm() <= (m2 - d).norm() {
        m1
    } else {
        m2
    }
}

/// One implicit single-shift QR sweep over the unreduced block `lo..=hi`.
fn qr_sweep<A: NdFloat>(
    t: &mut Array2<Complex<A>>,
    mut z: Option<&mut Array2<Complex<A>>>,
    lo: usize,
    hi: usize,
    shift: Complex<A>,
) -> Result<()> {
    let mut x = t[(lo, lo)] - shift;
    let mut y = t[(lo + 1, lo)];

    for k in lo..hi {
        if k > lo {
            x = t[(k, k - 1)];
            y = t[(k + 1, k - 1)];
        }
        let rot = match GivensRotation::cancel_y(x, y) {
            Some((rot, _)) => rot,
            None => continue,
        };

        let first_col = if k > lo { k - 1 } else { lo };
        rot.rotate_rows(&mut t.slice_mut(s![k..k + 2, first_col..]))?;
        if k > lo {
            t[(k + 1, k - 1)] = Complex::new(A::zero(), A::zero());
        }
        let last_row = (k + 2).min(hi);
        rot.rotate_cols_adjoint(&mut t.slice_mut(s![..=last_row, k..k + 2]))?;

        if let Some(z) = z.as_deref_mut() {
            rot.rotate_cols_adjoint(&mut z.slice_mut(s![.., k..k + 2]))?;
        }
    }

    Ok(())
}

/// Eigenvectors of `Z T Z^H` for upper triangular `T`, normalised to unit length.
fn triangular_eigenvectors<A: NdFloat>(
    t: &Array2<Complex<A>>,
    z: &Array2<Complex<A>>,
) -> Array2<Complex<A>> {
    let n = t.nrows();
    let zero = Complex::new(A::zero(), A::zero());
    let small = (A::epsilon() * t.norm_l2()).max(A::min_positive_value());
    let big = A::one() / small;

    let mut vecs = Array2::zeros((n, n));
    let mut x = Array1::zeros(n);
    for k in 0..n {
        let lambda = t[(k, k)];
        x.fill(zero);
        x[k] = Complex::new(A::one(), A::zero());

        for i in (0..k).rev() {
            let mut acc = zero;
            for j in i + 1..=k {
                acc = acc + t[(i, j)] * x[j];
            }
            let den = t[(i, i)] - lambda;
            let den_abs = den.norm();
            // complex division squares the denominator, divide by its modulus instead
            x[i] = if den_abs < small {
                -acc * big
            } else {
                -acc / den_abs * (den.conj() / den_abs)
            };

            // keep the partial solution representable for nearly defective matrices
            let size = x[i].norm();
            if size > big {
                x.slice_mut(s![i..=k]).mapv_inplace(|e| e / size);
            }
        }

        let v = z.slice(s![.., ..=k]).dot(&x.slice(s![..=k]));
        let nrm = v.norm_l2();
        vecs.column_mut(k).assign(&v.mapv(|e| e / nrm));
    }

    vecs
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    fn c(re: f64, im: f64) -> Complex<f64> {
        Complex::new(re, im)
    }

    fn check_pairs(h: &Array2<Complex<f64>>, vals: &Array1<Complex<f64>>, vecs: &Array2<Complex<f64>>) {
        for (i, v) in vecs.columns().into_iter().enumerate() {
            let hv = h.dot(&v);
            let lv = v.mapv(|x| x * vals[i]);
            assert_abs_diff_eq!((&hv - &lv).norm_l2(), 0., epsilon = 1e-10);
            assert_abs_diff_eq!(v.norm_l2(), 1., epsilon = 1e-12);
        }
    }

    #[test]
    fn rotation_generator() {
        // Real matrix with a conjugate pair of eigenvalues
        let h = array![[c(0., 0.), c(-1., 0.)], [c(1., 0.), c(0., 0.)]];
        let (vals, vecs) = h.eig_hessenberg().unwrap();
        let mut ims: Vec<f64> = vals.iter().map(|v| v.im).collect();
        ims.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_abs_diff_eq!(ims[0], -1., epsilon = 1e-12);
        assert_abs_diff_eq!(ims[1], 1., epsilon = 1e-12);
        check_pairs(&h, &vals, &vecs);
    }

    #[test]
    fn tridiagonal() {
        let n = 8;
        let mut h = Array2::<Complex<f64>>::zeros((n, n));
        for i in 0..n {
            h[(i, i)] = c(2., 0.);
            if i + 1 < n {
                h[(i + 1, i)] = c(-1., 0.);
                h[(i, i + 1)] = c(-1., 0.);
            }
        }
        let (vals, vecs) = h.eig_hessenberg().unwrap();
        check_pairs(&h, &vals, &vecs);

        let mut got: Vec<f64> = vals.iter().map(|v| v.re).collect();
        got.sort_by(|a, b| a.partial_cmp(b).unwrap());
        for (k, val) in got.into_iter().enumerate() {
            let expected =
                2. - 2. * (std::f64::consts::PI * (k + 1) as f64 / (n + 1) as f64).cos();
            assert_abs_diff_eq!(val, expected, epsilon = 1e-10);
        }
    }

    #[test]
    fn complex_hessenberg() {
        let h = array![
            [c(1., 2.), c(0., 1.), c(3., -1.), c(0.5, 0.)],
            [c(2., 0.), c(-1., 1.), c(1., 1.), c(0., -2.)],
            [c(0., 0.), c(0.5, -0.5), c(2., 0.), c(1., 0.)],
            [c(0., 0.), c(0., 0.), c(1., 3.), c(0., 0.)]
        ];
        let (vals, vecs) = h.eig_hessenberg().unwrap();
        check_pairs(&h, &vals, &vecs);

        let only_vals = h.eigvals_hessenberg().unwrap();
        assert_abs_diff_eq!((&only_vals - &vals).norm_l2(), 0., epsilon = 1e-12);

        // trace is preserved
        let trace = vals.iter().fold(c(0., 0.), |acc, v| acc + v);
        assert_abs_diff_eq!(trace.re, 2., epsilon = 1e-10);
        assert_abs_diff_eq!(trace.im, 3., epsilon = 1e-10);
    }

    #[test]
    fn decoupled_and_trivial() {
        let zeros = Array2::<Complex<f64>>::zeros((3, 3));
        let (vals, vecs) = zeros.eig_hessenberg().unwrap();
        assert_abs_diff_eq!(vals.norm_l2(), 0.);
        check_pairs(&zeros, &vals, &vecs);

        let one = array![[c(2., -1.)]];
        let (vals, vecs) = one.eig_hessenberg().unwrap();
        assert_eq!(vals[0], c(2., -1.));
        assert_eq!(vecs[(0, 0)], c(1., 0.));

        let empty = Array2::<Complex<f64>>::zeros((0, 0));
        assert_eq!(empty.eigvals_hessenberg().unwrap().len(), 0);

        // zero subdiagonal splits the problem
        let h = array![
            [c(1., 0.), c(2., 0.), c(0., 1.)],
            [c(3., 0.), c(1., 0.), c(1., 0.)],
            [c(0., 0.), c(0., 0.), c(5., 0.)]
        ];
        let (vals, vecs) = h.eig_hessenberg().unwrap();
        check_pairs(&h, &vals, &vecs);
    }

    #[test]
    fn tiny_and_zero_scales() {
        // repeated eigenvalues clamp the back-substitution, at any scale
        for scale in [1e-150, 0.] {
            let h = array![
                [c(2., 0.), c(1., 1.), c(0., 1.)],
                [c(0., 0.), c(2., 0.), c(1., 0.)],
                [c(0., 0.), c(0., 0.), c(1., 0.)]
            ]
            .mapv(|x| x * scale);
            let (vals, vecs) = h.eig_hessenberg().unwrap();
            assert!(vals
                .iter()
                .chain(vecs.iter())
                .all(|x| x.re.is_finite() && x.im.is_finite()));
            for v in vecs.columns() {
                assert_abs_diff_eq!(v.norm_l2(), 1., epsilon = 1e-12);
            }
        }

        let zeros = Array2::<Complex<f64>>::zeros((6, 6));
        let (vals, vecs) = zeros.eig_hessenberg().unwrap();
        assert_abs_diff_eq!(vals.norm_max(), 0.);
        assert!(vecs.iter().all(|x| x.re.is_finite() && x.im.is_finite()));
    }

    #[test]
    fn rejects_non_hessenberg() {
        let full = Array2::from_elem((3, 3), c(1., 0.));
        assert!(matches!(
            full.eig_hessenberg(),
            Err(LinalgError::NotHessenberg { row: 2, col: 0 })
        ));
        let wide = Array2::<Complex<f64>>::zeros((2, 3));
        assert!(matches!(
            wide.eigvals_hessenberg(),
            Err(LinalgError::NotSquare { rows: 2, cols: 3 })
        ));
    }
}
