//! Ritz pairs of the projected problem

use ndarray::{prelude::*, NdFloat};
use num_complex::Complex;

use super::shift::{retained_order, select_shifts};
use crate::{backend::NumericalBackend, norm::Norm, Result, ShiftPolicy};

/// Ritz values of a full `(B + 1) x B` factorisation, split into wanted and unwanted ones
pub(crate) struct Reduction<A> {
    /// Unwanted Ritz values, to be used as restart shifts
    pub shifts: Vec<Complex<A>>,
    /// Wanted Ritz values, largest key first
    pub wanted: Vec<Complex<A>>,
    /// Residual norm estimates of the wanted pairs
    pub estimates: Vec<A>,
}

impl<A: NdFloat> Reduction<A> {
    pub fn max_estimate(&self) -> A {
        self.estimates.iter().fold(A::zero(), |acc, &x| acc.max(x))
    }
}

/// Solve the projected eigenproblem of the `B x B` block and estimate the residual of the
/// `retained` wanted pairs by `|H[B, B - 1]| |e_B^T y|`
pub(crate) fn reduce<A: NdFloat, B: NumericalBackend<A>>(
    backend: &B,
    hessenberg: ArrayView2<Complex<A>>,
    retained: usize,
    policy: ShiftPolicy,
) -> Result<Reduction<A>> {
    let size = hessenberg.ncols();
    let beta = hessenberg[(size, size - 1)].norm();
    let (values, vectors) = backend.dense_eig(hessenberg.slice(s![..size, ..size]))?;

    let unwanted = select_shifts(values.view(), size - retained, policy);
    let wanted = retained_order(values.view(), &unwanted, policy);

    Ok(Reduction {
        shifts: unwanted.iter().map(|&i| values[i]).collect(),
        estimates: wanted
            .iter()
            .map(|&i| beta * vectors[(size - 1, i)].norm())
            .collect(),
        wanted: wanted.iter().map(|&i| values[i]).collect(),
    })
}

/// Ritz pairs lifted to the full space
pub(crate) struct RitzPairs<A> {
    pub values: Array1<Complex<A>>,
    pub vectors: Array2<Complex<A>>,
    pub rnorm: Vec<A>,
}

/// Ritz pairs of a compressed `C`-step factorisation with residual norm `residual`
///
/// The pairs are ordered largest key first, the vectors `Q_C y` are normalised and the residual
/// of each pair is estimated by `residual * |e_C^T y|`.
pub(crate) fn ritz_pairs<A: NdFloat, B: NumericalBackend<A>>(
    backend: &B,
    basis: ArrayView2<Complex<A>>,
    hessenberg: ArrayView2<Complex<A>>,
    residual: A,
    policy: ShiftPolicy,
) -> Result<RitzPairs<A>> {
    let size = hessenberg.ncols();
    let (values, y) = backend.dense_eig(hessenberg)?;
    let order = retained_order(values.view(), &[], policy);
    let y = y.select(Axis(1), &order);

    let mut vectors = backend.gemm(basis, y.view())?;
    for mut col in vectors.columns_mut() {
        let norm = col.norm_l2();
        if norm > A::zero() {
            col.mapv_inplace(|x| x / norm);
        }
    }

    Ok(RitzPairs {
        values: order.iter().map(|&i| values[i]).collect(),
        rnorm: (0..size).map(|j| residual * y[(size - 1, j)].norm()).collect(),
        vectors,
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::host::HostBackend;

    fn c(re: f64, im: f64) -> Complex<f64> {
        Complex::new(re, im)
    }

    #[test]
    fn reduce_diagonal() {
        // a decoupled projection has exact Ritz pairs
        let backend = HostBackend::<f64>::new();
        let mut h = Array2::<Complex<f64>>::zeros((5, 4));
        for (i, v) in [1., -4., 3., 2.].iter().enumerate() {
            h[(i, i)] = c(*v, 0.);
        }
        h[(4, 3)] = c(0.5, 0.);

        let red = reduce(&backend, h.view(), 2, ShiftPolicy::SmallestMagnitude).unwrap();
        assert_eq!(red.wanted, vec![c(-4., 0.), c(3., 0.)]);
        assert_eq!(red.shifts.len(), 2);
        assert_abs_diff_eq!(red.max_estimate(), 0.);

        let red = reduce(&backend, h.view(), 1, ShiftPolicy::SmallestRealPart).unwrap();
        assert_eq!(red.wanted, vec![c(3., 0.)]);
        assert_eq!(red.shifts, vec![c(-4., 0.), c(1., 0.), c(2., 0.)]);

        // only the pair touching the last row carries the residual
        let red = reduce(&backend, h.view(), 3, ShiftPolicy::SmallestMagnitude).unwrap();
        assert_eq!(red.wanted[2], c(2., 0.));
        assert_abs_diff_eq!(red.estimates[2], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn lifted_pairs() {
        let backend = HostBackend::<f64>::new();
        let basis = Array2::<Complex<f64>>::eye(4).slice_move(s![.., ..2]);
        let h = array![[c(1., 0.), c(1., 0.)], [c(0., 0.), c(5., 0.)]];
        let pairs = ritz_pairs(&backend, basis.view(), h.view(), 0.1, ShiftPolicy::SmallestMagnitude)
            .unwrap();

        assert_eq!(pairs.values[0], c(5., 0.));
        assert_eq!(pairs.values[1], c(1., 0.));
        assert_eq!(pairs.vectors.dim(), (4, 2));
        for col in pairs.vectors.columns() {
            assert_abs_diff_eq!(col.norm_l2(), 1., epsilon = 1e-12);
            assert_eq!(col[3], c(0., 0.));
        }
        // the eigenvector of 1 is e_1, which has no component in the last row
        assert_abs_diff_eq!(pairs.rnorm[1], 0., epsilon = 1e-12);
        assert!(pairs.rnorm[0] > 0.);
    }
}
