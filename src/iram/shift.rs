//! Implicit restart: selection of unwanted Ritz values and compression of the factorisation

use std::cmp::Ordering;

use ndarray::{prelude::*, NdFloat};
use num_complex::Complex;

use crate::{backend::NumericalBackend, triangular::IntoTriangular, Result, ShiftPolicy};

impl ShiftPolicy {
    /// Sort key of a Ritz value, unwanted values have the smallest keys
    pub(crate) fn key<A: NdFloat>(self, value: Complex<A>) -> A {
        match self {
            ShiftPolicy::SmallestMagnitude => value.norm(),
            ShiftPolicy::SmallestRealPart => value.re,
        }
    }
}

/// Select the `count` unwanted Ritz values under `policy`
///
/// Returns their indices in ascending key order. Equal keys keep the order of their indices, so
/// the selection is reproducible for exactly tied values.
///
/// # Example
///
/// ```rust
/// use ndarray::array;
/// use linfa_arnoldi::{iram::select_shifts, Complex, ShiftPolicy};
///
/// let values = array![
///     Complex::new(3., 0.),
///     Complex::new(0., 1.),
///     Complex::new(-1., 0.),
///     Complex::new(0., -5.),
/// ];
/// // |i| == |-1|, the lower index goes first
/// assert_eq!(select_shifts(values.view(), 2, ShiftPolicy::SmallestMagnitude), vec![1, 2]);
/// assert_eq!(select_shifts(values.view(), 1, ShiftPolicy::SmallestRealPart), vec![2]);
/// ```
pub fn select_shifts<A: NdFloat>(
    values: ArrayView1<Complex<A>>,
    count: usize,
    policy: ShiftPolicy,
) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    // stable sort, ties stay in index order
    order.sort_by(|&a, &b| {
        policy
            .key(values[a])
            .partial_cmp(&policy.key(values[b]))
            .unwrap_or(Ordering::Equal)
    });
    order.truncate(count);
    order
}

/// Indices not in `shifts`, largest key first and ties in index order
pub(crate) fn retained_order<A: NdFloat>(
    values: ArrayView1<Complex<A>>,
    shifts: &[usize],
    policy: ShiftPolicy,
) -> Vec<usize> {
    let mut kept: Vec<usize> = (0..values.len()).filter(|i| !shifts.contains(i)).collect();
    kept.sort_by(|&a, &b| {
        policy
            .key(values[b])
            .partial_cmp(&policy.key(values[a]))
            .unwrap_or(Ordering::Equal)
    });
    kept
}

/// Compressed factorisation after a restart
pub(crate) struct Compression<A> {
    /// Accumulated unitary transform `S = Q_1 Q_2 ... Q_p`, `B x B`
    pub transform: Array2<Complex<A>>,
    /// Transformed projection `S^H H S`, upper Hessenberg
    pub hessenberg: Array2<Complex<A>>,
    /// Norm of the residual of the compressed factorisation
    pub residual: A,
}

/// Applies one shifted QR step per shift to the `B x B` block of the `(B + 1) x B` projection
///
/// Each step factors the projection already transformed by the previous shifts. Only the
/// leading `retained` columns of `Q S` and the leading `retained x retained` block of the result
/// form a valid factorisation afterwards.
pub(crate) fn compress<A: NdFloat, B: NumericalBackend<A>>(
    backend: &B,
    hessenberg: ArrayView2<Complex<A>>,
    shifts: &[Complex<A>],
    retained: usize,
) -> Result<Compression<A>> {
    let size = hessenberg.ncols();
    let beta = hessenberg[(size, size - 1)];
    let mut hh = hessenberg.slice(s![..size, ..size]).to_owned();
    let mut transform: Option<Array2<Complex<A>>> = None;

    for &shift in shifts {
        let mut shifted = hh.clone();
        shifted.diag_mut().mapv_inplace(|d| d - shift);
        let qr = backend.qr_factorize(shifted)?;
        let q = backend.reconstruct_orthogonal(&qr)?;
        let q_h = q.t().mapv(|x| x.conj());

        let hq = backend.gemm(hh.view(), q.view())?;
        hh = backend.gemm(q_h.view(), hq.view())?;
        hh.upper_hessenberg_inplace();

        transform = Some(match transform {
            None => q,
            Some(s) => backend.gemm(s.view(), q.view())?,
        });
    }

    let transform = transform.unwrap_or_else(|| Array2::eye(size));
    let from_old_residual = (beta * transform[(size - 1, retained - 1)]).norm();
    let from_projection = if retained < size {
        hh[(retained, retained - 1)].norm()
    } else {
        A::zero()
    };

    Ok(Compression {
        residual: from_old_residual.hypot(from_projection),
        transform,
        hessenberg: hh,
    })
}
