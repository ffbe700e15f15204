use approx::assert_abs_diff_eq;
use ndarray::prelude::*;
use proptest::prelude::*;

use linfa_arnoldi::{norm::Norm, qr::*, triangular::*, Complex};

mod common;

fn run_qr_test(orig: Array2<Complex<f64>>) {
    let (q, r) = orig.qr().unwrap().into_decomp();
    let gram = common::adjoint(&q).dot(&q);
    assert_abs_diff_eq!(
        (&gram - &Array2::<Complex<f64>>::eye(q.ncols())).norm_max(),
        0.,
        epsilon = 1e-7
    );
    assert!(r.is_upper_triangular());
    assert_abs_diff_eq!((&q.dot(&r) - &orig).norm_max(), 0., epsilon = 1e-7);
}

fn run_shifted_test(h: Array2<Complex<f64>>) {
    // QR of a shifted Hessenberg matrix, as done in an implicit restart
    let mut shifted = h.clone();
    let shift = h[(0, 0)];
    shifted.diag_mut().mapv_inplace(|d| d - shift);
    let q = shifted.qr().unwrap().q();
    assert!(q.dim() == h.dim());

    let similar = common::adjoint(&q).dot(&h.dot(&q));
    let scale = h.norm_max().max(1.);
    for i in 0..h.nrows() {
        for j in 0..i.saturating_sub(1) {
            assert_abs_diff_eq!(similar[(i, j)].norm() / scale, 0., epsilon = 1e-9);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]
    #[test]
    fn qr_test(arr in common::thin_arr()) {
        run_qr_test(arr)
    }

    #[test]
    fn square_qr_test(arr in common::square_arr()) {
        run_qr_test(arr)
    }

    #[test]
    fn shifted_hessenberg_test(h in common::hessenberg_arr()) {
        run_shifted_test(h)
    }
}
