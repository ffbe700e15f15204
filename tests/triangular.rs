use ndarray::prelude::*;
use proptest::prelude::*;

use linfa_arnoldi::{triangular::*, Complex};

mod common;

fn run_structure_test(arr: Array2<Complex<f64>>) {
    let n = arr.nrows();

    let mut hess = arr.clone();
    hess.upper_hessenberg_inplace();
    assert!(hess.is_upper_hessenberg());
    // entries on and above the subdiagonal are untouched
    for i in 0..n {
        for j in i.saturating_sub(1)..n {
            assert_eq!(hess[(i, j)], arr[(i, j)]);
        }
    }

    let upper = hess.clone().into_upper_triangular().unwrap();
    assert!(upper.is_upper_triangular());
    assert!(upper.is_upper_hessenberg());

    if n > 2 && arr.hessenberg_violation().is_some() {
        assert!(!arr.is_upper_hessenberg());
        let (row, col) = arr.hessenberg_violation().unwrap();
        assert!(row >= col + 2);
        assert_ne!(arr[(row, col)], Complex::new(0., 0.));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]
    #[test]
    fn structure_test(arr in common::square_arr()) {
        run_structure_test(arr)
    }

    #[test]
    fn tall_hessenberg(arr in common::thin_arr()) {
        let mut arr = arr;
        arr.upper_hessenberg_inplace();
        prop_assert!(arr.is_upper_hessenberg());
        prop_assert!(arr.hessenberg_violation().is_none());
    }
}

#[test]
fn arnoldi_shape() {
    // (k + 1) x k projections are Hessenberg when the last row only holds the residual
    let c = |x: f64| Complex::new(x, 0.);
    let h = array![[c(1.), c(2.)], [c(3.), c(4.)], [c(0.), c(5.)]];
    assert!(h.is_upper_hessenberg());
    assert!(!h.is_upper_triangular());

    let mut bad = h.clone();
    bad[(2, 0)] = c(1e-30);
    assert_eq!(bad.hessenberg_violation(), Some((2, 0)));
}
