#![allow(unused)]

use std::ops::RangeInclusive;

use linfa_arnoldi::{triangular::IntoTriangular, Complex};
use ndarray::prelude::*;
use proptest::prelude::*;
use proptest_derive::Arbitrary;

const FLOAT_RANGE: RangeInclusive<f64> = -1000.0..=1000.0;
const DIM_RANGE: RangeInclusive<usize> = 1..=10;

#[derive(Debug, Arbitrary)]
struct Layout {
    invert_rows: bool,
    invert_cols: bool,
    transpose: bool,
}

impl Layout {
    fn apply(&self, mut arr: Array2<Complex<f64>>) -> Array2<Complex<f64>> {
        if self.invert_rows {
            arr.invert_axis(Axis(0));
        }
        if self.invert_cols {
            arr.invert_axis(Axis(1));
        }
        if self.transpose {
            arr.reversed_axes()
        } else {
            arr
        }
    }
}

pub fn complex_elem() -> impl Strategy<Value = Complex<f64>> {
    (FLOAT_RANGE, FLOAT_RANGE).prop_map(|(re, im)| Complex::new(re, im))
}

prop_compose! {
    pub fn square_arr()(dim in DIM_RANGE)
        (data in prop::collection::vec(complex_elem(), dim*dim), dim in Just(dim), layout in any::<Layout>()) -> Array2<Complex<f64>> {
        layout.apply(Array2::from_shape_vec((dim, dim), data).unwrap())
    }
}

pub fn thin_arr() -> impl Strategy<Value = Array2<Complex<f64>>> {
    DIM_RANGE
        .prop_flat_map(|rows| (1..=rows, Just(rows)))
        .prop_flat_map(|(cols, rows)| {
            (
                prop::collection::vec(complex_elem(), rows * cols),
                Just(rows),
                Just(cols),
            )
        })
        .prop_map(|(data, rows, cols)| Array2::from_shape_vec((rows, cols), data).unwrap())
}

prop_compose! {
    pub fn hessenberg_arr()(arr in square_arr()) -> Array2<Complex<f64>> {
        let mut arr = arr;
        arr.upper_hessenberg_inplace();
        arr
    }
}

/// Conjugate transpose
pub fn adjoint(arr: &Array2<Complex<f64>>) -> Array2<Complex<f64>> {
    arr.t().mapv(|x| x.conj())
}
