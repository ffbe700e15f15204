use ndarray::{ArrayBase, Data, DataMut, Ix1, Ix2, NdFloat, Zip};
use num_complex::Complex;

/// Reflection with respect to a hyperplane through the origin
///
/// Applies `I - 2 v v^H` for a unit axis `v`; the map is unitary and its own inverse.
pub struct Reflection<D: Data> {
    axis: ArrayBase<D, Ix1>,
}

impl<A: NdFloat, D: Data<Elem = Complex<A>>> Reflection<D> {
    /// Create a new reflection with respect to the hyperplane orthogonal to the given axis
    ///
    /// `axis` must be a unit vector, or zero for the identity map
    pub fn new(axis: ArrayBase<D, Ix1>) -> Self {
        Self { axis }
    }

    /// Apply reflection to the columns of `rhs`
    pub fn reflect_cols<M: DataMut<Elem = Complex<A>>>(&self, rhs: &mut ArrayBase<M, Ix2>) {
        let m_two = A::from(-2.0f64).unwrap();
        for mut col in rhs.columns_mut() {
            // v^H x
            let proj = Zip::from(&self.axis)
                .and(&col)
                .fold(Complex::new(A::zero(), A::zero()), |acc, a, x| {
                    acc + a.conj() * *x
                });
            col.scaled_add(proj * m_two, &self.axis);
        }
    }
}
