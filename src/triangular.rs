//! Traits for checking and cleaning up triangular and Hessenberg structure

use crate::{check_square, Result};

use ndarray::{ArrayBase, Data, DataMut, Ix2};
use num_traits::Zero;

/// Zero out the entries that a structured matrix must not have
pub trait IntoTriangular {
    /// Transform square matrix into an upper triangular matrix in place, zeroing out the
    /// lower elements.
    fn upper_triangular_inplace(&mut self) -> Result<&mut Self>;

    /// Transform the matrix into an upper Hessenberg matrix in place, zeroing out every element
    /// two or more rows below the diagonal. Works on rectangular matrices too, such as the
    /// `(k + 1) x k` projection produced by the Arnoldi process.
    fn upper_hessenberg_inplace(&mut self) -> &mut Self;

    /// Transform square matrix into an upper triangular matrix, zeroing out the lower
    /// elements.
    fn into_upper_triangular(self) -> Result<Self>
    where
        Self: Sized;
}

impl<A, S> IntoTriangular for ArrayBase<S, Ix2>
where
    A: Zero,
    S: DataMut<Elem = A>,
{
    fn into_upper_triangular(mut self) -> Result<Self> {
        self.upper_triangular_inplace()?;
        Ok(self)
    }

    fn upper_triangular_inplace(&mut self) -> Result<&mut Self> {
        let n = check_square(self)?;
        for i in 0..n {
            for j in 0..i {
                self[(i, j)] = A::zero();
            }
        }
        Ok(self)
    }

    fn upper_hessenberg_inplace(&mut self) -> &mut Self {
        let (rows, cols) = self.dim();
        for j in 0..cols {
            for i in j + 2..rows {
                self[(i, j)] = A::zero();
            }
        }
        self
    }
}

/// Structural checks
pub trait Triangular {
    /// Check if matrix is upper-triagular
    fn is_upper_triangular(&self) -> bool;
    /// Check if every element two or more rows below the diagonal is zero
    fn is_upper_hessenberg(&self) -> bool;
    /// Position of the first element violating the upper Hessenberg structure
    fn hessenberg_violation(&self) -> Option<(usize, usize)>;
}

impl<A, S> Triangular for ArrayBase<S, Ix2>
where
    A: Zero,
    S: Data<Elem = A>,
{
    fn is_upper_triangular(&self) -> bool {
        if let Ok(n) = check_square(self) {
            for i in 0..n {
                for j in 0..i {
                    if !self[(i, j)].is_zero() {
                        return false;
                    }
                }
            }
            true
        } else {
            false
        }
    }

    fn is_upper_hessenberg(&self) -> bool {
        self.hessenberg_violation().is_none()
    }

    fn hessenberg_violation(&self) -> Option<(usize, usize)> {
        let (rows, cols) = self.dim();
        for j in 0..cols {
            for i in j + 2..rows {
                if !self[(i, j)].is_zero() {
                    return Some((i, j));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use ndarray::{array, Array2};

    use crate::LinalgError;

    use super::*;

    #[test]
    fn corner_cases() {
        let empty = Array2::<f64>::zeros((0, 0));
        assert!(empty.is_upper_hessenberg());
        assert!(empty.is_upper_triangular());
        assert_eq!(empty.clone().into_upper_triangular().unwrap(), empty);

        let one = array![[1]];
        assert!(one.is_upper_hessenberg());
        assert!(one.is_upper_triangular());
        assert_eq!(one.clone().into_upper_triangular().unwrap(), one);
    }

    #[test]
    fn non_square() {
        let tall = array![[1, 2], [3, 5], [0, 8]];
        assert!(tall.is_upper_hessenberg());
        assert!(!tall.is_upper_triangular());
        assert!(matches!(
            tall.into_upper_triangular(),
            Err(LinalgError::NotSquare { rows: 3, cols: 2 })
        ));

        let mut tall = array![[1, 2], [3, 5], [6, 8], [7, 9]];
        assert_eq!(tall.hessenberg_violation(), Some((2, 0)));
        tall.upper_hessenberg_inplace();
        assert_eq!(tall, array![[1, 2], [3, 5], [0, 8], [0, 0]]);
        assert!(tall.is_upper_hessenberg());
    }

    #[test]
    fn square() {
        let square = array![[1, 2, 3], [4, 5, 6], [7, 8, 9]];
        assert!(!square.is_upper_hessenberg());
        assert!(!square.is_upper_triangular());

        let mut hess = square.clone();
        hess.upper_hessenberg_inplace();
        assert_eq!(hess, array![[1, 2, 3], [4, 5, 6], [0, 8, 9]]);
        assert!(hess.is_upper_hessenberg());
        assert!(!hess.is_upper_triangular());

        let upper = square.into_upper_triangular().unwrap();
        assert_eq!(upper, array![[1, 2, 3], [0, 5, 6], [0, 0, 9]]);
        assert!(upper.is_upper_hessenberg());
        assert!(upper.is_upper_triangular());
    }
}
