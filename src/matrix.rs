//! Dense and sparse coefficient matrices.
//!
//! The dense matrix is a transient object: it is filled by an
//! interpolation operator, inverted in the compute field, and discarded.
//! The sparse per-row matrix is the persisted artifact that a finished
//! basis keeps, in storage precision.

use crate::field::Field;
use crate::types::BasisError;

/// A source of coefficient entries.
///
/// Anything exposing a row count, a column count and entry access can fill
/// a coefficient matrix.
pub trait CoefficientSource<F: Field> {
    /// The number of rows
    fn row_count(&self) -> usize;
    /// The number of columns
    fn col_count(&self) -> usize;
    /// The entry at `(row, col)`
    fn entry(&self, row: usize, col: usize) -> F;
}

/// A dense matrix over a single owned buffer with row-stride indexing.
#[derive(Debug, Clone)]
pub struct DenseMatrix<F: Field> {
    rows: usize,
    cols: usize,
    data: Vec<F>,
}

impl<F: Field> DenseMatrix<F> {
    /// Create a zero matrix
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![F::zero(); rows * cols],
        }
    }

    /// Create an identity matrix
    pub fn identity(n: usize) -> Self {
        let mut matrix = Self::new(n, n);
        for i in 0..n {
            matrix.set(i, i, F::one());
        }
        matrix
    }

    /// Resize to the given shape, dropping all entries
    pub fn resize(&mut self, rows: usize, cols: usize) {
        self.rows = rows;
        self.cols = cols;
        self.data.clear();
        self.data.resize(rows * cols, F::zero());
    }

    /// The number of rows
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// The number of columns
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// The entry at `(row, col)`
    pub fn get(&self, row: usize, col: usize) -> F {
        assert!(row < self.rows && col < self.cols);
        self.data[row * self.cols + col]
    }

    /// Overwrite the entry at `(row, col)`
    pub fn set(&mut self, row: usize, col: usize, value: F) {
        assert!(row < self.rows && col < self.cols);
        self.data[row * self.cols + col] = value;
    }

    /// Add to the entry at `(row, col)`
    pub fn add(&mut self, row: usize, col: usize, value: F) {
        assert!(row < self.rows && col < self.cols);
        self.data[row * self.cols + col] += value;
    }

    /// A row as a slice
    pub fn row(&self, row: usize) -> &[F] {
        assert!(row < self.rows);
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// The inverse of a square matrix.
    ///
    /// Gauss-Jordan elimination with partial pivoting, carried out in the
    /// matrix's own field. A pivot with magnitude at or below
    /// `pivot_tolerance` aborts with [`BasisError::SingularDualMatrix`]
    /// instead of producing garbage coefficients.
    pub fn inverse(&self, pivot_tolerance: F) -> Result<DenseMatrix<F>, BasisError> {
        assert_eq!(self.rows, self.cols);
        let n = self.rows;
        let mut work = self.clone();
        let mut inverse = DenseMatrix::identity(n);
        let mut smallest_pivot = f64::INFINITY;
        for k in 0..n {
            let mut pivot_row = k;
            let mut pivot_size = work.get(k, k).abs();
            for r in k + 1..n {
                let candidate = work.get(r, k).abs();
                if candidate > pivot_size {
                    pivot_row = r;
                    pivot_size = candidate;
                }
            }
            if pivot_size <= pivot_tolerance {
                return Err(BasisError::SingularDualMatrix {
                    column: k,
                    pivot: pivot_size.to_f64(),
                });
            }
            smallest_pivot = smallest_pivot.min(pivot_size.to_f64());
            if pivot_row != k {
                for c in 0..n {
                    let tmp = work.get(k, c);
                    work.set(k, c, work.get(pivot_row, c));
                    work.set(pivot_row, c, tmp);
                    let tmp = inverse.get(k, c);
                    inverse.set(k, c, inverse.get(pivot_row, c));
                    inverse.set(pivot_row, c, tmp);
                }
            }
            let pivot = work.get(k, k);
            for c in 0..n {
                work.set(k, c, work.get(k, c) / pivot);
                inverse.set(k, c, inverse.get(k, c) / pivot);
            }
            for r in 0..n {
                if r == k {
                    continue;
                }
                let factor = work.get(r, k);
                if factor == F::zero() {
                    continue;
                }
                for c in 0..n {
                    let w = work.get(k, c);
                    work.add(r, c, -factor * w);
                    let v = inverse.get(k, c);
                    inverse.add(r, c, -factor * v);
                }
            }
        }
        log::debug!("inverted {n}x{n} dual matrix, smallest pivot {smallest_pivot:e}");
        Ok(inverse)
    }
}

impl<F: Field> CoefficientSource<F> for DenseMatrix<F> {
    fn row_count(&self) -> usize {
        self.rows
    }
    fn col_count(&self) -> usize {
        self.cols
    }
    fn entry(&self, row: usize, col: usize) -> F {
        self.get(row, col)
    }
}

/// A sparse coefficient matrix with per-row storage.
#[derive(Debug, Clone, Default)]
pub struct SparseCoeffMatrix<F: Field> {
    rows: Vec<Vec<(usize, F)>>,
    cols: usize,
}

impl<F: Field> SparseCoeffMatrix<F> {
    /// Create an empty matrix
    pub fn new() -> Self {
        Self {
            rows: vec![],
            cols: 0,
        }
    }

    /// The number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// The number of columns
    pub fn col_count(&self) -> usize {
        self.cols
    }

    /// The stored entries of a row, as `(column, value)` pairs in column
    /// order
    pub fn row(&self, row: usize) -> &[(usize, F)] {
        &self.rows[row]
    }

    /// The entry at `(row, col)`
    pub fn get(&self, row: usize, col: usize) -> F {
        assert!(row < self.rows.len() && col < self.cols);
        self.rows[row]
            .iter()
            .find(|(c, _)| *c == col)
            .map(|(_, v)| *v)
            .unwrap_or_else(F::zero)
    }

    /// Overwrite this matrix from a coefficient source in another field.
    ///
    /// Entries are cast through machine precision into the storage field;
    /// entries with magnitude at or below `drop_tolerance` are not stored.
    pub fn fill_cast<G: Field, S: CoefficientSource<G>>(&mut self, source: &S, drop_tolerance: f64) {
        self.cols = source.col_count();
        self.rows.clear();
        let mut dropped = 0usize;
        for r in 0..source.row_count() {
            let mut row = vec![];
            for c in 0..self.cols {
                let value = source.entry(r, c).to_f64();
                if value.abs() > drop_tolerance {
                    row.push((c, F::from_f64(value)));
                } else if value != 0.0 {
                    dropped += 1;
                }
            }
            self.rows.push(row);
        }
        if dropped > 0 {
            log::debug!("dropped {dropped} coefficients below {drop_tolerance:e}");
        }
    }

    /// Overwrite this matrix from a coefficient source in the same field,
    /// keeping every nonzero entry.
    pub fn fill<S: CoefficientSource<F>>(&mut self, source: &S) {
        self.cols = source.col_count();
        self.rows.clear();
        for r in 0..source.row_count() {
            let mut row = vec![];
            for c in 0..self.cols {
                let value = source.entry(r, c);
                if value != F::zero() {
                    row.push((c, value));
                }
            }
            self.rows.push(row);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;
    use crate::field::Extended;

    #[test]
    fn test_inverse_2x2() {
        let mut m = DenseMatrix::<f64>::new(2, 2);
        m.set(0, 0, 4.0);
        m.set(0, 1, 7.0);
        m.set(1, 0, 2.0);
        m.set(1, 1, 6.0);
        let inv = m.inverse(1e-12).unwrap();
        assert_relative_eq!(inv.get(0, 0), 0.6, epsilon = 1e-14);
        assert_relative_eq!(inv.get(0, 1), -0.7, epsilon = 1e-14);
        assert_relative_eq!(inv.get(1, 0), -0.2, epsilon = 1e-14);
        assert_relative_eq!(inv.get(1, 1), 0.4, epsilon = 1e-14);
    }

    #[test]
    fn test_inverse_needs_pivoting() {
        // zero on the diagonal forces a row swap
        let mut m = DenseMatrix::<f64>::new(3, 3);
        m.set(0, 1, 1.0);
        m.set(1, 0, 1.0);
        m.set(2, 2, 2.0);
        let inv = m.inverse(1e-12).unwrap();
        for i in 0..3 {
            for j in 0..3 {
                let mut sum = 0.0;
                for k in 0..3 {
                    sum += m.get(i, k) * inv.get(k, j);
                }
                assert_relative_eq!(sum, if i == j { 1.0 } else { 0.0 }, epsilon = 1e-14);
            }
        }
    }

    #[test]
    fn test_singular_matrix_is_detected() {
        let mut m = DenseMatrix::<f64>::new(2, 2);
        m.set(0, 0, 1.0);
        m.set(0, 1, 2.0);
        m.set(1, 0, 2.0);
        m.set(1, 1, 4.0);
        let result = m.inverse(1e-12);
        assert!(matches!(
            result,
            Err(BasisError::SingularDualMatrix { .. })
        ));
    }

    #[test]
    fn test_inverse_extended() {
        let mut m = DenseMatrix::<Extended>::new(2, 2);
        m.set(0, 0, Extended::from_f64(1.0));
        m.set(0, 1, Extended::from_f64(0.5));
        m.set(1, 0, Extended::from_f64(0.5));
        m.set(1, 1, Extended::from_f64(1.0 / 3.0));
        let inv = m.inverse(Extended::from_f64(1e-25)).unwrap();
        // inverse of the 2x2 Hilbert matrix
        assert_relative_eq!(inv.get(0, 0).to_f64(), 4.0, epsilon = 1e-14);
        assert_relative_eq!(inv.get(0, 1).to_f64(), -6.0, epsilon = 1e-14);
        assert_relative_eq!(inv.get(1, 1).to_f64(), 12.0, epsilon = 1e-14);
    }

    #[test]
    fn test_sparse_fill_and_cast() {
        let mut dense = DenseMatrix::<Extended>::new(2, 3);
        dense.set(0, 0, Extended::from_f64(1.5));
        dense.set(1, 2, Extended::from_f64(-2.0));
        dense.set(1, 1, Extended::from_f64(1e-20));
        let mut sparse = SparseCoeffMatrix::<f64>::new();
        sparse.fill_cast(&dense, 1e-14);
        assert_eq!(sparse.row_count(), 2);
        assert_eq!(sparse.col_count(), 3);
        assert_eq!(sparse.row(0).len(), 1);
        assert_eq!(sparse.row(1).len(), 1);
        assert_relative_eq!(sparse.get(0, 0), 1.5);
        assert_relative_eq!(sparse.get(1, 2), -2.0);
        assert_relative_eq!(sparse.get(1, 1), 0.0);
    }
}
