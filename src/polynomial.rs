//! Polynomial bases as coefficient matrices over an inner basis.

use crate::field::Field;
use crate::matrix::{CoefficientSource, SparseCoeffMatrix};
use crate::monomial::MonomialBasis;
use crate::types::ReferenceCellType;
use std::rc::Rc;

/// A basis of functions that can be evaluated at reference coordinates.
///
/// The uniform interface over which bases compose: a monomial basis, a
/// coefficient matrix over a monomial basis, and a coefficient matrix over
/// another polynomial basis all expose the same surface. Values, Jacobians
/// and Hessians of a function with `value_size` components are laid out
/// flat, function-major then component-major then derivative-direction.
pub trait BasisEvaluator<F: Field> {
    /// The cell the basis is defined on
    fn cell_type(&self) -> ReferenceCellType;
    /// The dimension of the reference coordinates
    fn dimension(&self) -> usize;
    /// The number of basis functions
    fn size(&self) -> usize;
    /// The number of components of each function value
    fn value_size(&self) -> usize;
    /// The highest polynomial degree contained in the basis
    fn order(&self) -> usize;
    /// Evaluate every basis function at a point.
    ///
    /// `values` has length `size() * value_size()`.
    fn evaluate(&self, point: &[F], values: &mut [F]);
    /// Evaluate every first derivative at a point.
    ///
    /// `jacobians` has length `size() * value_size() * dimension()`.
    fn evaluate_jacobian(&self, point: &[F], jacobians: &mut [F]);
    /// Evaluate every second derivative at a point.
    ///
    /// `hessians` has length
    /// `size() * value_size() * dimension() * dimension()`.
    fn evaluate_hessian(&self, point: &[F], hessians: &mut [F]);
}

impl<F: Field> BasisEvaluator<F> for MonomialBasis<F> {
    fn cell_type(&self) -> ReferenceCellType {
        MonomialBasis::cell_type(self)
    }
    fn dimension(&self) -> usize {
        MonomialBasis::dimension(self)
    }
    fn size(&self) -> usize {
        MonomialBasis::size(self)
    }
    fn value_size(&self) -> usize {
        1
    }
    fn order(&self) -> usize {
        self.degree()
    }
    fn evaluate(&self, point: &[F], values: &mut [F]) {
        MonomialBasis::evaluate(self, point, values);
    }
    fn evaluate_jacobian(&self, point: &[F], jacobians: &mut [F]) {
        MonomialBasis::evaluate_jacobian(self, point, jacobians);
    }
    fn evaluate_hessian(&self, point: &[F], hessians: &mut [F]) {
        MonomialBasis::evaluate_hessian(self, point, hessians);
    }
}

/// A polynomial basis given by a coefficient matrix over an inner basis.
///
/// Function `i`, component `c` is the linear combination of the inner
/// basis's flattened outputs weighted by coefficient row
/// `i * value_size + c`. The inner basis is shared, not owned: several
/// polynomial bases built by a provider reference the same inner basis.
pub struct PolynomialBasis<F: Field, B: BasisEvaluator<F>> {
    inner: Rc<B>,
    coefficients: SparseCoeffMatrix<F>,
    value_size: usize,
}

impl<F: Field, B: BasisEvaluator<F>> PolynomialBasis<F, B> {
    /// Create a basis with an empty coefficient matrix.
    ///
    /// Fill it with [`PolynomialBasis::fill`] before evaluating.
    pub fn new(inner: Rc<B>, value_size: usize) -> Self {
        assert!(value_size > 0);
        Self {
            inner,
            coefficients: SparseCoeffMatrix::new(),
            value_size,
        }
    }

    /// The inner basis
    pub fn inner(&self) -> &Rc<B> {
        &self.inner
    }

    /// The coefficient matrix
    pub fn coefficients(&self) -> &SparseCoeffMatrix<F> {
        &self.coefficients
    }

    /// Overwrite the coefficient matrix from a source in the same field.
    ///
    /// The row count must be a multiple of the value size; the column
    /// count must match the inner basis's flattened output size.
    pub fn fill<S: CoefficientSource<F>>(&mut self, source: &S) {
        assert_eq!(source.row_count() % self.value_size, 0);
        assert_eq!(
            source.col_count(),
            self.inner.size() * self.inner.value_size()
        );
        self.coefficients.fill(source);
    }

    /// Install an already-built coefficient matrix.
    pub fn set_coefficients(&mut self, coefficients: SparseCoeffMatrix<F>) {
        assert_eq!(coefficients.row_count() % self.value_size, 0);
        assert_eq!(
            coefficients.col_count(),
            self.inner.size() * self.inner.value_size()
        );
        self.coefficients = coefficients;
    }

    /// Overwrite the coefficient matrix from a source in another field,
    /// casting entries down and dropping those below `drop_tolerance`.
    pub fn fill_cast<G: Field, S: CoefficientSource<G>>(&mut self, source: &S, drop_tolerance: f64) {
        assert_eq!(source.row_count() % self.value_size, 0);
        assert_eq!(
            source.col_count(),
            self.inner.size() * self.inner.value_size()
        );
        self.coefficients.fill_cast(source, drop_tolerance);
    }

    fn combine(&self, table: &[F], block: usize, out: &mut [F]) {
        for row in 0..self.coefficients.row_count() {
            let row_entries = self.coefficients.row(row);
            for b in 0..block {
                let mut value = F::zero();
                for (col, coeff) in row_entries {
                    value += *coeff * table[col * block + b];
                }
                out[row * block + b] = value;
            }
        }
    }
}

impl<F: Field, B: BasisEvaluator<F>> BasisEvaluator<F> for PolynomialBasis<F, B> {
    fn cell_type(&self) -> ReferenceCellType {
        self.inner.cell_type()
    }
    fn dimension(&self) -> usize {
        self.inner.dimension()
    }
    fn size(&self) -> usize {
        self.coefficients.row_count() / self.value_size
    }
    fn value_size(&self) -> usize {
        self.value_size
    }
    fn order(&self) -> usize {
        self.inner.order()
    }
    fn evaluate(&self, point: &[F], values: &mut [F]) {
        assert_eq!(values.len(), self.size() * self.value_size);
        let n = self.inner.size() * self.inner.value_size();
        let mut table = vec![F::zero(); n];
        self.inner.evaluate(point, &mut table);
        self.combine(&table, 1, values);
    }
    fn evaluate_jacobian(&self, point: &[F], jacobians: &mut [F]) {
        let dim = self.dimension();
        assert_eq!(jacobians.len(), self.size() * self.value_size * dim);
        let n = self.inner.size() * self.inner.value_size();
        let mut table = vec![F::zero(); n * dim];
        self.inner.evaluate_jacobian(point, &mut table);
        self.combine(&table, dim, jacobians);
    }
    fn evaluate_hessian(&self, point: &[F], hessians: &mut [F]) {
        let dim = self.dimension();
        assert_eq!(hessians.len(), self.size() * self.value_size * dim * dim);
        let n = self.inner.size() * self.inner.value_size();
        let mut table = vec![F::zero(); n * dim * dim];
        self.inner.evaluate_hessian(point, &mut table);
        self.combine(&table, dim * dim, hessians);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::matrix::DenseMatrix;
    use crate::monomial::MultiIndex;
    use approx::assert_relative_eq;

    fn p1_triangle() -> PolynomialBasis<f64, MonomialBasis<f64>> {
        // 1 - x - y, x, y over the monomial basis {1, x, y}
        let mono = Rc::new(MonomialBasis::<f64>::new(ReferenceCellType::Triangle, 1));
        let mut coeffs = DenseMatrix::<f64>::new(3, 3);
        coeffs.set(0, 0, 1.0);
        coeffs.set(0, 1, -1.0);
        coeffs.set(0, 2, -1.0);
        coeffs.set(1, 1, 1.0);
        coeffs.set(2, 2, 1.0);
        let mut basis = PolynomialBasis::new(mono, 1);
        basis.fill(&coeffs);
        basis
    }

    #[test]
    fn test_linear_combination() {
        let basis = p1_triangle();
        assert_eq!(basis.size(), 3);
        let point = [0.25, 0.5];
        let mut values = vec![0.0; 3];
        basis.evaluate(&point, &mut values);
        assert_relative_eq!(values[0], 0.25);
        assert_relative_eq!(values[1], 0.25);
        assert_relative_eq!(values[2], 0.5);
        let mut jac = vec![0.0; 6];
        basis.evaluate_jacobian(&point, &mut jac);
        assert_relative_eq!(jac[0], -1.0);
        assert_relative_eq!(jac[1], -1.0);
        assert_relative_eq!(jac[2], 1.0);
        assert_relative_eq!(jac[3], 0.0);
        let mut hess = vec![0.0; 12];
        basis.evaluate_hessian(&point, &mut hess);
        for h in &hess {
            assert_relative_eq!(*h, 0.0);
        }
    }

    #[test]
    fn test_nested_composition() {
        // a second level of coefficients on top of the P1 basis: sums and
        // differences of hat functions
        let inner = Rc::new(p1_triangle());
        let mut coeffs = DenseMatrix::<f64>::new(2, 3);
        coeffs.set(0, 0, 1.0);
        coeffs.set(0, 1, 1.0);
        coeffs.set(0, 2, 1.0);
        coeffs.set(1, 1, 1.0);
        coeffs.set(1, 2, -1.0);
        let mut outer = PolynomialBasis::new(inner, 1);
        outer.fill(&coeffs);
        let point = [0.3, 0.1];
        let mut values = vec![0.0; 2];
        outer.evaluate(&point, &mut values);
        // the hat functions sum to one everywhere
        assert_relative_eq!(values[0], 1.0, epsilon = 1e-14);
        assert_relative_eq!(values[1], 0.3 - 0.1, epsilon = 1e-14);
        let mut jac = vec![0.0; 4];
        outer.evaluate_jacobian(&point, &mut jac);
        assert_relative_eq!(jac[0], 0.0, epsilon = 1e-14);
        assert_relative_eq!(jac[1], 0.0, epsilon = 1e-14);
        assert_relative_eq!(jac[2], 1.0);
        assert_relative_eq!(jac[3], -1.0);
    }

    #[test]
    fn test_vector_valued_rows() {
        // two vector functions over {1, x, y}: (1, x) and (y, 0)
        let mono = Rc::new(MonomialBasis::<f64>::new(ReferenceCellType::Triangle, 1));
        let x = mono.index_of(&MultiIndex::unit(2, 0)).unwrap();
        let y = mono.index_of(&MultiIndex::unit(2, 1)).unwrap();
        let mut coeffs = DenseMatrix::<f64>::new(4, 3);
        coeffs.set(0, 0, 1.0);
        coeffs.set(1, x, 1.0);
        coeffs.set(2, y, 1.0);
        let mut basis = PolynomialBasis::new(mono, 2);
        basis.fill(&coeffs);
        assert_eq!(basis.size(), 2);
        assert_eq!(basis.value_size(), 2);
        let point = [0.4, 0.9];
        let mut values = vec![0.0; 4];
        basis.evaluate(&point, &mut values);
        assert_relative_eq!(values[0], 1.0);
        assert_relative_eq!(values[1], 0.4);
        assert_relative_eq!(values[2], 0.9);
        assert_relative_eq!(values[3], 0.0);
    }

    #[test]
    fn test_fill_overwrites() {
        let mut basis = p1_triangle();
        let mut replacement = DenseMatrix::<f64>::new(3, 3);
        replacement.set(0, 0, 2.0);
        replacement.set(1, 1, 2.0);
        replacement.set(2, 2, 2.0);
        basis.fill(&replacement);
        let mut values = vec![0.0; 3];
        basis.evaluate(&[0.5, 0.25], &mut values);
        assert_relative_eq!(values[0], 2.0);
        assert_relative_eq!(values[1], 1.0);
        assert_relative_eq!(values[2], 0.5);
    }
}
