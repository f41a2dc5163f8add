//! Finite element definitions.
//!
//! A [`CiarletElement`] is the finished artifact of the construction
//! pipeline: a sparse coefficient matrix over a monomial basis in storage
//! precision, together with the degree-of-freedom layout produced by the
//! same functional walk that built the coefficients. The dual matrix is
//! assembled and inverted in a compute field chosen per construction;
//! [`crate::field::Extended`] keeps high orders well conditioned.

use crate::field::Field;
use crate::matrix::{CoefficientSource, DenseMatrix, SparseCoeffMatrix};
use crate::monomial::MonomialBasis;
use crate::polynomial::{BasisEvaluator, PolynomialBasis};
use crate::reference_cell;
use crate::types::{BasisError, Continuity, LocalCoefficients, LocalKey, MapType, ReferenceCellType};

pub mod lagrange;
pub mod orthonormal;
pub mod raviart_thomas;

/// A finite element on a reference cell.
///
/// The evaluation surface consumed by users of a finished basis.
pub trait FiniteElement<F: Field> {
    /// The reference cell type
    fn cell_type(&self) -> ReferenceCellType;
    /// The polynomial degree the element was requested at
    fn degree(&self) -> usize;
    /// The highest polynomial degree contained in the element's span
    fn embedded_superdegree(&self) -> usize;
    /// The number of basis functions
    fn dim(&self) -> usize;
    /// The number of components of each basis function value
    fn value_size(&self) -> usize;
    /// The push forward / pull back map to use for this element
    fn map_type(&self) -> MapType;
    /// The continuity between neighbouring cells
    fn continuity(&self) -> Continuity;
    /// Evaluate every basis function at a point.
    ///
    /// `values` has length `dim() * value_size()`, function-major.
    fn evaluate_function(&self, point: &[F], values: &mut [F]);
    /// Evaluate every basis function's first derivatives at a point.
    ///
    /// `jacobians` has length `dim() * value_size() * tdim` where `tdim`
    /// is the cell dimension.
    fn evaluate_jacobian(&self, point: &[F], jacobians: &mut [F]);
    /// The degree-of-freedom layout, in basis function index order
    fn local_coefficients(&self) -> &LocalCoefficients;
    /// The local key of basis function `i`
    fn local_key(&self, i: usize) -> LocalKey {
        self.local_coefficients().local_key(i)
    }
    /// The basis functions associated with a subentity of the cell
    fn entity_dofs(&self, entity_dim: usize, entity_index: usize) -> Vec<usize> {
        let codim = reference_cell::dim(self.cell_type()) - entity_dim;
        self.local_coefficients()
            .keys()
            .iter()
            .enumerate()
            .filter(|(_, key)| key.codim == codim && key.sub_entity == entity_index)
            .map(|(i, _)| i)
            .collect()
    }
}

/// A finite element built by dualizing interpolation functionals.
pub struct CiarletElement<F: Field> {
    cell_type: ReferenceCellType,
    degree: usize,
    embedded_superdegree: usize,
    map_type: MapType,
    continuity: Continuity,
    basis: PolynomialBasis<F, MonomialBasis<F>>,
    local_coefficients: LocalCoefficients,
}

impl<F: Field> CiarletElement<F> {
    /// Assemble an element from a finished basis and its layout
    pub fn new(
        degree: usize,
        map_type: MapType,
        continuity: Continuity,
        basis: PolynomialBasis<F, MonomialBasis<F>>,
        local_coefficients: LocalCoefficients,
    ) -> Self {
        assert_eq!(basis.size(), local_coefficients.size());
        Self {
            cell_type: basis.cell_type(),
            degree,
            embedded_superdegree: basis.order(),
            map_type,
            continuity,
            basis,
            local_coefficients,
        }
    }

    /// The underlying coefficient-matrix basis
    pub fn basis(&self) -> &PolynomialBasis<F, MonomialBasis<F>> {
        &self.basis
    }

    /// Evaluate every basis function's second derivatives at a point.
    ///
    /// `hessians` has length `dim() * value_size() * tdim * tdim`.
    pub fn evaluate_hessian(&self, point: &[F], hessians: &mut [F]) {
        self.basis.evaluate_hessian(point, hessians);
    }
}

impl<F: Field> FiniteElement<F> for CiarletElement<F> {
    fn cell_type(&self) -> ReferenceCellType {
        self.cell_type
    }
    fn degree(&self) -> usize {
        self.degree
    }
    fn embedded_superdegree(&self) -> usize {
        self.embedded_superdegree
    }
    fn dim(&self) -> usize {
        self.basis.size()
    }
    fn value_size(&self) -> usize {
        self.basis.value_size()
    }
    fn map_type(&self) -> MapType {
        self.map_type
    }
    fn continuity(&self) -> Continuity {
        self.continuity
    }
    fn evaluate_function(&self, point: &[F], values: &mut [F]) {
        self.basis.evaluate(point, values);
    }
    fn evaluate_jacobian(&self, point: &[F], jacobians: &mut [F]) {
        self.basis.evaluate_jacobian(point, jacobians);
    }
    fn local_coefficients(&self) -> &LocalCoefficients {
        &self.local_coefficients
    }
}

/// The dual coefficients composed lazily from the inverted dual matrix and
/// the prebasis coefficients: dual function `j`, component `c`, monomial
/// `m` is the sum over prebasis functions `k` of
/// `inverse[k][j] * prebasis[(k, c), m]`.
struct DualSource<'a, F: Field> {
    inverse: &'a DenseMatrix<F>,
    prebasis: &'a SparseCoeffMatrix<F>,
    value_size: usize,
}

impl<F: Field> CoefficientSource<F> for DualSource<'_, F> {
    fn row_count(&self) -> usize {
        self.inverse.cols() * self.value_size
    }
    fn col_count(&self) -> usize {
        self.prebasis.col_count()
    }
    fn entry(&self, row: usize, col: usize) -> F {
        let function = row / self.value_size;
        let component = row % self.value_size;
        let mut value = F::zero();
        for k in 0..self.inverse.rows() {
            let factor = self.inverse.get(k, function);
            if factor != F::zero() {
                value += factor * self.prebasis.get(k * self.value_size + component, col);
            }
        }
        value
    }
}

/// Invert the dual matrix and compose the nodal coefficients.
///
/// `dual_matrix` holds `functional_i(prebasis_j)` and must be square. The
/// inversion runs in the compute field `CF`; the result is cast down into
/// the storage field `SF`, with entries below the storage field's noise
/// floor (relative to the largest coefficient) dropped. The pivot
/// tolerance defaults to a small multiple of the compute field's epsilon
/// and can be overridden per construction.
pub fn dual_coefficients<SF: Field, CF: Field>(
    dual_matrix: &DenseMatrix<CF>,
    prebasis: &PolynomialBasis<CF, MonomialBasis<CF>>,
    pivot_tolerance: Option<f64>,
) -> Result<SparseCoeffMatrix<SF>, BasisError> {
    assert_eq!(dual_matrix.rows(), dual_matrix.cols());
    assert_eq!(dual_matrix.cols(), prebasis.size());
    let tolerance = CF::from_f64(
        pivot_tolerance.unwrap_or_else(|| CF::epsilon().to_f64() * 64.0),
    );
    let inverse = dual_matrix.inverse(tolerance)?;
    let source = DualSource {
        inverse: &inverse,
        prebasis: prebasis.coefficients(),
        value_size: prebasis.value_size(),
    };
    let mut largest = 0.0_f64;
    for r in 0..source.row_count() {
        for c in 0..source.col_count() {
            largest = largest.max(source.entry(r, c).to_f64().abs());
        }
    }
    let mut coefficients = SparseCoeffMatrix::new();
    coefficients.fill_cast(&source, largest * SF::epsilon().to_f64() * 4.0);
    Ok(coefficients)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::types::ReferenceCellType;

    fn check_dofs<F: Field>(element: &impl FiniteElement<F>) {
        let mut ndofs = 0;
        for (entity_dim, entity_count) in
            reference_cell::entity_counts(element.cell_type())
                .iter()
                .enumerate()
        {
            for entity in 0..*entity_count {
                ndofs += element.entity_dofs(entity_dim, entity).len();
            }
        }
        assert_eq!(ndofs, element.dim());
    }

    #[test]
    fn test_lagrange_dofs_partition() {
        for degree in 1..4 {
            let element = lagrange::create::<f64>(
                ReferenceCellType::Triangle,
                degree,
                Continuity::Continuous,
            )
            .unwrap();
            check_dofs(&element);
        }
    }

    #[test]
    fn test_raviart_thomas_dofs_partition() {
        for degree in 0..3 {
            let element = raviart_thomas::create::<f64>(
                ReferenceCellType::Triangle,
                degree,
                Continuity::Continuous,
            )
            .unwrap();
            check_dofs(&element);
        }
    }

    #[test]
    fn test_entity_dofs_lagrange_2_triangle() {
        let element =
            lagrange::create::<f64>(ReferenceCellType::Triangle, 2, Continuity::Continuous)
                .unwrap();
        for v in 0..3 {
            assert_eq!(element.entity_dofs(0, v), vec![v]);
        }
        for e in 0..3 {
            assert_eq!(element.entity_dofs(1, e), vec![3 + e]);
        }
        assert!(element.entity_dofs(2, 0).is_empty());
    }

    #[test]
    fn test_discontinuous_element_has_interior_dofs_only() {
        let element =
            lagrange::create::<f64>(ReferenceCellType::Triangle, 2, Continuity::Discontinuous)
                .unwrap();
        for i in 0..element.dim() {
            let key = element.local_key(i);
            assert_eq!(key.codim, 0);
            assert_eq!(key.sub_entity, 0);
            assert_eq!(key.index, i);
        }
    }
}
