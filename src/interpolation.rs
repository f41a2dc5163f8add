//! Interpolation functional sets.
//!
//! A functional set can be consumed in two ways: evaluated against a
//! single function to produce one coefficient per functional, or evaluated
//! against every function of a candidate basis at once to fill a
//! (functional x basis function) matrix. Both modes share one integration
//! core through the `InterpolationTarget` trait, so the quadrature loops
//! are written only once.

use crate::element::orthonormal;
use crate::field::Field;
use crate::matrix::DenseMatrix;
use crate::monomial::MonomialBasis;
use crate::polynomial::{BasisEvaluator, PolynomialBasis};
use crate::quadrature::{facet_quadrature, make_quadrature};
use crate::reference_cell;
use crate::types::{BasisError, LocalCoefficients, LocalKey, ReferenceCellType};
use std::rc::Rc;

/// The receiving side of an interpolation pass: either a coefficient
/// vector fed by a single function, or a matrix fed by a candidate basis.
trait InterpolationTarget<F: Field> {
    /// The number of candidates (columns)
    fn count(&self) -> usize;
    /// Evaluate every candidate at a point into `out`, candidate-major
    fn evaluate_into(&self, point: &[F], out: &mut [F]);
    /// Accumulate into functional `row`, candidate `col`
    fn add(&mut self, row: usize, col: usize, value: F);
}

struct FunctionTarget<'a, F: Field, G: Fn(&[F]) -> Vec<F>> {
    function: &'a G,
    value_size: usize,
    coefficients: &'a mut Vec<F>,
}

impl<F: Field, G: Fn(&[F]) -> Vec<F>> InterpolationTarget<F> for FunctionTarget<'_, F, G> {
    fn count(&self) -> usize {
        1
    }
    fn evaluate_into(&self, point: &[F], out: &mut [F]) {
        let value = (self.function)(point);
        assert_eq!(value.len(), self.value_size);
        out.copy_from_slice(&value);
    }
    fn add(&mut self, row: usize, col: usize, value: F) {
        assert_eq!(col, 0);
        self.coefficients[row] += value;
    }
}

struct BasisTarget<'a, F: Field, B: BasisEvaluator<F>> {
    basis: &'a B,
    matrix: &'a mut DenseMatrix<F>,
}

impl<F: Field, B: BasisEvaluator<F>> InterpolationTarget<F> for BasisTarget<'_, F, B> {
    fn count(&self) -> usize {
        self.basis.size()
    }
    fn evaluate_into(&self, point: &[F], out: &mut [F]) {
        self.basis.evaluate(point, out);
    }
    fn add(&mut self, row: usize, col: usize, value: F) {
        self.matrix.add(row, col, value);
    }
}

/// The L2-moment degrees of freedom of a Raviart-Thomas element.
///
/// For order `k` on a `d`-simplex the functionals are, in this order: for
/// each facet, the moments of the normal flux against the facet test basis
/// (the orthonormal basis of degree `k` on the facet reference cell), and
/// for `k > 0` the moments of each vector component against the interior
/// test basis (the orthonormal basis of degree `k - 1` on the cell).
pub struct RaviartThomasL2Interpolation<F: Field> {
    cell_type: ReferenceCellType,
    order: usize,
    normals: Vec<Vec<F>>,
    facet_basis: Rc<PolynomialBasis<F, MonomialBasis<F>>>,
    interior_basis: Option<Rc<PolynomialBasis<F, MonomialBasis<F>>>>,
    size: usize,
}

impl<F: Field> RaviartThomasL2Interpolation<F> {
    /// Create the functional set, building its own test bases.
    pub fn new(cell_type: ReferenceCellType, order: usize) -> Result<Self, BasisError> {
        let facet_cell = match cell_type {
            ReferenceCellType::Triangle => ReferenceCellType::Interval,
            ReferenceCellType::Tetrahedron => ReferenceCellType::Triangle,
            _ => return Err(BasisError::UnsupportedCellType(cell_type)),
        };
        let facet_basis = Rc::new(orthonormal::basis::<F>(facet_cell, order));
        let interior_basis = if order > 0 {
            Some(Rc::new(orthonormal::basis::<F>(cell_type, order - 1)))
        } else {
            None
        };
        Ok(Self::with_test_bases(
            cell_type,
            order,
            facet_basis,
            interior_basis,
        ))
    }

    /// Create the functional set around shared test bases.
    ///
    /// The facet basis must live on the facet reference cell of
    /// `cell_type` with degree `order`; the interior basis on `cell_type`
    /// with degree `order - 1` (absent for order 0).
    pub fn with_test_bases(
        cell_type: ReferenceCellType,
        order: usize,
        facet_basis: Rc<PolynomialBasis<F, MonomialBasis<F>>>,
        interior_basis: Option<Rc<PolynomialBasis<F, MonomialBasis<F>>>>,
    ) -> Self {
        assert!(reference_cell::is_simplex(cell_type));
        let dim = reference_cell::dim(cell_type);
        assert!(dim >= 2);
        let nfacets = reference_cell::facets(cell_type).len();
        let normals = (0..nfacets)
            .map(|f| reference_cell::integration_outer_normal::<F>(cell_type, f))
            .collect::<Vec<_>>();
        let size = nfacets * facet_basis.size()
            + dim * interior_basis.as_ref().map_or(0, |b| b.size());
        log::debug!(
            "Raviart-Thomas functionals on {cell_type:?} at order {order}: {size} total"
        );
        Self {
            cell_type,
            order,
            normals,
            facet_basis,
            interior_basis,
            size,
        }
    }

    /// The polynomial order of the element these functionals define
    pub fn order(&self) -> usize {
        self.order
    }

    /// The number of functionals
    pub fn size(&self) -> usize {
        self.size
    }

    /// The cell the functionals are defined on
    pub fn cell_type(&self) -> ReferenceCellType {
        self.cell_type
    }

    /// Evaluate the functionals against a vector-valued function.
    ///
    /// Produces one coefficient per functional.
    pub fn interpolate_function<G: Fn(&[F]) -> Vec<F>>(
        &self,
        function: &G,
        coefficients: &mut Vec<F>,
    ) {
        coefficients.clear();
        coefficients.resize(self.size, F::zero());
        let value_size = reference_cell::dim(self.cell_type);
        let mut target = FunctionTarget {
            function,
            value_size,
            coefficients,
        };
        self.apply(&mut target);
    }

    /// Evaluate the functionals against every function of a candidate
    /// basis, filling `matrix` with one row per functional and one column
    /// per candidate.
    pub fn interpolate_basis<B: BasisEvaluator<F>>(&self, basis: &B, matrix: &mut DenseMatrix<F>) {
        assert_eq!(basis.value_size(), reference_cell::dim(self.cell_type));
        matrix.resize(self.size, basis.size());
        let mut target = BasisTarget { basis, matrix };
        self.apply(&mut target);
    }

    /// The degree-of-freedom layout matching the functional order.
    pub fn local_coefficients(&self) -> LocalCoefficients {
        let mut keys = Vec::with_capacity(self.size);
        for f in 0..self.normals.len() {
            for i in 0..self.facet_basis.size() {
                keys.push(LocalKey::new(f, 1, i));
            }
        }
        if let Some(interior) = &self.interior_basis {
            let dim = reference_cell::dim(self.cell_type);
            for i in 0..interior.size() * dim {
                keys.push(LocalKey::new(0, 0, i));
            }
        }
        assert_eq!(keys.len(), self.size);
        LocalCoefficients::new(keys)
    }

    fn apply<T: InterpolationTarget<F>>(&self, target: &mut T) {
        let dim = reference_cell::dim(self.cell_type);
        let mut candidate = vec![F::zero(); target.count() * dim];
        let mut facet_values = vec![F::zero(); self.facet_basis.size()];
        let mut row = 0;

        // facet flux moments
        for (f, normal) in self.normals.iter().enumerate() {
            let fq = facet_quadrature::<F>(self.cell_type, f, 2 * self.order + 2);
            for qi in 0..fq.local.npoints {
                self.facet_basis
                    .evaluate(fq.local.point(qi), &mut facet_values);
                target.evaluate_into(fq.parent_point(qi), &mut candidate);
                let weight = fq.local.weight(qi);
                for col in 0..target.count() {
                    let mut flux = F::zero();
                    for c in 0..dim {
                        flux += candidate[col * dim + c] * normal[c];
                    }
                    flux *= weight;
                    for (i, test) in facet_values.iter().enumerate() {
                        target.add(row + i, col, flux * *test);
                    }
                }
            }
            row += self.facet_basis.size();
        }

        // interior moments, one row block of `dim` per test function
        if let Some(interior) = &self.interior_basis {
            let rule = make_quadrature::<F>(self.cell_type, 2 * self.order + 1);
            let mut interior_values = vec![F::zero(); interior.size()];
            for qi in 0..rule.npoints {
                interior.evaluate(rule.point(qi), &mut interior_values);
                target.evaluate_into(rule.point(qi), &mut candidate);
                let weight = rule.weight(qi);
                for col in 0..target.count() {
                    for (i, test) in interior_values.iter().enumerate() {
                        for c in 0..dim {
                            target.add(
                                row + i * dim + c,
                                col,
                                weight * *test * candidate[col * dim + c],
                            );
                        }
                    }
                }
            }
            row += dim * interior.size();
        }
        assert_eq!(row, self.size);
    }
}

/// L2-projection degrees of freedom: moments against an orthonormal basis.
///
/// The `i`th functional maps `f` to the integral of `f` times the `i`th
/// orthonormal test function, which is the `i`th coefficient of the L2
/// projection of `f` onto the test space.
pub struct OrthonormalL2Interpolation<F: Field> {
    cell_type: ReferenceCellType,
    order: usize,
    basis: Rc<PolynomialBasis<F, MonomialBasis<F>>>,
}

impl<F: Field> OrthonormalL2Interpolation<F> {
    /// Create the functional set, building its own test basis.
    pub fn new(cell_type: ReferenceCellType, order: usize) -> Self {
        Self::with_test_basis(cell_type, order, Rc::new(orthonormal::basis(cell_type, order)))
    }

    /// Create the functional set around a shared test basis.
    pub fn with_test_basis(
        cell_type: ReferenceCellType,
        order: usize,
        basis: Rc<PolynomialBasis<F, MonomialBasis<F>>>,
    ) -> Self {
        Self {
            cell_type,
            order,
            basis,
        }
    }

    /// The number of functionals
    pub fn size(&self) -> usize {
        self.basis.size()
    }

    /// The polynomial order of the test space
    pub fn order(&self) -> usize {
        self.order
    }

    /// Evaluate the functionals against a scalar function.
    pub fn interpolate_function<G: Fn(&[F]) -> F>(&self, function: &G, coefficients: &mut Vec<F>) {
        coefficients.clear();
        coefficients.resize(self.size(), F::zero());
        let rule = make_quadrature::<F>(self.cell_type, 2 * self.order + 1);
        let mut test_values = vec![F::zero(); self.basis.size()];
        for qi in 0..rule.npoints {
            self.basis.evaluate(rule.point(qi), &mut test_values);
            let value = function(rule.point(qi)) * rule.weight(qi);
            for (coefficient, test) in coefficients.iter_mut().zip(&test_values) {
                *coefficient += value * *test;
            }
        }
    }

    /// Evaluate the functionals against every function of a scalar
    /// candidate basis.
    pub fn interpolate_basis<B: BasisEvaluator<F>>(&self, basis: &B, matrix: &mut DenseMatrix<F>) {
        assert_eq!(basis.value_size(), 1);
        matrix.resize(self.size(), basis.size());
        let rule = make_quadrature::<F>(self.cell_type, self.order + basis.order() + 1);
        let mut test_values = vec![F::zero(); self.basis.size()];
        let mut candidate_values = vec![F::zero(); basis.size()];
        for qi in 0..rule.npoints {
            self.basis.evaluate(rule.point(qi), &mut test_values);
            basis.evaluate(rule.point(qi), &mut candidate_values);
            let weight = rule.weight(qi);
            for (i, test) in test_values.iter().enumerate() {
                for (j, candidate) in candidate_values.iter().enumerate() {
                    matrix.add(i, j, weight * *test * *candidate);
                }
            }
        }
    }

    /// The degree-of-freedom layout: every functional lives on the cell
    /// interior.
    pub fn local_coefficients(&self) -> LocalCoefficients {
        LocalCoefficients::new((0..self.size()).map(|i| LocalKey::new(0, 0, i)).collect())
    }
}
