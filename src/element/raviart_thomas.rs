//! Raviart-Thomas elements on simplices.
//!
//! The candidate space of order `k` is `(P_k)^d` enriched with `x` times
//! the homogeneous polynomials of exact degree `k`. Its coefficient matrix
//! over the vector monomial basis is assembled symbolically from the
//! monomial multi-indices; the degrees of freedom are the L2 flux and
//! interior moments of [`crate::interpolation::RaviartThomasL2Interpolation`].

use crate::element::{dual_coefficients, CiarletElement};
use crate::field::{Extended, Field};
use crate::interpolation::RaviartThomasL2Interpolation;
use crate::matrix::DenseMatrix;
use crate::monomial::{MonomialBasis, MultiIndex};
use crate::polynomial::{BasisEvaluator, PolynomialBasis};
use crate::reference_cell;
use crate::types::{BasisError, Continuity, MapType, ReferenceCellType};
use std::rc::Rc;

/// The coefficient matrix of the Raviart-Thomas candidate space over the
/// degree `k + 1` monomial basis.
///
/// The first `dim * P` functions are the `dim` copies of every monomial of
/// degree at most `k`; the remaining `H` functions are `x * m` for each
/// monomial `m` of exact degree `k`, located in the monomial basis by
/// multi-index search.
fn vector_prebasis<F: Field>(mono: &MonomialBasis<F>, degree: usize) -> DenseMatrix<F> {
    let dim = mono.dimension();
    let sizes = mono.sizes();
    let scalar_count = sizes[degree];
    let homogeneous_count = if degree == 0 {
        sizes[0]
    } else {
        sizes[degree] - sizes[degree - 1]
    };
    let nfunctions = scalar_count * dim + homogeneous_count;
    let mut matrix = DenseMatrix::<F>::new(nfunctions * dim, MonomialBasis::size(mono));

    for i in 0..scalar_count {
        for r in 0..dim {
            matrix.set((i * dim + r) * dim + r, i, F::one());
        }
    }
    let indices = mono.multi_indices();
    for (offset, i) in (scalar_count - homogeneous_count..scalar_count).enumerate() {
        let function = scalar_count * dim + offset;
        for r in 0..dim {
            let shifted = &indices[i] * &MultiIndex::unit(dim, r);
            let column = mono.index_of(&shifted).unwrap();
            matrix.set(function * dim + r, column, F::one());
        }
    }
    matrix
}

/// Create a Raviart-Thomas element with the default compute field.
pub fn create<F: Field>(
    cell_type: ReferenceCellType,
    degree: usize,
    continuity: Continuity,
) -> Result<CiarletElement<F>, BasisError> {
    create_with::<F, Extended>(cell_type, degree, continuity, None)
}

/// Create a Raviart-Thomas element, dualizing in the compute field `CF`
/// and storing in `SF`.
///
/// Only triangles and tetrahedra are supported; the functional family has
/// no counterpart on tensor cells.
pub fn create_with<SF: Field, CF: Field>(
    cell_type: ReferenceCellType,
    degree: usize,
    continuity: Continuity,
    pivot_tolerance: Option<f64>,
) -> Result<CiarletElement<SF>, BasisError> {
    if cell_type != ReferenceCellType::Triangle && cell_type != ReferenceCellType::Tetrahedron {
        return Err(BasisError::UnsupportedCellType(cell_type));
    }
    let dim = reference_cell::dim(cell_type);

    let interpolation = RaviartThomasL2Interpolation::<CF>::new(cell_type, degree)?;

    let compute_mono = Rc::new(MonomialBasis::<CF>::new(cell_type, degree + 1));
    let prebasis_matrix = vector_prebasis(&compute_mono, degree);
    let mut prebasis = PolynomialBasis::new(compute_mono, dim);
    prebasis.fill(&prebasis_matrix);
    assert_eq!(prebasis.size(), interpolation.size());

    let mut dual_matrix = DenseMatrix::<CF>::new(0, 0);
    interpolation.interpolate_basis(&prebasis, &mut dual_matrix);
    let coefficients = dual_coefficients::<SF, CF>(&dual_matrix, &prebasis, pivot_tolerance)?;

    let mono = Rc::new(MonomialBasis::<SF>::new(cell_type, degree + 1));
    let mut basis = PolynomialBasis::new(mono, dim);
    basis.set_coefficients(coefficients);

    let mut local_coefficients = interpolation.local_coefficients();
    if continuity == Continuity::Discontinuous {
        local_coefficients.make_discontinuous();
    }
    Ok(CiarletElement::new(
        degree,
        MapType::ContravariantPiola,
        continuity,
        basis,
        local_coefficients,
    ))
}
