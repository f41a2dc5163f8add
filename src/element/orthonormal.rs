//! L2-orthonormal bases.
//!
//! Built by modified Gram-Schmidt over the monomial basis, with all inner
//! products taken from the exact reference-cell moments rather than
//! quadrature. Serves as a discontinuous element family and as the test
//! spaces of the Raviart-Thomas functionals.

use crate::field::{Extended, Field};
use crate::matrix::DenseMatrix;
use crate::monomial::{monomial_integral, MonomialBasis};
use crate::polynomial::{BasisEvaluator, PolynomialBasis};
use crate::types::{BasisError, Continuity, LocalCoefficients, LocalKey, MapType, ReferenceCellType};
use crate::element::CiarletElement;
use std::rc::Rc;

/// The orthonormalizing coefficient matrix over a monomial basis.
///
/// Row `i` holds the coefficients of the `i`th orthonormal function over
/// the monomials; the matrix is lower triangular in the monomial ordering.
fn gram_schmidt_matrix<F: Field>(mono: &MonomialBasis<F>) -> DenseMatrix<F> {
    let n = mono.size();
    let cell = mono.cell_type();
    let indices = mono.multi_indices();
    let mut moments = DenseMatrix::<F>::new(n, n);
    for i in 0..n {
        for j in 0..=i {
            let value = monomial_integral::<F>(cell, &(&indices[i] * &indices[j]));
            moments.set(i, j, value);
            moments.set(j, i, value);
        }
    }
    let mut coefficients = DenseMatrix::<F>::new(n, n);
    for i in 0..n {
        coefficients.set(i, i, F::one());
        for j in 0..i {
            // moment of the current residual against the finished function j
            let mut projection = F::zero();
            for k in 0..=i {
                let cik = coefficients.get(i, k);
                if cik == F::zero() {
                    continue;
                }
                let mut inner = F::zero();
                for l in 0..=j {
                    inner += coefficients.get(j, l) * moments.get(k, l);
                }
                projection += cik * inner;
            }
            for l in 0..=j {
                let cjl = coefficients.get(j, l);
                coefficients.add(i, l, -projection * cjl);
            }
        }
        let mut norm2 = F::zero();
        for k in 0..=i {
            for l in 0..=i {
                norm2 += coefficients.get(i, k) * coefficients.get(i, l) * moments.get(k, l);
            }
        }
        let norm = norm2.sqrt();
        for l in 0..=i {
            coefficients.set(i, l, coefficients.get(i, l) / norm);
        }
    }
    coefficients
}

/// The orthonormal basis of the given degree on a cell.
pub fn basis<F: Field>(cell_type: ReferenceCellType, degree: usize) -> PolynomialBasis<F, MonomialBasis<F>> {
    let mono = Rc::new(MonomialBasis::<F>::new(cell_type, degree));
    let coefficients = gram_schmidt_matrix(&mono);
    let mut result = PolynomialBasis::new(mono, 1);
    result.fill(&coefficients);
    result
}

/// Create an orthonormal element with the default compute field.
pub fn create<F: Field>(
    cell_type: ReferenceCellType,
    degree: usize,
) -> Result<CiarletElement<F>, BasisError> {
    create_with::<F, Extended>(cell_type, degree)
}

/// Create an orthonormal element, orthonormalizing in the compute field
/// `CF` and storing in `SF`.
pub fn create_with<SF: Field, CF: Field>(
    cell_type: ReferenceCellType,
    degree: usize,
) -> Result<CiarletElement<SF>, BasisError> {
    if cell_type == ReferenceCellType::Point {
        return Err(BasisError::UnsupportedCellType(cell_type));
    }
    let compute_mono = MonomialBasis::<CF>::new(cell_type, degree);
    let coefficients = gram_schmidt_matrix(&compute_mono);
    let mono = Rc::new(MonomialBasis::<SF>::new(cell_type, degree));
    let mut basis = PolynomialBasis::new(mono, 1);
    basis.fill_cast(&coefficients, 0.0);
    let keys = LocalCoefficients::new(
        (0..basis.size()).map(|i| LocalKey::new(0, 0, i)).collect(),
    );
    Ok(CiarletElement::new(
        degree,
        MapType::L2Piola,
        Continuity::Discontinuous,
        basis,
        keys,
    ))
}
