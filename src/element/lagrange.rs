//! Lagrange elements.
//!
//! Degrees of freedom are point evaluations at an equidistant lattice laid
//! out subentity by subentity, so the local keys fall out of the same walk
//! that generates the points. The dual (Vandermonde) matrix of monomial
//! values at the lattice is inverted in the compute field; equidistant
//! lattices make it badly conditioned well before the monomials do.

use crate::element::{dual_coefficients, CiarletElement};
use crate::field::{Extended, Field};
use crate::matrix::DenseMatrix;
use crate::monomial::MonomialBasis;
use crate::polynomial::PolynomialBasis;
use crate::reference_cell;
use crate::types::{
    BasisError, Continuity, LocalCoefficients, LocalKey, MapType, ReferenceCellType,
};
use std::rc::Rc;

/// The interior lattice points of a cell at the given degree, in the
/// cell's own reference coordinates.
fn interior_lattice<F: Field>(cell: ReferenceCellType, degree: usize) -> Vec<Vec<F>> {
    let p = degree;
    let step = |i: usize| F::from_usize(i) / F::from_usize(p);
    let mut points = vec![];
    match cell {
        ReferenceCellType::Interval => {
            for i in 1..p {
                points.push(vec![step(i)]);
            }
        }
        ReferenceCellType::Triangle => {
            for i in 1..p {
                for j in 1..p - i {
                    points.push(vec![step(i), step(j)]);
                }
            }
        }
        ReferenceCellType::Quadrilateral => {
            for i in 1..p {
                for j in 1..p {
                    points.push(vec![step(i), step(j)]);
                }
            }
        }
        ReferenceCellType::Tetrahedron => {
            for i in 1..p {
                for j in 1..p - i {
                    for k in 1..p - i - j {
                        points.push(vec![step(i), step(j), step(k)]);
                    }
                }
            }
        }
        ReferenceCellType::Hexahedron => {
            for i in 1..p {
                for j in 1..p {
                    for k in 1..p {
                        points.push(vec![step(i), step(j), step(k)]);
                    }
                }
            }
        }
        ReferenceCellType::Prism => {
            for i in 1..p {
                for j in 1..p - i {
                    for k in 1..p {
                        points.push(vec![step(i), step(j), step(k)]);
                    }
                }
            }
        }
        _ => {
            panic!("No interior lattice for {cell:?}");
        }
    }
    points
}

/// The full evaluation lattice with the matching degree-of-freedom keys,
/// walked vertices first, then edge interiors, then face interiors, then
/// the cell interior.
fn lattice_points<F: Field>(
    cell: ReferenceCellType,
    degree: usize,
) -> (Vec<Vec<F>>, Vec<LocalKey>) {
    let tdim = reference_cell::dim(cell);
    if degree == 0 {
        return (
            vec![reference_cell::midpoint::<F>(cell)],
            vec![LocalKey::new(0, 0, 0)],
        );
    }
    let vertices = reference_cell::vertices::<F>(cell);
    let mut points = vec![];
    let mut keys = vec![];

    for (v, vertex) in vertices.iter().enumerate() {
        points.push(vertex.clone());
        keys.push(LocalKey::new(v, tdim, 0));
    }

    for (e, edge) in reference_cell::edges(cell).iter().enumerate() {
        let v0 = &vertices[edge[0]];
        let v1 = &vertices[edge[1]];
        for i in 1..degree {
            let t = F::from_usize(i) / F::from_usize(degree);
            let mut point = v0.clone();
            for (x, (a, b)) in point.iter_mut().zip(v0.iter().zip(v1.iter())) {
                *x = *a + t * (*b - *a);
            }
            points.push(point);
            keys.push(LocalKey::new(e, tdim - 1, i - 1));
        }
    }

    if tdim >= 2 {
        if tdim == 2 {
            // the single face of a 2-d cell is the cell interior
            for (i, point) in interior_lattice::<F>(cell, degree).into_iter().enumerate() {
                points.push(point);
                keys.push(LocalKey::new(0, 0, i));
            }
        } else {
            for (f, face) in reference_cell::faces(cell).iter().enumerate() {
                let face_type = reference_cell::entity_types(cell)[2][f];
                let v0 = &vertices[face[0]];
                let v1 = &vertices[face[1]];
                let v2 = &vertices[face[2]];
                for (i, xi) in interior_lattice::<F>(face_type, degree).into_iter().enumerate() {
                    let mut point = v0.clone();
                    for (k, x) in point.iter_mut().enumerate() {
                        *x = v0[k] + xi[0] * (v1[k] - v0[k]) + xi[1] * (v2[k] - v0[k]);
                    }
                    points.push(point);
                    keys.push(LocalKey::new(f, 1, i));
                }
            }
            for (i, point) in interior_lattice::<F>(cell, degree).into_iter().enumerate() {
                points.push(point);
                keys.push(LocalKey::new(0, 0, i));
            }
        }
    }
    (points, keys)
}

/// Create a Lagrange element with the default compute field.
pub fn create<F: Field>(
    cell_type: ReferenceCellType,
    degree: usize,
    continuity: Continuity,
) -> Result<CiarletElement<F>, BasisError> {
    create_with::<F, Extended>(cell_type, degree, continuity, None)
}

/// Create a Lagrange element, dualizing in the compute field `CF` and
/// storing in `SF`.
pub fn create_with<SF: Field, CF: Field>(
    cell_type: ReferenceCellType,
    degree: usize,
    continuity: Continuity,
    pivot_tolerance: Option<f64>,
) -> Result<CiarletElement<SF>, BasisError> {
    if cell_type == ReferenceCellType::Point || cell_type == ReferenceCellType::Pyramid {
        return Err(BasisError::UnsupportedCellType(cell_type));
    }
    if degree == 0 && continuity == Continuity::Continuous {
        return Err(BasisError::ContinuousDegreeZero);
    }

    let (points, keys) = lattice_points::<CF>(cell_type, degree);
    let compute_mono = Rc::new(MonomialBasis::<CF>::new(cell_type, degree));
    assert_eq!(points.len(), MonomialBasis::size(&compute_mono));

    let n = MonomialBasis::size(&compute_mono);
    let mut dual_matrix = DenseMatrix::<CF>::new(n, n);
    let mut values = vec![CF::zero(); n];
    for (i, point) in points.iter().enumerate() {
        MonomialBasis::evaluate(&compute_mono, point, &mut values);
        for (j, value) in values.iter().enumerate() {
            dual_matrix.set(i, j, *value);
        }
    }

    let mut prebasis = PolynomialBasis::new(compute_mono, 1);
    prebasis.fill(&DenseMatrix::<CF>::identity(n));
    let coefficients = dual_coefficients::<SF, CF>(&dual_matrix, &prebasis, pivot_tolerance)?;

    let mono = Rc::new(MonomialBasis::<SF>::new(cell_type, degree));
    let mut basis = PolynomialBasis::new(mono, 1);
    basis.set_coefficients(coefficients);

    let mut local_coefficients = LocalCoefficients::new(keys);
    if continuity == Continuity::Discontinuous {
        local_coefficients.make_discontinuous();
    }
    Ok(CiarletElement::new(
        degree,
        MapType::Identity,
        continuity,
        basis,
        local_coefficients,
    ))
}
