//! Quadrature rules on reference cells.
//!
//! Rules are built recursively on the cell structure. A prism extension
//! takes the tensor product of the base rule with a 1-D Gauss-Legendre
//! rule. A pyramid extension combines the base rule with a 1-D rule along
//! the cone axis; the conical Jacobian factor `(1-t)^{dim base}` is
//! absorbed into the 1-D weights, with the 1-D exactness raised to match,
//! which keeps the rule exact for all monomials up to the requested total
//! degree.

use crate::field::Field;
use crate::reference_cell;
use crate::reference_cell::CellStructure;
use crate::types::ReferenceCellType;
use itertools::Itertools;
use std::collections::HashMap;
use std::rc::Rc;

/// A quadrature rule on a reference cell.
pub struct Quadrature<F: Field> {
    /// The cell the rule was built for
    pub cell_type: ReferenceCellType,
    /// The requested exactness order: the rule integrates every monomial of
    /// total degree up to this order exactly
    pub order: usize,
    /// The number of points
    pub npoints: usize,
    /// The dimension of a single point
    pub dim: usize,
    /// The point coordinates, stored consecutively per point
    pub points: Vec<F>,
    /// The weights
    pub weights: Vec<F>,
}

impl<F: Field> Quadrature<F> {
    /// The coordinates of the `i`th point
    pub fn point(&self, i: usize) -> &[F] {
        assert!(i < self.npoints);
        &self.points[i * self.dim..(i + 1) * self.dim]
    }

    /// The weight of the `i`th point
    pub fn weight(&self, i: usize) -> F {
        assert!(i < self.npoints);
        self.weights[i]
    }
}

/// The Gauss-Legendre rule with `npoints` points on `[0, 1]`.
///
/// Nodes are the roots of the Legendre polynomial, found by Newton
/// iteration on the three-term recurrence from Chebyshev initial guesses.
/// The iteration runs in the target field, so nodes and weights carry the
/// field's full precision. Exact for polynomials of degree
/// `2 * npoints - 1`.
pub fn gauss_legendre_interval<F: Field>(npoints: usize) -> (Vec<F>, Vec<F>) {
    assert!(npoints > 0);
    let n = npoints;
    let two = F::from_usize(2);
    let mut points = Vec::with_capacity(n);
    let mut weights = Vec::with_capacity(n);
    for i in 0..n {
        // initial guess on [-1, 1]; machine precision suffices, Newton
        // restores the rest
        let guess = (std::f64::consts::PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
        let mut x = F::from_f64(guess);
        for _ in 0..100 {
            let (p, dp) = legendre_with_derivative(n, x);
            let step = p / dp;
            x -= step;
            if step.abs() <= F::epsilon() * F::from_usize(4) {
                break;
            }
        }
        let (_, dp) = legendre_with_derivative(n, x);
        let weight = two / ((F::one() - x * x) * dp * dp);
        // map [-1, 1] onto [0, 1]
        points.push((x + F::one()) / two);
        weights.push(weight / two);
    }
    (points, weights)
}

/// The Legendre polynomial of degree `n` and its derivative at `x`, by the
/// three-term recurrence.
fn legendre_with_derivative<F: Field>(n: usize, x: F) -> (F, F) {
    let two = F::from_usize(2);
    let mut p_prev = F::one();
    let mut p = x;
    for k in 2..=n {
        let kf = F::from_usize(k);
        let next = ((two * kf - F::one()) * x * p - (kf - F::one()) * p_prev) / kf;
        p_prev = p;
        p = next;
    }
    let derivative = F::from_usize(n) * (x * p - p_prev) / (x * x - F::one());
    (p, derivative)
}

/// Build a rule of the requested exactness order on a cell.
pub fn make_quadrature<F: Field>(cell: ReferenceCellType, order: usize) -> Quadrature<F> {
    let dim = reference_cell::dim(cell);
    match reference_cell::structure(cell) {
        CellStructure::Point => Quadrature {
            cell_type: cell,
            order,
            npoints: 1,
            dim: 0,
            points: vec![],
            weights: vec![F::one()],
        },
        CellStructure::PrismOver(base) => {
            let base_rule = make_quadrature::<F>(base, order);
            let n1 = order / 2 + 1;
            let (t, w) = gauss_legendre_interval::<F>(n1);
            let mut points = Vec::with_capacity(base_rule.npoints * n1 * dim);
            let mut weights = Vec::with_capacity(base_rule.npoints * n1);
            for (bi, ti) in (0..base_rule.npoints).cartesian_product(0..n1) {
                points.extend_from_slice(base_rule.point(bi));
                points.push(t[ti]);
                weights.push(base_rule.weight(bi) * w[ti]);
            }
            Quadrature {
                cell_type: cell,
                order,
                npoints: base_rule.npoints * n1,
                dim,
                points,
                weights,
            }
        }
        CellStructure::PyramidOver(base) => {
            let base_dim = reference_cell::dim(base);
            let base_rule = make_quadrature::<F>(base, order);
            // the absorbed Jacobian factor (1-t)^base_dim raises the 1-D
            // polynomial degree by base_dim
            let n1 = (order + base_dim) / 2 + 1;
            let (t, w) = gauss_legendre_interval::<F>(n1);
            let mut points = Vec::with_capacity(base_rule.npoints * n1 * dim);
            let mut weights = Vec::with_capacity(base_rule.npoints * n1);
            for (bi, ti) in (0..base_rule.npoints).cartesian_product(0..n1) {
                let scale = F::one() - t[ti];
                for x in base_rule.point(bi) {
                    points.push(*x * scale);
                }
                points.push(t[ti]);
                weights.push(base_rule.weight(bi) * w[ti] * scale.powi(base_dim as i32));
            }
            Quadrature {
                cell_type: cell,
                order,
                npoints: base_rule.npoints * n1,
                dim,
                points,
                weights,
            }
        }
    }
}

/// A rule on a codimension-1 subentity of a cell.
///
/// Holds the rule in the facet's own reference coordinates together with
/// the quadrature points pushed through the facet embedding into the
/// parent cell's coordinates. Weights are with respect to the facet
/// reference measure; the embedding Jacobian is carried by the facet's
/// integration outer normal.
pub struct FacetQuadrature<F: Field> {
    /// The facet index within the parent cell
    pub facet: usize,
    /// The rule on the facet's reference cell
    pub local: Quadrature<F>,
    /// The quadrature points in parent cell coordinates, stored
    /// consecutively per point
    pub parent_points: Vec<F>,
}

impl<F: Field> FacetQuadrature<F> {
    /// The parent-coordinates of the `i`th point
    pub fn parent_point(&self, i: usize) -> &[F] {
        let dim = self.parent_points.len() / self.local.npoints;
        &self.parent_points[i * dim..(i + 1) * dim]
    }
}

/// Build a rule on a facet of a cell, embedded into the cell.
pub fn facet_quadrature<F: Field>(
    cell: ReferenceCellType,
    facet: usize,
    order: usize,
) -> FacetQuadrature<F> {
    let dim = reference_cell::dim(cell);
    let facet_cell = reference_cell::facet_type(cell, facet);
    let local = make_quadrature::<F>(facet_cell, order);
    let (origin, directions) = reference_cell::facet_embedding::<F>(cell, facet);
    let mut parent_points = Vec::with_capacity(local.npoints * dim);
    for i in 0..local.npoints {
        let xi = local.point(i);
        for d in 0..dim {
            let mut x = origin[d];
            for (k, dir) in directions.iter().enumerate() {
                x += xi[k] * dir[d];
            }
            parent_points.push(x);
        }
    }
    FacetQuadrature {
        facet,
        local,
        parent_points,
    }
}

/// A cache of quadrature rules keyed on cell type and exactness order.
///
/// Rule construction is not free, and an interpolation pass asks for the
/// same rule once per functional family. The cache owns its rules and
/// hands out shared handles; it is not synchronised and must stay on one
/// thread.
#[derive(Default)]
pub struct QuadratureCache<F: Field> {
    rules: HashMap<(ReferenceCellType, usize), Rc<Quadrature<F>>>,
}

impl<F: Field> QuadratureCache<F> {
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    /// Get or build the rule for a cell and exactness order
    pub fn rule(&mut self, cell: ReferenceCellType, order: usize) -> Rc<Quadrature<F>> {
        if let Some(rule) = self.rules.get(&(cell, order)) {
            return rule.clone();
        }
        log::debug!("building quadrature rule for {cell:?} at order {order}");
        let rule = Rc::new(make_quadrature::<F>(cell, order));
        self.rules.insert((cell, order), rule.clone());
        rule
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::field::Extended;
    use crate::monomial::{monomial_integral, MonomialBasis};
    use approx::assert_relative_eq;
    use num::traits::{One, Zero};
    use paste::paste;

    #[test]
    fn test_gauss_legendre_nodes() {
        let (points, weights) = gauss_legendre_interval::<f64>(3);
        let total: f64 = weights.iter().sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-14);
        // the 3 point rule integrates x^5 over [0, 1] exactly
        let mut integral = 0.0;
        for (x, w) in points.iter().zip(&weights) {
            integral += w * x.powi(5);
        }
        assert_relative_eq!(integral, 1.0 / 6.0, epsilon = 1e-14);
        // midpoint node of the odd rule
        assert!(points.iter().any(|x| (x - 0.5).abs() < 1e-14));
    }

    #[test]
    fn test_gauss_legendre_extended_precision() {
        let (points, weights) = gauss_legendre_interval::<Extended>(5);
        let mut total = Extended::zero();
        for w in &weights {
            total += *w;
        }
        assert!((total - Extended::one()).abs().to_f64() < 1e-30);
        let mut integral = Extended::zero();
        for (x, w) in points.iter().zip(&weights) {
            integral += *w * x.powi(8);
        }
        assert!((integral - Extended::from_f64(1.0 / 9.0)).abs().to_f64() < 1e-28);
    }

    macro_rules! test_cell {

        ($($cell:ident),+) => {

        $(
            paste! {

                #[test]
                fn [<test_volume_ $cell:lower>]() {
                    for order in 0..6 {
                        let rule = make_quadrature::<f64>(ReferenceCellType::[<$cell>], order);
                        let volume_actual: f64 = rule.weights.iter().sum();
                        let volume_expected =
                            crate::reference_cell::volume::<f64>(ReferenceCellType::[<$cell>]);
                        assert_relative_eq!(volume_actual, volume_expected, max_relative = 1e-13);
                    }
                }

                #[test]
                fn [<test_exactness_ $cell:lower>]() {
                    for order in 0..6 {
                        let rule = make_quadrature::<f64>(ReferenceCellType::[<$cell>], order);
                        let basis = MonomialBasis::<f64>::new(ReferenceCellType::[<$cell>], order);
                        let mut values = vec![0.0; basis.size()];
                        let mut sums = vec![0.0; basis.size()];
                        for qi in 0..rule.npoints {
                            basis.evaluate(rule.point(qi), &mut values);
                            for (sum, value) in sums.iter_mut().zip(&values) {
                                *sum += rule.weight(qi) * value;
                            }
                        }
                        for (mi, sum) in basis.multi_indices().iter().zip(&sums) {
                            if mi.degree() <= order {
                                let exact =
                                    monomial_integral::<f64>(ReferenceCellType::[<$cell>], mi);
                                assert_relative_eq!(*sum, exact, epsilon = 1e-13, max_relative = 1e-12);
                            }
                        }
                    }
                }

            }
        )*
        };
    }

    test_cell!(
        Interval,
        Triangle,
        Quadrilateral,
        Tetrahedron,
        Hexahedron,
        Prism,
        Pyramid
    );

    #[test]
    fn test_order_zero_integrates_volume() {
        let rule = make_quadrature::<f64>(ReferenceCellType::Tetrahedron, 0);
        assert!(rule.npoints >= 1);
        let total: f64 = rule.weights.iter().sum();
        assert_relative_eq!(total, 1.0 / 6.0, epsilon = 1e-14);
    }

    #[test]
    fn test_facet_quadrature_triangle() {
        // flux-style integral of x + y over the diagonal edge: the facet
        // rule carries the reference measure, the length scaling sits in
        // the integration normal
        let fq = facet_quadrature::<f64>(ReferenceCellType::Triangle, 0, 2);
        let mut integral = 0.0;
        for qi in 0..fq.local.npoints {
            let x = fq.parent_point(qi);
            integral += fq.local.weight(qi) * (x[0] + x[1]);
        }
        // x + y = 1 on the diagonal, reference measure 1
        assert_relative_eq!(integral, 1.0, epsilon = 1e-14);
        for qi in 0..fq.local.npoints {
            let x = fq.parent_point(qi);
            assert_relative_eq!(x[0] + x[1], 1.0, epsilon = 1e-14);
        }
    }

    #[test]
    fn test_facet_quadrature_tetrahedron_face_area() {
        for facet in 0..4 {
            let fq = facet_quadrature::<f64>(ReferenceCellType::Tetrahedron, facet, 1);
            let total: f64 = fq.local.weights.iter().sum();
            assert_relative_eq!(total, 0.5, epsilon = 1e-14);
        }
    }

    #[test]
    fn test_cache_returns_shared_rule() {
        let mut cache = QuadratureCache::<f64>::new();
        let a = cache.rule(ReferenceCellType::Triangle, 3);
        let b = cache.rule(ReferenceCellType::Triangle, 3);
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(a.cell_type, ReferenceCellType::Triangle);
    }
}
