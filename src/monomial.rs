//! Monomial bases over reference cells.
//!
//! The monomial basis of degree `p` on a cell is enumerated recursively on
//! the cell structure: a prism extension pairs every base monomial with
//! every extension exponent up to `p`, a pyramid extension caps the sum of
//! base degree and extension exponent at `p`. On simplices this yields all
//! monomials of total degree at most `p`; on tensor cells the per-axis sets.
//!
//! The ordering groups monomials by the smallest degree whose basis
//! contains them, so the degree-`k` basis is a prefix of the degree-`p`
//! basis for every `k <= p`. Coefficient matrices computed against one
//! instance stay valid for any other instance with the same cell and
//! degree.

use crate::field::Field;
use crate::reference_cell;
use crate::reference_cell::CellStructure;
use crate::types::ReferenceCellType;
use std::fmt;
use std::marker::PhantomData;
use std::ops::Mul;

/// The exponent vector of one monomial.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MultiIndex {
    exponents: Vec<usize>,
}

impl MultiIndex {
    /// The constant monomial in `dim` variables
    pub fn zero(dim: usize) -> Self {
        Self {
            exponents: vec![0; dim],
        }
    }

    /// The monomial `x_direction` in `dim` variables
    pub fn unit(dim: usize, direction: usize) -> Self {
        assert!(direction < dim);
        let mut exponents = vec![0; dim];
        exponents[direction] = 1;
        Self { exponents }
    }

    /// Create from an exponent vector
    pub fn from_exponents(exponents: Vec<usize>) -> Self {
        Self { exponents }
    }

    /// The number of variables
    pub fn dim(&self) -> usize {
        self.exponents.len()
    }

    /// The total degree
    pub fn degree(&self) -> usize {
        self.exponents.iter().sum()
    }

    /// The exponent of variable `i`
    pub fn exponent(&self, i: usize) -> usize {
        self.exponents[i]
    }

    /// The exponent vector
    pub fn exponents(&self) -> &[usize] {
        &self.exponents
    }

    fn with_appended(&self, exponent: usize) -> Self {
        let mut exponents = self.exponents.clone();
        exponents.push(exponent);
        Self { exponents }
    }
}

impl Mul<&MultiIndex> for &MultiIndex {
    type Output = MultiIndex;

    /// Multiply two monomials by adding their exponent vectors
    fn mul(self, other: &MultiIndex) -> MultiIndex {
        assert_eq!(self.dim(), other.dim());
        MultiIndex {
            exponents: self
                .exponents
                .iter()
                .zip(other.exponents.iter())
                .map(|(a, b)| a + b)
                .collect(),
        }
    }
}

impl fmt::Display for MultiIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.degree() == 0 {
            return write!(f, "1");
        }
        let mut first = true;
        for (i, e) in self.exponents.iter().enumerate() {
            if *e > 0 {
                if !first {
                    write!(f, " ")?;
                }
                first = false;
                if *e == 1 {
                    write!(f, "x{i}")?;
                } else {
                    write!(f, "x{i}^{e}")?;
                }
            }
        }
        Ok(())
    }
}

/// The number of monomials in the degree-`degree` basis on a cell
pub fn monomial_count(cell: ReferenceCellType, degree: usize) -> usize {
    match reference_cell::structure(cell) {
        CellStructure::Point => 1,
        CellStructure::PrismOver(base) => monomial_count(base, degree) * (degree + 1),
        CellStructure::PyramidOver(base) => {
            (0..=degree).map(|l| monomial_count(base, degree - l)).sum()
        }
    }
}

/// The topology degree of a monomial on a cell: the smallest `k` for which
/// the degree-`k` basis contains it.
fn topology_degree(cell: ReferenceCellType, mi: &MultiIndex) -> usize {
    match reference_cell::structure(cell) {
        CellStructure::Point => 0,
        CellStructure::PrismOver(base) => {
            let l = mi.exponent(mi.dim() - 1);
            let head = MultiIndex::from_exponents(mi.exponents()[..mi.dim() - 1].to_vec());
            topology_degree(base, &head).max(l)
        }
        CellStructure::PyramidOver(base) => {
            let l = mi.exponent(mi.dim() - 1);
            let head = MultiIndex::from_exponents(mi.exponents()[..mi.dim() - 1].to_vec());
            topology_degree(base, &head) + l
        }
    }
}

/// All monomials of exact topology degree `degree`, in canonical order
fn exact_degree_indices(cell: ReferenceCellType, degree: usize) -> Vec<MultiIndex> {
    match reference_cell::structure(cell) {
        CellStructure::Point => {
            if degree == 0 {
                vec![MultiIndex::zero(0)]
            } else {
                vec![]
            }
        }
        CellStructure::PyramidOver(base) => {
            let mut indices = vec![];
            for l in 0..=degree {
                for mi in exact_degree_indices(base, degree - l) {
                    indices.push(mi.with_appended(l));
                }
            }
            indices
        }
        CellStructure::PrismOver(base) => {
            let mut indices = vec![];
            for l in 0..degree {
                for mi in exact_degree_indices(base, degree) {
                    indices.push(mi.with_appended(l));
                }
            }
            for d in 0..=degree {
                for mi in exact_degree_indices(base, d) {
                    indices.push(mi.with_appended(degree));
                }
            }
            indices
        }
    }
}

/// The exact moment of a monomial over the reference cell.
///
/// Computed from the recursive cell structure: a prism extension
/// contributes an interval moment `1/(l+1)`, a pyramid extension a Beta
/// moment that accounts for the conical scaling of the base coordinates.
pub fn monomial_integral<F: Field>(cell: ReferenceCellType, mi: &MultiIndex) -> F {
    assert_eq!(mi.dim(), reference_cell::dim(cell));
    match reference_cell::structure(cell) {
        CellStructure::Point => F::one(),
        CellStructure::PrismOver(base) => {
            let l = mi.exponent(mi.dim() - 1);
            let head = MultiIndex::from_exponents(mi.exponents()[..mi.dim() - 1].to_vec());
            monomial_integral::<F>(base, &head) / F::from_usize(l + 1)
        }
        CellStructure::PyramidOver(base) => {
            let l = mi.exponent(mi.dim() - 1);
            let head = MultiIndex::from_exponents(mi.exponents()[..mi.dim() - 1].to_vec());
            let b = reference_cell::dim(base) + head.degree();
            // Beta(l + 1, b + 1) = l! b! / (l + b + 1)!
            let mut beta = F::one() / F::from_usize(b + 1);
            for j in 1..=l {
                beta *= F::from_usize(j) / F::from_usize(b + 1 + j);
            }
            monomial_integral::<F>(base, &head) * beta
        }
    }
}

/// A monomial basis on a reference cell.
pub struct MonomialBasis<F: Field> {
    cell_type: ReferenceCellType,
    degree: usize,
    dim: usize,
    indices: Vec<MultiIndex>,
    sizes: Vec<usize>,
    _field: PhantomData<F>,
}

impl<F: Field> MonomialBasis<F> {
    /// Create the monomial basis of the given degree
    pub fn new(cell_type: ReferenceCellType, degree: usize) -> Self {
        let dim = reference_cell::dim(cell_type);
        let mut indices = vec![];
        let mut sizes = Vec::with_capacity(degree + 1);
        for d in 0..=degree {
            indices.extend(exact_degree_indices(cell_type, d));
            sizes.push(indices.len());
        }
        debug_assert_eq!(indices.len(), monomial_count(cell_type, degree));
        debug_assert!(indices
            .iter()
            .zip(indices.iter().skip(1))
            .all(|(a, b)| topology_degree(cell_type, a) <= topology_degree(cell_type, b)));
        Self {
            cell_type,
            degree,
            dim,
            indices,
            sizes,
            _field: PhantomData,
        }
    }

    /// The cell this basis is defined on
    pub fn cell_type(&self) -> ReferenceCellType {
        self.cell_type
    }

    /// The degree this basis was constructed for
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// The dimension of the cell
    pub fn dimension(&self) -> usize {
        self.dim
    }

    /// The number of monomials
    pub fn size(&self) -> usize {
        self.indices.len()
    }

    /// Prefix counts: `sizes()[k]` is the number of monomials of topology
    /// degree at most `k`
    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    /// The exponent vectors, in basis order
    pub fn multi_indices(&self) -> &[MultiIndex] {
        &self.indices
    }

    /// The linear index of a monomial in this basis
    pub fn index_of(&self, mi: &MultiIndex) -> Option<usize> {
        self.indices.iter().position(|m| m == mi)
    }

    /// Evaluate every monomial at a point
    pub fn evaluate(&self, point: &[F], values: &mut [F]) {
        assert_eq!(point.len(), self.dim);
        assert_eq!(values.len(), self.size());
        for (mi, value) in self.indices.iter().zip(values.iter_mut()) {
            *value = monomial_value(mi, point, &[]);
        }
    }

    /// Evaluate the first derivatives of every monomial at a point.
    ///
    /// `jacobians[i * dim + d]` receives the derivative of monomial `i` in
    /// direction `d`.
    pub fn evaluate_jacobian(&self, point: &[F], jacobians: &mut [F]) {
        assert_eq!(point.len(), self.dim);
        assert_eq!(jacobians.len(), self.size() * self.dim);
        for (i, mi) in self.indices.iter().enumerate() {
            for d in 0..self.dim {
                jacobians[i * self.dim + d] = monomial_value(mi, point, &[d]);
            }
        }
    }

    /// Evaluate the second derivatives of every monomial at a point.
    ///
    /// `hessians[(i * dim + d0) * dim + d1]` receives the second derivative
    /// of monomial `i` in directions `d0`, `d1`.
    pub fn evaluate_hessian(&self, point: &[F], hessians: &mut [F]) {
        assert_eq!(point.len(), self.dim);
        assert_eq!(hessians.len(), self.size() * self.dim * self.dim);
        for (i, mi) in self.indices.iter().enumerate() {
            for d0 in 0..self.dim {
                for d1 in 0..self.dim {
                    hessians[(i * self.dim + d0) * self.dim + d1] =
                        monomial_value(mi, point, &[d0, d1]);
                }
            }
        }
    }

    /// The exact moments of every monomial over the reference cell
    pub fn integrals(&self, out: &mut [F]) {
        assert_eq!(out.len(), self.size());
        for (mi, value) in self.indices.iter().zip(out.iter_mut()) {
            *value = monomial_integral(self.cell_type, mi);
        }
    }
}

/// The value of a monomial derivative at a point.
///
/// `lowered` lists the directions to differentiate in, with multiplicity.
fn monomial_value<F: Field>(mi: &MultiIndex, point: &[F], lowered: &[usize]) -> F {
    let mut factor = 1usize;
    let mut exponents: Vec<usize> = mi.exponents().to_vec();
    for d in lowered {
        if exponents[*d] == 0 {
            return F::zero();
        }
        factor *= exponents[*d];
        exponents[*d] -= 1;
    }
    let mut value = F::from_usize(factor);
    for (x, e) in point.iter().zip(exponents.iter()) {
        if *e > 0 {
            value *= x.powi(*e as i32);
        }
    }
    value
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;
    use paste::paste;

    #[test]
    fn test_multi_index_product() {
        let a = MultiIndex::from_exponents(vec![2, 0, 1]);
        let b = MultiIndex::unit(3, 1);
        let c = &a * &b;
        assert_eq!(c.exponents(), &[2, 1, 1]);
        assert_eq!(c.degree(), 4);
    }

    macro_rules! test_count {

        ($(($cell:ident, $degree:literal, $count:expr)),+) => {

        $(
            paste! {

                #[test]
                fn [<test_count_ $cell:lower _ $degree>]() {
                    let basis = MonomialBasis::<f64>::new(ReferenceCellType::[<$cell>], $degree);
                    assert_eq!(basis.size(), $count);
                    assert_eq!(monomial_count(ReferenceCellType::[<$cell>], $degree), $count);
                }

            }
        )*
        };
    }

    test_count!(
        (Interval, 3, 4),
        (Triangle, 2, 6),
        (Triangle, 4, 15),
        (Quadrilateral, 2, 9),
        (Tetrahedron, 2, 10),
        (Tetrahedron, 3, 20),
        (Hexahedron, 2, 27),
        (Prism, 2, 18),
        (Pyramid, 1, 5)
    );

    #[test]
    fn test_nested_ordering() {
        // the degree-k basis must be a prefix of the degree-p basis
        for cell in [
            ReferenceCellType::Interval,
            ReferenceCellType::Triangle,
            ReferenceCellType::Quadrilateral,
            ReferenceCellType::Tetrahedron,
            ReferenceCellType::Hexahedron,
            ReferenceCellType::Prism,
        ] {
            let big = MonomialBasis::<f64>::new(cell, 4);
            for k in 0..4 {
                let small = MonomialBasis::<f64>::new(cell, k);
                assert_eq!(small.size(), big.sizes()[k]);
                for (a, b) in small.multi_indices().iter().zip(big.multi_indices()) {
                    assert_eq!(a, b);
                }
            }
        }
    }

    #[test]
    fn test_index_bijection_is_stable() {
        let basis = MonomialBasis::<f64>::new(ReferenceCellType::Tetrahedron, 3);
        for (i, mi) in basis.multi_indices().iter().enumerate() {
            assert_eq!(basis.index_of(mi), Some(i));
        }
        let again = MonomialBasis::<f64>::new(ReferenceCellType::Tetrahedron, 3);
        assert_eq!(basis.multi_indices(), again.multi_indices());
    }

    #[test]
    fn test_evaluate_triangle() {
        let basis = MonomialBasis::<f64>::new(ReferenceCellType::Triangle, 2);
        let point = [0.3, 0.4];
        let mut values = vec![0.0; basis.size()];
        basis.evaluate(&point, &mut values);
        for (mi, value) in basis.multi_indices().iter().zip(&values) {
            let expected = point[0].powi(mi.exponent(0) as i32) * point[1].powi(mi.exponent(1) as i32);
            assert_relative_eq!(*value, expected, epsilon = 1e-14);
        }
        // degree grouping: 1 then x, y then the quadratics
        assert_eq!(basis.sizes(), &[1, 3, 6]);
        assert_relative_eq!(values[0], 1.0);
    }

    #[test]
    fn test_jacobian_against_finite_differences() {
        let basis = MonomialBasis::<f64>::new(ReferenceCellType::Prism, 3);
        let point = [0.2, 0.3, 0.6];
        let h = 1e-7;
        let mut jac = vec![0.0; basis.size() * 3];
        basis.evaluate_jacobian(&point, &mut jac);
        let mut values = vec![0.0; basis.size()];
        basis.evaluate(&point, &mut values);
        for d in 0..3 {
            let mut shifted = point;
            shifted[d] += h;
            let mut plus = vec![0.0; basis.size()];
            basis.evaluate(&shifted, &mut plus);
            for i in 0..basis.size() {
                assert_relative_eq!(
                    jac[i * 3 + d],
                    (plus[i] - values[i]) / h,
                    epsilon = 1e-5,
                    max_relative = 1e-5
                );
            }
        }
    }

    #[test]
    fn test_hessian_symmetry_and_values() {
        let basis = MonomialBasis::<f64>::new(ReferenceCellType::Triangle, 3);
        let point = [0.7, 0.2];
        let mut hess = vec![0.0; basis.size() * 4];
        basis.evaluate_hessian(&point, &mut hess);
        for i in 0..basis.size() {
            assert_relative_eq!(hess[i * 4 + 1], hess[i * 4 + 2], epsilon = 1e-14);
        }
        // d^2/dx^2 of x^2 is 2, of x^3 is 6x
        let x2 = basis
            .index_of(&MultiIndex::from_exponents(vec![2, 0]))
            .unwrap();
        let x3 = basis
            .index_of(&MultiIndex::from_exponents(vec![3, 0]))
            .unwrap();
        assert_relative_eq!(hess[x2 * 4], 2.0);
        assert_relative_eq!(hess[x3 * 4], 6.0 * point[0], epsilon = 1e-14);
    }

    #[test]
    fn test_moments_simplex() {
        // int_T x^i y^j = i! j! / (i + j + 2)!
        let basis = MonomialBasis::<f64>::new(ReferenceCellType::Triangle, 3);
        let mut moments = vec![0.0; basis.size()];
        basis.integrals(&mut moments);
        let factorial = |n: usize| (1..=n).product::<usize>() as f64;
        for (mi, moment) in basis.multi_indices().iter().zip(&moments) {
            let i = mi.exponent(0);
            let j = mi.exponent(1);
            let expected = factorial(i) * factorial(j) / factorial(i + j + 2);
            assert_relative_eq!(*moment, expected, epsilon = 1e-14);
        }
    }

    #[test]
    fn test_moments_volume() {
        for cell in [
            ReferenceCellType::Interval,
            ReferenceCellType::Triangle,
            ReferenceCellType::Quadrilateral,
            ReferenceCellType::Tetrahedron,
            ReferenceCellType::Hexahedron,
            ReferenceCellType::Prism,
            ReferenceCellType::Pyramid,
        ] {
            let constant = MultiIndex::zero(crate::reference_cell::dim(cell));
            assert_relative_eq!(
                monomial_integral::<f64>(cell, &constant),
                crate::reference_cell::volume::<f64>(cell),
                epsilon = 1e-14
            );
        }
    }

    #[test]
    fn test_moments_hexahedron() {
        let basis = MonomialBasis::<f64>::new(ReferenceCellType::Hexahedron, 2);
        let mut moments = vec![0.0; basis.size()];
        basis.integrals(&mut moments);
        for (mi, moment) in basis.multi_indices().iter().zip(&moments) {
            let expected: f64 = (0..3).map(|d| 1.0 / (mi.exponent(d) + 1) as f64).product();
            assert_relative_eq!(*moment, expected, epsilon = 1e-14);
        }
    }
}
