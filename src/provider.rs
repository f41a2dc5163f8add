//! Cached construction of bases and rules.
//!
//! A [`BasisProvider`] is an explicit, owned cache keyed on cell type and
//! degree: the first request constructs and stores an instance, later
//! requests return a shared handle to the same instance. The provider
//! outlives the handles it hands out in the sense of shared ownership;
//! nothing global is involved. Construction is single-threaded and the
//! caches carry no synchronisation: a provider must stay on one thread.

use crate::element::{lagrange, orthonormal, raviart_thomas, CiarletElement};
use crate::field::Field;
use crate::monomial::MonomialBasis;
use crate::polynomial::PolynomialBasis;
use crate::quadrature::{Quadrature, QuadratureCache};
use crate::types::{BasisError, Continuity, ReferenceCellType};
use std::collections::HashMap;
use std::rc::Rc;

/// A process-local cache of monomial bases, orthonormal bases, quadrature
/// rules and finished elements.
#[derive(Default)]
pub struct BasisProvider<F: Field> {
    monomial: HashMap<(ReferenceCellType, usize), Rc<MonomialBasis<F>>>,
    orthonormal: HashMap<(ReferenceCellType, usize), Rc<PolynomialBasis<F, MonomialBasis<F>>>>,
    quadrature: QuadratureCache<F>,
    lagrange: HashMap<(ReferenceCellType, usize, Continuity), Rc<CiarletElement<F>>>,
    raviart_thomas: HashMap<(ReferenceCellType, usize, Continuity), Rc<CiarletElement<F>>>,
}

impl<F: Field> BasisProvider<F> {
    /// Create an empty provider
    pub fn new() -> Self {
        Self {
            monomial: HashMap::new(),
            orthonormal: HashMap::new(),
            quadrature: QuadratureCache::new(),
            lagrange: HashMap::new(),
            raviart_thomas: HashMap::new(),
        }
    }

    /// The monomial basis of a degree on a cell
    pub fn monomial_basis(
        &mut self,
        cell_type: ReferenceCellType,
        degree: usize,
    ) -> Rc<MonomialBasis<F>> {
        if let Some(basis) = self.monomial.get(&(cell_type, degree)) {
            return basis.clone();
        }
        log::debug!("building monomial basis for {cell_type:?} at degree {degree}");
        let basis = Rc::new(MonomialBasis::new(cell_type, degree));
        self.monomial.insert((cell_type, degree), basis.clone());
        basis
    }

    /// The orthonormal basis of a degree on a cell
    pub fn orthonormal_basis(
        &mut self,
        cell_type: ReferenceCellType,
        degree: usize,
    ) -> Rc<PolynomialBasis<F, MonomialBasis<F>>> {
        if let Some(basis) = self.orthonormal.get(&(cell_type, degree)) {
            return basis.clone();
        }
        log::debug!("building orthonormal basis for {cell_type:?} at degree {degree}");
        let basis = Rc::new(orthonormal::basis(cell_type, degree));
        self.orthonormal.insert((cell_type, degree), basis.clone());
        basis
    }

    /// A quadrature rule of a given exactness order on a cell
    pub fn quadrature(&mut self, cell_type: ReferenceCellType, order: usize) -> Rc<Quadrature<F>> {
        self.quadrature.rule(cell_type, order)
    }

    /// A Lagrange element
    pub fn lagrange_element(
        &mut self,
        cell_type: ReferenceCellType,
        degree: usize,
        continuity: Continuity,
    ) -> Result<Rc<CiarletElement<F>>, BasisError> {
        if let Some(element) = self.lagrange.get(&(cell_type, degree, continuity)) {
            return Ok(element.clone());
        }
        log::debug!("building Lagrange element on {cell_type:?} at degree {degree}");
        let element = Rc::new(lagrange::create(cell_type, degree, continuity)?);
        self.lagrange
            .insert((cell_type, degree, continuity), element.clone());
        Ok(element)
    }

    /// A Raviart-Thomas element
    pub fn raviart_thomas_element(
        &mut self,
        cell_type: ReferenceCellType,
        degree: usize,
        continuity: Continuity,
    ) -> Result<Rc<CiarletElement<F>>, BasisError> {
        if let Some(element) = self.raviart_thomas.get(&(cell_type, degree, continuity)) {
            return Ok(element.clone());
        }
        log::debug!("building Raviart-Thomas element on {cell_type:?} at degree {degree}");
        let element = Rc::new(raviart_thomas::create(cell_type, degree, continuity)?);
        self.raviart_thomas
            .insert((cell_type, degree, continuity), element.clone());
        Ok(element)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_repeated_requests_share_one_instance() {
        let mut provider = BasisProvider::<f64>::new();
        let a = provider.monomial_basis(ReferenceCellType::Triangle, 3);
        let b = provider.monomial_basis(ReferenceCellType::Triangle, 3);
        assert!(Rc::ptr_eq(&a, &b));
        let c = provider.monomial_basis(ReferenceCellType::Triangle, 4);
        assert!(!Rc::ptr_eq(&a, &c));

        let e1 = provider
            .lagrange_element(ReferenceCellType::Triangle, 2, Continuity::Continuous)
            .unwrap();
        let e2 = provider
            .lagrange_element(ReferenceCellType::Triangle, 2, Continuity::Continuous)
            .unwrap();
        assert!(Rc::ptr_eq(&e1, &e2));
    }

    #[test]
    fn test_handles_survive_further_construction() {
        let mut provider = BasisProvider::<f64>::new();
        let onb = provider.orthonormal_basis(ReferenceCellType::Interval, 2);
        for degree in 0..3 {
            provider.orthonormal_basis(ReferenceCellType::Triangle, degree);
        }
        // the handle handed out first is still the cached instance
        let again = provider.orthonormal_basis(ReferenceCellType::Interval, 2);
        assert!(Rc::ptr_eq(&onb, &again));
    }

    #[test]
    fn test_construction_errors_pass_through() {
        let mut provider = BasisProvider::<f64>::new();
        assert!(provider
            .raviart_thomas_element(ReferenceCellType::Quadrilateral, 1, Continuity::Continuous)
            .is_err());
    }
}
