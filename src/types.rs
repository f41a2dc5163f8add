//! Type definitions.

use thiserror::Error;

/// The type of a reference cell
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
#[repr(u8)]
pub enum ReferenceCellType {
    /// A point
    Point = 0,
    /// A line interval
    Interval = 1,
    /// A triangle
    Triangle = 2,
    /// A quadrilateral
    Quadrilateral = 3,
    /// A tetrahedron
    Tetrahedron = 4,
    /// A hexahedron (cube)
    Hexahedron = 5,
    /// A triangular prism
    Prism = 6,
    /// A square-based pyramid
    Pyramid = 7,
}

/// The continuity of an element between neighbouring cells
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
#[repr(u8)]
pub enum Continuity {
    /// Basis functions are continuous across cell boundaries
    Continuous = 0,
    /// Basis functions are defined cell-locally
    Discontinuous = 1,
}

/// The push forward / pull back map used by an element
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
#[repr(u8)]
pub enum MapType {
    /// Identity map
    Identity = 0,
    /// Covariant Piola map
    CovariantPiola = 1,
    /// Contravariant Piola map
    ContravariantPiola = 2,
    /// L2 Piola map
    L2Piola = 3,
}

/// The geometric placement of one degree of freedom.
///
/// A local key ties the degree of freedom with index `index` on the
/// subentity `sub_entity` of codimension `codim` to a basis function. The
/// collection order of local keys is identical to the basis function index
/// order of the element they belong to.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct LocalKey {
    /// Local number of the associated subentity
    pub sub_entity: usize,
    /// Codimension of the associated subentity
    pub codim: usize,
    /// Index in the set of all degrees of freedom on this subentity
    pub index: usize,
}

impl LocalKey {
    /// Create a new local key
    pub fn new(sub_entity: usize, codim: usize, index: usize) -> Self {
        Self {
            sub_entity,
            codim,
            index,
        }
    }
}

/// The degree-of-freedom layout of a basis.
#[derive(Debug, Clone)]
pub struct LocalCoefficients {
    keys: Vec<LocalKey>,
}

impl LocalCoefficients {
    /// Create a layout from a list of keys
    pub fn new(keys: Vec<LocalKey>) -> Self {
        Self { keys }
    }

    /// The number of degrees of freedom
    pub fn size(&self) -> usize {
        self.keys.len()
    }

    /// The local key of the `i`th basis function
    pub fn local_key(&self, i: usize) -> LocalKey {
        assert!(i < self.keys.len());
        self.keys[i]
    }

    /// All local keys, in basis function index order
    pub fn keys(&self) -> &[LocalKey] {
        &self.keys
    }

    /// Collapse every key onto the cell interior.
    ///
    /// Used for discontinuous variants of an element, where no degree of
    /// freedom is shared with neighbouring cells.
    pub fn make_discontinuous(&mut self) {
        for (i, key) in self.keys.iter_mut().enumerate() {
            *key = LocalKey::new(0, 0, i);
        }
    }
}

/// Failure during basis construction
#[derive(Debug, Error)]
pub enum BasisError {
    /// The element family is not defined on this cell type
    #[error("Unsupported cell type: {0:?}")]
    UnsupportedCellType(ReferenceCellType),
    /// The element family is not defined for this degree on this cell type
    #[error("Unsupported degree {degree} on {cell:?}")]
    UnsupportedDegree {
        /// The cell type
        cell: ReferenceCellType,
        /// The requested degree
        degree: usize,
    },
    /// A continuous element with no vertex degrees of freedom was requested
    #[error("Cannot create a continuous degree 0 element")]
    ContinuousDegreeZero,
    /// The dual matrix could not be inverted
    #[error("Singular dual matrix: pivot {pivot:e} in column {column} is below the tolerance")]
    SingularDualMatrix {
        /// The elimination column at which the pivot fell below the tolerance
        column: usize,
        /// The magnitude of the offending pivot, cast to machine precision
        pivot: f64,
    },
}
