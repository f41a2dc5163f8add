//! Reference cell definitions.

use crate::field::Field;
use crate::types::ReferenceCellType;

/// The recursive structure of a reference cell.
///
/// Every cell is either a point, a prism over a lower-dimensional base cell
/// (tensor extension by an interval), or a pyramid over a base cell (conical
/// extension towards an apex). The monomial and quadrature generators
/// recurse on this structure instead of special-casing each cell type.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum CellStructure {
    /// The zero-dimensional cell
    Point,
    /// Tensor extension of the base cell by an interval
    PrismOver(ReferenceCellType),
    /// Conical extension of the base cell towards an apex
    PyramidOver(ReferenceCellType),
}

/// The recursive structure of a cell.
///
/// The extension coordinate is always the last reference coordinate.
pub fn structure(cell: ReferenceCellType) -> CellStructure {
    match cell {
        ReferenceCellType::Point => CellStructure::Point,
        ReferenceCellType::Interval => CellStructure::PyramidOver(ReferenceCellType::Point),
        ReferenceCellType::Triangle => CellStructure::PyramidOver(ReferenceCellType::Interval),
        ReferenceCellType::Quadrilateral => CellStructure::PrismOver(ReferenceCellType::Interval),
        ReferenceCellType::Tetrahedron => CellStructure::PyramidOver(ReferenceCellType::Triangle),
        ReferenceCellType::Hexahedron => CellStructure::PrismOver(ReferenceCellType::Quadrilateral),
        ReferenceCellType::Prism => CellStructure::PrismOver(ReferenceCellType::Triangle),
        ReferenceCellType::Pyramid => CellStructure::PyramidOver(ReferenceCellType::Quadrilateral),
    }
}

/// The topological dimension of the cell
pub fn dim(cell: ReferenceCellType) -> usize {
    match cell {
        ReferenceCellType::Point => 0,
        ReferenceCellType::Interval => 1,
        ReferenceCellType::Triangle => 2,
        ReferenceCellType::Quadrilateral => 2,
        ReferenceCellType::Tetrahedron => 3,
        ReferenceCellType::Hexahedron => 3,
        ReferenceCellType::Prism => 3,
        ReferenceCellType::Pyramid => 3,
    }
}

/// Is the cell a simplex?
pub fn is_simplex(cell: ReferenceCellType) -> bool {
    matches!(
        cell,
        ReferenceCellType::Point
            | ReferenceCellType::Interval
            | ReferenceCellType::Triangle
            | ReferenceCellType::Tetrahedron
    )
}

/// The volume of the reference cell.
///
/// The measure of the zero-dimensional cell is taken to be 1 so that the
/// tensor recursions are measure-preserving.
pub fn volume<F: Field>(cell: ReferenceCellType) -> F {
    match cell {
        ReferenceCellType::Point => F::one(),
        ReferenceCellType::Interval => F::one(),
        ReferenceCellType::Triangle => F::from_f64(0.5),
        ReferenceCellType::Quadrilateral => F::one(),
        ReferenceCellType::Tetrahedron => F::one() / F::from_usize(6),
        ReferenceCellType::Hexahedron => F::one(),
        ReferenceCellType::Prism => F::from_f64(0.5),
        ReferenceCellType::Pyramid => F::one() / F::from_usize(3),
    }
}

/// The vertices of the reference cell
pub fn vertices<F: Field>(cell: ReferenceCellType) -> Vec<Vec<F>> {
    let zero = F::zero();
    let one = F::one();
    match cell {
        ReferenceCellType::Point => vec![],
        ReferenceCellType::Interval => vec![vec![zero], vec![one]],
        ReferenceCellType::Triangle => vec![vec![zero, zero], vec![one, zero], vec![zero, one]],
        ReferenceCellType::Quadrilateral => vec![
            vec![zero, zero],
            vec![one, zero],
            vec![zero, one],
            vec![one, one],
        ],
        ReferenceCellType::Tetrahedron => vec![
            vec![zero, zero, zero],
            vec![one, zero, zero],
            vec![zero, one, zero],
            vec![zero, zero, one],
        ],
        ReferenceCellType::Hexahedron => vec![
            vec![zero, zero, zero],
            vec![one, zero, zero],
            vec![zero, one, zero],
            vec![one, one, zero],
            vec![zero, zero, one],
            vec![one, zero, one],
            vec![zero, one, one],
            vec![one, one, one],
        ],
        ReferenceCellType::Prism => vec![
            vec![zero, zero, zero],
            vec![one, zero, zero],
            vec![zero, one, zero],
            vec![zero, zero, one],
            vec![one, zero, one],
            vec![zero, one, one],
        ],
        ReferenceCellType::Pyramid => vec![
            vec![zero, zero, zero],
            vec![one, zero, zero],
            vec![zero, one, zero],
            vec![one, one, zero],
            vec![zero, zero, one],
        ],
    }
}

/// The midpoint of the cell
pub fn midpoint<F: Field>(cell: ReferenceCellType) -> Vec<F> {
    let half = F::from_f64(0.5);
    let third = F::one() / F::from_usize(3);
    match cell {
        ReferenceCellType::Point => vec![],
        ReferenceCellType::Interval => vec![half],
        ReferenceCellType::Triangle => vec![third; 2],
        ReferenceCellType::Quadrilateral => vec![half; 2],
        ReferenceCellType::Tetrahedron => vec![F::one() / F::from_usize(4); 3],
        ReferenceCellType::Hexahedron => vec![half; 3],
        ReferenceCellType::Prism => vec![third, third, half],
        ReferenceCellType::Pyramid => vec![
            F::from_f64(0.4),
            F::from_f64(0.4),
            F::from_f64(0.2),
        ],
    }
}

/// The edges of the reference cell
pub fn edges(cell: ReferenceCellType) -> Vec<Vec<usize>> {
    match cell {
        ReferenceCellType::Point => vec![],
        ReferenceCellType::Interval => vec![vec![0, 1]],
        ReferenceCellType::Triangle => vec![vec![1, 2], vec![0, 2], vec![0, 1]],
        ReferenceCellType::Quadrilateral => vec![vec![0, 1], vec![0, 2], vec![1, 3], vec![2, 3]],
        ReferenceCellType::Tetrahedron => vec![
            vec![2, 3],
            vec![1, 3],
            vec![1, 2],
            vec![0, 3],
            vec![0, 2],
            vec![0, 1],
        ],
        ReferenceCellType::Hexahedron => vec![
            vec![0, 1],
            vec![0, 2],
            vec![0, 4],
            vec![1, 3],
            vec![1, 5],
            vec![2, 3],
            vec![2, 6],
            vec![3, 7],
            vec![4, 5],
            vec![4, 6],
            vec![5, 7],
            vec![6, 7],
        ],
        ReferenceCellType::Prism => vec![
            vec![0, 1],
            vec![0, 2],
            vec![0, 3],
            vec![1, 2],
            vec![1, 4],
            vec![2, 5],
            vec![3, 4],
            vec![3, 5],
            vec![4, 5],
        ],
        ReferenceCellType::Pyramid => vec![
            vec![0, 1],
            vec![0, 2],
            vec![0, 4],
            vec![1, 3],
            vec![1, 4],
            vec![2, 3],
            vec![2, 4],
            vec![3, 4],
        ],
    }
}

/// The two-dimensional faces of the reference cell
pub fn faces(cell: ReferenceCellType) -> Vec<Vec<usize>> {
    match cell {
        ReferenceCellType::Point => vec![],
        ReferenceCellType::Interval => vec![],
        ReferenceCellType::Triangle => vec![vec![0, 1, 2]],
        ReferenceCellType::Quadrilateral => vec![vec![0, 1, 2, 3]],
        ReferenceCellType::Tetrahedron => {
            vec![vec![1, 2, 3], vec![0, 2, 3], vec![0, 1, 3], vec![0, 1, 2]]
        }
        ReferenceCellType::Hexahedron => vec![
            vec![0, 1, 2, 3],
            vec![0, 1, 4, 5],
            vec![0, 2, 4, 6],
            vec![1, 3, 5, 7],
            vec![2, 3, 6, 7],
            vec![4, 5, 6, 7],
        ],
        ReferenceCellType::Prism => vec![
            vec![0, 1, 2],
            vec![0, 1, 3, 4],
            vec![0, 2, 3, 5],
            vec![1, 2, 4, 5],
            vec![3, 4, 5],
        ],
        ReferenceCellType::Pyramid => vec![
            vec![0, 1, 2, 3],
            vec![0, 1, 4],
            vec![0, 2, 4],
            vec![1, 3, 4],
            vec![2, 3, 4],
        ],
    }
}

/// The types of the subentities of the reference cell
pub fn entity_types(cell: ReferenceCellType) -> Vec<Vec<ReferenceCellType>> {
    match cell {
        ReferenceCellType::Point => vec![vec![ReferenceCellType::Point], vec![], vec![], vec![]],
        ReferenceCellType::Interval => vec![
            vec![ReferenceCellType::Point; 2],
            vec![ReferenceCellType::Interval],
            vec![],
            vec![],
        ],
        ReferenceCellType::Triangle => vec![
            vec![ReferenceCellType::Point; 3],
            vec![ReferenceCellType::Interval; 3],
            vec![ReferenceCellType::Triangle],
            vec![],
        ],
        ReferenceCellType::Quadrilateral => vec![
            vec![ReferenceCellType::Point; 4],
            vec![ReferenceCellType::Interval; 4],
            vec![ReferenceCellType::Quadrilateral],
            vec![],
        ],
        ReferenceCellType::Tetrahedron => vec![
            vec![ReferenceCellType::Point; 4],
            vec![ReferenceCellType::Interval; 6],
            vec![ReferenceCellType::Triangle; 4],
            vec![ReferenceCellType::Tetrahedron],
        ],
        ReferenceCellType::Hexahedron => vec![
            vec![ReferenceCellType::Point; 8],
            vec![ReferenceCellType::Interval; 12],
            vec![ReferenceCellType::Quadrilateral; 6],
            vec![ReferenceCellType::Hexahedron],
        ],
        ReferenceCellType::Prism => vec![
            vec![ReferenceCellType::Point; 6],
            vec![ReferenceCellType::Interval; 9],
            vec![
                ReferenceCellType::Triangle,
                ReferenceCellType::Quadrilateral,
                ReferenceCellType::Quadrilateral,
                ReferenceCellType::Quadrilateral,
                ReferenceCellType::Triangle,
            ],
            vec![ReferenceCellType::Prism],
        ],
        ReferenceCellType::Pyramid => vec![
            vec![ReferenceCellType::Point; 5],
            vec![ReferenceCellType::Interval; 8],
            vec![
                ReferenceCellType::Quadrilateral,
                ReferenceCellType::Triangle,
                ReferenceCellType::Triangle,
                ReferenceCellType::Triangle,
                ReferenceCellType::Triangle,
            ],
            vec![ReferenceCellType::Pyramid],
        ],
    }
}

/// The number of subentities of each dimension
pub fn entity_counts(cell: ReferenceCellType) -> Vec<usize> {
    match cell {
        ReferenceCellType::Point => vec![1, 0, 0, 0],
        ReferenceCellType::Interval => vec![2, 1, 0, 0],
        ReferenceCellType::Triangle => vec![3, 3, 1, 0],
        ReferenceCellType::Quadrilateral => vec![4, 4, 1, 0],
        ReferenceCellType::Tetrahedron => vec![4, 6, 4, 1],
        ReferenceCellType::Hexahedron => vec![8, 12, 6, 1],
        ReferenceCellType::Prism => vec![6, 9, 5, 1],
        ReferenceCellType::Pyramid => vec![5, 8, 5, 1],
    }
}

/// The vertex lists of the codimension-1 subentities of the cell
pub fn facets(cell: ReferenceCellType) -> Vec<Vec<usize>> {
    match dim(cell) {
        1 => vec![vec![0], vec![1]],
        2 => edges(cell),
        3 => faces(cell),
        _ => vec![],
    }
}

/// The cell type of a codimension-1 subentity
pub fn facet_type(cell: ReferenceCellType, facet: usize) -> ReferenceCellType {
    let d = dim(cell);
    assert!(d > 0);
    entity_types(cell)[d - 1][facet]
}

/// The affine embedding of a codimension-1 subentity into the cell.
///
/// Returns the origin and the direction vectors of the map
/// `xi -> origin + sum_k xi_k * direction_k` taking facet reference
/// coordinates to cell reference coordinates. Facets of the reference cells
/// are flat parallelograms or simplices, so the affine map through the
/// first three facet vertices is exact.
pub fn facet_embedding<F: Field>(cell: ReferenceCellType, facet: usize) -> (Vec<F>, Vec<Vec<F>>) {
    let d = dim(cell);
    let v = vertices::<F>(cell);
    let f = &facets(cell)[facet];
    let origin = v[f[0]].clone();
    let fdim = dim(facet_type(cell, facet));
    let mut directions = Vec::with_capacity(fdim);
    for k in 0..fdim {
        let mut dir = vec![F::zero(); d];
        for (i, x) in dir.iter_mut().enumerate() {
            *x = v[f[k + 1]][i] - origin[i];
        }
        directions.push(dir);
    }
    (origin, directions)
}

/// The integration outer normal of a codimension-1 subentity.
///
/// The normal points out of the cell and is scaled by the integration
/// element of the facet embedding, so that the flux of a field `u` through
/// the facet equals the integral of `u . n` over the facet's reference cell.
pub fn integration_outer_normal<F: Field>(cell: ReferenceCellType, facet: usize) -> Vec<F> {
    let d = dim(cell);
    assert!(d >= 1 && d <= 3);
    let (_, directions) = facet_embedding::<F>(cell, facet);
    let mut normal = match d {
        1 => vec![F::one()],
        2 => {
            let e = &directions[0];
            vec![e[1], -e[0]]
        }
        _ => {
            let a = &directions[0];
            let b = &directions[1];
            vec![
                a[1] * b[2] - a[2] * b[1],
                a[2] * b[0] - a[0] * b[2],
                a[0] * b[1] - a[1] * b[0],
            ]
        }
    };

    // orient outward: the normal must point from the cell midpoint towards
    // the facet centroid
    let v = vertices::<F>(cell);
    let f = &facets(cell)[facet];
    let mid = midpoint::<F>(cell);
    let mut dot = F::zero();
    for i in 0..d {
        let mut centroid = F::zero();
        for vertex in f.iter() {
            centroid += v[*vertex][i];
        }
        centroid /= F::from_usize(f.len());
        dot += normal[i] * (centroid - mid[i]);
    }
    if dot < F::zero() {
        for x in normal.iter_mut() {
            *x = -*x;
        }
    }
    normal
}
