use thiserror::Error;

/// Errors reported by tree construction and queries.
///
/// Every variant describes a configuration problem detected at an entry point,
/// before any recursion starts. Degenerate but valid inputs (identical points,
/// a single point, an empty set) never produce an error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KdTreeError {
    #[error("leaf size must be at least 1")]
    InvalidLeafSize,

    #[error("points must have at least one dimension")]
    ZeroDimensions,

    #[error("coordinate buffer of length {len} is not a multiple of {dims} dimensions")]
    RaggedData { len: usize, dims: usize },

    #[error("coordinate {dim} of point {index} is not finite")]
    NonFiniteCoordinate { index: usize, dim: usize },

    #[error("index buffer must be a permutation of 0..{expected}")]
    InvalidIndexBuffer { expected: usize },

    #[error("box size has {got} entries, expected one per dimension ({expected})")]
    BoxSizeLength { expected: usize, got: usize },

    #[error("box size along dimension {dim} must be finite and non-negative, got {value}")]
    InvalidBoxSize { dim: usize, value: f64 },

    #[error("coordinate {dim} of point {index} ({value}) lies outside the periodic box [0, {size})")]
    OutsideBox {
        index: usize,
        dim: usize,
        value: f64,
        size: f64,
    },

    #[error("trees have different dimensionality ({left} vs {right})")]
    DimensionMismatch { left: usize, right: usize },

    #[error("trees were built with different periodic box sizes")]
    BoxSizeMismatch,

    #[error("radius must be a non-negative number, got {0}")]
    InvalidRadius(f64),

    #[error("epsilon must be finite and non-negative, got {0}")]
    InvalidEpsilon(f64),

    #[error("Minkowski order must satisfy 1 <= p <= inf, got {0}")]
    InvalidMinkowskiOrder(f64),

    #[error("distance bounds overflow for p = {0}; use p = inf for very large orders")]
    DistanceOverflow(f64),

    #[error("weight vector has {got} entries, expected one per point ({expected})")]
    WeightLength { expected: usize, got: usize },
}

pub type Result<T> = std::result::Result<T, KdTreeError>;
