use crate::error::{KdTreeError, Result};

/// How the tree builder and the ball query walk the tree.
///
/// Both strategies produce identical trees and identical results; `WorkStack`
/// keeps its pending work on the heap instead of the call stack, which matters
/// for degenerate inputs where sliding-midpoint trees get very deep.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Strategy {
    #[default]
    Recursive,
    WorkStack,
}

/// Tree construction parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct TreeConfig {
    /// Maximum number of points kept in a leaf.
    pub leaf_size: usize,
    /// Split at the median (balanced tree) instead of the sliding midpoint.
    pub balanced: bool,
    /// Recompute tight bounds at every node before choosing a split.
    pub compact: bool,
    /// Per-dimension periodic box size; `0.0` leaves a dimension unbounded.
    pub boxsize: Option<Vec<f64>>,
    pub strategy: Strategy,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            leaf_size: 16,
            balanced: true,
            compact: true,
            boxsize: None,
            strategy: Strategy::Recursive,
        }
    }
}

impl TreeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn leaf_size(mut self, leaf_size: usize) -> Self {
        self.leaf_size = leaf_size;
        self
    }

    pub fn balanced(mut self, balanced: bool) -> Self {
        self.balanced = balanced;
        self
    }

    pub fn compact(mut self, compact: bool) -> Self {
        self.compact = compact;
        self
    }

    /// Wraps coordinates into a periodic box of the given per-dimension size.
    pub fn periodic(mut self, boxsize: Vec<f64>) -> Self {
        self.boxsize = Some(boxsize);
        self
    }

    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }
}

/// Parameters of a fixed-radius dual-tree query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QueryOptions {
    /// Inclusive search radius.
    pub radius: f64,
    /// Minkowski order, `1 <= p <= inf`.
    pub p: f64,
    /// Approximation tolerance. Subtree pairs closer than `r / (1 + eps)` are
    /// accepted and pairs farther than `r * (1 + eps)` are rejected wholesale.
    pub eps: f64,
    pub strategy: Strategy,
}

impl QueryOptions {
    /// Exact Euclidean query with the given radius.
    pub fn new(radius: f64) -> Self {
        Self {
            radius,
            p: 2.0,
            eps: 0.0,
            strategy: Strategy::Recursive,
        }
    }

    pub fn p(mut self, p: f64) -> Self {
        self.p = p;
        self
    }

    pub fn eps(mut self, eps: f64) -> Self {
        self.eps = eps;
        self
    }

    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.radius.is_nan() || self.radius < 0.0 {
            return Err(KdTreeError::InvalidRadius(self.radius));
        }
        if !self.eps.is_finite() || self.eps < 0.0 {
            return Err(KdTreeError::InvalidEpsilon(self.eps));
        }
        if self.p.is_nan() || self.p < 1.0 {
            return Err(KdTreeError::InvalidMinkowskiOrder(self.p));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_validation() {
        assert!(QueryOptions::new(1.0).validate().is_ok());
        assert!(QueryOptions::new(0.0).validate().is_ok());
        assert!(QueryOptions::new(f64::INFINITY).p(f64::INFINITY).validate().is_ok());

        assert_eq!(QueryOptions::new(-1.0).validate(), Err(KdTreeError::InvalidRadius(-1.0)));
        assert!(matches!(QueryOptions::new(f64::NAN).validate(), Err(KdTreeError::InvalidRadius(_))));
        assert_eq!(QueryOptions::new(1.0).eps(-0.5).validate(), Err(KdTreeError::InvalidEpsilon(-0.5)));
        assert_eq!(QueryOptions::new(1.0).p(0.5).validate(), Err(KdTreeError::InvalidMinkowskiOrder(0.5)));
    }

    #[test]
    fn test_tree_config_chain() {
        let config = TreeConfig::new()
            .leaf_size(4)
            .balanced(false)
            .compact(false)
            .periodic(vec![1.0, 0.0])
            .strategy(Strategy::WorkStack);
        assert_eq!(config.leaf_size, 4);
        assert!(!config.balanced);
        assert!(!config.compact);
        assert_eq!(config.boxsize, Some(vec![1.0, 0.0]));
        assert_eq!(config.strategy, Strategy::WorkStack);
    }
}
