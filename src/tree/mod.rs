use crate::bounds::BoundingBox;
use crate::config::{Strategy, TreeConfig};
use crate::error::{KdTreeError, Result};
use log::debug;
use std::time::Instant;

mod build;
mod weights;

use build::TreeBuilder;
pub use weights::NodeWeights;

/// Arena index of the root node.
pub const ROOT: usize = 0;

/// Split information of a node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NodeKind {
    Leaf,
    /// Points with `coordinate < split` along `split_dim` live under `less`,
    /// the others under `greater`. Both are arena indices. When a sliding
    /// midpoint had to move one point across, that point sits under `less`
    /// with `coordinate == split`.
    Inner {
        split_dim: usize,
        split: f64,
        less: usize,
        greater: usize,
    },
}

/// A node of the tree, covering `indices[start_idx..end_idx]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KdNode {
    pub start_idx: usize,
    pub end_idx: usize,
    pub kind: NodeKind,
}

impl KdNode {
    pub(crate) fn leaf(start_idx: usize, end_idx: usize) -> Self {
        Self {
            start_idx,
            end_idx,
            kind: NodeKind::Leaf,
        }
    }

    /// Number of points under this node.
    pub fn children(&self) -> usize {
        self.end_idx - self.start_idx
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf)
    }

    pub fn split_dim(&self) -> Option<usize> {
        match self.kind {
            NodeKind::Inner { split_dim, .. } => Some(split_dim),
            NodeKind::Leaf => None,
        }
    }

    pub fn split(&self) -> Option<f64> {
        match self.kind {
            NodeKind::Inner { split, .. } => Some(split),
            NodeKind::Leaf => None,
        }
    }

    pub fn less(&self) -> Option<usize> {
        match self.kind {
            NodeKind::Inner { less, .. } => Some(less),
            NodeKind::Leaf => None,
        }
    }

    pub fn greater(&self) -> Option<usize> {
        match self.kind {
            NodeKind::Inner { greater, .. } => Some(greater),
            NodeKind::Leaf => None,
        }
    }
}

/// A static kd-tree over a caller-owned, row-major coordinate buffer.
///
/// The tree owns the index permutation and the node arena; the coordinates are
/// borrowed for its whole lifetime and never copied. Once built the tree is
/// read-only, so any number of queries may share it across threads.
#[derive(Clone, Debug)]
pub struct KdTree<'a> {
    data: &'a [f64],
    dims: usize,
    indices: Vec<usize>,
    nodes: Vec<KdNode>,
    bounds: BoundingBox,
    leaf_size: usize,
    boxsize: Option<Vec<f64>>,
}

impl<'a> KdTree<'a> {
    /// Builds a tree over `data`, a buffer of `data.len() / dims` points.
    pub fn build(data: &'a [f64], dims: usize, config: &TreeConfig) -> Result<Self> {
        let count = if dims == 0 { 0 } else { data.len() / dims };
        Self::build_with_indices(data, dims, (0..count).collect(), config)
    }

    /// Builds a tree reusing a caller-allocated index buffer.
    ///
    /// `indices` must be a permutation of `0..n`; the tree takes ownership and
    /// reorders it in place.
    pub fn build_with_indices(
        data: &'a [f64],
        dims: usize,
        mut indices: Vec<usize>,
        config: &TreeConfig,
    ) -> Result<Self> {
        let count = validate_points(data, dims)?;
        if config.leaf_size == 0 {
            return Err(KdTreeError::InvalidLeafSize);
        }
        validate_permutation(&indices, count)?;
        if let Some(boxsize) = &config.boxsize {
            validate_boxsize(data, dims, boxsize)?;
        }

        let started = Instant::now();
        let bounds = BoundingBox::from_points(data, dims, &indices);

        let mut builder = TreeBuilder::new(data, dims, &mut indices, config);
        match config.strategy {
            Strategy::Recursive => {
                let mut maxes = bounds.max.clone();
                let mut mins = bounds.min.clone();
                builder.build_recursive(0, count, &mut maxes, &mut mins);
            }
            Strategy::WorkStack => builder.build_work_stack(bounds.max.clone(), bounds.min.clone()),
        }
        let nodes = builder.finish();

        let tree = Self {
            data,
            dims,
            indices,
            nodes,
            bounds,
            leaf_size: config.leaf_size,
            boxsize: config.boxsize.clone(),
        };

        debug!(
            "built kd-tree: {} points, {} dims, {} nodes, depth {}, in {:?}",
            count,
            dims,
            tree.nodes.len(),
            tree.depth(),
            started.elapsed()
        );
        Ok(tree)
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Coordinates of point `index` (an original, unpermuted index).
    pub fn point(&self, index: usize) -> &'a [f64] {
        &self.data[index * self.dims..(index + 1) * self.dims]
    }

    /// Coordinates of the point stored at permutation position `pos`.
    #[inline]
    pub(crate) fn point_at(&self, pos: usize) -> &'a [f64] {
        self.point(self.indices[pos])
    }

    /// The index permutation; every node covers a contiguous range of it.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Nodes in construction order, root first.
    pub fn nodes(&self) -> &[KdNode] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> &KdNode {
        &self.nodes[index]
    }

    pub fn root(&self) -> &KdNode {
        &self.nodes[ROOT]
    }

    /// Tight bounding box of the whole point set.
    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    pub fn leaf_size(&self) -> usize {
        self.leaf_size
    }

    pub fn boxsize(&self) -> Option<&[f64]> {
        self.boxsize.as_deref()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Number of levels; a tree that is a single leaf has depth 1.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(ROOT, 1)];
        while let Some((index, level)) = stack.pop() {
            deepest = deepest.max(level);
            if let NodeKind::Inner { less, greater, .. } = self.nodes[index].kind {
                stack.push((less, level + 1));
                stack.push((greater, level + 1));
            }
        }
        deepest
    }
}

fn validate_points(data: &[f64], dims: usize) -> Result<usize> {
    if dims == 0 {
        return Err(KdTreeError::ZeroDimensions);
    }
    if data.len() % dims != 0 {
        return Err(KdTreeError::RaggedData { len: data.len(), dims });
    }
    if let Some(pos) = data.iter().position(|v| !v.is_finite()) {
        return Err(KdTreeError::NonFiniteCoordinate {
            index: pos / dims,
            dim: pos % dims,
        });
    }
    Ok(data.len() / dims)
}

fn validate_permutation(indices: &[usize], count: usize) -> Result<()> {
    let invalid = KdTreeError::InvalidIndexBuffer { expected: count };
    if indices.len() != count {
        return Err(invalid);
    }
    let mut seen = vec![false; count];
    for &idx in indices {
        if idx >= count || seen[idx] {
            return Err(invalid);
        }
        seen[idx] = true;
    }
    Ok(())
}

fn validate_boxsize(data: &[f64], dims: usize, boxsize: &[f64]) -> Result<()> {
    if boxsize.len() != dims {
        return Err(KdTreeError::BoxSizeLength {
            expected: dims,
            got: boxsize.len(),
        });
    }
    for (dim, &size) in boxsize.iter().enumerate() {
        if !size.is_finite() || size < 0.0 {
            return Err(KdTreeError::InvalidBoxSize { dim, value: size });
        }
    }
    for (index, point) in data.chunks_exact(dims).enumerate() {
        for (dim, (&value, &size)) in point.iter().zip(boxsize).enumerate() {
            if size > 0.0 && !(0.0..size).contains(&value) {
                return Err(KdTreeError::OutsideBox { index, dim, value, size });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_input() {
        let data = [0.0, 1.0, 2.0];
        assert_eq!(
            KdTree::build(&data, 2, &TreeConfig::new()).err(),
            Some(KdTreeError::RaggedData { len: 3, dims: 2 })
        );
        assert_eq!(KdTree::build(&data, 0, &TreeConfig::new()).err(), Some(KdTreeError::ZeroDimensions));
        assert_eq!(
            KdTree::build(&data, 1, &TreeConfig::new().leaf_size(0)).err(),
            Some(KdTreeError::InvalidLeafSize)
        );

        let nan = [0.0, f64::NAN];
        assert_eq!(
            KdTree::build(&nan, 1, &TreeConfig::new()).err(),
            Some(KdTreeError::NonFiniteCoordinate { index: 1, dim: 0 })
        );
    }

    #[test]
    fn test_rejects_bad_index_buffer() {
        let data = [0.0, 1.0, 2.0];
        let config = TreeConfig::new();
        let expected = Some(KdTreeError::InvalidIndexBuffer { expected: 3 });
        assert_eq!(KdTree::build_with_indices(&data, 1, vec![0, 1], &config).err(), expected);
        assert_eq!(KdTree::build_with_indices(&data, 1, vec![0, 1, 1], &config).err(), expected);
        assert_eq!(KdTree::build_with_indices(&data, 1, vec![0, 1, 3], &config).err(), expected);
        assert!(KdTree::build_with_indices(&data, 1, vec![2, 0, 1], &config).is_ok());
    }

    #[test]
    fn test_rejects_points_outside_box() {
        let data = [0.5, 10.0];
        let err = KdTree::build(&data, 1, &TreeConfig::new().periodic(vec![10.0])).err();
        assert_eq!(
            err,
            Some(KdTreeError::OutsideBox { index: 1, dim: 0, value: 10.0, size: 10.0 })
        );
        assert_eq!(
            KdTree::build(&data, 1, &TreeConfig::new().periodic(vec![-1.0])).err(),
            Some(KdTreeError::InvalidBoxSize { dim: 0, value: -1.0 })
        );
        assert_eq!(
            KdTree::build(&data, 1, &TreeConfig::new().periodic(vec![10.0, 10.0])).err(),
            Some(KdTreeError::BoxSizeLength { expected: 1, got: 2 })
        );
        // A zero box size leaves the dimension unbounded.
        assert!(KdTree::build(&data, 1, &TreeConfig::new().periodic(vec![0.0])).is_ok());
    }

    #[test]
    fn test_empty_and_single_point() {
        let empty: [f64; 0] = [];
        let tree = KdTree::build(&empty, 3, &TreeConfig::new()).unwrap();
        assert!(tree.is_empty());
        assert_eq!(tree.nodes().len(), 1);
        assert!(tree.root().is_leaf());
        assert_eq!(tree.depth(), 1);

        let single = [1.0, 2.0, 3.0];
        let tree = KdTree::build(&single, 3, &TreeConfig::new().leaf_size(1)).unwrap();
        assert_eq!(tree.len(), 1);
        assert!(tree.root().is_leaf());
        assert_eq!(tree.point(0), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_node_accessors() {
        let data = [0.0, 1.0, 2.0, 3.0];
        let tree = KdTree::build(&data, 1, &TreeConfig::new().leaf_size(2)).unwrap();
        let root = tree.root();
        assert_eq!(root.children(), 4);
        assert_eq!(root.split_dim(), Some(0));
        assert_eq!(root.split(), Some(2.0));
        let less = tree.node(root.less().unwrap());
        let greater = tree.node(root.greater().unwrap());
        assert_eq!((less.start_idx, less.end_idx), (0, 2));
        assert_eq!((greater.start_idx, greater.end_idx), (2, 4));
        assert!(less.is_leaf() && greater.is_leaf());
        assert_eq!(tree.leaf_count(), 2);
        assert_eq!(tree.depth(), 2);
    }
}
