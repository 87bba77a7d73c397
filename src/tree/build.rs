use super::{KdNode, NodeKind};
use crate::config::TreeConfig;
use log::trace;

/// Where a freshly created node hangs off its parent.
#[derive(Clone, Copy, Debug)]
enum Side {
    Less,
    Greater,
}

/// Outcome of splitting a range `[start, end)`.
#[derive(Clone, Copy, Debug)]
struct Split {
    dim: usize,
    value: f64,
    /// First position of the greater half.
    mid: usize,
}

/// Pending node of the work-stack builder.
struct Frame {
    start: usize,
    end: usize,
    parent: Option<(usize, Side)>,
    /// Inherited (maxes, mins); `None` in compact mode, where every node
    /// recomputes its own bounds.
    bounds: Option<(Vec<f64>, Vec<f64>)>,
}

/// Partitions the index permutation and fills the node arena.
///
/// Nodes are appended in pre-order (node, less subtree, greater subtree) by
/// both the recursive and the work-stack variant, so the two produce the same
/// arena and the same permutation.
pub(super) struct TreeBuilder<'d, 'i> {
    data: &'d [f64],
    dims: usize,
    indices: &'i mut [usize],
    nodes: Vec<KdNode>,
    leaf_size: usize,
    balanced: bool,
    compact: bool,
}

impl<'d, 'i> TreeBuilder<'d, 'i> {
    pub(super) fn new(data: &'d [f64], dims: usize, indices: &'i mut [usize], config: &TreeConfig) -> Self {
        let count = indices.len();
        Self {
            data,
            dims,
            indices,
            // A full binary tree over n / leaf_size leaves.
            nodes: Vec::with_capacity(2 * (count / config.leaf_size.max(1)) + 1),
            leaf_size: config.leaf_size,
            balanced: config.balanced,
            compact: config.compact,
        }
    }

    pub(super) fn finish(self) -> Vec<KdNode> {
        self.nodes
    }

    #[inline]
    fn coord(&self, pos: usize, dim: usize) -> f64 {
        self.data[self.indices[pos] * self.dims + dim]
    }

    fn push_leaf(&mut self, start: usize, end: usize) -> usize {
        self.nodes.push(KdNode::leaf(start, end));
        self.nodes.len() - 1
    }

    /// Builds the subtree over `[start, end)` and returns its arena index.
    ///
    /// In compact mode `maxes` and `mins` are scratch space overwritten by every
    /// inner node; otherwise they are the bounds inherited from the ancestors.
    pub(super) fn build_recursive(&mut self, start: usize, end: usize, maxes: &mut [f64], mins: &mut [f64]) -> usize {
        let node_index = self.push_leaf(start, end);
        if end - start <= self.leaf_size {
            return node_index;
        }
        let Some(split) = self.split(start, end, maxes, mins) else {
            return node_index;
        };

        let (less, greater) = if self.compact {
            let less = self.build_recursive(start, split.mid, maxes, mins);
            let greater = self.build_recursive(split.mid, end, maxes, mins);
            (less, greater)
        } else {
            let mut mids = maxes.to_vec();
            mids[split.dim] = split.value;
            let less = self.build_recursive(start, split.mid, &mut mids, mins);

            mids.copy_from_slice(mins);
            mids[split.dim] = split.value;
            let greater = self.build_recursive(split.mid, end, maxes, &mut mids);
            (less, greater)
        };

        // The arena may have grown; go through the index again.
        self.nodes[node_index].kind = NodeKind::Inner {
            split_dim: split.dim,
            split: split.value,
            less,
            greater,
        };
        node_index
    }

    /// Same tree as `build_recursive` over the whole permutation, without
    /// using the call stack.
    pub(super) fn build_work_stack(&mut self, maxes: Vec<f64>, mins: Vec<f64>) {
        let end = self.indices.len();
        let mut scratch_max = maxes.clone();
        let mut scratch_min = mins.clone();
        let mut stack = vec![Frame {
            start: 0,
            end,
            parent: None,
            bounds: if self.compact { None } else { Some((maxes, mins)) },
        }];

        while let Some(frame) = stack.pop() {
            let Frame { start, end, parent, bounds } = frame;
            let node_index = self.push_leaf(start, end);
            if let Some((parent_index, side)) = parent {
                self.link(parent_index, side, node_index);
            }
            if end - start <= self.leaf_size {
                continue;
            }

            let mut bounds = bounds;
            let split = match bounds.as_mut() {
                Some((maxes, mins)) => self.split(start, end, maxes, mins),
                None => self.split(start, end, &mut scratch_max, &mut scratch_min),
            };
            let Some(split) = split else {
                continue;
            };

            // Children are linked as they are created.
            self.nodes[node_index].kind = NodeKind::Inner {
                split_dim: split.dim,
                split: split.value,
                less: usize::MAX,
                greater: usize::MAX,
            };

            let (less_bounds, greater_bounds) = match bounds {
                Some((maxes, mins)) => {
                    let mut less_max = maxes.clone();
                    less_max[split.dim] = split.value;
                    let mut greater_min = mins.clone();
                    greater_min[split.dim] = split.value;
                    (Some((less_max, mins)), Some((maxes, greater_min)))
                }
                None => (None, None),
            };

            // Greater first so that the less subtree is built first.
            stack.push(Frame {
                start: split.mid,
                end,
                parent: Some((node_index, Side::Greater)),
                bounds: greater_bounds,
            });
            stack.push(Frame {
                start,
                end: split.mid,
                parent: Some((node_index, Side::Less)),
                bounds: less_bounds,
            });
        }
    }

    fn link(&mut self, parent: usize, side: Side, child: usize) {
        if let NodeKind::Inner { less, greater, .. } = &mut self.nodes[parent].kind {
            match side {
                Side::Less => *less = child,
                Side::Greater => *greater = child,
            }
        }
    }

    /// Chooses a split for `[start, end)` and partitions the permutation around
    /// it. Returns `None` when the range has no spread and must stay a leaf.
    fn split(&mut self, start: usize, end: usize, maxes: &mut [f64], mins: &mut [f64]) -> Option<Split> {
        if self.compact {
            self.tighten(start, end, maxes, mins);
        }

        // Split along the dimension with the largest spread.
        let mut dim = 0;
        let mut size = 0.0;
        for k in 0..self.dims {
            if maxes[k] - mins[k] > size {
                dim = k;
                size = maxes[k] - mins[k];
            }
        }
        if size == 0.0 {
            trace!("range [{}, {}) has no spread, keeping {} points in one leaf", start, end, end - start);
            return None;
        }

        let mut split = if self.balanced {
            let half = (end - start) / 2;
            let (data, dims) = (self.data, self.dims);
            self.indices[start..end]
                .select_nth_unstable_by(half, |&a, &b| data[a * dims + dim].total_cmp(&data[b * dims + dim]));
            self.coord(start + half, dim)
        } else {
            (maxes[dim] + mins[dim]) / 2.0
        };
        let mut mid = self.partition(start, end, dim, split);

        // One side came out empty: move the single extremal point across the
        // boundary and split at its coordinate.
        if mid == start {
            let j = (start + 1..end).fold(start, |j, i| if self.coord(i, dim) < self.coord(j, dim) { i } else { j });
            split = self.coord(j, dim);
            self.indices.swap(start, j);
            mid = start + 1;
            trace!("slid split of [{}, {}) down to {} along dim {}", start, end, split, dim);
        } else if mid == end {
            let j = (start..end - 1).fold(end - 1, |j, i| if self.coord(i, dim) > self.coord(j, dim) { i } else { j });
            split = self.coord(j, dim);
            self.indices.swap(end - 1, j);
            mid = end - 1;
            trace!("slid split of [{}, {}) up to {} along dim {}", start, end, split, dim);
        }

        Some(Split { dim, value: split, mid })
    }

    /// Overwrites `maxes` and `mins` with the exact bounds of `[start, end)`.
    fn tighten(&self, start: usize, end: usize, maxes: &mut [f64], mins: &mut [f64]) {
        let dims = self.dims;
        let first = self.indices[start] * dims;
        maxes.copy_from_slice(&self.data[first..first + dims]);
        mins.copy_from_slice(&self.data[first..first + dims]);
        for pos in start + 1..end {
            let offset = self.indices[pos] * dims;
            for (k, &v) in self.data[offset..offset + dims].iter().enumerate() {
                if v > maxes[k] { maxes[k] = v; }
                if v < mins[k] { mins[k] = v; }
            }
        }
    }

    /// Two-pointer partition: `[start, p) < split <= [p, end)`. Returns `p`.
    fn partition(&mut self, start: usize, end: usize, dim: usize, split: f64) -> usize {
        let mut p = start;
        let mut q = end;
        while p < q {
            if self.coord(p, dim) < split {
                p += 1;
            } else if self.coord(q - 1, dim) >= split {
                q -= 1;
            } else {
                self.indices.swap(p, q - 1);
                p += 1;
                q -= 1;
            }
        }
        p
    }
}
