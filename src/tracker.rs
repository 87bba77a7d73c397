use crate::bounds::BoundingBox;
use crate::error::{KdTreeError, Result};
use crate::metric::MinMaxDist;
use crate::tree::KdNode;

/// Incremental bounds below this fraction of the root-level maximum distance
/// are recomputed from scratch, where cancellation would dominate them.
const INACCURATE_DISTANCE_FACTOR: f64 = 1e-10;

/// Which of the two trees a push narrows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TreeSide {
    First,
    Second,
}

/// Which half of a node a push descends into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Less,
    Greater,
}

#[derive(Clone, Copy, Debug)]
struct StackItem {
    which: TreeSide,
    split_dim: usize,
    min_distance: f64,
    max_distance: f64,
    min_along_dim: f64,
    max_along_dim: f64,
}

/// Lower and upper distance bounds between two shrinking rectangles.
///
/// Every `push_*` narrows one rectangle along a single dimension and updates
/// the bounds from that dimension alone; `pop` restores the previous state.
/// Pushes and pops nest like the traversal's recursion.
///
/// All distances are in the metric's power space (see [`crate::metric`]).
#[derive(Debug)]
pub struct RectRectDistanceTracker<'m, M> {
    metric: &'m M,
    rect1: BoundingBox,
    rect2: BoundingBox,
    min_distance: f64,
    max_distance: f64,
    upper_bound: f64,
    epsfac: f64,
    inaccurate_distance_limit: f64,
    stack: Vec<StackItem>,
}

// Only a reference to the metric is held, so no `M: Clone` bound.
impl<M> Clone for RectRectDistanceTracker<'_, M> {
    fn clone(&self) -> Self {
        Self {
            metric: self.metric,
            rect1: self.rect1.clone(),
            rect2: self.rect2.clone(),
            min_distance: self.min_distance,
            max_distance: self.max_distance,
            upper_bound: self.upper_bound,
            epsfac: self.epsfac,
            inaccurate_distance_limit: self.inaccurate_distance_limit,
            stack: self.stack.clone(),
        }
    }
}

impl<'m, M: MinMaxDist> RectRectDistanceTracker<'m, M> {
    /// Seeds the tracker with two root rectangles and a plain-distance radius.
    pub fn new(metric: &'m M, rect1: BoundingBox, rect2: BoundingBox, radius: f64, eps: f64) -> Result<Self> {
        if rect1.dims() != rect2.dims() {
            return Err(KdTreeError::DimensionMismatch {
                left: rect1.dims(),
                right: rect2.dims(),
            });
        }

        let upper_bound = if radius.is_infinite() { radius } else { metric.distance_p(radius) };
        // 1 / (1 + eps), expressed in power space.
        let epsfac = if eps == 0.0 { 1.0 } else { 1.0 / metric.distance_p(1.0 + eps) };

        let (min_distance, max_distance) = metric.rect_rect_p(&rect1, &rect2);
        if max_distance.is_infinite() {
            return Err(KdTreeError::DistanceOverflow(metric.p()));
        }

        Ok(Self {
            metric,
            rect1,
            rect2,
            min_distance,
            max_distance,
            upper_bound,
            epsfac,
            inaccurate_distance_limit: max_distance * INACCURATE_DISTANCE_FACTOR,
            stack: Vec::with_capacity(64),
        })
    }

    pub fn min_distance(&self) -> f64 {
        self.min_distance
    }

    pub fn max_distance(&self) -> f64 {
        self.max_distance
    }

    /// The query radius in power space.
    pub fn upper_bound(&self) -> f64 {
        self.upper_bound
    }

    pub fn epsfac(&self) -> f64 {
        self.epsfac
    }

    pub fn p(&self) -> f64 {
        self.metric.p()
    }

    pub fn rect(&self, which: TreeSide) -> &BoundingBox {
        match which {
            TreeSide::First => &self.rect1,
            TreeSide::Second => &self.rect2,
        }
    }

    /// Number of pushes not yet popped.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// No pair of points can be within the radius, even approximately.
    #[inline]
    pub fn can_prune(&self) -> bool {
        self.min_distance > self.upper_bound * self.epsfac
    }

    /// Every pair of points is within the radius, up to the tolerance.
    #[inline]
    pub fn accepts_all(&self) -> bool {
        self.max_distance < self.upper_bound / self.epsfac
    }

    pub fn push_less_of(&mut self, which: TreeSide, node: &KdNode) {
        self.push_node(which, Direction::Less, node);
    }

    pub fn push_greater_of(&mut self, which: TreeSide, node: &KdNode) {
        self.push_node(which, Direction::Greater, node);
    }

    pub(crate) fn push_node(&mut self, which: TreeSide, direction: Direction, node: &KdNode) {
        match (node.split_dim(), node.split()) {
            (Some(split_dim), Some(split)) => self.push(which, direction, split_dim, split),
            _ => panic!("cannot descend into a leaf node"),
        }
    }

    /// Narrows `which`'s rectangle at `split_val` along `split_dim`.
    pub fn push(&mut self, which: TreeSide, direction: Direction, split_dim: usize, split_val: f64) {
        let (min1, max1) = if M::ADDITIVE {
            self.metric.interval_interval_p(&self.rect1, &self.rect2, split_dim)
        } else {
            (0.0, 0.0)
        };

        let rect = match which {
            TreeSide::First => &mut self.rect1,
            TreeSide::Second => &mut self.rect2,
        };
        self.stack.push(StackItem {
            which,
            split_dim,
            min_distance: self.min_distance,
            max_distance: self.max_distance,
            min_along_dim: rect.min[split_dim],
            max_along_dim: rect.max[split_dim],
        });
        match direction {
            Direction::Less => rect.shrink_max(split_dim, split_val),
            Direction::Greater => rect.shrink_min(split_dim, split_val),
        };

        if !M::ADDITIVE {
            self.recompute();
            return;
        }

        let (min2, max2) = self.metric.interval_interval_p(&self.rect1, &self.rect2, split_dim);
        debug_assert!(min2 <= max2, "inverted distance bounds along dim {}: {} > {}", split_dim, min2, max2);

        self.min_distance += min2 - min1;
        self.max_distance += max2 - max1;

        let limit = self.inaccurate_distance_limit;
        if (self.min_distance != 0.0 && self.min_distance < limit) || self.max_distance < limit {
            self.recompute();
        }
    }

    /// Undoes the most recent push.
    pub fn pop(&mut self) {
        let Some(item) = self.stack.pop() else {
            panic!("tracker popped more often than pushed");
        };
        self.min_distance = item.min_distance;
        self.max_distance = item.max_distance;
        let rect = match item.which {
            TreeSide::First => &mut self.rect1,
            TreeSide::Second => &mut self.rect2,
        };
        rect.restore(item.split_dim, item.min_along_dim, item.max_along_dim);
    }

    fn recompute(&mut self) {
        let (min, max) = self.metric.rect_rect_p(&self.rect1, &self.rect2);
        debug_assert!(min <= max, "inverted distance bounds: {} > {}", min, max);
        self.min_distance = min;
        self.max_distance = max;
    }
}
