//! Dual-tree queries: fixed-radius neighbour lists and neighbour counts.
//!
//! Every query validates its inputs, picks a concrete metric once from
//! `(boxed?, p)`, seeds a [`RectRectDistanceTracker`] with the two root boxes
//! and then walks both trees together.

use crate::config::{QueryOptions, Strategy};
use crate::error::{KdTreeError, Result};
use crate::metric::dispatch_metric;
use crate::tracker::RectRectDistanceTracker;
use crate::tree::{KdTree, ROOT};
use log::debug;
use std::time::Instant;

mod ball;
mod count;
mod parallel;

use ball::BallQuery;

/// Result lists addressed by permutation position of the first tree.
///
/// Covers positions `offset..offset + slots.len()`; the parallel query hands
/// disjoint sub-ranges to different threads.
pub(crate) struct ResultSlots<'r> {
    slots: &'r mut [Vec<usize>],
    offset: usize,
}

impl<'r> ResultSlots<'r> {
    pub(crate) fn new(slots: &'r mut [Vec<usize>], offset: usize) -> Self {
        Self { slots, offset }
    }

    #[inline]
    pub(crate) fn at(&mut self, pos: usize) -> &mut Vec<usize> {
        &mut self.slots[pos - self.offset]
    }

    /// Splits into `[offset, pos)` and `[pos, end)`.
    pub(crate) fn split_at(self, pos: usize) -> (ResultSlots<'r>, ResultSlots<'r>) {
        let (left, right) = self.slots.split_at_mut(pos - self.offset);
        (ResultSlots::new(left, self.offset), ResultSlots::new(right, pos))
    }
}

impl<'a> KdTree<'a> {
    /// For every point of `self`, lists the points of `other` within
    /// `options.radius` (inclusive).
    ///
    /// The returned vector has one entry per point of `self`, by original
    /// index; entries hold original indices into `other` in no particular order.
    pub fn query_ball_tree(&self, other: &KdTree<'_>, options: &QueryOptions) -> Result<Vec<Vec<usize>>> {
        self.check_compatible(other)?;
        options.validate()?;

        let started = Instant::now();
        let mut slots = vec![Vec::new(); self.len()];
        if !self.is_empty() && !other.is_empty() {
            dispatch_metric!(options.p, self.boxsize(), |metric| {
                let mut tracker = RectRectDistanceTracker::new(
                    &metric,
                    self.bounds().clone(),
                    other.bounds().clone(),
                    options.radius,
                    options.eps,
                )?;
                let query = BallQuery::new(self, other, &metric, tracker.upper_bound());
                let mut out = ResultSlots::new(&mut slots, 0);
                match options.strategy {
                    Strategy::Recursive => query.traverse_checking(ROOT, ROOT, &mut tracker, &mut out),
                    Strategy::WorkStack => query.traverse_work_stack(ROOT, ROOT, &mut tracker, &mut out),
                }
                debug_assert_eq!(tracker.depth(), 0, "unbalanced tracker after traversal");
            });
        }

        let results = self.unpermute(slots);
        debug!(
            "query_ball_tree: {} x {} points, r = {}, p = {}, eps = {}: {} pairs in {:?}",
            self.len(),
            other.len(),
            options.radius,
            options.p,
            options.eps,
            results.iter().map(Vec::len).sum::<usize>(),
            started.elapsed()
        );
        Ok(results)
    }

    /// Checks that two trees can be queried against each other.
    pub(crate) fn check_compatible(&self, other: &KdTree<'_>) -> Result<()> {
        if self.dims() != other.dims() {
            return Err(KdTreeError::DimensionMismatch {
                left: self.dims(),
                right: other.dims(),
            });
        }
        if self.boxsize() != other.boxsize() {
            return Err(KdTreeError::BoxSizeMismatch);
        }
        Ok(())
    }

    /// Reorders per-position result lists into per-point lists.
    pub(crate) fn unpermute(&self, mut slots: Vec<Vec<usize>>) -> Vec<Vec<usize>> {
        let mut results = vec![Vec::new(); slots.len()];
        for (pos, &idx) in self.indices().iter().enumerate() {
            results[idx] = std::mem::take(&mut slots[pos]);
        }
        results
    }
}
