use super::ball::BallQuery;
use super::ResultSlots;
use crate::config::{QueryOptions, Strategy};
use crate::error::Result;
use crate::metric::{dispatch_metric, MinMaxDist};
use crate::tracker::{RectRectDistanceTracker, TreeSide};
use crate::tree::{KdTree, NodeKind, ROOT};
use log::debug;
use std::time::Instant;

/// Levels of the first tree below which each rayon task runs sequentially.
fn split_depth() -> usize {
    let threads = rayon::current_num_threads().max(1);
    threads.next_power_of_two().trailing_zeros() as usize + 3
}

impl<'a> KdTree<'a> {
    /// Parallel version of [`KdTree::query_ball_tree`].
    ///
    /// The upper levels of `self` are split across the rayon thread pool with
    /// `rayon::join`; each branch owns a clone of the distance tracker and the
    /// result lists of its own points. Lists hold the same sets as the
    /// sequential query, possibly in a different order. `options.strategy` is
    /// used below the split levels.
    pub fn query_ball_tree_par(&self, other: &KdTree<'_>, options: &QueryOptions) -> Result<Vec<Vec<usize>>> {
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
                let out = ResultSlots::new(&mut slots, 0);
                traverse_parallel(&query, ROOT, &mut tracker, out, split_depth(), options);
            });
        }

        let results = self.unpermute(slots);
        debug!(
            "query_ball_tree_par: {} x {} points on {} threads: {} pairs in {:?}",
            self.len(),
            other.len(),
            rayon::current_num_threads(),
            results.iter().map(Vec::len).sum::<usize>(),
            started.elapsed()
        );
        Ok(results)
    }
}

/// Descends `n1` of the first tree against the root of the second, forking at
/// every inner node until `depth` runs out.
fn traverse_parallel<M: MinMaxDist>(
    query: &BallQuery<'_, M>,
    n1: usize,
    tracker: &mut RectRectDistanceTracker<'_, M>,
    mut out: ResultSlots<'_>,
    depth: usize,
    options: &QueryOptions,
) {
    if tracker.can_prune() {
        return;
    }
    if tracker.accepts_all() {
        query.traverse_no_checking(n1, ROOT, &mut out);
        return;
    }

    let node1 = query.tree1.node(n1);
    match node1.kind {
        NodeKind::Inner { less, greater, .. } if depth > 0 => {
            let mid = query.tree1.node(less).end_idx;
            let (left, right) = out.split_at(mid);

            let mut less_tracker = tracker.clone();
            let mut greater_tracker = tracker.clone();
            rayon::join(
                || {
                    less_tracker.push_less_of(TreeSide::First, node1);
                    traverse_parallel(query, less, &mut less_tracker, left, depth - 1, options);
                    less_tracker.pop();
                },
                || {
                    greater_tracker.push_greater_of(TreeSide::First, node1);
                    traverse_parallel(query, greater, &mut greater_tracker, right, depth - 1, options);
                    greater_tracker.pop();
                },
            );
        }
        _ => match options.strategy {
            Strategy::Recursive => query.traverse_checking(n1, ROOT, tracker, &mut out),
            Strategy::WorkStack => query.traverse_work_stack(n1, ROOT, tracker, &mut out),
        },
    }
}
