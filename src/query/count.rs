use super::ball::{apply_step, descend, Step};
use crate::config::{QueryOptions, Strategy};
use crate::error::Result;
use crate::metric::{dispatch_metric, MinMaxDist};
use crate::tracker::{RectRectDistanceTracker, TreeSide};
use crate::tree::{KdNode, KdTree, NodeKind, NodeWeights, ROOT};
use log::debug;
use std::time::Instant;

/// How points and nodes of one tree contribute to a count.
#[derive(Clone, Copy)]
enum Weighting<'w> {
    Unit,
    Weighted { points: &'w [f64], nodes: &'w NodeWeights },
}

impl Weighting<'_> {
    #[inline]
    fn node(&self, tree: &KdTree<'_>, n: usize) -> f64 {
        match self {
            Weighting::Unit => tree.node(n).children() as f64,
            Weighting::Weighted { nodes, .. } => nodes.get(n),
        }
    }

    #[inline]
    fn point(&self, index: usize) -> f64 {
        match self {
            Weighting::Unit => 1.0,
            Weighting::Weighted { points, .. } => points[index],
        }
    }
}

struct PairCount<'q, M> {
    tree1: &'q KdTree<'q>,
    tree2: &'q KdTree<'q>,
    metric: &'q M,
    upper_bound: f64,
    w1: Weighting<'q>,
    w2: Weighting<'q>,
}

impl<M: MinMaxDist> PairCount<'_, M> {
    fn traverse(&self, n1: usize, n2: usize, tracker: &mut RectRectDistanceTracker<'_, M>) -> f64 {
        if tracker.can_prune() {
            return 0.0;
        }
        if tracker.accepts_all() {
            return self.all_pairs(n1, n2);
        }

        let node1 = self.tree1.node(n1);
        let node2 = self.tree2.node(n2);
        match (node1.kind, node2.kind) {
            (NodeKind::Leaf, NodeKind::Leaf) => self.brute_force(node1, node2),
            (NodeKind::Leaf, NodeKind::Inner { less, greater, .. }) => {
                tracker.push_less_of(TreeSide::Second, node2);
                let mut total = self.traverse(n1, less, tracker);
                tracker.pop();

                tracker.push_greater_of(TreeSide::Second, node2);
                total += self.traverse(n1, greater, tracker);
                tracker.pop();
                total
            }
            (NodeKind::Inner { less, greater, .. }, NodeKind::Leaf) => {
                tracker.push_less_of(TreeSide::First, node1);
                let mut total = self.traverse(less, n2, tracker);
                tracker.pop();

                tracker.push_greater_of(TreeSide::First, node1);
                total += self.traverse(greater, n2, tracker);
                tracker.pop();
                total
            }
            (
                NodeKind::Inner { less: less1, greater: greater1, .. },
                NodeKind::Inner { less: less2, greater: greater2, .. },
            ) => {
                let mut total = 0.0;
                for (direction1, child1) in [(true, less1), (false, greater1)] {
                    if direction1 {
                        tracker.push_less_of(TreeSide::First, node1);
                    } else {
                        tracker.push_greater_of(TreeSide::First, node1);
                    }

                    tracker.push_less_of(TreeSide::Second, node2);
                    total += self.traverse(child1, less2, tracker);
                    tracker.pop();

                    tracker.push_greater_of(TreeSide::Second, node2);
                    total += self.traverse(child1, greater2, tracker);
                    tracker.pop();

                    tracker.pop();
                }
                total
            }
        }
    }

    /// Same count as `traverse`, driven by the ball query's work list.
    fn traverse_work_stack(&self, n1: usize, n2: usize, tracker: &mut RectRectDistanceTracker<'_, M>) -> f64 {
        let mut total = 0.0;
        let mut work = vec![Step::Visit(n1, n2)];
        while let Some(step) = work.pop() {
            let Some((n1, n2)) = apply_step(step, self.tree1, self.tree2, tracker) else {
                continue;
            };

            if tracker.can_prune() {
                continue;
            }
            if tracker.accepts_all() {
                total += self.all_pairs(n1, n2);
                continue;
            }

            let node1 = self.tree1.node(n1);
            let node2 = self.tree2.node(n2);
            if !descend(&mut work, n1, node1.kind, n2, node2.kind) {
                total += self.brute_force(node1, node2);
            }
        }
        total
    }

    #[inline]
    fn all_pairs(&self, n1: usize, n2: usize) -> f64 {
        self.w1.node(self.tree1, n1) * self.w2.node(self.tree2, n2)
    }

    fn brute_force(&self, node1: &KdNode, node2: &KdNode) -> f64 {
        let ub = self.upper_bound;
        let (idx1, idx2) = (self.tree1.indices(), self.tree2.indices());
        let mut total = 0.0;
        for i in node1.start_idx..node1.end_idx {
            let x = self.tree1.point_at(i);
            let mut row = 0.0;
            for j in node2.start_idx..node2.end_idx {
                if self.metric.point_point_p(x, self.tree2.point_at(j), ub) <= ub {
                    row += self.w2.point(idx2[j]);
                }
            }
            total += self.w1.point(idx1[i]) * row;
        }
        total
    }
}

impl<'a> KdTree<'a> {
    /// Number of pairs `(i, j)`, `i` in `self` and `j` in `other`, within
    /// `options.radius`.
    ///
    /// Equals the summed lengths of [`KdTree::query_ball_tree`]'s lists for the
    /// same arguments, without materializing them. `options.strategy` picks
    /// the traversal the same way it does for the ball query.
    pub fn count_neighbors(&self, other: &KdTree<'_>, options: &QueryOptions) -> Result<usize> {
        let total = self.count_pairs(other, Weighting::Unit, Weighting::Unit, options)?;
        Ok(total.round() as usize)
    }

    /// Sum of `self_weights[i] * other_weights[j]` over all pairs within
    /// `options.radius`.
    ///
    /// Both weight slices are indexed by original point index and must match
    /// their tree's length.
    pub fn count_neighbors_weighted(
        &self,
        self_weights: &[f64],
        other: &KdTree<'_>,
        other_weights: &[f64],
        options: &QueryOptions,
    ) -> Result<f64> {
        let nodes1 = self.build_weights(self_weights)?;
        let nodes2 = other.build_weights(other_weights)?;
        self.count_pairs(
            other,
            Weighting::Weighted {
                points: self_weights,
                nodes: &nodes1,
            },
            Weighting::Weighted {
                points: other_weights,
                nodes: &nodes2,
            },
            options,
        )
    }

    fn count_pairs(
        &self,
        other: &KdTree<'_>,
        w1: Weighting<'_>,
        w2: Weighting<'_>,
        options: &QueryOptions,
    ) -> Result<f64> {
        self.check_compatible(other)?;
        options.validate()?;
        if self.is_empty() || other.is_empty() {
            return Ok(0.0);
        }

        let started = Instant::now();
        let total = dispatch_metric!(options.p, self.boxsize(), |metric| {
            let mut tracker = RectRectDistanceTracker::new(
                &metric,
                self.bounds().clone(),
                other.bounds().clone(),
                options.radius,
                options.eps,
            )?;
            let counter = PairCount {
                tree1: self,
                tree2: other,
                metric: &metric,
                upper_bound: tracker.upper_bound(),
                w1,
                w2,
            };
            match options.strategy {
                Strategy::Recursive => counter.traverse(ROOT, ROOT, &mut tracker),
                Strategy::WorkStack => counter.traverse_work_stack(ROOT, ROOT, &mut tracker),
            }
        });

        debug!(
            "count_neighbors: {} x {} points, r = {}: {} in {:?}",
            self.len(),
            other.len(),
            options.radius,
            total,
            started.elapsed()
        );
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{QueryOptions, Strategy, TreeConfig};
    use crate::error::KdTreeError;
    use crate::tree::KdTree;

    fn grid(n: usize) -> Vec<f64> {
        (0..n * n).flat_map(|k| [(k % n) as f64, (k / n) as f64]).collect()
    }

    #[test]
    fn test_count_matches_lists() {
        let data = grid(12);
        let tree = KdTree::build(&data, 2, &TreeConfig::new().leaf_size(4)).unwrap();
        for &r in &[0.0, 1.0, 1.5, 3.2] {
            let options = QueryOptions::new(r);
            let lists = tree.query_ball_tree(&tree, &options).unwrap();
            let expected: usize = lists.iter().map(Vec::len).sum();
            assert_eq!(tree.count_neighbors(&tree, &options).unwrap(), expected, "r = {}", r);
        }
    }

    #[test]
    fn test_unit_weights_equal_plain_count() {
        let data = grid(8);
        let tree = KdTree::build(&data, 2, &TreeConfig::new().leaf_size(3)).unwrap();
        let ones = vec![1.0; tree.len()];
        let options = QueryOptions::new(2.0).p(1.0);
        let plain = tree.count_neighbors(&tree, &options).unwrap();
        let weighted = tree.count_neighbors_weighted(&ones, &tree, &ones, &options).unwrap();
        assert_eq!(weighted, plain as f64);
    }

    #[test]
    fn test_weighted_pairs() {
        // 0 -- 1 are within 1.0, 2 is far from both.
        let data = [0.0, 1.0, 10.0];
        let tree = KdTree::build(&data, 1, &TreeConfig::new().leaf_size(1)).unwrap();
        let w = [2.0, 3.0, 5.0];
        let total = tree
            .count_neighbors_weighted(&w, &tree, &w, &QueryOptions::new(1.0))
            .unwrap();
        // self pairs 4 + 9 + 25, cross pairs 2 * (2 * 3)
        assert_eq!(total, 50.0);
    }

    #[test]
    fn test_weight_length_checked() {
        let data = [0.0, 1.0];
        let tree = KdTree::build(&data, 1, &TreeConfig::new()).unwrap();
        let err = tree
            .count_neighbors_weighted(&[1.0], &tree, &[1.0, 1.0], &QueryOptions::new(1.0))
            .err();
        assert_eq!(err, Some(KdTreeError::WeightLength { expected: 2, got: 1 }));
    }

    #[test]
    fn test_count_strategies_agree() {
        // Half-integer offsets on a grid put many pairs exactly at r.
        let data: Vec<f64> = grid(10).iter().map(|v| v * 0.5).collect();
        let periodic = vec![5.0, 5.0];
        for boxsize in [None, Some(&periodic)] {
            let mut config = TreeConfig::new().leaf_size(2).balanced(false).compact(false);
            if let Some(bs) = boxsize {
                config = config.periodic(bs.clone());
            }
            let tree = KdTree::build(&data, 2, &config).unwrap();
            for &p in &[1.0, 2.0, f64::INFINITY] {
                let options = QueryOptions::new(1.0).p(p);
                let recursive = tree.count_neighbors(&tree, &options).unwrap();
                let stacked = tree
                    .count_neighbors(&tree, &options.strategy(Strategy::WorkStack))
                    .unwrap();
                assert_eq!(recursive, stacked, "p = {}, box {:?}", p, boxsize);
            }
        }
    }

    #[test]
    fn test_weighted_count_strategies_agree() {
        let data = grid(9);
        let tree = KdTree::build(&data, 2, &TreeConfig::new().leaf_size(3)).unwrap();
        let w: Vec<f64> = (0..tree.len()).map(|i| (i % 4) as f64 + 0.5).collect();
        let options = QueryOptions::new(2.5);
        let recursive = tree.count_neighbors_weighted(&w, &tree, &w, &options).unwrap();
        let stacked = tree
            .count_neighbors_weighted(&w, &tree, &w, &options.strategy(Strategy::WorkStack))
            .unwrap();
        assert!((recursive - stacked).abs() <= 1e-9 * recursive, "{} vs {}", recursive, stacked);
    }
}
