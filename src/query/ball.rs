use super::ResultSlots;
use crate::metric::MinMaxDist;
use crate::tracker::{Direction, RectRectDistanceTracker, TreeSide};
use crate::tree::{KdNode, KdTree, NodeKind};

/// One unit of work for the explicit-stack traversals.
#[derive(Clone, Copy, Debug)]
pub(super) enum Step {
    Visit(usize, usize),
    Push(TreeSide, Direction, usize),
    Pop,
}

/// Queues the children of `(n1, n2)` in the order the recursive traversals
/// visit them, with the matching tracker pushes and pops. Returns `false`
/// when both nodes are leaves.
pub(super) fn descend(work: &mut Vec<Step>, n1: usize, kind1: NodeKind, n2: usize, kind2: NodeKind) -> bool {
    use Direction::{Greater, Less};
    use TreeSide::{First, Second};

    // Steps are listed in execution order and pushed reversed.
    match (kind1, kind2) {
        (NodeKind::Leaf, NodeKind::Leaf) => return false,
        (NodeKind::Leaf, NodeKind::Inner { less, greater, .. }) => work.extend(
            [
                Step::Push(Second, Less, n2),
                Step::Visit(n1, less),
                Step::Pop,
                Step::Push(Second, Greater, n2),
                Step::Visit(n1, greater),
                Step::Pop,
            ]
            .into_iter()
            .rev(),
        ),
        (NodeKind::Inner { less, greater, .. }, NodeKind::Leaf) => work.extend(
            [
                Step::Push(First, Less, n1),
                Step::Visit(less, n2),
                Step::Pop,
                Step::Push(First, Greater, n1),
                Step::Visit(greater, n2),
                Step::Pop,
            ]
            .into_iter()
            .rev(),
        ),
        (
            NodeKind::Inner { less: less1, greater: greater1, .. },
            NodeKind::Inner { less: less2, greater: greater2, .. },
        ) => work.extend(
            [
                Step::Push(First, Less, n1),
                Step::Push(Second, Less, n2),
                Step::Visit(less1, less2),
                Step::Pop,
                Step::Push(Second, Greater, n2),
                Step::Visit(less1, greater2),
                Step::Pop,
                Step::Pop,
                Step::Push(First, Greater, n1),
                Step::Push(Second, Less, n2),
                Step::Visit(greater1, less2),
                Step::Pop,
                Step::Push(Second, Greater, n2),
                Step::Visit(greater1, greater2),
                Step::Pop,
                Step::Pop,
            ]
            .into_iter()
            .rev(),
        ),
    }
    true
}

/// Applies a tracker step; returns the node pair to visit for `Step::Visit`.
pub(super) fn apply_step<M: MinMaxDist>(
    step: Step,
    tree1: &KdTree<'_>,
    tree2: &KdTree<'_>,
    tracker: &mut RectRectDistanceTracker<'_, M>,
) -> Option<(usize, usize)> {
    match step {
        Step::Push(which, direction, node) => {
            let tree = match which {
                TreeSide::First => tree1,
                TreeSide::Second => tree2,
            };
            tracker.push_node(which, direction, tree.node(node));
            None
        }
        Step::Pop => {
            tracker.pop();
            None
        }
        Step::Visit(n1, n2) => Some((n1, n2)),
    }
}

/// Fixed-radius dual-tree traversal over a pair of trees.
///
/// Holds only shared, read-only state; the tracker and the result slots are
/// owned by the caller, so one `BallQuery` can drive several traversals.
pub(crate) struct BallQuery<'q, M> {
    pub(crate) tree1: &'q KdTree<'q>,
    pub(crate) tree2: &'q KdTree<'q>,
    metric: &'q M,
    /// Radius in power space.
    upper_bound: f64,
}

impl<'q, M: MinMaxDist> BallQuery<'q, M> {
    pub(crate) fn new(tree1: &'q KdTree<'q>, tree2: &'q KdTree<'q>, metric: &'q M, upper_bound: f64) -> Self {
        Self {
            tree1,
            tree2,
            metric,
            upper_bound,
        }
    }

    pub(crate) fn traverse_checking(
        &self,
        n1: usize,
        n2: usize,
        tracker: &mut RectRectDistanceTracker<'_, M>,
        out: &mut ResultSlots<'_>,
    ) {
        if tracker.can_prune() {
            return;
        }
        if tracker.accepts_all() {
            self.traverse_no_checking(n1, n2, out);
            return;
        }

        let node1 = self.tree1.node(n1);
        let node2 = self.tree2.node(n2);
        match (node1.kind, node2.kind) {
            (NodeKind::Leaf, NodeKind::Leaf) => self.brute_force(node1, node2, out),
            (NodeKind::Leaf, NodeKind::Inner { less, greater, .. }) => {
                tracker.push_less_of(TreeSide::Second, node2);
                self.traverse_checking(n1, less, tracker, out);
                tracker.pop();

                tracker.push_greater_of(TreeSide::Second, node2);
                self.traverse_checking(n1, greater, tracker, out);
                tracker.pop();
            }
            (NodeKind::Inner { less, greater, .. }, NodeKind::Leaf) => {
                tracker.push_less_of(TreeSide::First, node1);
                self.traverse_checking(less, n2, tracker, out);
                tracker.pop();

                tracker.push_greater_of(TreeSide::First, node1);
                self.traverse_checking(greater, n2, tracker, out);
                tracker.pop();
            }
            (
                NodeKind::Inner { less: less1, greater: greater1, .. },
                NodeKind::Inner { less: less2, greater: greater2, .. },
            ) => {
                tracker.push_less_of(TreeSide::First, node1);
                tracker.push_less_of(TreeSide::Second, node2);
                self.traverse_checking(less1, less2, tracker, out);
                tracker.pop();

                tracker.push_greater_of(TreeSide::Second, node2);
                self.traverse_checking(less1, greater2, tracker, out);
                tracker.pop();
                tracker.pop();

                tracker.push_greater_of(TreeSide::First, node1);
                tracker.push_less_of(TreeSide::Second, node2);
                self.traverse_checking(greater1, less2, tracker, out);
                tracker.pop();

                tracker.push_greater_of(TreeSide::Second, node2);
                self.traverse_checking(greater1, greater2, tracker, out);
                tracker.pop();
                tracker.pop();
            }
        }
    }

    /// Same traversal as `traverse_checking`, driven by a heap-allocated work
    /// list. Tracker pushes and pops happen in exactly the same order.
    pub(crate) fn traverse_work_stack(
        &self,
        n1: usize,
        n2: usize,
        tracker: &mut RectRectDistanceTracker<'_, M>,
        out: &mut ResultSlots<'_>,
    ) {
        let mut work = vec![Step::Visit(n1, n2)];
        while let Some(step) = work.pop() {
            let Some((n1, n2)) = apply_step(step, self.tree1, self.tree2, tracker) else {
                continue;
            };

            if tracker.can_prune() {
                continue;
            }
            if tracker.accepts_all() {
                self.traverse_no_checking(n1, n2, out);
                continue;
            }

            let node1 = self.tree1.node(n1);
            let node2 = self.tree2.node(n2);
            if !descend(&mut work, n1, node1.kind, n2, node2.kind) {
                self.brute_force(node1, node2, out);
            }
        }
    }

    /// Emits every pair under `n1` x `n2` without distance checks.
    ///
    /// Node ranges are contiguous in the permutation, so this is a range copy
    /// rather than a walk down to the leaves.
    pub(crate) fn traverse_no_checking(&self, n1: usize, n2: usize, out: &mut ResultSlots<'_>) {
        let node1 = self.tree1.node(n1);
        let node2 = self.tree2.node(n2);
        let others = &self.tree2.indices()[node2.start_idx..node2.end_idx];
        for pos in node1.start_idx..node1.end_idx {
            out.at(pos).extend_from_slice(others);
        }
    }

    fn brute_force(&self, node1: &KdNode, node2: &KdNode, out: &mut ResultSlots<'_>) {
        let ub = self.upper_bound;
        let others = self.tree2.indices();
        for i in node1.start_idx..node1.end_idx {
            let x = self.tree1.point_at(i);
            let results_i = out.at(i);
            for j in node2.start_idx..node2.end_idx {
                let d = self.metric.point_point_p(x, self.tree2.point_at(j), ub);
                if d <= ub {
                    results_i.push(others[j]);
                }
            }
        }
    }
}
