use kdball::{KdTree, NodeKind, TreeConfig, ROOT};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn check_invariants(tree: &KdTree, balanced: bool) {
    let dims = tree.dims();
    let mut seen = vec![false; tree.len()];
    for &idx in tree.indices() {
        assert!(!seen[idx], "index {} appears twice", idx);
        seen[idx] = true;
    }
    assert!(seen.iter().all(|&s| s), "permutation is incomplete");

    let root = tree.root();
    assert_eq!((root.start_idx, root.end_idx), (0, tree.len()));

    for node in tree.nodes() {
        let points: Vec<&[f64]> = tree.indices()[node.start_idx..node.end_idx]
            .iter()
            .map(|&i| tree.point(i))
            .collect();
        match node.kind {
            NodeKind::Leaf => {
                if node.children() > tree.leaf_size() {
                    // Oversized leaves are only allowed when nothing could be split.
                    for k in 0..dims {
                        assert!(
                            points.iter().all(|p| p[k] == points[0][k]),
                            "oversized leaf with spread in dim {}",
                            k
                        );
                    }
                }
            }
            NodeKind::Inner { split_dim, split, less, greater } => {
                let (l, g) = (tree.node(less), tree.node(greater));
                assert_eq!(l.start_idx, node.start_idx);
                assert_eq!(l.end_idx, g.start_idx);
                assert_eq!(g.end_idx, node.end_idx);
                assert!(l.children() > 0 && g.children() > 0, "empty child");

                // A slide can leave points equal to the split on the less side.
                for &i in &tree.indices()[l.start_idx..l.end_idx] {
                    assert!(tree.point(i)[split_dim] <= split, "point {} left of split {}", i, split);
                }
                for &i in &tree.indices()[g.start_idx..g.end_idx] {
                    assert!(tree.point(i)[split_dim] >= split, "point {} right of split {}", i, split);
                }
                if balanced {
                    let below = points.iter().filter(|p| p[split_dim] < split).count();
                    assert!(
                        below <= node.children().div_ceil(2),
                        "{} of {} points strictly below median split {}",
                        below,
                        node.children(),
                        split
                    );
                }
            }
        }
    }
}

#[test]
fn test_random_trees_hold_invariants() {
    let mut rng = StdRng::seed_from_u64(17);
    for &dims in &[1, 2, 5] {
        for &n in &[1, 7, 100, 1000] {
            let data: Vec<f64> = (0..n * dims).map(|_| rng.gen_range(-50.0..50.0)).collect();
            for &(balanced, compact) in &[(true, true), (true, false), (false, true), (false, false)] {
                let config = TreeConfig::new().leaf_size(5).balanced(balanced).compact(compact);
                let tree = KdTree::build(&data, dims, &config).unwrap();
                check_invariants(&tree, balanced);
            }
        }
    }
}

#[test]
fn test_duplicate_points_are_peeled_off() {
    let mut data = vec![3.0; 2 * 40];
    data.extend_from_slice(&[1.0, 1.0, 5.0, 5.0]);
    let tree = KdTree::build(&data, 2, &TreeConfig::new().leaf_size(2)).unwrap();
    check_invariants(&tree, true);
    // The outlier at (5, 5) keeps every range of copies splittable.
    assert!(tree.nodes().iter().all(|n| !n.is_leaf() || n.children() <= 2));
}

#[test]
fn test_median_balance_with_ties() {
    let mut rng = StdRng::seed_from_u64(23);
    for &dims in &[1, 2, 3] {
        for &extent in &[2, 4, 10] {
            // Integer coordinates: many points share every split value.
            let data: Vec<f64> = (0..400 * dims).map(|_| rng.gen_range(0..extent) as f64).collect();
            for &compact in &[true, false] {
                for &leaf_size in &[1, 3, 8] {
                    let config = TreeConfig::new().leaf_size(leaf_size).compact(compact);
                    let tree = KdTree::build(&data, dims, &config).unwrap();
                    check_invariants(&tree, true);
                }
            }
        }
    }
}

#[test]
fn test_midpoint_trees_with_ties() {
    let mut rng = StdRng::seed_from_u64(29);
    let data: Vec<f64> = (0..300 * 2).map(|_| rng.gen_range(0..6) as f64).collect();
    for &compact in &[true, false] {
        let config = TreeConfig::new().leaf_size(2).balanced(false).compact(compact);
        let tree = KdTree::build(&data, 2, &config).unwrap();
        check_invariants(&tree, false);
    }
}

#[test]
fn test_clustered_data_sliding_midpoint() {
    // One far outlier makes plain midpoint splits degenerate.
    let mut data: Vec<f64> = (0..200).map(|i| i as f64 * 1e-3).collect();
    data.push(1e6);
    let tree = KdTree::build(&data, 1, &TreeConfig::new().leaf_size(4).balanced(false)).unwrap();
    check_invariants(&tree, false);
    assert_eq!(tree.leaf_count(), tree.nodes().iter().filter(|n| n.is_leaf()).count());
}

#[test]
fn test_user_index_buffer_is_permuted_in_place() {
    let data = [4.0, 3.0, 2.0, 1.0, 0.0];
    let indices = vec![4, 3, 2, 1, 0];
    let tree = KdTree::build_with_indices(&data, 1, indices, &TreeConfig::new().leaf_size(1)).unwrap();
    check_invariants(&tree, true);
    assert_eq!(tree.node(ROOT).children(), 5);
    let ordered: Vec<f64> = tree.indices().iter().map(|&i| tree.point(i)[0]).collect();
    assert_eq!(ordered, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
}

#[test]
fn test_root_bounds_cover_data() {
    let data = [1.0, -2.0, 3.0, 4.0, -5.0, 0.5];
    let tree = KdTree::build(&data, 2, &TreeConfig::new()).unwrap();
    assert_eq!(tree.bounds().min, vec![-5.0, -2.0]);
    assert_eq!(tree.bounds().max, vec![3.0, 4.0]);
    assert_eq!(tree.depth(), 1);
}
