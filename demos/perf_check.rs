use kdball::{KdTree, QueryOptions, TreeConfig};
use rand::prelude::*;

fn main() {
    // Initialize Rayon explicitly so thread creation (clone3) happens
    // before the heavy calculation we want to profile.
    rayon::ThreadPoolBuilder::new().build_global().unwrap();

    // A large uniform point cloud in a periodic 100^3 box; about 30 neighbours
    // per point at this radius.
    let mut rng = StdRng::seed_from_u64(0);
    let points: Vec<f64> = (0..300_000 * 3).map(|_| rng.gen_range(0.0..100.0)).collect();

    let config = TreeConfig::new().periodic(vec![100.0; 3]);
    let tree = KdTree::build(&points, 3, &config).unwrap();

    // Run the query (this is the hot path)
    let neighbours = tree.query_ball_tree_par(&tree, &QueryOptions::new(2.9)).unwrap();
    let pairs: usize = neighbours.iter().map(Vec::len).sum();
    println!("{} points, {} nodes, {} pairs", tree.len(), tree.nodes().len(), pairs);
}
