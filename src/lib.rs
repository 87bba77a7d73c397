//! # kdball
//!
//! `kdball` is a Rust library for fixed-radius neighbour search between two point sets.
//! It builds a k-d tree over each set and walks both trees together, pruning and bulk-accepting
//! whole pairs of subtrees using incrementally maintained distance bounds.
//!
//! ## Features
//!
//! - **Dual-tree queries**: [`KdTree::query_ball_tree`] lists, for every point of one tree, all points of another within `r`.
//! - **Minkowski metrics**: any order `1 <= p <= inf`, with dedicated code paths for `p = 1`, `p = 2` and `p = inf`.
//! - **Periodic boxes**: distances can wrap around a toroidal domain, per dimension.
//! - **Approximate search**: an `eps` tolerance lets subtree pairs be pruned or accepted early.
//! - **Counting**: [`KdTree::count_neighbors`] and weighted counts without materializing lists.
//! - **Parallelism**: [`KdTree::query_ball_tree_par`] spreads the traversal over the rayon thread pool.
//!
//! ## Example
//!
//! ```
//! use kdball::{KdTree, QueryOptions, TreeConfig};
//!
//! let points = [0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 10.0, 10.0];
//! let tree = KdTree::build(&points, 2, &TreeConfig::new()).unwrap();
//! let neighbours = tree.query_ball_tree(&tree, &QueryOptions::new(1.5)).unwrap();
//! assert_eq!(neighbours[3], vec![3]);
//! ```
//!
//! ## Main Interface
//!
//! The primary entry point is the [`KdTree`] struct, built from a flat row-major
//! coordinate slice and a [`TreeConfig`].

mod bounds;
mod config;
mod error;
pub mod metric;
mod query;
mod tracker;
mod tree;

pub use bounds::BoundingBox;
pub use config::QueryOptions;
pub use config::Strategy;
pub use config::TreeConfig;
pub use error::KdTreeError;
pub use error::Result;
pub use tracker::Direction;
pub use tracker::RectRectDistanceTracker;
pub use tracker::TreeSide;
pub use tree::KdNode;
pub use tree::KdTree;
pub use tree::NodeKind;
pub use tree::NodeWeights;
pub use tree::ROOT;
