use super::{KdTree, NodeKind, ROOT};
use crate::error::{KdTreeError, Result};

/// Total point weight under every node, indexed like [`KdTree::nodes`].
#[derive(Clone, Debug, PartialEq)]
pub struct NodeWeights {
    weights: Vec<f64>,
}

impl NodeWeights {
    pub fn get(&self, node: usize) -> f64 {
        self.weights[node]
    }

    /// Weight of the whole tree.
    pub fn root(&self) -> f64 {
        self.weights[ROOT]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.weights
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

impl KdTree<'_> {
    /// Sums `weights` (one per point, by original index) under every node.
    ///
    /// The tree is not modified; the table can be rebuilt at any time.
    pub fn build_weights(&self, weights: &[f64]) -> Result<NodeWeights> {
        if weights.len() != self.len() {
            return Err(KdTreeError::WeightLength {
                expected: self.len(),
                got: weights.len(),
            });
        }
        let mut table = vec![0.0; self.nodes().len()];
        self.add_weights(&mut table, ROOT, weights);
        Ok(NodeWeights { weights: table })
    }

    fn add_weights(&self, table: &mut [f64], node_index: usize, weights: &[f64]) -> f64 {
        let node = self.node(node_index);
        let sum = match node.kind {
            NodeKind::Inner { less, greater, .. } => {
                self.add_weights(table, less, weights) + self.add_weights(table, greater, weights)
            }
            NodeKind::Leaf => self.indices()[node.start_idx..node.end_idx]
                .iter()
                .map(|&idx| weights[idx])
                .sum::<f64>(),
        };
        table[node_index] = sum;
        sum
    }
}
