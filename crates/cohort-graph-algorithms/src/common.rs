//! Shared utilities for graph algorithms
//!
//! Provides a read-only, weighted view of an undirected graph for algorithm execution.

use std::collections::HashMap;

/// Node Identifier type (u64)
pub type NodeId = u64;

/// A dense, integer-indexed view of an undirected weighted graph in Compressed Sparse Row (CSR) format.
///
/// Every undirected edge `{u, v}` with `u != v` is stored twice, once in each
/// endpoint's row. A self-loop is stored once.
#[derive(Debug, Clone)]
pub struct GraphView {
    /// Number of nodes
    pub node_count: usize,
    /// Mapping from dense index (0..N) back to NodeId
    pub index_to_node: Vec<NodeId>,
    /// Mapping from NodeId to dense index
    pub node_to_index: HashMap<NodeId, usize>,

    /// Offsets into `targets`. Size = node_count + 1
    pub offsets: Vec<usize>,
    /// Contiguous array of neighbor indices
    pub targets: Vec<usize>,
    /// Edge weights, aligned with `targets`
    pub weights: Vec<f64>,
}

impl GraphView {
    /// Build a view over dense indices `0..node_count` where index `i` maps to NodeId `i`.
    pub fn with_nodes(node_count: usize, edges: impl IntoIterator<Item = (usize, usize, f64)>) -> Self {
        let index_to_node = (0..node_count as NodeId).collect();
        Self::from_weighted_edges(index_to_node, edges)
    }

    /// Build a symmetric CSR view from an undirected edge list over dense indices.
    ///
    /// Edges referencing an index outside `0..index_to_node.len()` are ignored.
    pub fn from_weighted_edges(
        index_to_node: Vec<NodeId>,
        edges: impl IntoIterator<Item = (usize, usize, f64)>,
    ) -> Self {
        let node_count = index_to_node.len();
        let node_to_index = index_to_node
            .iter()
            .enumerate()
            .map(|(idx, &id)| (id, idx))
            .collect();

        let mut adjacency: Vec<Vec<(usize, f64)>> = vec![Vec::new(); node_count];
        for (u, v, w) in edges {
            if u >= node_count || v >= node_count {
                continue;
            }
            adjacency[u].push((v, w));
            if u != v {
                adjacency[v].push((u, w));
            }
        }

        let mut offsets = Vec::with_capacity(node_count + 1);
        let mut targets = Vec::new();
        let mut weights = Vec::new();

        offsets.push(0);
        for row in adjacency {
            for (v, w) in row {
                targets.push(v);
                weights.push(w);
            }
            offsets.push(targets.len());
        }

        GraphView {
            node_count,
            index_to_node,
            node_to_index,
            offsets,
            targets,
            weights,
        }
    }

    /// Number of adjacency entries of a node (by index)
    pub fn degree(&self, idx: usize) -> usize {
        self.offsets[idx + 1] - self.offsets[idx]
    }

    /// Get neighbors of a node
    pub fn neighbors(&self, idx: usize) -> &[usize] {
        &self.targets[self.offsets[idx]..self.offsets[idx + 1]]
    }

    /// Get weights aligned with `neighbors(idx)`
    pub fn weights(&self, idx: usize) -> &[f64] {
        &self.weights[self.offsets[idx]..self.offsets[idx + 1]]
    }

    /// Iterate `(neighbor, weight)` pairs of a node
    pub fn weighted_neighbors(&self, idx: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.neighbors(idx)
            .iter()
            .copied()
            .zip(self.weights(idx).iter().copied())
    }

    /// Number of undirected edges (self-loops count once)
    pub fn edge_count(&self) -> usize {
        let loops = (0..self.node_count)
            .map(|u| self.neighbors(u).iter().filter(|&&v| v == u).count())
            .sum::<usize>();
        (self.targets.len() - loops) / 2 + loops
    }
}
