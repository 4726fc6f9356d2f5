//! Community partitioning
//!
//! Adapter between [`SimilarityGraph`] and the Louvain implementation in
//! `cohort-graph-algorithms`.
//!
//! On a complete graph every pair carries a positive cosine, and modularity
//! then tends to merge weakly related profiles into one community. By default
//! the partitioner therefore sees the same normalized, thresholded edges the
//! layout draws; [`PartitionWeights::Raw`] partitions the raw graph instead.

use crate::config::GraphConfig;
use crate::layout::{emit_edges, LayoutConfig};
use crate::similarity::{SimilarityEdge, SimilarityGraph};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use tracing::info;

// Re-export algorithms
pub use cohort_graph_algorithms::{louvain, modularity, GraphView, LouvainConfig, LouvainResult};

/// Community id per profile position.
///
/// Ids are dense (`0..community_count`) and numbered in order of first
/// appearance by position, so position 0 is always in community 0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommunityAssignment {
    communities: Vec<usize>,
    modularity: f64,
}

impl CommunityAssignment {
    pub fn community_of(&self, node: usize) -> Option<usize> {
        self.communities.get(node).copied()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.communities
    }

    pub fn len(&self) -> usize {
        self.communities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.communities.is_empty()
    }

    pub fn community_count(&self) -> usize {
        self.communities.iter().max().map_or(0, |m| m + 1)
    }

    /// Positions in community `id`, ascending
    pub fn members(&self, id: usize) -> Vec<usize> {
        self.communities
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c == id)
            .map(|(i, _)| i)
            .collect()
    }

    /// Modularity of the partition on its input graph
    pub fn modularity(&self) -> f64 {
        self.modularity
    }
}

/// Edge weights the partitioner runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionWeights {
    /// Raw cosine similarity on every edge of the similarity graph
    Raw,
    /// Normalized similarity of the edges that pass the layout threshold
    #[default]
    Normalized,
}

/// The graph handed to the partitioner under `weights`
pub fn partition_input<'a>(
    graph: &'a SimilarityGraph,
    weights: PartitionWeights,
    layout: &LayoutConfig,
) -> Cow<'a, SimilarityGraph> {
    match weights {
        PartitionWeights::Raw => Cow::Borrowed(graph),
        PartitionWeights::Normalized => {
            let edges = emit_edges(graph, layout).into_iter().map(|e| SimilarityEdge {
                source: e.source,
                target: e.target,
                similarity: e.weight as f32,
            });
            Cow::Owned(SimilarityGraph::from_edges(graph.size(), edges))
        }
    }
}

/// Louvain settings derived from the graph configuration
pub fn louvain_config(config: &GraphConfig) -> LouvainConfig {
    LouvainConfig {
        resolution: config.resolution,
        ..Default::default()
    }
}

/// Partition the similarity graph into communities
pub fn partition(graph: &SimilarityGraph, config: &LouvainConfig) -> CommunityAssignment {
    let view = graph.to_view();
    let result = louvain(&view, config);

    info!(
        nodes = graph.size(),
        communities = result.community_count(),
        modularity = result.modularity,
        "Communities detected"
    );

    CommunityAssignment {
        communities: result.assignment,
        modularity: result.modularity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::NeighborStrategy;

    /// A-B nearly identical; C moderately similar to both, below the layout range
    fn loose_triangle() -> SimilarityGraph {
        SimilarityGraph::from_edges(
            3,
            [
                SimilarityEdge { source: 0, target: 1, similarity: 1.0 },
                SimilarityEdge { source: 0, target: 2, similarity: 0.62 },
                SimilarityEdge { source: 1, target: 2, similarity: 0.62 },
            ],
        )
    }

    fn two_groups() -> SimilarityGraph {
        let embeddings = vec![
            vec![1.0, 0.0],
            vec![0.98, 0.05],
            vec![0.95, 0.1],
            vec![0.0, 1.0],
            vec![0.05, 0.98],
            vec![0.1, 0.95],
        ];
        SimilarityGraph::from_embeddings(&embeddings, NeighborStrategy::Complete).unwrap()
    }

    #[test]
    fn test_partition_two_groups() {
        let assignment = partition(&two_groups(), &LouvainConfig::default());
        assert_eq!(assignment.as_slice(), &[0, 0, 0, 1, 1, 1]);
        assert_eq!(assignment.community_count(), 2);
        assert_eq!(assignment.members(1), vec![3, 4, 5]);
        assert!(assignment.modularity() > 0.0);
    }

    #[test]
    fn test_partition_is_stable() {
        let graph = two_groups();
        let first = partition(&graph, &LouvainConfig::default());
        let second = partition(&graph, &LouvainConfig::default());
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_graph() {
        let assignment = partition(&SimilarityGraph::default(), &LouvainConfig::default());
        assert!(assignment.is_empty());
        assert_eq!(assignment.community_count(), 0);
        assert_eq!(assignment.community_of(0), None);
    }

    #[test]
    fn test_resolution_from_config() {
        let config = GraphConfig {
            resolution: 0.5,
            ..Default::default()
        };
        assert_eq!(louvain_config(&config).resolution, 0.5);
    }

    #[test]
    fn test_raw_weights_merge_loose_triangle() {
        let graph = loose_triangle();
        let input = partition_input(&graph, PartitionWeights::Raw, &LayoutConfig::default());
        let assignment = partition(&input, &LouvainConfig::default());
        assert_eq!(assignment.as_slice(), &[0, 0, 0]);
    }

    #[test]
    fn test_normalized_weights_split_loose_triangle() {
        let graph = loose_triangle();
        let input = partition_input(&graph, PartitionWeights::Normalized, &LayoutConfig::default());
        assert_eq!(input.edge_count(), 1);
        assert_eq!(input.similarity(0, 1), Some(1.0));

        let assignment = partition(&input, &LouvainConfig::default());
        assert_eq!(assignment.as_slice(), &[0, 0, 1]);
        assert_eq!(assignment.community_count(), 2);
    }

    #[test]
    fn test_default_weights_are_normalized() {
        assert_eq!(GraphConfig::default().weights, PartitionWeights::Normalized);
    }
}
