//! Pairwise similarity graph
//!
//! Builds the undirected, weighted graph the community partitioner runs on.
//! Every profile is embedded once from its content-only descriptor; edge
//! weights are the cosine similarity of those embeddings.
//!
//! The [`NeighborStrategy::Complete`] strategy computes all `n(n-1)/2` pairs.
//! That is quadratic in both time and edge count and is meant for working sets
//! of up to a few hundred profiles. For larger sets
//! [`NeighborStrategy::Nearest`] keeps only each profile's `k` nearest
//! neighbours, found through the similarity index.

use crate::embed::{EmbedResult, VectorEncoder};
use crate::profile::{DescriptorMode, Profile};
use crate::vector::{
    build_index, cosine_similarity, normalize_or_zero, IndexKind, VectorError, VectorResult,
};
use cohort_graph_algorithms::GraphView;
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Which profile pairs become edges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NeighborStrategy {
    /// Every pair (quadratic)
    #[default]
    Complete,
    /// Each node's `k` most similar peers, symmetrized
    Nearest { k: usize },
}

/// Undirected edge with `source < target`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityEdge {
    pub source: usize,
    pub target: usize,
    pub similarity: f32,
}

/// Similarity graph over profile positions `0..size`.
///
/// Edges are sorted by `(source, target)`.
#[derive(Debug, Clone, Default)]
pub struct SimilarityGraph {
    size: usize,
    edges: Vec<SimilarityEdge>,
}

impl SimilarityGraph {
    /// Embed `profiles` (content-only) and build their similarity graph
    pub fn build(
        profiles: &[Profile],
        encoder: &VectorEncoder,
        strategy: NeighborStrategy,
    ) -> EmbedResult<Self> {
        if profiles.is_empty() {
            return Ok(Self::default());
        }

        let descriptors: Vec<String> = profiles
            .iter()
            .map(|p| p.descriptor(DescriptorMode::ContentOnly))
            .collect();
        let embeddings = encoder.encode_batch(&descriptors)?;

        Ok(Self::from_embeddings(&embeddings, strategy)?)
    }

    /// Build the graph from precomputed embeddings
    pub fn from_embeddings(
        embeddings: &[Vec<f32>],
        strategy: NeighborStrategy,
    ) -> VectorResult<Self> {
        let size = embeddings.len();
        if let Some(first) = embeddings.first() {
            if let Some(bad) = embeddings.iter().find(|e| e.len() != first.len()) {
                return Err(VectorError::DimensionMismatch {
                    expected: first.len(),
                    got: bad.len(),
                });
            }
        }

        let edges = match strategy {
            NeighborStrategy::Complete => complete_edges(embeddings),
            NeighborStrategy::Nearest { k } => nearest_edges(embeddings, k)?,
        };

        info!(nodes = size, edges = edges.len(), ?strategy, "Similarity graph built");
        Ok(Self { size, edges })
    }

    /// Graph over `size` nodes with explicit edges.
    ///
    /// Endpoints are reordered so that `source < target`; self-loops,
    /// out-of-range endpoints and repeated pairs (first one wins) are dropped.
    pub fn from_edges(size: usize, edges: impl IntoIterator<Item = SimilarityEdge>) -> Self {
        let mut edges: Vec<SimilarityEdge> = edges
            .into_iter()
            .filter(|e| e.source != e.target && e.source < size && e.target < size)
            .map(|e| SimilarityEdge {
                source: e.source.min(e.target),
                target: e.source.max(e.target),
                similarity: e.similarity,
            })
            .collect();
        edges.sort_by_key(|e| (e.source, e.target));
        edges.dedup_by_key(|e| (e.source, e.target));
        Self { size, edges }
    }

    /// Number of nodes
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn edges(&self) -> &[SimilarityEdge] {
        &self.edges
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Similarity between two nodes, if they share an edge
    pub fn similarity(&self, a: usize, b: usize) -> Option<f32> {
        let key = (a.min(b), a.max(b));
        self.edges
            .binary_search_by(|e| (e.source, e.target).cmp(&key))
            .ok()
            .map(|i| self.edges[i].similarity)
    }

    /// CSR view for the graph algorithms, node `i` has NodeId `i`
    pub fn to_view(&self) -> GraphView {
        GraphView::with_nodes(
            self.size,
            self.edges
                .iter()
                .map(|e| (e.source, e.target, e.similarity as f64)),
        )
    }
}

fn complete_edges(embeddings: &[Vec<f32>]) -> Vec<SimilarityEdge> {
    let n = embeddings.len();

    // rows are computed in parallel and concatenated in row order
    let rows: Vec<Vec<SimilarityEdge>> = (0..n)
        .into_par_iter()
        .map(|i| {
            ((i + 1)..n)
                .map(|j| SimilarityEdge {
                    source: i,
                    target: j,
                    similarity: cosine_similarity(&embeddings[i], &embeddings[j]),
                })
                .collect()
        })
        .collect();

    rows.into_iter().flatten().collect()
}

fn nearest_edges(embeddings: &[Vec<f32>], k: usize) -> VectorResult<Vec<SimilarityEdge>> {
    if embeddings.len() < 2 || k == 0 {
        return Ok(Vec::new());
    }

    let unit: Vec<Vec<f32>> = embeddings.iter().map(|e| normalize_or_zero(e)).collect();
    let index = build_index(IndexKind::Flat, &unit)?;

    let neighbours: Vec<Vec<usize>> = (0..unit.len())
        .into_par_iter()
        .map(|i| {
            // one extra slot because a node finds itself
            index.search(&unit[i], k + 1).map(|hits| {
                hits.into_iter()
                    .map(|(pos, _)| pos)
                    .filter(|&pos| pos != i)
                    .take(k)
                    .collect()
            })
        })
        .collect::<VectorResult<_>>()?;

    let mut pairs = FxHashSet::default();
    for (i, row) in neighbours.iter().enumerate() {
        for &j in row {
            pairs.insert((i.min(j), i.max(j)));
        }
    }

    let mut pairs: Vec<(usize, usize)> = pairs.into_iter().collect();
    pairs.sort_unstable();
    debug!(k, pairs = pairs.len(), "Nearest-neighbour pairs collected");

    Ok(pairs
        .into_iter()
        .map(|(source, target)| SimilarityEdge {
            source,
            target,
            similarity: cosine_similarity(&embeddings[source], &embeddings[target]),
        })
        .collect())
}
