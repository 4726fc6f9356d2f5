//! Community-anchored layout
//!
//! Each community gets an anchor on a circle of radius `R`; members are
//! scattered around their anchor with bounded uniform jitter. Edges whose
//! normalized similarity reaches the threshold are kept, with a target length
//! that shrinks as similarity grows.
//!
//! Anchors, the edge set, weights and lengths are deterministic. Node
//! coordinates depend on the injected RNG and are reproducible only with a
//! fixed seed.

use crate::similarity::SimilarityGraph;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::f64::consts::PI;
use tracing::debug;

/// How raw cosine similarities are mapped into `[0, 1]` before squaring
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SimilarityNormalization {
    /// Min-max against a fixed raw range; values outside it saturate
    Fixed { min_raw: f64, max_raw: f64 },
    /// Min-max against the smallest and largest similarity in the graph
    BatchRange,
}

impl Default for SimilarityNormalization {
    fn default() -> Self {
        SimilarityNormalization::Fixed {
            min_raw: 0.71,
            max_raw: 0.86,
        }
    }
}

impl SimilarityNormalization {
    /// Raw range used for `graph`
    pub fn bounds(&self, graph: &SimilarityGraph) -> (f64, f64) {
        match *self {
            SimilarityNormalization::Fixed { min_raw, max_raw } => (min_raw, max_raw),
            SimilarityNormalization::BatchRange => {
                let mut finite = graph
                    .edges()
                    .iter()
                    .map(|e| e.similarity as f64)
                    .filter(|s| s.is_finite())
                    .peekable();
                if finite.peek().is_none() {
                    return (0.0, 1.0);
                }
                finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| {
                    (lo.min(s), hi.max(s))
                })
            }
        }
    }
}

/// Layout parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Anchor circle radius
    pub radius: f64,
    /// Maximum per-axis offset from the anchor
    pub jitter: f64,
    /// Edge length at normalized similarity 1
    pub min_length: f64,
    /// Edge length at normalized similarity 0
    pub max_length: f64,
    /// Edges below this normalized similarity are dropped (inclusive bound)
    pub threshold: f64,
    pub normalization: SimilarityNormalization,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            radius: 1500.0,
            jitter: 100.0,
            min_length: 100.0,
            max_length: 10000.0,
            threshold: 0.2,
            normalization: SimilarityNormalization::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// An edge kept for display
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutEdge {
    pub source: usize,
    pub target: usize,
    /// Raw cosine similarity
    pub similarity: f32,
    /// Normalized similarity in `[0, 1]`
    pub weight: f64,
    /// Target spring length
    pub length: f64,
}

/// Node positions plus the displayed edges
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub positions: Vec<Point>,
    pub edges: Vec<LayoutEdge>,
}

/// Anchor per distinct community id.
///
/// Ids are sorted ascending; the i-th of C anchors sits at angle `2*pi*i/C`.
pub fn anchors(assignment: &[usize], radius: f64) -> BTreeMap<usize, Point> {
    let ids: BTreeSet<usize> = assignment.iter().copied().collect();
    let count = ids.len() as f64;

    ids.into_iter()
        .enumerate()
        .map(|(i, id)| {
            let theta = 2.0 * PI * i as f64 / count;
            (
                id,
                Point {
                    x: radius * theta.cos(),
                    y: radius * theta.sin(),
                },
            )
        })
        .collect()
}

/// Anchor plus uniform jitter in `[-jitter, jitter]` on each axis
pub fn place_nodes<R: Rng + ?Sized>(
    assignment: &[usize],
    config: &LayoutConfig,
    rng: &mut R,
) -> Vec<Point> {
    let anchors = anchors(assignment, config.radius);
    let jitter = config.jitter.abs();

    assignment
        .iter()
        .map(|community| {
            let anchor = anchors[community];
            Point {
                x: anchor.x + rng.gen_range(-jitter..=jitter),
                y: anchor.y + rng.gen_range(-jitter..=jitter),
            }
        })
        .collect()
}

/// Rescale `raw` against `[min_raw, max_raw]`, clamp into `[0, 1]`, square.
///
/// A degenerate range maps everything at or above `max_raw` to 1 and the rest
/// to 0. Non-finite input maps to 0.
pub fn normalize_similarity(raw: f64, min_raw: f64, max_raw: f64) -> f64 {
    if !raw.is_finite() {
        return 0.0;
    }
    let span = max_raw - min_raw;
    let scaled = if span > 0.0 {
        (raw - min_raw) / span
    } else if raw >= max_raw {
        1.0
    } else {
        0.0
    };
    let clamped = scaled.clamp(0.0, 1.0);
    clamped * clamped
}

/// `max_length - (max_length - min_length) * norm`
pub fn edge_length(norm: f64, config: &LayoutConfig) -> f64 {
    config.max_length - (config.max_length - config.min_length) * norm
}

/// Edges whose normalized similarity is at least the threshold
pub fn emit_edges(graph: &SimilarityGraph, config: &LayoutConfig) -> Vec<LayoutEdge> {
    let (min_raw, max_raw) = config.normalization.bounds(graph);

    let edges: Vec<LayoutEdge> = graph
        .edges()
        .iter()
        .filter_map(|e| {
            let weight = normalize_similarity(e.similarity as f64, min_raw, max_raw);
            (weight >= config.threshold).then(|| LayoutEdge {
                source: e.source,
                target: e.target,
                similarity: e.similarity,
                weight,
                length: edge_length(weight, config),
            })
        })
        .collect();

    debug!(
        candidates = graph.edge_count(),
        kept = edges.len(),
        min_raw,
        max_raw,
        "Layout edges selected"
    );
    edges
}

/// Positions for every node plus the displayed edges
pub fn compute_layout<R: Rng + ?Sized>(
    graph: &SimilarityGraph,
    assignment: &[usize],
    config: &LayoutConfig,
    rng: &mut R,
) -> Layout {
    Layout {
        positions: place_nodes(assignment, config, rng),
        edges: emit_edges(graph, config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::SimilarityEdge;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_anchor_spacing() {
        let anchors = anchors(&[0, 1, 2, 3, 1, 0], 1500.0);
        assert_eq!(anchors.len(), 4);

        let angles: Vec<f64> = anchors.values().map(|p| p.y.atan2(p.x).rem_euclid(2.0 * PI)).collect();
        for (i, angle) in angles.iter().enumerate() {
            assert!(close(*angle, 2.0 * PI * i as f64 / 4.0), "anchor {} at {}", i, angle);
        }
        for p in anchors.values() {
            assert!(close((p.x * p.x + p.y * p.y).sqrt(), 1500.0));
        }
    }

    #[test]
    fn test_anchors_follow_sorted_ids() {
        let anchors = anchors(&[7, 2, 7], 10.0);
        assert!(close(anchors[&2].x, 10.0));
        assert!(close(anchors[&7].x, -10.0));
    }

    #[test]
    fn test_single_community_anchor() {
        let anchors = anchors(&[0, 0, 0], 1500.0);
        assert!(close(anchors[&0].x, 1500.0));
        assert!(close(anchors[&0].y, 0.0));
    }

    #[test]
    fn test_jitter_is_bounded() {
        let assignment: Vec<usize> = (0..200).map(|i| i % 3).collect();
        let config = LayoutConfig::default();
        let mut rng = StdRng::seed_from_u64(7);

        let positions = place_nodes(&assignment, &config, &mut rng);
        let anchors = anchors(&assignment, config.radius);
        for (p, c) in positions.iter().zip(&assignment) {
            assert!((p.x - anchors[c].x).abs() <= 100.0);
            assert!((p.y - anchors[c].y).abs() <= 100.0);
        }
    }

    #[test]
    fn test_seeded_layout_is_reproducible() {
        let assignment = vec![0, 1, 1, 0];
        let config = LayoutConfig::default();
        let a = place_nodes(&assignment, &config, &mut StdRng::seed_from_u64(42));
        let b = place_nodes(&assignment, &config, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_jitter_sits_on_anchor() {
        let config = LayoutConfig {
            jitter: 0.0,
            ..Default::default()
        };
        let positions = place_nodes(&[0, 1], &config, &mut StdRng::seed_from_u64(1));
        assert!(close(positions[0].x, 1500.0));
        assert!(close(positions[1].x, -1500.0));
    }

    #[test]
    fn test_normalize_similarity() {
        assert!(close(normalize_similarity(0.71, 0.71, 0.86), 0.0));
        assert!(close(normalize_similarity(0.86, 0.71, 0.86), 1.0));
        assert!((normalize_similarity(0.785, 0.71, 0.86) - 0.25).abs() < 1e-9);
        // saturates outside the range
        assert_eq!(normalize_similarity(0.2, 0.71, 0.86), 0.0);
        assert_eq!(normalize_similarity(0.99, 0.71, 0.86), 1.0);
        assert_eq!(normalize_similarity(f64::NAN, 0.71, 0.86), 0.0);
        assert_eq!(normalize_similarity(0.5, 0.5, 0.5), 1.0);
    }

    #[test]
    fn test_edge_length() {
        let config = LayoutConfig::default();
        assert!(close(edge_length(1.0, &config), 100.0));
        assert!(close(edge_length(0.0, &config), 10000.0));
        assert!(close(edge_length(0.5, &config), 5050.0));
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let graph = SimilarityGraph::from_edges(
            3,
            vec![
                SimilarityEdge { source: 0, target: 1, similarity: 0.5 },
                SimilarityEdge { source: 1, target: 2, similarity: 0.49 },
            ],
        );
        let config = LayoutConfig {
            threshold: 0.25,
            normalization: SimilarityNormalization::Fixed { min_raw: 0.0, max_raw: 1.0 },
            ..Default::default()
        };

        let edges = emit_edges(&graph, &config);
        assert_eq!(edges.len(), 1);
        assert_eq!((edges[0].source, edges[0].target), (0, 1));
        assert_eq!(edges[0].weight, 0.25);
    }

    #[test]
    fn test_batch_range_bounds() {
        let graph = SimilarityGraph::from_edges(
            3,
            vec![
                SimilarityEdge { source: 0, target: 1, similarity: 0.25 },
                SimilarityEdge { source: 1, target: 2, similarity: 0.75 },
            ],
        );
        let config = LayoutConfig {
            normalization: SimilarityNormalization::BatchRange,
            ..Default::default()
        };
        assert_eq!(config.normalization.bounds(&graph), (0.25, 0.75));

        let edges = emit_edges(&graph, &config);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].weight, 1.0);
        assert!(close(edges[0].length, 100.0));
    }
}
