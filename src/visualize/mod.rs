//! Visualization pipeline
//!
//! Profiles → content-only similarity graph → Louvain communities → anchored
//! layout → a [`Visualization`] artifact of nodes and edges that can be served
//! as JSON or rendered to a standalone HTML page.

pub mod html;

use crate::algo::{louvain_config, partition, partition_input, LouvainConfig, PartitionWeights};
use crate::config::CohortConfig;
use crate::embed::{EmbedError, VectorEncoder};
use crate::layout::{compute_layout, Layout, LayoutConfig};
use crate::profile::Profile;
use crate::similarity::{NeighborStrategy, SimilarityGraph};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::info;

pub use html::render_html;

/// Community colors, indexed by `community id % len`
pub const PALETTE: [&str; 10] = [
    "red", "blue", "green", "orange", "purple", "cyan", "magenta", "gold", "lime", "pink",
];

/// Label for profiles without a usable name
pub const UNNAMED_LABEL: &str = "unnamed";

/// Visualization errors
#[derive(Error, Debug)]
pub enum VisualizeError {
    #[error("Embedding failed: {0}")]
    Embed(#[from] EmbedError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type VisualizeResult<T> = Result<T, VisualizeError>;

/// Color for a community id
pub fn community_color(community: usize) -> &'static str {
    PALETTE[community % PALETTE.len()]
}

/// A drawn profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisNode {
    pub id: usize,
    pub label: String,
    /// Hover text: the profile as pretty JSON
    pub title: String,
    pub group: usize,
    pub color: String,
    pub x: f64,
    pub y: f64,
}

/// A drawn similarity edge, field names as vis-network expects them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisEdge {
    pub from: usize,
    pub to: usize,
    /// Normalized similarity, drives edge width
    pub value: f64,
    pub similarity: f32,
    pub length: f64,
    pub label: String,
    pub title: String,
}

/// Layout artifact
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Visualization {
    pub nodes: Vec<VisNode>,
    pub edges: Vec<VisEdge>,
    pub communities: usize,
    pub modularity: f64,
}

impl Visualization {
    pub fn to_json(&self) -> VisualizeResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Render to HTML and write it to `path`, creating parent directories
    pub fn write_html(&self, path: impl AsRef<Path>, heading: &str) -> VisualizeResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, render_html(self, heading)?)?;
        info!(path = %path.display(), nodes = self.nodes.len(), "Visualization written");
        Ok(())
    }
}

/// Pipeline settings
#[derive(Debug, Clone, Default)]
pub struct VisualizeOptions {
    pub strategy: NeighborStrategy,
    pub louvain: LouvainConfig,
    /// Edge weights the partitioner runs on
    pub weights: PartitionWeights,
    pub layout: LayoutConfig,
    /// Only lay out the first N profiles
    pub limit: Option<usize>,
}

impl VisualizeOptions {
    pub fn from_config(config: &CohortConfig) -> Self {
        Self {
            strategy: config.graph.strategy,
            louvain: louvain_config(&config.graph),
            weights: config.graph.weights,
            layout: config.layout.clone(),
            limit: config.visualize.limit,
        }
    }
}

/// Run the full pipeline over `profiles`
pub fn visualize<R: Rng + ?Sized>(
    profiles: &[Profile],
    encoder: &VectorEncoder,
    options: &VisualizeOptions,
    rng: &mut R,
) -> VisualizeResult<Visualization> {
    let profiles = match options.limit {
        Some(limit) => &profiles[..limit.min(profiles.len())],
        None => profiles,
    };
    if profiles.is_empty() {
        info!("No profiles to visualize");
        return Ok(Visualization::default());
    }

    let graph = SimilarityGraph::build(profiles, encoder, options.strategy)?;
    let input = partition_input(&graph, options.weights, &options.layout);
    let assignment = partition(&input, &options.louvain);
    let layout = compute_layout(&graph, assignment.as_slice(), &options.layout, rng);

    let mut visualization = assemble(profiles, assignment.as_slice(), &layout)?;
    visualization.modularity = assignment.modularity();

    info!(
        nodes = visualization.nodes.len(),
        edges = visualization.edges.len(),
        communities = visualization.communities,
        "Visualization ready"
    );
    Ok(visualization)
}

/// Combine profiles, communities and a layout into the drawable artifact
pub fn assemble(
    profiles: &[Profile],
    assignment: &[usize],
    layout: &Layout,
) -> VisualizeResult<Visualization> {
    let mut nodes = Vec::with_capacity(profiles.len());
    for (idx, ((profile, &group), point)) in profiles
        .iter()
        .zip(assignment)
        .zip(&layout.positions)
        .enumerate()
    {
        nodes.push(VisNode {
            id: idx,
            label: profile.name().unwrap_or(UNNAMED_LABEL).to_string(),
            title: serde_json::to_string_pretty(profile)?,
            group,
            color: community_color(group).to_string(),
            x: point.x,
            y: point.y,
        });
    }

    let edges = layout
        .edges
        .iter()
        .map(|e| VisEdge {
            from: e.source,
            to: e.target,
            value: e.weight,
            similarity: e.similarity,
            length: e.length,
            label: format!("{:.2}", e.weight),
            title: format!("Similarity: {:.2}, Length: {:.0}", e.weight, e.length),
        })
        .collect();

    let communities = assignment.iter().max().map_or(0, |m| m + 1);

    Ok(Visualization {
        nodes,
        edges,
        communities,
        modularity: 0.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{LayoutEdge, Point};

    #[test]
    fn test_palette_wraps() {
        assert_eq!(community_color(0), "red");
        assert_eq!(community_color(9), "pink");
        assert_eq!(community_color(10), "red");
    }

    #[test]
    fn test_assemble_labels_and_titles() {
        let profiles = vec![
            Profile::from_pairs([("name", "Ann"), ("city", "Boston")]),
            Profile::from_pairs([("city", "Denver")]),
        ];
        let layout = Layout {
            positions: vec![Point { x: 1.0, y: 2.0 }, Point { x: -1.0, y: 0.5 }],
            edges: vec![LayoutEdge {
                source: 0,
                target: 1,
                similarity: 0.8,
                weight: 0.5,
                length: 5050.0,
            }],
        };

        let vis = assemble(&profiles, &[0, 1], &layout).unwrap();
        assert_eq!(vis.communities, 2);
        assert_eq!(vis.nodes[0].label, "Ann");
        assert_eq!(vis.nodes[1].label, UNNAMED_LABEL);
        assert_eq!(vis.nodes[1].color, "blue");
        assert!(vis.nodes[0].title.contains("\"city\": \"Boston\""));
        assert_eq!(vis.edges[0].label, "0.50");
        assert_eq!(vis.edges[0].title, "Similarity: 0.50, Length: 5050");
    }

    #[test]
    fn test_artifact_json_shape() {
        let vis = Visualization {
            nodes: vec![],
            edges: vec![VisEdge {
                from: 0,
                to: 1,
                value: 1.0,
                similarity: 0.9,
                length: 100.0,
                label: "1.00".to_string(),
                title: String::new(),
            }],
            communities: 1,
            modularity: 0.0,
        };
        let json: serde_json::Value = serde_json::from_str(&vis.to_json().unwrap()).unwrap();
        assert_eq!(json["edges"][0]["from"], 0);
        assert_eq!(json["edges"][0]["to"], 1);
    }
}
