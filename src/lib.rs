//! Cohort
//!
//! Semantic search and community layout over a set of person profiles.
//!
//! # Pipeline
//!
//! ```text
//! Profile ──describe──▶ descriptor ──encode──▶ unit vector
//!                                                  │
//!                     ┌────────────────────────────┴───────────────┐
//!                     ▼                                            ▼
//!          similarity index (full profile)          similarity graph (content only)
//!                     │                                            │
//!                     ▼                                            ▼
//!               query service                          Louvain communities
//!                                                                  │
//!                                                                  ▼
//!                                                       anchored layout + edges
//! ```
//!
//! - [`profile`]: typed profile records, ingestion and descriptor strings
//! - [`embed`]: the [`VectorEncoder`] and its embedding backends
//! - [`vector`]: normalization and nearest-neighbour indexes
//! - [`similarity`]: the pairwise similarity graph
//! - [`algo`]: community partitioning
//! - [`layout`]: anchor placement and edge selection
//! - [`search`]: the query service
//! - [`visualize`]: the end-to-end layout pipeline and HTML rendering
//! - [`summary`]: LLM-written profile descriptions
//! - [`http`]: the search API
//!
//! The core is synchronous; only [`http`] runs on tokio.

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod config;
pub mod embed;
pub mod http;
pub mod layout;
pub mod profile;
pub mod search;
pub mod similarity;
pub mod summary;
pub mod vector;
pub mod visualize;

// Re-export main types for convenience
pub use algo::{partition, CommunityAssignment, LouvainConfig, PartitionWeights};
pub use config::{CohortConfig, ConfigError, ConfigResult, Provider};
pub use embed::{EmbedError, EmbedResult, EmbeddingBackend, VectorEncoder};
pub use layout::{Layout, LayoutConfig, SimilarityNormalization};
pub use profile::{
    describe, load_profiles, parse_profiles, DescriptorMode, Profile, ProfileError, ProfileResult,
    ProfileValue,
};
pub use search::{Match, ProfileIndex, QueryService, SearchError, SearchResult};
pub use similarity::{NeighborStrategy, SimilarityGraph};
pub use summary::{DescriptionGenerator, SummaryError, SummaryResult, TextGenerator};
pub use vector::{IndexKind, VectorError, VectorIndex, VectorResult};
pub use visualize::{visualize, Visualization, VisualizeError, VisualizeOptions, VisualizeResult};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(version(), "0.3.0");
    }
}
