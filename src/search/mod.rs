//! Semantic profile search
//!
//! Profiles are indexed by their **full** descriptor, identity included, so a
//! query can name a person directly. This is deliberately different from the
//! content-only embeddings used for clustering.

use crate::embed::{EmbedError, VectorEncoder};
use crate::profile::{DescriptorMode, Profile};
use crate::vector::{build_index, IndexKind, VectorError, VectorIndex};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Search errors
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Query is empty")]
    EmptyQuery,

    #[error("Query has no searchable content")]
    UninformativeQuery,

    #[error("Embedding failed: {0}")]
    Embed(#[from] EmbedError),

    #[error("Index error: {0}")]
    Vector(#[from] VectorError),
}

impl SearchError {
    /// The embedding service could not be reached or answered badly
    pub fn is_service_unavailable(&self) -> bool {
        matches!(self, SearchError::Embed(e) if e.is_unavailable())
    }

    /// The query itself is unusable; retrying the same text cannot succeed
    pub fn is_invalid_query(&self) -> bool {
        matches!(self, SearchError::EmptyQuery | SearchError::UninformativeQuery)
    }
}

pub type SearchResult<T> = Result<T, SearchError>;

/// A search hit; serializes as `[identity, score]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match(pub String, pub f32);

impl Match {
    pub fn identity(&self) -> &str {
        &self.0
    }

    pub fn score(&self) -> f32 {
        self.1
    }
}

/// Prebuilt, read-only index over a profile set
pub struct ProfileIndex {
    identities: Vec<String>,
    index: Option<Box<dyn VectorIndex>>,
}

impl fmt::Debug for ProfileIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProfileIndex")
            .field("len", &self.identities.len())
            .finish()
    }
}

impl ProfileIndex {
    pub fn empty() -> Self {
        Self {
            identities: Vec::new(),
            index: None,
        }
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    /// Indexed identities in position order
    pub fn identities(&self) -> &[String] {
        &self.identities
    }
}

/// Embeds queries and matches them against profile indexes
#[derive(Debug, Clone)]
pub struct QueryService {
    encoder: VectorEncoder,
    kind: IndexKind,
}

impl QueryService {
    pub fn new(encoder: VectorEncoder) -> Self {
        Self {
            encoder,
            kind: IndexKind::Flat,
        }
    }

    pub fn with_index_kind(mut self, kind: IndexKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn encoder(&self) -> &VectorEncoder {
        &self.encoder
    }

    /// Embed every named profile's full descriptor and index it
    pub fn index_profiles(&self, profiles: &[Profile]) -> SearchResult<ProfileIndex> {
        let mut identities = Vec::with_capacity(profiles.len());
        let mut descriptors = Vec::with_capacity(profiles.len());

        for (position, profile) in profiles.iter().enumerate() {
            match profile.name() {
                Some(name) => {
                    identities.push(name.to_string());
                    descriptors.push(profile.descriptor(DescriptorMode::FullProfile));
                }
                None => warn!(position, "Skipping unnamed profile in search index"),
            }
        }

        if descriptors.is_empty() {
            return Ok(ProfileIndex::empty());
        }

        let vectors = self.encoder.encode_batch(&descriptors)?;
        let index = build_index(self.kind, &vectors)?;

        info!(profiles = identities.len(), kind = ?self.kind, "Search index built");
        Ok(ProfileIndex {
            identities,
            index: Some(index),
        })
    }

    /// Top-k matches for `query` in a prebuilt index
    pub fn search_index(
        &self,
        index: &ProfileIndex,
        query: &str,
        top_k: usize,
    ) -> SearchResult<Vec<Match>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        let Some(vectors) = index.index.as_ref() else {
            return Ok(Vec::new());
        };

        // a query with no features embeds to the zero vector
        let embedded = match self.encoder.encode(query) {
            Ok(vector) => vector,
            Err(EmbedError::Vector(VectorError::ZeroNorm)) => {
                return Err(SearchError::UninformativeQuery)
            }
            Err(e) => return Err(e.into()),
        };
        let hits = vectors.search(&embedded, top_k)?;

        debug!(query, hits = hits.len(), "Search complete");
        Ok(hits
            .into_iter()
            .filter_map(|(position, score)| {
                index
                    .identities
                    .get(position)
                    .map(|identity| Match(identity.clone(), score))
            })
            .collect())
    }

    /// Index `profiles` and search them in one go
    pub fn search(&self, query: &str, profiles: &[Profile], top_k: usize) -> SearchResult<Vec<Match>> {
        let index = self.index_profiles(profiles)?;
        self.search_index(&index, query, top_k)
    }
}
