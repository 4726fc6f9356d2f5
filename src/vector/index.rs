//! Nearest-neighbour index implementations
//!
//! [`FlatIndex`] is the reference backend: brute-force inner product over a
//! contiguous row-major matrix. [`HnswIndex`] wraps hnsw_rs for approximate
//! search on larger populations. Callers only see the [`VectorIndex`] trait.

use hnsw_rs::prelude::*;
use ndarray::{ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Vector index errors
#[derive(Error, Debug)]
pub enum VectorError {
    #[error("Index error: {0}")]
    IndexError(String),

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Vector has zero or non-finite norm")]
    ZeroNorm,

    #[error("Cannot build an index from an empty batch")]
    EmptyBatch,
}

pub type VectorResult<T> = Result<T, VectorError>;

/// Append-only nearest-neighbour index over unit vectors.
///
/// Positions are assigned in insertion order starting at 0. `search` returns at
/// most `k` `(position, score)` pairs, score descending, ties by position.
pub trait VectorIndex: Send + Sync {
    /// Number of dimensions
    fn dimensions(&self) -> usize;

    /// Number of stored vectors
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a vector and return its position
    fn add(&mut self, vector: &[f32]) -> VectorResult<usize>;

    /// Top-k by inner product
    fn search(&self, query: &[f32], k: usize) -> VectorResult<Vec<(usize, f32)>>;
}

/// Index backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    /// Exact brute-force inner product
    #[default]
    Flat,
    /// Approximate HNSW graph
    Hnsw,
}

/// Build an index of the given kind over `vectors`.
///
/// All vectors must share the first vector's dimension.
pub fn build_index(kind: IndexKind, vectors: &[Vec<f32>]) -> VectorResult<Box<dyn VectorIndex>> {
    let first = vectors.first().ok_or(VectorError::EmptyBatch)?;

    let mut index: Box<dyn VectorIndex> = match kind {
        IndexKind::Flat => Box::new(FlatIndex::new(first.len())),
        IndexKind::Hnsw => Box::new(HnswIndex::new(first.len(), vectors.len())),
    };

    for vector in vectors {
        index.add(vector)?;
    }

    Ok(index)
}

fn rank(mut scored: Vec<(usize, f32)>, k: usize) -> Vec<(usize, f32)> {
    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    scored.truncate(k);
    scored
}

/// Exact inner-product index
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dimensions: usize,
    /// Row-major `len x dimensions` matrix
    data: Vec<f32>,
    len: usize,
}

impl FlatIndex {
    /// Create an empty index
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            data: Vec::new(),
            len: 0,
        }
    }

    /// Build an index over `vectors`; the first vector fixes the dimension
    pub fn build(vectors: &[Vec<f32>]) -> VectorResult<Self> {
        let first = vectors.first().ok_or(VectorError::EmptyBatch)?;
        let mut index = Self::new(first.len());
        index.data.reserve(vectors.len() * first.len());
        for vector in vectors {
            index.add(vector)?;
        }
        Ok(index)
    }
}

impl VectorIndex for FlatIndex {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn len(&self) -> usize {
        self.len
    }

    fn add(&mut self, vector: &[f32]) -> VectorResult<usize> {
        if vector.len() != self.dimensions {
            return Err(VectorError::DimensionMismatch {
                expected: self.dimensions,
                got: vector.len(),
            });
        }

        self.data.extend_from_slice(vector);
        self.len += 1;
        Ok(self.len - 1)
    }

    fn search(&self, query: &[f32], k: usize) -> VectorResult<Vec<(usize, f32)>> {
        if query.len() != self.dimensions {
            return Err(VectorError::DimensionMismatch {
                expected: self.dimensions,
                got: query.len(),
            });
        }
        if self.len == 0 || k == 0 {
            return Ok(Vec::new());
        }

        let matrix = ArrayView2::from_shape((self.len, self.dimensions), &self.data)
            .map_err(|e| VectorError::IndexError(e.to_string()))?;
        let scores = matrix.dot(&ArrayView1::from(query));

        Ok(rank(scores.iter().copied().enumerate().collect(), k))
    }
}

/// Inner Product distance implementation for hnsw_rs
#[derive(Clone, Copy, Debug, Default)]
pub struct InnerProductDistance;

impl Distance<f32> for InnerProductDistance {
    fn eval(&self, va: &[f32], vb: &[f32]) -> f32 {
        let mut dot = 0.0;
        for (a, b) in va.iter().zip(vb.iter()) {
            dot += a * b;
        }
        // Inner product distance = 1.0 - dot product (for normalized vectors)
        1.0 - dot
    }
}

/// Approximate index backed by HNSW
pub struct HnswIndex {
    dimensions: usize,
    len: usize,
    hnsw: Hnsw<'static, f32, InnerProductDistance>,
}

// Implement Debug manually because Hnsw doesn't implement it
impl std::fmt::Debug for HnswIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HnswIndex")
            .field("dimensions", &self.dimensions)
            .field("len", &self.len)
            .finish()
    }
}

impl HnswIndex {
    /// Create an empty index sized for `max_elements`
    pub fn new(dimensions: usize, max_elements: usize) -> Self {
        let m = 16;
        let ef_construction = 200;

        let hnsw = Hnsw::new(m, max_elements.max(1), 16, ef_construction, InnerProductDistance);

        Self {
            dimensions,
            len: 0,
            hnsw,
        }
    }
}

impl VectorIndex for HnswIndex {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn len(&self) -> usize {
        self.len
    }

    fn add(&mut self, vector: &[f32]) -> VectorResult<usize> {
        if vector.len() != self.dimensions {
            return Err(VectorError::DimensionMismatch {
                expected: self.dimensions,
                got: vector.len(),
            });
        }

        let owned = vector.to_vec();
        self.hnsw.insert((&owned, self.len));
        self.len += 1;
        Ok(self.len - 1)
    }

    fn search(&self, query: &[f32], k: usize) -> VectorResult<Vec<(usize, f32)>> {
        if query.len() != self.dimensions {
            return Err(VectorError::DimensionMismatch {
                expected: self.dimensions,
                got: query.len(),
            });
        }
        if self.len == 0 || k == 0 {
            return Ok(Vec::new());
        }

        let k = k.min(self.len);
        let ef_search = (k * 2).max(32);
        let neighbours = self.hnsw.search(query, k, ef_search);

        let scored = neighbours
            .into_iter()
            .map(|n| (n.d_id, 1.0 - n.distance))
            .collect();
        Ok(rank(scored, k))
    }
}
