//! Vector encoding
//!
//! A [`VectorEncoder`] turns descriptor strings into fixed-dimension unit
//! vectors. The actual model sits behind the [`EmbeddingBackend`] trait: the
//! local [`hashing::HashingBackend`] for offline use, or an
//! [`client::EmbeddingClient`] talking to a hosted model.

pub mod client;
pub mod hashing;

use crate::config::{EmbeddingConfig, Provider};
use crate::vector::{self, VectorError};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Embed errors
#[derive(Error, Debug)]
pub enum EmbedError {
    /// API error from the model provider
    #[error("LLM API error: {0}")]
    ApiError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Network error
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Serialization/Deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Backend returned {got} embeddings for {expected} inputs")]
    CountMismatch { expected: usize, got: usize },

    #[error(transparent)]
    Vector(#[from] VectorError),
}

impl EmbedError {
    /// True when the model itself could not be reached or answered badly
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            EmbedError::ApiError(_) | EmbedError::NetworkError(_) | EmbedError::SerializationError(_)
        )
    }
}

pub type EmbedResult<T> = Result<T, EmbedError>;

/// A text embedding model.
///
/// Implementations return one raw (not necessarily normalized) vector per
/// input, in input order.
pub trait EmbeddingBackend: Send + Sync {
    /// Model identifier used in logs
    fn model_name(&self) -> &str;

    fn embed(&self, texts: &[String]) -> EmbedResult<Vec<Vec<f32>>>;
}

/// Fixed-dimension text encoder producing unit vectors
#[derive(Clone)]
pub struct VectorEncoder {
    backend: Arc<dyn EmbeddingBackend>,
    dimensions: usize,
    batch_size: usize,
    normalize: bool,
}

impl fmt::Debug for VectorEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VectorEncoder")
            .field("model", &self.backend.model_name())
            .field("dimensions", &self.dimensions)
            .field("batch_size", &self.batch_size)
            .field("normalize", &self.normalize)
            .finish()
    }
}

impl VectorEncoder {
    pub fn new(backend: Arc<dyn EmbeddingBackend>, dimensions: usize) -> Self {
        Self {
            backend,
            dimensions,
            batch_size: 64,
            normalize: true,
        }
    }

    /// Build the encoder described by `config`
    pub fn from_config(config: &EmbeddingConfig) -> EmbedResult<Self> {
        if config.dimensions == 0 {
            return Err(EmbedError::ConfigError("dimensions must be positive".to_string()));
        }

        let backend: Arc<dyn EmbeddingBackend> = match config.provider {
            Provider::Hashing => Arc::new(hashing::HashingBackend::new(config.dimensions)),
            _ => Arc::new(client::EmbeddingClient::new(config)?),
        };

        debug!(model = backend.model_name(), dimensions = config.dimensions, "Vector encoder ready");
        Ok(Self::new(backend, config.dimensions).with_batch_size(config.batch_size))
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Disable normalization (raw backend output)
    pub fn with_normalization(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn model_name(&self) -> &str {
        self.backend.model_name()
    }

    /// Encode a single text, e.g. a search query.
    ///
    /// A text whose embedding has zero norm cannot be compared with anything,
    /// so this fails with [`VectorError::ZeroNorm`] instead of guessing.
    pub fn encode(&self, text: &str) -> EmbedResult<Vec<f32>> {
        let raw = self.encode_raw(std::slice::from_ref(&text.to_string()))?;
        let vector = raw.into_iter().next().ok_or(EmbedError::CountMismatch {
            expected: 1,
            got: 0,
        })?;

        if self.normalize {
            Ok(vector::normalize(&vector)?)
        } else {
            Ok(vector)
        }
    }

    /// Encode a batch, one vector per text in input order.
    ///
    /// Zero-norm embeddings become the zero vector so that one empty record
    /// does not abort a whole batch; its similarity to everything is 0.
    pub fn encode_batch(&self, texts: &[String]) -> EmbedResult<Vec<Vec<f32>>> {
        let raw = self.encode_raw(texts)?;
        if !self.normalize {
            return Ok(raw);
        }

        let mut zero = 0usize;
        let vectors = raw
            .iter()
            .map(|v| {
                vector::normalize(v).unwrap_or_else(|_| {
                    zero += 1;
                    vec![0.0; v.len()]
                })
            })
            .collect();

        if zero > 0 {
            warn!(count = zero, "Embeddings with zero norm replaced by the zero vector");
        }
        Ok(vectors)
    }

    fn encode_raw(&self, texts: &[String]) -> EmbedResult<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());

        for chunk in texts.chunks(self.batch_size) {
            let vectors = self.backend.embed(chunk)?;
            if vectors.len() != chunk.len() {
                return Err(EmbedError::CountMismatch {
                    expected: chunk.len(),
                    got: vectors.len(),
                });
            }
            for v in vectors {
                if v.len() != self.dimensions {
                    return Err(EmbedError::DimensionMismatch {
                        expected: self.dimensions,
                        got: v.len(),
                    });
                }
                out.push(v);
            }
        }

        debug!(texts = texts.len(), model = self.backend.model_name(), "Encoded batch");
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Maps each text to a fixed vector by its first character
    struct LetterBackend {
        calls: AtomicUsize,
    }

    impl EmbeddingBackend for LetterBackend {
        fn model_name(&self) -> &str {
            "letters"
        }

        fn embed(&self, texts: &[String]) -> EmbedResult<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts
                .iter()
                .map(|t| match t.chars().next() {
                    Some('a') => vec![3.0, 4.0, 0.0],
                    Some('b') => vec![0.0, 0.0, 2.0],
                    _ => vec![0.0, 0.0, 0.0],
                })
                .collect())
        }
    }

    fn encoder() -> (Arc<LetterBackend>, VectorEncoder) {
        let backend = Arc::new(LetterBackend {
            calls: AtomicUsize::new(0),
        });
        let encoder = VectorEncoder::new(backend.clone(), 3);
        (backend, encoder)
    }

    #[test]
    fn test_encode_normalizes() {
        let (_, encoder) = encoder();
        let v = encoder.encode("abc").unwrap();
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
        assert!((vector::l2_norm(&v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_encode_zero_norm_fails() {
        let (_, encoder) = encoder();
        let err = encoder.encode("zzz").unwrap_err();
        assert!(matches!(err, EmbedError::Vector(VectorError::ZeroNorm)));
        assert!(!err.is_unavailable());
    }

    #[test]
    fn test_batch_keeps_order_and_zero_policy() {
        let (_, encoder) = encoder();
        let texts: Vec<String> = ["b", "?", "a"].iter().map(|s| s.to_string()).collect();
        let vectors = encoder.encode_batch(&texts).unwrap();

        assert_eq!(vectors.len(), 3);
        assert_eq!(vectors[0], vec![0.0, 0.0, 1.0]);
        assert_eq!(vectors[1], vec![0.0, 0.0, 0.0]);
        assert!((vectors[2][1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_batches_are_chunked() {
        let (backend, encoder) = encoder();
        let encoder = encoder.with_batch_size(2);
        let texts: Vec<String> = (0..5).map(|_| "a".to_string()).collect();

        assert_eq!(encoder.encode_batch(&texts).unwrap().len(), 5);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_empty_batch_skips_backend() {
        let (backend, encoder) = encoder();
        assert!(encoder.encode_batch(&[]).unwrap().is_empty());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_dimension_is_checked() {
        let (backend, _) = encoder();
        let wrong = VectorEncoder::new(backend, 4);
        assert!(matches!(
            wrong.encode("a"),
            Err(EmbedError::DimensionMismatch { expected: 4, got: 3 })
        ));
    }

    #[test]
    fn test_unnormalized_output() {
        let (_, encoder) = encoder();
        let raw = encoder.with_normalization(false).encode("a").unwrap();
        assert_eq!(raw, vec![3.0, 4.0, 0.0]);
    }

    #[test]
    fn test_from_config_hashing() {
        let config = EmbeddingConfig {
            dimensions: 32,
            ..Default::default()
        };
        let encoder = VectorEncoder::from_config(&config).unwrap();
        assert_eq!(encoder.dimensions(), 32);
        assert_eq!(encoder.encode("major: History").unwrap().len(), 32);
    }
}
