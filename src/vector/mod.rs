//! Vector math and nearest-neighbour indexes
//!
//! Embeddings are compared by inner product on unit-normalized vectors, which
//! equals their cosine similarity.

pub mod index;

pub use index::{
    build_index, FlatIndex, HnswIndex, IndexKind, InnerProductDistance, VectorError, VectorIndex,
    VectorResult,
};

/// Euclidean (L2) norm
pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Inner product of two equally sized vectors
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Divide `v` by its L2 norm.
///
/// Fails with [`VectorError::ZeroNorm`] when the norm is zero or not finite.
pub fn normalize(v: &[f32]) -> VectorResult<Vec<f32>> {
    let norm = l2_norm(v);
    if !(norm > 0.0) || !norm.is_finite() {
        return Err(VectorError::ZeroNorm);
    }
    Ok(v.iter().map(|x| x / norm).collect())
}

/// Like [`normalize`], but a zero-norm vector maps to the zero vector, whose
/// similarity to everything is 0.
pub fn normalize_or_zero(v: &[f32]) -> Vec<f32> {
    normalize(v).unwrap_or_else(|_| vec![0.0; v.len()])
}

/// Cosine similarity; 0.0 when either vector has zero norm
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a <= 0.0 || norm_b <= 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_unit_length() {
        let v = normalize(&[3.0, 4.0]).unwrap();
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
        assert!((l2_norm(&v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_idempotent() {
        let once = normalize(&[0.3, -1.2, 5.0, 0.01]).unwrap();
        let twice = normalize(&once).unwrap();
        for (a, b) in once.iter().zip(&twice) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_zero_norm_is_explicit() {
        assert!(matches!(normalize(&[0.0, 0.0, 0.0]), Err(VectorError::ZeroNorm)));
        assert!(matches!(normalize(&[f32::NAN, 1.0]), Err(VectorError::ZeroNorm)));
        assert_eq!(normalize_or_zero(&[0.0, 0.0]), vec![0.0, 0.0]);
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[0.0, 1.0])).abs() < 1e-6);
        assert!((cosine_similarity(&[2.0, 0.0], &[5.0, 0.0]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
