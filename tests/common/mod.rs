#![allow(dead_code)]

use cohort::{EmbedError, EmbedResult, EmbeddingBackend, Profile, VectorEncoder};
use std::sync::Arc;

/// One axis per topic keyword; text without a topic gets the last axis
pub struct TopicBackend;

pub const TOPICS: [&str; 3] = ["economics", "biology", "finance"];

impl EmbeddingBackend for TopicBackend {
    fn model_name(&self) -> &str {
        "topics"
    }

    fn embed(&self, texts: &[String]) -> EmbedResult<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| {
                let lower = text.to_lowercase();
                let mut v: Vec<f32> = TOPICS.iter().map(|t| lower.matches(t).count() as f32).collect();
                v.push(if v.iter().all(|x| *x == 0.0) { 1.0 } else { 0.0 });
                v
            })
            .collect())
    }
}

/// Always fails as if the model host were unreachable
pub struct UnreachableBackend;

impl EmbeddingBackend for UnreachableBackend {
    fn model_name(&self) -> &str {
        "unreachable"
    }

    fn embed(&self, _texts: &[String]) -> EmbedResult<Vec<Vec<f32>>> {
        Err(EmbedError::NetworkError("connection refused".to_string()))
    }
}

pub fn topic_encoder() -> VectorEncoder {
    VectorEncoder::new(Arc::new(TopicBackend), TOPICS.len() + 1)
}

pub fn unreachable_encoder() -> VectorEncoder {
    VectorEncoder::new(Arc::new(UnreachableBackend), TOPICS.len() + 1)
}

/// A and B share every content attribute; C shares none of their topics
pub fn abc_profiles() -> Vec<Profile> {
    vec![
        Profile::from_pairs([
            ("name", "Alice Archer"),
            ("email", "alice@example.com"),
            ("major", "Economics"),
            ("city", "Boston"),
        ]),
        Profile::from_pairs([
            ("name", "Bruno Bell"),
            ("email", "bruno@example.com"),
            ("major", "Economics"),
            ("city", "Boston"),
        ]),
        Profile::from_pairs([
            ("name", "Chiara Costa"),
            ("email", "chiara@example.com"),
            ("major", "Biology"),
            ("city", "Denver"),
        ]),
    ]
}

/// A and B work in finance in NY, C in art in LA
pub fn finance_art_profiles() -> Vec<Profile> {
    vec![
        Profile::from_pairs([("name", "A"), ("city", "NY"), ("industry", "Finance")]),
        Profile::from_pairs([("name", "B"), ("city", "NY"), ("industry", "Finance")]),
        Profile::from_pairs([("name", "C"), ("city", "LA"), ("industry", "Art")]),
    ]
}
