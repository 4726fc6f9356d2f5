//! Profile description generation
//!
//! Asks a language model for a short natural-language paragraph about each
//! profile and stores it as the `description` attribute. Descriptions read
//! more like queries than raw `key: value` descriptors do, so they tend to
//! improve search quality.

pub mod client;

use crate::profile::{Profile, DESCRIPTION_FIELD};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

pub use client::ChatClient;

/// Description generation errors
#[derive(Error, Debug)]
pub enum SummaryError {
    /// API error from LLM provider
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

    #[error("Model returned an empty description for {0}")]
    EmptyResponse(String),
}

pub type SummaryResult<T> = Result<T, SummaryError>;

/// A text-completion model
pub trait TextGenerator: Send + Sync {
    fn generate(&self, prompt: &str) -> SummaryResult<String>;
}

const TEMPLATE: &str = "\"<Name> lives in <City>. They work at <company>. At Yale they majored in <major>. \
They did/did not go to graduate school, if so they went to <graduate school name>. \
They work in the <industry> industry as a <job function>.\"";

/// Builds description prompts and writes the results back into profiles
#[derive(Clone)]
pub struct DescriptionGenerator {
    generator: Arc<dyn TextGenerator>,
}

impl DescriptionGenerator {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Prompt for one profile. Only populated attributes are included, and any
    /// existing description is left out.
    pub fn prompt(profile: &Profile) -> String {
        let populated = Profile::from_pairs(
            profile
                .iter()
                .filter(|(key, value)| {
                    key.as_str() != DESCRIPTION_FIELD
                        && !value.is_null()
                        && !value.to_string().trim().is_empty()
                })
                .map(|(key, value)| (key.clone(), value.clone())),
        );
        let data = serde_json::to_string_pretty(&populated).unwrap_or_else(|_| "{}".to_string());

        format!(
            "Generate a natural language summary for the following alumni profile using this template:\n\n\
             {TEMPLATE}\n\n\
             Skip any field that is missing.\n\n\
             Alumni profile data:\n{data}"
        )
    }

    /// Generate the description of one profile
    pub fn describe(&self, profile: &Profile) -> SummaryResult<String> {
        let identity = profile.name().unwrap_or("unnamed profile").to_string();
        let text = self.generator.generate(&Self::prompt(profile))?;
        let text = text.trim();
        if text.is_empty() {
            return Err(SummaryError::EmptyResponse(identity));
        }
        debug!(profile = %identity, chars = text.len(), "Description generated");
        Ok(text.to_string())
    }

    /// Set the `description` attribute on every named profile.
    ///
    /// Unnamed profiles are skipped with a warning. The first generator
    /// failure aborts the run. Returns the number of profiles described.
    pub fn enrich(&self, profiles: &mut [Profile]) -> SummaryResult<usize> {
        let mut described = 0;
        for (position, profile) in profiles.iter_mut().enumerate() {
            if profile.name().is_none() {
                warn!(position, "Skipping record: no valid name provided");
                continue;
            }
            let description = self.describe(profile)?;
            profile.set(DESCRIPTION_FIELD, description);
            described += 1;
        }
        info!(described, total = profiles.len(), "Profiles enriched with descriptions");
        Ok(described)
    }
}
