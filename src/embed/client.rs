//! Embedding client for hosted model providers

use crate::config::{EmbeddingConfig, Provider};
use crate::embed::{EmbedError, EmbedResult, EmbeddingBackend};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default API base URL per provider
pub(crate) fn default_base_url(provider: Provider) -> Option<&'static str> {
    match provider {
        Provider::OpenAI => Some("https://api.openai.com/v1"),
        Provider::Ollama => Some("http://localhost:11434"),
        Provider::Gemini => Some("https://generativelanguage.googleapis.com/v1beta"),
        Provider::Hashing => None,
    }
}

/// Client for generating embeddings over HTTP
pub struct EmbeddingClient {
    client: Client,
    provider: Provider,
    model: String,
    api_key: Option<String>,
    api_base_url: String,
}

impl EmbeddingClient {
    /// Create a new embedding client based on configuration
    pub fn new(config: &EmbeddingConfig) -> EmbedResult<Self> {
        let default_url = default_base_url(config.provider).ok_or_else(|| {
            EmbedError::ConfigError(format!("Provider {:?} has no HTTP API", config.provider))
        })?;

        if matches!(config.provider, Provider::OpenAI | Provider::Gemini) && config.api_key.is_none() {
            return Err(EmbedError::ConfigError(format!(
                "{:?} requires an API key",
                config.provider
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EmbedError::ConfigError(e.to_string()))?;

        let api_base_url = config
            .api_base_url
            .clone()
            .unwrap_or_else(|| default_url.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client,
            provider: config.provider,
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            api_base_url,
        })
    }

    /// Generate embeddings for a batch of texts
    pub fn generate_embeddings(&self, texts: &[String]) -> EmbedResult<Vec<Vec<f32>>> {
        debug!(provider = ?self.provider, texts = texts.len(), "Requesting embeddings");
        match self.provider {
            Provider::OpenAI => self.openai_embeddings(texts),
            Provider::Ollama => self.ollama_embeddings(texts),
            Provider::Gemini => self.gemini_embeddings(texts),
            Provider::Hashing => Err(EmbedError::ConfigError(
                "hashing provider is local".to_string(),
            )),
        }
    }

    fn api_key(&self) -> EmbedResult<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| EmbedError::ConfigError(format!("{:?} requires API key", self.provider)))
    }

    fn openai_embeddings(&self, texts: &[String]) -> EmbedResult<Vec<Vec<f32>>> {
        #[derive(Serialize)]
        struct OpenAIRequest<'a> {
            input: &'a [String],
            model: &'a str,
        }

        #[derive(Deserialize)]
        struct OpenAIResponse {
            data: Vec<OpenAIData>,
        }

        #[derive(Deserialize)]
        struct OpenAIData {
            index: usize,
            embedding: Vec<f32>,
        }

        let url = format!("{}/embeddings", self.api_base_url);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(self.api_key()?)
            .json(&OpenAIRequest {
                input: texts,
                model: &self.model,
            })
            .send()
            .map_err(|e| EmbedError::NetworkError(e.to_string()))?;

        if !resp.status().is_success() {
            let error_text = resp.text().unwrap_or_default();
            return Err(EmbedError::ApiError(format!("OpenAI returned error: {}", error_text)));
        }

        let mut result: OpenAIResponse = resp
            .json()
            .map_err(|e| EmbedError::SerializationError(e.to_string()))?;
        // entries carry their input index; do not rely on response order
        result.data.sort_by_key(|d| d.index);
        Ok(result.data.into_iter().map(|d| d.embedding).collect())
    }

    fn ollama_embeddings(&self, texts: &[String]) -> EmbedResult<Vec<Vec<f32>>> {
        #[derive(Serialize)]
        struct OllamaRequest<'a> {
            model: &'a str,
            prompt: &'a str,
        }

        #[derive(Deserialize)]
        struct OllamaResponse {
            embedding: Vec<f32>,
        }

        let url = format!("{}/api/embeddings", self.api_base_url);
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            let resp = self
                .client
                .post(&url)
                .json(&OllamaRequest {
                    model: &self.model,
                    prompt: text,
                })
                .send()
                .map_err(|e| EmbedError::NetworkError(e.to_string()))?;

            if !resp.status().is_success() {
                let error_text = resp.text().unwrap_or_default();
                return Err(EmbedError::ApiError(format!("Ollama returned error: {}", error_text)));
            }

            let result: OllamaResponse = resp
                .json()
                .map_err(|e| EmbedError::SerializationError(e.to_string()))?;
            results.push(result.embedding);
        }

        Ok(results)
    }

    fn gemini_embeddings(&self, texts: &[String]) -> EmbedResult<Vec<Vec<f32>>> {
        #[derive(Serialize)]
        struct GeminiBatchRequest<'a> {
            requests: Vec<GeminiRequest<'a>>,
        }

        #[derive(Serialize)]
        struct GeminiRequest<'a> {
            model: String,
            content: GeminiContent<'a>,
        }

        #[derive(Serialize)]
        struct GeminiContent<'a> {
            parts: Vec<GeminiPart<'a>>,
        }

        #[derive(Serialize)]
        struct GeminiPart<'a> {
            text: &'a str,
        }

        #[derive(Deserialize)]
        struct GeminiBatchResponse {
            embeddings: Vec<GeminiEmbedding>,
        }

        #[derive(Deserialize)]
        struct GeminiEmbedding {
            values: Vec<f32>,
        }

        let url = format!(
            "{}/models/{}:batchEmbedContents?key={}",
            self.api_base_url,
            self.model,
            self.api_key()?
        );

        let requests = texts
            .iter()
            .map(|t| GeminiRequest {
                model: format!("models/{}", self.model),
                content: GeminiContent {
                    parts: vec![GeminiPart { text: t }],
                },
            })
            .collect();

        let resp = self
            .client
            .post(&url)
            .json(&GeminiBatchRequest { requests })
            .send()
            .map_err(|e| EmbedError::NetworkError(e.to_string()))?;

        if !resp.status().is_success() {
            let error_text = resp.text().unwrap_or_default();
            return Err(EmbedError::ApiError(format!("Gemini returned error: {}", error_text)));
        }

        let result: GeminiBatchResponse = resp
            .json()
            .map_err(|e| EmbedError::SerializationError(e.to_string()))?;
        Ok(result.embeddings.into_iter().map(|e| e.values).collect())
    }
}

impl EmbeddingBackend for EmbeddingClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn embed(&self, texts: &[String]) -> EmbedResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.generate_embeddings(texts)
    }
}
