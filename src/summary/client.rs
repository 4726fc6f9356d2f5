//! Chat client for LLM description generation

use crate::config::{Provider, SummaryConfig};
use crate::summary::{SummaryError, SummaryResult, TextGenerator};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub struct ChatClient {
    client: Client,
    config: SummaryConfig,
    api_base_url: String,
}

impl ChatClient {
    pub fn new(config: &SummaryConfig) -> SummaryResult<Self> {
        let api_base_url = match config.provider {
            Provider::OpenAI => "https://api.openai.com/v1",
            Provider::Ollama => "http://localhost:11434",
            Provider::Gemini => "https://generativelanguage.googleapis.com/v1beta",
            Provider::Hashing => {
                return Err(SummaryError::ConfigError(
                    "hashing provider cannot generate text".to_string(),
                ))
            }
        };
        let api_base_url = config
            .api_base_url
            .clone()
            .unwrap_or_else(|| api_base_url.to_string())
            .trim_end_matches('/')
            .to_string();

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SummaryError::ConfigError(e.to_string()))?;

        Ok(Self {
            client,
            config: config.clone(),
            api_base_url,
        })
    }

    pub fn complete(&self, prompt: &str) -> SummaryResult<String> {
        debug!(provider = ?self.config.provider, model = %self.config.model, "Requesting completion");
        match self.config.provider {
            Provider::OpenAI => self.openai_chat(prompt),
            Provider::Ollama => self.ollama_generate(prompt),
            Provider::Gemini => self.gemini_chat(prompt),
            Provider::Hashing => Err(SummaryError::ConfigError(
                "hashing provider cannot generate text".to_string(),
            )),
        }
    }

    fn api_key(&self) -> SummaryResult<&str> {
        self.config.api_key.as_deref().ok_or_else(|| {
            SummaryError::ConfigError(format!("{:?} requires API key", self.config.provider))
        })
    }

    fn openai_chat(&self, prompt: &str) -> SummaryResult<String> {
        #[derive(Serialize)]
        struct Message<'a> {
            role: &'a str,
            content: &'a str,
        }

        #[derive(Serialize)]
        struct Request<'a> {
            model: &'a str,
            messages: Vec<Message<'a>>,
            temperature: f32,
            max_tokens: u32,
        }

        #[derive(Deserialize)]
        struct Response {
            choices: Vec<Choice>,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: MessageContent,
        }

        #[derive(Deserialize)]
        struct MessageContent {
            content: Option<String>,
        }

        let url = format!("{}/chat/completions", self.api_base_url);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(self.api_key()?)
            .json(&Request {
                model: &self.config.model,
                messages: vec![Message {
                    role: "user",
                    content: prompt,
                }],
                temperature: self.config.temperature,
                max_tokens: self.config.max_tokens,
            })
            .send()
            .map_err(|e| SummaryError::NetworkError(e.to_string()))?;

        if !resp.status().is_success() {
            let text = resp.text().unwrap_or_default();
            return Err(SummaryError::ApiError(format!("OpenAI error: {}", text)));
        }

        let result: Response = resp
            .json()
            .map_err(|e| SummaryError::SerializationError(e.to_string()))?;
        Ok(result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }

    fn ollama_generate(&self, prompt: &str) -> SummaryResult<String> {
        #[derive(Serialize)]
        struct Options {
            temperature: f32,
            num_predict: u32,
        }

        #[derive(Serialize)]
        struct Request<'a> {
            model: &'a str,
            prompt: &'a str,
            stream: bool,
            options: Options,
        }

        #[derive(Deserialize)]
        struct Response {
            response: String,
        }

        let url = format!("{}/api/generate", self.api_base_url);
        let resp = self
            .client
            .post(&url)
            .json(&Request {
                model: &self.config.model,
                prompt,
                stream: false,
                options: Options {
                    temperature: self.config.temperature,
                    num_predict: self.config.max_tokens,
                },
            })
            .send()
            .map_err(|e| SummaryError::NetworkError(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(SummaryError::ApiError(format!("Ollama error: {}", resp.status())));
        }

        let result: Response = resp
            .json()
            .map_err(|e| SummaryError::SerializationError(e.to_string()))?;
        Ok(result.response)
    }

    fn gemini_chat(&self, prompt: &str) -> SummaryResult<String> {
        #[derive(Serialize)]
        struct Request<'a> {
            contents: Vec<Content<'a>>,
            #[serde(rename = "generationConfig")]
            generation_config: GenerationConfig,
        }

        #[derive(Serialize)]
        struct Content<'a> {
            role: &'a str,
            parts: Vec<Part<'a>>,
        }

        #[derive(Serialize)]
        struct Part<'a> {
            text: &'a str,
        }

        #[derive(Serialize)]
        struct GenerationConfig {
            temperature: f32,
            #[serde(rename = "maxOutputTokens")]
            max_output_tokens: u32,
        }

        #[derive(Deserialize)]
        struct Response {
            candidates: Option<Vec<Candidate>>,
        }

        #[derive(Deserialize)]
        struct Candidate {
            content: CandidateContent,
        }

        #[derive(Deserialize)]
        struct CandidateContent {
            parts: Vec<CandidatePart>,
        }

        #[derive(Deserialize)]
        struct CandidatePart {
            text: String,
        }

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.api_base_url,
            self.config.model,
            self.api_key()?
        );

        let resp = self
            .client
            .post(&url)
            .json(&Request {
                contents: vec![Content {
                    role: "user",
                    parts: vec![Part { text: prompt }],
                }],
                generation_config: GenerationConfig {
                    temperature: self.config.temperature,
                    max_output_tokens: self.config.max_tokens,
                },
            })
            .send()
            .map_err(|e| SummaryError::NetworkError(e.to_string()))?;

        if !resp.status().is_success() {
            let text = resp.text().unwrap_or_default();
            return Err(SummaryError::ApiError(format!("Gemini error: {}", text)));
        }

        let result: Response = resp
            .json()
            .map_err(|e| SummaryError::SerializationError(e.to_string()))?;

        Ok(result
            .candidates
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .unwrap_or_default())
    }
}

impl TextGenerator for ChatClient {
    fn generate(&self, prompt: &str) -> SummaryResult<String> {
        self.complete(prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hashing_provider_rejected() {
        let config = SummaryConfig {
            provider: Provider::Hashing,
            ..Default::default()
        };
        assert!(matches!(ChatClient::new(&config), Err(SummaryError::ConfigError(_))));
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let client = ChatClient::new(&SummaryConfig::default()).unwrap();
        assert!(matches!(client.complete("hi"), Err(SummaryError::ConfigError(_))));
    }

    #[test]
    fn test_custom_base_url() {
        let config = SummaryConfig {
            provider: Provider::Ollama,
            api_base_url: Some("http://10.0.0.5:11434/".to_string()),
            ..Default::default()
        };
        let client = ChatClient::new(&config).unwrap();
        assert_eq!(client.api_base_url, "http://10.0.0.5:11434");
    }
}
