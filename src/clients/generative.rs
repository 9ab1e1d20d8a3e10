// src/clients/generative.rs
//! Generative-text collaborator (Gemini `generateContent`). Prompt
//! construction lives in `compose`; this module only moves text across the
//! wire and pulls the candidate text back out of the response envelope.

use anyhow::{anyhow, Context, Result};
use serde_json::{json, Value};
use std::time::Duration;

use crate::config::AppConfig;

/// One generation call. Temperature varies by use: phrase generation wants
/// deterministic output (0.0), tag generation wants diversity (0.7).
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub prompt: String,
    pub temperature: f32,
    pub max_output_tokens: Option<u32>,
}

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            temperature: 0.0,
            max_output_tokens: None,
        }
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.temperature = t;
        self
    }

    pub fn max_output_tokens(mut self, n: u32) -> Self {
        self.max_output_tokens = Some(n);
        self
    }
}

#[async_trait::async_trait]
pub trait PhraseGenerator: Send + Sync {
    /// Returns the model's raw text output. Callers parse it (usually a
    /// newline-separated list with no guarantees on count or uniqueness).
    async fn generate(&self, req: GenerateRequest) -> Result<String>;
    fn name(&self) -> &'static str;
}

pub struct GeminiGenerator {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiGenerator {
    pub fn new(cfg: &AppConfig) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("listing-guard/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(cfg.model_timeout)
            .build()
            .expect("reqwest client");
        Self {
            http,
            api_key: cfg.google_api_key.clone(),
            model: cfg.gen_model_id.clone(),
        }
    }
}

#[async_trait::async_trait]
impl PhraseGenerator for GeminiGenerator {
    async fn generate(&self, req: GenerateRequest) -> Result<String> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.model
        );

        let mut generation_config = json!({ "temperature": req.temperature });
        if let Some(max) = req.max_output_tokens {
            generation_config["maxOutputTokens"] = json!(max);
        }
        let body = json!({
            "contents": [ { "parts": [ { "text": req.prompt } ] } ],
            "generationConfig": generation_config,
        });

        let resp = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .context("generation request failed")?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(anyhow!("generation call returned {status}: {text}"));
        }

        let v: Value = resp.json().await.context("non-JSON generation response")?;
        extract_text(&v).ok_or_else(|| anyhow!("generation response carried no text"))
    }

    fn name(&self) -> &'static str {
        "gemini-generate"
    }
}

/// Concatenate the text parts of the first candidate.
fn extract_text(v: &Value) -> Option<String> {
    let parts = v
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect::<Vec<_>>()
        .join("");
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_concatenated_parts() {
        let v = json!({
            "candidates": [
                { "content": { "parts": [ {"text": "soft "}, {"text": "cotton"} ] } }
            ]
        });
        assert_eq!(extract_text(&v).as_deref(), Some("soft cotton"));
    }

    #[test]
    fn empty_or_missing_text_is_none() {
        assert_eq!(extract_text(&json!({"candidates": []})), None);
        let v = json!({
            "candidates": [ { "content": { "parts": [ {"text": "  "} ] } } ]
        });
        assert_eq!(extract_text(&v), None);
    }

    #[test]
    fn request_builder_sets_options() {
        let r = GenerateRequest::new("p").temperature(0.7).max_output_tokens(800);
        assert_eq!(r.temperature, 0.7);
        assert_eq!(r.max_output_tokens, Some(800));
    }
}
