// src/clients/embedding.rs
//! Embedding collaborator (Gemini `text-embedding-004` family).
//!
//! The API has returned several response shapes across SDK/endpoint
//! versions, so everything funnels through `normalize_embedding_value`,
//! which accepts every shape observed in the wild. The ranker decides when
//! to fall back from the batch call to per-text calls.

use anyhow::{anyhow, Context, Result};
use serde_json::{json, Value};
use std::time::Duration;

use crate::config::AppConfig;

#[async_trait::async_trait]
pub trait Embedder: Send + Sync {
    /// Embed all texts in one round trip, same order as the input.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
    /// Embed a single text.
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>>;
    fn name(&self) -> &'static str;
}

pub struct GeminiEmbedder {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiEmbedder {
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
            model: cfg.emb_model_id.clone(),
        }
    }

    fn endpoint(&self, method: &str) -> String {
        format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:{}",
            self.model, method
        )
    }

    async fn post(&self, method: &str, body: Value) -> Result<Value> {
        let resp = self
            .http
            .post(self.endpoint(method))
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .context("embedding request failed")?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(anyhow!("embedding call returned {status}: {text}"));
        }
        resp.json::<Value>().await.context("non-JSON embedding response")
    }
}

#[async_trait::async_trait]
impl Embedder for GeminiEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let requests: Vec<Value> = texts
            .iter()
            .map(|t| {
                json!({
                    "model": format!("models/{}", self.model),
                    "content": { "parts": [ { "text": t } ] },
                    "taskType": "SEMANTIC_SIMILARITY",
                })
            })
            .collect();
        let body = json!({ "requests": requests });
        let resp = self.post("batchEmbedContents", body).await?;

        let vectors = normalize_batch_value(&resp)
            .ok_or_else(|| anyhow!("unexpected batch embedding response shape"))?;
        if vectors.len() != texts.len() {
            return Err(anyhow!(
                "batch embedding count mismatch: sent {}, got {}",
                texts.len(),
                vectors.len()
            ));
        }
        Ok(vectors)
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let body = json!({
            "content": { "parts": [ { "text": text } ] },
            "taskType": "SEMANTIC_SIMILARITY",
        });
        let resp = self.post("embedContent", body).await?;
        normalize_embedding_value(&resp)
            .ok_or_else(|| anyhow!("unexpected embedding response shape"))
    }

    fn name(&self) -> &'static str {
        "gemini-embed"
    }
}

/// Normalize any observed single-embedding shape into a flat vector:
/// `{"embedding": [f...]}`, `{"embedding": {"values": [f...]}}`,
/// `{"data": [{"embedding": ...}]}`, or a raw `[f...]` array.
pub fn normalize_embedding_value(v: &Value) -> Option<Vec<f32>> {
    if let Some(emb) = v.get("embedding") {
        if let Some(values) = emb.get("values") {
            return float_vec(values);
        }
        if emb.is_array() {
            return float_vec(emb);
        }
    }
    if let Some(Value::Array(data)) = v.get("data") {
        if let Some(first) = data.first() {
            if let Some(e) = first.get("embedding") {
                if let Some(values) = e.get("values") {
                    return float_vec(values);
                }
                return float_vec(e);
            }
        }
    }
    if v.is_array() {
        return float_vec(v);
    }
    None
}

/// Normalize any observed batch shape into a list of vectors:
/// `{"embeddings": [{"values": ...}, ...]}` (current API),
/// `{"embedding": [[f...], ...]}` and `[[f...], ...]` (older shapes),
/// plus a single-vector response for a one-element batch.
pub fn normalize_batch_value(v: &Value) -> Option<Vec<Vec<f32>>> {
    if let Some(Value::Array(embs)) = v.get("embeddings") {
        return embs.iter().map(normalize_embedding_value).collect();
    }
    if let Some(Value::Array(items)) = v.get("embedding") {
        if items.first().map(Value::is_array).unwrap_or(false) {
            return items.iter().map(float_vec).collect();
        }
        // single vector under the batch key
        return float_vec(&Value::Array(items.clone())).map(|vec| vec![vec]);
    }
    if let Value::Array(items) = v {
        if items.first().map(Value::is_array).unwrap_or(false) {
            return items.iter().map(float_vec).collect();
        }
    }
    normalize_embedding_value(v).map(|vec| vec![vec])
}

fn float_vec(v: &Value) -> Option<Vec<f32>> {
    let arr = v.as_array()?;
    arr.iter()
        .map(|x| x.as_f64().map(|f| f as f32))
        .collect::<Option<Vec<f32>>>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalizes_values_wrapper() {
        let v = json!({"embedding": {"values": [0.1, 0.2]}});
        assert_eq!(normalize_embedding_value(&v), Some(vec![0.1, 0.2]));
    }

    #[test]
    fn normalizes_bare_list_and_data_wrapper() {
        assert_eq!(normalize_embedding_value(&json!([1.0, 2.0])), Some(vec![1.0, 2.0]));
        let v = json!({"data": [{"embedding": [0.5]}]});
        assert_eq!(normalize_embedding_value(&v), Some(vec![0.5]));
    }

    #[test]
    fn rejects_non_numeric_shapes() {
        assert_eq!(normalize_embedding_value(&json!({"embedding": "oops"})), None);
        assert_eq!(normalize_embedding_value(&json!(42)), None);
    }

    #[test]
    fn batch_embeddings_key() {
        let v = json!({"embeddings": [{"values": [1.0]}, {"values": [2.0]}]});
        assert_eq!(
            normalize_batch_value(&v),
            Some(vec![vec![1.0], vec![2.0]])
        );
    }

    #[test]
    fn batch_nested_lists_under_embedding_key() {
        let v = json!({"embedding": [[1.0, 2.0], [3.0, 4.0]]});
        assert_eq!(
            normalize_batch_value(&v),
            Some(vec![vec![1.0, 2.0], vec![3.0, 4.0]])
        );
    }

    #[test]
    fn batch_single_vector_is_wrapped() {
        let v = json!({"embedding": [1.0, 2.0]});
        assert_eq!(normalize_batch_value(&v), Some(vec![vec![1.0, 2.0]]));
    }

    #[test]
    fn batch_unknown_shape_is_none() {
        assert_eq!(normalize_batch_value(&json!({"payload": 42})), None);
    }
}
