// src/clients/trademark.rs
//! Trademark-lookup collaborator (RapidAPI USPTO).
//!
//! Contract at this boundary: errors are data, not panics. Transport
//! failures and non-JSON bodies are folded into `LookupOutcome` so the
//! interpreter can reason about them uniformly. The trait still returns
//! `Result` because the safety checker must defend against failures that
//! escape any implementation (mocks included).

use anyhow::Result;
use serde_json::Value;
use std::time::Duration;

use crate::config::AppConfig;

pub const RAPIDAPI_HOST: &str = "uspto-trademark.p.rapidapi.com";

/// Loosely-typed result of one availability lookup.
#[derive(Debug, Clone, Default)]
pub struct LookupOutcome {
    pub status_code: Option<u16>,
    /// Parsed JSON body, or `{"raw": text}` when the body was not JSON.
    pub payload: Option<Value>,
    /// Transport-level failure, when the call itself did not complete.
    pub error: Option<String>,
}

#[async_trait::async_trait]
pub trait TrademarkLookup: Send + Sync {
    async fn check_available(&self, term: &str) -> Result<LookupOutcome>;
    fn name(&self) -> &'static str;
}

pub struct RapidApiTrademarkClient {
    http: reqwest::Client,
    api_key: String,
    base: String,
}

impl RapidApiTrademarkClient {
    pub fn new(cfg: &AppConfig) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("listing-guard/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(cfg.lookup_timeout)
            .build()
            .expect("reqwest client");
        Self {
            http,
            api_key: cfg.rapidapi_key.clone(),
            base: format!("https://{RAPIDAPI_HOST}/v1"),
        }
    }

    fn lookup_url(&self, term: &str) -> Result<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.base)?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("lookup base url cannot be a base"))?
            .push("trademarkAvailable")
            .push(term); // Url percent-encodes the segment
        Ok(url)
    }
}

#[async_trait::async_trait]
impl TrademarkLookup for RapidApiTrademarkClient {
    /// GET /v1/trademarkAvailable/{term}. Tolerant of non-JSON and non-200
    /// responses; folds transport failures into the outcome instead of
    /// returning `Err`.
    async fn check_available(&self, term: &str) -> Result<LookupOutcome> {
        let url = self.lookup_url(term)?;

        let resp = match self
            .http
            .get(url)
            .header("x-rapidapi-host", RAPIDAPI_HOST)
            .header("x-rapidapi-key", &self.api_key)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                return Ok(LookupOutcome {
                    status_code: None,
                    payload: None,
                    error: Some(format!("http error: {e}")),
                });
            }
        };

        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        let payload = match serde_json::from_str::<Value>(&body) {
            Ok(v) => v,
            Err(_) => serde_json::json!({ "raw": body }),
        };

        Ok(LookupOutcome {
            status_code: Some(status),
            payload: Some(payload),
            error: None,
        })
    }

    fn name(&self) -> &'static str {
        "rapidapi-uspto"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn lookup_url_percent_encodes_the_term() {
        let client = RapidApiTrademarkClient::new(&AppConfig::default());
        let url = client.lookup_url("cozy shirt & co").unwrap();
        assert_eq!(
            url.as_str(),
            format!("https://{RAPIDAPI_HOST}/v1/trademarkAvailable/cozy%20shirt%20&%20co")
        );
    }
}
