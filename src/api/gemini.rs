//! Implements the `Summarizer` trait with the Gemini `generateContent` endpoint.

use crate::api::{Summarizer, Summary};
use crate::totals::Totals;
use crate::Result;
use anyhow::{bail, Context};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

/// Holds the Gemini API key.
pub(crate) const API_KEY_ENV: &str = "GEMINI_API_KEY";
const BASE_URL: &str = "https://generativelanguage.googleapis.com";

pub(crate) struct GeminiSummarizer {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiSummarizer {
    /// Reads the API key from `GEMINI_API_KEY`. A missing key is only reported when a summary is
    /// requested.
    pub(crate) fn from_env(model: &str) -> Self {
        let api_key = std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty());
        Self {
            client: reqwest::Client::new(),
            base_url: BASE_URL.to_string(),
            model: model.to_string(),
            api_key,
        }
    }
}

#[async_trait::async_trait]
impl Summarizer for GeminiSummarizer {
    async fn summarize(&self, totals: &Totals) -> Result<Summary> {
        let Some(api_key) = self.api_key.as_deref() else {
            bail!("{API_KEY_ENV} is not set");
        };
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        debug!("Requesting a summary from {url}");
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt(totals) }] }]
        });
        let response = self
            .client
            .post(&url)
            // A header rather than `?key=`, so the key never appears in a logged request URL.
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .context("Failed to reach the summary model")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            bail!("The summary model returned HTTP {status}: {text}");
        }
        let parsed: GenerateResponse = response
            .json()
            .await
            .context("The summary model returned an unexpected response")?;
        parsed.into_summary()
    }
}

fn prompt(totals: &Totals) -> String {
    format!(
        "Give a concise summary of this freelancer's financial status.\n\n\
        Total hours worked: {}\n\
        Total earnings (earnings currency): {}\n\
        Total payments (local currency): {}\n\
        Total payments (earnings currency): {}\n\
        Remaining balance (local currency, at the current rate): {}\n\
        Remaining balance (earnings currency): {}\n",
        totals.total_hours,
        totals.total_earnings,
        totals.total_payments_local,
        totals.total_payments_earnings_currency,
        totals.balance_local,
        totals.balance_earnings_currency,
    )
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    /// Joins the text parts of the first candidate.
    fn into_summary(self) -> Result<Summary> {
        let text: String = self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        let text = text.trim();
        if text.is_empty() {
            bail!("The summary model returned no text");
        }
        Ok(Summary::new(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Amount;
    use std::str::FromStr;

    #[test]
    fn test_into_summary() {
        let json = r#"{"candidates": [{"content": {"parts": [{"text": " You are owed "}, {"text": "80.00. "}]}}]}"#;
        let response: GenerateResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            response.into_summary().unwrap().summary,
            "You are owed 80.00."
        );
    }

    #[test]
    fn test_empty_response_is_an_error() {
        let response: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert!(response.into_summary().is_err());
        let response: GenerateResponse =
            serde_json::from_str(r#"{"candidates": [{"finishReason": "SAFETY"}]}"#).unwrap();
        assert!(response.into_summary().is_err());
    }

    #[test]
    fn test_prompt_contains_totals() {
        let totals = Totals {
            total_hours: Amount::from_str("10").unwrap(),
            total_earnings: Amount::from_str("80").unwrap(),
            ..Default::default()
        };
        let p = prompt(&totals);
        assert!(p.contains("Total hours worked: 10.00"));
        assert!(p.contains("Total earnings (earnings currency): 80.00"));
    }

    #[tokio::test]
    async fn test_missing_key_is_an_error() {
        let summarizer = GeminiSummarizer {
            client: reqwest::Client::new(),
            base_url: BASE_URL.to_string(),
            model: "m".to_string(),
            api_key: None,
        };
        let e = summarizer.summarize(&Totals::default()).await.unwrap_err();
        assert!(e.to_string().contains(API_KEY_ENV));
    }

    #[tokio::test]
    async fn test_transport_error_does_not_leak_key() {
        let summarizer = GeminiSummarizer {
            client: reqwest::Client::new(),
            base_url: "http://127.0.0.1:1".to_string(),
            model: "m".to_string(),
            api_key: Some("SECRETKEY123".to_string()),
        };
        let e = summarizer.summarize(&Totals::default()).await.unwrap_err();
        let message = format!("{e:#} {e:?}");
        assert!(message.contains("Failed to reach the summary model"));
        assert!(!message.contains("SECRETKEY123"), "{message}");
    }
}
