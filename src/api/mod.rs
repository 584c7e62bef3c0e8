//! The external collaborators: the time report that work logs are imported from and the language
//! model that writes narrative summaries.
//!
//! Each one sits behind a trait with a live implementation and an in-memory one. The in-memory
//! ones are compiled into the production binary too, so the whole program can be run top to
//! bottom without network access by setting `ARZ_IN_TEST_MODE`.

mod clockify;
mod gemini;
mod report_test_client;
mod summary_test_client;

use crate::import::RawTimeEntry;
use crate::totals::Totals;
use crate::{Config, Result};
use anyhow::ensure;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::error;

pub(crate) use clockify::ClockifyReport;
pub(crate) use gemini::GeminiSummarizer;
pub(crate) use report_test_client::TestReport;
pub(crate) use summary_test_client::TemplateSummarizer;

/// When this environment variable is set to a non-empty value the program uses in-memory
/// collaborators instead of the network.
pub const TEST_MODE_ENV: &str = "ARZ_IN_TEST_MODE";

/// Returned in place of a summary whenever the summarizer fails.
pub const FALLBACK_SUMMARY: &str = "Sorry, I couldn't generate a summary at this time. Please \
check the server logs for more details.";

/// Selects live or in-memory collaborators.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Talk to the configured time report and language model.
    #[default]
    Live,
    /// Use the seeded in-memory time report and the offline template summarizer.
    Testing,
}

serde_plain::derive_display_from_serialize!(Mode);
serde_plain::derive_fromstr_from_deserialize!(Mode);

impl Mode {
    /// `Mode::Testing` when `ARZ_IN_TEST_MODE` is set and non-empty, otherwise `Mode::Live`.
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(value) if !value.is_empty() => Mode::Testing,
            _ => Mode::Live,
        }
    }
}

/// A source of raw time tracking entries.
#[async_trait::async_trait]
pub(crate) trait TimeReport: Send {
    /// Fetches every entry currently in the report.
    async fn fetch(&mut self) -> Result<Vec<RawTimeEntry>>;
}

/// A narrative summary of the totals.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Summary {
    pub summary: String,
}

impl Summary {
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
        }
    }
}

/// Writes a human-readable paragraph about the totals.
#[async_trait::async_trait]
pub(crate) trait Summarizer: Send + Sync {
    async fn summarize(&self, totals: &Totals) -> Result<Summary>;
}

/// Creates the time report for `mode`.
pub(crate) fn time_report(config: &Config, mode: Mode) -> Result<Box<dyn TimeReport>> {
    match mode {
        Mode::Testing => Ok(Box::new(TestReport::seeded()?)),
        Mode::Live => {
            ensure!(
                !config.report_url().is_empty(),
                "No report_url is set in '{}'",
                config.config_path().display()
            );
            Ok(Box::new(ClockifyReport::new(config.report_url())?))
        }
    }
}

/// Creates the summarizer for `mode`.
pub(crate) fn summarizer(config: &Config, mode: Mode) -> Box<dyn Summarizer> {
    match mode {
        Mode::Testing => Box::new(TemplateSummarizer),
        Mode::Live => Box::new(GeminiSummarizer::from_env(config.summary_model())),
    }
}

/// Asks `summarizer` for a summary. Any failure is logged and replaced by `FALLBACK_SUMMARY`.
pub(crate) async fn summarize_or_fallback(summarizer: &dyn Summarizer, totals: &Totals) -> Summary {
    match summarizer.summarize(totals).await {
        Ok(summary) => summary,
        Err(e) => {
            error!("Unable to generate a summary: {e:#}");
            Summary::new(FALLBACK_SUMMARY)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;

    struct Failing;

    #[async_trait::async_trait]
    impl Summarizer for Failing {
        async fn summarize(&self, _totals: &Totals) -> Result<Summary> {
            bail!("the model is down")
        }
    }

    #[tokio::test]
    async fn test_failing_summarizer_falls_back() {
        let summary = summarize_or_fallback(&Failing, &Totals::default()).await;
        assert_eq!(summary.summary, FALLBACK_SUMMARY);
    }

    #[tokio::test]
    async fn test_working_summarizer_passes_through() {
        let summary = summarize_or_fallback(&TemplateSummarizer, &Totals::default()).await;
        assert_ne!(summary.summary, FALLBACK_SUMMARY);
        assert!(!summary.summary.is_empty());
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(Mode::Testing.to_string(), "testing");
        assert_eq!(Mode::default(), Mode::Live);
    }
}
