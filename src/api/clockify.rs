//! Implements the `TimeReport` trait by downloading a Clockify shared report over HTTP.

use crate::api::TimeReport;
use crate::import::RawTimeEntry;
use crate::model::Amount;
use crate::Result;
use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, trace};

/// A Clockify shared report reachable at a fixed URL.
pub(crate) struct ClockifyReport {
    client: reqwest::Client,
    url: url::Url,
}

impl ClockifyReport {
    pub(crate) fn new(report_url: &str) -> Result<Self> {
        let url = url::Url::parse(report_url)
            .with_context(|| format!("'{report_url}' is not a valid report URL"))?;
        Ok(Self {
            client: reqwest::Client::new(),
            url,
        })
    }
}

#[async_trait::async_trait]
impl TimeReport for ClockifyReport {
    async fn fetch(&mut self) -> Result<Vec<RawTimeEntry>> {
        debug!("Fetching time report from {}", self.url);
        let response = self
            .client
            .get(self.url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .context("Failed to reach the time report")?;

        let status = response.status();
        if !status.is_success() {
            bail!("Failed to fetch the time report: HTTP {status}");
        }
        let body = response
            .text()
            .await
            .context("Failed to read the time report response")?;
        trace!("Time report body: {} bytes", body.len());
        parse_report(&body)
    }
}

/// The parts of a shared report that are used. Everything else is ignored.
#[derive(Debug, Deserialize)]
struct Report {
    #[serde(default)]
    timeentries: Option<Vec<Entry>>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    #[serde(rename = "_id")]
    id: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(rename = "timeInterval", default)]
    time_interval: Option<TimeInterval>,
    #[serde(default)]
    rate: Option<Amount>,
}

#[derive(Debug, Deserialize)]
struct TimeInterval {
    #[serde(default)]
    start: Option<DateTime<Utc>>,
    #[serde(default)]
    end: Option<DateTime<Utc>>,
    #[serde(default)]
    duration: Option<Duration>,
}

/// Reports give durations in seconds. Some exports use ISO 8601 strings like `PT1H30M`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Duration {
    Seconds(u64),
    FractionalSeconds(f64),
    Iso(String),
}

impl Duration {
    fn seconds(&self) -> Result<u64> {
        match self {
            Duration::Seconds(s) => Ok(*s),
            Duration::FractionalSeconds(s) if s.is_finite() && *s >= 0.0 => Ok(s.round() as u64),
            Duration::FractionalSeconds(s) => bail!("Invalid duration {s}"),
            Duration::Iso(s) => parse_iso_duration(s),
        }
    }
}

/// Parses the time part of an ISO 8601 duration, e.g. `PT2H15M30S`.
fn parse_iso_duration(s: &str) -> Result<u64> {
    let rest = s
        .strip_prefix("PT")
        .with_context(|| format!("Unsupported duration '{s}'"))?;
    let mut total = 0u64;
    let mut number = String::new();
    for c in rest.chars() {
        if c.is_ascii_digit() {
            number.push(c);
            continue;
        }
        let n: u64 = number
            .parse()
            .with_context(|| format!("Invalid duration '{s}'"))?;
        number.clear();
        let unit = match c {
            'H' => 3600,
            'M' => 60,
            'S' => 1,
            _ => bail!("Invalid duration '{s}'"),
        };
        total = n
            .checked_mul(unit)
            .and_then(|seconds| total.checked_add(seconds))
            .with_context(|| format!("Invalid duration '{s}'"))?;
    }
    if !number.is_empty() {
        bail!("Invalid duration '{s}'");
    }
    Ok(total)
}

/// Parses a report body. A report without `timeentries` has no entries.
pub(super) fn parse_report(body: &str) -> Result<Vec<RawTimeEntry>> {
    let report: Report = serde_json::from_str(body).context("The time report is not valid JSON")?;
    report
        .timeentries
        .unwrap_or_default()
        .into_iter()
        .map(|entry| -> Result<RawTimeEntry> {
            let interval = entry.time_interval;
            let duration_seconds = interval
                .as_ref()
                .and_then(|i| i.duration.as_ref())
                .map(Duration::seconds)
                .transpose()
                .with_context(|| format!("Time entry {} has a bad duration", entry.id))?;
            Ok(RawTimeEntry {
                source_id: entry.id,
                description: entry.description.unwrap_or_default(),
                start: interval.as_ref().and_then(|i| i.start),
                end: interval.as_ref().and_then(|i| i.end),
                duration_seconds,
                reported_rate: entry.rate,
            })
        })
        .collect()
}
