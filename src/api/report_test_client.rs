//! Implements the `TimeReport` trait using in-memory data for testing purposes.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without a Clockify report.

use crate::api::TimeReport;
use crate::import::RawTimeEntry;
use crate::model::Amount;
use crate::{utils, Result};
use anyhow::{anyhow, bail, Context};
use serde::Deserialize;
use std::io::Cursor;

/// An implementation of the `TimeReport` trait that holds its entries in memory, usually the seed
/// data in this module.
pub(crate) struct TestReport {
    entries: Vec<RawTimeEntry>,
    fail: bool,
}

impl TestReport {
    pub(crate) fn new(entries: Vec<RawTimeEntry>) -> Self {
        Self {
            entries,
            fail: false,
        }
    }

    /// A report seeded with the data in this module.
    pub(crate) fn seeded() -> Result<Self> {
        Self::from_csv(REPORT_DATA)
    }

    /// A report holding the entries of a CSV string with a header row.
    pub(crate) fn from_csv(csv_data: &str) -> Result<Self> {
        let entries = load_csv(csv_data).context("Unable to load the test time report")?;
        Ok(Self::new(entries))
    }

    /// A report whose every fetch fails, as an unreachable server would.
    #[cfg(test)]
    pub(crate) fn failing() -> Self {
        Self {
            entries: Vec::new(),
            fail: true,
        }
    }
}

#[async_trait::async_trait]
impl TimeReport for TestReport {
    async fn fetch(&mut self) -> Result<Vec<RawTimeEntry>> {
        if self.fail {
            bail!("Failed to fetch the time report: HTTP 503 Service Unavailable");
        }
        Ok(self.entries.clone())
    }
}


#[derive(Debug, Deserialize)]
struct Row {
    source_id: String,
    description: String,
    start: String,
    end: String,
    duration_seconds: Option<u64>,
    reported_rate: String,
}

/// Loads entries from a CSV-formatted string with a header row.
fn load_csv(csv_data: &str) -> Result<Vec<RawTimeEntry>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(Cursor::new(csv_data.as_bytes()));

    let mut entries = Vec::new();
    for result in rdr.deserialize() {
        let row: Row = result.context("Invalid seed row")?;
        entries.push(RawTimeEntry {
            start: optional_timestamp(&row.start)?,
            end: optional_timestamp(&row.end)?,
            reported_rate: if row.reported_rate.is_empty() {
                None
            } else {
                Some(utils::parse_amount(&row.reported_rate).map_err(|e| anyhow!(e))?)
            },
            source_id: row.source_id,
            description: row.description,
            duration_seconds: row.duration_seconds,
        });
    }
    Ok(entries)
}

fn optional_timestamp(s: &str) -> Result<Option<chrono::DateTime<chrono::Utc>>> {
    if s.is_empty() {
        return Ok(None);
    }
    utils::parse_timestamp(s).map(Some).map_err(|e| anyhow!(e))
}

/// Seed report data: 9.5 hours in total, reported at a rate that import ignores.
const REPORT_DATA: &str = r##"source_id,description,start,end,duration_seconds,reported_rate
683b2a01,API integration,2025-06-02T08:00:00Z,2025-06-02T11:00:00Z,10800,25
683b2a02,Code review,2025-06-03T13:00:00Z,2025-06-03T14:30:00Z,5400,25
683b2a03,,2025-06-04T09:00:00Z,2025-06-04T10:00:00Z,3600,
683b2a04,Bug fixes,2025-06-05T07:30:00Z,2025-06-05T11:30:00Z,14400,25
683b2a05,Standup,,,,
"##;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[test]
    fn test_seed_data_parses() {
        let entries = load_csv(REPORT_DATA).unwrap();
        assert_eq!(entries.len(), 5);
        assert_eq!(entries[2].description, "");
        assert_eq!(entries[2].reported_rate, None);
        assert_eq!(entries[4].start, None);
        assert_eq!(entries[4].duration_seconds, None);
    }

    #[tokio::test]
    async fn test_default_report_normalizes() {
        let mut report = TestReport::seeded().unwrap();
        let entries = report.fetch().await.unwrap();
        let logs = import::normalize_all(&entries, Amount::from_str("8.12").unwrap());
        let hours: Decimal = logs.iter().map(|l| l.hours().value()).sum();
        assert_eq!(hours, Decimal::from_str("9.5").unwrap());
        assert_eq!(logs[0].id(), Some("clockify-683b2a04"));
        assert_eq!(logs[4].id(), Some("clockify-683b2a05"));
    }

    #[test]
    fn test_broken_seed_is_an_error() {
        let data = "source_id,description,start,end,duration_seconds,reported_rate\n\
            a1,Work,yesterday,,3600,25\n";
        let e = TestReport::from_csv(data).err().unwrap();
        assert!(format!("{e:#}").contains("Unable to load the test time report"));

        let data = "source_id,description,start,end,duration_seconds,reported_rate\n\
            a1,Work,,,lots,25\n";
        assert!(TestReport::from_csv(data).is_err());
    }

    #[tokio::test]
    async fn test_failing_report() {
        assert!(TestReport::failing().fetch().await.is_err());
    }
}
