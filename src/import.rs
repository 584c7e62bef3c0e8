//! Turns raw time report entries into work logs.
//!
//! The report's own rate is ignored. Every imported hour is billed at the fixed rate from
//! `config.json`.

use crate::model::{Amount, WorkLog};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

const NO_DESCRIPTION: &str = "No description";
const SECONDS_PER_HOUR: u32 = 3600;
const IMPORTED_ID_PREFIX: &str = "clockify-";

/// One entry as supplied by a time report source, before normalization.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) struct RawTimeEntry {
    pub(crate) source_id: String,
    pub(crate) description: String,
    pub(crate) start: Option<DateTime<Utc>>,
    pub(crate) end: Option<DateTime<Utc>>,
    /// Missing durations count as zero.
    pub(crate) duration_seconds: Option<u64>,
    /// Whatever rate the source reported. Not used.
    pub(crate) reported_rate: Option<Amount>,
}

/// Maps one raw entry to an imported work log billed at `fixed_rate`.
pub(crate) fn normalize(raw: &RawTimeEntry, fixed_rate: Amount) -> WorkLog {
    let seconds = Decimal::from(raw.duration_seconds.unwrap_or_default());
    let hours = seconds / Decimal::from(SECONDS_PER_HOUR);
    let description = if raw.description.trim().is_empty() {
        NO_DESCRIPTION
    } else {
        raw.description.as_str()
    };
    WorkLog::imported(
        format!("{IMPORTED_ID_PREFIX}{}", raw.source_id),
        description,
        hours.into(),
        fixed_rate,
        raw.start,
        raw.end,
    )
}

/// Normalizes every entry and sorts the result by start time, latest first. Entries without a
/// start time go last.
pub(crate) fn normalize_all(raw: &[RawTimeEntry], fixed_rate: Amount) -> Vec<WorkLog> {
    let mut logs: Vec<WorkLog> = raw.iter().map(|r| normalize(r, fixed_rate)).collect();
    logs.sort_by(|a, b| latest_first(a.start(), b.start()));
    logs
}

fn latest_first(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Origin;
    use crate::utils;
    use std::str::FromStr;

    fn fixed() -> Amount {
        Amount::from_str("8.12").unwrap()
    }

    fn raw(id: &str, start: Option<&str>, seconds: Option<u64>) -> RawTimeEntry {
        RawTimeEntry {
            source_id: id.to_string(),
            description: format!("task {id}"),
            start: start.map(|s| utils::parse_timestamp(s).unwrap()),
            end: None,
            duration_seconds: seconds,
            reported_rate: Some(Amount::from_str("25").unwrap()),
        }
    }

    #[test]
    fn test_one_hour_at_fixed_rate() {
        let log = normalize(&raw("abc", None, Some(3600)), fixed());
        assert_eq!(log.hours().value(), Decimal::ONE);
        assert_eq!(log.rate(), fixed());
        assert_eq!(log.id(), Some("clockify-abc"));
        assert_eq!(log.origin(), Origin::Imported);
    }

    #[test]
    fn test_partial_hours() {
        let log = normalize(&raw("a", None, Some(5400)), fixed());
        assert_eq!(log.hours().value(), Decimal::from_str("1.5").unwrap());
    }

    #[test]
    fn test_missing_duration_is_zero_hours() {
        let log = normalize(&raw("a", None, None), fixed());
        assert!(log.hours().is_zero());
    }

    #[test]
    fn test_blank_description() {
        let mut entry = raw("a", None, Some(60));
        entry.description = "  ".to_string();
        assert_eq!(normalize(&entry, fixed()).description(), "No description");
    }

    #[test]
    fn test_sorted_latest_first_missing_last() {
        let entries = vec![
            raw("old", Some("2025-05-01T08:00"), Some(60)),
            raw("none", None, Some(60)),
            raw("new", Some("2025-06-01T08:00"), Some(60)),
        ];
        let logs = normalize_all(&entries, fixed());
        let ids: Vec<_> = logs.iter().filter_map(|l| l.id()).collect();
        assert_eq!(ids, vec!["clockify-new", "clockify-old", "clockify-none"]);
    }
}
