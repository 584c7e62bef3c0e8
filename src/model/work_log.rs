use crate::model::validation::ValidationErrors;
use crate::model::Amount;
use crate::utils;
use chrono::{DateTime, Utc};
use clap::Parser;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Where a work log came from.
#[derive(
    Debug, Default, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// Entered by the user. May be edited and deleted.
    #[default]
    Manual,
    /// Derived from the external time report. Replaced wholesale on every sync and never edited.
    Imported,
}

serde_plain::derive_display_from_serialize!(Origin);
serde_plain::derive_fromstr_from_deserialize!(Origin);

/// A block of hours worked at an hourly rate denominated in the earnings currency.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WorkLog {
    /// Assigned by the store on creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    description: String,
    hours: Amount,
    rate: Amount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    start: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    end: Option<DateTime<Utc>>,
    #[serde(default)]
    origin: Origin,
}

impl WorkLog {
    /// A new, unsaved, manually entered work log.
    pub fn manual(description: impl Into<String>, hours: Amount, rate: Amount) -> Self {
        Self {
            id: None,
            description: description.into(),
            hours,
            rate,
            start: None,
            end: None,
            origin: Origin::Manual,
        }
    }

    /// A work log derived from the external time report.
    pub(crate) fn imported(
        id: impl Into<String>,
        description: impl Into<String>,
        hours: Amount,
        rate: Amount,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: Some(id.into()),
            description: description.into(),
            hours,
            rate,
            start,
            end,
            origin: Origin::Imported,
        }
    }

    pub fn with_times(mut self, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub(crate) fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn hours(&self) -> Amount {
        self.hours
    }

    pub fn rate(&self) -> Amount {
        self.rate
    }

    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.start
    }

    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.end
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// Only manually entered rows may be edited or deleted.
    pub fn is_editable(&self) -> bool {
        self.origin == Origin::Manual
    }

    /// `hours × rate`, or `None` on overflow.
    pub fn earnings(&self) -> Option<Decimal> {
        self.hours.value().checked_mul(self.rate.value())
    }

    /// Checks the rules a work log must satisfy before it is written.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.description.trim().is_empty() {
            errors.push("description", "is required");
        }
        if !self.hours.is_positive() {
            errors.push("hours", "must be a positive number");
        }
        if !self.rate.is_positive() {
            errors.push("rate", "must be a positive number");
        }
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if end < start {
                errors.push("end", "must not be before start");
            }
        }
        errors.into_result()
    }

    /// Overwrites every field that is set in `updates`.
    pub fn apply(&mut self, updates: WorkLogUpdates) {
        if let Some(description) = updates.description {
            self.description = description;
        }
        if let Some(hours) = updates.hours {
            self.hours = hours;
        }
        if let Some(rate) = updates.rate {
            self.rate = rate;
        }
        if updates.start.is_some() {
            self.start = updates.start;
        }
        if updates.end.is_some() {
            self.end = updates.end;
        }
    }
}

/// The fields to change on a manual work log. Only set values will be changed, unset values will
/// not be changed.
#[derive(Debug, Default, Clone, Parser, Serialize, Deserialize, JsonSchema)]
pub struct WorkLogUpdates {
    /// A label for the work that was done.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    pub description: Option<String>,

    /// Hours worked. Must be positive.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long, value_parser = utils::parse_amount)]
    pub hours: Option<Amount>,

    /// Earnings per hour in the earnings currency. Must be positive.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long, value_parser = utils::parse_amount)]
    pub rate: Option<Amount>,

    /// When the work started, e.g. 2025-06-01T09:00 or an RFC 3339 timestamp.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::utils::deserialize_timestamp"
    )]
    #[schemars(with = "Option<String>")]
    #[arg(long, value_parser = utils::parse_timestamp)]
    pub start: Option<DateTime<Utc>>,

    /// When the work ended. Must not be before `start`.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::utils::deserialize_timestamp"
    )]
    #[schemars(with = "Option<String>")]
    #[arg(long, value_parser = utils::parse_timestamp)]
    pub end: Option<DateTime<Utc>>,
}

impl WorkLogUpdates {
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.hours.is_none()
            && self.rate.is_none()
            && self.start.is_none()
            && self.end.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn amt(s: &str) -> Amount {
        Amount::from_str(s).unwrap()
    }

    #[test]
    fn test_manual_work_log_is_valid_and_editable() {
        let log = WorkLog::manual("API work", amt("2.5"), amt("8.12"));
        assert!(log.validate().is_ok());
        assert!(log.is_editable());
        assert_eq!(log.origin(), Origin::Manual);
        assert_eq!(log.id(), None);
    }

    #[test]
    fn test_imported_work_log_is_not_editable() {
        let log = WorkLog::imported("clockify-1", "Sync", amt("1"), amt("8.12"), None, None);
        assert!(!log.is_editable());
        assert_eq!(log.id(), Some("clockify-1"));
    }

    #[test]
    fn test_validate_collects_every_field() {
        let log = WorkLog::manual("  ", amt("0"), amt("-1"));
        let errors = log.validate().unwrap_err();
        assert!(errors.has("description"));
        assert!(errors.has("hours"));
        assert!(errors.has("rate"));
        assert_eq!(errors.errors().len(), 3);
    }

    #[test]
    fn test_validate_end_before_start() {
        let start = utils::parse_timestamp("2025-06-01T10:00").unwrap();
        let end = utils::parse_timestamp("2025-06-01T09:00").unwrap();
        let log = WorkLog::manual("x", amt("1"), amt("1")).with_times(Some(start), Some(end));
        let errors = log.validate().unwrap_err();
        assert!(errors.has("end"));
    }

    #[test]
    fn test_earnings() {
        let log = WorkLog::manual("x", amt("10"), amt("8"));
        assert_eq!(log.earnings(), Some(Decimal::from(80)));
    }

    #[test]
    fn test_apply_only_changes_set_fields() {
        let mut log = WorkLog::manual("before", amt("1"), amt("8.12"));
        log.apply(WorkLogUpdates {
            hours: Some(amt("3")),
            ..Default::default()
        });
        assert_eq!(log.description(), "before");
        assert_eq!(log.hours(), amt("3"));
        assert_eq!(log.rate(), amt("8.12"));
    }

    #[test]
    fn test_origin_display() {
        assert_eq!(Origin::Imported.to_string(), "imported");
        assert_eq!(Origin::from_str("manual").unwrap(), Origin::Manual);
    }
}
