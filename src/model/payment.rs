use crate::model::validation::ValidationErrors;
use crate::model::Amount;
use crate::utils;
use chrono::{DateTime, Utc};
use clap::Parser;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A payment received in the local currency. The exchange rate is the historical rate at the time
/// the payment was made and is never recomputed.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Payment {
    /// Assigned by the store on creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    /// Amount received in the local currency.
    amount: Amount,
    /// Units of local currency per one unit of earnings currency at payment time.
    exchange_rate: Amount,
    date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl Payment {
    /// A new, unsaved payment.
    pub fn new(amount: Amount, exchange_rate: Amount, date: DateTime<Utc>) -> Self {
        Self {
            id: None,
            amount,
            exchange_rate,
            date,
            description: None,
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description.filter(|d| !d.trim().is_empty());
        self
    }

    pub(crate) fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn exchange_rate(&self) -> Amount {
        self.exchange_rate
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The payment converted to the earnings currency at its own historical rate. `None` when the
    /// stored rate is zero, which validation never lets through but old data might contain.
    pub fn in_earnings_currency(&self) -> Option<Decimal> {
        self.amount.value().checked_div(self.exchange_rate.value())
    }

    /// Checks the rules a payment must satisfy before it is written.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if !self.amount.is_positive() {
            errors.push("amount", "must be a positive number");
        }
        if !self.exchange_rate.is_positive() {
            errors.push("exchange_rate", "must be a positive number");
        }
        errors.into_result()
    }

    /// Overwrites every field that is set in `updates`.
    pub fn apply(&mut self, updates: PaymentUpdates) {
        if let Some(amount) = updates.amount {
            self.amount = amount;
        }
        if let Some(exchange_rate) = updates.exchange_rate {
            self.exchange_rate = exchange_rate;
        }
        if let Some(date) = updates.date {
            self.date = date;
        }
        if updates.description.is_some() {
            self.description = updates.description.filter(|d| !d.trim().is_empty());
        }
    }
}

/// The fields to change on a payment. Only set values will be changed, unset values will not be
/// changed.
#[derive(Debug, Default, Clone, Parser, Serialize, Deserialize, JsonSchema)]
pub struct PaymentUpdates {
    /// Amount received in the local currency. Must be positive.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long, value_parser = utils::parse_amount)]
    pub amount: Option<Amount>,

    /// Local currency per one unit of earnings currency on the payment date. Must be positive.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long, value_parser = utils::parse_amount)]
    pub exchange_rate: Option<Amount>,

    /// When the payment was received, e.g. 2025-06-01 or an RFC 3339 timestamp.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::utils::deserialize_timestamp"
    )]
    #[schemars(with = "Option<String>")]
    #[arg(long, value_parser = utils::parse_timestamp)]
    pub date: Option<DateTime<Utc>>,

    /// A note about the payment. An empty string clears it.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    pub description: Option<String>,
}

impl PaymentUpdates {
    pub fn is_empty(&self) -> bool {
        self.amount.is_none()
            && self.exchange_rate.is_none()
            && self.date.is_none()
            && self.description.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn amt(s: &str) -> Amount {
        Amount::from_str(s).unwrap()
    }

    fn date() -> DateTime<Utc> {
        utils::parse_timestamp("2025-06-01").unwrap()
    }

    #[test]
    fn test_converts_at_historical_rate() {
        let payment = Payment::new(amt("400,000"), amt("50,000"), date());
        assert_eq!(payment.in_earnings_currency(), Some(Decimal::from(8)));
    }

    #[test]
    fn test_zero_rate_does_not_convert() {
        let payment = Payment::new(amt("400000"), amt("0"), date());
        assert_eq!(payment.in_earnings_currency(), None);
    }

    #[test]
    fn test_validate() {
        assert!(Payment::new(amt("1"), amt("1"), date()).validate().is_ok());
        let errors = Payment::new(amt("0"), amt("-5"), date())
            .validate()
            .unwrap_err();
        assert!(errors.has("amount"));
        assert!(errors.has("exchange_rate"));
    }

    #[test]
    fn test_blank_description_is_none() {
        let payment = Payment::new(amt("1"), amt("1"), date()).with_description(Some(" ".into()));
        assert_eq!(payment.description(), None);
    }

    #[test]
    fn test_apply() {
        let mut payment = Payment::new(amt("100"), amt("50000"), date())
            .with_description(Some("June".to_string()));
        payment.apply(PaymentUpdates {
            amount: Some(amt("200")),
            description: Some(String::new()),
            ..Default::default()
        });
        assert_eq!(payment.amount(), amt("200"));
        assert_eq!(payment.exchange_rate(), amt("50000"));
        assert_eq!(payment.description(), None);
    }
}
