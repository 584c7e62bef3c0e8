//! An offline `Summarizer` that fills a fixed template.
//!
//! Note: this is compiled even in the "production" version of this app so that the whole app can
//! run without a language model.

use crate::api::{Summarizer, Summary};
use crate::totals::Totals;
use crate::Result;

pub(crate) struct TemplateSummarizer;

#[async_trait::async_trait]
impl Summarizer for TemplateSummarizer {
    async fn summarize(&self, totals: &Totals) -> Result<Summary> {
        let standing = if totals.balance_earnings_currency.is_negative() {
            "You have been paid more than you have earned"
        } else if totals.balance_earnings_currency.is_zero() {
            "You are fully paid"
        } else {
            "You are still owed money"
        };
        Ok(Summary::new(format!(
            "You worked {} hours and earned {}. You received {} in local currency, worth {} at the \
            rates on each payment date. {standing}: the balance is {} ({} in local currency at the \
            current rate).",
            totals.total_hours,
            totals.total_earnings,
            totals.total_payments_local,
            totals.total_payments_earnings_currency,
            totals.balance_earnings_currency,
            totals.balance_local,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Amount;
    use std::str::FromStr;

    #[tokio::test]
    async fn test_template() {
        let totals = Totals {
            total_hours: Amount::from_str("10").unwrap(),
            total_earnings: Amount::from_str("80").unwrap(),
            balance_earnings_currency: Amount::from_str("-8").unwrap(),
            ..Default::default()
        };
        let summary = TemplateSummarizer.summarize(&totals).await.unwrap().summary;
        assert!(summary.starts_with("You worked 10.00 hours and earned 80.00."));
        assert!(summary.contains("paid more than you have earned: the balance is -8.00"));
    }
}
