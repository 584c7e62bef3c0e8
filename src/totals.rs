//! The ledger aggregator: reduces work logs and payments to totals and a balance.
//!
//! Past payments are always converted at the exchange rate stored with each payment. The live
//! rate is only used to restate the outstanding balance, which has no historical rate of its own.

use crate::model::{Amount, Payment, WorkLog};
use crate::Result;
use anyhow::{anyhow, bail};
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Summary figures for one account.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct Totals {
    /// Σ hours.
    pub total_hours: Amount,
    /// Σ hours × rate, in the earnings currency.
    pub total_earnings: Amount,
    /// Σ payment amounts, in the local currency.
    pub total_payments_local: Amount,
    /// Σ amount / historical exchange rate, in the earnings currency.
    pub total_payments_earnings_currency: Amount,
    /// Earnings not yet paid, in the earnings currency. Negative when overpaid.
    pub balance_earnings_currency: Amount,
    /// The balance restated at the live exchange rate, or zero when no live rate is set.
    pub balance_local: Amount,
}

impl Totals {
    /// Computes the totals.
    ///
    /// `current_exchange_rate` is the live rate; zero means unset. The function is pure. It only
    /// fails on data that validation would have rejected: a payment with a zero exchange rate or
    /// values so large that the arithmetic overflows.
    pub fn compute<'a>(
        work_logs: impl IntoIterator<Item = &'a WorkLog>,
        payments: impl IntoIterator<Item = &'a Payment>,
        current_exchange_rate: Amount,
    ) -> Result<Self> {
        let mut total_hours = Decimal::ZERO;
        let mut total_earnings = Decimal::ZERO;
        for log in work_logs {
            total_hours = add(total_hours, log.hours().value())?;
            let earnings = log.earnings().ok_or_else(overflow)?;
            total_earnings = add(total_earnings, earnings)?;
        }

        let mut total_payments_local = Decimal::ZERO;
        let mut total_payments_earnings_currency = Decimal::ZERO;
        for payment in payments {
            total_payments_local = add(total_payments_local, payment.amount().value())?;
            let converted = match payment.in_earnings_currency() {
                Some(value) => value,
                None if payment.exchange_rate().is_zero() => bail!(
                    "Payment '{}' has an exchange rate of zero and cannot be converted",
                    payment.id().unwrap_or("<unsaved>")
                ),
                None => return Err(overflow()),
            };
            total_payments_earnings_currency = add(total_payments_earnings_currency, converted)?;
        }

        let balance_earnings_currency = total_earnings
            .checked_sub(total_payments_earnings_currency)
            .ok_or_else(overflow)?;

        let balance_local = if current_exchange_rate.is_positive() {
            balance_earnings_currency
                .checked_mul(current_exchange_rate.value())
                .ok_or_else(overflow)?
        } else {
            Decimal::ZERO
        };

        Ok(Self {
            total_hours: total_hours.into(),
            total_earnings: total_earnings.into(),
            total_payments_local: total_payments_local.into(),
            total_payments_earnings_currency: total_payments_earnings_currency.into(),
            balance_earnings_currency: balance_earnings_currency.into(),
            balance_local: balance_local.into(),
        })
    }
}

fn add(a: Decimal, b: Decimal) -> Result<Decimal> {
    a.checked_add(b).ok_or_else(overflow)
}

fn overflow() -> anyhow::Error {
    anyhow!("The ledger totals are too large to compute")
}
