//! Types that represent the core data model, such as `WorkLog` and `Payment`.
mod amount;
mod payment;
mod validation;
mod work_log;

pub use amount::{Amount, AmountError};
pub use payment::{Payment, PaymentUpdates};
pub use validation::{FieldError, ValidationErrors};
pub use work_log::{Origin, WorkLog, WorkLogUpdates};

use anyhow::ensure;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Identifies whose records are being read or written. Every store call takes one explicitly.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> crate::Result<Self> {
        let id = id.into();
        ensure!(!id.trim().is_empty(), "An account id cannot be empty");
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for AccountId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything stored for one account: the entries the aggregator reduces.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Ledger {
    /// Work logs entered by hand, newest first.
    pub(crate) manual_work_logs: Vec<WorkLog>,
    /// Work logs derived from the time report, latest start first.
    pub(crate) imported_work_logs: Vec<WorkLog>,
    /// Payments, newest first.
    pub(crate) payments: Vec<Payment>,
}

impl Ledger {
    pub fn manual_work_logs(&self) -> &[WorkLog] {
        &self.manual_work_logs
    }

    pub fn imported_work_logs(&self) -> &[WorkLog] {
        &self.imported_work_logs
    }

    pub fn payments(&self) -> &[Payment] {
        &self.payments
    }

    /// Imported rows followed by manual rows, the order in which they are listed.
    pub fn work_logs(&self) -> impl Iterator<Item = &WorkLog> {
        self.imported_work_logs
            .iter()
            .chain(self.manual_work_logs.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_id_cannot_be_empty() {
        assert!(AccountId::new("").is_err());
        assert!(AccountId::new("   ").is_err());
        assert_eq!(AccountId::new("me").unwrap().as_str(), "me");
    }
}
