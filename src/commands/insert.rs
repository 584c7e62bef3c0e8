//! Insert command handlers.

use crate::args::{InsertPaymentArgs, InsertWorkLogArgs};
use crate::commands::Out;
use crate::db::RecordStore;
use crate::error::{ErrorType, IntoResult};
use crate::model::{Payment, WorkLog};
use crate::{Config, Result};
use chrono::Utc;

/// Validates and saves a new manual work log.
///
/// A unique id is generated with a `user-` prefix to distinguish it from imported work logs. When
/// no rate is given the `fixed_rate` from `config.json` is used.
///
/// # Returns
///
/// On success, returns an `Out` containing a message with the new id and the saved work log.
///
/// # Errors
///
/// - Returns a validation error listing every invalid field. Nothing is saved in that case.
/// - Returns an error if a database operation fails.
pub async fn insert_work_log(config: Config, args: InsertWorkLogArgs) -> Result<Out<WorkLog>> {
    let rate = args.rate.unwrap_or_else(|| config.fixed_rate());
    let log = WorkLog::manual(args.description, args.hours, rate).with_times(args.start, args.end);
    log.validate().pub_result(ErrorType::Validation)?;

    let saved = config
        .db()
        .create_work_log(config.account(), &log)
        .await
        .pub_result(ErrorType::Database)?;

    let message = format!(
        "Inserted work log with ID: {}",
        saved.id().unwrap_or_default()
    );
    Ok(Out::new(message, saved))
}

/// Validates and saves a new payment. The exchange rate is stored with the payment and is never
/// recomputed. When no date is given the current time is used.
///
/// # Returns
///
/// On success, returns an `Out` containing a message with the new id and the saved payment.
///
/// # Errors
///
/// - Returns a validation error listing every invalid field. Nothing is saved in that case.
/// - Returns an error if a database operation fails.
pub async fn insert_payment(config: Config, args: InsertPaymentArgs) -> Result<Out<Payment>> {
    let payment = Payment::new(
        args.amount,
        args.exchange_rate,
        args.date.unwrap_or_else(Utc::now),
    )
    .with_description(args.description);
    payment.validate().pub_result(ErrorType::Validation)?;

    let saved = config
        .db()
        .create_payment(config.account(), &payment)
        .await
        .pub_result(ErrorType::Database)?;

    let message = format!(
        "Inserted payment with ID: {}",
        saved.id().unwrap_or_default()
    );
    Ok(Out::new(message, saved))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::error_type;
    use crate::model::Amount;
    use crate::test::TestEnv;
    use crate::utils;
    use std::str::FromStr;

    fn amt(s: &str) -> Amount {
        Amount::from_str(s).unwrap()
    }

    fn work_log_args(hours: &str, rate: Option<&str>) -> InsertWorkLogArgs {
        InsertWorkLogArgs {
            description: "Feature work".to_string(),
            hours: amt(hours),
            rate: rate.map(amt),
            start: None,
            end: None,
        }
    }

    #[tokio::test]
    async fn test_insert_work_log() {
        let env = TestEnv::new().await;
        let out = insert_work_log(env.config(), work_log_args("2.5", Some("10")))
            .await
            .unwrap();
        let saved = out.structure().unwrap();
        let id = saved.id().unwrap();
        assert!(id.starts_with("user-"));
        assert!(out.message().contains(id));
        assert_eq!(saved.rate(), amt("10"));
        assert_eq!(env.work_logs().await, vec![saved.clone()]);
    }

    #[tokio::test]
    async fn test_insert_work_log_defaults_to_fixed_rate() {
        let env = TestEnv::new().await;
        let out = insert_work_log(env.config(), work_log_args("1", None))
            .await
            .unwrap();
        assert_eq!(out.structure().unwrap().rate(), amt("8.12"));
    }

    #[tokio::test]
    async fn test_insert_invalid_work_log_is_not_saved() {
        let env = TestEnv::new().await;
        let mut args = work_log_args("0", Some("-1"));
        args.description = String::new();
        args.start = Some(utils::parse_timestamp("2025-06-01T10:00").unwrap());
        args.end = Some(utils::parse_timestamp("2025-06-01T09:00").unwrap());

        let e = insert_work_log(env.config(), args).await.unwrap_err();
        assert_eq!(error_type(&e), Some(ErrorType::Validation));
        let message = e.to_string();
        for field in ["description", "hours", "rate", "end"] {
            assert!(message.contains(field), "{message} should mention {field}");
        }
        assert!(env.work_logs().await.is_empty());
    }

    #[tokio::test]
    async fn test_insert_payment() {
        let env = TestEnv::new().await;
        let args = InsertPaymentArgs {
            amount: amt("400,000"),
            exchange_rate: amt("50,000"),
            date: Some(utils::parse_timestamp("2025-05-01").unwrap()),
            description: Some("May".to_string()),
        };
        let out = insert_payment(env.config(), args).await.unwrap();
        let saved = out.structure().unwrap();
        assert!(saved.id().unwrap().starts_with("user-"));
        assert_eq!(saved.in_earnings_currency(), Some(8.into()));
        assert_eq!(env.payments().await, vec![saved.clone()]);
    }

    #[tokio::test]
    async fn test_insert_payment_with_zero_rate_is_rejected() {
        let env = TestEnv::new().await;
        let args = InsertPaymentArgs {
            amount: amt("400000"),
            exchange_rate: Amount::ZERO,
            date: None,
            description: None,
        };
        let e = insert_payment(env.config(), args).await.unwrap_err();
        assert_eq!(error_type(&e), Some(ErrorType::Validation));
        assert!(e.to_string().contains("exchange_rate"));
        assert!(env.payments().await.is_empty());
    }
}
