//! Update command handlers.

use crate::args::{UpdatePaymentArgs, UpdateWorkLogArgs};
use crate::commands::Out;
use crate::db::RecordStore;
use crate::error::{ErrorType, IntoResult};
use crate::model::{Payment, WorkLog};
use crate::{Config, Result};
use anyhow::anyhow;

/// Changes the fields given in `args.updates` on a manual work log, leaving the other fields as
/// they are. The merged work log is validated before it is written.
///
/// # Errors
///
/// - Returns a validation error if no fields are given or if the merged work log is invalid.
/// - Returns an error if the id is unknown, belongs to an imported work log, or if a database
///   operation fails.
pub async fn update_work_log(config: Config, args: UpdateWorkLogArgs) -> Result<Out<WorkLog>> {
    if args.updates.is_empty() {
        return Err(anyhow!("Nothing to update for work log '{}'", args.id))
            .pub_result(ErrorType::Validation);
    }
    let db = config.db();
    let account = config.account();

    let Some(mut log) = db
        .get_work_log(account, &args.id)
        .await
        .pub_result(ErrorType::Database)?
    else {
        db.refuse_imported(account, &args.id, "edited")
            .await
            .pub_result(ErrorType::Validation)?;
        return Err(anyhow!("Work log not found: {}", args.id)).pub_result(ErrorType::Database);
    };

    log.apply(args.updates);
    log.validate().pub_result(ErrorType::Validation)?;
    db.update_work_log(account, &log)
        .await
        .pub_result(ErrorType::Database)?;

    Ok(Out::new(format!("Updated work log {}", args.id), log))
}

/// Changes the fields given in `args.updates` on a payment, leaving the other fields as they are.
/// The merged payment is validated before it is written.
///
/// # Errors
///
/// - Returns a validation error if no fields are given or if the merged payment is invalid.
/// - Returns an error if the id is unknown or if a database operation fails.
pub async fn update_payment(config: Config, args: UpdatePaymentArgs) -> Result<Out<Payment>> {
    if args.updates.is_empty() {
        return Err(anyhow!("Nothing to update for payment '{}'", args.id))
            .pub_result(ErrorType::Validation);
    }
    let db = config.db();
    let account = config.account();

    let mut payment = db
        .get_payment(account, &args.id)
        .await
        .pub_result(ErrorType::Database)?
        .ok_or_else(|| anyhow!("Payment not found: {}", args.id))
        .pub_result(ErrorType::Database)?;

    payment.apply(args.updates);
    payment.validate().pub_result(ErrorType::Validation)?;
    db.update_payment(account, &payment)
        .await
        .pub_result(ErrorType::Database)?;

    Ok(Out::new(format!("Updated payment {}", args.id), payment))
}
