use crate::commands::{load_ledger, plural, Out};
use crate::db::RecordStore;
use crate::error::{ErrorType, IntoResult};
use crate::model::{Payment, WorkLog};
use crate::{Config, Result};
use std::fmt::Write;

/// Lists the imported work logs, latest start first, followed by the manual work logs, newest
/// first.
///
/// The message is a readable table of the work logs. The structure holds the work logs in the
/// same order.
pub async fn list_work_logs(config: Config) -> Result<Out<Vec<WorkLog>>> {
    let ledger = load_ledger(&config).await.pub_result(ErrorType::Database)?;
    let logs: Vec<WorkLog> = ledger.work_logs().cloned().collect();

    let mut message = format!(
        "{} ({} imported, {} manual)",
        plural(logs.len(), "work log", "work logs"),
        ledger.imported_work_logs().len(),
        ledger.manual_work_logs().len()
    );
    for log in &logs {
        let _ = write!(
            message,
            "\n  {} | {} | {} h @ {} | {}",
            log.id().unwrap_or_default(),
            log.start()
                .map(|start| start.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string()),
            log.hours(),
            log.rate(),
            log.description(),
        );
    }
    Ok(Out::new(message, logs))
}

/// Lists the payments, newest first.
pub async fn list_payments(config: Config) -> Result<Out<Vec<Payment>>> {
    let payments = config
        .db()
        .list_payments(config.account())
        .await
        .pub_result(ErrorType::Database)?;

    let mut message = plural(payments.len(), "payment", "payments");
    for payment in &payments {
        let _ = write!(
            message,
            "\n  {} | {} | {} @ {}",
            payment.id().unwrap_or_default(),
            payment.date().format("%Y-%m-%d"),
            payment.amount(),
            payment.exchange_rate(),
        );
        if let Some(description) = payment.description() {
            let _ = write!(message, " | {description}");
        }
    }
    Ok(Out::new(message, payments))
}
