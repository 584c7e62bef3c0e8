use crate::api::{Mode, TimeReport};
use crate::commands::{plural, Out};
use crate::db::RecordStore;
use crate::error::{ErrorType, IntoResult};
use crate::import;
use crate::model::WorkLog;
use crate::{Config, Result};
use anyhow::Context;
use tracing::{debug, info};

/// Downloads the time report, normalizes its entries and replaces the imported work logs of the
/// account with them.
///
/// If the report cannot be fetched or parsed an error is returned and the previously imported
/// work logs are left in the database unchanged.
///
/// # Returns
///
/// On success, returns an `Out` containing a message with the number of imported work logs and
/// the imported work logs, latest start first.
pub async fn sync(config: Config, mode: Mode) -> Result<Out<Vec<WorkLog>>> {
    let mut report = crate::api::time_report(&config, mode).pub_result(ErrorType::Config)?;
    sync_from(&config, report.as_mut()).await
}

pub(super) async fn sync_from(
    config: &Config,
    report: &mut dyn TimeReport,
) -> Result<Out<Vec<WorkLog>>> {
    let raw = report
        .fetch()
        .await
        .context("Unable to fetch the time report, imported work logs were not changed")
        .pub_result(ErrorType::Report)?;
    debug!("Fetched {} time report entries", raw.len());

    let logs = import::normalize_all(&raw, config.fixed_rate());
    config
        .db()
        .replace_imported_work_logs(config.account(), &logs)
        .await
        .pub_result(ErrorType::Database)?;

    let message = format!(
        "Imported {} from the time report",
        plural(logs.len(), "work log", "work logs")
    );
    info!("{message}");
    Ok(Out::new(message, logs))
}
