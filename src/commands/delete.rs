//! Delete command handlers.

use crate::args::DeleteIdsArgs;
use crate::commands::{plural, Out};
use crate::db::RecordStore;
use crate::error::{ErrorType, IntoResult};
use crate::{Config, Result};
use anyhow::{ensure, Context};
use tracing::debug;

/// Deletes manual work logs by id.
///
/// The ids are deleted one after the other. Deletion stops at the first id that fails, the ids
/// before it stay deleted and the error names the failing id. Imported work logs cannot be
/// deleted, they are replaced on every sync.
///
/// # Returns
///
/// On success, returns an `Out` containing a message and the deleted ids.
pub async fn delete_work_logs(config: Config, args: DeleteIdsArgs) -> Result<Out<Vec<String>>> {
    ensure_some(&args).pub_result(ErrorType::Validation)?;
    let db = config.db();
    for (i, id) in args.ids.iter().enumerate() {
        db.delete_work_log(config.account(), id)
            .await
            .with_context(|| deleted_before(i))
            .pub_result(ErrorType::Database)?;
        debug!("Deleted work log {id}");
    }
    let message = format!(
        "Deleted {}",
        plural(args.ids.len(), "work log", "work logs")
    );
    Ok(Out::new(message, args.ids))
}

/// Deletes payments by id. Deletion stops at the first id that fails, the ids before it stay
/// deleted.
///
/// # Returns
///
/// On success, returns an `Out` containing a message and the deleted ids.
pub async fn delete_payments(config: Config, args: DeleteIdsArgs) -> Result<Out<Vec<String>>> {
    ensure_some(&args).pub_result(ErrorType::Validation)?;
    let db = config.db();
    for (i, id) in args.ids.iter().enumerate() {
        db.delete_payment(config.account(), id)
            .await
            .with_context(|| deleted_before(i))
            .pub_result(ErrorType::Database)?;
        debug!("Deleted payment {id}");
    }
    let message = format!("Deleted {}", plural(args.ids.len(), "payment", "payments"));
    Ok(Out::new(message, args.ids))
}

fn ensure_some(args: &DeleteIdsArgs) -> Result<()> {
    ensure!(!args.ids.is_empty(), "At least one id is required");
    Ok(())
}

fn deleted_before(count: usize) -> String {
    format!(
        "Delete failed after {} had been deleted",
        plural(count, "record", "records")
    )
}
