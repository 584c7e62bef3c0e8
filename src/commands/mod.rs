//! Command handlers for the arz CLI.
//!
//! This module contains implementations for all CLI subcommands. The MCP server calls the same
//! functions.

mod delete;
mod init;
mod insert;
mod list;
mod mcp;
mod sync;
mod totals;
mod update;

use crate::db::RecordStore;
use crate::model::Ledger;
use crate::{Config, Result};
use serde::Serialize;
use std::fmt::Debug;
use tracing::{debug, info};

pub use delete::{delete_payments, delete_work_logs};
pub use init::init;
pub use insert::{insert_payment, insert_work_log};
pub use list::{list_payments, list_work_logs};
pub use mcp::mcp;
pub use sync::sync;
pub use totals::{summary, totals, SummaryOutput};
pub use update::{update_payment, update_work_log};

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data to both the command line and MCP server interfaces.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    /// Get the `message`.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the structured data stored in `structure`.
    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!` and the structured data (if it exists) as JSON to `debug!`.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}

/// Reads everything stored for the configured account.
async fn load_ledger(config: &Config) -> Result<Ledger> {
    let db = config.db();
    let account = config.account();
    Ok(Ledger {
        manual_work_logs: db.list_work_logs(account).await?,
        imported_work_logs: db.list_imported_work_logs(account).await?,
        payments: db.list_payments(account).await?,
    })
}

fn plural(count: usize, singular: &str, plural: &str) -> String {
    format!("{count} {}", if count == 1 { singular } else { plural })
}
