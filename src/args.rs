//! These structs provide the CLI interface for the arz CLI. The argument structs of the data
//! commands double as the parameters of the MCP tools.

use crate::model::{Amount, PaymentUpdates, WorkLogUpdates};
use crate::utils;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// arz: A command-line ledger for hours worked and payments received in another currency.
///
/// Log the hours you work at an hourly rate in the currency you earn in, record each payment you
/// receive in your local currency together with the exchange rate on the day it was paid, and see
/// how much you are still owed. Hours can also be imported from a shared Clockify report.
///
/// There is also a mode in which an AI agent, like Claude or Claude Code, can use this program
/// through the mcp subcommand.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory, the configuration file and the database.
    ///
    /// This is the first command you should run. By default the data directory is $HOME/arz, pass
    /// --arz-home to put it somewhere else. If you want to import hours from Clockify, pass the
    /// URL of a shared report as --report-url.
    Init(InitArgs),
    /// Download the shared time report and replace the imported work logs with its entries.
    Sync,
    /// Add a work log or a payment.
    Insert(InsertArgs),
    /// Change fields of a manually entered work log or of a payment.
    Update(UpdateArgs),
    /// Delete manually entered work logs or payments.
    Delete(DeleteArgs),
    /// Show work logs or payments.
    List(ListArgs),
    /// Show total hours, earnings, payments and the outstanding balance.
    Totals(TotalsArgs),
    /// Show the totals along with a short narrative summary written by a language model.
    Summary(SummaryArgs),
    /// Run as an MCP server over stdio for use by an AI agent.
    Mcp,
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where arz data and configuration is held. Defaults to ~/arz
    #[arg(long, env = "ARZ_HOME", default_value_t = default_arz_home())]
    arz_home: DisplayPath,

    /// The account whose records are read and written. Defaults to the account_id in config.json
    #[arg(long, env = "ARZ_ACCOUNT")]
    account: Option<String>,
}

impl Common {
    pub fn new(log_level: LevelFilter, arz_home: PathBuf, account: Option<String>) -> Self {
        Self {
            log_level,
            arz_home: arz_home.into(),
            account,
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn arz_home(&self) -> &DisplayPath {
        &self.arz_home
    }

    pub fn account(&self) -> Option<&str> {
        self.account.as_deref()
    }
}

/// (Not shown): Args for the `arz init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The URL of a shared Clockify report to import hours from, e.g.
    /// https://reports.api.clockify.me/v1/shared-reports/683b262477d90d0d7d3a09ce
    #[arg(long)]
    report_url: Option<String>,
}

impl InitArgs {
    pub fn new(report_url: Option<String>) -> Self {
        Self { report_url }
    }

    pub fn report_url(&self) -> &str {
        self.report_url.as_deref().unwrap_or_default()
    }
}

/// (Not shown): Args for the `arz insert` command.
#[derive(Debug, Parser, Clone)]
pub struct InsertArgs {
    #[command(subcommand)]
    entity: InsertSubcommand,
}

impl InsertArgs {
    pub fn entity(&self) -> &InsertSubcommand {
        &self.entity
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum InsertSubcommand {
    /// Add a block of hours worked.
    WorkLog(InsertWorkLogArgs),
    /// Add a payment received in the local currency.
    Payment(InsertPaymentArgs),
}

/// A new work log.
#[derive(Debug, Clone, Parser, Serialize, Deserialize, JsonSchema)]
pub struct InsertWorkLogArgs {
    /// A label for the work that was done.
    #[arg(long)]
    pub description: String,

    /// Hours worked. Must be positive.
    #[arg(long, value_parser = utils::parse_amount)]
    pub hours: Amount,

    /// Earnings per hour in the earnings currency. Must be positive. Defaults to the fixed_rate in
    /// config.json.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[arg(long, value_parser = utils::parse_amount)]
    pub rate: Option<Amount>,

    /// When the work started, e.g. 2025-06-01T09:00 or an RFC 3339 timestamp.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::utils::deserialize_timestamp"
    )]
    #[schemars(with = "Option<String>")]
    #[arg(long, value_parser = utils::parse_timestamp)]
    pub start: Option<DateTime<Utc>>,

    /// When the work ended. Must not be before `start`.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::utils::deserialize_timestamp"
    )]
    #[schemars(with = "Option<String>")]
    #[arg(long, value_parser = utils::parse_timestamp)]
    pub end: Option<DateTime<Utc>>,
}

/// A new payment.
#[derive(Debug, Clone, Parser, Serialize, Deserialize, JsonSchema)]
pub struct InsertPaymentArgs {
    /// Amount received in the local currency. Must be positive.
    #[arg(long, value_parser = utils::parse_amount)]
    pub amount: Amount,

    /// Units of local currency per one unit of earnings currency on the day of the payment. Must
    /// be positive. It is stored with the payment and never recomputed.
    #[arg(long, value_parser = utils::parse_amount)]
    pub exchange_rate: Amount,

    /// When the payment was received, e.g. 2025-06-01. Defaults to now.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::utils::deserialize_timestamp"
    )]
    #[schemars(with = "Option<String>")]
    #[arg(long, value_parser = utils::parse_timestamp)]
    pub date: Option<DateTime<Utc>>,

    /// A note about the payment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    pub description: Option<String>,
}

/// (Not shown): Args for the `arz update` command.
#[derive(Debug, Parser, Clone)]
pub struct UpdateArgs {
    #[command(subcommand)]
    entity: UpdateSubcommand,
}

impl UpdateArgs {
    pub fn entity(&self) -> &UpdateSubcommand {
        &self.entity
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum UpdateSubcommand {
    /// Change a manually entered work log. Imported work logs cannot be changed.
    WorkLog(UpdateWorkLogArgs),
    /// Change a payment.
    Payment(UpdatePaymentArgs),
}

/// The id of a work log and the fields to change.
#[derive(Debug, Clone, Parser, Serialize, Deserialize, JsonSchema)]
pub struct UpdateWorkLogArgs {
    /// The id of the work log to change.
    pub id: String,

    #[command(flatten)]
    #[serde(flatten)]
    pub updates: WorkLogUpdates,
}

impl UpdateWorkLogArgs {
    pub fn new(id: impl Into<String>, updates: WorkLogUpdates) -> Self {
        Self {
            id: id.into(),
            updates,
        }
    }
}

/// The id of a payment and the fields to change.
#[derive(Debug, Clone, Parser, Serialize, Deserialize, JsonSchema)]
pub struct UpdatePaymentArgs {
    /// The id of the payment to change.
    pub id: String,

    #[command(flatten)]
    #[serde(flatten)]
    pub updates: PaymentUpdates,
}

impl UpdatePaymentArgs {
    pub fn new(id: impl Into<String>, updates: PaymentUpdates) -> Self {
        Self {
            id: id.into(),
            updates,
        }
    }
}

/// (Not shown): Args for the `arz delete` command.
#[derive(Debug, Parser, Clone)]
pub struct DeleteArgs {
    #[command(subcommand)]
    entity: DeleteSubcommand,
}

impl DeleteArgs {
    pub fn entity(&self) -> &DeleteSubcommand {
        &self.entity
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum DeleteSubcommand {
    /// Delete manually entered work logs by id. Imported work logs cannot be deleted.
    WorkLogs(DeleteIdsArgs),
    /// Delete payments by id.
    Payments(DeleteIdsArgs),
}

/// The ids of the records to delete.
#[derive(Debug, Clone, Parser, Serialize, Deserialize, JsonSchema)]
pub struct DeleteIdsArgs {
    /// One or more ids.
    #[arg(required = true)]
    pub ids: Vec<String>,
}

impl DeleteIdsArgs {
    pub fn new<S: Into<String>>(ids: impl IntoIterator<Item = S>) -> Self {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }
}

/// (Not shown): Args for the `arz list` command.
#[derive(Debug, Parser, Clone)]
pub struct ListArgs {
    #[command(subcommand)]
    entity: ListSubcommand,
}

impl ListArgs {
    pub fn entity(&self) -> ListSubcommand {
        self.entity
    }
}

#[derive(Subcommand, Debug, Clone, Copy, Eq, PartialEq)]
pub enum ListSubcommand {
    /// List imported work logs, latest first, followed by manual work logs, newest first.
    WorkLogs,
    /// List payments, newest first.
    Payments,
}

/// Args for the `arz totals` command.
#[derive(Debug, Default, Clone, Parser, Serialize, Deserialize, JsonSchema)]
pub struct TotalsArgs {
    /// Today's exchange rate, in local currency per unit of earnings currency. It is only used to
    /// restate the outstanding balance in local currency. Leave it out, or pass 0, to skip that.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[arg(long, value_parser = utils::parse_amount)]
    pub exchange_rate: Option<Amount>,

    /// Sync from the time report first. If the sync fails the stored work logs are used.
    #[serde(default)]
    #[arg(long)]
    pub sync: bool,
}

/// Args for the `arz summary` command.
#[derive(Debug, Default, Clone, Parser, Serialize, Deserialize, JsonSchema)]
pub struct SummaryArgs {
    /// Today's exchange rate, in local currency per unit of earnings currency.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[arg(long, value_parser = utils::parse_amount)]
    pub exchange_rate: Option<Amount>,
}

fn default_arz_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("arz"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --arz-home or ARZ_HOME instead of relying on the default arz \
                home directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from("arz")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("arz").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_insert_payment_args() {
        let args = parse(&[
            "--arz-home",
            "/tmp/arz",
            "insert",
            "payment",
            "--amount",
            "400,000",
            "--exchange-rate",
            "50000",
            "--date",
            "2025-05-01",
        ]);
        assert_eq!(args.common().arz_home().path(), Path::new("/tmp/arz"));
        let Command::Insert(insert) = args.command() else {
            panic!("expected insert");
        };
        let InsertSubcommand::Payment(payment) = insert.entity() else {
            panic!("expected payment");
        };
        assert_eq!(payment.amount.plain(), "400000");
        assert_eq!(payment.exchange_rate.plain(), "50000");
        assert!(payment.date.is_some());
        assert!(payment.description.is_none());
    }

    #[test]
    fn test_constructed_args_match_parsed_args() {
        let parsed = parse(&[
            "--log-level",
            "debug",
            "--arz-home",
            "/tmp/arz",
            "--account",
            "me",
            "init",
        ]);
        let built = Args::new(
            Common::new(
                LevelFilter::DEBUG,
                PathBuf::from("/tmp/arz"),
                Some("me".to_string()),
            ),
            Command::Init(InitArgs::new(None)),
        );
        for args in [&parsed, &built] {
            assert_eq!(args.common().log_level(), LevelFilter::DEBUG);
            assert_eq!(args.common().arz_home().path(), Path::new("/tmp/arz"));
            assert_eq!(args.common().account(), Some("me"));
            let Command::Init(init) = args.command() else {
                panic!("expected init");
            };
            assert_eq!(init.report_url(), "");
        }

        let url = "https://reports.api.clockify.me/v1/shared-reports/abc";
        assert_eq!(InitArgs::new(Some(url.to_string())).report_url(), url);
    }

    #[test]
    fn test_display_path() {
        let path = DisplayPath::new(PathBuf::from("/tmp/arz home"));
        assert_eq!(path.to_string(), "/tmp/arz home");
        assert_eq!(path, DisplayPath::from_str("/tmp/arz home").unwrap());
        assert_eq!(path.join("config.json"), Path::new("/tmp/arz home/config.json"));
    }

    #[test]
    fn test_update_work_log_args() {
        let args = parse(&["update", "work-log", "user-abc", "--hours", "2.5"]);
        let Command::Update(update) = args.command() else {
            panic!("expected update");
        };
        let UpdateSubcommand::WorkLog(log) = update.entity() else {
            panic!("expected work log");
        };
        assert_eq!(log.id, "user-abc");
        assert_eq!(log.updates.hours.map(|h| h.plain()), Some("2.5".to_string()));
        assert!(log.updates.rate.is_none());
    }

    #[test]
    fn test_delete_requires_ids() {
        assert!(Args::try_parse_from(["arz", "delete", "payments"]).is_err());
        let args = parse(&["delete", "payments", "a", "b"]);
        let Command::Delete(delete) = args.command() else {
            panic!("expected delete");
        };
        let DeleteSubcommand::Payments(ids) = delete.entity() else {
            panic!("expected payments");
        };
        assert_eq!(ids.ids, vec!["a", "b"]);
    }

    #[test]
    fn test_bad_number_is_rejected() {
        assert!(Args::try_parse_from(["arz", "totals", "--exchange-rate", "lots"]).is_err());
    }

    #[test]
    fn test_update_args_json_is_flat() {
        let json = serde_json::json!({"id": "user-1", "hours": 3, "description": "Review"});
        let args: UpdateWorkLogArgs = serde_json::from_value(json).unwrap();
        assert_eq!(args.id, "user-1");
        assert_eq!(args.updates.hours.map(|h| h.plain()), Some("3".to_string()));
        assert_eq!(args.updates.description.as_deref(), Some("Review"));
    }

    #[test]
    fn test_totals_args_defaults() {
        let args: TotalsArgs = serde_json::from_str("{}").unwrap();
        assert!(!args.sync);
        assert!(args.exchange_rate.is_none());
    }
}
