use arz_ledger::args::{
    Args, Command, DeleteSubcommand, InsertSubcommand, ListSubcommand, UpdateSubcommand,
};
use arz_ledger::model::AccountId;
use arz_ledger::{commands, error_type, Config, Mode, Result};
use clap::Parser;
use std::path::Path;
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            match error_type(&e) {
                Some(t) => error!("Exiting with {t} error: {e:#}"),
                None => error!("Exiting with error: {e:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().arz_home().path();

    // When ARZ_IN_TEST_MODE is set and non-empty the seeded in-memory time report and the offline
    // summarizer are used instead of the network.
    let mode = Mode::from_env();

    let _: () = match args.command() {
        Command::Init(init_args) => commands::init(home, init_args.report_url())
            .await?
            .print(),

        Command::Sync => commands::sync(load(home, &args).await?, mode)
            .await?
            .print(),

        Command::Insert(insert_args) => {
            let config = load(home, &args).await?;
            match insert_args.entity() {
                InsertSubcommand::WorkLog(args) => {
                    commands::insert_work_log(config, args.clone())
                        .await?
                        .print()
                }
                InsertSubcommand::Payment(args) => commands::insert_payment(config, args.clone())
                    .await?
                    .print(),
            }
        }

        Command::Update(update_args) => {
            let config = load(home, &args).await?;
            match update_args.entity() {
                UpdateSubcommand::WorkLog(args) => {
                    commands::update_work_log(config, args.clone())
                        .await?
                        .print()
                }
                UpdateSubcommand::Payment(args) => commands::update_payment(config, args.clone())
                    .await?
                    .print(),
            }
        }

        Command::Delete(delete_args) => {
            let config = load(home, &args).await?;
            match delete_args.entity() {
                DeleteSubcommand::WorkLogs(args) => {
                    commands::delete_work_logs(config, args.clone())
                        .await?
                        .print()
                }
                DeleteSubcommand::Payments(args) => {
                    commands::delete_payments(config, args.clone())
                        .await?
                        .print()
                }
            }
        }

        Command::List(list_args) => {
            let config = load(home, &args).await?;
            match list_args.entity() {
                ListSubcommand::WorkLogs => commands::list_work_logs(config).await?.print(),
                ListSubcommand::Payments => commands::list_payments(config).await?.print(),
            }
        }

        Command::Totals(totals_args) => {
            commands::totals(load(home, &args).await?, mode, totals_args.clone())
                .await?
                .print()
        }

        Command::Summary(summary_args) => {
            commands::summary(load(home, &args).await?, mode, summary_args.clone())
                .await?
                .print()
        }

        Command::Mcp => commands::mcp(load(home, &args).await?, mode)
            .await?
            .print(),
    };
    Ok(())
}

/// Loads the config and switches to the `--account` if one was given.
async fn load(home: &Path, args: &Args) -> Result<Config> {
    let config = Config::load(home).await?;
    Ok(match args.common().account() {
        Some(account) => config.with_account(AccountId::new(account)?),
        None => config,
    })
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                level,
                env!("CARGO_BIN_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
