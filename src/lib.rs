//! arz: a ledger for hours worked in one currency and payments received in another.
//!
//! Work logs are recorded at an hourly rate in the earnings currency, either entered by hand or
//! imported from a shared Clockify report. Payments are recorded in the local currency together
//! with the exchange rate on the day they were made. The ledger reduces both to totals and an
//! outstanding balance.

mod api;
pub mod args;
pub mod commands;
mod config;
mod db;
mod error;
mod import;
mod mcp;
pub mod model;
mod totals;
mod utils;


pub use api::{Mode, Summary, FALLBACK_SUMMARY, TEST_MODE_ENV};
pub use config::Config;
pub use error::{error_type, Error, ErrorType, Result};
pub use totals::Totals;
