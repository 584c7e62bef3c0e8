//! This module is responsible for reading, writing and managing the SQLite database.
//!
//! Every query is scoped to an `AccountId`. Decimals are stored as TEXT so that no precision is
//! lost, and timestamps as RFC 3339 TEXT in UTC with a fixed width so that they sort correctly.

mod migrations;

use crate::model::{AccountId, Amount, Payment, WorkLog};
use crate::{utils, Result};
use anyhow::{bail, Context};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// Persists work logs and payments for an account.
#[async_trait]
pub(crate) trait RecordStore: Send + Sync {
    /// Saves a new manual work log and returns it with its assigned id.
    async fn create_work_log(&self, account: &AccountId, log: &WorkLog) -> Result<WorkLog>;

    /// Manual work logs, newest created first.
    async fn list_work_logs(&self, account: &AccountId) -> Result<Vec<WorkLog>>;

    async fn get_work_log(&self, account: &AccountId, id: &str) -> Result<Option<WorkLog>>;

    /// Replaces the stored work log that has the same id. Fails if the id is missing or unknown.
    async fn update_work_log(&self, account: &AccountId, log: &WorkLog) -> Result<()>;

    async fn delete_work_log(&self, account: &AccountId, id: &str) -> Result<()>;

    /// Saves a new payment and returns it with its assigned id.
    async fn create_payment(&self, account: &AccountId, payment: &Payment) -> Result<Payment>;

    /// Payments, newest created first.
    async fn list_payments(&self, account: &AccountId) -> Result<Vec<Payment>>;

    async fn get_payment(&self, account: &AccountId, id: &str) -> Result<Option<Payment>>;

    /// Replaces the stored payment that has the same id. Fails if the id is missing or unknown.
    async fn update_payment(&self, account: &AccountId, payment: &Payment) -> Result<()>;

    async fn delete_payment(&self, account: &AccountId, id: &str) -> Result<()>;

    /// Atomically swaps the account's imported work logs for `logs`.
    async fn replace_imported_work_logs(&self, account: &AccountId, logs: &[WorkLog])
        -> Result<()>;

    /// Imported work logs, latest start first.
    async fn list_imported_work_logs(&self, account: &AccountId) -> Result<Vec<WorkLog>>;
}

#[derive(Debug, Clone)]
pub(crate) struct Db {
    pool: SqlitePool,
}

impl Db {
    /// - Validates that no file currently exists at `path`
    /// - Creates a new SQLite file at `path`
    /// - Initializes the database schema
    /// - Returns a constructed `Db` object for further operations
    pub(crate) async fn init(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            bail!("A database already exists at '{}'", path.display());
        }
        let pool = connect(path, true).await?;

        sqlx::query("CREATE TABLE schema_version (version INTEGER NOT NULL)")
            .execute(&pool)
            .await
            .context("Failed to create schema_version table")?;
        sqlx::query("INSERT INTO schema_version (version) VALUES (0)")
            .execute(&pool)
            .await
            .context("Failed to insert initial schema version")?;

        migrations::run(&pool, 0, migrations::CURRENT_VERSION).await?;
        Ok(Self { pool })
    }

    /// - Validates that there is a SQLite file at `path`
    /// - Creates a SQLite client
    /// - Updates the database schema with migrations if it is out-of-date
    /// - Returns a constructed `Db` object for further operations
    pub(crate) async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            bail!("The database file is missing '{}'", path.display());
        }
        let pool = connect(path, false).await?;

        let row: (Option<i32>,) = sqlx::query_as("SELECT MAX(version) FROM schema_version")
            .fetch_one(&pool)
            .await
            .context("Failed to read the schema version")?;
        let version = row.0.unwrap_or_default();
        if version > migrations::CURRENT_VERSION {
            bail!(
                "The database schema version {version} is newer than this program supports ({})",
                migrations::CURRENT_VERSION
            );
        }
        migrations::run(&pool, version, migrations::CURRENT_VERSION).await?;
        Ok(Self { pool })
    }

    /// Returns an error naming the imported row if `id` belongs to one.
    pub(crate) async fn refuse_imported(
        &self,
        account: &AccountId,
        id: &str,
        action: &str,
    ) -> Result<()> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM imported_work_logs WHERE account_id = ? AND id = ?",
        )
        .bind(account.as_str())
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to look up imported work logs")?;
        if row.0 > 0 {
            bail!(
                "Work log '{id}' was imported from the time report and cannot be {action}, it is \
                replaced on every sync"
            );
        }
        Ok(())
    }
}

async fn connect(path: &Path, create: bool) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(create);
    debug!("Opening SQLite database at {}", path.display());
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open SQLite database at {}", path.display()))
}

#[async_trait]
impl RecordStore for Db {
    async fn create_work_log(&self, account: &AccountId, log: &WorkLog) -> Result<WorkLog> {
        if !log.is_editable() {
            bail!("Imported work logs can only be written by a sync");
        }
        let id = utils::generate_id();
        sqlx::query(
            "INSERT INTO work_logs \
            (id, account_id, description, hours, rate, start_time, end_time, created_at) \
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(account.as_str())
        .bind(log.description())
        .bind(log.hours().plain())
        .bind(log.rate().plain())
        .bind(log.start().map(timestamp))
        .bind(log.end().map(timestamp))
        .bind(timestamp(Utc::now()))
        .execute(&self.pool)
        .await
        .context("Failed to insert work log")?;
        debug!("Inserted work log {id} for account {account}");
        Ok(log.clone().with_id(id))
    }

    async fn list_work_logs(&self, account: &AccountId) -> Result<Vec<WorkLog>> {
        let rows = sqlx::query(
            "SELECT id, description, hours, rate, start_time, end_time FROM work_logs \
            WHERE account_id = ? ORDER BY created_at DESC, rowid DESC",
        )
        .bind(account.as_str())
        .fetch_all(&self.pool)
        .await
        .context("Failed to query work logs")?;
        rows.iter().map(|row| work_log_from_row(row, false)).collect()
    }

    async fn get_work_log(&self, account: &AccountId, id: &str) -> Result<Option<WorkLog>> {
        let row = sqlx::query(
            "SELECT id, description, hours, rate, start_time, end_time FROM work_logs \
            WHERE account_id = ? AND id = ?",
        )
        .bind(account.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to query work log")?;
        row.map(|row| work_log_from_row(&row, false)).transpose()
    }

    async fn update_work_log(&self, account: &AccountId, log: &WorkLog) -> Result<()> {
        let id = log.id().context("Cannot update a work log that has no id")?;
        if !log.is_editable() {
            self.refuse_imported(account, id, "edited").await?;
            bail!("Imported work logs can only be written by a sync");
        }
        let result = sqlx::query(
            "UPDATE work_logs SET description = ?, hours = ?, rate = ?, start_time = ?, \
            end_time = ? WHERE account_id = ? AND id = ?",
        )
        .bind(log.description())
        .bind(log.hours().plain())
        .bind(log.rate().plain())
        .bind(log.start().map(timestamp))
        .bind(log.end().map(timestamp))
        .bind(account.as_str())
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to update work log")?;
        if result.rows_affected() == 0 {
            self.refuse_imported(account, id, "edited").await?;
            bail!("Work log not found: {id}");
        }
        Ok(())
    }

    async fn delete_work_log(&self, account: &AccountId, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM work_logs WHERE account_id = ? AND id = ?")
            .bind(account.as_str())
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete work log")?;
        if result.rows_affected() == 0 {
            self.refuse_imported(account, id, "deleted").await?;
            bail!("Work log not found: {id}");
        }
        Ok(())
    }

    async fn create_payment(&self, account: &AccountId, payment: &Payment) -> Result<Payment> {
        let id = utils::generate_id();
        sqlx::query(
            "INSERT INTO payments \
            (id, account_id, amount, exchange_rate, date, description, created_at) \
            VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(account.as_str())
        .bind(payment.amount().plain())
        .bind(payment.exchange_rate().plain())
        .bind(timestamp(payment.date()))
        .bind(payment.description())
        .bind(timestamp(Utc::now()))
        .execute(&self.pool)
        .await
        .context("Failed to insert payment")?;
        debug!("Inserted payment {id} for account {account}");
        Ok(payment.clone().with_id(id))
    }

    async fn list_payments(&self, account: &AccountId) -> Result<Vec<Payment>> {
        let rows = sqlx::query(
            "SELECT id, amount, exchange_rate, date, description FROM payments \
            WHERE account_id = ? ORDER BY created_at DESC, rowid DESC",
        )
        .bind(account.as_str())
        .fetch_all(&self.pool)
        .await
        .context("Failed to query payments")?;
        rows.iter().map(payment_from_row).collect()
    }

    async fn get_payment(&self, account: &AccountId, id: &str) -> Result<Option<Payment>> {
        let row = sqlx::query(
            "SELECT id, amount, exchange_rate, date, description FROM payments \
            WHERE account_id = ? AND id = ?",
        )
        .bind(account.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to query payment")?;
        row.as_ref().map(payment_from_row).transpose()
    }

    async fn update_payment(&self, account: &AccountId, payment: &Payment) -> Result<()> {
        let id = payment
            .id()
            .context("Cannot update a payment that has no id")?;
        let result = sqlx::query(
            "UPDATE payments SET amount = ?, exchange_rate = ?, date = ?, description = ? \
            WHERE account_id = ? AND id = ?",
        )
        .bind(payment.amount().plain())
        .bind(payment.exchange_rate().plain())
        .bind(timestamp(payment.date()))
        .bind(payment.description())
        .bind(account.as_str())
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to update payment")?;
        if result.rows_affected() == 0 {
            bail!("Payment not found: {id}");
        }
        Ok(())
    }

    async fn delete_payment(&self, account: &AccountId, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM payments WHERE account_id = ? AND id = ?")
            .bind(account.as_str())
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete payment")?;
        if result.rows_affected() == 0 {
            bail!("Payment not found: {id}");
        }
        Ok(())
    }

    async fn replace_imported_work_logs(
        &self,
        account: &AccountId,
        logs: &[WorkLog],
    ) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        sqlx::query("DELETE FROM imported_work_logs WHERE account_id = ?")
            .bind(account.as_str())
            .execute(&mut *tx)
            .await
            .context("Failed to clear imported work logs")?;

        for log in logs {
            let id = log
                .id()
                .context("An imported work log is missing its source id")?;
            sqlx::query(
                "INSERT OR REPLACE INTO imported_work_logs \
                (id, account_id, description, hours, rate, start_time, end_time) \
                VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(id)
            .bind(account.as_str())
            .bind(log.description())
            .bind(log.hours().plain())
            .bind(log.rate().plain())
            .bind(log.start().map(timestamp))
            .bind(log.end().map(timestamp))
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to insert imported work log {id}"))?;
        }

        tx.commit().await.context("Failed to commit transaction")?;
        debug!(
            "Replaced imported work logs for account {account} with {} rows",
            logs.len()
        );
        Ok(())
    }

    async fn list_imported_work_logs(&self, account: &AccountId) -> Result<Vec<WorkLog>> {
        let rows = sqlx::query(
            "SELECT id, description, hours, rate, start_time, end_time FROM imported_work_logs \
            WHERE account_id = ? ORDER BY start_time IS NULL, start_time DESC, id",
        )
        .bind(account.as_str())
        .fetch_all(&self.pool)
        .await
        .context("Failed to query imported work logs")?;
        rows.iter().map(|row| work_log_from_row(row, true)).collect()
    }
}

/// Formats a timestamp the way it is stored: UTC, nanosecond precision, `Z` suffix.
fn timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp_column(row: &SqliteRow, column: &str) -> Result<Option<DateTime<Utc>>> {
    let value: Option<String> = row.try_get(column)?;
    value
        .map(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&Utc))
                .with_context(|| format!("Invalid timestamp '{s}' in column {column}"))
        })
        .transpose()
}

fn parse_amount_column(row: &SqliteRow, column: &str) -> Result<Amount> {
    let value: String = row.try_get(column)?;
    Amount::from_str(&value).with_context(|| format!("Invalid number '{value}' in column {column}"))
}

fn work_log_from_row(row: &SqliteRow, imported: bool) -> Result<WorkLog> {
    let id: String = row.try_get("id")?;
    let description: String = row.try_get("description")?;
    let hours = parse_amount_column(row, "hours")?;
    let rate = parse_amount_column(row, "rate")?;
    let start = parse_timestamp_column(row, "start_time")?;
    let end = parse_timestamp_column(row, "end_time")?;
    Ok(if imported {
        WorkLog::imported(id, description, hours, rate, start, end)
    } else {
        WorkLog::manual(description, hours, rate)
            .with_times(start, end)
            .with_id(id)
    })
}

fn payment_from_row(row: &SqliteRow) -> Result<Payment> {
    let id: String = row.try_get("id")?;
    let amount = parse_amount_column(row, "amount")?;
    let exchange_rate = parse_amount_column(row, "exchange_rate")?;
    let date = parse_timestamp_column(row, "date")?
        .with_context(|| format!("Payment {id} has no date"))?;
    let description: Option<String> = row.try_get("description")?;
    Ok(Payment::new(amount, exchange_rate, date)
        .with_description(description)
        .with_id(id))
}
