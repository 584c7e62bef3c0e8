//! Versioned schema migrations.
//!
//! Each version `NN` has a `migration_NN_up.sql` that brings the schema from `NN-1` to `NN` and a
//! `migration_NN_down.sql` that reverses it. The applied version is kept in the `schema_version`
//! table.

use anyhow::{bail, Context};
use sqlx::{Executor, SqlitePool};
use tracing::{debug, info};

use crate::Result;

struct Migration {
    version: i32,
    up_sql: &'static str,
    down_sql: &'static str,
}

/// Ordered by version, without gaps.
const MIGRATIONS: &[Migration] = &[
    // work_logs and payments, with the original local-currency column name
    Migration {
        version: 1,
        up_sql: include_str!("migration_01_up.sql"),
        down_sql: include_str!("migration_01_down.sql"),
    },
    // payments.amount_irr -> payments.amount
    Migration {
        version: 2,
        up_sql: include_str!("migration_02_up.sql"),
        down_sql: include_str!("migration_02_down.sql"),
    },
    // imported_work_logs
    Migration {
        version: 3,
        up_sql: include_str!("migration_03_up.sql"),
        down_sql: include_str!("migration_03_down.sql"),
    },
];

/// The schema version this build of the program expects.
pub(crate) const CURRENT_VERSION: i32 = MIGRATIONS.len() as i32;

/// One SQL script to execute and the version the schema is at once it has run.
struct Step {
    sql: &'static str,
    version_after: i32,
    label: String,
}

/// Migrates the schema from version `from` to version `to`, up or down. Every step runs in its own
/// transaction together with the `schema_version` update, so an interrupted run leaves the schema
/// at the last completed version.
///
/// Nothing is executed unless every migration between the two versions is available.
pub(crate) async fn run(pool: &SqlitePool, from: i32, to: i32) -> Result<()> {
    let steps = plan(from, to)?;
    if steps.is_empty() {
        debug!("Schema already at version {to}");
        return Ok(());
    }
    for step in &steps {
        debug!("Running {}", step.label);
        apply(pool, step).await.with_context(|| format!("{} failed", step.label))?;
    }
    info!("Migrated the database schema from version {from} to {to}");
    Ok(())
}

/// Lists the steps needed to go from `from` to `to`, failing if any migration is missing.
fn plan(from: i32, to: i32) -> Result<Vec<Step>> {
    let find = |version: i32| -> Result<&'static Migration> {
        match MIGRATIONS.iter().find(|m| m.version == version) {
            Some(m) => Ok(m),
            None => bail!(
                "Migration {version} is missing but required to migrate from version {from} to {to}"
            ),
        }
    };

    let mut steps = Vec::new();
    if from < to {
        for version in (from + 1)..=to {
            steps.push(Step {
                sql: find(version)?.up_sql,
                version_after: version,
                label: format!("migration {version:02} (up)"),
            });
        }
    } else {
        for version in ((to + 1)..=from).rev() {
            steps.push(Step {
                sql: find(version)?.down_sql,
                version_after: version - 1,
                label: format!("migration {version:02} (down)"),
            });
        }
    }
    Ok(steps)
}

async fn apply(pool: &SqlitePool, step: &Step) -> Result<()> {
    let mut tx = pool.begin().await?;
    // May hold several statements.
    tx.execute(step.sql).await?;
    sqlx::query("DELETE FROM schema_version")
        .execute(&mut *tx)
        .await?;
    sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
        .bind(step.version_after)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(())
}
