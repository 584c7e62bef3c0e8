use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the data directory and:
/// - Creates an initial `config.json` file using `report_url` along with default settings
/// - Creates the SQLite database and brings its schema up to date
///
/// # Arguments
/// - `arz_home` - The directory that will be the root of data directory, e.g. `$HOME/arz`
/// - `report_url` - The URL of a shared Clockify report, or an empty string if hours will only be
///   entered by hand.
///
/// # Errors
/// - Returns an error if the URL is invalid, if the directory was already initialized, or if any
///   file operations fail.
pub async fn init(arz_home: &Path, report_url: &str) -> Result<Out<()>> {
    let config = Config::create(arz_home, report_url)
        .await
        .context("Unable to create the data directory and configs")
        .pub_result(ErrorType::Config)?;
    Ok(format!(
        "Successfully created the arz directory and config at {}",
        config.root().display()
    )
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::error_type;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("arz");
        let out = init(&home, "https://example.com/report").await.unwrap();
        assert!(out.message().contains("Successfully created"));
        let config = Config::load(&home).await.unwrap();
        assert_eq!(config.report_url(), "https://example.com/report");
    }

    #[tokio::test]
    async fn test_init_twice_is_a_config_error() {
        let dir = TempDir::new().unwrap();
        init(dir.path(), "").await.unwrap();
        let e = init(dir.path(), "").await.unwrap_err();
        assert_eq!(error_type(&e), Some(ErrorType::Config));
    }
}
