//! Configuration file handling for arz.
//!
//! The configuration file is stored at `$ARZ_HOME/config.json` and holds the account to use, the
//! URL of the shared time report, the fixed rate imported hours are billed at and the model used
//! for narrative summaries.

use crate::db::Db;
use crate::model::{AccountId, Amount};
use crate::{utils, Result};
use anyhow::{bail, Context};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_NAME: &str = "arz";
const CONFIG_VERSION: u8 = 1;
const CONFIG_JSON: &str = "config.json";
const ARZ_SQLITE: &str = "arz.sqlite";
const DEFAULT_ACCOUNT: &str = "default";
const DEFAULT_SUMMARY_MODEL: &str = "gemini-1.5-flash";
/// 8.12 per hour.
const DEFAULT_FIXED_RATE: Amount = Amount::new(Decimal::from_parts(812, 0, 0, false, 2));

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$ARZ_HOME` and from there it loads `$ARZ_HOME/config.json` and opens the SQLite
/// database that lives next to it.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    account: AccountId,
    db: Db,
    sqlite_path: PathBuf,
}

impl Config {
    /// Creates the data directory, an initial `config.json` file using `report_url` along with
    /// default settings, and an empty, fully migrated SQLite database.
    ///
    /// # Arguments
    /// - `dir` - The directory that will be the root of data directory, e.g. `$HOME/arz`
    /// - `report_url` - The URL of the shared time report to sync from. May be empty, in which case
    ///   `sync` is unavailable until it is set in `config.json`.
    ///
    /// # Errors
    /// - Returns an error if the URL is invalid, if a config file already exists, or if any file
    ///   operation fails.
    pub async fn create(dir: impl Into<PathBuf>, report_url: &str) -> Result<Self> {
        validate_report_url(report_url)?;

        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the arz home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let config_path = root.join(CONFIG_JSON);
        if config_path.exists() {
            bail!(
                "A config file already exists at '{}'",
                config_path.display()
            );
        }

        let config_file = ConfigFile {
            report_url: report_url.to_string(),
            ..ConfigFile::default()
        };
        config_file.save(&config_path).await?;

        let sqlite_path = root.join(ARZ_SQLITE);
        let db = Db::init(&sqlite_path)
            .await
            .context("Unable to create SQLite DB")?;

        let account = AccountId::new(&config_file.account_id)?;
        Ok(Self {
            root,
            config_path,
            config_file,
            account,
            db,
            sqlite_path,
        })
    }

    /// This will
    /// - validate that `arz_home` exists and that the config file exists
    /// - load and validate the config file
    /// - open the database, migrating its schema if it is out-of-date
    /// - return the loaded configuration object
    pub async fn load(arz_home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = arz_home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("The arz home directory is missing, run 'arz init' first")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;
        let account = AccountId::new(&config_file.account_id)
            .context("Invalid account_id in config file")?;

        let sqlite_path = root.join(ARZ_SQLITE);
        let db = Db::load(&sqlite_path)
            .await
            .context("Unable to load SQLite DB")?;

        Ok(Self {
            root,
            config_path,
            config_file,
            account,
            db,
            sqlite_path,
        })
    }

    /// Uses `account` instead of the one in `config.json`, e.g. from `--account`.
    pub fn with_account(mut self, account: AccountId) -> Self {
        self.account = account;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn sqlite_path(&self) -> &Path {
        &self.sqlite_path
    }

    pub(crate) fn db(&self) -> &Db {
        &self.db
    }

    pub fn account(&self) -> &AccountId {
        &self.account
    }

    pub fn report_url(&self) -> &str {
        &self.config_file.report_url
    }

    /// The rate every imported hour is billed at.
    pub fn fixed_rate(&self) -> Amount {
        self.config_file.fixed_rate
    }

    pub fn summary_model(&self) -> &str {
        &self.config_file.summary_model
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "arz",
///   "config_version": 1,
///   "account_id": "default",
///   "report_url": "https://reports.api.clockify.me/v1/shared-reports/683b262477d90d0d7d3a09ce",
///   "fixed_rate": "8.12",
///   "summary_model": "gemini-1.5-flash"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "arz"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// Whose records are read and written
    #[serde(default = "default_account")]
    account_id: String,

    /// URL of the shared time report. Empty when not set.
    #[serde(default)]
    report_url: String,

    /// The rate imported hours are billed at, in the earnings currency
    #[serde(default = "default_fixed_rate")]
    fixed_rate: Amount,

    /// The language model used for narrative summaries
    #[serde(default = "default_summary_model")]
    summary_model: String,
}

fn default_account() -> String {
    DEFAULT_ACCOUNT.to_string()
}

fn default_fixed_rate() -> Amount {
    DEFAULT_FIXED_RATE
}

fn default_summary_model() -> String {
    DEFAULT_SUMMARY_MODEL.to_string()
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            account_id: default_account(),
            report_url: String::new(),
            fixed_rate: DEFAULT_FIXED_RATE,
            summary_model: default_summary_model(),
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile asynchronously from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if a value is invalid
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = utils::read(path).await?;

        let config: ConfigFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        anyhow::ensure!(
            config.fixed_rate.is_positive(),
            "Invalid fixed_rate in config file: it must be positive, got '{}'",
            config.fixed_rate.plain()
        );
        validate_report_url(&config.report_url)
            .with_context(|| format!("Invalid report_url in config file {}", path.display()))?;

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }

    #[cfg(test)]
    /// Creates a new ConfigFile with the specified settings.
    pub fn new(account_id: &str, report_url: &str, fixed_rate: Amount) -> Self {
        Self {
            account_id: account_id.to_string(),
            report_url: report_url.to_string(),
            fixed_rate,
            ..Self::default()
        }
    }
}

/// An empty URL means "not configured". Anything else must be an absolute http(s) URL.
fn validate_report_url(report_url: &str) -> Result<()> {
    if report_url.is_empty() {
        return Ok(());
    }
    let url = url::Url::parse(report_url)
        .with_context(|| format!("'{report_url}' is not a valid URL"))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        bail!("The report URL must use http or https, got '{}'", url.scheme());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use tempfile::TempDir;

    const URL: &str = "https://reports.api.clockify.me/v1/shared-reports/abc123";

    #[tokio::test]
    async fn test_config_create_and_load() {
        let dir = TempDir::new().unwrap();
        let home_dir = dir.path().join("arz_home");

        let config = Config::create(&home_dir, URL).await.unwrap();
        assert_eq!(config.report_url(), URL);
        assert_eq!(config.account().as_str(), "default");
        assert_eq!(config.fixed_rate(), Amount::from_str("8.12").unwrap());
        assert!(config.config_path().is_file());
        assert!(config.sqlite_path().is_file());

        let loaded = Config::load(&home_dir).await.unwrap();
        assert_eq!(loaded.root(), config.root());
        assert_eq!(loaded.summary_model(), "gemini-1.5-flash");
    }

    #[tokio::test]
    async fn test_config_create_twice_fails() {
        let dir = TempDir::new().unwrap();
        Config::create(dir.path(), "").await.unwrap();
        assert!(Config::create(dir.path(), "").await.is_err());
    }

    #[tokio::test]
    async fn test_config_create_rejects_bad_url() {
        let dir = TempDir::new().unwrap();
        assert!(Config::create(dir.path().join("a"), "not a url").await.is_err());
        assert!(Config::create(dir.path().join("b"), "ftp://x.com/r").await.is_err());
    }

    #[tokio::test]
    async fn test_config_load_missing_home() {
        let dir = TempDir::new().unwrap();
        let e = Config::load(dir.path().join("nope")).await.unwrap_err();
        assert!(format!("{e:#}").contains("arz init"));
    }

    #[tokio::test]
    async fn test_with_account() {
        let dir = TempDir::new().unwrap();
        let config = Config::create(dir.path(), "")
            .await
            .unwrap()
            .with_account(AccountId::new("work").unwrap());
        assert_eq!(config.account().as_str(), "work");
    }

    #[test]
    fn test_default_fixed_rate() {
        assert_eq!(DEFAULT_FIXED_RATE.plain(), "8.12");
    }

    #[tokio::test]
    async fn test_config_file_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let original = ConfigFile::new("me", URL, Amount::from_str("10.5").unwrap());
        original.save(&config_path).await.unwrap();
        let loaded = ConfigFile::load(&config_path).await.unwrap();
        assert_eq!(original, loaded);
    }

    #[tokio::test]
    async fn test_config_file_load_with_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let json = r#"{
            "app_name": "arz",
            "config_version": 1
        }"#;
        utils::write(&config_path, json).await.unwrap();

        let config = ConfigFile::load(&config_path).await.unwrap();
        assert_eq!(config.account_id, "default");
        assert_eq!(config.report_url, "");
        assert_eq!(config.fixed_rate, DEFAULT_FIXED_RATE);
        assert_eq!(config.summary_model, DEFAULT_SUMMARY_MODEL);
    }

    #[tokio::test]
    async fn test_config_file_fixed_rate_as_number() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let json = r#"{"app_name": "arz", "config_version": 1, "fixed_rate": 9.5}"#;
        utils::write(&config_path, json).await.unwrap();
        let config = ConfigFile::load(&config_path).await.unwrap();
        assert_eq!(config.fixed_rate, Amount::from_str("9.5").unwrap());
    }

    #[tokio::test]
    async fn test_config_file_load_invalid_values() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        utils::write(&config_path, r#"{"app_name": "timesheet", "config_version": 1}"#)
            .await
            .unwrap();
        let e = ConfigFile::load(&config_path).await.unwrap_err();
        assert!(e.to_string().contains("Invalid app_name"));

        utils::write(
            &config_path,
            r#"{"app_name": "arz", "config_version": 1, "fixed_rate": "0"}"#,
        )
        .await
        .unwrap();
        let e = ConfigFile::load(&config_path).await.unwrap_err();
        assert!(e.to_string().contains("Invalid fixed_rate"));

        utils::write(
            &config_path,
            r#"{"app_name": "arz", "config_version": 1, "report_url": "::"}"#,
        )
        .await
        .unwrap();
        let e = ConfigFile::load(&config_path).await.unwrap_err();
        assert!(e.to_string().contains("Invalid report_url"));
    }
}
