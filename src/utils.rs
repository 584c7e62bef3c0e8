use crate::model::Amount;
use crate::Result;
use anyhow::Context;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Write a file.
pub(crate) async fn write(path: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> Result<()> {
    let path = path.as_ref();
    tokio::fs::write(path, contents)
        .await
        .context(format!("Unable to write to {}", path.to_string_lossy()))
}

/// Read a file to a `String`.
pub(crate) async fn read(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read file at {}", path.display()))
}

/// Create a directory and its parents if they do not exist.
pub(crate) async fn make_dir(path: &Path) -> Result<()> {
    tokio::fs::create_dir_all(path)
        .await
        .with_context(|| format!("Unable to create directory {}", path.display()))
}

/// Resolve `path` to an absolute path. The path must exist.
pub(crate) async fn canonicalize(path: &Path) -> Result<PathBuf> {
    tokio::fs::canonicalize(path)
        .await
        .with_context(|| format!("Unable to resolve the path {}", path.display()))
}

/// Generates an id for a manually created record, e.g. `user-3f2b9c...`. The prefix tells manual
/// rows apart from imported ones, which are prefixed with `clockify-`.
pub(crate) fn generate_id() -> String {
    format!("user-{}", uuid::Uuid::new_v4().simple())
}

/// Parses a CLI value into an `Amount`. Used as a clap `value_parser`.
pub fn parse_amount(s: &str) -> std::result::Result<Amount, String> {
    Amount::from_str(s).map_err(|e| format!("'{s}' is not a valid number: {e}"))
}

/// Parses a timestamp. Accepts RFC 3339 (`2025-06-01T09:30:00+03:30`), a local-less date-time
/// (`2025-06-01T09:30` or `2025-06-01 09:30:00`, read as UTC) or a bare date (`2025-06-01`,
/// midnight UTC). Used as a clap `value_parser`.
pub fn parse_timestamp(s: &str) -> std::result::Result<DateTime<Utc>, String> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }
    Err(format!(
        "'{s}' is not a valid timestamp, expected e.g. 2025-06-01, 2025-06-01T09:30 or RFC 3339"
    ))
}

/// Deserializes an optional timestamp with `parse_timestamp`, so JSON arguments accept the same
/// formats as the command line.
pub(crate) fn deserialize_timestamp<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<String> = serde::Deserialize::deserialize(deserializer)?;
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse_timestamp(s).map(Some).map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_generate_id() {
        let a = generate_id();
        let b = generate_id();
        assert!(a.starts_with("user-"));
        assert_eq!(a.len(), "user-".len() + 32);
        assert_ne!(a, b);
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("400,000").unwrap().plain(), "400000");
        let e = parse_amount("lots").unwrap_err();
        assert!(e.contains("lots"));
    }

    #[test]
    fn test_parse_timestamp_rfc3339() {
        let dt = parse_timestamp("2025-06-01T09:30:00+03:30").unwrap();
        assert_eq!(dt.hour(), 6);
        assert_eq!(dt.minute(), 0);
    }

    #[test]
    fn test_parse_timestamp_zulu() {
        let dt = parse_timestamp("2025-06-01T09:30:00Z").unwrap();
        assert_eq!(dt.hour(), 9);
    }

    #[test]
    fn test_parse_timestamp_naive() {
        let dt = parse_timestamp("2025-06-01T09:30").unwrap();
        assert_eq!((dt.day(), dt.hour(), dt.minute()), (1, 9, 30));
        let dt = parse_timestamp("2025-06-01 09:30:15").unwrap();
        assert_eq!(dt.second(), 15);
    }

    #[test]
    fn test_parse_timestamp_date() {
        let dt = parse_timestamp("2025-06-01").unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day(), dt.hour()), (2025, 6, 1, 0));
    }

    #[test]
    fn test_deserialize_timestamp() {
        #[derive(serde::Deserialize)]
        struct Args {
            #[serde(default, deserialize_with = "deserialize_timestamp")]
            date: Option<DateTime<Utc>>,
        }
        let args: Args = serde_json::from_str(r#"{"date": "2025-06-10"}"#).unwrap();
        assert_eq!(args.date.unwrap().day(), 10);
        let args: Args = serde_json::from_str("{}").unwrap();
        assert!(args.date.is_none());
        assert!(serde_json::from_str::<Args>(r#"{"date": "soon"}"#).is_err());
    }

    #[test]
    fn test_parse_timestamp_invalid() {
        assert!(parse_timestamp("June 1st").is_err());
        assert!(parse_timestamp("").is_err());
    }

    #[tokio::test]
    async fn test_write_read() {
        let dir = tempfile::TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        make_dir(&nested).await.unwrap();
        let path = nested.join("x.txt");
        write(&path, "hello").await.unwrap();
        assert_eq!(read(&path).await.unwrap(), "hello");
        let canonical = canonicalize(&nested).await.unwrap();
        assert!(canonical.is_absolute());
    }
}
