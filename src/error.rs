//! Error handling for the crate.
//!
//! Internally everything is an `anyhow::Error`. Errors returned from public command functions are
//! tagged with an `ErrorType` so that callers (the CLI and the MCP server) can tell a validation
//! problem from a database or network problem without parsing messages.

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};

pub type Error = anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// The broad category of a failure returned from a public command.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// The home directory or `config.json` is missing or invalid.
    Config,
    /// A record store operation failed.
    Database,
    /// An entry was rejected by validation.
    Validation,
    /// The external time report could not be fetched or parsed.
    Report,
    /// Stored data is corrupt, e.g. a payment with a zero exchange rate.
    Data,
    /// The MCP service failed.
    Service,
}

serde_plain::derive_display_from_serialize!(ErrorType);

/// Wraps an error with its `ErrorType`. The display text is the inner error's message so that
/// tagging an error never changes what the user reads.
struct Typed {
    error_type: ErrorType,
    inner: Error,
}

impl Display for Typed {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.inner, f)
    }
}

impl Debug for Typed {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {:?}", self.error_type, self.inner)
    }
}

impl std::error::Error for Typed {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner.source()
    }
}

/// Extension for tagging the error of a `Result` with an `ErrorType`.
pub(crate) trait IntoResult<T> {
    /// Converts the error into a public, typed error.
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T, E> IntoResult<T> for std::result::Result<T, E>
where
    E: Into<Error>,
{
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            // Keep the innermost tag if the error was already typed.
            if inner.downcast_ref::<Typed>().is_some() {
                return inner;
            }
            Error::new(Typed { error_type, inner })
        })
    }
}

/// Returns the `ErrorType` of an error that was returned from a public command, if it has one.
pub fn error_type(e: &Error) -> Option<ErrorType> {
    e.downcast_ref::<Typed>().map(|typed| typed.error_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_pub_result_keeps_message() {
        let result: Result<()> = Err(anyhow!("Work log not found: abc"));
        let e = result.pub_result(ErrorType::Database).unwrap_err();
        assert_eq!(e.to_string(), "Work log not found: abc");
        assert_eq!(error_type(&e), Some(ErrorType::Database));
    }

    #[test]
    fn test_pub_result_keeps_first_tag() {
        let result: Result<()> = Err(anyhow!("bad"));
        let e = result
            .pub_result(ErrorType::Validation)
            .pub_result(ErrorType::Database)
            .unwrap_err();
        assert_eq!(error_type(&e), Some(ErrorType::Validation));
    }

    #[test]
    fn test_untyped_error_has_no_type() {
        let e = anyhow!("plain");
        assert_eq!(error_type(&e), None);
    }

    #[test]
    fn test_error_type_display() {
        assert_eq!(ErrorType::Report.to_string(), "report");
    }
}
