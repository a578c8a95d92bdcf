//! Command errors
//!
//! Every way a request can fail before or during dispatch. The `Display`
//! text is what goes out on the wire as an error reply, so every message
//! starts with `ERR`.

use crate::protocol::ParseError;
use crate::storage::PatternError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CommandError {
    /// The request frame couldn't be decoded
    #[error("ERR {0}")]
    Protocol(#[from] ParseError),

    /// An argument had the wrong shape or an option was malformed
    #[error("ERR {0}")]
    InvalidArgument(String),

    /// Too few or too many arguments for the named command
    #[error("ERR wrong number of arguments for '{0}' command")]
    WrongArity(String),

    /// A KEYS pattern that isn't a valid regular expression
    #[error("ERR {0}")]
    InvalidPattern(#[from] PatternError),

    #[error("ERR unknown command '{0}'")]
    UnknownCommand(String),

    #[error("ERR empty command")]
    EmptyCommand,
}

impl CommandError {
    pub(crate) fn syntax() -> Self {
        CommandError::InvalidArgument("syntax error".to_string())
    }

    pub(crate) fn not_an_integer() -> Self {
        CommandError::InvalidArgument("value is not an integer or out of range".to_string())
    }

    pub(crate) fn invalid_expire_time(command: &str) -> Self {
        CommandError::InvalidArgument(format!("invalid expire time in '{}' command", command))
    }
}
