//! Error Types

use std::time::Duration;

use thiserror::Error;

/// Result type alias for command dispatch
pub type Result<T> = std::result::Result<T, CommandError>;

/// Command dispatch errors
#[derive(Error, Debug)]
pub enum CommandError {
    /// No command registered under this name
    #[error("Command not found: {0}")]
    NotFound(String),

    /// Required argument missing or not allowed by the schema
    #[error("Command validation error: {0}")]
    Validation(String),

    /// Argument present but of the wrong shape
    #[error("Invalid argument '{name}': {reason}")]
    InvalidArgument { name: String, reason: String },

    /// Command body panicked or was cancelled
    #[error("Command execution error: {0}")]
    Execution(String),

    /// Command did not finish in time
    #[error("Command '{name}' timed out after {elapsed:?}")]
    Timeout { name: String, elapsed: Duration },
}

impl CommandError {
    /// Shorthand for [`CommandError::InvalidArgument`]
    pub fn invalid_argument(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound(name) => format!("The command '/{name}' is not available."),
            Self::Validation(msg) => format!("Invalid command input: {msg}"),
            Self::InvalidArgument { name, reason } => {
                format!("Invalid value for '{name}': {reason}")
            }
            Self::Timeout { .. } => {
                "The request took too long to process. Please try again later.".into()
            }
            Self::Execution(_) => {
                "An unexpected error occurred. Please try again or contact an administrator.".into()
            }
        }
    }
}
