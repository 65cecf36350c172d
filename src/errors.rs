use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LendingError {
    #[error("invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("api rejected request (status {status}): {message}")]
    Api {
        status: u16,
        message: String,
    },

    #[error("transport failure: {message}")]
    Transport {
        message: String,
    },

    #[error("invalid response body: {message}")]
    Decode {
        message: String,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },
}

impl LendingError {
    /// message surfaced in a failure state
    pub fn user_message(&self) -> String {
        match self {
            LendingError::Api { message, .. } => message.clone(),
            LendingError::Transport { message } => message.clone(),
            LendingError::Validation { field, message } => format!("{}: {}", field, message),
            other => other.to_string(),
        }
    }

    /// build a validation error for a form field
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        LendingError::Validation {
            field,
            message: message.into(),
        }
    }

    /// fallback message when the server sent no readable body
    pub fn status_message(status: u16) -> String {
        format!("HTTP error, status {}", status)
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, LendingError::Validation { .. })
    }
}

pub type Result<T> = std::result::Result<T, LendingError>;
