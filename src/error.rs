//! Error handling and custom error types
//!
//! Provides unified error handling across the application using thiserror.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Image encoding error: {0}")]
    Encoding(String),

    #[error("Completion failed: {0}")]
    Completion(String),

    #[error("Invalid state transition: {0}")]
    InvalidState(String),
}

impl Error {
    /// Message shown to the user in place of a result.
    ///
    /// Remote failures all collapse to one sentence; the detail stays in the logs.
    pub fn user_message(&self) -> String {
        match self {
            Error::Validation(msg) => msg.clone(),
            Error::Encoding(_) => {
                "Could not read the attached image. Please choose it again and resubmit."
                    .to_string()
            }
            Error::Completion(_) => {
                "Failed to get feedback from the AI. Please check your connection and try again."
                    .to_string()
            }
            Error::InvalidState(_) => {
                "An analysis is already in progress. Please wait for it to finish.".to_string()
            }
            Error::Config(msg) => format!("The application is not configured: {}", msg),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_failures_share_one_message() {
        let a = Error::Completion("status 401".to_string()).user_message();
        let b = Error::Completion("connection reset".to_string()).user_message();
        assert_eq!(a, b);
        assert!(!a.contains("401"));
    }

    #[test]
    fn test_validation_message_is_passed_through() {
        let err = Error::Validation("Please enter the essay topic.".to_string());
        assert_eq!(err.user_message(), "Please enter the essay topic.");
    }

    #[test]
    fn test_encoding_message_differs_from_completion() {
        let enc = Error::Encoding("unreadable".to_string()).user_message();
        let comp = Error::Completion("boom".to_string()).user_message();
        assert_ne!(enc, comp);
    }
}
