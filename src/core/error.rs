// ripestat-text - Error Types
// Copyright (C) 2025 Akaere Networks
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Error taxonomy shared by the pipeline stages

use thiserror::Error;

/// Message shown in place of any internal widget failure
pub const GENERIC_WIDGET_ERROR: &str = "There was an error rendering this widget.";

#[derive(Error, Debug)]
pub enum StatError {
    /// Bad input shape; `show_help` asks the front end to print the usage
    #[error("{message}")]
    Usage { message: String, show_help: bool },

    /// The data service answered with a non-2xx status
    #[error("data service error (status {status}): {}", messages.join("; "))]
    Service { status: u16, messages: Vec<String> },

    #[error("Expected version {expected}.x of '{call}', but found {actual}.")]
    VersionMismatch { call: String, expected: u32, actual: String },

    /// Unexpected failure inside one widget; never shown verbatim
    #[error("render error: {0}")]
    Render(String),

    #[error("No such widget group: {0}")]
    UnknownGroup(String),

    #[error("Could not select '{0}' from the response")]
    NotFound(String),

    #[error("Invalid template: {0}")]
    Template(String),

    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type StatResult<T> = Result<T, StatError>;

impl StatError {
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage { message: message.into(), show_help: false }
    }

    pub fn usage_with_help(message: impl Into<String>) -> Self {
        Self::Usage { message: message.into(), show_help: true }
    }

    /// Whether the text of this error is meaningful to the person asking
    pub fn is_caller_facing(&self) -> bool {
        matches!(
            self,
            Self::Usage { .. } |
                Self::Service { .. } |
                Self::VersionMismatch { .. } |
                Self::UnknownGroup(_) |
                Self::NotFound(_) |
                Self::Template(_)
        )
    }

    /// Text that may be written into the output stream for this error
    pub fn user_message(&self) -> String {
        match self {
            Self::Service { messages, .. } => {
                let joined = messages
                    .iter()
                    .map(|m| m.trim())
                    .filter(|m| !m.is_empty())
                    .collect::<Vec<_>>()
                    .join("; ");
                if joined.is_empty() { GENERIC_WIDGET_ERROR.to_string() } else { joined }
            }
            e if e.is_caller_facing() => e.to_string(),
            _ => GENERIC_WIDGET_ERROR.to_string(),
        }
    }

    /// Exit status a command finishes with when it fails with this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Usage { show_help: true, .. } => 1,
            _ => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_message_is_joined() {
        let err = StatError::Service {
            status: 400,
            messages: vec!["bad resource".to_string(), "try again".to_string()],
        };
        assert_eq!(err.user_message(), "bad resource; try again");
    }

    #[test]
    fn test_empty_service_message_falls_back() {
        let err = StatError::Service { status: 500, messages: vec![] };
        assert_eq!(err.user_message(), GENERIC_WIDGET_ERROR);
    }

    #[test]
    fn test_internal_errors_do_not_leak() {
        let err = StatError::Render("index out of bounds at widgets/geoloc.rs".to_string());
        assert_eq!(err.user_message(), GENERIC_WIDGET_ERROR);
    }

    #[test]
    fn test_version_mismatch_message() {
        let err = StatError::VersionMismatch {
            call: "geoloc".to_string(),
            expected: 1,
            actual: "2.0".to_string(),
        };
        assert_eq!(err.user_message(), "Expected version 1.x of 'geoloc', but found 2.0.");
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(StatError::usage_with_help("x").exit_code(), 1);
        assert_eq!(StatError::usage("x").exit_code(), 2);
        assert_eq!(StatError::UnknownGroup("@x".into()).exit_code(), 2);
    }
}
