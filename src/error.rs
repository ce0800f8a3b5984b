//! Error types for metal-volumes
//!
//! Every failure the engine can surface is a variant of [`Error`]. The
//! session-expiry classification is decided here once, at the point the
//! error is produced, and consumed by the dispatcher through
//! [`Error::recovery`].

use thiserror::Error;

/// Unified error type for the volume engine
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Local Errors
    // =========================================================================
    #[error("{0}")]
    Argument(String),

    #[error("{0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unsupported {kind}: {token}")]
    UnsupportedOperation { kind: &'static str, token: String },

    // =========================================================================
    // Remote Call Errors
    // =========================================================================
    #[error("Error in REST call: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{operation} failed with error: {message}")]
    RemoteCall {
        operation: String,
        status: u16,
        message: String,
    },

    #[error("Session creation failed with error: {0}")]
    Authentication(String),

    // =========================================================================
    // Session Errors
    // =========================================================================
    #[error("Token is expired")]
    TokenExpired,

    #[error("undefined response type for {operation}")]
    UndefinedResponse { operation: String },

    #[error("session token is not present in the credential store")]
    MissingSessionToken,

    // =========================================================================
    // Lookup & Reconciliation Errors
    // =========================================================================
    #[error("{kind} with {field} {value} not found")]
    NotFound {
        kind: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("{operation} failed with state: {last_state}")]
    ReconciliationTimeout {
        operation: String,
        last_state: String,
    },

    // =========================================================================
    // Parse & IO Errors
    // =========================================================================
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Credential file parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Credential file write error: {0}")]
    TomlWrite(#[from] toml::ser::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// What the dispatcher does with a failed handler execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Log in again and replay the operation once
    Reauthenticate,
    /// Hand the error to the caller unchanged
    Surface,
}

impl Error {
    /// Determine how the dispatcher recovers from this error
    pub fn recovery(&self) -> Recovery {
        match self {
            Error::TokenExpired
            | Error::UndefinedResponse { .. }
            | Error::MissingSessionToken => Recovery::Reauthenticate,
            _ => Recovery::Surface,
        }
    }

    /// Check if this error means the session must be re-established
    pub fn is_session_expired(&self) -> bool {
        self.recovery() == Recovery::Reauthenticate
    }
}

/// Result type alias for the engine
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_expired_classification() {
        assert!(Error::TokenExpired.is_session_expired());
        assert!(Error::MissingSessionToken.is_session_expired());
        assert!(Error::UndefinedResponse {
            operation: "get volume".into()
        }
        .is_session_expired());

        let remote = Error::RemoteCall {
            operation: "Get volume".into(),
            status: 500,
            message: "boom".into(),
        };
        assert_eq!(remote.recovery(), Recovery::Surface);
        assert!(!Error::Configuration("no url".into()).is_session_expired());
    }

    #[test]
    fn test_error_messages() {
        let err = Error::ReconciliationTimeout {
            operation: "Delete volume".into(),
            last_state: "deleting".into(),
        };
        assert_eq!(err.to_string(), "Delete volume failed with state: deleting");

        let err = Error::UnsupportedOperation {
            kind: "resource type",
            token: "snapshot".into(),
        };
        assert_eq!(err.to_string(), "Unsupported resource type: snapshot");
    }
}
