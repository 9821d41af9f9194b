//! Error types for Nevira

use thiserror::Error;

/// Result type alias for Nevira operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while registering or running actions
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// No action registered under this name
    #[error("unknown action: {0}")]
    UnknownAction(String),

    /// An action with this name is already registered
    #[error("duplicate action: {0}")]
    DuplicateAction(String),

    /// Missing or malformed argument
    #[error("invalid argument '{param}': {reason}")]
    Validation {
        /// Offending parameter
        param: String,
        /// What was wrong with it
        reason: String,
    },

    /// The action understood the request but the value is outside its table.
    /// The message is spoken back verbatim.
    #[error("{0}")]
    Rejected(String),

    /// Failure inside an action (network, OS, credentials)
    #[error("{0}")]
    External(String),

    /// Failure after the action already changed something
    #[error("{0}")]
    PartiallyApplied(String),

    /// Failure while arming the session termination
    #[error("shutdown fault: {0}")]
    Shutdown(String),

    /// Email delivery error
    #[error("email error: {0}")]
    Email(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Build a validation error for a named parameter
    pub fn invalid(param: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            param: param.into(),
            reason: reason.into(),
        }
    }

    /// Whether the failing action is known to have partially executed
    #[must_use]
    pub const fn side_effects_committed(&self) -> bool {
        matches!(self, Self::PartiallyApplied(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_display_names_param() {
        let err = Error::invalid("count", "expected an integer");
        assert_eq!(
            err.to_string(),
            "invalid argument 'count': expected an integer"
        );
    }

    #[test]
    fn user_facing_variants_display_verbatim() {
        assert_eq!(Error::Rejected("Unknown site 'x'.".into()).to_string(), "Unknown site 'x'.");
        assert_eq!(Error::External("offline".into()).to_string(), "offline");
    }

    #[test]
    fn server_io_errors_convert() {
        let err: Error = std::io::Error::other("address in use").into();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.to_string(), "io error: address in use");
    }

    #[test]
    fn only_partial_application_commits_side_effects() {
        assert!(Error::PartiallyApplied("half done".into()).side_effects_committed());
        assert!(!Error::External("nope".into()).side_effects_committed());
        assert!(!Error::UnknownAction("x".into()).side_effects_committed());
    }
}
