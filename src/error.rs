//! Error types for the warden
//!
//! Genuine faults only. Informational signals (already protected, no match
//! found, unauthorized caller) are outcome enums on the engines, not errors.

use thiserror::Error;

/// Errors that can occur while applying actions or persisting configuration
#[derive(Debug, Error)]
pub enum WardenError {
    /// Invalid sanction state transition attempted
    #[error("Invalid sanction state transition")]
    InvalidStateTransition,

    /// Sanction record not found
    #[error("Sanction not found: {0}")]
    SanctionNotFound(String),

    /// The platform rejected the action for lack of privilege
    #[error("Missing platform permission to act on the target")]
    PlatformForbidden,

    /// Discord API error
    #[error("Discord API error: {0}")]
    DiscordApi(#[from] Box<poise::serenity_prelude::Error>),

    /// Failed to persist or load configuration
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Generic error
    #[error("Warden error: {0}")]
    Other(String),
}

impl WardenError {
    /// Map a serenity error from an enforcement call, surfacing privilege
    /// rejections as their own variant so callers can abandon the operation
    /// without retrying.
    #[must_use]
    pub fn from_platform(error: poise::serenity_prelude::Error) -> Self {
        use poise::serenity_prelude as serenity;

        if let serenity::Error::Http(serenity::HttpError::UnsuccessfulRequest(ref response)) = error
        {
            if response.status_code.as_u16() == 403 {
                return Self::PlatformForbidden;
            }
        }
        Self::DiscordApi(Box::new(error))
    }
}

impl From<poise::serenity_prelude::Error> for WardenError {
    fn from(error: poise::serenity_prelude::Error) -> Self {
        Self::DiscordApi(Box::new(error))
    }
}

impl From<String> for WardenError {
    fn from(message: String) -> Self {
        Self::Other(message)
    }
}

impl From<std::io::Error> for WardenError {
    fn from(error: std::io::Error) -> Self {
        Self::Persistence(error.to_string())
    }
}

impl From<serde_yaml::Error> for WardenError {
    fn from(error: serde_yaml::Error) -> Self {
        Self::Persistence(error.to_string())
    }
}

/// Result type for warden operations
pub type WardenResult<T> = Result<T, WardenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = WardenError::InvalidStateTransition;
        assert_eq!(error.to_string(), "Invalid sanction state transition");

        let error = WardenError::SanctionNotFound("test-id".to_string());
        assert_eq!(error.to_string(), "Sanction not found: test-id");

        let error = WardenError::PlatformForbidden;
        assert_eq!(
            error.to_string(),
            "Missing platform permission to act on the target"
        );

        let error = WardenError::from("something went wrong".to_string());
        assert_eq!(error.to_string(), "Warden error: something went wrong");
    }

    #[test]
    fn test_io_errors_map_to_persistence() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "data dir");
        let error = WardenError::from(io);
        assert!(matches!(error, WardenError::Persistence(_)));
        assert!(error.to_string().starts_with("Persistence error:"));
    }
}
