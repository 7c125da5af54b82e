use std::error::Error as StdError;

/// Crate-wide result type for platform actions.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed errors shared by every `PlatformActions` implementation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input payload or parameter is invalid.
    #[error("invalid platform input: {message}")]
    InvalidInput { message: String },

    /// The platform connection is not ready.
    #[error("platform unavailable: {message}")]
    Unavailable { message: String },

    /// The platform answered but refused the action.
    #[error("platform rejected {action}: {message}")]
    Rejected { action: String, message: String },

    /// Wrapped source error from an external dependency.
    #[error("platform action failed: {context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// JSON (de)serialization failed.
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

impl Error {
    #[must_use]
    pub fn invalid_input(message: impl std::fmt::Display) -> Self {
        Self::InvalidInput {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn unavailable(message: impl std::fmt::Display) -> Self {
        Self::Unavailable {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn rejected(action: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Rejected {
            action: action.into(),
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn external(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }
}
