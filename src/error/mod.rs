//! Error types for sessiongate.

pub mod unified;

pub use unified::{ErrorCategory, RecoverySuggestion};

use thiserror::Error;

use crate::auth::error::{FlowError, ProviderError};

/// Primary error type for all sessiongate operations.
#[derive(Error, Debug)]
pub enum GateError {
    /// `SessionController::start` was called while a subscription is live.
    #[error("Session controller is already subscribed; call stop() first")]
    DoubleSubscription,

    #[error(transparent)]
    Flow(#[from] FlowError),

    #[error("Identity provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl GateError {
    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::DoubleSubscription | Self::InvalidArgument(_) => ErrorCategory::Programming,
            Self::Flow(flow) => flow.category(),
            Self::Provider(_) => ErrorCategory::Provider,
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Io(_) => ErrorCategory::Io,
            Self::Timeout(_) => ErrorCategory::Timeout,
        }
    }

    /// Whether the condition should be shown to the end user rather than
    /// treated as a logic fault.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, Self::Flow(_) | Self::Provider(_) | Self::Timeout(_))
    }

    /// Suggest recovery actions.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self {
            Self::Flow(flow) => flow.recovery_suggestion(),
            Self::Provider(_) | Self::Timeout(_) => RecoverySuggestion::RetryLater,
            Self::Configuration(_) => RecoverySuggestion::CheckConfiguration,
            Self::DoubleSubscription | Self::InvalidArgument(_) => RecoverySuggestion::FixCallSite,
            Self::Io(_) => RecoverySuggestion::ContactSupport,
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, GateError>;
