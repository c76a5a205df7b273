use std::fmt;

use strum::{Display, EnumString};
use thiserror::Error;

use crate::error::{ErrorCategory, RecoverySuggestion};

/// Machine code attached to an identity provider failure.
///
/// Parses the `auth/<kind>` strings common to hosted identity providers;
/// anything unrecognised is kept verbatim in [`ProviderErrorCode::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumString)]
pub enum ProviderErrorCode {
    #[strum(serialize = "auth/wrong-password")]
    WrongPassword,
    #[strum(serialize = "auth/user-not-found")]
    UserNotFound,
    #[strum(serialize = "auth/invalid-credential")]
    InvalidCredential,
    #[strum(serialize = "auth/email-already-in-use")]
    EmailAlreadyInUse,
    #[strum(serialize = "auth/weak-password")]
    WeakPassword,
    #[strum(serialize = "auth/popup-closed-by-user")]
    PopupClosed,
    #[strum(serialize = "auth/cancelled-popup-request")]
    PopupCancelled,
    #[strum(serialize = "auth/network-request-failed")]
    Network,
    #[strum(serialize = "auth/no-current-user")]
    NoCurrentUser,
    #[strum(default)]
    Other(String),
}

impl ProviderErrorCode {
    pub fn as_str(&self) -> &str {
        match self {
            Self::WrongPassword => "auth/wrong-password",
            Self::UserNotFound => "auth/user-not-found",
            Self::InvalidCredential => "auth/invalid-credential",
            Self::EmailAlreadyInUse => "auth/email-already-in-use",
            Self::WeakPassword => "auth/weak-password",
            Self::PopupClosed => "auth/popup-closed-by-user",
            Self::PopupCancelled => "auth/cancelled-popup-request",
            Self::Network => "auth/network-request-failed",
            Self::NoCurrentUser => "auth/no-current-user",
            Self::Other(code) => code,
        }
    }
}

impl fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw failure reported by an identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} ({code})")]
pub struct ProviderError {
    pub code: ProviderErrorCode,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Build from a provider code string such as `auth/wrong-password`.
    pub fn from_code(code: &str, message: impl Into<String>) -> Self {
        let code = code
            .parse()
            .unwrap_or_else(|_| ProviderErrorCode::Other(code.to_string()));
        Self::new(code, message)
    }
}

/// Which credential operation produced a provider failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum FlowOperation {
    Federated,
    Credentials,
    Register,
    Reset,
}

/// Why the provider refused an email/password pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum CredentialRejection {
    #[strum(serialize = "wrong password")]
    WrongPassword,
    #[strum(serialize = "unknown user")]
    UnknownUser,
    #[strum(serialize = "rejected credential")]
    Rejected,
}

/// Classified outcome of a failed credential flow.
///
/// Every identity provider failure is converted into one of these at the
/// flow boundary; all of them are recoverable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    #[error("Federated sign-in failed: {reason}")]
    FederatedSignInFailed { reason: String },
    #[error("Invalid credentials: {reason}")]
    InvalidCredentials { reason: CredentialRejection },
    #[error("Email not verified")]
    EmailNotVerified,
    #[error("Email already in use")]
    EmailAlreadyInUse,
    #[error("Weak password")]
    WeakPassword,
    #[error("Flow failed: {0}")]
    FlowFailed(String),
}

impl FlowError {
    /// Convert a provider failure into the taxonomy for `operation`.
    pub fn classify(operation: FlowOperation, error: ProviderError) -> Self {
        match operation {
            FlowOperation::Federated => Self::FederatedSignInFailed {
                reason: error.message,
            },
            FlowOperation::Credentials => match error.code {
                ProviderErrorCode::WrongPassword => Self::InvalidCredentials {
                    reason: CredentialRejection::WrongPassword,
                },
                ProviderErrorCode::UserNotFound => Self::InvalidCredentials {
                    reason: CredentialRejection::UnknownUser,
                },
                ProviderErrorCode::InvalidCredential => Self::InvalidCredentials {
                    reason: CredentialRejection::Rejected,
                },
                _ => Self::FlowFailed(error.message),
            },
            FlowOperation::Register => match error.code {
                ProviderErrorCode::EmailAlreadyInUse => Self::EmailAlreadyInUse,
                ProviderErrorCode::WeakPassword => Self::WeakPassword,
                _ => Self::FlowFailed(error.message),
            },
            FlowOperation::Reset => Self::FlowFailed(error.message),
        }
    }

    /// Distinct, actionable message for display next to the form.
    pub fn user_message(&self) -> String {
        match self {
            Self::FederatedSignInFailed { .. } => {
                "Federated sign-in failed. Please try again.".to_string()
            }
            Self::InvalidCredentials { reason } => match reason {
                CredentialRejection::WrongPassword => "Incorrect password.".to_string(),
                CredentialRejection::UnknownUser => "No user found with this email.".to_string(),
                CredentialRejection::Rejected => "Incorrect email or password.".to_string(),
            },
            Self::EmailNotVerified => "Please verify your email before signing in.".to_string(),
            Self::EmailAlreadyInUse => "An account with this email already exists.".to_string(),
            Self::WeakPassword => "Password should be at least 6 characters.".to_string(),
            Self::FlowFailed(message) => format!("Request failed: {message}"),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidCredentials { .. } | Self::EmailAlreadyInUse | Self::WeakPassword => {
                ErrorCategory::Credentials
            }
            Self::EmailNotVerified => ErrorCategory::Verification,
            Self::FederatedSignInFailed { .. } | Self::FlowFailed(_) => ErrorCategory::Provider,
        }
    }

    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self {
            Self::InvalidCredentials { .. } => RecoverySuggestion::CorrectCredentials,
            Self::EmailNotVerified => RecoverySuggestion::VerifyEmail,
            Self::EmailAlreadyInUse => RecoverySuggestion::ChooseDifferentEmail,
            Self::WeakPassword => RecoverySuggestion::ChooseStrongerPassword,
            Self::FederatedSignInFailed { .. } | Self::FlowFailed(_) => {
                RecoverySuggestion::RetryLater
            }
        }
    }
}
