//! Unified error classification and recovery.

use serde::{Deserialize, Serialize};

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// A credential flow was rejected; the user can correct and retry.
    Credentials,
    /// The identity exists but has not completed email verification.
    Verification,
    /// The identity provider failed for reasons outside the user's input.
    Provider,
    Timeout,
    Configuration,
    /// Misuse of the crate API (for example a double subscription).
    Programming,
    Io,
}

/// Suggested recovery action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverySuggestion {
    CorrectCredentials,
    VerifyEmail,
    ChooseDifferentEmail,
    ChooseStrongerPassword,
    RetryLater,
    CheckConfiguration,
    FixCallSite,
    ContactSupport,
}
