use serde::{Deserialize, Serialize};

use crate::auth::Identity;

/// Tri-state classification of whether a user identity is established.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "identity", rename_all = "snake_case")]
pub enum SessionStatus {
    /// The provider has not reported yet; render a loading affordance.
    #[default]
    Unknown,
    Authenticated(Identity),
    Unauthenticated,
}

impl SessionStatus {
    /// Derive a status from the provider's raw session payload.
    pub fn from_payload(payload: Option<Identity>) -> Self {
        match payload {
            Some(identity) => Self::Authenticated(identity),
            None => Self::Unauthenticated,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Authenticated(_) => "authenticated",
            Self::Unauthenticated => "unauthenticated",
        }
    }
}
