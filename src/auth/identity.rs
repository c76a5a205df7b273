use bon::Builder;
use serde::{Deserialize, Serialize};

/// Profile data of an authenticated user as reported by the identity provider.
///
/// # Example
/// ```
/// use sessiongate::auth::Identity;
///
/// let identity = Identity::builder()
///     .uid("u-1")
///     .email("a@x.com")
///     .email_verified(true)
///     .build();
/// assert_eq!(identity.display_label(), "Guest User");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
pub struct Identity {
    #[builder(into)]
    pub uid: String,
    #[builder(into)]
    pub display_name: Option<String>,
    #[builder(into)]
    pub email: Option<String>,
    #[builder(into)]
    pub avatar_url: Option<String>,
    #[builder(default)]
    #[serde(default)]
    pub email_verified: bool,
}

impl Identity {
    /// Name shown in the profile header.
    pub fn display_label(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or("Guest User")
    }

    /// Email line shown under the profile header.
    pub fn contact_label(&self) -> &str {
        self.email
            .as_deref()
            .filter(|email| !email.trim().is_empty())
            .unwrap_or("No Email")
    }
}
