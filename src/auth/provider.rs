use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use super::error::ProviderError;
use super::identity::Identity;

/// Listener invoked with the provider's raw session payload.
///
/// `None` means nobody is signed in.
pub type SessionCallback = Arc<dyn Fn(Option<Identity>) + Send + Sync>;

/// Handle returned by [`IdentityProvider::subscribe_session_changes`].
///
/// Releasing (or dropping) the handle detaches the listener. Implementations
/// must guarantee the listener is never invoked after the release closure
/// has returned.
pub struct ProviderSubscription {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl ProviderSubscription {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Detach the listener now.
    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for ProviderSubscription {
    fn drop(&mut self) {
        self.release_inner();
    }
}

impl fmt::Debug for ProviderSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSubscription")
            .field("released", &self.release.is_none())
            .finish()
    }
}

/// Capability surface of an external identity provider.
///
/// Implementations own all credential storage and session persistence; this
/// crate only orchestrates the calls and classifies their failures.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Provider name used in logs (e.g. "memory").
    fn provider_name(&self) -> &str;

    /// Register a listener for "current session changed" notifications.
    fn subscribe_session_changes(&self, callback: SessionCallback) -> ProviderSubscription;

    /// Popup-based federated sign-in. Fails when the popup is dismissed.
    async fn sign_in_federated(&self) -> Result<Identity, ProviderError>;

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, ProviderError>;

    /// Create an account. Providers typically sign the new account in.
    async fn create_account(&self, email: &str, password: &str)
        -> Result<Identity, ProviderError>;

    async fn send_verification_email(&self, identity: &Identity) -> Result<(), ProviderError>;

    async fn send_password_reset(&self, email: &str) -> Result<(), ProviderError>;

    /// Terminate the current provider session.
    async fn end_session(&self) -> Result<(), ProviderError>;
}
