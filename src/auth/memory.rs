//! Process-local identity provider.
//!
//! Implements the full [`IdentityProvider`] surface in memory so the CLI and
//! tests can drive real flows without a hosted service. Listeners are called
//! synchronously; they must not subscribe or release subscriptions from
//! inside a notification.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use strum::Display;
use uuid::Uuid;

use super::error::{ProviderError, ProviderErrorCode};
use super::identity::Identity;
use super::provider::{IdentityProvider, ProviderSubscription, SessionCallback};

const MIN_PASSWORD_LEN: usize = 6;

/// Kind of email recorded in the outbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum MailKind {
    Verification,
    PasswordReset,
}

/// An email the provider would have delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMail {
    pub kind: MailKind,
    pub to: String,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct Account {
    uid: String,
    email: String,
    password_digest: String,
    display_name: Option<String>,
    avatar_url: Option<String>,
    email_verified: bool,
}

impl Account {
    fn identity(&self) -> Identity {
        Identity {
            uid: self.uid.clone(),
            display_name: self.display_name.clone(),
            email: Some(self.email.clone()),
            avatar_url: self.avatar_url.clone(),
            email_verified: self.email_verified,
        }
    }
}

#[derive(Debug, Default)]
struct State {
    accounts: HashMap<String, Account>,
    current: Option<Identity>,
    federated: Option<Identity>,
    outbox: Vec<SentMail>,
    pending_failure: Option<ProviderError>,
}

#[derive(Default)]
struct Listeners {
    next_id: u64,
    callbacks: HashMap<u64, SessionCallback>,
}

/// In-memory [`IdentityProvider`].
///
/// # Example
/// ```
/// use sessiongate::auth::{IdentityProvider, MemoryIdentityProvider};
///
/// # async fn example() {
/// let provider = MemoryIdentityProvider::new().with_account("a@x.com", "pw123", true);
/// let identity = provider.sign_in_with_password("a@x.com", "pw123").await.unwrap();
/// assert!(identity.email_verified);
/// # }
/// ```
#[derive(Default)]
pub struct MemoryIdentityProvider {
    state: Mutex<State>,
    listeners: Arc<Mutex<Listeners>>,
}

impl MemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an email/password account.
    pub fn with_account(self, email: &str, password: &str, email_verified: bool) -> Self {
        self.add_account(email, password, email_verified);
        self
    }

    /// Configure the identity the federated popup signs in.
    pub fn with_federated_identity(self, identity: Identity) -> Self {
        self.set_federated_identity(Some(identity));
        self
    }

    /// Seed an account without signing it in. Replaces any existing account
    /// with the same email.
    pub fn add_account(&self, email: &str, password: &str, email_verified: bool) -> Identity {
        let email = normalize_email(email);
        let account = Account {
            uid: Uuid::new_v4().to_string(),
            email: email.clone(),
            password_digest: digest_password(password),
            display_name: None,
            avatar_url: None,
            email_verified,
        };
        let identity = account.identity();
        self.lock_state().accounts.insert(email, account);
        identity
    }

    /// `None` makes the popup behave as if the user closed it.
    pub fn set_federated_identity(&self, identity: Option<Identity>) {
        self.lock_state().federated = identity;
    }

    /// Simulate the user following the verification link.
    pub fn mark_verified(&self, email: &str) -> bool {
        let email = normalize_email(email);
        match self.lock_state().accounts.get_mut(&email) {
            Some(account) => {
                account.email_verified = true;
                true
            }
            None => false,
        }
    }

    /// Make the next provider operation fail with `error`.
    pub fn fail_next(&self, error: ProviderError) {
        self.lock_state().pending_failure = Some(error);
    }

    pub fn sent_mail(&self) -> Vec<SentMail> {
        self.lock_state().outbox.clone()
    }

    pub fn current_identity(&self) -> Option<Identity> {
        self.lock_state().current.clone()
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.listeners).callbacks.len()
    }

    fn lock_state(&self) -> MutexGuard<'_, State> {
        lock(&self.state)
    }

    fn take_failure(&self) -> Result<(), ProviderError> {
        match self.lock_state().pending_failure.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn set_current(&self, identity: Option<Identity>) {
        self.lock_state().current = identity;
        self.notify();
    }

    /// Deliver the current session to every listener.
    ///
    /// The listener lock is held for the whole delivery so a concurrent
    /// release waits until delivery is over.
    fn notify(&self) {
        let listeners = lock(&self.listeners);
        let current = self.lock_state().current.clone();
        for callback in listeners.callbacks.values() {
            callback(current.clone());
        }
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    fn provider_name(&self) -> &str {
        "memory"
    }

    fn subscribe_session_changes(&self, callback: SessionCallback) -> ProviderSubscription {
        let mut listeners = lock(&self.listeners);
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.callbacks.insert(id, callback.clone());

        let current = self.lock_state().current.clone();
        callback(current);
        drop(listeners);

        let registry = Arc::downgrade(&self.listeners);
        ProviderSubscription::new(move || {
            if let Some(registry) = registry.upgrade() {
                lock(&registry).callbacks.remove(&id);
            }
        })
    }

    async fn sign_in_federated(&self) -> Result<Identity, ProviderError> {
        self.take_failure()?;
        let identity = self.lock_state().federated.clone().ok_or_else(|| {
            ProviderError::new(
                ProviderErrorCode::PopupClosed,
                "The popup has been closed by the user before finalizing the operation.",
            )
        })?;
        self.set_current(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, ProviderError> {
        self.take_failure()?;
        let email = normalize_email(email);
        let identity = {
            let state = self.lock_state();
            let account = state.accounts.get(&email).ok_or_else(|| {
                ProviderError::new(
                    ProviderErrorCode::UserNotFound,
                    "There is no user record corresponding to this identifier.",
                )
            })?;
            if account.password_digest != digest_password(password) {
                return Err(ProviderError::new(
                    ProviderErrorCode::WrongPassword,
                    "The password is invalid.",
                ));
            }
            account.identity()
        };
        self.set_current(Some(identity.clone()));
        Ok(identity)
    }

    async fn create_account(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, ProviderError> {
        self.take_failure()?;
        let email = normalize_email(email);
        if email.is_empty() || !email.contains('@') {
            return Err(ProviderError::from_code(
                "auth/invalid-email",
                "The email address is badly formatted.",
            ));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ProviderError::new(
                ProviderErrorCode::WeakPassword,
                "Password should be at least 6 characters.",
            ));
        }
        let identity = {
            let mut state = self.lock_state();
            if state.accounts.contains_key(&email) {
                return Err(ProviderError::new(
                    ProviderErrorCode::EmailAlreadyInUse,
                    "The email address is already in use by another account.",
                ));
            }
            let account = Account {
                uid: Uuid::new_v4().to_string(),
                email: email.clone(),
                password_digest: digest_password(password),
                display_name: None,
                avatar_url: None,
                email_verified: false,
            };
            let identity = account.identity();
            state.accounts.insert(email, account);
            identity
        };
        self.set_current(Some(identity.clone()));
        Ok(identity)
    }

    async fn send_verification_email(&self, identity: &Identity) -> Result<(), ProviderError> {
        self.take_failure()?;
        let email = identity.email.as_deref().map(normalize_email).unwrap_or_default();
        let mut state = self.lock_state();
        if !state.accounts.contains_key(&email) {
            return Err(ProviderError::new(
                ProviderErrorCode::NoCurrentUser,
                "No account to send a verification email to.",
            ));
        }
        state.outbox.push(SentMail {
            kind: MailKind::Verification,
            to: email,
            sent_at: Utc::now(),
        });
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), ProviderError> {
        self.take_failure()?;
        let email = normalize_email(email);
        let mut state = self.lock_state();
        if !state.accounts.contains_key(&email) {
            return Err(ProviderError::new(
                ProviderErrorCode::UserNotFound,
                "There is no user record corresponding to this identifier.",
            ));
        }
        state.outbox.push(SentMail {
            kind: MailKind::PasswordReset,
            to: email,
            sent_at: Utc::now(),
        });
        Ok(())
    }

    async fn end_session(&self) -> Result<(), ProviderError> {
        self.take_failure()?;
        self.set_current(None);
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

fn digest_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> (SessionCallback, Arc<Mutex<Vec<Option<Identity>>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let callback: SessionCallback = Arc::new(move |identity| {
            sink.lock().unwrap().push(identity);
        });
        (callback, seen)
    }

    #[test]
    fn subscribe_delivers_current_session_immediately() {
        let provider = MemoryIdentityProvider::new();
        let (callback, seen) = recorder();
        let _subscription = provider.subscribe_session_changes(callback);
        assert_eq!(seen.lock().unwrap().as_slice(), &[None]);
        assert_eq!(provider.listener_count(), 1);
    }

    #[tokio::test]
    async fn sign_in_notifies_listeners() {
        let provider = MemoryIdentityProvider::new().with_account("a@x.com", "pw123", true);
        let (callback, seen) = recorder();
        let _subscription = provider.subscribe_session_changes(callback);

        let identity = provider
            .sign_in_with_password("A@X.com ", "pw123")
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].as_ref(), Some(&identity));
    }

    #[tokio::test]
    async fn released_listener_is_not_called() {
        let provider = MemoryIdentityProvider::new().with_account("a@x.com", "pw123", true);
        let (callback, seen) = recorder();
        let subscription = provider.subscribe_session_changes(callback);
        subscription.release();
        assert_eq!(provider.listener_count(), 0);

        provider.sign_in_with_password("a@x.com", "pw123").await.unwrap();
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_are_distinguished() {
        let provider = MemoryIdentityProvider::new().with_account("a@x.com", "pw123", true);
        let err = provider
            .sign_in_with_password("a@x.com", "wrong")
            .await
            .unwrap_err();
        assert_eq!(err.code, ProviderErrorCode::WrongPassword);

        let err = provider
            .sign_in_with_password("b@x.com", "pw123")
            .await
            .unwrap_err();
        assert_eq!(err.code, ProviderErrorCode::UserNotFound);
        assert!(provider.current_identity().is_none());
    }

    #[tokio::test]
    async fn create_account_rejects_duplicates_and_weak_passwords() {
        let provider = MemoryIdentityProvider::new().with_account("a@x.com", "pw123", true);
        let err = provider.create_account("a@x.com", "another").await.unwrap_err();
        assert_eq!(err.code, ProviderErrorCode::EmailAlreadyInUse);

        let err = provider.create_account("b@x.com", "pw").await.unwrap_err();
        assert_eq!(err.code, ProviderErrorCode::WeakPassword);

        let err = provider.create_account("not-an-email", "pw1234").await.unwrap_err();
        assert_eq!(err.code.as_str(), "auth/invalid-email");
    }

    #[tokio::test]
    async fn create_account_signs_in_unverified_identity() {
        let provider = MemoryIdentityProvider::new();
        let identity = provider.create_account("new@x.com", "pw1234").await.unwrap();
        assert!(!identity.email_verified);
        assert_eq!(provider.current_identity(), Some(identity));
    }

    #[tokio::test]
    async fn mail_dispatches_are_recorded() {
        let provider = MemoryIdentityProvider::new();
        let identity = provider.create_account("new@x.com", "pw1234").await.unwrap();
        provider.send_verification_email(&identity).await.unwrap();
        provider.send_password_reset("new@x.com").await.unwrap();

        let mail = provider.sent_mail();
        let kinds: Vec<MailKind> = mail.iter().map(|m| m.kind).collect();
        assert_eq!(kinds, vec![MailKind::Verification, MailKind::PasswordReset]);
        assert!(mail.iter().all(|m| m.to == "new@x.com"));
    }

    #[tokio::test]
    async fn reset_for_unknown_user_fails() {
        let provider = MemoryIdentityProvider::new();
        let err = provider.send_password_reset("ghost@x.com").await.unwrap_err();
        assert_eq!(err.code, ProviderErrorCode::UserNotFound);
        assert!(provider.sent_mail().is_empty());
    }

    #[tokio::test]
    async fn federated_popup_without_identity_is_closed() {
        let provider = MemoryIdentityProvider::new();
        let err = provider.sign_in_federated().await.unwrap_err();
        assert_eq!(err.code, ProviderErrorCode::PopupClosed);
    }

    #[tokio::test]
    async fn fail_next_applies_once() {
        let provider = MemoryIdentityProvider::new().with_account("a@x.com", "pw123", true);
        provider.fail_next(ProviderError::new(ProviderErrorCode::Network, "offline"));
        let err = provider
            .sign_in_with_password("a@x.com", "pw123")
            .await
            .unwrap_err();
        assert_eq!(err.code, ProviderErrorCode::Network);
        assert!(provider.sign_in_with_password("a@x.com", "pw123").await.is_ok());
    }

    #[tokio::test]
    async fn mark_verified_updates_future_sign_ins() {
        let provider = MemoryIdentityProvider::new().with_account("a@x.com", "pw123", false);
        assert!(provider.mark_verified("a@x.com"));
        assert!(!provider.mark_verified("ghost@x.com"));
        let identity = provider.sign_in_with_password("a@x.com", "pw123").await.unwrap();
        assert!(identity.email_verified);
    }

    #[tokio::test]
    async fn end_session_clears_current_identity() {
        let provider = MemoryIdentityProvider::new().with_account("a@x.com", "pw123", true);
        provider.sign_in_with_password("a@x.com", "pw123").await.unwrap();
        provider.end_session().await.unwrap();
        assert!(provider.current_identity().is_none());
    }
}
