//! Shared test helpers and mock identity provider.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use sessiongate::auth::{
    Identity, IdentityProvider, ProviderError, ProviderErrorCode, ProviderSubscription,
    SessionCallback,
};

type Listeners = Arc<Mutex<HashMap<u64, SessionCallback>>>;

/// A scripted provider that records every call.
///
/// Accepts any password on registration; failures are injected per
/// operation with [`MockIdentityProvider::fail`].
#[derive(Default)]
pub struct MockIdentityProvider {
    accounts: Mutex<HashMap<String, (String, bool)>>,
    federated: Mutex<Option<Identity>>,
    current: Mutex<Option<Identity>>,
    failures: Mutex<HashMap<&'static str, ProviderError>>,
    calls: Mutex<Vec<&'static str>>,
    listeners: Listeners,
    next_listener: Mutex<u64>,
}

impl MockIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(self, email: &str, password: &str, verified: bool) -> Self {
        self.accounts
            .lock()
            .unwrap()
            .insert(email.to_string(), (password.to_string(), verified));
        self
    }

    pub fn with_federated(self, identity: Identity) -> Self {
        *self.federated.lock().unwrap() = Some(identity);
        self
    }

    /// Make every call to `operation` fail with `code`.
    pub fn fail(&self, operation: &'static str, code: ProviderErrorCode, message: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert(operation, ProviderError::new(code, message));
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, operation: &str) -> usize {
        self.calls().iter().filter(|call| **call == operation).count()
    }

    pub fn current(&self) -> Option<Identity> {
        self.current.lock().unwrap().clone()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().unwrap().len()
    }

    /// Push a session change as if it happened outside any flow.
    pub fn emit(&self, identity: Option<Identity>) {
        *self.current.lock().unwrap() = identity;
        self.notify();
    }

    fn record(&self, operation: &'static str) -> Result<(), ProviderError> {
        self.calls.lock().unwrap().push(operation);
        match self.failures.lock().unwrap().get(operation) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn notify(&self) {
        let current = self.current();
        let callbacks: Vec<SessionCallback> =
            self.listeners.lock().unwrap().values().cloned().collect();
        for callback in callbacks {
            callback(current.clone());
        }
    }

    fn identity_for(email: &str, verified: bool) -> Identity {
        Identity::builder()
            .uid(format!("uid:{email}"))
            .email(email)
            .email_verified(verified)
            .build()
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    fn provider_name(&self) -> &str {
        "mock"
    }

    fn subscribe_session_changes(&self, callback: SessionCallback) -> ProviderSubscription {
        let id = {
            let mut next = self.next_listener.lock().unwrap();
            *next += 1;
            *next
        };
        self.listeners.lock().unwrap().insert(id, callback.clone());
        callback(self.current());

        let registry = Arc::downgrade(&self.listeners);
        ProviderSubscription::new(move || {
            if let Some(registry) = registry.upgrade() {
                registry.lock().unwrap().remove(&id);
            }
        })
    }

    async fn sign_in_federated(&self) -> Result<Identity, ProviderError> {
        self.record("sign_in_federated")?;
        let identity = self.federated.lock().unwrap().clone().ok_or_else(|| {
            ProviderError::new(ProviderErrorCode::PopupClosed, "popup closed by user")
        })?;
        self.emit(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, ProviderError> {
        self.record("sign_in_with_password")?;
        let account = self.accounts.lock().unwrap().get(email).cloned();
        let identity = match account {
            None => {
                return Err(ProviderError::new(
                    ProviderErrorCode::UserNotFound,
                    "user not found",
                ))
            }
            Some((expected, _)) if expected != password => {
                return Err(ProviderError::new(
                    ProviderErrorCode::WrongPassword,
                    "wrong password",
                ))
            }
            Some((_, verified)) => Self::identity_for(email, verified),
        };
        self.emit(Some(identity.clone()));
        Ok(identity)
    }

    async fn create_account(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, ProviderError> {
        self.record("create_account")?;
        {
            let mut accounts = self.accounts.lock().unwrap();
            if accounts.contains_key(email) {
                return Err(ProviderError::new(
                    ProviderErrorCode::EmailAlreadyInUse,
                    "email already in use",
                ));
            }
            accounts.insert(email.to_string(), (password.to_string(), false));
        }
        let identity = Self::identity_for(email, false);
        self.emit(Some(identity.clone()));
        Ok(identity)
    }

    async fn send_verification_email(&self, _identity: &Identity) -> Result<(), ProviderError> {
        self.record("send_verification_email")
    }

    async fn send_password_reset(&self, _email: &str) -> Result<(), ProviderError> {
        self.record("send_password_reset")
    }

    async fn end_session(&self) -> Result<(), ProviderError> {
        self.record("end_session")?;
        self.emit(None);
        Ok(())
    }
}

/// Verified identity for route tests.
pub fn verified(uid: &str) -> Identity {
    Identity::builder()
        .uid(uid)
        .email(format!("{uid}@x.com"))
        .email_verified(true)
        .build()
}

/// Unverified identity for route tests.
pub fn unverified(uid: &str) -> Identity {
    Identity::builder()
        .uid(uid)
        .email(format!("{uid}@x.com"))
        .build()
}
