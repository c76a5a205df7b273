//! Session controller owning the single provider subscription.
//!
//! Replaces a process-wide "current user" variable with an owned value:
//! - [`SessionController::start`] subscribes once and publishes every change
//! - [`SessionController::stop`] releases the subscription
//! - [`SessionController::watch_status`] lets consumers await changes
//! - [`SessionController::sign_out`] ends the provider session

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::status::SessionStatus;
use crate::auth::{IdentityProvider, ProviderSubscription, SessionCallback};
use crate::error::GateError;

/// Listener invoked synchronously with every newly derived status.
pub type StatusListener = Arc<dyn Fn(&SessionStatus) + Send + Sync>;

/// Handle for a live session subscription.
///
/// Pass it to [`SessionController::stop`] on shutdown. Dropping it releases
/// the provider listener as well, so a remount never leaks listeners.
pub struct Unsubscribe {
    id: u64,
    live: Arc<AtomicBool>,
    subscription: Option<ProviderSubscription>,
}

impl Unsubscribe {
    pub fn id(&self) -> u64 {
        self.id
    }

    fn release(&mut self) {
        self.live.store(false, Ordering::SeqCst);
        if let Some(subscription) = self.subscription.take() {
            subscription.release();
        }
    }
}

impl Drop for Unsubscribe {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unsubscribe")
            .field("id", &self.id)
            .field("live", &self.live.load(Ordering::SeqCst))
            .finish()
    }
}

struct ActiveSubscription {
    id: u64,
    live: Arc<AtomicBool>,
    on_change: StatusListener,
}

/// Owns the session-status value and its provider subscription.
///
/// Share it with `Arc` between the route gate, the flow controller and
/// whichever screens read the session.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use sessiongate::auth::MemoryIdentityProvider;
/// use sessiongate::session::{SessionController, SessionStatus};
///
/// let controller = SessionController::new(Arc::new(MemoryIdentityProvider::new()));
/// assert_eq!(controller.status(), SessionStatus::Unknown);
///
/// let handle = controller.start(|status| println!("now {}", status.label())).unwrap();
/// assert_eq!(controller.status(), SessionStatus::Unauthenticated);
/// controller.stop(handle);
/// ```
pub struct SessionController {
    provider: Arc<dyn IdentityProvider>,
    status_tx: Arc<watch::Sender<SessionStatus>>,
    status_rx: watch::Receiver<SessionStatus>,
    active: Mutex<Option<ActiveSubscription>>,
    next_id: AtomicU64,
}

impl SessionController {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        let (status_tx, status_rx) = watch::channel(SessionStatus::Unknown);
        Self {
            provider,
            status_tx: Arc::new(status_tx),
            status_rx,
            active: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn provider(&self) -> &Arc<dyn IdentityProvider> {
        &self.provider
    }

    /// Current session status.
    pub fn status(&self) -> SessionStatus {
        self.status_rx.borrow().clone()
    }

    /// Subscribe to status changes via a [`watch::Receiver`].
    pub fn watch_status(&self) -> watch::Receiver<SessionStatus> {
        self.status_rx.clone()
    }

    pub fn is_subscribed(&self) -> bool {
        lock(&self.active)
            .as_ref()
            .is_some_and(|active| active.live.load(Ordering::SeqCst))
    }

    /// Register the one provider subscription for this controller.
    ///
    /// The published status is reset to [`SessionStatus::Unknown`] first, so
    /// every fresh subscription starts in the loading state until the
    /// provider reports.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::DoubleSubscription`] if a subscription is live.
    pub fn start<F>(&self, on_change: F) -> Result<Unsubscribe, GateError>
    where
        F: Fn(&SessionStatus) + Send + Sync + 'static,
    {
        let mut active = lock(&self.active);
        if active
            .as_ref()
            .is_some_and(|current| current.live.load(Ordering::SeqCst))
        {
            warn!(
                provider = self.provider.provider_name(),
                "session controller started twice without stop"
            );
            return Err(GateError::DoubleSubscription);
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let live = Arc::new(AtomicBool::new(true));
        let on_change: StatusListener = Arc::new(on_change);
        self.status_tx.send_replace(SessionStatus::Unknown);

        let callback: SessionCallback = {
            let live = live.clone();
            let status_tx = self.status_tx.clone();
            let on_change = on_change.clone();
            Arc::new(move |payload| {
                if !live.load(Ordering::SeqCst) {
                    return;
                }
                let status = SessionStatus::from_payload(payload);
                debug!(subscription = id, status = status.label(), "session status changed");
                status_tx.send_replace(status.clone());
                on_change(&status);
            })
        };

        *active = Some(ActiveSubscription {
            id,
            live: live.clone(),
            on_change,
        });
        drop(active);
        let subscription = self.provider.subscribe_session_changes(callback);

        debug!(
            subscription = id,
            provider = self.provider.provider_name(),
            "session subscription started"
        );
        Ok(Unsubscribe {
            id,
            live,
            subscription: Some(subscription),
        })
    }

    /// Release a subscription. No listener call happens after this returns.
    pub fn stop(&self, mut handle: Unsubscribe) {
        handle.release();
        let mut active = lock(&self.active);
        if active.as_ref().is_some_and(|current| current.id == handle.id) {
            *active = None;
        }
        debug!(subscription = handle.id, "session subscription stopped");
    }

    /// Wait until the provider has reported at least once.
    pub async fn settled(&self) -> SessionStatus {
        let mut rx = self.status_rx.clone();
        if let Ok(status) = rx.wait_for(SessionStatus::is_known).await {
            return status.clone();
        }
        self.status()
    }

    /// End the provider session and publish `Unauthenticated` right away.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Provider`] if the provider refuses.
    pub async fn sign_out(&self) -> Result<(), GateError> {
        self.provider.end_session().await?;

        let changed = self.status_tx.send_if_modified(|status| {
            if *status == SessionStatus::Unauthenticated {
                false
            } else {
                *status = SessionStatus::Unauthenticated;
                true
            }
        });
        if changed {
            let listener = lock(&self.active)
                .as_ref()
                .filter(|current| current.live.load(Ordering::SeqCst))
                .map(|current| current.on_change.clone());
            if let Some(listener) = listener {
                listener(&SessionStatus::Unauthenticated);
            }
        }
        info!(provider = self.provider.provider_name(), "signed out");
        Ok(())
    }
}

impl fmt::Debug for SessionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionController")
            .field("provider", &self.provider.provider_name())
            .field("status", &*self.status_rx.borrow())
            .field("subscribed", &self.is_subscribed())
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
