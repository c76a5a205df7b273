//! Credential flow controller for the auth screen.
//!
//! Owns the form state (mode, email, password, last error/notice) and runs
//! the sign-in, registration and password-reset flows against an
//! [`IdentityProvider`], converting every provider failure into a
//! [`FlowError`].

use std::sync::Arc;
use std::time::Duration;

use strum::{Display, EnumString};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::auth::{FlowError, FlowOperation, Identity, IdentityProvider};
use crate::config::{GateConfig, VerificationPolicy};
use crate::error::GateError;
use crate::session::SessionStatus;
use crate::util::timeout::with_timeout;

/// Mutually exclusive modes of the auth screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum FlowMode {
    #[default]
    SignIn,
    Register,
    ResetPassword,
}

/// Values submitted by the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowInput {
    pub email: String,
    /// Absent in [`FlowMode::ResetPassword`].
    pub password: Option<String>,
}

impl FlowInput {
    pub fn credentials(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: Some(password.into()),
        }
    }

    pub fn email_only(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: None,
        }
    }

    fn password(&self) -> &str {
        self.password.as_deref().unwrap_or_default()
    }
}

/// Successful end of a flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowOutcome {
    SignedIn(Identity),
    Registered { email: String },
    ResetSent { email: String },
}

impl FlowOutcome {
    /// Confirmation shown to the user.
    pub fn notice(&self) -> &'static str {
        match self {
            Self::SignedIn(_) => "Login successful",
            Self::Registered { .. } => {
                "Account created. Check your email to verify before logging in."
            }
            Self::ResetSent { .. } => "Password reset email sent. Check your inbox.",
        }
    }
}

/// State machine behind the auth screen.
///
/// Created when the screen mounts and dropped when it unmounts. Operations
/// are independent of each other and safe to retry.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use sessiongate::auth::MemoryIdentityProvider;
/// use sessiongate::flow::{CredentialFlowController, FlowInput, FlowMode};
///
/// # async fn example() {
/// let provider = Arc::new(MemoryIdentityProvider::new());
/// let mut flow = CredentialFlowController::new(provider);
/// flow.switch_mode(FlowMode::Register);
/// flow.register(&FlowInput::credentials("a@x.com", "pw123456")).await.unwrap();
/// assert_eq!(flow.mode(), FlowMode::SignIn);
/// # }
/// ```
pub struct CredentialFlowController {
    provider: Arc<dyn IdentityProvider>,
    policy: VerificationPolicy,
    settle_timeout: Option<Duration>,
    session: Option<watch::Receiver<SessionStatus>>,
    mode: FlowMode,
    email: String,
    password: String,
    last_error: Option<FlowError>,
    notice: Option<String>,
}

impl CredentialFlowController {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            provider,
            policy: VerificationPolicy::default(),
            settle_timeout: GateConfig::default().flow.settle_timeout(),
            session: None,
            mode: FlowMode::default(),
            email: String::new(),
            password: String::new(),
            last_error: None,
            notice: None,
        }
    }

    pub fn from_config(provider: Arc<dyn IdentityProvider>, config: &GateConfig) -> Self {
        Self::new(provider)
            .with_policy(config.policy.clone())
            .with_settle_timeout(config.flow.settle_timeout())
    }

    pub fn with_policy(mut self, policy: VerificationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// `None` disables waiting for the session to settle.
    pub fn with_settle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.settle_timeout = timeout;
        self
    }

    /// Attach the session status channel so sign-ins only report success
    /// once the session controller has observed the new identity.
    ///
    /// Without it, callers must not assume the session status is updated
    /// when a flow resolves. If the channel closes or the settle timeout
    /// expires first, the sign-in fails with [`FlowError::FlowFailed`] and
    /// the provider session is ended.
    pub fn with_session(mut self, status: watch::Receiver<SessionStatus>) -> Self {
        self.session = Some(status);
        self
    }

    pub fn mode(&self) -> FlowMode {
        self.mode
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn last_error(&self) -> Option<&FlowError> {
        self.last_error.as_ref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn set_email(&mut self, email: impl Into<String>) {
        self.email = email.into();
    }

    pub fn set_password(&mut self, password: impl Into<String>) {
        self.password = password.into();
    }

    /// Form values for the active mode.
    pub fn input(&self) -> FlowInput {
        match self.mode {
            FlowMode::ResetPassword => FlowInput::email_only(self.email.clone()),
            FlowMode::SignIn | FlowMode::Register => {
                FlowInput::credentials(self.email.clone(), self.password.clone())
            }
        }
    }

    /// Change mode. Clears the error and notice, keeps the email.
    pub fn switch_mode(&mut self, target: FlowMode) {
        debug!(from = %self.mode, to = %target, "switching credential flow mode");
        self.mode = target;
        self.last_error = None;
        self.notice = None;
    }

    /// Run the operation that belongs to the active mode.
    pub async fn submit(&mut self) -> Result<FlowOutcome, FlowError> {
        let input = self.input();
        match self.mode {
            FlowMode::SignIn => self.sign_in_with_credentials(&input).await,
            FlowMode::Register => self.register(&input).await,
            FlowMode::ResetPassword => self.send_reset(&input.email).await,
        }
    }

    /// Popup-based federated sign-in.
    pub async fn sign_in_federated(&mut self) -> Result<FlowOutcome, FlowError> {
        let result = self.run_federated().await;
        self.record(FlowOperation::Federated, result)
    }

    /// Email/password sign-in gated on a verified email.
    pub async fn sign_in_with_credentials(
        &mut self,
        input: &FlowInput,
    ) -> Result<FlowOutcome, FlowError> {
        let result = self.run_credentials(input).await;
        self.record(FlowOperation::Credentials, result)
    }

    /// Create an account and dispatch its verification email.
    pub async fn register(&mut self, input: &FlowInput) -> Result<FlowOutcome, FlowError> {
        let result = self.run_register(input).await;
        self.record(FlowOperation::Register, result)
    }

    /// Dispatch a password-reset email.
    pub async fn send_reset(&mut self, email: &str) -> Result<FlowOutcome, FlowError> {
        let result = self
            .provider
            .send_password_reset(email)
            .await
            .map(|()| FlowOutcome::ResetSent {
                email: email.to_string(),
            })
            .map_err(|err| FlowError::classify(FlowOperation::Reset, err));
        self.record(FlowOperation::Reset, result)
    }

    // -- Internal helpers --

    async fn run_federated(&self) -> Result<FlowOutcome, FlowError> {
        let identity = self
            .provider
            .sign_in_federated()
            .await
            .map_err(|err| FlowError::classify(FlowOperation::Federated, err))?;

        // The route gate would send this identity back to the auth screen.
        if self.policy.require_verified_email && !identity.email_verified {
            self.end_unverified_session().await;
            return Err(FlowError::EmailNotVerified);
        }

        self.settle(&identity).await?;
        Ok(FlowOutcome::SignedIn(identity))
    }

    async fn run_credentials(&self, input: &FlowInput) -> Result<FlowOutcome, FlowError> {
        let identity = self
            .provider
            .sign_in_with_password(&input.email, input.password())
            .await
            .map_err(|err| FlowError::classify(FlowOperation::Credentials, err))?;

        if !identity.email_verified {
            self.end_unverified_session().await;
            return Err(FlowError::EmailNotVerified);
        }

        self.settle(&identity).await?;
        Ok(FlowOutcome::SignedIn(identity))
    }

    async fn run_register(&self, input: &FlowInput) -> Result<FlowOutcome, FlowError> {
        let identity = self
            .provider
            .create_account(&input.email, input.password())
            .await
            .map_err(|err| FlowError::classify(FlowOperation::Register, err))?;

        let dispatched = self
            .provider
            .send_verification_email(&identity)
            .await
            .map_err(|err| FlowError::classify(FlowOperation::Register, err));

        if !identity.email_verified {
            self.end_unverified_session().await;
        }
        dispatched?;

        Ok(FlowOutcome::Registered {
            email: identity.email.unwrap_or_else(|| input.email.clone()),
        })
    }

    /// Leave no unverified identity signed in, if the policy asks for it.
    async fn end_unverified_session(&self) {
        if self.policy.end_unverified_sessions {
            self.end_session_quietly("unverified").await;
        }
    }

    async fn end_session_quietly(&self, reason: &'static str) {
        if let Err(err) = self.provider.end_session().await {
            warn!(
                provider = self.provider.provider_name(),
                reason,
                error = %err,
                "failed to end provider session"
            );
        }
    }

    /// Wait for the session to observe `identity`. A sign-in that never
    /// settles is rolled back so no provider session outlives the error.
    async fn settle(&self, identity: &Identity) -> Result<(), FlowError> {
        let result = self.await_session(&identity.uid).await;
        if result.is_err() {
            self.end_session_quietly("unsettled").await;
        }
        result
    }

    /// Wait until the attached session channel reports `uid`.
    async fn await_session(&self, uid: &str) -> Result<(), FlowError> {
        let (Some(status), Some(timeout)) = (self.session.as_ref(), self.settle_timeout) else {
            return Ok(());
        };
        let mut status = status.clone();
        let observed = with_timeout(timeout, async move {
            let observed = status
                .wait_for(|s| s.identity().is_some_and(|identity| identity.uid == uid))
                .await
                .is_ok();
            Ok::<bool, GateError>(observed)
        })
        .await;
        match observed {
            Ok(true) => Ok(()),
            Ok(false) => Err(FlowError::FlowFailed(
                "session closed before the sign-in was observed".to_string(),
            )),
            Err(err) => Err(FlowError::FlowFailed(format!(
                "session did not settle: {err}"
            ))),
        }
    }

    fn record(
        &mut self,
        operation: FlowOperation,
        result: Result<FlowOutcome, FlowError>,
    ) -> Result<FlowOutcome, FlowError> {
        match &result {
            Ok(outcome) => {
                info!(%operation, provider = self.provider.provider_name(), "credential flow succeeded");
                if matches!(
                    outcome,
                    FlowOutcome::Registered { .. } | FlowOutcome::ResetSent { .. }
                ) {
                    self.mode = FlowMode::SignIn;
                }
                self.last_error = None;
                self.notice = Some(outcome.notice().to_string());
            }
            Err(err) => {
                warn!(%operation, provider = self.provider.provider_name(), error = %err, "credential flow failed");
                self.last_error = Some(err.clone());
                self.notice = None;
            }
        }
        result
    }
}
