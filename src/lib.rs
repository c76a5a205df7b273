//! Sessiongate: client-side session gate.
//!
//! Tracks whether a user identity is established, runs the credential
//! flows of an auth screen against a pluggable identity provider, and
//! decides which screen a navigation request may render.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use sessiongate::prelude::*;
//!
//! # async fn example() -> sessiongate::error::Result<()> {
//! let provider = Arc::new(MemoryIdentityProvider::new().with_account("a@x.com", "pw123", true));
//! let session = SessionController::new(provider.clone());
//! let _handle = session.start(|_| {})?;
//!
//! let gate = RouteGate::default();
//! assert_eq!(gate.resolve(&session.status(), "/home"), Resolution::Redirect("/auth".into()));
//!
//! let mut flow = CredentialFlowController::new(provider).with_session(session.watch_status());
//! flow.sign_in_with_credentials(&FlowInput::credentials("a@x.com", "pw123")).await?;
//! assert_eq!(gate.resolve(&session.status(), "/auth"), Resolution::Redirect("/home".into()));
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod flow;
pub mod prelude;
pub mod route;
pub mod session;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
