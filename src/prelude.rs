//! Convenience re-exports for common use.

pub use crate::auth::{
    FlowError, Identity, IdentityProvider, MemoryIdentityProvider, ProviderError,
    ProviderErrorCode,
};
pub use crate::config::GateConfig;
pub use crate::error::{GateError, Result};
pub use crate::flow::{CredentialFlowController, FlowInput, FlowMode, FlowOutcome};
pub use crate::route::{Resolution, Route, RouteGate};
pub use crate::session::{SessionController, SessionStatus, Unsubscribe};
