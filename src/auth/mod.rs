//! Identity provider surface, identities and the credential error taxonomy.

pub mod error;
pub mod identity;
pub mod memory;
pub mod provider;

pub use error::{CredentialRejection, FlowError, FlowOperation, ProviderError, ProviderErrorCode};
pub use identity::Identity;
pub use memory::{MailKind, MemoryIdentityProvider, SentMail};
pub use provider::{IdentityProvider, ProviderSubscription, SessionCallback};
