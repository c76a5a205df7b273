//! Session status derivation and the single-subscription session controller.

pub mod controller;
pub mod status;

pub use controller::{SessionController, StatusListener, Unsubscribe};
pub use status::SessionStatus;
