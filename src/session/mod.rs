//! Authenticated session handling

pub mod controller;
pub mod passcode;
pub mod profile;

pub use controller::{Authenticated, Credentials, SessionController, SessionState};
pub use passcode::{PasscodePrompt, PasscodeRequest};
pub use profile::SessionProfile;
