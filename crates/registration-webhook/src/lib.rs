//! Registration Webhook - receives event registrations from a survey workflow.
//!
//! The survey tool posts each new registration to `/post/user` with a shared
//! secret in the `api-key` header. Submissions are validated, normalized
//! (lowercase email, role codes mapped to role names, defaults filled in) and
//! upserted into the registrant store.

pub mod api;
pub mod config;
pub mod error;
pub mod intake;

pub use config::Config;
pub use error::IntakeError;
pub use intake::{handle_registration, ApiKey, RegistrationRequest};
