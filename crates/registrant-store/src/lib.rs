//! Registrant storage for event registrations.
//!
//! Registrants are keyed by lowercase email and upserted: a repeated
//! registration replaces names, capstone flag and roles, but keeps the time
//! the email was first seen.

mod error;
mod file;
mod store;
mod types;

pub use error::StoreError;
pub use file::JsonFileStore;
pub use store::{MemoryStore, RegistrantStore};
pub use types::*;
