//! Registrant store trait and in-memory backend.

use crate::error::StoreError;
use crate::types::{Registrant, Registration};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

/// Storage for registrants, keyed by lowercase email.
///
/// Implementations upsert: registering an email that already exists replaces
/// its details and keeps the original registration time.
#[async_trait]
pub trait RegistrantStore: Send + Sync {
    /// Insert or update the registrant for `registration.email`.
    async fn add_registration(&self, registration: &Registration)
        -> Result<Registrant, StoreError>;

    /// Look up a registrant by email.
    async fn get(&self, email: &str) -> Result<Option<Registrant>, StoreError>;

    /// Number of stored registrants.
    async fn count(&self) -> Result<usize, StoreError>;
}

/// Upsert into a map of registrants, returning the stored record.
pub(crate) fn upsert(
    registrants: &mut HashMap<String, Registrant>,
    registration: &Registration,
) -> Registrant {
    match registrants.get_mut(&registration.email) {
        Some(existing) => {
            existing.apply(registration.clone());
            debug!(email = %registration.email, "Updated existing registrant");
            existing.clone()
        }
        None => {
            let registrant = Registrant::new(registration.clone());
            registrants.insert(registration.email.clone(), registrant.clone());
            debug!(email = %registration.email, "Inserted new registrant");
            registrant
        }
    }
}

/// In-memory registrant store. Contents are lost on restart.
#[derive(Clone, Default)]
pub struct MemoryStore {
    registrants: Arc<RwLock<HashMap<String, Registrant>>>,
}

impl MemoryStore {
    /// Create an empty in-memory store.
    pub fn new() -> Self {
        info!("In-memory registrant store initialized");
        Self::default()
    }
}

#[async_trait]
impl RegistrantStore for MemoryStore {
    #[instrument(skip(self, registration), fields(email = %registration.email))]
    async fn add_registration(
        &self,
        registration: &Registration,
    ) -> Result<Registrant, StoreError> {
        let mut registrants = self.registrants.write().await;
        Ok(upsert(&mut registrants, registration))
    }

    async fn get(&self, email: &str) -> Result<Option<Registrant>, StoreError> {
        let registrants = self.registrants.read().await;
        Ok(registrants.get(&email.to_lowercase()).cloned())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.registrants.read().await.len())
    }
}
