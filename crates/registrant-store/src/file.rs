//! JSON file backed registrant store.

use crate::error::StoreError;
use crate::store::{upsert, RegistrantStore};
use crate::types::{Registrant, Registration};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

/// Registrant store that keeps every registrant in a single JSON file.
///
/// The whole file is rewritten after each upsert. A failed write leaves both
/// the file and the in-memory view untouched.
#[derive(Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    registrants: Arc<RwLock<HashMap<String, Registrant>>>,
}

impl JsonFileStore {
    /// Open the store at `path`, loading existing registrants.
    ///
    /// A missing file starts an empty store; it is created on first write.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let registrants = load(&path).await?;

        info!(
            "Loaded {} registrants from {:?}",
            registrants.len(),
            path
        );

        Ok(Self {
            path,
            registrants: Arc::new(RwLock::new(registrants)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, registrants: &HashMap<String, Registrant>) -> Result<(), StoreError> {
        let mut rows: Vec<&Registrant> = registrants.values().collect();
        rows.sort_by(|a, b| a.email().cmp(b.email()));
        let data = serde_json::to_vec_pretty(&rows)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        // Write atomically using temp file + rename
        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, &data).await?;
        fs::rename(&temp_path, &self.path).await?;

        debug!(
            "Saved {} registrants ({} bytes) to {:?}",
            rows.len(),
            data.len(),
            self.path
        );
        Ok(())
    }
}

async fn load(path: &Path) -> Result<HashMap<String, Registrant>, StoreError> {
    let data = match fs::read(path).await {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("Registrant file not found at {:?}, starting empty", path);
            return Ok(HashMap::new());
        }
        Err(e) => return Err(e.into()),
    };
    if data.iter().all(u8::is_ascii_whitespace) {
        return Ok(HashMap::new());
    }

    let rows: Vec<Registrant> = serde_json::from_slice(&data)?;
    Ok(rows
        .into_iter()
        .map(|r| (r.email().to_string(), r))
        .collect())
}

#[async_trait]
impl RegistrantStore for JsonFileStore {
    #[instrument(skip(self, registration), fields(email = %registration.email))]
    async fn add_registration(
        &self,
        registration: &Registration,
    ) -> Result<Registrant, StoreError> {
        let mut registrants = self.registrants.write().await;

        let mut next = registrants.clone();
        let registrant = upsert(&mut next, registration);
        self.persist(&next).await?;
        *registrants = next;

        Ok(registrant)
    }

    async fn get(&self, email: &str) -> Result<Option<Registrant>, StoreError> {
        let registrants = self.registrants.read().await;
        Ok(registrants.get(&email.to_lowercase()).cloned())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.registrants.read().await.len())
    }
}
