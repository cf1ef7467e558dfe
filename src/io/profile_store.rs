//! Profile Provider - read access to saved shopper profiles
//!
//! `JsonProfileStore` reads one `<user_id>.json` document per user from a
//! directory. A missing document means the user never saved a profile,
//! which is not an error.

use crate::domain::profile::{UserId, UserProfile};
use async_trait::async_trait;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Source of the current user's measurement set
#[async_trait]
pub trait ProfileProvider: Send + Sync {
    /// Most recently saved profile, or `None` if the user has none yet
    async fn get_profile(&self, user_id: &UserId) -> Result<Option<UserProfile>, ProfileError>;
}

/// Directory of JSON profile documents
#[derive(Debug, Clone)]
pub struct JsonProfileStore {
    dir: PathBuf,
}

impl JsonProfileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, user_id: &UserId) -> Option<PathBuf> {
        let id = user_id.0.as_str();
        if id.is_empty() || id.contains(['/', '\\']) || id.starts_with('.') {
            return None;
        }
        Some(self.dir.join(format!("{id}.json")))
    }
}

#[async_trait]
impl ProfileProvider for JsonProfileStore {
    async fn get_profile(&self, user_id: &UserId) -> Result<Option<UserProfile>, ProfileError> {
        let Some(path) = self.path_for(user_id) else {
            warn!(user_id = %user_id, "profile_id_rejected");
            return Ok(None);
        };

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(user_id = %user_id, path = %path.display(), "profile_not_found");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let profile: UserProfile = serde_json::from_str(&content)?;
        if profile.id != *user_id {
            warn!(user_id = %user_id, document_id = %profile.id, "profile_id_mismatch");
        }
        debug!(user_id = %user_id, updated_at = ?profile.updated_at, "profile_loaded");
        Ok(Some(profile))
    }
}

/// Profiles held in memory, keyed by user
#[derive(Debug, Default)]
pub struct InMemoryProfiles {
    profiles: RwLock<FxHashMap<UserId, UserProfile>>,
}

impl InMemoryProfiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, profile: UserProfile) {
        self.profiles.write().insert(profile.id.clone(), profile);
    }
}

#[async_trait]
impl ProfileProvider for InMemoryProfiles {
    async fn get_profile(&self, user_id: &UserId) -> Result<Option<UserProfile>, ProfileError> {
        Ok(self.profiles.read().get(user_id).cloned())
    }
}
