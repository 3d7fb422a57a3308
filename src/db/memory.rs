//! In-memory profile store for tests and offline development.

use crate::db::ProfileStore;
use crate::error::AppError;
use crate::models::UserProfile;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Profile store keyed by uid, with upsert semantics like Firestore `set`.
#[derive(Default)]
pub struct InMemoryProfileStore {
    profiles: DashMap<String, UserProfile>,
    writes: AtomicUsize,
    unavailable: AtomicBool,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct profile documents.
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Number of upserts performed, including overwrites.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Simulate a database outage.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), AppError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::Database(
                "in-memory profile store marked unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn upsert_profile(&self, profile: &UserProfile) -> Result<(), AppError> {
        self.check_available()?;
        self.profiles.insert(profile.uid.clone(), profile.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn get_profile(&self, uid: &str) -> Result<Option<UserProfile>, AppError> {
        self.check_available()?;
        Ok(self.profiles.get(uid).map(|profile| profile.clone()))
    }
}
