//! Database layer (Firestore).

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::InMemoryProfileStore;

use crate::error::AppError;
use crate::models::UserProfile;
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    /// User profile mirrors (keyed by uid)
    pub const USERS: &str = "users";
}

/// Profile document operations used by the handlers.
#[async_trait]
pub trait ProfileStore: Send + Sync + 'static {
    /// Create or overwrite the profile document for `profile.uid`.
    async fn upsert_profile(&self, profile: &UserProfile) -> Result<(), AppError>;

    /// Get a profile by uid.
    async fn get_profile(&self, uid: &str) -> Result<Option<UserProfile>, AppError>;
}
