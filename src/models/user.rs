//! User profile model for storage.

use serde::{Deserialize, Serialize};

use crate::time_utils::format_utc_rfc3339;

/// Profile mirror stored in Firestore, keyed by uid.
///
/// Written once when the account is created and never updated afterwards,
/// so it can drift from the identity provider's record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Identity provider user id (also used as document ID)
    pub uid: String,
    /// Display name at creation time
    pub name: String,
    pub email: String,
    /// When the profile was first written (RFC 3339, UTC)
    pub created_at: String,
}

impl UserProfile {
    /// Build a profile stamped with the current time.
    pub fn new(uid: impl Into<String>, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            name: name.into(),
            email: email.into(),
            created_at: format_utc_rfc3339(chrono::Utc::now()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_profile_timestamp_is_utc() {
        let profile = UserProfile::new("u1", "A", "a@x.com");
        assert_eq!(profile.uid, "u1");
        assert!(profile.created_at.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&profile.created_at).is_ok());
    }
}
