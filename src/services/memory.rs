// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory identity provider for tests and offline development.
//!
//! Issues HS256 ID tokens signed with a process-local secret. Emails are
//! unique case-insensitively, like the real provider.

use crate::services::identity::{
    IdentityError, IdentityProvider, NewUser, SignInResult, TokenClaims, UserRecord,
};
use crate::services::jwks::now_unix_secs;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

const TOKEN_LIFETIME_SECS: i64 = 3600;

#[derive(Debug, Clone)]
struct StoredUser {
    record: UserRecord,
    password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct MemoryTokenClaims {
    sub: String,
    user_id: String,
    email: Option<String>,
    iat: u64,
    exp: u64,
}

/// Identity provider that keeps accounts in process memory.
pub struct InMemoryIdentityProvider {
    users: DashMap<String, StoredUser>,
    uid_by_email: DashMap<String, String>,
    signing_key: Vec<u8>,
    next_uid: AtomicU64,
    unavailable: AtomicBool,
}

impl Default for InMemoryIdentityProvider {
    fn default() -> Self {
        Self::new(b"in-memory-identity-provider-key".to_vec())
    }
}

impl InMemoryIdentityProvider {
    pub fn new(signing_key: Vec<u8>) -> Self {
        tracing::info!("Creating in-memory identity provider");
        Self {
            users: DashMap::new(),
            uid_by_email: DashMap::new(),
            signing_key,
            next_uid: AtomicU64::new(1),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Simulate an unreachable provider: every call fails with `Transport`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of accounts held.
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Issue an ID token for `uid` that expires `lifetime_secs` from now
    /// (negative values produce an already-expired token).
    pub fn issue_token(&self, uid: &str, lifetime_secs: i64) -> String {
        let now = now_unix_secs();
        let email = self
            .users
            .get(uid)
            .and_then(|user| user.record.email.clone());

        let exp = now.saturating_add_signed(lifetime_secs);
        let iat = if lifetime_secs < 0 {
            exp.saturating_sub(TOKEN_LIFETIME_SECS as u64)
        } else {
            now
        };

        let claims = MemoryTokenClaims {
            sub: uid.to_string(),
            user_id: uid.to_string(),
            email,
            iat,
            exp,
        };

        // HS256 over serializable claims cannot fail.
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.signing_key),
        )
        .unwrap_or_default()
    }

    fn check_available(&self) -> Result<(), IdentityError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(IdentityError::Transport(
                "in-memory provider marked unavailable".to_string(),
            ));
        }
        Ok(())
    }

    fn generate_uid(&self) -> String {
        format!("mem-{:06}", self.next_uid.fetch_add(1, Ordering::SeqCst))
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn create_user(&self, user: NewUser) -> Result<UserRecord, IdentityError> {
        self.check_available()?;

        let uid = user.uid.clone().unwrap_or_else(|| self.generate_uid());

        // Lock order: uid shard, then email shard.
        let user_slot = match self.users.entry(uid.clone()) {
            Entry::Occupied(_) => return Err(IdentityError::UidAlreadyExists(uid)),
            Entry::Vacant(slot) => slot,
        };

        let email_slot = match self.uid_by_email.entry(normalize_email(&user.email)) {
            Entry::Occupied(_) => return Err(IdentityError::EmailAlreadyExists(user.email)),
            Entry::Vacant(slot) => slot,
        };

        let record = UserRecord {
            uid: uid.clone(),
            email: Some(user.email),
            display_name: user.display_name,
        };

        email_slot.insert(uid);
        user_slot.insert(StoredUser {
            record: record.clone(),
            password: user.password,
        });

        Ok(record)
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SignInResult, IdentityError> {
        self.check_available()?;

        let uid = self
            .uid_by_email
            .get(&normalize_email(email))
            .map(|uid| uid.clone())
            .ok_or_else(|| IdentityError::Provider("EMAIL_NOT_FOUND".to_string()))?;

        let record = {
            let stored = self
                .users
                .get(&uid)
                .ok_or_else(|| IdentityError::UserNotFound(uid.clone()))?;

            if stored.password.as_deref() != Some(password) {
                return Err(IdentityError::Provider("INVALID_PASSWORD".to_string()));
            }
            stored.record.clone()
        };

        Ok(SignInResult {
            id_token: self.issue_token(&uid, TOKEN_LIFETIME_SECS),
            uid,
            email: record.email.unwrap_or_else(|| email.to_string()),
            display_name: record.display_name,
        })
    }

    async fn get_user(&self, uid: &str) -> Result<UserRecord, IdentityError> {
        self.check_available()?;

        self.users
            .get(uid)
            .map(|stored| stored.record.clone())
            .ok_or_else(|| IdentityError::UserNotFound(uid.to_string()))
    }

    async fn verify_id_token(&self, token: &str) -> Result<TokenClaims, IdentityError> {
        self.check_available()?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<MemoryTokenClaims>(
            token.trim(),
            &DecodingKey::from_secret(&self.signing_key),
            &validation,
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => IdentityError::ExpiredIdToken,
            _ => IdentityError::InvalidIdToken(format!("JWT validation failed: {e}")),
        })?;

        Ok(TokenClaims {
            uid: data.claims.sub,
            expires_at: data.claims.exp,
        })
    }
}
