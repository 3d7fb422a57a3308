// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - external provider clients.

pub mod firebase;
pub mod google;
pub mod identity;
pub mod jwks;
pub mod memory;

pub use firebase::FirebaseAuth;
pub use google::{GoogleIdTokenVerifier, GoogleIdentity, GoogleTokenVerifier};
pub use identity::{
    IdentityError, IdentityProvider, NewUser, SignInResult, TokenClaims, UserRecord,
};
pub use jwks::{JwksSource, JwksVerifier, TokenError};
pub use memory::InMemoryIdentityProvider;
