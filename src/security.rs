use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
};
use argon2::{Algorithm, Argon2, Params, Version};
use axum::http::HeaderMap;
use std::net::SocketAddr;
use thiserror::Error;

use crate::constants::UNKNOWN_CLIENT;

// =============================================================================
// Password Hashing
// =============================================================================

/// Errors from hashing or verifying a password
#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("Invalid hash parameters: {0}")]
    Params(argon2::Error),

    #[error("Password hashing failed: {0}")]
    Hash(argon2::password_hash::Error),

    #[error("Stored password hash is malformed: {0}")]
    MalformedHash(argon2::password_hash::Error),
}

/// Argon2id hasher with a fixed work factor
///
/// Every hash gets a fresh random salt and is stored in PHC string format,
/// so verification reads the salt and parameters back out of the stored
/// value. A stored hash keeps verifying even after the configured work
/// factor changes.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    params: Params,
}

impl PasswordHasher {
    /// Create a hasher using `memory_kib` KiB, `iterations` passes and
    /// `parallelism` lanes
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self, PasswordError> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(PasswordError::Params)?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a password with a new random salt
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(PasswordError::Hash)?;
        Ok(hash.to_string())
    }

    /// Check a password against a stored PHC hash
    ///
    /// Returns `Ok(false)` for a wrong password and an error only when the
    /// stored hash cannot be parsed or verification itself fails.
    pub fn verify(&self, password: &str, stored_hash: &str) -> Result<bool, PasswordError> {
        let parsed = PasswordHash::new(stored_hash).map_err(PasswordError::MalformedHash)?;
        match self.argon2().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(PasswordError::Hash(e)),
        }
    }
}

// =============================================================================
// Client Identity (Rate Limit Key)
// =============================================================================

/// Turns a request into the key the rate limiter counts against.
///
/// Header-derived identities can be forged by any client, so the limiter
/// built on top of this is abuse protection, not a security boundary.
pub trait ClientIdentityResolver: Send + Sync {
    fn resolve(&self, headers: &HeaderMap, peer: Option<SocketAddr>) -> String;
}

/// Prefers proxy headers, then the socket address
///
/// Order: first `X-Forwarded-For` entry, `X-Real-IP`, peer address.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForwardedForResolver;

impl ClientIdentityResolver for ForwardedForResolver {
    fn resolve(&self, headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|value| !value.is_empty());

        let real_ip = headers
            .get("x-real-ip")
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty());

        match forwarded.or(real_ip) {
            Some(ip) => ip.to_string(),
            None => PeerAddrResolver.resolve(headers, peer),
        }
    }
}

/// Uses only the socket peer address
#[derive(Debug, Clone, Copy, Default)]
pub struct PeerAddrResolver;

impl ClientIdentityResolver for PeerAddrResolver {
    fn resolve(&self, _headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
        peer.map(|addr| addr.ip().to_string())
            .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
    }
}
