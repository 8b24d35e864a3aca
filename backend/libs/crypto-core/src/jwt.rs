//! Identity token issuing and validation for readerblog services
//!
//! Tokens are HS256-signed JWTs carrying the username (`sub`), the role name,
//! and `iat`/`exp` timestamps. The signing secret is handed to [`JwtKeys`]
//! at construction; nothing is kept in process globals, so several key sets
//! can coexist (one per test, for instance).
//!
//! ## Usage
//!
//! ```rust
//! use chrono::Duration;
//! use crypto_core::jwt::JwtKeys;
//!
//! let keys = JwtKeys::new(&"s".repeat(32), Duration::hours(24)).unwrap();
//! let token = keys.issue("octocat1", "writer").unwrap();
//! let claims = keys.validate(&token).unwrap();
//! assert_eq!(claims.sub, "octocat1");
//! ```

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Constants
// ============================================================================

/// Default token lifetime
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

/// Minimum accepted secret length in bytes
pub const MIN_SECRET_LEN: usize = 32;

const JWT_ALGORITHM: Algorithm = Algorithm::HS256;

// ============================================================================
// Data Structures
// ============================================================================

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (normalized username)
    pub sub: String,
    /// Role name as configured for the deployment
    pub role: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Expiry as a UTC timestamp
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(self.exp, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Time left before natural expiry, zero once expired
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        let left = self.expires_at() - now;
        if left < Duration::zero() {
            Duration::zero()
        } else {
            left
        }
    }

    /// How long [`JwtKeys::validate`] keeps accepting the token from `now` on.
    ///
    /// `exp` is compared against the current whole second, so the token is
    /// still accepted during the second that `exp` names.
    pub fn accepted_for(&self, now: DateTime<Utc>) -> Duration {
        self.remaining(now - Duration::seconds(1))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("JWT secret too short: {0} bytes, need at least {MIN_SECRET_LEN}")]
    WeakSecret(usize),

    #[error("Token validation failed: {0}")]
    Invalid(String),

    #[error("Token expired")]
    Expired,

    #[error("Failed to sign token: {0}")]
    Signing(String),
}

// ============================================================================
// Key Storage
// ============================================================================

/// Signing and verification keys plus the token lifetime
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtKeys")
            .field("secret", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl JwtKeys {
    /// Build keys from a shared HMAC secret.
    ///
    /// Rejects secrets shorter than [`MIN_SECRET_LEN`] bytes.
    pub fn new(secret: &str, ttl: Duration) -> Result<Self, JwtError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(JwtError::WeakSecret(secret.len()));
        }

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    // ========================================================================
    // Token Generation
    // ========================================================================

    /// Issue a token for `subject` with `role`, valid for the configured ttl
    pub fn issue(&self, subject: &str, role: &str) -> Result<String, JwtError> {
        self.issue_at(subject, role, Utc::now())
    }

    /// Issue a token as if the current time were `issued_at`
    pub fn issue_at(
        &self,
        subject: &str,
        role: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<String, JwtError> {
        let claims = Claims {
            sub: subject.to_string(),
            role: role.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.ttl).timestamp(),
        };

        encode(&Header::new(JWT_ALGORITHM), &claims, &self.encoding)
            .map_err(|e| JwtError::Signing(e.to_string()))
    }

    // ========================================================================
    // Token Validation
    // ========================================================================

    /// Validate signature and expiry and return the claims.
    ///
    /// Expired tokens yield [`JwtError::Expired`]; anything malformed,
    /// unsigned, signed with another key, or using another algorithm yields
    /// [`JwtError::Invalid`].
    pub fn validate(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.validate_exp = true;
        validation.leeway = 0;

        self.decode_with(token, &validation)
    }

    /// Validate the signature only, accepting tokens past their expiry.
    ///
    /// Logout needs the `exp` of a token even when it has already expired.
    pub fn decode_ignoring_expiry(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.validate_exp = false;

        self.decode_with(token, &validation)
    }

    fn decode_with(&self, token: &str, validation: &Validation) -> Result<Claims, JwtError> {
        decode::<Claims>(token, &self.decoding, validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => {
                    tracing::debug!(error = %e, "JWT rejected");
                    JwtError::Invalid(e.to_string())
                }
            })
    }
}

// ============================================================================
// Tests
// ============================================================================
