use super::Role;
use chrono::{DateTime, Utc};

/// Verified caller identity attached to a request by the JWT middleware
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub username: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
    /// Raw bearer token, kept so logout can revoke it
    pub token: String,
}
