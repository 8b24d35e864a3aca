use crate::validators::{normalize_identifier, validate_username_shape};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Credential record as stored in the `users` table
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub subscribers: i64,
    pub followed: i64,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Fields needed to insert a user; identifiers already normalized
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
}

/// Partial update applied by the admin endpoints
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<String>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.password_hash.is_none() && self.role.is_none()
    }
}

// ============================================================================
// Responses
// ============================================================================

/// Public profile view, never carries the password hash
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileResponse {
    pub username: String,
    pub email: String,
    pub role: String,
    pub subscribers: i64,
    pub followed: i64,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for ProfileResponse {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role.clone(),
            subscribers: user.subscribers,
            followed: user.followed,
            image: user.image.clone(),
            created_at: user.created_at,
        }
    }
}

/// Admin view: the profile plus bookkeeping columns
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserResponse {
    pub id: Uuid,
    #[serde(flatten)]
    pub profile: ProfileResponse,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            profile: ProfileResponse::from(user),
            updated_at: user.updated_at,
            deleted_at: user.deleted_at,
        }
    }
}

// ============================================================================
// Requests
// ============================================================================

/// Self-registration payload
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(custom(function = "validate_username_shape"))]
    pub username: String,

    #[validate(email(message = "invalid email address"))]
    pub email: String,

    #[validate(length(min = 8, max = 128, message = "password must be 8-128 characters"))]
    pub password: String,

    #[validate(must_match(other = "password", message = "passwords do not match"))]
    pub password_confirmation: String,
}

impl RegisterRequest {
    pub fn normalize(&mut self) {
        self.username = normalize_identifier(&self.username);
        self.email = normalize_identifier(&self.email);
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "username is required"))]
    pub username: String,

    #[validate(length(min = 1, max = 128, message = "password is required"))]
    pub password: String,
}

/// Admin user creation; role defaults to the writer role when absent
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(custom(function = "validate_username_shape"))]
    pub username: String,

    #[validate(email(message = "invalid email address"))]
    pub email: String,

    #[validate(length(min = 8, max = 128, message = "password must be 8-128 characters"))]
    pub password: String,

    #[validate(must_match(other = "password", message = "passwords do not match"))]
    pub password_confirmation: String,

    pub role: Option<String>,
}

impl CreateUserRequest {
    pub fn normalize(&mut self) {
        self.username = normalize_identifier(&self.username);
        self.email = normalize_identifier(&self.email);
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(email(message = "invalid email address"))]
    pub email: Option<String>,

    #[validate(length(min = 8, max = 128, message = "password must be 8-128 characters"))]
    pub password: Option<String>,

    pub password_confirmation: Option<String>,

    pub role: Option<String>,
}

impl UpdateUserRequest {
    pub fn normalize(&mut self) {
        if let Some(email) = self.email.as_mut() {
            *email = normalize_identifier(email);
        }
    }

    /// A new password must come with a matching confirmation
    pub fn password_confirmed(&self) -> bool {
        match &self.password {
            Some(password) => self.password_confirmation.as_deref() == Some(password.as_str()),
            None => true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SetRoleRequest {
    #[validate(length(min = 1, message = "role is required"))]
    pub role: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListUsersQuery {
    #[serde(default)]
    pub deleted: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    pub force: bool,
}
