use crate::config::{RevocationFailurePolicy, RoleSettings};
use crate::db::UserRepository;
use crate::error::{AppError, Result};
use crate::metrics;
use crate::models::{
    AuthenticatedUser, NewUser, ProfileResponse, RegisterRequest, User,
};
use crate::security::{PasswordHasher, RevocationStore};
use crate::validators::normalize_identifier;
use chrono::Utc;
use crypto_core::jwt::JwtKeys;
use std::sync::Arc;
use validator::Validate;

/// Credential verification, token lifecycle and profile lookup
///
/// A token is `Issued` by [`AuthService::register`] or
/// [`AuthService::authenticate`] and ends either `Expired` (by time) or
/// `Revoked` (by [`AuthService::logout`]); both are rejected by
/// [`AuthService::verify_access`].
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    revocations: Arc<dyn RevocationStore>,
    hasher: PasswordHasher,
    jwt: JwtKeys,
    roles: RoleSettings,
    revocation_policy: RevocationFailurePolicy,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        revocations: Arc<dyn RevocationStore>,
        hasher: PasswordHasher,
        jwt: JwtKeys,
        roles: RoleSettings,
        revocation_policy: RevocationFailurePolicy,
    ) -> Self {
        Self {
            users,
            revocations,
            hasher,
            jwt,
            roles,
            revocation_policy,
        }
    }

    fn issue_token(&self, user: &User) -> Result<String> {
        Ok(self.jwt.issue(&user.username, &user.role)?)
    }

    /// Verify a username/password pair and issue a token.
    ///
    /// Unknown users, soft-deleted users and wrong passwords all yield the
    /// same `AuthFailed`, after the same Argon2 work.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<String> {
        let username = normalize_identifier(username);

        let user = match self.users.find_by_username(&username).await? {
            Some(user) => user,
            None => {
                match self.hasher.verify_decoy_blocking(password.to_string()).await {
                    Err(AppError::AuthFailed) | Ok(()) => {}
                    Err(e) => return Err(e),
                }
                tracing::debug!("login rejected: unknown user");
                metrics::record_login(false);
                return Err(AppError::AuthFailed);
            }
        };

        if let Err(e) = self
            .hasher
            .verify_blocking(user.password_hash.clone(), password.to_string())
            .await
        {
            if matches!(e, AppError::AuthFailed) {
                tracing::debug!(user_id = %user.id, "login rejected: password mismatch");
                metrics::record_login(false);
            }
            return Err(e);
        }

        let token = self.issue_token(&user)?;
        metrics::record_login(true);
        tracing::info!(user_id = %user.id, "User logged in");

        Ok(token)
    }

    /// Create a writer account and sign it in
    pub async fn register(&self, mut data: RegisterRequest) -> Result<(ProfileResponse, String)> {
        data.normalize();
        if let Err(e) = data.validate() {
            metrics::record_registration("invalid");
            return Err(e.into());
        }

        let password_hash = self.hasher.hash_blocking(data.password).await?;

        let user = match self
            .users
            .insert(NewUser {
                username: data.username,
                email: data.email,
                password_hash,
                role: self.roles.default_name().to_string(),
            })
            .await
        {
            Ok(user) => user,
            Err(e) => {
                if matches!(e, AppError::Conflict(_)) {
                    metrics::record_registration("conflict");
                }
                return Err(e);
            }
        };

        let token = self.issue_token(&user)?;
        metrics::record_registration("success");
        tracing::info!(user_id = %user.id, "User registered");

        Ok((ProfileResponse::from(&user), token))
    }

    /// Revoke `token` for as long as it would still validate.
    ///
    /// Expiry is not checked, only the signature; an expired token is
    /// accepted and nothing is recorded for it.
    pub async fn logout(&self, token: &str) -> Result<()> {
        let claims = self.jwt.decode_ignoring_expiry(token)?;
        let ttl = claims.accepted_for(Utc::now()).to_std().unwrap_or_default();

        self.revocations.revoke(token, ttl).await.map_err(|e| {
            tracing::error!(error = %e, "failed to record token revocation");
            AppError::ServiceUnavailable(e.to_string())
        })?;

        metrics::inc_token_revocations();
        tracing::info!(ttl_secs = ttl.as_secs(), "User logged out");
        Ok(())
    }

    /// Validate signature and expiry, then consult the revocation store.
    pub async fn verify_access(&self, token: &str) -> Result<AuthenticatedUser> {
        let claims = self.jwt.validate(token)?;

        match self.revocations.is_revoked(token).await {
            Ok(false) => {}
            Ok(true) => return Err(AppError::TokenRevoked),
            Err(e) => match self.revocation_policy {
                RevocationFailurePolicy::Closed => {
                    tracing::error!(error = %e, "revocation check failed, rejecting request");
                    return Err(AppError::ServiceUnavailable(e.to_string()));
                }
                RevocationFailurePolicy::Open => {
                    tracing::warn!(error = %e, "revocation check failed, allowing request");
                }
            },
        }

        let role = self.roles.resolve(&claims.role).ok_or_else(|| {
            tracing::warn!(role = %claims.role, "token carries a role that is not configured");
            AppError::InvalidToken
        })?;

        Ok(AuthenticatedUser {
            username: claims.sub.clone(),
            role,
            expires_at: claims.expires_at(),
            token: token.to_string(),
        })
    }

    /// [`AuthService::verify_access`] plus a check that the account still
    /// exists and is not soft-deleted.
    pub async fn verify_active_access(&self, token: &str) -> Result<AuthenticatedUser> {
        let identity = self.verify_access(token).await?;

        if self.users.find_by_username(&identity.username).await?.is_none() {
            tracing::warn!(username = %identity.username, "token belongs to a deleted account");
            return Err(AppError::InvalidToken);
        }

        Ok(identity)
    }

    pub async fn get_profile(&self, username: &str) -> Result<ProfileResponse> {
        let username = normalize_identifier(username);
        self.users
            .find_by_username(&username)
            .await?
            .map(|user| ProfileResponse::from(&user))
            .ok_or_else(|| AppError::NotFound("user not found".to_string()))
    }
}
