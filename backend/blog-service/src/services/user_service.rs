use crate::config::RoleSettings;
use crate::db::UserRepository;
use crate::error::{AppError, Result};
use crate::models::{
    CreateUserRequest, NewUser, SetRoleRequest, UpdateUserRequest, UserChanges, UserResponse,
};
use crate::security::PasswordHasher;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// Administrative operations over credential records
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    hasher: PasswordHasher,
    roles: RoleSettings,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>, hasher: PasswordHasher, roles: RoleSettings) -> Self {
        Self {
            users,
            hasher,
            roles,
        }
    }

    /// Canonical stored name for a requested role, or a validation error
    fn role_name(&self, requested: &str) -> Result<String> {
        self.roles
            .resolve(requested)
            .map(|role| self.roles.name_of(role).to_string())
            .ok_or_else(|| AppError::Validation(format!("unknown role '{}'", requested.trim())))
    }

    pub async fn list(&self, deleted: bool) -> Result<Vec<UserResponse>> {
        let users = self.users.list(deleted).await?;
        Ok(users.iter().map(UserResponse::from).collect())
    }

    pub async fn get(&self, id: Uuid) -> Result<UserResponse> {
        self.users
            .find_by_id(id)
            .await?
            .map(|user| UserResponse::from(&user))
            .ok_or_else(|| AppError::NotFound(format!("user {} not found", id)))
    }

    pub async fn create(&self, mut req: CreateUserRequest) -> Result<UserResponse> {
        req.normalize();
        req.validate()?;

        let role = match req.role.as_deref() {
            Some(requested) => self.role_name(requested)?,
            None => self.roles.default_name().to_string(),
        };
        let password_hash = self.hasher.hash_blocking(req.password).await?;

        let user = self
            .users
            .insert(NewUser {
                username: req.username,
                email: req.email,
                password_hash,
                role,
            })
            .await?;

        tracing::info!(user_id = %user.id, role = %user.role, "User created by admin");
        Ok(UserResponse::from(&user))
    }

    pub async fn update(&self, id: Uuid, mut req: UpdateUserRequest) -> Result<UserResponse> {
        req.normalize();
        req.validate()?;
        if !req.password_confirmed() {
            return Err(AppError::Validation(
                "password_confirmation: passwords do not match".to_string(),
            ));
        }

        let role = req.role.as_deref().map(|r| self.role_name(r)).transpose()?;
        let password_hash = match req.password {
            Some(password) => Some(self.hasher.hash_blocking(password).await?),
            None => None,
        };

        let changes = UserChanges {
            email: req.email,
            password_hash,
            role,
        };
        if changes.is_empty() {
            return Err(AppError::BadRequest("no fields to update".to_string()));
        }

        let user = self.users.update(id, changes).await?;
        tracing::info!(user_id = %user.id, "User updated by admin");
        Ok(UserResponse::from(&user))
    }

    /// Soft delete by default; `force` removes the row permanently
    pub async fn delete(&self, id: Uuid, force: bool) -> Result<()> {
        if force {
            self.users.force_delete(id).await?;
            tracing::warn!(user_id = %id, "User permanently deleted");
        } else {
            self.users.soft_delete(id).await?;
            tracing::info!(user_id = %id, "User soft-deleted");
        }
        Ok(())
    }

    pub async fn restore(&self, id: Uuid) -> Result<UserResponse> {
        let user = self.users.restore(id).await?;
        tracing::info!(user_id = %id, "User restored");
        Ok(UserResponse::from(&user))
    }

    /// Accepted iff the requested name resolves to a configured role
    pub async fn set_role(&self, id: Uuid, req: SetRoleRequest) -> Result<UserResponse> {
        req.validate()?;
        let role = self.role_name(&req.role)?;

        let user = self
            .users
            .update(
                id,
                UserChanges {
                    role: Some(role),
                    ..Default::default()
                },
            )
            .await?;

        tracing::info!(user_id = %id, role = %user.role, "User role changed");
        Ok(UserResponse::from(&user))
    }
}
