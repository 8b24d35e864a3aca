/// User database operations for blog-service
use crate::error::{AppError, Result};
use crate::models::{NewUser, User, UserChanges};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

/// Credential store
///
/// Identifiers handed to the repository are already normalized. Uniqueness of
/// username and email spans soft-deleted rows too; `insert` and `update`
/// report a clash as [`AppError::Conflict`].
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Active (not soft-deleted) user by username
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    /// User by id, soft-deleted rows included
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    /// Active users, or only soft-deleted ones when `deleted` is set
    async fn list(&self, deleted: bool) -> Result<Vec<User>>;

    async fn insert(&self, user: NewUser) -> Result<User>;

    /// Apply `changes` to an active user; `NotFound` if there is none
    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<User>;

    async fn soft_delete(&self, id: Uuid) -> Result<()>;

    async fn force_delete(&self, id: Uuid) -> Result<()>;

    /// Clear the soft-delete marker; `NotFound` unless the user is soft-deleted
    async fn restore(&self, id: Uuid) -> Result<User>;
}

fn user_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("user {} not found", id))
}

/// PostgreSQL implementation backed by the `users` table
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE username = $1 AND deleted_at IS NULL",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn list(&self, deleted: bool) -> Result<Vec<User>> {
        let query = if deleted {
            "SELECT * FROM users WHERE deleted_at IS NOT NULL ORDER BY created_at"
        } else {
            "SELECT * FROM users WHERE deleted_at IS NULL ORDER BY created_at"
        };

        let users = sqlx::query_as::<_, User>(query)
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    async fn insert(&self, user: NewUser) -> Result<User> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, email, password_hash, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.role)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<User> {
        let updated = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET email = COALESCE($2, email),
                password_hash = COALESCE($3, password_hash),
                role = COALESCE($4, role),
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.email)
        .bind(changes.password_hash)
        .bind(changes.role)
        .fetch_optional(&self.pool)
        .await?;

        updated.ok_or_else(|| user_not_found(id))
    }

    async fn soft_delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query(
            "UPDATE users SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(user_not_found(id));
        }
        Ok(())
    }

    async fn force_delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(user_not_found(id));
        }
        Ok(())
    }

    async fn restore(&self, id: Uuid) -> Result<User> {
        let restored = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET deleted_at = NULL, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NOT NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        restored.ok_or_else(|| user_not_found(id))
    }
}
