use super::users::UserRepository;
use crate::error::{AppError, Result};
use crate::models::{NewUser, User, UserChanges};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Process-local credential store with the same uniqueness rules as the
/// `users` table. Used by tests and for running without PostgreSQL.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn conflict() -> AppError {
    AppError::Conflict("username or email already taken".to_string())
}

fn user_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("user {} not found", id))
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.username == username && !u.is_deleted())
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn list(&self, deleted: bool) -> Result<Vec<User>> {
        let users = self.users.read().await;
        let mut matching: Vec<User> = users
            .values()
            .filter(|u| u.is_deleted() == deleted)
            .cloned()
            .collect();
        matching.sort_by_key(|u| u.created_at);
        Ok(matching)
    }

    async fn insert(&self, user: NewUser) -> Result<User> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(conflict());
        }

        let now = Utc::now();
        let created = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            subscribers: 0,
            followed: 0,
            image: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<User> {
        let mut users = self.users.write().await;

        if let Some(email) = &changes.email {
            if users.values().any(|u| u.id != id && &u.email == email) {
                return Err(conflict());
            }
        }

        let user = users
            .get_mut(&id)
            .filter(|u| !u.is_deleted())
            .ok_or_else(|| user_not_found(id))?;

        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(password_hash) = changes.password_hash {
            user.password_hash = password_hash;
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        user.updated_at = Utc::now();

        Ok(user.clone())
    }

    async fn soft_delete(&self, id: Uuid) -> Result<()> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&id)
            .filter(|u| !u.is_deleted())
            .ok_or_else(|| user_not_found(id))?;

        let now = Utc::now();
        user.deleted_at = Some(now);
        user.updated_at = now;
        Ok(())
    }

    async fn force_delete(&self, id: Uuid) -> Result<()> {
        self.users
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| user_not_found(id))
    }

    async fn restore(&self, id: Uuid) -> Result<User> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&id)
            .filter(|u| u.is_deleted())
            .ok_or_else(|| user_not_found(id))?;

        user.deleted_at = None;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$stub".to_string(),
            role: "writer".to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let repo = InMemoryUserRepository::new();
        let user = repo.insert(new_user("alice", "alice@example.com")).await.unwrap();

        let found = repo.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(found.subscribers, 0);
        assert!(repo.find_by_username("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unique_username_and_email() {
        let repo = InMemoryUserRepository::new();
        repo.insert(new_user("alice", "alice@example.com")).await.unwrap();

        assert!(matches!(
            repo.insert(new_user("alice", "other@example.com")).await,
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            repo.insert(new_user("alice2", "alice@example.com")).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_soft_delete_hides_but_reserves() {
        let repo = InMemoryUserRepository::new();
        let user = repo.insert(new_user("alice", "alice@example.com")).await.unwrap();
        repo.soft_delete(user.id).await.unwrap();

        assert!(repo.find_by_username("alice").await.unwrap().is_none());
        assert!(repo.find_by_id(user.id).await.unwrap().unwrap().is_deleted());
        assert_eq!(repo.list(true).await.unwrap().len(), 1);
        assert!(repo.list(false).await.unwrap().is_empty());
        assert!(matches!(
            repo.insert(new_user("alice", "new@example.com")).await,
            Err(AppError::Conflict(_))
        ));

        // Second soft delete finds no active row
        assert!(matches!(
            repo.soft_delete(user.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_restore_and_force_delete() {
        let repo = InMemoryUserRepository::new();
        let user = repo.insert(new_user("alice", "alice@example.com")).await.unwrap();

        assert!(matches!(repo.restore(user.id).await, Err(AppError::NotFound(_))));

        repo.soft_delete(user.id).await.unwrap();
        let restored = repo.restore(user.id).await.unwrap();
        assert!(!restored.is_deleted());

        repo.force_delete(user.id).await.unwrap();
        assert!(repo.find_by_id(user.id).await.unwrap().is_none());
        assert!(matches!(
            repo.force_delete(user.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_partial() {
        let repo = InMemoryUserRepository::new();
        let user = repo.insert(new_user("alice", "alice@example.com")).await.unwrap();
        repo.insert(new_user("bob", "bob@example.com")).await.unwrap();

        let updated = repo
            .update(
                user.id,
                UserChanges {
                    role: Some("admin".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.role, "admin");
        assert_eq!(updated.email, "alice@example.com");

        assert!(matches!(
            repo.update(
                user.id,
                UserChanges {
                    email: Some("bob@example.com".to_string()),
                    ..Default::default()
                }
            )
            .await,
            Err(AppError::Conflict(_))
        ));

        assert!(matches!(
            repo.update(Uuid::new_v4(), UserChanges::default()).await,
            Err(AppError::NotFound(_))
        ));
    }
}
