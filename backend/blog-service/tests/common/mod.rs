//! Shared fixtures for the HTTP-level tests
#![allow(dead_code)]

use actix_web::body::{to_bytes, MessageBody};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::test;
use blog_service::config::{RevocationFailurePolicy, RoleSettings};
use blog_service::db::{InMemoryUserRepository, UserRepository};
use blog_service::models::{NewUser, Role, User};
use blog_service::security::{InMemoryRevocationStore, PasswordHasher};
use blog_service::AppState;
use crypto_core::jwt::JwtKeys;
use serde_json::Value;
use std::sync::Arc;

pub const TEST_SECRET: &str = "blog-service-test-secret-0123456789";
pub const PASSWORD: &str = "Sup3rSecret!";

pub struct TestContext {
    pub state: AppState,
    pub repository: Arc<InMemoryUserRepository>,
    pub revocations: Arc<InMemoryRevocationStore>,
    pub jwt: JwtKeys,
    pub hasher: PasswordHasher,
    pub roles: RoleSettings,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_roles("admin", "writer")
    }

    /// Context whose deployment uses other role names
    pub fn with_roles(admin: &str, writer: &str) -> Self {
        let repository = Arc::new(InMemoryUserRepository::new());
        let revocations = Arc::new(InMemoryRevocationStore::new());
        let jwt = JwtKeys::new(TEST_SECRET, chrono::Duration::hours(24)).expect("test secret");
        let hasher = PasswordHasher::new(1024, 1, 1).expect("argon2 params");
        let roles = RoleSettings::new(admin, writer).expect("roles");

        let state = AppState::new(
            repository.clone(),
            revocations.clone(),
            hasher.clone(),
            jwt.clone(),
            roles.clone(),
            RevocationFailurePolicy::Closed,
        );

        Self {
            state,
            repository,
            revocations,
            jwt,
            hasher,
            roles,
        }
    }

    /// Insert a user straight into the repository
    pub async fn seed_user(&self, username: &str, role: Role) -> User {
        self.repository
            .insert(NewUser {
                username: username.to_string(),
                email: format!("{}@example.com", username),
                password_hash: self.hasher.hash(PASSWORD).expect("hash"),
                role: self.roles.name_of(role).to_string(),
            })
            .await
            .expect("seed user")
    }

    /// Token for a seeded user, issued directly
    pub fn token_for(&self, user: &User) -> String {
        self.jwt.issue(&user.username, &user.role).expect("issue token")
    }
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

/// Call the app and return status plus JSON body.
///
/// Middleware rejections come back as `Err`; they are rendered the same way
/// the server would render them.
pub async fn send<S, R, B>(app: &S, req: R) -> (StatusCode, Value)
where
    S: Service<R, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    match test::try_call_service(app, req).await {
        Ok(resp) => {
            let status = resp.status();
            let body = test::read_body(resp).await;
            (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
        }
        Err(err) => {
            let resp = err.error_response();
            let status = resp.status();
            let body = to_bytes(resp.into_body()).await.unwrap_or_default();
            (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
        }
    }
}
