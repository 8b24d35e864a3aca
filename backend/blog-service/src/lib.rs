// Blog Service Library
//
// Registration, login, profile and admin user management.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod security;
pub mod services;
pub mod telemetry;
pub mod validators;

pub use error::{AppError, Result};

use crate::config::{RevocationFailurePolicy, RoleSettings};
use crate::db::UserRepository;
use crate::security::{PasswordHasher, RevocationStore};
use crate::services::{AuthService, UserService};
use actix_web::web;
use crypto_core::jwt::JwtKeys;
use std::sync::Arc;

/// Shared services handed to every worker
#[derive(Clone)]
pub struct AppState {
    pub auth: web::Data<AuthService>,
    pub users: web::Data<UserService>,
}

impl AppState {
    pub fn new(
        repository: Arc<dyn UserRepository>,
        revocations: Arc<dyn RevocationStore>,
        hasher: PasswordHasher,
        jwt: JwtKeys,
        roles: RoleSettings,
        revocation_policy: RevocationFailurePolicy,
    ) -> Self {
        let auth = AuthService::new(
            repository.clone(),
            revocations,
            hasher.clone(),
            jwt,
            roles.clone(),
            revocation_policy,
        );
        let users = UserService::new(repository, hasher, roles);

        Self {
            auth: web::Data::new(auth),
            users: web::Data::new(users),
        }
    }

    /// Mount the routes of the service on an `App`
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        routes::configure(cfg, self.auth.clone(), self.users.clone());
    }
}
