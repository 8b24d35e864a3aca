/// HTTP route wiring for blog-service
use crate::error::AppError;
use crate::handlers::{auth, health, users};
use crate::metrics::metrics_handler;
use crate::middleware::{JwtAuth, RequireRole};
use crate::services::{AuthService, UserService};
use actix_web::web;

/// Extractor failures go through the same error envelope as everything else
fn extractor_configs(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    );
}

/// Register every route of the service.
///
/// ```text
/// GET    /health
/// GET    /metrics
/// GET    /api/
/// POST   /api/register
/// POST   /api/login
/// POST   /api/logout                 (authenticated)
/// GET    /api/profile                (authenticated)
/// GET    /api/users?deleted=bool     (admin, account must still exist)
/// POST   /api/users                  (admin)
/// GET    /api/users/{id}             (admin)
/// PATCH  /api/users/{id}             (admin)
/// DELETE /api/users/{id}?force=bool  (admin)
/// PUT    /api/users/{id}/restore     (admin)
/// PUT    /api/users/{id}/role        (admin)
/// ```
pub fn configure(
    cfg: &mut web::ServiceConfig,
    auth_service: web::Data<AuthService>,
    user_service: web::Data<UserService>,
) {
    extractor_configs(cfg);

    cfg.app_data(auth_service.clone())
        .app_data(user_service)
        .route("/health", web::get().to(health::health_check))
        .route("/metrics", web::get().to(metrics_handler))
        .service(
            web::scope("/api")
                .route("/", web::get().to(health::api_banner))
                .route("/register", web::post().to(auth::register))
                .route("/login", web::post().to(auth::login))
                .service(
                    web::resource("/logout")
                        .wrap(JwtAuth::new(auth_service.clone()))
                        .route(web::post().to(auth::logout)),
                )
                .service(
                    web::resource("/profile")
                        .wrap(JwtAuth::new(auth_service.clone()))
                        .route(web::get().to(auth::profile)),
                )
                .service(
                    // wrap order: JwtAuth runs first, then RequireRole
                    web::scope("/users")
                        .wrap(RequireRole::admin())
                        .wrap(JwtAuth::active_accounts(auth_service))
                        .service(
                            web::resource(["", "/"])
                                .route(web::get().to(users::list_users))
                                .route(web::post().to(users::create_user)),
                        )
                        .service(
                            web::resource("/{id}")
                                .route(web::get().to(users::get_user))
                                .route(web::patch().to(users::update_user))
                                .route(web::delete().to(users::delete_user)),
                        )
                        .route("/{id}/restore", web::put().to(users::restore_user))
                        .route("/{id}/role", web::put().to(users::set_role)),
                ),
        );
}
