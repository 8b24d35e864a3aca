/// Auth handlers - registration, login, logout and the caller's profile
use crate::error::Result;
use crate::models::{AuthenticatedUser, LoginRequest, RegisterRequest};
use crate::services::AuthService;
use actix_web::{web, HttpResponse};
use serde_json::json;
use validator::Validate;

/// Register a new writer account
pub async fn register(
    auth: web::Data<AuthService>,
    req: web::Json<RegisterRequest>,
) -> Result<HttpResponse> {
    let (profile, token) = auth.register(req.into_inner()).await?;

    Ok(HttpResponse::Created().json(json!({
        "status": "success",
        "data": profile,
        "token": token,
    })))
}

/// Exchange credentials for a token
pub async fn login(
    auth: web::Data<AuthService>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    req.validate()?;
    let token = auth.authenticate(&req.username, &req.password).await?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "token": token,
    })))
}

/// Revoke the presented token
pub async fn logout(
    auth: web::Data<AuthService>,
    user: AuthenticatedUser,
) -> Result<HttpResponse> {
    auth.logout(&user.token).await?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "message": "logged out",
    })))
}

pub async fn profile(
    auth: web::Data<AuthService>,
    user: AuthenticatedUser,
) -> Result<HttpResponse> {
    let profile = auth.get_profile(&user.username).await?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "data": profile,
    })))
}
