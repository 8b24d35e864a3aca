use actix_web::HttpResponse;
use serde_json::json;

/// Liveness probe
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "service": "blog-service",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Banner served at `/api/`
pub async fn api_banner() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "success",
        "message": "blog-service API is up",
    }))
}
