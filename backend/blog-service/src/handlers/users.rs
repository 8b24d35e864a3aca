/// Admin user handlers - every route here sits behind `RequireRole::admin()`
use crate::error::Result;
use crate::models::{
    AuthenticatedUser, CreateUserRequest, DeleteQuery, ListUsersQuery, SetRoleRequest,
    UpdateUserRequest,
};
use crate::services::UserService;
use actix_web::{web, HttpResponse};
use serde_json::json;
use uuid::Uuid;

fn success<T: serde::Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "success",
        "data": data,
    }))
}

pub async fn list_users(
    users: web::Data<UserService>,
    query: web::Query<ListUsersQuery>,
) -> Result<HttpResponse> {
    let list = users.list(query.deleted).await?;
    Ok(success(list))
}

pub async fn create_user(
    users: web::Data<UserService>,
    admin: AuthenticatedUser,
    req: web::Json<CreateUserRequest>,
) -> Result<HttpResponse> {
    let user = users.create(req.into_inner()).await?;
    tracing::debug!(admin = %admin.username, user_id = %user.id, "admin created user");

    Ok(HttpResponse::Created().json(json!({
        "status": "success",
        "data": user,
    })))
}

pub async fn get_user(
    users: web::Data<UserService>,
    id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let user = users.get(id.into_inner()).await?;
    Ok(success(user))
}

pub async fn update_user(
    users: web::Data<UserService>,
    id: web::Path<Uuid>,
    req: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse> {
    let user = users.update(id.into_inner(), req.into_inner()).await?;
    Ok(success(user))
}

/// Soft delete, or permanent with `?force=true`
pub async fn delete_user(
    users: web::Data<UserService>,
    admin: AuthenticatedUser,
    id: web::Path<Uuid>,
    query: web::Query<DeleteQuery>,
) -> Result<HttpResponse> {
    let id = id.into_inner();
    users.delete(id, query.force).await?;
    tracing::debug!(admin = %admin.username, user_id = %id, force = query.force, "admin deleted user");

    let message = if query.force {
        "user permanently deleted"
    } else {
        "user deleted"
    };
    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "message": message,
    })))
}

pub async fn restore_user(
    users: web::Data<UserService>,
    id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let user = users.restore(id.into_inner()).await?;
    Ok(success(user))
}

pub async fn set_role(
    users: web::Data<UserService>,
    id: web::Path<Uuid>,
    req: web::Json<SetRoleRequest>,
) -> Result<HttpResponse> {
    let user = users.set_role(id.into_inner(), req.into_inner()).await?;
    Ok(success(user))
}
