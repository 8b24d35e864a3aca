use super::jwt_auth::rejection_reason;
use crate::error::AppError;
use crate::metrics;
use crate::models::{AuthenticatedUser, Role};
use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures::future::{ready, Ready};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

const INSUFFICIENT_ROLE: &str = "insufficient role for this resource";

/// Access rule behind [`RequireRole`].
///
/// No identity is 401. No requirement lets any identity through. Otherwise
/// the caller's role must satisfy the requirement (admin satisfies all).
///
/// The denial message does not name roles; their names are deployment
/// specific.
pub fn authorize(role: Option<Role>, required: Option<Role>) -> Result<(), AppError> {
    let role = role.ok_or_else(|| AppError::Unauthorized("user not authenticated".to_string()))?;

    match required {
        None => Ok(()),
        Some(required) if role.satisfies(required) => Ok(()),
        Some(_) => Err(AppError::Forbidden(INSUFFICIENT_ROLE.to_string())),
    }
}

/// Role-based authorization middleware
///
/// Must run inside [`super::JwtAuth`], which provides the identity.
pub struct RequireRole {
    required: Option<Role>,
}

impl RequireRole {
    pub fn new(required: Option<Role>) -> Self {
        Self { required }
    }

    pub fn admin() -> Self {
        Self::new(Some(Role::Admin))
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireRole
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RequireRoleService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireRoleService {
            service: Rc::new(service),
            required: self.required,
        }))
    }
}

pub struct RequireRoleService<S> {
    service: Rc<S>,
    required: Option<Role>,
}

impl<S, B> Service<ServiceRequest> for RequireRoleService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let role = req
            .extensions()
            .get::<AuthenticatedUser>()
            .map(|user| user.role);

        if let Err(err) = authorize(role, self.required) {
            tracing::warn!(error = %err, path = %req.path(), "access denied");
            metrics::record_access_rejected(rejection_reason(&err));
            return Box::pin(async move { Err(err.into()) });
        }

        let fut = self.service.call(req);
        Box::pin(fut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::ResponseError;

    #[test]
    fn test_admin_passes_any_requirement() {
        assert!(authorize(Some(Role::Admin), Some(Role::Admin)).is_ok());
        assert!(authorize(Some(Role::Admin), Some(Role::Writer)).is_ok());
        assert!(authorize(Some(Role::Admin), None).is_ok());
    }

    #[test]
    fn test_writer_needs_exact_match() {
        assert!(authorize(Some(Role::Writer), Some(Role::Writer)).is_ok());
        assert!(authorize(Some(Role::Writer), None).is_ok());

        let err = authorize(Some(Role::Writer), Some(Role::Admin)).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert!(!err.public_message().contains("admin"));
    }

    #[test]
    fn test_missing_identity_is_unauthorized() {
        let err = authorize(None, Some(Role::Writer)).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert!(authorize(None, None).is_err());
    }
}
