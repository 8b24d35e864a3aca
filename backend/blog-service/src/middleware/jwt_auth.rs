use crate::error::AppError;
use crate::metrics;
use crate::models::AuthenticatedUser;
use crate::services::AuthService;
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    web, Error, FromRequest, HttpMessage, HttpRequest,
};
use futures::future::{ready, Ready};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

/// Take the token out of an `Authorization: <scheme> <token>` value.
///
/// Only the second space-separated part is used; the scheme itself is not
/// inspected.
pub fn extract_token(header_value: &str) -> Option<&str> {
    header_value.split(' ').nth(1).filter(|token| !token.is_empty())
}

/// Metrics label for a rejected request
pub(crate) fn rejection_reason(err: &AppError) -> &'static str {
    match err {
        AppError::Unauthorized(_) => "missing_header",
        AppError::TokenExpired => "expired",
        AppError::TokenRevoked => "revoked",
        AppError::InvalidToken => "invalid_token",
        AppError::Forbidden(_) => "forbidden",
        AppError::ServiceUnavailable(_) => "store_unavailable",
        _ => "other",
    }
}

/// JWT Authentication Middleware
///
/// Verifies the bearer token (signature, expiry, revocation) and stores the
/// resulting [`AuthenticatedUser`] in the request extensions.
pub struct JwtAuth {
    auth: web::Data<AuthService>,
    require_active: bool,
}

impl JwtAuth {
    pub fn new(auth: web::Data<AuthService>) -> Self {
        Self {
            auth,
            require_active: false,
        }
    }

    /// Also reject tokens whose account was deleted after they were issued
    pub fn active_accounts(auth: web::Data<AuthService>) -> Self {
        Self {
            auth,
            require_active: true,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = JwtAuthService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthService {
            service: Rc::new(service),
            auth: self.auth.clone(),
            require_active: self.require_active,
        }))
    }
}

pub struct JwtAuthService<S> {
    service: Rc<S>,
    auth: web::Data<AuthService>,
    require_active: bool,
}

impl<S, B> Service<ServiceRequest> for JwtAuthService<S>
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
        let service = self.service.clone();
        let auth = self.auth.clone();
        let require_active = self.require_active;

        Box::pin(async move {
            let token = req
                .headers()
                .get(AUTHORIZATION)
                .and_then(|h| h.to_str().ok())
                .and_then(extract_token)
                .map(str::to_string);

            let token = match token {
                Some(token) => token,
                None => {
                    let err = AppError::Unauthorized(
                        "missing or malformed Authorization header".to_string(),
                    );
                    metrics::record_access_rejected(rejection_reason(&err));
                    return Err(err.into());
                }
            };

            let verified = if require_active {
                auth.verify_active_access(&token).await
            } else {
                auth.verify_access(&token).await
            };

            let identity = match verified {
                Ok(identity) => identity,
                Err(err) => {
                    tracing::warn!(error = %err, path = %req.path(), "JWT validation failed");
                    metrics::record_access_rejected(rejection_reason(&err));
                    return Err(err.into());
                }
            };

            req.extensions_mut().insert(identity);

            service.call(req).await
        })
    }
}

/// FromRequest implementation for AuthenticatedUser
impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<AuthenticatedUser>() {
            Some(user) => ready(Ok(user.clone())),
            None => ready(Err(
                AppError::Unauthorized("user not authenticated".to_string()).into()
            )),
        }
    }
}
