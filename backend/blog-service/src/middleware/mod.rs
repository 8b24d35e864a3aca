pub mod jwt_auth;
pub mod role_guard;

pub use jwt_auth::{extract_token, JwtAuth};
pub use role_guard::{authorize, RequireRole};
