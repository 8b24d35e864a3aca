//! Shared cryptographic helpers for readerblog services
//!
//! - `jwt`: HS256 identity token issuing and validation
//! - `hash`: SHA-256 digests used for storage keys

pub mod hash;
pub mod jwt;

pub use jwt::{Claims, JwtError, JwtKeys};
