pub mod password;
pub mod token_revocation;

pub use password::PasswordHasher;
pub use token_revocation::{
    InMemoryRevocationStore, RedisRevocationStore, RevocationError, RevocationStore,
};
