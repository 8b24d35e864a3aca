/// JWT Token Revocation Management
/// Records logged-out tokens until their natural expiry
use async_trait::async_trait;
use crypto_core::hash::token_digest;
use redis_utils::{with_timeout, CommandError, SharedConnectionManager};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const REVOKED_TOKEN_PREFIX: &str = "blog:revoked:token:";

#[derive(Debug, thiserror::Error)]
pub enum RevocationError {
    #[error("revocation store timed out after {0:?}")]
    Timeout(Duration),

    #[error("revocation store failure: {0}")]
    Store(String),
}

impl From<CommandError> for RevocationError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::Elapsed(after) => RevocationError::Timeout(after),
            CommandError::Redis(e) => RevocationError::Store(e.to_string()),
        }
    }
}

/// Storage key for a revoked token. Only the SHA-256 digest is kept.
pub fn revocation_key(token: &str) -> String {
    format!("{}{}", REVOKED_TOKEN_PREFIX, token_digest(token))
}

/// Token blacklist capability
#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// Mark `token` revoked for `ttl`. A zero ttl records nothing.
    async fn revoke(&self, token: &str, ttl: Duration) -> Result<(), RevocationError>;

    /// Whether `token` is currently revoked
    async fn is_revoked(&self, token: &str) -> Result<bool, RevocationError>;
}

/// Whole seconds for `SET .. EX`, rounding partial seconds up
fn ttl_secs(ttl: Duration) -> u64 {
    let secs = ttl.as_secs();
    if ttl.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}

// ============================================================================
// Redis
// ============================================================================

/// Redis-backed store shared by every service instance
pub struct RedisRevocationStore {
    redis: SharedConnectionManager,
    command_timeout: Duration,
}

impl RedisRevocationStore {
    pub fn new(redis: SharedConnectionManager, command_timeout: Duration) -> Self {
        Self {
            redis,
            command_timeout,
        }
    }
}

#[async_trait]
impl RevocationStore for RedisRevocationStore {
    async fn revoke(&self, token: &str, ttl: Duration) -> Result<(), RevocationError> {
        if ttl.is_zero() {
            tracing::debug!("token already expired, nothing to revoke");
            return Ok(());
        }

        let key = revocation_key(token);
        let secs = ttl_secs(ttl);
        let mut conn = self.redis.lock().await.clone();

        with_timeout(self.command_timeout, async {
            redis::cmd("SET")
                .arg(&key)
                .arg("1")
                .arg("EX")
                .arg(secs)
                .query_async::<_, ()>(&mut conn)
                .await
        })
        .await?;

        tracing::info!(
            ttl_secs = secs,
            "Token revoked, blacklist entry will expire with the token"
        );
        Ok(())
    }

    async fn is_revoked(&self, token: &str) -> Result<bool, RevocationError> {
        let key = revocation_key(token);
        let mut conn = self.redis.lock().await.clone();

        let exists: bool = with_timeout(self.command_timeout, async {
            redis::cmd("EXISTS").arg(&key).query_async(&mut conn).await
        })
        .await?;

        Ok(exists)
    }
}

// ============================================================================
// In-memory
// ============================================================================

/// Process-local store with lazy expiry, for tests and single-node development
#[derive(Default)]
pub struct InMemoryRevocationStore {
    entries: Mutex<HashMap<String, Instant>>,
}

impl InMemoryRevocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries, pruning expired ones
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        entries.retain(|_, expires_at| *expires_at > now);
        entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl RevocationStore for InMemoryRevocationStore {
    async fn revoke(&self, token: &str, ttl: Duration) -> Result<(), RevocationError> {
        if ttl.is_zero() {
            return Ok(());
        }

        let mut entries = self.entries.lock().await;
        entries.insert(revocation_key(token), Instant::now() + ttl);
        Ok(())
    }

    async fn is_revoked(&self, token: &str) -> Result<bool, RevocationError> {
        let key = revocation_key(token);
        let mut entries = self.entries.lock().await;

        match entries.get(&key) {
            Some(expires_at) if *expires_at > Instant::now() => Ok(true),
            Some(_) => {
                entries.remove(&key);
                Ok(false)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_hides_raw_token() {
        let key = revocation_key("header.payload.signature");
        assert!(key.starts_with(REVOKED_TOKEN_PREFIX));
        assert!(!key.contains("payload"));
        assert_eq!(key.len(), REVOKED_TOKEN_PREFIX.len() + 64);
    }

    #[test]
    fn test_ttl_rounds_up() {
        assert_eq!(ttl_secs(Duration::from_secs(10)), 10);
        assert_eq!(ttl_secs(Duration::from_millis(10_001)), 11);
        assert_eq!(ttl_secs(Duration::from_millis(1)), 1);
    }

    #[test]
    fn test_command_error_mapping() {
        let timeout = RevocationError::from(CommandError::Elapsed(Duration::from_millis(500)));
        assert!(matches!(timeout, RevocationError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_revoke_then_check() {
        let store = InMemoryRevocationStore::new();
        assert!(!store.is_revoked("tok").await.unwrap());

        store.revoke("tok", Duration::from_secs(60)).await.unwrap();
        assert!(store.is_revoked("tok").await.unwrap());
        assert!(!store.is_revoked("other").await.unwrap());
    }

    #[tokio::test]
    async fn test_zero_ttl_is_noop() {
        let store = InMemoryRevocationStore::new();
        store.revoke("tok", Duration::ZERO).await.unwrap();
        assert!(!store.is_revoked("tok").await.unwrap());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_entry_expires() {
        let store = InMemoryRevocationStore::new();
        store.revoke("tok", Duration::from_millis(20)).await.unwrap();
        assert!(store.is_revoked("tok").await.unwrap());

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(!store.is_revoked("tok").await.unwrap());
        assert_eq!(store.len().await, 0);
    }
}
