use anyhow::{Context, Result};
use redis::aio::ConnectionManager;
use redis::{Client, ConnectionAddr, ConnectionInfo, IntoConnectionInfo, RedisError};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::info;

/// Shared Redis connection manager guarded by a Tokio mutex.
pub type SharedConnectionManager = Arc<Mutex<ConnectionManager>>;

/// Upper bound applied to single Redis commands when the caller has no opinion.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_millis(500);

/// Redis connection pool wrapping a reconnecting connection manager.
pub struct RedisPool {
    manager: SharedConnectionManager,
}

impl RedisPool {
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let info: ConnectionInfo = redis_url
            .into_connection_info()
            .context("failed to parse REDIS_URL connection string")?;

        let label = match &info.addr {
            ConnectionAddr::Tcp(host, port) => format!("{}:{}", host, port),
            ConnectionAddr::TcpTls { host, port, .. } => format!("{}:{} (tls)", host, port),
            _ => "unix socket".to_string(),
        };

        let client = Client::open(info).context("failed to construct Redis client")?;
        let connection_manager = ConnectionManager::new(client)
            .await
            .context("failed to initialize Redis connection manager")?;

        info!("Redis connection manager ready at {}", label);

        Ok(Self {
            manager: Arc::new(Mutex::new(connection_manager)),
        })
    }

    pub fn manager(&self) -> SharedConnectionManager {
        self.manager.clone()
    }

    /// Round-trip a PING, bounded by `timeout`.
    pub async fn ping(&self, timeout: Duration) -> Result<(), CommandError> {
        let mut conn = self.manager.lock().await.clone();
        let pong: String = with_timeout(timeout, async {
            redis::cmd("PING").query_async(&mut conn).await
        })
        .await?;

        if pong == "PONG" {
            Ok(())
        } else {
            Err(CommandError::Redis(RedisError::from((
                redis::ErrorKind::ResponseError,
                "unexpected PING response",
            ))))
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Redis command timed out after {0:?}")]
    Elapsed(Duration),
    #[error("Redis command failed: {0}")]
    Redis(#[from] RedisError),
}

/// Execute a Redis future with an upper bound on its duration.
pub async fn with_timeout<F, T>(duration: Duration, future: F) -> Result<T, CommandError>
where
    F: Future<Output = Result<T, RedisError>>,
{
    match tokio::time::timeout(duration, future).await {
        Ok(result) => result.map_err(CommandError::from),
        Err(_) => Err(CommandError::Elapsed(duration)),
    }
}
