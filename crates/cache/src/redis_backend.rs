use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::FromRedisValue;
use scently_core::{CacheError, Fingerprint, Ranked, ResponseCache};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Mutex;
use tracing::warn;

/// Shared Redis connection that reconnects once when a command fails.
pub struct RedisConnector {
    client: redis::Client,
    password: Option<SecretString>,
    op_timeout: Duration,
    connection: Arc<Mutex<Option<MultiplexedConnection>>>,
}

impl RedisConnector {
    pub fn open(
        url: &str,
        password: Option<SecretString>,
        op_timeout: Duration,
    ) -> Result<Self, CacheError> {
        let client = redis::Client::open(url).map_err(|error| {
            CacheError::Connection(format!("invalid redis url `{url}`: {error}"))
        })?;
        Ok(Self { client, password, op_timeout, connection: Arc::new(Mutex::new(None)) })
    }

    async fn connect(&self) -> Result<MultiplexedConnection, CacheError> {
        let mut connection = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| CacheError::Connection(error.to_string()))?;
        if let Some(password) = &self.password {
            let _: () = redis::cmd("AUTH")
                .arg(password.expose_secret())
                .query_async(&mut connection)
                .await
                .map_err(|error| CacheError::Connection(format!("redis AUTH failed: {error}")))?;
        }
        Ok(connection)
    }

    /// Hands out a clone of the shared connection so the slot is never
    /// held while a command is in flight.
    async fn shared_connection(&self) -> Result<MultiplexedConnection, CacheError> {
        let mut slot = self.connection.lock().await;
        if let Some(connection) = slot.as_ref() {
            return Ok(connection.clone());
        }
        let connection = self.connect().await?;
        *slot = Some(connection.clone());
        Ok(connection)
    }

    /// Runs one command under the operation timeout.
    pub async fn run<T, F>(&self, operation: &'static str, build: F) -> Result<T, CacheError>
    where
        T: FromRedisValue + Send,
        F: Fn() -> redis::Cmd,
    {
        tokio::time::timeout(self.op_timeout, self.run_with_retry(operation, build))
            .await
            .map_err(|_| CacheError::Timeout(self.op_timeout))?
    }

    async fn run_with_retry<T, F>(&self, operation: &'static str, build: F) -> Result<T, CacheError>
    where
        T: FromRedisValue + Send,
        F: Fn() -> redis::Cmd,
    {
        let mut last_error = None;
        for attempt in 0..2 {
            let mut connection = self.shared_connection().await?;
            let result: redis::RedisResult<T> = build().query_async(&mut connection).await;
            match result {
                Ok(value) => return Ok(value),
                Err(error) => {
                    warn!(
                        event_name = "cache.redis.command.retry",
                        operation,
                        attempt = attempt + 1,
                        error = %error,
                        "redis command failed; reconnecting"
                    );
                    *self.connection.lock().await = None;
                    last_error = Some(CacheError::Command(error.to_string()));
                }
            }
        }
        Err(last_error.unwrap_or_else(|| CacheError::Command(format!("{operation} failed"))))
    }

    pub async fn ping(&self) -> Result<(), CacheError> {
        let reply: String = self.run("ping", || redis::cmd("PING")).await?;
        if reply.eq_ignore_ascii_case("PONG") {
            Ok(())
        } else {
            Err(CacheError::Command(format!("unexpected PING reply `{reply}`")))
        }
    }
}

/// Suggestion lists stored as JSON strings under the fingerprint key with
/// `SETEX`.
pub struct RedisResponseCache {
    connector: RedisConnector,
}

impl RedisResponseCache {
    pub fn new(connector: RedisConnector) -> Self {
        Self { connector }
    }
}

#[async_trait]
impl ResponseCache for RedisResponseCache {
    async fn load(&self, fingerprint: &Fingerprint) -> Result<Option<Vec<Ranked>>, CacheError> {
        let key = fingerprint.cache_key();
        let raw: Option<String> = self
            .connector
            .run("get", || {
                let mut cmd = redis::cmd("GET");
                cmd.arg(&key);
                cmd
            })
            .await?;

        match raw {
            None => Ok(None),
            Some(payload) => match serde_json::from_str::<Vec<Ranked>>(&payload) {
                Ok(ranked) => Ok(Some(ranked)),
                Err(error) => {
                    // An unreadable entry is a miss; the next store overwrites it.
                    warn!(
                        event_name = "cache.redis.payload.invalid",
                        key = %key,
                        error = %error,
                        "discarding undecodable cache entry"
                    );
                    Ok(None)
                }
            },
        }
    }

    async fn store(
        &self,
        fingerprint: &Fingerprint,
        ranked: &[Ranked],
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let key = fingerprint.cache_key();
        let payload =
            serde_json::to_string(ranked).map_err(|error| CacheError::Codec(error.to_string()))?;
        let ttl_secs = ttl.as_secs().max(1);
        self.connector
            .run::<(), _>("setex", || {
                let mut cmd = redis::cmd("SETEX");
                cmd.arg(&key).arg(ttl_secs).arg(&payload);
                cmd
            })
            .await
    }

    async fn ping(&self) -> Result<(), CacheError> {
        self.connector.ping().await
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}
