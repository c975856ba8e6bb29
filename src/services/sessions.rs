//! Redis-backed login sessions

use rand::{distributions::Alphanumeric, Rng};
use redis::{AsyncCommands, Client};
use uuid::Uuid;

use crate::{
    config::SessionsConfig,
    error::{AppError, AppResult},
};

const SESSION_ID_LEN: usize = 48;

#[derive(Clone)]
pub struct SessionStore {
    client: Client,
    ttl_seconds: u64,
}

impl SessionStore {
    /// Create a session store and check the Redis connection
    pub async fn new(url: &str, config: &SessionsConfig) -> AppResult<Self> {
        let client = Client::open(url)
            .map_err(|e| AppError::Internal(format!("Failed to create Redis client: {}", e)))?;

        let mut conn = client.get_multiplexed_async_connection().await?;
        redis::cmd("PING").query_async::<_, String>(&mut conn).await?;

        Ok(Self {
            client,
            ttl_seconds: config.ttl_hours * 3600,
        })
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }

    /// Open a session for a user and return its id
    pub async fn create(&self, user_id: Uuid) -> AppResult<String> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let session_id = new_session_id();
        conn.set_ex::<_, _, ()>(session_key(&session_id), user_id.to_string(), self.ttl_seconds)
            .await?;

        tracing::debug!(%user_id, "Session created");
        Ok(session_id)
    }

    /// Resolve a session id to its user, if the session is still alive
    pub async fn resolve(&self, session_id: &str) -> AppResult<Option<Uuid>> {
        if !is_well_formed(session_id) {
            return Ok(None);
        }

        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let stored: Option<String> = conn.get(session_key(session_id)).await?;

        Ok(stored.and_then(|value| Uuid::parse_str(&value).ok()))
    }

    /// Drop a session. Returns false if it did not exist.
    pub async fn destroy(&self, session_id: &str) -> AppResult<bool> {
        if !is_well_formed(session_id) {
            return Ok(false);
        }

        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let removed: u64 = conn.del(session_key(session_id)).await?;
        Ok(removed > 0)
    }
}

fn session_key(session_id: &str) -> String {
    format!("session:{}", session_id)
}

fn new_session_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_ID_LEN)
        .map(char::from)
        .collect()
}

fn is_well_formed(session_id: &str) -> bool {
    session_id.len() == SESSION_ID_LEN && session_id.chars().all(|c| c.is_ascii_alphanumeric())
}
