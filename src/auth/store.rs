use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::RwLock;

const SESSION_FILE: &str = "bayes.json";

/// Tokens issued by the Bayes login endpoints
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Moment after which the access token must be considered invalid
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Checks if the access token has expired at `now`
    ///
    /// A session without a known expiry counts as expired.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(true, |expires_at| now >= expires_at)
    }

    /// Checks if the session carries a usable access token at `now`
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        !self.access_token.is_empty() && !self.is_expired(now)
    }
}

/// On-disk layout of the session file
///
/// `expiresIn` holds the absolute expiry as epoch seconds.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSession {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    expires_in: f64,
}

impl From<&Session> for StoredSession {
    fn from(session: &Session) -> Self {
        Self {
            access_token: session.access_token.clone(),
            refresh_token: session.refresh_token.clone(),
            expires_in: session
                .expires_at
                .map_or(0.0, |e| e.timestamp_millis() as f64 / 1000.0),
        }
    }
}

impl From<StoredSession> for Session {
    fn from(stored: StoredSession) -> Self {
        let millis = (stored.expires_in * 1000.0) as i64;
        Self {
            access_token: stored.access_token,
            refresh_token: stored.refresh_token,
            expires_at: Utc.timestamp_millis_opt(millis).single(),
        }
    }
}

/// Session store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("No session stored")]
    NoSession,
    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

/// Trait for session storage operations
///
/// This abstraction allows easy mocking of session storage in tests.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// Saves the session
    async fn save(&self, session: &Session) -> Result<()>;

    /// Loads the stored session
    async fn load(&self) -> Result<Session, StoreError>;

    /// Deletes the stored session
    async fn delete(&self) -> Result<()>;
}

/// Session storage in a small JSON file under the user's config directory
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Creates a store at the default per-user location
    pub fn new() -> Result<Self> {
        let config_dir = crate::config::ConfigManager::config_dir()?;
        Ok(Self::with_path(config_dir.join(SESSION_FILE)))
    }

    /// Creates a store backed by a custom file
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl SessionStorage for FileSessionStore {
    async fn save(&self, session: &Session) -> Result<()> {
        let data = serde_json::to_string(&StoredSession::from(session))
            .context("Failed to serialize session")?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create session directory")?;
        }
        tokio::fs::write(&self.path, data)
            .await
            .context("Failed to write session file")?;

        Ok(())
    }

    async fn load(&self) -> Result<Session, StoreError> {
        let data = match tokio::fs::read_to_string(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NoSession)
            }
            Err(e) => return Err(StoreError::Storage(e.into())),
        };

        let stored: StoredSession =
            serde_json::from_str(&data).map_err(|e| StoreError::Storage(e.into()))?;
        Ok(stored.into())
    }

    async fn delete(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                Err(e).context("Failed to delete session file")
            }
            _ => Ok(()),
        }
    }
}

/// In-memory session storage, for callers that don't want anything on disk
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: RwLock<Option<Session>>,
}

impl MemorySessionStore {
    /// Creates a new empty memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a memory store with an initial session
    pub fn with_session(session: Session) -> Self {
        Self {
            session: RwLock::new(Some(session)),
        }
    }

    /// Returns the stored session without going through the trait
    pub fn current(&self) -> Option<Session> {
        self.session.read().ok().and_then(|s| s.clone())
    }
}

#[async_trait]
impl SessionStorage for MemorySessionStore {
    async fn save(&self, session: &Session) -> Result<()> {
        let mut guard = self
            .session
            .write()
            .map_err(|_| anyhow::anyhow!("Session store lock poisoned"))?;
        *guard = Some(session.clone());
        Ok(())
    }

    async fn load(&self) -> Result<Session, StoreError> {
        self.current().ok_or(StoreError::NoSession)
    }

    async fn delete(&self) -> Result<()> {
        let mut guard = self
            .session
            .write()
            .map_err(|_| anyhow::anyhow!("Session store lock poisoned"))?;
        *guard = None;
        Ok(())
    }
}
