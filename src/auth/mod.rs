mod store;

pub use store::{FileSessionStore, MemorySessionStore, Session, SessionStorage, StoreError};

use anyhow::{Context, Result};
use std::fmt;

/// Environment variable holding the Bayes username
pub const USERNAME_ENV: &str = "BAYES_USERNAME";
/// Environment variable holding the Bayes password
pub const PASSWORD_ENV: &str = "BAYES_PASSWORD";

/// Username and password for the Bayes login endpoint
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Reads credentials from `BAYES_USERNAME` and `BAYES_PASSWORD`
    pub fn from_env() -> Result<Self> {
        let username =
            std::env::var(USERNAME_ENV).with_context(|| format!("{USERNAME_ENV} not set"))?;
        let password =
            std::env::var(PASSWORD_ENV).with_context(|| format!("{PASSWORD_ENV} not set"))?;
        Ok(Self::new(username, password))
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
