//! Synchronous facade over [`BayesClient`]

use tokio::runtime::{Builder, Runtime};

use super::http::{HttpClient, ReqwestClient};
use super::types::{AssetKind, Game, GamesFilter, GamesPage, GamesQuery, Tag};
use super::{BayesClient, BayesError};
use crate::auth::Credentials;
use crate::config::Config;

/// Blocking Bayes client
///
/// Drives a [`BayesClient`] on a private current-thread runtime. Every method blocks
/// until the call completes, so this must not be used from inside an async runtime;
/// doing so panics.
pub struct BlockingBayesClient<H: HttpClient = ReqwestClient> {
    inner: BayesClient<H>,
    runtime: Runtime,
}

impl BlockingBayesClient<ReqwestClient> {
    pub fn new(credentials: Credentials) -> Result<Self, BayesError> {
        Self::wrap(BayesClient::new(credentials)?)
    }

    pub fn from_config(credentials: Credentials, config: &Config) -> Result<Self, BayesError> {
        Self::wrap(BayesClient::from_config(credentials, config)?)
    }
}

impl<H: HttpClient> BlockingBayesClient<H> {
    /// Wraps an already configured async client
    pub fn wrap(inner: BayesClient<H>) -> Result<Self, BayesError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| BayesError::Other(e.into()))?;

        Ok(Self { inner, runtime })
    }

    pub fn inner(&self) -> &BayesClient<H> {
        &self.inner
    }

    pub fn ensure_valid(&self, force: bool) -> Result<(), BayesError> {
        self.runtime.block_on(self.inner.ensure_valid(force))
    }

    pub fn logout(&self) -> Result<(), BayesError> {
        self.runtime.block_on(self.inner.logout())
    }

    pub fn list_tags(&self) -> Result<Vec<Tag>, BayesError> {
        self.runtime.block_on(self.inner.list_tags())
    }

    pub fn list_games(&self, query: &GamesQuery) -> Result<GamesPage, BayesError> {
        self.runtime.block_on(self.inner.list_games(query))
    }

    pub fn list_all_games(&self, filter: &GamesFilter) -> Result<Vec<Game>, BayesError> {
        self.runtime.block_on(self.inner.list_all_games(filter))
    }

    pub fn get_game(&self, id: &str) -> Result<Game, BayesError> {
        self.runtime.block_on(self.inner.get_game(id))
    }

    pub fn get_asset(&self, id: &str, kind: AssetKind) -> Result<Vec<u8>, BayesError> {
        self.runtime.block_on(self.inner.get_asset(id, kind))
    }
}
