use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::http::{HttpClient, HttpResponse, ReqwestClient};
use super::retry::RetryPolicy;
use super::types::{
    AssetKind, DownloadResponse, Game, GamesFilter, GamesPage, GamesQuery, Tag, TagFilter,
    TokenResponse, PAGE_SIZE_SENTINEL,
};
use super::BayesError;
use crate::auth::{
    Credentials, FileSessionStore, MemorySessionStore, Session, SessionStorage, StoreError,
};
use crate::config::{Config, DEFAULT_BASE_URL};
use crate::time::{Clock, SystemClock};

/// Status the login endpoints answer with when they reject credentials or a refresh token
const VALIDATION_FAILURE_STATUS: u16 = 500;

pub(crate) mod endpoints {
    pub const LOGIN: &str = "login";
    pub const REFRESH: &str = "login/refresh_token";
    pub const TAGS: &str = "api/v1/tags";
    pub const GAMES: &str = "api/v1/games";
}

/// Bayes esports API client
///
/// Keeps the access token fresh on its own: it logs in on first use, refreshes the
/// token once it expires and logs in again when the API rejects it.
/// Generic over the HTTP client implementation for testability.
pub struct BayesClient<H: HttpClient = ReqwestClient> {
    http: H,
    credentials: Credentials,
    base_url: String,
    session: Arc<RwLock<Option<Session>>>,
    store: Arc<dyn SessionStorage>,
    clock: Arc<dyn Clock>,
    retry: RetryPolicy,
}

impl BayesClient<ReqwestClient> {
    /// Creates a client with the default configuration and session file
    pub fn new(credentials: Credentials) -> anyhow::Result<Self> {
        Self::from_config(credentials, &Config::default())
    }

    /// Creates a client from a loaded configuration
    pub fn from_config(credentials: Credentials, config: &Config) -> anyhow::Result<Self> {
        let store = match &config.session_file {
            Some(path) => FileSessionStore::with_path(path.clone()),
            None => FileSessionStore::new()?,
        };

        Ok(Self::with_http_client(credentials, ReqwestClient::new())
            .with_base_url(config.base_url.clone())
            .with_store(store)
            .with_retry_policy(config.retry_policy()))
    }
}

impl<H: HttpClient> BayesClient<H> {
    /// Creates a client with a custom HTTP implementation
    ///
    /// The session is kept in memory only until a store is set with [`Self::with_store`].
    pub fn with_http_client(credentials: Credentials, http: H) -> Self {
        Self {
            http,
            credentials,
            base_url: DEFAULT_BASE_URL.to_string(),
            session: Arc::new(RwLock::new(None)),
            store: Arc::new(MemorySessionStore::new()),
            clock: Arc::new(SystemClock),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_store(mut self, store: impl SessionStorage + 'static) -> Self {
        self.store = Arc::new(store);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Returns the current in-memory session, if any
    pub async fn session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    fn url(&self, endpoint: &str, params: &[(&str, String)]) -> Result<String, BayesError> {
        let url = format!("{}{}", self.base_url, endpoint);
        if params.is_empty() {
            return Ok(url);
        }

        let url = reqwest::Url::parse_with_params(&url, params)
            .with_context(|| format!("Failed to build URL for {endpoint}"))?;
        Ok(url.into())
    }
}

impl<H: HttpClient + Clone> Clone for BayesClient<H> {
    fn clone(&self) -> Self {
        Self {
            http: self.http.clone(),
            credentials: self.credentials.clone(),
            base_url: self.base_url.clone(),
            session: self.session.clone(),
            store: self.store.clone(),
            clock: self.clock.clone(),
            retry: self.retry.clone(),
        }
    }
}

/// Decodes a successful response body, treating any mismatch as contract drift
fn decode<T: DeserializeOwned>(endpoint: &str, response: &HttpResponse) -> Result<T, BayesError> {
    response.json().map_err(|e| {
        tracing::debug!("Failed to decode response from {}: {:#}", endpoint, e);
        BayesError::unexpected(endpoint, &response.body)
    })
}

fn status_error(response: &HttpResponse) -> BayesError {
    BayesError::Http {
        status: response.status,
        body: response.text(),
    }
}

// Session-related methods
impl<H: HttpClient> BayesClient<H> {
    /// Makes sure the client holds an access token that is valid right now
    ///
    /// With `force`, logs in again regardless of the current session. Otherwise an
    /// existing valid session is kept and an expired one is refreshed. With no session
    /// at all the store is consulted before falling back to a fresh login.
    pub async fn ensure_valid(&self, force: bool) -> Result<(), BayesError> {
        if force {
            return self.login().await;
        }

        let current = self.session.read().await.clone();
        let session = match current {
            Some(session) => session,
            None => match self.store.load().await {
                Ok(stored) => {
                    tracing::debug!("Loaded stored Bayes session");
                    *self.session.write().await = Some(stored.clone());
                    stored
                }
                Err(StoreError::NoSession) => return self.login().await,
                Err(StoreError::Storage(e)) => {
                    tracing::warn!("Ignoring unreadable stored session: {:#}", e);
                    return self.login().await;
                }
            },
        };

        if session.is_valid(self.clock.now()) {
            return Ok(());
        }

        // No known expiry means a full login, refresh token or not
        if session.expires_at.is_none() {
            tracing::debug!("Session has no expiry, logging in again");
            return self.login().await;
        }

        match session.refresh_token {
            Some(refresh_token) => self.refresh(&refresh_token).await,
            None => self.login().await,
        }
    }

    /// Exchanges the username and password for a new session
    async fn login(&self) -> Result<(), BayesError> {
        tracing::info!("Logging in to Bayes as {}", self.credentials.username);

        let body = json!({
            "username": self.credentials.username,
            "password": self.credentials.password(),
        });

        let tokens = match self.post::<TokenResponse>(endpoints::LOGIN, &body).await {
            Err(BayesError::Http { status, .. }) if status == VALIDATION_FAILURE_STATUS => {
                tracing::warn!("Bayes rejected the login for {}", self.credentials.username);
                return Err(BayesError::BadCredentials);
            }
            result => result?,
        };

        self.install(endpoints::LOGIN, tokens, None).await
    }

    /// Exchanges a refresh token for a new access token
    ///
    /// Falls back to a full login when the refresh token itself is rejected.
    async fn refresh(&self, refresh_token: &str) -> Result<(), BayesError> {
        tracing::debug!("Access token expired, refreshing");

        let body = json!({ "refreshToken": refresh_token });
        match self.post::<TokenResponse>(endpoints::REFRESH, &body).await {
            Ok(tokens) => {
                self.install(endpoints::REFRESH, tokens, Some(refresh_token)).await
            }
            Err(BayesError::Http { status, .. }) if status == VALIDATION_FAILURE_STATUS => {
                tracing::info!("Refresh token rejected, logging in again");
                self.login().await
            }
            Err(e) => Err(e),
        }
    }

    /// Replaces the session with freshly issued tokens and persists it
    ///
    /// An `expiresIn` that can't be turned into a point in time is `UnexpectedResponse`.
    async fn install(
        &self,
        endpoint: &str,
        tokens: TokenResponse,
        previous_refresh: Option<&str>,
    ) -> Result<(), BayesError> {
        let expires_at = chrono::Duration::try_milliseconds((tokens.expires_in * 1000.0) as i64)
            .and_then(|lifetime| self.clock.now().checked_add_signed(lifetime))
            .ok_or_else(|| BayesError::UnexpectedResponse {
                endpoint: endpoint.to_string(),
                body: format!("expiresIn out of range: {}", tokens.expires_in),
            })?;

        let session = Session {
            access_token: tokens.access_token,
            refresh_token: tokens
                .refresh_token
                .or_else(|| previous_refresh.map(str::to_string)),
            expires_at: Some(expires_at),
        };

        if let Err(e) = self.store.save(&session).await {
            tracing::warn!("Failed to persist Bayes session: {:#}", e);
        }

        *self.session.write().await = Some(session);
        Ok(())
    }

    /// Forgets the session, both in memory and in the store
    pub async fn logout(&self) -> Result<(), BayesError> {
        *self.session.write().await = None;
        self.store.delete().await?;
        Ok(())
    }

    /// Builds the headers for an authenticated request
    async fn auth_headers(&self) -> Result<HeaderMap, BayesError> {
        self.ensure_valid(false).await?;

        let token = self
            .session
            .read()
            .await
            .as_ref()
            .map(|s| s.access_token.clone())
            .context("No access token after login")?;

        let mut headers = HeaderMap::new();
        let value = HeaderValue::from_str(&format!("Bearer {token}"))
            .context("Access token is not a valid header value")?;
        headers.insert(AUTHORIZATION, value);

        Ok(headers)
    }
}

// Call execution
impl<H: HttpClient> BayesClient<H> {
    /// Makes an unauthenticated POST to one of the login endpoints
    async fn post<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &serde_json::Value,
    ) -> Result<T, BayesError> {
        let url = self.url(endpoint, &[])?;
        let response = self.http.post_json(&url, body).await?;

        if !response.is_success() {
            return Err(status_error(&response));
        }

        decode(endpoint, &response)
    }

    /// Makes an authenticated GET, retrying while rate limited
    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T, BayesError> {
        let url = self.url(endpoint, params)?;
        self.retry.execute(|| self.get_once(endpoint, &url)).await
    }

    /// One authenticated GET attempt
    ///
    /// A 401 triggers a forced re-login and exactly one more try; a second 401 is
    /// returned as `BayesError::Unauthorized`.
    async fn get_once<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        url: &str,
    ) -> Result<T, BayesError> {
        let mut allow_retry = true;

        loop {
            let headers = self.auth_headers().await?;
            let response = self.http.get(url, &headers).await?;

            if response.is_unauthorized() {
                if !allow_retry {
                    return Err(BayesError::Unauthorized);
                }
                tracing::warn!("Access token rejected on {}, logging in again", endpoint);
                self.ensure_valid(true).await?;
                allow_retry = false;
                continue;
            }

            if response.is_rate_limited() {
                return Err(BayesError::RateLimited);
            }

            if !response.is_success() {
                return Err(status_error(&response));
            }

            return decode(endpoint, &response);
        }
    }
}

// Tag-related methods
impl<H: HttpClient> BayesClient<H> {
    /// Lists the tags games can be requested by, led by the `NULL` and `ALL` sentinels
    pub async fn list_tags(&self) -> Result<Vec<Tag>, BayesError> {
        let tags: Vec<Tag> = self.get(endpoints::TAGS, &[]).await?;
        Ok([Tag::Untagged, Tag::Any].into_iter().chain(tags).collect())
    }
}

// Game-related methods
impl<H: HttpClient> BayesClient<H> {
    /// Fetches a single page of the games listing, with tags normalized
    pub async fn list_games(&self, query: &GamesQuery) -> Result<GamesPage, BayesError> {
        let mut page = self.fetch_page(query).await?;
        page.games = page.games.into_iter().map(Game::normalize_tags).collect();
        Ok(page)
    }

    /// One listing request, games exactly as the server sent them
    async fn fetch_page(&self, query: &GamesQuery) -> Result<GamesPage, BayesError> {
        self.get(endpoints::GAMES, &query.to_params()).await
    }

    /// Fetches every game matching the filter
    ///
    /// Returns `BayesError::InvalidTagFilter` if `NULL` or `ALL` is combined with any
    /// other tag.
    pub async fn list_all_games(&self, filter: &GamesFilter) -> Result<Vec<Game>, BayesError> {
        let tag_filter = TagFilter::resolve(filter.tag.as_ref(), filter.tags.as_deref())?;

        let query = GamesQuery {
            page: None,
            page_size: Some(PAGE_SIZE_SENTINEL),
            from_timestamp: filter.from_timestamp,
            to_timestamp: filter.to_timestamp,
            tags: tag_filter.server_tags(),
        };

        let games = self.collect_pages(query, PAGE_SIZE_SENTINEL).await?;
        Ok(tag_filter.finish(games))
    }

    /// Requests the first page and, if its count reaches `bound`, the following ones
    ///
    /// Stops once the reported count is reached or a page comes back empty.
    ///
    /// Games keep their original tags so untagged-only filtering can still see them.
    async fn collect_pages(
        &self,
        mut query: GamesQuery,
        bound: u32,
    ) -> Result<Vec<Game>, BayesError> {
        let first = self.fetch_page(&query).await?;
        let count = first.count;
        let mut games = first.games;

        if count >= u64::from(bound) {
            tracing::debug!("Listing truncated at {} of {} games, paging", games.len(), count);

            let mut page = 2;
            while (games.len() as u64) < count {
                query.page = Some(page);
                let next = self.fetch_page(&query).await?;
                if next.games.is_empty() {
                    tracing::warn!(
                        "Page {} came back empty with {} of {} games collected",
                        page,
                        games.len(),
                        count
                    );
                    break;
                }
                games.extend(next.games);
                page += 1;
            }
        }

        Ok(games)
    }

    /// Fetches a game by its ID
    ///
    /// Returns `BayesError::BadRequest` if no game has that ID.
    pub async fn get_game(&self, id: &str) -> Result<Game, BayesError> {
        let endpoint = format!("{}/{}", endpoints::GAMES, urlencoding::encode(id));

        match self.get::<Game>(&endpoint, &[]).await {
            Ok(game) => Ok(game.normalize_tags()),
            Err(BayesError::Http { status: 404, .. }) => {
                Err(BayesError::BadRequest(format!("Invalid game ID: {id}")))
            }
            Err(e) => Err(e),
        }
    }

    /// Downloads one asset of a game
    ///
    /// The API hands out a short-lived URL which is then fetched without authentication.
    pub async fn get_asset(&self, id: &str, kind: AssetKind) -> Result<Vec<u8>, BayesError> {
        let game = self.get_game(id).await?;
        if !game.has_asset(kind) {
            return Err(BayesError::BadRequest(format!(
                "Invalid asset type for game with ID {id}: {kind}"
            )));
        }

        let endpoint = format!("{}/{}/download", endpoints::GAMES, urlencoding::encode(id));
        let download: DownloadResponse = self
            .get(&endpoint, &[("type", kind.as_str().to_string())])
            .await?;

        tracing::debug!("Downloading {} for game {}", kind, id);
        let response = self.http.get(&download.url, &HeaderMap::new()).await?;
        if !response.is_success() {
            return Err(status_error(&response));
        }

        Ok(response.body)
    }
}
