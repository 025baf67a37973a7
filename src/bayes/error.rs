/// Errors surfaced by the Bayes API client
#[derive(Debug, thiserror::Error)]
pub enum BayesError {
    /// The login exchange itself was rejected by the server
    #[error("Bad credentials: the Bayes API rejected the login")]
    BadCredentials,
    #[error("Bad request: {0}")]
    BadRequest(String),
    /// The response body did not have the shape the endpoint promises
    #[error("Unexpected response from {endpoint}: {body}")]
    UnexpectedResponse { endpoint: String, body: String },
    #[error("Rate limited by the Bayes API")]
    RateLimited,
    /// The access token was rejected again right after a forced re-login
    #[error("Unauthorized: access token rejected after re-login")]
    Unauthorized,
    #[error("API error {status}: {body}")]
    Http { status: u16, body: String },
    #[error("Invalid tag filter: {0}")]
    InvalidTagFilter(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BayesError {
    /// Returns the HTTP status behind this error, if there is one
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::RateLimited => Some(429),
            Self::Unauthorized => Some(401),
            _ => None,
        }
    }

    /// Returns true for errors the retry policy should absorb
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited)
    }

    pub(crate) fn unexpected(endpoint: &str, body: &[u8]) -> Self {
        Self::UnexpectedResponse {
            endpoint: endpoint.to_string(),
            body: String::from_utf8_lossy(body).into_owned(),
        }
    }
}
