//! HTTP client abstraction for the Bayes API
//!
//! This module provides a trait-based HTTP client that can be easily mocked for testing.
//! It only moves bytes: authentication, retries and status interpretation live in the client.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use std::sync::OnceLock;

/// Trait for making HTTP requests
///
/// This abstraction allows easy mocking of HTTP calls in tests.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Makes a GET request and returns the raw response
    async fn get(&self, url: &str, headers: &HeaderMap) -> Result<HttpResponse>;

    /// Makes a POST request with a JSON body and returns the raw response
    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<HttpResponse>;
}

/// Response from an HTTP request
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Returns true if status is in 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns true if status is 401
    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    /// Returns true if status is 404
    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }

    /// Returns true if status is 429
    pub fn is_rate_limited(&self) -> bool {
        self.status == 429
    }

    /// Returns the body as text, replacing invalid UTF-8
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Deserializes the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).context("Failed to parse JSON response")
    }
}

/// Production HTTP client using reqwest
///
/// The underlying `reqwest::Client` is built on first use and shared afterwards.
#[derive(Debug, Clone, Default)]
pub struct ReqwestClient {
    inner: OnceLock<reqwest::Client>,
}

impl ReqwestClient {
    /// Creates a new reqwest-based HTTP client
    pub fn new() -> Self {
        Self::default()
    }

    fn client(&self) -> &reqwest::Client {
        self.inner.get_or_init(reqwest::Client::new)
    }

    async fn read(response: reqwest::Response) -> Result<HttpResponse> {
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .context("Failed to read response body")?
            .to_vec();

        Ok(HttpResponse { status, body })
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get(&self, url: &str, headers: &HeaderMap) -> Result<HttpResponse> {
        let response = self
            .client()
            .get(url)
            .headers(headers.clone())
            .send()
            .await
            .context("Failed to send request")?;

        Self::read(response).await
    }

    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<HttpResponse> {
        let response = self
            .client()
            .post(url)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;

        Self::read(response).await
    }
}
