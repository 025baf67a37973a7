//! Common test utilities for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use bayes_client::auth::Credentials;
use bayes_client::bayes::{BayesClient, HttpClient, HttpResponse, RetryPolicy};
use reqwest::header::HeaderMap;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const BASE: &str = "https://emh-api.bayesesports.com/";

/// Full URL of an endpoint under the default base URL
pub fn url(path: &str) -> String {
    format!("{BASE}{path}")
}

/// One request seen by [`ScriptedHttp`]
#[derive(Debug, Clone)]
pub struct Seen {
    pub method: &'static str,
    pub url: String,
    pub authorization: Option<String>,
}

/// Scripted HTTP transport
///
/// Answers each `(method, url)` from a queue whose last entry repeats forever.
#[derive(Clone, Default)]
pub struct ScriptedHttp {
    routes: Arc<Mutex<HashMap<(&'static str, String), VecDeque<HttpResponse>>>>,
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl ScriptedHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(
        self,
        method: &'static str,
        url: &str,
        status: u16,
        body: impl Into<Vec<u8>>,
    ) -> Self {
        self.routes
            .lock()
            .unwrap()
            .entry((method, url.to_string()))
            .or_default()
            .push_back(HttpResponse {
                status,
                body: body.into(),
            });
        self
    }

    pub fn get_json(self, url: &str, body: &Value) -> Self {
        self.respond("GET", url, 200, body.to_string())
    }

    pub fn login_issues(self, token: &str) -> Self {
        self.respond("POST", &url("login"), 200, token_body(token, 3600).to_string())
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    pub fn count(&self, method: &str, url: &str) -> usize {
        self.seen()
            .iter()
            .filter(|s| s.method == method && s.url == url)
            .count()
    }

    fn answer(
        &self,
        method: &'static str,
        url: &str,
        headers: &HeaderMap,
    ) -> anyhow::Result<HttpResponse> {
        self.seen.lock().unwrap().push(Seen {
            method,
            url: url.to_string(),
            authorization: headers
                .get("Authorization")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        });

        let mut routes = self.routes.lock().unwrap();
        let queue = routes
            .get_mut(&(method, url.to_string()))
            .filter(|q| !q.is_empty())
            .ok_or_else(|| anyhow::anyhow!("Unscripted request: {method} {url}"))?;

        Ok(if queue.len() > 1 {
            queue.pop_front().unwrap()
        } else {
            queue[0].clone()
        })
    }
}

#[async_trait]
impl HttpClient for ScriptedHttp {
    async fn get(&self, url: &str, headers: &HeaderMap) -> anyhow::Result<HttpResponse> {
        self.answer("GET", url, headers)
    }

    async fn post_json(&self, url: &str, _body: &Value) -> anyhow::Result<HttpResponse> {
        self.answer("POST", url, &HeaderMap::new())
    }
}

/// Login or refresh response body issuing `token`
pub fn token_body(token: &str, expires_in_secs: u64) -> Value {
    json!({
        "accessToken": token,
        "refreshToken": format!("refresh-{token}"),
        "expiresIn": expires_in_secs,
    })
}

/// Game JSON as the API returns it
pub fn game_body(id: &str, assets: &[&str], tags: &[&str]) -> Value {
    json!({
        "platformGameId": id,
        "name": "T1 vs GEN",
        "status": "FINISHED",
        "createdAt": "2024-05-01T12:00:00.000Z",
        "assets": assets,
        "tags": tags,
        "teamTriCodes": ["T1", "GEN"],
    })
}

/// Client over a scripted transport with near-instant retries
pub fn client(http: ScriptedHttp) -> BayesClient<ScriptedHttp> {
    BayesClient::with_http_client(Credentials::new("user", "pass"), http).with_retry_policy(
        RetryPolicy::new(Some(4), Duration::from_millis(1), Duration::from_millis(2)),
    )
}
