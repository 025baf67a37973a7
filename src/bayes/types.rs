use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::BayesError;

/// Page size larger than the total number of games Bayes will ever report.
///
/// Used to request everything in one page and to detect truncation.
pub const PAGE_SIZE_SENTINEL: u32 = 99999;

/// A game tag, either free-form or one of the two reserved sentinels
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Tag {
    /// `NULL`: the game carries no tags
    Untagged,
    /// `ALL`: match games regardless of their tags
    Any,
    Named(String),
}

impl Tag {
    pub const UNTAGGED: &'static str = "NULL";
    pub const ANY: &'static str = "ALL";

    /// Returns the wire representation of the tag
    pub fn as_str(&self) -> &str {
        match self {
            Self::Untagged => Self::UNTAGGED,
            Self::Any => Self::ANY,
            Self::Named(name) => name,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        !matches!(self, Self::Named(_))
    }
}

impl From<String> for Tag {
    fn from(value: String) -> Self {
        match value.as_str() {
            Self::UNTAGGED => Self::Untagged,
            Self::ANY => Self::Any,
            _ => Self::Named(value),
        }
    }
}

impl From<&str> for Tag {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<Tag> for String {
    fn from(tag: Tag) -> Self {
        match tag {
            Tag::Named(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Downloadable asset kinds a game may offer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetKind {
    GamhDetails,
    GamhSummary,
    RoflReplay,
}

impl AssetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GamhDetails => "GAMH_DETAILS",
            Self::GamhSummary => "GAMH_SUMMARY",
            Self::RoflReplay => "ROFL_REPLAY",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AssetKind {
    type Err = BayesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GAMH_DETAILS" => Ok(Self::GamhDetails),
            "GAMH_SUMMARY" => Ok(Self::GamhSummary),
            "ROFL_REPLAY" => Ok(Self::RoflReplay),
            other => Err(BayesError::BadRequest(format!("Unknown asset type: {other}"))),
        }
    }
}

/// A game as reported by the Bayes API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub platform_game_id: String,
    pub name: String,
    pub status: String,
    /// ISO-8601 creation timestamp, passed through as the server formats it
    pub created_at: String,
    pub assets: Vec<AssetKind>,
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub block_name: Option<String>,
    #[serde(default)]
    pub sub_block_name: Option<String>,
    #[serde(default)]
    pub team_tri_codes: Vec<String>,
}

impl Game {
    /// Gives a game without tags the `NULL` tag
    pub fn normalize_tags(mut self) -> Self {
        if self.tags.is_empty() {
            self.tags.push(Tag::Untagged);
        }
        self
    }

    pub fn has_asset(&self, kind: AssetKind) -> bool {
        self.assets.contains(&kind)
    }
}

/// One page of the games listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GamesPage {
    pub page: u32,
    pub size: u32,
    /// Total number of games matching the query, across all pages
    pub count: u64,
    pub games: Vec<Game>,
}

/// Parameters for a single `api/v1/games` request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GamesQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub from_timestamp: Option<DateTime<Utc>>,
    pub to_timestamp: Option<DateTime<Utc>>,
    pub tags: Option<Vec<String>>,
}

impl GamesQuery {
    /// Query parameters in wire order, with unset filters left out
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(page) = self.page {
            params.push(("page", page.to_string()));
        }
        if let Some(size) = self.page_size {
            params.push(("size", size.to_string()));
        }
        if let Some(from) = self.from_timestamp {
            params.push(("from_timestamp", from.to_rfc3339()));
        }
        if let Some(to) = self.to_timestamp {
            params.push(("to_timestamp", to.to_rfc3339()));
        }
        if let Some(tags) = &self.tags {
            params.push(("tags", tags.join(",")));
        }
        params
    }
}

/// Filters for fetching every matching game
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GamesFilter {
    pub tag: Option<Tag>,
    pub tags: Option<Vec<Tag>>,
    pub from_timestamp: Option<DateTime<Utc>>,
    pub to_timestamp: Option<DateTime<Utc>>,
}

/// How a set of requested tags maps onto the listing endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagFilter {
    /// No server-side filter
    All,
    /// No server-side filter; keep only games that came back without tags
    UntaggedOnly,
    Tags(Vec<String>),
}

impl TagFilter {
    /// Merges the single-tag and multi-tag arguments and validates them.
    ///
    /// The sentinels `NULL` and `ALL` must be requested alone.
    pub fn resolve(tag: Option<&Tag>, tags: Option<&[Tag]>) -> Result<Self, BayesError> {
        let mut requested: Vec<&Tag> = tags.map(|t| t.iter().collect()).unwrap_or_default();
        if let Some(tag) = tag {
            requested.push(tag);
        }

        match requested.as_slice() {
            [] | [Tag::Any] => Ok(Self::All),
            [Tag::Untagged] => Ok(Self::UntaggedOnly),
            many if many.iter().any(|t| t.is_sentinel()) => Err(BayesError::InvalidTagFilter(
                "the special tags NULL and ALL must be requested alone".to_string(),
            )),
            many => Ok(Self::Tags(
                many.iter().map(|t| t.as_str().to_string()).collect(),
            )),
        }
    }

    /// Tags to send to the server, if any
    pub fn server_tags(&self) -> Option<Vec<String>> {
        match self {
            Self::Tags(tags) => Some(tags.clone()),
            Self::All | Self::UntaggedOnly => None,
        }
    }

    /// Applies the client-side part of the filter and normalizes tags
    pub fn finish(&self, games: Vec<Game>) -> Vec<Game> {
        games
            .into_iter()
            .filter(|g| !(*self == Self::UntaggedOnly && !g.tags.is_empty()))
            .map(Game::normalize_tags)
            .collect()
    }
}

/// Response from `login` and `login/refresh_token`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime of the access token in seconds
    pub expires_in: f64,
}

/// Response from `api/v1/games/{id}/download`
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DownloadResponse {
    pub url: String,
}
