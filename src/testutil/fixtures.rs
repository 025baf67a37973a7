//! Test fixtures
//!
//! Pre-built test data and response bodies for common testing scenarios.

use chrono::{Duration, Utc};
use serde_json::{json, Value};

use super::builders::GameBuilder;
use crate::auth::Session;
use crate::bayes::{AssetKind, Game, GamesPage};

/// Creates a small mixed set of games
pub fn sample_games() -> Vec<Game> {
    vec![
        GameBuilder::new()
            .id("ESPORTSTMNT01:1001")
            .tag("LCK")
            .teams(&["T1", "GEN"])
            .build(),
        GameBuilder::new()
            .id("ESPORTSTMNT01:1002")
            .tag("LEC")
            .asset(AssetKind::RoflReplay)
            .teams(&["G2", "FNC"])
            .build(),
        GameBuilder::new()
            .id("ESPORTSTMNT01:1003")
            .untagged()
            .status("LIVE")
            .build(),
    ]
}

/// Wraps games in a listing page
pub fn games_page(page: u32, size: u32, count: u64, games: Vec<Game>) -> GamesPage {
    GamesPage {
        page,
        size,
        count,
        games,
    }
}

/// JSON body of a single game response
pub fn game_json(game: &Game) -> Value {
    serde_json::to_value(game).expect("Failed to serialize game")
}

/// Body of a login or refresh response issuing `token`
///
/// The refresh token is always `refresh-<token>`.
pub fn token_json(token: &str, expires_in_secs: u64) -> Value {
    json!({
        "accessToken": token,
        "refreshToken": format!("refresh-{token}"),
        "expiresIn": expires_in_secs,
    })
}

/// A session that stays valid for an hour
pub fn valid_session(token: &str) -> Session {
    Session {
        access_token: token.to_string(),
        refresh_token: Some(format!("refresh-{token}")),
        expires_at: Some(Utc::now() + Duration::hours(1)),
    }
}

/// A session that expired a minute ago
pub fn expired_session(token: &str) -> Session {
    Session {
        expires_at: Some(Utc::now() - Duration::minutes(1)),
        ..valid_session(token)
    }
}
