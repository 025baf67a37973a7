//! Test data builders
//!
//! Provides builder patterns for creating test data with sensible defaults.

use std::ops::Range;

use crate::bayes::{AssetKind, Game, Tag};

/// Builder for creating test Game objects
///
/// Games start out untagged, offering the two GAMH assets.
#[derive(Debug, Clone)]
pub struct GameBuilder {
    platform_game_id: String,
    name: String,
    status: String,
    created_at: String,
    assets: Vec<AssetKind>,
    tags: Vec<Tag>,
    block_name: Option<String>,
    sub_block_name: Option<String>,
    team_tri_codes: Vec<String>,
}

impl Default for GameBuilder {
    fn default() -> Self {
        Self {
            platform_game_id: "ESPORTSTMNT01:1000".to_string(),
            name: "T1 vs GEN".to_string(),
            status: "FINISHED".to_string(),
            created_at: "2024-05-01T12:00:00.000Z".to_string(),
            assets: vec![AssetKind::GamhDetails, AssetKind::GamhSummary],
            tags: vec![],
            block_name: None,
            sub_block_name: None,
            team_tri_codes: vec!["T1".to_string(), "GEN".to_string()],
        }
    }
}

impl GameBuilder {
    /// Creates a new game builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds one game per index, with IDs `game_<i>`
    pub fn many(ids: Range<usize>) -> Vec<Game> {
        ids.map(|i| Self::new().id(format!("game_{i}")).build())
            .collect()
    }

    /// Sets the platform game ID
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.platform_game_id = id.into();
        self
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    /// Adds an asset to the game
    pub fn asset(mut self, kind: AssetKind) -> Self {
        self.assets.push(kind);
        self
    }

    /// Replaces the offered assets
    pub fn assets(mut self, assets: Vec<AssetKind>) -> Self {
        self.assets = assets;
        self
    }

    /// Adds a tag to the game
    pub fn tag(mut self, tag: impl Into<Tag>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Removes all tags, as the server reports games nobody tagged
    pub fn untagged(mut self) -> Self {
        self.tags.clear();
        self
    }

    /// Sets the block and sub-block names
    pub fn block(mut self, block: impl Into<String>, sub_block: impl Into<String>) -> Self {
        self.block_name = Some(block.into());
        self.sub_block_name = Some(sub_block.into());
        self
    }

    /// Sets the tri-codes of the teams playing
    pub fn teams(mut self, teams: &[&str]) -> Self {
        self.team_tri_codes = teams.iter().map(ToString::to_string).collect();
        self
    }

    /// Builds the Game
    pub fn build(self) -> Game {
        Game {
            platform_game_id: self.platform_game_id,
            name: self.name,
            status: self.status,
            created_at: self.created_at,
            assets: self.assets,
            tags: self.tags,
            block_name: self.block_name,
            sub_block_name: self.sub_block_name,
            team_tri_codes: self.team_tri_codes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_builder_defaults() {
        let game = GameBuilder::new().build();

        assert_eq!(game.platform_game_id, "ESPORTSTMNT01:1000");
        assert!(game.tags.is_empty());
        assert!(game.has_asset(AssetKind::GamhDetails));
        assert!(!game.has_asset(AssetKind::RoflReplay));
    }

    #[test]
    fn game_builder_custom_values() {
        let game = GameBuilder::new()
            .id("custom")
            .status("LIVE")
            .tag("LCK")
            .asset(AssetKind::RoflReplay)
            .block("Week 1", "Day 2")
            .teams(&["DK", "KT"])
            .build();

        assert_eq!(game.platform_game_id, "custom");
        assert_eq!(game.status, "LIVE");
        assert_eq!(game.tags, vec![Tag::from("LCK")]);
        assert!(game.has_asset(AssetKind::RoflReplay));
        assert_eq!(game.block_name.as_deref(), Some("Week 1"));
        assert_eq!(game.team_tri_codes, vec!["DK", "KT"]);
    }

    #[test]
    fn many_numbers_ids() {
        let games = GameBuilder::many(2..4);

        assert_eq!(games.len(), 2);
        assert_eq!(games[0].platform_game_id, "game_2");
        assert_eq!(games[1].platform_game_id, "game_3");
    }
}
