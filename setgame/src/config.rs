use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::{ConfigError, SetRules};

/// The settings for one game.
///
/// Every field has a default, so a config file only needs to mention what it
/// changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How many slots the table has.
    pub table_size: usize,
    /// How many values each feature can take. This is also the number of
    /// cards in a combination.
    pub feature_size: u32,
    /// How many features each card has.
    pub feature_count: u32,
    /// Defaults to every card the features can describe.
    pub deck_size: Option<u32>,
    pub human_players: usize,
    pub computer_players: usize,
    /// Names for the players, by index. Players without a name get a generic one.
    pub player_names: Vec<String>,
    /// After this long without a successful claim, the table is dealt anew.
    pub turn_timeout_millis: u64,
    /// The countdown is shown as a warning once it drops below this.
    pub turn_timeout_warning_millis: u64,
    pub point_freeze_millis: u64,
    pub penalty_freeze_millis: u64,
    /// How often countdowns are published.
    pub tick_millis: u64,
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            table_size: 12,
            feature_size: 3,
            feature_count: 4,
            deck_size: None,
            human_players: 0,
            computer_players: 2,
            player_names: Vec::new(),
            turn_timeout_millis: 60_000,
            turn_timeout_warning_millis: 5_000,
            point_freeze_millis: 1_000,
            penalty_freeze_millis: 3_000,
            tick_millis: 1_000,
            seed: None,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read config file '{}'", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Could not parse config file '{}'", path.display()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.table_size == 0 {
            return Err(ConfigError::EmptyTable);
        }
        if self.num_players() == 0 {
            return Err(ConfigError::NoPlayers);
        }
        if self.feature_size < 2 {
            return Err(ConfigError::FeatureSizeTooSmall);
        }
        if self.combination_size() > self.table_size {
            return Err(ConfigError::CombinationLargerThanTable {
                combination_size: self.combination_size(),
                table_size: self.table_size,
            });
        }
        let feature_space = self.feature_space();
        if u64::from(self.deck_size()) > feature_space {
            return Err(ConfigError::DeckLargerThanFeatureSpace {
                deck_size: self.deck_size(),
                feature_space,
            });
        }
        if self.turn_timeout_millis == 0 {
            return Err(ConfigError::ZeroTurnTimeout);
        }
        if self.player_names.len() > self.num_players() {
            return Err(ConfigError::UnknownPlayerName {
                player_idx: self.num_players(),
            });
        }
        Ok(())
    }

    pub fn num_players(&self) -> usize {
        self.human_players + self.computer_players
    }

    pub fn combination_size(&self) -> usize {
        self.feature_size as usize
    }

    fn feature_space(&self) -> u64 {
        u64::from(self.feature_size).saturating_pow(self.feature_count)
    }

    pub fn deck_size(&self) -> u32 {
        self.deck_size
            .unwrap_or_else(|| u32::try_from(self.feature_space()).unwrap_or(u32::MAX))
    }

    /// Players `0..human_players` are human, the rest are computer players.
    pub fn is_human(&self, player_idx: usize) -> bool {
        player_idx < self.human_players
    }

    pub fn player_name(&self, player_idx: usize) -> String {
        match self.player_names.get(player_idx) {
            Some(name) => name.clone(),
            None if self.is_human(player_idx) => format!("Player {}", player_idx + 1),
            None => format!("Computer {}", player_idx + 1),
        }
    }

    pub fn rules(&self) -> SetRules {
        SetRules::new(self.feature_size, self.feature_count)
    }

    pub fn turn_timeout(&self) -> Duration {
        Duration::from_millis(self.turn_timeout_millis)
    }

    pub fn turn_timeout_warning(&self) -> Duration {
        Duration::from_millis(self.turn_timeout_warning_millis)
    }

    pub fn point_freeze(&self) -> Duration {
        Duration::from_millis(self.point_freeze_millis)
    }

    pub fn penalty_freeze(&self) -> Duration {
        Duration::from_millis(self.penalty_freeze_millis)
    }

    /// Never zero, the dealer and the players wait in steps of this.
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_millis.max(1))
    }
}
