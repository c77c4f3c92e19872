/// The error type for [`Config::validate()`](crate::Config::validate).
#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    EmptyTable,
    NoPlayers,
    CombinationLargerThanTable {
        combination_size: usize,
        table_size: usize,
    },
    DeckLargerThanFeatureSpace {
        deck_size: u32,
        feature_space: u64,
    },
    FeatureSizeTooSmall,
    ZeroTurnTimeout,
    UnknownPlayerName {
        player_idx: usize,
    },
}

impl std::error::Error for ConfigError {}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::EmptyTable => write!(f, "The table must have at least one slot"),
            ConfigError::NoPlayers => write!(f, "The game needs at least one player"),
            ConfigError::CombinationLargerThanTable {
                combination_size,
                table_size,
            } => write!(
                f,
                "A combination has {} cards, but the table only has {} slots",
                combination_size, table_size
            ),
            ConfigError::DeckLargerThanFeatureSpace {
                deck_size,
                feature_space,
            } => write!(
                f,
                "The deck should have {} cards, but the features only describe {} distinct cards",
                deck_size, feature_space
            ),
            ConfigError::FeatureSizeTooSmall => {
                write!(f, "Each feature needs at least two values")
            }
            ConfigError::ZeroTurnTimeout => write!(f, "The turn timeout must not be zero"),
            ConfigError::UnknownPlayerName { player_idx } => write!(
                f,
                "A name was given for player {}, but there are fewer players",
                player_idx
            ),
        }
    }
}
