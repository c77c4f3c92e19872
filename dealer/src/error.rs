use setgame::PlayerId;

#[derive(Debug)]
/// Error type for running a game.
///
/// Players making bad claims is part of the game and never an error. These
/// are the failures of the threads themselves.
pub enum DealerError {
    SpawnFailed {
        thread: String,
        err: std::io::Error,
    },
    PlayerThreadPanicked {
        player: PlayerId,
    },
    GeneratorThreadPanicked {
        player: PlayerId,
    },
}

impl std::error::Error for DealerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DealerError::SpawnFailed { err, .. } => Some(err),
            _ => None,
        }
    }
}

impl std::fmt::Display for DealerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DealerError::SpawnFailed { thread, err: _ } => {
                write!(f, "Could not start the thread '{}'", thread)
            }
            DealerError::PlayerThreadPanicked { player } => {
                write!(f, "The thread of player {} panicked", player)
            }
            DealerError::GeneratorThreadPanicked { player } => write!(
                f,
                "The input generator of player {} panicked",
                player
            ),
        }
    }
}
