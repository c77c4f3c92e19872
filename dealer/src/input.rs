use std::io::BufRead;
use std::sync::Arc;

use anyhow::Context;
use parking_lot::Mutex;
use setgame::Slot;
use tracing::{debug, warn};

use crate::Player;

/// Routes key presses of human players, one `<player> <slot>` per line, to
/// the players of the game that is currently running.
#[derive(Default)]
pub struct HumanInput {
    players: Mutex<Vec<Arc<Player>>>,
}

impl HumanInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts routing to the human players among `players`.
    pub fn attach(&self, players: &[Arc<Player>]) {
        *self.players.lock() = players.iter().filter(|p| p.human).cloned().collect();
    }

    pub fn detach(&self) {
        self.players.lock().clear();
    }

    /// Returns whether the key press reached a player.
    pub fn route(&self, line: &str) -> anyhow::Result<bool> {
        let mut words = line.split_whitespace();
        let (Some(player), Some(slot), None) = (words.next(), words.next(), words.next()) else {
            anyhow::bail!("Expected '<player> <slot>', got '{}'", line);
        };
        let player: usize = player
            .parse()
            .with_context(|| format!("Invalid player '{}'", player))?;
        let slot: Slot = slot
            .parse()
            .with_context(|| format!("Invalid slot '{}'", slot))?;

        let players = self.players.lock();
        let Some(player) = players.iter().find(|p| p.id == player) else {
            anyhow::bail!("There is no human player {}", player);
        };
        let accepted = player.key_pressed(slot);
        if !accepted {
            debug!(player = %player.name, slot, "Key press dropped");
        }
        Ok(accepted)
    }

    /// Routes lines until the reader is exhausted.
    pub fn run(&self, reader: impl BufRead) -> anyhow::Result<()> {
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            if let Err(err) = self.route(&line) {
                warn!("{:#}", err);
            }
        }
        Ok(())
    }
}
