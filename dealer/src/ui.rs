use std::time::Duration;

use setgame::{Card, PlayerId, Slot};
use tracing::{debug, info, trace};

/// Where the game publishes what players should see.
///
/// Calls are fire-and-forget and must not block; the game never calls them
/// while holding the board lock.
pub trait Ui: Send + Sync {
    fn place_card(&self, card: Card, slot: Slot);
    fn remove_card(&self, slot: Slot);
    fn place_token(&self, player: PlayerId, slot: Slot);
    fn remove_token(&self, player: PlayerId, slot: Slot);
    /// All tokens were taken off the table.
    fn remove_tokens(&self);
    fn set_countdown(&self, remaining: Duration, warn: bool);
    fn set_score(&self, player: PlayerId, score: u32);
    /// Zero means the player is no longer frozen.
    fn set_freeze(&self, player: PlayerId, remaining: Duration);
    fn announce_winner(&self, players: &[PlayerId]);
}

/// Writes the game's events to the log.
pub struct LogUi {
    names: Vec<String>,
}

impl LogUi {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    fn name(&self, player: PlayerId) -> &str {
        self.names.get(player).map(String::as_str).unwrap_or("unknown")
    }
}

impl Ui for LogUi {
    fn place_card(&self, card: Card, slot: Slot) {
        trace!(%card, slot, "Card placed");
    }

    fn remove_card(&self, slot: Slot) {
        trace!(slot, "Card removed");
    }

    fn place_token(&self, player: PlayerId, slot: Slot) {
        trace!(player = self.name(player), slot, "Token placed");
    }

    fn remove_token(&self, player: PlayerId, slot: Slot) {
        trace!(player = self.name(player), slot, "Token removed");
    }

    fn remove_tokens(&self) {
        trace!("All tokens removed");
    }

    fn set_countdown(&self, remaining: Duration, warn: bool) {
        if warn {
            debug!(remaining_millis = remaining.as_millis() as u64, "Countdown running out");
        } else {
            trace!(remaining_millis = remaining.as_millis() as u64, "Countdown");
        }
    }

    fn set_score(&self, player: PlayerId, score: u32) {
        info!(player = self.name(player), score, "Score");
    }

    fn set_freeze(&self, player: PlayerId, remaining: Duration) {
        trace!(
            player = self.name(player),
            remaining_millis = remaining.as_millis() as u64,
            "Frozen"
        );
    }

    fn announce_winner(&self, players: &[PlayerId]) {
        let names: Vec<&str> = players.iter().map(|&p| self.name(p)).collect();
        info!(winners = ?names, "Game over");
    }
}
