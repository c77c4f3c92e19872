use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use setgame::{Card, PlayerId, Slot};

use crate::Ui;

/// Everything that was published to the [`Ui`], in order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum UiEvent {
    PlaceCard { card: Card, slot: Slot },
    RemoveCard { slot: Slot },
    PlaceToken { player: PlayerId, slot: Slot },
    RemoveToken { player: PlayerId, slot: Slot },
    RemoveTokens,
    Countdown { remaining_millis: u64, warn: bool },
    Score { player: PlayerId, score: u32 },
    Freeze { player: PlayerId, remaining_millis: u64 },
    Winners { players: Vec<PlayerId> },
}

/// A [`Ui`] that keeps every event, optionally passing it on to another one.
///
/// The events of a game can be written to a JSON file afterwards.
pub struct Recorder {
    num: Mutex<usize>,
    directory: Option<PathBuf>,
    events: Mutex<Vec<UiEvent>>,
    forward_to: Option<Arc<dyn Ui>>,
}

impl Recorder {
    /// Only records in memory.
    pub fn new() -> Self {
        Self {
            num: Mutex::new(1),
            directory: None,
            events: Mutex::new(Vec::new()),
            forward_to: None,
        }
    }

    pub fn with_directory(directory: PathBuf) -> anyhow::Result<Self> {
        if !directory.is_dir() {
            anyhow::bail!("Directory '{}' does not exist", directory.display());
        }
        Ok(Self {
            directory: Some(directory),
            ..Self::new()
        })
    }

    pub fn forwarding_to(mut self, ui: Arc<dyn Ui>) -> Self {
        self.forward_to = Some(ui);
        self
    }

    pub fn events(&self) -> Vec<UiEvent> {
        self.events.lock().clone()
    }

    fn record(&self, event: UiEvent) {
        self.events.lock().push(event);
    }

    /// Writes the events recorded so far to the next `game_NNNNNN.json` file,
    /// and starts over with an empty recording.
    pub fn write_game_recording(&self) -> anyhow::Result<Option<PathBuf>> {
        let Some(directory) = &self.directory else {
            return Ok(None);
        };
        let mut num = self.num.lock();
        let filepath = directory.join(format!("game_{:0>6}.json", *num));
        let events = std::mem::take(&mut *self.events.lock());
        let writer = BufWriter::new(File::create(&filepath)?);
        serde_json::to_writer_pretty(writer, &events)?;
        *num += 1;
        Ok(Some(filepath))
    }
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new()
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl Ui for Recorder {
    fn place_card(&self, card: Card, slot: Slot) {
        self.record(UiEvent::PlaceCard { card, slot });
        if let Some(ui) = &self.forward_to {
            ui.place_card(card, slot);
        }
    }

    fn remove_card(&self, slot: Slot) {
        self.record(UiEvent::RemoveCard { slot });
        if let Some(ui) = &self.forward_to {
            ui.remove_card(slot);
        }
    }

    fn place_token(&self, player: PlayerId, slot: Slot) {
        self.record(UiEvent::PlaceToken { player, slot });
        if let Some(ui) = &self.forward_to {
            ui.place_token(player, slot);
        }
    }

    fn remove_token(&self, player: PlayerId, slot: Slot) {
        self.record(UiEvent::RemoveToken { player, slot });
        if let Some(ui) = &self.forward_to {
            ui.remove_token(player, slot);
        }
    }

    fn remove_tokens(&self) {
        self.record(UiEvent::RemoveTokens);
        if let Some(ui) = &self.forward_to {
            ui.remove_tokens();
        }
    }

    fn set_countdown(&self, remaining: Duration, warn: bool) {
        self.record(UiEvent::Countdown {
            remaining_millis: millis(remaining),
            warn,
        });
        if let Some(ui) = &self.forward_to {
            ui.set_countdown(remaining, warn);
        }
    }

    fn set_score(&self, player: PlayerId, score: u32) {
        self.record(UiEvent::Score { player, score });
        if let Some(ui) = &self.forward_to {
            ui.set_score(player, score);
        }
    }

    fn set_freeze(&self, player: PlayerId, remaining: Duration) {
        self.record(UiEvent::Freeze {
            player,
            remaining_millis: millis(remaining),
        });
        if let Some(ui) = &self.forward_to {
            ui.set_freeze(player, remaining);
        }
    }

    fn announce_winner(&self, players: &[PlayerId]) {
        self.record(UiEvent::Winners {
            players: players.to_vec(),
        });
        if let Some(ui) = &self.forward_to {
            ui.announce_winner(players);
        }
    }
}
