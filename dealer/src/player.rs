use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{select, Receiver, Sender};
use parking_lot::RwLock;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use setgame::{PlayerId, Selection, Slot};
use tracing::{info, trace, warn};

use crate::{ClaimArbiter, ClaimVerdict, DealerError, Shutdown, Table, Ui};

/// The part of a player that other threads talk to.
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// Human players get their input from outside, computer players from a
    /// generator thread.
    pub human: bool,
    score: AtomicU32,
    frozen: AtomicBool,
    selections_tx: Sender<Slot>,
    selections_rx: Receiver<Slot>,
}

impl Player {
    /// At most `queue_capacity` selections wait to be processed.
    pub fn new(id: PlayerId, name: String, human: bool, queue_capacity: usize) -> Self {
        let (selections_tx, selections_rx) = crossbeam_channel::bounded(queue_capacity.max(1));
        Self {
            id,
            name,
            human,
            score: AtomicU32::new(0),
            frozen: AtomicBool::new(false),
            selections_tx,
            selections_rx,
        }
    }

    /// Queues a selection of the given slot.
    ///
    /// Returns false if it was dropped because the player is frozen or too
    /// many selections are already waiting.
    pub fn key_pressed(&self, slot: Slot) -> bool {
        !self.is_frozen() && self.selections_tx.try_send(slot).is_ok()
    }

    pub fn score(&self) -> u32 {
        self.score.load(Ordering::SeqCst)
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::SeqCst)
    }

    /// Returns the new score.
    pub(crate) fn award_point(&self) -> u32 {
        self.score.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// Durations and sizes the player thread needs.
#[derive(Clone, Copy, Debug)]
pub struct PlayerTimings {
    pub combination_size: usize,
    pub table_size: usize,
    pub point_freeze: Duration,
    pub penalty_freeze: Duration,
    pub tick: Duration,
}

/// The thread body of a player.
///
/// Turns selections into token moves, claims a combination once the tokens
/// are complete, and sits out the freeze that follows a point or a penalty.
pub struct PlayerAgent {
    player: Arc<Player>,
    table: Arc<Table>,
    arbiter: Arc<ClaimArbiter>,
    dealing: Arc<RwLock<()>>,
    shutdown: Shutdown,
    ui: Arc<dyn Ui>,
    timings: PlayerTimings,
    /// Wakes up the generator after each processed selection.
    ack: Option<Sender<()>>,
    generator_seed: u64,
}

impl PlayerAgent {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        player: Arc<Player>,
        table: Arc<Table>,
        arbiter: Arc<ClaimArbiter>,
        dealing: Arc<RwLock<()>>,
        shutdown: Shutdown,
        ui: Arc<dyn Ui>,
        timings: PlayerTimings,
        generator_seed: u64,
    ) -> Self {
        Self {
            player,
            table,
            arbiter,
            dealing,
            shutdown,
            ui,
            timings,
            ack: None,
            generator_seed,
        }
    }

    pub fn spawn(self) -> std::io::Result<JoinHandle<Result<(), DealerError>>> {
        std::thread::Builder::new()
            .name(format!("player {}", self.player.id))
            .spawn(move || self.run())
    }

    pub fn run(mut self) -> Result<(), DealerError> {
        info!(player = %self.player.name, "Thread starting");
        let generator = if self.player.human {
            None
        } else {
            Some(self.spawn_generator()?)
        };

        while !self.shutdown.is_triggered() {
            select! {
                recv(self.player.selections_rx) -> slot => {
                    if let Ok(slot) = slot {
                        self.on_selection(slot);
                        self.acknowledge();
                    }
                }
                recv(self.shutdown.signal()) -> _ => break,
            }
        }

        if let Some(generator) = generator {
            if generator.join().is_err() {
                warn!(player = %self.player.name, "Generator thread panicked");
                return Err(DealerError::GeneratorThreadPanicked {
                    player: self.player.id,
                });
            }
        }
        info!(player = %self.player.name, "Thread terminated");
        Ok(())
    }

    fn spawn_generator(&mut self) -> Result<JoinHandle<()>, DealerError> {
        let (ack_tx, ack_rx) = crossbeam_channel::bounded(1);
        self.ack = Some(ack_tx);
        let generator = InputGenerator {
            player: self.player.clone(),
            table_size: self.timings.table_size,
            ack: ack_rx,
            shutdown: self.shutdown.clone(),
            rng: StdRng::seed_from_u64(self.generator_seed),
        };
        let thread = format!("computer-{}", self.player.id);
        std::thread::Builder::new()
            .name(thread.clone())
            .spawn(move || generator.run())
            .map_err(|err| DealerError::SpawnFailed { thread, err })
    }

    fn acknowledge(&self) {
        if let Some(ack) = &self.ack {
            let _ = ack.try_send(());
        }
    }

    /// Handles one selection of a slot by this player.
    pub fn on_selection(&self, slot: Slot) {
        if self.player.is_frozen() {
            return;
        }
        let selection = {
            // Blocks while the dealer is dealing
            let _dealing = self.dealing.read();
            if self.shutdown.is_triggered() {
                return;
            }
            self.table
                .select(self.player.id, slot, self.timings.combination_size)
        };
        trace!(player = %self.player.name, slot, ?selection);
        if selection
            == (Selection::Placed {
                tokens: self.timings.combination_size,
            })
        {
            match self.arbiter.submit_claim(self.player.id) {
                ClaimVerdict::Accepted => self.on_accepted(),
                ClaimVerdict::Rejected => self.on_rejected(),
                ClaimVerdict::Stale | ClaimVerdict::Interrupted => {}
            }
        }
    }

    /// The dealer already credited the point when it took the cards.
    fn on_accepted(&self) {
        self.freeze(self.timings.point_freeze);
    }

    fn on_rejected(&self) {
        self.freeze(self.timings.penalty_freeze);
    }

    /// Ignores selections until `duration` has passed, publishing the time
    /// left once per tick.
    fn freeze(&self, duration: Duration) {
        self.player.frozen.store(true, Ordering::SeqCst);
        let deadline = Instant::now() + duration;
        loop {
            let now = Instant::now();
            let remaining = deadline.saturating_duration_since(now);
            self.ui.set_freeze(self.player.id, remaining);
            if remaining.is_zero() {
                break;
            }
            if self.shutdown.sleep_until(deadline.min(now + self.timings.tick)) {
                break;
            }
        }
        // Whatever was queued during the freeze is dropped. Presses accepted
        // after the flag is cleared must survive.
        while self.player.selections_rx.try_recv().is_ok() {
            self.acknowledge();
        }
        self.player.frozen.store(false, Ordering::SeqCst);
    }
}

/// Presses random keys for a computer player, one at a time.
///
/// After each press it waits for the player thread to process it, so it can
/// never outrun a frozen or claiming player.
struct InputGenerator {
    player: Arc<Player>,
    table_size: usize,
    ack: Receiver<()>,
    shutdown: Shutdown,
    rng: StdRng,
}

impl InputGenerator {
    fn run(mut self) {
        info!(player = %self.player.name, "Generator starting");
        while !self.shutdown.is_triggered() {
            let slot = self.rng.gen_range(0..self.table_size);
            select! {
                send(self.player.selections_tx, slot) -> res => {
                    if res.is_err() {
                        break;
                    }
                }
                recv(self.shutdown.signal()) -> _ => break,
            }
            select! {
                recv(self.ack) -> res => {
                    if res.is_err() {
                        break;
                    }
                }
                recv(self.shutdown.signal()) -> _ => break,
            }
        }
        info!(player = %self.player.name, "Generator terminated");
    }
}
