use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use crossbeam_channel::{select, Receiver};
use parking_lot::RwLock;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use setgame::{Config, Deck, PlayerId, RuleOracle};
use tracing::{debug, info};

use crate::{
    ClaimArbiter, DealerError, HumanInput, Player, PlayerAgent, PlayerTimings, RemovalRequest,
    Shutdown, Table, Ui,
};

/// How a game ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameResult {
    /// Everyone tied for the highest score.
    pub winners: Vec<PlayerId>,
    /// By player id.
    pub scores: Vec<u32>,
}

/// The players with the highest score.
pub fn winners(scores: &[u32]) -> Vec<PlayerId> {
    let Some(&max_score) = scores.iter().max() else {
        return Vec::new();
    };
    scores
        .iter()
        .enumerate()
        .filter(|&(_, &score)| score == max_score)
        .map(|(player, _)| player)
        .collect()
}

/// Runs one game: owns the deck, deals, keeps the countdown, and removes
/// the cards of accepted claims.
pub struct Dealer {
    config: Config,
    rules: Arc<dyn RuleOracle>,
    ui: Arc<dyn Ui>,
    table: Arc<Table>,
    players: Vec<Arc<Player>>,
    arbiter: Arc<ClaimArbiter>,
    removals: Receiver<RemovalRequest>,
    /// Held for writing while the dealer changes the cards on the table.
    dealing: Arc<RwLock<()>>,
    shutdown: Shutdown,
    deck: Deck,
    rng: StdRng,
}

impl Dealer {
    pub fn new(config: &Config, rules: Arc<dyn RuleOracle>, ui: Arc<dyn Ui>) -> Self {
        // Get a random seed
        let seed = config.seed.unwrap_or_else(rand::random);
        info!(seed);

        let num_players = config.num_players();
        let table = Arc::new(Table::new(config.table_size, num_players, ui.clone()));
        let dealing = Arc::new(RwLock::new(()));
        let shutdown = Shutdown::new();
        let (arbiter, removals) = ClaimArbiter::new(
            table.clone(),
            rules.clone(),
            dealing.clone(),
            shutdown.clone(),
        );
        let players = (0..num_players)
            .map(|id| {
                Arc::new(Player::new(
                    id,
                    config.player_name(id),
                    config.is_human(id),
                    rules.combination_size(),
                ))
            })
            .collect();

        Self {
            config: config.clone(),
            rules,
            ui,
            table,
            players,
            arbiter: Arc::new(arbiter),
            removals,
            dealing,
            shutdown,
            deck: Deck::full(config.deck_size()),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Plays with the given cards instead of the full deck.
    pub fn with_deck(mut self, deck: Deck) -> Self {
        self.deck = deck;
        self
    }

    pub fn players(&self) -> &[Arc<Player>] {
        &self.players
    }

    pub fn table(&self) -> &Arc<Table> {
        &self.table
    }

    /// A handle for ending the game from another thread.
    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    pub fn terminate(&self) {
        self.shutdown.trigger();
    }

    /// Plays until no combination is left in the deck and on the table, or
    /// until terminated.
    pub fn run(mut self) -> Result<GameResult, DealerError> {
        info!("Dealer starting");
        let handles = self.spawn_players()?;

        while !self.should_finish() {
            self.place_cards_on_table();
            self.timer_loop();
            self.update_timer_display(None);
            self.remove_all_cards_from_table();
        }
        let result = self.announce_winners();

        self.terminate();
        let joined = join_players(handles);
        info!("Dealer terminated");
        joined.map(|()| result)
    }

    fn spawn_players(&mut self) -> Result<Vec<JoinHandle<Result<(), DealerError>>>, DealerError> {
        let timings = PlayerTimings {
            combination_size: self.rules.combination_size(),
            table_size: self.config.table_size,
            point_freeze: self.config.point_freeze(),
            penalty_freeze: self.config.penalty_freeze(),
            tick: self.config.tick(),
        };
        let mut handles = Vec::with_capacity(self.players.len());
        for player in &self.players {
            let agent = PlayerAgent::new(
                player.clone(),
                self.table.clone(),
                self.arbiter.clone(),
                self.dealing.clone(),
                self.shutdown.clone(),
                self.ui.clone(),
                timings,
                self.rng.gen(),
            );
            match agent.spawn() {
                Ok(handle) => handles.push(handle),
                Err(err) => {
                    self.terminate();
                    // The spawn error is what matters here
                    let _ = join_players(handles);
                    return Err(DealerError::SpawnFailed {
                        thread: format!("player {}", player.id),
                        err,
                    });
                }
            }
        }
        Ok(handles)
    }

    /// Counts down until the turn times out, handling claims in between.
    fn timer_loop(&mut self) {
        let timeout = self.config.turn_timeout();
        let mut deadline = Instant::now() + timeout;
        self.update_timer_display(None);
        loop {
            let now = Instant::now();
            let request = if now >= deadline {
                // A verified claim is answered before the table is reset
                match self.removals.try_recv() {
                    Ok(request) => Some(request),
                    Err(_) => break,
                }
            } else {
                let wake_up = deadline.min(now + self.config.tick());
                select! {
                    recv(self.removals) -> request => request.ok(),
                    recv(self.shutdown.signal()) -> _ => return,
                    default(wake_up.saturating_duration_since(now)) => None,
                }
            };
            if let Some(request) = request {
                if self.remove_cards_from_table(request) {
                    if self.should_finish() {
                        return;
                    }
                    deadline = Instant::now() + timeout;
                    self.update_timer_display(None);
                    continue;
                }
            }
            self.update_timer_display(Some(deadline));
        }
    }

    /// Should the game end?
    fn should_finish(&self) -> bool {
        if self.shutdown.is_triggered() {
            return true;
        }
        let mut cards = self.deck.cards().to_vec();
        cards.extend(self.table.cards());
        !self.rules.has_any_combination(&cards)
    }

    /// Takes the cards of an accepted claim off the table and deals new ones.
    ///
    /// Returns false if the claim became stale in the meantime.
    fn remove_cards_from_table(&mut self, request: RemovalRequest) -> bool {
        let applied = {
            let _dealing = self.dealing.write();
            self.table
                .take_claimed(request.player, &request.slots, &request.cards)
        };
        if applied {
            let player = &self.players[request.player];
            let score = player.award_point();
            debug!(player = %player.name, slots = ?request.slots, "Removed claimed cards");
            self.ui.set_score(player.id, score);
            self.place_cards_on_table();
        } else {
            debug!(player = request.player, "Claim went stale before removal");
        }
        request.reply(applied);
        applied
    }

    /// Shuffles the deck and fills the empty slots.
    fn place_cards_on_table(&mut self) {
        let _dealing = self.dealing.write();
        self.deck.shuffle(&mut self.rng);
        let placed = self.table.fill(&mut self.deck);
        if !placed.is_empty() {
            debug!(cards = placed.len(), deck = self.deck.len(), "Dealt cards");
        }
    }

    /// Returns every card on the table to the deck.
    fn remove_all_cards_from_table(&mut self) {
        let _dealing = self.dealing.write();
        let cards = self.table.take_all_cards();
        debug!(cards = cards.len(), "Returned cards to the deck");
        self.deck.put_back(cards);
    }

    /// `None` resets the countdown to the full turn timeout.
    fn update_timer_display(&self, deadline: Option<Instant>) {
        match deadline {
            None => self.ui.set_countdown(self.config.turn_timeout(), false),
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                let warn = remaining < self.config.turn_timeout_warning();
                self.ui.set_countdown(remaining, warn);
            }
        }
    }

    fn announce_winners(&self) -> GameResult {
        let scores: Vec<u32> = self.players.iter().map(|p| p.score()).collect();
        for player in &self.players {
            info!(player = %player.name, score = player.score(), "Final score");
        }
        let winners = winners(&scores);
        self.ui.announce_winner(&winners);
        GameResult { winners, scores }
    }
}

/// Waits for the player threads, last player first.
fn join_players(handles: Vec<JoinHandle<Result<(), DealerError>>>) -> Result<(), DealerError> {
    let mut result = Ok(());
    for (player, handle) in handles.into_iter().enumerate().rev() {
        match handle.join() {
            Ok(Ok(())) => {}
            Ok(Err(err)) => result = Err(err),
            Err(_) => result = Err(DealerError::PlayerThreadPanicked { player }),
        }
    }
    result
}

/// Plays one game with the rules from the config, routing human input to the
/// game's players while it lasts.
pub fn play_game(
    config: &Config,
    ui: Arc<dyn Ui>,
    input: &HumanInput,
) -> Result<GameResult, DealerError> {
    let dealer = Dealer::new(config, Arc::new(config.rules()), ui);
    input.attach(dealer.players());
    let result = dealer.run();
    input.detach();
    result
}
