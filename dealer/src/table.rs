use std::sync::Arc;

use parking_lot::Mutex;
use setgame::{BoardState, Card, Deck, PlayerId, Selection, Slot};

use crate::Ui;

/// The board shared by the dealer and all players.
///
/// Each method is a single critical section on the board lock. The [`Ui`] is
/// notified after the lock is released.
pub struct Table {
    state: Mutex<BoardState>,
    ui: Arc<dyn Ui>,
}

impl Table {
    pub fn new(table_size: usize, num_players: usize, ui: Arc<dyn Ui>) -> Self {
        Self {
            state: Mutex::new(BoardState::new(table_size, num_players)),
            ui,
        }
    }

    /// A copy of the whole board, taken at one instant.
    pub fn snapshot(&self) -> BoardState {
        self.state.lock().clone()
    }

    /// Returns false if the slot is taken.
    pub fn place_card(&self, card: Card, slot: Slot) -> bool {
        {
            let mut state = self.state.lock();
            if state.card_at(slot).is_some() {
                return false;
            }
            state.place_card(card, slot);
        }
        self.ui.place_card(card, slot);
        true
    }

    /// Removes the card together with all tokens on it.
    pub fn remove_card(&self, slot: Slot) -> Option<Card> {
        let (card, displaced) = self.state.lock().remove_card(slot)?;
        for player in displaced {
            self.ui.remove_token(player, slot);
        }
        self.ui.remove_card(slot);
        Some(card)
    }

    pub fn place_token(&self, player: PlayerId, slot: Slot) -> bool {
        let placed = self.state.lock().place_token(player, slot);
        if placed {
            self.ui.place_token(player, slot);
        }
        placed
    }

    /// Returns whether the token existed.
    pub fn remove_token(&self, player: PlayerId, slot: Slot) -> bool {
        let removed = self.state.lock().remove_token(player, slot);
        if removed {
            self.ui.remove_token(player, slot);
        }
        removed
    }

    /// Applies a player's selection of a slot, see [`BoardState::toggle_token`].
    pub fn select(&self, player: PlayerId, slot: Slot, max_tokens: usize) -> Selection {
        let selection = self.state.lock().toggle_token(player, slot, max_tokens);
        match selection {
            Selection::Placed { .. } => self.ui.place_token(player, slot),
            Selection::Removed => self.ui.remove_token(player, slot),
            Selection::Ignored => {}
        }
        selection
    }

    pub fn count_cards(&self) -> usize {
        self.state.lock().count_cards()
    }

    pub fn cards(&self) -> Vec<Card> {
        self.state.lock().cards()
    }

    pub fn tokens_of_player(&self, player: PlayerId) -> Vec<Slot> {
        self.state.lock().tokens_of_player(player)
    }

    pub fn cards_at_slots(&self, slots: &[Slot]) -> Option<Vec<Card>> {
        self.state.lock().cards_at_slots(slots)
    }

    /// The player's tokens and the cards under them, read together.
    pub fn claim_snapshot(&self, player: PlayerId) -> (Vec<Slot>, Option<Vec<Card>>) {
        let state = self.state.lock();
        let slots = state.tokens_of_player(player);
        let cards = state.cards_at_slots(&slots);
        (slots, cards)
    }

    /// Deals cards from the deck onto the empty slots, in slot order, until
    /// either runs out.
    pub fn fill(&self, deck: &mut Deck) -> Vec<(Slot, Card)> {
        let placed: Vec<(Slot, Card)> = {
            let mut state = self.state.lock();
            let mut placed = Vec::new();
            for slot in state.empty_slots() {
                let Some(card) = deck.draw() else {
                    break;
                };
                state.place_card(card, slot);
                placed.push((slot, card));
            }
            placed
        };
        for &(slot, card) in &placed {
            self.ui.place_card(card, slot);
        }
        placed
    }

    /// See [`BoardState::take_claimed`].
    pub fn take_claimed(&self, player: PlayerId, slots: &[Slot], cards: &[Card]) -> bool {
        let displaced: Vec<(Slot, Vec<PlayerId>)> = {
            let mut state = self.state.lock();
            let displaced = slots
                .iter()
                .map(|&slot| (slot, state.tokens_on_slot(slot).iter().copied().collect()))
                .collect();
            if !state.take_claimed(player, slots, cards) {
                return false;
            }
            displaced
        };
        for (slot, players) in displaced {
            for player in players {
                self.ui.remove_token(player, slot);
            }
            self.ui.remove_card(slot);
        }
        true
    }

    /// Clears the table, returning its cards.
    pub fn take_all_cards(&self) -> Vec<Card> {
        let taken = self.state.lock().take_all_cards();
        self.ui.remove_tokens();
        taken
            .into_iter()
            .map(|(slot, card)| {
                self.ui.remove_card(slot);
                card
            })
            .collect()
    }
}
