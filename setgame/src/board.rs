use std::collections::{BTreeMap, BTreeSet};

use crate::Card;

/// Index of a player, starting from 0.
pub type PlayerId = usize;

/// Index of a position on the table, starting from 0.
pub type Slot = usize;

/// What happened when a player selected a slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Selection {
    /// The slot is empty, or the player already has a full set of tokens.
    Ignored,
    /// The player's token was taken back.
    Removed,
    /// A token was placed; `tokens` is how many the player holds now.
    Placed { tokens: usize },
}

/// The cards on the table and the tokens the players put on them.
///
/// This is plain data without any synchronization; the dealer wraps it in a
/// lock. Every method leaves the two token views (per slot and per player)
/// in agreement: a slot carries a player's token iff it is in that player's
/// token list, and only slots holding a card carry tokens.
#[derive(Clone, Debug)]
pub struct BoardState {
    slot_to_card: Vec<Option<Card>>,
    card_to_slot: BTreeMap<Card, Slot>,
    slot_tokens: Vec<BTreeSet<PlayerId>>,
    /// Ordered by placement.
    player_tokens: Vec<Vec<Slot>>,
}

impl BoardState {
    pub fn new(table_size: usize, num_players: usize) -> Self {
        Self {
            slot_to_card: vec![None; table_size],
            card_to_slot: BTreeMap::new(),
            slot_tokens: vec![BTreeSet::new(); table_size],
            player_tokens: vec![Vec::new(); num_players],
        }
    }

    pub fn table_size(&self) -> usize {
        self.slot_to_card.len()
    }

    pub fn card_at(&self, slot: Slot) -> Option<Card> {
        self.slot_to_card.get(slot).copied().flatten()
    }

    pub fn slot_of(&self, card: Card) -> Option<Slot> {
        self.card_to_slot.get(&card).copied()
    }

    /// The caller must have checked that the slot is empty.
    pub fn place_card(&mut self, card: Card, slot: Slot) {
        debug_assert!(self.slot_to_card[slot].is_none(), "slot {slot} is occupied");
        debug_assert!(self.slot_tokens[slot].is_empty());
        self.slot_to_card[slot] = Some(card);
        self.card_to_slot.insert(card, slot);
    }

    /// Removes the card and every token on it.
    ///
    /// Returns the card together with the players whose token was on it.
    pub fn remove_card(&mut self, slot: Slot) -> Option<(Card, Vec<PlayerId>)> {
        let card = self.slot_to_card.get_mut(slot)?.take()?;
        self.card_to_slot.remove(&card);
        let displaced: Vec<PlayerId> = std::mem::take(&mut self.slot_tokens[slot])
            .into_iter()
            .collect();
        for &player in &displaced {
            self.player_tokens[player].retain(|&s| s != slot);
        }
        Some((card, displaced))
    }

    /// Returns false if there was no card to put the token on, or the token
    /// was already there.
    pub fn place_token(&mut self, player: PlayerId, slot: Slot) -> bool {
        if self.card_at(slot).is_none() || !self.slot_tokens[slot].insert(player) {
            return false;
        }
        self.player_tokens[player].push(slot);
        true
    }

    /// Returns whether the token existed.
    pub fn remove_token(&mut self, player: PlayerId, slot: Slot) -> bool {
        let existed = self
            .slot_tokens
            .get_mut(slot)
            .is_some_and(|tokens| tokens.remove(&player));
        if existed {
            self.player_tokens[player].retain(|&s| s != slot);
        }
        existed
    }

    /// Takes the player's token back if it is on the slot, and otherwise puts
    /// one there unless the player already holds `max_tokens`.
    pub fn toggle_token(&mut self, player: PlayerId, slot: Slot, max_tokens: usize) -> Selection {
        if self.card_at(slot).is_none() {
            Selection::Ignored
        } else if self.remove_token(player, slot) {
            Selection::Removed
        } else if self.player_tokens[player].len() < max_tokens && self.place_token(player, slot) {
            Selection::Placed {
                tokens: self.player_tokens[player].len(),
            }
        } else {
            Selection::Ignored
        }
    }

    pub fn count_cards(&self) -> usize {
        self.card_to_slot.len()
    }

    pub fn empty_slots(&self) -> Vec<Slot> {
        (0..self.table_size())
            .filter(|&slot| self.slot_to_card[slot].is_none())
            .collect()
    }

    /// The cards on the table, in slot order.
    pub fn cards(&self) -> Vec<Card> {
        self.slot_to_card.iter().flatten().copied().collect()
    }

    pub fn tokens_of_player(&self, player: PlayerId) -> Vec<Slot> {
        self.player_tokens[player].clone()
    }

    pub fn tokens_on_slot(&self, slot: Slot) -> &BTreeSet<PlayerId> {
        &self.slot_tokens[slot]
    }

    /// `None` if one of the slots is empty.
    pub fn cards_at_slots(&self, slots: &[Slot]) -> Option<Vec<Card>> {
        slots.iter().map(|&slot| self.card_at(slot)).collect()
    }

    pub fn clear_tokens(&mut self) {
        for tokens in self.slot_tokens.iter_mut() {
            tokens.clear();
        }
        for tokens in self.player_tokens.iter_mut() {
            tokens.clear();
        }
    }

    /// Empties the table, returning the cards with the slots they were on.
    pub fn take_all_cards(&mut self) -> Vec<(Slot, Card)> {
        self.clear_tokens();
        self.card_to_slot.clear();
        self.slot_to_card
            .iter_mut()
            .enumerate()
            .filter_map(|(slot, card)| card.take().map(|card| (slot, card)))
            .collect()
    }

    /// Removes a claimed combination, but only if each slot still holds the
    /// card the claim was verified with and still carries the player's token.
    ///
    /// All or nothing: returns false and changes nothing otherwise.
    pub fn take_claimed(&mut self, player: PlayerId, slots: &[Slot], cards: &[Card]) -> bool {
        let unchanged = slots.len() == cards.len()
            && slots.iter().zip(cards).all(|(&slot, &card)| {
                self.card_at(slot) == Some(card) && self.slot_tokens[slot].contains(&player)
            });
        if !unchanged {
            return false;
        }
        for &slot in slots {
            self.remove_card(slot);
        }
        true
    }

    /// Checks that the per-slot and per-player token views agree.
    pub fn is_consistent(&self) -> bool {
        let slots_agree = self.slot_tokens.iter().enumerate().all(|(slot, players)| {
            (players.is_empty() || self.slot_to_card[slot].is_some())
                && players
                    .iter()
                    .all(|&player| self.player_tokens[player].contains(&slot))
        });
        let players_agree = self.player_tokens.iter().enumerate().all(|(player, slots)| {
            let unique: BTreeSet<&Slot> = slots.iter().collect();
            unique.len() == slots.len()
                && slots
                    .iter()
                    .all(|&slot| self.slot_tokens[slot].contains(&player))
        });
        let cards_agree = self
            .card_to_slot
            .iter()
            .all(|(&card, &slot)| self.slot_to_card[slot] == Some(card))
            && self.card_to_slot.len() == self.slot_to_card.iter().flatten().count();
        slots_agree && players_agree && cards_agree
    }
}
