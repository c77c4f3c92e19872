use quickcheck::Arbitrary;

use crate::{BoardState, Card, PlayerId, Slot};

/// One step of a random walk over the board's operations.
#[derive(Clone, Debug)]
pub enum BoardOp {
    PlaceCard { card: Card, slot: Slot },
    RemoveCard { slot: Slot },
    ToggleToken { player: PlayerId, slot: Slot },
    RemoveToken { player: PlayerId, slot: Slot },
    TakeClaimed { player: PlayerId },
    ClearTokens,
    TakeAllCards,
}

impl BoardOp {
    pub fn apply(&self, board: &mut BoardState) {
        match *self {
            BoardOp::PlaceCard { card, slot } => {
                // Callers of place_card check these themselves
                if board.card_at(slot).is_none() && board.slot_of(card).is_none() {
                    board.place_card(card, slot);
                }
            }
            BoardOp::RemoveCard { slot } => {
                board.remove_card(slot);
            }
            BoardOp::ToggleToken { player, slot } => {
                board.toggle_token(player, slot, 3);
            }
            BoardOp::RemoveToken { player, slot } => {
                board.remove_token(player, slot);
            }
            BoardOp::TakeClaimed { player } => {
                let slots = board.tokens_of_player(player);
                if let Some(cards) = board.cards_at_slots(&slots) {
                    board.take_claimed(player, &slots, &cards);
                }
            }
            BoardOp::ClearTokens => board.clear_tokens(),
            BoardOp::TakeAllCards => {
                board.take_all_cards();
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct BoardOps(pub Vec<BoardOp>);

impl BoardOps {
    pub const TABLE_SIZE: usize = 6;
    pub const NUM_PLAYERS: usize = 3;
}

impl quickcheck::Arbitrary for BoardOp {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        let slot = usize::arbitrary(g) % BoardOps::TABLE_SIZE;
        let player = usize::arbitrary(g) % BoardOps::NUM_PLAYERS;
        // Bias towards token moves, they are the interesting part
        match u8::arbitrary(g) % 10 {
            0 | 1 => BoardOp::PlaceCard {
                card: Card(u32::arbitrary(g) % 12),
                slot,
            },
            2 => BoardOp::RemoveCard { slot },
            3..=5 => BoardOp::ToggleToken { player, slot },
            6 => BoardOp::RemoveToken { player, slot },
            7 => BoardOp::TakeClaimed { player },
            8 => BoardOp::ClearTokens,
            _ => BoardOp::TakeAllCards,
        }
    }
}

impl quickcheck::Arbitrary for BoardOps {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        // Start with a full table so that tokens have somewhere to go
        let mut ops: Vec<BoardOp> = (0..BoardOps::TABLE_SIZE)
            .map(|slot| BoardOp::PlaceCard {
                card: Card(slot as u32),
                slot,
            })
            .collect();
        ops.extend(Vec::<BoardOp>::arbitrary(g));
        BoardOps(ops)
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        Box::new(self.0.shrink().map(BoardOps))
    }
}
