use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Identifies one card of the deck.
///
/// The id encodes the card's features: read in base `feature_size`, its
/// `feature_count` digits are the feature values. Nothing outside of the
/// [rules](crate::RuleOracle) interprets them.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Card(pub u32);

impl Card {
    /// The feature values of this card, least significant feature first.
    pub fn features(&self, feature_size: u32, feature_count: u32) -> Vec<u32> {
        let mut rest = self.0;
        (0..feature_count)
            .map(|_| {
                let value = rest % feature_size;
                rest /= feature_size;
                value
            })
            .collect()
    }
}

impl std::fmt::Display for Card {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The cards that are neither on the table nor discarded.
///
/// The order only matters for drawing, and the dealer shuffles before every
/// deal.
#[derive(Clone, Debug, Default)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// A deck with the cards `0..deck_size`.
    pub fn full(deck_size: u32) -> Self {
        Self {
            cards: (0..deck_size).map(Card).collect(),
        }
    }

    pub fn from_cards(cards: impl IntoIterator<Item = Card>) -> Self {
        Self {
            cards: cards.into_iter().collect(),
        }
    }

    pub fn shuffle(&mut self, rng: &mut StdRng) {
        self.cards.shuffle(rng);
    }

    /// Takes the top card, if there is one.
    pub fn draw(&mut self) -> Option<Card> {
        self.cards.pop()
    }

    pub fn put_back(&mut self, cards: impl IntoIterator<Item = Card>) {
        self.cards.extend(cards);
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}
