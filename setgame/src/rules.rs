use std::collections::BTreeSet;

use itertools::Itertools;

use crate::Card;

/// Decides which groups of cards count as a combination.
///
/// The game core only ever passes card ids through this trait and never looks
/// at their features itself.
pub trait RuleOracle: Send + Sync {
    /// How many cards make up one combination.
    fn combination_size(&self) -> usize;

    fn is_valid_combination(&self, cards: &[Card]) -> bool;

    /// Finds up to `limit` valid combinations among `cards`.
    fn find_combinations(&self, cards: &[Card], limit: usize) -> Vec<Vec<Card>> {
        cards
            .iter()
            .copied()
            .combinations(self.combination_size())
            .filter(|candidate| self.is_valid_combination(candidate))
            .take(limit)
            .collect()
    }

    /// Used to detect the end of the game.
    fn has_any_combination(&self, cards: &[Card]) -> bool {
        !self.find_combinations(cards, 1).is_empty()
    }
}

/// The classic rules: for each feature, the cards of a combination must
/// either all share the same value or all have different values.
///
/// A combination has exactly `feature_size` cards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SetRules {
    pub feature_size: u32,
    pub feature_count: u32,
}

impl SetRules {
    pub fn new(feature_size: u32, feature_count: u32) -> Self {
        Self {
            feature_size,
            feature_count,
        }
    }
}

impl RuleOracle for SetRules {
    fn combination_size(&self) -> usize {
        self.feature_size as usize
    }

    fn is_valid_combination(&self, cards: &[Card]) -> bool {
        if cards.len() != self.combination_size() {
            return false;
        }
        let features: Vec<Vec<u32>> = cards
            .iter()
            .map(|card| card.features(self.feature_size, self.feature_count))
            .collect();
        (0..self.feature_count as usize).all(|feature| {
            let distinct: BTreeSet<u32> = features.iter().map(|f| f[feature]).collect();
            distinct.len() == 1 || distinct.len() == cards.len()
        })
    }
}
