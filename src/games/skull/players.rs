use enum_iterator::Sequence;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::game::{Card, Decider, GameView};

#[derive(
    Debug, Clone, Copy, Default, Serialize, Sequence, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
#[serde(rename_all = "camelCase")]
pub enum Strategy {
    Aggressive,
    Conservative,
    #[default]
    Balanced,
    Random,
}

impl Strategy {
    // Chance of slipping the skull into the stack instead of a rose
    fn skull_chance(&self) -> f64 {
        match self {
            Strategy::Aggressive => 0.4,
            Strategy::Conservative => 0.2,
            Strategy::Balanced => 0.3,
            Strategy::Random => 0.5,
        }
    }

    // Eagerness to stop placing and open the bidding, growing with the table
    fn bid_chance(&self, cards_on_table: usize) -> f64 {
        let table = cards_on_table as f64;
        let chance = match self {
            Strategy::Aggressive => 0.4 + table * 0.05,
            Strategy::Conservative => 0.2 + table * 0.03,
            Strategy::Balanced => 0.3 + table * 0.04,
            Strategy::Random => 0.5,
        };
        chance.min(1.0)
    }

    fn raise_chance(&self) -> f64 {
        match self {
            Strategy::Aggressive => 0.5,
            Strategy::Conservative => 0.3,
            Strategy::Balanced => 0.4,
            Strategy::Random => 0.5,
        }
    }
}

/// Automated decider parameterized by a [`Strategy`]. All answers are legal
/// for the view they were produced from; the probabilities are flavor only.
#[derive(Debug, Clone)]
pub struct StrategyPlayer {
    pub strategy: Strategy,
    rng: StdRng,
}

impl StrategyPlayer {
    pub fn new(strategy: Strategy, seed: u64) -> Self {
        StrategyPlayer {
            strategy,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Decider for StrategyPlayer {
    fn choose_card_to_play(&mut self, view: &GameView) -> Option<Card> {
        if !view.has_skull {
            return Some(Card::Rose);
        }
        if view.roses_in_hand == 0 || self.rng.gen_bool(self.strategy.skull_chance()) {
            return Some(Card::Skull);
        }
        Some(Card::Rose)
    }

    fn decide_play_or_bid(&mut self, view: &GameView) -> bool {
        if view.cards_in_hand == 0 {
            return true;
        }
        self.rng.gen_bool(self.strategy.bid_chance(view.total_cards_on_table))
    }

    fn make_bid(&mut self, current_bid: i32, max_bid: i32, _view: &GameView) -> Option<i32> {
        if current_bid >= max_bid {
            return None;
        }
        if !self.rng.gen_bool(self.strategy.raise_chance()) {
            return None;
        }
        match self.strategy {
            // Random jumps anywhere in range, everyone else inches up
            Strategy::Random => Some(self.rng.gen_range(current_bid + 1..=max_bid)),
            _ => Some(current_bid + 1),
        }
    }

    fn choose_card_to_lose(&mut self, view: &GameView) -> Card {
        // Uniform over the hand's composition
        let pick = self.rng.gen_range(0..view.cards_in_hand);
        if pick < view.roses_in_hand {
            Card::Rose
        } else {
            Card::Skull
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use enum_iterator::all;

    fn views() -> Vec<GameView> {
        let mut views = vec![];
        for cards_in_hand in 1..=4 {
            for roses_in_hand in 0..=cards_in_hand {
                views.push(GameView {
                    cards_in_hand,
                    has_skull: roses_in_hand < cards_in_hand,
                    roses_in_hand,
                    cards_played: 4 - cards_in_hand,
                    total_cards_on_table: 7,
                    active_players: 3,
                    current_bid: 2,
                    rounds_won: 0,
                });
            }
        }
        views
    }

    #[test]
    fn test_chosen_cards_come_from_the_hand() {
        for strategy in all::<Strategy>() {
            let mut player = StrategyPlayer::new(strategy, 7);
            for view in views() {
                for _ in 0..50 {
                    let card = player
                        .choose_card_to_play(&view)
                        .expect("strategy players never withdraw");
                    match card {
                        Card::Rose => assert!(view.roses_in_hand > 0),
                        Card::Skull => assert!(view.has_skull),
                    }
                    let lost = player.choose_card_to_lose(&view);
                    match lost {
                        Card::Rose => assert!(view.roses_in_hand > 0),
                        Card::Skull => assert!(view.has_skull),
                    }
                }
            }
        }
    }

    #[test]
    fn test_bids_stay_in_range() {
        for strategy in all::<Strategy>() {
            let mut player = StrategyPlayer::new(strategy, 11);
            let view = GameView::default();
            for current_bid in 0..6 {
                for max_bid in 0..8 {
                    for _ in 0..50 {
                        if let Some(bid) = player.make_bid(current_bid, max_bid, &view) {
                            assert!(bid > current_bid && bid <= max_bid);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_maxed_out_bid_forces_a_pass() {
        for strategy in all::<Strategy>() {
            let mut player = StrategyPlayer::new(strategy, 13);
            assert_eq!(player.make_bid(3, 3, &GameView::default()), None);
            assert_eq!(player.make_bid(5, 3, &GameView::default()), None);
        }
    }

    #[test]
    fn test_empty_hand_always_opens_bidding() {
        let mut player = StrategyPlayer::new(Strategy::Conservative, 17);
        let view = GameView {
            cards_in_hand: 0,
            ..Default::default()
        };
        for _ in 0..20 {
            assert!(player.decide_play_or_bid(&view));
        }
    }
}
