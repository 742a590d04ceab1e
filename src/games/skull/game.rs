/*
Game: Skull (Skull and Roses)
Designer: Hervé Marly
BoardGameGeek: https://boardgamegeek.com/boardgame/92415/skull
*/

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{thread_rng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 6;
pub const STARTING_ROSES: usize = 3; // plus one skull for a hand of four
pub const ROUNDS_TO_WIN: i32 = 2;
pub const DEFAULT_TURN_LIMIT: u32 = 500;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Card {
    Rose,
    Skull,
}

impl Card {
    pub fn is_skull(&self) -> bool {
        *self == Card::Skull
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum State {
    #[default]
    InitialPlacement,
    CardPlacement,
    Bidding,
    Challenge,
    GameOver,
}

// How a finished game ended. TurnLimit is the safety valve, not a game rule.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Termination {
    RoundWins,
    LastStanding,
    Withdrawal,
    TurnLimit,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Location {
    #[default]
    Table,
    Hand,
    Stack,
    Lost,
    Message,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum ChangeType {
    #[default]
    Shuffle,
    PlaceCard,
    Bid,
    Pass,
    Reveal,
    ChallengeWon,
    ChallengeFailed,
    CardLost,
    Eliminated,
    RoundWon,
    GameOver,
    Message,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct Change {
    #[serde(rename(serialize = "type", deserialize = "type"))]
    pub change_type: ChangeType,
    pub player: usize,
    pub dest: Location,
    // Face-down placements withhold the tag; reveals and losses carry it
    pub card: Option<Card>,
    pub amount: i32,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStats {
    pub challenges_won: i32,
    pub challenges_lost: i32,
    pub cards_lost: i32,
    pub skulls_played: i32,
    pub roses_played: i32,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct GameStats {
    pub total_rounds: i32,
    pub total_challenges: i32,
    pub successful_challenges: i32,
    pub eliminations: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub name: String,
    pub hand: Vec<Card>,
    // Face-down stack; the last element is the top and is revealed first
    pub played_cards: Vec<Card>,
    pub rounds_won: i32,
    pub is_eliminated: bool,
    pub has_passed: bool,
    pub stats: PlayerStats,
}

impl Player {
    pub fn new(name: String) -> Self {
        let mut hand = vec![Card::Rose; STARTING_ROSES];
        hand.push(Card::Skull);
        Player {
            name,
            hand,
            ..Default::default()
        }
    }

    pub fn play_card(&mut self, card: Card) -> bool {
        let Some(pos) = self.hand.iter().position(|c| *c == card) else {
            return false;
        };
        self.hand.remove(pos);
        self.played_cards.push(card);
        if card.is_skull() {
            self.stats.skulls_played += 1;
        } else {
            self.stats.roses_played += 1;
        }
        true
    }

    pub fn retrieve_cards(&mut self) {
        let played = std::mem::take(&mut self.played_cards);
        self.hand.extend(played);
    }

    pub fn has_skull_in_hand(&self) -> bool {
        self.hand.iter().any(Card::is_skull)
    }

    pub fn roses_in_hand(&self) -> usize {
        self.hand.iter().filter(|c| !c.is_skull()).count()
    }

    pub fn reset_for_new_round(&mut self) {
        self.has_passed = false;
    }
}

// Read-only snapshot handed to deciders; the rules engine never exposes
// another player's hidden cards through it.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    pub cards_in_hand: usize,
    pub has_skull: bool,
    pub roses_in_hand: usize,
    pub cards_played: usize,
    pub total_cards_on_table: usize,
    pub active_players: usize,
    pub current_bid: i32,
    pub rounds_won: i32,
}

/// The seam between the rules engine and whatever is making decisions for a
/// seat. The engine re-prompts on illegal answers instead of coercing them.
pub trait Decider {
    /// `None` signals voluntary withdrawal; never called with an empty hand.
    fn choose_card_to_play(&mut self, view: &GameView) -> Option<Card>;
    /// `true` means stop placing cards and open the bidding.
    fn decide_play_or_bid(&mut self, view: &GameView) -> bool;
    /// Raise to a value in `(current_bid, max_bid]` or `None` to pass.
    fn make_bid(&mut self, current_bid: i32, max_bid: i32, view: &GameView) -> Option<i32>;
    /// Called only after the decider's seat revealed its own skull.
    fn choose_card_to_lose(&mut self, view: &GameView) -> Card;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SkullError {
    #[error("a game requires {MIN_PLAYERS} to {MAX_PLAYERS} players, got {0}")]
    PlayerCount(usize),
    #[error("{player} no longer has exactly four cards across hand, stack, and losses")]
    CardConservation { player: String },
    #[error("expected one decider per player ({players}), got {deciders}")]
    DeciderCount { players: usize, deciders: usize },
}

fn default_rng() -> StdRng {
    StdRng::seed_from_u64(0)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkullGame {
    pub players: Vec<Player>,
    pub current_player: usize,
    pub state: State,
    pub current_bid: i32,
    pub challenger: Option<usize>,
    pub skull_revealer: Option<usize>,
    pub round_number: i32,
    pub changes: Vec<Vec<Change>>,
    pub no_changes: bool,
    pub winner: Option<usize>,
    pub termination: Option<Termination>,
    pub turn_limit: u32,
    pub turns_taken: u32,
    pub stats: GameStats,
    #[serde(skip, default = "default_rng")]
    rng: StdRng,
}

impl SkullGame {
    pub fn new(names: Vec<String>) -> Result<Self, SkullError> {
        Self::with_seed(names, thread_rng().gen())
    }

    pub fn with_seed(names: Vec<String>, seed: u64) -> Result<Self, SkullError> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&names.len()) {
            return Err(SkullError::PlayerCount(names.len()));
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let mut players: Vec<Player> = names.into_iter().map(Player::new).collect();
        // Seating order is randomized once and never changes afterwards
        players.shuffle(&mut rng);

        let mut game = SkullGame {
            players,
            current_player: 0,
            state: State::InitialPlacement,
            current_bid: 0,
            challenger: None,
            skull_revealer: None,
            round_number: 1,
            changes: vec![],
            no_changes: false,
            winner: None,
            termination: None,
            turn_limit: DEFAULT_TURN_LIMIT,
            turns_taken: 0,
            stats: GameStats::default(),
            rng,
        };
        let index = game.new_change();
        game.add_change(
            index,
            Change {
                change_type: ChangeType::Shuffle,
                ..Default::default()
            },
        );
        Ok(game)
    }

    pub fn with_no_changes(&mut self) {
        self.no_changes = true;
    }

    /// Advance the game by one phase step, calling out through `deciders`
    /// (one per seat, in seating order). Returns false once the game is over.
    pub fn play_turn(&mut self, deciders: &mut [Box<dyn Decider>]) -> Result<bool, SkullError> {
        if deciders.len() != self.players.len() {
            return Err(SkullError::DeciderCount {
                players: self.players.len(),
                deciders: deciders.len(),
            });
        }
        if self.state == State::GameOver {
            return Ok(false);
        }
        if self.turns_taken >= self.turn_limit {
            let index = self.new_change();
            self.set_message(
                Some(format!("turn limit reached after {} steps", self.turns_taken)),
                index,
            );
            self.termination = Some(Termination::TurnLimit);
            self.game_over(index);
            return Ok(false);
        }
        self.turns_taken += 1;

        match self.state {
            State::InitialPlacement => self.initial_placement(deciders)?,
            State::CardPlacement => self.card_placement(deciders)?,
            State::Bidding => self.bidding(deciders)?,
            State::Challenge => self.challenge(deciders)?,
            State::GameOver => {}
        }
        Ok(self.state != State::GameOver)
    }

    pub fn get_current_player(&self) -> &Player {
        &self.players[self.current_player]
    }

    pub fn active_players(&self) -> Vec<usize> {
        (0..self.players.len())
            .filter(|p| !self.players[*p].is_eliminated)
            .collect()
    }

    pub fn total_cards_on_table(&self) -> usize {
        self.players
            .iter()
            .filter(|p| !p.is_eliminated)
            .map(|p| p.played_cards.len())
            .sum()
    }

    pub fn view(&self, player: usize) -> GameView {
        let p = &self.players[player];
        GameView {
            cards_in_hand: p.hand.len(),
            has_skull: p.has_skull_in_hand(),
            roses_in_hand: p.roses_in_hand(),
            cards_played: p.played_cards.len(),
            total_cards_on_table: self.total_cards_on_table(),
            active_players: self.active_players().len(),
            current_bid: self.current_bid,
            rounds_won: p.rounds_won,
        }
    }

    fn next_player(&mut self) {
        let mut attempts = 0;
        loop {
            self.current_player = (self.current_player + 1) % self.players.len();
            if !self.players[self.current_player].is_eliminated {
                break;
            }
            attempts += 1;
            if attempts >= self.players.len() {
                // Everyone is eliminated; callers detect <2 active players
                break;
            }
        }
    }

    fn initial_placement(&mut self, deciders: &mut [Box<dyn Decider>]) -> Result<(), SkullError> {
        let index = self.new_change();
        if self.active_players().len() < MIN_PLAYERS {
            self.end_with_survivor(index);
            return Ok(());
        }

        for seat in 0..self.players.len() {
            if self.players[seat].is_eliminated {
                continue;
            }
            if self.players[seat].hand.is_empty() {
                // Cannot open the round without a card to place
                self.eliminate(seat, index);
                continue;
            }
            let Some(card) = self.ask_card_to_play(seat, deciders) else {
                self.withdraw(seat, index);
                return Ok(());
            };
            self.place_card(seat, card, index)?;
        }

        if self.active_players().len() < MIN_PLAYERS {
            self.end_with_survivor(index);
            return Ok(());
        }
        self.state = State::CardPlacement;
        Ok(())
    }

    fn card_placement(&mut self, deciders: &mut [Box<dyn Decider>]) -> Result<(), SkullError> {
        let index = self.new_change();
        let seat = self.current_player;

        // An empty hand leaves no option but to open the bidding
        if self.players[seat].hand.is_empty() || deciders[seat].decide_play_or_bid(&self.view(seat))
        {
            self.open_bidding(index);
            return Ok(());
        }

        let Some(card) = self.ask_card_to_play(seat, deciders) else {
            self.withdraw(seat, index);
            return Ok(());
        };
        self.place_card(seat, card, index)?;
        self.next_player();
        Ok(())
    }

    fn open_bidding(&mut self, index: usize) {
        self.state = State::Bidding;
        self.current_bid = 1;
        self.add_change(
            index,
            Change {
                change_type: ChangeType::Bid,
                player: self.current_player,
                amount: self.current_bid,
                ..Default::default()
            },
        );
        self.next_player();
    }

    fn bidding(&mut self, deciders: &mut [Box<dyn Decider>]) -> Result<(), SkullError> {
        let index = self.new_change();
        let seat = self.current_player;
        if self.players[seat].has_passed {
            self.next_player();
            return Ok(());
        }

        let max_bid = self.total_cards_on_table() as i32;
        match self.ask_bid(seat, max_bid, deciders) {
            Some(bid) => {
                self.current_bid = bid;
                self.add_change(
                    index,
                    Change {
                        change_type: ChangeType::Bid,
                        player: seat,
                        amount: bid,
                        ..Default::default()
                    },
                );
            }
            None => {
                self.players[seat].has_passed = true;
                self.add_change(
                    index,
                    Change {
                        change_type: ChangeType::Pass,
                        player: seat,
                        ..Default::default()
                    },
                );
            }
        }

        let bidders: Vec<usize> = self
            .active_players()
            .into_iter()
            .filter(|p| !self.players[*p].has_passed)
            .collect();
        if let [challenger] = bidders[..] {
            self.challenger = Some(challenger);
            self.stats.total_challenges += 1;
            self.state = State::Challenge;
            self.set_message(
                Some(format!(
                    "{} must reveal {} cards",
                    self.players[challenger].name, self.current_bid
                )),
                index,
            );
        } else {
            self.next_player();
        }
        Ok(())
    }

    fn challenge(&mut self, deciders: &mut [Box<dyn Decider>]) -> Result<(), SkullError> {
        let index = self.new_change();
        let challenger = self
            .challenger
            .expect("the challenge phase requires a challenger");
        let mut remaining = self.current_bid;

        // The challenger's own stack goes first, top down
        while remaining > 0 && !self.players[challenger].played_cards.is_empty() {
            let card = self.reveal(challenger, index)?;
            remaining -= 1;
            if card.is_skull() {
                self.skull_revealer = Some(challenger);
                return self.failed_challenge(deciders, index);
            }
        }

        // Remaining reveals come off other players' stacks, target chosen at
        // random among those with cards left
        while remaining > 0 {
            let eligible: Vec<usize> = self
                .active_players()
                .into_iter()
                .filter(|p| *p != challenger && !self.players[*p].played_cards.is_empty())
                .collect();
            let Some(target) = eligible.choose(&mut self.rng).copied() else {
                break;
            };
            let card = self.reveal(target, index)?;
            remaining -= 1;
            if card.is_skull() {
                self.skull_revealer = Some(target);
                return self.failed_challenge(deciders, index);
            }
        }

        self.successful_challenge(index)
    }

    fn reveal(&mut self, seat: usize, index: usize) -> Result<Card, SkullError> {
        let card = self.players[seat]
            .played_cards
            .pop()
            .expect("should have a card left to reveal");
        self.players[seat].hand.push(card);
        self.add_change(
            index,
            Change {
                change_type: ChangeType::Reveal,
                player: seat,
                dest: Location::Hand,
                card: Some(card),
                ..Default::default()
            },
        );
        self.check_card_conservation(seat)?;
        Ok(card)
    }

    fn failed_challenge(
        &mut self,
        deciders: &mut [Box<dyn Decider>],
        index: usize,
    ) -> Result<(), SkullError> {
        let challenger = self
            .challenger
            .expect("a failed challenge requires a challenger");
        self.players[challenger].stats.challenges_lost += 1;
        self.add_change(
            index,
            Change {
                change_type: ChangeType::ChallengeFailed,
                player: challenger,
                amount: self.current_bid,
                ..Default::default()
            },
        );

        let card = if self.skull_revealer == Some(challenger) {
            // Own skull: the challenger picks which card to give up
            self.ask_card_to_lose(challenger, deciders)
        } else {
            // Someone else's skull: the loss is drawn blind from the hand
            let pick = self.rng.gen_range(0..self.players[challenger].hand.len());
            self.players[challenger].hand[pick]
        };
        self.lose_card(challenger, card, index)?;

        for seat in 0..self.players.len() {
            self.players[seat].retrieve_cards();
        }
        self.next_round(index);
        Ok(())
    }

    fn successful_challenge(&mut self, index: usize) -> Result<(), SkullError> {
        let challenger = self
            .challenger
            .expect("a successful challenge requires a challenger");
        self.players[challenger].rounds_won += 1;
        self.players[challenger].stats.challenges_won += 1;
        self.stats.successful_challenges += 1;
        self.add_change(
            index,
            Change {
                change_type: ChangeType::ChallengeWon,
                player: challenger,
                amount: self.current_bid,
                ..Default::default()
            },
        );
        self.add_change(
            index,
            Change {
                change_type: ChangeType::RoundWon,
                player: challenger,
                amount: self.players[challenger].rounds_won,
                ..Default::default()
            },
        );

        if self.players[challenger].rounds_won >= ROUNDS_TO_WIN {
            self.winner = Some(challenger);
            self.termination = Some(Termination::RoundWins);
            self.game_over(index);
            return Ok(());
        }

        for seat in 0..self.players.len() {
            self.players[seat].retrieve_cards();
        }
        self.next_round(index);
        Ok(())
    }

    fn next_round(&mut self, index: usize) {
        self.round_number += 1;
        self.stats.total_rounds = self.round_number - 1;
        for seat in 0..self.players.len() {
            self.players[seat].reset_for_new_round();
        }

        let active = self.active_players();
        if active.len() < MIN_PLAYERS {
            self.end_with_survivor(index);
            return;
        }

        // The previous challenger leads the new round when still in the game
        self.current_player = match self.challenger {
            Some(c) if !self.players[c].is_eliminated => c,
            _ => active[0],
        };
        self.current_bid = 0;
        self.challenger = None;
        self.skull_revealer = None;
        self.state = State::InitialPlacement;
        self.set_message(Some(format!("starting round {}", self.round_number)), index);
    }

    fn place_card(&mut self, seat: usize, card: Card, index: usize) -> Result<(), SkullError> {
        if !self.players[seat].play_card(card) {
            // ask_card_to_play only returns cards it saw in the hand
            return Err(SkullError::CardConservation {
                player: self.players[seat].name.clone(),
            });
        }
        self.add_change(
            index,
            Change {
                change_type: ChangeType::PlaceCard,
                player: seat,
                dest: Location::Stack,
                ..Default::default()
            },
        );
        self.check_card_conservation(seat)
    }

    fn lose_card(&mut self, seat: usize, card: Card, index: usize) -> Result<(), SkullError> {
        let pos = self.players[seat]
            .hand
            .iter()
            .position(|c| *c == card)
            .expect("the lost card was validated against the hand");
        self.players[seat].hand.remove(pos);
        self.players[seat].stats.cards_lost += 1;
        self.add_change(
            index,
            Change {
                change_type: ChangeType::CardLost,
                player: seat,
                dest: Location::Lost,
                card: Some(card),
                ..Default::default()
            },
        );
        self.check_card_conservation(seat)?;
        if self.players[seat].hand.is_empty() {
            self.eliminate(seat, index);
        }
        Ok(())
    }

    fn eliminate(&mut self, seat: usize, index: usize) {
        if self.players[seat].is_eliminated {
            return;
        }
        self.players[seat].is_eliminated = true;
        self.stats.eliminations += 1;
        self.add_change(
            index,
            Change {
                change_type: ChangeType::Eliminated,
                player: seat,
                ..Default::default()
            },
        );
    }

    fn withdraw(&mut self, seat: usize, index: usize) {
        self.set_message(
            Some(format!("{} left the game", self.players[seat].name)),
            index,
        );
        self.termination = Some(Termination::Withdrawal);
        self.game_over(index);
    }

    fn end_with_survivor(&mut self, index: usize) {
        let active = self.active_players();
        self.winner = match active[..] {
            [survivor] => Some(survivor),
            _ => None,
        };
        self.termination = Some(Termination::LastStanding);
        self.game_over(index);
    }

    fn game_over(&mut self, index: usize) {
        self.state = State::GameOver;
        self.add_change(
            index,
            Change {
                change_type: ChangeType::GameOver,
                player: self.winner.unwrap_or(0),
                ..Default::default()
            },
        );
    }

    fn ask_card_to_play(&self, seat: usize, deciders: &mut [Box<dyn Decider>]) -> Option<Card> {
        let view = self.view(seat);
        loop {
            match deciders[seat].choose_card_to_play(&view) {
                None => return None,
                Some(card) if self.players[seat].hand.contains(&card) => return Some(card),
                // Not in hand: ask the same seat again
                Some(_) => continue,
            }
        }
    }

    fn ask_bid(&self, seat: usize, max_bid: i32, deciders: &mut [Box<dyn Decider>]) -> Option<i32> {
        let view = self.view(seat);
        loop {
            match deciders[seat].make_bid(self.current_bid, max_bid, &view) {
                None => return None,
                Some(bid) if bid > self.current_bid && bid <= max_bid => return Some(bid),
                // Out of range: ask the same seat again
                Some(_) => continue,
            }
        }
    }

    fn ask_card_to_lose(&self, seat: usize, deciders: &mut [Box<dyn Decider>]) -> Card {
        let view = self.view(seat);
        loop {
            let card = deciders[seat].choose_card_to_lose(&view);
            if self.players[seat].hand.contains(&card) {
                return card;
            }
        }
    }

    fn check_card_conservation(&self, seat: usize) -> Result<(), SkullError> {
        let p = &self.players[seat];
        if p.is_eliminated {
            return Ok(());
        }
        let total = p.hand.len() + p.played_cards.len() + p.stats.cards_lost as usize;
        if total != STARTING_ROSES + 1 {
            return Err(SkullError::CardConservation {
                player: p.name.clone(),
            });
        }
        Ok(())
    }

    #[inline]
    fn new_change(&mut self) -> usize {
        self.changes.push(vec![]);
        self.changes.len() - 1
    }

    #[inline]
    fn add_change(&mut self, index: usize, change: Change) {
        if self.no_changes {
            return;
        }
        self.changes[index].push(change);
    }

    fn set_message(&mut self, message: Option<String>, index: usize) {
        self.add_change(
            index,
            Change {
                change_type: ChangeType::Message,
                message,
                dest: Location::Message,
                ..Default::default()
            },
        );
    }
}
