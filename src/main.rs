use colored::Colorize;
use enum_iterator::all;
use rand::{thread_rng, Rng};
use skulltable_rs::games::skull::{
    Change, ChangeType, Decider, SkullGame, Strategy, StrategyPlayer, Termination,
};
use std::collections::HashMap;

fn main() {
    //narrate_game();
    //dump_game_json();
    strategy_matchup();
}

fn deciders_for(game: &SkullGame) -> Vec<Box<dyn Decider>> {
    // Seats were shuffled at construction; match deciders back up by name
    game.players
        .iter()
        .map(|p| {
            let strategy = all::<Strategy>()
                .find(|s| format!("{:?}", s) == p.name)
                .expect("every seat is named after a strategy");
            Box::new(StrategyPlayer::new(strategy, thread_rng().gen())) as Box<dyn Decider>
        })
        .collect()
}

fn new_matchup_game() -> SkullGame {
    let names: Vec<String> = all::<Strategy>().map(|s| format!("{:?}", s)).collect();
    SkullGame::new(names).expect("between 2 and 6 strategies")
}

fn strategy_matchup() {
    let mut wins: HashMap<String, usize> = HashMap::new();
    let mut drawn = 0;
    let mut capped = 0;

    for _ in 0..10000 {
        let mut game = new_matchup_game();
        game.with_no_changes();
        let mut deciders = deciders_for(&game);
        while game.play_turn(&mut deciders).expect("card counts stay intact") {}

        match game.winner {
            Some(seat) => *wins.entry(game.players[seat].name.clone()).or_insert(0) += 1,
            None => drawn += 1,
        }
        if game.termination == Some(Termination::TurnLimit) {
            capped += 1;
        }
    }

    println!("{}", "wins over 10,000 games".bold());
    let mut totals: Vec<(String, usize)> = wins.into_iter().collect();
    totals.sort_by(|a, b| b.1.cmp(&a.1));
    for (name, count) in totals {
        println!("  {}: {}", name.green(), count);
    }
    if drawn > 0 {
        println!("  {}: {}", "no winner".yellow(), drawn);
    }
    if capped > 0 {
        println!("  {}: {}", "hit the turn limit".red(), capped);
    }
}

// Play a single game and print the event stream as a readable transcript
#[allow(dead_code)]
fn narrate_game() {
    let mut game = new_matchup_game();
    let mut deciders = deciders_for(&game);
    while game.play_turn(&mut deciders).expect("card counts stay intact") {}

    for step in &game.changes {
        for change in step {
            if let Some(line) = describe(&game, change) {
                println!("{}", line);
            }
        }
    }
    match game.winner {
        Some(seat) => println!("{} {}", "winner:".bold(), game.players[seat].name.green()),
        None => println!("{}", "no winner".yellow()),
    }
}

#[allow(dead_code)]
fn describe(game: &SkullGame, change: &Change) -> Option<String> {
    let name = game.players[change.player].name.clone();
    match change.change_type {
        ChangeType::Shuffle => Some("seats shuffled".to_string()),
        ChangeType::PlaceCard => Some(format!("{} placed a card face-down", name)),
        ChangeType::Bid => Some(format!("{} bid {}", name, change.amount)),
        ChangeType::Pass => Some(format!("{} passed", name)),
        ChangeType::Reveal => {
            let card = change.card.expect("reveals carry the card");
            let tag = if card.is_skull() {
                "a skull".red().to_string()
            } else {
                "a rose".green().to_string()
            };
            Some(format!("revealed {} from {}'s stack", tag, name))
        }
        ChangeType::ChallengeWon => Some(format!("{} proved a bid of {}", name, change.amount)),
        ChangeType::ChallengeFailed => Some(format!("{} failed a bid of {}", name, change.amount)),
        ChangeType::CardLost => Some(format!("{} lost a card for good", name)),
        ChangeType::Eliminated => Some(format!("{} was eliminated", name.red())),
        ChangeType::RoundWon => Some(format!("{} has won {} round(s)", name, change.amount)),
        ChangeType::GameOver => Some("game over".bold().to_string()),
        ChangeType::Message => change.message.clone(),
    }
}

// Serialize a finished game, event stream included, for the UI to replay
#[allow(dead_code)]
fn dump_game_json() {
    let mut game = new_matchup_game();
    let mut deciders = deciders_for(&game);
    while game.play_turn(&mut deciders).expect("card counts stay intact") {}
    println!(
        "{}",
        serde_json::to_string(&game).expect("game states serialize")
    );
}
