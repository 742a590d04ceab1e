pub mod game;
pub mod players;

// Re-export the main types
pub use game::{
    Card, Change, ChangeType, Decider, GameStats, GameView, Location, Player, PlayerStats,
    SkullError, SkullGame, State, Termination,
};
pub use players::{Strategy, StrategyPlayer};
