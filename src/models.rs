use serde::{Deserialize, Serialize};

/// A kind of trick (kickflip, ollie...), not a single try at one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Trick {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attempt {
    pub id: u64,
    pub trick_id: u32,
    pub user: String,
    pub landed: bool,
    #[serde(default)]
    pub game_id: Option<u64>,
    pub recorded_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Game {
    pub id: u64,
    pub user: String,
    pub complete: bool,
    #[serde(default)]
    pub winner: Option<String>,
    pub started_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppData {
    #[serde(default)]
    pub tricks: Vec<Trick>,
    #[serde(default)]
    pub attempts: Vec<Attempt>,
    #[serde(default)]
    pub games: Vec<Game>,
}

impl AppData {
    pub fn trick(&self, id: u32) -> Option<&Trick> {
        self.tricks.iter().find(|trick| trick.id == id)
    }

    pub fn game(&self, id: u64) -> Option<&Game> {
        self.games.iter().find(|game| game.id == id)
    }

    pub fn game_mut(&mut self, id: u64) -> Option<&mut Game> {
        self.games.iter_mut().find(|game| game.id == id)
    }

    pub fn next_attempt_id(&self) -> u64 {
        self.attempts.iter().map(|a| a.id).max().unwrap_or(0) + 1
    }

    pub fn next_game_id(&self) -> u64 {
        self.games.iter().map(|g| g.id).max().unwrap_or(0) + 1
    }

    /// Attempts belonging to a game, in the order they were recorded.
    pub fn game_attempts(&self, game_id: u64) -> Vec<&Attempt> {
        self.attempts
            .iter()
            .filter(|attempt| attempt.game_id == Some(game_id))
            .collect()
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AttemptResponse {
    pub attempted: bool,
    pub update_game: bool,
    pub update_all_tricks: bool,
    pub update_tricks: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StartGameResponse {
    pub started: bool,
    pub game_id: u64,
}
