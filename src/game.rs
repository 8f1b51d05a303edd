//! Rules of the game of S.K.A.T.E., played against your own past self.
//!
//! A landed trick challenges the other side to match it. Failing to match
//! earns the next letter; spelling the whole word loses the game.

use crate::models::{Attempt, Trick};

pub const LETTERS: [char; 5] = ['S', 'K', 'A', 'T', 'E'];

const USER_SIDE: &str = "New you";
const PAST_SIDE: &str = "Past you";

pub fn past_user(user: &str) -> String {
    format!("past_{user}")
}

#[derive(Debug, Clone)]
pub struct GameState {
    pub user_name: String,
    /// Letters collected, as a count into `LETTERS`.
    pub user_score: usize,
    pub opponent_score: usize,
    /// Newest message first.
    pub status_feed: Vec<String>,
    pub challenging_trick: Option<u32>,
    pub tricks_used_up: Vec<u32>,
}

impl GameState {
    pub fn new(user_name: &str) -> Self {
        Self {
            user_name: user_name.to_string(),
            user_score: 0,
            opponent_score: 0,
            status_feed: vec![format!("Starting game! {user_name} to go first.")],
            challenging_trick: None,
            tricks_used_up: Vec::new(),
        }
    }

    /// Replays `attempts` in order from a fresh game.
    pub fn replay<'a>(
        user_name: &str,
        attempts: impl IntoIterator<Item = &'a Attempt>,
        tricks: &[Trick],
    ) -> Self {
        let mut state = Self::new(user_name);
        for attempt in attempts {
            if state.apply_attempt(attempt, tricks) {
                break;
            }
        }
        state
    }

    fn say(&mut self, message: String) {
        self.status_feed.insert(0, message);
    }

    /// Applies one attempt and returns whether the game is now over.
    pub fn apply_attempt(&mut self, attempt: &Attempt, tricks: &[Trick]) -> bool {
        let user_attempt = attempt.user == self.user_name;
        let (attempter, opponent) = if user_attempt {
            (USER_SIDE, PAST_SIDE)
        } else {
            (PAST_SIDE, USER_SIDE)
        };
        let mut landed = attempt.landed;

        if self.tricks_used_up.contains(&attempt.trick_id) {
            self.say("Trick already used! Treating as miss for game purposes.".to_string());
            landed = false;
        }

        if let Some(challenged) = self.challenging_trick.take() {
            if attempt.trick_id != challenged {
                self.say(format!(
                    "Wrong trick, treating as a miss for game purposes. {attempter} was supposed to try a {}",
                    trick_name(tricks, challenged)
                ));
                landed = false;
            }
            self.tricks_used_up.push(attempt.trick_id);

            if landed {
                self.say(format!("{attempter} matched the challenge."));
                return false;
            }

            let score = if user_attempt {
                &mut self.user_score
            } else {
                &mut self.opponent_score
            };
            let letter = LETTERS[(*score).min(LETTERS.len() - 1)];
            *score += 1;
            self.say(format!("Missed challenge! {attempter} gains a {letter}"));

            if !self.is_ongoing() {
                self.say(format!("{opponent} wins!"));
                return true;
            }
        } else if landed {
            self.say(format!(
                "{attempter} landed a {}! Can {opponent} match it?",
                trick_name(tricks, attempt.trick_id)
            ));
            self.challenging_trick = Some(attempt.trick_id);
        }

        false
    }

    pub fn is_ongoing(&self) -> bool {
        self.user_score < LETTERS.len() && self.opponent_score < LETTERS.len()
    }

    /// The user name of the winning side, once the game is over.
    pub fn winner(&self) -> Option<String> {
        if self.user_score >= LETTERS.len() {
            Some(past_user(&self.user_name))
        } else if self.opponent_score >= LETTERS.len() {
            Some(self.user_name.clone())
        } else {
            None
        }
    }
}

pub fn letters(score: usize) -> String {
    LETTERS.iter().take(score).collect()
}

fn trick_name(tricks: &[Trick], id: u32) -> String {
    tricks
        .iter()
        .find(|trick| trick.id == id)
        .map(|trick| trick.name.clone())
        .unwrap_or_else(|| format!("trick #{id}"))
}
