use crate::models::AppData;

#[derive(Debug, Clone, PartialEq)]
pub struct TrickStats {
    pub trick_id: u32,
    pub name: String,
    pub attempts: u64,
    pub lands: u64,
    /// Consecutive lands counted back from the most recent attempt.
    pub current_streak: u64,
}

impl TrickStats {
    pub fn land_rate(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.lands as f64 / self.attempts as f64
        }
    }
}

/// Stats for one trick, counting only attempts made by `user` itself.
/// Attempts logged for the user's past self are a separate user.
pub fn trick_stats(data: &AppData, trick_id: u32, user: &str) -> Option<TrickStats> {
    let trick = data.trick(trick_id)?;

    let mut attempts = 0u64;
    let mut lands = 0u64;
    let mut current_streak = 0u64;
    for attempt in data
        .attempts
        .iter()
        .filter(|attempt| attempt.trick_id == trick_id && attempt.user == user)
    {
        attempts = attempts.saturating_add(1);
        if attempt.landed {
            lands = lands.saturating_add(1);
            current_streak = current_streak.saturating_add(1);
        } else {
            current_streak = 0;
        }
    }

    Some(TrickStats {
        trick_id,
        name: trick.name.clone(),
        attempts,
        lands,
        current_streak,
    })
}

pub fn all_trick_stats(data: &AppData, user: &str) -> Vec<TrickStats> {
    data.tricks
        .iter()
        .filter_map(|trick| trick_stats(data, trick.id, user))
        .collect()
}
