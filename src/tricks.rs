use crate::models::{AppData, Trick};
use tracing::info;

pub const CATALOGUE: &[&str] = &[
    "Ollie",
    "Nollie",
    "Fakie Ollie",
    "Switch Ollie",
    "Pop Shove-it",
    "Frontside Pop Shove-it",
    "Frontside 180",
    "Backside 180",
    "Kickflip",
    "Heelflip",
    "Varial Kickflip",
    "Varial Heelflip",
    "Hardflip",
    "Inward Heelflip",
    "Tre Flip",
    "Laser Flip",
    "Frontside Flip",
    "Backside Flip",
    "Bigspin",
    "Heelflip Bigspin",
];

/// Adds every catalogue trick missing from `data`, matched by name.
/// Existing ids are never renumbered. Returns how many were added.
pub fn seed_tricks(data: &mut AppData) -> usize {
    let mut next_id = data.tricks.iter().map(|t| t.id).max().unwrap_or(0) + 1;
    let mut added = 0;
    for name in CATALOGUE {
        if data.tricks.iter().any(|trick| trick.name == *name) {
            continue;
        }
        data.tricks.push(Trick {
            id: next_id,
            name: (*name).to_string(),
        });
        next_id += 1;
        added += 1;
    }
    if added > 0 {
        info!("seeded {added} tricks");
    }
    added
}
