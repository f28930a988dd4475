use crate::config::DifficultyConfig;
use crate::types::{Difficulty, PolicyKind};

pub const TILE_SIZE: f32 = 24.0;

/// Collision square edge, as a fraction of a tile.
pub const HITBOX_SCALE: f32 = 0.8;
pub const CENTER_TOLERANCE: f32 = 1.0;
/// Faster agents can tunnel through a tile in one tick.
pub const MAX_SPEED: f32 = TILE_SIZE / 2.0;

pub const PLAYER_BASE_SPEED: f32 = 2.2;
pub const CATCH_RADIUS: f32 = 8.0;

pub const PELLET_SCORE: u32 = 1;
pub const ITEM_SCORE: u32 = 5;

pub const SLOW_BLUNDER_CHANCE: f32 = 0.3;
pub const SMART_DEAD_END_PENALTY: u32 = 5;
pub const GENIUS_DEAD_END_PENALTY: u32 = 10;
pub const GENIUS_PROXIMITY_RANGE: u32 = 3;
pub const GENIUS_PROXIMITY_BONUS: u32 = 2;
pub const GENIUS_JUNCTION_BONUS: u32 = 1;
pub const AMBUSH_LOOKAHEAD_TILES: i32 = 3;

/// Event backlog kept for callers that never drain snapshots.
pub const MAX_PENDING_EVENTS: usize = 1024;

pub fn get_difficulty_config(difficulty: Difficulty) -> DifficultyConfig {
    match difficulty {
        Difficulty::Easy => DifficultyConfig {
            name: "Easy".to_string(),
            description: "Ghosts are slow and not very smart".to_string(),
            ghost_speeds: vec![1.0, 1.1, 1.0, 0.9],
            ghost_policies: vec![
                PolicyKind::Dumb,
                PolicyKind::Slow,
                PolicyKind::Dumb,
                PolicyKind::Slow,
            ],
            recalc_every: 12,
        },
        Difficulty::Medium => DifficultyConfig {
            name: "Medium".to_string(),
            description: "Balanced gameplay with mixed ghost abilities".to_string(),
            ghost_speeds: vec![1.3, 1.4, 1.2, 1.3],
            ghost_policies: vec![
                PolicyKind::Normal,
                PolicyKind::Slow,
                PolicyKind::Normal,
                PolicyKind::Slow,
            ],
            recalc_every: 8,
        },
        Difficulty::Hard => DifficultyConfig {
            name: "Hard".to_string(),
            description: "Fast and intelligent ghosts".to_string(),
            ghost_speeds: vec![1.5, 1.6, 1.4, 1.5],
            ghost_policies: vec![
                PolicyKind::Smart,
                PolicyKind::Normal,
                PolicyKind::Smart,
                PolicyKind::Normal,
            ],
            recalc_every: 6,
        },
        Difficulty::Nightmare => DifficultyConfig {
            name: "Nightmare".to_string(),
            description: "Predictive hunters that cut you off".to_string(),
            ghost_speeds: vec![1.7, 1.8, 1.6, 1.7],
            ghost_policies: vec![
                PolicyKind::Genius,
                PolicyKind::Ambush,
                PolicyKind::Smart,
                PolicyKind::Chase,
            ],
            recalc_every: 4,
        },
    }
}
