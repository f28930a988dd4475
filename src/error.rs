use thiserror::Error;

/// Fatal problems found while loading a level definition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LevelError {
    #[error("level definition has no rows")]
    Empty,
    #[error("level row 0 is empty")]
    EmptyRow,
    #[error("level row {row} has width {found}, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("unknown tile marker {marker:?} at ({x}, {y})")]
    UnknownMarker { marker: char, x: usize, y: usize },
    #[error("level has no walkable tile")]
    NoWalkableTile,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("difficulty config is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("difficulty config has no ghosts")]
    NoGhosts,
    #[error("recompute cadence must be at least one tick")]
    InvalidCadence,
    #[error("ghost {index} speed {speed} is outside (0, {max}]")]
    InvalidSpeed { index: usize, speed: f32, max: f32 },
    #[error("player speed {speed} is outside (0, {max}]")]
    InvalidPlayerSpeed { speed: f32, max: f32 },
    #[error("catch radius {0} must be positive and finite")]
    InvalidCatchRadius(f32),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Level(#[from] LevelError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
