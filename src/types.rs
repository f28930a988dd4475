use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    None,
}

impl Direction {
    /// Candidate order used whenever a policy enumerates neighbors.
    pub const CARDINALS: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Maps a unit input vector onto a grid axis. The zero vector, diagonals
    /// and longer vectors have no direction.
    pub fn from_axis(dx: i32, dy: i32) -> Option<Self> {
        match (dx, dy) {
            (0, -1) => Some(Self::Up),
            (0, 1) => Some(Self::Down),
            (-1, 0) => Some(Self::Left),
            (1, 0) => Some(Self::Right),
            _ => None,
        }
    }

    /// Unit step in tile space (y grows downwards).
    pub fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
            Self::None => (0, 0),
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::None => Self::None,
        }
    }

    pub fn is_none(self) -> bool {
        self == Self::None
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: i32,
    pub y: i32,
}

impl TileCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn step(self, dir: Direction) -> Self {
        let (dx, dy) = dir.delta();
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    pub fn manhattan(self, other: TileCoord) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

/// Continuous world position in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dir: Direction, distance: f32) -> Self {
        let (dx, dy) = dir.delta();
        Self {
            x: self.x + dx as f32 * distance,
            y: self.y + dy as f32 * distance,
        }
    }

    pub fn distance(self, other: Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Nightmare,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::Nightmare,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "easy" => Some(Self::Easy),
            "medium" => Some(Self::Medium),
            "hard" => Some(Self::Hard),
            "nightmare" => Some(Self::Nightmare),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
            Self::Nightmare => "Nightmare",
        }
    }
}

/// Decision policy assigned to a ghost.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    /// Uniform random walk, ignores the distance field.
    Dumb,
    /// Shortest-path chase that falls back to a random walk 30% of the time.
    Slow,
    /// Shortest-path chase over the distance field.
    Normal,
    /// Shortest-path chase that steers clear of dead ends.
    Smart,
    /// Shortest-path chase with proximity, dead-end and intersection shaping.
    Genius,
    Chase,
    Scatter,
    Patrol,
    Ambush,
    Frightened,
}

impl PolicyKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Dumb => "Dumb",
            Self::Slow => "Slow",
            Self::Normal => "Normal",
            Self::Smart => "Smart",
            Self::Genius => "Genius",
            Self::Chase => "Chase",
            Self::Scatter => "Scatter",
            Self::Patrol => "Patrol",
            Self::Ambush => "Ambush",
            Self::Frightened => "Frightened",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Player,
    Ghost,
    Item,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    Menu,
    Playing,
    Won,
}

/// What a catch does to the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatchSeverity {
    ResetPositions,
    RestartLevel,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    Wall,
    Empty,
    Pellet,
    Item,
}

#[derive(Clone, Debug, Serialize)]
pub struct AgentView {
    pub id: usize,
    pub role: AgentRole,
    pub x: f32,
    pub y: f32,
    #[serde(rename = "tileX")]
    pub tile_x: i32,
    #[serde(rename = "tileY")]
    pub tile_y: i32,
    pub dir: Direction,
    pub speed: f32,
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<PolicyKind>,
    #[serde(rename = "policyLabel", skip_serializing_if = "Option::is_none")]
    pub policy_label: Option<&'static str>,
}

#[derive(Clone, Debug, Serialize)]
pub struct GridView {
    pub width: i32,
    pub height: i32,
    pub rows: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    LevelStarted {
        level: usize,
        #[serde(rename = "totalPellets")]
        total_pellets: u32,
    },
    PelletEaten {
        x: i32,
        y: i32,
    },
    ItemCollected {
        #[serde(rename = "agentId")]
        agent_id: usize,
        x: i32,
        y: i32,
    },
    PlayerCaught {
        #[serde(rename = "ghostId")]
        ghost_id: usize,
        severity: CatchSeverity,
    },
    LevelCleared {
        level: usize,
        score: u32,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub level: usize,
    pub phase: GamePhase,
    pub difficulty: String,
    pub score: u32,
    #[serde(rename = "pelletsRemaining")]
    pub pellets_remaining: u32,
    #[serde(rename = "totalPellets")]
    pub total_pellets: u32,
    #[serde(rename = "levelJustWon")]
    pub level_just_won: bool,
    #[serde(rename = "playerJustCaught")]
    pub player_just_caught: bool,
    pub grid: GridView,
    pub agents: Vec<AgentView>,
    pub events: Vec<RuntimeEvent>,
}
