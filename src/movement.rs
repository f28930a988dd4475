use crate::constants::{CENTER_TOLERANCE, HITBOX_SCALE, TILE_SIZE};
use crate::types::{AgentRole, AgentView, Direction, Point, PolicyKind, TileCoord};
use crate::world::Grid;

/// One moving (or stationary) participant of a level.
///
/// Role is a plain tag; ghosts additionally carry the policy that drives them.
#[derive(Clone, Debug)]
pub struct Agent {
    pub id: usize,
    pub role: AgentRole,
    pub position: Point,
    pub direction: Direction,
    pub desired: Direction,
    pub speed: f32,
    pub spawn: TileCoord,
    pub policy: Option<PolicyKind>,
    pub active: bool,
    /// Tile on which the policy last produced a decision.
    pub decided_at: Option<TileCoord>,
}

impl Agent {
    pub fn new(id: usize, role: AgentRole, spawn: TileCoord, speed: f32) -> Self {
        Self {
            id,
            role,
            position: tile_center(spawn),
            direction: Direction::None,
            desired: Direction::None,
            speed,
            spawn,
            policy: None,
            active: true,
            decided_at: None,
        }
    }

    pub fn ghost(id: usize, spawn: TileCoord, speed: f32, policy: PolicyKind) -> Self {
        Self {
            policy: Some(policy),
            ..Self::new(id, AgentRole::Ghost, spawn, speed)
        }
    }

    pub fn item(id: usize, tile: TileCoord) -> Self {
        Self::new(id, AgentRole::Item, tile, 0.0)
    }

    pub fn tile(&self) -> TileCoord {
        tile_of(self.position)
    }

    pub fn is_stopped(&self) -> bool {
        self.direction.is_none()
    }

    pub fn to_view(&self) -> AgentView {
        let tile = self.tile();
        AgentView {
            id: self.id,
            role: self.role,
            x: self.position.x,
            y: self.position.y,
            tile_x: tile.x,
            tile_y: tile.y,
            dir: self.direction,
            speed: self.speed,
            active: self.active,
            policy: self.policy,
            policy_label: self.policy.map(PolicyKind::label),
        }
    }
}

pub fn tile_center(tile: TileCoord) -> Point {
    Point::new(
        (tile.x as f32 + 0.5) * TILE_SIZE,
        (tile.y as f32 + 0.5) * TILE_SIZE,
    )
}

pub fn tile_of(point: Point) -> TileCoord {
    TileCoord::new(
        (point.x / TILE_SIZE).floor() as i32,
        (point.y / TILE_SIZE).floor() as i32,
    )
}

/// Center window half-width for an agent moving at `speed`.
///
/// Consecutive samples along an axis are `speed` apart, so one of them always
/// lands within `speed / 2` of every center the agent crosses.
pub fn turn_tolerance(speed: f32) -> f32 {
    CENTER_TOLERANCE.max(speed / 2.0)
}

pub fn near_center(point: Point, speed: f32) -> bool {
    let center = tile_center(tile_of(point));
    let tolerance = turn_tolerance(speed);
    (point.x - center.x).abs() <= tolerance && (point.y - center.y).abs() <= tolerance
}

/// True when all four hitbox corners around `point` sit on walkable tiles.
pub fn hitbox_clear(point: Point, grid: &Grid) -> bool {
    let half = TILE_SIZE * HITBOX_SCALE / 2.0;
    [(-half, -half), (half, -half), (-half, half), (half, half)]
        .iter()
        .all(|(dx, dy)| grid.can_walk_tile(tile_of(Point::new(point.x + dx, point.y + dy))))
}

/// Applies `agent.desired` if the agent is at its tile center (or stopped)
/// and the neighbor in that direction is walkable. Snaps to the center.
pub fn try_turn(agent: &mut Agent, grid: &Grid) -> bool {
    let desired = agent.desired;
    if desired.is_none() || desired == agent.direction {
        return false;
    }
    if !agent.is_stopped() && !near_center(agent.position, agent.speed) {
        return false;
    }
    let tile = agent.tile();
    if !grid.can_walk_tile(tile.step(desired)) {
        return false;
    }
    agent.position = tile_center(tile);
    agent.direction = desired;
    true
}

/// Moves one tick along `agent.direction`. A blocked move snaps the moving
/// axis back to the tile center and stops the agent.
///
/// Speeds above half a tile per tick can skip the wall check entirely.
pub fn advance(agent: &mut Agent, grid: &Grid) -> bool {
    if agent.is_stopped() || agent.speed <= 0.0 {
        return false;
    }
    let next = agent.position.offset(agent.direction, agent.speed);
    if hitbox_clear(next, grid) {
        agent.position = next;
        return true;
    }

    let center = tile_center(agent.tile());
    if agent.direction.is_horizontal() {
        agent.position.x = center.x;
    } else {
        agent.position.y = center.y;
    }
    agent.direction = Direction::None;
    false
}

pub fn step_agent(agent: &mut Agent, grid: &Grid) -> bool {
    if !agent.active || agent.speed <= 0.0 {
        return false;
    }
    try_turn(agent, grid);
    advance(agent, grid)
}

pub fn reset_position(agent: &mut Agent) {
    agent.position = tile_center(agent.spawn);
    agent.direction = Direction::None;
    agent.desired = Direction::None;
    agent.decided_at = None;
}

/// Drops both heading and intent; the agent stays where it is.
pub fn halt(agent: &mut Agent) {
    agent.direction = Direction::None;
    agent.desired = Direction::None;
}

pub fn within_catch_radius(a: Point, b: Point, radius: f32) -> bool {
    a.distance(b) <= radius
}
