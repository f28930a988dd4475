use std::collections::VecDeque;

use log::{debug, warn};

use crate::config::DifficultyConfig;
use crate::constants::{
    CATCH_RADIUS, ITEM_SCORE, MAX_PENDING_EVENTS, MAX_SPEED, PELLET_SCORE, PLAYER_BASE_SPEED,
};
use crate::distance::DistanceField;
use crate::error::{ConfigError, EngineError};
use crate::movement::{step_agent, within_catch_radius, Agent};
use crate::rng::{seeded, SimRng};
use crate::types::{
    AgentRole, CatchSeverity, Direction, GamePhase, RuntimeEvent, Snapshot, TileCoord,
};
use crate::world::{Consumable, Grid, LevelDefinition};

mod ghost_system;
mod spawn_system;
mod utils;

/// The player always occupies the first arena slot.
pub const PLAYER_INDEX: usize = 0;

#[derive(Clone, Debug)]
pub struct GameEngineOptions {
    pub seed: u64,
    pub catch_severity: CatchSeverity,
    pub player_speed: f32,
    pub catch_radius: f32,
}

impl Default for GameEngineOptions {
    fn default() -> Self {
        Self {
            seed: 1,
            catch_severity: CatchSeverity::ResetPositions,
            player_speed: PLAYER_BASE_SPEED,
            catch_radius: CATCH_RADIUS,
        }
    }
}

impl GameEngineOptions {
    fn validate(&self) -> Result<(), ConfigError> {
        if !self.player_speed.is_finite() || self.player_speed <= 0.0 || self.player_speed > MAX_SPEED
        {
            return Err(ConfigError::InvalidPlayerSpeed {
                speed: self.player_speed,
                max: MAX_SPEED,
            });
        }
        if !self.catch_radius.is_finite() || self.catch_radius <= 0.0 {
            return Err(ConfigError::InvalidCatchRadius(self.catch_radius));
        }
        Ok(())
    }
}

/// Fixed-step simulation of one chase session.
///
/// Agents live in a single arena: the player at [`PLAYER_INDEX`], then the
/// ghosts, then stationary items. Indices stay stable for a level's lifetime.
#[derive(Clone, Debug)]
pub struct GameEngine {
    options: GameEngineOptions,
    config: DifficultyConfig,
    campaign: Vec<LevelDefinition>,
    level: usize,

    grid: Grid,
    field: DistanceField,
    agents: Vec<Agent>,
    ghost_count: usize,
    corners: [TileCoord; 4],

    rng: SimRng,
    events: VecDeque<RuntimeEvent>,
    pending_input: Option<Direction>,
    score: u32,
    tick: u64,
    phase: GamePhase,
    level_just_won: bool,
    player_just_caught: bool,
}

impl GameEngine {
    /// Starts on the built-in maze.
    pub fn new(config: DifficultyConfig, options: GameEngineOptions) -> Result<Self, EngineError> {
        Self::with_campaign(vec![LevelDefinition::default_maze()], config, options)
    }

    /// Starts on the first of `levels`; clearing a level moves to the next one
    /// and wraps after the last. An empty list falls back to the built-in maze.
    pub fn with_campaign(
        levels: Vec<LevelDefinition>,
        config: DifficultyConfig,
        options: GameEngineOptions,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        options.validate()?;
        let campaign = if levels.is_empty() {
            vec![LevelDefinition::default_maze()]
        } else {
            levels
        };
        for definition in &campaign[1..] {
            Grid::parse(definition)?;
        }
        let grid = Grid::parse(&campaign[0])?;

        let mut engine = Self {
            rng: seeded(options.seed),
            options,
            config,
            campaign,
            level: 1,
            field: DistanceField::new(grid.width(), grid.height()),
            corners: grid.corner_tiles(),
            grid,
            agents: Vec::new(),
            ghost_count: 0,
            events: VecDeque::new(),
            pending_input: None,
            score: 0,
            tick: 0,
            phase: GamePhase::Playing,
            level_just_won: false,
            player_just_caught: false,
        };
        engine.install_level(engine.grid.clone());
        Ok(engine)
    }

    /// Begins a fresh session on `definition`, which becomes the whole
    /// campaign. Nothing changes if the level or the config is rejected.
    pub fn init_level(
        &mut self,
        definition: LevelDefinition,
        config: DifficultyConfig,
    ) -> Result<(), EngineError> {
        config.validate()?;
        let grid = Grid::parse(&definition)?;
        self.config = config;
        self.campaign = vec![definition];
        self.level = 1;
        self.score = 0;
        self.install_level(grid);
        Ok(())
    }

    /// Queues a unit axis vector for the player; applied on the next step.
    /// Diagonal and oversized vectors are ignored.
    pub fn handle_directional_input(&mut self, dx: i32, dy: i32) -> bool {
        match Direction::from_axis(dx, dy) {
            Some(dir) => {
                self.pending_input = Some(dir);
                true
            }
            None => false,
        }
    }

    /// Reloads the current level from its template and clears the score.
    pub fn restart_level(&mut self) -> Result<(), EngineError> {
        let grid = Grid::parse(self.current_definition())?;
        debug!("restarting level {} (score {} discarded)", self.level, self.score);
        self.score = 0;
        self.install_level(grid);
        Ok(())
    }

    pub fn set_difficulty(&mut self, config: DifficultyConfig) -> Result<(), EngineError> {
        config.validate()?;
        debug!(
            "difficulty {} -> {} ({} ghosts, recalc every {})",
            self.config.name,
            config.name,
            config.ghost_count(),
            config.recalc_every
        );
        self.config = config;
        self.restart_level()
    }

    pub fn step(&mut self) {
        self.level_just_won = false;
        self.player_just_caught = false;
        if self.phase != GamePhase::Playing {
            return;
        }
        self.tick += 1;

        if let Some(dir) = self.pending_input.take() {
            self.agents[PLAYER_INDEX].desired = dir;
        }
        if self.tick.is_multiple_of(u64::from(self.config.recalc_every)) {
            self.rebuild_distance_field();
        }
        self.update_ghost_decisions();
        self.move_agents();
        self.collect_at_player();
        self.resolve_catches();
        self.check_level_cleared();
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        let snapshot = Snapshot {
            tick: self.tick,
            level: self.level,
            phase: self.phase,
            difficulty: self.config.name.clone(),
            score: self.score,
            pellets_remaining: self.grid.remaining_pellets(),
            total_pellets: self.grid.total_pellets(),
            level_just_won: self.level_just_won,
            player_just_caught: self.player_just_caught,
            grid: self.grid.to_view(),
            agents: self.agents.iter().map(Agent::to_view).collect(),
            events: if include_events {
                self.events.drain(..).collect()
            } else {
                Vec::new()
            },
        };
        snapshot
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn distance_field(&self) -> &DistanceField {
        &self.field
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn player(&self) -> &Agent {
        &self.agents[PLAYER_INDEX]
    }

    pub fn ghosts(&self) -> &[Agent] {
        &self.agents[PLAYER_INDEX + 1..PLAYER_INDEX + 1 + self.ghost_count]
    }

    pub fn config(&self) -> &DifficultyConfig {
        &self.config
    }

    pub fn options(&self) -> &GameEngineOptions {
        &self.options
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn pellets_remaining(&self) -> u32 {
        self.grid.remaining_pellets()
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Menu and Won are owned by the presentation layer; the engine only
    /// advances while `Playing`.
    pub fn set_phase(&mut self, phase: GamePhase) {
        self.phase = phase;
    }

    pub fn level_just_won(&self) -> bool {
        self.level_just_won
    }

    pub fn player_just_caught(&self) -> bool {
        self.player_just_caught
    }

    /// Queues an event for the next draining snapshot. Only the newest
    /// `MAX_PENDING_EVENTS` are kept when nobody drains.
    fn push_event(&mut self, event: RuntimeEvent) {
        if self.events.len() == MAX_PENDING_EVENTS {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    fn current_definition(&self) -> &LevelDefinition {
        &self.campaign[(self.level - 1) % self.campaign.len()]
    }

    fn rebuild_distance_field(&mut self) {
        let target = self.agents[PLAYER_INDEX].position;
        self.field.rebuild(target, &self.grid);
    }

    fn move_agents(&mut self) {
        for agent in &mut self.agents {
            step_agent(agent, &self.grid);
        }
    }

    fn collect_at_player(&mut self) {
        let tile = self.agents[PLAYER_INDEX].tile();
        match self.grid.consume(tile.x, tile.y) {
            Some(Consumable::Pellet) => {
                self.score += PELLET_SCORE;
                self.push_event(RuntimeEvent::PelletEaten {
                    x: tile.x,
                    y: tile.y,
                });
            }
            Some(Consumable::Item) => {
                self.score += ITEM_SCORE;
                if let Some(agent_id) = self.deactivate_item_at(tile) {
                    self.push_event(RuntimeEvent::ItemCollected {
                        agent_id,
                        x: tile.x,
                        y: tile.y,
                    });
                }
            }
            None => {}
        }
    }

    fn resolve_catches(&mut self) {
        let player = self.agents[PLAYER_INDEX].position;
        let radius = self.options.catch_radius;
        let Some(ghost_id) = self
            .agents
            .iter()
            .filter(|agent| agent.role == AgentRole::Ghost && agent.active)
            .find(|ghost| within_catch_radius(player, ghost.position, radius))
            .map(|ghost| ghost.id)
        else {
            return;
        };

        let severity = self.options.catch_severity;
        debug!(
            "tick {}: ghost {} caught the player ({:?})",
            self.tick, ghost_id, severity
        );
        self.player_just_caught = true;
        self.push_event(RuntimeEvent::PlayerCaught { ghost_id, severity });
        match severity {
            CatchSeverity::ResetPositions => self.reset_agent_positions(),
            CatchSeverity::RestartLevel => {
                self.score = 0;
                self.pending_input = None;
                self.install_level(self.grid_from_template());
            }
        }
    }

    fn check_level_cleared(&mut self) {
        if self.grid.total_pellets() == 0 || self.grid.remaining_pellets() > 0 {
            return;
        }
        self.level_just_won = true;
        self.push_event(RuntimeEvent::LevelCleared {
            level: self.level,
            score: self.score,
        });
        debug!(
            "level {} cleared at tick {} with score {}",
            self.level, self.tick, self.score
        );
        self.level += 1;
        self.pending_input = None;
        self.install_level(self.grid_from_template());
    }

    /// Every template was parsed when the campaign was installed, so this
    /// only falls back to the current grid if that invariant is broken.
    fn grid_from_template(&self) -> Grid {
        Grid::parse(self.current_definition()).unwrap_or_else(|err| {
            warn!("level {} template rejected: {}", self.level, err);
            self.grid.clone()
        })
    }
}
