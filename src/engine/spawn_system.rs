use log::info;

use super::*;
use crate::movement::reset_position;

impl GameEngine {
    /// Swaps in a freshly parsed grid and rebuilds everything sized by it:
    /// the distance field, the corner table and the whole agent arena.
    pub(super) fn install_level(&mut self, grid: Grid) {
        self.field = DistanceField::new(grid.width(), grid.height());
        self.corners = grid.corner_tiles();
        self.agents = build_arena(&grid, &self.config, self.options.player_speed);
        self.ghost_count = self.config.ghost_count();
        self.grid = grid;
        self.pending_input = None;
        self.rebuild_distance_field();

        info!(
            "level {} ready: {}x{}, {} pellets, {} ghosts, {} items",
            self.level,
            self.grid.width(),
            self.grid.height(),
            self.grid.total_pellets(),
            self.ghost_count,
            self.grid.item_tiles().len()
        );
        self.push_event(RuntimeEvent::LevelStarted {
            level: self.level,
            total_pellets: self.grid.total_pellets(),
        });
    }

    /// Sends the player and every ghost home. Items and consumed cells stay
    /// as they are.
    pub(super) fn reset_agent_positions(&mut self) {
        for agent in &mut self.agents {
            if agent.role != AgentRole::Item {
                reset_position(agent);
            }
        }
        self.pending_input = None;
    }

    pub(super) fn deactivate_item_at(&mut self, tile: TileCoord) -> Option<usize> {
        let item = self.agents.iter_mut().find(|agent| {
            agent.role == AgentRole::Item && agent.active && agent.tile() == tile
        })?;
        item.active = false;
        Some(item.id)
    }
}

/// Player first, then one ghost per configured speed/policy pair, then one
/// stationary agent per item cell. Ghost `i` uses spawn point `i mod n`.
fn build_arena(grid: &Grid, config: &DifficultyConfig, player_speed: f32) -> Vec<Agent> {
    let spawns = grid.ghost_spawns();
    let mut agents =
        Vec::with_capacity(1 + config.ghost_count() + grid.item_tiles().len());
    agents.push(Agent::new(
        PLAYER_INDEX,
        AgentRole::Player,
        grid.player_spawn(),
        player_speed,
    ));

    for (slot, (&speed, &policy)) in config
        .ghost_speeds
        .iter()
        .zip(&config.ghost_policies)
        .enumerate()
    {
        let spawn = spawns[slot % spawns.len()];
        let id = agents.len();
        agents.push(Agent::ghost(id, spawn, speed, policy));
    }

    for &tile in grid.item_tiles() {
        let id = agents.len();
        agents.push(Agent::item(id, tile));
    }
    agents
}
