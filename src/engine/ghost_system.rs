use super::utils::{ghost_slot, patrol_route, scatter_corner};
use super::*;
use crate::movement::halt;
use crate::policy::{decide, gate_open, Decision, PolicyContext};

impl GameEngine {
    /// Runs every active ghost's policy whose activation gate is open and
    /// records the resulting intent on the agent.
    pub(super) fn update_ghost_decisions(&mut self) {
        let target = self.agents[PLAYER_INDEX].position;
        let target_direction = self.agents[PLAYER_INDEX].direction;

        for idx in PLAYER_INDEX + 1..PLAYER_INDEX + 1 + self.ghost_count {
            let agent = &self.agents[idx];
            let Some(kind) = agent.policy else {
                continue;
            };
            if !agent.active || !gate_open(agent) {
                continue;
            }

            let slot = ghost_slot(idx);
            let waypoints = patrol_route(&self.corners, slot);
            let ctx = PolicyContext {
                grid: &self.grid,
                field: &self.field,
                target,
                target_direction,
                corner: scatter_corner(&self.corners, slot),
                waypoints: &waypoints,
            };
            let decision = decide(kind, agent, &ctx, &mut self.rng);

            let agent = &mut self.agents[idx];
            match decision {
                Decision::Steer(dir) => agent.desired = dir,
                Decision::Halt => halt(agent),
            }
            agent.decided_at = Some(agent.tile());
        }
    }
}
