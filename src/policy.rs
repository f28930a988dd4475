use rand::Rng;

use crate::constants::{
    AMBUSH_LOOKAHEAD_TILES, GENIUS_DEAD_END_PENALTY, GENIUS_JUNCTION_BONUS,
    GENIUS_PROXIMITY_BONUS, GENIUS_PROXIMITY_RANGE, SLOW_BLUNDER_CHANCE, SMART_DEAD_END_PENALTY,
};
use crate::distance::DistanceField;
use crate::movement::{near_center, tile_of, Agent};
use crate::rng::{chance, pick_index};
use crate::types::{Direction, Point, PolicyKind, TileCoord};
use crate::world::Grid;

/// Outcome of one policy evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Decision {
    /// Request a new desired direction.
    Steer(Direction),
    /// No walkable neighbor; stop in place.
    Halt,
}

/// Read-only view a policy gets of the world around one ghost.
#[derive(Clone, Copy, Debug)]
pub struct PolicyContext<'a> {
    pub grid: &'a Grid,
    pub field: &'a DistanceField,
    pub target: Point,
    pub target_direction: Direction,
    pub corner: TileCoord,
    pub waypoints: &'a [TileCoord],
}

/// Decisions are taken once per tile, at its center, or whenever the agent
/// has come to a stop.
pub fn gate_open(agent: &Agent) -> bool {
    if agent.is_stopped() {
        return true;
    }
    near_center(agent.position, agent.speed) && agent.decided_at != Some(agent.tile())
}

pub fn decide<R: Rng + ?Sized>(
    kind: PolicyKind,
    agent: &Agent,
    ctx: &PolicyContext<'_>,
    rng: &mut R,
) -> Decision {
    let tile = agent.tile();
    let options = walkable_options(ctx.grid, tile);
    if options.is_empty() {
        return Decision::Halt;
    }

    match kind {
        PolicyKind::Dumb | PolicyKind::Frightened => random_step(&options, rng),
        PolicyKind::Slow => {
            if chance(rng, SLOW_BLUNDER_CHANCE) {
                random_step(&options, rng)
            } else {
                follow_field(&options, ctx, None, rng, |_, _| 0)
            }
        }
        PolicyKind::Normal => follow_field(&options, ctx, None, rng, |_, _| 0),
        PolicyKind::Smart => follow_field(&options, ctx, None, rng, |_, exits| {
            if exits == 1 {
                i64::from(SMART_DEAD_END_PENALTY)
            } else {
                0
            }
        }),
        PolicyKind::Genius => {
            follow_field(&options, ctx, Some(agent.direction), rng, |distance, exits| {
                let mut shaping = 0i64;
                if distance <= i64::from(GENIUS_PROXIMITY_RANGE) {
                    shaping -= i64::from(GENIUS_PROXIMITY_BONUS);
                }
                if exits == 1 {
                    shaping += i64::from(GENIUS_DEAD_END_PENALTY);
                } else if exits >= 3 {
                    shaping -= i64::from(GENIUS_JUNCTION_BONUS);
                }
                shaping
            })
        }
        PolicyKind::Chase => head_toward(&options, tile_of(ctx.target), rng),
        PolicyKind::Scatter => head_toward(&options, ctx.corner, rng),
        PolicyKind::Patrol => match ctx.waypoints {
            [first, second, ..] => {
                let goal = if tile.manhattan(*first) < tile.manhattan(*second) {
                    *second
                } else {
                    *first
                };
                head_toward(&options, goal, rng)
            }
            _ => random_step(&options, rng),
        },
        PolicyKind::Ambush => head_toward(&options, ambush_point(ctx), rng),
    }
}

/// Target tile projected ahead of the quarry along its heading. Not clamped.
pub fn ambush_point(ctx: &PolicyContext<'_>) -> TileCoord {
    let (dx, dy) = ctx.target_direction.delta();
    let tile = tile_of(ctx.target);
    TileCoord::new(
        tile.x + dx * AMBUSH_LOOKAHEAD_TILES,
        tile.y + dy * AMBUSH_LOOKAHEAD_TILES,
    )
}

fn walkable_options(grid: &Grid, tile: TileCoord) -> Vec<(Direction, TileCoord)> {
    Direction::CARDINALS
        .iter()
        .map(|dir| (*dir, tile.step(*dir)))
        .filter(|(_, next)| grid.can_walk_tile(*next))
        .collect()
}

fn random_step<R: Rng + ?Sized>(options: &[(Direction, TileCoord)], rng: &mut R) -> Decision {
    let (dir, _) = options[pick_index(rng, options.len())];
    Decision::Steer(dir)
}

/// Lowest distance-field reading plus `shaping(distance, exits)` wins.
fn follow_field<R, F>(
    options: &[(Direction, TileCoord)],
    ctx: &PolicyContext<'_>,
    prefer: Option<Direction>,
    rng: &mut R,
    shaping: F,
) -> Decision
where
    R: Rng + ?Sized,
    F: Fn(i64, usize) -> i64,
{
    let scored: Vec<(Direction, i64)> = options
        .iter()
        .map(|(dir, next)| {
            let distance = i64::from(ctx.field.distance_to(*next));
            let exits = ctx.grid.exit_count(*next);
            (*dir, distance + shaping(distance, exits))
        })
        .collect();
    pick_lowest(&scored, prefer, rng)
}

fn head_toward<R: Rng + ?Sized>(
    options: &[(Direction, TileCoord)],
    goal: TileCoord,
    rng: &mut R,
) -> Decision {
    let scored: Vec<(Direction, i64)> = options
        .iter()
        .map(|(dir, next)| (*dir, i64::from(next.manhattan(goal))))
        .collect();
    pick_lowest(&scored, None, rng)
}

fn pick_lowest<R: Rng + ?Sized>(
    scored: &[(Direction, i64)],
    prefer: Option<Direction>,
    rng: &mut R,
) -> Decision {
    let Some(best) = scored.iter().map(|(_, score)| *score).min() else {
        return Decision::Halt;
    };
    let tied: Vec<Direction> = scored
        .iter()
        .filter(|(_, score)| *score == best)
        .map(|(dir, _)| *dir)
        .collect();
    if let Some(prefer) = prefer {
        if tied.len() > 1 && tied.contains(&prefer) {
            return Decision::Steer(prefer);
        }
    }
    Decision::Steer(tied[pick_index(rng, tied.len())])
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::movement::tile_center;
    use crate::rng::seeded;
    use crate::world::LevelDefinition;

    fn grid(rows: &[&str]) -> Grid {
        Grid::parse(&LevelDefinition::from_rows(rows.iter().copied())).expect("valid level")
    }

    fn open_room() -> Grid {
        grid(&[
            "#######", "#.....#", "#.....#", "#.....#", "#.....#", "#.....#", "#######",
        ])
    }

    fn field_for(grid: &Grid, target: TileCoord) -> DistanceField {
        let mut field = DistanceField::new(grid.width(), grid.height());
        field.rebuild(tile_center(target), grid);
        field
    }

    fn ctx<'a>(grid: &'a Grid, field: &'a DistanceField, target: TileCoord) -> PolicyContext<'a> {
        PolicyContext {
            grid,
            field,
            target: tile_center(target),
            target_direction: Direction::None,
            corner: TileCoord::new(1, 1),
            waypoints: &[],
        }
    }

    fn ghost_at(tile: TileCoord, direction: Direction) -> Agent {
        let mut agent = Agent::ghost(1, tile, 1.0, PolicyKind::Normal);
        agent.direction = direction;
        agent
    }

    #[test]
    fn gate_opens_once_per_tile() {
        let mut agent = ghost_at(TileCoord::new(2, 2), Direction::Right);
        assert!(gate_open(&agent));

        agent.decided_at = Some(TileCoord::new(2, 2));
        assert!(!gate_open(&agent));

        agent.position.x += 6.0;
        agent.decided_at = None;
        assert!(!gate_open(&agent));

        agent.direction = Direction::None;
        agent.decided_at = Some(TileCoord::new(2, 2));
        assert!(gate_open(&agent));
    }

    #[test]
    fn random_policies_only_pick_walkable_neighbors() {
        let grid = grid(&["#####", "#...#", "#.###", "#####"]);
        let field = field_for(&grid, TileCoord::new(3, 1));
        let context = ctx(&grid, &field, TileCoord::new(3, 1));
        let agent = ghost_at(TileCoord::new(1, 1), Direction::None);
        let mut rng = seeded(5);

        let mut seen = HashSet::new();
        for kind in [PolicyKind::Dumb, PolicyKind::Frightened] {
            for _ in 0..200 {
                match decide(kind, &agent, &context, &mut rng) {
                    Decision::Steer(dir) => {
                        assert!(matches!(dir, Direction::Right | Direction::Down));
                        seen.insert(dir);
                    }
                    other => panic!("unexpected {other:?}"),
                }
            }
        }
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn enclosed_agent_halts() {
        let grid = grid(&["###", "#.#", "###"]);
        let field = field_for(&grid, TileCoord::new(1, 1));
        let context = ctx(&grid, &field, TileCoord::new(1, 1));
        let agent = ghost_at(TileCoord::new(1, 1), Direction::Left);
        let mut rng = seeded(1);
        for kind in [PolicyKind::Dumb, PolicyKind::Normal, PolicyKind::Genius] {
            assert_eq!(decide(kind, &agent, &context, &mut rng), Decision::Halt);
        }
    }

    #[test]
    fn normal_follows_shortest_path() {
        let grid = grid(&["#######", "#.....#", "#.###.#", "#.....#", "#######"]);
        let target = TileCoord::new(5, 3);
        let field = field_for(&grid, target);
        let context = ctx(&grid, &field, target);
        let mut rng = seeded(11);

        let agent = ghost_at(TileCoord::new(4, 1), Direction::None);
        for _ in 0..50 {
            assert_eq!(
                decide(PolicyKind::Normal, &agent, &context, &mut rng),
                Decision::Steer(Direction::Right)
            );
        }
    }

    #[test]
    fn smart_backs_out_of_a_dead_end_that_normal_enters() {
        let grid = grid(&["######", "#....#", "######"]);
        let target = TileCoord::new(1, 1);
        let field = field_for(&grid, target);
        let context = ctx(&grid, &field, target);
        let agent = ghost_at(TileCoord::new(2, 1), Direction::Left);
        let mut rng = seeded(3);

        assert_eq!(
            decide(PolicyKind::Normal, &agent, &context, &mut rng),
            Decision::Steer(Direction::Left)
        );
        assert_eq!(
            decide(PolicyKind::Smart, &agent, &context, &mut rng),
            Decision::Steer(Direction::Right)
        );
    }

    #[test]
    fn genius_keeps_heading_on_ties() {
        let grid = open_room();
        let target = TileCoord::new(3, 3);
        let field = field_for(&grid, target);
        let context = ctx(&grid, &field, target);

        for seed in 0..32 {
            let mut rng = seeded(seed);
            let down = ghost_at(TileCoord::new(1, 1), Direction::Down);
            assert_eq!(
                decide(PolicyKind::Genius, &down, &context, &mut rng),
                Decision::Steer(Direction::Down)
            );
            let right = ghost_at(TileCoord::new(1, 1), Direction::Right);
            assert_eq!(
                decide(PolicyKind::Genius, &right, &context, &mut rng),
                Decision::Steer(Direction::Right)
            );
        }
    }

    #[test]
    fn genius_ties_without_heading_are_random() {
        let grid = open_room();
        let target = TileCoord::new(3, 3);
        let field = field_for(&grid, target);
        let context = ctx(&grid, &field, target);
        let agent = ghost_at(TileCoord::new(1, 1), Direction::None);
        let mut rng = seeded(77);

        let seen: HashSet<Decision> = (0..100)
            .map(|_| decide(PolicyKind::Genius, &agent, &context, &mut rng))
            .collect();
        assert_eq!(
            seen,
            HashSet::from([
                Decision::Steer(Direction::Down),
                Decision::Steer(Direction::Right)
            ])
        );
    }

    #[test]
    fn slow_blunders_some_of_the_time() {
        let grid = open_room();
        let target = TileCoord::new(3, 5);
        let field = field_for(&grid, target);
        let context = ctx(&grid, &field, target);
        let agent = ghost_at(TileCoord::new(3, 3), Direction::None);
        let mut rng = seeded(404);

        let trials = 2_000;
        let blunders = (0..trials)
            .filter(|_| {
                decide(PolicyKind::Slow, &agent, &context, &mut rng)
                    != Decision::Steer(Direction::Down)
            })
            .count();
        let rate = blunders as f32 / trials as f32;
        assert!((0.12..0.34).contains(&rate), "blunder rate {rate}");
    }

    #[test]
    fn chase_and_scatter_use_manhattan_goals() {
        let grid = open_room();
        let field = DistanceField::new(grid.width(), grid.height());
        let mut context = ctx(&grid, &field, TileCoord::new(5, 3));
        context.corner = TileCoord::new(3, 1);
        let agent = ghost_at(TileCoord::new(3, 3), Direction::None);
        let mut rng = seeded(8);

        assert_eq!(
            decide(PolicyKind::Chase, &agent, &context, &mut rng),
            Decision::Steer(Direction::Right)
        );
        assert_eq!(
            decide(PolicyKind::Scatter, &agent, &context, &mut rng),
            Decision::Steer(Direction::Up)
        );
    }

    #[test]
    fn patrol_heads_for_the_farther_waypoint() {
        let grid = open_room();
        let field = DistanceField::new(grid.width(), grid.height());
        let waypoints = [TileCoord::new(1, 3), TileCoord::new(5, 3)];
        let mut context = ctx(&grid, &field, TileCoord::new(1, 1));
        context.waypoints = &waypoints;
        let mut rng = seeded(13);

        let near_first = ghost_at(TileCoord::new(2, 3), Direction::None);
        assert_eq!(
            decide(PolicyKind::Patrol, &near_first, &context, &mut rng),
            Decision::Steer(Direction::Right)
        );
        let near_second = ghost_at(TileCoord::new(4, 3), Direction::None);
        assert_eq!(
            decide(PolicyKind::Patrol, &near_second, &context, &mut rng),
            Decision::Steer(Direction::Left)
        );
    }

    #[test]
    fn patrol_without_two_waypoints_wanders() {
        let grid = open_room();
        let field = DistanceField::new(grid.width(), grid.height());
        let waypoints = [TileCoord::new(5, 5)];
        let mut context = ctx(&grid, &field, TileCoord::new(1, 1));
        context.waypoints = &waypoints;
        let agent = ghost_at(TileCoord::new(3, 3), Direction::None);
        let mut rng = seeded(21);

        let seen: HashSet<Decision> = (0..200)
            .map(|_| decide(PolicyKind::Patrol, &agent, &context, &mut rng))
            .collect();
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn ambush_cuts_ahead_of_the_target() {
        let grid = open_room();
        let field = DistanceField::new(grid.width(), grid.height());
        let mut context = ctx(&grid, &field, TileCoord::new(1, 3));
        context.target_direction = Direction::Right;
        assert_eq!(ambush_point(&context), TileCoord::new(4, 3));

        let agent = ghost_at(TileCoord::new(4, 1), Direction::None);
        let mut rng = seeded(34);
        for _ in 0..20 {
            assert_eq!(
                decide(PolicyKind::Ambush, &agent, &context, &mut rng),
                Decision::Steer(Direction::Down)
            );
        }
    }

    #[test]
    fn ambush_projection_may_leave_the_grid() {
        let grid = open_room();
        let field = DistanceField::new(grid.width(), grid.height());
        let mut context = ctx(&grid, &field, TileCoord::new(1, 1));
        context.target_direction = Direction::Up;
        assert_eq!(ambush_point(&context), TileCoord::new(1, -2));
    }
}
