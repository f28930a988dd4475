use clap::Parser;
use packman_chase_kernel::config::DifficultyConfig;
use packman_chase_kernel::constants::get_difficulty_config;
use packman_chase_kernel::engine::{GameEngine, GameEngineOptions};
use packman_chase_kernel::error::EngineError;
use packman_chase_kernel::movement::{hitbox_clear, near_center};
use packman_chase_kernel::rng::{pick_index, seeded, SimRng};
use packman_chase_kernel::types::{
    AgentRole, CatchSeverity, CellKind, Difficulty, Direction, RuntimeEvent, TileCoord,
};
use packman_chase_kernel::world::LevelDefinition;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long)]
    single: bool,
    #[arg(long)]
    difficulty: Option<String>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    ticks: Option<u64>,
    /// Level file: one row per line, `#` wall, `.` pellet, space empty,
    /// `a` item, `P`/`G` spawns. Repeat for a multi-level campaign.
    #[arg(long)]
    level: Vec<PathBuf>,
    /// JSON difficulty document overriding the built-in tables.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Restart the whole level on a catch instead of resetting positions.
    #[arg(long)]
    restart_on_catch: bool,
    #[arg(long)]
    run_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
struct Scenario {
    name: String,
    difficulty: Difficulty,
    ticks: u64,
    seed: u64,
    #[serde(rename = "catchSeverity")]
    catch_severity: CatchSeverity,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioResultLine {
    scenario: String,
    seed: u64,
    difficulty: String,
    ticks: u64,
    score: u32,
    #[serde(rename = "pelletsEaten")]
    pellets_eaten: u32,
    #[serde(rename = "itemsCollected")]
    items_collected: u32,
    catches: u32,
    #[serde(rename = "levelsCleared")]
    levels_cleared: u32,
    #[serde(rename = "finalLevel")]
    final_level: usize,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioRunResult {
    #[serde(flatten)]
    result: ScenarioResultLine,
    #[serde(rename = "anomalyRecords")]
    anomaly_records: Vec<AnomalyRecord>,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(rename = "startedAtMs")]
    started_at_ms: u64,
    #[serde(rename = "finishedAtMs")]
    finished_at_ms: u64,
    #[serde(rename = "scenarioCount")]
    scenario_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "averageScore")]
    average_score: u32,
    #[serde(rename = "outcomeCounts")]
    outcome_counts: BTreeMap<String, usize>,
    scenarios: Vec<ScenarioResultLine>,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine {
    #[serde(rename = "timestampMs")]
    timestamp_ms: u64,
    level: String,
    event: String,
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    scenario: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tick: Option<u64>,
    details: Value,
}

/// Steers the player like a hungry but aimless human: food first, otherwise
/// any open direction other than straight back.
struct Autopilot {
    rng: SimRng,
    decided_at: Option<TileCoord>,
}

impl Autopilot {
    fn new(seed: u64) -> Self {
        Self {
            rng: seeded(seed ^ 0x5eed_cafe),
            decided_at: None,
        }
    }

    fn steer(&mut self, engine: &GameEngine) -> Option<Direction> {
        let player = engine.player();
        let tile = player.tile();
        if !player.is_stopped()
            && (!near_center(player.position, player.speed) || self.decided_at == Some(tile))
        {
            return None;
        }
        self.decided_at = Some(tile);

        let grid = engine.grid();
        let open: Vec<Direction> = Direction::CARDINALS
            .into_iter()
            .filter(|dir| grid.can_walk_tile(tile.step(*dir)))
            .collect();
        let food: Vec<Direction> = open
            .iter()
            .copied()
            .filter(|dir| {
                let next = tile.step(*dir);
                matches!(grid.cell(next.x, next.y), CellKind::Pellet | CellKind::Item)
            })
            .collect();
        let onward: Vec<Direction> = open
            .iter()
            .copied()
            .filter(|dir| *dir != player.direction.opposite())
            .collect();

        let pool = if !food.is_empty() {
            food
        } else if !onward.is_empty() {
            onward
        } else {
            open
        };
        if pool.is_empty() {
            return None;
        }
        Some(pool[pick_index(&mut self.rng, pool.len())])
    }
}

/// Cross-tick state the anomaly checks compare against.
#[derive(Debug)]
struct TickWatch {
    last_remaining: u32,
}

fn main() {
    let _ = env_logger::Builder::from_default_env().try_init();
    let cli = Cli::parse();
    let scenarios = resolve_scenarios(&cli);
    let run_started_at_ms = now_ms();
    let seed_hint = scenarios.first().map(|scenario| scenario.seed).unwrap_or(0);
    let run_id = cli
        .run_id
        .clone()
        .unwrap_or_else(|| default_run_id(seed_hint, run_started_at_ms));

    let levels = match load_levels(&cli.level) {
        Ok(levels) => levels,
        Err(error) => fail(&run_id, "level_load_failed", error.to_string()),
    };
    let config_override = match cli.config.as_deref().map(load_config).transpose() {
        Ok(config) => config,
        Err(error) => fail(&run_id, "config_load_failed", error),
    };

    let mut has_anomaly = false;
    let mut scenario_results = Vec::new();
    let mut outcome_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_score = 0u64;
    let mut total_anomalies = 0usize;

    for scenario in scenarios {
        let config = config_override
            .clone()
            .unwrap_or_else(|| get_difficulty_config(scenario.difficulty));
        emit_log(
            "info",
            "scenario_started",
            &run_id,
            Some(&scenario.name),
            Some(scenario.seed),
            None,
            json!({
                "difficulty": config.name,
                "ticks": scenario.ticks,
                "ghosts": config.ghost_count(),
                "policies": ghost_roster(&config),
                "recalcEvery": config.recalc_every,
                "catchSeverity": scenario.catch_severity,
            }),
        );

        let scenario_run = match run_scenario(&scenario, levels.clone(), config) {
            Ok(run) => run,
            Err(error) => fail(&run_id, "scenario_setup_failed", error.to_string()),
        };

        for anomaly in &scenario_run.anomaly_records {
            emit_log(
                "warn",
                "anomaly_detected",
                &run_id,
                Some(&scenario.name),
                Some(scenario.seed),
                Some(anomaly.tick),
                json!({
                    "message": anomaly.message,
                }),
            );
        }

        if !scenario_run.result.anomalies.is_empty() {
            has_anomaly = true;
        }
        total_anomalies += scenario_run.anomaly_records.len();
        total_score += u64::from(scenario_run.result.score);
        *outcome_counts
            .entry(outcome_key(&scenario_run.result))
            .or_insert(0) += 1;

        emit_log(
            "info",
            "scenario_finished",
            &run_id,
            Some(&scenario.name),
            Some(scenario.seed),
            Some(scenario.ticks),
            json!({
                "score": scenario_run.result.score,
                "catches": scenario_run.result.catches,
                "levelsCleared": scenario_run.result.levels_cleared,
                "anomalyCount": scenario_run.anomaly_records.len(),
            }),
        );

        match serde_json::to_string(&scenario_run.result) {
            Ok(line) => println!("{line}"),
            Err(error) => fail(&run_id, "result_serialize_failed", error.to_string()),
        }
        scenario_results.push(scenario_run.result);
    }

    let run_finished_at_ms = now_ms();
    let summary = build_run_summary(
        run_id.clone(),
        run_started_at_ms,
        run_finished_at_ms,
        scenario_results,
        outcome_counts,
        total_anomalies,
        total_score,
    );

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                &run_id,
                None,
                None,
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    emit_log(
        "info",
        "run_finished",
        &run_id,
        None,
        None,
        None,
        json!({
            "scenarioCount": summary.scenario_count,
            "anomalyCount": summary.anomaly_count,
            "averageScore": summary.average_score,
            "outcomeCounts": summary.outcome_counts,
            "summaryOut": summary_out_written,
        }),
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

fn run_scenario(
    scenario: &Scenario,
    levels: Vec<LevelDefinition>,
    config: DifficultyConfig,
) -> Result<ScenarioRunResult, EngineError> {
    let mut engine = GameEngine::with_campaign(
        levels,
        config,
        GameEngineOptions {
            seed: scenario.seed,
            catch_severity: scenario.catch_severity,
            ..GameEngineOptions::default()
        },
    )?;
    let mut autopilot = Autopilot::new(scenario.seed);
    let mut watch = TickWatch {
        last_remaining: engine.pellets_remaining(),
    };

    let mut pellets_eaten = 0;
    let mut items_collected = 0;
    let mut catches = 0;
    let mut levels_cleared = 0;
    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();

    for _ in 0..scenario.ticks {
        if let Some(dir) = autopilot.steer(&engine) {
            let (dx, dy) = dir.delta();
            engine.handle_directional_input(dx, dy);
        }
        engine.step();
        let snapshot = engine.build_snapshot(true);

        for event in &snapshot.events {
            match event {
                RuntimeEvent::PelletEaten { .. } => pellets_eaten += 1,
                RuntimeEvent::ItemCollected { .. } => items_collected += 1,
                RuntimeEvent::PlayerCaught { .. } => catches += 1,
                RuntimeEvent::LevelCleared { .. } => levels_cleared += 1,
                RuntimeEvent::LevelStarted { .. } => {}
            }
        }
        for message in collect_tick_anomalies(&engine, &snapshot.events, &mut watch) {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                snapshot.tick,
                message,
            );
        }
    }

    Ok(ScenarioRunResult {
        result: ScenarioResultLine {
            scenario: scenario.name.clone(),
            seed: scenario.seed,
            difficulty: engine.config().name.clone(),
            ticks: engine.tick(),
            score: engine.score(),
            pellets_eaten,
            items_collected,
            catches,
            levels_cleared,
            final_level: engine.level(),
            anomalies,
        },
        anomaly_records,
    })
}

fn collect_tick_anomalies(
    engine: &GameEngine,
    events: &[RuntimeEvent],
    watch: &mut TickWatch,
) -> Vec<String> {
    let mut anomalies = Vec::new();
    let grid = engine.grid();

    for agent in engine.agents() {
        if agent.role == AgentRole::Item || !agent.active {
            continue;
        }
        let tile = agent.tile();
        if !grid.can_walk_tile(tile) {
            anomalies.push(format!(
                "agent {} inside wall at ({}, {})",
                agent.id, tile.x, tile.y
            ));
        } else if !hitbox_clear(agent.position, grid) {
            anomalies.push(format!(
                "agent {} hitbox overlaps a wall near ({}, {})",
                agent.id, tile.x, tile.y
            ));
        }
    }

    let remaining = engine.pellets_remaining();
    let total = engine.grid().total_pellets();
    if remaining > total {
        anomalies.push(format!("pellets remaining {remaining} exceed total {total}"));
    }
    let reloaded = events
        .iter()
        .any(|event| matches!(event, RuntimeEvent::LevelStarted { .. }));
    if !reloaded && remaining > watch.last_remaining {
        anomalies.push(format!(
            "pellet counter rose from {} to {remaining} within a level",
            watch.last_remaining
        ));
    }
    watch.last_remaining = remaining;
    anomalies
}

fn resolve_scenarios(cli: &Cli) -> Vec<Scenario> {
    let seed = cli.seed.unwrap_or_else(now_ms);
    let ticks = cli.ticks.unwrap_or(3_600).clamp(1, 1_000_000);
    let catch_severity = if cli.restart_on_catch {
        CatchSeverity::RestartLevel
    } else {
        CatchSeverity::ResetPositions
    };
    let difficulty = cli
        .difficulty
        .as_deref()
        .and_then(Difficulty::parse)
        .unwrap_or(Difficulty::Medium);

    if cli.single || cli.difficulty.is_some() || cli.config.is_some() {
        return vec![Scenario {
            name: format!("custom-{}", difficulty.label().to_lowercase()),
            difficulty,
            ticks,
            seed,
            catch_severity,
        }];
    }

    Difficulty::ALL
        .iter()
        .enumerate()
        .map(|(offset, difficulty)| Scenario {
            name: format!("sweep-{}", difficulty.label().to_lowercase()),
            difficulty: *difficulty,
            ticks,
            seed: seed.wrapping_add(offset as u64),
            catch_severity,
        })
        .collect()
}

fn load_levels(paths: &[PathBuf]) -> io::Result<Vec<LevelDefinition>> {
    paths
        .iter()
        .map(|path| std::fs::read_to_string(path).map(|text| LevelDefinition::parse_block(&text)))
        .collect()
}

fn load_config(path: &Path) -> Result<DifficultyConfig, String> {
    let raw = std::fs::read_to_string(path)
        .map_err(|error| format!("{}: {error}", path.to_string_lossy()))?;
    DifficultyConfig::from_json_str(&raw)
        .map_err(|error| format!("{}: {error}", path.to_string_lossy()))
}

fn fail(run_id: &str, event: &str, error: String) -> ! {
    emit_log(
        "error",
        event,
        run_id,
        None,
        None,
        None,
        json!({
            "error": error,
        }),
    );
    std::process::exit(2);
}

fn ghost_roster(config: &DifficultyConfig) -> Vec<&'static str> {
    config
        .ghost_policies
        .iter()
        .take(config.ghost_count())
        .map(|policy| policy.label())
        .collect()
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    tick: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        tick,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_run_id(seed: u64, timestamp_ms: u64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn outcome_key(result: &ScenarioResultLine) -> String {
    if result.levels_cleared > 0 {
        "cleared"
    } else if result.catches > 0 {
        "caught"
    } else {
        "unfinished"
    }
    .to_string()
}

fn build_run_summary(
    run_id: String,
    started_at_ms: u64,
    finished_at_ms: u64,
    scenarios: Vec<ScenarioResultLine>,
    outcome_counts: BTreeMap<String, usize>,
    anomaly_count: usize,
    total_score: u64,
) -> RunSummary {
    let scenario_count = scenarios.len();
    let average_score = if scenario_count == 0 {
        0
    } else {
        (total_score / scenario_count as u64) as u32
    };
    RunSummary {
        run_id,
        started_at_ms,
        finished_at_ms,
        scenario_count,
        anomaly_count,
        average_score,
        outcome_counts,
        scenarios,
    }
}

fn emit_log(
    level: &str,
    event: &str,
    run_id: &str,
    scenario: Option<&str>,
    seed: Option<u64>,
    tick: Option<u64>,
    details: Value,
) {
    let log_line = StructuredLogLine {
        timestamp_ms: now_ms(),
        level: level.to_string(),
        event: event.to_string(),
        run_id: run_id.to_string(),
        scenario: scenario.map(|value| value.to_string()),
        seed,
        tick,
        details,
    };
    match serde_json::to_string(&log_line) {
        Ok(line) => eprintln!("{line}"),
        Err(error) => eprintln!("structured log failed to serialize: {error}"),
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, summary_text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use packman_chase_kernel::types::PolicyKind;

    fn make_scenario_result(score: u32, levels_cleared: u32, catches: u32) -> ScenarioResultLine {
        ScenarioResultLine {
            scenario: "test".to_string(),
            seed: 42,
            difficulty: "Easy".to_string(),
            ticks: 100,
            score,
            pellets_eaten: score,
            items_collected: 0,
            catches,
            levels_cleared,
            final_level: 1 + levels_cleared as usize,
            anomalies: Vec::new(),
        }
    }

    fn scenario(difficulty: Difficulty, ticks: u64, seed: u64) -> Scenario {
        Scenario {
            name: "test".to_string(),
            difficulty,
            ticks,
            seed,
            catch_severity: CatchSeverity::ResetPositions,
        }
    }

    #[test]
    fn default_run_id_contains_seed_and_timestamp() {
        assert_eq!(default_run_id(42, 123456789), "sim-42-123456789");
    }

    #[test]
    fn build_run_summary_calculates_average_score() {
        let summary = build_run_summary(
            "sim-42-1".to_string(),
            1,
            2,
            vec![make_scenario_result(60, 0, 1), make_scenario_result(90, 1, 0)],
            BTreeMap::from([
                ("caught".to_string(), 1usize),
                ("cleared".to_string(), 1usize),
            ]),
            1,
            150,
        );
        assert_eq!(summary.average_score, 75);
        assert_eq!(summary.scenario_count, 2);
    }

    #[test]
    fn outcome_prefers_cleared_over_caught() {
        assert_eq!(outcome_key(&make_scenario_result(10, 1, 3)), "cleared");
        assert_eq!(outcome_key(&make_scenario_result(10, 0, 3)), "caught");
        assert_eq!(outcome_key(&make_scenario_result(10, 0, 0)), "unfinished");
    }

    #[test]
    fn write_summary_returns_error_when_parent_does_not_exist() {
        let now = now_ms();
        let target = std::env::temp_dir()
            .join(format!("packman-chase-missing-{now}"))
            .join("summary.json");
        let summary = build_run_summary(
            "sim-1-1".to_string(),
            1,
            2,
            vec![make_scenario_result(5, 0, 0)],
            BTreeMap::from([("unfinished".to_string(), 1usize)]),
            0,
            5,
        );
        assert!(write_summary(&target, &summary).is_err());
    }

    #[test]
    fn push_anomaly_keeps_records_and_deduplicates_summary_messages() {
        let mut anomalies = Vec::new();
        let mut records = Vec::new();
        let mut seen = HashSet::new();
        push_anomaly(
            &mut anomalies,
            &mut records,
            &mut seen,
            10,
            "same anomaly".to_string(),
        );
        push_anomaly(
            &mut anomalies,
            &mut records,
            &mut seen,
            11,
            "same anomaly".to_string(),
        );

        assert_eq!(anomalies.len(), 1);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].tick, 10);
        assert_eq!(records[1].tick, 11);
    }

    #[test]
    fn ghost_roster_lists_active_policy_labels() {
        let config = DifficultyConfig {
            name: "Roster".to_string(),
            description: String::new(),
            ghost_speeds: vec![1.0, 1.0],
            ghost_policies: vec![PolicyKind::Genius, PolicyKind::Ambush, PolicyKind::Dumb],
            recalc_every: 4,
        };
        assert_eq!(ghost_roster(&config), vec!["Genius", "Ambush"]);
    }

    #[test]
    fn default_sweep_covers_every_difficulty() {
        let cli = Cli::parse_from(["simulate", "--seed", "7", "--ticks", "50"]);
        let scenarios = resolve_scenarios(&cli);
        assert_eq!(scenarios.len(), Difficulty::ALL.len());
        assert_eq!(scenarios[0].seed, 7);
        assert_eq!(scenarios[3].seed, 10);
        assert!(scenarios.iter().all(|scenario| scenario.ticks == 50));
    }

    #[test]
    fn single_flag_builds_one_custom_scenario() {
        let cli = Cli::parse_from([
            "simulate",
            "--difficulty",
            "nightmare",
            "--seed",
            "3",
            "--restart-on-catch",
        ]);
        let scenarios = resolve_scenarios(&cli);
        assert_eq!(scenarios.len(), 1);
        assert_eq!(scenarios[0].name, "custom-nightmare");
        assert_eq!(scenarios[0].catch_severity, CatchSeverity::RestartLevel);
    }

    #[test]
    fn scenarios_on_the_default_maze_run_clean() {
        for difficulty in Difficulty::ALL {
            let run = run_scenario(
                &scenario(difficulty, 1_500, 2024),
                Vec::new(),
                get_difficulty_config(difficulty),
            )
            .expect("scenario runs");
            assert!(
                run.anomaly_records.is_empty(),
                "{difficulty:?}: {:?}",
                run.anomaly_records
            );
            assert_eq!(run.result.ticks, 1_500);
            assert!(run.result.pellets_eaten > 0);
        }
    }

    #[test]
    fn autopilot_clears_a_corridor_with_a_walled_off_ghost() {
        let level = LevelDefinition::from_rows(["#########", "#P....#G#", "#########"]);
        let config = DifficultyConfig {
            name: "Idle".to_string(),
            description: String::new(),
            ghost_speeds: vec![0.5],
            ghost_policies: vec![PolicyKind::Scatter],
            recalc_every: 10,
        };
        let run = run_scenario(&scenario(Difficulty::Easy, 200, 1), vec![level], config)
            .expect("scenario runs");
        assert!(run.result.levels_cleared >= 1);
        assert!(run.anomaly_records.is_empty());
    }

    #[test]
    fn collect_tick_anomalies_flags_rising_pellet_count() {
        let engine = GameEngine::new(
            get_difficulty_config(Difficulty::Easy),
            GameEngineOptions::default(),
        )
        .expect("engine");
        let mut watch = TickWatch { last_remaining: 0 };
        let anomalies = collect_tick_anomalies(&engine, &[], &mut watch);
        assert_eq!(anomalies.len(), 1);
        assert!(anomalies[0].contains("pellet counter rose"));

        let again = collect_tick_anomalies(&engine, &[], &mut watch);
        assert!(again.is_empty());
    }
}
