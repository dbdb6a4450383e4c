//! Level definitions and the builder that turns one into a running
//! [`Engine`].
//!
//! Rates in a [`LevelConfig`] are given per second and divided by the
//! level's `target_fps` when the pipeline is assembled, so the same file
//! plays at the same speed whatever tick rate the driver picks.

use serde::{Deserialize, Serialize};

use heatwire_core::economy::{FarmIncome, FarmSpawning, Upkeep};
use heatwire_core::engine::Engine;
use heatwire_core::entity::{Entity, WorldError};
use heatwire_core::heat::{
    DriftSpawner, FixedOriginSpawner, HeatParams, HeatPoint, HeatPointStep, HeatSpawner, TemperatureBand,
};
use heatwire_core::noise::NoiseField;
use heatwire_core::pipeline::Pipeline;
use heatwire_core::rng::SimRng;
use heatwire_core::rules::{LossCheck, WinCheck};
use heatwire_core::temperature::{TemperatureConfig, TemperatureStep};
use heatwire_core::vec2::Vec2;
use heatwire_core::world::{WorldConfig, WorldState};
use heatwire_logic::bridge::GraphStep;
use heatwire_logic::evaluator::EvalOptions;
use heatwire_logic::graph::CodeGraph;

// ===========================================================================
// Config types
// ===========================================================================

/// Where new random heat points appear.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnerConfig {
    /// Anywhere in the field, pushed upwind.
    #[default]
    Drift,
    /// Always at `origin`.
    FixedOrigin { origin: Vec2 },
}

impl SpawnerConfig {
    fn build(self) -> Box<dyn HeatSpawner> {
        match self {
            SpawnerConfig::Drift => Box::new(DriftSpawner),
            SpawnerConfig::FixedOrigin { origin } => Box::new(FixedOriginSpawner { origin }),
        }
    }
}

/// A `(coins, score)` pair of per-second rates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Rates {
    pub coins: f64,
    pub score: f64,
}

impl Rates {
    pub const fn new(coins: f64, score: f64) -> Self {
        Self { coins, score }
    }

    fn per_tick(self, fps: f64) -> Self {
        Self::new(self.coins / fps, self.score / fps)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    /// Earned per unshaded farm (less the base drain).
    pub income: Rates,
    /// Fixed drain, live mode only.
    pub upkeep: Rates,
    pub starting_coins: f64,
    /// Ticks between farm spawns, live mode only. `None` disables spawning.
    pub farm_spawn_period: Option<u64>,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            income: Rates::new(1.0, 10.0),
            upkeep: Rates::new(0.1, 1.0),
            starting_coins: 0.0,
            farm_spawn_period: None,
        }
    }
}

/// A random heat point present when the level starts. It moves with the
/// level's wind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InitialHeat {
    pub pos: Vec2,
    pub strength: f64,
}

/// Everything needed to set up a level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    pub name: String,
    pub seed: u64,
    pub world: WorldConfig,
    pub entities: Vec<Entity>,
    /// Field cells per second.
    pub wind: Vec2,
    pub initial_heat: Vec<InitialHeat>,
    pub spawner: SpawnerConfig,
    pub heat: HeatParams,
    pub temperature: TemperatureConfig,
    pub economy: EconomyConfig,
    pub evaluator: EvalOptions,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            name: String::from("untitled"),
            seed: 0,
            world: WorldConfig::default(),
            entities: Vec::new(),
            wind: Vec2::ZERO,
            initial_heat: Vec::new(),
            spawner: SpawnerConfig::default(),
            heat: HeatParams::default(),
            temperature: TemperatureConfig::default(),
            economy: EconomyConfig::default(),
            evaluator: EvalOptions::default(),
        }
    }
}

/// `Preview` only animates the weather and the income counter while the
/// player wires their graph. `Live` is the real game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelMode {
    #[default]
    Preview,
    Live,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LevelError {
    #[error(transparent)]
    World(#[from] WorldError),
    #[error("level value '{field}' must be finite (got {value})")]
    NonFinite { field: &'static str, value: f64 },
}

// ===========================================================================
// Built-in levels
// ===========================================================================

/// The first level: one sensor, one farm, one controller, and heat blowing
/// in from the right edge.
pub fn level_one(target_fps: f64) -> LevelConfig {
    let origin = Vec2::new(150.0, 50.0);
    LevelConfig {
        name: String::from("level one"),
        seed: 1,
        world: WorldConfig {
            target_fps,
            rows: 10,
            columns: 10,
            resolution: 10,
            target_score: 200.0,
        },
        entities: vec![
            Entity::sensor(0, Vec2::new(5.0, 5.0), 20.0),
            Entity::farm(1, Vec2::new(4.0, 5.0)),
            Entity::controller(2, Vec2::new(4.0, 4.0)),
        ],
        wind: Vec2::new(-20.0, 0.0),
        initial_heat: vec![InitialHeat {
            pos: origin,
            strength: 20.0,
        }],
        spawner: SpawnerConfig::FixedOrigin { origin },
        heat: HeatParams {
            frequency: 1.0 / 100.0,
            ..HeatParams::default()
        },
        temperature: TemperatureConfig {
            base_band: TemperatureBand::new(18.0, 24.0),
            sample_scale: Vec2::splat(0.05),
        },
        economy: EconomyConfig::default(),
        evaluator: EvalOptions::default(),
    }
}

// ===========================================================================
// Builder
// ===========================================================================

fn finite(field: &'static str, value: f64) -> Result<f64, LevelError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(LevelError::NonFinite { field, value })
    }
}

/// The initial snapshot for `config`: entities placed, wind scaled to
/// cells per tick, starting heat points in place, field still all zero.
pub fn initial_state(config: &LevelConfig) -> Result<WorldState, LevelError> {
    let fps = config.world.target_fps;
    let wind = Vec2::new(finite("wind.x", config.wind.x)?, finite("wind.y", config.wind.y)?);
    let coins = finite("economy.starting_coins", config.economy.starting_coins)?;

    let state = WorldState::new(config.world, config.seed)?;
    let wind = wind / fps;
    let heat_points = config
        .initial_heat
        .iter()
        .map(|h| HeatPoint::random(h.pos, wind, h.strength))
        .collect();

    Ok(state
        .with_entities(config.entities.clone())?
        .with_wind(wind)
        .with_heat_points(heat_points)
        .with_coins(coins))
}

/// The ordered step list for `mode`.
///
/// Preview: heat points, temperature, farm income. Live adds farm spawning
/// (when configured), upkeep, the controller graph (when given), and the
/// win and loss checks.
pub fn build_pipeline(config: &LevelConfig, mode: LevelMode, graph: Option<CodeGraph>) -> Pipeline {
    let fps = config.world.target_fps;
    let noise = NoiseField::new(SimRng::new(config.seed).next_u64());
    let income = config.economy.income.per_tick(fps);

    let mut pipeline = Pipeline::new()
        .with_step(HeatPointStep::new(config.spawner.build(), config.heat))
        .with_step(TemperatureStep::new(noise, config.temperature, config.heat))
        .with_step(FarmIncome::new(income.coins, income.score));

    if mode == LevelMode::Live {
        if let Some(period) = config.economy.farm_spawn_period {
            pipeline.push(Box::new(FarmSpawning::new(period)));
        }
        let upkeep = config.economy.upkeep.per_tick(fps);
        pipeline.push(Box::new(Upkeep {
            coins: upkeep.coins,
            score: upkeep.score,
        }));
        if let Some(graph) = graph {
            pipeline.push(Box::new(GraphStep::with_options(graph, config.evaluator)));
        }
        pipeline.push(Box::new(WinCheck));
        pipeline.push(Box::new(LossCheck::default()));
    }
    pipeline
}

/// Assemble a ready-to-step engine for `config`.
pub fn build_level(config: &LevelConfig, mode: LevelMode, graph: Option<CodeGraph>) -> Result<Engine, LevelError> {
    let state = initial_state(config)?;
    let pipeline = build_pipeline(config, mode, graph);
    log::info!(
        "level '{}' ready in {:?} mode: {}",
        config.name,
        mode,
        pipeline.names().join(" -> ")
    );
    Ok(Engine::new(state, pipeline))
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use heatwire_core::entity::EntityKind;
    use heatwire_core::event::{LossReason, SimEvent};
    use heatwire_logic::graph::GraphBuilder;

    fn always_on() -> CodeGraph {
        GraphBuilder::new()
            .literal("on", 1.0)
            .controller("c", heatwire_core::entity::EntityId(2))
            .connect("on", "out", "c", "in")
            .build()
            .unwrap()
    }

    #[test]
    fn level_one_layout() {
        let level = level_one(12.0);
        assert_eq!(level.world.field_width(), 100);
        assert_eq!(level.entities.len(), 3);
        assert_eq!(level.entities[0].kind, EntityKind::Sensor);
        assert_eq!(level.entities[0].data.radius, Some(20.0));
        assert_eq!(level.world.target_score, 200.0);
    }

    #[test]
    fn initial_state_scales_wind_by_fps() {
        let state = initial_state(&level_one(10.0)).unwrap();
        assert_eq!(state.wind, Vec2::new(-2.0, 0.0));
        assert_eq!(state.heat_points, vec![HeatPoint::random(Vec2::new(150.0, 50.0), Vec2::new(-2.0, 0.0), 20.0)]);
        assert_eq!(state.entities.len(), 3);
        assert_eq!(state.time, 0);
        assert_eq!(state.coins, 0.0);
    }

    #[test]
    fn initial_state_rejects_bad_config() {
        let mut level = level_one(12.0);
        level.world.rows = 0;
        assert!(matches!(initial_state(&level), Err(LevelError::World(WorldError::EmptyGrid { .. }))));

        let mut level = level_one(12.0);
        level.entities.push(Entity::farm(1, Vec2::new(1.0, 1.0)));
        assert!(matches!(
            initial_state(&level),
            Err(LevelError::World(WorldError::DuplicateEntityId(_)))
        ));

        let mut level = level_one(12.0);
        level.wind = Vec2::new(f64::NAN, 0.0);
        assert!(matches!(initial_state(&level), Err(LevelError::NonFinite { field: "wind.x", .. })));
    }

    #[test]
    fn preview_pipeline_order() {
        let pipeline = build_pipeline(&level_one(12.0), LevelMode::Preview, Some(always_on()));
        assert_eq!(pipeline.names(), vec!["heat_points", "temperature", "farm_income"]);
    }

    #[test]
    fn live_pipeline_order() {
        let pipeline = build_pipeline(&level_one(12.0), LevelMode::Live, Some(always_on()));
        assert_eq!(
            pipeline.names(),
            vec!["heat_points", "temperature", "farm_income", "upkeep", "graph", "win_check", "loss_check"]
        );

        let pipeline = build_pipeline(&level_one(12.0), LevelMode::Live, None);
        assert!(!pipeline.names().contains(&"graph"));
    }

    #[test]
    fn live_pipeline_with_farm_spawning() {
        let mut level = level_one(12.0);
        level.economy.farm_spawn_period = Some(60);
        let pipeline = build_pipeline(&level, LevelMode::Live, None);
        assert_eq!(pipeline.names()[3], "farm_spawning");
    }

    #[test]
    fn preview_earns_income() {
        let mut engine = build_level(&level_one(10.0), LevelMode::Preview, None).unwrap();
        engine.run(10);
        let state = engine.state();
        assert_eq!(state.time, 10);
        // One farm, no pins: (1 - 0.1) * 1/10 coins per tick.
        assert!((state.coins - 0.9).abs() < 1e-9, "coins = {}", state.coins);
        assert!((state.score - 9.0).abs() < 1e-9, "score = {}", state.score);
        assert!(!state.game_finished);
    }

    #[test]
    fn live_level_places_controller_pin() {
        let mut engine = build_level(&level_one(10.0), LevelMode::Live, Some(always_on())).unwrap();
        engine.step();
        assert_eq!(engine.state().active_controller_count(), 1);
    }

    #[test]
    fn always_on_controller_bankrupts() {
        // With the only farm shaded the income is negative from the first tick.
        let mut engine = build_level(&level_one(10.0), LevelMode::Live, Some(always_on())).unwrap();
        let result = engine.run(50);
        assert!(result.finished);
        assert!(engine.state().is_game_over);
        assert!(matches!(
            engine.last_events().last(),
            Some(SimEvent::GameLost {
                reason: LossReason::Bankrupt { .. },
                ..
            })
        ));
    }

    #[test]
    fn config_survives_ron() {
        let level = level_one(12.0);
        let text = ron::to_string(&level).unwrap();
        let back: LevelConfig = ron::from_str(&text).unwrap();
        assert_eq!(back, level);
    }
}
