//! Heat sources and their effect on the temperature field.
//!
//! Two kinds of heat point exist:
//!
//! - **Random** blobs drift with the wind. Their contribution decays
//!   exponentially with distance, and they are dropped once their beam no
//!   longer crosses the simulation bounds.
//! - **Controller** pins sit on a controller entity. They add no heat;
//!   instead they clamp everything within `strength` cells into the
//!   comfort band. Only the graph evaluator adds or removes them.

use serde::{Deserialize, Serialize};

use crate::event::SimEvent;
use crate::math::ray_intersects_box;
use crate::pipeline::{Simulation, StepContext};
use crate::rng::SimRng;
use crate::vec2::Vec2;
use crate::world::WorldState;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeatSource {
    Random,
    Controller,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeatPoint {
    /// Position in fine field coordinates.
    pub pos: Vec2,
    pub vel: Vec2,
    /// Peak temperature delta for random points; hard radius for
    /// controller points.
    pub strength: f64,
    pub source: HeatSource,
}

impl HeatPoint {
    pub fn random(pos: Vec2, vel: Vec2, strength: f64) -> Self {
        Self {
            pos,
            vel,
            strength,
            source: HeatSource::Random,
        }
    }

    pub fn controller(pos: Vec2, radius: f64) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            strength: radius,
            source: HeatSource::Controller,
        }
    }

    pub fn is_controller(&self) -> bool {
        self.source == HeatSource::Controller
    }
}

/// Closed temperature interval `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureBand {
    pub min: f64,
    pub max: f64,
}

impl TemperatureBand {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }

    /// Point at fraction `t` (0..=1) across the band.
    pub fn at(&self, t: f64) -> f64 {
        self.min + t * (self.max - self.min)
    }
}

/// Temperatures farms tolerate, and the band controller pins enforce.
pub const COMFORT_BAND: TemperatureBand = TemperatureBand::new(18.0, 24.0);

/// Tuning for random heat points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatParams {
    /// Mean spawns per tick.
    pub frequency: f64,
    pub max_strength: f64,
    /// Contribution below which a heat point is ignored.
    pub min_effect: f64,
    /// Exponential decay per field cell of distance.
    pub decay_rate: f64,
}

impl Default for HeatParams {
    fn default() -> Self {
        Self {
            frequency: 1.0 / 360.0,
            max_strength: 10.0,
            min_effect: 0.001,
            decay_rate: 0.2,
        }
    }
}

// ---------------------------------------------------------------------------
// Pure model
// ---------------------------------------------------------------------------

/// Distance beyond which a heat point's contribution is negligible.
///
/// Random points: `-ln(|min_effect / strength|) / decay_rate`, never below
/// zero. Controller points: `|strength|`.
pub fn effective_radius(point: &HeatPoint, min_effect: f64, decay_rate: f64) -> f64 {
    match point.source {
        HeatSource::Random => {
            if point.strength == 0.0 {
                return 0.0;
            }
            let radius = -(min_effect / point.strength).abs().ln() / decay_rate;
            radius.max(0.0)
        }
        HeatSource::Controller => point.strength.abs(),
    }
}

/// Combine a base temperature with heat points at `coord`.
///
/// Random points are summed first. Controller points then clamp the
/// running value into [`COMFORT_BAND`] when `coord` lies within their
/// radius. Callers decide which points are in range for random sources.
pub fn apply_heat_points<'a, I>(points: I, coord: Vec2, base: f64, decay_rate: f64) -> f64
where
    I: Iterator<Item = &'a HeatPoint> + Clone,
{
    let mut value = base;
    for p in points.clone().filter(|p| p.source == HeatSource::Random) {
        value += p.strength * (-(p.pos - coord).length() * decay_rate).exp();
    }
    for p in points.filter(|p| p.source == HeatSource::Controller) {
        if (p.pos - coord).sqr_length() > p.strength * p.strength {
            continue;
        }
        value = COMFORT_BAND.clamp(value);
    }
    value
}

/// Temperature at `coord` given its noise base value and every active heat
/// point. Points outside their effective radius are skipped.
pub fn sample_temperature(coord: Vec2, base: f64, heat_points: &[HeatPoint], params: &HeatParams) -> f64 {
    let in_range = |p: &&HeatPoint| {
        let r = effective_radius(p, params.min_effect, params.decay_rate);
        r * r >= (p.pos - coord).sqr_length()
    };
    apply_heat_points(heat_points.iter().filter(in_range), coord, base, params.decay_rate)
}

/// Does the thick beam swept by a random point still cross the box
/// `[0, bounds]`?
///
/// Three rays along the velocity approximate the beam: one through the
/// point (started one radius behind it) and two offset sideways by the
/// effective radius.
pub fn beam_in_bounds(point: &HeatPoint, bounds: Vec2, params: &HeatParams) -> bool {
    let radius = effective_radius(point, params.min_effect, params.decay_rate);
    let dir = point.vel.normalize();
    let side = dir.perpendicular() * radius;
    let (lo, hi) = (Vec2::ZERO, bounds);

    ray_intersects_box(point.pos - dir * radius, point.vel, lo, hi)
        || ray_intersects_box(point.pos + side, point.vel, lo, hi)
        || ray_intersects_box(point.pos - side, point.vel, lo, hi)
}

/// Move every random point by its velocity, dropping those whose beam has
/// left the bounds. Controller points pass through untouched.
pub fn advance_heat_points(prev: &[HeatPoint], bounds: Vec2, params: &HeatParams) -> Vec<HeatPoint> {
    prev.iter()
        .filter_map(|p| match p.source {
            HeatSource::Controller => Some(*p),
            HeatSource::Random => beam_in_bounds(p, bounds, params).then(|| HeatPoint {
                pos: p.pos + p.vel,
                ..*p
            }),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Spawners
// ---------------------------------------------------------------------------

/// Placement of a freshly spawned random heat point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnedHeat {
    pub pos: Vec2,
    pub vel: Vec2,
    pub strength: f64,
}

/// Decides where a new random heat point appears.
pub trait HeatSpawner: std::fmt::Debug {
    fn spawn(&self, state: &WorldState, rng: &mut SimRng, params: &HeatParams) -> SpawnedHeat;
}

/// Picks a random point in the field and pushes it upwind by the mean
/// inter-arrival distance so it drifts in from outside.
#[derive(Debug, Clone, Copy, Default)]
pub struct DriftSpawner;

impl HeatSpawner for DriftSpawner {
    fn spawn(&self, state: &WorldState, rng: &mut SimRng, params: &HeatParams) -> SpawnedHeat {
        let jitter = Vec2::new(rng.next_f64(), rng.next_f64());
        let pos = state.config.field_dimensions().scale(jitter) - state.wind / params.frequency;
        SpawnedHeat {
            pos,
            vel: state.wind,
            strength: rng.next_f64() * params.max_strength,
        }
    }
}

/// Always spawns at the same point, moving with the wind.
#[derive(Debug, Clone, Copy)]
pub struct FixedOriginSpawner {
    pub origin: Vec2,
}

impl HeatSpawner for FixedOriginSpawner {
    fn spawn(&self, state: &WorldState, rng: &mut SimRng, params: &HeatParams) -> SpawnedHeat {
        SpawnedHeat {
            pos: self.origin,
            vel: state.wind,
            strength: rng.next_f64() * params.max_strength,
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline step
// ---------------------------------------------------------------------------

/// Advances random heat points and spawns new ones on an exponential
/// schedule.
#[derive(Debug)]
pub struct HeatPointStep {
    spawner: Box<dyn HeatSpawner>,
    params: HeatParams,
}

impl HeatPointStep {
    pub fn new(spawner: Box<dyn HeatSpawner>, params: HeatParams) -> Self {
        Self { spawner, params }
    }

    pub fn params(&self) -> &HeatParams {
        &self.params
    }
}

impl Simulation for HeatPointStep {
    fn name(&self) -> &str {
        "heat_points"
    }

    fn apply(&self, prev: &WorldState, ctx: &mut StepContext) -> WorldState {
        let bounds = prev.config.field_dimensions();
        let mut heat_points = advance_heat_points(&prev.heat_points, bounds, &self.params);
        let mut rng = prev.rng.clone();
        let mut next_heat_point = prev.next_heat_point;

        if prev.time >= prev.next_heat_point {
            let spawned = self.spawner.spawn(prev, &mut rng, &self.params);
            let wait = rng.exponential(self.params.frequency).floor() as u64;
            next_heat_point = prev.time.saturating_add(wait);

            log::info!(
                "heat point spawned at {} (strength {:.2}), next due at tick {}",
                spawned.pos,
                spawned.strength,
                next_heat_point
            );
            ctx.emit(SimEvent::HeatPointSpawned {
                tick: prev.time,
                pos: spawned.pos,
                strength: spawned.strength,
            });
            heat_points.push(HeatPoint::random(spawned.pos, spawned.vel, spawned.strength));
        }

        WorldState {
            heat_points,
            next_heat_point,
            rng,
            ..prev.clone()
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
