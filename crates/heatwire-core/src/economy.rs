//! Coins, score and farm placement.

use crate::entity::Entity;
use crate::event::SimEvent;
use crate::pipeline::{Simulation, StepContext};
use crate::vec2::Vec2;
use crate::world::WorldState;

/// Income not offset by farms, charged every tick.
const BASE_DRAIN: f64 = 0.1;

// ---------------------------------------------------------------------------
// Income
// ---------------------------------------------------------------------------

/// Accrues `(farms - active_controllers - 0.1) * rate` into coins and
/// score. A farm held down by a controller pin earns nothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FarmIncome {
    pub coin_rate: f64,
    pub score_rate: f64,
}

impl FarmIncome {
    pub fn new(coin_rate: f64, score_rate: f64) -> Self {
        Self {
            coin_rate,
            score_rate,
        }
    }

    /// Net earning units for a snapshot.
    pub fn delta(state: &WorldState) -> f64 {
        state.farm_count() as f64 - state.active_controller_count() as f64 - BASE_DRAIN
    }
}

impl Simulation for FarmIncome {
    fn name(&self) -> &str {
        "farm_income"
    }

    fn apply(&self, prev: &WorldState, _ctx: &mut StepContext) -> WorldState {
        let delta = Self::delta(prev);
        WorldState {
            coins: prev.coins + delta * self.coin_rate,
            score: prev.score + delta * self.score_rate,
            ..prev.clone()
        }
    }
}

// ---------------------------------------------------------------------------
// Upkeep
// ---------------------------------------------------------------------------

/// Fixed drain on coins and score every tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Upkeep {
    pub coins: f64,
    pub score: f64,
}

impl Simulation for Upkeep {
    fn name(&self) -> &str {
        "upkeep"
    }

    fn apply(&self, prev: &WorldState, _ctx: &mut StepContext) -> WorldState {
        WorldState {
            coins: prev.coins - self.coins,
            score: prev.score - self.score,
            ..prev.clone()
        }
    }
}

// ---------------------------------------------------------------------------
// Farm spawning
// ---------------------------------------------------------------------------

/// Places a new farm every `period` ticks.
///
/// Candidates are free cells off the grid border, ordered by distance from
/// the grid centre. Candidate `i` is drawn with weight `exp(-i)`, so farms
/// cluster near the middle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FarmSpawning {
    pub period: u64,
}

impl FarmSpawning {
    pub fn new(period: u64) -> Self {
        Self { period }
    }

    /// Free interior cells sorted by squared distance to the centre.
    pub fn candidates(state: &WorldState) -> Vec<Vec2> {
        let columns = state.config.columns;
        let rows = state.config.rows;
        let middle = state.config.grid_dimensions() * 0.5;

        let mut cells: Vec<Vec2> = (1..columns.saturating_sub(1))
            .flat_map(|x| (1..rows.saturating_sub(1)).map(move |y| Vec2::new(x as f64, y as f64)))
            .filter(|&p| !state.entities.occupies(p))
            .collect();
        // Stable sort keeps column-major order among equal distances.
        cells.sort_by(|a, b| (*a - middle).sqr_length().total_cmp(&(*b - middle).sqr_length()));
        cells
    }
}

/// Index of the first weight whose running sum exceeds `r`.
fn pick_weighted(weights: &[f64], r: f64) -> usize {
    let mut acc = 0.0;
    for (i, w) in weights.iter().enumerate() {
        acc += w;
        if acc > r {
            return i;
        }
    }
    weights.len().saturating_sub(1)
}

impl Simulation for FarmSpawning {
    fn name(&self) -> &str {
        "farm_spawning"
    }

    fn apply(&self, prev: &WorldState, ctx: &mut StepContext) -> WorldState {
        if self.period == 0 || prev.time % self.period != 0 {
            return prev.clone();
        }
        let candidates = Self::candidates(prev);
        if candidates.is_empty() {
            log::debug!("no free cell for a new farm at tick {}", prev.time);
            return prev.clone();
        }

        let weights: Vec<f64> = (0..candidates.len()).map(|i| (-(i as f64)).exp()).collect();
        let total: f64 = weights.iter().sum();
        let mut rng = prev.rng.clone();
        let pos = candidates[pick_weighted(&weights, rng.next_f64() * total)];

        let id = prev.entities.next_id();
        let entities = match prev.entities.with_entity(Entity::farm(id.0, pos)) {
            Ok(entities) => entities,
            Err(e) => {
                log::warn!("farm spawn skipped: {e}");
                return prev.clone();
            }
        };
        log::info!("farm {id} spawned at {pos}");
        ctx.emit(SimEvent::FarmSpawned {
            tick: prev.time,
            id,
            pos,
        });

        WorldState {
            entities,
            rng,
            ..prev.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{EntityId, EntityKind};
    use crate::heat::HeatPoint;
    use crate::test_utils::*;

    #[test]
    fn income_counts_farms_minus_pins() {
        // Two farms, no pins, coin rate 0.01: (2 - 0 - 0.1) * 0.01.
        let world = basic_world()
            .with_entities(vec![Entity::farm(1, Vec2::new(1.0, 1.0)), Entity::farm(2, Vec2::new(2.0, 2.0))])
            .unwrap();
        let next = FarmIncome::new(0.01, 0.1).apply(&world, &mut StepContext::new(0));
        assert!((next.coins - 0.019).abs() < 1e-12);
        assert!((next.score - 0.19).abs() < 1e-12);
    }

    #[test]
    fn active_pin_cancels_a_farm() {
        let world = basic_world()
            .with_entities(vec![Entity::farm(1, Vec2::new(1.0, 1.0)), Entity::controller(2, Vec2::new(3.0, 3.0))])
            .unwrap()
            .with_heat_points(vec![HeatPoint::controller(Vec2::new(35.0, 35.0), 25.0)]);
        assert!((FarmIncome::delta(&world) + 0.1).abs() < 1e-12);
        let next = FarmIncome::new(1.0, 1.0).apply(&world, &mut StepContext::new(0));
        assert!(next.coins < 0.0);
    }

    #[test]
    fn upkeep_drains_both_counters() {
        let world = basic_world().with_coins(1.0);
        let next = Upkeep { coins: 0.25, score: 2.0 }.apply(&world, &mut StepContext::new(0));
        assert_eq!(next.coins, 0.75);
        assert_eq!(next.score, -2.0);
    }

    #[test]
    fn candidates_skip_border_and_occupied_cells() {
        let world = basic_world()
            .with_entities(vec![Entity::farm(1, Vec2::new(5.0, 5.0))])
            .unwrap();
        let cells = FarmSpawning::candidates(&world);
        // 8x8 interior minus the occupied cell.
        assert_eq!(cells.len(), 63);
        assert!(!cells.contains(&Vec2::new(5.0, 5.0)));
        assert!(cells.iter().all(|p| p.x >= 1.0 && p.x <= 8.0 && p.y >= 1.0 && p.y <= 8.0));
        // Nearest to the centre (5, 5) come first.
        let d0 = (cells[0] - Vec2::splat(5.0)).sqr_length();
        assert!(cells.iter().all(|p| (*p - Vec2::splat(5.0)).sqr_length() >= d0));
    }

    #[test]
    fn weighted_pick_takes_first_exceeding_index() {
        let weights = [1.0, 0.5, 0.25];
        assert_eq!(pick_weighted(&weights, 0.0), 0);
        assert_eq!(pick_weighted(&weights, 0.99), 0);
        assert_eq!(pick_weighted(&weights, 1.2), 1);
        assert_eq!(pick_weighted(&weights, 1.6), 2);
        assert_eq!(pick_weighted(&weights, 10.0), 2);
    }

    #[test]
    fn spawns_on_period_and_keeps_existing_entities() {
        let world = basic_world()
            .with_entities(vec![
                Entity::sensor(0, Vec2::new(5.0, 5.0), 20.0),
                Entity::farm(3, Vec2::new(4.0, 5.0)),
            ])
            .unwrap();
        let mut ctx = StepContext::new(world.time);
        let next = FarmSpawning::new(10).apply(&world, &mut ctx);

        assert_eq!(next.entities.len(), 3);
        assert_eq!(next.farm_count(), 2);
        assert_eq!(next.entities.count(EntityKind::Sensor), 1);
        let spawned = next
            .entities
            .find(EntityId(4), EntityKind::Farm)
            .expect("new farm id follows the largest");
        assert!(!world.entities.occupies(spawned.pos));
        assert!(matches!(ctx.events(), [SimEvent::FarmSpawned { .. }]));
    }

    #[test]
    fn off_period_ticks_do_nothing() {
        let mut world = basic_world();
        world.time = 7;
        let next = FarmSpawning::new(10).apply(&world, &mut StepContext::new(7));
        assert_eq!(next, world);
    }
}
