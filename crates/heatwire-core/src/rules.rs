//! Terminal-state detectors. They only set flags; the engine stops
//! stepping once `game_finished` is true.

use crate::entity::{Entity, EntityKind};
use crate::event::{LossReason, SimEvent};
use crate::heat::{COMFORT_BAND, TemperatureBand};
use crate::pipeline::{Simulation, StepContext};
use crate::world::WorldState;

/// Score strictly above `config.target_score` wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct WinCheck;

impl Simulation for WinCheck {
    fn name(&self) -> &str {
        "win_check"
    }

    fn apply(&self, prev: &WorldState, ctx: &mut StepContext) -> WorldState {
        if prev.score <= prev.config.target_score {
            return prev.clone();
        }
        log::info!("level won at tick {} with score {:.2}", prev.time, prev.score);
        ctx.emit(SimEvent::GameWon {
            tick: prev.time,
            score: prev.score,
        });
        WorldState {
            is_game_over: false,
            game_finished: true,
            ..prev.clone()
        }
    }
}

/// Loses on negative coins, or on any farm cell outside the tolerated band.
#[derive(Debug, Clone, Copy)]
pub struct LossCheck {
    pub band: TemperatureBand,
}

impl Default for LossCheck {
    fn default() -> Self {
        Self { band: COMFORT_BAND }
    }
}

impl LossCheck {
    /// First reason the snapshot is lost, if any.
    pub fn loss_reason(&self, state: &WorldState) -> Option<LossReason> {
        if state.coins < 0.0 {
            return Some(LossReason::Bankrupt { coins: state.coins });
        }
        state
            .entities
            .of_kind(EntityKind::Farm)
            .find_map(|farm| self.out_of_band(state, farm))
    }

    fn out_of_band(&self, state: &WorldState, farm: &Entity) -> Option<LossReason> {
        state
            .temp
            .block(farm.pos, state.config.resolution)
            .find(|&t| !self.band.contains(t))
            .map(|temperature| LossReason::FarmOutOfBand {
                farm: farm.id,
                temperature,
            })
    }
}

impl Simulation for LossCheck {
    fn name(&self) -> &str {
        "loss_check"
    }

    fn apply(&self, prev: &WorldState, ctx: &mut StepContext) -> WorldState {
        let Some(reason) = self.loss_reason(prev) else {
            return prev.clone();
        };
        log::info!("level lost at tick {}: {reason}", prev.time);
        ctx.emit(SimEvent::GameLost {
            tick: prev.time,
            reason,
        });
        WorldState {
            is_game_over: true,
            game_finished: true,
            ..prev.clone()
        }
    }
}
