//! Events recorded by pipeline steps during a tick.
//!
//! Steps append to the [`StepContext`](crate::pipeline::StepContext) they
//! are handed; the engine keeps the list for the most recent tick so a
//! renderer or test can see what happened without diffing snapshots.

use std::time::Duration;

use crate::entity::EntityId;
use crate::vec2::Vec2;

#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    /// A random heat point entered the simulation.
    HeatPointSpawned { tick: u64, pos: Vec2, strength: f64 },
    /// A farm was placed on the grid.
    FarmSpawned { tick: u64, id: EntityId, pos: Vec2 },
    /// A controller's pin was (re)applied or removed by the graph.
    ControllerSwitched {
        tick: u64,
        controller: EntityId,
        active: bool,
    },
    /// The controller graph reached a fixed point.
    GraphSettled { tick: u64, iterations: usize },
    /// The controller graph hit its time budget before settling.
    GraphTimedOut {
        tick: u64,
        iterations: usize,
        elapsed: Duration,
    },
    /// The controller graph failed; it had no effect this tick.
    GraphFailed { tick: u64, message: String },
    GameWon { tick: u64, score: f64 },
    GameLost { tick: u64, reason: LossReason },
}

#[derive(Debug, Clone, PartialEq)]
pub enum LossReason {
    Bankrupt { coins: f64 },
    FarmOutOfBand { farm: EntityId, temperature: f64 },
}

impl std::fmt::Display for LossReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LossReason::Bankrupt { coins } => write!(f, "out of coins ({coins:.2})"),
            LossReason::FarmOutOfBand { farm, temperature } => {
                write!(f, "farm {farm} reached {temperature:.1} degrees")
            }
        }
    }
}
