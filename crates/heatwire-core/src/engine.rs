//! The tick driver: owns the current snapshot and the pipeline that
//! advances it.
//!
//! # Tick
//!
//! Each `step()`:
//! 1. Clones the current snapshot, advances `time` by one and drifts
//!    `sim_offset` by the wind.
//! 2. Runs every pipeline step in order on that snapshot.
//! 3. Replaces the current snapshot and keeps the tick's events.
//!
//! Once a step sets `game_finished`, further calls do nothing.

use std::time::Duration;

use crate::event::SimEvent;
use crate::pipeline::Pipeline;
use crate::world::WorldState;

/// Summary of one `step()` or `run()` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdvanceResult {
    /// Number of ticks actually executed.
    pub steps_run: u64,
    /// Whether the level reached a terminal state.
    pub finished: bool,
}

#[derive(Debug)]
pub struct Engine {
    state: WorldState,
    pipeline: Pipeline,
    last_events: Vec<SimEvent>,
    paused: bool,
}

impl Engine {
    pub fn new(state: WorldState, pipeline: Pipeline) -> Self {
        Self {
            state,
            pipeline,
            last_events: Vec::new(),
            paused: false,
        }
    }

    pub fn state(&self) -> &WorldState {
        &self.state
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Events recorded during the most recent tick.
    pub fn last_events(&self) -> &[SimEvent] {
        &self.last_events
    }

    /// Wall-clock time between ticks at the configured rate.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.state.config.target_fps)
    }

    pub fn is_finished(&self) -> bool {
        self.state.game_finished
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Hash of the current snapshot.
    pub fn state_hash(&self) -> u64 {
        self.state.state_hash()
    }

    /// Advance by one tick.
    pub fn step(&mut self) -> AdvanceResult {
        if self.paused || self.state.game_finished {
            return AdvanceResult {
                steps_run: 0,
                finished: self.state.game_finished,
            };
        }

        let mut next = self.state.clone();
        next.time += 1;
        next.sim_offset = next.sim_offset + next.wind;

        let (next, events) = self.pipeline.run(&next);
        log::trace!("tick {} produced {} events", next.time, events.len());
        self.state = next;
        self.last_events = events;

        AdvanceResult {
            steps_run: 1,
            finished: self.state.game_finished,
        }
    }

    /// Step until the level finishes or `max_ticks` have run.
    pub fn run(&mut self, max_ticks: u64) -> AdvanceResult {
        let mut result = AdvanceResult::default();
        for _ in 0..max_ticks {
            let step = self.step();
            result.steps_run += step.steps_run;
            result.finished = step.finished;
            if step.steps_run == 0 || step.finished {
                break;
            }
        }
        result
    }
}

// ===========================================================================
// Tests
// ===========================================================================
