//! Bridge between the evaluator and the `heatwire-core` pipeline.
//!
//! [`GraphStep`] owns a [`CodeGraph`] and implements
//! [`heatwire_core::pipeline::Simulation`], so the player's program runs
//! once per tick between the economy and the win/loss checks.

use heatwire_core::event::SimEvent;
use heatwire_core::pipeline::{Simulation, StepContext};
use heatwire_core::world::WorldState;

use crate::evaluator::{EvalOptions, Outcome, evaluate};
use crate::graph::CodeGraph;

/// A pipeline step that evaluates a controller graph.
///
/// A fatal evaluation error means "no graph effect this tick": the heat
/// points are left as they were, a [`SimEvent::GraphFailed`] is recorded and
/// a warning is logged. Timeouts keep whatever pins were placed.
#[derive(Debug, Clone)]
pub struct GraphStep {
    graph: CodeGraph,
    options: EvalOptions,
}

impl GraphStep {
    pub fn new(graph: CodeGraph) -> Self {
        Self::with_options(graph, EvalOptions::default())
    }

    pub fn with_options(graph: CodeGraph, options: EvalOptions) -> Self {
        Self { graph, options }
    }

    pub fn graph(&self) -> &CodeGraph {
        &self.graph
    }

    pub fn options(&self) -> &EvalOptions {
        &self.options
    }
}

impl Simulation for GraphStep {
    fn name(&self) -> &str {
        "graph"
    }

    fn apply(&self, prev: &WorldState, ctx: &mut StepContext) -> WorldState {
        let tick = ctx.tick();
        let eval = match evaluate(&self.graph, prev, &self.options) {
            Ok(eval) => eval,
            Err(e) => {
                log::warn!("controller graph failed at tick {tick}: {e}");
                ctx.emit(SimEvent::GraphFailed {
                    tick,
                    message: e.to_string(),
                });
                return prev.clone();
            }
        };

        for switch in &eval.switches {
            log::debug!(
                "controller {} {}",
                switch.controller,
                if switch.active { "engaged" } else { "released" }
            );
            ctx.emit(SimEvent::ControllerSwitched {
                tick,
                controller: switch.controller,
                active: switch.active,
            });
        }

        match eval.outcome {
            Outcome::Converged { iterations } => {
                log::debug!("graph settled after {iterations} rounds");
                ctx.emit(SimEvent::GraphSettled { tick, iterations });
            }
            Outcome::TimedOut { iterations, elapsed } => {
                log::warn!("graph did not settle: {iterations} rounds in {elapsed:?}");
                ctx.emit(SimEvent::GraphTimedOut {
                    tick,
                    iterations,
                    elapsed,
                });
            }
        }

        WorldState {
            heat_points: eval.heat_points,
            ..prev.clone()
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
