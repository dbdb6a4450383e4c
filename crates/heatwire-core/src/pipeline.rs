//! Ordered list of pure world-state transitions run once per tick.
//!
//! Each step implements [`Simulation`]: it receives the previous snapshot by
//! reference and returns a new one, appending any [`SimEvent`]s to the
//! shared [`StepContext`]. The pipeline is composed once at level setup and
//! re-run in the same order every tick by the [`Engine`](crate::engine::Engine).

use crate::event::SimEvent;
use crate::world::WorldState;

// ---------------------------------------------------------------------------
// Simulation trait
// ---------------------------------------------------------------------------

/// A pure `WorldState -> WorldState` step.
///
/// Steps must not keep state between calls: anything that has to survive a
/// tick (RNG state, spawn schedules) lives in the world snapshot.
pub trait Simulation: std::fmt::Debug {
    /// The human-readable name of this step, used for lookup and debugging.
    fn name(&self) -> &str;

    /// Produce the next snapshot from `prev`.
    fn apply(&self, prev: &WorldState, ctx: &mut StepContext) -> WorldState;
}

// ---------------------------------------------------------------------------
// StepContext
// ---------------------------------------------------------------------------

/// Per-tick scratch shared by all steps of one pipeline run.
#[derive(Debug, Default)]
pub struct StepContext {
    tick: u64,
    events: Vec<SimEvent>,
}

impl StepContext {
    pub fn new(tick: u64) -> Self {
        Self {
            tick,
            events: Vec::new(),
        }
    }

    /// The tick being computed.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn emit(&mut self, event: SimEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<SimEvent> {
        self.events
    }
}

// ---------------------------------------------------------------------------
// FnStep
// ---------------------------------------------------------------------------

/// Adapts a plain function into a step, for one-off transitions.
pub struct FnStep<F> {
    name: String,
    f: F,
}

impl<F> FnStep<F>
where
    F: Fn(&WorldState) -> WorldState,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> std::fmt::Debug for FnStep<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnStep").field("name", &self.name).finish()
    }
}

impl<F> Simulation for FnStep<F>
where
    F: Fn(&WorldState) -> WorldState,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, prev: &WorldState, _ctx: &mut StepContext) -> WorldState {
        (self.f)(prev)
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct Pipeline {
    steps: Vec<Box<dyn Simulation>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step (builder style).
    pub fn with_step(mut self, step: impl Simulation + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    pub fn push(&mut self, step: Box<dyn Simulation>) {
        self.steps.push(step);
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Thread `state` through every step in order.
    pub fn run(&self, state: &WorldState) -> (WorldState, Vec<SimEvent>) {
        let mut ctx = StepContext::new(state.time);
        let mut current = state.clone();
        for step in &self.steps {
            current = step.apply(&current, &mut ctx);
        }
        (current, ctx.into_events())
    }
}

// ===========================================================================
// Tests
// ===========================================================================
