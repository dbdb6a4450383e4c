//! Fixed-point evaluation of a controller graph against one snapshot.
//!
//! Each call starts from scratch: sensors sample the field once, then
//! signals are propagated round by round until the signal set stops
//! changing or the time budget runs out. The only effect on the world is
//! the list of controller heat pins.
//!
//! # Round
//!
//! 1. Every literal re-asserts its value on each outgoing edge whose target
//!    handle holds no signal yet.
//! 2. If the signal set equals the previous round's, evaluation has
//!    converged.
//! 3. Otherwise each node with incoming signals reacts, in authored order.
//!    A node whose output handle has no free edge left this round is
//!    blocked and passes its inputs through instead of dropping them.

use std::time::{Duration, Instant};

use heatwire_core::entity::{EntityId, EntityKind};
use heatwire_core::field::{cell_center, grid_cell};
use heatwire_core::heat::HeatPoint;
use heatwire_core::vec2::Vec2;
use heatwire_core::world::WorldState;
use serde::{Deserialize, Serialize};

use crate::graph::{CodeGraph, Node, NodeId, NodeKind};
use crate::signal::{Signal, is_claimed};

// ---------------------------------------------------------------------------
// Options and results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalOptions {
    /// Wall-clock budget for the fixed-point loop.
    pub timeout: Duration,
    /// Radius of the pin a controller places when activated.
    pub controller_strength: f64,
    /// Optional cap on rounds, checked alongside the timeout.
    pub max_iterations: Option<usize>,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(200),
            controller_strength: 25.0,
            max_iterations: None,
        }
    }
}

/// How the fixed-point loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The signal set stopped changing after `iterations` rounds.
    Converged { iterations: usize },
    /// The time budget (or round cap) ran out first. Pins placed so far
    /// are kept.
    TimedOut { iterations: usize, elapsed: Duration },
}

impl Outcome {
    pub fn iterations(&self) -> usize {
        match *self {
            Outcome::Converged { iterations } | Outcome::TimedOut { iterations, .. } => iterations,
        }
    }

    pub fn converged(&self) -> bool {
        matches!(self, Outcome::Converged { .. })
    }
}

/// A controller whose pin differs from the incoming snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerSwitch {
    pub controller: EntityId,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub heat_points: Vec<HeatPoint>,
    pub outcome: Outcome,
    pub switches: Vec<ControllerSwitch>,
    /// Signal set of the last round.
    pub signals: Vec<Signal>,
}

/// Fatal evaluation errors. Each names the offending node.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("sensor {entity} referenced by node '{node}' not present")]
    UnknownSensor { node: NodeId, entity: EntityId },
    #[error("sensor {entity} referenced by node '{node}' has no radius")]
    SensorWithoutRadius { node: NodeId, entity: EntityId },
    #[error("controller {entity} referenced by node '{node}' not present")]
    UnknownController { node: NodeId, entity: EntityId },
    #[error("incoming signal from '{from}.{from_handle}' to output-only node '{node}'")]
    SignalIntoSource {
        node: NodeId,
        from: NodeId,
        from_handle: String,
    },
    #[error("node '{node}' received a signal on unexpected handle '{handle}'")]
    UnexpectedHandle { node: NodeId, handle: String },
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Evaluate `graph` against `world` and return the resulting heat points.
pub fn evaluate(graph: &CodeGraph, world: &WorldState, options: &EvalOptions) -> Result<Evaluation, EvalError> {
    let start = Instant::now();
    let mut round = Round {
        graph,
        world,
        options,
        heat_points: world.heat_points.clone(),
        fired: Vec::new(),
    };

    let mut signals = seed_sensors(graph, world)?;
    let mut prior: Vec<Signal> = Vec::new();
    let mut iterations = 0;

    let outcome = loop {
        assert_literals(graph, &mut signals);
        if signals == prior {
            break Outcome::Converged { iterations };
        }

        let next = round.propagate(&signals)?;
        iterations += 1;
        prior = std::mem::replace(&mut signals, next);

        let elapsed = start.elapsed();
        let capped = options.max_iterations.is_some_and(|cap| iterations >= cap);
        if elapsed >= options.timeout || capped {
            // The last round may already have reached the fixed point.
            let mut settled = signals.clone();
            assert_literals(graph, &mut settled);
            if settled == prior {
                signals = settled;
                break Outcome::Converged { iterations };
            }
            break Outcome::TimedOut { iterations, elapsed };
        }
    };

    let switches = round.switches();
    Ok(Evaluation {
        heat_points: round.heat_points,
        outcome,
        switches,
        signals,
    })
}

/// Evaluate and return the snapshot with its heat points replaced.
pub fn apply_graph(graph: &CodeGraph, world: &WorldState, options: &EvalOptions) -> Result<(WorldState, Outcome), EvalError> {
    let eval = evaluate(graph, world, options)?;
    let next = WorldState {
        heat_points: eval.heat_points,
        ..world.clone()
    };
    Ok((next, eval.outcome))
}

/// Hottest field cell strictly within `radius` of the sensor's cell centre,
/// or negative infinity when the radius covers no cell.
pub fn sensor_reading(world: &WorldState, node: &NodeId, entity: EntityId) -> Result<f64, EvalError> {
    let sensor = world
        .entities
        .find(entity, EntityKind::Sensor)
        .ok_or_else(|| EvalError::UnknownSensor {
            node: node.clone(),
            entity,
        })?;
    let radius = sensor.data.radius.ok_or_else(|| EvalError::SensorWithoutRadius {
        node: node.clone(),
        entity,
    })?;
    let center = cell_center(sensor.pos, world.config.resolution).floor();
    Ok(world.temp.max_within(center, radius).unwrap_or(f64::NEG_INFINITY))
}

// ---------------------------------------------------------------------------
// Rounds
// ---------------------------------------------------------------------------

fn seed_sensors(graph: &CodeGraph, world: &WorldState) -> Result<Vec<Signal>, EvalError> {
    let mut signals = Vec::new();
    for node in graph.nodes() {
        let NodeKind::Sensor { entity } = node.kind else {
            continue;
        };
        let value = sensor_reading(world, &node.id, entity)?;
        log::trace!("sensor node '{}' reads {value}", node.id);
        for edge in graph.outgoing(&node.id) {
            let handle = node.output().unwrap_or(&edge.from_handle);
            signals.push(Signal::along(edge, handle, value));
        }
    }
    Ok(signals)
}

fn assert_literals(graph: &CodeGraph, signals: &mut Vec<Signal>) {
    for node in graph.nodes() {
        let NodeKind::Literal { value } = node.kind else {
            continue;
        };
        for edge in graph.outgoing(&node.id) {
            if is_claimed(signals, &edge.to, &edge.to_handle) {
                continue;
            }
            let handle = node.output().unwrap_or(&edge.from_handle);
            signals.push(Signal::along(edge, handle, value));
        }
    }
}

/// Per-call scratch: the evolving heat points and the controllers touched.
struct Round<'a> {
    graph: &'a CodeGraph,
    world: &'a WorldState,
    options: &'a EvalOptions,
    heat_points: Vec<HeatPoint>,
    fired: Vec<EntityId>,
}

impl Round<'_> {
    fn propagate(&mut self, signals: &[Signal]) -> Result<Vec<Signal>, EvalError> {
        let graph = self.graph;
        let mut next = Vec::new();
        for node in graph.nodes() {
            let incoming: Vec<&Signal> = signals.iter().filter(|s| s.to == node.id).collect();
            let Some(first) = incoming.first() else {
                continue;
            };

            if node.kind.is_source() {
                return Err(EvalError::SignalIntoSource {
                    node: node.id.clone(),
                    from: first.from.clone(),
                    from_handle: first.from_handle.clone(),
                });
            }

            match node.kind {
                NodeKind::Literal { .. } | NodeKind::Sensor { .. } => {}
                NodeKind::Add => {
                    let complete = node
                        .input_handles
                        .iter()
                        .all(|h| incoming.iter().any(|s| &s.to_handle == h));
                    let sum: f64 = incoming.iter().map(|s| s.value).sum();
                    self.fire_or_pass(node, complete.then_some(sum), &incoming, &mut next);
                }
                NodeKind::IfGreater { threshold } => {
                    let a = node.input(0).and_then(|h| last_on(&incoming, h));
                    let b = node.input(1).and_then(|h| last_on(&incoming, h)).or(threshold);
                    let decision = match (a, b) {
                        (Some(a), Some(b)) => Some(if a > b { 1.0 } else { 0.0 }),
                        _ => None,
                    };
                    self.fire_or_pass(node, decision, &incoming, &mut next);
                }
                NodeKind::Controller { entity } => {
                    let activation = node
                        .input(0)
                        .and_then(|h| last_on(&incoming, h))
                        .ok_or_else(|| EvalError::UnexpectedHandle {
                            node: node.id.clone(),
                            handle: first.to_handle.clone(),
                        })?;
                    self.drive_controller(node, entity, activation)?;
                }
            }
        }
        Ok(next)
    }

    /// Emit `value` on the node's output if it has a free edge; otherwise
    /// (or when the node is not ready) pass the inputs through.
    fn fire_or_pass(&self, node: &Node, value: Option<f64>, incoming: &[&Signal], next: &mut Vec<Signal>) {
        let out = node.output();
        let free = out.is_some_and(|h| {
            self.graph
                .outgoing_from(&node.id, h)
                .any(|e| !is_claimed(next, &e.to, &e.to_handle))
        });

        match (value, out) {
            (Some(value), Some(out)) if free => {
                for edge in self.graph.outgoing_from(&node.id, out) {
                    if !is_claimed(next, &edge.to, &edge.to_handle) {
                        next.push(Signal::along(edge, out, value));
                    }
                }
            }
            _ => {
                for s in incoming {
                    if !is_claimed(next, &s.to, &s.to_handle) {
                        next.push((*s).clone());
                    }
                }
            }
        }
    }

    fn drive_controller(&mut self, node: &Node, entity: EntityId, activation: f64) -> Result<(), EvalError> {
        let world = self.world;
        let controller = world
            .entities
            .find(entity, EntityKind::Controller)
            .ok_or_else(|| EvalError::UnknownController {
                node: node.id.clone(),
                entity,
            })?;
        let resolution = world.config.resolution;
        let cell = controller.pos;

        self.heat_points
            .retain(|p| !(p.is_controller() && grid_cell(p.pos, resolution).approx_eq(cell)));
        if activation == 1.0 {
            self.heat_points
                .push(HeatPoint::controller(cell_center(cell, resolution), self.options.controller_strength));
        }
        log::debug!("controller node '{}' drove entity {entity} with {activation}", node.id);
        if !self.fired.contains(&entity) {
            self.fired.push(entity);
        }
        Ok(())
    }

    /// Controllers whose pin state ended up different from the snapshot.
    fn switches(&self) -> Vec<ControllerSwitch> {
        let resolution = self.world.config.resolution;
        let pinned = |points: &[HeatPoint], cell: Vec2| {
            points
                .iter()
                .any(|p| p.is_controller() && grid_cell(p.pos, resolution).approx_eq(cell))
        };
        self.fired
            .iter()
            .filter_map(|&id| {
                let cell = self.world.entities.find(id, EntityKind::Controller)?.pos;
                let before = pinned(&self.world.heat_points, cell);
                let after = pinned(&self.heat_points, cell);
                (before != after).then_some(ControllerSwitch {
                    controller: id,
                    active: after,
                })
            })
            .collect()
    }
}

/// Value of the last signal on `handle`; later edges win.
fn last_on(incoming: &[&Signal], handle: &str) -> Option<f64> {
    incoming.iter().rev().find(|s| s.to_handle == handle).map(|s| s.value)
}

// ===========================================================================
// Tests
// ===========================================================================
