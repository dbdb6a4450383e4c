//! Controller graphs for Heatwire.
//!
//! A player's program is a directed graph of typed nodes (literals,
//! sensors, adders, comparators and controllers) wired through named
//! handles. It may contain cycles and unwired inputs, so there is no static
//! execution order: the [`evaluator`] instead propagates signals round by
//! round until nothing changes or its time budget runs out, every tick and
//! from scratch.
//!
//! - [`graph`] -- node/edge model, builder and the authored (JSON/RON) form.
//! - [`signal`] -- values in transit during one round.
//! - [`evaluator`] -- the fixed-point loop and its errors.
//! - [`bridge`] -- [`bridge::GraphStep`], the pipeline step wrapping it all.

pub mod bridge;
pub mod evaluator;
pub mod graph;
pub mod signal;

pub use bridge::GraphStep;
pub use evaluator::{EvalError, EvalOptions, Evaluation, Outcome, apply_graph, evaluate};
pub use graph::{CodeGraph, GraphBuilder, LoadError, Node, NodeId, NodeKind};
