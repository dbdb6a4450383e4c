//! Heatwire Core -- the thermal world and its tick pipeline.
//!
//! This crate holds everything the controller graph runs against: the
//! entity layout, drifting heat points, the fine-grid temperature field,
//! the economy, and the ordered pipeline of pure steps that advances a
//! [`world::WorldState`] snapshot once per tick.
//!
//! # Tick Pipeline
//!
//! A level composes its steps once. A typical live level runs:
//!
//! 1. **Heat points** -- advance drifting heat, spawn on schedule.
//! 2. **Temperature** -- recompute the whole field from noise and heat.
//! 3. **Income / upkeep** -- accrue coins and score.
//! 4. **Graph** -- evaluate the controller graph (see `heatwire-logic`).
//! 5. **Win / loss** -- set the terminal flags.
//!
//! # Key Types
//!
//! - [`engine::Engine`] -- owns the snapshot and steps the pipeline.
//! - [`pipeline::Simulation`] -- a pure `WorldState -> WorldState` step.
//! - [`heat::HeatPoint`] -- a drifting heat blob or a controller pin.
//! - [`field::TemperatureField`] -- the fine-grid temperature scalars.
//! - [`entity::EntityRegistry`] -- sensors, farms and controllers.
//! - [`rng::SimRng`] -- the deterministic random source stored in the world.

pub mod economy;
pub mod engine;
pub mod entity;
pub mod event;
pub mod field;
pub mod hash;
pub mod heat;
pub mod math;
pub mod noise;
pub mod pipeline;
pub mod render;
pub mod rng;
pub mod rules;
pub mod temperature;
pub mod vec2;
pub mod world;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use entity::WorldError;
