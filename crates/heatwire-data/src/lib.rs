//! Level and graph files for Heatwire.
//!
//! Levels are authored as RON, TOML or JSON (picked by file extension) and
//! turned into a ready-to-step [`heatwire_core::engine::Engine`] by
//! [`level::build_level`]. Controller graphs use the same loaders and the
//! authored node/edge form from [`heatwire_logic::graph`].

pub mod level;
pub mod loader;

pub use level::{LevelConfig, LevelError, LevelMode, build_level, level_one};
pub use loader::{DataLoadError, LevelBundle, load_graph, load_level, load_level_dir};
