//! File loading: format detection (RON/JSON/TOML), file discovery inside a
//! level directory, and typed deserialization of level configs and
//! controller graphs.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use heatwire_logic::graph::{CodeGraph, LoadError, RawGraph};

use crate::level::LevelConfig;

// ===========================================================================
// Errors
// ===========================================================================

/// Failure to read a level or graph file.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// No `{file}.ron`, `.toml` or `.json` in the level directory.
    #[error("no '{file}' file in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    #[error("{file}: expected a .ron, .toml or .json extension")]
    UnsupportedFormat { file: PathBuf },

    /// The same base name exists in two formats.
    #[error("both {a} and {b} exist")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    #[error("could not parse {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// The graph file parsed but does not describe a valid graph.
    #[error("invalid graph in {file}: {source}")]
    Graph {
        file: PathBuf,
        #[source]
        source: LoadError,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// On-disk formats, matched by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

impl Format {
    pub const ALL: [Format; 3] = [Format::Ron, Format::Toml, Format::Json];

    pub fn extension(self) -> &'static str {
        match self {
            Format::Ron => "ron",
            Format::Toml => "toml",
            Format::Json => "json",
        }
    }
}

/// Format for `path`, from its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    let ext = path.extension().and_then(|e| e.to_str());
    Format::ALL
        .into_iter()
        .find(|f| Some(f.extension()) == ext)
        .ok_or_else(|| DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        })
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Look in `dir` for `{base_name}.ron`, `.toml` or `.json`.
///
/// Returns `Ok(None)` if none exists and `Err(ConflictingFormats)` if more
/// than one does.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;

    for format in Format::ALL {
        let candidate = dir.join(format!("{base_name}.{}", format.extension()));
        if candidate.exists() {
            if let Some(existing) = found {
                return Err(DataLoadError::ConflictingFormats {
                    a: existing,
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }

    Ok(found)
}

/// Like [`find_data_file`], but a missing file is an error.
pub fn require_data_file(dir: &Path, base_name: &str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name.to_string(),
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

/// Deserialize `content` as `format`. `origin` only labels errors.
pub fn deserialize_str<T: DeserializeOwned>(format: Format, content: &str, origin: &Path) -> Result<T, DataLoadError> {
    let parse_error = |detail: String| DataLoadError::Parse {
        file: origin.to_path_buf(),
        detail,
    };
    match format {
        Format::Ron => ron::from_str(content).map_err(|e| parse_error(e.to_string())),
        Format::Json => serde_json::from_str(content).map_err(|e| parse_error(e.to_string())),
        Format::Toml => toml::from_str(content).map_err(|e| parse_error(e.to_string())),
    }
}

/// Read a file and deserialize it according to its extension.
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    deserialize_str(format, &content, path)
}

// ===========================================================================
// Typed loaders
// ===========================================================================

/// Load a level configuration file.
pub fn load_level(path: &Path) -> Result<LevelConfig, DataLoadError> {
    let config: LevelConfig = deserialize_file(path)?;
    log::debug!(
        "loaded level '{}' from {} ({} entities)",
        config.name,
        path.display(),
        config.entities.len()
    );
    Ok(config)
}

/// Load an authored controller graph and check its wiring.
pub fn load_graph(path: &Path) -> Result<CodeGraph, DataLoadError> {
    let raw: RawGraph = deserialize_file(path)?;
    let graph = CodeGraph::try_from(raw).map_err(|source| DataLoadError::Graph {
        file: path.to_path_buf(),
        source,
    })?;
    log::debug!(
        "loaded graph from {} ({} nodes, {} edges)",
        path.display(),
        graph.nodes().len(),
        graph.edges().len()
    );
    Ok(graph)
}

/// A level directory's contents: the required `level` file and an optional
/// `graph` file, each in any supported format.
#[derive(Debug, Clone)]
pub struct LevelBundle {
    pub config: LevelConfig,
    pub graph: Option<CodeGraph>,
}

pub fn load_level_dir(dir: &Path) -> Result<LevelBundle, DataLoadError> {
    let config = load_level(&require_data_file(dir, "level")?)?;
    let graph = find_data_file(dir, "graph")?
        .map(|path| load_graph(&path))
        .transpose()?;
    Ok(LevelBundle { config, graph })
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use heatwire_core::entity::EntityKind;
    use heatwire_logic::graph::NodeKind;
    use std::fs;

    /// Fresh per-test directory under the system temp dir.
    fn make_test_dir(suffix: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("heatwire_data_test_{suffix}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn cleanup(dir: &Path) {
        let _ = fs::remove_dir_all(dir);
    }

    const GRAPH_JSON: &str = r#"{
        "nodes": [
            {"id": "on", "type": "literal", "config": {"value": 1}},
            {"id": "c", "type": "controller", "config": {"entityId": 2}}
        ],
        "edges": [
            {"id": "e0", "from": "on", "fromHandle": "out", "to": "c", "toHandle": "in"}
        ]
    }"#;

    const LEVEL_TOML: &str = r#"
name = "toml level"
seed = 7
wind = { x = -20.0, y = 0.0 }

[world]
target_fps = 10.0
rows = 4
columns = 4
resolution = 5
target_score = 50.0

[[entities]]
id = 0
kind = "sensor"
pos = { x = 2.0, y = 2.0 }
data = { radius = 5.0 }

[[entities]]
id = 1
kind = "farm"
pos = { x = 1.0, y = 2.0 }

[economy]
farm_spawn_period = 30
"#;

    // -----------------------------------------------------------------------
    // detect_format
    // -----------------------------------------------------------------------

    #[test]
    fn detect_format_by_extension() {
        assert_eq!(detect_format(Path::new("level.ron")).unwrap(), Format::Ron);
        assert_eq!(detect_format(Path::new("level.toml")).unwrap(), Format::Toml);
        assert_eq!(detect_format(Path::new("graph.json")).unwrap(), Format::Json);
    }

    #[test]
    fn detect_format_unsupported() {
        for name in ["level.yaml", "level"] {
            assert!(matches!(
                detect_format(Path::new(name)),
                Err(DataLoadError::UnsupportedFormat { .. })
            ));
        }
    }

    // -----------------------------------------------------------------------
    // find_data_file / require_data_file
    // -----------------------------------------------------------------------

    #[test]
    fn find_data_file_found_and_missing() {
        let dir = make_test_dir("find");
        assert_eq!(find_data_file(&dir, "level").unwrap(), None);

        fs::write(dir.join("level.toml"), "").unwrap();
        assert_eq!(find_data_file(&dir, "level").unwrap(), Some(dir.join("level.toml")));

        cleanup(&dir);
    }

    #[test]
    fn find_data_file_conflict() {
        let dir = make_test_dir("conflict");
        fs::write(dir.join("graph.ron"), "()").unwrap();
        fs::write(dir.join("graph.json"), "{}").unwrap();

        assert!(matches!(
            find_data_file(&dir, "graph"),
            Err(DataLoadError::ConflictingFormats { .. })
        ));

        cleanup(&dir);
    }

    #[test]
    fn require_data_file_missing() {
        let dir = make_test_dir("require");
        match require_data_file(&dir, "level") {
            Err(DataLoadError::MissingRequired { file, .. }) => assert_eq!(file, "level"),
            other => panic!("expected MissingRequired, got {other:?}"),
        }
        cleanup(&dir);
    }

    // -----------------------------------------------------------------------
    // Typed loaders
    // -----------------------------------------------------------------------

    #[test]
    fn load_graph_from_json() {
        let dir = make_test_dir("graph_json");
        let path = dir.join("graph.json");
        fs::write(&path, GRAPH_JSON).unwrap();

        let graph = load_graph(&path).unwrap();
        assert_eq!(graph.nodes().len(), 2);
        assert_eq!(graph.edges().len(), 1);
        assert!(matches!(graph.nodes()[0].kind, NodeKind::Literal { value } if value == 1.0));

        cleanup(&dir);
    }

    #[test]
    fn load_graph_reports_bad_wiring() {
        let dir = make_test_dir("graph_bad");
        let path = dir.join("graph.json");
        fs::write(
            &path,
            r#"{"nodes": [{"id": "x", "type": "literal", "config": {"value": 1}}],
                "edges": [{"from": "x", "fromHandle": "out", "to": "ghost", "toHandle": "in"}]}"#,
        )
        .unwrap();

        match load_graph(&path) {
            Err(DataLoadError::Graph { file, source }) => {
                assert_eq!(file, path);
                assert!(matches!(source, LoadError::UnknownEndpoint { edge: 0, .. }));
            }
            other => panic!("expected a graph error, got {other:?}"),
        }

        cleanup(&dir);
    }

    #[test]
    fn parse_errors_name_the_file() {
        let dir = make_test_dir("parse");
        let path = dir.join("level.ron");
        fs::write(&path, "(name: ").unwrap();

        match load_level(&path) {
            Err(DataLoadError::Parse { file, .. }) => assert_eq!(file, path),
            other => panic!("expected a parse error, got {other:?}"),
        }

        cleanup(&dir);
    }

    #[test]
    fn load_level_from_toml() {
        let dir = make_test_dir("level_toml");
        let path = dir.join("level.toml");
        fs::write(&path, LEVEL_TOML).unwrap();

        let level = load_level(&path).unwrap();
        assert_eq!(level.name, "toml level");
        assert_eq!(level.seed, 7);
        assert_eq!(level.world.rows, 4);
        assert_eq!(level.entities.len(), 2);
        assert_eq!(level.entities[0].kind, EntityKind::Sensor);
        assert_eq!(level.entities[0].data.radius, Some(5.0));
        assert_eq!(level.economy.farm_spawn_period, Some(30));
        // Unlisted sections fall back to their defaults.
        assert_eq!(level.heat, heatwire_core::heat::HeatParams::default());

        cleanup(&dir);
    }

    #[test]
    fn load_level_dir_with_and_without_graph() {
        let dir = make_test_dir("level_dir");
        fs::write(dir.join("level.toml"), LEVEL_TOML).unwrap();

        let bundle = load_level_dir(&dir).unwrap();
        assert!(bundle.graph.is_none());

        fs::write(dir.join("graph.json"), GRAPH_JSON).unwrap();
        let bundle = load_level_dir(&dir).unwrap();
        assert_eq!(bundle.graph.map(|g| g.nodes().len()), Some(2));

        cleanup(&dir);
    }

    #[test]
    fn shipped_level_one_matches_builtin() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("levels").join("level_one");
        let bundle = load_level_dir(&dir).unwrap();
        assert_eq!(bundle.config, crate::level::level_one(12.0));

        let graph = bundle.graph.expect("level one ships a graph");
        let kinds: Vec<&str> = graph.nodes().iter().map(|n| n.kind.type_name()).collect();
        assert_eq!(kinds, vec!["sensor", "literal", "ifGreater", "controller"]);
    }

    #[test]
    fn load_level_dir_requires_level_file() {
        let dir = make_test_dir("level_dir_missing");
        fs::write(dir.join("graph.json"), GRAPH_JSON).unwrap();
        assert!(matches!(
            load_level_dir(&dir),
            Err(DataLoadError::MissingRequired { .. })
        ));
        cleanup(&dir);
    }
}
