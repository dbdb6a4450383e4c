//! The controller program: typed nodes wired through named handles.
//!
//! A [`CodeGraph`] is built either in code with [`GraphBuilder`] or from
//! the authored form ([`RawGraph`]) handed over by an editor. Loading
//! checks node types, per-kind config and edge endpoints; entity ids can
//! only be checked against a world, so the evaluator does that.

use std::collections::{BTreeMap, HashSet};

use heatwire_core::entity::EntityId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Identifiers and handles
// ---------------------------------------------------------------------------

/// Authored node id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

pub const OUT: &str = "out";
pub const IN: &str = "in";
pub const LEFT: &str = "a";
pub const RIGHT: &str = "b";

// ---------------------------------------------------------------------------
// Node kinds
// ---------------------------------------------------------------------------

/// Closed set of node kinds, each with its own config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NodeKind {
    /// Emits `value` on every outgoing edge, every round.
    Literal { value: f64 },
    /// Emits the hottest field cell within the bound sensor's radius.
    Sensor { entity: EntityId },
    /// Sums every incoming signal once all inputs are present.
    Add,
    /// Emits `1` when `a > b`, else `0`. `threshold` stands in for an
    /// unwired `b`.
    IfGreater { threshold: Option<f64> },
    /// Pins the bound controller's cell into the comfort band when its
    /// activation is exactly `1`.
    Controller { entity: EntityId },
}

impl NodeKind {
    /// Type string used in authored graphs.
    pub fn type_name(&self) -> &'static str {
        match self {
            NodeKind::Literal { .. } => "literal",
            NodeKind::Sensor { .. } => "sensor",
            NodeKind::Add => "add",
            NodeKind::IfGreater { .. } => "ifGreater",
            NodeKind::Controller { .. } => "controller",
        }
    }

    /// Source-only kinds never accept signals.
    pub fn is_source(&self) -> bool {
        matches!(self, NodeKind::Literal { .. } | NodeKind::Sensor { .. })
    }

    pub fn default_inputs(&self) -> Vec<String> {
        match self {
            NodeKind::Literal { .. } | NodeKind::Sensor { .. } => Vec::new(),
            NodeKind::Add | NodeKind::IfGreater { .. } => vec![LEFT.to_string(), RIGHT.to_string()],
            NodeKind::Controller { .. } => vec![IN.to_string()],
        }
    }

    pub fn default_outputs(&self) -> Vec<String> {
        match self {
            NodeKind::Controller { .. } => Vec::new(),
            _ => vec![OUT.to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub input_handles: Vec<String>,
    pub output_handles: Vec<String>,
}

impl Node {
    /// A node with the default handles for its kind.
    pub fn new(id: impl Into<NodeId>, kind: NodeKind) -> Self {
        let input_handles = kind.default_inputs();
        let output_handles = kind.default_outputs();
        Self {
            id: id.into(),
            kind,
            input_handles,
            output_handles,
        }
    }

    pub fn with_inputs(mut self, handles: &[&str]) -> Self {
        self.input_handles = handles.iter().map(|h| h.to_string()).collect();
        self
    }

    pub fn with_outputs(mut self, handles: &[&str]) -> Self {
        self.output_handles = handles.iter().map(|h| h.to_string()).collect();
        self
    }

    /// The node's sole (first) output handle.
    pub fn output(&self) -> Option<&str> {
        self.output_handles.first().map(String::as_str)
    }

    pub fn input(&self, index: usize) -> Option<&str> {
        self.input_handles.get(index).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub from: NodeId,
    pub from_handle: String,
    pub to: NodeId,
    pub to_handle: String,
}

impl Edge {
    pub fn new(from: impl Into<NodeId>, from_handle: &str, to: impl Into<NodeId>, to_handle: &str) -> Self {
        Self {
            from: from.into(),
            from_handle: from_handle.to_string(),
            to: to.into(),
            to_handle: to_handle.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while turning an authored graph into a [`CodeGraph`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LoadError {
    #[error("duplicate node id '{0}'")]
    DuplicateNode(NodeId),
    #[error("node '{node}' has unknown type '{kind}'")]
    UnknownNodeType { node: NodeId, kind: String },
    #[error("node '{node}' is missing config key '{key}'")]
    MissingConfig { node: NodeId, key: &'static str },
    #[error("node '{node}' has invalid config '{key}': {reason}")]
    InvalidConfig {
        node: NodeId,
        key: &'static str,
        reason: String,
    },
    #[error("edge {edge} references unknown node '{node}'")]
    UnknownEndpoint { edge: usize, node: NodeId },
}

// ---------------------------------------------------------------------------
// CodeGraph
// ---------------------------------------------------------------------------

/// A validated node/edge graph. Node and edge order is the authored order
/// and is the order the evaluator visits them in.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CodeGraph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl CodeGraph {
    /// Validate node ids and edge endpoints.
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Result<Self, LoadError> {
        let mut seen = HashSet::new();
        for node in &nodes {
            if !seen.insert(node.id.clone()) {
                return Err(LoadError::DuplicateNode(node.id.clone()));
            }
        }
        for (i, edge) in edges.iter().enumerate() {
            for end in [&edge.from, &edge.to] {
                if !seen.contains(end) {
                    return Err(LoadError::UnknownEndpoint {
                        edge: i,
                        node: end.clone(),
                    });
                }
            }
        }
        Ok(Self { nodes, edges })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    /// Every edge leaving `node`, in authored order.
    pub fn outgoing<'a>(&'a self, node: &'a NodeId) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| &e.from == node)
    }

    /// Edges leaving `node` through `handle`.
    pub fn outgoing_from<'a>(&'a self, node: &'a NodeId, handle: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.outgoing(node).filter(move |e| e.from_handle == handle)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Parse and validate an authored JSON graph.
    pub fn from_json_str(s: &str) -> Result<Self, GraphParseError> {
        let raw: RawGraph = serde_json::from_str(s)?;
        Ok(Self::try_from(raw)?)
    }
}

/// Failure to read an authored graph from text.
#[derive(Debug, thiserror::Error)]
pub enum GraphParseError {
    #[error("graph JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Load(#[from] LoadError),
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Assembles a [`CodeGraph`] in code.
///
/// ```rust,ignore
/// let graph = GraphBuilder::new()
///     .literal("ten", 10.0)
///     .controller("c", EntityId(2))
///     .connect("ten", "out", "c", "in")
///     .build()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    pub fn literal(self, id: &str, value: f64) -> Self {
        self.node(Node::new(id, NodeKind::Literal { value }))
    }

    pub fn sensor(self, id: &str, entity: EntityId) -> Self {
        self.node(Node::new(id, NodeKind::Sensor { entity }))
    }

    pub fn add(self, id: &str) -> Self {
        self.node(Node::new(id, NodeKind::Add))
    }

    pub fn if_greater(self, id: &str) -> Self {
        self.node(Node::new(id, NodeKind::IfGreater { threshold: None }))
    }

    pub fn controller(self, id: &str, entity: EntityId) -> Self {
        self.node(Node::new(id, NodeKind::Controller { entity }))
    }

    pub fn connect(mut self, from: &str, from_handle: &str, to: &str, to_handle: &str) -> Self {
        self.edges.push(Edge::new(from, from_handle, to, to_handle));
        self
    }

    pub fn build(self) -> Result<CodeGraph, LoadError> {
        CodeGraph::new(self.nodes, self.edges)
    }
}

// ---------------------------------------------------------------------------
// Authored form
// ---------------------------------------------------------------------------

/// A graph as an editor hands it over: string types and loose config maps.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawGraph {
    #[serde(default)]
    pub nodes: Vec<RawNode>,
    #[serde(default)]
    pub edges: Vec<RawEdge>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNode {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub config: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_handles: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_handles: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEdge {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub from: String,
    pub from_handle: String,
    pub to: String,
    pub to_handle: String,
}

fn number(node: &NodeId, config: &BTreeMap<String, Value>, key: &'static str) -> Result<Option<f64>, LoadError> {
    match config.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v.as_f64().map(Some).ok_or_else(|| LoadError::InvalidConfig {
            node: node.clone(),
            key,
            reason: format!("expected a number, got {v}"),
        }),
    }
}

/// Entity binding: `entityId`, falling back to `value`.
fn entity_ref(node: &NodeId, config: &BTreeMap<String, Value>) -> Result<EntityId, LoadError> {
    let (key, v) = match (config.get("entityId"), config.get("value")) {
        (Some(v), _) => ("entityId", v),
        (None, Some(v)) => ("value", v),
        (None, None) => {
            return Err(LoadError::MissingConfig {
                node: node.clone(),
                key: "entityId",
            });
        }
    };
    v.as_u64()
        .and_then(|id| u32::try_from(id).ok())
        .map(EntityId)
        .ok_or_else(|| LoadError::InvalidConfig {
            node: node.clone(),
            key,
            reason: format!("expected an entity id, got {v}"),
        })
}

impl TryFrom<RawNode> for Node {
    type Error = LoadError;

    fn try_from(raw: RawNode) -> Result<Self, Self::Error> {
        let id = NodeId(raw.id);
        let kind = match raw.kind.as_str() {
            "literal" => NodeKind::Literal {
                value: number(&id, &raw.config, "value")?.ok_or_else(|| LoadError::MissingConfig {
                    node: id.clone(),
                    key: "value",
                })?,
            },
            "sensor" => NodeKind::Sensor {
                entity: entity_ref(&id, &raw.config)?,
            },
            "add" => NodeKind::Add,
            "ifGreater" => NodeKind::IfGreater {
                threshold: number(&id, &raw.config, "threshold")?,
            },
            "controller" => NodeKind::Controller {
                entity: entity_ref(&id, &raw.config)?,
            },
            other => {
                return Err(LoadError::UnknownNodeType {
                    node: id,
                    kind: other.to_string(),
                });
            }
        };
        let input_handles = raw.input_handles.unwrap_or_else(|| kind.default_inputs());
        let output_handles = raw.output_handles.unwrap_or_else(|| kind.default_outputs());
        Ok(Node {
            id,
            kind,
            input_handles,
            output_handles,
        })
    }
}

impl TryFrom<RawGraph> for CodeGraph {
    type Error = LoadError;

    fn try_from(raw: RawGraph) -> Result<Self, Self::Error> {
        let nodes = raw
            .nodes
            .into_iter()
            .map(Node::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let edges = raw
            .edges
            .into_iter()
            .map(|e| Edge {
                from: NodeId(e.from),
                from_handle: e.from_handle,
                to: NodeId(e.to),
                to_handle: e.to_handle,
            })
            .collect();
        CodeGraph::new(nodes, edges)
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_handles_per_kind() {
        let add = Node::new("a", NodeKind::Add);
        assert_eq!(add.input_handles, vec!["a", "b"]);
        assert_eq!(add.output(), Some("out"));

        let ctrl = Node::new("c", NodeKind::Controller { entity: EntityId(2) });
        assert_eq!(ctrl.input(0), Some("in"));
        assert_eq!(ctrl.output(), None);

        let lit = Node::new("l", NodeKind::Literal { value: 1.0 });
        assert!(lit.input_handles.is_empty());
        assert!(lit.kind.is_source());
    }

    #[test]
    fn builder_rejects_dangling_edges() {
        let err = GraphBuilder::new()
            .literal("ten", 10.0)
            .connect("ten", "out", "ghost", "in")
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            LoadError::UnknownEndpoint {
                edge: 0,
                node: NodeId::from("ghost")
            }
        );
    }

    #[test]
    fn builder_rejects_duplicate_ids() {
        let err = GraphBuilder::new().add("x").literal("x", 1.0).build().unwrap_err();
        assert_eq!(err, LoadError::DuplicateNode(NodeId::from("x")));
    }

    #[test]
    fn outgoing_respects_handles_and_order() {
        let graph = GraphBuilder::new()
            .literal("l", 1.0)
            .add("sum")
            .connect("l", "out", "sum", "a")
            .connect("l", "out", "sum", "b")
            .connect("l", "other", "sum", "a")
            .build()
            .unwrap();
        let l = NodeId::from("l");
        assert_eq!(graph.outgoing(&l).count(), 3);
        let via_out: Vec<_> = graph.outgoing_from(&l, "out").map(|e| e.to_handle.as_str()).collect();
        assert_eq!(via_out, vec!["a", "b"]);
    }

    #[test]
    fn authored_json_loads_with_defaults() {
        let json = r#"{
            "nodes": [
                {"id": "s", "type": "sensor", "config": {"value": 0}},
                {"id": "ten", "type": "literal", "config": {"value": 10}},
                {"id": "cmp", "type": "ifGreater", "config": {}},
                {"id": "c", "type": "controller", "config": {"entityId": 2},
                 "inputHandles": ["trigger"]}
            ],
            "edges": [
                {"id": "e1", "from": "s", "fromHandle": "out", "to": "cmp", "toHandle": "a"},
                {"from": "ten", "fromHandle": "out", "to": "cmp", "toHandle": "b"},
                {"from": "cmp", "fromHandle": "out", "to": "c", "toHandle": "trigger"}
            ]
        }"#;
        let graph = CodeGraph::from_json_str(json).unwrap();
        assert_eq!(graph.nodes().len(), 4);
        assert_eq!(graph.edges().len(), 3);
        assert_eq!(graph.nodes()[0].kind, NodeKind::Sensor { entity: EntityId(0) });
        assert_eq!(graph.nodes()[2].input_handles, vec!["a", "b"]);
        assert_eq!(graph.nodes()[3].input_handles, vec!["trigger"]);
        assert_eq!(graph.nodes()[3].kind, NodeKind::Controller { entity: EntityId(2) });
    }

    #[test]
    fn unknown_type_fails_at_load() {
        let json = r#"{"nodes": [{"id": "m", "type": "multiply", "config": {}}], "edges": []}"#;
        let err = CodeGraph::from_json_str(json).unwrap_err();
        match err {
            GraphParseError::Load(LoadError::UnknownNodeType { node, kind }) => {
                assert_eq!(node.as_str(), "m");
                assert_eq!(kind, "multiply");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_or_bad_config_fails_at_load() {
        let raw = RawNode {
            id: "l".into(),
            kind: "literal".into(),
            config: BTreeMap::new(),
            input_handles: None,
            output_handles: None,
        };
        assert_eq!(
            Node::try_from(raw).unwrap_err(),
            LoadError::MissingConfig {
                node: NodeId::from("l"),
                key: "value"
            }
        );

        let mut config = BTreeMap::new();
        config.insert("entityId".to_string(), Value::from("two"));
        let raw = RawNode {
            id: "c".into(),
            kind: "controller".into(),
            config,
            input_handles: None,
            output_handles: None,
        };
        assert!(matches!(
            Node::try_from(raw),
            Err(LoadError::InvalidConfig { key: "entityId", .. })
        ));
    }

    #[test]
    fn if_greater_threshold_is_optional() {
        let mut config = BTreeMap::new();
        config.insert("threshold".to_string(), Value::from(22.5));
        let raw = RawNode {
            id: "cmp".into(),
            kind: "ifGreater".into(),
            config,
            input_handles: None,
            output_handles: None,
        };
        let node = Node::try_from(raw).unwrap();
        assert_eq!(node.kind, NodeKind::IfGreater { threshold: Some(22.5) });
    }

    #[test]
    fn authored_ron_loads_too() {
        let src = r#"(
            nodes: [
                (id: "one", type: "literal", config: {"value": 1.0}),
                (id: "c", type: "controller", config: {"value": 2}),
            ],
            edges: [
                (from: "one", fromHandle: "out", to: "c", toHandle: "in"),
            ],
        )"#;
        let raw: RawGraph = ron::from_str(src).unwrap();
        let graph = CodeGraph::try_from(raw).unwrap();
        assert_eq!(graph.nodes()[0].kind, NodeKind::Literal { value: 1.0 });
        assert_eq!(graph.nodes()[1].kind, NodeKind::Controller { entity: EntityId(2) });
    }
}
