//! Values in transit along one edge during one evaluation round.

use serde::{Deserialize, Serialize};

use crate::graph::{Edge, NodeId};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signal {
    pub value: f64,
    pub from: NodeId,
    pub from_handle: String,
    pub to: NodeId,
    pub to_handle: String,
}

impl Signal {
    /// A signal carrying `value` from `from_handle` along `edge`.
    pub fn along(edge: &Edge, from_handle: &str, value: f64) -> Self {
        Self {
            value,
            from: edge.from.clone(),
            from_handle: from_handle.to_string(),
            to: edge.to.clone(),
            to_handle: edge.to_handle.clone(),
        }
    }

    pub fn targets(&self, node: &NodeId, handle: &str) -> bool {
        &self.to == node && self.to_handle == handle
    }
}

/// Values compare by bit pattern, so a NaN produced by the graph still
/// lets the signal set settle.
impl PartialEq for Signal {
    fn eq(&self, other: &Self) -> bool {
        self.value.to_bits() == other.value.to_bits()
            && self.from == other.from
            && self.from_handle == other.from_handle
            && self.to == other.to
            && self.to_handle == other.to_handle
    }
}

impl Eq for Signal {}

/// Is `(node, handle)` already the target of some signal in `signals`?
pub fn is_claimed(signals: &[Signal], node: &NodeId, handle: &str) -> bool {
    signals.iter().any(|s| s.targets(node, handle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_bitwise_on_value() {
        let edge = Edge::new("a", "out", "b", "in");
        let nan = Signal::along(&edge, "out", f64::NAN);
        assert_eq!(nan, nan.clone());
        assert_ne!(Signal::along(&edge, "out", 0.0), Signal::along(&edge, "out", -0.0));
        assert_ne!(Signal::along(&edge, "out", 1.0), Signal::along(&edge, "x", 1.0));
    }

    #[test]
    fn claims_match_node_and_handle() {
        let signals = vec![Signal::along(&Edge::new("a", "out", "b", "in"), "out", 1.0)];
        assert!(is_claimed(&signals, &NodeId::from("b"), "in"));
        assert!(!is_claimed(&signals, &NodeId::from("b"), "trigger"));
        assert!(!is_claimed(&signals, &NodeId::from("a"), "in"));
    }
}
