use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// One row of the Layers table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    #[serde(rename = "Layer")]
    pub name: String,
    #[serde(rename = "Layer Order")]
    pub order: i64,
}

/// One row of the Nodes table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(rename = "Node")]
    pub name: String,
    #[serde(rename = "Line 1", default)]
    pub line1: String,
    #[serde(rename = "Line 2", default)]
    pub line2: String,
    #[serde(rename = "Color", default)]
    pub color: String,
    #[serde(rename = "Node Order", default)]
    pub order: NodeOrder,
}

/// One row of the Structure table: places a node in a layer with its total value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    #[serde(rename = "Layer")]
    pub layer: String,
    #[serde(rename = "Node")]
    pub node: String,
    #[serde(rename = "Value")]
    pub value: f64,
}

/// One row of the Flows table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flow {
    #[serde(rename = "Start Layer")]
    pub start_layer: String,
    #[serde(rename = "Start Node")]
    pub start_node: String,
    #[serde(rename = "End Layer")]
    pub end_layer: String,
    #[serde(rename = "End Node")]
    pub end_node: String,
    #[serde(rename = "Value")]
    pub value: f64,
    #[serde(rename = "Line 1", default)]
    pub line1: String,
    #[serde(rename = "Line 2", default)]
    pub line2: String,
}

impl Flow {
    pub fn start_key(&self) -> NodeKey {
        NodeKey::new(&self.start_layer, &self.start_node)
    }

    pub fn end_key(&self) -> NodeKey {
        NodeKey::new(&self.end_layer, &self.end_node)
    }
}

/// The four input tables of a diagram.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SankeyTables {
    #[serde(default)]
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub structure: Vec<Placement>,
    #[serde(default)]
    pub flows: Vec<Flow>,
}

impl SankeyTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty() || self.nodes.is_empty() || self.structure.is_empty()
    }

    pub fn add_layer(&mut self, name: &str, order: i64) -> &mut Self {
        self.layers.push(Layer {
            name: name.to_string(),
            order,
        });
        self
    }

    pub fn add_node(&mut self, name: &str, color: &str, order: &str) -> &mut Self {
        self.nodes.push(Node {
            name: name.to_string(),
            line1: String::new(),
            line2: String::new(),
            color: color.to_string(),
            order: NodeOrder::from(order),
        });
        self
    }

    pub fn place(&mut self, layer: &str, node: &str, value: f64) -> &mut Self {
        self.structure.push(Placement {
            layer: layer.to_string(),
            node: node.to_string(),
            value,
        });
        self
    }

    pub fn add_flow(
        &mut self,
        start: (&str, &str),
        end: (&str, &str),
        value: f64,
    ) -> &mut Self {
        self.flows.push(Flow {
            start_layer: start.0.to_string(),
            start_node: start.1.to_string(),
            end_layer: end.0.to_string(),
            end_node: end.1.to_string(),
            value,
            line1: String::new(),
            line2: String::new(),
        });
        self
    }
}

/// Composite key addressing a placed node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeKey {
    pub layer: String,
    pub node: String,
}

impl NodeKey {
    pub fn new(layer: &str, node: &str) -> Self {
        Self {
            layer: layer.to_string(),
            node: node.to_string(),
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.layer, self.node)
    }
}

/// Sort hint for nodes within a layer.
///
/// The cell is kept as text. Numeric hints come first in numeric order, then
/// text hints in string order, then blank hints. Equality follows the same
/// order, so `"1"` and `"1.0"` are equal hints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "HintCell", into = "String")]
pub struct NodeOrder(String);

impl NodeOrder {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    fn numeric(&self) -> Option<f64> {
        self.0.trim().parse::<f64>().ok().filter(|v| v.is_finite())
    }
}

impl From<&str> for NodeOrder {
    fn from(value: &str) -> Self {
        Self(value.trim().to_string())
    }
}

impl From<NodeOrder> for String {
    fn from(value: NodeOrder) -> Self {
        value.0
    }
}

impl Ord for NodeOrder {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.is_blank(), other.is_blank()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Greater,
            (false, true) => return Ordering::Less,
            (false, false) => {}
        }
        match (self.numeric(), other.numeric()) {
            (Some(a), Some(b)) => a.total_cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.trim().cmp(other.0.trim()),
        }
    }
}

impl PartialEq for NodeOrder {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for NodeOrder {}

impl PartialOrd for NodeOrder {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// JSON tables may carry the hint as a number.
#[derive(Deserialize)]
#[serde(untagged)]
enum HintCell {
    Number(f64),
    Text(String),
}

impl From<HintCell> for NodeOrder {
    fn from(value: HintCell) -> Self {
        match value {
            HintCell::Number(v) => Self(format!("{v}")),
            HintCell::Text(v) => Self::from(v.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_order_compares_numbers_numerically() {
        assert!(NodeOrder::from("2") < NodeOrder::from("10"));
        assert!(NodeOrder::from("b") > NodeOrder::from("a"));
        assert!(NodeOrder::from("") > NodeOrder::from("99"));
        assert_eq!(NodeOrder::from(" 3 "), NodeOrder::from("3"));
    }

    #[test]
    fn node_order_is_total_for_mixed_hints() {
        let hints: Vec<NodeOrder> = ["2", "10", "1a", "3", "", "20", "1b", "5", "x", "1.0"]
            .into_iter()
            .map(NodeOrder::from)
            .collect();
        for a in &hints {
            for b in &hints {
                assert_eq!(a.cmp(b), b.cmp(a).reverse(), "{a:?} vs {b:?}");
                for c in &hints {
                    if a < b && b < c {
                        assert!(a < c, "{a:?} < {b:?} < {c:?}");
                    }
                }
            }
        }
        assert!(NodeOrder::from("10") < NodeOrder::from("1a"));
        assert!(NodeOrder::from("1a") < NodeOrder::from("2a"));
        assert!(NodeOrder::from("x") < NodeOrder::from(""));
    }

    #[test]
    fn node_order_equality_follows_ordering() {
        let one = NodeOrder::from("1");
        let one_point_zero = NodeOrder::from("1.0");
        assert_eq!(one.cmp(&one_point_zero), Ordering::Equal);
        assert_eq!(one, one_point_zero);
        assert_ne!(NodeOrder::from("a"), NodeOrder::from("b"));
    }

    #[test]
    fn tables_deserialize_from_json() {
        let json = r#"{
            "layers": [{"Layer": "A", "Layer Order": 1}],
            "nodes": [{"Node": "n1", "Color": "tab:blue", "Node Order": 1}],
            "structure": [{"Layer": "A", "Node": "n1", "Value": 10}],
            "flows": []
        }"#;
        let tables: SankeyTables = serde_json::from_str(json).expect("tables json");
        assert_eq!(tables.layers[0].order, 1);
        assert_eq!(tables.nodes[0].order.as_str(), "1");
        assert_eq!(tables.nodes[0].line1, "");
        assert_eq!(tables.structure[0].value, 10.0);
    }
}
