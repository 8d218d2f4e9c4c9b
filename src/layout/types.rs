use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::ir::NodeKey;

/// Normalized node rectangle.
///
/// After the vertical flip `y_min` holds the edge that was nearer the top
/// before flipping, so it is usually the numerically larger value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Rect {
    pub fn x_delta(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn y_delta(&self) -> f64 {
        self.y_max - self.y_min
    }

    pub fn center(&self) -> (f64, f64) {
        (
            self.x_min + self.x_delta() / 2.0,
            self.y_min + self.y_delta() / 2.0,
        )
    }
}

/// A Structure entry with its computed rectangle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionedNode {
    pub key: NodeKey,
    pub line1: String,
    pub line2: String,
    pub color: String,
    pub value: f64,
    pub layer_number: usize,
    pub node_number: usize,
    pub layer_node_count: usize,
    pub rect: Rect,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructureLayout {
    /// Entries ordered by layer number, then node number.
    pub nodes: Vec<PositionedNode>,
    pub max_node_count: usize,
    pub warnings: Vec<LayoutWarning>,
    index: HashMap<NodeKey, usize>,
}

impl StructureLayout {
    pub(crate) fn new(
        nodes: Vec<PositionedNode>,
        max_node_count: usize,
        warnings: Vec<LayoutWarning>,
    ) -> Self {
        let mut index = HashMap::with_capacity(nodes.len());
        for (idx, node) in nodes.iter().enumerate() {
            index.entry(node.key.clone()).or_insert(idx);
        }
        Self {
            nodes,
            max_node_count,
            warnings,
            index,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Resolves a key to the first placement carrying it.
    pub fn position(&self, key: &NodeKey) -> Option<usize> {
        self.index.get(key).copied()
    }

    pub fn get(&self, key: &NodeKey) -> Option<&PositionedNode> {
        self.position(key).map(|idx| &self.nodes[idx])
    }

    pub fn layer_count(&self) -> usize {
        self.nodes
            .iter()
            .map(|node| node.layer_number.saturating_add(1))
            .max()
            .unwrap_or(0)
    }
}

/// One endpoint of a flow band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BandEnd {
    pub x: f64,
    /// Edge adjoining the previous band of the same node (or the node's `y_min`).
    pub y_start: f64,
    /// Edge at the cumulative share of this band.
    pub y_end: f64,
    pub y: f64,
    pub y_band: f64,
}

impl BandEnd {
    pub(crate) fn new(x: f64, y_start: f64, y_end: f64) -> Self {
        Self {
            x,
            y_start,
            y_end,
            y: (y_start + y_end) / 2.0,
            y_band: (y_start - y_end).abs() / 2.0,
        }
    }
}

/// A flow with its band geometry at both ends.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionedFlow {
    pub start: NodeKey,
    pub end: NodeKey,
    pub value: f64,
    pub line1: String,
    pub line2: String,
    pub color: String,
    pub start_layer_number: usize,
    pub end_layer_number: usize,
    pub start_node_number: usize,
    pub end_node_number: usize,
    /// Row of the flow in the input table.
    pub row: usize,
    pub start_band: BandEnd,
    pub end_band: BandEnd,
    pub x_delta: f64,
    pub y_delta: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowLayout {
    /// Flows in stacking order.
    pub flows: Vec<PositionedFlow>,
    pub warnings: Vec<LayoutWarning>,
}

impl FlowLayout {
    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }
}

/// Both layout tables of one diagram.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layout {
    pub structure: StructureLayout,
    pub flows: FlowLayout,
}

impl Layout {
    pub fn warnings(&self) -> impl Iterator<Item = &LayoutWarning> {
        self.structure
            .warnings
            .iter()
            .chain(self.flows.warnings.iter())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FlowSide {
    Start,
    End,
}

impl fmt::Display for FlowSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowSide::Start => f.write_str("outgoing"),
            FlowSide::End => f.write_str("incoming"),
        }
    }
}

/// Non-fatal findings of a layout run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LayoutWarning {
    DuplicateLayer { layer: String },
    DuplicateNode { node: String },
    /// The same `(Layer, Node)` is placed more than once.
    DuplicatePlacement { key: NodeKey, rows: Vec<usize> },
    ValueMismatch {
        key: NodeKey,
        side: FlowSide,
        declared: f64,
        incident: f64,
    },
}

impl fmt::Display for LayoutWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutWarning::DuplicateLayer { layer } => {
                write!(f, "layer `{layer}` is listed more than once; using the first row")
            }
            LayoutWarning::DuplicateNode { node } => {
                write!(f, "node `{node}` is listed more than once; using the first row")
            }
            LayoutWarning::DuplicatePlacement { key, rows } => write!(
                f,
                "{key} is placed {} times (structure rows {rows:?}); flows attach to the first",
                rows.len()
            ),
            LayoutWarning::ValueMismatch {
                key,
                side,
                declared,
                incident,
            } => write!(
                f,
                "{key} declares value {declared} but its {side} flows sum to {incident}"
            ),
        }
    }
}

/// One point of a sampled flow band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BandSample {
    pub x: f64,
    pub y_upper: f64,
    pub y_lower: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelLine {
    pub text: String,
    pub bold: bool,
    /// Vertical slot within the block, counted from the top.
    pub slot: usize,
}

/// A block of label lines sharing an anchor point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextBlock {
    pub x: f64,
    pub y: f64,
    pub align: TextAlign,
    pub font_size: f64,
    /// Number of slots the block is centered over.
    pub slots: usize,
    pub lines: Vec<LabelLine>,
}

impl TextBlock {
    /// Offset of `slot` from the block center, in line heights; positive is downward.
    pub fn slot_offset(&self, slot: usize) -> f64 {
        slot as f64 - (self.slots.max(1) as f64 - 1.0) / 2.0
    }
}
