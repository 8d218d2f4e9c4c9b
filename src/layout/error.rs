use std::fmt;

use thiserror::Error;

use crate::ir::NodeKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Layers,
    Nodes,
    Structure,
    Flows,
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Table::Layers => "layers",
            Table::Nodes => "nodes",
            Table::Structure => "structure",
            Table::Flows => "flows",
        };
        f.write_str(name)
    }
}

/// Failures of the layout stages. Rows are 0-based positions in the input table.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SankeyError {
    #[error("{table} row {row} references unknown layer `{layer}`")]
    UnknownLayer {
        table: Table,
        row: usize,
        layer: String,
    },
    #[error("{table} row {row} references unknown node {key}")]
    UnknownNode {
        table: Table,
        row: usize,
        key: NodeKey,
    },
    #[error("node {key} has a total value of 0 but {incident} flows through it")]
    DegenerateValue { key: NodeKey, incident: f64 },
    #[error("layer `{layer}` has order {order}; orders start at 1 and must fit a column index")]
    InvalidLayerOrder { layer: String, order: i64 },
    #[error("{table} row {row} has non-finite value {value}")]
    InvalidValue { table: Table, row: usize, value: f64 },
    #[error("parameter `{name}` has invalid value {value}")]
    InvalidParameter { name: &'static str, value: f64 },
}

impl SankeyError {
    /// The key a reference error points at, if any.
    pub fn missing_key(&self) -> Option<NodeKey> {
        match self {
            SankeyError::UnknownNode { key, .. } => Some(key.clone()),
            _ => None,
        }
    }

    pub fn is_reference_error(&self) -> bool {
        matches!(
            self,
            SankeyError::UnknownLayer { .. } | SankeyError::UnknownNode { .. }
        )
    }
}
