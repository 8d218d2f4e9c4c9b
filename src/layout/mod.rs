mod curve;
mod error;
mod flows;
mod structure;
mod text;
pub(crate) mod types;
pub use curve::*;
pub use error::*;
pub use flows::*;
pub use structure::*;
pub use text::*;
pub use types::*;

use crate::config::GeometryParams;
use crate::ir::SankeyTables;

/// Runs the structure and flow stages on one diagram.
///
/// A diagram without layers, nodes or placements lays out as empty; its
/// flows are not checked.
pub fn compute_layout(
    tables: &SankeyTables,
    params: &GeometryParams,
) -> Result<Layout, SankeyError> {
    let structure = layout_structure(tables, params)?;
    if structure.is_empty() {
        if !tables.flows.is_empty() {
            tracing::warn!(
                flows = tables.flows.len(),
                "diagram has no placed nodes; ignoring its flows"
            );
        }
        return Ok(Layout {
            structure,
            flows: FlowLayout::default(),
        });
    }
    let flows = layout_flows(&structure, &tables.flows)?;
    Ok(Layout { structure, flows })
}
