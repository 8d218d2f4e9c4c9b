use std::collections::HashMap;

use crate::ir::Flow;

use super::{
    BandEnd, FlowLayout, FlowSide, LayoutWarning, PositionedFlow, SankeyError, StructureLayout,
    Table,
};

const VALUE_TOLERANCE: f64 = 1e-9;

/// Splits each node's vertical extent among its incident flows.
///
/// Flows are stacked in one global order, `(start layer, end layer, start
/// node, end node)` with input order breaking ties, on both the outgoing and
/// the incoming side. Each band's width is the flow's share of the node's
/// declared total value.
pub fn layout_flows(
    structure: &StructureLayout,
    flows: &[Flow],
) -> Result<FlowLayout, SankeyError> {
    struct Joined<'a> {
        row: usize,
        flow: &'a Flow,
        start: usize,
        end: usize,
    }

    let mut joined: Vec<Joined<'_>> = Vec::with_capacity(flows.len());
    for (row, flow) in flows.iter().enumerate() {
        if !flow.value.is_finite() {
            return Err(SankeyError::InvalidValue {
                table: Table::Flows,
                row,
                value: flow.value,
            });
        }
        let start_key = flow.start_key();
        let Some(start) = structure.position(&start_key) else {
            return Err(SankeyError::UnknownNode {
                table: Table::Flows,
                row,
                key: start_key,
            });
        };
        let end_key = flow.end_key();
        let Some(end) = structure.position(&end_key) else {
            return Err(SankeyError::UnknownNode {
                table: Table::Flows,
                row,
                key: end_key,
            });
        };
        joined.push(Joined {
            row,
            flow,
            start,
            end,
        });
    }

    let nodes = &structure.nodes;
    joined.sort_by(|a, b| {
        let (sa, ea, sb, eb) = (&nodes[a.start], &nodes[a.end], &nodes[b.start], &nodes[b.end]);
        sa.layer_number
            .cmp(&sb.layer_number)
            .then_with(|| ea.layer_number.cmp(&eb.layer_number))
            .then_with(|| sa.node_number.cmp(&sb.node_number))
            .then_with(|| ea.node_number.cmp(&eb.node_number))
            .then_with(|| a.row.cmp(&b.row))
    });

    let mut incident_out = vec![0.0f64; nodes.len()];
    let mut incident_in = vec![0.0f64; nodes.len()];
    let mut has_out = vec![false; nodes.len()];
    let mut has_in = vec![false; nodes.len()];
    for item in &joined {
        incident_out[item.start] += item.flow.value;
        incident_in[item.end] += item.flow.value;
        has_out[item.start] = true;
        has_in[item.end] = true;
    }
    for idx in 0..nodes.len() {
        if nodes[idx].value != 0.0 {
            continue;
        }
        for incident in [incident_out[idx], incident_in[idx]] {
            if incident != 0.0 {
                return Err(SankeyError::DegenerateValue {
                    key: nodes[idx].key.clone(),
                    incident,
                });
            }
        }
    }

    let mut warnings = Vec::new();
    for (idx, node) in nodes.iter().enumerate() {
        let sides = [
            (FlowSide::Start, has_out[idx], incident_out[idx]),
            (FlowSide::End, has_in[idx], incident_in[idx]),
        ];
        for (side, present, incident) in sides {
            let tolerance = VALUE_TOLERANCE * node.value.abs().max(1.0);
            if present && (incident - node.value).abs() > tolerance {
                warnings.push(LayoutWarning::ValueMismatch {
                    key: node.key.clone(),
                    side,
                    declared: node.value,
                    incident,
                });
            }
        }
    }

    let start_edges = stack_bands(
        joined.iter().map(|item| (item.start, item.flow.value)),
        structure,
    );
    let end_edges = stack_bands(
        joined.iter().map(|item| (item.end, item.flow.value)),
        structure,
    );

    let mut positioned = Vec::with_capacity(joined.len());
    for ((item, start_edge), end_edge) in joined.iter().zip(start_edges).zip(end_edges) {
        let start_node = &nodes[item.start];
        let end_node = &nodes[item.end];
        let start_band = BandEnd::new(start_node.rect.x_max, start_edge.0, start_edge.1);
        let end_band = BandEnd::new(end_node.rect.x_min, end_edge.0, end_edge.1);
        positioned.push(PositionedFlow {
            start: start_node.key.clone(),
            end: end_node.key.clone(),
            value: item.flow.value,
            line1: item.flow.line1.clone(),
            line2: item.flow.line2.clone(),
            color: start_node.color.clone(),
            start_layer_number: start_node.layer_number,
            end_layer_number: end_node.layer_number,
            start_node_number: start_node.node_number,
            end_node_number: end_node.node_number,
            row: item.row,
            start_band,
            end_band,
            x_delta: end_band.x - start_band.x,
            y_delta: end_band.y - start_band.y,
        });
    }

    for warning in &warnings {
        tracing::warn!("{warning}");
    }
    tracing::debug!(flows = positioned.len(), "flow layout computed");

    Ok(FlowLayout {
        flows: positioned,
        warnings,
    })
}

/// Band edges `(y_start, y_end)` for a sequence of `(node, value)` in stacking order.
///
/// Each node's running total is interpolated across its rectangle from
/// `y_min` toward `y_max`; a band starts where the node's previous band ended.
fn stack_bands(
    items: impl Iterator<Item = (usize, f64)>,
    structure: &StructureLayout,
) -> Vec<(f64, f64)> {
    let mut cumulative: HashMap<usize, f64> = HashMap::new();
    let mut last_edge: HashMap<usize, f64> = HashMap::new();
    let mut edges = Vec::new();
    for (idx, value) in items {
        let node = &structure.nodes[idx];
        let rect = node.rect;
        let total = cumulative.entry(idx).or_insert(0.0);
        *total += value;
        // Zero totals only reach here when every incident value is zero too.
        let share = if node.value == 0.0 {
            0.0
        } else {
            *total / node.value
        };
        let y_end = rect.y_min - (rect.y_min - rect.y_max) * share;
        let y_start = last_edge.insert(idx, y_end).unwrap_or(rect.y_min);
        edges.push((y_start, y_end));
    }
    edges
}
