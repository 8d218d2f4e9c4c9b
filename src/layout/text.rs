use crate::config::GeometryParams;

use super::{LabelLine, PositionedFlow, PositionedNode, StructureLayout, TextAlign, TextBlock};

const NODE_LABEL_SLOTS: usize = 4;
const FLOW_LABEL_SLOTS: usize = 2;

/// Name in the top slot, secondary lines in the bottom two, with one slot
/// left blank between them.
pub fn node_label(node: &PositionedNode, params: &GeometryParams) -> TextBlock {
    let (x, y) = node.rect.center();
    let candidates = [
        (node.key.node.as_str(), true, 0),
        (node.line1.as_str(), false, 2),
        (node.line2.as_str(), false, 3),
    ];
    TextBlock {
        x,
        y,
        align: TextAlign::Center,
        font_size: params.fontsize_node,
        slots: NODE_LABEL_SLOTS,
        lines: collect_lines(&candidates),
    }
}

/// Layer titles along the top edge, one per layer.
pub fn layer_titles(structure: &StructureLayout, params: &GeometryParams) -> Vec<TextBlock> {
    let mut titles: Vec<TextBlock> = Vec::new();
    let mut last_layer = None;
    for node in &structure.nodes {
        if last_layer == Some(node.layer_number) {
            continue;
        }
        last_layer = Some(node.layer_number);
        titles.push(TextBlock {
            x: node.rect.x_min + node.rect.x_delta() / 2.0,
            y: 1.0,
            align: TextAlign::Center,
            font_size: params.fontsize_node,
            slots: 1,
            lines: collect_lines(&[(node.key.layer.as_str(), true, 0)]),
        });
    }
    titles
}

/// Right-aligned against the end node: `start->end` over the flow's lines.
pub fn flow_label(flow: &PositionedFlow, params: &GeometryParams) -> TextBlock {
    let title = format!("{}->{}", flow.start.node, flow.end.node);
    let detail = match (flow.line1.trim(), flow.line2.trim()) {
        ("", "") => String::new(),
        (line, "") | ("", line) => line.to_string(),
        (first, second) => format!("{first}, {second}"),
    };
    TextBlock {
        x: flow.end_band.x,
        y: flow.end_band.y,
        align: TextAlign::Right,
        font_size: params.fontsize_flow,
        slots: FLOW_LABEL_SLOTS,
        lines: collect_lines(&[(title.as_str(), true, 0), (detail.as_str(), false, 1)]),
    }
}

fn collect_lines(candidates: &[(&str, bool, usize)]) -> Vec<LabelLine> {
    candidates
        .iter()
        .filter(|(text, _, _)| !text.trim().is_empty())
        .map(|(text, bold, slot)| LabelLine {
            text: text.trim().to_string(),
            bold: *bold,
            slot: *slot,
        })
        .collect()
}
