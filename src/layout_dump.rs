use crate::layout::{Layout, LayoutWarning};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Flat, serializable view of both layout tables.
#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub layer_count: usize,
    pub max_node_count: usize,
    pub nodes: Vec<NodeDump>,
    pub flows: Vec<FlowDump>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct NodeDump {
    pub layer: String,
    pub node: String,
    pub value: f64,
    pub layer_number: usize,
    pub node_number: usize,
    #[serde(rename = "X_min")]
    pub x_min: f64,
    #[serde(rename = "X_max")]
    pub x_max: f64,
    #[serde(rename = "Y_min")]
    pub y_min: f64,
    #[serde(rename = "Y_max")]
    pub y_max: f64,
    #[serde(rename = "X_delta")]
    pub x_delta: f64,
    #[serde(rename = "Y_delta")]
    pub y_delta: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FlowDump {
    pub start_layer: String,
    pub start_node: String,
    pub end_layer: String,
    pub end_node: String,
    pub value: f64,
    #[serde(rename = "Start_X")]
    pub start_x: f64,
    #[serde(rename = "Start_Y")]
    pub start_y: f64,
    #[serde(rename = "Start_Y_band")]
    pub start_y_band: f64,
    #[serde(rename = "End_X")]
    pub end_x: f64,
    #[serde(rename = "End_Y")]
    pub end_y: f64,
    #[serde(rename = "End_Y_band")]
    pub end_y_band: f64,
    #[serde(rename = "X_delta")]
    pub x_delta: f64,
    #[serde(rename = "Y_delta")]
    pub y_delta: f64,
}

impl LayoutDump {
    pub fn from_layout(layout: &Layout) -> Self {
        let nodes = layout
            .structure
            .nodes
            .iter()
            .map(|node| NodeDump {
                layer: node.key.layer.clone(),
                node: node.key.node.clone(),
                value: node.value,
                layer_number: node.layer_number,
                node_number: node.node_number,
                x_min: node.rect.x_min,
                x_max: node.rect.x_max,
                y_min: node.rect.y_min,
                y_max: node.rect.y_max,
                x_delta: node.rect.x_delta(),
                y_delta: node.rect.y_delta(),
            })
            .collect();

        let flows = layout
            .flows
            .flows
            .iter()
            .map(|flow| FlowDump {
                start_layer: flow.start.layer.clone(),
                start_node: flow.start.node.clone(),
                end_layer: flow.end.layer.clone(),
                end_node: flow.end.node.clone(),
                value: flow.value,
                start_x: flow.start_band.x,
                start_y: flow.start_band.y,
                start_y_band: flow.start_band.y_band,
                end_x: flow.end_band.x,
                end_y: flow.end_band.y,
                end_y_band: flow.end_band.y_band,
                x_delta: flow.x_delta,
                y_delta: flow.y_delta,
            })
            .collect();

        LayoutDump {
            layer_count: layout.structure.layer_count(),
            max_node_count: layout.structure.max_node_count,
            nodes,
            flows,
            warnings: layout.warnings().map(LayoutWarning::to_string).collect(),
        }
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub fn write_layout_dump(path: &Path, layout: &Layout) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_layout(layout);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
