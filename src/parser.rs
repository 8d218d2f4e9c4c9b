use crate::ir::{Flow, Layer, Node, Placement, SankeyTables};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::io::Read;
use std::path::{Path, PathBuf};

pub const LAYERS_FILE: &str = "layers.csv";
pub const NODES_FILE: &str = "nodes.csv";
pub const STRUCTURE_FILE: &str = "structure.csv";
pub const FLOWS_FILE: &str = "flows.csv";

/// Paths of the four CSV tables of one diagram.
#[derive(Debug, Clone)]
pub struct TablePaths {
    pub layers: PathBuf,
    pub nodes: PathBuf,
    pub structure: PathBuf,
    pub flows: PathBuf,
}

impl TablePaths {
    /// The conventional file names inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            layers: dir.join(LAYERS_FILE),
            nodes: dir.join(NODES_FILE),
            structure: dir.join(STRUCTURE_FILE),
            flows: dir.join(FLOWS_FILE),
        }
    }
}

pub fn parse_layers<R: Read>(reader: R) -> Result<Vec<Layer>> {
    read_table(reader)
}

pub fn parse_nodes<R: Read>(reader: R) -> Result<Vec<Node>> {
    read_table(reader)
}

pub fn parse_structure<R: Read>(reader: R) -> Result<Vec<Placement>> {
    read_table(reader)
}

pub fn parse_flows<R: Read>(reader: R) -> Result<Vec<Flow>> {
    read_table(reader)
}

pub fn load_tables(dir: &Path) -> Result<SankeyTables> {
    load_table_files(&TablePaths::in_dir(dir))
}

pub fn load_table_files(paths: &TablePaths) -> Result<SankeyTables> {
    let tables = SankeyTables {
        layers: parse_layers(open(&paths.layers)?)
            .with_context(|| format!("reading {}", paths.layers.display()))?,
        nodes: parse_nodes(open(&paths.nodes)?)
            .with_context(|| format!("reading {}", paths.nodes.display()))?,
        structure: parse_structure(open(&paths.structure)?)
            .with_context(|| format!("reading {}", paths.structure.display()))?,
        flows: parse_flows(open(&paths.flows)?)
            .with_context(|| format!("reading {}", paths.flows.display()))?,
    };
    tracing::debug!(
        layers = tables.layers.len(),
        nodes = tables.nodes.len(),
        placements = tables.structure.len(),
        flows = tables.flows.len(),
        "loaded tables"
    );
    Ok(tables)
}

/// Tables as one JSON document: `{ "layers": [...], "nodes": [...], ... }`
/// with rows keyed by the CSV column names.
pub fn parse_tables_json(input: &str) -> Result<SankeyTables> {
    Ok(serde_json::from_str(input)?)
}

fn open(path: &Path) -> Result<std::fs::File> {
    std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))
}

fn read_table<T: DeserializeOwned, R: Read>(reader: R) -> Result<Vec<T>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut rows = Vec::new();
    for record in rdr.deserialize() {
        rows.push(record?);
    }
    Ok(rows)
}
