use std::collections::{BTreeMap, HashMap};

use crate::config::GeometryParams;
use crate::ir::{Node, NodeKey, Placement, SankeyTables};

use super::{LayoutWarning, PositionedNode, Rect, SankeyError, StructureLayout, Table};

/// Places every Structure row as a normalized rectangle.
///
/// Layers run left to right by layer number. Within a layer, nodes stack by
/// node-order hint, then by Structure row. Layers with fewer nodes than the
/// tallest one are shifted toward the middle.
pub fn layout_structure(
    tables: &SankeyTables,
    params: &GeometryParams,
) -> Result<StructureLayout, SankeyError> {
    params.validate()?;
    if tables.is_empty() {
        tracing::debug!(
            layers = tables.layers.len(),
            nodes = tables.nodes.len(),
            placements = tables.structure.len(),
            "nothing to place"
        );
        return Ok(StructureLayout::default());
    }

    let mut warnings = Vec::new();

    let mut layer_numbers: HashMap<&str, usize> = HashMap::with_capacity(tables.layers.len());
    for layer in &tables.layers {
        let Some(layer_number) = layer
            .order
            .checked_sub(1)
            .and_then(|n| usize::try_from(n).ok())
        else {
            return Err(SankeyError::InvalidLayerOrder {
                layer: layer.name.clone(),
                order: layer.order,
            });
        };
        if layer_numbers.contains_key(layer.name.as_str()) {
            warnings.push(LayoutWarning::DuplicateLayer {
                layer: layer.name.clone(),
            });
            continue;
        }
        layer_numbers.insert(layer.name.as_str(), layer_number);
    }

    let mut node_rows: HashMap<&str, &Node> = HashMap::with_capacity(tables.nodes.len());
    for node in &tables.nodes {
        if node_rows.contains_key(node.name.as_str()) {
            warnings.push(LayoutWarning::DuplicateNode {
                node: node.name.clone(),
            });
            continue;
        }
        node_rows.insert(node.name.as_str(), node);
    }

    struct Joined<'a> {
        row: usize,
        placement: &'a Placement,
        node: &'a Node,
        layer_number: usize,
    }

    let mut joined: Vec<Joined<'_>> = Vec::with_capacity(tables.structure.len());
    let mut rows_by_key: HashMap<NodeKey, Vec<usize>> = HashMap::new();
    let mut key_order: Vec<NodeKey> = Vec::new();
    for (row, placement) in tables.structure.iter().enumerate() {
        if !placement.value.is_finite() {
            return Err(SankeyError::InvalidValue {
                table: Table::Structure,
                row,
                value: placement.value,
            });
        }
        let Some(&layer_number) = layer_numbers.get(placement.layer.as_str()) else {
            return Err(SankeyError::UnknownLayer {
                table: Table::Structure,
                row,
                layer: placement.layer.clone(),
            });
        };
        let Some(&node) = node_rows.get(placement.node.as_str()) else {
            return Err(SankeyError::UnknownNode {
                table: Table::Structure,
                row,
                key: NodeKey::new(&placement.layer, &placement.node),
            });
        };
        let key = NodeKey::new(&placement.layer, &placement.node);
        let rows = rows_by_key.entry(key.clone()).or_default();
        if rows.is_empty() {
            key_order.push(key);
        }
        rows.push(row);
        joined.push(Joined {
            row,
            placement,
            node,
            layer_number,
        });
    }
    for key in key_order {
        if let Some(rows) = rows_by_key.remove(&key) {
            if rows.len() > 1 {
                warnings.push(LayoutWarning::DuplicatePlacement { key, rows });
            }
        }
    }

    // Stable: equal hints keep Structure row order.
    joined.sort_by(|a, b| {
        a.layer_number
            .cmp(&b.layer_number)
            .then_with(|| a.node.order.cmp(&b.node.order))
    });

    // Layer orders may be sparse; only occupied layers get a count.
    let mut node_numbers = Vec::with_capacity(joined.len());
    let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
    for item in &joined {
        let count = counts.entry(item.layer_number).or_insert(0);
        node_numbers.push(*count);
        *count += 1;
    }
    let max_node_count = counts.values().copied().max().unwrap_or(0).max(1);

    let layer_pitch = params.layer_pitch();
    let node_pitch = params.node_pitch();
    let raw: Vec<Rect> = joined
        .iter()
        .zip(&node_numbers)
        .map(|(item, &node_number)| {
            let x_min = item.layer_number as f64 * layer_pitch;
            let y_min = node_number as f64 * node_pitch;
            Rect {
                x_min,
                x_max: x_min + params.node_width,
                y_min,
                y_max: y_min + params.node_height,
            }
        })
        .collect();

    let x_extent = raw.iter().map(|r| r.x_max).fold(0.0, f64::max);
    let y_extent = raw.iter().map(|r| r.y_max).fold(0.0, f64::max);
    let x_den = positive_or_one(x_extent + 2.0 * params.corner_pad);
    let y_den = positive_or_one(y_extent + 2.0 * params.corner_pad + params.title_space);

    let mut nodes = Vec::with_capacity(joined.len());
    for ((item, &node_number), rect) in joined.iter().zip(&node_numbers).zip(&raw) {
        let layer_node_count = counts.get(&item.layer_number).copied().unwrap_or(1);
        let y_pad = 0.5 * (1.0 - layer_node_count as f64 / max_node_count as f64) * y_den;
        let x_min = (params.corner_pad + rect.x_min) / x_den;
        let x_max = (params.corner_pad + rect.x_max) / x_den;
        let y_min = (params.corner_pad + rect.y_min + y_pad) / y_den;
        let y_max = (params.corner_pad + rect.y_max + y_pad) / y_den;
        nodes.push(PositionedNode {
            key: NodeKey::new(&item.placement.layer, &item.placement.node),
            line1: item.node.line1.clone(),
            line2: item.node.line2.clone(),
            color: item.node.color.clone(),
            value: item.placement.value,
            layer_number: item.layer_number,
            node_number,
            layer_node_count,
            rect: Rect {
                x_min,
                x_max,
                y_min: 1.0 - y_min,
                y_max: 1.0 - y_max,
            },
        });
        tracing::trace!(row = item.row, node = %nodes[nodes.len() - 1].key, "placed node");
    }

    for warning in &warnings {
        tracing::warn!("{warning}");
    }
    tracing::debug!(
        nodes = nodes.len(),
        layers = counts.len(),
        max_node_count,
        "structure layout computed"
    );

    Ok(StructureLayout::new(nodes, max_node_count, warnings))
}

fn positive_or_one(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    fn two_layer_tables() -> SankeyTables {
        let mut tables = SankeyTables::new();
        tables
            .add_layer("A", 1)
            .add_layer("B", 2)
            .add_node("n1", "tab:blue", "1")
            .add_node("n2", "tab:orange", "1")
            .add_node("n3", "tab:green", "2")
            .place("A", "n1", 10.0)
            .place("B", "n2", 6.0)
            .place("B", "n3", 4.0);
        tables
    }

    #[test]
    fn places_nodes_in_layer_columns() {
        let layout = layout_structure(&two_layer_tables(), &GeometryParams::default())
            .expect("layout should succeed");
        assert_eq!(layout.len(), 3);
        assert_eq!(layout.max_node_count, 2);

        // x_den = (8 + 2) + 2 = 12
        let n1 = layout.get(&NodeKey::new("A", "n1")).expect("n1");
        assert!((n1.rect.x_min - 1.0 / 12.0).abs() < EPS);
        assert!((n1.rect.x_max - 3.0 / 12.0).abs() < EPS);
        let n2 = layout.get(&NodeKey::new("B", "n2")).expect("n2");
        assert!((n2.rect.x_min - 9.0 / 12.0).abs() < EPS);
        assert_eq!((n2.layer_number, n2.node_number), (1, 0));
        let n3 = layout.get(&NodeKey::new("B", "n3")).expect("n3");
        assert_eq!((n3.layer_number, n3.node_number), (1, 1));
    }

    #[test]
    fn centers_shorter_layers() {
        let layout = layout_structure(&two_layer_tables(), &GeometryParams::default())
            .expect("layout should succeed");
        // y_den = 5 + 2 + 1 = 8; the single node of A gets a pad of 0.25 * 8 = 2.
        let n1 = layout.get(&NodeKey::new("A", "n1")).expect("n1");
        assert!((n1.rect.y_min - (1.0 - 3.0 / 8.0)).abs() < EPS);
        assert!((n1.rect.y_max - (1.0 - 5.0 / 8.0)).abs() < EPS);
        assert!(n1.rect.y_delta() < 0.0);

        let n2 = layout.get(&NodeKey::new("B", "n2")).expect("n2");
        assert!((n2.rect.y_min - (1.0 - 1.0 / 8.0)).abs() < EPS);
        let n3 = layout.get(&NodeKey::new("B", "n3")).expect("n3");
        assert!(n3.rect.y_min < n2.rect.y_max);
    }

    #[test]
    fn single_node_is_centered_below_title_space() {
        let mut tables = SankeyTables::new();
        tables
            .add_layer("Only", 1)
            .add_node("solo", "", "")
            .place("Only", "solo", 1.0);
        let params = GeometryParams::default();
        let layout = layout_structure(&tables, &params).expect("layout should succeed");
        let rect = layout.nodes[0].rect;
        let y_den = params.node_height + 2.0 * params.corner_pad + params.title_space;
        let (_, mid_y) = rect.center();
        assert!((mid_y - 0.5 * (1.0 + params.title_space / y_den)).abs() < EPS);
        let (mid_x, _) = rect.center();
        assert!((mid_x - 0.5).abs() < EPS);
    }

    #[test]
    fn node_order_then_row_order() {
        let mut tables = SankeyTables::new();
        tables
            .add_layer("L", 1)
            .add_node("late", "", "9")
            .add_node("tie_a", "", "2")
            .add_node("tie_b", "", "2")
            .add_node("early", "", "1")
            .place("L", "late", 1.0)
            .place("L", "tie_b", 1.0)
            .place("L", "tie_a", 1.0)
            .place("L", "early", 1.0);
        let layout = layout_structure(&tables, &GeometryParams::default()).expect("layout");
        let order: Vec<(&str, usize)> = layout
            .nodes
            .iter()
            .map(|n| (n.key.node.as_str(), n.node_number))
            .collect();
        assert_eq!(
            order,
            vec![("early", 0), ("tie_b", 1), ("tie_a", 2), ("late", 3)]
        );
    }

    #[test]
    fn unknown_layer_and_node_are_reference_errors() {
        let mut tables = two_layer_tables();
        tables.place("C", "n1", 1.0);
        let err = layout_structure(&tables, &GeometryParams::default()).unwrap_err();
        assert_eq!(
            err,
            SankeyError::UnknownLayer {
                table: Table::Structure,
                row: 3,
                layer: "C".to_string()
            }
        );

        let mut tables = two_layer_tables();
        tables.place("B", "ghost", 1.0);
        let err = layout_structure(&tables, &GeometryParams::default()).unwrap_err();
        assert!(err.is_reference_error());
        assert_eq!(err.missing_key(), Some(NodeKey::new("B", "ghost")));
    }

    #[test]
    fn duplicate_placement_is_a_warning() {
        let mut tables = two_layer_tables();
        tables.place("B", "n2", 6.0);
        let layout = layout_structure(&tables, &GeometryParams::default()).expect("layout");
        assert_eq!(layout.len(), 4);
        assert_eq!(
            layout.warnings,
            vec![LayoutWarning::DuplicatePlacement {
                key: NodeKey::new("B", "n2"),
                rows: vec![1, 3],
            }]
        );
        let numbers: Vec<usize> = layout
            .nodes
            .iter()
            .filter(|n| n.layer_number == 1)
            .map(|n| n.node_number)
            .collect();
        assert_eq!(numbers, vec![0, 1, 2]);
        assert_eq!(layout.get(&NodeKey::new("B", "n2")).map(|n| n.node_number), Some(0));
    }

    #[test]
    fn empty_tables_give_empty_layout() {
        let layout = layout_structure(&SankeyTables::new(), &GeometryParams::default())
            .expect("empty input is valid");
        assert!(layout.is_empty());

        let mut tables = SankeyTables::new();
        tables.add_layer("A", 1).place("A", "n1", 1.0);
        let layout = layout_structure(&tables, &GeometryParams::default())
            .expect("no nodes is valid");
        assert!(layout.is_empty());
    }

    #[test]
    fn rejects_layer_order_below_one() {
        let mut tables = two_layer_tables();
        tables.add_layer("Z", 0);
        let err = layout_structure(&tables, &GeometryParams::default()).unwrap_err();
        assert!(matches!(err, SankeyError::InvalidLayerOrder { order: 0, .. }));

        let mut tables = two_layer_tables();
        tables.add_layer("Low", i64::MIN);
        let err = layout_structure(&tables, &GeometryParams::default()).unwrap_err();
        assert!(matches!(err, SankeyError::InvalidLayerOrder { order: i64::MIN, .. }));
    }

    #[test]
    fn sparse_layer_orders_keep_their_columns() {
        let mut tables = SankeyTables::new();
        tables
            .add_layer("A", 1)
            .add_layer("Z", i64::MAX)
            .add_node("first", "", "")
            .add_node("last", "", "")
            .add_node("other", "", "")
            .place("A", "first", 1.0)
            .place("Z", "last", 1.0)
            .place("Z", "other", 1.0);
        let layout = layout_structure(&tables, &GeometryParams::default()).expect("layout");
        assert_eq!(layout.max_node_count, 2);
        let first = layout.get(&NodeKey::new("A", "first")).expect("first");
        let last = layout.get(&NodeKey::new("Z", "last")).expect("last");
        assert_eq!(first.layer_number, 0);
        assert_eq!(last.layer_number, (i64::MAX - 1) as usize);
        assert_eq!((first.layer_node_count, last.layer_node_count), (1, 2));
        assert!(first.rect.x_min < last.rect.x_min);
        assert!(last.rect.x_max <= 1.0);
    }

    #[test]
    fn mixed_order_hints_sort_without_panicking() {
        let hints = ["2", "10", "1a", "3", "20", "1b", "5", "30", "x"];
        let mut tables = SankeyTables::new();
        tables.add_layer("L", 1);
        for i in 0..60 {
            let name = format!("n{i}");
            tables
                .add_node(&name, "", hints[i % hints.len()])
                .place("L", &name, 1.0);
        }
        let layout = layout_structure(&tables, &GeometryParams::default()).expect("layout");
        let head: Vec<&str> = layout
            .nodes
            .iter()
            .take(3)
            .map(|n| n.key.node.as_str())
            .collect();
        // "2" is the lowest hint; text hints follow every numeric one.
        assert_eq!(head, vec!["n0", "n9", "n18"]);
        let last = layout.nodes.last().expect("nodes");
        assert_eq!(last.key.node, "n53");
        assert_eq!(last.node_number, 59);
    }

    #[test]
    fn duplicate_layer_and_node_rows_keep_the_first() {
        let mut tables = two_layer_tables();
        tables.add_layer("B", 5).add_node("n2", "tab:red", "7");
        let layout = layout_structure(&tables, &GeometryParams::default()).expect("layout");
        assert_eq!(
            layout.warnings,
            vec![
                LayoutWarning::DuplicateLayer {
                    layer: "B".to_string()
                },
                LayoutWarning::DuplicateNode {
                    node: "n2".to_string()
                },
            ]
        );
        let n2 = layout.get(&NodeKey::new("B", "n2")).expect("n2");
        assert_eq!(n2.layer_number, 1);
        assert_eq!(n2.color, "tab:orange");
        assert_eq!(n2.node_number, 0);
    }

    #[test]
    fn non_finite_structure_value_is_an_error() {
        for value in [f64::NAN, f64::INFINITY] {
            let mut tables = two_layer_tables();
            tables.place("A", "n3", value);
            let err = layout_structure(&tables, &GeometryParams::default()).unwrap_err();
            assert!(matches!(
                err,
                SankeyError::InvalidValue {
                    table: Table::Structure,
                    row: 3,
                    ..
                }
            ));
        }
    }
}
