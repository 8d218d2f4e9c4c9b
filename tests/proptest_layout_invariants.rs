use std::collections::BTreeMap;

use proptest::prelude::*;
use sankey_rs_renderer::layout::PositionedFlow;
use sankey_rs_renderer::{GeometryParams, NodeKey, SankeyTables, compute_layout};

const EPS: f64 = 1e-9;

/// Two-layer diagram whose node totals equal their incident flow sums.
fn build_bipartite(left: usize, right: usize, raw: Vec<(usize, usize, u32)>) -> SankeyTables {
    let mut tables = SankeyTables::new();
    tables.add_layer("L", 1).add_layer("R", 2);
    let mut out_total = vec![0.0; left];
    let mut in_total = vec![0.0; right];
    for (i, j, value) in &raw {
        out_total[i % left] += *value as f64;
        in_total[j % right] += *value as f64;
    }
    for i in 0..left {
        let name = format!("l{i}");
        tables.add_node(&name, "C0", &i.to_string());
        tables.place("L", &name, out_total[i]);
    }
    for j in 0..right {
        let name = format!("r{j}");
        tables.add_node(&name, "C1", &j.to_string());
        tables.place("R", &name, in_total[j]);
    }
    for (i, j, value) in raw {
        tables.add_flow(
            ("L", &format!("l{}", i % left)),
            ("R", &format!("r{}", j % right)),
            value as f64,
        );
    }
    tables
}

fn bipartite() -> impl Strategy<Value = SankeyTables> {
    (
        1usize..5,
        1usize..5,
        prop::collection::vec((0usize..5, 0usize..5, 1u32..100), 0..12),
    )
        .prop_map(|(left, right, raw)| build_bipartite(left, right, raw))
}

/// Arbitrary layers and node counts, no flows.
fn columns() -> impl Strategy<Value = SankeyTables> {
    prop::collection::vec(1usize..7, 1..6).prop_map(|counts| {
        let mut tables = SankeyTables::new();
        for (layer_idx, count) in counts.iter().enumerate() {
            let layer = format!("layer{layer_idx}");
            tables.add_layer(&layer, layer_idx as i64 + 1);
            for n in 0..*count {
                let node = format!("n{layer_idx}_{n}");
                tables.add_node(&node, "", "");
                tables.place(&layer, &node, 1.0);
            }
        }
        tables
    })
}

fn params() -> impl Strategy<Value = GeometryParams> {
    (0.0f64..3.0, 0.0f64..3.0, 0.1f64..5.0, 0.1f64..5.0, 0.0f64..8.0, 0.0f64..3.0, 0.0f64..3.0)
        .prop_map(
            |(title_space, corner_pad, node_height, node_width, flow_gap, hgap, wgap)| {
                GeometryParams {
                    title_space,
                    corner_pad,
                    node_height,
                    node_width,
                    flow_gap,
                    node_height_gap: hgap,
                    node_width_gap: wgap,
                    ..Default::default()
                }
            },
        )
}

fn check_tiling<'a>(
    groups: &BTreeMap<NodeKey, Vec<&'a PositionedFlow>>,
    layout: &sankey_rs_renderer::Layout,
    start_side: bool,
) -> Result<(), TestCaseError> {
    for (key, flows) in groups {
        let node = layout.structure.get(key).expect("node exists");
        let extent = node.rect.y_delta().abs();
        let mut edge = node.rect.y_min;
        for flow in flows {
            let band = if start_side { flow.start_band } else { flow.end_band };
            prop_assert!((band.y_start - edge).abs() < EPS);
            edge = band.y_end;
            prop_assert!((2.0 * band.y_band / extent - flow.value / node.value).abs() < EPS);
        }
        prop_assert!((edge - node.rect.y_max).abs() < EPS);
    }
    Ok(())
}

proptest! {
    #[test]
    fn rectangles_stay_normalized(tables in columns(), params in params()) {
        let layout = compute_layout(&tables, &params).expect("layout");
        for node in &layout.structure.nodes {
            let r = node.rect;
            for v in [r.x_min, r.x_max, 1.0 - r.y_min, 1.0 - r.y_max] {
                prop_assert!((-EPS..=1.0 + EPS).contains(&v));
            }
            prop_assert!(r.x_min <= r.x_max);
        }
    }

    #[test]
    fn node_numbers_are_contiguous(tables in columns()) {
        let layout = compute_layout(&tables, &GeometryParams::default()).expect("layout");
        let mut per_layer: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for node in &layout.structure.nodes {
            per_layer.entry(node.layer_number).or_default().push(node.node_number);
        }
        for numbers in per_layer.values() {
            let expected: Vec<usize> = (0..numbers.len()).collect();
            prop_assert_eq!(numbers, &expected);
        }
    }

    #[test]
    fn bands_tile_nodes_proportionally(tables in bipartite()) {
        let layout = compute_layout(&tables, &GeometryParams::default()).expect("layout");
        prop_assert_eq!(layout.flows.len(), tables.flows.len());
        prop_assert_eq!(layout.warnings().count(), 0);

        let mut outgoing: BTreeMap<NodeKey, Vec<&PositionedFlow>> = BTreeMap::new();
        let mut incoming: BTreeMap<NodeKey, Vec<&PositionedFlow>> = BTreeMap::new();
        for flow in &layout.flows.flows {
            outgoing.entry(flow.start.clone()).or_default().push(flow);
            incoming.entry(flow.end.clone()).or_default().push(flow);
        }
        check_tiling(&outgoing, &layout, true)?;
        check_tiling(&incoming, &layout, false)?;
    }

    #[test]
    fn layout_is_deterministic(tables in bipartite()) {
        let first = compute_layout(&tables, &GeometryParams::default()).expect("layout");
        let second = compute_layout(&tables, &GeometryParams::default()).expect("layout");
        prop_assert_eq!(first, second);
    }
}
