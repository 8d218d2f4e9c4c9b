use sankey_rs_renderer::{Config, SankeyTables, Theme, parse_tables_json, render_tables};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SankeyRenderOptions {
    theme: Option<String>,
    font_family: Option<String>,
    figure_width: Option<f64>,
    figure_height: Option<f64>,
    flow_alpha: Option<f64>,
    curve: Option<f64>,
}

fn build_config(options: SankeyRenderOptions) -> Config {
    let mut config = Config::default();
    if options.theme.as_deref() == Some("modern") {
        config.theme = Theme::modern();
        config.render.background = config.theme.background.clone();
    }

    if let Some(font_family) = options.font_family {
        config.theme.font_family = font_family;
    }
    if let Some(width) = options.figure_width {
        config.geometry.figure_size.0 = width;
    }
    if let Some(height) = options.figure_height {
        config.geometry.figure_size.1 = height;
    }
    if let Some(alpha) = options.flow_alpha {
        config.geometry.flow_alpha = alpha;
    }
    if let Some(curve) = options.curve {
        config.geometry.curve = curve;
    }

    config
}

fn render(tables: &SankeyTables, options_json: Option<String>) -> Result<String, String> {
    let options = match options_json {
        Some(raw) => {
            serde_json::from_str::<SankeyRenderOptions>(&raw).map_err(|e| e.to_string())?
        }
        None => SankeyRenderOptions::default(),
    };
    render_tables(tables, &build_config(options)).map_err(|e| e.to_string())
}

/// Renders tables given as one JSON object with `layers`, `nodes`,
/// `structure` and `flows` arrays of rows keyed by CSV column name.
#[wasm_bindgen]
pub fn render_sankey_svg(
    tables_json: &str,
    options_json: Option<String>,
) -> Result<String, JsValue> {
    let tables = parse_tables_json(tables_json).map_err(|e| JsValue::from_str(&e.to_string()))?;
    render(&tables, options_json).map_err(|e| JsValue::from_str(&e))
}
