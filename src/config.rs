use crate::layout::SankeyError;
use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Layout constants shared by both layout stages and the renderer.
///
/// Spacing and size fields are in abstract grid units; they only matter
/// relative to each other because the layout is normalized to the unit square.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryParams {
    pub title_space: f64,
    pub corner_pad: f64,
    pub node_height: f64,
    pub node_width: f64,
    pub flow_gap: f64,
    pub node_height_gap: f64,
    pub node_width_gap: f64,
    /// Figure size in inches.
    pub figure_size: (f64, f64),
    /// Font sizes in points.
    pub fontsize_node: f64,
    pub fontsize_flow: f64,
    pub flow_alpha: f64,
    pub curve: f64,
    pub curve_resolution: usize,
}

impl Default for GeometryParams {
    fn default() -> Self {
        Self {
            title_space: 1.0,
            corner_pad: 1.0,
            node_height: 2.0,
            node_width: 2.0,
            flow_gap: 5.0,
            node_height_gap: 1.0,
            node_width_gap: 1.0,
            figure_size: (10.0, 5.0),
            fontsize_node: 6.0,
            fontsize_flow: 4.5,
            flow_alpha: 0.65,
            curve: 0.65,
            curve_resolution: 100,
        }
    }
}

impl GeometryParams {
    /// Horizontal distance between the left edges of adjacent layers.
    pub fn layer_pitch(&self) -> f64 {
        self.node_width + self.node_width_gap + self.flow_gap
    }

    /// Vertical distance between the top edges of adjacent nodes.
    pub fn node_pitch(&self) -> f64 {
        self.node_height + self.node_height_gap
    }

    pub fn validate(&self) -> Result<(), SankeyError> {
        let non_negative = [
            ("title_space", self.title_space),
            ("corner_pad", self.corner_pad),
            ("flow_gap", self.flow_gap),
            ("node_height_gap", self.node_height_gap),
            ("node_width_gap", self.node_width_gap),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(SankeyError::InvalidParameter { name, value });
            }
        }
        let positive = [
            ("node_height", self.node_height),
            ("node_width", self.node_width),
            ("figure_width", self.figure_size.0),
            ("figure_height", self.figure_size.1),
            ("fontsize_node", self.fontsize_node),
            ("fontsize_flow", self.fontsize_flow),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(SankeyError::InvalidParameter { name, value });
            }
        }
        for (name, value) in [("flow_alpha", self.flow_alpha), ("curve", self.curve)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(SankeyError::InvalidParameter { name, value });
            }
        }
        if self.curve_resolution < 2 {
            return Err(SankeyError::InvalidParameter {
                name: "curve_resolution",
                value: self.curve_resolution as f64,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Pixels per inch of figure size.
    pub dpi: f64,
    pub background: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            dpi: 100.0,
            background: "#FFFFFF".to_string(),
        }
    }
}

impl RenderConfig {
    pub fn canvas_size(&self, geometry: &GeometryParams) -> (f64, f64) {
        (
            geometry.figure_size.0 * self.dpi,
            geometry.figure_size.1 * self.dpi,
        )
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub theme: Theme,
    pub geometry: GeometryParams,
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        let theme = Theme::classic();
        let render = RenderConfig {
            background: theme.background.clone(),
            ..Default::default()
        };
        Self {
            theme,
            geometry: GeometryParams::default(),
            render,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    text_color: Option<String>,
    background: Option<String>,
    default_node_color: Option<String>,
    node_border_color: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct GeometryConfigFile {
    title_space: Option<f64>,
    corner_pad: Option<f64>,
    node_height: Option<f64>,
    node_width: Option<f64>,
    flow_gap: Option<f64>,
    node_height_gap: Option<f64>,
    node_width_gap: Option<f64>,
    figure_width: Option<f64>,
    figure_height: Option<f64>,
    fontsize_node: Option<f64>,
    fontsize_flow: Option<f64>,
    flow_alpha: Option<f64>,
    curve: Option<f64>,
    curve_resolution: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RenderConfigFile {
    dpi: Option<f64>,
    background: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    geometry: Option<GeometryConfigFile>,
    render: Option<RenderConfigFile>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Parses a JSON5 config document and merges it over the defaults.
pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = json5::from_str(contents)?;

    if let Some(theme_name) = parsed.theme.as_deref() {
        match theme_name {
            "modern" => config.theme = Theme::modern(),
            "classic" | "default" => config.theme = Theme::classic(),
            other => tracing::warn!(theme = other, "unknown theme, keeping the default"),
        }
        config.render.background = config.theme.background.clone();
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.text_color {
            config.theme.text_color = v;
        }
        if let Some(v) = vars.background {
            config.theme.background = v.clone();
            config.render.background = v;
        }
        if let Some(v) = vars.default_node_color {
            config.theme.default_node_color = v;
        }
        if let Some(v) = vars.node_border_color {
            config.theme.node_border_color = v;
        }
    }

    if let Some(geo) = parsed.geometry {
        let target = &mut config.geometry;
        if let Some(v) = geo.title_space {
            target.title_space = v;
        }
        if let Some(v) = geo.corner_pad {
            target.corner_pad = v;
        }
        if let Some(v) = geo.node_height {
            target.node_height = v;
        }
        if let Some(v) = geo.node_width {
            target.node_width = v;
        }
        if let Some(v) = geo.flow_gap {
            target.flow_gap = v;
        }
        if let Some(v) = geo.node_height_gap {
            target.node_height_gap = v;
        }
        if let Some(v) = geo.node_width_gap {
            target.node_width_gap = v;
        }
        if let Some(v) = geo.figure_width {
            target.figure_size.0 = v;
        }
        if let Some(v) = geo.figure_height {
            target.figure_size.1 = v;
        }
        if let Some(v) = geo.fontsize_node {
            target.fontsize_node = v;
        }
        if let Some(v) = geo.fontsize_flow {
            target.fontsize_flow = v;
        }
        if let Some(v) = geo.flow_alpha {
            target.flow_alpha = v;
        }
        if let Some(v) = geo.curve {
            target.curve = v;
        }
        if let Some(v) = geo.curve_resolution {
            target.curve_resolution = v;
        }
    }

    if let Some(render) = parsed.render {
        if let Some(v) = render.dpi {
            config.render.dpi = v;
        }
        if let Some(v) = render.background {
            config.render.background = v;
        }
    }

    config.geometry.validate()?;
    if !config.render.dpi.is_finite() || config.render.dpi <= 0.0 {
        return Err(SankeyError::InvalidParameter {
            name: "dpi",
            value: config.render.dpi,
        }
        .into());
    }

    Ok(config)
}
