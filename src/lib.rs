#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod parser;
pub mod render;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, GeometryParams, RenderConfig};
pub use ir::{NodeKey, SankeyTables};
pub use layout::{Layout, SankeyError, compute_layout, curve_samples};
pub use parser::{load_tables, parse_tables_json};
pub use render::{DrawSurface, SvgSurface, render_diagram, render_svg};
pub use theme::Theme;

/// Lays out and renders one diagram to an SVG string.
pub fn render_tables(tables: &SankeyTables, config: &Config) -> Result<String, SankeyError> {
    let layout = compute_layout(tables, &config.geometry)?;
    Ok(render_svg(&layout, config))
}
