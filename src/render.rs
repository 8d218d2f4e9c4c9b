use crate::config::{Config, GeometryParams, RenderConfig};
use crate::layout::{
    BandSample, Layout, TextAlign, TextBlock, flow_label, flow_samples, layer_titles, node_label,
};
use crate::theme::{Theme, resolve_color};
use anyhow::Result;
use std::path::Path;

// matplotlib's default line spacing.
const LINE_SPACING: f64 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    /// Points.
    pub font_size: f64,
    pub bold: bool,
    pub align: TextAlign,
    /// Vertical shift from the anchor in line heights; positive is downward.
    pub line_offset: f64,
}

/// Drawing backend. Coordinates are in the unit square with the origin at
/// the bottom left.
pub trait DrawSurface {
    /// `h` may be negative; the rectangle spans `y..y + h` either way.
    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, fill: &str, border: Option<&str>);
    fn fill_band(&mut self, samples: &[BandSample], color: &str, alpha: f64);
    fn text(&mut self, x: f64, y: f64, text: &str, style: &TextStyle);
}

/// Draws nodes, labels and layer titles, then flow bands with their labels.
pub fn render_diagram<S: DrawSurface>(
    surface: &mut S,
    layout: &Layout,
    params: &GeometryParams,
    theme: &Theme,
) {
    let border = resolve_color(&theme.node_border_color).filter(|c| c != "none");
    for node in &layout.structure.nodes {
        let rect = node.rect;
        let fill = theme.node_color(&node.color);
        surface.fill_rect(
            rect.x_min,
            rect.y_min,
            rect.x_delta(),
            rect.y_delta(),
            &fill,
            border.as_deref(),
        );
        draw_text_block(surface, &node_label(node, params));
    }
    for title in layer_titles(&layout.structure, params) {
        draw_text_block(surface, &title);
    }

    for flow in &layout.flows.flows {
        let samples = flow_samples(flow, params.curve, params.curve_resolution);
        let color = theme.node_color(&flow.color);
        surface.fill_band(&samples, &color, params.flow_alpha);
        draw_text_block(surface, &flow_label(flow, params));
    }
}

fn draw_text_block<S: DrawSurface>(surface: &mut S, block: &TextBlock) {
    for line in &block.lines {
        let style = TextStyle {
            font_size: block.font_size,
            bold: line.bold,
            align: block.align,
            line_offset: block.slot_offset(line.slot),
        };
        surface.text(block.x, block.y, &line.text, &style);
    }
}

/// SVG canvas sized `figure_size * dpi` pixels.
pub struct SvgSurface {
    width: f64,
    height: f64,
    dpi: f64,
    font_family: String,
    text_color: String,
    body: String,
}

impl SvgSurface {
    pub fn new(width: f64, height: f64, dpi: f64, theme: &Theme, background: &str) -> Self {
        let mut body = String::new();
        body.push_str(&format!(
            "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
            escape_xml(background)
        ));
        Self {
            width,
            height,
            dpi,
            font_family: theme.font_family.clone(),
            text_color: theme.text_color.clone(),
            body,
        }
    }

    pub fn from_config(geometry: &GeometryParams, render: &RenderConfig, theme: &Theme) -> Self {
        let (width, height) = render.canvas_size(geometry);
        Self::new(width, height, render.dpi, theme, &render.background)
    }

    pub fn finish(self) -> String {
        let (width, height) = (self.width, self.height);
        format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width:.0}\" height=\"{height:.0}\" viewBox=\"0 0 {width:.2} {height:.2}\">{}</svg>",
            self.body
        )
    }

    fn px(&self, x: f64) -> f64 {
        x * self.width
    }

    fn py(&self, y: f64) -> f64 {
        (1.0 - y) * self.height
    }

    fn font_px(&self, points: f64) -> f64 {
        points * self.dpi / 72.0
    }
}

impl DrawSurface for SvgSurface {
    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, fill: &str, border: Option<&str>) {
        let (x0, x1) = (self.px(x), self.px(x + w));
        let (y0, y1) = (self.py(y), self.py(y + h));
        let stroke = match border {
            Some(color) => format!(" stroke=\"{}\" stroke-width=\"0.5\"", escape_xml(color)),
            None => String::new(),
        };
        self.body.push_str(&format!(
            "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{}\"{stroke}/>",
            x0.min(x1),
            y0.min(y1),
            (x1 - x0).abs(),
            (y1 - y0).abs(),
            escape_xml(fill),
        ));
    }

    fn fill_band(&mut self, samples: &[BandSample], color: &str, alpha: f64) {
        if samples.is_empty() {
            return;
        }
        let mut d = String::new();
        for (idx, sample) in samples.iter().enumerate() {
            let cmd = if idx == 0 { "M" } else { "L" };
            d.push_str(&format!(
                "{cmd} {:.2} {:.2} ",
                self.px(sample.x),
                self.py(sample.y_upper)
            ));
        }
        for sample in samples.iter().rev() {
            d.push_str(&format!(
                "L {:.2} {:.2} ",
                self.px(sample.x),
                self.py(sample.y_lower)
            ));
        }
        d.push('Z');
        self.body.push_str(&format!(
            "<path d=\"{d}\" fill=\"{}\" fill-opacity=\"{alpha:.2}\" stroke=\"none\"/>",
            escape_xml(color)
        ));
    }

    fn text(&mut self, x: f64, y: f64, text: &str, style: &TextStyle) {
        let font_px = self.font_px(style.font_size);
        let x = self.px(x);
        let y = self.py(y) + style.line_offset * font_px * LINE_SPACING;
        let anchor = match style.align {
            TextAlign::Left => "start",
            TextAlign::Center => "middle",
            TextAlign::Right => "end",
        };
        let weight = if style.bold { "bold" } else { "normal" };
        self.body.push_str(&format!(
            "<text x=\"{x:.2}\" y=\"{y:.2}\" text-anchor=\"{anchor}\" dominant-baseline=\"central\" font-family=\"{}\" font-size=\"{font_px:.2}\" font-weight=\"{weight}\" fill=\"{}\">{}</text>",
            escape_xml(&self.font_family),
            escape_xml(&self.text_color),
            escape_xml(text)
        ));
    }
}

pub fn render_svg(layout: &Layout, config: &Config) -> String {
    let mut surface = SvgSurface::from_config(&config.geometry, &config.render, &config.theme);
    render_diagram(&mut surface, layout, &config.geometry, &config.theme);
    surface.finish()
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, config: &Config) -> Result<()> {
    let mut opt = usvg::Options::default();
    if let Some(family) = config.theme.font_family.split(',').next() {
        opt.font_family = family.trim().trim_matches('"').to_string();
    }
    let (width, height) = config.render.canvas_size(&config.geometry);
    opt.default_size = usvg::Size::from_wh(width as f32, height as f32)
        .ok_or_else(|| anyhow::anyhow!("Invalid canvas size {width}x{height}"))?;

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
