use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static HEX_COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#(?:[0-9a-fA-F]{3,4}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$").unwrap());
static CYCLE_COLOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^C(\d+)$").unwrap());

// matplotlib "tab10" palette, also used for the C0..C9 color cycle.
const TAB10: [(&str, &str); 10] = [
    ("blue", "#1f77b4"),
    ("orange", "#ff7f0e"),
    ("green", "#2ca02c"),
    ("red", "#d62728"),
    ("purple", "#9467bd"),
    ("brown", "#8c564b"),
    ("pink", "#e377c2"),
    ("gray", "#7f7f7f"),
    ("olive", "#bcbd22"),
    ("cyan", "#17becf"),
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub text_color: String,
    pub background: String,
    pub default_node_color: String,
    pub node_border_color: String,
}

impl Theme {
    /// Monospace look of the original matplotlib figures.
    pub fn classic() -> Self {
        Self {
            font_family: "Inconsolata, monospace".to_string(),
            text_color: "#000000".to_string(),
            background: "#FFFFFF".to_string(),
            default_node_color: "#1f77b4".to_string(),
            node_border_color: "none".to_string(),
        }
    }

    pub fn modern() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            text_color: "#1C2430".to_string(),
            background: "#FFFFFF".to_string(),
            default_node_color: "#4e79a7".to_string(),
            node_border_color: "#C7D2E5".to_string(),
        }
    }

    /// Resolves a node color cell, falling back to the theme default when blank.
    pub fn node_color(&self, spec: &str) -> String {
        resolve_color(spec).unwrap_or_else(|| self.default_node_color.clone())
    }
}

/// Maps a color cell to an SVG paint. Returns `None` for a blank cell.
///
/// Hex colors pass through. matplotlib `tab:<name>` and `C<n>` names map to
/// the tab10 palette. Anything else is assumed to be an SVG color keyword.
pub fn resolve_color(spec: &str) -> Option<String> {
    let spec = spec.trim();
    if spec.is_empty() {
        return None;
    }
    if HEX_COLOR_RE.is_match(spec) {
        return Some(spec.to_string());
    }
    if let Some(name) = spec.strip_prefix("tab:") {
        let name = if name == "grey" { "gray" } else { name };
        if let Some((_, hex)) = TAB10.iter().find(|(tab, _)| *tab == name) {
            return Some((*hex).to_string());
        }
    }
    if let Some(caps) = CYCLE_COLOR_RE.captures(spec) {
        if let Ok(idx) = caps[1].parse::<usize>() {
            return Some(TAB10[idx % TAB10.len()].1.to_string());
        }
    }
    Some(spec.to_ascii_lowercase())
}
