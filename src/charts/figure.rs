//! Plotly figure description.
//!
//! Only the subset of the Plotly JSON schema the dashboard emits is modelled.
//! A [`Figure`] serializes to the object `Plotly.newPlot` accepts:
//! `{ data, layout, frames }`.

use serde::Serialize;

/// Plotly's default qualitative palette, assigned to series in order
pub const QUALITATIVE_PALETTE: [&str; 10] = [
    "#636efa", "#EF553B", "#00cc96", "#ab63fa", "#FFA15A", "#19d3f3", "#FF6692", "#B6E880",
    "#FF97FF", "#FECB52",
];

/// The sequential Plasma scale as evenly spaced stops
pub const PLASMA: [&str; 10] = [
    "#0d0887", "#46039f", "#7201a8", "#9c179e", "#bd3786", "#d8576b", "#ed7953", "#fb9f3a",
    "#fdca26", "#f0f921",
];

pub fn palette_color(index: usize) -> &'static str {
    QUALITATIVE_PALETTE[index % QUALITATIVE_PALETTE.len()]
}

/// Convert a list of colors into `[[position, color], ...]` stops
pub fn color_stops(colors: &[&str]) -> Vec<(f64, String)> {
    let last = colors.len().saturating_sub(1).max(1) as f64;
    colors
        .iter()
        .enumerate()
        .map(|(i, color)| (i as f64 / last, color.to_string()))
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub frames: Vec<Frame>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Trace {
    Scatter(ScatterTrace),
    Choropleth(ChoroplethTrace),
}

impl Trace {
    pub fn name(&self) -> Option<&str> {
        match self {
            Trace::Scatter(trace) => Some(&trace.name),
            Trace::Choropleth(_) => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScatterTrace {
    pub name: String,
    pub mode: &'static str,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    /// Per-point identity, keeps points matched across animation frames
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hovertext: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legendgroup: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<LineStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChoroplethTrace {
    pub locations: Vec<String>,
    pub locationmode: &'static str,
    pub z: Vec<f64>,
    pub hovertext: Vec<String>,
    pub zmin: f64,
    pub zmax: f64,
    pub colorscale: Vec<(f64, String)>,
    pub colorbar: ColorBar,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColorBar {
    pub title: Title,
}

#[derive(Debug, Clone, Serialize)]
pub struct Marker {
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sizemode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sizeref: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LineStyle {
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dash: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Title {
    pub text: String,
}

impl Title {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Layout {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Title>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xaxis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend: Option<Legend>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo: Option<Geo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub shapes: Vec<Shape>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sliders: Vec<serde_json::Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub updatemenus: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Axis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Title>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub axis_type: Option<&'static str>,
    /// For log axes Plotly expects the range in log10 units
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<[f64; 2]>,
}

impl Axis {
    pub fn titled(text: &str) -> Self {
        Self {
            title: Some(Title::new(text)),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Legend {
    pub title: Title,
}

#[derive(Debug, Clone, Serialize)]
pub struct Geo {
    pub showframe: bool,
    pub showcoastlines: bool,
    pub projection: Projection,
}

#[derive(Debug, Clone, Serialize)]
pub struct Projection {
    #[serde(rename = "type")]
    pub projection_type: &'static str,
}

/// Layout shape; the dashboard only draws horizontal reference lines
#[derive(Debug, Clone, Serialize)]
pub struct Shape {
    #[serde(rename = "type")]
    pub shape_type: &'static str,
    pub xref: &'static str,
    pub yref: &'static str,
    pub x0: f64,
    pub x1: f64,
    pub y0: f64,
    pub y1: f64,
    pub line: LineStyle,
}

impl Shape {
    /// Full-width horizontal line at `y` in data coordinates
    pub fn hline(y: f64, color: &str, dash: &'static str) -> Self {
        Self {
            shape_type: "line",
            xref: "paper",
            yref: "y",
            x0: 0.0,
            x1: 1.0,
            y0: y,
            y1: y,
            line: LineStyle {
                color: color.to_string(),
                dash: Some(dash),
                width: None,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Frame {
    pub name: String,
    pub data: Vec<Trace>,
}
