use serde::{Deserialize, Serialize};
use wardchart_core::{BarMode, ChartType};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A text node anchored at `(x, y)`; the renderer decides alignment per use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutLabel {
    pub x: f64,
    pub y: f64,
    pub text: String,
}

impl LayoutLabel {
    pub fn new(x: f64, y: f64, text: impl Into<String>) -> Self {
        Self {
            x,
            y,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendItemLayout {
    pub key: String,
    pub label: String,
    pub fill: String,
    /// Top-left corner of the color swatch.
    pub swatch_x: f64,
    pub swatch_y: f64,
    pub swatch_size: f64,
    /// Start of the label text; `text_y` is the vertical middle of the row.
    pub text_x: f64,
    pub text_y: f64,
    /// Swatch + gap + label width.
    pub width: f64,
    pub row: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendLayout {
    pub rows: usize,
    pub top: f64,
    pub height: f64,
    pub items: Vec<LegendItemLayout>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieSliceLayout {
    pub key: String,
    pub label: String,
    pub value: f64,
    pub fraction: f64,
    /// Degrees, 0 = 3 o'clock, growing clockwise (SVG y-down); the first slice starts at -90.
    pub start_angle: f64,
    pub sweep_angle: f64,
    pub start: Point,
    pub end: Point,
    pub large_arc: bool,
    pub is_full_circle: bool,
    pub fill: String,
    pub percent_label: Option<LayoutLabel>,
}

impl PieSliceLayout {
    pub fn end_angle(&self) -> f64 {
        self.start_angle + self.sweep_angle
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieLayout {
    pub width: f64,
    pub height: f64,
    pub center: Point,
    pub radius: f64,
    pub total: f64,
    pub title: Option<LayoutLabel>,
    pub slices: Vec<PieSliceLayout>,
    pub legend: Vec<LegendItemLayout>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisTick {
    pub value: f64,
    pub label: String,
    /// y for bar charts (horizontal grid line).
    pub position: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarSegmentLayout {
    pub category: String,
    pub value: f64,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub fill: String,
    /// Present only when the segment is tall enough to hold it legibly.
    pub value_label: Option<LayoutLabel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarColumnLayout {
    pub group: String,
    pub total: f64,
    pub x: f64,
    pub width: f64,
    pub bar_x: f64,
    pub bar_width: f64,
    pub group_label: LayoutLabel,
    pub total_label: Option<LayoutLabel>,
    pub segments: Vec<BarSegmentLayout>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarLayout {
    pub width: f64,
    pub height: f64,
    pub mode: BarMode,
    pub plot_left: f64,
    pub plot_right: f64,
    pub plot_top: f64,
    pub plot_bottom: f64,
    pub zero_y: f64,
    pub drawable_height: f64,
    pub max_value: f64,
    pub title: Option<LayoutLabel>,
    pub ticks: Vec<AxisTick>,
    pub columns: Vec<BarColumnLayout>,
    pub legend: LegendLayout,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PyramidBarLayout {
    pub value: f64,
    pub x: f64,
    pub width: f64,
    pub fill: String,
    pub value_label: Option<LayoutLabel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PyramidRowLayout {
    pub bracket: String,
    pub y: f64,
    pub height: f64,
    pub bar_y: f64,
    pub bar_height: f64,
    pub label: LayoutLabel,
    pub left: Option<PyramidBarLayout>,
    pub right: Option<PyramidBarLayout>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PyramidTick {
    pub value: f64,
    pub label: String,
    pub left_x: f64,
    pub right_x: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PyramidLayout {
    pub width: f64,
    pub height: f64,
    pub center_x: f64,
    /// Inner edges of the left and right halves; bars grow away from these.
    pub left_origin: f64,
    pub right_origin: f64,
    pub plot_top: f64,
    pub plot_bottom: f64,
    pub row_height: f64,
    pub scale_factor: f64,
    pub max_value: f64,
    pub title: Option<LayoutLabel>,
    pub rows: Vec<PyramidRowLayout>,
    pub ticks: Vec<PyramidTick>,
    pub legend: LegendLayout,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChartLayout {
    Pie(PieLayout),
    Bar(BarLayout),
    Pyramid(PyramidLayout),
}

impl ChartLayout {
    pub fn chart_type(&self) -> ChartType {
        match self {
            Self::Pie(_) => ChartType::Pie,
            Self::Bar(_) => ChartType::Bar,
            Self::Pyramid(_) => ChartType::Pyramid,
        }
    }

    pub fn size(&self) -> (f64, f64) {
        match self {
            Self::Pie(l) => (l.width, l.height),
            Self::Bar(l) => (l.width, l.height),
            Self::Pyramid(l) => (l.width, l.height),
        }
    }
}
