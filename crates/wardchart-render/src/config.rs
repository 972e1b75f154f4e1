use crate::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use wardchart_core::{ColorAssigner, NumeralFormatter};

/// Rendering knobs shared by every chart family, plus one section per family.
///
/// All fields have defaults, so a partial JSON object (or `{}`) is a valid config.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub numerals: NumeralFormatter,
    /// Cyclic fallback palette. Empty means the built-in default palette.
    pub palette: Vec<String>,
    /// Explicit key -> color assignments (category keys, pyramid side labels).
    pub colors: IndexMap<String, String>,
    pub font_family: String,
    pub background: Option<String>,
    pub title_font_size: f64,
    pub pie: PieConfig,
    pub bar: BarConfig,
    pub pyramid: PyramidConfig,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            numerals: NumeralFormatter::default(),
            palette: Vec::new(),
            colors: IndexMap::new(),
            font_family: "sans-serif".to_string(),
            background: Some("white".to_string()),
            title_font_size: 16.0,
            pie: PieConfig::default(),
            bar: BarConfig::default(),
            pyramid: PyramidConfig::default(),
        }
    }
}

impl RenderConfig {
    pub fn color_assigner(&self) -> ColorAssigner {
        ColorAssigner::with_palette(self.palette.iter().cloned()).with_mapping(
            self.colors
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        )
    }

    /// Height reserved at the top of the canvas for the title row.
    pub fn title_height(&self, title: Option<&str>) -> f64 {
        match title {
            Some(t) if !t.trim().is_empty() => self.title_font_size + 14.0,
            _ => 0.0,
        }
    }

    pub fn validate(&self) -> Result<()> {
        fn positive(name: &str, v: f64) -> Result<()> {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(Error::InvalidConfig {
                    message: format!("{name} must be a positive number, got {v}"),
                })
            }
        }
        fn non_negative(name: &str, v: f64) -> Result<()> {
            if v.is_finite() && v >= 0.0 {
                Ok(())
            } else {
                Err(Error::InvalidConfig {
                    message: format!("{name} must be zero or positive, got {v}"),
                })
            }
        }
        fn at_least_one(name: &str, v: usize) -> Result<()> {
            if v >= 1 {
                Ok(())
            } else {
                Err(Error::InvalidConfig {
                    message: format!("{name} must be at least 1"),
                })
            }
        }

        positive("pie.width", self.pie.width)?;
        positive("pie.height", self.pie.height)?;
        positive("pie.radius", self.pie.radius)?;
        positive("pie.legend_step_y", self.pie.legend_step_y)?;

        positive("bar.width", self.bar.width)?;
        positive("bar.height", self.bar.height)?;
        non_negative("bar.baseline_offset", self.bar.baseline_offset)?;
        non_negative("bar.segment_label_min_height", self.bar.segment_label_min_height)?;
        if !(0.0..1.0).contains(&self.bar.column_padding) {
            return Err(Error::InvalidConfig {
                message: format!(
                    "bar.column_padding must be in [0, 1), got {}",
                    self.bar.column_padding
                ),
            });
        }
        at_least_one("bar.scale_steps", self.bar.scale_steps)?;
        self.bar.legend.validate("bar.legend")?;

        positive("pyramid.width", self.pyramid.width)?;
        positive("pyramid.height", self.pyramid.height)?;
        non_negative("pyramid.margin", self.pyramid.margin)?;
        non_negative("pyramid.center_gap", self.pyramid.center_gap)?;
        at_least_one("pyramid.scale_steps", self.pyramid.scale_steps)?;
        self.pyramid.legend.validate("pyramid.legend")?;
        if self.pyramid.width - self.pyramid.center_gap <= 2.0 * self.pyramid.margin {
            return Err(Error::InvalidConfig {
                message: "pyramid.width leaves no room for bars".to_string(),
            });
        }
        Ok(())
    }
}

/// Horizontal, multi-row legend placed under bar and pyramid charts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LegendConfig {
    /// Maximum number of items on one row.
    pub items_per_row: usize,
    /// Row pitch; also the amount the canvas grows for every row beyond the first.
    pub row_height: f64,
    pub swatch_size: f64,
    pub swatch_gap: f64,
    pub item_gap: f64,
    pub font_size: f64,
}

impl Default for LegendConfig {
    fn default() -> Self {
        Self {
            items_per_row: 4,
            row_height: 22.0,
            swatch_size: 12.0,
            swatch_gap: 6.0,
            item_gap: 20.0,
            font_size: 12.0,
        }
    }
}

impl LegendConfig {
    fn validate(&self, prefix: &str) -> Result<()> {
        if self.items_per_row == 0 {
            return Err(Error::InvalidConfig {
                message: format!("{prefix}.items_per_row must be at least 1"),
            });
        }
        if !(self.row_height.is_finite() && self.row_height > 0.0) {
            return Err(Error::InvalidConfig {
                message: format!("{prefix}.row_height must be positive"),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PieConfig {
    pub width: f64,
    pub height: f64,
    pub radius: f64,
    pub margin: f64,
    /// Distance between the pie's right edge and the legend swatches.
    pub legend_gap: f64,
    pub legend_step_y: f64,
    pub legend_swatch: f64,
    pub font_size: f64,
    pub percent_decimals: usize,
    /// Append `(value, percent)` to legend labels.
    pub show_values: bool,
    /// Slices narrower than this (degrees) get no percentage label.
    pub min_label_sweep: f64,
}

impl Default for PieConfig {
    fn default() -> Self {
        Self {
            width: 640.0,
            height: 400.0,
            radius: 150.0,
            margin: 20.0,
            legend_gap: 30.0,
            legend_step_y: 24.0,
            legend_swatch: 14.0,
            font_size: 12.0,
            percent_decimals: 1,
            show_values: true,
            min_label_sweep: 10.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BarConfig {
    pub width: f64,
    pub height: f64,
    pub margin_left: f64,
    pub margin_right: f64,
    pub margin_top: f64,
    pub margin_bottom: f64,
    /// Height of the row under the plot that holds the group labels.
    pub axis_label_height: f64,
    pub scale_steps: usize,
    /// Lifts the zero line above the bottom of the plot area.
    pub baseline_offset: f64,
    /// Fraction of each column left empty around the bar.
    pub column_padding: f64,
    /// Segments shorter than this (px) carry no value label.
    pub segment_label_min_height: f64,
    pub font_size: f64,
    pub show_totals: bool,
    /// Prepended to every group label (e.g. `"Ward "`).
    pub group_label_prefix: String,
    pub legend: LegendConfig,
}

impl Default for BarConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 450.0,
            margin_left: 60.0,
            margin_right: 20.0,
            margin_top: 20.0,
            margin_bottom: 16.0,
            axis_label_height: 24.0,
            scale_steps: 5,
            baseline_offset: 8.0,
            column_padding: 0.3,
            segment_label_min_height: 20.0,
            font_size: 11.0,
            show_totals: true,
            group_label_prefix: String::new(),
            legend: LegendConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PyramidConfig {
    pub width: f64,
    pub height: f64,
    /// Kept free at the outer end of each half; enters the scale factor.
    pub margin: f64,
    pub margin_top: f64,
    pub margin_bottom: f64,
    /// Width of the central column holding the bracket labels.
    pub center_gap: f64,
    pub tick_label_height: f64,
    pub scale_steps: usize,
    /// Fraction of the row height filled by the bar.
    pub bar_fill_ratio: f64,
    pub font_size: f64,
    pub show_values: bool,
    pub legend: LegendConfig,
}

impl Default for PyramidConfig {
    fn default() -> Self {
        Self {
            width: 720.0,
            height: 520.0,
            margin: 30.0,
            margin_top: 20.0,
            margin_bottom: 16.0,
            center_gap: 60.0,
            tick_label_height: 24.0,
            scale_steps: 4,
            bar_fill_ratio: 0.8,
            font_size: 11.0,
            show_values: false,
            legend: LegendConfig {
                items_per_row: 2,
                ..LegendConfig::default()
            },
        }
    }
}
