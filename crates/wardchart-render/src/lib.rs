#![forbid(unsafe_code)]

//! Headless layout + SVG rendering for ward statistics charts.
//!
//! Layout (pure geometry, see [`pie`], [`bar`], [`pyramid`]) is kept apart from
//! serialization ([`svg`]) so the math can be tested on its own.

pub mod bar;
pub mod config;
pub mod legend;
pub mod model;
pub mod pie;
pub mod pyramid;
pub mod svg;
pub mod text;

use crate::config::RenderConfig;
use crate::model::{ChartLayout, LayoutLabel};
use crate::text::{DeterministicTextMeasurer, TextMeasurer};
use std::sync::Arc;
use wardchart_core::{ChartSpec, ChartType};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Series(#[from] wardchart_core::Error),
    #[error("invalid render config: {message}")]
    InvalidConfig { message: String },
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Clone)]
pub struct RenderOptions {
    pub config: RenderConfig,
    pub text_measurer: Arc<dyn TextMeasurer + Send + Sync>,
    /// Written to the root `<svg id="...">` when set.
    pub chart_id: Option<String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            config: RenderConfig::default(),
            text_measurer: Arc::new(DeterministicTextMeasurer::default()),
            chart_id: None,
        }
    }
}

impl RenderOptions {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn with_chart_id(mut self, chart_id: impl Into<String>) -> Self {
        self.chart_id = Some(chart_id.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct RenderedChart {
    pub chart_type: ChartType,
    pub svg: String,
    pub width: f64,
    pub height: f64,
}

pub(crate) fn title_label(
    title: Option<&str>,
    width: f64,
    config: &RenderConfig,
) -> Option<LayoutLabel> {
    let title = title.map(str::trim).filter(|t| !t.is_empty())?;
    Some(LayoutLabel::new(
        width / 2.0,
        config.title_font_size + 6.0,
        title,
    ))
}

/// Computes chart geometry. `Ok(None)` means the series holds no positive value and no chart
/// should be produced.
pub fn layout_chart(
    spec: &ChartSpec,
    title: Option<&str>,
    options: &RenderOptions,
) -> Result<Option<ChartLayout>> {
    options.config.validate()?;
    let measurer = options.text_measurer.as_ref();
    let config = &options.config;

    let layout = match spec {
        ChartSpec::Pie(series) => {
            pie::layout_pie(series, title, config, measurer).map(ChartLayout::Pie)
        }
        ChartSpec::Bar(series) => {
            bar::layout_bar(series, title, config, measurer)?.map(ChartLayout::Bar)
        }
        ChartSpec::Pyramid(series) => {
            pyramid::layout_pyramid(series, title, config, measurer)?.map(ChartLayout::Pyramid)
        }
    };
    if layout.is_none() {
        tracing::debug!(chart_type = %spec.chart_type(), "empty series, no chart");
    }
    Ok(layout)
}

/// Lays out and serializes a chart. `Ok(None)` for an all-zero series.
pub fn render_chart(
    spec: &ChartSpec,
    title: Option<&str>,
    options: &RenderOptions,
) -> Result<Option<RenderedChart>> {
    let Some(layout) = layout_chart(spec, title, options)? else {
        return Ok(None);
    };
    let (width, height) = layout.size();
    let svg = svg::render_layout_svg(&layout, title, options);
    Ok(Some(RenderedChart {
        chart_type: layout.chart_type(),
        svg,
        width,
        height,
    }))
}
