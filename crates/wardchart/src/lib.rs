#![forbid(unsafe_code)]

//! `wardchart` renders ward statistics charts (pie, stacked/grouped bar, population pyramid)
//! to SVG and keeps the generated files in an existence-checked cache.
//!
//! The cache never expires entries by age: a chart stays valid for as long as its file exists
//! under the configured output root. See [`cache::ChartCacheService`].
//!
//! # Features
//!
//! - `raster`: in-process PNG/PDF conversion through `resvg` and `svg2pdf`
//!   ([`raster::ResvgRasterizer`])

pub mod cache;
pub mod config;
pub mod raster;
pub mod registry;

pub use cache::{ChartCacheService, ChartReference, InvalidationStrategy, OutputFormat};
pub use config::{CacheConfig, WardchartConfig};
pub use raster::{RasterError, RasterRequest, Rasterizer};
pub use registry::{ChartRecord, ChartRegistry, JsonFileRegistry, MemoryRegistry, RecordFields};
pub use wardchart_core::{
    BarMode, BarSeries, ChartSpec, ChartType, ColorAssigner, DEFAULT_AGE_BRACKETS,
    DEFAULT_PALETTE, Grouping, Locale, NumeralFormatter, PieSeries, PyramidRow, PyramidSeries,
    SeriesEntry,
};
pub use wardchart_core::Error as SeriesError;

pub mod render {
    pub use wardchart_render::config::{
        BarConfig, LegendConfig, PieConfig, PyramidConfig, RenderConfig,
    };
    pub use wardchart_render::model::ChartLayout;
    pub use wardchart_render::text::{DeterministicTextMeasurer, TextMeasurer, TextStyle};
    pub use wardchart_render::{
        Error as RenderError, RenderOptions, RenderedChart, layout_chart, render_chart,
    };
}

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Series(#[from] wardchart_core::Error),
    #[error(transparent)]
    Render(#[from] wardchart_render::Error),
    #[error("registry error: {message}")]
    Registry { message: String },
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {message}")]
    Config { message: String },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

static TEMP_COUNTER: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(0);

/// Writes `contents` to a hidden sibling of `path`, then renames it into place, so readers
/// only ever see a missing file or a complete one.
pub(crate) fn write_atomic(path: &std::path::Path, contents: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let seq = TEMP_COUNTER.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    let tmp = path.with_file_name(format!(".{file_name}.{}.{seq}.tmp", std::process::id()));
    std::fs::write(&tmp, contents).map_err(|e| Error::io(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(Error::io(path, e));
    }
    Ok(())
}
