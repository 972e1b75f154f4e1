//! Existence-checked chart cache.
//!
//! A chart key maps to at most one authoritative file under the output root. The registry
//! records where that file is; the file itself decides validity. Nothing expires by age.
//!
//! Concurrent misses on the same key may each render. [`ChartCacheService::track`] runs its
//! check-and-write under the registry lock, so the registry never holds a torn record, but the
//! last successful writer wins and files written by the losers are left in place.

use crate::config::{CacheConfig, WardchartConfig};
use crate::raster::{RasterRequest, Rasterizer, rasterizer_from_config};
use crate::registry::{ChartRecord, ChartRegistry, RecordFields};
use crate::{Error, Result, write_atomic};
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::hash::Hasher;
use std::path::{Path, PathBuf};
use wardchart_core::{ChartSpec, ChartType};
use wardchart_render::{RenderOptions, render_chart};

/// How a cached chart is judged valid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InvalidationStrategy {
    /// Valid for as long as the referenced file exists. There is no TTL and no content hash.
    #[default]
    ExistenceCheck,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Svg,
    Png,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Png => "png",
        }
    }

    fn from_path(path: &str) -> Self {
        let is_png = Path::new(path)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
        if is_png { Self::Png } else { Self::Svg }
    }
}

/// What a document builder embeds: a relative file path plus its public reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartReference {
    pub key: String,
    pub chart_type: ChartType,
    pub file_path: String,
    pub url: String,
    pub format: OutputFormat,
}

const MAX_ENCODED_KEY: usize = 120;

/// `<key>_<type>`, with the key escaped so that distinct keys never share a file.
///
/// ASCII letters, digits, `-` and `_` pass through, as does `.` past the first position. Every
/// other byte becomes `~xx` (lowercase hex). Encodings longer than 120 bytes are cut and get
/// `~~` plus a 64-bit hash of the raw key appended.
pub fn output_name(key: &str, chart_type: ChartType) -> String {
    let mut encoded = String::with_capacity(key.len());
    for (i, byte) in key.bytes().enumerate() {
        let keep = byte.is_ascii_alphanumeric()
            || matches!(byte, b'-' | b'_')
            || (byte == b'.' && i > 0);
        if keep {
            encoded.push(char::from(byte));
        } else {
            let _ = write!(&mut encoded, "~{byte:02x}");
        }
    }
    if encoded.len() > MAX_ENCODED_KEY {
        let mut hasher = FxHasher::default();
        hasher.write(key.as_bytes());
        encoded.truncate(MAX_ENCODED_KEY);
        let _ = write!(&mut encoded, "~~{:016x}", hasher.finish());
    }
    format!("{encoded}_{}", chart_type.as_str())
}

fn svg_id(name: &str) -> String {
    let id: String = name
        .chars()
        .map(|c| if c == '~' { '-' } else { c })
        .collect();
    if id.starts_with(|c: char| c.is_ascii_alphabetic()) {
        id
    } else {
        format!("chart-{id}")
    }
}

pub struct ChartCacheService<R> {
    registry: R,
    output_root: PathBuf,
    url_prefix: String,
    strategy: InvalidationStrategy,
    render_options: RenderOptions,
    rasterizer: Option<Box<dyn Rasterizer>>,
    raster_dpi: u32,
}

impl<R: ChartRegistry> ChartCacheService<R> {
    /// Service without a rasterizer; attach one with [`Self::with_rasterizer`].
    pub fn new(registry: R, config: &CacheConfig) -> Self {
        Self {
            registry,
            output_root: config.output_root.clone(),
            url_prefix: config.url_prefix.clone(),
            strategy: InvalidationStrategy::ExistenceCheck,
            render_options: RenderOptions::default(),
            rasterizer: None,
            raster_dpi: config.raster_dpi,
        }
    }

    /// Service with render settings and the rasterizer chosen by `config`.
    pub fn from_config(registry: R, config: &WardchartConfig) -> Result<Self> {
        config.validate()?;
        let mut service = Self::new(registry, &config.cache)
            .with_render_options(RenderOptions::new(config.render.clone()));
        service.rasterizer = rasterizer_from_config(&config.cache)?;
        Ok(service)
    }

    pub fn with_rasterizer(mut self, rasterizer: impl Rasterizer + 'static) -> Self {
        self.rasterizer = Some(Box::new(rasterizer));
        self
    }

    pub fn without_rasterizer(mut self) -> Self {
        self.rasterizer = None;
        self
    }

    pub fn with_render_options(mut self, options: RenderOptions) -> Self {
        self.render_options = options;
        self
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    pub fn strategy(&self) -> InvalidationStrategy {
        self.strategy
    }

    /// Absolute (or root-relative) location of a record's `file_path`.
    pub fn resolve(&self, file_path: &str) -> PathBuf {
        self.output_root.join(file_path)
    }

    fn file_exists(&self, file_path: &str) -> bool {
        match self.strategy {
            InvalidationStrategy::ExistenceCheck => self.resolve(file_path).is_file(),
        }
    }

    fn is_valid(&self, record: &ChartRecord) -> bool {
        self.file_exists(&record.file_path)
    }

    pub fn url_for(&self, file_path: &str) -> String {
        let file_path = file_path.replace('\\', "/");
        let prefix = self.url_prefix.trim_end_matches('/');
        if prefix.is_empty() {
            file_path
        } else {
            format!("{prefix}/{}", file_path.trim_start_matches('/'))
        }
    }

    /// True when `key` has no record, or its record points at a file that no longer exists.
    pub fn needs_generation(&self, key: &str) -> Result<bool> {
        let Some(record) = self.registry.get(key)? else {
            tracing::debug!(key, "no chart record");
            return Ok(true);
        };
        if self.is_valid(&record) {
            tracing::debug!(key, file = %record.file_path, "chart cache hit");
            Ok(false)
        } else {
            tracing::warn!(key, file = %record.file_path, "stale chart record, file is missing");
            Ok(true)
        }
    }

    /// Records `file_path` as the chart for `key` and returns its reference.
    ///
    /// A record whose file still exists is kept as is and its reference returned, so calling
    /// this twice is harmless. Otherwise the record is overwritten, and a reference is only
    /// returned when the new file exists: `None` means the generation attempt failed.
    pub fn track(
        &self,
        key: &str,
        chart_type: ChartType,
        file_path: &str,
        title: Option<&str>,
    ) -> Result<Option<String>> {
        let record = self.registry.upsert_with(key, &mut |current| {
            if current.is_some_and(|r| self.is_valid(r)) {
                return None;
            }
            Some(RecordFields::new(chart_type, file_path, title))
        })?;

        let Some(record) = record.filter(|r| self.is_valid(r)) else {
            tracing::warn!(key, file = file_path, "tracked chart file does not exist");
            return Ok(None);
        };
        Ok(Some(self.url_for(&record.file_path)))
    }

    /// Deletes every record whose file is gone. Returns how many were deleted.
    pub fn cleanup_missing(&self) -> Result<usize> {
        let removed = self.registry.remove_where(&mut |record| {
            let missing = !self.is_valid(record);
            if missing {
                tracing::debug!(key = %record.key, file = %record.file_path, "removing record");
            }
            missing
        })?;
        tracing::info!(removed, "cleaned up chart records with missing files");
        Ok(removed)
    }

    /// The current reference for `key`, if its record is valid.
    pub fn reference(&self, key: &str) -> Result<Option<ChartReference>> {
        Ok(self
            .registry
            .get(key)?
            .filter(|r| self.is_valid(r))
            .map(|r| self.to_reference(&r)))
    }

    fn to_reference(&self, record: &ChartRecord) -> ChartReference {
        ChartReference {
            key: record.key.clone(),
            chart_type: record.chart_type,
            file_path: record.file_path.clone(),
            url: self.url_for(&record.file_path),
            format: OutputFormat::from_path(&record.file_path),
        }
    }

    /// Returns the cached chart for `key`, rendering it on a miss.
    ///
    /// With no record at all, a file already sitting under the conventional name
    /// (`<key>_<type>.png` or `.svg`) is adopted instead of rendering. `Ok(None)` means the
    /// series had no positive value; the registry is not touched in that case.
    pub fn get_or_render(
        &self,
        key: &str,
        spec: &ChartSpec,
        title: Option<&str>,
    ) -> Result<Option<ChartReference>> {
        let existing = self.registry.get(key)?;
        if let Some(record) = existing.as_ref().filter(|r| self.is_valid(r)) {
            tracing::debug!(key, file = %record.file_path, "chart cache hit");
            return Ok(Some(self.to_reference(record)));
        }
        if existing.is_none() {
            if let Some(file_path) = self.conventional_file(key, spec.chart_type()) {
                tracing::info!(key, file = %file_path, "adopting existing chart file");
                if self.track(key, spec.chart_type(), &file_path, title)?.is_some() {
                    return self.reference(key);
                }
            }
        }
        self.render_and_store(key, spec, title, false)
    }

    /// Renders `key` again even when a valid cached file exists, overwriting it.
    pub fn regenerate(
        &self,
        key: &str,
        spec: &ChartSpec,
        title: Option<&str>,
    ) -> Result<Option<ChartReference>> {
        self.render_and_store(key, spec, title, true)
    }

    fn conventional_file(&self, key: &str, chart_type: ChartType) -> Option<String> {
        let name = output_name(key, chart_type);
        let mut formats = vec![OutputFormat::Svg];
        if self.rasterizer.is_some() {
            formats.insert(0, OutputFormat::Png);
        }
        formats
            .into_iter()
            .map(|f| format!("{name}.{}", f.extension()))
            .find(|file_path| self.file_exists(file_path))
    }

    fn render_and_store(
        &self,
        key: &str,
        spec: &ChartSpec,
        title: Option<&str>,
        force: bool,
    ) -> Result<Option<ChartReference>> {
        let chart_type = spec.chart_type();
        let name = output_name(key, chart_type);
        let options = self.render_options.clone().with_chart_id(svg_id(&name));
        let Some(rendered) = render_chart(spec, title, &options)? else {
            tracing::info!(key, %chart_type, "series has no data, no chart produced");
            return Ok(None);
        };

        std::fs::create_dir_all(&self.output_root)
            .map_err(|e| Error::io(&self.output_root, e))?;
        let svg_file = format!("{name}.{}", OutputFormat::Svg.extension());
        let svg_path = self.resolve(&svg_file);
        write_atomic(&svg_path, rendered.svg.as_bytes())?;
        tracing::info!(key, %chart_type, file = %svg_file, "rendered chart");

        let file_path = self.rasterize(key, &svg_path, &name).unwrap_or(svg_file);

        if force {
            self.registry
                .upsert(key, RecordFields::new(chart_type, file_path, title))?;
            return self.reference(key);
        }
        match self.track(key, chart_type, &file_path, title)? {
            Some(_) => self.reference(key),
            None => Ok(None),
        }
    }

    /// Returns the PNG's relative path, or `None` when the SVG has to be served instead.
    fn rasterize(&self, key: &str, svg_path: &Path, name: &str) -> Option<String> {
        let rasterizer = self.rasterizer.as_ref()?;
        let png_file = format!("{name}.{}", OutputFormat::Png.extension());
        let request = RasterRequest {
            input: svg_path.to_path_buf(),
            output: self.resolve(&png_file),
            dpi: self.raster_dpi,
        };
        match rasterizer.rasterize(&request) {
            Ok(()) => Some(png_file),
            Err(err) => {
                // Whatever a failed backend left behind must not pass as a valid chart.
                if request.output.exists() {
                    let _ = std::fs::remove_file(&request.output);
                }
                tracing::warn!(
                    key,
                    rasterizer = rasterizer.name(),
                    error = %err,
                    "rasterization unavailable, serving SVG"
                );
                None
            }
        }
    }
}
