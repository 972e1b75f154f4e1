//! Configuration for the chart cache and the rasterizer, loadable from JSON.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use wardchart_render::config::RenderConfig;

/// Which rasterizer backend the cache service uses when `rasterize` is on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RasterTool {
    #[default]
    RsvgConvert,
    Inkscape,
    /// In-process `resvg`; needs the `raster` feature.
    Resvg,
    /// `raster_program` run with `raster_args` (`{input}`, `{output}` and `{dpi}` are
    /// substituted).
    Custom,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Every generated artifact lives directly under this directory.
    pub output_root: PathBuf,
    /// Prefix joined with a record's `file_path` to build the reference handed to documents.
    pub url_prefix: String,
    /// Registry file, relative to `output_root` unless absolute.
    pub registry_file: PathBuf,
    pub rasterize: bool,
    pub raster_dpi: u32,
    pub raster_timeout_secs: u64,
    pub raster_tool: RasterTool,
    /// Overrides the executable for the command-line presets.
    pub raster_program: Option<String>,
    pub raster_args: Vec<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("charts"),
            url_prefix: "/media/charts".to_string(),
            registry_file: PathBuf::from("registry.json"),
            rasterize: true,
            raster_dpi: 150,
            raster_timeout_secs: 30,
            raster_tool: RasterTool::default(),
            raster_program: None,
            raster_args: Vec::new(),
        }
    }
}

impl CacheConfig {
    pub fn with_output_root(mut self, output_root: impl Into<PathBuf>) -> Self {
        self.output_root = output_root.into();
        self
    }

    pub fn raster_timeout(&self) -> Duration {
        Duration::from_secs(self.raster_timeout_secs)
    }

    pub fn registry_path(&self) -> PathBuf {
        if self.registry_file.is_absolute() {
            self.registry_file.clone()
        } else {
            self.output_root.join(&self.registry_file)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.output_root.as_os_str().is_empty() {
            return Err(Error::Config {
                message: "cache.output_root must not be empty".to_string(),
            });
        }
        if self.raster_dpi == 0 {
            return Err(Error::Config {
                message: "cache.raster_dpi must be at least 1".to_string(),
            });
        }
        if self.raster_timeout_secs == 0 {
            return Err(Error::Config {
                message: "cache.raster_timeout_secs must be at least 1".to_string(),
            });
        }
        if self.raster_tool == RasterTool::Custom && self.raster_program.is_none() {
            return Err(Error::Config {
                message: "cache.raster_tool = \"custom\" needs cache.raster_program".to_string(),
            });
        }
        Ok(())
    }
}

/// Top-level configuration file: `{"render": {...}, "cache": {...}}`. Missing fields fall back
/// to their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WardchartConfig {
    pub render: RenderConfig,
    pub cache: CacheConfig,
}

impl WardchartConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let config = Self::from_json_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.render.validate()?;
        self.cache.validate()
    }
}
