//! Vector-to-raster conversion.
//!
//! A missing or failing rasterizer is an expected condition: every backend reports failure
//! through [`RasterError`] and the cache service falls back to serving the SVG.

use crate::config::{CacheConfig, RasterTool};
use crate::{Error, Result};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::time::{Duration, Instant};

#[cfg(feature = "raster")]
mod in_process;

#[cfg(feature = "raster")]
pub use in_process::{ResvgRasterizer, svg_to_pdf, svg_to_png};

const POLL_INTERVAL: Duration = Duration::from_millis(20);
const STDERR_LIMIT: usize = 400;
const STDERR_GRACE: Duration = Duration::from_millis(250);

#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("rasterization is disabled")]
    Disabled,
    #[error("raster tool `{program}` not found")]
    ToolNotFound { program: String },
    #[error("raster tool `{program}` timed out after {}s", .timeout.as_secs_f64())]
    Timeout { program: String, timeout: Duration },
    #[error("raster tool `{program}` exited with {status}: {stderr}")]
    ExitStatus {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
    #[error("raster output {} is missing or empty", .path.display())]
    EmptyOutput { path: PathBuf },
    #[error("raster I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse SVG")]
    SvgParse,
    #[error("failed to allocate pixmap for raster rendering")]
    PixmapAlloc,
    #[error("failed to encode PNG")]
    PngEncode,
    #[error("failed to convert SVG to PDF")]
    PdfConvert,
}

/// Convert `input` (an SVG file) into `output` at `dpi`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    pub dpi: u32,
}

pub trait Rasterizer: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// On `Ok`, `request.output` exists and is non-empty.
    fn rasterize(&self, request: &RasterRequest) -> std::result::Result<(), RasterError>;
}

/// Always fails with [`RasterError::Disabled`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRasterizer;

impl Rasterizer for NoopRasterizer {
    fn name(&self) -> &str {
        "none"
    }

    fn rasterize(&self, _request: &RasterRequest) -> std::result::Result<(), RasterError> {
        Err(RasterError::Disabled)
    }
}

pub(crate) fn verify_output(path: &Path) -> std::result::Result<(), RasterError> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() && meta.len() > 0 => Ok(()),
        _ => Err(RasterError::EmptyOutput {
            path: path.to_path_buf(),
        }),
    }
}

fn discard_output(path: &Path) {
    if path.exists() {
        let _ = std::fs::remove_file(path);
    }
}

fn truncate_stderr(text: &str) -> String {
    let text = text.trim();
    match text.char_indices().nth(STDERR_LIMIT) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Runs an external converter with a bounded wall-clock timeout. The child is killed once the
/// deadline passes.
#[derive(Debug, Clone)]
pub struct CommandRasterizer {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandRasterizer {
    /// `args` may contain the placeholders `{input}`, `{output}` and `{dpi}`.
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    pub fn rsvg_convert(timeout: Duration) -> Self {
        let args = ["--dpi-x", "{dpi}", "--dpi-y", "{dpi}", "--format", "png"]
            .into_iter()
            .chain(["--output", "{output}", "{input}"])
            .map(str::to_string)
            .collect();
        Self::new("rsvg-convert", args, timeout)
    }

    pub fn inkscape(timeout: Duration) -> Self {
        let args = [
            "{input}",
            "--export-type=png",
            "--export-filename={output}",
            "--export-dpi={dpi}",
        ]
        .into_iter()
        .map(str::to_string)
        .collect();
        Self::new("inkscape", args, timeout)
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn expand_args(&self, request: &RasterRequest) -> Vec<String> {
        let input = request.input.to_string_lossy();
        let output = request.output.to_string_lossy();
        let dpi = request.dpi.to_string();
        self.args
            .iter()
            .map(|a| {
                a.replace("{input}", &input)
                    .replace("{output}", &output)
                    .replace("{dpi}", &dpi)
            })
            .collect()
    }
}

impl Rasterizer for CommandRasterizer {
    fn name(&self) -> &str {
        &self.program
    }

    fn rasterize(&self, request: &RasterRequest) -> std::result::Result<(), RasterError> {
        let args = self.expand_args(request);
        let spawned = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn();
        let mut child = match spawned {
            Ok(child) => child,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RasterError::ToolNotFound {
                    program: self.program.clone(),
                });
            }
            Err(e) => return Err(RasterError::Io(e)),
        };

        // Drain stderr on a side thread so a chatty tool cannot block on a full pipe. The
        // pipe stays open for as long as any descendant of the tool holds it, so the result
        // comes back over a channel and is never joined.
        let (stderr_tx, stderr_rx) = mpsc::channel();
        if let Some(mut pipe) = child.stderr.take() {
            std::thread::spawn(move || {
                let mut buf = String::new();
                let _ = pipe.read_to_string(&mut buf);
                let _ = stderr_tx.send(buf);
            });
        }

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                discard_output(&request.output);
                return Err(RasterError::Timeout {
                    program: self.program.clone(),
                    timeout: self.timeout,
                });
            }
            std::thread::sleep(POLL_INTERVAL);
        };

        if !status.success() {
            let stderr = stderr_rx
                .recv_timeout(STDERR_GRACE)
                .map(|text| truncate_stderr(&text))
                .unwrap_or_default();
            discard_output(&request.output);
            return Err(RasterError::ExitStatus {
                program: self.program.clone(),
                status,
                stderr,
            });
        }
        if let Err(err) = verify_output(&request.output) {
            discard_output(&request.output);
            return Err(err);
        }
        tracing::debug!(
            program = %self.program,
            output = %request.output.display(),
            "rasterized"
        );
        Ok(())
    }
}

/// Builds the configured backend, or `None` when rasterization is switched off.
pub fn rasterizer_from_config(config: &CacheConfig) -> Result<Option<Box<dyn Rasterizer>>> {
    if !config.rasterize {
        return Ok(None);
    }
    let timeout = config.raster_timeout();
    let command = match config.raster_tool {
        RasterTool::RsvgConvert => CommandRasterizer::rsvg_convert(timeout),
        RasterTool::Inkscape => CommandRasterizer::inkscape(timeout),
        RasterTool::Custom => {
            let Some(program) = config.raster_program.as_deref() else {
                return Err(Error::Config {
                    message: "cache.raster_tool = \"custom\" needs cache.raster_program"
                        .to_string(),
                });
            };
            return Ok(Some(Box::new(CommandRasterizer::new(
                program,
                config.raster_args.clone(),
                timeout,
            ))));
        }
        RasterTool::Resvg => return Ok(resvg_backend()),
    };
    let command = match config.raster_program.as_deref() {
        Some(program) => command.with_program(program),
        None => command,
    };
    Ok(Some(Box::new(command)))
}

#[cfg(feature = "raster")]
fn resvg_backend() -> Option<Box<dyn Rasterizer>> {
    Some(Box::new(ResvgRasterizer::default()))
}

#[cfg(not(feature = "raster"))]
fn resvg_backend() -> Option<Box<dyn Rasterizer>> {
    tracing::warn!("raster_tool = \"resvg\" needs the `raster` feature; rasterization disabled");
    None
}
