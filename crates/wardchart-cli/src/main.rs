use serde::Serialize;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use wardchart::render::{RenderOptions, render_chart};
use wardchart::{
    ChartCacheService, ChartRecord, ChartRegistry, ChartSpec, JsonFileRegistry, WardchartConfig,
};

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Chart(wardchart::Error),
    Json(serde_json::Error),
    NoChart,
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Chart(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
            CliError::NoChart => write!(f, "Series has no positive value; no chart produced"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<wardchart::Error> for CliError {
    fn from(value: wardchart::Error) -> Self {
        Self::Chart(value)
    }
}

impl From<wardchart::render::RenderError> for CliError {
    fn from(value: wardchart::render::RenderError) -> Self {
        Self::Chart(value.into())
    }
}

impl From<wardchart::SeriesError> for CliError {
    fn from(value: wardchart::SeriesError) -> Self {
        Self::Chart(value.into())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Command {
    #[default]
    Render,
    Svg,
    Status,
    List,
    Cleanup,
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    config: Option<PathBuf>,
    out_dir: Option<PathBuf>,
    out: Option<PathBuf>,
    key: Option<String>,
    title: Option<String>,
    force: bool,
    no_raster: bool,
    pretty: bool,
    verbose: bool,
}

fn usage() -> &'static str {
    "wardchart-cli\n\
\n\
USAGE:\n\
  wardchart-cli render [--key <key>] [--title <text>] [--force] [--no-raster] [<series.json>|-]\n\
  wardchart-cli svg [--title <text>] [--out <path>] [<series.json>|-]\n\
  wardchart-cli status <key>\n\
  wardchart-cli list [--pretty]\n\
  wardchart-cli cleanup\n\
\n\
OPTIONS (all commands):\n\
  --config <path>    JSON config file ({\"render\": {...}, \"cache\": {...}})\n\
  --out-dir <dir>    chart output root (overrides cache.output_root)\n\
  --verbose          debug logging on stderr (RUST_LOG takes precedence)\n\
\n\
NOTES:\n\
  - If <series.json> is omitted or '-', the series is read from stdin.\n\
  - render prints the chart reference as JSON; the key defaults to the input file stem.\n\
  - render exits with status 3 when the series has no positive value.\n\
  - svg prints the SVG to stdout without touching the cache.\n\
"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();
    let mut positional: Vec<String> = Vec::new();

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        let mut value = || it.next().cloned().ok_or(CliError::Usage(usage()));
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "--config" => args.config = Some(PathBuf::from(value()?)),
            "--out-dir" => args.out_dir = Some(PathBuf::from(value()?)),
            "--out" | "-o" => args.out = Some(PathBuf::from(value()?)),
            "--key" => args.key = Some(value()?),
            "--title" => {
                let title = value()?;
                if !title.trim().is_empty() {
                    args.title = Some(title);
                }
            }
            "--force" => args.force = true,
            "--no-raster" => args.no_raster = true,
            "--pretty" => args.pretty = true,
            "--verbose" | "-v" => args.verbose = true,
            "-" => positional.push(a.clone()),
            other if other.starts_with('-') => return Err(CliError::Usage(usage())),
            other => positional.push(other.to_string()),
        }
    }

    let mut positional = positional.into_iter();
    args.command = match positional.next().as_deref() {
        None | Some("render") => Command::Render,
        Some("svg") => Command::Svg,
        Some("status") => Command::Status,
        Some("list") => Command::List,
        Some("cleanup") => Command::Cleanup,
        Some(_) => return Err(CliError::Usage(usage())),
    };
    args.input = positional.next();
    if positional.next().is_some() {
        return Err(CliError::Usage(usage()));
    }
    match args.command {
        Command::Status if args.input.is_none() => Err(CliError::Usage(usage())),
        Command::List | Command::Cleanup if args.input.is_some() => {
            Err(CliError::Usage(usage()))
        }
        _ => Ok(args),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

fn write_json(value: &impl Serialize, pretty: bool) -> Result<(), CliError> {
    let mut out = std::io::stdout().lock();
    if pretty {
        serde_json::to_writer_pretty(&mut out, value)?;
    } else {
        serde_json::to_writer(&mut out, value)?;
    }
    writeln!(out)?;
    Ok(())
}

fn load_config(args: &Args) -> Result<WardchartConfig, CliError> {
    let mut config = match &args.config {
        Some(path) => WardchartConfig::from_json_file(path)?,
        None => WardchartConfig::default(),
    };
    if let Some(dir) = &args.out_dir {
        config.cache.output_root = dir.clone();
    }
    if args.no_raster {
        config.cache.rasterize = false;
    }
    tracing::debug!(
        config = ?args.config,
        output_root = %config.cache.output_root.display(),
        rasterize = config.cache.rasterize,
        raster_tool = ?config.cache.raster_tool,
        "loaded config"
    );
    Ok(config)
}

fn default_key(input: Option<&str>) -> Option<String> {
    let path = Path::new(input.filter(|p| *p != "-")?);
    path.file_stem().map(|s| s.to_string_lossy().into_owned())
}

#[derive(Serialize)]
struct StatusOut<'a> {
    key: &'a str,
    needs_generation: bool,
    record: Option<ChartRecord>,
}

#[derive(Serialize)]
struct CleanupOut {
    removed: usize,
}

fn run(args: Args) -> Result<(), CliError> {
    let config = load_config(&args)?;

    if args.command == Command::Svg {
        let spec = ChartSpec::from_json_str(&read_input(args.input.as_deref())?)?;
        let options = RenderOptions::new(config.render);
        let Some(chart) = render_chart(&spec, args.title.as_deref(), &options)? else {
            return Err(CliError::NoChart);
        };
        match &args.out {
            Some(path) => std::fs::write(path, chart.svg)?,
            None => print!("{}", chart.svg),
        }
        return Ok(());
    }

    let registry = JsonFileRegistry::open(config.cache.registry_path());
    let service = ChartCacheService::from_config(registry, &config)?;

    match args.command {
        Command::Render => {
            let key = args
                .key
                .clone()
                .or_else(|| default_key(args.input.as_deref()))
                .ok_or(CliError::Usage(usage()))?;
            tracing::debug!(key = %key, force = args.force, "rendering chart");
            let spec = ChartSpec::from_json_str(&read_input(args.input.as_deref())?)?;
            let title = args.title.as_deref();
            let reference = if args.force {
                service.regenerate(&key, &spec, title)?
            } else {
                service.get_or_render(&key, &spec, title)?
            };
            let Some(reference) = reference else {
                return Err(CliError::NoChart);
            };
            write_json(&reference, args.pretty)
        }
        Command::Status => {
            let key = args.input.as_deref().unwrap_or_default();
            let status = StatusOut {
                key,
                needs_generation: service.needs_generation(key)?,
                record: service.registry().get(key)?,
            };
            write_json(&status, args.pretty)
        }
        Command::List => write_json(&service.registry().list()?, args.pretty),
        Command::Cleanup => {
            let removed = service.cleanup_missing()?;
            write_json(&CleanupOut { removed }, args.pretty)
        }
        Command::Svg => Ok(()),
    }
}

fn main() {
    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };
    init_tracing(args.verbose);

    match run(args) {
        Ok(()) => {}
        Err(CliError::NoChart) => {
            eprintln!("{}", CliError::NoChart);
            std::process::exit(3);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}
