//! perio CLI: CEJ / bone crest / apex detection on dental radiographs.

use clap::{Args, Parser, Subcommand, ValueEnum};
use perio::batch::map_batch;
use perio::core::LogLevels;
use perio::detect::load_and_report;
use perio::landmarks::{LandmarkDetectConfig, LandmarkDetector, LandmarkDetectorParams};
use perio::overlay::{render_overlay, OverlayStyle};
use perio::ImageReport;
use std::fs;
use std::path::{Path, PathBuf};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "perio")]
#[command(about = "Detect CEJ, bone crest and apex landmarks in dental radiographs")]
#[command(version)]
struct Cli {
    /// Log verbosity.
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    /// Verbosity of per-stage detector diagnostics (defaults to `--log-level`).
    #[arg(long, global = true, value_enum)]
    diagnostics_level: Option<LogLevel>,

    /// Emit logs as JSON lines (requires the `tracing` feature).
    #[arg(long, global = true)]
    json_log: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect landmarks in one or more images.
    Detect(DetectArgs),

    /// Run a single image described by a JSON config.
    Run {
        /// Path to a `LandmarkDetectConfig` JSON file.
        config: PathBuf,
    },

    /// Print the default detector parameters as JSON.
    DefaultConfig,
}

#[derive(Debug, Clone, Args)]
struct DetectArgs {
    /// Input images.
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// Detector parameters (JSON, missing fields use defaults).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the JSON report here instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Write one overlay PNG per image into this directory.
    #[arg(long)]
    overlay_dir: Option<PathBuf>,

    /// Keep intermediate point sets in the report and overlays.
    #[arg(long)]
    debug: bool,

    /// Pixel spacing for millimetre measurements.
    #[arg(long)]
    mm_per_pixel: Option<f32>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn filter(self) -> log::LevelFilter {
        match self {
            Self::Off => log::LevelFilter::Off,
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    let levels = LogLevels {
        general: cli.log_level.filter(),
        diagnostics: cli.diagnostics_level.unwrap_or(cli.log_level).filter(),
    };
    init_logging(levels, cli.json_log)?;

    match cli.command {
        Commands::Detect(args) => run_detect(&args),
        Commands::Run { config } => run_config(&config),
        Commands::DefaultConfig => {
            println!(
                "{}",
                serde_json::to_string_pretty(&LandmarkDetectorParams::default())?
            );
            Ok(())
        }
    }
}

#[cfg(feature = "tracing")]
fn init_logging(levels: LogLevels, json: bool) -> CliResult<()> {
    perio::core::init_tracing(json, &levels.directive());
    Ok(())
}

#[cfg(not(feature = "tracing"))]
fn init_logging(levels: LogLevels, json: bool) -> CliResult<()> {
    perio::core::init_with_levels(levels)?;
    if json {
        log::warn!("--json-log needs the `tracing` feature; using plain logs");
    }
    Ok(())
}

fn load_params(path: Option<&Path>) -> CliResult<LandmarkDetectorParams> {
    match path {
        Some(path) => {
            let raw = fs::read_to_string(path)?;
            Ok(serde_json::from_str(&raw)?)
        }
        None => Ok(LandmarkDetectorParams::default()),
    }
}

fn overlay_file(dir: &Path, image: &Path) -> PathBuf {
    let stem = image
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    dir.join(format!("{stem}_overlay.png"))
}

/// Detect on one image and optionally save its overlay.
fn process(
    path: &Path,
    detector: &LandmarkDetector,
    mm_per_pixel: Option<f32>,
    overlay: Option<&Path>,
) -> ImageReport {
    let (img, report) = load_and_report(path, detector, mm_per_pixel);
    if let (Some(img), Some(out)) = (img, overlay) {
        let rendered = render_overlay(
            &img,
            report.report.landmarks.as_ref(),
            report.report.debug.as_ref(),
            &OverlayStyle::default(),
        );
        match rendered.save(out) {
            Ok(()) => log::info!("overlay written to {}", out.display()),
            Err(err) => log::warn!("failed to write overlay {}: {err}", out.display()),
        }
    }
    report
}

fn log_outcome(report: &ImageReport) {
    let r = &report.report;
    match (&r.landmarks, &report.bone_loss) {
        (Some(t), Some(m)) => log::info!(
            "{}: CEJ ({}, {}), bone ({}, {}), apex ({}, {}), bone loss {:.1}%",
            r.image_path,
            t.cej.x,
            t.cej.y,
            t.bone.x,
            t.bone.y,
            t.apex.x,
            t.apex.y,
            m.percent
        ),
        (Some(_), None) => log::info!("{}: landmarks found", r.image_path),
        (None, _) => log::warn!("{}: {}", r.image_path, r.warnings.join("; ")),
    }
}

fn run_detect(args: &DetectArgs) -> CliResult<()> {
    let mut params = load_params(args.config.as_deref())?;
    params.collect_debug |= args.debug;
    let detector = LandmarkDetector::new(params);

    if let Some(dir) = &args.overlay_dir {
        fs::create_dir_all(dir)?;
    }

    let reports = map_batch(&args.images, |path| {
        let overlay = args.overlay_dir.as_deref().map(|d| overlay_file(d, path));
        process(path, &detector, args.mm_per_pixel, overlay.as_deref())
    });
    reports.iter().for_each(log_outcome);

    let detected = reports.iter().filter(|r| r.is_detected()).count();
    log::info!("detected landmarks in {detected}/{} images", reports.len());

    let json = serde_json::to_string_pretty(&reports)?;
    match &args.output {
        Some(out) => {
            fs::write(out, json)?;
            log::info!("report written to {}", out.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn run_config(config_path: &Path) -> CliResult<()> {
    let cfg = LandmarkDetectConfig::load_json(config_path)?;
    let detector = cfg.build_detector();
    let overlay = cfg.overlay_path.as_ref().map(PathBuf::from);

    let report = process(
        Path::new(&cfg.image_path),
        &detector,
        cfg.mm_per_pixel,
        overlay.as_deref(),
    );
    log_outcome(&report);

    let out = cfg.output_path();
    fs::write(&out, serde_json::to_string_pretty(&report)?)?;
    log::info!("report written to {}", out.display());
    Ok(())
}
