//! DocScan - Card and driver's license field reader
//!
//! Crops the document region out of camera frames, hands it to a text
//! recognizer and pulls structured fields out of the recognized text.

mod analysis;
mod app;
mod capture;
mod config;
mod document;
mod pipeline;
mod shared;
mod storage;
mod vision;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::app::ScannerApp;
use crate::capture::{CaptureConfig, StillImageSource};
use crate::config::AppConfig;
use crate::document::DocumentKind;
use crate::pipeline::Submission;
use crate::vision::StaticRecognizer;

/// DocScan - card and license field reader
#[derive(Parser, Debug)]
#[command(name = "docscan")]
#[command(about = "Reads card numbers and license fields from camera frames")]
struct Args {
    /// Configuration file (defaults to the per-user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the supported document types
    Documents,
    /// Map a document's capture region onto a frame size
    Roi {
        #[arg(short, long, value_enum)]
        document: DocumentArg,
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
        /// Clockwise rotation that brings the frame upright
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        rotation: i32,
    },
    /// Extract fields from recognized text (reads stdin without --file)
    Extract {
        #[arg(short, long, value_enum)]
        document: DocumentArg,
        #[arg(short, long)]
        file: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Replay an image through the scan pipeline with a fixed transcript
    Scan {
        #[arg(short, long, value_enum)]
        document: DocumentArg,
        /// Image replayed as camera frames
        #[arg(short, long)]
        image: PathBuf,
        /// Text file the recognizer answers with
        #[arg(short, long)]
        transcript: PathBuf,
        #[arg(long, default_value = "30")]
        frames: u32,
        #[arg(long, default_value = "30")]
        fps: u32,
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        rotation: i32,
        /// Write the cropped region as PNG (to the crops directory without a path)
        #[arg(long, num_args = 0..=1)]
        save_crop: Option<Option<PathBuf>>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// One `name value` line per field
    Text,
    /// JSON object with the fields in schema order
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum DocumentArg {
    Card,
    License,
}

impl From<DocumentArg> for DocumentKind {
    fn from(arg: DocumentArg) -> Self {
        match arg {
            DocumentArg::Card => DocumentKind::Card,
            DocumentArg::License => DocumentKind::License,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let (config, source) = load_or_create_config(args.config.as_deref());
    init_logging(&config);
    log_config_source(&source);

    match args.command {
        Command::Documents => list_documents(&config),
        Command::Roi {
            document,
            width,
            height,
            rotation,
        } => print_roi(&config, document.into(), width, height, rotation),
        Command::Extract {
            document,
            file,
            format,
        } => extract_text(&config, document.into(), file.as_deref(), format),
        Command::Scan {
            document,
            image,
            transcript,
            frames,
            fps,
            rotation,
            save_crop,
            format,
        } => run_scan(
            &config,
            document.into(),
            &image,
            &transcript,
            CaptureConfig {
                max_fps: fps,
                frame_count: frames,
                rotation_degrees: rotation,
            },
            save_crop,
            format,
        ),
    }
}

/// `RUST_LOG` wins over the configured level
fn init_logging(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Where the configuration in effect came from
#[derive(Debug)]
enum ConfigSource {
    Loaded(PathBuf),
    Invalid { path: PathBuf, error: anyhow::Error },
    Created(PathBuf),
    NotWritten { path: PathBuf, error: anyhow::Error },
    Missing(PathBuf),
    Unavailable(anyhow::Error),
}

/// Load configuration from file or create default
fn load_or_create_config(explicit: Option<&Path>) -> (AppConfig, ConfigSource) {
    match explicit {
        Some(path) => resolve_config(path, false),
        None => match storage::get_config_dir() {
            Ok(dir) => resolve_config(&dir.join("config.toml"), true),
            Err(error) => (AppConfig::default(), ConfigSource::Unavailable(error)),
        },
    }
}

fn resolve_config(path: &Path, create_missing: bool) -> (AppConfig, ConfigSource) {
    if path.exists() {
        return match config::load_config(path) {
            Ok(config) => (config, ConfigSource::Loaded(path.to_path_buf())),
            Err(error) => (
                AppConfig::default(),
                ConfigSource::Invalid {
                    path: path.to_path_buf(),
                    error,
                },
            ),
        };
    }

    let config = AppConfig::default();
    if !create_missing {
        return (config, ConfigSource::Missing(path.to_path_buf()));
    }
    let source = match config::save_config(&config, path) {
        Ok(()) => ConfigSource::Created(path.to_path_buf()),
        Err(error) => ConfigSource::NotWritten {
            path: path.to_path_buf(),
            error,
        },
    };
    (config, source)
}

fn log_config_source(source: &ConfigSource) {
    match source {
        ConfigSource::Loaded(path) => info!("Loaded configuration from {:?}", path),
        ConfigSource::Created(path) => info!("Wrote default configuration to {:?}", path),
        ConfigSource::Missing(path) => {
            warn!("Configuration {:?} not found, using defaults", path)
        }
        ConfigSource::Invalid { path, error } => {
            warn!("Ignoring invalid configuration {:?}: {:#}", path, error)
        }
        ConfigSource::NotWritten { path, error } => {
            warn!("Could not write default configuration to {:?}: {:#}", path, error)
        }
        ConfigSource::Unavailable(error) => {
            warn!("No configuration directory, using defaults: {:#}", error)
        }
    }
}

fn list_documents(config: &AppConfig) -> Result<()> {
    let catalog = config.roi.catalog();
    for kind in DocumentKind::ALL {
        let document = catalog.get(kind);
        let roi = document.roi();
        println!("{} ({})", kind, document.label());
        println!(
            "  region: left {:.3} top {:.3} right {:.3} bottom {:.3}",
            roi.left(),
            roi.top(),
            roi.right(),
            roi.bottom()
        );
        println!(
            "  size {:.3} x {:.3}, center ({:.3}, {:.3})",
            roi.width(),
            roi.height(),
            roi.center_x(),
            roi.center_y()
        );
        println!("  fields: {}", document.field_names().collect::<Vec<_>>().join(", "));
        if let Some(script) = document.noise_script() {
            println!("  transcript: {script:?} stripped");
        }
    }
    Ok(())
}

fn print_roi(config: &AppConfig, kind: DocumentKind, width: u32, height: u32, rotation: i32) -> Result<()> {
    let document = config.roi.catalog().get(kind);
    let mapper = config.pipeline.cycle_settings().mapper;
    let region = mapper.map_rotated(&document.roi(), width, height, rotation)?;
    println!("{}", serde_json::to_string_pretty(&region)?);
    Ok(())
}

fn extract_text(
    config: &AppConfig,
    kind: DocumentKind,
    file: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let raw = match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    let document = config.roi.catalog().get(kind);
    let output = pipeline::analyze(&raw, &document, &config.pipeline.cycle_settings());
    debug!(normalized = %output.normalized, "Normalized recognition text");
    info!(
        document = %kind,
        recognized = output.fields.recognized_count(),
        "Extraction finished"
    );

    println!("{}", render_fields(&output.fields, output.transcript.as_deref(), format)?);
    Ok(())
}

fn render_fields(
    fields: &analysis::FieldMap,
    transcript: Option<&str>,
    format: OutputFormat,
) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
            "fields": fields,
            "transcript": transcript,
        }))?),
        OutputFormat::Text => {
            let mut lines: Vec<String> = fields
                .iter()
                .map(|(name, value)| format!("{name:<24}{value}"))
                .collect();
            if let Some(transcript) = transcript {
                lines.push("--- transcript ---".to_string());
                lines.push(transcript.to_string());
            }
            Ok(lines.join("\n"))
        }
    }
}

fn run_scan(
    config: &AppConfig,
    kind: DocumentKind,
    image: &Path,
    transcript: &Path,
    capture: CaptureConfig,
    save_crop: Option<Option<PathBuf>>,
    format: OutputFormat,
) -> Result<()> {
    let text = std::fs::read_to_string(transcript)
        .with_context(|| format!("Failed to read {}", transcript.display()))?;
    let source = StillImageSource::open(image, capture.clone())?;
    let (width, height) = source.dimensions();
    info!(width, height, frames = capture.frame_count, "Replaying image");

    if let Some(target) = save_crop {
        save_region(config, kind, &source, target)?;
    }

    let mut app = ScannerApp::new(config, Arc::new(StaticRecognizer::new(text)))?;
    app.select_document(kind);

    source.run(|frame| {
        if app.submit_frame(frame) == Submission::Accepted {
            app.poll_updates();
        }
    });
    if !app.settle(Duration::from_secs(10)) {
        warn!("Pipeline still busy after replay, waiting for the worker");
    }

    let stats = app.stats();
    info!(accepted = stats.accepted, dropped = stats.dropped, "Replay finished");

    let display = app.shutdown();
    match display.fields.as_ref() {
        Some(fields) => println!("{}", render_fields(fields, display.transcript.as_deref(), format)?),
        None => println!("No result"),
    }
    Ok(())
}

fn save_region(
    config: &AppConfig,
    kind: DocumentKind,
    source: &StillImageSource,
    target: Option<PathBuf>,
) -> Result<()> {
    let path = match target {
        Some(path) => path,
        None => storage::get_crops_dir()?.join(format!("{kind}.png")),
    };

    let frame = source.frame();
    let document = config.roi.catalog().get(kind);
    let mapper = config.pipeline.cycle_settings().mapper;
    let region = mapper.map_rotated(&document.roi(), frame.width, frame.height, frame.rotation_degrees)?;
    frame
        .crop(region)?
        .save(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), ?region, "Saved crop");
    Ok(())
}
