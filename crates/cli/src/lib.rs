//! Batch driver for the tapeline measurement engine
//!
//! Replays a JSON event script through a measuring session and prints the
//! resulting drawable/measurement report, for debugging sessions outside a
//! map host and for golden-output inspection in CI.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tapeline_core::{
    export_measurements_csv, CsvExportConfig, DimensionCollection, ElementCollection,
    FreeCollection, MapPoint, MeasureConfig, MeasurePalette, MeasurementSession,
    PlanarTransform, ShapeMeasurement, StatusText, UnitFormat, UnitSystem,
};

#[derive(Debug, Parser)]
#[command(name = "tapeline")]
#[command(about = "Tapeline measurement session replay")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Replay an event script and print a JSON session report.
    Replay {
        #[arg(value_name = "SCRIPT")]
        file: PathBuf,
        /// Pretty-print the JSON output.
        #[arg(long)]
        pretty: bool,
    },
    /// Replay an event script and export measured shapes as CSV.
    ExportCsv {
        #[arg(value_name = "SCRIPT")]
        file: PathBuf,
        /// Write to a file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
        /// Include shapes that were never finalized.
        #[arg(long)]
        include_open: bool,
    },
    /// Print CLI version.
    Version,
}

/// Which measuring engine a script drives
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum MeasureMode {
    Dimension,
    Free,
}

/// One scripted session: engine choice, scale, and an ordered event list
#[derive(Debug, Deserialize)]
struct EventScript {
    mode: MeasureMode,
    #[serde(default = "default_units_per_pixel")]
    units_per_pixel: f64,
    #[serde(default = "default_unit_system")]
    unit_system: UnitSystem,
    #[serde(default = "default_meters_per_unit")]
    meters_per_unit: f64,
    #[serde(default)]
    config: MeasureConfig,
    events: Vec<ScriptEvent>,
}

fn default_units_per_pixel() -> f64 {
    1.0
}

fn default_unit_system() -> UnitSystem {
    UnitSystem::Metric
}

fn default_meters_per_unit() -> f64 {
    1.0
}

/// A session operation, in world coordinates
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ScriptEvent {
    Add { x: f64, y: f64 },
    Move { x: f64, y: f64 },
    Delete,
    End,
    Close,
    Pan { dx: f64, dy: f64 },
    Scale { units_per_pixel: f64 },
    Clear,
}

/// Machine-readable replay outcome
#[derive(Debug, Serialize)]
struct ReplayReport {
    revision: u64,
    status: StatusText,
    curves: usize,
    labels: usize,
    markers: usize,
    shapes: Vec<ShapeMeasurement>,
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    // Ignore a second install when run() is called more than once in-process.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let cli = Cli::parse_from(args);

    match cli.command {
        Commands::Replay { file, pretty } => run_replay(&file, pretty),
        Commands::ExportCsv {
            file,
            output,
            include_open,
        } => run_export_csv(&file, output.as_deref(), include_open),
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn load_script(file: &Path) -> Result<EventScript> {
    let raw = fs::read_to_string(file)
        .with_context(|| format!("failed to read script {}", file.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse script {}", file.display()))
}

fn run_replay(file: &Path, pretty: bool) -> Result<()> {
    let script = load_script(file)?;
    let report = replay(&script);
    let rendered = if pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{rendered}");
    Ok(())
}

fn run_export_csv(file: &Path, output: Option<&Path>, include_open: bool) -> Result<()> {
    let script = load_script(file)?;
    let units = UnitFormat::new(script.unit_system, 2);
    let report = replay(&script);
    let config = CsvExportConfig {
        include_unfinalized: include_open,
        ..CsvExportConfig::default()
    };

    match output {
        Some(path) => {
            let writer = fs::File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            export_measurements_csv(writer, &report.shapes, units, &config)?;
        }
        None => {
            let stdout = std::io::stdout();
            export_measurements_csv(stdout.lock(), &report.shapes, units, &config)?;
        }
    }
    Ok(())
}

fn replay(script: &EventScript) -> ReplayReport {
    let distance = Arc::new(PlanarTransform {
        origin: MapPoint::new(0.0, 0.0),
        units_per_pixel: script.units_per_pixel,
        meters_per_unit: script.meters_per_unit,
        extent: None,
    });
    let units = UnitFormat::new(script.unit_system, 2);

    match script.mode {
        MeasureMode::Dimension => drive(
            MeasurementSession::<DimensionCollection>::new(
                script.config.clone(),
                MeasurePalette::default(),
                units,
                distance,
                script.units_per_pixel,
            ),
            script,
        ),
        MeasureMode::Free => drive(
            MeasurementSession::<FreeCollection>::new(
                script.config.clone(),
                MeasurePalette::default(),
                units,
                distance,
                script.units_per_pixel,
            ),
            script,
        ),
    }
}

fn drive<C: ElementCollection + Default>(
    mut session: MeasurementSession<C>,
    script: &EventScript,
) -> ReplayReport {
    session.start();
    for event in &script.events {
        match event {
            ScriptEvent::Add { x, y } => {
                session.add_coordinate(MapPoint::new(*x, *y));
            }
            ScriptEvent::Move { x, y } => session.move_coordinate(MapPoint::new(*x, *y)),
            ScriptEvent::Delete => session.delete_last_coordinate(),
            ScriptEvent::End => session.end_measuring(),
            ScriptEvent::Close => session.close_measurer(),
            ScriptEvent::Pan { dx, dy } => session.move_all(*dx, *dy),
            ScriptEvent::Scale { units_per_pixel } => {
                session.set_units_per_pixel(*units_per_pixel)
            }
            ScriptEvent::Clear => session.clear(),
        }
    }

    let drawables = session.drawables();
    ReplayReport {
        revision: session.revision(),
        status: session.status().clone(),
        curves: drawables.curves.len(),
        labels: drawables.labels.len(),
        markers: drawables.markers.len(),
        shapes: session.measurements(),
    }
}
