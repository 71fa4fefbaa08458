//! drillcore CLI: structure orientation, hole positions and still-image edge checks.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use drillcore::core::{
    position_along, trajectory, CollarPosition, DrillHoleOrientation, TrajectorySample,
};
use drillcore::detect::analyze_path;
use drillcore::io::{DetectorConfig, MeasurementConfig};
use serde::Serialize;

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "drillcore")]
#[command(about = "Oriented drill-core measurement tools")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). Without it
    /// the level comes from DRILLCORE_LOG.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Measure every structure in a JSON config and write the report.
    Orient {
        /// Measurement config (JSON).
        config: PathBuf,

        /// Report path; overrides the config's `output_path`. Use `-` for stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Position at a depth along a straight hole.
    Position {
        /// Depth along hole, collar units.
        #[arg(long, allow_negative_numbers = true)]
        depth: f64,

        #[command(flatten)]
        hole: HoleArgs,

        #[command(flatten)]
        collar: CollarArgs,
    },

    /// Sample the hole trace from the collar down to a depth.
    Trajectory {
        /// Sampling step along hole.
        #[arg(long)]
        interval: f64,

        /// Last depth sampled.
        #[arg(long)]
        max_depth: f64,

        #[command(flatten)]
        hole: HoleArgs,

        #[command(flatten)]
        collar: CollarArgs,
    },

    /// Run the edge analysis on a still image.
    Analyze {
        /// Input image.
        image: PathBuf,

        /// Detector config (JSON); defaults are used when omitted.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Args)]
struct HoleArgs {
    /// Hole azimuth, degrees clockwise from North.
    #[arg(long, allow_negative_numbers = true)]
    azimuth: f64,

    /// Hole dip, degrees in [-90, 0] (negative down).
    #[arg(long, allow_negative_numbers = true)]
    dip: f64,
}

impl HoleArgs {
    fn orientation(&self) -> CliResult<DrillHoleOrientation> {
        Ok(DrillHoleOrientation::new(self.azimuth, self.dip)?)
    }
}

#[derive(Debug, Clone, Args)]
struct CollarArgs {
    #[arg(long, default_value = "0.0", allow_negative_numbers = true)]
    east: f64,

    #[arg(long, default_value = "0.0", allow_negative_numbers = true)]
    north: f64,

    #[arg(long, default_value = "0.0", allow_negative_numbers = true)]
    elevation: f64,
}

impl From<&CollarArgs> for CollarPosition {
    fn from(args: &CollarArgs) -> Self {
        CollarPosition::new(args.east, args.north, args.elevation)
    }
}

fn main() {
    if let Err(err) = try_main() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn try_main() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Orient { config, out } => run_orient(config, out),
        Commands::Position {
            depth,
            hole,
            collar,
        } => {
            let p = position_along(&CollarPosition::from(&collar), &hole.orientation()?, depth)?;
            print_json(&p)
        }
        Commands::Trajectory {
            interval,
            max_depth,
            hole,
            collar,
        } => {
            let samples: Vec<TrajectorySample> = trajectory(
                CollarPosition::from(&collar),
                hole.orientation()?,
                interval,
                max_depth,
            )?
            .collect();
            print_json(&samples)
        }
        Commands::Analyze { image, config } => {
            let cfg = match config {
                Some(path) => DetectorConfig::load_json(path)?,
                None => DetectorConfig::default(),
            };
            cfg.params.validate()?;
            let result = analyze_path(&image, &cfg.params)?;
            log::info!(
                "{}: ready={} confidence={:.2} distance={:.1} cm",
                image.display(),
                result.is_ready,
                result.confidence,
                result.estimated_distance_cm
            );
            print_json(&result)
        }
    }
}

fn run_orient(config: PathBuf, out: Option<PathBuf>) -> CliResult<()> {
    let cfg = MeasurementConfig::load_json(&config)?;
    let report = cfg.run()?;
    let out = out.unwrap_or_else(|| cfg.output_path());
    if out.as_os_str() == "-" {
        return print_json(&report);
    }
    report.write_json(&out)?;
    log::info!("report written to {}", out.display());
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(not(feature = "tracing"))]
fn init_logging(verbose: u8) {
    use log::LevelFilter;

    let result = match verbose {
        0 => drillcore::core::init_from_env(),
        1 => drillcore::core::init_with_level(LevelFilter::Info),
        2 => drillcore::core::init_with_level(LevelFilter::Debug),
        _ => drillcore::core::init_with_level(LevelFilter::Trace),
    };
    if let Err(err) = result {
        eprintln!("logger already installed: {err}");
    }
}

#[cfg(feature = "tracing")]
fn init_logging(_verbose: u8) {
    // Route `log` records from the library crates into the subscriber.
    let _ = tracing_log::LogTracer::init();
    drillcore::core::init_tracing(false);
}
