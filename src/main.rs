// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use webcam_wizard::Config;
use webcam_wizard::backends::camera::FacingMode;
use webcam_wizard::filters::FilterKind;

mod cli;

#[derive(Parser)]
#[command(name = "webcam-wizard")]
#[command(about = "Filtered webcam capture with a geolocation overlay")]
#[command(version = env!("GIT_VERSION"))]
struct Cli {
    /// Config file (default: <config dir>/webcam-wizard/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available filters with their expressions
    Filters {
        /// Intensity used to synthesize the listed expressions (0-2)
        #[arg(short, long, default_value = "1.0")]
        intensity: f32,
    },

    /// Run the live pipeline against a virtual camera and export snapshots
    Snap {
        /// Stream this image instead of the test pattern
        #[arg(long)]
        image: Option<PathBuf>,

        /// Camera facing mode (front or back)
        #[arg(long)]
        facing: Option<FacingArg>,

        /// Filter identifier (see `webcam-wizard filters`)
        #[arg(short, long)]
        filter: Option<FilterKind>,

        /// Filter intensity (0-2)
        #[arg(short, long)]
        intensity: Option<f32>,

        /// Number of render ticks to run
        #[arg(long, default_value = "120")]
        frames: u64,

        /// Capture a snapshot every N drawn frames
        #[arg(long, default_value = "30")]
        every: u64,

        /// Latitude of a simulated position fix
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        /// Longitude of a simulated position fix
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,

        /// Heading of the simulated fix in degrees
        #[arg(long)]
        heading: Option<f64>,

        /// Output directory (default: configured export directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Resolve a coordinate to a place name
    Geocode {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum FacingArg {
    Front,
    Back,
}

impl From<FacingArg> for FacingMode {
    fn from(arg: FacingArg) -> Self {
        match arg {
            FacingArg::Front => FacingMode::Front,
            FacingArg::Back => FacingMode::Back,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set RUST_LOG to control the log level, e.g. RUST_LOG=webcam_wizard=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    let result = match cli.command {
        Commands::Filters { intensity } => cli::list_filters(intensity),
        Commands::Snap {
            image,
            facing,
            filter,
            intensity,
            frames,
            every,
            lat,
            lon,
            heading,
            output,
        } => {
            let position = lat.zip(lon).map(|(lat, lon)| cli::SimulatedFix {
                latitude: lat,
                longitude: lon,
                heading,
            });
            cli::snap(
                &config,
                cli::SnapOptions {
                    image,
                    facing: facing.map(FacingMode::from),
                    filter,
                    intensity,
                    frames,
                    every,
                    position,
                    output,
                },
            )
        }
        Commands::Geocode { lat, lon } => cli::geocode(&config, lat, lon),
    };
    result?;
    Ok(())
}
