//! CLI argument parsing

use std::path::PathBuf;

use clap::Parser;

use crate::config::{BandwidthMethod, DensityConfig, FaciesConfig};

#[derive(Parser, Debug)]
#[command(name = "faciesprob")]
#[command(about = "Estimate facies probabilities from filtered well logs and elastic grids")]
pub struct Args {
    /// Study file (JSON: layout, covariance, wells, settings)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Elastic grid to classify: a JSON volume, or a raw directory with
    /// dims.json and vp.bin/vs.bin/rho.bin (streamed layer by layer)
    #[arg(short, long)]
    pub grid: Option<PathBuf>,

    /// Where to write the JSON run report
    #[arg(short, long, default_value = "faciesprob-report.json")]
    pub output: PathBuf,

    /// Directory for raw f32 probability cubes, one per facies
    #[arg(long, default_value = "probabilities")]
    pub raw_dir: PathBuf,

    /// Bandwidth method (replaces the lattice preset from the study)
    #[arg(short, long, value_enum, env = "FACIESPROB_METHOD")]
    pub method: Option<BandwidthMethod>,

    /// Lower end of the trusted frequency band in Hz
    #[arg(long)]
    pub low_cut: Option<f64>,

    /// Upper end of the trusted frequency band in Hz
    #[arg(long)]
    pub high_cut: Option<f64>,

    /// Weight of the undefined facies mass
    #[arg(long)]
    pub undefined_mass: Option<f64>,

    /// Directory for filtered/original/background log dumps
    #[arg(long)]
    pub dump_dir: Option<PathBuf>,

    /// Print the report as JSON instead of a table
    #[arg(long)]
    pub json: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Apply command-line overrides to the study settings.
    pub fn apply(&self, mut config: FaciesConfig) -> FaciesConfig {
        if let Some(method) = self.method {
            config.density = DensityConfig::from_method(method);
        }
        if let Some(low) = self.low_cut {
            config.band.low_hz = low;
        }
        if let Some(high) = self.high_cut {
            config.band.high_hz = high;
        }
        if let Some(mass) = self.undefined_mass {
            config.undefined_mass = mass;
        }
        if let Some(dir) = &self.dump_dir {
            config.diagnostics_dir = Some(dir.clone());
        }
        config
    }
}
