#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use std::process::Command;

use faciesprob::{
    CovarianceModel, ElasticVolume, FaciesConfig, GridDims, LogTriple, Matrix3,
    PosteriorCovariance, SimboxLayout, Study, WellLog, symmetric_matrix,
};
use uuid::Uuid;

pub const NZ: usize = 50;
pub const NZP: usize = 64;
pub const DZ_MS: f64 = 4.0;

pub const BACKGROUND: [f64; 3] = [3000.0, 1500.0, 2.3];

pub fn get_binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_faciesprob"))
}

pub fn run_faciesprob() -> Command {
    Command::new(get_binary_path())
}

/// Fresh scratch directory under the system temp dir
pub fn temp_dir(prefix: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("faciesprob-{}-{}", prefix, Uuid::new_v4()));
    let _ = fs::create_dir_all(&dir);
    dir
}

pub fn layout() -> SimboxLayout {
    SimboxLayout::new(NZ, NZP, DZ_MS).expect("valid layout")
}

pub fn prior() -> Matrix3 {
    symmetric_matrix([10000.0, 2500.0, 0.0025], 3000.0, 2.0, 0.5)
}

/// Delta at lag 0: a flat prior spectrum
pub fn white_correlation() -> Vec<f64> {
    let mut c = vec![0.0; NZP];
    c[0] = 1.0;
    c
}

/// Posterior with no uncertainty; in-band filters are the identity.
pub fn exact_covariance() -> CovarianceModel {
    CovarianceModel {
        prior: prior(),
        prior_correlation: white_correlation(),
        posterior: PosteriorCovariance::zero(NZP),
    }
}

/// Posterior equal to the prior; every filter is zero.
pub fn uninformed_covariance() -> CovarianceModel {
    CovarianceModel {
        prior: prior(),
        prior_correlation: white_correlation(),
        posterior: PosteriorCovariance::stationary(&prior(), &white_correlation()),
    }
}

pub fn partial_covariance() -> CovarianceModel {
    CovarianceModel {
        prior: prior(),
        prior_correlation: white_correlation(),
        posterior: PosteriorCovariance::stationary(&(prior() * 0.3), &white_correlation()),
    }
}

/// Facies 0 in three of every ten layers, facies 1 elsewhere
pub fn facies_pattern(layer: usize) -> usize {
    if layer % 10 < 3 {
        0
    } else {
        1
    }
}

fn constant(value: f64, n: usize) -> Vec<Option<f64>> {
    vec![Some(value); n]
}

/// Blocked well whose elastic values separate the two facies.
pub fn synthetic_well(name: &str, seed: usize) -> WellLog {
    let phase = seed as f64 * 0.37;
    let mut logs = LogTriple::default();
    let mut facies = Vec::with_capacity(NZ);
    for layer in 0..NZ {
        let f = facies_pattern(layer);
        let t = layer as f64 + phase;
        let shift = if f == 0 { -1.0 } else { 1.0 };
        logs.vp.push(Some(BACKGROUND[0] + 120.0 * shift + 40.0 * (0.9 * t).sin()));
        logs.vs.push(Some(BACKGROUND[1] + 60.0 * shift + 20.0 * (0.5 * t).cos()));
        logs.rho.push(Some(BACKGROUND[2] + 0.05 * shift + 0.01 * (0.3 * t).sin()));
        facies.push(Some(f));
    }
    WellLog {
        name: name.to_string(),
        deviated: false,
        logs,
        background: LogTriple {
            vp: constant(BACKGROUND[0], NZ),
            vs: constant(BACKGROUND[1], NZ),
            rho: constant(BACKGROUND[2], NZ),
        },
        facies,
        inside_simbox: Vec::new(),
        dz_ms: None,
        top_ms: 1000.0,
    }
}

/// Well whose logs equal its background, all labelled `facies`.
pub fn flat_well(name: &str, facies: usize) -> WellLog {
    let mut well = synthetic_well(name, 0);
    well.logs = well.background.clone();
    well.facies = vec![Some(facies); NZ];
    well
}

pub fn synthetic_wells() -> Vec<WellLog> {
    (0..3).map(|i| synthetic_well(&format!("W{}", i + 1), i)).collect()
}

pub fn small_config() -> FaciesConfig {
    let mut config = FaciesConfig::default();
    config.density.lattice = faciesprob::LatticeShape::new(24, 24, 12);
    config
}

pub fn synthetic_study() -> Study {
    Study {
        layout: layout(),
        covariance: partial_covariance(),
        wells: synthetic_wells(),
        settings: small_config(),
    }
}

/// Padded grid with a few characteristic points and one missing voxel.
pub fn synthetic_grid() -> ElasticVolume {
    let dims = GridDims::new(3, 2, 4, 4, 3, 8).expect("valid grid");
    let mut grid = ElasticVolume::filled(dims, [3100.0, 1550.0, 2.35]);
    grid.set(0, 0, 0, [2880.0, 1440.0, 2.25]);
    grid.set(1, 1, 2, [3000.0, 1500.0, 2.30]);
    grid.set(2, 0, 3, [9000.0, 100.0, 1.0]);
    grid.set(1, 0, 1, [f32::NAN, 1500.0, 2.3]);
    grid
}
