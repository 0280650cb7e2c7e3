// src/config/settings.rs
//
// Facies estimation settings with method presets

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{FaciesError, Result};

/// File stem of the raw undefined-probability cube; no facies may use it
pub const UNDEFINED_NAME: &str = "undefined";

/// How kernel bandwidths and lattice weights are derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum BandwidthMethod {
    /// Bandwidth from the variance of the filtered samples, separable kernel
    SampleVariance,
    /// Bandwidth from the prior covariance, kernel shaped by the posterior
    /// covariance, histogram entries weighted by prior Mahalanobis distance
    PosteriorCovariance,
}

impl BandwidthMethod {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SampleVariance => "sample-variance",
            Self::PosteriorCovariance => "posterior-covariance",
        }
    }
}

/// Trusted seismic frequency band, closed at both ends
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyBand {
    pub low_hz: f64,
    pub high_hz: f64,
}

impl Default for FrequencyBand {
    fn default() -> Self {
        Self {
            low_hz: 5.0,
            high_hz: 55.0,
        }
    }
}

impl FrequencyBand {
    pub fn contains(&self, hz: f64) -> bool {
        hz >= self.low_hz && hz <= self.high_hz
    }

    /// Band that passes every frequency.
    pub fn all_pass() -> Self {
        Self {
            low_hz: 0.0,
            high_hz: f64::INFINITY,
        }
    }
}

/// Number of lattice bins along Vp, Vs and density
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatticeShape {
    pub vp: usize,
    pub vs: usize,
    pub rho: usize,
}

impl LatticeShape {
    pub fn new(vp: usize, vs: usize, rho: usize) -> Self {
        Self { vp, vs, rho }
    }

    pub fn as_array(&self) -> [usize; 3] {
        [self.vp, self.vs, self.rho]
    }

    pub fn total(&self) -> usize {
        self.vp * self.vs * self.rho
    }
}

/// Kernel density settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DensityConfig {
    pub method: BandwidthMethod,
    pub lattice: LatticeShape,
    /// Lattice range padding beyond the data, in kernel standard deviations
    pub padding_sigmas: f64,
}

impl Default for DensityConfig {
    fn default() -> Self {
        Self::from_method(BandwidthMethod::SampleVariance)
    }
}

impl DensityConfig {
    /// Preset lattice and padding for a bandwidth method
    pub fn from_method(method: BandwidthMethod) -> Self {
        match method {
            BandwidthMethod::SampleVariance => Self {
                method,
                lattice: LatticeShape::new(100, 100, 50),
                padding_sigmas: 5.0,
            },
            BandwidthMethod::PosteriorCovariance => Self {
                method,
                lattice: LatticeShape::new(150, 150, 100),
                padding_sigmas: 4.0,
            },
        }
    }
}

/// Half-open layer range `[top, base)` used for facies statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerInterval {
    pub top: usize,
    pub base: usize,
}

impl LayerInterval {
    pub fn contains(&self, layer: usize) -> bool {
        layer >= self.top && layer < self.base
    }
}

/// Complete settings for one facies probability run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaciesConfig {
    /// Facies names; label `i` in the well logs refers to `facies_names[i]`
    pub facies_names: Vec<String>,
    #[serde(default)]
    pub band: FrequencyBand,
    #[serde(default)]
    pub density: DensityConfig,
    /// Weight of the constant "none of the facies" mass
    #[serde(default = "default_undefined_mass")]
    pub undefined_mass: f64,
    /// Externally supplied prior probabilities, keyed by facies name
    #[serde(default)]
    pub prior_probabilities: Option<BTreeMap<String, f64>>,
    #[serde(default)]
    pub estimation_interval: Option<LayerInterval>,
    /// Where to write filtered/original/background log dumps
    #[serde(default)]
    pub diagnostics_dir: Option<PathBuf>,
}

fn default_undefined_mass() -> f64 {
    0.01
}

impl Default for FaciesConfig {
    fn default() -> Self {
        Self {
            facies_names: vec!["shale".to_string(), "sand".to_string()],
            band: FrequencyBand::default(),
            density: DensityConfig::default(),
            undefined_mass: default_undefined_mass(),
            prior_probabilities: None,
            estimation_interval: None,
            diagnostics_dir: None,
        }
    }
}

impl FaciesConfig {
    pub fn n_facies(&self) -> usize {
        self.facies_names.len()
    }

    pub fn validate(&self) -> Result<()> {
        if self.facies_names.is_empty() {
            return Err(invalid("at least one facies must be named"));
        }
        for (i, name) in self.facies_names.iter().enumerate() {
            check_facies_name(name)?;
            if self.facies_names[..i].contains(name) {
                return Err(invalid(format!("facies '{}' is named twice", name)));
            }
        }
        if !(self.band.low_hz >= 0.0) || !(self.band.high_hz >= self.band.low_hz) {
            return Err(invalid(format!(
                "frequency band [{}, {}] Hz is empty or negative",
                self.band.low_hz, self.band.high_hz
            )));
        }
        if self.density.lattice.as_array().iter().any(|&n| n < 2) {
            return Err(invalid("density lattice needs at least two bins per axis"));
        }
        if !(self.density.padding_sigmas >= 0.0) || !self.density.padding_sigmas.is_finite() {
            return Err(invalid("lattice padding must be a finite, non-negative number"));
        }
        if !(self.undefined_mass >= 0.0) || !self.undefined_mass.is_finite() {
            return Err(invalid(format!(
                "undefined mass must be non-negative, got {}",
                self.undefined_mass
            )));
        }
        if let Some(interval) = self.estimation_interval {
            if interval.base <= interval.top {
                return Err(invalid(format!(
                    "estimation interval [{}, {}) is empty",
                    interval.top, interval.base
                )));
            }
        }
        if let Some(priors) = &self.prior_probabilities {
            if priors.values().any(|p| !(*p >= 0.0) || !p.is_finite()) {
                return Err(invalid("prior probabilities must be non-negative"));
            }
        }
        Ok(())
    }
}

/// A facies name doubles as the file stem of its raw probability cube, so it
/// must be a single path component distinct from [`UNDEFINED_NAME`].
pub fn check_facies_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(invalid("facies names must not be empty"));
    }
    if name.eq_ignore_ascii_case(UNDEFINED_NAME) {
        return Err(invalid(format!(
            "facies name '{}' is reserved for the undefined probability",
            name
        )));
    }
    if name == "." || name == ".." || name.contains(['/', '\\', '\0']) {
        return Err(invalid(format!(
            "facies name '{}' is not a plain file name",
            name
        )));
    }
    Ok(())
}

fn invalid(msg: impl Into<String>) -> FaciesError {
    FaciesError::InvalidConfig(msg.into())
}
