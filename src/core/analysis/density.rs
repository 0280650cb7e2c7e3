// src/core/analysis/density.rs
//
// Kernel density estimation of (Vp, Vs, density) per facies.
// Histograms on a regular lattice are smoothed with a Gaussian kernel by
// FFT multiplication; the kernel is laid out with circular offsets so the
// product corresponds to a periodic convolution centred on each bin.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, info, warn};
use num_complex::Complex64;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::histogram::{facies_histograms, Binning, LatticeAxis};
use super::spectral_filter::FaciesSample;
use crate::config::{BandwidthMethod, DensityConfig};
use crate::core::covariance::CovarianceModel;
use crate::core::dsp::{circular_offset, mean_and_variance, min_max, silverman_factor};
use crate::core::dsp::matrix::{diag, floor_diagonal, quadratic_form, spd_inverse};
use crate::core::dsp::{LatticeFft, Matrix3};
use crate::error::{FaciesError, Result};

/// Prior probability of each facies, summing to one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorFaciesProbability {
    values: Vec<f64>,
}

impl PriorFaciesProbability {
    /// Relative frequency of each facies among the observations.
    pub fn from_counts(counts: &[usize]) -> Self {
        let total: usize = counts.iter().sum();
        let values = if total == 0 {
            vec![0.0; counts.len()]
        } else {
            counts.iter().map(|&c| c as f64 / total as f64).collect()
        };
        Self { values }
    }

    /// Priors supplied by facies name.
    ///
    /// Every configured facies must be present and no other name may appear.
    /// Facies without observations get zero weight, and the rest is
    /// renormalised to sum to one.
    pub fn from_named(
        table: &BTreeMap<String, f64>,
        names: &[String],
        counts: &[usize],
    ) -> Result<Self> {
        if let Some(unknown) = table.keys().find(|k| !names.contains(k)) {
            return Err(FaciesError::UnknownFacies(unknown.clone()));
        }
        let mut values = Vec::with_capacity(names.len());
        for (f, name) in names.iter().enumerate() {
            let p = *table
                .get(name)
                .ok_or_else(|| FaciesError::UnknownFacies(name.clone()))?;
            if counts.get(f).copied().unwrap_or(0) == 0 && p > 0.0 {
                warn!(
                    "Facies '{}' has prior {:.3} but no observations; using zero",
                    name, p
                );
                values.push(0.0);
            } else {
                values.push(p);
            }
        }
        let sum: f64 = values.iter().sum();
        if !(sum > 0.0) {
            return Err(FaciesError::InvalidConfig(
                "prior probabilities of the observed facies sum to zero".to_string(),
            ));
        }
        values.iter_mut().for_each(|v| *v /= sum);
        Ok(Self { values })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, facies: usize) -> f64 {
        self.values.get(facies).copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Smoothing kernel shape
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SmoothingKernel {
    /// Independent Gaussian per axis with these standard deviations
    Separable([f64; 3]),
    /// Correlated Gaussian with this inverse covariance
    Mahalanobis(Matrix3),
}

impl SmoothingKernel {
    /// Exponent `dᵀ Σ⁻¹ d` at offset `d`; a zero-width axis is a delta.
    fn exponent(&self, d: [f64; 3]) -> f64 {
        match self {
            Self::Separable(h) => d
                .iter()
                .zip(h)
                .map(|(&d, &h)| {
                    if h > 0.0 {
                        (d / h) * (d / h)
                    } else if d == 0.0 {
                        0.0
                    } else {
                        f64::INFINITY
                    }
                })
                .sum(),
            Self::Mahalanobis(inv) => quadratic_form(inv, d),
        }
    }

    /// Kernel sampled on the lattice at circular offsets, normalised to sum 1.
    pub fn sample(&self, binning: &Binning) -> Vec<f64> {
        let dims = binning.dims();
        let [n0, n1, n2] = dims.n;
        let steps = binning.steps();
        let mut kernel = vec![0.0; dims.len()];
        for k in 0..n2 {
            let dz = circular_offset(k, n2) as f64 * steps[2];
            for j in 0..n1 {
                let dy = circular_offset(j, n1) as f64 * steps[1];
                for i in 0..n0 {
                    let dx = circular_offset(i, n0) as f64 * steps[0];
                    kernel[dims.index(i, j, k)] = (-0.5 * self.exponent([dx, dy, dz])).exp();
                }
            }
        }
        let sum: f64 = kernel.iter().sum();
        if sum > 0.0 {
            kernel.iter_mut().for_each(|v| *v /= sum);
        }
        kernel
    }
}

/// Smoothed per-facies densities on a shared lattice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaciesDensities {
    pub method: BandwidthMethod,
    pub binning: Binning,
    /// One lattice per facies, Vp fastest
    pub lattices: Vec<Vec<f64>>,
    pub priors: PriorFaciesProbability,
    /// Observations per facies
    pub counts: Vec<usize>,
    /// Kernel bandwidth per dimension
    pub bandwidth: [f64; 3],
    pub kernel: SmoothingKernel,
}

impl FaciesDensities {
    pub fn n_facies(&self) -> usize {
        self.lattices.len()
    }

    pub fn total_count(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Number of lattice nodes
    pub fn lattice_len(&self) -> usize {
        self.binning.len()
    }

    /// Replace the count-based priors.
    pub fn with_priors(mut self, priors: PriorFaciesProbability) -> Result<Self> {
        if priors.len() != self.n_facies() {
            return Err(FaciesError::DimensionMismatch {
                what: "prior facies probabilities".to_string(),
                expected: self.n_facies(),
                found: priors.len(),
            });
        }
        self.priors = priors;
        Ok(self)
    }

    /// Density of `facies` at `point` by trilinear interpolation between the
    /// surrounding bin centres.
    ///
    /// Corner values are clamped to zero before blending and queries outside
    /// the lattice are pinned to the nearest edge node.
    pub fn find_density(&self, facies: usize, point: [f64; 3]) -> f64 {
        let lattice = match self.lattices.get(facies) {
            Some(l) => l,
            None => return 0.0,
        };
        if point.iter().any(|v| !v.is_finite()) {
            return 0.0;
        }
        let dims = self.binning.dims();
        let [(i0, i1, wi), (j0, j1, wj), (k0, k1, wk)] = [0usize, 1, 2]
            .map(|d| self.binning.axes[d].interpolation_nodes(point[d]));
        let at = |i, j, k| lattice[dims.index(i, j, k)].max(0.0);

        let value = (1.0 - wi) * (1.0 - wj) * (1.0 - wk) * at(i0, j0, k0)
            + (1.0 - wi) * (1.0 - wj) * wk * at(i0, j0, k1)
            + (1.0 - wi) * wj * (1.0 - wk) * at(i0, j1, k0)
            + (1.0 - wi) * wj * wk * at(i0, j1, k1)
            + wi * (1.0 - wj) * (1.0 - wk) * at(i1, j0, k0)
            + wi * (1.0 - wj) * wk * at(i1, j0, k1)
            + wi * wj * (1.0 - wk) * at(i1, j1, k0)
            + wi * wj * wk * at(i1, j1, k1);
        value.max(0.0)
    }
}

/// Builds [`FaciesDensities`] from facies samples
pub struct DensityEstimator {
    config: DensityConfig,
    prior: Matrix3,
    posterior: Matrix3,
}

impl DensityEstimator {
    pub fn new(config: DensityConfig, covariance: &CovarianceModel) -> Self {
        Self {
            config,
            prior: covariance.prior,
            posterior: covariance.posterior.lag_zero(),
        }
    }

    pub fn config(&self) -> &DensityConfig {
        &self.config
    }

    /// Estimate one smoothed density per facies and the count-based priors.
    pub fn estimate(&self, samples: &[FaciesSample], n_facies: usize) -> Result<FaciesDensities> {
        let method = self.config.method;
        let observations: Vec<(usize, [f64; 3])> = samples
            .iter()
            .filter_map(|s| {
                let facies = s.facies.filter(|&f| f < n_facies)?;
                let value = match method {
                    BandwidthMethod::SampleVariance => s.filtered,
                    BandwidthMethod::PosteriorCovariance => s.blocked,
                };
                value.iter().all(|v| v.is_finite()).then_some((facies, value))
            })
            .collect();

        let values: Vec<[f64; 3]> = observations.iter().map(|o| o.1).collect();
        let (lo, hi) = min_max(&values).ok_or_else(|| FaciesError::NoFaciesObservations {
            wells: samples.iter().map(|s| s.well).collect::<BTreeSet<_>>().len(),
        })?;
        let (mean, var) = mean_and_variance(&values);
        let hopt = silverman_factor(values.len());

        let (bandwidth, kernel, kernel_std, weigher) = match method {
            BandwidthMethod::SampleVariance => {
                let h = var.map(|v| hopt * v.sqrt());
                (h, SmoothingKernel::Separable(h), h, None)
            }
            BandwidthMethod::PosteriorCovariance => {
                let h = diag(&self.prior).map(|v| hopt * v.max(0.0).sqrt());
                let smoothing = floor_diagonal(&self.posterior, h.map(|h| h * h));
                let std = diag(&smoothing).map(|v| v.max(0.0).sqrt());
                let kernel = match spd_inverse(&smoothing) {
                    Some(inv) => SmoothingKernel::Mahalanobis(inv),
                    None => {
                        warn!("Posterior covariance is not positive definite; smoothing per axis");
                        SmoothingKernel::Separable(std)
                    }
                };
                let sigma0 = floor_diagonal(&self.prior, var);
                let weigher = spd_inverse(&sigma0);
                if weigher.is_none() {
                    warn!("Prior covariance is not positive definite; histogram entries unweighted");
                }
                (h, kernel, std, weigher)
            }
        };

        let pad = kernel_std.map(|s| self.config.padding_sigmas * s);
        let shape = self.config.lattice.as_array();
        let binning = Binning {
            axes: [0usize, 1, 2].map(|d| LatticeAxis::spanning(lo[d], hi[d], pad[d], shape[d])),
        };
        debug!(
            "Density lattice {:?}, bandwidth {:?}, steps {:?}",
            shape,
            bandwidth,
            binning.steps()
        );

        let weighted = observations.iter().map(|&(facies, value)| {
            let weight = weigher.map_or(1.0, |inv| {
                let d = [value[0] - mean[0], value[1] - mean[1], value[2] - mean[2]];
                (0.5 * quadratic_form(&inv, d)).exp()
            });
            (facies, value, weight)
        });
        let (histograms, counts) = facies_histograms(&binning, n_facies, weighted);

        for (f, &count) in counts.iter().enumerate() {
            if count == 0 {
                warn!("Facies {} has no observations; its density is zero everywhere", f);
            }
        }

        let lattices = smooth_histograms(&binning, &kernel, histograms, &counts);
        let priors = PriorFaciesProbability::from_counts(&counts);

        info!(
            "Estimated {} facies densities from {} observations ({})",
            n_facies,
            values.len(),
            method.name()
        );

        Ok(FaciesDensities {
            method,
            binning,
            lattices,
            priors,
            counts,
            bandwidth,
            kernel,
        })
    }
}

/// Convolve every non-empty histogram with the kernel, facies in parallel.
fn smooth_histograms(
    binning: &Binning,
    kernel: &SmoothingKernel,
    histograms: Vec<Vec<f64>>,
    counts: &[usize],
) -> Vec<Vec<f64>> {
    let fft = LatticeFft::new(binning.dims());
    let mut kernel_spectrum: Vec<Complex64> = kernel
        .sample(binning)
        .into_iter()
        .map(|v| Complex64::new(v, 0.0))
        .collect();
    fft.forward(&mut kernel_spectrum);
    let rescale = fft.sqrt_len();

    histograms
        .into_par_iter()
        .zip(counts.par_iter())
        .map(|(hist, &count)| {
            if count == 0 {
                return vec![0.0; hist.len()];
            }
            let mut data: Vec<Complex64> = hist.into_iter().map(|v| Complex64::new(v, 0.0)).collect();
            fft.forward(&mut data);
            for (x, k) in data.iter_mut().zip(&kernel_spectrum) {
                *x *= *k;
            }
            fft.inverse(&mut data);
            data.into_iter().map(|c| c.re * rescale).collect()
        })
        .collect()
}
