// src/core/engine.rs
//
// High-level facies estimation API with builder pattern.

use std::collections::BTreeMap;
use std::path::PathBuf;

use log::{info, warn};

use super::analysis::{
    prepare_well, CancelFlag, ClassificationStats, Classifier, DensityEstimator, ElasticSource,
    FaciesDensities, FaciesSample, FilteredTrace, PreparedWell, PriorFaciesProbability,
    ProbabilitySink, SpectralFilter,
};
use super::covariance::CovarianceModel;
use super::diagnostics;
use super::well::{SimboxLayout, WellLog};
use crate::config::{BandwidthMethod, DensityConfig, FaciesConfig, FrequencyBand, LatticeShape, LayerInterval};
use crate::error::{FaciesError, Result};
use crate::report::{EstimationSummary, RejectedWell, WellFaciesCount};

/// Builder for FaciesEstimator configuration
pub struct EstimatorBuilder {
    config: FaciesConfig,
}

impl EstimatorBuilder {
    pub fn new() -> Self {
        Self {
            config: FaciesConfig::default(),
        }
    }

    pub fn from_config(config: FaciesConfig) -> Self {
        Self { config }
    }

    pub fn facies_names<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.config.facies_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Switch bandwidth method, taking over its lattice and padding preset
    pub fn method(mut self, method: BandwidthMethod) -> Self {
        self.config.density = DensityConfig::from_method(method);
        self
    }

    pub fn lattice(mut self, vp: usize, vs: usize, rho: usize) -> Self {
        self.config.density.lattice = LatticeShape::new(vp, vs, rho);
        self
    }

    pub fn band(mut self, low_hz: f64, high_hz: f64) -> Self {
        self.config.band = FrequencyBand { low_hz, high_hz };
        self
    }

    pub fn undefined_mass(mut self, mass: f64) -> Self {
        self.config.undefined_mass = mass;
        self
    }

    pub fn prior_probabilities(mut self, priors: BTreeMap<String, f64>) -> Self {
        self.config.prior_probabilities = Some(priors);
        self
    }

    pub fn estimation_interval(mut self, top: usize, base: usize) -> Self {
        self.config.estimation_interval = Some(LayerInterval { top, base });
        self
    }

    pub fn diagnostics_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.diagnostics_dir = Some(dir.into());
        self
    }

    pub fn build(self, layout: SimboxLayout, covariance: CovarianceModel) -> Result<FaciesEstimator> {
        self.config.validate()?;
        if let Some(interval) = self.config.estimation_interval {
            if interval.top >= layout.nz {
                return Err(FaciesError::InvalidConfig(format!(
                    "estimation interval starts at layer {} but the simbox has {} layers",
                    interval.top, layout.nz
                )));
            }
        }
        let filter = SpectralFilter::new(layout, &covariance, self.config.band)?;
        Ok(FaciesEstimator {
            config: self.config,
            layout,
            covariance,
            filter,
        })
    }
}

impl Default for EstimatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Filtered wells, densities and summary of one estimation
#[derive(Debug, Clone)]
pub struct FaciesEstimation {
    pub traces: Vec<FilteredTrace>,
    pub densities: FaciesDensities,
    pub summary: EstimationSummary,
}

impl FaciesEstimation {
    pub fn samples(&self) -> Vec<FaciesSample> {
        self.traces.iter().flat_map(|t| t.samples()).collect()
    }
}

/// Main facies estimation interface
pub struct FaciesEstimator {
    config: FaciesConfig,
    layout: SimboxLayout,
    covariance: CovarianceModel,
    filter: SpectralFilter,
}

impl FaciesEstimator {
    pub fn builder() -> EstimatorBuilder {
        EstimatorBuilder::new()
    }

    pub fn config(&self) -> &FaciesConfig {
        &self.config
    }

    pub fn layout(&self) -> &SimboxLayout {
        &self.layout
    }

    pub fn filter(&self) -> &SpectralFilter {
        &self.filter
    }

    /// Screen wells, keeping usable ones and recording the rest.
    pub fn prepare(&self, wells: &[WellLog]) -> (Vec<PreparedWell>, Vec<RejectedWell>) {
        let mut prepared = Vec::with_capacity(wells.len());
        let mut rejected = Vec::new();
        for (index, well) in wells.iter().enumerate() {
            match prepare_well(
                index,
                well,
                &self.layout,
                self.config.n_facies(),
                self.config.estimation_interval,
            ) {
                Ok(p) => prepared.push(p),
                Err(reason) => {
                    warn!("Well {} IGNORED ({})", well.name, reason);
                    rejected.push(RejectedWell {
                        well: well.name.clone(),
                        reason,
                    });
                }
            }
        }
        if !rejected.is_empty() {
            warn!("{} well(s) will be ignored in facies estimation", rejected.len());
        }
        (prepared, rejected)
    }

    /// Filter wells and estimate facies densities and priors.
    pub fn estimate(&self, wells: &[WellLog]) -> Result<FaciesEstimation> {
        let (prepared, rejected) = self.prepare(wells);
        if prepared.is_empty() {
            return Err(FaciesError::NoUsableWells {
                rejected: rejected.len(),
            });
        }
        info!("Filtering {} well(s) for facies estimation", prepared.len());
        let traces = self.filter.filter_wells(&prepared)?;

        if let Some(dir) = &self.config.diagnostics_dir {
            diagnostics::write_log_dumps(dir, &traces)?;
            info!("Wrote filtered, original and background logs to {}", dir.display());
        }

        let samples: Vec<FaciesSample> = traces.iter().flat_map(|t| t.samples()).collect();
        let n_facies = self.config.n_facies();
        let mut densities =
            DensityEstimator::new(self.config.density, &self.covariance).estimate(&samples, n_facies)?;

        if let Some(table) = &self.config.prior_probabilities {
            let priors =
                PriorFaciesProbability::from_named(table, &self.config.facies_names, &densities.counts)?;
            densities = densities.with_priors(priors)?;
        }

        log_facies_tables(&self.config.facies_names, &traces, &densities);

        let summary = EstimationSummary::new(
            self.config.facies_names.clone(),
            &densities,
            &traces,
            rejected,
            self.filter.passed_bins(),
        );
        Ok(FaciesEstimation {
            traces,
            densities,
            summary,
        })
    }

    /// Classify an elastic grid into facies probabilities.
    pub fn classify<S, K>(
        &self,
        estimation: &FaciesEstimation,
        source: &mut S,
        sink: &mut K,
        cancel: &CancelFlag,
    ) -> Result<ClassificationStats>
    where
        S: ElasticSource + ?Sized,
        K: ProbabilitySink + ?Sized,
    {
        Classifier::new(&estimation.densities, self.config.undefined_mass).run(source, sink, cancel)
    }
}

/// Per-well facies distributions and counts, then the priors.
fn log_facies_tables(names: &[String], traces: &[FilteredTrace], densities: &FaciesDensities) {
    let header: String = names.iter().map(|n| format!("{:>12} ", n)).collect();
    let rule = "-".repeat(24 + 13 * names.len());

    info!("Facies distributions for each well:");
    info!("{:<24}{}", "Well", header);
    info!("{}", rule);
    for trace in traces {
        let counts = WellFaciesCount::from_trace(trace, names.len());
        let total = counts.total();
        let row: String = counts
            .counts
            .iter()
            .map(|&c| {
                if total > 0 {
                    format!("{:12.4} ", c as f64 / total as f64)
                } else {
                    format!("{:>12} ", "-")
                }
            })
            .collect();
        info!("{:<24}{}", trace.well, row);
    }

    info!("Facies counts for each well:");
    info!("{:<24}{}", "Well", header);
    info!("{}", rule);
    for trace in traces {
        let counts = WellFaciesCount::from_trace(trace, names.len());
        let row: String = counts.counts.iter().map(|c| format!("{:12} ", c)).collect();
        info!("{:<24}{}", trace.well, row);
    }

    for (f, name) in names.iter().enumerate() {
        if densities.counts[f] == 0 {
            warn!("Facies '{}' is not observed in any well", name);
        }
        info!(
            "Prior probability for facies {:<16} {:.4} ({} observations)",
            name,
            densities.priors.get(f),
            densities.counts[f]
        );
    }
}
