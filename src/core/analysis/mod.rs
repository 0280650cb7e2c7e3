//! Facies estimation algorithms
//!
//! - Spectral filtering of well logs to seismic resolution
//! - Lattice binning and per-facies histograms
//! - FFT kernel density estimation
//! - Voxel classification of elastic grids

mod classify;
mod density;
mod histogram;
mod spectral_filter;

pub use classify::{
    CancelFlag, ClassificationStats, Classifier, ElasticSlab, ElasticSource, ProbabilitySink,
    ProbabilitySlab,
};
pub use density::{DensityEstimator, FaciesDensities, PriorFaciesProbability, SmoothingKernel};
pub use histogram::{facies_histograms, Binning, LatticeAxis};
pub use spectral_filter::{
    pad_residual, prepare_well, FaciesSample, FilteredTrace, PreparedWell, SpectralFilter,
};
