//! FaciesProb - Facies probabilities from well logs and elastic grids
//!
//! Estimates, for every cell of a Vp/Vs/density grid, the probability of each
//! facies observed in the wells. Well logs are first filtered to the
//! resolution of the seismic inversion, then per-facies densities are
//! estimated by FFT kernel smoothing and combined with facies priors.
//!
//! ## Features
//!
//! - **Spectral well-log filtering**: per-frequency 3x3 filters from the prior
//!   and posterior covariances, restricted to the trusted seismic band
//! - **Two bandwidth methods**: sample variance, or prior/posterior covariance
//!   with Mahalanobis weighting
//! - **Streaming classification**: layer-by-layer with cancellation support
//! - **Diagnostics**: filtered/original/background log dumps and facies tables
//!
//! ## Module Structure
//!
//! - `core` - Filtering, density estimation, classification and data model
//! - `cli` - Command-line interface
//! - `config` - Run settings and method presets
//! - `report` - Run summary types
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use faciesprob::{BandwidthMethod, CancelFlag, ElasticVolume, FaciesEstimator, ProbabilityVolume};
//!
//! let estimator = FaciesEstimator::builder()
//!     .facies_names(["shale", "sand"])
//!     .method(BandwidthMethod::SampleVariance)
//!     .band(5.0, 55.0)
//!     .build(layout, covariance)?;
//!
//! let estimation = estimator.estimate(&wells)?;
//! let mut output = ProbabilityVolume::new(grid.dims, estimator.config().facies_names.clone());
//! estimator.classify(&estimation, &mut grid, &mut output, &CancelFlag::new())?;
//! ```
//!
//! ## Bandwidth Methods
//!
//! | Method              | Samples  | Lattice         | Range padding |
//! |---------------------|----------|-----------------|---------------|
//! | SampleVariance      | filtered | 100 x 100 x 50  | ±5 h          |
//! | PosteriorCovariance | blocked  | 150 x 150 x 100 | ±4 σ          |

// Error types
pub mod error;

// Core estimation functionality
pub mod core;

// Command-line interface
pub mod cli;

// Configuration and presets
pub mod config;

// Run summary
pub mod report;

// Re-export commonly used types at crate root for convenience
pub use config::{
    check_facies_name, BandwidthMethod, DensityConfig, FaciesConfig, FrequencyBand, LatticeShape,
    LayerInterval, UNDEFINED_NAME,
};
pub use crate::core::analysis::{
    CancelFlag, ClassificationStats, Classifier, ElasticSlab, ElasticSource, FaciesDensities,
    FaciesSample, FilteredTrace, PriorFaciesProbability, ProbabilitySink, ProbabilitySlab,
    SpectralFilter,
};
pub use crate::core::dsp::matrix::symmetric_matrix;
pub use crate::core::dsp::Matrix3;
pub use crate::core::{
    CovarianceModel, ElasticTrace, ElasticVolume, EstimatorBuilder, FaciesEstimation,
    FaciesEstimator, GridDims, LogTriple, PosteriorCovariance, ProbabilityVolume,
    RawElasticSource, RawFileSink, SimboxLayout, Study, WellLog, MISSING_VALUE,
};
pub use error::{FaciesError, Result, WellRejection};
pub use report::{EstimationSummary, Severity};
