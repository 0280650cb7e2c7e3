//! Core estimation modules

pub mod analysis;
pub mod covariance;
pub mod diagnostics;
pub mod dsp;
pub mod engine;
pub mod grid;
pub mod study;
pub mod well;

pub use covariance::{CovarianceModel, PosteriorCovariance};
pub use engine::{EstimatorBuilder, FaciesEstimation, FaciesEstimator};
pub use grid::{
    ElasticVolume, GridDims, ProbabilityVolume, RawElasticSource, RawFileSink, MISSING_VALUE,
    RAW_DIMS_FILE, RAW_ELASTIC_FILES,
};
pub use study::Study;
pub use well::{ElasticTrace, LogTriple, SimboxLayout, WellLog};
