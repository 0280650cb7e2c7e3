//! Error types for facies probability estimation.

use thiserror::Error;

/// Result type for library operations.
pub type Result<T> = std::result::Result<T, FaciesError>;

/// Errors that abort an estimation or classification run.
#[derive(Error, Debug)]
pub enum FaciesError {
    /// Settings or inputs that cannot describe a valid run.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Two arrays or grids that must agree in size do not.
    #[error("dimension mismatch for {what}: expected {expected}, found {found}")]
    DimensionMismatch {
        what: String,
        expected: usize,
        found: usize,
    },

    /// Every well was rejected, so no facies statistics can be formed.
    #[error("no usable wells for facies estimation ({rejected} rejected)")]
    NoUsableWells { rejected: usize },

    /// Usable wells exist but none carries a valid facies observation.
    #[error("no valid facies log entries found in {wells} well(s)")]
    NoFaciesObservations { wells: usize },

    /// A prior probability table refers to a facies that is not configured,
    /// or omits one that is.
    #[error("prior probability table does not match facies '{0}'")]
    UnknownFacies(String),

    /// Transform failure reported by the FFT backend.
    #[error("FFT error: {0}")]
    Fft(String),

    /// Classification was interrupted through a cancel flag.
    #[error("classification cancelled after {completed_layers} layer(s)")]
    Cancelled { completed_layers: usize },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<realfft::FftError> for FaciesError {
    fn from(err: realfft::FftError) -> Self {
        FaciesError::Fft(err.to_string())
    }
}

/// Reasons a single well is left out of the estimation.
///
/// These never abort a run on their own; the estimator logs them and
/// carries on with the remaining wells.
#[derive(Error, Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum WellRejection {
    #[error("well is deviated; a single vertical trend is not defined")]
    Deviated,

    #[error("log '{log}' has {found} layers, expected {expected}")]
    LengthMismatch {
        log: String,
        expected: usize,
        found: usize,
    },

    #[error("background trend for {0} is missing in every layer")]
    MissingBackground(String),

    #[error("facies log has wrong entries (label {label} with {n_facies} facies configured)")]
    InvalidFaciesLabel { label: usize, n_facies: usize },
}
