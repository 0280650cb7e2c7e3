//! Run reporting

mod summary;

pub use summary::{EstimationSummary, Notice, RejectedWell, Severity, WellFaciesCount};
