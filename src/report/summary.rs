// src/report/summary.rs
//
// Serialisable summary of a facies estimation run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::BandwidthMethod;
use crate::core::analysis::{ClassificationStats, FaciesDensities, FilteredTrace};
use crate::error::WellRejection;

/// Severity of a run notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    /// Expected condition worth mentioning
    Info,
    /// Result is usable but degraded
    Warning,
}

impl Severity {
    pub fn symbol(&self) -> &'static str {
        match self {
            Severity::Info => "ℹ",
            Severity::Warning => "⚠",
        }
    }

    pub fn color_code(&self) -> &'static str {
        match self {
            Severity::Info => "\x1b[36m",    // cyan
            Severity::Warning => "\x1b[33m", // yellow
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
}

/// A well left out of the estimation and why
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedWell {
    pub well: String,
    pub reason: WellRejection,
}

/// Facies counts in one well
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WellFaciesCount {
    pub well: String,
    pub counts: Vec<usize>,
}

impl WellFaciesCount {
    pub fn from_trace(trace: &FilteredTrace, n_facies: usize) -> Self {
        let mut counts = vec![0; n_facies];
        for f in trace.facies.iter().flatten() {
            if let Some(c) = counts.get_mut(*f) {
                *c += 1;
            }
        }
        Self {
            well: trace.well.clone(),
            counts,
        }
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

/// Result of one estimation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimationSummary {
    pub timestamp: DateTime<Utc>,
    pub facies_names: Vec<String>,
    pub method: BandwidthMethod,
    pub priors: Vec<f64>,
    pub counts: Vec<usize>,
    pub wells: Vec<WellFaciesCount>,
    pub rejected: Vec<RejectedWell>,
    pub bandwidth: [f64; 3],
    pub lattice: [usize; 3],
    pub passed_frequency_bins: usize,
    pub classification: Option<ClassificationStats>,
    pub notices: Vec<Notice>,
}

impl EstimationSummary {
    pub fn new(
        facies_names: Vec<String>,
        densities: &FaciesDensities,
        traces: &[FilteredTrace],
        rejected: Vec<RejectedWell>,
        passed_frequency_bins: usize,
    ) -> Self {
        let n_facies = facies_names.len();
        let mut notices = Vec::new();
        for r in &rejected {
            notices.push(Notice {
                severity: Severity::Warning,
                message: format!("Well {} skipped: {}", r.well, r.reason),
            });
        }
        for (name, &count) in facies_names.iter().zip(&densities.counts) {
            if count == 0 {
                notices.push(Notice {
                    severity: Severity::Warning,
                    message: format!("Facies '{}' is not observed in any well", name),
                });
            }
        }
        if passed_frequency_bins == 0 {
            notices.push(Notice {
                severity: Severity::Warning,
                message: "No frequency passed the filter; filtered logs equal the background"
                    .to_string(),
            });
        }

        Self {
            timestamp: Utc::now(),
            facies_names,
            method: densities.method,
            priors: densities.priors.values().to_vec(),
            counts: densities.counts.clone(),
            wells: traces
                .iter()
                .map(|t| WellFaciesCount::from_trace(t, n_facies))
                .collect(),
            rejected,
            bandwidth: densities.bandwidth,
            lattice: densities.binning.dims().n,
            passed_frequency_bins,
            classification: None,
            notices,
        }
    }

    pub fn add_notice(&mut self, severity: Severity, message: impl Into<String>) {
        self.notices.push(Notice {
            severity,
            message: message.into(),
        });
    }

    pub fn total_count(&self) -> usize {
        self.counts.iter().sum()
    }

    pub fn has_warnings(&self) -> bool {
        self.notices.iter().any(|n| n.severity == Severity::Warning)
    }
}
