// src/core/study.rs
//
// JSON study input: simbox layout, covariances, blocked wells and settings

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::covariance::CovarianceModel;
use super::engine::{EstimatorBuilder, FaciesEstimator};
use super::well::{SimboxLayout, WellLog};
use crate::config::FaciesConfig;
use crate::error::Result;

/// Everything needed to estimate facies densities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Study {
    pub layout: SimboxLayout,
    pub covariance: CovarianceModel,
    pub wells: Vec<WellLog>,
    pub settings: FaciesConfig,
}

impl Study {
    pub fn from_path(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let study: Study = serde_json::from_reader(reader)?;
        study.layout.validate()?;
        study.covariance.validate(study.layout.nzp)?;
        Ok(study)
    }

    pub fn to_path(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Estimator for this study with `settings` replaced by `config`.
    pub fn estimator_with(&self, config: FaciesConfig) -> Result<FaciesEstimator> {
        EstimatorBuilder::from_config(config).build(self.layout, self.covariance.clone())
    }

    pub fn estimator(&self) -> Result<FaciesEstimator> {
        self.estimator_with(self.settings.clone())
    }
}
