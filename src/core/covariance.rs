// src/core/covariance.rs
//
// Prior and posterior covariance model for Vp, Vs and density.

use serde::{Deserialize, Serialize};

use crate::core::dsp::matrix::{diag, is_symmetric, symmetric_matrix};
use crate::core::dsp::Matrix3;
use crate::error::{FaciesError, Result};

/// Posterior (error) covariance functions over vertical lag.
///
/// Each series has one value per padded layer, lag 0 first, and wraps
/// around like a periodic autocovariance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosteriorCovariance {
    pub vp_vp: Vec<f64>,
    pub vs_vs: Vec<f64>,
    pub rho_rho: Vec<f64>,
    pub vp_vs: Vec<f64>,
    pub vp_rho: Vec<f64>,
    pub vs_rho: Vec<f64>,
}

impl PosteriorCovariance {
    /// All six functions identically zero.
    pub fn zero(nzp: usize) -> Self {
        let z = vec![0.0; nzp];
        Self {
            vp_vp: z.clone(),
            vs_vs: z.clone(),
            rho_rho: z.clone(),
            vp_vs: z.clone(),
            vp_rho: z.clone(),
            vs_rho: z,
        }
    }

    /// A separable covariance: `matrix` scaled by one correlation function.
    pub fn stationary(matrix: &Matrix3, correlation: &[f64]) -> Self {
        let scaled = |v: f64| correlation.iter().map(|c| c * v).collect::<Vec<_>>();
        Self {
            vp_vp: scaled(matrix[(0, 0)]),
            vs_vs: scaled(matrix[(1, 1)]),
            rho_rho: scaled(matrix[(2, 2)]),
            vp_vs: scaled(matrix[(0, 1)]),
            vp_rho: scaled(matrix[(0, 2)]),
            vs_rho: scaled(matrix[(1, 2)]),
        }
    }

    /// Series in matrix order: diagonal first, then the upper triangle.
    pub fn series(&self) -> [&[f64]; 6] {
        [
            &self.vp_vp,
            &self.vs_vs,
            &self.rho_rho,
            &self.vp_vs,
            &self.vp_rho,
            &self.vs_rho,
        ]
    }

    /// Covariance matrix at lag zero.
    pub fn lag_zero(&self) -> Matrix3 {
        let at0 = |s: &[f64]| s.first().copied().unwrap_or(0.0);
        symmetric_matrix(
            [at0(&self.vp_vp), at0(&self.vs_vs), at0(&self.rho_rho)],
            at0(&self.vp_vs),
            at0(&self.vp_rho),
            at0(&self.vs_rho),
        )
    }
}

/// Prior covariance, its vertical correlation and the posterior covariance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CovarianceModel {
    /// Stationary 3x3 prior covariance of (Vp, Vs, density)
    pub prior: Matrix3,
    /// Prior correlation over vertical lag, one value per padded layer
    pub prior_correlation: Vec<f64>,
    pub posterior: PosteriorCovariance,
}

impl CovarianceModel {
    pub fn validate(&self, nzp: usize) -> Result<()> {
        let variances = diag(&self.prior);
        let scale = variances.iter().fold(1.0f64, |a, b| a.max(b.abs()));
        if !is_symmetric(&self.prior, 1e-9 * scale) {
            return Err(FaciesError::InvalidConfig(
                "prior covariance is not symmetric".to_string(),
            ));
        }
        if variances.iter().any(|v| *v < 0.0 || !v.is_finite()) {
            return Err(FaciesError::InvalidConfig(
                "prior covariance has a negative or non-finite variance".to_string(),
            ));
        }
        check_len("prior correlation", &self.prior_correlation, nzp)?;
        let names = ["vp_vp", "vs_vs", "rho_rho", "vp_vs", "vp_rho", "vs_rho"];
        for (name, series) in names.iter().zip(self.posterior.series()) {
            check_len(&format!("posterior covariance {}", name), series, nzp)?;
        }
        Ok(())
    }
}

fn check_len(what: &str, series: &[f64], nzp: usize) -> Result<()> {
    if series.len() != nzp {
        return Err(FaciesError::DimensionMismatch {
            what: what.to_string(),
            expected: nzp,
            found: series.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prior() -> Matrix3 {
        symmetric_matrix([4.0, 2.0, 1.0], 1.0, 0.2, 0.3)
    }

    #[test]
    fn test_stationary_lag_zero() {
        let post = PosteriorCovariance::stationary(&prior(), &[0.5, 0.25, 0.25, 0.5]);
        assert_eq!(post.lag_zero(), prior() * 0.5);
        assert_eq!(post.vp_rho, vec![0.1, 0.05, 0.05, 0.1]);
    }

    #[test]
    fn test_validate_lengths() {
        let model = CovarianceModel {
            prior: prior(),
            prior_correlation: vec![1.0, 0.5, 0.5, 0.5],
            posterior: PosteriorCovariance::zero(4),
        };
        assert!(model.validate(4).is_ok());
        assert!(matches!(
            model.validate(8),
            Err(FaciesError::DimensionMismatch { expected: 8, found: 4, .. })
        ));
    }

    #[test]
    fn test_validate_rejects_asymmetric_prior() {
        let mut m = prior();
        m[(0, 1)] = 5.0;
        let model = CovarianceModel {
            prior: m,
            prior_correlation: vec![1.0; 2],
            posterior: PosteriorCovariance::zero(2),
        };
        assert!(matches!(model.validate(2), Err(FaciesError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_symmetry_tolerance_follows_largest_variance() {
        let mut prior = symmetric_matrix([10000.0, 2500.0, 0.0025], 3000.0, 2.0, 0.5);
        prior[(1, 0)] += 1e-7;
        let mut model = CovarianceModel {
            prior,
            prior_correlation: vec![1.0; 2],
            posterior: PosteriorCovariance::zero(2),
        };
        assert!(model.validate(2).is_ok());

        model.prior[(1, 0)] += 1e-3;
        assert!(matches!(model.validate(2), Err(FaciesError::InvalidConfig(_))));
    }
}
