// src/core/well.rs
//
// Blocked well logs and the vertical simbox layout they are sampled on.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{FaciesError, Result, WellRejection};

/// Vertical layout shared by all wells and grids.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimboxLayout {
    /// Number of physical layers
    pub nz: usize,
    /// Padded layer count used as FFT length
    pub nzp: usize,
    /// Vertical sampling in milliseconds (two-way time)
    pub dz_ms: f64,
}

impl SimboxLayout {
    pub fn new(nz: usize, nzp: usize, dz_ms: f64) -> Result<Self> {
        let layout = Self { nz, nzp, dz_ms };
        layout.validate()?;
        Ok(layout)
    }

    pub fn validate(&self) -> Result<()> {
        if self.nz == 0 {
            return Err(FaciesError::InvalidConfig("simbox has no layers".to_string()));
        }
        if self.nzp < self.nz {
            return Err(FaciesError::InvalidConfig(format!(
                "padded layer count {} is smaller than layer count {}",
                self.nzp, self.nz
            )));
        }
        if !(self.dz_ms > 0.0) || !self.dz_ms.is_finite() {
            return Err(FaciesError::InvalidConfig(format!(
                "layer thickness must be positive, got {} ms",
                self.dz_ms
            )));
        }
        Ok(())
    }

    /// Frequency spacing of the padded transform in Hz.
    pub fn frequency_step_hz(&self) -> f64 {
        1000.0 / (self.nzp as f64 * self.dz_ms)
    }
}

/// Vp, Vs and density along one well, one value per layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElasticTrace {
    pub vp: Vec<f64>,
    pub vs: Vec<f64>,
    pub rho: Vec<f64>,
}

impl ElasticTrace {
    pub fn len(&self) -> usize {
        self.vp.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vp.is_empty()
    }

    pub fn at(&self, i: usize) -> [f64; 3] {
        [self.vp[i], self.vs[i], self.rho[i]]
    }
}

/// Optional per-layer log values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogTriple {
    pub vp: Vec<Option<f64>>,
    pub vs: Vec<Option<f64>>,
    pub rho: Vec<Option<f64>>,
}

impl LogTriple {
    fn named(&self) -> [(&'static str, &Vec<Option<f64>>); 3] {
        [("vp", &self.vp), ("vs", &self.vs), ("rho", &self.rho)]
    }
}

/// A blocked well: logs resampled onto the simbox layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WellLog {
    pub name: String,
    /// Deviated wells have no single lateral position and are not filtered.
    #[serde(default)]
    pub deviated: bool,
    /// Blocked Vp, Vs and density
    pub logs: LogTriple,
    /// Background (low-frequency) trend at the well position
    pub background: LogTriple,
    /// Facies label per layer
    pub facies: Vec<Option<usize>>,
    /// Whether each layer lies inside the output simbox; empty means all inside
    #[serde(default)]
    pub inside_simbox: Vec<bool>,
    /// Relative layer thickness at the well, in milliseconds
    #[serde(default)]
    pub dz_ms: Option<f64>,
    /// Time of the first layer, in milliseconds
    #[serde(default)]
    pub top_ms: f64,
}

impl WellLog {
    /// Check that every per-layer array has `nz` entries.
    pub fn check_lengths(&self, nz: usize) -> std::result::Result<(), WellRejection> {
        let mut arrays: Vec<(String, usize)> = Vec::with_capacity(8);
        for (name, log) in self.logs.named() {
            arrays.push((name.to_string(), log.len()));
        }
        for (name, log) in self.background.named() {
            arrays.push((format!("background {}", name), log.len()));
        }
        arrays.push(("facies".to_string(), self.facies.len()));
        if !self.inside_simbox.is_empty() {
            arrays.push(("inside_simbox".to_string(), self.inside_simbox.len()));
        }
        for (log, found) in arrays {
            if found != nz {
                return Err(WellRejection::LengthMismatch {
                    log,
                    expected: nz,
                    found,
                });
            }
        }
        Ok(())
    }

    pub fn is_inside(&self, layer: usize) -> bool {
        self.inside_simbox.get(layer).copied().unwrap_or(true)
    }

    /// Largest facies label in the log, if any.
    pub fn max_facies_label(&self) -> Option<usize> {
        self.facies.iter().flatten().copied().max()
    }

    /// Background trend with missing ends extrapolated.
    pub fn extrapolated_background(&self) -> std::result::Result<ElasticTrace, WellRejection> {
        let mut out = ElasticTrace::default();
        for (name, log) in self.background.named() {
            let filled = extrapolate(log)
                .ok_or_else(|| WellRejection::MissingBackground(name.to_string()))?;
            match name {
                "vp" => out.vp = filled,
                "vs" => out.vs = filled,
                _ => out.rho = filled,
            }
        }
        Ok(out)
    }

    /// Blocked logs with gaps filled from the background trend.
    pub fn filled_logs(&self, background: &ElasticTrace) -> ElasticTrace {
        ElasticTrace {
            vp: fill_from_trend(&self.logs.vp, &background.vp),
            vs: fill_from_trend(&self.logs.vs, &background.vs),
            rho: fill_from_trend(&self.logs.rho, &background.rho),
        }
    }

    /// Layer has all three elastic values.
    pub fn is_complete(&self, layer: usize) -> bool {
        self.logs.vp[layer].is_some() && self.logs.vs[layer].is_some() && self.logs.rho[layer].is_some()
    }
}

/// Constant extrapolation of a log at both ends.
///
/// Interior gaps are interpolated linearly between their neighbours so the
/// result is dense. Returns `None` when every value is missing.
pub fn extrapolate(log: &[Option<f64>]) -> Option<Vec<f64>> {
    let first = log.iter().position(Option::is_some)?;
    let last = log.iter().rposition(Option::is_some)?;
    let first_value = log[first]?;
    let last_value = log[last]?;

    if first > 0 || last + 1 < log.len() {
        warn!(
            "trend extrapolated for {} leading and {} trailing layer(s)",
            first,
            log.len() - 1 - last
        );
    }

    let mut out = vec![0.0; log.len()];
    out[..first].fill(first_value);
    out[last..].fill(last_value);
    let interior = interpolate_gaps(&log[first..=last], 0.0);
    out[first..=last].copy_from_slice(&interior);
    Some(out)
}

/// Fill missing log values from a trend.
///
/// Residuals (log minus trend) inside a gap are interpolated linearly between
/// the neighbouring observed residuals; gaps at either end get a zero residual,
/// so the log falls back to the trend there.
pub fn fill_from_trend(log: &[Option<f64>], trend: &[f64]) -> Vec<f64> {
    let residual: Vec<Option<f64>> = log
        .iter()
        .zip(trend)
        .map(|(v, t)| v.map(|v| v - t))
        .collect();
    interpolate_gaps(&residual, 0.0)
        .into_iter()
        .zip(trend)
        .map(|(r, t)| r + t)
        .collect()
}

/// Linear interpolation across interior gaps, `edge` outside the observed range.
fn interpolate_gaps(values: &[Option<f64>], edge: f64) -> Vec<f64> {
    let mut out = vec![edge; values.len()];
    let mut prev: Option<(usize, f64)> = None;
    for (i, v) in values.iter().enumerate() {
        if let Some(v) = *v {
            if let Some((p, pv)) = prev {
                let span = (i - p) as f64;
                for (g, slot) in out.iter_mut().enumerate().take(i).skip(p + 1) {
                    let w = (g - p) as f64 / span;
                    *slot = pv + w * (v - pv);
                }
            }
            out[i] = v;
            prev = Some((i, v));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_validation() {
        assert!(SimboxLayout::new(10, 16, 4.0).is_ok());
        assert!(SimboxLayout::new(0, 16, 4.0).is_err());
        assert!(SimboxLayout::new(20, 16, 4.0).is_err());
        assert!(SimboxLayout::new(10, 16, 0.0).is_err());
        let layout = SimboxLayout::new(10, 20, 4.0).unwrap();
        assert!((layout.frequency_step_hz() - 12.5).abs() < 1e-12);
    }

    #[test]
    fn test_extrapolate_ends_and_gaps() {
        let log = vec![None, Some(2.0), None, Some(4.0), None, None];
        assert_eq!(extrapolate(&log).unwrap(), vec![2.0, 2.0, 3.0, 4.0, 4.0, 4.0]);
        assert!(extrapolate(&[None, None]).is_none());
    }

    #[test]
    fn test_fill_from_trend() {
        let trend = vec![10.0; 5];
        let log = vec![None, Some(12.0), None, Some(14.0), None];
        assert_eq!(fill_from_trend(&log, &trend), vec![10.0, 12.0, 13.0, 14.0, 10.0]);
    }

    #[test]
    fn test_check_lengths() {
        let n = 3;
        let triple = LogTriple {
            vp: vec![Some(1.0); n],
            vs: vec![Some(1.0); n],
            rho: vec![Some(1.0); n],
        };
        let mut well = WellLog {
            name: "A".to_string(),
            deviated: false,
            logs: triple.clone(),
            background: triple,
            facies: vec![Some(0); n],
            inside_simbox: Vec::new(),
            dz_ms: None,
            top_ms: 0.0,
        };
        assert!(well.check_lengths(n).is_ok());
        well.facies.pop();
        assert_eq!(
            well.check_lengths(n),
            Err(WellRejection::LengthMismatch {
                log: "facies".to_string(),
                expected: 3,
                found: 2
            })
        );
    }
}
