// src/core/analysis/spectral_filter.rs
//
// Frequency-domain filtering of well logs to seismic resolution.
// Each well's deviation from its background trend is transformed, passed
// through a 3x3 filter per frequency bin built from the prior and posterior
// covariances, and transformed back.

use log::{debug, info};
use nalgebra::Vector3;
use num_complex::Complex64;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{FrequencyBand, LayerInterval};
use crate::core::covariance::CovarianceModel;
use crate::core::dsp::matrix::{cholesky_lower, psd_sqrt, to_complex, whiten};
use crate::core::dsp::{Matrix3, TraceFft};
use crate::core::well::{ElasticTrace, SimboxLayout, WellLog};
use crate::error::{Result, WellRejection};

/// A well that passed screening, with gaps filled and trends extrapolated
#[derive(Debug, Clone)]
pub struct PreparedWell {
    pub index: usize,
    pub name: String,
    /// Blocked logs with missing layers filled from the background
    pub blocked: ElasticTrace,
    pub background: ElasticTrace,
    /// Facies label where the layer may be used for facies statistics
    pub facies: Vec<Option<usize>>,
    pub top_ms: f64,
    pub dz_ms: f64,
}

/// Screen one well and bring it into filterable form.
///
/// Facies labels are kept only where Vp, Vs and density are all observed,
/// the layer lies inside the simbox and inside `interval` when one is given.
pub fn prepare_well(
    index: usize,
    well: &WellLog,
    layout: &SimboxLayout,
    n_facies: usize,
    interval: Option<LayerInterval>,
) -> std::result::Result<PreparedWell, WellRejection> {
    if well.deviated {
        return Err(WellRejection::Deviated);
    }
    well.check_lengths(layout.nz)?;
    if let Some(label) = well.max_facies_label() {
        if label >= n_facies {
            return Err(WellRejection::InvalidFaciesLabel { label, n_facies });
        }
    }

    let background = well.extrapolated_background()?;
    let blocked = well.filled_logs(&background);

    let facies = (0..layout.nz)
        .map(|i| {
            let usable = well.is_complete(i)
                && well.is_inside(i)
                && interval.map_or(true, |iv| iv.contains(i));
            if usable {
                well.facies[i]
            } else {
                None
            }
        })
        .collect();

    Ok(PreparedWell {
        index,
        name: well.name.clone(),
        blocked,
        background,
        facies,
        top_ms: well.top_ms,
        dz_ms: well.dz_ms.unwrap_or(layout.dz_ms),
    })
}

/// Filtered logs of one well, index-aligned with its layers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteredTrace {
    pub well_index: usize,
    pub well: String,
    pub filtered: ElasticTrace,
    pub blocked: ElasticTrace,
    pub background: ElasticTrace,
    pub facies: Vec<Option<usize>>,
    pub top_ms: f64,
    pub dz_ms: f64,
}

/// One layer of one well as seen by the density estimator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaciesSample {
    pub well: usize,
    pub layer: usize,
    pub filtered: [f64; 3],
    pub blocked: [f64; 3],
    pub facies: Option<usize>,
}

impl FilteredTrace {
    pub fn samples(&self) -> impl Iterator<Item = FaciesSample> + '_ {
        (0..self.facies.len()).map(move |layer| FaciesSample {
            well: self.well_index,
            layer,
            filtered: self.filtered.at(layer),
            blocked: self.blocked.at(layer),
            facies: self.facies[layer],
        })
    }

    pub fn time_ms(&self, layer: usize) -> f64 {
        self.top_ms + layer as f64 * self.dz_ms
    }
}

/// Linear bridge from the last residual back to the first over the padding.
pub fn pad_residual(residual: &[f64], nzp: usize) -> Vec<f64> {
    let nz = residual.len();
    let mut out = vec![0.0; nzp];
    out[..nz].copy_from_slice(residual);
    if nz == 0 || nzp <= nz {
        return out;
    }
    let last = residual[nz - 1];
    let step = (residual[0] - last) / (nzp - nz) as f64;
    for (i, slot) in out.iter_mut().enumerate().skip(nz) {
        *slot = last + (i - (nz - 1)) as f64 * step;
    }
    out
}

/// Per-frequency 3x3 filters for one simbox and covariance model.
///
/// The covariances are stationary, so the filters are built once and shared
/// read-only by every well. `None` marks a bin that is fully attenuated.
pub struct SpectralFilter {
    layout: SimboxLayout,
    band: FrequencyBand,
    filters: Vec<Option<Matrix3>>,
}

impl SpectralFilter {
    pub fn new(
        layout: SimboxLayout,
        covariance: &CovarianceModel,
        band: FrequencyBand,
    ) -> Result<Self> {
        layout.validate()?;
        covariance.validate(layout.nzp)?;

        let mut fft = TraceFft::new(layout.nzp);
        let correlation = fft.forward(&covariance.prior_correlation)?;
        let posterior = covariance
            .posterior
            .series()
            .iter()
            .map(|s| fft.forward(s))
            .collect::<Result<Vec<_>>>()?;

        let domega = layout.frequency_step_hz();
        let mut not_positive = 0usize;
        let mut out_of_band = 0usize;
        let filters = (0..fft.bins())
            .map(|w| {
                if !band.contains(w as f64 * domega) {
                    out_of_band += 1;
                    return None;
                }
                let post = [
                    posterior[0][w],
                    posterior[1][w],
                    posterior[2][w],
                    posterior[3][w],
                    posterior[4][w],
                    posterior[5][w],
                ];
                let filter = filter_at(&covariance.prior, correlation[w], post);
                if filter.is_none() {
                    not_positive += 1;
                }
                filter
            })
            .collect::<Vec<_>>();

        debug!(
            "spectral filter: {} bins, {} outside [{}, {}] Hz, {} with non-positive prior spectrum",
            filters.len(),
            out_of_band,
            band.low_hz,
            band.high_hz,
            not_positive
        );

        Ok(Self {
            layout,
            band,
            filters,
        })
    }

    pub fn layout(&self) -> &SimboxLayout {
        &self.layout
    }

    pub fn band(&self) -> FrequencyBand {
        self.band
    }

    pub fn bins(&self) -> usize {
        self.filters.len()
    }

    pub fn filter_matrix(&self, bin: usize) -> Option<&Matrix3> {
        self.filters.get(bin).and_then(Option::as_ref)
    }

    /// Bins that are not fully attenuated
    pub fn passed_bins(&self) -> usize {
        self.filters.iter().filter(|f| f.is_some()).count()
    }

    /// Filter the (Vp, Vs, density) residuals of one trace.
    ///
    /// Each residual has `nz` samples; the result has the same length.
    pub fn filter_residual(
        &self,
        fft: &mut TraceFft,
        residual: [&[f64]; 3],
    ) -> Result<[Vec<f64>; 3]> {
        let nzp = self.layout.nzp;
        let nz = residual[0].len();

        let mut spectra = Vec::with_capacity(3);
        for r in residual {
            spectra.push(fft.forward(&pad_residual(r, nzp))?);
        }

        let zero = Complex64::new(0.0, 0.0);
        for (w, filter) in self.filters.iter().enumerate() {
            let filtered = match filter {
                Some(f) => {
                    let x = Vector3::new(spectra[0][w], spectra[1][w], spectra[2][w]);
                    let y = to_complex(f) * x;
                    [y[0], y[1], y[2]]
                }
                None => [zero; 3],
            };
            for (spectrum, value) in spectra.iter_mut().zip(filtered) {
                spectrum[w] = value;
            }
        }

        let scale = 1.0 / nzp as f64;
        let mut out: [Vec<f64>; 3] = Default::default();
        for (slot, spectrum) in out.iter_mut().zip(spectra.iter_mut()) {
            let trace = fft.inverse(spectrum)?;
            *slot = trace[..nz].iter().map(|v| v * scale).collect();
        }
        Ok(out)
    }

    /// Filter one prepared well and add its background back.
    pub fn filter_well(&self, fft: &mut TraceFft, well: &PreparedWell) -> Result<FilteredTrace> {
        let residual = |log: &[f64], bg: &[f64]| -> Vec<f64> {
            log.iter().zip(bg).map(|(l, b)| l - b).collect()
        };
        let bg = &well.background;
        let r_vp = residual(&well.blocked.vp, &bg.vp);
        let r_vs = residual(&well.blocked.vs, &bg.vs);
        let r_rho = residual(&well.blocked.rho, &bg.rho);

        let [f_vp, f_vs, f_rho] = self.filter_residual(fft, [&r_vp, &r_vs, &r_rho])?;
        let add = |f: Vec<f64>, b: &[f64]| -> Vec<f64> { f.iter().zip(b).map(|(f, b)| f + b).collect() };

        Ok(FilteredTrace {
            well_index: well.index,
            well: well.name.clone(),
            filtered: ElasticTrace {
                vp: add(f_vp, &bg.vp),
                vs: add(f_vs, &bg.vs),
                rho: add(f_rho, &bg.rho),
            },
            blocked: well.blocked.clone(),
            background: well.background.clone(),
            facies: well.facies.clone(),
            top_ms: well.top_ms,
            dz_ms: well.dz_ms,
        })
    }

    /// Filter all wells in parallel, each worker with its own transform.
    pub fn filter_wells(&self, wells: &[PreparedWell]) -> Result<Vec<FilteredTrace>> {
        let nzp = self.layout.nzp;
        let traces = wells
            .par_iter()
            .map_init(|| TraceFft::new(nzp), |fft, well| self.filter_well(fft, well))
            .collect::<Result<Vec<_>>>()?;
        info!(
            "Filtered {} well(s), {} of {} frequency bins passed",
            traces.len(),
            self.passed_bins(),
            self.bins()
        );
        Ok(traces)
    }
}

/// Filter `L V L⁻¹` at one frequency, or `None` if the prior spectrum is not
/// positive definite there.
///
/// `post` holds the posterior spectra in the order vp_vp, vs_vs, rho_rho,
/// vp_vs, vp_rho, vs_rho.
fn filter_at(prior: &Matrix3, correlation: Complex64, post: [Complex64; 6]) -> Option<Matrix3> {
    let sigma_k = prior * correlation.re;
    let l = cholesky_lower(&sigma_k)?;

    let mut sigma_e = to_complex(&sigma_k);
    let positions = [(0, 0), (1, 1), (2, 2), (0, 1), (0, 2), (1, 2)];
    for (&(i, j), p) in positions.iter().zip(post) {
        sigma_e[(i, j)] -= p;
        if i != j {
            sigma_e[(j, i)] = sigma_e[(i, j)].conj();
        }
    }

    let m = whiten(&l, &sigma_e)?.map(|c| c.re);
    let m = (m + m.transpose()) * 0.5;
    let v = psd_sqrt(&m);
    let l_inv = l.solve_lower_triangular(&Matrix3::identity())?;
    Some(l * v * l_inv)
}
