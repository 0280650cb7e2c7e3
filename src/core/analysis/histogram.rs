// src/core/analysis/histogram.rs
//
// Lattice geometry over (Vp, Vs, density) space and per-facies histograms

use serde::{Deserialize, Serialize};

use crate::core::dsp::LatticeDims;

/// Relative step given to an axis whose data has no spread at all
const DEGENERATE_STEP: f64 = 1e-6;

/// One axis of the density lattice.
///
/// Bin `j` covers `[min + j·step, min + (j+1)·step)` and its lattice node
/// sits at the bin centre `min + (j + ½)·step`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatticeAxis {
    pub min: f64,
    pub step: f64,
    pub n: usize,
}

impl LatticeAxis {
    /// Axis covering `[lo - pad, hi + pad]` with `n` bins.
    ///
    /// A zero-width range gets a tiny nominal step, placed so that `lo` falls
    /// exactly on the centre of bin `n / 2`.
    pub fn spanning(lo: f64, hi: f64, pad: f64, n: usize) -> Self {
        let width = (hi - lo) + 2.0 * pad;
        let scale = lo.abs().max(hi.abs()).max(1.0);
        if width > scale * DEGENERATE_STEP * n as f64 {
            Self {
                min: lo - pad,
                step: width / n as f64,
                n,
            }
        } else {
            let step = scale * DEGENERATE_STEP;
            let centre = 0.5 * (lo + hi);
            Self {
                min: centre - ((n / 2) as f64 + 0.5) * step,
                step,
                n,
            }
        }
    }

    pub fn max(&self) -> f64 {
        self.min + self.step * self.n as f64
    }

    pub fn centre(&self, j: usize) -> f64 {
        self.min + (j as f64 + 0.5) * self.step
    }

    /// Bin holding `x`, clamped to the axis.
    pub fn bin_index(&self, x: f64) -> usize {
        let u = ((x - self.min) / self.step).floor();
        if !(u > 0.0) {
            0
        } else if u >= (self.n - 1) as f64 {
            self.n - 1
        } else {
            u as usize
        }
    }

    /// Neighbouring nodes around `x` and the weight of the upper one.
    ///
    /// Below the first centre and above the last centre the query is pinned
    /// to the edge node with weight zero.
    pub fn interpolation_nodes(&self, x: f64) -> (usize, usize, f64) {
        let u = (x - self.min) / self.step - 0.5;
        let last = self.n - 1;
        if !(u > 0.0) {
            (0, 0, 0.0)
        } else if u >= last as f64 {
            (last, last, 0.0)
        } else {
            let lower = u.floor();
            let j = lower as usize;
            (j, j + 1, u - lower)
        }
    }
}

/// The three axes of the density lattice, Vp fastest
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Binning {
    pub axes: [LatticeAxis; 3],
}

impl Binning {
    pub fn dims(&self) -> LatticeDims {
        LatticeDims::new(self.axes[0].n, self.axes[1].n, self.axes[2].n)
    }

    pub fn len(&self) -> usize {
        self.dims().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn steps(&self) -> [f64; 3] {
        self.axes.map(|a| a.step)
    }

    /// Flat lattice index of the bin holding `point`.
    pub fn bin_of(&self, point: [f64; 3]) -> usize {
        let [a, b, c] = self.axes;
        self.dims()
            .index(a.bin_index(point[0]), b.bin_index(point[1]), c.bin_index(point[2]))
    }

    /// Centre of the bin with lattice indices `(i, j, k)`.
    pub fn centre(&self, i: usize, j: usize, k: usize) -> [f64; 3] {
        [
            self.axes[0].centre(i),
            self.axes[1].centre(j),
            self.axes[2].centre(k),
        ]
    }
}

/// Raw weighted histograms, one lattice per facies.
///
/// Each entry in `points` is `(facies, value, weight)`. Every lattice is
/// divided by its facies count afterwards; facies without entries stay zero.
pub fn facies_histograms<I>(binning: &Binning, n_facies: usize, points: I) -> (Vec<Vec<f64>>, Vec<usize>)
where
    I: IntoIterator<Item = (usize, [f64; 3], f64)>,
{
    let len = binning.len();
    let mut hist = vec![vec![0.0; len]; n_facies];
    let mut counts = vec![0usize; n_facies];
    for (facies, value, weight) in points {
        hist[facies][binning.bin_of(value)] += weight;
        counts[facies] += 1;
    }
    for (h, &count) in hist.iter_mut().zip(&counts) {
        if count > 0 {
            let nf = 1.0 / count as f64;
            h.iter_mut().for_each(|v| *v *= nf);
        }
    }
    (hist, counts)
}
