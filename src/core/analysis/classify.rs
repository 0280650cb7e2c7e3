// src/core/analysis/classify.rs
//
// Facies probability classification of elastic grids.
// Grids are streamed one layer at a time; voxels within a layer are
// classified in parallel against the finished density lattices.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::density::FaciesDensities;
use crate::core::grid::GridDims;
use crate::error::{FaciesError, Result};

/// One horizontal layer of Vp, Vs and density over the padded footprint
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElasticSlab {
    pub vp: Vec<f32>,
    pub vs: Vec<f32>,
    pub rho: Vec<f32>,
}

impl ElasticSlab {
    pub fn new(len: usize) -> Self {
        Self {
            vp: vec![0.0; len],
            vs: vec![0.0; len],
            rho: vec![0.0; len],
        }
    }

    pub fn len(&self) -> usize {
        self.vp.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vp.is_empty()
    }

    pub fn point(&self, cell: usize) -> [f64; 3] {
        [self.vp[cell] as f64, self.vs[cell] as f64, self.rho[cell] as f64]
    }
}

/// Facies and undefined probabilities for one layer.
///
/// Cells are stored voxel by voxel: `n_facies` facies values followed by the
/// undefined mass. `None` marks voxels with no probability (padding or
/// missing input), never a zero probability.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilitySlab {
    n_facies: usize,
    cells: Vec<Option<f32>>,
}

impl ProbabilitySlab {
    pub fn new(n_facies: usize, n_voxels: usize) -> Self {
        Self {
            n_facies,
            cells: vec![None; n_voxels * (n_facies + 1)],
        }
    }

    pub fn n_facies(&self) -> usize {
        self.n_facies
    }

    pub fn n_voxels(&self) -> usize {
        self.cells.len() / (self.n_facies + 1)
    }

    pub fn facies(&self, facies: usize, voxel: usize) -> Option<f32> {
        self.cells[voxel * (self.n_facies + 1) + facies]
    }

    pub fn undefined(&self, voxel: usize) -> Option<f32> {
        self.cells[voxel * (self.n_facies + 1) + self.n_facies]
    }

    fn stride(&self) -> usize {
        self.n_facies + 1
    }
}

/// Supplies elastic parameters layer by layer
pub trait ElasticSource {
    fn dims(&self) -> GridDims;

    /// Fill `slab` (length `nxp * nyp`) with layer `k`.
    fn read_layer(&mut self, k: usize, slab: &mut ElasticSlab) -> Result<()>;
}

/// Receives facies probabilities layer by layer
pub trait ProbabilitySink {
    fn write_layer(&mut self, k: usize, slab: &ProbabilitySlab) -> Result<()>;

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Cooperative cancellation shared between a run and its controller
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Counts from one classification pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationStats {
    pub layers: usize,
    pub classified: usize,
    pub missing: usize,
}

/// Bayesian facies classification against a set of densities
pub struct Classifier<'a> {
    densities: &'a FaciesDensities,
    undefined_mass: f64,
    /// Undefined mass spread evenly over the lattice
    undefined_density: f64,
}

impl<'a> Classifier<'a> {
    pub fn new(densities: &'a FaciesDensities, undefined_mass: f64) -> Self {
        let nodes = densities.lattice_len().max(1) as f64;
        Self {
            densities,
            undefined_mass,
            undefined_density: undefined_mass / nodes,
        }
    }

    pub fn undefined_mass(&self) -> f64 {
        self.undefined_mass
    }

    pub fn n_facies(&self) -> usize {
        self.densities.n_facies()
    }

    /// Facies probabilities at `point`, written into `probabilities`.
    ///
    /// Returns the undefined probability; facies and undefined sum to one.
    /// When every density and the undefined mass are zero the voxel is
    /// entirely undefined.
    pub fn classify_voxel(&self, point: [f64; 3], probabilities: &mut [f64]) -> f64 {
        let mut sum = self.undefined_density;
        for (f, p) in probabilities.iter_mut().enumerate() {
            *p = self.densities.priors.get(f) * self.densities.find_density(f, point);
            sum += *p;
        }
        if !(sum > 0.0) || !sum.is_finite() {
            probabilities.iter_mut().for_each(|p| *p = 0.0);
            return 1.0;
        }
        probabilities.iter_mut().for_each(|p| *p /= sum);
        self.undefined_density / sum
    }

    /// Classify one layer; returns the number of classified voxels.
    pub fn classify_layer(&self, dims: &GridDims, input: &ElasticSlab, out: &mut ProbabilitySlab) -> usize {
        let n_facies = self.n_facies();
        let stride = out.stride();
        let nxp = dims.nxp;
        out.cells
            .par_chunks_mut(stride)
            .enumerate()
            .map_init(
                || vec![0.0; n_facies],
                |scratch, (cell, chunk)| {
                    let (i, j) = (cell % nxp, cell / nxp);
                    let point = input.point(cell);
                    if i >= dims.nx || j >= dims.ny || point.iter().any(|v| !v.is_finite()) {
                        chunk.iter_mut().for_each(|c| *c = None);
                        return 0usize;
                    }
                    let undefined = self.classify_voxel(point, scratch);
                    for (c, p) in chunk.iter_mut().zip(scratch.iter()) {
                        *c = Some(*p as f32);
                    }
                    chunk[n_facies] = Some(undefined as f32);
                    1
                },
            )
            .sum()
    }

    /// Stream the logical layers of `source` through the classifier into `sink`.
    ///
    /// `cancel` is checked before each layer; a cancelled run returns
    /// [`FaciesError::Cancelled`] with the number of layers already written.
    pub fn run<S, K>(&self, source: &mut S, sink: &mut K, cancel: &CancelFlag) -> Result<ClassificationStats>
    where
        S: ElasticSource + ?Sized,
        K: ProbabilitySink + ?Sized,
    {
        let dims = source.dims();
        dims.validate()?;
        let layer_len = dims.layer_len();
        let mut input = ElasticSlab::new(layer_len);
        let mut output = ProbabilitySlab::new(self.n_facies(), layer_len);
        let mut stats = ClassificationStats::default();

        for k in 0..dims.nz {
            if cancel.is_cancelled() {
                info!("Classification cancelled after {} of {} layers", k, dims.nz);
                return Err(FaciesError::Cancelled { completed_layers: k });
            }
            source.read_layer(k, &mut input)?;
            if input.len() != layer_len {
                return Err(FaciesError::DimensionMismatch {
                    what: format!("elastic layer {}", k),
                    expected: layer_len,
                    found: input.len(),
                });
            }
            let classified = self.classify_layer(&dims, &input, &mut output);
            sink.write_layer(k, &output)?;

            stats.layers += 1;
            stats.classified += classified;
            stats.missing += layer_len - classified;
            debug!("Layer {}: {} voxel(s) classified", k, classified);
        }
        sink.finish()?;

        info!(
            "Classified {} voxel(s) in {} layer(s), {} without probability",
            stats.classified, stats.layers, stats.missing
        );
        Ok(stats)
    }
}
