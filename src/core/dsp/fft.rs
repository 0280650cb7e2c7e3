//! FFT processing for well traces and 3D density lattices

use std::sync::Arc;

use num_complex::Complex64;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use rustfft::{Fft, FftPlanner};

use crate::error::Result;

/// Real-to-complex transform pair for one padded trace length.
///
/// A trace of `len` real samples maps to `len / 2 + 1` complex bins. The pair
/// is unnormalized: `inverse(forward(x)) == len * x`. Each worker owns its
/// own instance so scratch buffers are never shared.
pub struct TraceFft {
    len: usize,
    forward: Arc<dyn RealToComplex<f64>>,
    inverse: Arc<dyn ComplexToReal<f64>>,
    real_buf: Vec<f64>,
}

impl TraceFft {
    pub fn new(len: usize) -> Self {
        let mut planner = RealFftPlanner::<f64>::new();
        let forward = planner.plan_fft_forward(len);
        let inverse = planner.plan_fft_inverse(len);
        Self {
            len,
            forward,
            inverse,
            real_buf: vec![0.0; len],
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn bins(&self) -> usize {
        self.len / 2 + 1
    }

    /// Forward transform of `samples` (length `len`).
    pub fn forward(&mut self, samples: &[f64]) -> Result<Vec<Complex64>> {
        debug_assert_eq!(samples.len(), self.len);
        self.real_buf.copy_from_slice(samples);
        let mut spectrum = self.forward.make_output_vec();
        self.forward.process(&mut self.real_buf, &mut spectrum)?;
        Ok(spectrum)
    }

    /// Unnormalized inverse transform; the spectrum is used as scratch.
    pub fn inverse(&mut self, spectrum: &mut [Complex64]) -> Result<Vec<f64>> {
        debug_assert_eq!(spectrum.len(), self.bins());
        // DC (and Nyquist for even lengths) must be real for a real signal.
        spectrum[0].im = 0.0;
        if self.len % 2 == 0 {
            let last = spectrum.len() - 1;
            spectrum[last].im = 0.0;
        }
        let mut out = self.inverse.make_output_vec();
        self.inverse.process(spectrum, &mut out)?;
        Ok(out)
    }
}

/// Shape of a 3D lattice: `n[0]` is the fastest-varying axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatticeDims {
    pub n: [usize; 3],
}

impl LatticeDims {
    pub fn new(n0: usize, n1: usize, n2: usize) -> Self {
        Self { n: [n0, n1, n2] }
    }

    pub fn len(&self) -> usize {
        self.n[0] * self.n[1] * self.n[2]
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn index(&self, i: usize, j: usize, k: usize) -> usize {
        i + j * self.n[0] + k * self.n[0] * self.n[1]
    }
}

/// Orthonormal 3D complex FFT over a fixed lattice.
///
/// Both directions are scaled by `1/√N`, so a circular convolution computed as
/// `inverse(forward(a) · forward(b))` comes out divided by `√N`. Plans are
/// immutable and can be shared between threads.
pub struct LatticeFft {
    dims: LatticeDims,
    forward: [Arc<dyn Fft<f64>>; 3],
    inverse: [Arc<dyn Fft<f64>>; 3],
}

impl LatticeFft {
    pub fn new(dims: LatticeDims) -> Self {
        let mut planner = FftPlanner::<f64>::new();
        let forward = dims.n.map(|n| planner.plan_fft_forward(n));
        let inverse = dims.n.map(|n| planner.plan_fft_inverse(n));
        Self {
            dims,
            forward,
            inverse,
        }
    }

    pub fn dims(&self) -> LatticeDims {
        self.dims
    }

    /// Normalization constant `√N` of the orthonormal pair.
    pub fn sqrt_len(&self) -> f64 {
        (self.dims.len() as f64).sqrt()
    }

    pub fn forward(&self, data: &mut [Complex64]) {
        self.transform(data, &self.forward);
    }

    pub fn inverse(&self, data: &mut [Complex64]) {
        self.transform(data, &self.inverse);
    }

    fn transform(&self, data: &mut [Complex64], plans: &[Arc<dyn Fft<f64>>; 3]) {
        debug_assert_eq!(data.len(), self.dims.len());
        let [n0, n1, n2] = self.dims.n;

        // Axis 0 is contiguous: every run of n0 values is one line.
        plans[0].process(data);

        let mut line = vec![Complex64::new(0.0, 0.0); n1.max(n2)];

        for k in 0..n2 {
            for i in 0..n0 {
                let buf = &mut line[..n1];
                for (j, v) in buf.iter_mut().enumerate() {
                    *v = data[self.dims.index(i, j, k)];
                }
                plans[1].process(buf);
                for (j, v) in buf.iter().enumerate() {
                    data[self.dims.index(i, j, k)] = *v;
                }
            }
        }

        for j in 0..n1 {
            for i in 0..n0 {
                let buf = &mut line[..n2];
                for (k, v) in buf.iter_mut().enumerate() {
                    *v = data[self.dims.index(i, j, k)];
                }
                plans[2].process(buf);
                for (k, v) in buf.iter().enumerate() {
                    data[self.dims.index(i, j, k)] = *v;
                }
            }
        }

        let norm = 1.0 / self.sqrt_len();
        data.iter_mut().for_each(|v| *v *= norm);
    }
}
