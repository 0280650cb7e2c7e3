//! Numerical building blocks: FFTs, 3x3 matrix algebra, sample statistics

pub mod fft;
pub mod matrix;
pub mod stats;

pub use fft::{LatticeDims, LatticeFft, TraceFft};
pub use matrix::{CMatrix3, Matrix3};
pub use stats::{mean_and_variance, min_max, silverman_factor};

/// Signed offset of lattice index `i` on a periodic axis of length `n`.
///
/// Indices up to `n / 2` are non-negative offsets; the rest wrap around to
/// negative offsets, matching the periodic topology of the FFT.
pub fn circular_offset(i: usize, n: usize) -> i64 {
    if i <= n / 2 {
        i as i64
    } else {
        i as i64 - n as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circular_offset_even() {
        let offsets: Vec<i64> = (0..6).map(|i| circular_offset(i, 6)).collect();
        assert_eq!(offsets, vec![0, 1, 2, 3, -2, -1]);
    }

    #[test]
    fn test_circular_offset_odd() {
        let offsets: Vec<i64> = (0..5).map(|i| circular_offset(i, 5)).collect();
        assert_eq!(offsets, vec![0, 1, 2, -2, -1]);
    }
}
