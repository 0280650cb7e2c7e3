//! Sample statistics used for kernel bandwidths and lattice ranges

/// Silverman-type bandwidth factor for a 3D Gaussian kernel:
/// `(4/7)^(1/7) · n^(-1/7)`.
pub fn silverman_factor(n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    (4.0f64 / 7.0).powf(1.0 / 7.0) * (n as f64).powf(-1.0 / 7.0)
}

/// Per-dimension mean and unbiased variance of 3-vectors.
///
/// Fewer than two points give zero variance.
pub fn mean_and_variance(points: &[[f64; 3]]) -> ([f64; 3], [f64; 3]) {
    if points.is_empty() {
        return ([0.0; 3], [0.0; 3]);
    }
    let n = points.len() as f64;
    let mut mean = [0.0; 3];
    for p in points {
        for d in 0..3 {
            mean[d] += p[d];
        }
    }
    mean.iter_mut().for_each(|m| *m /= n);

    if points.len() < 2 {
        return (mean, [0.0; 3]);
    }
    let mut var = [0.0; 3];
    for p in points {
        for d in 0..3 {
            let diff = p[d] - mean[d];
            var[d] += diff * diff;
        }
    }
    var.iter_mut().for_each(|v| *v /= n - 1.0);
    (mean, var)
}

/// Per-dimension minimum and maximum, read from one consistent set of points.
pub fn min_max(points: &[[f64; 3]]) -> Option<([f64; 3], [f64; 3])> {
    let first = points.first()?;
    let mut lo = *first;
    let mut hi = *first;
    for p in &points[1..] {
        for d in 0..3 {
            lo[d] = lo[d].min(p[d]);
            hi[d] = hi[d].max(p[d]);
        }
    }
    Some((lo, hi))
}
