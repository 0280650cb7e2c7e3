// tests/scenario_test.rs
//
// End-to-end estimation and classification on synthetic wells and grids.

mod test_utils;

use std::collections::BTreeMap;
use std::fs;

use faciesprob::{
    BandwidthMethod, CancelFlag, ElasticVolume, FaciesError, FaciesEstimator, ProbabilitySink,
    ProbabilitySlab, ProbabilityVolume, RawElasticSource, RawFileSink, WellRejection,
    MISSING_VALUE,
};
use test_utils::*;

fn estimator(method: BandwidthMethod) -> FaciesEstimator {
    FaciesEstimator::builder()
        .facies_names(["shale", "sand"])
        .method(method)
        .lattice(24, 24, 12)
        .build(layout(), partial_covariance())
        .unwrap()
}

#[test]
fn test_priors_follow_facies_counts() {
    let estimation = estimator(BandwidthMethod::SampleVariance)
        .estimate(&synthetic_wells())
        .unwrap();

    assert_eq!(estimation.densities.counts, vec![45, 105]);
    let priors = estimation.densities.priors.values();
    assert!((priors[0] - 0.30).abs() < 1e-12);
    assert!((priors[1] - 0.70).abs() < 1e-12);

    let summary = &estimation.summary;
    assert_eq!(summary.total_count(), 150);
    assert_eq!(summary.wells.len(), 3);
    assert!(summary.wells.iter().all(|w| w.counts == vec![15, 35]));
    assert!(!summary.has_warnings());
}

#[test]
fn test_probabilities_sum_to_one() {
    for method in [BandwidthMethod::SampleVariance, BandwidthMethod::PosteriorCovariance] {
        let estimator = estimator(method);
        let estimation = estimator.estimate(&synthetic_wells()).unwrap();
        let mut grid = synthetic_grid();
        let dims = grid.dims;
        let mut output = ProbabilityVolume::new(dims, estimator.config().facies_names.clone());

        let stats = estimator
            .classify(&estimation, &mut grid, &mut output, &CancelFlag::new())
            .unwrap();
        assert_eq!(stats.layers, dims.nz);
        // one NaN voxel, everything else inside the logical footprint is classified
        assert_eq!(stats.classified, dims.nx * dims.ny * dims.nz - 1);
        assert_eq!(stats.classified + stats.missing, dims.layer_len() * dims.nz);

        for k in 0..dims.nz {
            for j in 0..dims.nyp {
                for i in 0..dims.nxp {
                    let undefined = output.undefined_at(i, j, k);
                    if i >= dims.nx || j >= dims.ny || (i, j, k) == (1, 0, 1) {
                        assert_eq!(undefined, None, "voxel ({}, {}, {})", i, j, k);
                        assert_eq!(output.probability(0, i, j, k), None);
                        continue;
                    }
                    let mut sum = undefined.unwrap() as f64;
                    for f in 0..2 {
                        let p = output.probability(f, i, j, k).unwrap();
                        assert!((0.0..=1.0).contains(&p));
                        sum += p as f64;
                    }
                    assert!((sum - 1.0).abs() < 1e-5, "{:?} sum {}", method, sum);
                }
            }
        }
    }
}

#[test]
fn test_facies_points_classify_as_their_facies() {
    // identity filter, so the densities sit on the blocked clusters
    let estimator = FaciesEstimator::builder()
        .facies_names(["shale", "sand"])
        .lattice(24, 24, 12)
        .band(0.0, f64::INFINITY)
        .build(layout(), exact_covariance())
        .unwrap();
    let estimation = estimator.estimate(&synthetic_wells()).unwrap();
    let mut grid = synthetic_grid();
    let mut output = ProbabilityVolume::new(grid.dims, estimator.config().facies_names.clone());
    estimator
        .classify(&estimation, &mut grid, &mut output, &CancelFlag::new())
        .unwrap();

    // (0,0,0) sits in the shale cluster, the default fill in the sand cluster
    assert!(output.probability(0, 0, 0, 0).unwrap() > 0.5);
    assert!(output.probability(1, 2, 1, 0).unwrap() > 0.5);
    // far outside the data only the undefined mass remains
    let far = output.undefined_at(2, 0, 3).unwrap();
    assert!(far > 0.99, "undefined probability {}", far);
}

#[test]
fn test_constant_logs_give_delta_density() {
    let wells: Vec<_> = (0..3).map(|i| flat_well(&format!("F{}", i), 0)).collect();
    let estimation = FaciesEstimator::builder()
        .facies_names(["only"])
        .lattice(16, 16, 8)
        .build(layout(), exact_covariance())
        .unwrap()
        .estimate(&wells)
        .unwrap();

    let densities = &estimation.densities;
    assert!(densities.bandwidth.iter().all(|h| *h < 1e-9));
    let max = densities.lattices[0].iter().cloned().fold(f64::MIN, f64::max);
    assert!(max > 0.0);
    let at_point = densities.find_density(0, BACKGROUND);
    assert!(at_point >= max * (1.0 - 1e-6), "{} vs max {}", at_point, max);
    let off = densities.find_density(0, [BACKGROUND[0] + 1.0, BACKGROUND[1], BACKGROUND[2]]);
    assert!(off < max * 1e-9);
}

#[test]
fn test_bin_centre_query_matches_lattice() {
    let estimation = estimator(BandwidthMethod::PosteriorCovariance)
        .estimate(&synthetic_wells())
        .unwrap();
    let densities = &estimation.densities;
    let dims = densities.binning.dims();
    let max = densities.lattices[1].iter().cloned().fold(0.0, f64::max);

    for &(i, j, k) in &[(3usize, 5usize, 2usize), (12, 12, 6), (20, 7, 10), (0, 0, 0)] {
        let centre = densities.binning.centre(i, j, k);
        let expected = densities.lattices[1][dims.index(i, j, k)].max(0.0);
        let found = densities.find_density(1, centre);
        assert!((found - expected).abs() <= 1e-9 * max.max(1.0), "{} vs {}", found, expected);
    }
}

#[test]
fn test_estimation_is_repeatable() {
    let estimator = estimator(BandwidthMethod::PosteriorCovariance);
    let first = estimator.estimate(&synthetic_wells()).unwrap();
    let second = estimator.estimate(&synthetic_wells()).unwrap();
    assert_eq!(first.densities, second.densities);
    assert_eq!(first.traces, second.traces);
}

#[test]
fn test_unobserved_facies_has_zero_density() {
    let estimator = FaciesEstimator::builder()
        .facies_names(["shale", "sand", "coal"])
        .lattice(24, 24, 12)
        .build(layout(), partial_covariance())
        .unwrap();
    let estimation = estimator.estimate(&synthetic_wells()).unwrap();

    assert_eq!(estimation.densities.counts, vec![45, 105, 0]);
    assert!(estimation.densities.lattices[2].iter().all(|&v| v == 0.0));
    assert_eq!(estimation.densities.priors.get(2), 0.0);
    assert!(estimation.summary.has_warnings());

    let mut grid = synthetic_grid();
    let mut output = ProbabilityVolume::new(grid.dims, estimator.config().facies_names.clone());
    estimator
        .classify(&estimation, &mut grid, &mut output, &CancelFlag::new())
        .unwrap();
    assert_eq!(output.probability(2, 0, 0, 0), Some(0.0));
}

#[test]
fn test_named_priors() {
    let mut table = BTreeMap::new();
    table.insert("shale".to_string(), 1.0);
    table.insert("sand".to_string(), 3.0);
    let estimation = FaciesEstimator::builder()
        .facies_names(["shale", "sand"])
        .lattice(24, 24, 12)
        .prior_probabilities(table.clone())
        .build(layout(), partial_covariance())
        .unwrap()
        .estimate(&synthetic_wells())
        .unwrap();
    assert_eq!(estimation.densities.priors.values(), &[0.25, 0.75]);

    table.insert("marl".to_string(), 1.0);
    let err = FaciesEstimator::builder()
        .facies_names(["shale", "sand"])
        .lattice(24, 24, 12)
        .prior_probabilities(table)
        .build(layout(), partial_covariance())
        .unwrap()
        .estimate(&synthetic_wells())
        .unwrap_err();
    assert!(matches!(err, FaciesError::UnknownFacies(name) if name == "marl"));
}

#[test]
fn test_bad_wells_are_skipped() {
    let mut wells = synthetic_wells();
    let mut deviated = synthetic_well("DEV", 7);
    deviated.deviated = true;
    let mut mislabelled = synthetic_well("BAD", 8);
    mislabelled.facies[4] = Some(5);
    let mut short = synthetic_well("SHORT", 9);
    short.logs.vs.pop();
    wells.extend([deviated, mislabelled, short]);

    let estimation = estimator(BandwidthMethod::SampleVariance)
        .estimate(&wells)
        .unwrap();
    let rejected = &estimation.summary.rejected;
    assert_eq!(rejected.len(), 3);
    assert_eq!(rejected[0].reason, WellRejection::Deviated);
    assert_eq!(
        rejected[1].reason,
        WellRejection::InvalidFaciesLabel { label: 5, n_facies: 2 }
    );
    assert!(matches!(rejected[2].reason, WellRejection::LengthMismatch { .. }));
    assert_eq!(estimation.densities.counts, vec![45, 105]);
}

#[test]
fn test_no_usable_wells() {
    let mut well = synthetic_well("DEV", 0);
    well.deviated = true;
    let err = estimator(BandwidthMethod::SampleVariance)
        .estimate(&[well])
        .unwrap_err();
    assert!(matches!(err, FaciesError::NoUsableWells { rejected: 1 }));
}

#[test]
fn test_no_facies_observations() {
    let wells: Vec<_> = synthetic_wells()
        .into_iter()
        .map(|mut w| {
            w.facies = vec![None; NZ];
            w
        })
        .collect();
    let err = estimator(BandwidthMethod::SampleVariance)
        .estimate(&wells)
        .unwrap_err();
    assert!(matches!(err, FaciesError::NoFaciesObservations { wells: 3 }));
}

#[test]
fn test_estimation_interval_limits_samples() {
    let estimation = FaciesEstimator::builder()
        .facies_names(["shale", "sand"])
        .lattice(24, 24, 12)
        .estimation_interval(10, 20)
        .build(layout(), partial_covariance())
        .unwrap()
        .estimate(&synthetic_wells())
        .unwrap();
    assert_eq!(estimation.densities.counts, vec![9, 21]);

    let err = FaciesEstimator::builder()
        .estimation_interval(NZ, NZ + 5)
        .build(layout(), partial_covariance());
    assert!(matches!(err, Err(FaciesError::InvalidConfig(_))));
}

/// Requests cancellation once `after` layers have been written.
struct CancellingSink {
    inner: ProbabilityVolume,
    cancel: CancelFlag,
    after: usize,
    written: usize,
}

impl ProbabilitySink for CancellingSink {
    fn write_layer(&mut self, k: usize, slab: &ProbabilitySlab) -> faciesprob::Result<()> {
        self.inner.write_layer(k, slab)?;
        self.written += 1;
        if self.written == self.after {
            self.cancel.cancel();
        }
        Ok(())
    }
}

#[test]
fn test_cancellation() {
    let estimator = estimator(BandwidthMethod::SampleVariance);
    let estimation = estimator.estimate(&synthetic_wells()).unwrap();
    let mut grid = synthetic_grid();
    let names = estimator.config().facies_names.clone();

    let cancelled = CancelFlag::new();
    cancelled.cancel();
    let mut output = ProbabilityVolume::new(grid.dims, names.clone());
    let err = estimator
        .classify(&estimation, &mut grid, &mut output, &cancelled)
        .unwrap_err();
    assert!(matches!(err, FaciesError::Cancelled { completed_layers: 0 }));

    let cancel = CancelFlag::new();
    let mut sink = CancellingSink {
        inner: ProbabilityVolume::new(grid.dims, names),
        cancel: cancel.clone(),
        after: 2,
        written: 0,
    };
    let err = estimator
        .classify(&estimation, &mut grid, &mut sink, &cancel)
        .unwrap_err();
    assert!(matches!(err, FaciesError::Cancelled { completed_layers: 2 }));
    assert!(sink.inner.undefined_at(0, 0, 1).is_some());
    assert!(sink.inner.undefined_at(0, 0, 2).is_none());
}

#[test]
fn test_raw_files_match_in_memory_volume() {
    let estimator = estimator(BandwidthMethod::SampleVariance);
    let estimation = estimator.estimate(&synthetic_wells()).unwrap();
    let names = estimator.config().facies_names.clone();

    let mut grid: ElasticVolume = synthetic_grid();
    let dims = grid.dims;
    let mut memory = ProbabilityVolume::new(dims, names.clone());
    estimator
        .classify(&estimation, &mut grid, &mut memory, &CancelFlag::new())
        .unwrap();

    let dir = temp_dir("raw");
    let mut raw = RawFileSink::create(&dir, &names).unwrap();
    estimator
        .classify(&estimation, &mut grid, &mut raw, &CancelFlag::new())
        .unwrap();
    assert_eq!(raw.paths().len(), 3);

    let expected_len = dims.layer_len() * dims.nz;
    for (f, path) in raw.paths().iter().enumerate() {
        let bytes = fs::read(path).unwrap();
        assert_eq!(bytes.len(), expected_len * 4);
        let values: Vec<f32> = bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        let reference = if f < names.len() {
            &memory.facies[f]
        } else {
            &memory.undefined
        };
        for (v, r) in values.iter().zip(reference) {
            assert_eq!(*v, r.unwrap_or(MISSING_VALUE));
        }
    }
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_raw_elastic_source_matches_in_memory_grid() {
    let estimator = estimator(BandwidthMethod::PosteriorCovariance);
    let estimation = estimator.estimate(&synthetic_wells()).unwrap();
    let names = estimator.config().facies_names.clone();

    let mut grid = synthetic_grid();
    let mut memory = ProbabilityVolume::new(grid.dims, names.clone());
    let expected = estimator
        .classify(&estimation, &mut grid, &mut memory, &CancelFlag::new())
        .unwrap();

    let dir = temp_dir("raw-grid");
    grid.write_raw(&dir).unwrap();
    let mut source = RawElasticSource::open(&dir).unwrap();
    let mut streamed = ProbabilityVolume::new(grid.dims, names);
    let stats = estimator
        .classify(&estimation, &mut source, &mut streamed, &CancelFlag::new())
        .unwrap();

    assert_eq!(stats, expected);
    assert_eq!(stats.missing, 6 * 4 + 1);
    assert_eq!(streamed, memory);
    assert!(streamed.undefined_at(1, 0, 1).is_none());
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_reserved_facies_name_is_rejected() {
    let result = FaciesEstimator::builder()
        .facies_names(["shale", "undefined"])
        .lattice(24, 24, 12)
        .build(layout(), partial_covariance());
    assert!(matches!(result, Err(FaciesError::InvalidConfig(_))));

    let result = FaciesEstimator::builder()
        .facies_names(["shale", "../sand"])
        .build(layout(), partial_covariance());
    assert!(matches!(result, Err(FaciesError::InvalidConfig(_))));
}
