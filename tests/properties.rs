//! Property-based tests for classification and density lookup.

mod test_utils;

use std::sync::OnceLock;

use faciesprob::{BandwidthMethod, Classifier, FaciesDensities, FaciesEstimator};
use proptest::prelude::*;
use test_utils::*;

/// Tolerance for probabilities that should sum to one.
const SUM_TOL: f64 = 1e-9;

fn densities() -> &'static FaciesDensities {
    static DENSITIES: OnceLock<FaciesDensities> = OnceLock::new();
    DENSITIES.get_or_init(|| {
        FaciesEstimator::builder()
            .facies_names(["shale", "sand"])
            .method(BandwidthMethod::PosteriorCovariance)
            .lattice(24, 24, 12)
            .build(layout(), partial_covariance())
            .unwrap()
            .estimate(&synthetic_wells())
            .unwrap()
            .densities
    })
}

fn elastic_point() -> impl Strategy<Value = [f64; 3]> {
    (2000.0..4000.0f64, 800.0..2200.0f64, 1.8..2.8f64).prop_map(|(vp, vs, rho)| [vp, vs, rho])
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Facies and undefined probabilities are bounded and sum to one.
    #[test]
    fn probabilities_form_a_distribution(point in elastic_point(), mass in 0.0..1.0f64) {
        let classifier = Classifier::new(densities(), mass);
        let mut p = vec![0.0; 2];
        let undefined = classifier.classify_voxel(point, &mut p);
        for v in p.iter().chain(std::iter::once(&undefined)) {
            prop_assert!((0.0..=1.0).contains(v), "probability {} at {:?}", v, point);
        }
        let sum = p.iter().sum::<f64>() + undefined;
        prop_assert!((sum - 1.0).abs() < SUM_TOL, "sum {} at {:?}", sum, point);
    }

    /// More undefined mass never lowers the undefined probability.
    #[test]
    fn undefined_grows_with_mass(point in elastic_point(), mass in 0.0..0.5f64) {
        let mut p = vec![0.0; 2];
        let low = Classifier::new(densities(), mass).classify_voxel(point, &mut p);
        let high = Classifier::new(densities(), 2.0 * mass + 0.01).classify_voxel(point, &mut p);
        prop_assert!(high + SUM_TOL >= low, "{} < {}", high, low);
    }

    /// Interpolated densities never go negative.
    #[test]
    fn density_is_non_negative(point in elastic_point(), facies in 0usize..2) {
        let d = densities().find_density(facies, point);
        prop_assert!(d >= 0.0 && d.is_finite());
    }
}
