//! Configuration module for facies probability runs

mod settings;

pub use settings::{
    check_facies_name, BandwidthMethod, DensityConfig, FaciesConfig, FrequencyBand, LatticeShape,
    LayerInterval, UNDEFINED_NAME,
};
