//! Statistical validation tests.

pub mod stationarity;

pub use stationarity::{adf_test, StationarityResult};
