//! # spotsim-core
//!
//! Data model and error types shared by every other `spotsim-*` crate:
//! price samples/series, the workload and market-bid inputs to one
//! simulator run, and the unified [`SpotSimError`].

pub mod error;
pub mod model;

pub use error::{SpotSimError, SpotSimResult};
pub use model::{MarketParams, PriceSample, PriceSeries, SimulationPoint, WorkloadSpec};
