//! # spotsim-algo
//!
//! The simulation core: forward-fill price lookups, static pricing
//! tables, the market-interruption simulator, and the submission
//! cost/time roll-up built on top of it.

pub mod pricing;
pub mod rollup;
pub mod series;
pub mod simulate;

pub use pricing::{object_store_cost, rates_for_zone, region_of, RegionRates};
pub use rollup::{roll_up, SubmissionTotals};
pub use series::{InterpolatedSeries, PriceSeriesOps, Stride};
pub use simulate::{simulate_market, MarketSimResult};
