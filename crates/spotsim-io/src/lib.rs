//! # spotsim-io
//!
//! The on-disk price archive and the sweep result writers: everything
//! that turns a [`spotsim_core::PriceSeries`] into files on disk, and
//! back.

pub mod archive;
pub mod results;

pub use archive::{product_slug, ArchiveFetcherStub, PriceArchive};
pub use results::{
    triple_output_paths, write_params_yaml, write_sim_csv, write_stats_csv, StatsRow, SweepParams,
    TripleOutputPaths,
};
