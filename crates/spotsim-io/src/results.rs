//! Sweep result writers: the raw-simulator frame (`*_sim.csv`),
//! the roll-up frame (`*_stats.csv`), and the parameter sidecar
//! (`*_params.yml`) persisted per `(zone, instance, dataset-count,
//! bid-ratio)` triple.

use std::path::{Path, PathBuf};

use csv::WriterBuilder;
use serde::{Deserialize, Serialize};
use spotsim_core::{SimulationPoint, SpotSimResult};

/// One row of `*_stats.csv`. Time fields are in **minutes**; this is
/// the CSV-writing boundary where seconds are converted, keeping the
/// roll-up itself unit-testable in seconds.
///
/// The `Tranfer cost` header spelling is wire-format-frozen for
/// downstream compatibility and must not be "fixed".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatsRow {
    #[serde(rename = "Total cost")]
    pub total_cost: f64,
    #[serde(rename = "Instance cost")]
    pub instance_cost: f64,
    #[serde(rename = "Storage cost")]
    pub storage_cost: f64,
    #[serde(rename = "Tranfer cost")]
    pub transfer_cost: f64,
    #[serde(rename = "Total time")]
    pub total_time_min: f64,
    #[serde(rename = "Run time")]
    pub run_time_min: f64,
    #[serde(rename = "Wait time")]
    pub wait_time_min: f64,
    #[serde(rename = "Upload time")]
    pub upload_time_min: f64,
    #[serde(rename = "Download time")]
    pub download_time_min: f64,
}

/// Every input parameter for a triple, written alongside the result
/// CSVs as a `params.yml` sidecar for reproducibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepParams {
    pub proc_time: f64,
    pub num_jobs: u64,
    pub jobs_per: u64,
    pub in_gb: f64,
    pub out_gb: f64,
    pub out_gb_dl: f64,
    pub up_rate: f64,
    pub down_rate: f64,
    pub bid_ratio: f64,
    pub instance_type: String,
    pub av_zone: String,
    pub product: String,
    pub csv_file: Option<String>,
}

/// The three output paths for one triple, following the naming
/// convention `<instance>_<jobs>-jobs_<ratio>-bid_{sim.csv,stats.csv,params.yml}`.
pub struct TripleOutputPaths {
    pub sim_csv: PathBuf,
    pub stats_csv: PathBuf,
    pub params_yml: PathBuf,
}

pub fn triple_output_paths(
    out_dir: &Path,
    zone: &str,
    instance_type: &str,
    num_jobs: u64,
    bid_ratio: f64,
) -> TripleOutputPaths {
    let base_dir = out_dir.join(zone);
    let stem = format!("{instance_type}_{num_jobs}-jobs_{bid_ratio:.3}-bid");
    TripleOutputPaths {
        sim_csv: base_dir.join(format!("{stem}_sim.csv")),
        stats_csv: base_dir.join(format!("{stem}_stats.csv")),
        params_yml: base_dir.join(format!("{stem}_params.yml")),
    }
}

pub fn write_sim_csv(path: &Path, rows: &[SimulationPoint]) -> SpotSimResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = WriterBuilder::new().has_headers(true).from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_stats_csv(path: &Path, rows: &[StatsRow]) -> SpotSimResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = WriterBuilder::new().has_headers(true).from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_params_yaml(path: &Path, params: &SweepParams) -> SpotSimResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let yaml = serde_yaml::to_string(params)?;
    std::fs::write(path, yaml)?;
    Ok(())
}
