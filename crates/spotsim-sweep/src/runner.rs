//! The sweep driver: runs every `(zone, bid_ratio, num_jobs)`
//! triple through the simulator and roll-up on a bounded Rayon thread
//! pool, one worker per triple, no shared mutable state — mirrors
//! `gat-batch::run_batch`'s per-job isolation.

use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use serde::{Deserialize, Serialize};
use spotsim_algo::{rates_for_zone, roll_up, simulate_market, PriceSeriesOps};
use spotsim_core::{SimulationPoint, SpotSimError, SpotSimResult};
use spotsim_io::{
    triple_output_paths, write_params_yaml, write_sim_csv, write_stats_csv, PriceArchive,
    StatsRow, SweepParams, TripleOutputPaths,
};

use crate::config::SweepConfig;
use crate::triples::{build_triples, SweepTriple};

/// The archive doesn't distinguish snapshot periods for sweep reads —
/// one flat price history per `(zone, product, instance)` key.
const ARCHIVE_PERIOD: &str = "current";
const STRIDE_MINUTES: i64 = 20;

/// Outcome of running one triple: one row per `*_sim.csv`/`*_stats.csv`
/// row is not tracked individually here, only the triple-level summary
/// that goes into the run manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriplePointRecord {
    pub zone: String,
    pub bid_ratio: f64,
    pub num_jobs: u64,
    pub status: String,
    pub num_points: usize,
    pub error: Option<String>,
    pub sim_csv: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SweepSummary {
    pub created_at: DateTime<Utc>,
    pub num_triples: usize,
    pub ok: usize,
    pub skipped: usize,
    pub failed: usize,
    pub records: Vec<TriplePointRecord>,
}

/// Run every triple built from `config` over a bounded worker pool.
/// `cores == 0` auto-detects via `num_cpus::get()`.
pub fn run_sweep(
    config: &SweepConfig,
    archive_base: &Path,
    out_dir: &Path,
    cores: usize,
) -> anyhow::Result<SweepSummary> {
    let triples = build_triples(config);
    let thread_count = if cores == 0 { num_cpus::get() } else { cores };
    let pool = ThreadPoolBuilder::new().num_threads(thread_count).build()?;

    let records: Vec<TriplePointRecord> = pool.install(|| {
        triples
            .par_iter()
            .map(|triple| run_triple(triple, config, archive_base, out_dir))
            .collect()
    });

    let ok = records.iter().filter(|r| r.status == "ok").count();
    let skipped = records.iter().filter(|r| r.status == "skipped").count();
    let failed = records.len() - ok - skipped;

    let summary = SweepSummary {
        created_at: Utc::now(),
        num_triples: records.len(),
        ok,
        skipped,
        failed,
        records,
    };

    write_sweep_manifest(&out_dir.join("sweep_manifest.json"), &summary)?;
    Ok(summary)
}

/// Grounded in `gat-batch::manifest::write_batch_manifest` — a JSON
/// summary written next to the per-triple CSV/YAML outputs.
pub fn write_sweep_manifest(path: &Path, summary: &SweepSummary) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, json)?;
    Ok(())
}

fn run_triple(
    triple: &SweepTriple,
    config: &SweepConfig,
    archive_base: &Path,
    out_dir: &Path,
) -> TriplePointRecord {
    let paths = triple_output_paths(
        out_dir,
        &triple.zone,
        &config.instance_type,
        triple.num_jobs,
        triple.bid_ratio,
    );

    if paths.sim_csv.exists() {
        tracing::info!("{} already exists, skipping", paths.sim_csv.display());
        return TriplePointRecord {
            zone: triple.zone.clone(),
            bid_ratio: triple.bid_ratio,
            num_jobs: triple.num_jobs,
            status: "skipped".to_string(),
            num_points: 0,
            error: None,
            sim_csv: paths.sim_csv.display().to_string(),
        };
    }

    match run_triple_inner(triple, config, archive_base, &paths) {
        Ok(num_points) => TriplePointRecord {
            zone: triple.zone.clone(),
            bid_ratio: triple.bid_ratio,
            num_jobs: triple.num_jobs,
            status: "ok".to_string(),
            num_points,
            error: None,
            sim_csv: paths.sim_csv.display().to_string(),
        },
        Err(err) => {
            tracing::warn!(
                "triple {}/{}/{} failed: {err}",
                triple.zone,
                triple.bid_ratio,
                triple.num_jobs
            );
            TriplePointRecord {
                zone: triple.zone.clone(),
                bid_ratio: triple.bid_ratio,
                num_jobs: triple.num_jobs,
                status: "error".to_string(),
                num_points: 0,
                error: Some(err.to_string()),
                sim_csv: paths.sim_csv.display().to_string(),
            }
        }
    }
}

fn run_triple_inner(
    triple: &SweepTriple,
    config: &SweepConfig,
    archive_base: &Path,
    paths: &TripleOutputPaths,
) -> SpotSimResult<usize> {
    let series = PriceArchive::load_key(
        archive_base,
        ARCHIVE_PERIOD,
        &triple.zone,
        &config.product,
        &config.instance_type,
    )?;
    // Fail fast if the zone's region has no pricing entry, rather than
    // discovering it on the first roll-up of the stride below.
    rates_for_zone(&triple.zone)?;

    let workload = config.workload_for(triple.num_jobs);
    let bid_price = triple.bid_ratio * series.mean();
    let num_iter = workload.num_iter();

    let mut sim_rows = Vec::new();
    let mut stats_rows = Vec::new();

    for (start_time, _) in series.stride(Duration::minutes(STRIDE_MINUTES)) {
        match simulate_market(&series, start_time, workload.proc_time_secs, num_iter, bid_price) {
            Ok(sim) => {
                let totals = roll_up(&sim, &workload, &triple.zone)?;
                sim_rows.push(SimulationPoint {
                    start_time,
                    spot_hist_csv: paths.sim_csv.display().to_string(),
                    proc_time: workload.proc_time_secs,
                    num_datasets: triple.num_jobs,
                    jobs_per_node: config.jobs_per,
                    num_jobs_iter: num_iter,
                    bid_ratio: triple.bid_ratio,
                    bid_price,
                    median_history: series.median(),
                    mean_history: series.mean(),
                    stdev_history: series.stdev(),
                    compute_time: sim.run_time_secs,
                    wait_time: sim.wait_time_secs,
                    per_node_cost: sim.node_cost,
                    num_interrupts: sim.num_interrupts,
                    first_iter_time: sim.first_wave_time_secs,
                });
                stats_rows.push(StatsRow {
                    total_cost: totals.total_cost,
                    instance_cost: totals.instance_cost,
                    storage_cost: totals.storage_cost,
                    transfer_cost: totals.xfer_cost,
                    total_time_min: totals.total_time_secs / 60.0,
                    run_time_min: totals.run_time_secs / 60.0,
                    wait_time_min: totals.wait_time_secs / 60.0,
                    upload_time_min: totals.xfer_up_time_secs / 60.0,
                    download_time_min: totals.xfer_down_time_secs / 60.0,
                });
            }
            Err(SpotSimError::InsufficientRunway) => {
                tracing::debug!("insufficient runway at {start_time}, skipping point");
            }
            Err(err) => return Err(err),
        }
    }

    write_sim_csv(&paths.sim_csv, &sim_rows)?;
    write_stats_csv(&paths.stats_csv, &stats_rows)?;
    write_params_yaml(
        &paths.params_yml,
        &SweepParams {
            proc_time: config.proc_time,
            num_jobs: triple.num_jobs,
            jobs_per: config.jobs_per,
            in_gb: config.in_gb,
            out_gb: config.out_gb,
            out_gb_dl: config.out_gb_dl,
            up_rate: config.up_rate,
            down_rate: config.down_rate,
            bid_ratio: triple.bid_ratio,
            instance_type: config.instance_type.clone(),
            av_zone: triple.zone.clone(),
            product: config.product.clone(),
            csv_file: None,
        },
    )?;

    Ok(sim_rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use spotsim_core::PriceSample;
    use spotsim_io::ArchiveFetcherStub;

    fn config() -> SweepConfig {
        serde_yaml::from_str(
            r#"
proc_time: 60.0
num_jobs: [5]
jobs_per: 1
in_gb: 1.0
out_gb: 1.0
out_gb_dl: 1.0
up_rate: 1000.0
down_rate: 1000.0
bid_ratio: [2.0]
instance_type: c4.8xlarge
av_zone: [us-east-1b]
product: Linux/UNIX
"#,
        )
        .unwrap()
    }

    fn seed_archive(archive_base: &Path, zone: &str, instance: &str, product: &str) {
        let path = PriceArchive::key_path(archive_base, ARCHIVE_PERIOD, zone, product, instance);
        let mut t = Utc::now();
        let mut samples = Vec::new();
        for i in 0..400 {
            samples.push(
                PriceSample::new(instance, product, "us-east-1", zone, 0.10, t).unwrap(),
            );
            t += Duration::minutes(20);
            let _ = i;
        }
        ArchiveFetcherStub::new(samples).populate(&path).unwrap();
    }

    #[test]
    fn run_triple_produces_output_files_and_a_status() {
        let archive_dir = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        let config = config();
        seed_archive(archive_dir.path(), "us-east-1b", "c4.8xlarge", "Linux/UNIX");

        let triple = SweepTriple {
            zone: "us-east-1b".to_string(),
            bid_ratio: 2.0,
            num_jobs: 5,
        };
        let record = run_triple(&triple, &config, archive_dir.path(), out_dir.path());
        assert_eq!(record.status, "ok");
        assert!(record.num_points > 0);
        assert!(Path::new(&record.sim_csv).exists());
    }

    #[test]
    fn run_triple_skips_when_sim_csv_already_exists() {
        let archive_dir = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        let config = config();
        seed_archive(archive_dir.path(), "us-east-1b", "c4.8xlarge", "Linux/UNIX");

        let triple = SweepTriple {
            zone: "us-east-1b".to_string(),
            bid_ratio: 2.0,
            num_jobs: 5,
        };
        let first = run_triple(&triple, &config, archive_dir.path(), out_dir.path());
        assert_eq!(first.status, "ok");
        let second = run_triple(&triple, &config, archive_dir.path(), out_dir.path());
        assert_eq!(second.status, "skipped");
    }

    #[test]
    fn run_triple_reports_archive_miss_without_panicking() {
        let archive_dir = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        let config = config();

        let triple = SweepTriple {
            zone: "us-east-1b".to_string(),
            bid_ratio: 2.0,
            num_jobs: 5,
        };
        let record = run_triple(&triple, &config, archive_dir.path(), out_dir.path());
        assert_eq!(record.status, "error");
        assert!(record.error.is_some());
    }

    #[test]
    fn run_sweep_writes_a_manifest() {
        let archive_dir = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        let config = config();
        seed_archive(archive_dir.path(), "us-east-1b", "c4.8xlarge", "Linux/UNIX");

        let summary = run_sweep(&config, archive_dir.path(), out_dir.path(), 1).unwrap();
        assert_eq!(summary.num_triples, 1);
        assert_eq!(summary.ok, 1);
        assert!(out_dir.path().join("sweep_manifest.json").exists());
    }
}
