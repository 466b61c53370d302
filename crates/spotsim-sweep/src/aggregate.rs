//! Cross-triple, per-zone aggregation — a supplement grounded in
//! `build_big_df.py`, which concatenated every triple's `*_stats.csv`
//! (plus interrupt counts pulled from the matching `*_sim.csv`) into
//! one big per-zone data frame after a sweep finished.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use spotsim_core::SimulationPoint;
use spotsim_io::StatsRow;

use crate::runner::TriplePointRecord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneAggregate {
    pub zone: String,
    pub num_points: usize,
    pub mean_total_cost: f64,
    pub mean_total_time_min: f64,
    pub mean_interrupts: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateReport {
    pub zones: Vec<ZoneAggregate>,
}

struct ZoneAccumulator {
    cost_sum: f64,
    time_sum: f64,
    interrupts_sum: f64,
    n: usize,
}

/// Reads back every successful triple's `*_stats.csv`/`*_sim.csv` pair
/// and folds them into one mean-per-zone report. Triples that were
/// skipped or failed contribute nothing.
pub fn aggregate(records: &[TriplePointRecord]) -> anyhow::Result<AggregateReport> {
    let mut by_zone: BTreeMap<String, ZoneAccumulator> = BTreeMap::new();

    for record in records.iter().filter(|r| r.status == "ok") {
        let stats_path = record.sim_csv.replace("_sim.csv", "_stats.csv");

        let mut sim_reader = csv::Reader::from_path(&record.sim_csv)?;
        let interrupts: Vec<u64> = sim_reader
            .deserialize::<SimulationPoint>()
            .filter_map(Result::ok)
            .map(|point| point.num_interrupts)
            .collect();

        let mut stats_reader = csv::Reader::from_path(&stats_path)?;
        let entry = by_zone.entry(record.zone.clone()).or_insert(ZoneAccumulator {
            cost_sum: 0.0,
            time_sum: 0.0,
            interrupts_sum: 0.0,
            n: 0,
        });
        for (i, row) in stats_reader.deserialize::<StatsRow>().enumerate() {
            let row = row?;
            entry.cost_sum += row.total_cost;
            entry.time_sum += row.total_time_min;
            entry.interrupts_sum += interrupts.get(i).copied().unwrap_or(0) as f64;
            entry.n += 1;
        }
    }

    let zones = by_zone
        .into_iter()
        .map(|(zone, acc)| {
            let n = acc.n.max(1) as f64;
            ZoneAggregate {
                zone,
                num_points: acc.n,
                mean_total_cost: acc.cost_sum / n,
                mean_total_time_min: acc.time_sum / n,
                mean_interrupts: acc.interrupts_sum / n,
            }
        })
        .collect();

    Ok(AggregateReport { zones })
}

pub fn write_aggregate_report(path: &std::path::Path, report: &AggregateReport) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use spotsim_io::{write_sim_csv, write_stats_csv};

    fn record(zone: &str, sim_csv: std::path::PathBuf) -> TriplePointRecord {
        TriplePointRecord {
            zone: zone.to_string(),
            bid_ratio: 1.5,
            num_jobs: 10,
            status: "ok".to_string(),
            num_points: 1,
            error: None,
            sim_csv: sim_csv.display().to_string(),
        }
    }

    fn point(num_interrupts: u64) -> SimulationPoint {
        SimulationPoint {
            start_time: Utc::now(),
            spot_hist_csv: "x".to_string(),
            proc_time: 3600.0,
            num_datasets: 10,
            jobs_per_node: 1,
            num_jobs_iter: 1,
            bid_ratio: 1.5,
            bid_price: 0.3,
            median_history: 0.2,
            mean_history: 0.2,
            stdev_history: 0.0,
            compute_time: 3600.0,
            wait_time: 0.0,
            per_node_cost: 0.2,
            num_interrupts,
            first_iter_time: 3600.0,
        }
    }

    fn stats_row(total_cost: f64, total_time_min: f64) -> StatsRow {
        StatsRow {
            total_cost,
            instance_cost: total_cost,
            storage_cost: 0.0,
            transfer_cost: 0.0,
            total_time_min,
            run_time_min: total_time_min,
            wait_time_min: 0.0,
            upload_time_min: 0.0,
            download_time_min: 0.0,
        }
    }

    #[test]
    fn aggregates_mean_cost_time_and_interrupts_per_zone() {
        let dir = tempfile::tempdir().unwrap();
        let sim_csv = dir.path().join("triple_sim.csv");
        let stats_csv = dir.path().join("triple_stats.csv");
        write_sim_csv(&sim_csv, &[point(1), point(3)]).unwrap();
        write_stats_csv(&stats_csv, &[stats_row(10.0, 60.0), stats_row(20.0, 120.0)]).unwrap();

        let records = vec![record("us-east-1b", sim_csv)];
        let report = aggregate(&records).unwrap();
        assert_eq!(report.zones.len(), 1);
        let zone = &report.zones[0];
        assert_eq!(zone.zone, "us-east-1b");
        assert_eq!(zone.num_points, 2);
        assert!((zone.mean_total_cost - 15.0).abs() < 1e-9);
        assert!((zone.mean_total_time_min - 90.0).abs() < 1e-9);
        assert!((zone.mean_interrupts - 2.0).abs() < 1e-9);
    }

    #[test]
    fn skipped_and_failed_triples_are_ignored() {
        let mut skipped = record("us-west-2a", std::path::PathBuf::from("/nonexistent_sim.csv"));
        skipped.status = "skipped".to_string();
        let report = aggregate(&[skipped]).unwrap();
        assert!(report.zones.is_empty());
    }
}
