//! Submission roll-up: turns one [`MarketSimResult`] into the
//! full-submission cost and wall-clock breakdown, folding in head-node
//! time, storage, and data-transfer costs.

use spotsim_core::{SpotSimResult, WorkloadSpec};

use crate::pricing::rates_for_zone;
use crate::simulate::MarketSimResult;

/// GB footprint of the cluster AMI on every node's root volume.
const AMI_GB: f64 = 30.0;
const SECS_PER_AVG_MONTH: f64 = (365.0 / 12.0) * 24.0 * 3600.0;

/// Full cost and timing breakdown for one submission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubmissionTotals {
    pub total_cost: f64,
    pub instance_cost: f64,
    pub storage_cost: f64,
    pub xfer_cost: f64,
    pub total_time_secs: f64,
    pub run_time_secs: f64,
    pub wait_time_secs: f64,
    pub xfer_up_time_secs: f64,
    pub xfer_down_time_secs: f64,
}

/// Combine a market simulation with the workload's data-movement and
/// storage footprint into submission-level totals.
///
/// The head (master) node is billed on-demand from upload start through
/// the last output download; worker nodes are billed per
/// [`MarketSimResult::node_cost`], multiplied across `num_nodes`.
/// Output downloads for all but the last wave are modeled as happening
/// concurrently with the remaining compute, per the head node's
/// download bandwidth — whichever takes longer gates the finish time.
pub fn roll_up(
    sim: &MarketSimResult,
    workload: &WorkloadSpec,
    availability_zone: &str,
) -> SpotSimResult<SubmissionTotals> {
    let rates = rates_for_zone(availability_zone)?;

    let num_nodes = workload.num_nodes() as f64;
    let jobs_per_node = workload.jobs_per_node as f64;
    let num_jobs = workload.num_datasets as f64;
    let num_iter = workload.num_iter() as f64;

    let exec_time = sim.run_time_secs + sim.wait_time_secs;

    let up_gb_per_sec = workload.up_rate_mbps / 8.0 / 1000.0;
    let down_gb_per_sec = workload.down_rate_mbps / 8.0 / 1000.0;
    let xfer_up_time = num_jobs * (workload.in_gb / up_gb_per_sec);

    let num_jobs_n1 = (num_iter - 1.0) * num_nodes * jobs_per_node;
    let xfer_down_time_n1 = num_jobs_n1 * (workload.out_gb_dl / down_gb_per_sec);
    let exec_time_n1 = exec_time - sim.first_wave_time_secs;
    let residual_jobs = num_jobs - num_jobs_n1;

    let master_up_time = xfer_up_time
        + sim.first_wave_time_secs
        + exec_time_n1.max(xfer_down_time_n1)
        + residual_jobs * (workload.out_gb_dl / down_gb_per_sec);
    let xfer_down_time =
        xfer_down_time_n1 + residual_jobs * (workload.out_gb_dl / down_gb_per_sec);

    let ebs_nfs_gb = num_jobs * (workload.in_gb + workload.out_gb);
    let master_gb_months = (ebs_nfs_gb + AMI_GB)
        * (3600.0 * (master_up_time / 3600.0).ceil() / SECS_PER_AVG_MONTH);
    let nodes_gb_months =
        num_nodes * AMI_GB * (3600.0 * (sim.run_time_secs / 3600.0).ceil() / SECS_PER_AVG_MONTH);
    let storage_cost = rates.ssd_gb_month * (master_gb_months + nodes_gb_months);

    let master_cost = rates.head_hourly * (master_up_time / 3600.0).ceil();
    let nodes_cost = sim.node_cost * num_nodes;
    let instance_cost = master_cost + nodes_cost;

    let xfer_cost = rates.egress_per_gb * (num_jobs * workload.out_gb_dl);

    let total_cost = instance_cost + storage_cost + xfer_cost;

    Ok(SubmissionTotals {
        total_cost,
        instance_cost,
        storage_cost,
        xfer_cost,
        total_time_secs: master_up_time,
        run_time_secs: sim.run_time_secs,
        wait_time_secs: sim.wait_time_secs,
        xfer_up_time_secs: xfer_up_time,
        xfer_down_time_secs: xfer_down_time,
    })
}
