//! Core data model: price samples/series and the workload/market inputs
//! that parameterize one simulator run.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{SpotSimError, SpotSimResult};

/// One (region, zone, instance, product) price observation.
///
/// Immutable once constructed; [`PriceSample::new`] is the only
/// constructor and rejects a non-positive price so that every sample
/// that makes it into a [`PriceSeries`] already satisfies the series
/// invariant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    pub instance_type: String,
    pub product: String,
    pub region: String,
    pub availability_zone: String,
    /// Price in $/hour. Always strictly positive.
    pub price: f64,
    pub timestamp: DateTime<Utc>,
}

impl PriceSample {
    pub fn new(
        instance_type: impl Into<String>,
        product: impl Into<String>,
        region: impl Into<String>,
        availability_zone: impl Into<String>,
        price: f64,
        timestamp: DateTime<Utc>,
    ) -> SpotSimResult<Self> {
        if !(price > 0.0) {
            return Err(SpotSimError::Config(format!(
                "price sample at {timestamp} has non-positive price {price}"
            )));
        }
        Ok(Self {
            instance_type: instance_type.into(),
            product: product.into(),
            region: region.into(),
            availability_zone: availability_zone.into(),
            price,
            timestamp,
        })
    }
}

/// Ordered, deduplicated time series of `(timestamp, price)` pairs bound
/// to one `(instance, product, zone)` key.
///
/// Invariants (enforced in [`PriceSeries::from_samples`]):
/// - non-empty
/// - timestamps strictly increasing
/// - prices strictly positive
///
/// Between observations the series is interpreted as piecewise-constant
/// (forward fill) — see [`crate::series`] in `spotsim-algo` for the
/// lookup operations over this type.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    points: Vec<(DateTime<Utc>, f64)>,
}

impl PriceSeries {
    /// Build a series from an arbitrary collection of samples: sorts by
    /// timestamp and, for duplicate timestamps, keeps the first sample
    /// seen in input order (the stable sort preserves that order among
    /// ties). Returns `None` if no samples were given.
    ///
    /// Deduplication matters because live collection overlaps across
    /// polls.
    pub fn from_samples<I>(samples: I) -> Option<Self>
    where
        I: IntoIterator<Item = PriceSample>,
    {
        let mut points: Vec<(DateTime<Utc>, f64)> =
            samples.into_iter().map(|s| (s.timestamp, s.price)).collect();
        if points.is_empty() {
            return None;
        }
        points.sort_by(|a, b| a.0.cmp(&b.0));
        points.dedup_by(|later, earlier| later.0 == earlier.0);
        Some(Self { points })
    }

    /// The stored `(timestamp, price)` pairs, strictly increasing by
    /// timestamp.
    pub fn points(&self) -> &[(DateTime<Utc>, f64)] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> (DateTime<Utc>, f64) {
        self.points[0]
    }

    pub fn last(&self) -> (DateTime<Utc>, f64) {
        self.points[self.points.len() - 1]
    }

    /// Arithmetic mean of the stored prices (unweighted by dwell time).
    pub fn mean(&self) -> f64 {
        let sum: f64 = self.points.iter().map(|(_, p)| p).sum();
        sum / self.points.len() as f64
    }

    /// Median of the stored prices.
    pub fn median(&self) -> f64 {
        let mut prices: Vec<f64> = self.points.iter().map(|(_, p)| *p).collect();
        prices.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        let mid = prices.len() / 2;
        if prices.len() % 2 == 0 {
            (prices[mid - 1] + prices[mid]) / 2.0
        } else {
            prices[mid]
        }
    }

    /// Population standard deviation of the stored prices.
    pub fn stdev(&self) -> f64 {
        let mean = self.mean();
        let n = self.points.len() as f64;
        let variance: f64 = self.points.iter().map(|(_, p)| (p - mean).powi(2)).sum::<f64>() / n;
        variance.sqrt()
    }

    /// Smallest stored timestamp `>= t`, if any.
    pub fn first_index_ge(&self, t: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.points
            .iter()
            .find(|(ts, _)| *ts >= t)
            .map(|(ts, _)| *ts)
    }

    /// Restrict the series to `[lo, hi]`. Returns `None` if no stored
    /// points fall in the range.
    pub fn range(&self, lo: DateTime<Utc>, hi: DateTime<Utc>) -> Option<Self> {
        let points: Vec<(DateTime<Utc>, f64)> = self
            .points
            .iter()
            .copied()
            .filter(|(ts, _)| *ts >= lo && *ts <= hi)
            .collect();
        if points.is_empty() {
            None
        } else {
            Some(Self { points })
        }
    }
}

/// Total compute workload for one submission: a number of datasets
/// packed `jobs_per_node` at a time into sequential waves across
/// `num_nodes()` worker nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadSpec {
    /// Seconds one wave of work takes on one worker node.
    pub proc_time_secs: f64,
    /// Total number of datasets in the submission.
    pub num_datasets: u64,
    /// Concurrent datasets processed per worker node.
    pub jobs_per_node: u64,
    /// Maximum worker count; defaults to 20.
    pub worker_cap: u64,
    /// Per-dataset input size in GB, uploaded once to the head node.
    pub in_gb: f64,
    /// Per-dataset stored output size in GB (EBS).
    pub out_gb: f64,
    /// Per-dataset downloaded output size in GB.
    pub out_gb_dl: f64,
    /// Average upload rate to the fleet, in Mb/s.
    pub up_rate_mbps: f64,
    /// Average download rate from the fleet, in Mb/s.
    pub down_rate_mbps: f64,
}

impl WorkloadSpec {
    pub const DEFAULT_WORKER_CAP: u64 = 20;

    /// `num_nodes = min(ceil(num_datasets / jobs_per_node), worker_cap)`.
    pub fn num_nodes(&self) -> u64 {
        let needed = self.num_datasets.div_ceil(self.jobs_per_node);
        needed.min(self.worker_cap)
    }

    /// `num_iter = ceil(num_datasets / (jobs_per_node * num_nodes))` —
    /// the number of sequential waves.
    pub fn num_iter(&self) -> u64 {
        let per_wave = self.jobs_per_node * self.num_nodes();
        self.num_datasets.div_ceil(per_wave)
    }
}

/// Identifies the market a bid is placed into and the bid itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketParams {
    pub instance_type: String,
    pub product: String,
    pub availability_zone: String,
    /// Multiplier applied to the mean of a reference series to derive
    /// the bid price.
    pub bid_ratio: f64,
}

/// One row of the sweep's raw-simulator output, matching the
/// `*_sim.csv` schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationPoint {
    pub start_time: DateTime<Utc>,
    pub spot_hist_csv: String,
    pub proc_time: f64,
    pub num_datasets: u64,
    pub jobs_per_node: u64,
    pub num_jobs_iter: u64,
    pub bid_ratio: f64,
    pub bid_price: f64,
    pub median_history: f64,
    pub mean_history: f64,
    pub stdev_history: f64,
    pub compute_time: f64,
    pub wait_time: f64,
    pub per_node_cost: f64,
    pub num_interrupts: u64,
    pub first_iter_time: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_600_000_000 + secs, 0).unwrap()
    }

    fn sample(secs: i64, price: f64) -> PriceSample {
        PriceSample::new("c4.8xlarge", "Linux/UNIX", "us-east-1", "us-east-1b", price, ts(secs))
            .unwrap()
    }

    #[test]
    fn rejects_non_positive_price() {
        let err = PriceSample::new("c4.8xlarge", "Linux/UNIX", "us-east-1", "us-east-1b", 0.0, ts(0));
        assert!(err.is_err());
    }

    #[test]
    fn from_samples_sorts_and_dedups_keeping_first() {
        let series = PriceSeries::from_samples(vec![
            sample(10, 0.30),
            sample(0, 0.10),
            sample(10, 0.99), // duplicate timestamp, later in input order
            sample(5, 0.20),
        ])
        .unwrap();
        let points = series.points();
        assert_eq!(points.len(), 3);
        assert_eq!(points[0], (ts(0), 0.10));
        assert_eq!(points[1], (ts(5), 0.20));
        // the earlier-seen duplicate (0.30) wins over the later one (0.99)
        assert_eq!(points[2], (ts(10), 0.30));
    }

    #[test]
    fn from_samples_empty_is_none() {
        assert!(PriceSeries::from_samples(Vec::<PriceSample>::new()).is_none());
    }

    #[test]
    fn mean_median_stdev_on_flat_series() {
        let series =
            PriceSeries::from_samples(vec![sample(0, 0.10), sample(60, 0.10), sample(120, 0.10)])
                .unwrap();
        assert!((series.mean() - 0.10).abs() < 1e-9);
        assert!((series.median() - 0.10).abs() < 1e-9);
        assert!(series.stdev().abs() < 1e-9);
    }

    #[test]
    fn worker_cap_limits_num_nodes() {
        let workload = WorkloadSpec {
            proc_time_secs: 3600.0,
            num_datasets: 1000,
            jobs_per_node: 3,
            worker_cap: WorkloadSpec::DEFAULT_WORKER_CAP,
            in_gb: 1.0,
            out_gb: 1.0,
            out_gb_dl: 1.0,
            up_rate_mbps: 8000.0,
            down_rate_mbps: 8000.0,
        };
        assert_eq!(workload.num_nodes(), 20);
        assert_eq!(workload.num_iter(), 17); // ceil(1000 / (3*20)) = 17
    }

    #[test]
    fn num_nodes_below_cap_uses_datasets_over_jobs_per_node() {
        let workload = WorkloadSpec {
            proc_time_secs: 3600.0,
            num_datasets: 6,
            jobs_per_node: 3,
            worker_cap: WorkloadSpec::DEFAULT_WORKER_CAP,
            in_gb: 1.0,
            out_gb: 1.0,
            out_gb_dl: 1.0,
            up_rate_mbps: 8000.0,
            down_rate_mbps: 8000.0,
        };
        assert_eq!(workload.num_nodes(), 2);
        assert_eq!(workload.num_iter(), 1);
    }
}
