//! Static per-region pricing tables.
//!
//! Treated as configuration, not data: the rates below are a versioned
//! constant table with no runtime mutation path.

use spotsim_core::{SpotSimError, SpotSimResult};

/// Per-region rates needed by the submission roll-up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionRates {
    /// General-purpose block storage, $/GB-month.
    pub ssd_gb_month: f64,
    /// Egress, first tier, $/GB.
    pub egress_per_gb: f64,
    /// Head node (t2.small-equivalent) on-demand, $/hour.
    pub head_hourly: f64,
    /// Object-store storage, $/GB-month.
    pub object_store_gb_month: f64,
    /// Object-store egress, $/GB.
    pub object_store_egress_per_gb: f64,
    /// Object-store PUT requests, $ per 1,000.
    pub object_store_put_per_1k: f64,
    /// Object-store GET requests, $ per 10,000.
    pub object_store_get_per_10k: f64,
}

/// Strips the trailing availability-zone letter to get the region, e.g.
/// `"us-east-1b"` -> `"us-east-1"`.
pub fn region_of(availability_zone: &str) -> &str {
    if availability_zone.is_empty() {
        availability_zone
    } else {
        &availability_zone[..availability_zone.len() - 1]
    }
}

/// Look up the pricing rates for a zone. Errors if the zone's region is
/// not in the table.
pub fn rates_for_zone(availability_zone: &str) -> SpotSimResult<RegionRates> {
    let region = region_of(availability_zone);
    RATES
        .iter()
        .find(|(name, _)| *name == region)
        .map(|(_, rates)| *rates)
        .ok_or_else(|| SpotSimError::PricingLookupError(region.to_string()))
}

macro_rules! rates {
    ($ssd:expr, $egress:expr, $head:expr, $s3_stor:expr, $s3_egress:expr, $s3_put:expr, $s3_get:expr) => {
        RegionRates {
            ssd_gb_month: $ssd,
            egress_per_gb: $egress,
            head_hourly: $head,
            object_store_gb_month: $s3_stor,
            object_store_egress_per_gb: $s3_egress,
            object_store_put_per_1k: $s3_put,
            object_store_get_per_10k: $s3_get,
        }
    };
}

const RATES: &[(&str, RegionRates)] = &[
    ("us-east-1", rates!(0.10, 0.09, 0.026, 0.03, 0.09, 0.005, 0.004)),
    ("us-west-1", rates!(0.12, 0.09, 0.034, 0.033, 0.09, 0.0055, 0.0044)),
    ("us-west-2", rates!(0.10, 0.09, 0.026, 0.03, 0.09, 0.005, 0.004)),
    ("eu-west-1", rates!(0.11, 0.09, 0.028, 0.03, 0.09, 0.005, 0.004)),
    ("eu-central-1", rates!(0.119, 0.09, 0.030, 0.0324, 0.09, 0.0054, 0.0043)),
    ("ap-southeast-1", rates!(0.12, 0.12, 0.040, 0.03, 0.12, 0.005, 0.004)),
    ("ap-southeast-2", rates!(0.12, 0.14, 0.040, 0.033, 0.14, 0.0055, 0.0044)),
    ("ap-northeast-1", rates!(0.12, 0.14, 0.040, 0.033, 0.14, 0.0047, 0.0037)),
    ("sa-east-1", rates!(0.19, 0.25, 0.054, 0.0408, 0.25, 0.007, 0.0056)),
];

/// Object-store storage + egress + request cost for a submission,
/// supplementing the core roll-up formula with an S3-equivalent model
/// for workloads that stage data through object storage instead of
/// block volumes. One PUT per dataset; ~50 GET objects per dataset on
/// the way out.
pub fn object_store_cost(
    availability_zone: &str,
    in_gb: f64,
    out_gb: f64,
    num_datasets: u64,
) -> SpotSimResult<f64> {
    const OUT_RATIO: f64 = 50.0;

    let rates = rates_for_zone(availability_zone)?;
    let n = num_datasets as f64;
    let storage = rates.object_store_gb_month * (in_gb + out_gb);
    let egress = rates.object_store_egress_per_gb * out_gb;
    let requests = rates.object_store_put_per_1k * (n / 1_000.0)
        + rates.object_store_get_per_10k * (OUT_RATIO * n / 10_000.0);
    Ok(storage + egress + requests)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_of_strips_trailing_zone_letter() {
        assert_eq!(region_of("us-east-1b"), "us-east-1");
        assert_eq!(region_of("ap-northeast-1a"), "ap-northeast-1");
    }

    #[test]
    fn unknown_region_errors() {
        let err = rates_for_zone("mars-central-1a");
        assert!(matches!(err, Err(SpotSimError::PricingLookupError(_))));
    }

    #[test]
    fn known_region_resolves_rates() {
        let rates = rates_for_zone("us-east-1b").unwrap();
        assert!((rates.head_hourly - 0.026).abs() < 1e-9);
    }

    #[test]
    fn object_store_cost_is_positive_for_nonzero_workload() {
        let cost = object_store_cost("us-east-1b", 1.0, 1.0, 10).unwrap();
        assert!(cost > 0.0);
    }
}
