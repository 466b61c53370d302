//! The sweep configuration file: one YAML document describing the
//! workload template plus the lists of zones, bid ratios, and dataset
//! counts to cross-product over.

use serde::{Deserialize, Serialize};
use spotsim_core::{SpotSimError, SpotSimResult, WorkloadSpec};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Minutes one job takes to run.
    pub proc_time: f64,
    pub num_jobs: Vec<u64>,
    pub jobs_per: u64,
    pub in_gb: f64,
    pub out_gb: f64,
    pub out_gb_dl: f64,
    pub up_rate: f64,
    pub down_rate: f64,
    pub bid_ratio: Vec<f64>,
    pub instance_type: String,
    pub av_zone: Vec<String>,
    pub product: String,
}

impl SweepConfig {
    pub fn load(path: &std::path::Path) -> SpotSimResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: SweepConfig = serde_yaml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> SpotSimResult<()> {
        if self.num_jobs.is_empty() {
            return Err(SpotSimError::Config("num_jobs list is empty".to_string()));
        }
        if self.bid_ratio.is_empty() {
            return Err(SpotSimError::Config("bid_ratio list is empty".to_string()));
        }
        if self.av_zone.is_empty() {
            return Err(SpotSimError::Config("av_zone list is empty".to_string()));
        }
        if self.jobs_per == 0 {
            return Err(SpotSimError::Config("jobs_per must be positive".to_string()));
        }
        Ok(())
    }

    /// A workload template for one `num_jobs` value, in the same shape
    /// the simulator and roll-up consume.
    pub fn workload_for(&self, num_jobs: u64) -> WorkloadSpec {
        WorkloadSpec {
            proc_time_secs: self.proc_time * 60.0,
            num_datasets: num_jobs,
            jobs_per_node: self.jobs_per,
            worker_cap: WorkloadSpec::DEFAULT_WORKER_CAP,
            in_gb: self.in_gb,
            out_gb: self.out_gb,
            out_gb_dl: self.out_gb_dl,
            up_rate_mbps: self.up_rate,
            down_rate_mbps: self.down_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_yaml() -> &'static str {
        r#"
proc_time: 60.0
num_jobs: [10, 100]
jobs_per: 1
in_gb: 1.0
out_gb: 1.0
out_gb_dl: 1.0
up_rate: 1000.0
down_rate: 1000.0
bid_ratio: [1.5, 2.0]
instance_type: c4.8xlarge
av_zone: [us-east-1a, us-east-1b]
product: Linux/UNIX
"#
    }

    #[test]
    fn parses_a_well_formed_config() {
        let config: SweepConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        assert_eq!(config.num_jobs, vec![10, 100]);
        assert_eq!(config.av_zone.len(), 2);
    }

    #[test]
    fn load_rejects_missing_file() {
        let err = SweepConfig::load(std::path::Path::new("/no/such/file.yml"));
        assert!(err.is_err());
    }

    #[test]
    fn validate_rejects_empty_lists() {
        let mut config: SweepConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        config.bid_ratio.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn workload_for_converts_minutes_to_seconds() {
        let config: SweepConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        let workload = config.workload_for(10);
        assert_eq!(workload.proc_time_secs, 3600.0);
        assert_eq!(workload.num_datasets, 10);
    }
}
