//! Cartesian product over `(zone, bid_ratio, num_jobs)`, the unit of
//! work the bounded worker pool fans out over.

use crate::config::SweepConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct SweepTriple {
    pub zone: String,
    pub bid_ratio: f64,
    pub num_jobs: u64,
}

/// Builds the triple list in `zone -> bid_ratio -> num_jobs` nesting
/// order, so triples for the same zone are grouped together.
pub fn build_triples(config: &SweepConfig) -> Vec<SweepTriple> {
    let mut triples = Vec::with_capacity(config.av_zone.len() * config.bid_ratio.len() * config.num_jobs.len());
    for zone in &config.av_zone {
        for &bid_ratio in &config.bid_ratio {
            for &num_jobs in &config.num_jobs {
                triples.push(SweepTriple {
                    zone: zone.clone(),
                    bid_ratio,
                    num_jobs,
                });
            }
        }
    }
    triples
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SweepConfig {
        serde_yaml::from_str(
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
"#,
        )
        .unwrap()
    }

    #[test]
    fn builds_the_full_cartesian_product() {
        let triples = build_triples(&config());
        assert_eq!(triples.len(), 2 * 2 * 2);
        assert_eq!(triples[0].zone, "us-east-1a");
        assert_eq!(triples[0].bid_ratio, 1.5);
        assert_eq!(triples[0].num_jobs, 10);
    }

    #[test]
    fn every_combination_is_unique() {
        let triples = build_triples(&config());
        let mut seen = std::collections::HashSet::new();
        for triple in &triples {
            let key = (triple.zone.clone(), triple.bid_ratio.to_bits(), triple.num_jobs);
            assert!(seen.insert(key), "duplicate triple {:?}", triple);
        }
    }
}
