//! Unified error type for the spot-market simulator.
//!
//! Mirrors the error taxonomy every component of the model needs to
//! surface: a malformed sweep config aborts the whole run, a missing
//! archive key or pricing region aborts only the triple that asked for
//! it, and a simulator that runs out of price history to replay aborts
//! only the one start instant being evaluated.

use thiserror::Error;

/// Errors produced anywhere in the spot-market simulator.
#[derive(Error, Debug)]
pub enum SpotSimError {
    /// Malformed sweep configuration or a missing required key. Fatal
    /// for the whole driver run.
    #[error("configuration error: {0}")]
    Config(String),

    /// No price samples found for a `(instance, product, zone)` key.
    /// Fatal for the one triple that requested it.
    #[error("no price samples for {instance}/{product}/{zone}")]
    ArchiveMiss {
        instance: String,
        product: String,
        zone: String,
    },

    /// The simulator ran off the end of the price history before the
    /// workload completed. Non-fatal: the sweep driver skips this start
    /// instant and continues.
    #[error("insufficient price history to complete the simulated run")]
    InsufficientRunway,

    /// The availability zone's region has no entry in the pricing
    /// tables. Fatal for the triple.
    #[error("no pricing data for region '{0}'")]
    PricingLookupError(String),

    /// A price lookup before the first recorded sample.
    #[error("timestamp {0} precedes the first recorded price sample")]
    BeforeSeriesStart(chrono::DateTime<chrono::Utc>),

    /// I/O failure reading or writing an archive/result file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parse/write failure.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// YAML parse/write failure (sweep config, params sidecar).
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Convenience alias used throughout the simulator's library crates.
pub type SpotSimResult<T> = Result<T, SpotSimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_the_offending_key() {
        let err = SpotSimError::ArchiveMiss {
            instance: "c4.8xlarge".into(),
            product: "Linux/UNIX".into(),
            zone: "us-east-1b".into(),
        };
        assert!(err.to_string().contains("c4.8xlarge"));
    }

    #[test]
    fn io_error_converts_via_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: SpotSimError = io_err.into();
        assert!(matches!(err, SpotSimError::Io(_)));
    }
}
