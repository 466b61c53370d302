//! The on-disk price archive: CSV files partitioned by
//! `<base>/<period>/<zone>/<product-slug>/<instance>.csv`, loaded back
//! into a deduplicated [`PriceSeries`].
//!
//! A corrupt row never aborts a load — it is logged with
//! [`tracing::warn!`] and skipped, matching the "skip with warning,
//! never abort" failure mode for partial archive corruption.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use csv::{ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};
use spotsim_core::{PriceSample, PriceSeries, SpotSimError, SpotSimResult};

/// One row of an archive CSV file: `Instance type, Product, Region,
/// Availability zone, Spot price, Timestamp`. Extra columns in a merged
/// archive are ignored — serde matches by header name.
#[derive(Debug, Serialize, Deserialize)]
struct ArchiveRow {
    #[serde(rename = "Instance type")]
    instance_type: String,
    #[serde(rename = "Product")]
    product: String,
    #[serde(rename = "Region")]
    region: String,
    #[serde(rename = "Availability zone")]
    availability_zone: String,
    #[serde(rename = "Spot price")]
    spot_price: f64,
    #[serde(rename = "Timestamp")]
    timestamp: DateTime<Utc>,
}

/// Replaces `/` in a product description with `-` for use as a
/// directory segment, e.g. `"Linux/UNIX"` -> `"Linux-UNIX"`.
pub fn product_slug(product: &str) -> String {
    product.replace('/', "-")
}

pub struct PriceArchive;

impl PriceArchive {
    /// Path to the archive file for one `(period, zone, product,
    /// instance)` key.
    pub fn key_path(
        base: &Path,
        period: &str,
        zone: &str,
        product: &str,
        instance: &str,
    ) -> PathBuf {
        base.join(period)
            .join(zone)
            .join(product_slug(product))
            .join(format!("{instance}.csv"))
    }

    /// Load the price series for one `(instance, product, zone)` key,
    /// filtering rows defensively by availability zone in case a file
    /// holds more than one (a merged archive may). An archive file that
    /// doesn't exist yet is treated the same as one with no matching
    /// rows: both surface as [`SpotSimError::ArchiveMiss`].
    pub fn load_key(
        base: &Path,
        period: &str,
        zone: &str,
        product: &str,
        instance: &str,
    ) -> SpotSimResult<PriceSeries> {
        let path = Self::key_path(base, period, zone, product, instance);
        let samples = read_archive_rows(&path, instance, product, zone)?;
        PriceSeries::from_samples(samples).ok_or_else(|| SpotSimError::ArchiveMiss {
            instance: instance.to_string(),
            product: product.to_string(),
            zone: zone.to_string(),
        })
    }

    /// Load and merge several archive files for the same key — live
    /// collection overlaps across polls, so samples are deduplicated by
    /// timestamp (keeping the first seen) after concatenation.
    pub fn load_merged(
        paths: &[PathBuf],
        instance: &str,
        product: &str,
        zone: &str,
    ) -> SpotSimResult<PriceSeries> {
        let mut samples = Vec::new();
        for path in paths {
            samples.extend(read_archive_rows(path, instance, product, zone)?);
        }
        PriceSeries::from_samples(samples).ok_or_else(|| SpotSimError::ArchiveMiss {
            instance: instance.to_string(),
            product: product.to_string(),
            zone: zone.to_string(),
        })
    }

    /// Append samples to an archive file, creating the file (with
    /// header) and its parent directories if needed. The archive
    /// population path itself (polling a cloud API for live prices) is
    /// out of scope; this is the write side that a fetcher would call.
    pub fn write_samples(path: &Path, samples: &[PriceSample]) -> SpotSimResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let write_header = !path.exists();
        let mut writer = WriterBuilder::new()
            .has_headers(write_header)
            .from_writer(
                std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)?,
            );
        for sample in samples {
            writer.serialize(ArchiveRow {
                instance_type: sample.instance_type.clone(),
                product: sample.product.clone(),
                region: sample.region.clone(),
                availability_zone: sample.availability_zone.clone(),
                spot_price: sample.price,
                timestamp: sample.timestamp,
            })?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// A stub for the out-of-scope archive fetcher: takes samples that were
/// already retrieved from wherever a real cloud SDK client would fetch
/// them, and writes them through [`PriceArchive::write_samples`].
pub struct ArchiveFetcherStub {
    samples: Vec<PriceSample>,
}

impl ArchiveFetcherStub {
    pub fn new(samples: Vec<PriceSample>) -> Self {
        Self { samples }
    }

    pub fn populate(&self, path: &Path) -> SpotSimResult<()> {
        PriceArchive::write_samples(path, &self.samples)
    }
}

fn read_archive_rows(
    path: &Path,
    instance: &str,
    product: &str,
    zone: &str,
) -> SpotSimResult<Vec<PriceSample>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let mut samples = Vec::new();
    for (line, result) in reader.deserialize::<ArchiveRow>().enumerate() {
        let row = match result {
            Ok(row) => row,
            Err(err) => {
                tracing::warn!("skipping corrupt row {line} in {}: {err}", path.display());
                continue;
            }
        };
        if row.instance_type != instance || row.product != product || row.availability_zone != zone {
            continue;
        }
        match PriceSample::new(
            row.instance_type,
            row.product,
            row.region,
            row.availability_zone,
            row.spot_price,
            row.timestamp,
        ) {
            Ok(sample) => samples.push(sample),
            Err(err) => {
                tracing::warn!("skipping invalid row {line} in {}: {err}", path.display());
            }
        }
    }
    Ok(samples)
}
