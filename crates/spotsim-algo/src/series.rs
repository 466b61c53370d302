//! Forward-fill lookups and stride sampling over a [`PriceSeries`].
//!
//! A sample at `t0` represents the price from `t0` up to (but not
//! including) the next sample: this is a deliberate modelling choice,
//! not an approximation, and must not be replaced by linear
//! interpolation — doing so breaks the flat-series invariants the
//! simulator is tested against.

use chrono::{DateTime, Duration, Utc};
use spotsim_core::{PriceSeries, SpotSimError, SpotSimResult};

/// A virtual view over a [`PriceSeries`] with an implicit sample at
/// every whole second between its first and last observation. Never
/// materialised; every lookup is a binary search against the backing
/// series.
pub struct InterpolatedSeries<'a> {
    series: &'a PriceSeries,
}

impl<'a> InterpolatedSeries<'a> {
    pub fn new(series: &'a PriceSeries) -> Self {
        Self { series }
    }

    /// Forward-fill lookup: the price of the most recent sample at or
    /// before `t`. `None` if `t` precedes the first stored sample.
    pub fn at(&self, t: DateTime<Utc>) -> Option<f64> {
        let points = self.series.points();
        match points.binary_search_by_key(&t, |(ts, _)| *ts) {
            Ok(idx) => Some(points[idx].1),
            Err(0) => None,
            Err(idx) => Some(points[idx - 1].1),
        }
    }
}

/// Forward-fill and stride extension methods, added directly on
/// [`PriceSeries`] from this crate to keep the orphan rule happy.
pub trait PriceSeriesOps {
    /// Forward-fill lookup; errors if `t` precedes the first sample.
    fn at(&self, t: DateTime<Utc>) -> SpotSimResult<f64>;

    /// Evaluation points on a fixed cadence (e.g. every 20 minutes)
    /// from the series' first to last timestamp, each forward-filled.
    fn stride(&self, freq: Duration) -> Stride<'_>;
}

impl PriceSeriesOps for PriceSeries {
    fn at(&self, t: DateTime<Utc>) -> SpotSimResult<f64> {
        InterpolatedSeries::new(self)
            .at(t)
            .ok_or(SpotSimError::BeforeSeriesStart(t))
    }

    fn stride(&self, freq: Duration) -> Stride<'_> {
        let (first, _) = self.first();
        let (last, _) = self.last();
        Stride {
            interpolated: InterpolatedSeries::new(self),
            current: first,
            step: freq,
            end: last,
        }
    }
}

/// Lazy sequence of `(t, price)` produced by [`PriceSeriesOps::stride`].
pub struct Stride<'a> {
    interpolated: InterpolatedSeries<'a>,
    current: DateTime<Utc>,
    step: Duration,
    end: DateTime<Utc>,
}

impl<'a> Iterator for Stride<'a> {
    type Item = (DateTime<Utc>, f64);

    fn next(&mut self) -> Option<Self::Item> {
        if self.current > self.end {
            return None;
        }
        let price = self.interpolated.at(self.current)?;
        let point = (self.current, price);
        self.current += self.step;
        Some(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use spotsim_core::PriceSample;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_600_000_000 + secs, 0).unwrap()
    }

    fn series() -> PriceSeries {
        PriceSeries::from_samples(vec![
            PriceSample::new("c4.8xlarge", "Linux/UNIX", "us-east-1", "us-east-1b", 0.10, ts(0))
                .unwrap(),
            PriceSample::new("c4.8xlarge", "Linux/UNIX", "us-east-1", "us-east-1b", 0.50, ts(1800))
                .unwrap(),
            PriceSample::new("c4.8xlarge", "Linux/UNIX", "us-east-1", "us-east-1b", 0.10, ts(2400))
                .unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn forward_fill_holds_last_price_until_next_sample() {
        let series = series();
        let interp = InterpolatedSeries::new(&series);
        assert_eq!(interp.at(ts(0)), Some(0.10));
        assert_eq!(interp.at(ts(900)), Some(0.10));
        assert_eq!(interp.at(ts(1800)), Some(0.50));
        assert_eq!(interp.at(ts(2000)), Some(0.50));
        assert_eq!(interp.at(ts(2400)), Some(0.10));
        assert_eq!(interp.at(ts(-1)), None);
    }

    #[test]
    fn at_errors_before_series_start() {
        let series = series();
        assert!(series.at(ts(-10)).is_err());
        assert!(series.at(ts(0)).is_ok());
    }

    #[test]
    fn stride_covers_the_whole_series_at_fixed_cadence() {
        let series = series();
        let points: Vec<_> = series.stride(Duration::seconds(1200)).collect();
        // first .. last inclusive-ish, at 0, 1200, 2400
        assert_eq!(points.len(), 3);
        assert_eq!(points[0], (ts(0), 0.10));
        assert_eq!(points[1], (ts(1200), 0.10));
        assert_eq!(points[2], (ts(2400), 0.10));
    }
}
