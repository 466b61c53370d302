//! The market-interruption simulator — the heart of the model.
//!
//! Replays a bid against a price trajectory starting at one instant and
//! returns the running time, waiting time, accrued instance cost, and
//! interruption count for a workload of `num_iter` sequential
//! `proc_time`-second waves.

use chrono::{DateTime, Duration, Utc};
use spotsim_core::{PriceSeries, SpotSimError, SpotSimResult};

use crate::series::InterpolatedSeries;

/// Output of one [`simulate_market`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketSimResult {
    pub run_time_secs: f64,
    pub wait_time_secs: f64,
    pub node_cost: f64,
    pub num_interrupts: u64,
    pub first_wave_time_secs: f64,
}

/// Replay `series` against `bid_price` starting at `start_time`,
/// processing `num_iter` waves of `proc_time_secs` seconds each.
///
/// Billing model: a node is billed in whole hours from launch. A run
/// that ends naturally (the workload completes before the next
/// interrupt) bills its partial final hour in full. A run that is
/// preempted mid-hour does not bill that in-progress hour at all.
///
/// Returns [`SpotSimError::InsufficientRunway`] if the price history
/// ends before the workload can complete.
pub fn simulate_market(
    series: &PriceSeries,
    start_time: DateTime<Utc>,
    proc_time_secs: f64,
    num_iter: u64,
    bid_price: f64,
) -> SpotSimResult<MarketSimResult> {
    let interpolated = InterpolatedSeries::new(series);
    let mut remaining = proc_time_secs * num_iter as f64;
    let mut run = 0.0_f64;
    let mut wait = 0.0_f64;
    let mut cost = 0.0_f64;
    let mut interrupts = 0_u64;
    let mut first_wave_time = 0.0_f64;
    let mut first_wave_recorded = false;
    let mut current_start = start_time;
    let (series_last, _) = series.last();

    while remaining > 0.0 {
        let launch_price = interpolated
            .at(current_start)
            .ok_or(SpotSimError::BeforeSeriesStart(current_start))?;

        let (uptime_secs, interrupt_time) = if launch_price >= bid_price {
            (0.0, current_start)
        } else {
            let interrupt_time = series
                .points()
                .iter()
                .find(|(ts, price)| *ts >= current_start && *price >= bid_price)
                .map(|(ts, _)| *ts)
                .unwrap_or(series_last);
            let uptime_secs = seconds_between(current_start, interrupt_time);
            (uptime_secs, interrupt_time)
        };

        if uptime_secs >= remaining {
            cost += billed_cost(&interpolated, current_start, remaining, true);
            run += remaining;
            remaining = 0.0;
            maybe_record_first_wave(
                run,
                wait,
                proc_time_secs,
                &mut first_wave_recorded,
                &mut first_wave_time,
            );
            break;
        }

        if uptime_secs > 0.0 {
            interrupts += 1;
        }
        run += uptime_secs;
        cost += billed_cost(&interpolated, current_start, uptime_secs, false);
        remaining = remaining - uptime_secs + (uptime_secs % proc_time_secs);

        let resume_time = series
            .points()
            .iter()
            .find(|(ts, price)| *ts > interrupt_time && *price < bid_price)
            .map(|(ts, _)| *ts);

        let resume_time = match resume_time {
            Some(ts) if ts != series_last => ts,
            _ => return Err(SpotSimError::InsufficientRunway),
        };

        wait += seconds_between(interrupt_time, resume_time);
        current_start = resume_time;

        maybe_record_first_wave(
            run,
            wait,
            proc_time_secs,
            &mut first_wave_recorded,
            &mut first_wave_time,
        );
    }

    Ok(MarketSimResult {
        run_time_secs: run,
        wait_time_secs: wait,
        node_cost: cost,
        num_interrupts: interrupts,
        first_wave_time_secs: first_wave_time,
    })
}

fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / 1000.0
}

/// `first_wave_time` is `proc_time + wait_so_far`, recorded the first
/// time cumulative run time reaches one full wave.
fn maybe_record_first_wave(
    run: f64,
    wait: f64,
    proc_time_secs: f64,
    recorded: &mut bool,
    first_wave_time: &mut f64,
) {
    if !*recorded && run >= proc_time_secs {
        *first_wave_time = proc_time_secs + wait;
        *recorded = true;
    }
}

/// Billed cost for one contiguous run segment of `duration_secs`
/// starting at `segment_start`. A natural termination bills
/// `ceil(duration/3600)` hours (the final partial hour counts in
/// full); a preemption bills only `floor(duration/3600)` completed
/// hours.
fn billed_cost(
    interpolated: &InterpolatedSeries<'_>,
    segment_start: DateTime<Utc>,
    duration_secs: f64,
    natural_termination: bool,
) -> f64 {
    if duration_secs <= 0.0 {
        return 0.0;
    }
    let billed_hours = if natural_termination {
        (duration_secs / 3600.0).ceil() as u64
    } else {
        (duration_secs / 3600.0).floor() as u64
    };
    (0..billed_hours)
        .map(|i| {
            let hour_start = segment_start + Duration::seconds(i as i64 * 3600);
            interpolated.at(hour_start).unwrap_or(0.0)
        })
        .sum()
}
