//! Transform engine for derived series metrics.
//!
//! A pure function over one series' observations: sorts them by date and
//! attaches six derived columns computed from the series' own history.
//! No I/O and no shared state; the same input always produces the same
//! output. Degenerate inputs (short series, zero variance, zero bases)
//! resolve to defined values or missing markers, never errors.

use crate::constants::{
    ROLLING_LONG_WINDOW, ROLLING_SHORT_WINDOW, YOY_LAG_LONG, YOY_LAG_SHORT, YOY_LAG_THRESHOLD,
};
use crate::models::{EnrichedObservation, Observation};

/// Enrich a series' observations with derived metrics
///
/// Returns `None` for empty input — the explicit "nothing to persist"
/// signal, distinct from a hard failure. Input order does not matter;
/// observations are sorted ascending by date before computation.
///
/// Per row the derived columns are:
/// - `mom_change`: percent change from the previous observation
/// - `yoy_change`: percent change over a 12-period lag (4 for series of
///   12 or fewer observations)
/// - `rolling_avg_3m` / `rolling_avg_12m`: trailing simple moving
///   averages with shrinking windows at the series start
/// - `z_score`: deviation from the full-series mean in sample standard
///   deviations, exactly 0 when the deviation is undefined
/// - `percentile_rank`: average-rank percentile of the value within the
///   full series, scaled to 0–100
///
/// Any derived value that is not finite (a percent change from a zero
/// base, for instance) is stored as missing rather than infinity.
pub fn transform(observations: Vec<Observation>) -> Option<Vec<EnrichedObservation>> {
    if observations.is_empty() {
        return None;
    }

    let mut observations = observations;
    observations.sort_by_key(|obs| obs.date);

    let values: Vec<f64> = observations.iter().map(|obs| obs.value).collect();
    let n = values.len();

    let yoy_lag = if n > YOY_LAG_THRESHOLD {
        YOY_LAG_LONG
    } else {
        YOY_LAG_SHORT
    };

    let (mean, std_dev) = mean_and_sample_std(&values);
    let ranks = percentile_ranks(&values);

    let enriched = observations
        .into_iter()
        .enumerate()
        .map(|(i, obs)| {
            let mom_change = if i >= 1 {
                storable(percent_change(values[i], values[i - 1]))
            } else {
                None
            };

            let yoy_change = if i >= yoy_lag {
                storable(percent_change(values[i], values[i - yoy_lag]))
            } else {
                None
            };

            let z_score = if std_dev > 0.0 {
                storable((values[i] - mean) / std_dev)
            } else {
                Some(0.0)
            };

            EnrichedObservation {
                series_id: obs.series_id,
                date: obs.date,
                value: obs.value,
                mom_change,
                yoy_change,
                rolling_avg_3m: storable(trailing_mean(&values, i, ROLLING_SHORT_WINDOW)),
                rolling_avg_12m: storable(trailing_mean(&values, i, ROLLING_LONG_WINDOW)),
                z_score,
                percentile_rank: storable(ranks[i]),
            }
        })
        .collect();

    Some(enriched)
}

/// Percent change of `current` relative to `base`
///
/// A zero base yields an infinity (or NaN for 0/0); callers are expected
/// to pass the result through [`storable`].
fn percent_change(current: f64, base: f64) -> f64 {
    (current - base) / base * 100.0
}

/// Replace non-finite results with the missing marker
fn storable(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Mean of the trailing window ending at `i`, shrinking at the series start
fn trailing_mean(values: &[f64], i: usize, window: usize) -> f64 {
    let start = (i + 1).saturating_sub(window);
    let slice = &values[start..=i];
    slice.iter().sum::<f64>() / slice.len() as f64
}

/// Full-series mean and sample standard deviation (n − 1 denominator)
///
/// The standard deviation is 0 for a single observation or a uniform
/// series; the caller maps that to an all-zero z-score column.
fn mean_and_sample_std(values: &[f64]) -> (f64, f64) {
    let n = values.len();
    let mean = values.iter().sum::<f64>() / n as f64;

    if n < 2 {
        return (mean, 0.0);
    }

    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    let std_dev = variance.sqrt();

    if std_dev.is_finite() {
        (mean, std_dev)
    } else {
        (mean, 0.0)
    }
}

/// Percentile rank of each value within the full series
///
/// Ties receive the average of their 1-based ranks; ranks scale to 0–100
/// via `(rank - 1) / (n - 1)`, so the minimum maps to 0, the maximum to
/// 100, and a uniform series to 50 everywhere. A single observation
/// ranks at 100.
fn percentile_ranks(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    if n == 1 {
        return vec![100.0];
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        values[a]
            .partial_cmp(&values[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && values[order[j + 1]] == values[order[i]] {
            j += 1;
        }
        // Average 1-based rank across the tie group
        let avg_rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = avg_rank;
        }
        i = j + 1;
    }

    ranks
        .iter()
        .map(|rank| (rank - 1.0) / (n as f64 - 1.0) * 100.0)
        .collect()
}
