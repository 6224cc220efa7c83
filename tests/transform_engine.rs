//! Integration tests for the transform engine
//!
//! Exercises the engine's end-to-end contract on whole series: row-count
//! preservation, missing-value placement, degenerate-case policies, and
//! the documented numeric scenarios.

use chrono::NaiveDate;
use fred_pipeline::app::services::transform::transform;
use fred_pipeline::models::Observation;

/// Build monthly observations for a series starting January 2018
fn monthly_series(series_id: &str, values: &[f64]) -> Vec<Observation> {
    values
        .iter()
        .enumerate()
        .map(|(i, &value)| Observation {
            series_id: series_id.to_string(),
            date: NaiveDate::from_ymd_opt(2018 + i as i32 / 12, (i % 12) as u32 + 1, 1).unwrap(),
            value,
        })
        .collect()
}

fn assert_approx(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn transform_preserves_row_count() {
    for len in [1usize, 3, 12, 13, 40] {
        let values: Vec<f64> = (0..len).map(|i| 100.0 + i as f64).collect();
        let rows = transform(monthly_series("LEN", &values)).unwrap();
        assert_eq!(rows.len(), len, "length {len} should be preserved");
    }
}

#[test]
fn rolling_averages_never_missing() {
    let values: Vec<f64> = (0..30).map(|i| (i as f64).sin() * 10.0 + 50.0).collect();
    let rows = transform(monthly_series("ROLL", &values)).unwrap();

    for (i, row) in rows.iter().enumerate() {
        assert!(row.rolling_avg_3m.is_some(), "3m missing at row {i}");
        assert!(row.rolling_avg_12m.is_some(), "12m missing at row {i}");
    }
}

#[test]
fn change_metrics_have_exact_missing_prefixes() {
    // Long series: mom missing only at row 0, yoy missing for rows 0..12
    let values: Vec<f64> = (1..=24).map(|v| v as f64).collect();
    let rows = transform(monthly_series("LONG", &values)).unwrap();

    for (i, row) in rows.iter().enumerate() {
        assert_eq!(row.mom_change.is_none(), i == 0, "mom at row {i}");
        assert_eq!(row.yoy_change.is_none(), i < 12, "yoy at row {i}");
    }

    // Short series: yoy lag drops to 4
    let values: Vec<f64> = (1..=10).map(|v| v as f64).collect();
    let rows = transform(monthly_series("SHORT", &values)).unwrap();

    for (i, row) in rows.iter().enumerate() {
        assert_eq!(row.yoy_change.is_none(), i < 4, "short yoy at row {i}");
    }
}

#[test]
fn uniform_series_degenerate_policy() {
    let rows = transform(monthly_series("FLAT", &[2.0; 8])).unwrap();

    for row in &rows {
        assert_eq!(row.z_score, Some(0.0));
        assert_eq!(row.percentile_rank, Some(50.0));
        assert_eq!(row.rolling_avg_3m, Some(2.0));
        assert_eq!(row.rolling_avg_12m, Some(2.0));
    }
}

#[test]
fn no_field_is_ever_infinite() {
    // Zero bases force infinite percent changes before sanitization
    let rows = transform(monthly_series("ZERO", &[0.0, 10.0, 0.0, 10.0, 0.0])).unwrap();

    for row in &rows {
        for field in [
            row.mom_change,
            row.yoy_change,
            row.rolling_avg_3m,
            row.rolling_avg_12m,
            row.z_score,
            row.percentile_rank,
        ]
        .into_iter()
        .flatten()
        {
            assert!(field.is_finite(), "non-finite field in {:?}", row);
        }
    }

    // The changes from a zero base are missing, not infinity
    assert!(rows[1].mom_change.is_none());
    assert!(rows[3].mom_change.is_none());
}

#[test]
fn ten_percent_growth_scenario() {
    let rows = transform(monthly_series("GROW", &[100.0, 110.0, 121.0])).unwrap();

    assert!(rows[0].mom_change.is_none());
    assert_approx(rows[1].mom_change.unwrap(), 10.0);
    assert_approx(rows[2].mom_change.unwrap(), 10.0);

    assert_approx(rows[0].rolling_avg_3m.unwrap(), 100.0);
    assert_approx(rows[1].rolling_avg_3m.unwrap(), 105.0);
    assert_approx(rows[2].rolling_avg_3m.unwrap(), 110.33333333);
}

#[test]
fn single_observation_scenario() {
    let rows = transform(monthly_series("ONE", &[42.0])).unwrap();
    assert_eq!(rows.len(), 1);

    let row = &rows[0];
    assert!(row.mom_change.is_none());
    assert!(row.yoy_change.is_none());
    assert_eq!(row.rolling_avg_3m, Some(42.0));
    assert_eq!(row.rolling_avg_12m, Some(42.0));
    assert_eq!(row.z_score, Some(0.0));
    assert_eq!(row.percentile_rank, Some(100.0));
}

#[test]
fn empty_series_yields_no_data_signal() {
    assert!(transform(Vec::new()).is_none());
}

#[test]
fn derived_fields_are_independent_of_other_series() {
    // The same values under different series identifiers produce the
    // same metrics: no cross-series coupling
    let a = transform(monthly_series("A", &[5.0, 7.0, 6.0, 9.0])).unwrap();
    let b = transform(monthly_series("B", &[5.0, 7.0, 6.0, 9.0])).unwrap();

    for (row_a, row_b) in a.iter().zip(&b) {
        assert_eq!(row_a.mom_change, row_b.mom_change);
        assert_eq!(row_a.z_score, row_b.z_score);
        assert_eq!(row_a.percentile_rank, row_b.percentile_rank);
    }
}

#[test]
fn dates_are_sorted_in_output() {
    let mut observations = monthly_series("SORT", &[1.0, 2.0, 3.0, 4.0]);
    observations.swap(0, 3);
    observations.swap(1, 2);

    let rows = transform(observations).unwrap();
    for pair in rows.windows(2) {
        assert!(pair[0].date < pair[1].date);
    }
    assert_eq!(rows[0].value, 1.0);
    assert_eq!(rows[3].value, 4.0);
}
