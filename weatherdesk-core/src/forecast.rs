use chrono::{NaiveDate, NaiveTime, Timelike};
use std::collections::BTreeMap;

use crate::model::{DailyForecast, ForecastSample};

/// Maximum number of days kept in a forecast set.
pub const MAX_FORECAST_DAYS: usize = 5;

const NOON_SECS: i64 = 12 * 60 * 60;

/// Group forecast samples into at most [`MAX_FORECAST_DAYS`] daily aggregates,
/// ordered by local calendar day.
///
/// Each day's representative is the sample whose local time is closest to
/// 12:00. When two samples are equally close the one that came first in
/// `samples` wins.
pub fn group_daily(samples: &[ForecastSample]) -> Vec<DailyForecast> {
    let mut by_day: BTreeMap<NaiveDate, Vec<&ForecastSample>> = BTreeMap::new();

    for sample in samples {
        by_day
            .entry(sample.local_time.date_naive())
            .or_default()
            .push(sample);
    }

    by_day
        .into_iter()
        .take(MAX_FORECAST_DAYS)
        .filter_map(|(day, day_samples)| aggregate_day(day, &day_samples))
        .collect()
}

fn aggregate_day(day: NaiveDate, samples: &[&ForecastSample]) -> Option<DailyForecast> {
    // min_by_key keeps the first of equal keys.
    let representative = samples
        .iter()
        .min_by_key(|s| distance_from_noon(s.local_time.time()))?;

    let temp_min_c = samples
        .iter()
        .map(|s| s.temp_min_c)
        .fold(f64::INFINITY, f64::min);
    let temp_max_c = samples
        .iter()
        .map(|s| s.temp_max_c)
        .fold(f64::NEG_INFINITY, f64::max);

    Some(DailyForecast {
        day,
        representative: (*representative).clone(),
        temp_min_c,
        temp_max_c,
    })
}

fn distance_from_noon(time: NaiveTime) -> i64 {
    (i64::from(time.num_seconds_from_midnight()) - NOON_SECS).abs()
}
