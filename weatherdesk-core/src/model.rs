use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Current conditions for a city as returned by a weather source.
///
/// Temperatures are Celsius regardless of the display unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub city: String,
    pub country: String,
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub humidity_pct: u8,
    pub wind_speed_mps: f64,
    pub description: String,
    pub icon: String,
    pub observation_time: DateTime<Utc>,
}

impl WeatherSnapshot {
    /// `"City, CC"`, or just the city when the country is unknown.
    pub fn location_label(&self) -> String {
        if self.country.is_empty() {
            self.city.clone()
        } else {
            format!("{}, {}", self.city, self.country)
        }
    }
}

/// One timestamped point of a multi-day forecast, in the city's local time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSample {
    pub local_time: DateTime<FixedOffset>,
    pub temperature_c: f64,
    pub temp_min_c: f64,
    pub temp_max_c: f64,
    pub humidity_pct: u8,
    pub description: String,
    pub icon: String,
}

/// Aggregate of all samples that fall on one local calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub day: NaiveDate,
    /// Sample nearest local noon.
    pub representative: ForecastSample,
    pub temp_min_c: f64,
    pub temp_max_c: f64,
}

impl DailyForecast {
    pub fn description(&self) -> &str {
        &self.representative.description
    }

    pub fn icon(&self) -> &str {
        &self.representative.icon
    }
}
