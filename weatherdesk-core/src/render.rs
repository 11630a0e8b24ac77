//! What the session hands to a UI.
//!
//! View models are fully converted to the display unit; a sink only has to
//! lay them out.

use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;

use crate::{
    alert::{AlertCategory, AlertDescriptor, AlertSeverity},
    model::{DailyForecast, WeatherSnapshot},
    units::TemperatureUnit,
};

/// Receives everything the session wants displayed.
pub trait RenderSink: Send + Sync {
    fn set_loading(&self, loading: bool);

    fn history_changed(&self, history: &[String]);

    fn render(&self, frame: RenderFrame);
}

impl<T: RenderSink + ?Sized> RenderSink for Arc<T> {
    fn set_loading(&self, loading: bool) {
        (**self).set_loading(loading)
    }

    fn history_changed(&self, history: &[String]) {
        (**self).history_changed(history)
    }

    fn render(&self, frame: RenderFrame) {
        (**self).render(frame)
    }
}

/// One complete screen update. A frame without `error` clears any error
/// shown earlier.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderFrame {
    pub error: Option<String>,
    pub weather: Option<WeatherViewModel>,
    pub forecast: Option<ForecastViewModel>,
    pub alert: Option<AlertViewModel>,
}

impl RenderFrame {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherViewModel {
    pub location: String,
    pub temperature: f64,
    pub feels_like: f64,
    pub unit_suffix: &'static str,
    pub description: String,
    pub icon: String,
    pub humidity_pct: u8,
    pub wind_speed_mps: f64,
}

impl WeatherViewModel {
    pub fn new(snapshot: &WeatherSnapshot, unit: TemperatureUnit) -> Self {
        Self {
            location: snapshot.location_label(),
            temperature: unit.from_celsius(snapshot.temperature_c),
            feels_like: unit.from_celsius(snapshot.feels_like_c),
            unit_suffix: unit.suffix(),
            description: title_case(&snapshot.description),
            icon: snapshot.icon.clone(),
            humidity_pct: snapshot.humidity_pct,
            wind_speed_mps: snapshot.wind_speed_mps,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastViewModel {
    pub days: Vec<ForecastDayViewModel>,
}

impl ForecastViewModel {
    /// `None` when there is nothing to show, so the panel stays hidden.
    pub fn new(days: &[DailyForecast], unit: TemperatureUnit) -> Option<Self> {
        if days.is_empty() {
            return None;
        }

        let days = days
            .iter()
            .map(|d| ForecastDayViewModel::new(d, unit))
            .collect();
        Some(Self { days })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastDayViewModel {
    pub day: NaiveDate,
    /// e.g. `Mon, Oct 16`
    pub label: String,
    pub temperature: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub unit_suffix: &'static str,
    pub description: String,
    pub icon: String,
}

impl ForecastDayViewModel {
    fn new(day: &DailyForecast, unit: TemperatureUnit) -> Self {
        Self {
            day: day.day,
            label: day.day.format("%a, %b %d").to_string(),
            temperature: unit.from_celsius(day.representative.temperature_c),
            temp_min: unit.from_celsius(day.temp_min_c),
            temp_max: unit.from_celsius(day.temp_max_c),
            unit_suffix: unit.suffix(),
            description: title_case(day.description()),
            icon: day.icon().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertViewModel {
    pub category: AlertCategory,
    pub severity: AlertSeverity,
    pub color: &'static str,
    pub icon: &'static str,
    pub message: String,
}

impl From<AlertDescriptor> for AlertViewModel {
    fn from(alert: AlertDescriptor) -> Self {
        Self {
            category: alert.category,
            severity: alert.severity,
            color: alert.severity.color(),
            icon: alert.category.icon(),
            message: alert.message,
        }
    }
}

/// `"light rain"` -> `"Light Rain"`.
fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ForecastSample;
    use chrono::{FixedOffset, TimeZone, Utc};

    fn snapshot() -> WeatherSnapshot {
        WeatherSnapshot {
            city: "London".into(),
            country: "GB".into(),
            temperature_c: 20.0,
            feels_like_c: 10.0,
            humidity_pct: 55,
            wind_speed_mps: 3.5,
            description: "scattered clouds".into(),
            icon: "03d".into(),
            observation_time: Utc::now(),
        }
    }

    #[test]
    fn weather_view_model_converts_for_display() {
        let vm = WeatherViewModel::new(&snapshot(), TemperatureUnit::Fahrenheit);

        assert_eq!(vm.location, "London, GB");
        assert_eq!(vm.temperature, 68.0);
        assert_eq!(vm.feels_like, 50.0);
        assert_eq!(vm.unit_suffix, "°F");
        assert_eq!(vm.description, "Scattered Clouds");
        assert_eq!(vm.humidity_pct, 55);
    }

    #[test]
    fn empty_forecast_has_no_panel() {
        assert_eq!(ForecastViewModel::new(&[], TemperatureUnit::Celsius), None);
    }

    #[test]
    fn forecast_day_label_and_conversion() {
        let tz = FixedOffset::east_opt(0).unwrap();
        let sample = ForecastSample {
            local_time: tz.with_ymd_and_hms(2023, 10, 16, 12, 0, 0).unwrap(),
            temperature_c: 0.0,
            temp_min_c: -10.0,
            temp_max_c: 10.0,
            humidity_pct: 40,
            description: "snow".into(),
            icon: "13d".into(),
        };
        let day = DailyForecast {
            day: sample.local_time.date_naive(),
            representative: sample,
            temp_min_c: -10.0,
            temp_max_c: 10.0,
        };

        let vm = ForecastViewModel::new(&[day], TemperatureUnit::Fahrenheit).unwrap();
        let entry = &vm.days[0];

        assert_eq!(entry.label, "Mon, Oct 16");
        assert_eq!(entry.temperature, 32.0);
        assert_eq!(entry.temp_min, 14.0);
        assert_eq!(entry.temp_max, 50.0);
        assert_eq!(entry.description, "Snow");
    }

    #[test]
    fn title_case_handles_odd_spacing() {
        assert_eq!(title_case("heavy  RAIN"), "Heavy  Rain");
        assert_eq!(title_case(""), "");
    }
}
