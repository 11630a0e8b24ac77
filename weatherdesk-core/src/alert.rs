//! Threshold alerts for current conditions.
//!
//! At most one alert is raised per evaluation. Checks run in a fixed priority
//! order and the first one that trips wins:
//!
//! 1. high temperature
//! 2. strong wind
//! 3. low humidity
//! 4. high humidity
//!
//! Comparisons always use Celsius; the display unit only affects the message.

use serde::{Deserialize, Serialize};

use crate::units::TemperatureUnit;

/// Limits that trigger an alert. All comparisons are strict.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertThresholds {
    pub high_temperature_c: f64,
    pub strong_wind_mps: f64,
    pub low_humidity_pct: u8,
    pub high_humidity_pct: u8,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            high_temperature_c: 35.0,
            strong_wind_mps: 15.0,
            low_humidity_pct: 30,
            high_humidity_pct: 80,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertCategory {
    HighTemperature,
    StrongWind,
    LowHumidity,
    HighHumidity,
}

impl AlertCategory {
    pub fn severity(&self) -> AlertSeverity {
        match self {
            AlertCategory::HighTemperature => AlertSeverity::Danger,
            AlertCategory::StrongWind | AlertCategory::LowHumidity => AlertSeverity::Warning,
            AlertCategory::HighHumidity => AlertSeverity::Info,
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            AlertCategory::HighTemperature => "🌡",
            AlertCategory::StrongWind => "💨",
            AlertCategory::LowHumidity => "🏜",
            AlertCategory::HighHumidity => "💧",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Info,
    Warning,
    Danger,
}

impl AlertSeverity {
    /// Colour tag a UI can map onto its palette.
    pub fn color(&self) -> &'static str {
        match self {
            AlertSeverity::Info => "blue",
            AlertSeverity::Warning => "orange",
            AlertSeverity::Danger => "red",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlertDescriptor {
    pub category: AlertCategory,
    pub severity: AlertSeverity,
    pub message: String,
}

impl AlertDescriptor {
    fn new(category: AlertCategory, message: String) -> Self {
        Self {
            category,
            severity: category.severity(),
            message,
        }
    }
}

/// Evaluate the default thresholds. See [`evaluate_with`].
pub fn evaluate(
    temp_c: f64,
    wind_speed_mps: f64,
    humidity_pct: u8,
    unit: TemperatureUnit,
) -> Option<AlertDescriptor> {
    evaluate_with(
        &AlertThresholds::default(),
        temp_c,
        wind_speed_mps,
        humidity_pct,
        unit,
    )
}

pub fn evaluate_with(
    thresholds: &AlertThresholds,
    temp_c: f64,
    wind_speed_mps: f64,
    humidity_pct: u8,
    unit: TemperatureUnit,
) -> Option<AlertDescriptor> {
    // Reading and limit are shown at the same precision.
    let (category, message) = if temp_c > thresholds.high_temperature_c {
        let temp = unit.from_celsius(temp_c);
        let limit = unit.from_celsius(thresholds.high_temperature_c);
        let suffix = unit.suffix();
        let message = format!(
            "High temperature: {temp:.1}{suffix} is above {limit:.1}{suffix}. \
             Stay hydrated and avoid the midday sun."
        );
        (AlertCategory::HighTemperature, message)
    } else if wind_speed_mps > thresholds.strong_wind_mps {
        let limit = thresholds.strong_wind_mps;
        let message = format!(
            "Strong wind: {wind_speed_mps:.1} m/s is above {limit:.1} m/s. Secure loose objects."
        );
        (AlertCategory::StrongWind, message)
    } else if humidity_pct < thresholds.low_humidity_pct {
        let limit = thresholds.low_humidity_pct;
        let message = format!("Low humidity: {humidity_pct}% is below {limit}%. Dry air.");
        (AlertCategory::LowHumidity, message)
    } else if humidity_pct > thresholds.high_humidity_pct {
        let limit = thresholds.high_humidity_pct;
        let message = format!("High humidity: {humidity_pct}% is above {limit}%. Muggy.");
        (AlertCategory::HighHumidity, message)
    } else {
        return None;
    };

    Some(AlertDescriptor::new(category, message))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(alert: Option<AlertDescriptor>) -> Option<AlertCategory> {
        alert.map(|a| a.category)
    }

    #[test]
    fn high_temperature_wins_over_everything_else() {
        let alert = evaluate(36.0, 20.0, 90, TemperatureUnit::Celsius);
        assert_eq!(category(alert), Some(AlertCategory::HighTemperature));
    }

    #[test]
    fn strong_wind_wins_over_humidity() {
        let alert = evaluate(20.0, 16.0, 10, TemperatureUnit::Celsius);
        assert_eq!(category(alert), Some(AlertCategory::StrongWind));
    }

    #[test]
    fn low_humidity_alone() {
        let alert = evaluate(20.0, 3.0, 25, TemperatureUnit::Celsius);
        assert_eq!(category(alert), Some(AlertCategory::LowHumidity));
    }

    #[test]
    fn high_humidity_alone() {
        let alert = evaluate(20.0, 3.0, 85, TemperatureUnit::Celsius);
        assert_eq!(category(alert), Some(AlertCategory::HighHumidity));
    }

    #[test]
    fn nominal_values_raise_nothing() {
        assert_eq!(evaluate(20.0, 3.0, 50, TemperatureUnit::Celsius), None);
    }

    #[test]
    fn thresholds_are_strict() {
        assert_eq!(evaluate(35.0, 15.0, 30, TemperatureUnit::Celsius), None);
        assert_eq!(evaluate(20.0, 3.0, 80, TemperatureUnit::Celsius), None);
    }

    #[test]
    fn fahrenheit_changes_message_but_not_comparison() {
        // 36 C trips the alert even though 96.8 is the displayed figure.
        let alert = evaluate(36.0, 0.0, 50, TemperatureUnit::Fahrenheit).unwrap();
        assert_eq!(alert.category, AlertCategory::HighTemperature);
        assert!(alert.message.contains("96.8°F"), "{}", alert.message);
        assert!(alert.message.contains("95.0°F"), "{}", alert.message);

        // 34 C is 93.2 F, below the 35 C limit.
        assert_eq!(evaluate(34.0, 0.0, 50, TemperatureUnit::Fahrenheit), None);
    }

    #[test]
    fn severity_follows_category() {
        let alert = evaluate(40.0, 0.0, 50, TemperatureUnit::Celsius).unwrap();
        assert_eq!(alert.severity, AlertSeverity::Danger);
        assert_eq!(alert.severity.color(), "red");

        let alert = evaluate(20.0, 0.0, 95, TemperatureUnit::Celsius).unwrap();
        assert_eq!(alert.severity, AlertSeverity::Info);
    }

    #[test]
    fn custom_thresholds_are_honoured() {
        let thresholds = AlertThresholds {
            high_temperature_c: 25.0,
            ..AlertThresholds::default()
        };
        let alert = evaluate_with(&thresholds, 26.0, 0.0, 50, TemperatureUnit::Celsius);
        assert_eq!(category(alert), Some(AlertCategory::HighTemperature));
    }

    #[test]
    fn fractional_limits_are_not_rounded_in_messages() {
        let thresholds = AlertThresholds {
            high_temperature_c: 35.5,
            strong_wind_mps: 12.5,
            ..AlertThresholds::default()
        };

        let alert = evaluate_with(&thresholds, 35.6, 0.0, 50, TemperatureUnit::Celsius).unwrap();
        assert_eq!(
            alert.message,
            "High temperature: 35.6°C is above 35.5°C. Stay hydrated and avoid the midday sun."
        );

        let alert = evaluate_with(&thresholds, 20.0, 12.6, 50, TemperatureUnit::Celsius).unwrap();
        assert_eq!(
            alert.message,
            "Strong wind: 12.6 m/s is above 12.5 m/s. Secure loose objects."
        );
    }
}
