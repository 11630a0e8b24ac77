use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::model::{ForecastSample, WeatherSnapshot};

use super::{ProviderId, SourceError, WeatherSource, classify_status, network_error, parse_error};

const PROVIDER: ProviderId = ProviderId::WeatherApi;
const CURRENT_URL: &str = "http://api.weatherapi.com/v1/current.json";
const FORECAST_URL: &str = "http://api.weatherapi.com/v1/forecast.json";
const FORECAST_DAYS: &str = "5";

/// WeatherAPI.com error code for "No matching location found".
const NO_MATCHING_LOCATION: i64 = 1006;

#[derive(Debug, Clone)]
pub struct WeatherApiSource {
    api_key: String,
    http: Client,
}

impl WeatherApiSource {
    pub fn new(api_key: String, http: Client) -> Self {
        Self { api_key, http }
    }

    async fn get(
        &self,
        url: &str,
        city: &str,
        extra: &[(&str, &str)],
    ) -> Result<String, SourceError> {
        let res = self
            .http
            .get(url)
            .query(&[("key", self.api_key.as_str()), ("q", city)])
            .query(extra)
            .send()
            .await
            .map_err(|e| network_error(PROVIDER, &e))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| network_error(PROVIDER, &e))?;

        if !status.is_success() {
            return Err(classify_failure(status, city, &body));
        }

        Ok(body)
    }
}

/// WeatherAPI answers an unknown city with 400 and error code 1006 rather than 404.
fn classify_failure(status: StatusCode, city: &str, body: &str) -> SourceError {
    let unknown_city = status == StatusCode::BAD_REQUEST
        && serde_json::from_str::<WaErrorResponse>(body)
            .is_ok_and(|e| e.error.code == NO_MATCHING_LOCATION);

    let status = if unknown_city {
        StatusCode::NOT_FOUND
    } else {
        status
    };
    classify_status(PROVIDER, status, city, body)
}

#[derive(Debug, Deserialize)]
struct WaError {
    code: i64,
}

#[derive(Debug, Deserialize)]
struct WaErrorResponse {
    error: WaError,
}

#[derive(Debug, Deserialize)]
struct WaLocation {
    name: String,
    country: String,
    localtime_epoch: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct WaCondition {
    text: String,
    #[serde(default)]
    icon: String,
}

#[derive(Debug, Deserialize)]
struct WaCurrent {
    temp_c: f64,
    feelslike_c: f64,
    humidity: u8,
    wind_kph: f64,
    condition: WaCondition,
    last_updated_epoch: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct WaResponse {
    location: WaLocation,
    current: WaCurrent,
}

#[derive(Debug, Deserialize)]
struct WaForecastHour {
    time_epoch: i64,
    /// Local wall-clock time, e.g. `2024-05-01 13:00`.
    time: String,
    temp_c: f64,
    humidity: u8,
    condition: WaCondition,
}

#[derive(Debug, Deserialize)]
struct WaForecastDay {
    hour: Vec<WaForecastHour>,
}

#[derive(Debug, Deserialize)]
struct WaForecast {
    forecastday: Vec<WaForecastDay>,
}

#[derive(Debug, Deserialize)]
struct WaForecastResponse {
    forecast: WaForecast,
}

/// `//cdn.weatherapi.com/weather/64x64/day/113.png` -> `day/113`.
fn icon_id(icon_url: &str) -> String {
    let trimmed = icon_url.trim_end_matches(".png");
    let mut parts = trimmed.rsplitn(3, '/');
    match (parts.next(), parts.next()) {
        (Some(code), Some(period)) => format!("{period}/{code}"),
        (Some(code), None) => code.to_string(),
        _ => String::new(),
    }
}

fn kph_to_mps(kph: f64) -> f64 {
    kph / 3.6
}

fn parse_current(body: &str) -> Result<WeatherSnapshot, serde_json::Error> {
    let parsed: WaResponse = serde_json::from_str(body)?;

    let updated = parsed.current.last_updated_epoch;
    let observation_time = updated
        .or(parsed.location.localtime_epoch)
        .and_then(|ts| DateTime::from_timestamp(ts, 0))
        .unwrap_or_else(Utc::now);

    Ok(WeatherSnapshot {
        city: parsed.location.name,
        country: parsed.location.country,
        temperature_c: parsed.current.temp_c,
        feels_like_c: parsed.current.feelslike_c,
        humidity_pct: parsed.current.humidity,
        wind_speed_mps: kph_to_mps(parsed.current.wind_kph),
        icon: icon_id(&parsed.current.condition.icon),
        description: parsed.current.condition.text,
        observation_time,
    })
}

/// The hourly entries only carry a local wall-clock string next to the UTC
/// epoch, so the city's offset is recovered from the difference of the two.
fn local_time(hour: &WaForecastHour) -> Option<DateTime<FixedOffset>> {
    let wall = NaiveDateTime::parse_from_str(&hour.time, "%Y-%m-%d %H:%M").ok()?;
    let offset_secs = wall.and_utc().timestamp() - hour.time_epoch;
    let offset = FixedOffset::east_opt(i32::try_from(offset_secs).ok()?)?;
    let utc = DateTime::from_timestamp(hour.time_epoch, 0)?;
    Some(utc.with_timezone(&offset))
}

fn parse_forecast(body: &str) -> Result<Vec<ForecastSample>, serde_json::Error> {
    let parsed: WaForecastResponse = serde_json::from_str(body)?;

    let samples = parsed
        .forecast
        .forecastday
        .into_iter()
        .flat_map(|day| day.hour)
        .filter_map(|hour| {
            let local_time = local_time(&hour)?;
            Some(ForecastSample {
                local_time,
                temperature_c: hour.temp_c,
                temp_min_c: hour.temp_c,
                temp_max_c: hour.temp_c,
                humidity_pct: hour.humidity,
                icon: icon_id(&hour.condition.icon),
                description: hour.condition.text,
            })
        })
        .collect();

    Ok(samples)
}

#[async_trait]
impl WeatherSource for WeatherApiSource {
    async fn fetch_current(&self, city: &str) -> Result<WeatherSnapshot, SourceError> {
        let body = self.get(CURRENT_URL, city, &[]).await?;
        parse_current(&body).map_err(|e| parse_error(PROVIDER, "current", &e))
    }

    async fn fetch_forecast(&self, city: &str) -> Result<Vec<ForecastSample>, SourceError> {
        let body = self
            .get(FORECAST_URL, city, &[("days", FORECAST_DAYS)])
            .await?;
        parse_forecast(&body).map_err(|e| parse_error(PROVIDER, "forecast", &e))
    }
}
