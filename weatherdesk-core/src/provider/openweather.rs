use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Offset, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::model::{ForecastSample, WeatherSnapshot};

use super::{ProviderId, SourceError, WeatherSource, classify_status, network_error, parse_error};

const PROVIDER: ProviderId = ProviderId::OpenWeather;
const CURRENT_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
const FORECAST_URL: &str = "https://api.openweathermap.org/data/2.5/forecast";

#[derive(Debug, Clone)]
pub struct OpenWeatherSource {
    api_key: String,
    http: Client,
}

impl OpenWeatherSource {
    pub fn new(api_key: String, http: Client) -> Self {
        Self { api_key, http }
    }

    async fn get(&self, url: &str, city: &str) -> Result<String, SourceError> {
        let res = self
            .http
            .get(url)
            .query(&[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ])
            .send()
            .await
            .map_err(|e| network_error(PROVIDER, &e))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| network_error(PROVIDER, &e))?;

        if !status.is_success() {
            return Err(classify_status(PROVIDER, status, city, &body));
        }

        Ok(body)
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    #[serde(default)]
    temp_min: Option<f64>,
    #[serde(default)]
    temp_max: Option<f64>,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Default, Deserialize)]
struct OwSys {
    #[serde(default)]
    country: String,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    dt: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    #[serde(default)]
    sys: OwSys,
}

#[derive(Debug, Deserialize)]
struct OwCity {
    /// Shift in seconds from UTC.
    #[serde(default)]
    timezone: i32,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    city: OwCity,
    list: Vec<OwForecastEntry>,
}

fn condition(weather: &[OwWeather]) -> (String, String) {
    weather
        .first()
        .map(|w| (w.description.clone(), w.icon.clone()))
        .unwrap_or_else(|| ("Unknown".to_string(), "01d".to_string()))
}

fn parse_current(body: &str) -> Result<WeatherSnapshot, serde_json::Error> {
    let parsed: OwCurrentResponse = serde_json::from_str(body)?;
    let (description, icon) = condition(&parsed.weather);

    Ok(WeatherSnapshot {
        city: parsed.name,
        country: parsed.sys.country,
        temperature_c: parsed.main.temp,
        feels_like_c: parsed.main.feels_like,
        humidity_pct: parsed.main.humidity,
        wind_speed_mps: parsed.wind.speed,
        description,
        icon,
        observation_time: DateTime::from_timestamp(parsed.dt, 0).unwrap_or_else(Utc::now),
    })
}

fn parse_forecast(body: &str) -> Result<Vec<ForecastSample>, serde_json::Error> {
    let parsed: OwForecastResponse = serde_json::from_str(body)?;
    let offset = FixedOffset::east_opt(parsed.city.timezone).unwrap_or_else(|| Utc.fix());

    let samples = parsed
        .list
        .into_iter()
        .filter_map(|entry| {
            let local_time = DateTime::from_timestamp(entry.dt, 0)?.with_timezone(&offset);
            let (description, icon) = condition(&entry.weather);
            Some(ForecastSample {
                local_time,
                temperature_c: entry.main.temp,
                temp_min_c: entry.main.temp_min.unwrap_or(entry.main.temp),
                temp_max_c: entry.main.temp_max.unwrap_or(entry.main.temp),
                humidity_pct: entry.main.humidity,
                description,
                icon,
            })
        })
        .collect();

    Ok(samples)
}

#[async_trait]
impl WeatherSource for OpenWeatherSource {
    async fn fetch_current(&self, city: &str) -> Result<WeatherSnapshot, SourceError> {
        let body = self.get(CURRENT_URL, city).await?;
        parse_current(&body).map_err(|e| parse_error(PROVIDER, "current", &e))
    }

    async fn fetch_forecast(&self, city: &str) -> Result<Vec<ForecastSample>, SourceError> {
        let body = self.get(FORECAST_URL, city).await?;
        parse_forecast(&body).map_err(|e| parse_error(PROVIDER, "forecast", &e))
    }
}
