//! Core library for `weatherdesk`.
//!
//! This crate defines:
//! - The weather session controller (validate, fetch, convert, alert, render)
//! - Persistence of search history and the temperature unit preference
//! - Abstractions over weather sources and the UI render sink
//! - Configuration & credentials handling
//!
//! It is used by `weatherdesk-cli`, but a GUI front end only needs to
//! implement [`RenderSink`] to drive a [`WeatherSession`].

pub mod alert;
pub mod config;
pub mod forecast;
pub mod history;
pub mod model;
pub mod provider;
pub mod render;
pub mod session;
pub mod store;
pub mod units;

pub use alert::{AlertCategory, AlertDescriptor, AlertSeverity, AlertThresholds};
pub use config::{Config, ProviderConfig};
pub use history::SearchHistory;
pub use model::{DailyForecast, ForecastSample, WeatherSnapshot};
pub use provider::{ProviderId, SourceError, WeatherSource};
pub use render::{
    AlertViewModel, ForecastDayViewModel, ForecastViewModel, RenderFrame, RenderSink,
    WeatherViewModel,
};
pub use session::{SearchOutcome, SessionError, SessionPhase, WeatherSession};
pub use store::{JsonFileStore, MemoryStore, PreferenceStore, StoreError};
pub use units::{TemperatureUnit, celsius_to_fahrenheit, fahrenheit_to_celsius};
