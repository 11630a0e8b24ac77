//! The weather session controller.
//!
//! A search runs through
//! `Idle -> Validating -> Fetching -> Converting -> Evaluating -> Rendering -> Idle`,
//! dropping into `Error` when validation or the current-conditions fetch
//! fails. Whatever happens, the sink sees `set_loading(false)` exactly once
//! per search.
//!
//! Changing the display unit re-runs the last three phases on the stored
//! snapshot without fetching again.
//!
//! A failed forecast fetch never fails the search. It is logged as
//! [`SessionError::ForecastUnavailable`] and the forecast panel is left empty.

use std::{
    fmt,
    sync::{
        Mutex, MutexGuard,
        atomic::{AtomicBool, Ordering},
    },
};
use thiserror::Error;

use crate::{
    alert::{self, AlertThresholds},
    forecast::group_daily,
    history::SearchHistory,
    model::{DailyForecast, WeatherSnapshot},
    provider::{SourceError, WeatherSource},
    render::{AlertViewModel, ForecastViewModel, RenderFrame, RenderSink, WeatherViewModel},
    store::PreferenceStore,
    units::TemperatureUnit,
};

/// Longest accepted city name, in characters, after trimming.
pub const MAX_CITY_LEN: usize = 50;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Please enter a city name")]
    EmptyInput,
    #[error("City name is too long (max 50 characters)")]
    InputTooLong { len: usize },
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("Forecast unavailable: {0}")]
    ForecastUnavailable(#[source] SourceError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Idle,
    Validating,
    Fetching,
    Converting,
    Evaluating,
    Rendering,
    Error,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Validating => "validating",
            SessionPhase::Fetching => "fetching",
            SessionPhase::Converting => "converting",
            SessionPhase::Evaluating => "evaluating",
            SessionPhase::Rendering => "rendering",
            SessionPhase::Error => "error",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    Rendered,
    /// Another search was still in flight.
    Ignored,
    /// `refresh` was called before any successful search.
    NoSnapshot,
}

/// Trim and check a raw city string.
pub fn validate_city(input: &str) -> Result<&str, SessionError> {
    let city = input.trim();
    if city.is_empty() {
        return Err(SessionError::EmptyInput);
    }

    let len = city.chars().count();
    if len > MAX_CITY_LEN {
        return Err(SessionError::InputTooLong { len });
    }

    Ok(city)
}

#[derive(Debug, Default)]
struct SessionState {
    phase: SessionPhase,
    history: SearchHistory,
    unit: TemperatureUnit,
    snapshot: Option<WeatherSnapshot>,
    forecast: Vec<DailyForecast>,
    last_query: Option<String>,
}

impl SessionState {
    fn transition(&mut self, to: SessionPhase) {
        tracing::debug!(from = %self.phase, %to, "session phase");
        self.phase = to;
    }
}

pub struct WeatherSession {
    source: Box<dyn WeatherSource>,
    store: Box<dyn PreferenceStore>,
    sink: Box<dyn RenderSink>,
    thresholds: AlertThresholds,
    in_flight: AtomicBool,
    state: Mutex<SessionState>,
}

impl fmt::Debug for WeatherSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeatherSession")
            .field("source", &self.source)
            .field("thresholds", &self.thresholds)
            .field("in_flight", &self.in_flight)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl WeatherSession {
    /// Build a session, loading history and unit preference from `store`.
    pub fn new(
        source: Box<dyn WeatherSource>,
        store: Box<dyn PreferenceStore>,
        sink: Box<dyn RenderSink>,
    ) -> Self {
        let state = SessionState {
            history: SearchHistory::from_entries(store.load_history()),
            unit: store.load_unit(),
            ..SessionState::default()
        };

        Self {
            source,
            store,
            sink,
            thresholds: AlertThresholds::default(),
            in_flight: AtomicBool::new(false),
            state: Mutex::new(state),
        }
    }

    pub fn with_thresholds(mut self, thresholds: AlertThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn history(&self) -> Vec<String> {
        self.lock().history.entries().to_vec()
    }

    pub fn unit(&self) -> TemperatureUnit {
        self.lock().unit
    }

    pub fn phase(&self) -> SessionPhase {
        self.lock().phase
    }

    pub fn snapshot(&self) -> Option<WeatherSnapshot> {
        self.lock().snapshot.clone()
    }

    pub fn forecast(&self) -> Vec<DailyForecast> {
        self.lock().forecast.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Run one full search cycle for `input`.
    ///
    /// Errors are rendered to the sink and also returned. A call made while
    /// another search is in flight does nothing and yields
    /// [`SearchOutcome::Ignored`].
    pub async fn search(&self, input: &str) -> Result<SearchOutcome, SessionError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!(input, "search already in flight, ignoring trigger");
            return Ok(SearchOutcome::Ignored);
        }

        let _cycle = Cycle::begin(self);

        match self.run_cycle(input).await {
            Ok(()) => Ok(SearchOutcome::Rendered),
            Err(err) => {
                self.lock().transition(SessionPhase::Error);
                tracing::warn!(input, error = %err, "weather search failed");
                self.sink.render(RenderFrame::error(err.to_string()));
                Err(err)
            }
        }
    }

    /// Search again for the last successfully fetched city.
    pub async fn refresh(&self) -> Result<SearchOutcome, SessionError> {
        let query = self.lock().last_query.clone();
        match query {
            Some(query) => self.search(&query).await,
            None => Ok(SearchOutcome::NoSnapshot),
        }
    }

    /// Flip between Celsius and Fahrenheit. Returns the new unit.
    pub fn toggle_unit(&self) -> TemperatureUnit {
        let unit = self.unit().toggled();
        self.set_unit(unit);
        unit
    }

    /// Persist `unit` and re-render the current snapshot in it.
    ///
    /// While a search is in flight only the preference changes; that search
    /// renders in the new unit when it completes.
    pub fn set_unit(&self, unit: TemperatureUnit) {
        self.lock().unit = unit;

        if let Err(err) = self.store.save_unit(unit) {
            tracing::error!(error = %err, "failed to persist unit preference");
        }

        if self.is_busy() {
            return;
        }

        if self.render_snapshot() {
            self.lock().transition(SessionPhase::Idle);
        }
    }

    async fn run_cycle(&self, input: &str) -> Result<(), SessionError> {
        self.lock().transition(SessionPhase::Validating);
        let city = validate_city(input)?;

        self.lock().transition(SessionPhase::Fetching);
        let snapshot = self.source.fetch_current(city).await?;
        tracing::info!(
            city,
            location = %snapshot.location_label(),
            "fetched current conditions"
        );

        self.remember(city);

        let forecast = match self.source.fetch_forecast(city).await {
            Ok(samples) => group_daily(&samples),
            Err(err) => {
                let err = SessionError::ForecastUnavailable(err);
                tracing::warn!(city, error = %err, "continuing without forecast");
                Vec::new()
            }
        };

        {
            let mut state = self.lock();
            state.snapshot = Some(snapshot);
            state.forecast = forecast;
            state.last_query = Some(city.to_string());
        }

        self.render_snapshot();
        Ok(())
    }

    /// Add `city` to history, persisting and announcing it if that changed anything.
    fn remember(&self, city: &str) {
        let entries = {
            let mut state = self.lock();
            if !state.history.add(city) {
                return;
            }
            state.history.entries().to_vec()
        };

        if let Err(err) = self.store.save_history(&entries) {
            tracing::error!(error = %err, "failed to persist search history");
        }
        self.sink.history_changed(&entries);
    }

    /// Convert, evaluate and render the stored snapshot. Returns `false` when
    /// there is no snapshot yet.
    fn render_snapshot(&self) -> bool {
        let frame = {
            let mut state = self.lock();
            let Some(snapshot) = state.snapshot.clone() else {
                return false;
            };
            let unit = state.unit;

            state.transition(SessionPhase::Converting);
            let weather = WeatherViewModel::new(&snapshot, unit);
            let forecast = ForecastViewModel::new(&state.forecast, unit);

            state.transition(SessionPhase::Evaluating);
            let alert = alert::evaluate_with(
                &self.thresholds,
                snapshot.temperature_c,
                snapshot.wind_speed_mps,
                snapshot.humidity_pct,
                unit,
            )
            .map(AlertViewModel::from);

            state.transition(SessionPhase::Rendering);
            RenderFrame {
                error: None,
                weather: Some(weather),
                forecast,
                alert,
            }
        };

        self.sink.render(frame);
        true
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Brackets one search. Loading goes on when it is created. On drop the phase
/// returns to idle and the in-flight flag is released before loading goes off,
/// so the sink already sees an idle session.
struct Cycle<'a> {
    session: &'a WeatherSession,
}

impl<'a> Cycle<'a> {
    fn begin(session: &'a WeatherSession) -> Self {
        session.sink.set_loading(true);
        Self { session }
    }
}

impl Drop for Cycle<'_> {
    fn drop(&mut self) {
        self.session.lock().transition(SessionPhase::Idle);
        self.session.in_flight.store(false, Ordering::Release);
        self.session.sink.set_loading(false);
    }
}
