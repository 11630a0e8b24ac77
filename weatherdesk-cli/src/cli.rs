use std::process::ExitCode;

use anyhow::Context;
use chrono::Local;
use clap::{Parser, Subcommand};
use inquire::{
    CustomUserError, InquireError, Password, Text,
    autocompletion::{Autocomplete, Replacement},
};
use weatherdesk_core::{
    Config, JsonFileStore, PreferenceStore, ProviderId, SearchOutcome, TemperatureUnit,
    WeatherSession, provider::default_source_from_config,
};

use crate::console::ConsoleSink;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "weatherdesk",
    version,
    about = "Weather lookups with history, unit preference and alerts"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials for a specific provider.
    Configure {
        /// Provider short name, e.g. "openweather" or "weatherapi".
        provider: String,

        /// Make this the provider used for lookups.
        #[arg(long)]
        default: bool,
    },

    /// Show current weather, alerts and forecast for a city.
    Show {
        /// City name.
        city: String,

        /// Display unit to use (and remember): "c" or "f".
        #[arg(long)]
        unit: Option<String>,
    },

    /// Prompt for cities repeatedly. `:u` toggles the unit, `:r` refreshes.
    Interactive,

    /// Print recently searched cities.
    History,

    /// Set the display unit: "c", "f" or "toggle".
    Unit { value: String },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        match self.command {
            Command::Configure { provider, default } => configure(&provider, default)?,
            Command::Show { city, unit } => return show(&city, unit.as_deref()).await,
            Command::Interactive => interactive().await?,
            Command::History => {
                let store = open_store(&Config::load()?)?;
                for (idx, city) in store.load_history().iter().enumerate() {
                    println!("{}. {city}", idx + 1);
                }
            }
            Command::Unit { value } => {
                let store = open_store(&Config::load()?)?;
                let unit = if value.eq_ignore_ascii_case("toggle") {
                    store.load_unit().toggled()
                } else {
                    TemperatureUnit::try_from(value.as_str())?
                };
                store.save_unit(unit)?;
                println!("Display unit set to {}", unit.suffix());
            }
        }

        Ok(ExitCode::SUCCESS)
    }
}

fn configure(provider: &str, make_default: bool) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;
    let mut config = Config::load()?;

    if config.is_provider_configured(id) {
        println!("{id} already has an API key. A new one replaces it.");
    }

    let api_key = Password::new(&format!("API key for {id}:"))
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    config.upsert_provider_api_key(id, api_key.trim().to_string());
    if make_default {
        config.set_default_provider(id);
    }
    config.save()?;

    println!(
        "Saved credentials for {id} to {}",
        Config::config_file_path()?.display()
    );
    if config.default_provider_id()? == id {
        println!("{id} is the default provider.");
    }
    Ok(())
}

fn open_store(config: &Config) -> anyhow::Result<JsonFileStore> {
    Ok(JsonFileStore::new(config.resolve_data_dir()?))
}

fn open_session(config: &Config) -> anyhow::Result<WeatherSession> {
    let source = default_source_from_config(config)?;
    let store = open_store(config)?;
    tracing::debug!(data_dir = %store.dir().display(), "opening weather session");

    let session = WeatherSession::new(source, Box::new(store), Box::new(ConsoleSink));
    Ok(session.with_thresholds(config.alerts))
}

fn print_observed(session: &WeatherSession) {
    if let Some(snapshot) = session.snapshot() {
        let local = snapshot.observation_time.with_timezone(&Local);
        println!("\nObserved {}", local.format("%Y-%m-%d %H:%M"));
    }
}

async fn show(city: &str, unit: Option<&str>) -> anyhow::Result<ExitCode> {
    let config = Config::load()?;
    let session = open_session(&config)?;

    if let Some(unit) = unit {
        session.set_unit(TemperatureUnit::try_from(unit)?);
    }

    // The sink has already printed any error.
    match session.search(city).await {
        Ok(_) => {
            print_observed(&session);
            Ok(ExitCode::SUCCESS)
        }
        Err(_) => Ok(ExitCode::FAILURE),
    }
}

async fn interactive() -> anyhow::Result<()> {
    let config = Config::load()?;
    let session = open_session(&config)?;

    println!("Enter a city. `:u` toggles the unit, `:r` refreshes.");
    println!("An empty line quits.");

    loop {
        let input = match Text::new("City:")
            .with_autocomplete(HistoryCompleter::new(session.history()))
            .prompt()
        {
            Ok(input) => input,
            Err(InquireError::OperationCanceled) | Err(InquireError::OperationInterrupted) => break,
            Err(err) => return Err(err).context("Failed to read city"),
        };

        match input.trim() {
            "" => break,
            ":u" => {
                let unit = session.toggle_unit();
                println!("Display unit: {}", unit.suffix());
            }
            ":r" => {
                if let Ok(SearchOutcome::NoSnapshot) = session.refresh().await {
                    println!("Nothing to refresh yet.");
                }
            }
            city => {
                if session.search(city).await.is_ok() {
                    print_observed(&session);
                }
            }
        }
    }

    Ok(())
}

/// Offers history entries matching the current input.
#[derive(Debug, Clone)]
struct HistoryCompleter {
    history: Vec<String>,
}

impl HistoryCompleter {
    fn new(history: Vec<String>) -> Self {
        Self { history }
    }
}

impl Autocomplete for HistoryCompleter {
    fn get_suggestions(&mut self, input: &str) -> Result<Vec<String>, CustomUserError> {
        let needle = input.to_lowercase();
        Ok(self
            .history
            .iter()
            .filter(|c| c.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    fn get_completion(
        &mut self,
        _input: &str,
        highlighted_suggestion: Option<String>,
    ) -> Result<Replacement, CustomUserError> {
        Ok(highlighted_suggestion)
    }
}
