use weatherdesk_core::{RenderFrame, RenderSink};

/// Prints render frames to stdout. Loading notices go to stderr.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl RenderSink for ConsoleSink {
    fn set_loading(&self, loading: bool) {
        if loading {
            eprintln!("Fetching weather...");
        }
    }

    fn history_changed(&self, history: &[String]) {
        tracing::debug!(?history, "search history updated");
    }

    fn render(&self, frame: RenderFrame) {
        print!("{}", format_frame(&frame));
    }
}

pub fn format_frame(frame: &RenderFrame) -> String {
    let mut out = String::new();

    if let Some(error) = &frame.error {
        out.push_str(&format!("❌ {error}\n"));
    }

    if let Some(weather) = &frame.weather {
        let unit = weather.unit_suffix;
        out.push_str(&format!("\n{}\n", weather.location));
        out.push_str(&format!("  {} [{}]\n", weather.description, weather.icon));
        out.push_str(&format!(
            "  {:.1}{unit} (feels like {:.1}{unit})\n",
            weather.temperature, weather.feels_like
        ));
        out.push_str(&format!(
            "  Humidity {}%   Wind {:.1} m/s\n",
            weather.humidity_pct, weather.wind_speed_mps
        ));
    }

    if let Some(alert) = &frame.alert {
        out.push_str(&format!(
            "\n{} [{}] {}\n",
            alert.icon, alert.color, alert.message
        ));
    }

    if let Some(forecast) = &frame.forecast {
        out.push_str("\n5-day forecast\n");
        for day in &forecast.days {
            let unit = day.unit_suffix;
            out.push_str(&format!(
                "  {:<12} {:>6.1}{unit}  ({:.0}{unit} / {:.0}{unit})  {}\n",
                day.label, day.temperature, day.temp_min, day.temp_max, day.description
            ));
        }
    }

    out
}
