//! Plain-text rendering shared by `weather show` and the terminal view.

use std::fmt::Write;

use chrono::Local;
use weather_core::{
    Advice, ForecastEntry, RECOMMENDATION_FALLBACK, Recommendation, Session, Slot, Units,
    WeatherSnapshot,
};

pub const TIPS_TITLE: &str = "Weather Tips";
pub const BILINGUAL_TIPS_TITLE: &str = "Huarere | Weather Tips";

/// Rough glyph for an OpenWeather icon code such as `"10d"`.
pub fn condition_glyph(icon: &str) -> &'static str {
    match icon.get(..2).unwrap_or_default() {
        "01" => "☀",
        "02" => "⛅",
        "03" | "04" => "☁",
        "09" | "10" => "☂",
        "11" => "⚡",
        "13" => "❄",
        "50" => "≋",
        _ => "·",
    }
}

pub fn headline(w: &WeatherSnapshot) -> String {
    format!(
        "{}  {:.0}{}  {}",
        w.location_name,
        w.temperature,
        w.units.temperature_label(),
        w.condition
    )
}

/// Feels-like, humidity and wind, in that order.
pub fn details(w: &WeatherSnapshot) -> [(&'static str, String); 3] {
    [
        ("Feels Like", format!("{:.0}{}", w.feels_like, w.units.temperature_label())),
        ("Humidity", format!("{}%", w.humidity)),
        ("Wind Speed", format!("{:.0} {}", w.wind_speed, w.units.wind_label())),
    ]
}

pub fn updated_at(w: &WeatherSnapshot) -> String {
    format!("Updated {}", w.observed_at.with_timezone(&Local).format("%H:%M"))
}

pub fn forecast_cell(entry: &ForecastEntry, temperature_label: &str) -> [String; 4] {
    [
        entry.day.clone(),
        entry.hour.clone(),
        format!("{} {}", condition_glyph(&entry.icon), entry.description),
        format!("{} {}", entry.temperature, temperature_label),
    ]
}

pub fn tips_title(rec: &Recommendation) -> &'static str {
    let advice = [&rec.clothing, &rec.health, &rec.outdoor_activity];
    if advice.iter().any(|a| matches!(a, Advice::BilingualPair { .. })) {
        BILINGUAL_TIPS_TITLE
    } else {
        TIPS_TITLE
    }
}

pub fn tips(rec: &Recommendation) -> [(&'static str, String); 3] {
    [
        ("Clothing", rec.clothing.to_string()),
        ("Health", rec.health.to_string()),
        ("Outdoor Activity", rec.outdoor_activity.to_string()),
    ]
}

/// The whole session as text, one section per slot.
///
/// `units` is the system the forecast was requested in.
pub fn render(session: &Session, units: Units) -> String {
    let mut out = String::new();
    let label = units.temperature_label();

    match session.weather() {
        Slot::Ready(w) => {
            let _ = writeln!(out, "{}", headline(w));
            let _ = writeln!(out, "  {}", w.description);
            for (name, value) in details(w) {
                let _ = writeln!(out, "  {name}: {value}");
            }
            let _ = writeln!(out, "  {}", updated_at(w));
        }
        Slot::Loading => out.push_str("Loading current weather...\n"),
        Slot::Empty | Slot::Failed => out.push_str("Current weather unavailable.\n"),
    }

    out.push('\n');
    match session.forecast() {
        Slot::Ready(entries) if !entries.is_empty() => {
            out.push_str("Forecast\n");
            for entry in entries {
                let [day, hour, desc, temp] = forecast_cell(entry, label);
                let _ = writeln!(out, "  {day} {hour:>5}  {temp:>7}  {desc}");
            }
        }
        Slot::Loading => out.push_str("Loading forecast...\n"),
        _ => out.push_str("Forecast unavailable.\n"),
    }

    out.push('\n');
    match session.recommendation() {
        Slot::Ready(rec) => {
            let _ = writeln!(out, "{}", tips_title(rec));
            for (name, value) in tips(rec) {
                let _ = writeln!(out, "  {name}: {value}");
            }
        }
        Slot::Failed => {
            let _ = writeln!(out, "{TIPS_TITLE}\n  {RECOMMENDATION_FALLBACK}");
        }
        Slot::Loading => out.push_str("Loading weather tips...\n"),
        Slot::Empty => {}
    }

    out
}
