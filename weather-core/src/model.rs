use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

/// Unit system requested from the weather endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

impl Units {
    /// Value of the `units` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }

    pub fn temperature_label(&self) -> &'static str {
        match self {
            Units::Metric => "°C",
            Units::Imperial => "°F",
        }
    }

    pub fn wind_label(&self) -> &'static str {
        match self {
            Units::Metric => "m/s",
            Units::Imperial => "mph",
        }
    }

    /// Convert a temperature reported in this unit system to Celsius.
    pub fn to_celsius(&self, temperature: f64) -> f64 {
        match self {
            Units::Metric => temperature,
            Units::Imperial => (temperature - 32.0) * 5.0 / 9.0,
        }
    }

    /// Convert a wind speed reported in this unit system to km/h.
    pub fn to_kmh(&self, speed: f64) -> f64 {
        match self {
            Units::Metric => speed * 3.6,
            Units::Imperial => speed * 1.609_344,
        }
    }
}

impl std::fmt::Display for Units {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Units {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "metric" => Ok(Units::Metric),
            "imperial" => Ok(Units::Imperial),
            _ => Err(anyhow::anyhow!(
                "Unknown unit system '{value}'. Supported: metric, imperial."
            )),
        }
    }
}

/// One geocoding hit, in server ranking order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub name: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
}

impl Suggestion {
    /// Text shown in the list and written back into the query on confirm.
    pub fn label(&self) -> String {
        place_label(&self.name, &self.country)
    }
}

/// The confirmed place that drives the weather and recommendation fetches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChosenLocation {
    pub name: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
}

impl ChosenLocation {
    pub fn label(&self) -> String {
        place_label(&self.name, &self.country)
    }
}

/// `"name, country"`, or just the name when the country is unknown.
fn place_label(name: &str, country: &str) -> String {
    if country.is_empty() {
        name.to_string()
    } else {
        format!("{name}, {country}")
    }
}

impl From<Suggestion> for ChosenLocation {
    fn from(s: Suggestion) -> Self {
        Self {
            name: s.name,
            country: s.country,
            lat: s.lat,
            lon: s.lon,
        }
    }
}

/// Current conditions for a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub location_name: String,
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity: u8,
    pub wind_speed: f64,
    /// Short condition group, e.g. "Clouds".
    pub condition: String,
    pub description: String,
    pub icon: String,
    pub units: Units,
    pub observed_at: DateTime<Utc>,
}

/// One 3-hour step of the forecast strip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub at: DateTime<FixedOffset>,
    /// Abbreviated weekday, e.g. "Mon".
    pub day: String,
    /// 12-hour clock label, e.g. "3 PM".
    pub hour: String,
    pub icon: String,
    pub description: String,
    pub temperature: i64,
}

impl ForecastEntry {
    pub fn icon_url(&self) -> String {
        icon_url(&self.icon)
    }
}

pub fn icon_url(icon: &str) -> String {
    format!("http://openweathermap.org/img/wn/{icon}@2x.png")
}

/// Shape of the recommendation reply, chosen by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReplyStyle {
    Plain,
    #[default]
    Bilingual,
}

impl ReplyStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplyStyle::Plain => "plain",
            ReplyStyle::Bilingual => "bilingual",
        }
    }
}

impl TryFrom<&str> for ReplyStyle {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "plain" => Ok(ReplyStyle::Plain),
            "bilingual" => Ok(ReplyStyle::Bilingual),
            _ => Err(anyhow::anyhow!(
                "Unknown recommendation style '{value}'. Supported: plain, bilingual."
            )),
        }
    }
}

/// A single piece of advice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Advice {
    PlainText(String),
    BilingualPair { english: String, maori: String },
}

impl std::fmt::Display for Advice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Advice::PlainText(text) => f.write_str(text),
            Advice::BilingualPair { english, maori } => write!(f, "{english} ({maori})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub clothing: Advice,
    pub health: Advice,
    pub outdoor_activity: Advice,
}

/// Inputs the recommendation prompt is built from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conditions {
    pub temperature_c: f64,
    pub humidity_pct: u8,
    pub wind_kmh: f64,
}

impl From<&WeatherSnapshot> for Conditions {
    fn from(snapshot: &WeatherSnapshot) -> Self {
        Self {
            temperature_c: snapshot.units.to_celsius(snapshot.temperature),
            humidity_pct: snapshot.humidity,
            wind_kmh: snapshot.units.to_kmh(snapshot.wind_speed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn imperial_conditions_are_converted_for_the_prompt() {
        let snapshot = WeatherSnapshot {
            location_name: "Auckland".into(),
            temperature: 212.0,
            feels_like: 210.0,
            humidity: 40,
            wind_speed: 10.0,
            condition: "Clear".into(),
            description: "clear sky".into(),
            icon: "01d".into(),
            units: Units::Imperial,
            observed_at: Utc::now(),
        };

        let c = Conditions::from(&snapshot);
        assert!((c.temperature_c - 100.0).abs() < 1e-9);
        assert!((c.wind_kmh - 16.09344).abs() < 1e-9);
        assert_eq!(c.humidity_pct, 40);
    }

    #[test]
    fn advice_display_matches_style() {
        let plain = Advice::PlainText("Light jacket.".into());
        assert_eq!(plain.to_string(), "Light jacket.");

        let pair = Advice::BilingualPair {
            english: "Light jacket.".into(),
            maori: "Kākena māmā.".into(),
        };
        assert_eq!(pair.to_string(), "Light jacket. (Kākena māmā.)");
    }

    #[test]
    fn label_omits_missing_country() {
        let known = ChosenLocation {
            name: "Auckland".into(),
            country: "NZ".into(),
            lat: -36.85,
            lon: 174.76,
        };
        assert_eq!(known.label(), "Auckland, NZ");

        let unknown = ChosenLocation {
            country: String::new(),
            ..known
        };
        assert_eq!(unknown.label(), "Auckland");
    }

    #[test]
    fn units_parse_case_insensitively() {
        assert_eq!(Units::try_from("Imperial").unwrap(), Units::Imperial);
        assert!(Units::try_from("kelvin").is_err());
    }
}
