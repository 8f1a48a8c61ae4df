use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Offset, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{
    ChosenLocation, ClientError, ForecastEntry, Suggestion, Units, WeatherSnapshot,
    error::ClientResult,
    provider::{GeoSuggest, ProviderId, WeatherSource, read_body},
};

pub const DEFAULT_SUGGESTION_LIMIT: usize = 5;

/// OpenWeather geocoding, current weather and 5 day / 3 hour forecast.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    base_url: String,
    units: Units,
    limit: usize,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(api_key: String, http: Client) -> Self {
        Self {
            api_key,
            base_url: ProviderId::OpenWeather.default_base_url().to_string(),
            units: Units::default(),
            limit: DEFAULT_SUGGESTION_LIMIT,
            http,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_units(mut self, units: Units) -> Self {
        self.units = units;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    async fn get_json<T>(&self, path: &str, params: &[(&str, String)], what: &str) -> ClientResult<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let url = format!("{}{path}", self.base_url);
        debug!(%url, what, "OpenWeather request");

        let res = self
            .http
            .get(&url)
            .query(params)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await?;

        let body = read_body(res, what).await?;

        serde_json::from_str(&body)
            .map_err(|e| ClientError::parse(format!("failed to parse OpenWeather {what} JSON: {e}")))
    }

    fn coordinate_params(&self, location: &ChosenLocation) -> Vec<(&'static str, String)> {
        vec![
            ("lat", location.lat.to_string()),
            ("lon", location.lon.to_string()),
            ("units", self.units.as_str().to_string()),
        ]
    }
}

#[derive(Debug, Deserialize)]
struct OwGeoResult {
    name: String,
    #[serde(default)]
    country: String,
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    #[serde(default)]
    feels_like: f64,
    #[serde(default)]
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    #[serde(default)]
    main: String,
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    #[serde(default)]
    dt: Option<i64>,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwCity {
    /// Shift in seconds from UTC.
    #[serde(default)]
    timezone: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    #[serde(default)]
    city: Option<OwCity>,
    list: Vec<OwForecastEntry>,
}

#[async_trait]
impl GeoSuggest for OpenWeatherClient {
    async fn suggest(&self, query: &str) -> ClientResult<Vec<Suggestion>> {
        let params = [("q", query.to_string()), ("limit", self.limit.to_string())];
        let parsed: Vec<OwGeoResult> = self.get_json("/geo/1.0/direct", &params, "geocoding").await?;

        if parsed.is_empty() {
            return Err(ClientError::empty(format!("no places match '{query}'")));
        }

        Ok(parsed
            .into_iter()
            .map(|r| Suggestion {
                name: r.name,
                country: r.country,
                lat: r.lat,
                lon: r.lon,
            })
            .collect())
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherClient {
    async fn current(&self, location: &ChosenLocation) -> ClientResult<WeatherSnapshot> {
        let params = self.coordinate_params(location);
        let parsed: OwCurrentResponse =
            self.get_json("/data/2.5/weather", &params, "current weather").await?;

        let weather = parsed
            .weather
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::parse("current weather carried no condition"))?;

        let observed_at = parsed
            .dt
            .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
            .unwrap_or_else(Utc::now);

        Ok(WeatherSnapshot {
            location_name: parsed.name,
            temperature: parsed.main.temp,
            feels_like: parsed.main.feels_like,
            humidity: parsed.main.humidity,
            wind_speed: parsed.wind.speed,
            condition: weather.main,
            description: weather.description,
            icon: weather.icon,
            units: self.units,
            observed_at,
        })
    }

    async fn forecast(&self, location: &ChosenLocation) -> ClientResult<Vec<ForecastEntry>> {
        let params = self.coordinate_params(location);
        let parsed: OwForecastResponse =
            self.get_json("/data/2.5/forecast", &params, "forecast").await?;

        if parsed.list.is_empty() {
            return Err(ClientError::empty("forecast response contained no steps"));
        }

        let offset = parsed
            .city
            .and_then(|c| c.timezone)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(utc_offset);

        parsed
            .list
            .into_iter()
            .map(|step| forecast_entry(step, offset))
            .collect()
    }
}

fn forecast_entry(step: OwForecastEntry, offset: FixedOffset) -> ClientResult<ForecastEntry> {
    let at = DateTime::<Utc>::from_timestamp(step.dt, 0)
        .ok_or_else(|| ClientError::parse(format!("forecast timestamp out of range: {}", step.dt)))?
        .with_timezone(&offset);

    let weather = step
        .weather
        .into_iter()
        .next()
        .ok_or_else(|| ClientError::parse("forecast step carried no condition"))?;

    Ok(ForecastEntry {
        at,
        day: at.format("%a").to_string(),
        hour: at.format("%-I %p").to_string(),
        icon: weather.icon,
        description: weather.description,
        // half-up, so -2.5 reads as -2
        temperature: (step.main.temp + 0.5).floor() as i64,
    })
}

fn utc_offset() -> FixedOffset {
    Utc.fix()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forecast_entry_uses_city_offset_for_labels() {
        // 2024-01-01T00:00:00Z is 13:00 in Auckland (+13h in summer)
        let step = OwForecastEntry {
            dt: 1_704_067_200,
            main: OwMain {
                temp: 21.5,
                feels_like: 21.0,
                humidity: 60,
            },
            weather: vec![OwWeather {
                main: "Clear".into(),
                description: "clear sky".into(),
                icon: "01d".into(),
            }],
        };

        let offset = FixedOffset::east_opt(13 * 3600).unwrap();
        let entry = forecast_entry(step, offset).unwrap();

        assert_eq!(entry.day, "Mon");
        assert_eq!(entry.hour, "1 PM");
        assert_eq!(entry.temperature, 22);
        assert_eq!(entry.icon_url(), "http://openweathermap.org/img/wn/01d@2x.png");
    }

    #[test]
    fn negative_half_degrees_round_up() {
        let step = OwForecastEntry {
            dt: 0,
            main: OwMain {
                temp: -2.5,
                feels_like: -5.0,
                humidity: 90,
            },
            weather: vec![OwWeather {
                main: "Snow".into(),
                description: "light snow".into(),
                icon: "13n".into(),
            }],
        };

        let entry = forecast_entry(step, utc_offset()).unwrap();
        assert_eq!(entry.temperature, -2);
        assert_eq!(entry.day, "Thu");
        assert_eq!(entry.hour, "12 AM");
    }

    #[test]
    fn step_without_condition_is_a_parse_error() {
        let step = OwForecastEntry {
            dt: 0,
            main: OwMain {
                temp: 1.0,
                feels_like: 1.0,
                humidity: 1,
            },
            weather: vec![],
        };

        assert!(matches!(
            forecast_entry(step, utc_offset()),
            Err(ClientError::Parse(_))
        ));
    }
}
