use crate::{
    ChosenLocation, ClientError, Conditions, ForecastEntry, Recommendation, Suggestion,
    WeatherSnapshot, error::ClientResult,
};
use async_trait::async_trait;
use reqwest::{Client, Response};
use std::{convert::TryFrom, fmt::Debug, time::Duration};

pub mod ipinfo;
pub mod ollama;
pub mod openweather;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenWeather,
    IpInfo,
    Ollama,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "openweather",
            ProviderId::IpInfo => "ipinfo",
            ProviderId::Ollama => "ollama",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenWeather, ProviderId::IpInfo, ProviderId::Ollama]
    }

    /// Whether calls to this provider need a credential.
    ///
    /// ipinfo answers anonymous requests under a small daily quota.
    pub fn requires_api_key(&self) -> bool {
        matches!(self, ProviderId::OpenWeather)
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "https://api.openweathermap.org",
            ProviderId::IpInfo => "https://ipinfo.io",
            ProviderId::Ollama => "http://localhost:11434",
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "openweather" => Ok(ProviderId::OpenWeather),
            "ipinfo" => Ok(ProviderId::IpInfo),
            "ollama" => Ok(ProviderId::Ollama),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: openweather, ipinfo, ollama."
            )),
        }
    }
}

/// Place-name search used by the autocomplete list.
#[async_trait]
pub trait GeoSuggest: Send + Sync + Debug {
    async fn suggest(&self, query: &str) -> ClientResult<Vec<Suggestion>>;
}

/// Current conditions and the short-range forecast for coordinates.
#[async_trait]
pub trait WeatherSource: Send + Sync + Debug {
    async fn current(&self, location: &ChosenLocation) -> ClientResult<WeatherSnapshot>;

    async fn forecast(&self, location: &ChosenLocation) -> ClientResult<Vec<ForecastEntry>>;
}

/// Coarse location of the current machine, used to seed the first lookup.
#[async_trait]
pub trait IpLocate: Send + Sync + Debug {
    async fn locate(&self) -> ClientResult<ChosenLocation>;
}

/// Clothing, health and activity advice for the given conditions.
#[async_trait]
pub trait Recommender: Send + Sync + Debug {
    async fn recommend(&self, conditions: Conditions) -> ClientResult<Recommendation>;
}

/// Shared HTTP client with the per-request timeout applied.
pub fn http_client(timeout: Duration) -> ClientResult<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("weather-core/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(ClientError::from)
}

/// Read the body and turn a non-success status into a `Network` error.
pub(crate) async fn read_body(res: Response, what: &str) -> ClientResult<String> {
    let status = res.status();
    let body = res.text().await?;

    if !status.is_success() {
        return Err(ClientError::network(format!(
            "{what} request failed with status {status}: {}",
            truncate_body(&body)
        )));
    }

    Ok(body)
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_id_as_str_roundtrip() {
        for id in ProviderId::all() {
            let s = id.as_str();
            let parsed = ProviderId::try_from(s).expect("roundtrip should succeed");
            assert_eq!(*id, parsed);
        }
    }

    #[test]
    fn unknown_provider_error() {
        let err = ProviderId::try_from("doesnotexist").unwrap_err();
        assert!(err.to_string().contains("Unknown provider"));
    }

    #[test]
    fn only_openweather_requires_a_key() {
        assert!(ProviderId::OpenWeather.requires_api_key());
        assert!(!ProviderId::IpInfo.requires_api_key());
        assert!(!ProviderId::Ollama.requires_api_key());
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let body = "ā".repeat(300);
        let cut = truncate_body(&body);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), 203);

        assert_eq!(truncate_body("short"), "short");
    }
}
