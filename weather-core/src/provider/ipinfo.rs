use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{
    ChosenLocation, ClientError,
    error::ClientResult,
    provider::{IpLocate, ProviderId, read_body},
};

/// ipinfo.io lookup of the caller's public address.
#[derive(Debug, Clone)]
pub struct IpInfoClient {
    token: Option<String>,
    base_url: String,
    http: Client,
}

impl IpInfoClient {
    pub fn new(token: Option<String>, http: Client) -> Self {
        Self {
            token,
            base_url: ProviderId::IpInfo.default_base_url().to_string(),
            http,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[derive(Debug, Deserialize)]
struct IpInfoResponse {
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    loc: Option<String>,
}

#[async_trait]
impl IpLocate for IpInfoClient {
    async fn locate(&self) -> ClientResult<ChosenLocation> {
        let url = format!("{}/json", self.base_url);
        debug!(%url, "ipinfo request");

        let mut req = self.http.get(&url);
        if let Some(token) = &self.token {
            req = req.query(&[("token", token.as_str())]);
        }
        let res = req.send().await?;

        let body = read_body(res, "ip geolocation").await?;
        let parsed: IpInfoResponse = serde_json::from_str(&body)?;

        let city = parsed
            .city
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ClientError::empty("ip geolocation returned no city"))?;
        let loc = parsed
            .loc
            .ok_or_else(|| ClientError::empty("ip geolocation returned no coordinates"))?;
        let (lat, lon) = parse_loc(&loc)?;

        Ok(ChosenLocation {
            name: city,
            country: parsed.country.unwrap_or_default(),
            lat,
            lon,
        })
    }
}

/// Split ipinfo's `"lat,lon"` field.
fn parse_loc(loc: &str) -> ClientResult<(f64, f64)> {
    let (lat, lon) = loc
        .split_once(',')
        .ok_or_else(|| ClientError::parse(format!("malformed loc '{loc}'")))?;

    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|_| ClientError::parse(format!("malformed latitude in '{loc}'")))?;
    let lon: f64 = lon
        .trim()
        .parse()
        .map_err(|_| ClientError::parse(format!("malformed longitude in '{loc}'")))?;

    Ok((lat, lon))
}
