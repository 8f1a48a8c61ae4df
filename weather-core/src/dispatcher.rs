use std::sync::Arc;

use anyhow::Context;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::{
    Config,
    provider::{
        GeoSuggest, IpLocate, ProviderId, Recommender, WeatherSource, http_client,
        ipinfo::IpInfoClient, ollama::OllamaRecommender, openweather::OpenWeatherClient,
    },
    session::{Command, Update},
};

/// The four collaborators a session talks to.
#[derive(Debug, Clone)]
pub struct Services {
    pub geo: Arc<dyn GeoSuggest>,
    pub weather: Arc<dyn WeatherSource>,
    pub ip: Arc<dyn IpLocate>,
    pub recommender: Arc<dyn Recommender>,
}

impl Services {
    /// Build the HTTP clients described by `config`.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let api_key = config.require_api_key(ProviderId::OpenWeather)?;
        let http = http_client(config.timeout()).context("Failed to build HTTP client")?;

        let openweather = Arc::new(
            OpenWeatherClient::new(api_key.to_owned(), http.clone())
                .with_base_url(config.provider_base_url(ProviderId::OpenWeather))
                .with_units(config.units)
                .with_limit(config.suggestion_limit),
        );

        let ip = IpInfoClient::new(
            config.provider_api_key(ProviderId::IpInfo).map(str::to_owned),
            http.clone(),
        )
        .with_base_url(config.provider_base_url(ProviderId::IpInfo));

        let recommender = OllamaRecommender::new(http)
            .with_base_url(config.provider_base_url(ProviderId::Ollama))
            .with_model(config.recommendation.model.clone())
            .with_style(config.recommendation.style);

        Ok(Self {
            geo: openweather.clone(),
            weather: openweather,
            ip: Arc::new(ip),
            recommender: Arc::new(recommender),
        })
    }

    /// Run one command to completion and wrap its outcome, tagged with the
    /// key the command was issued under.
    pub async fn execute(&self, command: Command) -> Update {
        match command {
            Command::LocateByIp => Update::IpLocated(self.ip.locate().await),
            Command::FetchSuggestions { query } => {
                let result = self.geo.suggest(&query).await;
                Update::Suggestions { query, result }
            }
            Command::FetchWeather {
                generation,
                location,
            } => Update::Weather {
                generation,
                result: self.weather.current(&location).await,
            },
            Command::FetchForecast {
                generation,
                location,
            } => Update::Forecast {
                generation,
                result: self.weather.forecast(&location).await,
            },
            Command::FetchRecommendation {
                generation,
                conditions,
            } => Update::Recommendation {
                generation,
                result: self.recommender.recommend(conditions).await,
            },
        }
    }
}

/// Runs commands in the background and posts their updates to the UI loop.
///
/// In-flight commands are never cancelled; the session discards whatever
/// arrives for a superseded key.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    services: Services,
    updates: UnboundedSender<Update>,
}

impl Dispatcher {
    pub fn new(services: Services, updates: UnboundedSender<Update>) -> Self {
        Self { services, updates }
    }

    pub fn dispatch(&self, command: Command) {
        debug!(?command, "dispatching");
        let services = self.services.clone();
        let updates = self.updates.clone();

        tokio::spawn(async move {
            let update = services.execute(command).await;
            if updates.send(update).is_err() {
                warn!("update receiver dropped; discarding result");
            }
        });
    }

    pub fn dispatch_all(&self, commands: impl IntoIterator<Item = Command>) {
        for command in commands {
            self.dispatch(command);
        }
    }
}
