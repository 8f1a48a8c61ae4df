use std::collections::VecDeque;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Select, Text};
use tracing::debug;
use weather_core::{
    ClientError, Command as SessionCommand, Config, Input, ProviderId, ReplyStyle, Services,
    Session, Units, Update,
};

use crate::{logging::LogTarget, report, tui};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "weather",
    version,
    about = "Weather lookup with location autocomplete and AI weather tips"
)]
pub struct Cli {
    /// Unit system for this run: metric or imperial.
    #[arg(long, global = true, value_parser = parse_units)]
    pub units: Option<Units>,

    /// Weather tips style for this run: plain or bilingual.
    #[arg(long, global = true, value_parser = parse_style)]
    pub style: Option<ReplyStyle>,

    /// Defaults to the interactive view.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials or endpoint for a provider.
    Configure {
        /// Provider short name: "openweather", "ipinfo" or "ollama".
        provider: String,
    },

    /// Print current weather, forecast and tips once.
    Show {
        /// Place name; the best geocoding match is used. Omit to locate by IP.
        address: Option<String>,
    },

    /// Interactive search with live suggestions.
    Tui,
}

fn parse_units(s: &str) -> Result<Units, String> {
    Units::try_from(s).map_err(|e| e.to_string())
}

fn parse_style(s: &str) -> Result<ReplyStyle, String> {
    ReplyStyle::try_from(s).map_err(|e| e.to_string())
}

impl Cli {
    pub fn log_target(&self) -> LogTarget {
        match self.command {
            None | Some(Command::Tui) => LogTarget::File,
            Some(_) => LogTarget::Stderr,
        }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Some(Command::Configure { ref provider }) => {
                let id = ProviderId::try_from(provider.as_str())?;
                configure(id)
            }
            Some(Command::Show { ref address }) => {
                let config = self.effective_config()?;
                show(&config, address.as_deref()).await
            }
            None | Some(Command::Tui) => {
                let config = self.effective_config()?;
                let services = Services::from_config(&config)?;
                tui::run(services, config.units).await
            }
        }
    }

    /// Config file, then environment, then command-line flags.
    fn effective_config(&self) -> anyhow::Result<Config> {
        let mut config = Config::load()?.with_env_overrides()?;

        if let Some(units) = self.units {
            config.units = units;
        }
        if let Some(style) = self.style {
            config.recommendation.style = style;
        }

        debug!(units = %config.units, style = config.recommendation.style.as_str(), "effective config");
        Ok(config)
    }
}

fn configure(id: ProviderId) -> anyhow::Result<()> {
    let mut config = Config::load()?;

    match id {
        ProviderId::OpenWeather | ProviderId::IpInfo => {
            let prompt = format!("{id} API key:");
            let mut password = Password::new(&prompt)
                .without_confirmation()
                .with_display_mode(PasswordDisplayMode::Masked);
            if id == ProviderId::IpInfo {
                password = password.with_help_message("Leave empty to use ipinfo anonymously");
            }

            let key = password.prompt().context("Failed to read API key")?;
            let key = key.trim();
            if key.is_empty() {
                if id.requires_api_key() {
                    bail!("An API key is required for '{id}'.");
                }
                if let Some(entry) = config.providers.get_mut(id.as_str()) {
                    entry.api_key = None;
                }
            } else {
                config.upsert_provider_api_key(id, key.to_string());
            }
        }
        ProviderId::Ollama => {
            let base_url = Text::new("Ollama base URL:")
                .with_default(config.provider_base_url(id))
                .prompt()
                .context("Failed to read base URL")?;
            let model = Text::new("Model:")
                .with_default(&config.recommendation.model)
                .prompt()
                .context("Failed to read model name")?;
            let style = Select::new(
                "Weather tips style:",
                vec![ReplyStyle::Bilingual.as_str(), ReplyStyle::Plain.as_str()],
            )
            .prompt()
            .context("Failed to read style")?;

            config.set_provider_base_url(id, base_url.trim().to_string());
            config.recommendation.model = model.trim().to_string();
            config.recommendation.style = ReplyStyle::try_from(style)?;
        }
    }

    config.save()?;
    println!(
        "Saved {id} settings to {}",
        Config::config_file_path()?.display()
    );
    Ok(())
}

/// Drive a session to completion without a terminal view and print it.
async fn show(config: &Config, address: Option<&str>) -> anyhow::Result<()> {
    let services = Services::from_config(config)?;
    let mut session = Session::new();

    let mut queue = match address {
        Some(address) => VecDeque::from(resolve_address(&services, &mut session, address).await?),
        None => VecDeque::from(session.start()),
    };

    while let Some(command) = queue.pop_front() {
        let update = services.execute(command).await;
        queue.extend(session.apply(update));
    }

    if session.search().chosen().is_none() {
        bail!(
            "Could not determine your location.\n\
             Hint: pass a place name, e.g. `weather show Auckland`."
        );
    }

    print!("{}", report::render(&session, config.units));
    Ok(())
}

/// Look `address` up and confirm the best match, returning the weather
/// fetches to run next. A failed lookup is reported as such, not as "no match".
async fn resolve_address(
    services: &Services,
    session: &mut Session,
    address: &str,
) -> anyhow::Result<Vec<SessionCommand>> {
    let commands = session.handle(Input::Type(address.to_string()));
    if commands.is_empty() {
        bail!("Search text must be at least two characters.");
    }

    for command in commands {
        let update = services.execute(command).await;
        if let Some(err) = lookup_failure(&update) {
            return Err(anyhow::Error::new(err.clone())
                .context(format!("Place lookup for '{address}' failed")));
        }
        session.apply(update);
    }

    if session.search().suggestions().is_empty() {
        bail!("No places match '{address}'.");
    }
    Ok(session.handle(Input::Click(0)))
}

/// A suggestion error other than "nothing found".
fn lookup_failure(update: &Update) -> Option<&ClientError> {
    match update {
        Update::Suggestions {
            result: Err(err), ..
        } if !matches!(err, ClientError::EmptyResult(_)) => Some(err),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use weather_core::{
        ChosenLocation, ClientResult, Conditions, ForecastEntry, GeoSuggest, IpLocate,
        Recommendation, Recommender, Suggestion, WeatherSnapshot, WeatherSource,
    };

    /// Geocoder with a fixed answer; nothing else is reachable.
    #[derive(Debug)]
    struct Geo(ClientResult<Vec<Suggestion>>);

    #[async_trait::async_trait]
    impl GeoSuggest for Geo {
        async fn suggest(&self, _: &str) -> ClientResult<Vec<Suggestion>> {
            self.0.clone()
        }
    }

    #[async_trait::async_trait]
    impl WeatherSource for Geo {
        async fn current(&self, _: &ChosenLocation) -> ClientResult<WeatherSnapshot> {
            Err(ClientError::network("offline"))
        }
        async fn forecast(&self, _: &ChosenLocation) -> ClientResult<Vec<ForecastEntry>> {
            Err(ClientError::network("offline"))
        }
    }

    #[async_trait::async_trait]
    impl IpLocate for Geo {
        async fn locate(&self) -> ClientResult<ChosenLocation> {
            Err(ClientError::network("offline"))
        }
    }

    #[async_trait::async_trait]
    impl Recommender for Geo {
        async fn recommend(&self, _: Conditions) -> ClientResult<Recommendation> {
            Err(ClientError::network("offline"))
        }
    }

    fn services(answer: ClientResult<Vec<Suggestion>>) -> Services {
        let geo = Arc::new(Geo(answer));
        Services {
            geo: geo.clone(),
            weather: geo.clone(),
            ip: geo.clone(),
            recommender: geo,
        }
    }

    #[tokio::test]
    async fn lookup_failure_is_not_reported_as_no_match() {
        let services = services(Err(ClientError::network("request timed out")));
        let mut session = Session::new();

        let err = resolve_address(&services, &mut session, "Auckland")
            .await
            .unwrap_err();
        let msg = format!("{err:#}");

        assert!(msg.contains("Place lookup for 'Auckland' failed"));
        assert!(msg.contains("request timed out"));
        assert!(!msg.contains("No places match"));
    }

    #[tokio::test]
    async fn empty_result_reads_as_no_match() {
        let services = services(Err(ClientError::empty("no places")));
        let mut session = Session::new();

        let err = resolve_address(&services, &mut session, "Zzqx")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "No places match 'Zzqx'.");
    }

    #[tokio::test]
    async fn best_match_is_confirmed() {
        let services = services(Ok(vec![Suggestion {
            name: "Auckland".into(),
            country: "NZ".into(),
            lat: -36.85,
            lon: 174.76,
        }]));
        let mut session = Session::new();

        let commands = resolve_address(&services, &mut session, "Auck").await.unwrap();

        assert_eq!(commands.len(), 2);
        assert_eq!(session.search().query(), "Auckland, NZ");
    }
}
