//! Everything the view renders, and the rules for updating it.
//!
//! [`Session`] wraps the [`Autocomplete`] machine and one [`Slot`] per data
//! source. It never performs I/O: user input and network results go in, and
//! the [`Command`]s that should run next come out. Every response carries the
//! key it was requested under and is dropped when that key is no longer current.

use tracing::{debug, warn};

use crate::{
    ChosenLocation, ClientError, Conditions, ForecastEntry, Recommendation, Suggestion,
    WeatherSnapshot,
    autocomplete::{Autocomplete, Direction},
};

/// Shown in the recommendation panel when the tips could not be produced.
pub const RECOMMENDATION_FALLBACK: &str =
    "Sorry, fetching weather tips from AI failed. Please try again later.";

/// Counts confirmed locations; tags every location-keyed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// One independently replaced piece of view data.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot<T> {
    Empty,
    Loading,
    Ready(T),
    Failed,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Slot::Empty
    }
}

impl<T> Slot<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Slot::Loading)
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Slot::Ready(value) => Some(value),
            _ => None,
        }
    }
}

/// What the view forwards from the keyboard and mouse.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// New contents of the search box.
    Type(String),
    Move(Direction),
    Enter,
    Hover(usize),
    HoverClear,
    Click(usize),
}

/// Side effects requested by the session.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    LocateByIp,
    FetchSuggestions {
        query: String,
    },
    FetchWeather {
        generation: Generation,
        location: ChosenLocation,
    },
    FetchForecast {
        generation: Generation,
        location: ChosenLocation,
    },
    FetchRecommendation {
        generation: Generation,
        conditions: Conditions,
    },
}

/// Results flowing back from the commands.
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    IpLocated(Result<ChosenLocation, ClientError>),
    Suggestions {
        query: String,
        result: Result<Vec<Suggestion>, ClientError>,
    },
    Weather {
        generation: Generation,
        result: Result<WeatherSnapshot, ClientError>,
    },
    Forecast {
        generation: Generation,
        result: Result<Vec<ForecastEntry>, ClientError>,
    },
    Recommendation {
        generation: Generation,
        result: Result<Recommendation, ClientError>,
    },
}

#[derive(Debug, Default)]
pub struct Session {
    search: Autocomplete,
    generation: Generation,
    weather: Slot<WeatherSnapshot>,
    forecast: Slot<Vec<ForecastEntry>>,
    recommendation: Slot<Recommendation>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands to run once, before any user input.
    pub fn start(&self) -> Vec<Command> {
        vec![Command::LocateByIp]
    }

    pub fn search(&self) -> &Autocomplete {
        &self.search
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn weather(&self) -> &Slot<WeatherSnapshot> {
        &self.weather
    }

    pub fn forecast(&self) -> &Slot<Vec<ForecastEntry>> {
        &self.forecast
    }

    pub fn recommendation(&self) -> &Slot<Recommendation> {
        &self.recommendation
    }

    pub fn handle(&mut self, input: Input) -> Vec<Command> {
        match input {
            Input::Type(text) => self
                .search
                .type_query(text)
                .map(|req| Command::FetchSuggestions { query: req.query })
                .into_iter()
                .collect(),
            Input::Move(direction) => {
                self.search.move_selection(direction);
                Vec::new()
            }
            Input::Hover(index) => {
                self.search.hover(index);
                Vec::new()
            }
            Input::HoverClear => {
                self.search.hover_clear();
                Vec::new()
            }
            Input::Enter => match self.search.confirm_selected() {
                Some(location) => self.location_chosen(location),
                None => Vec::new(),
            },
            Input::Click(index) => match self.search.suggestions().get(index).cloned() {
                Some(suggestion) => {
                    let location = self.search.confirm(suggestion);
                    self.location_chosen(location)
                }
                None => Vec::new(),
            },
        }
    }

    pub fn apply(&mut self, update: Update) -> Vec<Command> {
        match update {
            Update::IpLocated(Ok(location)) => match self.search.seed_from_ip(location) {
                Some(location) => self.location_chosen(location),
                None => Vec::new(),
            },
            Update::IpLocated(Err(err)) => {
                warn!(error = %err, "could not determine starting location");
                Vec::new()
            }
            Update::Suggestions { query, result } => {
                let list = match result {
                    Ok(list) => list,
                    Err(ClientError::EmptyResult(_)) => Vec::new(),
                    Err(err) => {
                        warn!(%query, error = %err, "suggestion lookup failed");
                        Vec::new()
                    }
                };
                self.search.suggestions_arrived(&query, list);
                Vec::new()
            }
            Update::Weather { generation, result } => {
                if self.is_stale(generation, "weather") {
                    return Vec::new();
                }
                match result {
                    Ok(snapshot) => {
                        let conditions = Conditions::from(&snapshot);
                        self.weather = Slot::Ready(snapshot);
                        self.recommendation = Slot::Loading;
                        vec![Command::FetchRecommendation {
                            generation,
                            conditions,
                        }]
                    }
                    Err(err) => {
                        warn!(error = %err, "current weather unavailable");
                        self.weather = Slot::Failed;
                        self.recommendation = Slot::Empty;
                        Vec::new()
                    }
                }
            }
            Update::Forecast { generation, result } => {
                if self.is_stale(generation, "forecast") {
                    return Vec::new();
                }
                self.forecast = match result {
                    Ok(entries) => Slot::Ready(entries),
                    Err(err) => {
                        warn!(error = %err, "forecast unavailable");
                        Slot::Failed
                    }
                };
                Vec::new()
            }
            Update::Recommendation { generation, result } => {
                if self.is_stale(generation, "recommendation") {
                    return Vec::new();
                }
                self.recommendation = match result {
                    Ok(rec) => Slot::Ready(rec),
                    Err(err) => {
                        warn!(error = %err, "weather tips unavailable");
                        Slot::Failed
                    }
                };
                Vec::new()
            }
        }
    }

    /// Supersede all location-keyed data and request it afresh.
    fn location_chosen(&mut self, location: ChosenLocation) -> Vec<Command> {
        self.generation = self.generation.next();
        debug!(location = %location.label(), generation = self.generation.0, "location chosen");

        self.weather = Slot::Loading;
        self.forecast = Slot::Loading;
        self.recommendation = Slot::Loading;

        vec![
            Command::FetchWeather {
                generation: self.generation,
                location: location.clone(),
            },
            Command::FetchForecast {
                generation: self.generation,
                location,
            },
        ]
    }

    fn is_stale(&self, generation: Generation, what: &str) -> bool {
        let stale = generation != self.generation;
        if stale {
            debug!(what, ?generation, current = ?self.generation, "dropping stale response");
        }
        stale
    }
}
