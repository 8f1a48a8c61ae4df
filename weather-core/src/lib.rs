//! Core library for the `weather` app.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - HTTP clients for geocoding, weather, IP geolocation and AI weather tips
//! - The location autocomplete state machine
//! - The session that fences stale responses and the dispatcher that runs requests
//!
//! It is used by `weather-cli`, but the session can drive any front-end.

pub mod autocomplete;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod model;
pub mod provider;
pub mod session;

pub use autocomplete::{Autocomplete, Direction, Phase};
pub use config::{Config, ProviderConfig, RecommendationConfig};
pub use dispatcher::{Dispatcher, Services};
pub use error::{ClientError, ClientResult};
pub use model::{
    Advice, ChosenLocation, Conditions, ForecastEntry, Recommendation, ReplyStyle, Suggestion,
    Units, WeatherSnapshot,
};
pub use provider::{GeoSuggest, IpLocate, ProviderId, Recommender, WeatherSource};
pub use session::{Command, Generation, Input, RECOMMENDATION_FALLBACK, Session, Slot, Update};
