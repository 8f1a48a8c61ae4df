use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::{
    Advice, ClientError, Conditions, Recommendation, ReplyStyle,
    error::ClientResult,
    provider::{ProviderId, Recommender, read_body},
};

pub const DEFAULT_MODEL: &str = "llama3.1";

const FIELDS: [&str; 3] = ["clothing", "health", "outdoor_activity"];

const INPUTS_PROMPT: &str =
    "Given the following inputs: Temperature (°C), Humidity (%), Wind Speed (km/h)";

const FIELDS_PROMPT: &str = "You should analyze these values and return a JSON object with three fields:
1. \"clothing\": Recommend appropriate clothing based on the temperature, humidity, and wind speed.
2. \"health\": Provide health advice considering temperature extremes, humidity levels, and wind chill effects.
3. \"outdoor_activity\": Suggest suitable outdoor activities based on the weather conditions.";

const TRANSLATE_PROMPT: &str = "Translate each json value into Māori language. \
Return every field as an object with an \"english\" and a \"maori\" string.";

const PLAIN_EXAMPLE_PROMPT: &str = "For example, if the temperature is 25°C, humidity is 60%, and wind speed is 10 km/h, the response should look like this:
{\"clothing\": \"Light jacket.\", \"health\": \"Stay hydrated and avoid prolonged exposure to direct sunlight.\", \"outdoor_activity\": \"Go for a walk or jog.\"}";

const BILINGUAL_EXAMPLE_PROMPT: &str = "For example, if the temperature is 25°C, humidity is 60%, and wind speed is 10 km/h, the response should look like this:
{\"clothing\": {\"english\": \"Light jacket.\", \"maori\": \"Kākena māmā.\"}, \"health\": {\"english\": \"Stay hydrated and avoid prolonged exposure to direct sunlight.\", \"maori\": \"Me inu wai kia noho mākona, ā, karo i te noho roa ki raro i te rā tika.\"}, \"outdoor_activity\": {\"english\": \"Go for a walk or jog.\", \"maori\": \"Haere ki te hīkoi, ki te oma rānei.\"}}";

const FORMAT_PROMPT: &str = "Do not provide any additional information beyond the JSON object. \
Use a single-line JSON format to avoid breaking the line.";

/// Chat completion against an Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaRecommender {
    base_url: String,
    model: String,
    style: ReplyStyle,
    http: Client,
}

impl OllamaRecommender {
    pub fn new(http: Client) -> Self {
        Self {
            base_url: ProviderId::Ollama.default_base_url().to_string(),
            model: DEFAULT_MODEL.to_string(),
            style: ReplyStyle::default(),
            http,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_style(mut self, style: ReplyStyle) -> Self {
        self.style = style;
        self
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    fn system(content: &str) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    fn user(content: String) -> Self {
        Self {
            role: "user".into(),
            content,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

/// The full message list sent for one recommendation.
pub fn build_messages(style: ReplyStyle, conditions: Conditions) -> Vec<ChatMessage> {
    let mut messages = vec![
        ChatMessage::system(INPUTS_PROMPT),
        ChatMessage::system(FIELDS_PROMPT),
    ];

    match style {
        ReplyStyle::Plain => messages.push(ChatMessage::system(PLAIN_EXAMPLE_PROMPT)),
        ReplyStyle::Bilingual => {
            messages.push(ChatMessage::system(TRANSLATE_PROMPT));
            messages.push(ChatMessage::system(BILINGUAL_EXAMPLE_PROMPT));
        }
    }

    messages.push(ChatMessage::system(FORMAT_PROMPT));
    messages.push(ChatMessage::user(format!(
        "temperature: {:.1}, humidity: {}, wind speed: {:.1}",
        conditions.temperature_c, conditions.humidity_pct, conditions.wind_kmh
    )));

    messages
}

/// Validate the model's reply: one JSON object, exactly the three advice keys,
/// every value in the shape `style` asks for.
pub fn parse_reply(content: &str, style: ReplyStyle) -> ClientResult<Recommendation> {
    let value: Value = serde_json::from_str(content.trim())
        .map_err(|e| ClientError::parse(format!("recommendation reply is not JSON: {e}")))?;

    let Value::Object(mut map) = value else {
        return Err(ClientError::parse("recommendation reply is not a JSON object"));
    };

    if map.len() != FIELDS.len() || !FIELDS.iter().all(|k| map.contains_key(*k)) {
        let mut keys: Vec<&str> = map.keys().map(String::as_str).collect();
        keys.sort_unstable();
        return Err(ClientError::parse(format!(
            "recommendation reply must have exactly clothing, health, outdoor_activity; got {keys:?}"
        )));
    }

    Ok(Recommendation {
        clothing: take_advice(&mut map, "clothing", style)?,
        health: take_advice(&mut map, "health", style)?,
        outdoor_activity: take_advice(&mut map, "outdoor_activity", style)?,
    })
}

fn take_advice(map: &mut Map<String, Value>, key: &str, style: ReplyStyle) -> ClientResult<Advice> {
    let value = map
        .remove(key)
        .ok_or_else(|| ClientError::parse(format!("missing '{key}'")))?;

    match (style, value) {
        (ReplyStyle::Plain, Value::String(text)) => Ok(Advice::PlainText(text)),
        (ReplyStyle::Bilingual, Value::Object(mut pair)) => {
            let mut text = |lang: &str| match pair.remove(lang) {
                Some(Value::String(s)) => Ok(s),
                _ => Err(ClientError::parse(format!("'{key}.{lang}' must be a string"))),
            };
            let english = text("english")?;
            let maori = text("maori")?;
            Ok(Advice::BilingualPair { english, maori })
        }
        (style, other) => Err(ClientError::parse(format!(
            "'{key}' has the wrong shape for {} replies: {other}",
            style.as_str()
        ))),
    }
}

#[async_trait]
impl Recommender for OllamaRecommender {
    async fn recommend(&self, conditions: Conditions) -> ClientResult<Recommendation> {
        let url = format!("{}/api/chat", self.base_url);
        debug!(%url, model = %self.model, ?conditions, "recommendation request");

        let request = ChatRequest {
            model: &self.model,
            messages: build_messages(self.style, conditions),
            stream: false,
        };

        let res = self.http.post(&url).json(&request).send().await?;
        let body = read_body(res, "recommendation").await?;
        let reply: ChatResponse = serde_json::from_str(&body)?;

        debug!(content = %reply.message.content, "recommendation raw reply");
        parse_reply(&reply.message.content, self.style)
    }
}
