//! Alexa skill request/response envelopes.
//!
//! Field names and nesting follow the Alexa Skills Kit JSON schema; only the
//! parts this skill reads are modeled; unknown fields are ignored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub const RESPONSE_VERSION: &str = "1.0";

// =====================
// Incoming event
// =====================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventPayload {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub context: Option<Context>,
    #[serde(default)]
    pub session: Option<Session>,
    #[serde(default)]
    pub request: Request,
}

impl EventPayload {
    /// Account-linking token supplied by the platform, preferring the request
    /// context over the session copy.
    pub fn access_token(&self) -> Option<&str> {
        let from_context = self
            .context
            .as_ref()
            .and_then(|c| c.system.as_ref())
            .and_then(|s| s.user.as_ref())
            .and_then(|u| u.access_token.as_deref())
            .filter(|t| !t.trim().is_empty());
        let from_session = self
            .session
            .as_ref()
            .and_then(|s| s.user.as_ref())
            .and_then(|u| u.access_token.as_deref())
            .filter(|t| !t.trim().is_empty());
        from_context.or(from_session)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Context {
    #[serde(rename = "System", default)]
    pub system: Option<SystemState>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemState {
    #[serde(default)]
    pub application: Option<Application>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub api_endpoint: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    #[serde(default)]
    pub application_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub application: Option<Application>,
    #[serde(default)]
    pub attributes: Option<BTreeMap<String, Value>>,
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    #[serde(rename = "type", default)]
    pub request_type: String,
    #[serde(default)]
    pub request_id: String,
    /// `None` when absent or not RFC 3339.
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub intent: Option<Intent>,
    /// Only present on `SessionEndedRequest`.
    #[serde(default)]
    pub reason: Option<String>,
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(raw)) => DateTime::parse_from_rfc3339(&raw)
            .ok()
            .map(|t| t.with_timezone(&Utc)),
        _ => None,
    })
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Intent {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slots: BTreeMap<String, Slot>,
}

impl Intent {
    /// Slot value with surrounding whitespace removed; `None` when unfilled.
    pub fn slot_value(&self, name: &str) -> Option<&str> {
        self.slots
            .get(name)
            .and_then(|s| s.value.as_deref())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Slot {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
}

// =====================
// Outgoing response
// =====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePayload {
    pub version: String,
    pub response: Response,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_attributes: Option<BTreeMap<String, Value>>,
}

impl Default for ResponsePayload {
    fn default() -> Self {
        ResponsePayload {
            version: RESPONSE_VERSION.to_string(),
            response: Response::default(),
            session_attributes: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub should_end_session: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_speech: Option<OutputSpeech>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reprompt: Option<Reprompt>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card: Option<Card>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpeechType {
    PlainText,
    #[serde(rename = "SSML")]
    Ssml,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSpeech {
    #[serde(rename = "type")]
    pub speech_type: SpeechType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssml: Option<String>,
}

impl OutputSpeech {
    pub fn ssml(ssml: impl Into<String>) -> Self {
        OutputSpeech {
            speech_type: SpeechType::Ssml,
            text: None,
            ssml: Some(ssml.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reprompt {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_speech: Option<OutputSpeech>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    #[serde(rename = "type")]
    pub card_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl Card {
    /// Card prompting the user to link their Adax account in the Alexa app.
    pub fn link_account() -> Self {
        Card {
            card_type: "LinkAccount".to_string(),
            title: None,
            content: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn load_event(name: &str) -> EventPayload {
        let json = std::fs::read_to_string(format!("tests/data/{name}")).expect("fixture present");
        serde_json::from_str(&json).expect("parse event")
    }

    #[test]
    fn parses_launch_request() {
        let event = load_event("launch-request.json");
        assert_eq!(event.version, "1.0");
        assert_eq!(event.request.request_type, "LaunchRequest");
        assert_eq!(event.request.request_id, "amzn1.echo-api.request.0001");
        assert!(event.request.intent.is_none());
        assert_eq!(event.access_token(), Some("linked-token"));
    }

    #[test]
    fn parses_intent_slots() {
        let event = load_event("set-temperature-intent.json");
        let intent = event.request.intent.as_ref().expect("intent present");
        assert_eq!(intent.name, "SetTemperatureIntent");
        assert_eq!(intent.slot_value("Room"), Some("living room"));
        assert_eq!(intent.slot_value("Temperature"), Some("21.5"));
        assert_eq!(intent.slot_value("Missing"), None);
    }

    #[test]
    fn session_token_used_when_context_has_none() {
        let mut event = load_event("set-temperature-intent.json");
        event.context = None;
        assert_eq!(event.access_token(), Some("session-token"));
        event.session = None;
        assert_eq!(event.access_token(), None);
    }

    #[test]
    fn blank_context_token_falls_back_to_session() {
        let mut event = load_event("set-temperature-intent.json");
        let user = event
            .context
            .as_mut()
            .and_then(|c| c.system.as_mut())
            .and_then(|s| s.user.as_mut())
            .expect("context user");
        user.access_token = Some(String::new());
        assert_eq!(event.access_token(), Some("session-token"));
        if let Some(user) = event.session.as_mut().and_then(|s| s.user.as_mut()) {
            user.access_token = Some("  ".to_string());
        }
        assert_eq!(event.access_token(), None);
    }

    #[test]
    fn tolerates_odd_timestamp_and_unnamed_slot() {
        let event: EventPayload = serde_json::from_value(json!({
            "version": "1.0",
            "request": {
                "type": "IntentRequest",
                "requestId": "r-1",
                "timestamp": "yesterday-ish",
                "intent": {"name": "SetTemperatureIntent", "slots": {"Room": {"value": "kitchen"}}}
            }
        }))
        .expect("lenient decode");
        assert_eq!(event.request.timestamp, None);
        let intent = event.request.intent.as_ref().expect("intent present");
        assert_eq!(intent.slot_value("Room"), Some("kitchen"));

        let event: EventPayload =
            serde_json::from_value(json!({"request": {"type": "LaunchRequest", "timestamp": "2024-01-01T12:00:00Z"}}))
                .expect("decode");
        assert!(event.request.timestamp.is_some());
    }

    #[test]
    fn default_response_serializes_minimal_shape() {
        let value = serde_json::to_value(ResponsePayload::default()).expect("encode response");
        assert_eq!(value, json!({"version": "1.0", "response": {"shouldEndSession": false}}));
    }

    #[test]
    fn speech_and_reprompt_use_platform_field_names() {
        let payload = ResponsePayload {
            response: Response {
                should_end_session: false,
                output_speech: Some(OutputSpeech::ssml("<speak>Hi</speak>")),
                reprompt: Some(Reprompt {
                    output_speech: Some(OutputSpeech::ssml("<speak>Well?</speak>")),
                }),
                card: Some(Card::link_account()),
            },
            ..Default::default()
        };
        let value = serde_json::to_value(&payload).expect("encode response");
        assert_eq!(
            value,
            json!({
                "version": "1.0",
                "response": {
                    "shouldEndSession": false,
                    "outputSpeech": {"type": "SSML", "ssml": "<speak>Hi</speak>"},
                    "reprompt": {"outputSpeech": {"type": "SSML", "ssml": "<speak>Well?</speak>"}},
                    "card": {"type": "LinkAccount"}
                }
            })
        );
    }
}
