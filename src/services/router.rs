//! Request routing: one event in, one well-formed response out.
//!
//! Dispatch is an exact, case-sensitive match on the request type and then on
//! the intent name. Every failure below the router turns into spoken output.

use crate::client::{AuthError, HeaterApi};
use crate::models::alexa::{EventPayload, Intent, Response, ResponsePayload};
use crate::services::heating::{self, HeatingChange, MAX_CELSIUS, MIN_CELSIUS};
use crate::speech::{self, format_celsius};
use crate::utils::{ResolveError, Target};
use log::{error, info, warn};

pub const ROOM_SLOT: &str = "Room";
pub const TEMPERATURE_SLOT: &str = "Temperature";

const ROOM_PROMPT: &str = "Which room would you like to change?";

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RequestKind {
    Launch,
    Intent,
    SessionEnded,
    /// No handler is registered for this request type.
    Unrecognized,
}

impl RequestKind {
    pub fn from_type(request_type: &str) -> Self {
        match request_type {
            "LaunchRequest" => RequestKind::Launch,
            "IntentRequest" => RequestKind::Intent,
            "SessionEndedRequest" => RequestKind::SessionEnded,
            _ => RequestKind::Unrecognized,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum IntentKind {
    SetTemperature,
    TurnOnHeating,
    TurnOffHeating,
    GetTemperature,
    Help,
    Stop,
    Unrecognized,
}

impl IntentKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "SetTemperatureIntent" => IntentKind::SetTemperature,
            "TurnOnHeatingIntent" => IntentKind::TurnOnHeating,
            "TurnOffHeatingIntent" => IntentKind::TurnOffHeating,
            "GetTemperatureIntent" => IntentKind::GetTemperature,
            "AMAZON.HelpIntent" => IntentKind::Help,
            "AMAZON.StopIntent" | "AMAZON.CancelIntent" => IntentKind::Stop,
            _ => IntentKind::Unrecognized,
        }
    }
}

#[derive(Debug)]
enum TokenError {
    /// The event carries no account-linking token and minting is disabled.
    Unlinked,
    Auth(AuthError),
}

/// Voice skill entry point. Holds the heater API handle for the life of the process.
pub struct Skill<A> {
    api: A,
    mint_token: bool,
}

impl<A: HeaterApi> Skill<A> {
    pub fn new(api: A, mint_token: bool) -> Self {
        Skill { api, mint_token }
    }

    pub fn handle(&self, event: &EventPayload) -> ResponsePayload {
        let request = &event.request;
        let kind = RequestKind::from_type(&request.request_type);
        info!(
            "Dispatching {} request {} as {:?}",
            request.request_type, request.request_id, kind
        );

        let mut payload = match kind {
            RequestKind::Launch => speech::ask(speech::LAUNCH, speech::LAUNCH_REPROMPT),
            RequestKind::Intent => self.handle_intent(event),
            RequestKind::SessionEnded => {
                info!(
                    "Session ended: {}",
                    request.reason.as_deref().unwrap_or("no reason given")
                );
                ResponsePayload {
                    response: Response {
                        should_end_session: true,
                        ..Default::default()
                    },
                    ..Default::default()
                }
            }
            // Intentional fallthrough: acknowledge with an empty response
            // rather than fail, until a handler exists for this type.
            RequestKind::Unrecognized => return ResponsePayload::default(),
        };

        if !payload.response.should_end_session {
            payload.session_attributes = event
                .session
                .as_ref()
                .and_then(|s| s.attributes.clone())
                .filter(|a| !a.is_empty());
        }
        payload
    }

    fn handle_intent(&self, event: &EventPayload) -> ResponsePayload {
        let Some(intent) = event.request.intent.as_ref() else {
            warn!("IntentRequest {} without an intent", event.request.request_id);
            return speech::ask(speech::FALLBACK, speech::HELP_REPROMPT);
        };

        let kind = IntentKind::from_name(&intent.name);
        info!("Intent {} dispatched as {:?}", intent.name, kind);
        match kind {
            IntentKind::SetTemperature => self.set_temperature(event, intent),
            IntentKind::TurnOnHeating => self.change_heating(event, intent, HeatingChange::Heating(true)),
            IntentKind::TurnOffHeating => self.change_heating(event, intent, HeatingChange::Heating(false)),
            IntentKind::GetTemperature => self.report_temperature(event, intent),
            IntentKind::Help => speech::ask(speech::HELP, speech::HELP_REPROMPT),
            IntentKind::Stop => speech::tell(speech::GOODBYE),
            IntentKind::Unrecognized => speech::ask(speech::FALLBACK, speech::HELP_REPROMPT),
        }
    }

    fn set_temperature(&self, event: &EventPayload, intent: &Intent) -> ResponsePayload {
        let range = format!(
            "I can set a temperature between {} and {} degrees. What temperature would you like?",
            format_celsius(MIN_CELSIUS),
            format_celsius(MAX_CELSIUS)
        );
        let Some(raw) = intent.slot_value(TEMPERATURE_SLOT) else {
            return speech::ask("What temperature would you like?", &range);
        };
        let Some(target) = heating::parse_celsius(raw) else {
            info!("Rejected temperature slot value {:?}", raw);
            return speech::ask(&range, "What temperature would you like?");
        };
        self.change_heating(event, intent, HeatingChange::SetTarget(target))
    }

    fn change_heating(&self, event: &EventPayload, intent: &Intent, change: HeatingChange) -> ResponsePayload {
        let token = match self.access_token(event) {
            Ok(t) => t,
            Err(e) => return token_failure(e),
        };
        match heating::apply_change(&self.api, &token, intent.slot_value(ROOM_SLOT), change) {
            Ok(target) => speech::tell(&confirmation(&target, change)),
            Err(e) => resolve_failure(e),
        }
    }

    fn report_temperature(&self, event: &EventPayload, intent: &Intent) -> ResponsePayload {
        let Some(name) = intent.slot_value(ROOM_SLOT) else {
            return speech::ask("Which room would you like to check?", "Which room?");
        };
        let token = match self.access_token(event) {
            Ok(t) => t,
            Err(e) => return token_failure(e),
        };
        let room = match heating::room_status(&self.api, &token, name) {
            Ok(room) => room,
            Err(e) => return resolve_failure(e),
        };

        let mut text = match room.temperature {
            Some(t) => format!("It's {} degrees in the {}.", format_celsius(t as f64 / 100.0), room.name),
            None => format!("I don't have a temperature reading for the {}.", room.name),
        };
        match (room.heating_enabled, room.target_temperature) {
            (true, Some(target)) => text.push_str(&format!(
                " The heating is set to {} degrees.",
                format_celsius(target.as_celsius())
            )),
            (true, None) => text.push_str(" The heating is on."),
            (false, _) => text.push_str(" The heating is off."),
        }
        speech::tell(&text)
    }

    /// Token from the platform, or a freshly minted one when allowed.
    fn access_token(&self, event: &EventPayload) -> Result<String, TokenError> {
        if let Some(token) = event.access_token() {
            return Ok(token.to_string());
        }
        if !self.mint_token {
            return Err(TokenError::Unlinked);
        }
        info!("Event carries no access token; minting one with configured credentials");
        self.api
            .acquire_token()
            .map(|t| t.access_token)
            .map_err(TokenError::Auth)
    }
}

fn confirmation(target: &Target, change: HeatingChange) -> String {
    let place = match target {
        Target::Home { name, .. } => format!("all of {}", name),
        Target::Room { name, .. } | Target::Device { name, .. } => format!("the {}", name),
    };
    match change {
        HeatingChange::SetTarget(t) => format!("Okay, setting {} to {} degrees.", place, format_celsius(t.as_celsius())),
        HeatingChange::Heating(true) => format!("Okay, turning the heating on in {}.", place),
        HeatingChange::Heating(false) => format!("Okay, turning the heating off in {}.", place),
    }
}

fn token_failure(err: TokenError) -> ResponsePayload {
    match err {
        TokenError::Unlinked => speech::link_account(speech::LINK_ACCOUNT),
        TokenError::Auth(e) => {
            error!("Unable to obtain access token: {}", e);
            speech::tell(speech::SIGN_IN_FAILED)
        }
    }
}

fn resolve_failure(err: ResolveError) -> ResponsePayload {
    match err {
        ResolveError::NotFound(name) => speech::ask(
            &format!("I couldn't find a room called {}. {}", name, ROOM_PROMPT),
            ROOM_PROMPT,
        ),
        ResolveError::NoSingleHome(n) => {
            info!("No room given and account has {} home(s)", n);
            speech::ask(ROOM_PROMPT, ROOM_PROMPT)
        }
        ResolveError::Api(e) if e.is_unauthorized() => {
            warn!("{}", e);
            speech::link_account(speech::ACCOUNT_EXPIRED)
        }
        ResolveError::Api(e) => {
            error!("{}", e);
            speech::tell(speech::SERVICE_UNAVAILABLE)
        }
    }
}
