//! Spoken scripts and response builders.

use crate::models::alexa::{Card, OutputSpeech, Reprompt, Response, ResponsePayload};

pub const LAUNCH: &str = "Welcome to Adax heating. You can set the temperature in a room, \
    turn the heating on or off, or ask how warm a room is.";
pub const LAUNCH_REPROMPT: &str = "Which room would you like to change?";
pub const HELP: &str = "Try saying: set the living room to twenty one degrees, \
    turn off the heating in the kitchen, or what is the temperature in the bedroom.";
pub const HELP_REPROMPT: &str = "What would you like to do?";
pub const GOODBYE: &str = "Goodbye.";
pub const FALLBACK: &str = "Sorry, I can't help with that. You can ask me to set the temperature in a room.";
pub const LINK_ACCOUNT: &str = "Please link your Adax account in the Alexa app so I can reach your heaters.";
pub const ACCOUNT_EXPIRED: &str = "Your Adax account link has expired. Please link it again in the Alexa app.";
pub const SIGN_IN_FAILED: &str = "I couldn't sign in to your Adax account. Please try again later.";
pub const SERVICE_UNAVAILABLE: &str = "I couldn't reach your heaters right now. Please try again later.";

/// Wrap plain text in a `<speak>` element, escaping markup characters.
pub fn ssml(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 15);
    out.push_str("<speak>");
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out.push_str("</speak>");
    out
}

/// "21" for whole degrees, "21.5" otherwise.
pub fn format_celsius(celsius: f64) -> String {
    let rounded = (celsius * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{:.0}", rounded)
    } else {
        format!("{:.1}", rounded)
    }
}

/// Speak and keep the session open, waiting for an answer.
pub fn ask(speech: &str, reprompt: &str) -> ResponsePayload {
    ResponsePayload {
        response: Response {
            should_end_session: false,
            output_speech: Some(OutputSpeech::ssml(ssml(speech))),
            reprompt: Some(Reprompt {
                output_speech: Some(OutputSpeech::ssml(ssml(reprompt))),
            }),
            card: None,
        },
        ..Default::default()
    }
}

/// Speak and end the session.
pub fn tell(speech: &str) -> ResponsePayload {
    ResponsePayload {
        response: Response {
            should_end_session: true,
            output_speech: Some(OutputSpeech::ssml(ssml(speech))),
            reprompt: None,
            card: None,
        },
        ..Default::default()
    }
}

pub fn link_account(speech: &str) -> ResponsePayload {
    let mut payload = tell(speech);
    payload.response.card = Some(Card::link_account());
    payload
}
