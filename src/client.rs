//! Blocking HTTP client for the Adax client API.
//!
//! - Blocking client using `ureq` (no async), one agent shared by every call.
//! - Status codes are checked here: anything but 200 is a failure and the body
//!   is never decoded as success data.
//! - No retries. Callers decide how to surface a failure.
//!
//! Authentication
//! - Requests carry a bearer token supplied by the caller. `get_access_token`
//!   performs the OAuth2 password grant for operators and tests.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use http::StatusCode;
use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use log::{debug, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::config::Credentials;
use crate::models::adax::{Content, Updates};

const TOKEN_PATH: &str = "/auth/token";
const CONTENT_PATH: &str = "/rest/v1/content";
const CONTROL_PATH: &str = "/rest/v1/control";

// =====================
// Errors
// =====================

#[derive(Debug)]
pub enum AuthError {
    /// Client id or secret not configured; no request was made.
    MissingCredentials,
    /// The token endpoint answered with something other than 200.
    Rejected { status: u16, body: String },
    Transport(String),
    Decode(String),
}

impl core::fmt::Display for AuthError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            AuthError::MissingCredentials => {
                write!(f, "client id and client secret are required to generate an access token")
            }
            AuthError::Rejected { status, body } => write!(f, "token exchange rejected: http {}: {}", status, body),
            AuthError::Transport(s) => write!(f, "token exchange transport error: {}", s),
            AuthError::Decode(s) => write!(f, "token response decode error: {}", s),
        }
    }
}

impl std::error::Error for AuthError {}

/// The client operation a failure belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Operation {
    GetStatus,
    SetTemperature,
}

impl core::fmt::Display for Operation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Operation::GetStatus => write!(f, "unable to get status"),
            Operation::SetTemperature => write!(f, "unable to set temperature"),
        }
    }
}

#[derive(Debug)]
pub enum ApiErrorKind {
    Http { status: u16, body: String },
    Transport(String),
    Decode(String),
    Encode(String),
}

impl core::fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ApiErrorKind::Http { status, .. } => write!(f, "Adax API returned an HTTP {} response", status),
            ApiErrorKind::Transport(s) => write!(f, "transport error: {}", s),
            ApiErrorKind::Decode(s) => write!(f, "decode error: {}", s),
            ApiErrorKind::Encode(s) => write!(f, "encode error: {}", s),
        }
    }
}

impl std::error::Error for ApiErrorKind {}

#[derive(Debug)]
pub struct ApiError {
    pub operation: Operation,
    pub kind: ApiErrorKind,
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match &self.kind {
            ApiErrorKind::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the API refused the bearer token.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }
}

impl core::fmt::Display for ApiError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}, error: {}", self.operation, self.kind)
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

// =====================
// Token
// =====================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

// =====================
// Client
// =====================

/// Operations the skill needs from the heater service.
pub trait HeaterApi {
    fn acquire_token(&self) -> Result<AccessToken, AuthError>;
    fn fetch_status(&self, token: &str) -> Result<Content, ApiError>;
    fn submit_updates(&self, token: &str, updates: &Updates) -> Result<(), ApiError>;
}

pub struct AdaxClient {
    agent: ureq::Agent,
    credentials: Credentials,
}

impl AdaxClient {
    pub fn new(credentials: Credentials, timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();
        Self::with_agent(ureq::Agent::new_with_config(config), credentials)
    }

    /// Use a preconfigured agent. It must not turn HTTP status codes into errors.
    pub(crate) fn with_agent(agent: ureq::Agent, credentials: Credentials) -> Self {
        AdaxClient { agent, credentials }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.credentials.base_url.trim_end_matches('/'), path)
    }

    /// OAuth2 password grant against `{base}/auth/token`. Production requests
    /// receive their token from the voice platform; this is for operators and tests.
    pub fn get_access_token(&self) -> Result<AccessToken, AuthError> {
        if !self.credentials.can_mint_token() {
            return Err(AuthError::MissingCredentials);
        }

        let url = self.url(TOKEN_PATH);
        debug!("POST {}", url);
        let mut resp = self
            .agent
            .post(&url)
            .header(ACCEPT, "application/json")
            .send_form([
                ("grant_type", "password"),
                ("username", self.credentials.client_id.as_str()),
                ("password", self.credentials.client_secret.as_str()),
            ])
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        let status = resp.status();
        let body = resp.body_mut().read_to_string();
        if status != StatusCode::OK {
            let body = body.unwrap_or_else(|_| String::from("<no body>"));
            warn!("Token exchange rejected with HTTP {}", status.as_u16());
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        let body = body.map_err(|e| AuthError::Transport(e.to_string()))?;
        parse_token_response(&body, Utc::now())
    }

    /// Status of every home, room and device on the account.
    pub fn get_status(&self, token: &str) -> Result<Content, ApiError> {
        let url = self.url(CONTENT_PATH);
        let wrap = |kind| ApiError {
            operation: Operation::GetStatus,
            kind,
        };
        let body = self.adax_request(token, &url, None).map_err(wrap)?;
        decode_json(&body).map_err(wrap)
    }

    /// Submit a batch of target-state changes.
    pub fn set_temperature(&self, token: &str, updates: &Updates) -> Result<(), ApiError> {
        let url = self.url(CONTROL_PATH);
        let wrap = |kind| ApiError {
            operation: Operation::SetTemperature,
            kind,
        };
        let payload = serde_json::to_vec(updates).map_err(|e| wrap(ApiErrorKind::Encode(e.to_string())))?;
        self.adax_request(token, &url, Some(&payload)).map_err(wrap)?;
        Ok(())
    }

    /// GET when `payload` is `None`, POST otherwise. Returns the body of a 200 response.
    fn adax_request(&self, token: &str, url: &str, payload: Option<&[u8]>) -> Result<String, ApiErrorKind> {
        let bearer = format!("Bearer {}", token);
        let result = match payload {
            None => {
                debug!("GET {}", url);
                self.agent
                    .get(url)
                    .header(AUTHORIZATION, &bearer)
                    .header(CONTENT_TYPE, "application/json")
                    .call()
            }
            Some(bytes) => {
                debug!("POST {} ({} bytes)", url, bytes.len());
                self.agent
                    .post(url)
                    .header(AUTHORIZATION, &bearer)
                    .header(CONTENT_TYPE, "application/json")
                    .send(bytes)
            }
        };

        let mut resp = result.map_err(|e| {
            warn!("Adax request to {} failed: {}", url, e);
            ApiErrorKind::Transport(e.to_string())
        })?;

        let status = resp.status();
        if status != StatusCode::OK {
            let body = resp
                .body_mut()
                .read_to_string()
                .unwrap_or_else(|_| String::from("<no body>"));
            warn!("Adax request to {} returned HTTP {}", url, status.as_u16());
            return Err(ApiErrorKind::Http {
                status: status.as_u16(),
                body,
            });
        }

        resp.body_mut()
            .read_to_string()
            .map_err(|e| ApiErrorKind::Transport(e.to_string()))
    }
}

impl HeaterApi for AdaxClient {
    fn acquire_token(&self) -> Result<AccessToken, AuthError> {
        self.get_access_token()
    }

    fn fetch_status(&self, token: &str) -> Result<Content, ApiError> {
        self.get_status(token)
    }

    fn submit_updates(&self, token: &str, updates: &Updates) -> Result<(), ApiError> {
        self.set_temperature(token, updates)
    }
}

fn decode_json<T: DeserializeOwned>(body: &str) -> Result<T, ApiErrorKind> {
    let de = &mut serde_json::Deserializer::from_str(body);
    serde_path_to_error::deserialize(de).map_err(|e| ApiErrorKind::Decode(e.to_string()))
}

fn parse_token_response(body: &str, now: DateTime<Utc>) -> Result<AccessToken, AuthError> {
    #[derive(serde::Deserialize)]
    struct R {
        access_token: String,
        #[serde(default)]
        token_type: Option<String>,
        #[serde(default)]
        expires_in: Option<i64>,
        #[serde(default)]
        refresh_token: Option<String>,
    }
    let de = &mut serde_json::Deserializer::from_str(body);
    let R {
        access_token,
        token_type,
        expires_in,
        refresh_token,
    } = serde_path_to_error::deserialize(de).map_err(|e| AuthError::Decode(e.to_string()))?;
    Ok(AccessToken {
        access_token,
        token_type: token_type.unwrap_or_else(|| "Bearer".to_string()),
        expires_at: expires_in.map(|secs| now + ChronoDuration::seconds(secs)),
        refresh_token,
    })
}
