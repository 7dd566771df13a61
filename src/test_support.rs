//! Test doubles: a client pointed at a local mock server and an in-memory `HeaterApi`.

use crate::client::{AccessToken, AdaxClient, ApiError, ApiErrorKind, AuthError, HeaterApi, Operation};
use crate::config::Credentials;
use crate::models::adax::{Content, Updates};
use std::cell::RefCell;
use std::time::Duration;

/// Client for a local mock server, bypassing any proxy configured in the environment.
pub fn local_client(base_url: &str, id: &str, secret: &str) -> AdaxClient {
    let config = ureq::Agent::config_builder()
        .timeout_global(Some(Duration::from_secs(3)))
        .http_status_as_error(false)
        .proxy(None)
        .build();
    AdaxClient::with_agent(
        ureq::Agent::new_with_config(config),
        Credentials {
            client_id: id.to_string(),
            client_secret: secret.to_string(),
            base_url: base_url.to_string(),
        },
    )
}

/// In-memory heater service backed by `tests/data/content.json`.
pub struct FakeApi {
    pub content: Content,
    pub submitted: RefCell<Vec<Updates>>,
    pub tokens_seen: RefCell<Vec<String>>,
    /// Token handed out by `acquire_token`; `None` means credentials are missing.
    pub mint: Option<String>,
    pub status_error: Option<u16>,
    pub submit_error: Option<u16>,
}

impl FakeApi {
    pub fn new() -> Self {
        let json = std::fs::read_to_string("tests/data/content.json").expect("fixture present");
        FakeApi {
            content: serde_json::from_str(&json).expect("parse content"),
            submitted: RefCell::new(Vec::new()),
            tokens_seen: RefCell::new(Vec::new()),
            mint: None,
            status_error: None,
            submit_error: None,
        }
    }

    fn http_error(operation: Operation, status: u16) -> ApiError {
        ApiError {
            operation,
            kind: ApiErrorKind::Http {
                status,
                body: String::new(),
            },
        }
    }
}

impl HeaterApi for FakeApi {
    fn acquire_token(&self) -> Result<AccessToken, AuthError> {
        match &self.mint {
            Some(token) => Ok(AccessToken {
                access_token: token.clone(),
                token_type: "Bearer".to_string(),
                expires_at: None,
                refresh_token: None,
            }),
            None => Err(AuthError::MissingCredentials),
        }
    }

    fn fetch_status(&self, token: &str) -> Result<Content, ApiError> {
        self.tokens_seen.borrow_mut().push(token.to_string());
        match self.status_error {
            Some(status) => Err(Self::http_error(Operation::GetStatus, status)),
            None => Ok(self.content.clone()),
        }
    }

    fn submit_updates(&self, token: &str, updates: &Updates) -> Result<(), ApiError> {
        self.tokens_seen.borrow_mut().push(token.to_string());
        if let Some(status) = self.submit_error {
            return Err(Self::http_error(Operation::SetTemperature, status));
        }
        self.submitted.borrow_mut().push(updates.clone());
        Ok(())
    }
}
