//! Runtime configuration read from the process environment.
//! Defaults target the public Adax client API.

use std::fmt;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api-1.adax.no/client-api";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed into the expected type.
    Invalid { key: &'static str, value: String, expected: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Invalid { key, value, expected } => {
                write!(f, "{} has invalid value {:?}: expected {}", key, value, expected)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Adax API account credentials. Both fields must be non-empty to mint a token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub base_url: String,
}

impl Credentials {
    pub fn can_mint_token(&self) -> bool {
        !self.client_id.trim().is_empty() && !self.client_secret.trim().is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub credentials: Credentials,
    /// Timeout applied to every request made by the shared HTTP agent.
    pub http_timeout: Duration,
    /// Mint a token with the configured credentials when an event arrives
    /// without an account-linking token.
    pub mint_token: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let client_id = lookup("ADAX_CLIENT_ID").unwrap_or_default();
        let client_secret = lookup("ADAX_CLIENT_SECRET").unwrap_or_default();

        let base_url = match lookup("ADAX_BASE_URL") {
            None => DEFAULT_BASE_URL.to_string(),
            Some(v) if v.trim().is_empty() => {
                return Err(ConfigError::Invalid {
                    key: "ADAX_BASE_URL",
                    value: v,
                    expected: "a non-empty URL",
                });
            }
            Some(v) => v.trim().trim_end_matches('/').to_string(),
        };

        let timeout_secs = match lookup("ADAX_HTTP_TIMEOUT_SECS") {
            None => DEFAULT_HTTP_TIMEOUT_SECS,
            Some(v) => match v.trim().parse::<u64>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "ADAX_HTTP_TIMEOUT_SECS",
                        value: v,
                        expected: "a positive number of seconds",
                    });
                }
            },
        };

        let mint_token = match lookup("ADAX_MINT_TOKEN") {
            None => false,
            Some(v) => parse_bool(&v).ok_or(ConfigError::Invalid {
                key: "ADAX_MINT_TOKEN",
                value: v.clone(),
                expected: "a boolean (true/false/1/0)",
            })?,
        };

        Ok(Config {
            credentials: Credentials {
                client_id,
                client_secret,
                base_url,
            },
            http_timeout: Duration::from_secs(timeout_secs),
            mint_token,
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = config_from(&[]).expect("defaults parse");
        assert_eq!(cfg.credentials.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.http_timeout, Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS));
        assert!(!cfg.mint_token);
        assert!(!cfg.credentials.can_mint_token());
    }

    #[test]
    fn reads_credentials_and_overrides() {
        let cfg = config_from(&[
            ("ADAX_CLIENT_ID", "12345"),
            ("ADAX_CLIENT_SECRET", "s3cret"),
            ("ADAX_BASE_URL", "http://localhost:8080/client-api/"),
            ("ADAX_HTTP_TIMEOUT_SECS", "5"),
            ("ADAX_MINT_TOKEN", "true"),
        ])
        .expect("config parses");
        assert_eq!(cfg.credentials.client_id, "12345");
        assert_eq!(cfg.credentials.base_url, "http://localhost:8080/client-api");
        assert_eq!(cfg.http_timeout, Duration::from_secs(5));
        assert!(cfg.mint_token);
        assert!(cfg.credentials.can_mint_token());
    }

    #[test]
    fn rejects_type_mismatches() {
        let err = config_from(&[("ADAX_HTTP_TIMEOUT_SECS", "soon")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "ADAX_HTTP_TIMEOUT_SECS", .. }));

        let err = config_from(&[("ADAX_MINT_TOKEN", "maybe")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "ADAX_MINT_TOKEN", .. }));

        let err = config_from(&[("ADAX_BASE_URL", "  ")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "ADAX_BASE_URL", .. }));
    }

    #[test]
    fn debug_output_hides_secret() {
        let cfg = config_from(&[("ADAX_CLIENT_ID", "id"), ("ADAX_CLIENT_SECRET", "hunter2")]).expect("config parses");
        let rendered = format!("{:?}", cfg);
        assert!(!rendered.contains("hunter2"));
    }
}
