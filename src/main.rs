pub mod models {
    pub mod adax;
    pub mod alexa;
}

pub mod client;
pub mod config;
pub mod env_file;
pub mod speech;
pub mod utils;
pub mod services {
    pub mod heating;
    pub mod router;
}

#[cfg(test)]
mod test_support;

use crate::client::{AdaxClient, HeaterApi};
use crate::config::Config;
use crate::models::alexa::{EventPayload, ResponsePayload};
use crate::services::router::Skill;
use log::{error, info, warn};
use std::io::Read;
use std::path::PathBuf;

#[derive(Debug)]
enum Mode {
    /// Handle one event read from the file, or stdin when `None`.
    Handle(Option<PathBuf>),
    /// Run the password grant and print the token.
    MintToken,
}

#[derive(Debug)]
struct Args {
    env_file: Option<PathBuf>,
    mode: Mode,
}

fn parse_args() -> Result<Args, String> {
    let mut args = std::env::args_os();
    args.next(); // skip program name

    let mut env_file: Option<PathBuf> = None;
    let mut event: Option<PathBuf> = None;
    let mut mint_token = false;

    while let Some(arg) = args.next() {
        let arg = arg
            .into_string()
            .map_err(|_| "argument contains invalid UTF-8".to_string())?;
        let (flag, inline) = match arg.split_once('=') {
            Some((f, v)) if f.starts_with("--") => (f.to_string(), Some(v.to_string())),
            _ => (arg.clone(), None),
        };
        match flag.as_str() {
            "--env-file" | "--event" => {
                let value = match inline {
                    Some(v) => v,
                    None => args
                        .next()
                        .and_then(|v| v.into_string().ok())
                        .ok_or_else(|| format!("`{}` requires a path argument", flag))?,
                };
                if value.is_empty() {
                    return Err(format!("`{}` requires a path argument", flag));
                }
                let slot = if flag == "--env-file" { &mut env_file } else { &mut event };
                if slot.replace(PathBuf::from(value)).is_some() {
                    return Err(format!("`{}` provided more than once", flag));
                }
            }
            "--mint-token" => mint_token = true,
            "--" => break,
            other => return Err(format!("unrecognised argument: {}", other)),
        }
    }

    let mode = match (mint_token, event) {
        (true, Some(_)) => return Err("`--mint-token` cannot be combined with `--event`".to_string()),
        (true, None) => Mode::MintToken,
        (false, event) => Mode::Handle(event),
    };
    Ok(Args { env_file, mode })
}

fn read_event(source: Option<&PathBuf>) -> Result<String, String> {
    let raw = match source {
        Some(path) => std::fs::read_to_string(path).map_err(|e| format!("failed to read {}: {}", path.display(), e))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| format!("failed to read event from stdin: {}", e))?;
            buf
        }
    };
    Ok(raw)
}

/// Decode one event and answer it. An event that does not decode still gets
/// the default empty response.
fn answer<A: HeaterApi>(skill: &Skill<A>, raw: &str) -> ResponsePayload {
    let de = &mut serde_json::Deserializer::from_str(raw);
    match serde_path_to_error::deserialize::<_, EventPayload>(de) {
        Ok(event) => skill.handle(&event),
        Err(e) => {
            warn!("malformed event payload: {}", e);
            ResponsePayload::default()
        }
    }
}

fn run(args: &Args) -> Result<(), String> {
    // 1) Load config
    let cfg = Config::from_env().map_err(|e| format!("invalid configuration: {}", e))?;
    info!(
        "Config loaded (base_url={}, http_timeout={}s, mint_token={}, credentials={})",
        cfg.credentials.base_url,
        cfg.http_timeout.as_secs(),
        cfg.mint_token,
        if cfg.credentials.can_mint_token() { "set" } else { "-" }
    );

    // 2) Shared HTTP client, injected into the skill
    let client = AdaxClient::new(cfg.credentials.clone(), cfg.http_timeout);

    match &args.mode {
        Mode::MintToken => {
            let token = client
                .get_access_token()
                .map_err(|e| format!("token exchange failed: {}", e))?;
            info!("Access token issued (expires_at={:?})", token.expires_at);
            let out = serde_json::to_string_pretty(&token).map_err(|e| format!("encode token failed: {}", e))?;
            println!("{}", out);
        }
        Mode::Handle(source) => {
            // 3) Read one event, 4) answer it
            let raw = read_event(source.as_ref())?;
            let skill = Skill::new(client, cfg.mint_token);
            let response = answer(&skill, &raw);
            let out = serde_json::to_string(&response).map_err(|e| format!("encode response failed: {}", e))?;
            println!("{}", out);
        }
    }

    Ok(())
}

fn main() {
    let args = match parse_args() {
        Ok(args) => args,
        Err(err) => {
            eprintln!("fatal: {}", err);
            std::process::exit(1);
        }
    };

    let env_path = args.env_file.clone().or_else(|| {
        std::env::current_dir()
            .ok()
            .map(|cwd| cwd.join(".env"))
            .filter(|p| p.is_file())
    });
    let loaded_env = match env_path.as_deref().map(env_file::load).transpose() {
        Ok(applied) => applied,
        Err(err) => {
            eprintln!("fatal: {}", err);
            std::process::exit(1);
        }
    };

    // Init logging after environment so RUST_LOG from .env is respected.
    let default_filter = env_logger::Env::default().default_filter_or("info");
    env_logger::Builder::from_env(default_filter)
        .format_timestamp_secs()
        .init();

    if let (Some(path), Some(applied)) = (env_path.as_ref(), loaded_env) {
        info!("Environment loaded from {} ({} variable(s) applied)", path.display(), applied);
    }

    info!(
        "adax-heater-skill {} (git {}) starting",
        env!("CARGO_PKG_VERSION"),
        env!("BUILD_TIME_GIT_HASH")
    );
    if let Err(e) = run(&args) {
        error!("fatal: {}", e);
        std::process::exit(1);
    }
}
