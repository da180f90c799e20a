//! Runtime configuration: flags first, then environment, then defaults.

use std::path::PathBuf;

use nerlens_core::backend::BACKEND_URL_ENV;
use nerlens_core::{Theme, DEFAULT_BACKEND_URL};

pub(crate) const DEFAULT_PORT: u16 = 3000;

/// Relay the `analyze` client talks to by default.
pub(crate) const DEFAULT_RELAY_URL: &str = "http://localhost:3000";

pub(crate) const RELAY_URL_ENV: &str = "NERLENS_RELAY_URL";

pub(crate) const REDACT_ENV: &str = "NERLENS_REDACT_BACKEND_ERRORS";

/// Raw `serve` arguments as parsed by clap.
pub(crate) struct ServeArgs {
    pub port: u16,
    pub backend_url: Option<String>,
    pub theme: Option<PathBuf>,
    pub redact_backend_errors: bool,
    pub tls_cert: Option<PathBuf>,
    pub tls_key: Option<PathBuf>,
}

/// Fully resolved server settings.
#[derive(Debug)]
pub(crate) struct ServeConfig {
    pub port: u16,
    pub backend_url: String,
    pub theme: Theme,
    pub redact_backend_errors: bool,
    #[cfg_attr(not(feature = "tls"), allow(dead_code))]
    pub tls_cert: Option<PathBuf>,
    #[cfg_attr(not(feature = "tls"), allow(dead_code))]
    pub tls_key: Option<PathBuf>,
}

impl ServeConfig {
    pub(crate) fn resolve(args: ServeArgs) -> Result<Self, String> {
        let theme = match &args.theme {
            Some(path) => {
                let source = std::fs::read_to_string(path).map_err(|e| {
                    format!("error reading theme file '{}': {}", path.display(), e)
                })?;
                Theme::from_json_str(&source)
                    .map_err(|e| format!("error in theme file '{}': {}", path.display(), e))?
            }
            None => Theme::default(),
        };

        Ok(ServeConfig {
            port: args.port,
            backend_url: resolve_backend_url(
                args.backend_url,
                std::env::var(BACKEND_URL_ENV).ok(),
            ),
            theme,
            redact_backend_errors: args.redact_backend_errors
                || env_flag(std::env::var(REDACT_ENV).ok().as_deref()),
            tls_cert: args.tls_cert,
            tls_key: args.tls_key,
        })
    }
}

/// Pick the first non-blank value: flag, environment, default.
fn first_set(flag: Option<String>, env: Option<String>, default: &str) -> String {
    flag.into_iter()
        .chain(env)
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

pub(crate) fn resolve_backend_url(flag: Option<String>, env: Option<String>) -> String {
    first_set(flag, env, DEFAULT_BACKEND_URL)
}

pub(crate) fn resolve_relay_url(flag: Option<String>, env: Option<String>) -> String {
    first_set(flag, env, DEFAULT_RELAY_URL)
}

fn env_flag(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "yes" | "on")
    )
}
