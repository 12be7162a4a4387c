use crate::app_config::{AppConfig, WritePolicy};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_secs = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        let secs = raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })?;
        if secs == 0 {
            return Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(secs)
    };

    let store_url = require("SUPABASE_URL")?;
    let store_key = require("SUPABASE_SERVICE_ROLE_KEY")?;

    if !(store_url.starts_with("http://") || store_url.starts_with("https://")) {
        return Err(ConfigError::InvalidEnvVar {
            var: "SUPABASE_URL".to_string(),
            reason: format!("expected an http(s) URL, got \"{store_url}\""),
        });
    }

    let store_table = or_default("POSTSYNC_STORE_TABLE", "posts");
    let write_policy = parse_write_policy(&or_default("POSTSYNC_WRITE_POLICY", "strict"))?;
    let source_timeout_secs = parse_secs("POSTSYNC_SOURCE_TIMEOUT_SECS", "30")?;
    let request_timeout_secs = parse_secs("POSTSYNC_REQUEST_TIMEOUT_SECS", "20")?;
    let log_level = or_default("POSTSYNC_LOG_LEVEL", "info");
    let schedule = or_default("POSTSYNC_SCHEDULE", "0 0 */6 * * *");

    Ok(AppConfig {
        store_url: store_url.trim_end_matches('/').to_string(),
        store_key,
        store_table,
        write_policy,
        source_timeout_secs,
        request_timeout_secs,
        log_level,
        schedule,
    })
}

fn parse_write_policy(s: &str) -> Result<WritePolicy, ConfigError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "strict" => Ok(WritePolicy::Strict),
        "lenient" => Ok(WritePolicy::Lenient),
        other => Err(ConfigError::InvalidEnvVar {
            var: "POSTSYNC_WRITE_POLICY".to_string(),
            reason: format!("expected \"strict\" or \"lenient\", got \"{other}\""),
        }),
    }
}
