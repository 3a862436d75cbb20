use crate::app_config::{AppConfig, Environment, MetaConfig, StoreConfig};
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
/// Decoupled from the process environment so tests can drive it from a
/// `HashMap` without `set_var`/`remove_var`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    // Blank values count as unset so an empty `META_ACCESS_TOKEN=` line in
    // `.env` still takes the fail-fast path at dispatch time.
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let store_url = require("TACT_STORE_URL")?;
    let store_key = require("TACT_STORE_KEY")?;

    let env = parse_environment(&or_default("TACT_ENV", "development"));
    let bind_addr = parse_addr("TACT_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("TACT_LOG_LEVEL", "info");

    let meta = MetaConfig {
        pixel_id: optional("META_PIXEL_ID"),
        access_token: optional("META_ACCESS_TOKEN"),
        test_event_code: optional("META_TEST_EVENT_CODE"),
        api_version: or_default("META_API_VERSION", "v18.0"),
        request_timeout_secs: parse_u64("META_REQUEST_TIMEOUT_SECS", "10")?,
        max_retries: parse_u32("META_MAX_RETRIES", "0")?,
    };

    let store = StoreConfig {
        base_url: store_url,
        api_key: store_key,
        request_timeout_secs: parse_u64("TACT_STORE_TIMEOUT_SECS", "15")?,
    };

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        meta,
        store,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::env::VarError;

    use super::*;

    fn lookup_from_map<'a>(
        map: &'a HashMap<&'a str, &'a str>,
    ) -> impl Fn(&str) -> Result<String, VarError> + 'a {
        move |key| {
            map.get(key)
                .map(|v| (*v).to_string())
                .ok_or(VarError::NotPresent)
        }
    }

    /// Returns a map with all required env vars populated with valid defaults.
    fn full_env<'a>() -> HashMap<&'a str, &'a str> {
        let mut m = HashMap::new();
        m.insert("TACT_STORE_URL", "https://store.example.com/rest/v1");
        m.insert("TACT_STORE_KEY", "anon-key");
        m
    }

    #[test]
    fn parse_environment_production() {
        assert_eq!(parse_environment("production"), Environment::Production);
    }

    #[test]
    fn parse_environment_unknown_defaults_to_development() {
        assert_eq!(parse_environment("staging"), Environment::Development);
    }

    #[test]
    fn build_app_config_fails_without_store_url() {
        let map: HashMap<&str, &str> = HashMap::new();
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "TACT_STORE_URL"),
            "expected MissingEnvVar(TACT_STORE_URL), got: {result:?}"
        );
    }

    #[test]
    fn build_app_config_fails_without_store_key() {
        let mut map: HashMap<&str, &str> = HashMap::new();
        map.insert("TACT_STORE_URL", "https://store.example.com");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "TACT_STORE_KEY"),
            "expected MissingEnvVar(TACT_STORE_KEY), got: {result:?}"
        );
    }

    #[test]
    fn build_app_config_fails_with_invalid_bind_addr() {
        let mut map = full_env();
        map.insert("TACT_BIND_ADDR", "not-a-socket-addr");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "TACT_BIND_ADDR"),
            "expected InvalidEnvVar(TACT_BIND_ADDR), got: {result:?}"
        );
    }

    #[test]
    fn build_app_config_succeeds_with_defaults() {
        let map = full_env();
        let cfg = build_app_config(lookup_from_map(&map)).expect("config");
        assert_eq!(cfg.env, Environment::Development);
        assert_eq!(cfg.bind_addr.to_string(), "0.0.0.0:3000");
        assert_eq!(cfg.log_level, "info");
        assert!(cfg.meta.pixel_id.is_none());
        assert!(cfg.meta.access_token.is_none());
        assert!(cfg.meta.test_event_code.is_none());
        assert_eq!(cfg.meta.api_version, "v18.0");
        assert_eq!(cfg.meta.request_timeout_secs, 10);
        assert_eq!(cfg.meta.max_retries, 0);
        assert_eq!(cfg.store.request_timeout_secs, 15);
    }

    #[test]
    fn blank_access_token_is_treated_as_missing() {
        let mut map = full_env();
        map.insert("META_ACCESS_TOKEN", "   ");
        map.insert("META_PIXEL_ID", "123456");
        let cfg = build_app_config(lookup_from_map(&map)).expect("config");
        assert!(cfg.meta.access_token.is_none());
        assert_eq!(cfg.meta.pixel_id.as_deref(), Some("123456"));
    }

    #[test]
    fn meta_overrides_are_applied() {
        let mut map = full_env();
        map.insert("META_ACCESS_TOKEN", "secret");
        map.insert("META_TEST_EVENT_CODE", "TEST123");
        map.insert("META_API_VERSION", "v19.0");
        map.insert("META_REQUEST_TIMEOUT_SECS", "3");
        map.insert("META_MAX_RETRIES", "2");
        let cfg = build_app_config(lookup_from_map(&map)).expect("config");
        assert_eq!(cfg.meta.access_token.as_deref(), Some("secret"));
        assert_eq!(cfg.meta.test_event_code.as_deref(), Some("TEST123"));
        assert_eq!(cfg.meta.api_version, "v19.0");
        assert_eq!(cfg.meta.request_timeout_secs, 3);
        assert_eq!(cfg.meta.max_retries, 2);
    }

    #[test]
    fn invalid_meta_timeout_is_rejected() {
        let mut map = full_env();
        map.insert("META_REQUEST_TIMEOUT_SECS", "soon");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "META_REQUEST_TIMEOUT_SECS"),
            "expected InvalidEnvVar(META_REQUEST_TIMEOUT_SECS), got: {result:?}"
        );
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let mut map = full_env();
        map.insert("META_ACCESS_TOKEN", "super-secret-token");
        let cfg = build_app_config(lookup_from_map(&map)).expect("config");
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("super-secret-token"));
        assert!(!rendered.contains("anon-key"));
        assert!(rendered.contains("[redacted]"));
    }
}
