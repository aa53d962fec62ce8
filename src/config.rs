use std::env;

use crate::errors::AppError;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_AUTH_HEADER: &str = "x-user-id";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_STATIC_DIR: &str = "static";

/// Runtime configuration, read from the environment (and `.env` in development).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub openai_api_key: String,
    pub openai_base_url: Option<String>,
    pub completion_model: String,
    /// Base URL the system prompt document is fetched from.
    pub public_base_url: String,
    pub port: u16,
    /// Header carrying the user id asserted by the auth proxy.
    pub auth_header: String,
    pub static_dir: String,
    pub cors_origin: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &str| var(name).ok_or_else(|| AppError::missing_config(name));

        let port = var("PORT").and_then(|p| p.parse().ok()).unwrap_or(DEFAULT_PORT);

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            database_max_connections: var("DATABASE_MAX_CONNECTIONS")
                .and_then(|n| n.parse().ok())
                .unwrap_or(DEFAULT_MAX_CONNECTIONS),
            openai_api_key: required("OPENAI_API_KEY")?,
            openai_base_url: var("OPENAI_BASE_URL"),
            completion_model: var("COMPLETION_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            public_base_url: var("PUBLIC_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| format!("http://localhost:{port}")),
            port,
            auth_header: var("AUTH_HEADER")
                .map(|h| h.to_ascii_lowercase())
                .unwrap_or_else(|| DEFAULT_AUTH_HEADER.to_string()),
            static_dir: var("STATIC_DIR").unwrap_or_else(|| DEFAULT_STATIC_DIR.to_string()),
            cors_origin: var("CORS_ORIGIN"),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, AppError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn applies_defaults() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/v1"),
            ("OPENAI_API_KEY", "sk-test"),
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.completion_model, "gpt-3.5-turbo");
        assert_eq!(config.public_base_url, "http://localhost:8080");
        assert_eq!(config.auth_header, "x-user-id");
        assert!(config.openai_base_url.is_none());
    }

    #[test]
    fn reports_missing_required_variable() {
        let err = config_from(&[("DATABASE_URL", "postgres://localhost/v1")]).unwrap_err();
        assert!(matches!(err, AppError::MissingConfig { ref name } if name == "OPENAI_API_KEY"));
    }

    #[test]
    fn normalizes_overrides() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/v1"),
            ("OPENAI_API_KEY", "sk-test"),
            ("PORT", "3000"),
            ("PUBLIC_BASE_URL", "https://v1.email/"),
            ("AUTH_HEADER", "X-Forwarded-User"),
        ])
        .unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.public_base_url, "https://v1.email");
        assert_eq!(config.auth_header, "x-forwarded-user");
    }
}
