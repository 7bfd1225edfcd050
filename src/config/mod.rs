use std::time::Duration;

use crate::constants::DEFAULT_MAX_HINTS;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub mathpix_app_id: Option<String>,
    pub mathpix_app_key: Option<String>,
    pub llm_timeout: Duration,
    pub llm_max_attempts: u32,
    pub max_upload_bytes: usize,
    pub max_hints: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env_parse("PORT").unwrap_or(4000),
            gemini_api_key: env_non_empty("GOOGLE_AI_API_KEY"),
            gemini_model: env_non_empty("GEMINI_MODEL")
                .unwrap_or_else(|| "gemini-1.5-flash".to_string()),
            mathpix_app_id: env_non_empty("MATHPIX_APP_ID"),
            mathpix_app_key: env_non_empty("MATHPIX_APP_KEY"),
            llm_timeout: Duration::from_secs(env_parse("LLM_TIMEOUT_SECS").unwrap_or(20)),
            llm_max_attempts: env_parse("LLM_MAX_ATTEMPTS").unwrap_or(3).max(1),
            max_upload_bytes: env_parse("MAX_UPLOAD_BYTES").unwrap_or(5 * 1024 * 1024),
            max_hints: env_parse("MAX_HINTS").unwrap_or(DEFAULT_MAX_HINTS),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Both Mathpix credentials, if configured.
    pub fn mathpix_credentials(&self) -> Option<(&str, &str)> {
        Some((self.mathpix_app_id.as_deref()?, self.mathpix_app_key.as_deref()?))
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mathpix_credentials_need_both_halves() {
        let mut config = Config {
            mathpix_app_id: Some("id".into()),
            mathpix_app_key: None,
            ..Config::default()
        };
        assert_eq!(config.mathpix_credentials(), None);

        config.mathpix_app_key = Some("key".into());
        assert_eq!(config.mathpix_credentials(), Some(("id", "key")));
    }

    #[test]
    fn bind_address_joins_host_and_port() {
        let config = Config {
            host: "0.0.0.0".into(),
            port: 9000,
            ..Config::default()
        };
        assert_eq!(config.bind_address(), "0.0.0.0:9000");
    }
}
