//! Runtime settings read from the environment (after `.env` is loaded).

use crate::error::{AgentError, Result};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_SALES_BRAIN_BASE_URL: &str = "https://stage.qianxing-ai.com";
pub const DEFAULT_PREVIEW_BASE_URL: &str = "http://111.229.132.67";

/// Shown when the API key is missing.
pub const ENV_HINT: &str = "Example .env file:
OPENAI_API_KEY=your-api-key-here
MYSQL_HOST=localhost
MYSQL_PORT=3306
MYSQL_USER=root
MYSQL_PASSWORD=your-password
MYSQL_DATABASE=your-database
BACKEND_CALLBACK_AUTH=your-auth-token";

#[derive(Debug, Clone)]
pub struct Settings {
    pub openai: OpenAiSettings,
    pub mysql: MySqlSettings,
    pub backend: BackendSettings,
}

#[derive(Clone)]
pub struct OpenAiSettings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
}

impl std::fmt::Debug for OpenAiSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiSettings")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MySqlSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl Default for MySqlSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3306,
            user: "root".to_string(),
            password: String::new(),
            database: "test".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BackendSettings {
    /// Sent verbatim as the `Authorization` header of the sales-brain lookup
    pub callback_auth: String,
    pub sales_brain_base_url: String,
    pub preview_base_url: String,
    pub timeout: Duration,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            callback_auth: String::new(),
            sales_brain_base_url: DEFAULT_SALES_BRAIN_BASE_URL.to_string(),
            preview_base_url: DEFAULT_PREVIEW_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup; empty values count as unset
    /// except for the secrets, which may legitimately be empty.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = get("OPENAI_API_KEY")
            .ok_or_else(|| AgentError::config("OPENAI_API_KEY is not set"))?;

        let openai = OpenAiSettings {
            api_key,
            base_url: get("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: parse_or("OPENAI_TEMPERATURE", get("OPENAI_TEMPERATURE"), 0.7)?,
        };

        let defaults = MySqlSettings::default();
        let mysql = MySqlSettings {
            host: get("MYSQL_HOST").unwrap_or(defaults.host),
            port: parse_or("MYSQL_PORT", get("MYSQL_PORT"), defaults.port)?,
            user: get("MYSQL_USER").unwrap_or(defaults.user),
            password: lookup("MYSQL_PASSWORD").unwrap_or(defaults.password),
            database: get("MYSQL_DATABASE").unwrap_or(defaults.database),
        };

        let defaults = BackendSettings::default();
        let backend = BackendSettings {
            callback_auth: lookup("BACKEND_CALLBACK_AUTH").unwrap_or(defaults.callback_auth),
            sales_brain_base_url: get("SALES_BRAIN_BASE_URL")
                .unwrap_or(defaults.sales_brain_base_url),
            preview_base_url: get("PREVIEW_BASE_URL").unwrap_or(defaults.preview_base_url),
            timeout: positive_secs(
                "HTTP_TIMEOUT_SECS",
                parse_or(
                    "HTTP_TIMEOUT_SECS",
                    get("HTTP_TIMEOUT_SECS"),
                    defaults.timeout.as_secs(),
                )?,
            )?,
        };

        Ok(Self {
            openai,
            mysql,
            backend,
        })
    }
}

fn positive_secs(key: &str, secs: u64) -> Result<Duration> {
    if secs == 0 {
        return Err(AgentError::config(format!("{} must be at least 1", key)));
    }
    Ok(Duration::from_secs(secs))
}

fn parse_or<T: FromStr>(key: &str, value: Option<String>, default: T) -> Result<T> {
    match value {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AgentError::config(format!("{} has an invalid value: {}", key, raw))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> Result<Settings> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let parsed = settings(&[("OPENAI_API_KEY", "sk-test")]).unwrap();
        assert_eq!(parsed.openai.model, "gpt-4o-mini");
        assert_eq!(parsed.openai.base_url, DEFAULT_OPENAI_BASE_URL);
        assert_eq!(parsed.openai.temperature, 0.7);
        assert_eq!(parsed.mysql, MySqlSettings::default());
        assert_eq!(parsed.backend, BackendSettings::default());
    }

    #[test]
    fn test_missing_api_key() {
        let err = settings(&[("OPENAI_API_KEY", "  ")]).unwrap_err();
        assert!(matches!(err, AgentError::Configuration(_)));
    }

    #[test]
    fn test_overrides_and_invalid_values() {
        let parsed = settings(&[
            ("OPENAI_API_KEY", "sk"),
            ("MYSQL_PORT", "3307"),
            ("HTTP_TIMEOUT_SECS", "5"),
            ("BACKEND_CALLBACK_AUTH", "Bearer abc"),
        ])
        .unwrap();
        assert_eq!(parsed.mysql.port, 3307);
        assert_eq!(parsed.backend.timeout, Duration::from_secs(5));
        assert_eq!(parsed.backend.callback_auth, "Bearer abc");

        let err = settings(&[("OPENAI_API_KEY", "sk"), ("MYSQL_PORT", "lots")]).unwrap_err();
        assert!(err.to_string().contains("MYSQL_PORT"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = settings(&[("OPENAI_API_KEY", "sk"), ("HTTP_TIMEOUT_SECS", "0")]).unwrap_err();
        assert!(matches!(err, AgentError::Configuration(_)));
        assert!(err.to_string().contains("HTTP_TIMEOUT_SECS"));
    }

    #[test]
    fn test_debug_hides_key() {
        let parsed = settings(&[("OPENAI_API_KEY", "sk-secret")]).unwrap();
        assert!(!format!("{:?}", parsed).contains("sk-secret"));
    }
}
