use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Environment variable consulted when `upstream.api_key` is not configured.
pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub upload: UploadConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub referer: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    pub max_file_size_mb: usize,
    pub extraction_timeout_secs: u64,
    pub use_pdftotext: bool,
}

impl UploadConfig {
    pub fn max_file_size_bytes(&self) -> usize {
        self.max_file_size_mb * 1024 * 1024
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".into());

        let mut config: AppConfig = Config::builder()
            .add_source(File::with_name("config/default"))
            .add_source(File::with_name(&format!("config/{environment}")).required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?
            .try_deserialize()?;

        config.upstream.api_key =
            resolve_api_key(config.upstream.api_key.take(), std::env::var(API_KEY_ENV).ok());

        Ok(config)
    }
}

/// A configured key wins; otherwise the environment fallback, if non-empty.
fn resolve_api_key(configured: Option<String>, fallback: Option<String>) -> Option<String> {
    configured
        .filter(|k| !k.is_empty())
        .or_else(|| fallback.filter(|k| !k.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_loads() {
        unsafe { std::env::set_var("RUN_ENV", "development") };
        let config = AppConfig::load();
        assert!(config.is_ok(), "Default config should load: {config:?}");

        let config = config.unwrap();
        assert_eq!(config.upstream.model, "mistralai/mistral-7b-instruct");
        assert!((config.upstream.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(config.upload.max_file_size_bytes(), 20 * 1024 * 1024);
    }

    #[test]
    fn test_env_override() {
        unsafe {
            std::env::set_var("APP__SERVER__PORT", "8080");
            std::env::set_var("RUN_ENV", "development");
        }

        let config = AppConfig::load().unwrap();
        assert_eq!(config.server.port, 8080);

        unsafe { std::env::remove_var("APP__SERVER__PORT") };
    }

    #[test]
    fn test_api_key_env_fallback() {
        unsafe {
            std::env::set_var(API_KEY_ENV, "sk-from-env");
            std::env::set_var("RUN_ENV", "development");
        }

        let config = AppConfig::load().unwrap();
        assert_eq!(config.upstream.api_key.as_deref(), Some("sk-from-env"));

        unsafe { std::env::remove_var(API_KEY_ENV) };
    }

    #[test]
    fn test_resolve_api_key() {
        let key = |s: &str| Some(s.to_string());
        assert_eq!(resolve_api_key(key("cfg"), key("env")), key("cfg"));
        assert_eq!(resolve_api_key(None, key("env")), key("env"));
        assert_eq!(resolve_api_key(key(""), key("env")), key("env"));
        assert_eq!(resolve_api_key(None, key("")), None);
        assert_eq!(resolve_api_key(None, None), None);
    }
}
